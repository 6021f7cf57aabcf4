use std::num::NonZeroU64;

use anyhow::{Context, Result, anyhow};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use ripple_engine::binding::BindingTable;
use ripple_engine::core::{FrameCtx, InitCtx, ResizeCtx, Scene, SceneControl};
use ripple_engine::frame::{DirtyFrames, FrameResource, FrameResourceDesc, FrameRing, FRAME_RING_DEPTH};
use ripple_engine::input::{InputEvent, Key, MouseButton};
use ripple_engine::post::{PostEffectPipeline, PostTargets};
use ripple_engine::sync::{Fence, QueueFenceDriver};
use ripple_engine::wave::{GpuWaveKernel, WaveSimulation};

use crate::camera::OrbitCamera;
use crate::config::DemoConfig;
use crate::geometry::{GridMesh, GridVertex};

use super::constants::{FrameConstants, Lighting, MaterialConstants, ObjectConstants};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Radians per logical pixel of mouse drag.
const DRAG_SENSITIVITY: f32 = 0.008;

type WavesFrame = FrameResource<FrameConstants, ObjectConstants, MaterialConstants>;

/// GPU state created in `init`.
struct WavesGpu {
    ring: FrameRing<WavesFrame>,
    fence: Fence<QueueFenceDriver>,
    /// One constants bind group per ring slot, indexed by slot.
    frame_groups: BindingTable<wgpu::BindGroup>,

    waves: WaveSimulation<GpuWaveKernel>,
    post: PostEffectPipeline,

    pipeline: wgpu::RenderPipeline,
    depth: wgpu::TextureView,
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

/// Lit height-field driven by the GPU wave simulation, with the edge post effect.
pub struct WavesScene {
    config: DemoConfig,
    camera: OrbitCamera,
    zoom_range: (f32, f32),
    lighting: Lighting,

    object_dirty: DirtyFrames,
    material_dirty: DirtyFrames,

    pending_disturb: bool,
    toggle_post: bool,

    gpu: Option<WavesGpu>,
}

impl WavesScene {
    pub fn new(config: DemoConfig) -> Self {
        let (width, depth) = GridMesh::extent(config.wave.rows, config.wave.cols, config.wave.dx);
        let span = width.max(depth);

        Self {
            config,
            camera: OrbitCamera::new(0.8, 0.6, span * 1.1, Vec3::ZERO),
            zoom_range: (span * 0.2, span * 3.0),
            lighting: Lighting::default(),
            object_dirty: DirtyFrames::new(FRAME_RING_DEPTH),
            material_dirty: DirtyFrames::new(FRAME_RING_DEPTH),
            pending_disturb: false,
            toggle_post: false,
            gpu: None,
        }
    }

    fn frame_constants(&self, aspect: f32, total_time: f32) -> FrameConstants {
        let eye = self.camera.position();
        FrameConstants {
            view_proj: self.camera.view_proj_matrix(aspect).to_cols_array_2d(),
            eye: eye.extend(1.0).to_array(),
            light_dir: self.lighting.direction.extend(0.0).to_array(),
            light_color: self.lighting.color.extend(1.0).to_array(),
            ambient: self.lighting.ambient.extend(1.0).to_array(),
            grid: [self.config.wave.cols, self.config.wave.rows, 0, 0],
            params: [self.config.wave.dx, total_time, 0.0, 0.0],
        }
    }
}

fn create_depth(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("waves depth"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

fn uniform_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    dynamic: bool,
    size: usize,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size: NonZeroU64::new(size as u64),
        },
        count: None,
    }
}

impl Scene for WavesScene {
    fn init(&mut self, ctx: &mut InitCtx<'_, '_>) -> Result<()> {
        let device = ctx.gpu.device();
        let queue = ctx.gpu.queue();
        let size = ctx.gpu.size();
        let wave = self.config.wave;

        let waves = WaveSimulation::gpu(device, wave)
            .context("invalid wave parameters")?
            .with_ripples(self.config.ripples.clone())
            .context("invalid ripple settings")?;

        let post = PostEffectPipeline::new(
            device,
            ctx.gpu.surface_format(),
            size.width,
            size.height,
            self.config.post,
        )?;

        let desc = FrameResourceDesc {
            passes: 1,
            objects: 1,
            materials: 1,
        };
        let ring = FrameRing::try_new(FRAME_RING_DEPTH, |i| FrameResource::new(device, i, desc))?;

        let constants_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("waves constants bgl"),
            entries: &[
                uniform_entry(
                    0,
                    wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    false,
                    std::mem::size_of::<FrameConstants>(),
                ),
                uniform_entry(
                    1,
                    wgpu::ShaderStages::VERTEX,
                    true,
                    std::mem::size_of::<ObjectConstants>(),
                ),
                uniform_entry(
                    2,
                    wgpu::ShaderStages::FRAGMENT,
                    true,
                    std::mem::size_of::<MaterialConstants>(),
                ),
            ],
        });

        let mut frame_groups = BindingTable::new("frame constants", ring.depth());
        for slot in ring.slots() {
            let res = &slot.resources;
            frame_groups.insert(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("waves constants bg"),
                layout: &constants_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: res.pass.element_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: res.objects.element_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: res.materials.element_binding(),
                    },
                ],
            }))?;
        }

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("waves scene shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/scene.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("waves pipeline layout"),
            bind_group_layouts: &[&constants_layout, waves.kernel().displacement_layout()],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("waves pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[GridVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: PostTargets::SCENE_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let mesh = GridMesh::new(wave.rows, wave.cols, wave.dx);
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("waves grid vertices"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("waves grid indices"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        log::info!(
            "waves scene ready: {}x{} grid, {} triangles, ring depth {}",
            wave.rows,
            wave.cols,
            mesh.indices.len() / 3,
            ring.depth()
        );

        self.gpu = Some(WavesGpu {
            fence: ctx.gpu.create_fence(),
            depth: create_depth(device, size.width, size.height),
            ring,
            frame_groups,
            waves,
            post,
            pipeline,
            vertices,
            indices,
            index_count: mesh.indices.len() as u32,
        });
        Ok(())
    }

    fn update(&mut self, ctx: &mut FrameCtx<'_, '_>) -> Result<SceneControl> {
        let input = ctx.input;
        let turn = self.config.camera.orbit_speed * ctx.delta_time();

        let mut d_yaw = 0.0;
        let mut d_pitch = 0.0;
        if input.key_down(Key::ArrowLeft) {
            d_yaw += turn;
        }
        if input.key_down(Key::ArrowRight) {
            d_yaw -= turn;
        }
        if input.key_down(Key::ArrowUp) {
            d_pitch += turn;
        }
        if input.key_down(Key::ArrowDown) {
            d_pitch -= turn;
        }
        if input.button_down(MouseButton::Left) {
            let (dx, dy) = input.pointer_delta();
            d_yaw += dx * DRAG_SENSITIVITY;
            d_pitch += dy * DRAG_SENSITIVITY;
        }
        self.camera.orbit(d_yaw, d_pitch);

        let wheel = input.wheel_lines();
        if wheel != 0.0 {
            let (min, max) = self.zoom_range;
            self.camera.zoom(wheel, min, max);
        }

        Ok(SceneControl::Continue)
    }

    fn draw(&mut self, ctx: &mut FrameCtx<'_, '_>) -> Result<()> {
        let size = ctx.gpu.size();
        let aspect = size.width as f32 / size.height.max(1) as f32;
        let constants = self.frame_constants(aspect, ctx.total_time());
        let dt = ctx.delta_time();

        let gpu = self
            .gpu
            .as_mut()
            .ok_or_else(|| anyhow!("waves scene drawn before init"))?;
        let WavesGpu {
            ring,
            fence,
            frame_groups,
            waves,
            post,
            pipeline,
            depth,
            vertices,
            indices,
            index_count,
        } = gpu;

        // Blocks while the GPU still owns the slot from `depth` frames ago.
        let slot = ring.advance(fence)?;
        let slot_index = slot.resources.index();

        let Some(frame) = ctx.acquire_frame()? else {
            return Ok(());
        };
        let device = ctx.gpu.device();
        let queue = ctx.gpu.queue();

        if std::mem::take(&mut self.toggle_post) {
            let enabled = !post.config().enabled;
            post.set_enabled(queue, enabled);
            log::info!("edge effect {}", if enabled { "on" } else { "off" });
        }

        let res = &mut slot.resources;
        res.pass.copy_data(0, &constants)?;
        if self.object_dirty.consume() {
            res.objects.copy_data(0, &ObjectConstants::from_world(Mat4::IDENTITY))?;
        }
        if self.material_dirty.consume() {
            res.materials.copy_data(0, &MaterialConstants::water())?;
        }
        res.flush(queue);
        let offsets = [res.objects.offset_of(0), res.materials.offset_of(0)];
        let frame_group = &frame_groups[frame_groups.handle(slot_index)?];

        let encoder = res.begin_commands(device);

        if std::mem::take(&mut self.pending_disturb) {
            let p = waves.params();
            let (row, col) = (p.rows / 2, p.cols / 2);
            waves.disturb(encoder, row, col, self.config.camera.disturb_magnitude)?;
        }
        waves.update(encoder, dt);

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("waves scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: post.scene_view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.55,
                            g: 0.7,
                            b: 0.85,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, frame_group, &offsets);
            // Fetched after `update`: the current buffer moves on every step.
            rpass.set_bind_group(1, waves.displacement_map().bind_group, &[]);
            rpass.set_vertex_buffer(0, vertices.slice(..));
            rpass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..*index_count, 0, 0..1);
        }

        post.execute(encoder, &frame.view);

        let commands = res.finish_commands();
        ctx.gpu.submit(commands);

        let value = fence.signal_next();
        ring.retire(value);

        ctx.present(frame);
        Ok(())
    }

    fn resize(&mut self, ctx: &ResizeCtx<'_>) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        gpu.post.on_resize(ctx.device, ctx.width, ctx.height);
        gpu.depth = create_depth(ctx.device, ctx.width, ctx.height);
    }

    fn handle_input(&mut self, event: &InputEvent) -> SceneControl {
        if event.is_key_press(Key::Escape) {
            return SceneControl::Exit;
        }
        if event.is_key_press(Key::P) {
            return SceneControl::TogglePause;
        }
        if event.is_key_press(Key::Space) {
            self.pending_disturb = true;
        }
        if event.is_key_press(Key::E) {
            self.toggle_post = true;
        }
        SceneControl::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_engine::input::ButtonState;

    fn press(key: Key) -> InputEvent {
        InputEvent::Key {
            key,
            state: ButtonState::Pressed,
            repeat: false,
        }
    }

    #[test]
    fn key_bindings() {
        let mut scene = WavesScene::new(DemoConfig::default());
        assert_eq!(scene.handle_input(&press(Key::Escape)), SceneControl::Exit);
        assert_eq!(scene.handle_input(&press(Key::P)), SceneControl::TogglePause);

        assert_eq!(scene.handle_input(&press(Key::Space)), SceneControl::Continue);
        assert!(scene.pending_disturb);

        assert_eq!(scene.handle_input(&press(Key::E)), SceneControl::Continue);
        assert!(scene.toggle_post);
    }

    #[test]
    fn camera_frames_the_whole_grid() {
        let scene = WavesScene::new(DemoConfig::default());
        let (w, _) = GridMesh::extent(256, 256, 0.25);
        assert!(scene.camera.distance > w);
        assert!(scene.zoom_range.0 < scene.camera.distance);
        assert!(scene.zoom_range.1 > scene.camera.distance);
    }

    #[test]
    fn empty_grid_config_is_left_to_init_to_reject() {
        let mut config = DemoConfig::default();
        config.wave.rows = 0;
        let scene = WavesScene::new(config);
        assert!(scene.gpu.is_none());
        assert!(WaveSimulation::cpu(scene.config.wave).is_err());
    }

    #[test]
    fn frame_constants_carry_grid_shape() {
        let scene = WavesScene::new(DemoConfig::default());
        let c = scene.frame_constants(1.5, 2.0);
        assert_eq!(c.grid, [256, 256, 0, 0]);
        assert_eq!(c.params[0], 0.25);
        assert_eq!(c.params[1], 2.0);
    }
}
