use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};

use crate::binding::{BindingHandle, BindingTable};

use super::{PostEffectConfig, PostEffectError, PostExtent, PostTargets};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct PostUniform {
    threshold: f32,
    strength: f32,
    enabled: f32,
    _pad: f32,
}

impl From<&PostEffectConfig> for PostUniform {
    fn from(c: &PostEffectConfig) -> Self {
        Self {
            threshold: c.edge_threshold,
            strength: c.edge_strength,
            enabled: if c.enabled { 1.0 } else { 0.0 },
            _pad: 0.0,
        }
    }
}

/// Sobel edge-detect + composite.
///
/// Owns the offscreen scene target. Bind groups referencing the targets live
/// in a `BindingTable` and are replaced in place whenever the targets are
/// rebuilt, so a resize can never leave a stale view bound.
pub struct PostEffectPipeline {
    config: PostEffectConfig,
    output_format: wgpu::TextureFormat,
    targets: PostTargets,
    generation: u64,

    uniform: wgpu::Buffer,
    sobel_layout: wgpu::BindGroupLayout,
    composite_layout: wgpu::BindGroupLayout,
    sobel_pipeline: wgpu::ComputePipeline,
    composite_pipeline: wgpu::RenderPipeline,

    bind_groups: BindingTable<wgpu::BindGroup>,
    sobel_group: BindingHandle<wgpu::BindGroup>,
    composite_group: BindingHandle<wgpu::BindGroup>,
}

impl PostEffectPipeline {
    pub fn new(
        device: &wgpu::Device,
        output_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        config: PostEffectConfig,
    ) -> Result<Self, PostEffectError> {
        if output_format.is_depth_stencil_format() || output_format.is_compressed() {
            return Err(PostEffectError::UnsupportedFormat {
                format: output_format,
            });
        }
        let extent =
            PostExtent::new(width, height).ok_or(PostEffectError::ZeroExtent { width, height })?;

        let uniform = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ripple post uniform"),
            size: std::mem::size_of::<PostUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: true,
        });
        uniform
            .slice(..)
            .get_mapped_range_mut()
            .copy_from_slice(bytemuck::bytes_of(&PostUniform::from(&config)));
        uniform.unmap();

        let uniform_entry = wgpu::BindGroupLayoutEntry {
            binding: 2,
            visibility: wgpu::ShaderStages::COMPUTE | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: NonZeroU64::new(std::mem::size_of::<PostUniform>() as u64),
            },
            count: None,
        };

        let sobel_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ripple sobel bgl"),
            entries: &[
                texture_entry(0, wgpu::ShaderStages::COMPUTE, true),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: PostTargets::EDGE_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
                uniform_entry,
            ],
        });

        let composite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ripple composite bgl"),
            entries: &[
                texture_entry(0, wgpu::ShaderStages::FRAGMENT, true),
                texture_entry(1, wgpu::ShaderStages::FRAGMENT, false),
                uniform_entry,
            ],
        });

        let sobel_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ripple sobel shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/sobel.wgsl").into()),
        });
        let sobel_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ripple sobel pipeline layout"),
            bind_group_layouts: &[&sobel_layout],
            immediate_size: 0,
        });
        let sobel_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("ripple sobel pipeline"),
            layout: Some(&sobel_pipeline_layout),
            module: &sobel_module,
            entry_point: Some("cs_main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let composite_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ripple composite shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/composite.wgsl").into()),
        });
        let composite_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("ripple composite pipeline layout"),
                bind_group_layouts: &[&composite_layout],
                immediate_size: 0,
            });
        let composite_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("ripple composite pipeline"),
            layout: Some(&composite_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &composite_module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &composite_module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: output_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let targets = PostTargets::new(device, extent);

        let mut bind_groups = BindingTable::new("post", 2);
        let sobel_group =
            bind_groups.insert(sobel_bind_group(device, &sobel_layout, &targets, &uniform))?;
        let composite_group = bind_groups.insert(composite_bind_group(
            device,
            &composite_layout,
            &targets,
            &uniform,
        ))?;

        Ok(Self {
            config,
            output_format,
            targets,
            generation: 0,
            uniform,
            sobel_layout,
            composite_layout,
            sobel_pipeline,
            composite_pipeline,
            bind_groups,
            sobel_group,
            composite_group,
        })
    }

    /// Color target scenes render into. Re-fetch after every resize.
    pub fn scene_view(&self) -> &wgpu::TextureView {
        self.targets.scene_view()
    }

    pub fn targets(&self) -> &PostTargets {
        &self.targets
    }

    #[inline]
    pub fn extent(&self) -> PostExtent {
        self.targets.extent()
    }

    /// Number of times the targets were rebuilt.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn output_format(&self) -> wgpu::TextureFormat {
        self.output_format
    }

    pub fn config(&self) -> &PostEffectConfig {
        &self.config
    }

    pub fn set_config(&mut self, queue: &wgpu::Queue, config: PostEffectConfig) {
        self.config = config;
        queue.write_buffer(
            &self.uniform,
            0,
            bytemuck::bytes_of(&PostUniform::from(&self.config)),
        );
    }

    pub fn set_enabled(&mut self, queue: &wgpu::Queue, enabled: bool) {
        let config = PostEffectConfig {
            enabled,
            ..self.config
        };
        self.set_config(queue, config);
    }

    /// Records the edge pass and the composite into `output_view`.
    ///
    /// `output_view` must match the pipeline's extent and output format.
    pub fn execute(&self, encoder: &mut wgpu::CommandEncoder, output_view: &wgpu::TextureView) {
        if self.config.enabled {
            let (gx, gy) = self.extent().dispatch_groups();
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("ripple sobel pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.sobel_pipeline);
            pass.set_bind_group(0, &self.bind_groups[self.sobel_group], &[]);
            pass.dispatch_workgroups(gx, gy, 1);
        }

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("ripple composite pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        rpass.set_pipeline(&self.composite_pipeline);
        rpass.set_bind_group(0, &self.bind_groups[self.composite_group], &[]);
        rpass.draw(0..3, 0..1);
    }

    /// Rebuilds targets and their bind groups for a new output size.
    ///
    /// Zero extents (minimised window) and unchanged sizes are ignored.
    /// Returns whether anything was rebuilt.
    pub fn on_resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> bool {
        let Some(extent) = PostExtent::new(width, height) else {
            log::debug!("post resize to {width}x{height} deferred");
            return false;
        };
        if extent == self.extent() {
            return false;
        }

        self.targets = PostTargets::new(device, extent);

        self.bind_groups[self.sobel_group] =
            sobel_bind_group(device, &self.sobel_layout, &self.targets, &self.uniform);
        self.bind_groups[self.composite_group] =
            composite_bind_group(device, &self.composite_layout, &self.targets, &self.uniform);

        self.generation += 1;
        true
    }
}

fn texture_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    filterable: bool,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sobel_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    targets: &PostTargets,
    uniform: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("ripple sobel bg"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(targets.scene_view()),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(targets.edge_view()),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: uniform.as_entire_binding(),
            },
        ],
    })
}

fn composite_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    targets: &PostTargets,
    uniform: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("ripple composite bg"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(targets.scene_view()),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(targets.edge_view()),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: uniform.as_entire_binding(),
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::headless;

    const OUTPUT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    fn output_texture(device: &wgpu::Device, extent: PostExtent) -> wgpu::Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some("post test output"),
            size: extent.to_wgpu(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OUTPUT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    }

    fn size_of(t: &wgpu::Texture) -> (u32, u32) {
        let s = t.size();
        (s.width, s.height)
    }

    #[test]
    fn rejects_zero_extent_and_depth_output() {
        let Some((device, _queue)) = headless::request_device_blocking("post test") else {
            eprintln!("skipping: no GPU adapter");
            return;
        };
        assert!(matches!(
            PostEffectPipeline::new(&device, OUTPUT, 0, 10, PostEffectConfig::default()),
            Err(PostEffectError::ZeroExtent { .. })
        ));
        assert!(matches!(
            PostEffectPipeline::new(
                &device,
                wgpu::TextureFormat::Depth32Float,
                10,
                10,
                PostEffectConfig::default()
            ),
            Err(PostEffectError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn resize_rebuilds_targets_at_the_new_size() {
        let Some((device, queue)) = headless::request_device_blocking("post test") else {
            eprintln!("skipping: no GPU adapter");
            return;
        };

        let mut post =
            PostEffectPipeline::new(&device, OUTPUT, 64, 48, PostEffectConfig::default()).unwrap();
        assert_eq!(size_of(post.targets().scene_texture()), (64, 48));
        assert_eq!(post.generation(), 0);

        assert!(post.on_resize(&device, 100, 37));
        assert_eq!(post.generation(), 1);
        assert_eq!(post.extent(), PostExtent::new(100, 37).unwrap());
        assert_eq!(size_of(post.targets().scene_texture()), (100, 37));
        assert_eq!(size_of(post.targets().edge_texture()), (100, 37));

        // A stale bind group would fail validation here, which panics by default.
        let output = output_texture(&device, post.extent());
        let view = output.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&Default::default());
        post.execute(&mut encoder, &view);
        queue.submit(Some(encoder.finish()));
        device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .unwrap();
    }

    #[test]
    fn zero_or_unchanged_resize_is_ignored() {
        let Some((device, _queue)) = headless::request_device_blocking("post test") else {
            eprintln!("skipping: no GPU adapter");
            return;
        };

        let mut post =
            PostEffectPipeline::new(&device, OUTPUT, 32, 32, PostEffectConfig::default()).unwrap();
        assert!(!post.on_resize(&device, 0, 0));
        assert!(!post.on_resize(&device, 32, 32));
        assert_eq!(post.generation(), 0);
        assert_eq!(size_of(post.targets().scene_texture()), (32, 32));
    }
}
