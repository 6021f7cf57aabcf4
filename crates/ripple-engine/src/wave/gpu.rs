use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::binding::{BindingHandle, BindingTable};

use super::{WaveConstants, WaveError, WaveKernel, WaveParams, WaveRoles, WAVE_TILE};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct WaveUniform {
    k0: f32,
    k1: f32,
    k2: f32,
    _pad0: f32,
    rows: u32,
    cols: u32,
    _pad1: [u32; 2],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct DisturbUniform {
    row: u32,
    col: u32,
    magnitude: f32,
    cols: u32,
}

/// GPU handle to the current height field.
#[derive(Copy, Clone)]
pub struct WaveDisplacement<'a> {
    pub buffer: &'a wgpu::Buffer,
    /// Binds `buffer` as a read-only storage buffer for the vertex stage,
    /// matching `GpuWaveKernel::displacement_layout`.
    pub bind_group: &'a wgpu::BindGroup,
}

/// Compute-shader kernel. Records into a `wgpu::CommandEncoder`.
///
/// One bind group per rotation phase is built up front, so stepping never
/// allocates.
pub struct GpuWaveKernel {
    device: wgpu::Device,
    rows: u32,
    cols: u32,

    buffers: [wgpu::Buffer; 3],
    _constants_ubo: wgpu::Buffer,
    disturb_ubo: wgpu::Buffer,

    update_pipeline: wgpu::ComputePipeline,
    disturb_pipeline: wgpu::ComputePipeline,
    displacement_layout: wgpu::BindGroupLayout,

    bind_groups: BindingTable<wgpu::BindGroup>,
    update_groups: [BindingHandle<wgpu::BindGroup>; 3],
    disturb_groups: [BindingHandle<wgpu::BindGroup>; 3],
    displacement_groups: [BindingHandle<wgpu::BindGroup>; 3],
}

impl GpuWaveKernel {
    pub fn new(
        device: &wgpu::Device,
        params: &WaveParams,
        constants: WaveConstants,
    ) -> Result<Self, WaveError> {
        let size = (params.cell_count() * std::mem::size_of::<f32>()) as u64;
        let buffers = [0, 1, 2].map(|i| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(["ripple wave buffer 0", "ripple wave buffer 1", "ripple wave buffer 2"][i]),
                size,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC,
                // Zero-initialised by wgpu.
                mapped_at_creation: false,
            })
        });

        let constants_ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ripple wave constants"),
            contents: bytemuck::bytes_of(&WaveUniform {
                k0: constants.k0,
                k1: constants.k1,
                k2: constants.k2,
                _pad0: 0.0,
                rows: params.rows,
                cols: params.cols,
                _pad1: [0; 2],
            }),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        // Filled by an in-encoder copy before each disturb dispatch.
        let disturb_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ripple wave disturb params"),
            size: std::mem::size_of::<DisturbUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let update_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ripple wave update bgl"),
            entries: &[
                uniform_entry(0, std::mem::size_of::<WaveUniform>() as u64, false),
                storage_entry(1, wgpu::ShaderStages::COMPUTE, true),
                storage_entry(2, wgpu::ShaderStages::COMPUTE, true),
                storage_entry(3, wgpu::ShaderStages::COMPUTE, false),
            ],
        });
        let disturb_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ripple wave disturb bgl"),
            entries: &[
                uniform_entry(0, std::mem::size_of::<DisturbUniform>() as u64, false),
                storage_entry(1, wgpu::ShaderStages::COMPUTE, false),
            ],
        });
        let displacement_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("ripple wave displacement bgl"),
                entries: &[storage_entry(0, wgpu::ShaderStages::VERTEX, true)],
            });

        let update_pipeline = compute_pipeline(
            device,
            "ripple wave update",
            include_str!("shaders/wave_update.wgsl"),
            &update_layout,
        );
        let disturb_pipeline = compute_pipeline(
            device,
            "ripple wave disturb",
            include_str!("shaders/wave_disturb.wgsl"),
            &disturb_layout,
        );

        let mut bind_groups = BindingTable::new("wave", 9);
        let mut update_groups = Vec::with_capacity(3);
        let mut disturb_groups = Vec::with_capacity(3);
        let mut displacement_groups = Vec::with_capacity(3);

        for roles in WaveRoles::all() {
            let prev = &buffers[roles.prev()];
            let curr = &buffers[roles.current()];
            let next = &buffers[roles.next()];

            update_groups.push(bind_groups.insert(device.create_bind_group(
                &wgpu::BindGroupDescriptor {
                    label: Some("ripple wave update bg"),
                    layout: &update_layout,
                    entries: &[
                        buffer_entry(0, &constants_ubo),
                        buffer_entry(1, prev),
                        buffer_entry(2, curr),
                        buffer_entry(3, next),
                    ],
                },
            ))?);

            disturb_groups.push(bind_groups.insert(device.create_bind_group(
                &wgpu::BindGroupDescriptor {
                    label: Some("ripple wave disturb bg"),
                    layout: &disturb_layout,
                    entries: &[buffer_entry(0, &disturb_ubo), buffer_entry(1, curr)],
                },
            ))?);

            displacement_groups.push(bind_groups.insert(device.create_bind_group(
                &wgpu::BindGroupDescriptor {
                    label: Some("ripple wave displacement bg"),
                    layout: &displacement_layout,
                    entries: &[buffer_entry(0, curr)],
                },
            ))?);
        }

        Ok(Self {
            device: device.clone(),
            rows: params.rows,
            cols: params.cols,
            buffers,
            _constants_ubo: constants_ubo,
            disturb_ubo,
            update_pipeline,
            disturb_pipeline,
            displacement_layout,
            bind_groups,
            update_groups: phase_array(update_groups),
            disturb_groups: phase_array(disturb_groups),
            displacement_groups: phase_array(displacement_groups),
        })
    }

    /// Layout the render pipeline must use for the displacement bind group.
    pub fn displacement_layout(&self) -> &wgpu::BindGroupLayout {
        &self.displacement_layout
    }

    /// Raw buffer by physical index, regardless of role.
    pub fn buffer(&self, index: usize) -> &wgpu::Buffer {
        &self.buffers[index]
    }

    fn workgroups(&self) -> (u32, u32) {
        (self.cols / WAVE_TILE, self.rows / WAVE_TILE)
    }
}

impl WaveKernel for GpuWaveKernel {
    type Recorder = wgpu::CommandEncoder;
    type Displacement<'a> = WaveDisplacement<'a>;

    fn integrate(&mut self, encoder: &mut wgpu::CommandEncoder, roles: WaveRoles) {
        let (gx, gy) = self.workgroups();
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("ripple wave update pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.update_pipeline);
        pass.set_bind_group(0, &self.bind_groups[self.update_groups[roles.phase()]], &[]);
        pass.dispatch_workgroups(gx, gy, 1);
    }

    fn disturb(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        roles: WaveRoles,
        row: u32,
        col: u32,
        magnitude: f32,
    ) {
        // Uploaded through the encoder: a queue write would run ahead of every
        // pass in the submission.
        let src = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ripple wave disturb upload"),
            contents: bytemuck::bytes_of(&DisturbUniform {
                row,
                col,
                magnitude,
                cols: self.cols,
            }),
            usage: wgpu::BufferUsages::COPY_SRC,
        });
        encoder.copy_buffer_to_buffer(&src, 0, &self.disturb_ubo, 0, self.disturb_ubo.size());

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("ripple wave disturb pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.disturb_pipeline);
        pass.set_bind_group(
            0,
            &self.bind_groups[self.disturb_groups[roles.phase()]],
            &[],
        );
        pass.dispatch_workgroups(1, 1, 1);
    }

    fn displacement(&self, roles: WaveRoles) -> WaveDisplacement<'_> {
        WaveDisplacement {
            buffer: &self.buffers[roles.current()],
            bind_group: &self.bind_groups[self.displacement_groups[roles.phase()]],
        }
    }

    fn clear(&mut self, encoder: &mut wgpu::CommandEncoder) {
        for b in &self.buffers {
            encoder.clear_buffer(b, 0, None);
        }
    }
}

fn phase_array<T: Copy>(v: Vec<T>) -> [T; 3] {
    [v[0], v[1], v[2]]
}

fn uniform_entry(binding: u32, size: u64, dynamic: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size: NonZeroU64::new(size),
        },
        count: None,
    }
}

fn storage_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    read_only: bool,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn buffer_entry(binding: u32, buffer: &wgpu::Buffer) -> wgpu::BindGroupEntry<'_> {
    wgpu::BindGroupEntry {
        binding,
        resource: buffer.as_entire_binding(),
    }
}

fn compute_pipeline(
    device: &wgpu::Device,
    label: &str,
    source: &str,
    layout: &wgpu::BindGroupLayout,
) -> wgpu::ComputePipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[layout],
        immediate_size: 0,
    });
    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        module: &module,
        entry_point: Some("cs_main"),
        compilation_options: Default::default(),
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::headless;
    use crate::wave::CpuWaveKernel;

    fn read_back(device: &wgpu::Device, queue: &wgpu::Queue, src: &wgpu::Buffer) -> Vec<f32> {
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("wave readback"),
            size: src.size(),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = device.create_command_encoder(&Default::default());
        encoder.copy_buffer_to_buffer(src, 0, &staging, 0, src.size());
        queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .unwrap();
        rx.recv().unwrap().unwrap();

        let data = bytemuck::cast_slice::<u8, f32>(&slice.get_mapped_range()).to_vec();
        data
    }

    #[test]
    fn gpu_kernel_matches_cpu_reference() {
        let Some((device, queue)) = headless::request_device_blocking("wave test") else {
            eprintln!("skipping: no GPU adapter");
            return;
        };

        let params = WaveParams {
            rows: 32,
            cols: 48,
            ..WaveParams::default()
        };
        let constants = params.validate().unwrap();
        let mut gpu = GpuWaveKernel::new(&device, &params, constants).unwrap();
        let mut cpu = CpuWaveKernel::new(&params, constants);

        let mut roles = WaveRoles::default();
        let mut encoder = device.create_command_encoder(&Default::default());
        gpu.disturb(&mut encoder, roles, 10, 20, 1.5);
        cpu.disturb(&mut (), roles, 10, 20, 1.5);
        for _ in 0..5 {
            gpu.integrate(&mut encoder, roles);
            cpu.integrate(&mut (), roles);
            roles.rotate();
        }
        gpu.disturb(&mut encoder, roles, 25, 5, 1.0);
        cpu.disturb(&mut (), roles, 25, 5, 1.0);
        gpu.integrate(&mut encoder, roles);
        cpu.integrate(&mut (), roles);
        roles.rotate();
        queue.submit(Some(encoder.finish()));

        let got = read_back(&device, &queue, gpu.displacement(roles).buffer);
        let want = cpu.displacement(roles);
        assert_eq!(got.len(), want.len());
        for (i, (g, w)) in got.iter().zip(want).enumerate() {
            assert!((g - w).abs() < 1e-4, "cell {i}: gpu {g} vs cpu {w}");
        }
    }

    #[test]
    fn many_impulses_in_one_encoder_all_land() {
        let Some((device, queue)) = headless::request_device_blocking("wave test") else {
            eprintln!("skipping: no GPU adapter");
            return;
        };

        let params = WaveParams {
            rows: 32,
            cols: 32,
            ..WaveParams::default()
        };
        let constants = params.validate().unwrap();
        let mut gpu = GpuWaveKernel::new(&device, &params, constants).unwrap();
        let mut cpu = CpuWaveKernel::new(&params, constants);

        let mut roles = WaveRoles::default();
        let mut encoder = device.create_command_encoder(&Default::default());
        for i in 0..24u32 {
            let (row, col) = (2 + (i / 6) * 7, 2 + (i % 6) * 5);
            let magnitude = 1.0 + i as f32 * 0.1;
            gpu.disturb(&mut encoder, roles, row, col, magnitude);
            cpu.disturb(&mut (), roles, row, col, magnitude);
        }
        gpu.integrate(&mut encoder, roles);
        cpu.integrate(&mut (), roles);
        roles.rotate();
        queue.submit(Some(encoder.finish()));

        for r in [roles.prev(), roles.current()] {
            let got = read_back(&device, &queue, gpu.buffer(r));
            let want = cpu.buffer(r);
            for (i, (g, w)) in got.iter().zip(want).enumerate() {
                assert!((g - w).abs() < 1e-4, "buffer {r} cell {i}: gpu {g} vs cpu {w}");
            }
        }
    }

    #[test]
    fn displacement_follows_rotation() {
        let Some((device, _queue)) = headless::request_device_blocking("wave test") else {
            eprintln!("skipping: no GPU adapter");
            return;
        };

        let params = WaveParams {
            rows: 16,
            cols: 16,
            ..WaveParams::default()
        };
        let constants = params.validate().unwrap();
        let gpu = GpuWaveKernel::new(&device, &params, constants).unwrap();

        let mut roles = WaveRoles::default();
        for _ in 0..3 {
            let d = gpu.displacement(roles);
            assert_eq!(d.buffer, gpu.buffer(roles.current()));
            roles.rotate();
        }
    }
}
