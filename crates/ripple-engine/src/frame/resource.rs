use bytemuck::Pod;

use super::{FrameError, UploadBuffer};

/// Element counts used to size each slot's constant buffers.
///
/// Fixed for the lifetime of the ring.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FrameResourceDesc {
    pub passes: usize,
    pub objects: usize,
    pub materials: usize,
}

/// Everything the CPU writes for one frame.
///
/// `P`, `O` and `M` are the scene's per-pass, per-object and per-material
/// constant layouts. The slot also owns the command encoder for its frame; the
/// encoder is created by `begin_commands` and consumed by `finish_commands`.
pub struct FrameResource<P, O, M> {
    index: usize,

    pub pass: UploadBuffer<P>,
    pub objects: UploadBuffer<O>,
    pub materials: UploadBuffer<M>,

    encoder: Option<wgpu::CommandEncoder>,
}

impl<P: Pod, O: Pod, M: Pod> FrameResource<P, O, M> {
    pub fn new(
        device: &wgpu::Device,
        index: usize,
        desc: FrameResourceDesc,
    ) -> Result<Self, FrameError> {
        Ok(Self {
            index,
            pass: UploadBuffer::uniform(device, &format!("frame {index} pass constants"), desc.passes)?,
            objects: UploadBuffer::uniform(
                device,
                &format!("frame {index} object constants"),
                desc.objects,
            )?,
            materials: UploadBuffer::uniform(
                device,
                &format!("frame {index} material constants"),
                desc.materials,
            )?,
            encoder: None,
        })
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Starts recording this slot's commands, discarding any unfinished encoder.
    pub fn begin_commands(&mut self, device: &wgpu::Device) -> &mut wgpu::CommandEncoder {
        if self.encoder.is_some() {
            log::warn!("frame slot {}: previous commands were never submitted", self.index);
        }

        let label = format!("frame {} encoder", self.index);
        self.encoder.insert(
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(&label),
            }),
        )
    }

    /// The encoder opened by `begin_commands`, if still recording.
    pub fn encoder(&mut self) -> Option<&mut wgpu::CommandEncoder> {
        self.encoder.as_mut()
    }

    pub fn finish_commands(&mut self) -> Option<wgpu::CommandBuffer> {
        self.encoder.take().map(wgpu::CommandEncoder::finish)
    }

    /// Uploads every constant buffer that changed this frame.
    pub fn flush(&mut self, queue: &wgpu::Queue) {
        self.pass.flush(queue);
        self.objects.flush(queue);
        self.materials.flush(queue);
    }
}
