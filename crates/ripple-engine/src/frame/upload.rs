use std::marker::PhantomData;

use bytemuck::Pod;

use super::FrameError;

/// CPU-side image of an array of constant blocks.
///
/// Elements are laid out at `stride` intervals so that each one can be bound
/// individually with a dynamic offset.
#[derive(Debug, Clone)]
pub struct StagingBlock<T> {
    bytes: Vec<u8>,
    stride: usize,
    len: usize,
    dirty: bool,
    _marker: PhantomData<T>,
}

impl<T: Pod> StagingBlock<T> {
    /// `alignment` is the required element alignment in bytes (1 for tightly packed).
    pub fn new(len: usize, alignment: usize) -> Result<Self, FrameError> {
        if len == 0 {
            return Err(FrameError::Empty);
        }

        let stride = align_up(std::mem::size_of::<T>(), alignment.max(1));
        Ok(Self {
            bytes: vec![0; stride * len],
            stride,
            len,
            dirty: true,
            _marker: PhantomData,
        })
    }

    /// Writes element `index`.
    pub fn copy_data(&mut self, index: usize, value: &T) -> Result<(), FrameError> {
        if index >= self.len {
            return Err(FrameError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }

        let start = index * self.stride;
        let src = bytemuck::bytes_of(value);
        self.bytes[start..start + src.len()].copy_from_slice(src);
        self.dirty = true;
        Ok(())
    }

    /// Reads element `index` back out of the staging image.
    pub fn get(&self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        let start = index * self.stride;
        Some(bytemuck::pod_read_unaligned(
            &self.bytes[start..start + std::mem::size_of::<T>()],
        ))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Byte offset of element `index`, as used for dynamic bind-group offsets.
    #[inline]
    pub fn offset_of(&self, index: usize) -> u32 {
        (index * self.stride) as u32
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the bytes if anything changed since the last call.
    fn take_dirty(&mut self) -> Option<&[u8]> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(&self.bytes)
    }
}

/// GPU buffer fed from a `StagingBlock`.
///
/// Constant buffers use the device's uniform offset alignment (typically 256 bytes)
/// as element stride.
pub struct UploadBuffer<T> {
    staging: StagingBlock<T>,
    buffer: wgpu::Buffer,
}

impl<T: Pod> UploadBuffer<T> {
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        len: usize,
        usage: wgpu::BufferUsages,
    ) -> Result<Self, FrameError> {
        let alignment = if usage.contains(wgpu::BufferUsages::UNIFORM) {
            device.limits().min_uniform_buffer_offset_alignment as usize
        } else {
            device.limits().min_storage_buffer_offset_alignment as usize
        };

        let staging = StagingBlock::new(len, alignment)?;
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: staging.bytes().len() as u64,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self { staging, buffer })
    }

    /// Uniform buffer with `len` constant blocks.
    pub fn uniform(device: &wgpu::Device, label: &str, len: usize) -> Result<Self, FrameError> {
        Self::new(device, label, len, wgpu::BufferUsages::UNIFORM)
    }

    #[inline]
    pub fn copy_data(&mut self, index: usize, value: &T) -> Result<(), FrameError> {
        self.staging.copy_data(index, value)
    }

    /// Uploads the staging image if it changed.
    pub fn flush(&mut self, queue: &wgpu::Queue) {
        if let Some(bytes) = self.staging.take_dirty() {
            queue.write_buffer(&self.buffer, 0, bytes);
        }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn staging(&self) -> &StagingBlock<T> {
        &self.staging
    }

    /// Binding for a single element, for use with a dynamic offset.
    pub fn element_binding(&self) -> wgpu::BindingResource<'_> {
        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &self.buffer,
            offset: 0,
            size: wgpu::BufferSize::new(std::mem::size_of::<T>() as u64),
        })
    }

    #[inline]
    pub fn offset_of(&self, index: usize) -> u32 {
        self.staging.offset_of(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.staging.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.staging.is_empty()
    }
}

#[inline]
fn align_up(value: usize, alignment: usize) -> usize {
    value.div_ceil(alignment) * alignment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C)]
    #[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
    struct Block {
        a: [f32; 4],
        b: u32,
        _pad: [u32; 3],
    }

    fn block(v: f32) -> Block {
        Block {
            a: [v; 4],
            b: v as u32,
            _pad: [0; 3],
        }
    }

    #[test]
    fn stride_rounds_up_to_alignment() {
        let s = StagingBlock::<Block>::new(4, 256).unwrap();
        assert_eq!(s.stride(), 256);
        assert_eq!(s.bytes().len(), 1024);
        assert_eq!(s.offset_of(3), 768);
    }

    #[test]
    fn packed_when_alignment_is_one() {
        let s = StagingBlock::<Block>::new(2, 1).unwrap();
        assert_eq!(s.stride(), std::mem::size_of::<Block>());
    }

    #[test]
    fn copy_data_round_trips_and_leaves_neighbours_alone() {
        let mut s = StagingBlock::<Block>::new(3, 256).unwrap();
        s.copy_data(1, &block(7.0)).unwrap();
        assert_eq!(s.get(1), Some(block(7.0)));
        assert_eq!(s.get(0), Some(block(0.0)));
        assert_eq!(s.get(2), Some(block(0.0)));
    }

    #[test]
    fn copy_data_is_bounds_checked() {
        let mut s = StagingBlock::<Block>::new(2, 256).unwrap();
        assert_eq!(
            s.copy_data(2, &block(1.0)),
            Err(FrameError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert_eq!(s.get(2), None);
    }

    #[test]
    fn zero_length_is_rejected() {
        assert_eq!(StagingBlock::<Block>::new(0, 256).unwrap_err(), FrameError::Empty);
    }

    #[test]
    fn dirty_flag_tracks_writes() {
        let mut s = StagingBlock::<Block>::new(1, 256).unwrap();
        assert!(s.take_dirty().is_some());
        assert!(s.take_dirty().is_none());
        s.copy_data(0, &block(1.0)).unwrap();
        assert!(s.is_dirty());
    }
}
