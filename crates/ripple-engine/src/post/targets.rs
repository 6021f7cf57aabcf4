use super::PostExtent;

/// Offscreen textures the post effect reads and writes.
///
/// Always rebuilt as a whole; views from a previous build must not be reused.
pub struct PostTargets {
    extent: PostExtent,
    scene: wgpu::Texture,
    scene_view: wgpu::TextureView,
    edges: wgpu::Texture,
    edge_view: wgpu::TextureView,
}

impl PostTargets {
    pub const SCENE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
    pub const EDGE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;

    pub fn new(device: &wgpu::Device, extent: PostExtent) -> Self {
        log::debug!("building post targets {}x{}", extent.width, extent.height);

        let scene = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("ripple post scene"),
            size: extent.to_wgpu(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::SCENE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let edges = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("ripple post edges"),
            size: extent.to_wgpu(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::EDGE_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let scene_view = scene.create_view(&wgpu::TextureViewDescriptor::default());
        let edge_view = edges.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            extent,
            scene,
            scene_view,
            edges,
            edge_view,
        }
    }

    #[inline]
    pub fn extent(&self) -> PostExtent {
        self.extent
    }

    pub fn scene_texture(&self) -> &wgpu::Texture {
        &self.scene
    }

    pub fn scene_view(&self) -> &wgpu::TextureView {
        &self.scene_view
    }

    pub fn edge_texture(&self) -> &wgpu::Texture {
        &self.edges
    }

    pub fn edge_view(&self) -> &wgpu::TextureView {
        &self.edge_view
    }
}
