/// Edge length of the Sobel compute tile.
pub const POST_TILE: u32 = 16;

/// Non-zero size of the post-effect targets in physical pixels.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PostExtent {
    pub width: u32,
    pub height: u32,
}

impl PostExtent {
    /// `None` for a zero-sized surface (e.g. a minimised window).
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    /// Workgroups covering every pixel, rounding partial tiles up.
    pub fn dispatch_groups(self) -> (u32, u32) {
        (
            self.width.div_ceil(POST_TILE),
            self.height.div_ceil(POST_TILE),
        )
    }

    pub fn to_wgpu(self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_extent_is_rejected() {
        assert_eq!(PostExtent::new(0, 10), None);
        assert_eq!(PostExtent::new(10, 0), None);
        assert!(PostExtent::new(1, 1).is_some());
    }

    #[test]
    fn groups_round_up_partial_tiles() {
        let e = PostExtent::new(1280, 720).unwrap();
        assert_eq!(e.dispatch_groups(), (80, 45));

        let e = PostExtent::new(1281, 17).unwrap();
        assert_eq!(e.dispatch_groups(), (81, 2));

        let e = PostExtent::new(1, 1).unwrap();
        assert_eq!(e.dispatch_groups(), (1, 1));
    }

    #[test]
    fn groups_cover_every_pixel() {
        for (w, h) in [(15, 15), (16, 16), (33, 100), (799, 601)] {
            let e = PostExtent::new(w, h).unwrap();
            let (gx, gy) = e.dispatch_groups();
            assert!(gx * POST_TILE >= w && (gx - 1) * POST_TILE < w);
            assert!(gy * POST_TILE >= h && (gy - 1) * POST_TILE < h);
        }
    }
}
