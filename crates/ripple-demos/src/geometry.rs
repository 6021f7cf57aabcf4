use bytemuck::{Pod, Zeroable};

/// Flat grid vertex; the height comes from the displacement buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GridVertex {
    pub xz: [f32; 2],
}

impl GridVertex {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GridVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRS,
        }
    }
}

/// `rows × cols` vertices, one per wave cell, centred on the origin.
///
/// Vertex `row * cols + col` sits over wave cell `(row, col)`, so the vertex
/// index doubles as the displacement index.
pub struct GridMesh {
    pub vertices: Vec<GridVertex>,
    pub indices: Vec<u32>,
}

impl GridMesh {
    pub fn new(rows: u32, cols: u32, spacing: f32) -> Self {
        let (width, depth) = Self::extent(rows, cols, spacing);
        let (half_w, half_d) = (width * 0.5, depth * 0.5);

        let mut vertices = Vec::with_capacity((rows * cols) as usize);
        for row in 0..rows {
            for col in 0..cols {
                vertices.push(GridVertex {
                    xz: [col as f32 * spacing - half_w, row as f32 * spacing - half_d],
                });
            }
        }

        let (quad_rows, quad_cols) = (rows.saturating_sub(1), cols.saturating_sub(1));
        let mut indices = Vec::with_capacity((quad_rows * quad_cols * 6) as usize);
        for row in 0..quad_rows {
            for col in 0..quad_cols {
                let i = row * cols + col;
                let (a, b, c, d) = (i, i + 1, i + cols, i + cols + 1);
                indices.extend_from_slice(&[a, c, b, b, c, d]);
            }
        }

        Self { vertices, indices }
    }

    /// Width and depth of the mesh in world units. Zero for an empty grid.
    pub fn extent(rows: u32, cols: u32, spacing: f32) -> (f32, f32) {
        (
            cols.saturating_sub(1) as f32 * spacing,
            rows.saturating_sub(1) as f32 * spacing,
        )
    }
}
