//! Render mesh topology: grid and disc vertex layouts with texture coordinates.

use crate::error::TopologyFault;
use crate::float::Float;
use crate::properties::GridShape;
use crate::vec::{Vec2, Vec3};

/// Map `value` from `[0, extent]` to `[0, 1]`, clamped. A zero extent maps to 0.
fn normalized<F: Float>(value: F, extent: F) -> F {
    if extent.is_near_zero(F::from_f32(1e-10)) {
        return F::zero();
    }
    (value / extent).clamp(F::zero(), F::one())
}

/// Triangle indices are `u32`; every vertex index must fit.
fn check_index_range(vertices: usize) -> Result<(), TopologyFault> {
    if vertices > 0 && u32::try_from(vertices - 1).is_err() {
        return Err(TopologyFault::TooManyVertices { vertices });
    }
    Ok(())
}

/// Triangle mesh handed to the renderer.
///
/// Vertices and texture coordinates are parallel arrays. Indices come in
/// triples, one per triangle, all with the same winding.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshTopology<F: Float> {
    vertices: Vec<Vec3<F>>,
    tex_coords: Vec<Vec2<F>>,
    indices: Vec<u32>,
}

impl<F: Float> MeshTopology<F> {
    /// Build a row-major grid of `rows * cols` vertices.
    ///
    /// Vertex (row, col) has index `row * cols + col` and sits at
    /// `origin + size * (col / (cols - 1), row / (rows - 1))`. Each cell
    /// contributes the triangles (top-left, top-right, bottom-left) and
    /// (top-right, bottom-right, bottom-left); the last row and column never
    /// start a cell.
    pub fn grid(shape: &GridShape<F>, texture_size: Vec2<F>) -> Result<Self, TopologyFault> {
        let (rows, cols) = (shape.rows, shape.cols);
        if rows < 2 || cols < 2 {
            return Err(TopologyFault::GridTooSmall { rows, cols });
        }
        check_index_range(rows.saturating_mul(cols))?;

        let mut vertices = Vec::with_capacity(rows * cols);
        let mut tex_coords = Vec::with_capacity(rows * cols);
        let last_col = F::from_usize(cols - 1);
        let last_row = F::from_usize(rows - 1);

        for y in 0..rows {
            for x in 0..cols {
                let fx = F::from_usize(x) / last_col;
                let fy = F::from_usize(y) / last_row;
                let ix = shape.origin.x + shape.size.x * fx;
                let iy = shape.origin.y + shape.size.y * fy;
                vertices.push(Vec3::new(ix, iy, F::zero()));

                let tx = texture_size.x * fx;
                let ty = texture_size.y * fy;
                tex_coords.push(Vec2::new(
                    normalized(tx, texture_size.x),
                    normalized(ty, texture_size.y),
                ));
            }
        }

        let mut indices = Vec::with_capacity(6 * (rows - 1) * (cols - 1));
        for y in 0..rows - 1 {
            for x in 0..cols - 1 {
                let tl = (y * cols + x) as u32;
                let tr = (y * cols + x + 1) as u32;
                let bl = ((y + 1) * cols + x) as u32;
                let br = ((y + 1) * cols + x + 1) as u32;
                indices.extend_from_slice(&[tl, tr, bl]);
                indices.extend_from_slice(&[tr, br, bl]);
            }
        }

        Ok(MeshTopology { vertices, tex_coords, indices })
    }

    /// Build a disc: vertex 0 at `center`, then `segments` rim vertices
    /// counter-clockwise from angle 0, fanned into `segments` triangles.
    ///
    /// Texture coordinates map the disc's bounding square onto the texture.
    pub fn disc(
        center: Vec2<F>,
        radius: F,
        segments: usize,
        texture_size: Vec2<F>,
    ) -> Result<Self, TopologyFault> {
        if segments < 3 {
            return Err(TopologyFault::TooFewSegments { segments });
        }
        check_index_range(segments.saturating_add(1))?;

        let mut vertices = Vec::with_capacity(segments + 1);
        let mut tex_coords = Vec::with_capacity(segments + 1);
        let tex_of = |offset: Vec2<F>| {
            // offset / radius is in [-1, 1]; shift into [0, 1].
            let u = (offset.x / radius + F::one()) * F::half();
            let v = (offset.y / radius + F::one()) * F::half();
            Vec2::new(
                normalized(texture_size.x * u, texture_size.x),
                normalized(texture_size.y * v, texture_size.y),
            )
        };

        vertices.push(Vec3::from_xy(center));
        tex_coords.push(tex_of(Vec2::zero()));

        let two_pi = F::two() * F::pi();
        for i in 0..segments {
            let angle = two_pi * F::from_usize(i) / F::from_usize(segments);
            let offset = Vec2::from_angle(angle).scale(radius);
            vertices.push(Vec3::from_xy(center + offset));
            tex_coords.push(tex_of(offset));
        }

        let mut indices = Vec::with_capacity(3 * segments);
        for i in 0..segments {
            let rim = 1 + i as u32;
            let next = 1 + ((i + 1) % segments) as u32;
            indices.extend_from_slice(&[0, rim, next]);
        }

        Ok(MeshTopology { vertices, tex_coords, indices })
    }

    /// Re-check the parallel-array and index-range invariants.
    pub fn validate(&self) -> Result<(), TopologyFault> {
        if self.vertices.len() != self.tex_coords.len() {
            return Err(TopologyFault::TexCoordMismatch {
                vertices: self.vertices.len(),
                tex_coords: self.tex_coords.len(),
            });
        }
        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= self.vertices.len()) {
            return Err(TopologyFault::IndexOutOfRange { index, vertices: self.vertices.len() });
        }
        Ok(())
    }

    pub fn vertices(&self) -> &[Vec3<F>] {
        &self.vertices
    }

    pub fn tex_coords(&self) -> &[Vec2<F>] {
        &self.tex_coords
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex_xy(&self, index: usize) -> Vec2<F> {
        self.vertices[index].xy()
    }

    /// Overwrite the planar position of a vertex; `z` is left untouched.
    pub fn set_vertex_xy(&mut self, index: usize, pos: Vec2<F>) {
        let v = &mut self.vertices[index];
        v.x = pos.x;
        v.y = pos.y;
    }

    /// Average vertex position.
    pub fn centroid(&self) -> Vec2<F> {
        if self.vertices.is_empty() {
            return Vec2::zero();
        }
        let mut sum = Vec2::zero();
        for v in &self.vertices {
            sum += v.xy();
        }
        sum.scale(F::one() / F::from_usize(self.vertices.len()))
    }
}
