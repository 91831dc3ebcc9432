use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::CookError;

/// One vertex/index buffer of a render mesh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubMesh {
    pub positions: Vec<Vec3>,
    /// Triangle list, indices local to this sub-mesh.
    pub indices: Vec<u32>,
}

/// Source geometry for a triangle-mesh collider, as a list of sub-meshes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshSource {
    pub submeshes: Vec<SubMesh>,
}

/// A validated collision mesh: one vertex list, one triangle list.
#[derive(Debug, Clone, PartialEq)]
pub struct CookedMesh {
    vertices: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
}

impl MeshSource {
    pub fn single(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            submeshes: vec![SubMesh { positions, indices }],
        }
    }

    /// Regular grid in the XZ plane with `heights` sampled row-major
    /// (`columns * rows` entries), centered on the origin.
    pub fn grid(columns: usize, rows: usize, spacing: f32, heights: &[f32]) -> Self {
        let mut positions = Vec::with_capacity(columns * rows);
        let x0 = -(columns.saturating_sub(1) as f32) * spacing * 0.5;
        let z0 = -(rows.saturating_sub(1) as f32) * spacing * 0.5;
        for r in 0..rows {
            for c in 0..columns {
                let h = heights.get(r * columns + c).copied().unwrap_or(0.0);
                positions.push(Vec3::new(x0 + c as f32 * spacing, h, z0 + r as f32 * spacing));
            }
        }

        let mut indices = Vec::new();
        for r in 0..rows.saturating_sub(1) {
            for c in 0..columns.saturating_sub(1) {
                let i = (r * columns + c) as u32;
                let right = i + 1;
                let below = i + columns as u32;
                // Counter-clockwise seen from above.
                indices.extend_from_slice(&[i, below, right, right, below, below + 1]);
            }
        }
        Self::single(positions, indices)
    }

    pub fn vertex_count(&self) -> usize {
        self.submeshes.iter().map(|s| s.positions.len()).sum()
    }

    /// Concatenate every sub-mesh, offsetting each index by the number of
    /// vertices emitted before its sub-mesh.
    pub fn flatten(&self) -> (Vec<Vec3>, Vec<u32>) {
        let mut vertices = Vec::with_capacity(self.vertex_count());
        let mut indices = Vec::new();
        for sub in &self.submeshes {
            let base = vertices.len() as u32;
            vertices.extend_from_slice(&sub.positions);
            indices.extend(sub.indices.iter().map(|i| base + i));
        }
        (vertices, indices)
    }

    /// Validate and cook with `scale` baked into the vertices.
    ///
    /// Degenerate triangles are dropped; a mesh left with none is an error.
    pub fn cook(&self, scale: Vec3) -> Result<CookedMesh, CookError> {
        if self.vertex_count() == 0 {
            return Err(CookError::Empty);
        }
        for (n, sub) in self.submeshes.iter().enumerate() {
            if sub.indices.len() % 3 != 0 {
                return Err(CookError::NotTriangles {
                    submesh: n,
                    count: sub.indices.len(),
                });
            }
            if let Some(&index) = sub
                .indices
                .iter()
                .find(|&&i| i as usize >= sub.positions.len())
            {
                return Err(CookError::IndexOutOfRange {
                    submesh: n,
                    index,
                    vertex_count: sub.positions.len(),
                });
            }
            if let Some(vertex) = sub.positions.iter().position(|p| !p.is_finite()) {
                return Err(CookError::NonFiniteVertex { submesh: n, vertex });
            }
        }

        let (vertices, indices) = self.flatten();
        let vertices: Vec<Vec3> = vertices.into_iter().map(|v| v * scale).collect();
        let triangles: Vec<[u32; 3]> = indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .filter(|t| !is_degenerate(&vertices, t))
            .collect();
        if triangles.is_empty() {
            return Err(CookError::Degenerate);
        }
        Ok(CookedMesh {
            vertices,
            triangles,
        })
    }
}

fn is_degenerate(vertices: &[Vec3], t: &[u32; 3]) -> bool {
    if t[0] == t[1] || t[1] == t[2] || t[0] == t[2] {
        return true;
    }
    let a = vertices[t[0] as usize];
    let b = vertices[t[1] as usize];
    let c = vertices[t[2] as usize];
    (b - a).cross(c - a).length_squared() <= f32::EPSILON * f32::EPSILON
}

impl CookedMesh {
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(y: f32) -> SubMesh {
        SubMesh {
            positions: vec![
                Vec3::new(0.0, y, 0.0),
                Vec3::new(1.0, y, 0.0),
                Vec3::new(1.0, y, 1.0),
                Vec3::new(0.0, y, 1.0),
            ],
            indices: vec![0, 2, 1, 0, 3, 2],
        }
    }

    #[test]
    fn flatten_offsets_indices_by_running_base() {
        let source = MeshSource {
            submeshes: vec![quad(0.0), quad(1.0), quad(2.0)],
        };
        let (vertices, indices) = source.flatten();
        assert_eq!(vertices.len(), 12);
        assert_eq!(indices.len(), 18);
        assert_eq!(&indices[0..6], &[0, 2, 1, 0, 3, 2]);
        assert_eq!(&indices[6..12], &[4, 6, 5, 4, 7, 6]);
        assert_eq!(&indices[12..18], &[8, 10, 9, 8, 11, 10]);
        assert_eq!(vertices[8].y, 2.0);
    }

    #[test]
    fn cook_bakes_scale() {
        let cooked = MeshSource::single(quad(1.0).positions, quad(1.0).indices)
            .cook(Vec3::new(2.0, 3.0, 4.0))
            .unwrap();
        assert_eq!(cooked.triangles().len(), 2);
        assert_eq!(cooked.vertices()[2], Vec3::new(2.0, 3.0, 4.0));
    }

    #[test]
    fn cook_rejects_empty() {
        assert_eq!(
            MeshSource::default().cook(Vec3::ONE),
            Err(CookError::Empty)
        );
    }

    #[test]
    fn cook_rejects_partial_triangle() {
        let mut sub = quad(0.0);
        sub.indices.push(1);
        let err = MeshSource { submeshes: vec![quad(0.0), sub] }
            .cook(Vec3::ONE)
            .unwrap_err();
        assert_eq!(err, CookError::NotTriangles { submesh: 1, count: 7 });
    }

    #[test]
    fn cook_rejects_out_of_range_index() {
        let mut sub = quad(0.0);
        sub.indices[4] = 9;
        let err = MeshSource::single(sub.positions, sub.indices)
            .cook(Vec3::ONE)
            .unwrap_err();
        assert!(matches!(err, CookError::IndexOutOfRange { index: 9, .. }));
    }

    #[test]
    fn cook_rejects_non_finite_vertex() {
        let mut sub = quad(0.0);
        sub.positions[3].x = f32::INFINITY;
        let err = MeshSource::single(sub.positions, sub.indices)
            .cook(Vec3::ONE)
            .unwrap_err();
        assert_eq!(err, CookError::NonFiniteVertex { submesh: 0, vertex: 3 });
    }

    #[test]
    fn cook_drops_degenerate_and_fails_when_none_left() {
        let collinear = MeshSource::single(
            vec![Vec3::ZERO, Vec3::X, Vec3::X * 2.0],
            vec![0, 1, 2, 0, 0, 1],
        );
        assert_eq!(collinear.cook(Vec3::ONE), Err(CookError::Degenerate));

        let mut sub = quad(0.0);
        sub.indices.extend_from_slice(&[1, 1, 2]);
        let cooked = MeshSource::single(sub.positions, sub.indices)
            .cook(Vec3::ONE)
            .unwrap();
        assert_eq!(cooked.triangles().len(), 2);
    }

    #[test]
    fn grid_has_two_triangles_per_cell() {
        let heights = vec![0.0; 16];
        let grid = MeshSource::grid(4, 4, 1.0, &heights);
        assert_eq!(grid.vertex_count(), 16);
        let cooked = grid.cook(Vec3::ONE).unwrap();
        assert_eq!(cooked.triangles().len(), 3 * 3 * 2);
        // Centered on the origin.
        assert_eq!(cooked.vertices()[0], Vec3::new(-1.5, 0.0, -1.5));
    }
}
