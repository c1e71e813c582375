//! Mesh buffer ownership for one editing session.
//!
//! A [`DeformMesh`] exclusively owns its vertex data: the base positions
//! delivered by the scene source, the live deformation offsets written by
//! the solver, and the derived triangle index buffer ("trimap") used for
//! picking and rendering. The vertex array is never resized during a
//! session; deformation replaces offsets wholesale.

use glam::{Mat4, Vec3};
use tracing::debug;

use crate::error::DeformError;
use crate::triangulate::{self, UnpackPatternCache};

/// Original polygon topology, consumed when the trimap is built.
#[derive(Debug, Clone)]
struct PolygonBuffers {
    counts: Vec<u32>,
    indices: Vec<u32>,
}

/// A single mesh undergoing a pin-editing session.
#[derive(Debug, Clone)]
pub struct DeformMesh {
    /// Undeformed vertex positions from the scene source.
    base: Vec<Vec3>,
    /// Live per-vertex deformation offsets (current = base + offset).
    offsets: Vec<Vec3>,
    /// Polygon face buffers; dropped once unpacked into the trimap.
    polygons: Option<PolygonBuffers>,
    /// Triangle index buffer derived from the polygon faces.
    trimap: Vec<[u32; 3]>,
    /// Model (local-to-world) transform.
    model: Mat4,
    /// Set whenever vertex positions change; cleared by the renderer.
    dirty: bool,
}

impl DeformMesh {
    /// Create a mesh from scene-source buffers.
    ///
    /// `counts` holds one vertex count per polygon face and `indices` the
    /// flat concatenation of face vertex indices. The trimap is not built
    /// until [`DeformMesh::triangulate`] runs.
    ///
    /// # Errors
    /// [`DeformError::MalformedTopology`] if any index references a
    /// vertex outside `positions`.
    pub fn new(
        positions: Vec<Vec3>,
        counts: Vec<u32>,
        indices: Vec<u32>,
    ) -> Result<Self, DeformError> {
        let vertex_count = positions.len() as u32;
        if let Some(&bad) = indices.iter().find(|&&i| i >= vertex_count) {
            return Err(DeformError::MalformedTopology(format!(
                "index {bad} out of range for {vertex_count} vertices"
            )));
        }
        Ok(Self {
            offsets: vec![Vec3::ZERO; positions.len()],
            base: positions,
            polygons: Some(PolygonBuffers { counts, indices }),
            trimap: Vec::new(),
            model: Mat4::IDENTITY,
            dirty: false,
        })
    }

    /// Unpack the polygon faces into the trimap, consuming the face
    /// buffers. Idempotent: a second call is a no-op.
    ///
    /// # Errors
    /// [`DeformError::MalformedTopology`] from the unpacker; the mesh is
    /// left untriangulated and unusable for picking.
    pub fn triangulate(&mut self, cache: &UnpackPatternCache) -> Result<usize, DeformError> {
        let Some(polygons) = self.polygons.take() else {
            return Ok(self.trimap.len());
        };
        let (trimap, tri_count) = triangulate::unpack(&polygons.counts, &polygons.indices, cache)?;
        debug!(
            faces = polygons.counts.len(),
            triangles = tri_count,
            "mesh triangulated"
        );
        self.trimap = trimap;
        Ok(tri_count)
    }

    /// Number of vertices. Constant for the life of the session.
    pub fn vertex_count(&self) -> usize {
        self.base.len()
    }

    /// Triangle index buffer. Empty until triangulated.
    pub fn trimap(&self) -> &[[u32; 3]] {
        &self.trimap
    }

    /// Number of triangles in the trimap.
    pub fn triangle_count(&self) -> usize {
        self.trimap.len()
    }

    /// Undeformed vertex positions.
    pub fn base_positions(&self) -> &[Vec3] {
        &self.base
    }

    /// Current (deformed) position of one vertex.
    pub fn current_position(&self, vertex: u32) -> Vec3 {
        self.base[vertex as usize] + self.offsets[vertex as usize]
    }

    /// Current (deformed) positions of all vertices.
    pub fn current_positions(&self) -> Vec<Vec3> {
        self.base
            .iter()
            .zip(&self.offsets)
            .map(|(b, o)| *b + *o)
            .collect()
    }

    /// The three current corner positions of a trimap triangle.
    pub fn triangle_positions(&self, triangle: usize) -> [Vec3; 3] {
        let [a, b, c] = self.trimap[triangle];
        [
            self.current_position(a),
            self.current_position(b),
            self.current_position(c),
        ]
    }

    /// Model (local-to-world) transform.
    pub fn model(&self) -> Mat4 {
        self.model
    }

    /// Replace the model transform.
    pub fn set_model(&mut self, model: Mat4) {
        self.model = model;
    }

    /// Publish a solver result: replaces every offset with
    /// `resolved - base` and marks the mesh dirty for re-upload.
    ///
    /// # Errors
    /// [`DeformError::SolverFailure`] if the solver returned the wrong
    /// number of vertices; no offset is written in that case.
    pub fn apply_resolved(&mut self, resolved: &[Vec3]) -> Result<(), DeformError> {
        if resolved.len() != self.base.len() {
            return Err(DeformError::SolverFailure(format!(
                "solver returned {} vertices for a {}-vertex mesh",
                resolved.len(),
                self.base.len()
            )));
        }
        for ((offset, base), new) in self.offsets.iter_mut().zip(&self.base).zip(resolved) {
            *offset = *new - *base;
        }
        self.dirty = true;
        Ok(())
    }

    /// Whether vertex positions changed since the last upload, clearing
    /// the flag. The renderer polls this after each pointer event.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Trimap as raw bytes for index-buffer upload.
    pub fn triangle_index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.trimap)
    }

    /// Current positions as tightly packed rows for vertex-buffer upload.
    pub fn vertex_upload_buffer(&self) -> Vec<[f32; 3]> {
        self.base
            .iter()
            .zip(&self.offsets)
            .map(|(b, o)| (*b + *o).to_array())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_mesh() -> DeformMesh {
        DeformMesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![4],
            vec![0, 1, 2, 3],
        )
        .unwrap()
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let err = DeformMesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![3],
            vec![0, 1, 7],
        )
        .unwrap_err();
        assert!(matches!(err, DeformError::MalformedTopology(_)));
    }

    #[test]
    fn test_triangulate_builds_trimap_once() {
        let cache = UnpackPatternCache::new();
        let mut mesh = quad_mesh();
        assert_eq!(mesh.triangulate(&cache).unwrap(), 2);
        assert_eq!(mesh.trimap(), &[[0, 1, 2], [0, 2, 3]]);
        // Second call is a no-op on already-consumed buffers.
        assert_eq!(mesh.triangulate(&cache).unwrap(), 2);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_apply_resolved_updates_offsets_and_dirty() {
        let cache = UnpackPatternCache::new();
        let mut mesh = quad_mesh();
        mesh.triangulate(&cache).unwrap();
        assert!(!mesh.take_dirty());

        let moved: Vec<Vec3> = mesh.base_positions().iter().map(|p| *p + Vec3::Z).collect();
        mesh.apply_resolved(&moved).unwrap();
        assert!(mesh.take_dirty());
        assert!(!mesh.take_dirty());
        assert_eq!(mesh.current_position(2), Vec3::new(1.0, 1.0, 1.0));
        // Base positions are preserved; only offsets moved.
        assert_eq!(mesh.base_positions()[2], Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_apply_resolved_wrong_length_leaves_positions() {
        let mut mesh = quad_mesh();
        let err = mesh.apply_resolved(&[Vec3::ZERO]).unwrap_err();
        assert!(matches!(err, DeformError::SolverFailure(_)));
        assert_eq!(mesh.current_position(1), Vec3::new(1.0, 0.0, 0.0));
        assert!(!mesh.take_dirty());
    }

    #[test]
    fn test_upload_buffers() {
        let cache = UnpackPatternCache::new();
        let mut mesh = quad_mesh();
        mesh.triangulate(&cache).unwrap();

        assert_eq!(mesh.triangle_index_bytes().len(), 2 * 3 * 4);
        let rows = mesh.vertex_upload_buffer();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1], [1.0, 0.0, 0.0]);
    }
}
