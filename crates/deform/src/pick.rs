//! Cursor-to-surface picking.
//!
//! Resolves a 2D cursor position into a 3D surface hit: the cursor is
//! unprojected through the inverse of (projection × view × model) into a
//! mesh-local ray, tested against the trimap with Moller-Trumbore, and
//! the nearest intersection is reported with barycentric weights, the
//! anchor vertex, and the face normal.

use glam::{Mat3, Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::DeformError;
use crate::mesh::DeformMesh;

/// Epsilon for floating point comparisons in ray intersection
const EPSILON: f32 = 1e-6;

/// Viewport rectangle in pixels. Pixel-space Y grows downward; the
/// picker flips it into device space (Y up) before unprojecting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    /// Viewport at the origin with the given size.
    pub fn from_size(width: f32, height: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }
}

/// A ray in mesh-local space.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Result of a ray-triangle intersection test
#[derive(Debug, Clone, Copy)]
pub struct TriangleHit {
    /// Distance along the ray to the intersection point
    pub t: f32,
    /// Barycentric coordinate u (weight for vertex 1)
    pub u: f32,
    /// Barycentric coordinate v (weight for vertex 2)
    pub v: f32,
}

/// A resolved surface hit. Produced fresh per pointer-move query, never
/// persisted.
#[derive(Debug, Clone, Copy)]
pub struct PickResult {
    /// Index of the hit triangle in the trimap.
    pub triangle: u32,
    /// Barycentric weights `(w, u, v)` for the triangle's three corners;
    /// sums to 1, each weight in [0, 1].
    pub barycentric: Vec3,
    /// World-space hit point.
    pub position: Vec3,
    /// Anchor vertex: the triangle corner with the largest barycentric
    /// weight (ties broken by lowest original vertex index). Used as the
    /// pin anchor.
    pub vertex: u32,
    /// Unit face normal from the winding of the deformed triangle, in
    /// world space.
    pub normal: Vec3,
}

/// Unproject a pixel-space cursor into a mesh-local ray.
///
/// Returns `None` if the combined matrix is not invertible (e.g. a
/// zero-area viewport projection); callers treat that as "no hit".
pub fn cursor_ray(
    cursor: Vec2,
    viewport: &Viewport,
    view: Mat4,
    projection: Mat4,
    model: Mat4,
) -> Option<Ray> {
    let mvp = projection * view * model;
    if mvp.determinant().abs() < f32::EPSILON {
        return None;
    }
    let inverse = mvp.inverse();

    // Pixel to normalized device coordinates, with the viewport Y flip
    // (pixel Y grows downward, device Y grows upward).
    let flipped_y = viewport.height - (cursor.y - viewport.y);
    let ndc = Vec2::new(
        (cursor.x - viewport.x) / viewport.width * 2.0 - 1.0,
        flipped_y / viewport.height * 2.0 - 1.0,
    );

    let near = inverse.project_point3(Vec3::new(ndc.x, ndc.y, -1.0));
    let far = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
    let direction = (far - near).try_normalize()?;

    Some(Ray {
        origin: near,
        direction,
    })
}

/// Moller-Trumbore ray-triangle intersection.
///
/// Returns the hit distance and barycentric coordinates if the ray
/// intersects the triangle in front of its origin.
pub fn ray_triangle_intersection(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<TriangleHit> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    // Determinant near zero: ray lies in the triangle plane or misses
    let pvec = ray.direction.cross(edge2);
    let det = edge1.dot(pvec);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;

    let tvec = ray.origin - v0;
    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(edge1);
    let v = ray.direction.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    // Only accept hits in front of the ray
    let t = edge2.dot(qvec) * inv_det;
    if t < EPSILON {
        return None;
    }

    Some(TriangleHit { t, u, v })
}

/// Resolve a cursor position against a triangulated mesh.
///
/// Selects the nearest intersected triangle along the ray (smallest
/// positive `t`). `Ok(None)` means the cursor is not over the surface,
/// which is a normal negative result, not an error.
///
/// # Errors
/// [`DeformError::DegenerateGeometry`] if the hit triangle's edges
/// produce a near-zero-length normal.
pub fn pick(
    cursor: Vec2,
    viewport: &Viewport,
    view: Mat4,
    projection: Mat4,
    mesh: &DeformMesh,
) -> Result<Option<PickResult>, DeformError> {
    let Some(ray) = cursor_ray(cursor, viewport, view, projection, mesh.model()) else {
        return Ok(None);
    };

    let mut closest: Option<(TriangleHit, u32)> = None;
    for triangle in 0..mesh.triangle_count() {
        let [v0, v1, v2] = mesh.triangle_positions(triangle);
        if let Some(hit) = ray_triangle_intersection(&ray, v0, v1, v2) {
            if closest.is_none_or(|(prev, _)| hit.t < prev.t) {
                closest = Some((hit, triangle as u32));
            }
        }
    }
    let Some((hit, triangle)) = closest else {
        return Ok(None);
    };

    let corners = mesh.trimap()[triangle as usize];
    let [v0, v1, v2] = mesh.triangle_positions(triangle as usize);
    let w = 1.0 - hit.u - hit.v;
    let barycentric = Vec3::new(w, hit.u, hit.v);

    // Anchor: largest barycentric weight, ties to the lowest vertex index.
    let mut vertex = corners[0];
    let mut best = barycentric.x;
    for slot in 1..3 {
        let weight = barycentric[slot];
        let candidate = corners[slot];
        if weight > best || (weight == best && candidate < vertex) {
            best = weight;
            vertex = candidate;
        }
    }

    // |e1 x e2|^2 / (|e1|^2 |e2|^2) is the squared sine of the corner
    // angle, so the degeneracy test does not depend on triangle scale.
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let cross = edge1.cross(edge2);
    if cross.length_squared() < EPSILON * edge1.length_squared() * edge2.length_squared() {
        return Err(DeformError::DegenerateGeometry);
    }

    let model = mesh.model();
    let position = model.transform_point3(v0 * w + v1 * hit.u + v2 * hit.v);
    // Normals transform by the inverse transpose of the model matrix.
    let normal_matrix = Mat3::from_mat4(model.inverse().transpose());
    let normal = (normal_matrix * cross).normalize();

    Ok(Some(PickResult {
        triangle,
        barycentric,
        position,
        vertex,
        normal,
    }))
}
