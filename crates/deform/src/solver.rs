//! Seam to the external deformation solver.
//!
//! The numerical solver (ARAP or equivalent) is a black box to this
//! crate: it exposes an expensive precomputation over the constrained
//! vertex set and a cheaper incremental resolve reusing that state. Both
//! are synchronous and deterministic given identical inputs.

use glam::Vec3;

use crate::error::DeformError;

/// Constraint dimension passed to precomputation: pins constrain all
/// three coordinates.
pub const CONSTRAINT_DIM: u32 = 3;

/// An external deformation solver.
///
/// `Prepared` is the solver's opaque precomputation state; the
/// [`controller`](crate::controller) owns it and rebuilds it whenever pin
/// membership changes, reusing it unchanged across position-only updates.
pub trait DeformationSolver {
    /// Opaque precomputation state.
    type Prepared;

    /// One-time setup over the mesh topology and the ordered pinned
    /// vertex ids. Potentially expensive.
    fn precompute(
        &self,
        vertices: &[Vec3],
        triangles: &[[u32; 3]],
        constraint_dim: u32,
        pinned: &[u32],
    ) -> Result<Self::Prepared, DeformError>;

    /// Incremental resolve: given the ordered pin target positions and
    /// the precomputed state, produce a full replacement vertex array.
    fn resolve(
        &self,
        targets: &[Vec3],
        prepared: &Self::Prepared,
        base: &[Vec3],
    ) -> Result<Vec<Vec3>, DeformError>;
}

/// Precomputed state of the [`TranslateSolver`].
#[derive(Debug, Clone)]
pub struct TranslatePrepared {
    pinned: Vec<u32>,
    /// Pin anchor positions at precomputation time.
    anchors: Vec<Vec3>,
}

impl TranslatePrepared {
    /// Ordered pinned vertex ids this state was built for.
    pub fn pinned(&self) -> &[u32] {
        &self.pinned
    }
}

/// Trivial reference solver: translates the whole mesh by the average
/// pin displacement.
///
/// Not a surface deformer; it exists so the controller and session can
/// be exercised end to end without linking a numerical backend, and as
/// the smallest example of the [`DeformationSolver`] contract. Real
/// deployments plug an ARAP-style solver behind the same trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct TranslateSolver;

impl DeformationSolver for TranslateSolver {
    type Prepared = TranslatePrepared;

    fn precompute(
        &self,
        vertices: &[Vec3],
        _triangles: &[[u32; 3]],
        _constraint_dim: u32,
        pinned: &[u32],
    ) -> Result<Self::Prepared, DeformError> {
        if pinned.is_empty() {
            return Err(DeformError::SolverFailure(
                "precompute with no constrained vertices".into(),
            ));
        }
        let mut anchors = Vec::with_capacity(pinned.len());
        for &vertex in pinned {
            let position = vertices.get(vertex as usize).ok_or_else(|| {
                DeformError::SolverFailure(format!("pinned vertex {vertex} out of range"))
            })?;
            anchors.push(*position);
        }
        Ok(TranslatePrepared {
            pinned: pinned.to_vec(),
            anchors,
        })
    }

    fn resolve(
        &self,
        targets: &[Vec3],
        prepared: &Self::Prepared,
        base: &[Vec3],
    ) -> Result<Vec<Vec3>, DeformError> {
        if targets.len() != prepared.pinned.len() {
            return Err(DeformError::SolverFailure(format!(
                "{} targets for {} pinned vertices",
                targets.len(),
                prepared.pinned.len()
            )));
        }
        let mut delta = Vec3::ZERO;
        for (target, anchor) in targets.iter().zip(&prepared.anchors) {
            delta += *target - *anchor;
        }
        delta /= targets.len() as f32;
        Ok(base.iter().map(|p| *p + delta).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_quad() -> (Vec<Vec3>, Vec<[u32; 3]>) {
        (
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_translate_solver_moves_by_average_delta() {
        let (vertices, triangles) = unit_quad();
        let solver = TranslateSolver;
        let prepared = solver
            .precompute(&vertices, &triangles, CONSTRAINT_DIM, &[0, 2])
            .unwrap();

        // Pin 0 stays, pin 2 moves +2Z: average delta is +1Z.
        let targets = [vertices[0], vertices[2] + Vec3::new(0.0, 0.0, 2.0)];
        let resolved = solver.resolve(&targets, &prepared, &vertices).unwrap();
        for (out, original) in resolved.iter().zip(&vertices) {
            assert!((*out - (*original + Vec3::Z)).length() < 1e-6);
        }
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let (vertices, triangles) = unit_quad();
        let solver = TranslateSolver;
        let prepared = solver
            .precompute(&vertices, &triangles, CONSTRAINT_DIM, &[1, 3])
            .unwrap();
        let targets = [Vec3::splat(2.0), Vec3::splat(-1.0)];

        let first = solver.resolve(&targets, &prepared, &vertices).unwrap();
        let second = solver.resolve(&targets, &prepared, &vertices).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_precompute_rejects_bad_constraints() {
        let (vertices, triangles) = unit_quad();
        let solver = TranslateSolver;
        assert!(matches!(
            solver.precompute(&vertices, &triangles, CONSTRAINT_DIM, &[]),
            Err(DeformError::SolverFailure(_))
        ));
        assert!(matches!(
            solver.precompute(&vertices, &triangles, CONSTRAINT_DIM, &[99]),
            Err(DeformError::SolverFailure(_))
        ));
    }

    #[test]
    fn test_resolve_rejects_target_count_mismatch() {
        let (vertices, triangles) = unit_quad();
        let solver = TranslateSolver;
        let prepared = solver
            .precompute(&vertices, &triangles, CONSTRAINT_DIM, &[0, 1])
            .unwrap();
        assert!(matches!(
            solver.resolve(&[Vec3::ZERO], &prepared, &vertices),
            Err(DeformError::SolverFailure(_))
        ));
    }
}
