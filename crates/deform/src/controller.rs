//! Solver orchestration for the pin-editing session.
//!
//! The controller owns the solver's opaque state and the mesh snapshot
//! it was built from. Membership changes (a pin added) trigger the
//! expensive precomputation; position-only changes reuse the prepared
//! state for an incremental resolve, keeping per-frame cost bounded.

use glam::Vec3;
use tracing::{debug, trace, warn};

use crate::error::DeformError;
use crate::mesh::DeformMesh;
use crate::pins::PinSet;
use crate::solver::{CONSTRAINT_DIM, DeformationSolver};

/// World-units-per-normalized-delta applied when dragging a pin.
const DRAG_SCALE: f32 = 100.0;

/// Fewer pins than this under-constrain the solve; the controller stays
/// idle until a second pin arrives.
const MIN_PINS: usize = 2;

/// Observable controller phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerPhase {
    /// No usable solver state (fewer than two pins).
    Idle,
    /// Solver state is built for the current pin membership.
    Precomputed,
    /// Membership changed but precomputation failed; must recompute
    /// before resolving.
    Stale,
}

/// Solver state plus the vertex snapshot it was prepared against.
struct Prepared<P> {
    state: P,
    /// Vertex positions at precomputation time; every resolve restarts
    /// from this snapshot so identical targets give identical output.
    base: Vec<Vec3>,
}

enum Phase<P> {
    Idle,
    Precomputed(Prepared<P>),
    Stale,
}

/// Drives the external solver across one pin-editing session.
///
/// Exclusively owns the solver state; reacts to [`PinSet`] mutations but
/// never performs them itself.
pub struct DeformationController<S: DeformationSolver> {
    solver: S,
    phase: Phase<S::Prepared>,
}

impl<S: DeformationSolver> DeformationController<S> {
    /// Create an idle controller around a solver backend.
    pub fn new(solver: S) -> Self {
        Self {
            solver,
            phase: Phase::Idle,
        }
    }

    /// Discard any solver state, returning to idle. Used when the
    /// editing session or active mesh changes.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Current phase.
    pub fn phase(&self) -> ControllerPhase {
        match self.phase {
            Phase::Idle => ControllerPhase::Idle,
            Phase::Precomputed(_) => ControllerPhase::Precomputed,
            Phase::Stale => ControllerPhase::Stale,
        }
    }

    /// React to a membership change: rebuild the solver state over the
    /// full, current pin id list.
    ///
    /// With fewer than two pins the controller stays (or returns to)
    /// idle: a single pin under-constrains the solve, so precomputation
    /// is deliberately deferred. Note that every append past the second
    /// pin pays a full precomputation, matching the original behavior.
    ///
    /// # Errors
    /// [`DeformError::SolverFailure`] if precomputation fails; the
    /// controller is left stale and the mesh untouched.
    pub fn on_pin_added(
        &mut self,
        mesh: &DeformMesh,
        pins: &PinSet,
    ) -> Result<(), DeformError> {
        if pins.len() < MIN_PINS {
            self.phase = Phase::Idle;
            trace!(pins = pins.len(), "deferring precomputation");
            return Ok(());
        }
        self.precompute(mesh, pins)
    }

    fn precompute(&mut self, mesh: &DeformMesh, pins: &PinSet) -> Result<(), DeformError> {
        let base = mesh.current_positions();
        let ids = pins.vertex_ids();
        debug!(pins = ids.len(), "precomputing solver state");
        match self
            .solver
            .precompute(&base, mesh.trimap(), CONSTRAINT_DIM, &ids)
        {
            Ok(state) => {
                self.phase = Phase::Precomputed(Prepared { state, base });
                Ok(())
            }
            Err(err) => {
                warn!(%err, "solver precomputation failed");
                self.phase = Phase::Stale;
                Err(err)
            }
        }
    }

    /// React to a pin-target change: resolve with the full ordered
    /// target list and publish the result to the mesh.
    ///
    /// Returns whether new positions were published. Idle is a no-op
    /// (nothing to resolve yet); a stale controller recomputes first.
    ///
    /// # Errors
    /// [`DeformError::SolverFailure`] from precompute or resolve; the
    /// mesh keeps its last-known-good positions in either case.
    pub fn on_pin_target_changed(
        &mut self,
        mesh: &mut DeformMesh,
        pins: &PinSet,
    ) -> Result<bool, DeformError> {
        match self.phase {
            Phase::Idle => return Ok(false),
            Phase::Stale => {
                if pins.len() < MIN_PINS {
                    self.phase = Phase::Idle;
                    return Ok(false);
                }
                self.precompute(mesh, pins)?;
            }
            Phase::Precomputed(_) => {}
        }
        let Phase::Precomputed(prepared) = &self.phase else {
            unreachable!("precompute leaves the controller prepared");
        };

        let resolved = self
            .solver
            .resolve(&pins.targets(), &prepared.state, &prepared.base)?;
        mesh.apply_resolved(&resolved)?;
        trace!(vertices = resolved.len(), "resolve published");
        Ok(true)
    }
}

/// Move the newest pin's target within the camera-aligned plane.
///
/// Pointer deltas map onto the camera's right/up axes around the view
/// direction toward the pin, so a drag follows the cursor regardless of
/// orbit. `upsign` flips with the camera when it crosses the pole.
///
/// # Errors
/// [`DeformError::EmptyPinSet`] if no pin has been placed.
pub fn drag_last_pin(
    pins: &mut PinSet,
    dx: f32,
    dy: f32,
    camera_position: Vec3,
    upsign: f32,
) -> Result<Vec3, DeformError> {
    let pin = pins.last().ok_or(DeformError::EmptyPinSet)?;
    let direction = (pin.target - camera_position).normalize_or_zero();
    let right = direction.cross(Vec3::new(0.0, upsign, 0.0));
    let up = right.cross(direction);

    let target = pin.target + right * (-dx * DRAG_SCALE) + up * (dy * DRAG_SCALE);
    pins.update_last(target)?;
    Ok(target)
}
