//! Sculpt session: pointer-event orchestration.
//!
//! One [`SculptSession`] owns everything scoped to a continuous
//! pin-editing session on a single mesh: the mesh buffers, the brush
//! state, the pin set, and the solver controller. A pointer event runs
//! the full pick/place/drag/resolve chain synchronously before the next
//! event is processed, so a resolve always sees the pin positions of
//! the event that triggered it.

use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};
use tracing::{debug, trace};

use deform::brush::{BrushConfig, BrushMode, BrushState, Modifiers, PointerButton};
use deform::controller::{DeformationController, drag_last_pin};
use deform::error::DeformError;
use deform::mesh::DeformMesh;
use deform::pick::{self, PickResult, Viewport};
use deform::pins::PinSet;
use deform::solver::DeformationSolver;
use deform::triangulate::UnpackPatternCache;

/// Per-frame camera inputs supplied by the external camera controller.
#[derive(Debug, Clone, Copy)]
pub struct CameraInput {
    pub view: Mat4,
    pub projection: Mat4,
    /// Camera eye position, for camera-plane pin dragging.
    pub position: Vec3,
    /// +1 or -1; flips when the orbit crosses a pole.
    pub upsign: f32,
}

/// A pointer event from the input layer.
#[derive(Debug, Clone, Copy)]
pub struct PointerEvent {
    /// Cursor position in viewport pixels (Y down).
    pub cursor: Vec2,
    pub button: PointerButton,
    pub modifiers: Modifiers,
    /// Normalized pointer deltas.
    pub dx: f32,
    pub dy: f32,
}

/// What a pointer event did, for the caller's redraw decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerOutcome {
    /// The cursor is over the surface.
    pub hit: bool,
    /// A pin was placed this event.
    pub pin_placed: bool,
    /// A resolve published new vertex positions.
    pub deformed: bool,
}

/// A single continuous pin-editing session.
pub struct SculptSession<S: DeformationSolver> {
    mesh: Option<DeformMesh>,
    brush: BrushState,
    pins: PinSet,
    controller: DeformationController<S>,
    cache: Arc<UnpackPatternCache>,
    viewport: Viewport,
    /// Latest surface hit, for the cursor overlay.
    cursor_anchor: Option<PickResult>,
}

impl<S: DeformationSolver> SculptSession<S> {
    /// Create a session with no active mesh.
    ///
    /// The pattern cache is injected so it can outlive the session and
    /// be shared across meshes of the same polygon degree.
    pub fn new(
        solver: S,
        brush_config: BrushConfig,
        viewport: Viewport,
        cache: Arc<UnpackPatternCache>,
    ) -> Self {
        Self {
            mesh: None,
            brush: BrushState::new(brush_config),
            pins: PinSet::new(),
            controller: DeformationController::new(solver),
            cache,
            viewport,
            cursor_anchor: None,
        }
    }

    /// Replace the active mesh, triangulating it for picking.
    ///
    /// Pins, brush operation, and solver state belong to the old
    /// session and are discarded.
    ///
    /// # Errors
    /// [`DeformError::MalformedTopology`] if the mesh cannot be
    /// triangulated; the session is left with no active mesh.
    pub fn set_active_mesh(&mut self, mut mesh: DeformMesh) -> Result<(), DeformError> {
        let triangles = mesh.triangulate(&self.cache)?;
        debug!(
            vertices = mesh.vertex_count(),
            triangles, "session mesh replaced"
        );
        self.mesh = Some(mesh);
        self.pins = PinSet::new();
        self.controller.reset();
        self.brush.cancel();
        self.brush.set_active(false);
        self.cursor_anchor = None;
        Ok(())
    }

    pub fn mesh(&self) -> Option<&DeformMesh> {
        self.mesh.as_ref()
    }

    pub fn mesh_mut(&mut self) -> Option<&mut DeformMesh> {
        self.mesh.as_mut()
    }

    pub fn brush(&self) -> &BrushState {
        &self.brush
    }

    pub fn pins(&self) -> &PinSet {
        &self.pins
    }

    pub fn controller(&self) -> &DeformationController<S> {
        &self.controller
    }

    /// Latest surface hit for the cursor overlay, if any.
    pub fn cursor_anchor(&self) -> Option<&PickResult> {
        self.cursor_anchor.as_ref()
    }

    /// Update the viewport on resize.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Process one pointer-move event through the full chain.
    ///
    /// Radius adjustment short-circuits before picking (the cursor is
    /// being used as a dial, not a pointer). Otherwise: pick, update
    /// hover state, place a pin on a pending request, and drag the
    /// newest pin while the primary button is held. Dragging keeps
    /// working when the cursor slides off the surface.
    ///
    /// # Errors
    /// [`DeformError::SolverFailure`] from precompute or resolve. A
    /// degenerate hit triangle is treated as "no usable hit", not an
    /// error.
    pub fn on_pointer_move(
        &mut self,
        event: &PointerEvent,
        camera: &CameraInput,
    ) -> Result<PointerOutcome, DeformError> {
        let mut outcome = PointerOutcome::default();
        let Some(mesh) = self.mesh.as_mut() else {
            return Ok(outcome);
        };

        if self.brush.adjusting_radius() {
            self.brush
                .on_pointer_event(event.button, event.modifiers, event.dx, event.dy);
            return Ok(outcome);
        }

        let hit = match pick::pick(
            event.cursor,
            &self.viewport,
            camera.view,
            camera.projection,
            mesh,
        ) {
            Ok(hit) => hit,
            // A degenerate triangle under the cursor means no usable hit
            // for this query.
            Err(DeformError::DegenerateGeometry) => None,
            Err(err) => return Err(err),
        };

        if let Some(hit) = hit {
            outcome.hit = true;
            self.brush.set_active(true);
            self.cursor_anchor = Some(hit);
            self.brush
                .on_pointer_event(event.button, event.modifiers, event.dx, event.dy);

            if self.brush.take_place_pin_request() {
                // Pin targets live in mesh-local space, like the vertex
                // buffers the solver sees.
                let target = mesh.model().inverse().transform_point3(hit.position);
                self.pins.append(hit.vertex, target);
                debug!(
                    vertex = hit.vertex,
                    pins = self.pins.len(),
                    "pin placed"
                );
                self.controller.on_pin_added(mesh, &self.pins)?;
                outcome.pin_placed = true;
                return Ok(outcome);
            }
        } else {
            self.brush.set_active(false);
            self.brush.cancel();
            // Dragging continues off-surface: the pin follows the
            // cursor even past the silhouette.
            if event.button == PointerButton::Primary && !event.modifiers.control {
                self.brush
                    .on_pointer_event(event.button, event.modifiers, event.dx, event.dy);
            }
        }

        if self.brush.mode() == BrushMode::Dragging && !self.pins.is_empty() {
            let local_camera = mesh.model().inverse().transform_point3(camera.position);
            drag_last_pin(
                &mut self.pins,
                event.dx,
                event.dy,
                local_camera,
                camera.upsign,
            )?;
            outcome.deformed = self.controller.on_pin_target_changed(mesh, &self.pins)?;
            trace!(deformed = outcome.deformed, "pin dragged");
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deform::controller::ControllerPhase;
    use deform::solver::TranslateSolver;

    fn quad_mesh() -> DeformMesh {
        DeformMesh::new(
            vec![
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(-1.0, 1.0, 0.0),
            ],
            vec![4],
            vec![0, 1, 2, 3],
        )
        .unwrap()
    }

    fn test_session() -> (SculptSession<TranslateSolver>, CameraInput) {
        let viewport = Viewport::from_size(400.0, 400.0);
        let mut session = SculptSession::new(
            TranslateSolver,
            BrushConfig::default(),
            viewport,
            Arc::new(UnpackPatternCache::new()),
        );
        session.set_active_mesh(quad_mesh()).unwrap();

        // Orthographic camera on +Z: the [-2, 2] square fills the
        // viewport, so world (x, y) maps to pixel ((x+2)*100, (2-y)*100).
        let camera = CameraInput {
            view: Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y),
            projection: Mat4::orthographic_rh_gl(-2.0, 2.0, -2.0, 2.0, 0.1, 100.0),
            position: Vec3::new(0.0, 0.0, 5.0),
            upsign: 1.0,
        };
        (session, camera)
    }

    fn place_pin_event(cursor: Vec2) -> PointerEvent {
        PointerEvent {
            cursor,
            button: PointerButton::Primary,
            modifiers: Modifiers::CONTROL,
            dx: 0.0,
            dy: 0.0,
        }
    }

    #[test]
    fn test_no_mesh_is_a_noop() {
        let viewport = Viewport::from_size(400.0, 400.0);
        let mut session: SculptSession<TranslateSolver> = SculptSession::new(
            TranslateSolver,
            BrushConfig::default(),
            viewport,
            Arc::new(UnpackPatternCache::new()),
        );
        let (_, camera) = test_session();

        let outcome = session
            .on_pointer_move(&place_pin_event(Vec2::new(200.0, 200.0)), &camera)
            .unwrap();
        assert!(!outcome.hit && !outcome.pin_placed && !outcome.deformed);
    }

    #[test]
    fn test_hover_updates_cursor_anchor() {
        let (mut session, camera) = test_session();
        // World (0, 0.1): slightly off the quad diagonal.
        let event = PointerEvent {
            cursor: Vec2::new(200.0, 190.0),
            button: PointerButton::None,
            modifiers: Modifiers::NONE,
            dx: 0.0,
            dy: 0.0,
        };

        let outcome = session.on_pointer_move(&event, &camera).unwrap();
        assert!(outcome.hit);
        assert!(session.brush().active());
        let anchor = session.cursor_anchor().expect("hover hit recorded");
        assert!((anchor.position - Vec3::new(0.0, 0.1, 0.0)).length() < 1e-4);

        // Off the surface: hover clears.
        let miss = PointerEvent {
            cursor: Vec2::new(10.0, 10.0),
            ..event
        };
        let outcome = session.on_pointer_move(&miss, &camera).unwrap();
        assert!(!outcome.hit);
        assert!(!session.brush().active());
    }

    #[test]
    fn test_place_two_pins_then_drag_deforms() {
        let (mut session, camera) = test_session();

        // Pin near vertex 0: world (-0.9, -0.8) -> pixel (110, 280).
        let outcome = session
            .on_pointer_move(&place_pin_event(Vec2::new(110.0, 280.0)), &camera)
            .unwrap();
        assert!(outcome.pin_placed);
        assert_eq!(session.pins().len(), 1);
        assert_eq!(session.controller().phase(), ControllerPhase::Idle);

        // Pin near vertex 2: world (0.9, 0.8) -> pixel (290, 120).
        let outcome = session
            .on_pointer_move(&place_pin_event(Vec2::new(290.0, 120.0)), &camera)
            .unwrap();
        assert!(outcome.pin_placed);
        assert_eq!(session.pins().vertex_ids(), vec![0, 2]);
        assert_eq!(session.controller().phase(), ControllerPhase::Precomputed);

        // Drag with the primary button: the newest pin moves and the
        // solver publishes new positions.
        let drag = PointerEvent {
            cursor: Vec2::new(290.0, 120.0),
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
            dx: 0.0,
            dy: 0.02,
        };
        let before = session.mesh().unwrap().current_positions();
        let outcome = session.on_pointer_move(&drag, &camera).unwrap();
        assert!(outcome.deformed);
        let mesh = session.mesh_mut().unwrap();
        assert!(mesh.take_dirty());
        assert_ne!(mesh.current_positions(), before);
        // Base positions never move; only offsets do.
        assert_eq!(mesh.base_positions()[0], Vec3::new(-1.0, -1.0, 0.0));
    }

    #[test]
    fn test_drag_continues_off_surface() {
        let (mut session, camera) = test_session();
        session
            .on_pointer_move(&place_pin_event(Vec2::new(110.0, 280.0)), &camera)
            .unwrap();
        session
            .on_pointer_move(&place_pin_event(Vec2::new(290.0, 120.0)), &camera)
            .unwrap();

        // Cursor far outside the quad, primary held: still drags.
        let drag = PointerEvent {
            cursor: Vec2::new(5.0, 5.0),
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
            dx: 0.01,
            dy: 0.0,
        };
        let outcome = session.on_pointer_move(&drag, &camera).unwrap();
        assert!(!outcome.hit);
        assert!(outcome.deformed);
    }

    #[test]
    fn test_radius_adjust_short_circuits_picking() {
        let (mut session, camera) = test_session();

        // First middle-button event, over the surface: enters radius
        // adjustment and scales once.
        let adjust = PointerEvent {
            cursor: Vec2::new(200.0, 190.0),
            button: PointerButton::Middle,
            modifiers: Modifiers::NONE,
            dx: 0.0,
            dy: 0.1,
        };
        session.on_pointer_move(&adjust, &camera).unwrap();
        assert!(session.brush().adjusting_radius());
        let radius = session.brush().radius();
        let anchor = session.cursor_anchor().expect("hit before adjusting").position;

        // While adjusting, subsequent events skip picking entirely: the
        // cursor can wander off-surface, the radius keeps scaling, and
        // the anchor is left alone.
        let off_surface = PointerEvent {
            cursor: Vec2::new(5.0, 5.0),
            ..adjust
        };
        session.on_pointer_move(&off_surface, &camera).unwrap();
        assert!(session.brush().radius() > radius);
        assert_eq!(session.cursor_anchor().unwrap().position, anchor);
    }

    #[test]
    fn test_single_pin_drag_updates_target_but_not_mesh() {
        let (mut session, camera) = test_session();
        session
            .on_pointer_move(&place_pin_event(Vec2::new(110.0, 280.0)), &camera)
            .unwrap();

        let drag = PointerEvent {
            cursor: Vec2::new(110.0, 280.0),
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
            dx: 0.0,
            dy: 0.05,
        };
        let target_before = session.pins().last().unwrap().target;
        let outcome = session.on_pointer_move(&drag, &camera).unwrap();
        // The controller is idle with one pin: the target moved but
        // nothing was resolved.
        assert!(!outcome.deformed);
        assert_ne!(session.pins().last().unwrap().target, target_before);
        assert!(!session.mesh_mut().unwrap().take_dirty());
    }

    #[test]
    fn test_replacing_mesh_resets_session_state() {
        let (mut session, camera) = test_session();
        session
            .on_pointer_move(&place_pin_event(Vec2::new(110.0, 280.0)), &camera)
            .unwrap();
        session
            .on_pointer_move(&place_pin_event(Vec2::new(290.0, 120.0)), &camera)
            .unwrap();
        assert_eq!(session.pins().len(), 2);

        session.set_active_mesh(quad_mesh()).unwrap();
        assert!(session.pins().is_empty());
        assert_eq!(session.controller().phase(), ControllerPhase::Idle);
        assert!(session.cursor_anchor().is_none());
    }
}
