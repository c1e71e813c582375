//! Brush state machine for pin placement and radius adjustment.
//!
//! One event type drives everything: [`BrushState::on_pointer_event`]
//! classifies the current button/modifier chord into an explicit mode
//! (idle, dragging, adjusting radius) plus an edge-triggered "place pin"
//! request. The hover flag (`active`) is orthogonal and owned by the
//! picking step, not the chord.

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Which pointer button is held for the current event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerButton {
    /// No button held.
    #[default]
    None,
    /// Primary (left) button.
    Primary,
    /// Middle button.
    Middle,
    /// Secondary (right) button.
    Secondary,
}

/// Modifier keys held for the current event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub control: bool,
}

impl Modifiers {
    pub const NONE: Self = Self { control: false };
    pub const CONTROL: Self = Self { control: true };
}

/// Brush configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrushConfig {
    /// Starting radius in world units.
    pub radius: f32,
    /// Floor applied after radius adjustment; keeps the radius positive.
    pub min_radius: f32,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            radius: 10.0,
            min_radius: 1e-3,
        }
    }
}

/// What the current pointer chord means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrushMode {
    /// No recognized chord.
    #[default]
    Idle,
    /// Primary button held: dragging the newest pin.
    Dragging,
    /// Middle button held: scaling the brush radius.
    AdjustingRadius,
}

/// Per-brush interaction state.
///
/// Created once per brush and mutated per pointer event; never
/// serialized. The brush persists for the life of the editing session.
#[derive(Debug, Clone)]
pub struct BrushState {
    config: BrushConfig,
    /// Current brush radius in world units. Always positive.
    radius: f32,
    /// A valid surface hit exists under the cursor.
    active: bool,
    /// Current chord classification.
    mode: BrushMode,
    /// Edge-triggered pin-placement request, consumed by
    /// [`BrushState::take_place_pin_request`].
    place_pin_requested: bool,
}

impl Default for BrushState {
    fn default() -> Self {
        Self::new(BrushConfig::default())
    }
}

impl BrushState {
    /// Create a brush with the given configuration.
    pub fn new(config: BrushConfig) -> Self {
        Self {
            radius: config.radius,
            config,
            active: false,
            mode: BrushMode::Idle,
            place_pin_requested: false,
        }
    }

    /// Current radius in world units.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Whether a valid hit exists under the cursor.
    pub fn active(&self) -> bool {
        self.active
    }

    /// Record the hover result of the latest pick.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Current chord classification.
    pub fn mode(&self) -> BrushMode {
        self.mode
    }

    /// Whether a drag or radius adjustment is in progress.
    pub fn operating(&self) -> bool {
        self.mode != BrushMode::Idle
    }

    /// Whether the middle-button radius adjustment is in progress.
    pub fn adjusting_radius(&self) -> bool {
        self.mode == BrushMode::AdjustingRadius
    }

    /// Consume the edge-triggered pin-placement request. Returns true at
    /// most once per press.
    pub fn take_place_pin_request(&mut self) -> bool {
        std::mem::take(&mut self.place_pin_requested)
    }

    /// Clear any in-progress operation (e.g. when the cursor leaves the
    /// surface or the active mesh changes).
    pub fn cancel(&mut self) {
        self.mode = BrushMode::Idle;
        self.place_pin_requested = false;
    }

    /// Classify a pointer event's button/modifier chord.
    ///
    /// `dx`/`dy` are the input layer's normalized pointer deltas; they
    /// only matter for radius adjustment.
    pub fn on_pointer_event(
        &mut self,
        button: PointerButton,
        modifiers: Modifiers,
        dx: f32,
        dy: f32,
    ) {
        match button {
            PointerButton::Primary if modifiers.control => {
                self.mode = BrushMode::Idle;
                self.place_pin_requested = true;
            }
            PointerButton::Primary => {
                self.mode = BrushMode::Dragging;
            }
            PointerButton::Middle => {
                self.mode = BrushMode::AdjustingRadius;
                // Scale by whichever delta dominates, proportionally to
                // the current radius (exponential-feel adjustment).
                let step = if dx.abs() > dy.abs() { -dx } else { dy };
                self.set_radius(self.radius + step * self.radius * 3.0);
                trace!(radius = self.radius, "brush radius adjusted");
            }
            _ => {
                self.mode = BrushMode::Idle;
            }
        }
    }

    /// Set the radius directly, floored at the configured minimum.
    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius.max(self.config.min_radius);
    }
}
