//! Scene tree and sculpt-session orchestration for Pliant.
//!
//! - [`node`] - scene tree with explicit transform propagation
//! - [`session`] - pointer-event orchestration over the deformation core

pub mod node;
pub mod session;

pub use node::{NodeKind, SceneNode};
pub use session::{CameraInput, PointerEvent, PointerOutcome, SculptSession};
