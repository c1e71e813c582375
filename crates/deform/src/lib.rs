//! Pin-based interactive mesh deformation core.
//!
//! This crate implements the pipeline behind an interactive
//! mesh-sculpting tool: the user points at a surface, drops positional
//! constraints ("pins"), and drags them while an external solver keeps
//! the rest of the surface following smoothly.
//!
//! - [`triangulate`] - polygon faces to a triangle index buffer, with a
//!   memoized per-degree unpack-pattern cache
//! - [`mesh`] - session-owned vertex/offset/trimap buffers
//! - [`pick`] - cursor unprojection and ray-mesh intersection
//! - [`brush`] - pointer-chord state machine (pin placement, radius)
//! - [`pins`] - the ordered, append-only pin collection
//! - [`solver`] - the seam to the external deformation solver
//! - [`controller`] - precompute/resolve orchestration
//!
//! Everything runs synchronously inside one pointer-event handler; the
//! only shared structure is the pattern cache, which is internally
//! synchronized.

pub mod brush;
pub mod controller;
pub mod error;
pub mod mesh;
pub mod pick;
pub mod pins;
pub mod solver;
pub mod triangulate;

pub use brush::{BrushConfig, BrushMode, BrushState, Modifiers, PointerButton};
pub use controller::{ControllerPhase, DeformationController, drag_last_pin};
pub use error::DeformError;
pub use mesh::DeformMesh;
pub use pick::{PickResult, Viewport, pick};
pub use pins::{Pin, PinSet};
pub use solver::{CONSTRAINT_DIM, DeformationSolver, TranslateSolver};
pub use triangulate::UnpackPatternCache;
