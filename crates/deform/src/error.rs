//! Errors for the deformation core.

/// Errors that can occur in the deformation pipeline.
///
/// A pick that intersects nothing is *not* an error; it is reported as
/// `Ok(None)` by the picker so callers can treat "cursor not over
/// surface" as a normal negative result.
#[derive(Debug, thiserror::Error)]
pub enum DeformError {
    /// Face-count/index buffers are inconsistent or a face has degree < 3.
    /// Fatal to loading that mesh; unpacking is aborted.
    #[error("malformed mesh topology: {0}")]
    MalformedTopology(String),

    /// The hit triangle's edges produce a near-zero-length normal.
    /// Recoverable: the query simply has no usable hit.
    #[error("degenerate triangle at pick hit")]
    DegenerateGeometry,

    /// A pin-target update was requested with no pins placed.
    /// Recoverable: callers treat this as a no-op.
    #[error("pin set is empty")]
    EmptyPinSet,

    /// The external solver rejected a precomputation or resolve.
    /// The mesh's last-known-good positions are left untouched.
    #[error("solver failure: {0}")]
    SolverFailure(String),
}
