//! Pinned-vertex collection for one editing session.

use glam::Vec3;

use crate::error::DeformError;

/// A user-placed positional constraint anchored to one mesh vertex.
///
/// The anchor vertex is immutable after creation; the target position
/// mutates during drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pin {
    /// Index into the mesh's vertex array.
    pub vertex: u32,
    /// World-space target position driving the solve.
    pub target: Vec3,
}

/// Ordered, append-only collection of pins.
///
/// Membership only grows: pins are ordered by creation time, never
/// reordered, and never removed. The set is owned by the editing session
/// and dropped when the active mesh changes.
#[derive(Debug, Clone, Default)]
pub struct PinSet {
    pins: Vec<Pin>,
}

impl PinSet {
    /// Create an empty pin set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new pin. The only membership mutation.
    pub fn append(&mut self, vertex: u32, target: Vec3) {
        self.pins.push(Pin { vertex, target });
    }

    /// Replace the target position of the most recently added pin.
    ///
    /// # Errors
    /// [`DeformError::EmptyPinSet`] if no pins exist.
    pub fn update_last(&mut self, target: Vec3) -> Result<(), DeformError> {
        let pin = self.pins.last_mut().ok_or(DeformError::EmptyPinSet)?;
        pin.target = target;
        Ok(())
    }

    /// The most recently added pin.
    pub fn last(&self) -> Option<&Pin> {
        self.pins.last()
    }

    /// Anchor vertex ids in creation order, for solver precomputation.
    pub fn vertex_ids(&self) -> Vec<u32> {
        self.pins.iter().map(|p| p.vertex).collect()
    }

    /// Target positions in creation order, for incremental resolves.
    pub fn targets(&self) -> Vec<Vec3> {
        self.pins.iter().map(|p| p.target).collect()
    }

    /// All pins in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Pin> {
        self.pins.iter()
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}
