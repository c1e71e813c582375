//! Polygon-to-triangle unpacking.
//!
//! Picking and rendering both consume a triangle list, but scene sources
//! deliver arbitrary polygon faces as a per-face vertex-count buffer plus
//! a flat index buffer. This module fan-triangulates those faces into a
//! "trimap" (one `[u32; 3]` per emitted triangle, still referencing the
//! original vertex array) and memoizes the per-degree unpack pattern so
//! the permutation is built once per polygon degree, process-wide.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::trace;

use crate::error::DeformError;

/// Cache of fan-triangulation patterns, keyed strictly by polygon degree.
///
/// A degree-`d` pattern is the index permutation `[0,1,2, 0,2,3, ...]` of
/// length `3*(d-2)`, expressed as offsets into the face's own vertex
/// list. Patterns are immutable once built and shared read-only across
/// meshes; the cache is internally synchronized so it stays valid if the
/// unpacking is ever parallelized.
#[derive(Debug, Default)]
pub struct UnpackPatternCache {
    patterns: Mutex<HashMap<u32, Arc<[u32]>>>,
}

impl UnpackPatternCache {
    /// Create an empty pattern cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or lazily build) the fan pattern for a polygon degree.
    ///
    /// Callers must have validated `degree >= 3`.
    pub fn pattern(&self, degree: u32) -> Arc<[u32]> {
        let mut patterns = self.patterns.lock().expect("pattern cache poisoned");
        Arc::clone(patterns.entry(degree).or_insert_with(|| {
            trace!(degree, "building unpack pattern");
            build_fan_pattern(degree).into()
        }))
    }

    /// Number of distinct degrees cached so far.
    pub fn len(&self) -> usize {
        self.patterns.lock().expect("pattern cache poisoned").len()
    }

    /// Whether no pattern has been built yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build the fan pattern for a degree-`d` polygon: triangle `k` is
/// `(0, k+1, k+2)` for `k` in `0..d-2`.
fn build_fan_pattern(degree: u32) -> Vec<u32> {
    let mut pattern = Vec::with_capacity(3 * (degree as usize - 2));
    for k in 1..degree - 1 {
        pattern.extend_from_slice(&[0, k, k + 1]);
    }
    pattern
}

/// Unpack polygon faces into a triangle list.
///
/// `counts` holds one vertex count per original face; `indices` is the
/// flat concatenation of every face's vertex indices. Returns the trimap
/// and the emitted triangle count (`sum(count - 2)` over faces).
///
/// Degree-3 faces pass through unchanged in their original winding.
/// When every face shares one degree the pattern is applied across the
/// whole buffer in a single pass; this is behaviorally identical to
/// per-face application.
///
/// # Errors
/// [`DeformError::MalformedTopology`] if any face has degree < 3 or the
/// count and index buffers disagree in total length.
pub fn unpack(
    counts: &[u32],
    indices: &[u32],
    cache: &UnpackPatternCache,
) -> Result<(Vec<[u32; 3]>, usize), DeformError> {
    if counts.is_empty() {
        return Ok((Vec::new(), 0));
    }
    if let Some(&bad) = counts.iter().find(|&&c| c < 3) {
        return Err(DeformError::MalformedTopology(format!(
            "face of degree {bad}, minimum is 3"
        )));
    }
    let total: usize = counts.iter().map(|&c| c as usize).sum();
    if total != indices.len() {
        return Err(DeformError::MalformedTopology(format!(
            "counts sum to {total} but {} indices supplied",
            indices.len()
        )));
    }

    let tri_count: usize = counts.iter().map(|&c| c as usize - 2).sum();
    let mut trimap = Vec::with_capacity(tri_count);

    let uniform = counts.iter().all(|&c| c == counts[0]);
    if uniform && counts[0] == 3 {
        // Already triangles: pass indices through in original winding.
        for face in indices.chunks_exact(3) {
            trimap.push([face[0], face[1], face[2]]);
        }
    } else if uniform {
        // One pattern applied across the whole buffer.
        let degree = counts[0];
        let pattern = cache.pattern(degree);
        for face in indices.chunks_exact(degree as usize) {
            emit_face(face, &pattern, &mut trimap);
        }
    } else {
        let mut cursor = 0usize;
        for &count in counts {
            let face = &indices[cursor..cursor + count as usize];
            if count == 3 {
                trimap.push([face[0], face[1], face[2]]);
            } else {
                let pattern = cache.pattern(count);
                emit_face(face, &pattern, &mut trimap);
            }
            cursor += count as usize;
        }
    }

    debug_assert_eq!(trimap.len(), tri_count);
    Ok((trimap, tri_count))
}

/// Apply a fan pattern to one face's slice of the index buffer.
fn emit_face(face: &[u32], pattern: &[u32], trimap: &mut Vec<[u32; 3]>) {
    for tri in pattern.chunks_exact(3) {
        trimap.push([
            face[tri[0] as usize],
            face[tri[1] as usize],
            face[tri[2] as usize],
        ]);
    }
}
