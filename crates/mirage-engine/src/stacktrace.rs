//! Stack trace normalization for real-method calls on mocks.
//!
//! A mock whose handler falls back to the real implementation routes the
//! call through the interception machinery twice: once entering the mock's
//! method, once re-entering the real body. A throwable escaping the real
//! body would show both traversals plus every machinery frame in between.
//! [`remove_recursive_calls`] collapses that span so the trace reads as a
//! single direct call on the target type.

use mirage_sdk::Thrown;

/// Collapse duplicated interception frames in `throwable`.
///
/// Frames attributed to `marker_type` delimit the span: everything after
/// the first such frame up to and including the last one is removed, so
/// exactly one `marker_type` frame survives. With fewer than two marker
/// frames the throwable is returned untouched, frame vector and all.
pub fn remove_recursive_calls(mut throwable: Thrown, marker_type: &str) -> Thrown {
    let mut positions = throwable
        .frames
        .iter()
        .enumerate()
        .filter(|(_, frame)| frame.type_name == marker_type)
        .map(|(i, _)| i);
    let first = match positions.next() {
        Some(i) => i,
        None => return throwable,
    };
    let last = match positions.last() {
        Some(i) => i,
        None => return throwable,
    };
    throwable.frames.drain(first + 1..=last);
    throwable
}
