//! Stack growth for recursive graph walks.
//!
//! Layout resolution, triviality classification, and the emitter's
//! dependency walk all recurse along by-value containment. Generated headers
//! can nest aggregates and array-of-array types thousands of levels deep, so
//! every such recursion goes through [`with_stack`].
//!
//! On native targets the stack is grown with `stacker` when fewer than
//! [`RED_ZONE`] bytes remain; on wasm32 the closure is called directly.

/// Remaining stack below which a new segment is allocated.
pub const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment.
pub const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f`, first growing the stack if less than [`RED_ZONE`] remains.
///
/// ```text
/// fn resolve(&mut self, id: ItemId) -> LayoutState {
///     with_stack(|| self.resolve_uncached(id))
/// }
/// ```
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn with_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn with_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests;
