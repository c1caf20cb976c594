//! Dense graph keys.
//!
//! Ids are allocated in creation order and never reused within a run, so
//! ordering by id is the same as "first encountered" ordering. Every stage
//! that needs a deterministic iteration order relies on this.

use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Create an id from a raw index.
            #[inline]
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// Get the index into the owning table.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            /// Get the raw `u32` value.
            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

define_id!(
    /// Key of an `Item` in the `ItemGraph`.
    ItemId
);

define_id!(
    /// Key of an interned `Ty` in the `TypeTable`.
    TypeId
);

define_id!(
    /// Translation unit index within a run. Part of the importer's
    /// deduplication key.
    TuId
);

#[cfg(test)]
mod tests;
