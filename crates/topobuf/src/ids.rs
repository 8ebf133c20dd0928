//! Strongly-typed dense identifiers.
//!
//! Every buffer addresses its entries by a `u32` wrapper whose value is the
//! entry's position in the buffer.  Ids are only meaningful together with
//! the buffer that issued them; after a reindex the old ids must be mapped
//! through the returned [`IdMap`](crate::IdMap).

use std::fmt;
use std::hash::Hash;

/// An identifier that addresses a position in a dense buffer.
pub trait DenseId: Copy + Eq + Ord + Hash + fmt::Debug + fmt::Display {
    /// Human readable kind, used in error messages.
    const KIND: &'static str;

    /// The largest representable id (used as an upper bound in range queries).
    const MAX: Self;

    /// Build an id from a buffer position.
    fn from_index(index: usize) -> Self;

    /// The buffer position of this id.
    fn index(self) -> usize;
}

macro_rules! idx {
    ($name:ident, $kind:literal) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl DenseId for $name {
            const KIND: &'static str = $kind;
            const MAX: Self = Self(u32::MAX);

            #[inline]
            fn from_index(index: usize) -> Self {
                debug_assert!(index < u32::MAX as usize, "{} index {index} overflows u32", $kind);
                Self(index as u32)
            }

            #[inline] fn index(self) -> usize { self.0 as usize }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

idx!(NodeId, "node");
idx!(RingId, "ring");
idx!(AreaId, "area");
