use std::marker::PhantomData;
use std::ops::Index;

use crate::error::TopologyError;
use crate::ids::DenseId;

/// An entry stored in a [`Buffer`], carrying its own dense id.
pub trait Entity {
    type Id: DenseId;

    /// The id this entity was stored under.
    fn id(&self) -> Self::Id;

    /// Overwrite the stored id (used when the entity moves during a reindex).
    fn set_id(&mut self, id: Self::Id);
}

/// Old-to-new id translation produced by [`Buffer::reindex`].
///
/// Entries dropped by the keep mask map to `None`; survivors map to their new
/// dense position, preserving original relative order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdMap<I: DenseId> {
    forward: Vec<Option<I>>,
    new_len: usize,
}

impl<I: DenseId> IdMap<I> {
    /// The identity map over `len` ids.
    pub fn identity(len: usize) -> Self {
        Self { forward: (0..len).map(|i| Some(I::from_index(i))).collect(), new_len: len }
    }

    /// Build the map implied by a keep mask.
    pub fn from_keep_mask(keep: &[bool]) -> Self {
        let mut next = 0;
        let forward = keep.iter()
            .map(|&k| k.then(|| { next += 1; I::from_index(next - 1) }))
            .collect();
        Self { forward, new_len: next }
    }

    /// The new id for `old`, or `None` if it was dropped or never existed.
    #[inline]
    pub fn get(&self, old: I) -> Option<I> {
        self.forward.get(old.index()).copied().flatten()
    }

    /// Like [`get`](Self::get), but a dropped id is an error.
    pub fn require(&self, old: I) -> Result<I, TopologyError> {
        self.get(old).ok_or(TopologyError::OutOfRange { kind: I::KIND, id: old.index(), len: self.new_len })
    }

    /// Number of ids before the reindex.
    #[inline] pub fn old_len(&self) -> usize { self.forward.len() }

    /// Number of ids after the reindex.
    #[inline] pub fn new_len(&self) -> usize { self.new_len }

    /// Number of ids that were dropped.
    #[inline] pub fn dropped(&self) -> usize { self.old_len() - self.new_len }

    /// True if every old id maps to itself.
    pub fn is_identity(&self) -> bool {
        self.forward.iter().enumerate().all(|(i, new)| new.map(|n| n.index()) == Some(i))
    }

    /// Iterate `(old, new)` pairs of surviving ids in ascending order.
    pub fn retained(&self) -> impl Iterator<Item = (I, I)> + '_ {
        self.forward.iter().enumerate()
            .filter_map(|(i, new)| new.map(|n| (I::from_index(i), n)))
    }
}

/// Dense arena of entities addressed by their ids.
///
/// The id of every stored entity equals its position; [`append`](Self::append)
/// rejects anything else and [`reindex`](Self::reindex) re-establishes the
/// invariant after removals.
#[derive(Clone, Debug, PartialEq)]
pub struct Buffer<T: Entity> {
    items: Vec<T>,
    _id: PhantomData<T::Id>,
}

impl<T: Entity> Default for Buffer<T> {
    fn default() -> Self { Self::new() }
}

impl<T: Entity> Buffer<T> {
    pub fn new() -> Self { Self { items: Vec::new(), _id: PhantomData } }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { items: Vec::with_capacity(capacity), _id: PhantomData }
    }

    #[inline] pub fn len(&self) -> usize { self.items.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// The id the next appended entity must carry.
    #[inline] pub fn next_id(&self) -> T::Id { T::Id::from_index(self.items.len()) }

    /// Append an entity whose id must equal the current length.
    pub fn append(&mut self, entity: T) -> Result<T::Id, TopologyError> {
        let id = entity.id();
        if id.index() != self.items.len() {
            return Err(TopologyError::NonDenseId {
                kind: T::Id::KIND,
                expected: self.items.len(),
                found: id.index(),
            });
        }
        self.items.push(entity);
        Ok(id)
    }

    /// Bounds-checked lookup.
    pub fn at(&self, id: T::Id) -> Result<&T, TopologyError> {
        let len = self.items.len();
        self.items.get(id.index()).ok_or(TopologyError::OutOfRange { kind: T::Id::KIND, id: id.index(), len })
    }

    /// Bounds-checked mutable lookup.
    pub fn at_mut(&mut self, id: T::Id) -> Result<&mut T, TopologyError> {
        let len = self.items.len();
        self.items.get_mut(id.index()).ok_or(TopologyError::OutOfRange { kind: T::Id::KIND, id: id.index(), len })
    }

    #[inline] pub fn get(&self, id: T::Id) -> Option<&T> { self.items.get(id.index()) }

    #[inline] pub fn contains(&self, id: T::Id) -> bool { id.index() < self.items.len() }

    #[inline] pub fn iter(&self) -> std::slice::Iter<'_, T> { self.items.iter() }

    /// Mutable iteration over payloads. Callers must not change ids.
    #[inline] pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> { self.items.iter_mut() }

    #[inline] pub fn ids(&self) -> impl Iterator<Item = T::Id> + '_ { (0..self.items.len()).map(T::Id::from_index) }

    #[inline] pub fn as_slice(&self) -> &[T] { &self.items }

    /// Compact the buffer to the entries whose `keep` flag is set.
    ///
    /// Survivors get new dense ids in their original relative order. The
    /// returned map must be applied to every structure holding old ids.
    pub fn reindex(self, keep: &[bool]) -> Result<(Self, IdMap<T::Id>), TopologyError> {
        if keep.len() != self.items.len() {
            return Err(TopologyError::MaskLength { mask: keep.len(), len: self.items.len() });
        }

        let map = IdMap::from_keep_mask(keep);
        let mut items = Vec::with_capacity(map.new_len());
        for (mut item, &k) in self.items.into_iter().zip(keep) {
            if k {
                item.set_id(T::Id::from_index(items.len()));
                items.push(item);
            }
        }

        Ok((Self { items, _id: PhantomData }, map))
    }
}

impl<T: Entity> Index<T::Id> for Buffer<T> {
    type Output = T;

    #[inline]
    fn index(&self, id: T::Id) -> &T { &self.items[id.index()] }
}

impl<'a, T: Entity> IntoIterator for &'a Buffer<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter { self.items.iter() }
}
