use super::{BodyKey, Constraint};

use thunderdome as td;

/// Key type to look up a constraint stored in the physics world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConstraintKey(pub(super) td::Index);

impl ConstraintKey {
    /// Get the underlying [`thunderdome::Index`][thunderdome::Index] of this key.
    #[inline]
    pub fn index(&self) -> td::Index {
        self.0
    }
}

/// Manager struct holding the persistent constraints of a physics world.
#[derive(Clone, Debug, Default)]
pub struct ConstraintSet {
    pub(super) constraints: td::Arena<Constraint>,
}

impl ConstraintSet {
    #[inline]
    pub(super) fn new() -> Self {
        Self::default()
    }

    /// Add a constraint to the set.
    /// Returns a key that can be used to remove it later.
    #[inline]
    pub(super) fn insert(&mut self, constraint: Constraint) -> ConstraintKey {
        ConstraintKey(self.constraints.insert(constraint))
    }

    /// Access a constraint, if it still exists.
    #[inline]
    pub fn get(&self, key: ConstraintKey) -> Option<&Constraint> {
        self.constraints.get(key.0)
    }

    /// Remove a constraint, returning it if it still existed.
    #[inline]
    pub(super) fn remove(&mut self, key: ConstraintKey) -> Option<Constraint> {
        self.constraints.remove(key.0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.constraints.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConstraintKey, &Constraint)> {
        self.constraints
            .iter()
            .map(|(idx, c)| (ConstraintKey(idx), c))
    }

    /// Keys of all constraints that act on the given body.
    pub fn touching(&self, body: BodyKey) -> impl Iterator<Item = ConstraintKey> + '_ {
        self.iter()
            .filter(move |(_, c)| c.bodies().contains(&body))
            .map(|(key, _)| key)
    }
}
