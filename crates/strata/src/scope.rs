use bitflags::bitflags;

bitflags! {
    /// Which relation categories an operation traverses.
    ///
    /// `ALL` traverses every category. The empty scope (`NONE`) leaves
    /// relation fields at their unset value on reads and writes only the
    /// entity's own row. `REFERENCE` marks a delete that must not cascade.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RelationScope: u8 {
        /// Load only the newest member (highest key) of each has-many relation
        const NEWEST = 1 << 0;
        const BELONGS_TO = 1 << 1;
        const OWNS_ONE = 1 << 2;
        const HAS_MANY = 1 << 3;
        const REFERENCE = 1 << 4;

        const ALL = Self::BELONGS_TO.bits() | Self::OWNS_ONE.bits() | Self::HAS_MANY.bits();
    }
}

impl RelationScope {
    pub const NONE: RelationScope = RelationScope::empty();

    /// Returns `true` when an entity loaded with `self` holds at least what a
    /// load with `requested` would produce.
    ///
    /// A `NEWEST` load holds a single has-many member and therefore does not
    /// cover a full has-many load.
    pub fn covers(self, requested: RelationScope) -> bool {
        let categories = RelationScope::ALL;

        if !self.contains(requested & categories) {
            return false;
        }

        let partial_members = self.contains(RelationScope::NEWEST | RelationScope::HAS_MANY);
        let wants_members = requested.contains(RelationScope::HAS_MANY)
            && !requested.contains(RelationScope::NEWEST);

        !(partial_members && wants_members)
    }

    /// `true` when a delete with this scope cascades to related entities.
    pub fn cascades(self) -> bool {
        !self.intersects(RelationScope::REFERENCE) && self.intersects(RelationScope::ALL)
    }
}

impl Default for RelationScope {
    fn default() -> Self {
        RelationScope::ALL
    }
}
