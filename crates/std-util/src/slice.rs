use std::collections::HashSet;
use std::hash::Hash;

#[macro_export]
macro_rules! assert_empty {
    ($e:expr) => {{
        let value = &$e;
        assert!(value.is_empty(), "expected empty; actual={:?}", value);
    }};
}

#[macro_export]
macro_rules! assert_len {
    ($e:expr, $len:expr) => {{
        let value = &$e;
        assert_eq!(value.len(), $len, "unexpected length; actual={:?}", value);
    }};
}

pub trait SliceUtil<T> {
    /// Returns `true` when no two elements are equal.
    fn is_unique(&self) -> bool;
}

impl<T: Hash + Eq> SliceUtil<T> for [T] {
    fn is_unique(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.len());
        self.iter().all(|item| seen.insert(item))
    }
}
