use super::Directives;
use crate::RelationScope;

use strata_core::stmt::{Entity, Key};
use std::collections::HashMap;

/// State of one top-level mapper call.
///
/// Created when a call starts, threaded through every recursive step and
/// dropped (or reset, for a session) when it returns.
#[derive(Debug, Default)]
pub(crate) struct Cx {
    pub(crate) cache: IdentityCache,

    /// Directives of the read in progress
    pub(crate) directives: Directives,

    pub(crate) memo: JoinMemo,

    /// Session cache set aside while a directive-shaped read runs
    stashed: Option<IdentityCache>,
}

impl Cx {
    /// Installs the directives of a read.
    ///
    /// Entities shaped by directives differ from what a plain read returns,
    /// so such a read starts from an empty cache and its entries are
    /// dropped by [`Cx::end_call`].
    pub(crate) fn begin_call(&mut self, directives: Directives) {
        if !directives.is_empty() && self.stashed.is_none() {
            self.stashed = Some(std::mem::take(&mut self.cache));
        }
        self.directives = directives;
    }

    /// Clears the per-call scratch state. Completed cache entries survive
    /// so a session keeps reusing them.
    pub(crate) fn end_call(&mut self) {
        self.directives = Directives::default();

        match self.stashed.take() {
            Some(cache) => self.cache = cache,
            None => self.cache.discard_loading(),
        }
    }

    /// Ends a call that wrote rows. Cached owners may embed what was
    /// written, so nothing read before the write is reused.
    pub(crate) fn end_write(&mut self) {
        self.directives = Directives::default();
        self.stashed = None;
        self.cache.clear();
        self.memo.clear();
    }
}

/// Borrowed session context, or a context owned by a single call.
#[derive(Debug)]
pub(crate) enum CxHandle<'a> {
    Owned(Cx),
    Borrowed(&'a mut Cx),
}

impl CxHandle<'_> {
    pub(crate) fn get_mut(&mut self) -> &mut Cx {
        match self {
            CxHandle::Owned(cx) => cx,
            CxHandle::Borrowed(cx) => cx,
        }
    }
}

/// Entities already materialized within a call, by model name and key.
#[derive(Debug, Default)]
pub(crate) struct IdentityCache {
    entries: HashMap<(String, Key), CacheEntry>,
}

#[derive(Debug)]
struct CacheEntry {
    /// `None` while the entity is being loaded
    entity: Option<Entity>,
    depth: u8,
    scope: RelationScope,
}

#[derive(Debug, PartialEq)]
pub(crate) enum Lookup {
    /// A cached entity loaded at least as deep and as broad as requested
    Hit(Entity),

    /// The entity is being materialized further up the call
    Loading,

    Miss,
}

impl IdentityCache {
    pub(crate) fn lookup(
        &self,
        model: &str,
        key: &Key,
        depth: u8,
        scope: RelationScope,
    ) -> Lookup {
        let Some(entry) = self.entries.get(&(model.to_string(), key.clone())) else {
            return Lookup::Miss;
        };

        match &entry.entity {
            None => Lookup::Loading,
            Some(entity) if entry.depth >= depth && entry.scope.covers(scope) => {
                Lookup::Hit(entity.clone())
            }
            Some(_) => Lookup::Miss,
        }
    }

    /// Marks the entity as being loaded, replacing an insufficient entry.
    pub(crate) fn begin(&mut self, model: &str, key: Key, depth: u8, scope: RelationScope) {
        self.entries.insert(
            (model.to_string(), key),
            CacheEntry {
                entity: None,
                depth,
                scope,
            },
        );
    }

    /// Completes the entity. A completed entry loaded at least as deep and
    /// as broad is kept.
    pub(crate) fn finish(
        &mut self,
        model: &str,
        key: Key,
        entity: Entity,
        depth: u8,
        scope: RelationScope,
    ) {
        let id = (model.to_string(), key);

        if let Some(CacheEntry {
            entity: Some(_),
            depth: cached,
            scope: covered,
        }) = self.entries.get(&id)
        {
            if *cached >= depth && covered.covers(scope) {
                return;
            }
        }

        self.entries.insert(
            id,
            CacheEntry {
                entity: Some(entity),
                depth,
                scope,
            },
        );
    }

    pub(crate) fn evict(&mut self, model: &str, key: &Key) {
        self.entries.remove(&(model.to_string(), key.clone()));
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drops entries left in progress by a call that failed.
    fn discard_loading(&mut self) {
        self.entries.retain(|_, entry| entry.entity.is_some());
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Join-table links read within a call.
///
/// Keyed by join table, self column and external column, then by the key
/// of the owning entity.
#[derive(Debug, Default)]
pub(crate) struct JoinMemo {
    links: HashMap<(String, String, String), HashMap<Key, Vec<Key>>>,
}

impl JoinMemo {
    pub(crate) fn get(&self, table: &str, self_column: &str, external: &str, owner: &Key) -> Option<&[Key]> {
        self.links
            .get(&(table.to_string(), self_column.to_string(), external.to_string()))?
            .get(owner)
            .map(Vec::as_slice)
    }

    pub(crate) fn insert(
        &mut self,
        table: &str,
        self_column: &str,
        external: &str,
        owner: Key,
        members: Vec<Key>,
    ) {
        self.links
            .entry((table.to_string(), self_column.to_string(), external.to_string()))
            .or_default()
            .insert(owner, members);
    }

    pub(crate) fn clear(&mut self) {
        self.links.clear();
    }

    /// Forgets every link read from `table`.
    pub(crate) fn invalidate(&mut self, table: &str) {
        self.links.retain(|(t, _, _), _| t != table);
    }
}
