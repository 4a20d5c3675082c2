use super::{cx::Lookup, key_param, Cx, Engine, Scoped};
use crate::RelationScope;

use strata_core::{
    driver::Row,
    err,
    schema::{HasMany, Model, RelationRef},
    stmt::{
        Condition, Connective, Direction, Entity, Expr, Filter, JoinKind, Key, Op, OrderBy, Query,
        Record, Value,
    },
    Result,
};

use async_recursion::async_recursion;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use tracing::trace;

/// Clauses applied to the root table of a fetch.
///
/// Columns must be qualified with the root alias, see [`root_alias`].
#[derive(Debug, Clone, Default)]
pub(crate) struct Clauses {
    pub(crate) filter: Filter,
    pub(crate) order_by: Vec<OrderBy>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
}

impl Clauses {
    pub(crate) fn and(&mut self, column: String, op: Op, value: Value) {
        self.filter.push(
            Connective::And,
            Condition::Compare {
                lhs: Expr::Column(column),
                op,
                rhs: Expr::Value(value),
            },
        );
    }

    pub(crate) fn order(&mut self, column: String, direction: Direction) {
        self.order_by.push(OrderBy {
            expr: Expr::Column(column),
            direction,
        });
    }
}

/// Alias of the root table of a fetch at `depth`.
pub(crate) fn root_alias(model: &Model, depth: u8) -> String {
    format!("{}_d{depth}", model.table)
}

/// Label of a selected column.
fn label(alias: &str, column: &str) -> String {
    format!("{alias}_{column}")
}

fn column_value(row: &Row, alias: &str, column: &str) -> Value {
    row.get(&label(alias, column)).cloned().unwrap_or_default()
}

/// One table of a fetch and the single relations joined to it.
struct Plan<'a> {
    model: &'a Model,
    alias: String,
    depth: u8,
    children: Vec<Joined<'a>>,
}

struct Joined<'a> {
    field: &'a str,

    /// Local column holding the reference
    column: &'a str,

    /// Column of the target the reference points at
    target_column: &'a str,

    /// Filter directives, applied to the join condition
    filter: Vec<(String, Op, Value)>,

    plan: Plan<'a>,
}

/// Entities materialized by one fetch.
#[derive(Default)]
struct Batch {
    /// Deepest depth each entity was materialized at
    seen: HashMap<(String, Key), u8>,

    /// Entities whose nested fields are being materialized
    path: Vec<(String, Key)>,

    /// Keys whose has-many members are still to be loaded, by model and depth
    pending: IndexMap<(String, u8), Vec<Key>>,
}

enum Slot {
    Ready(Entity),

    /// Materialized earlier in the same fetch, at least as deep
    Dup(String, Key),

    Fresh(Node),
}

struct Node {
    model: String,
    key: Key,
    depth: u8,
    record: Record,
    children: Vec<(String, Slot)>,
}

/// Loaded has-many members by owning entity and its depth, then by field.
type Members = HashMap<(String, Key, u8), Vec<(String, Vec<Value>)>>;

impl Engine {
    /// Loads the entities matching `clauses` in one SELECT, then their
    /// has-many members.
    ///
    /// When `group` names a column, its raw value is returned next to each
    /// entity. Inline has-many loading uses this to tell owners apart.
    #[async_recursion]
    pub(crate) async fn fetch(
        &self,
        cx: &mut Cx,
        model: &Model,
        depth: u8,
        scope: RelationScope,
        clauses: Clauses,
        group: Option<&str>,
    ) -> Result<Vec<(Value, Entity)>> {
        let mut counter = 0;
        let alias = root_alias(model, depth);
        let plan = self.plan(cx, model, alias.clone(), depth, scope, &mut counter)?;

        let mut query = select(
            &plan,
            Query::select(Vec::<String>::new()).from_as(&model.table, &alias),
        );
        query.filter = clauses.filter;
        query.order_by = clauses.order_by;
        query.limit = clauses.limit;
        query.offset = clauses.offset;

        let rows = self.exec(query).await?.into_rows();

        let mut batch = Batch::default();
        let mut slots = Vec::with_capacity(rows.len());

        for row in &rows {
            let group = match group {
                Some(column) => column_value(row, &alias, column),
                None => Value::Null,
            };
            slots.push((group, self.materialize(cx, &plan, row, scope, &mut batch)?));
        }

        let mut members = self.load_members(cx, &batch, scope).await?;
        let mut done = HashMap::new();

        Ok(slots
            .into_iter()
            .map(|(group, slot)| (group, assemble(cx, slot, scope, &mut members, &mut done)))
            .collect())
    }

    /// Loads entities by key, reusing what the identity cache holds.
    ///
    /// Every requested key is present in the returned map; keys that were
    /// not found map to an absent entity.
    #[async_recursion]
    pub(crate) async fn get_many(
        &self,
        cx: &mut Cx,
        model: &Model,
        keys: &[Key],
        depth: u8,
        scope: RelationScope,
        mut clauses: Clauses,
    ) -> Result<IndexMap<Key, Entity>> {
        let mut ret = IndexMap::with_capacity(keys.len());
        let mut misses = vec![];

        for key in keys {
            if ret.contains_key(key) {
                continue;
            }

            let absent = Entity::absent(&model.name, key.to_value());

            if depth < 1 {
                ret.insert(key.clone(), absent);
                continue;
            }

            match cx.cache.lookup(&model.name, key, depth, scope) {
                Lookup::Hit(entity) => {
                    trace!(model = %model.name, ?key, "identity cache hit");
                    ret.insert(key.clone(), entity);
                }
                Lookup::Loading => {
                    ret.insert(key.clone(), absent);
                }
                Lookup::Miss => {
                    ret.insert(key.clone(), absent);
                    misses.push(key);
                }
            }
        }

        if misses.is_empty() {
            return Ok(ret);
        }

        let column = format!("{}.{}", root_alias(model, depth), model.primary_key_column);
        let mut params = misses
            .iter()
            .map(|key| key_param(model, &key.to_value()))
            .collect::<Result<Vec<_>>>()?;

        if params.len() == 1 {
            clauses.and(column, Op::Eq, params.remove(0));
        } else {
            clauses.and(column, Op::In, Value::List(params));
        }

        for (_, entity) in self.fetch(cx, model, depth, scope, clauses, None).await? {
            if let Some(key) = entity.key(&model.primary_key) {
                ret.insert(key, entity);
            }
        }

        Ok(ret)
    }

    fn plan<'a>(
        &'a self,
        cx: &Cx,
        model: &'a Model,
        alias: String,
        depth: u8,
        scope: RelationScope,
        counter: &mut usize,
    ) -> Result<Plan<'a>> {
        let mut plan = Plan {
            model,
            alias,
            depth,
            children: vec![],
        };

        if depth <= 1 {
            return Ok(plan);
        }

        let mut relations = vec![];

        if scope.contains(RelationScope::OWNS_ONE) {
            relations.extend(model.owns_one.iter().map(|rel| {
                (rel.field.as_str(), rel.target.as_str(), rel.column.as_str(), rel.conditional, None)
            }));
        }

        if scope.contains(RelationScope::BELONGS_TO) {
            relations.extend(model.belongs_to.iter().map(|rel| {
                (rel.field.as_str(), rel.target.as_str(), rel.column.as_str(), false, rel.by.as_deref())
            }));
        }

        for (field, target, column, conditional, by) in relations {
            let filter = cx
                .directives
                .get(&model.name, Some(field))
                .map(|scoped| scoped.filter.clone())
                .unwrap_or_default();

            if conditional && filter.is_empty() {
                continue;
            }

            let target = self.schema.model(target).map_err(|err| {
                err.context(err!("relation `{}.{field}`", model.name))
            })?;

            let target_column = match by {
                Some(by) => target.resolve_column(by),
                None => &target.primary_key_column,
            };

            let alias = format!("{}_d{}_{}", target.table, depth - 1, *counter);
            *counter += 1;

            let child = self.plan(cx, target, alias, depth - 1, scope, counter)?;
            plan.children.push(Joined {
                field,
                column,
                target_column,
                filter,
                plan: child,
            });
        }

        Ok(plan)
    }

    /// Builds the entity of the joined table `plan` from `row`.
    fn materialize(
        &self,
        cx: &mut Cx,
        plan: &Plan<'_>,
        row: &Row,
        scope: RelationScope,
        batch: &mut Batch,
    ) -> Result<Slot> {
        let model = plan.model;

        let raw = column_value(row, &plan.alias, &model.primary_key_column);
        let key_value = match model.column_by_name(&model.primary_key_column) {
            Some(column) => column.ty.from_storage(raw)?,
            None => raw,
        };

        let Some(key) = key_value.to_key() else {
            return Ok(Slot::Ready(Entity::absent(&model.name, key_value)));
        };

        match cx.cache.lookup(&model.name, &key, plan.depth, scope) {
            Lookup::Hit(entity) => {
                trace!(model = %model.name, ?key, "identity cache hit");
                return Ok(Slot::Ready(entity));
            }
            Lookup::Loading => {
                let id = (model.name.clone(), key.clone());

                // Enclosing this row: a cycle.
                if batch.path.contains(&id) {
                    return Ok(Slot::Ready(Entity::absent(&model.name, key_value)));
                }

                match batch.seen.get(&id) {
                    Some(&seen) if seen >= plan.depth => return Ok(Slot::Dup(id.0, id.1)),
                    Some(_) => {
                        trace!(
                            model = %model.name, ?key, depth = plan.depth,
                            "materializing deeper"
                        );
                    }
                    // Loading in an enclosing fetch
                    None => return Ok(Slot::Ready(Entity::absent(&model.name, key_value))),
                }
            }
            Lookup::Miss => {
                trace!(model = %model.name, ?key, depth = plan.depth, "identity cache miss");
            }
        }

        // Registered before any nested field is populated, so cyclic
        // references resolve to an absent entity.
        cx.cache.begin(&model.name, key.clone(), plan.depth, scope);
        let seen = batch
            .seen
            .entry((model.name.clone(), key.clone()))
            .or_default();
        *seen = (*seen).max(plan.depth);
        batch.path.push((model.name.clone(), key.clone()));
        batch
            .pending
            .entry((model.name.clone(), plan.depth))
            .or_default()
            .push(key.clone());

        let mut record = Record::new(&model.name);
        let mut children = vec![];

        for column in model.readable_columns() {
            let raw = column_value(row, &plan.alias, &column.name);

            let Some(rel) = model.single_relation_for_column(&column.name) else {
                let value = column.ty.from_storage(raw).map_err(|err| {
                    err.context(err!("column `{}.{}`", model.table, column.name))
                })?;
                record.set(&column.field, value);
                continue;
            };

            let field = rel.field();

            if let Some(joined) = plan.children.iter().find(|joined| joined.field == field) {
                let target = joined.plan.model;
                let joined_key = column_value(row, &joined.plan.alias, &target.primary_key_column);

                if !joined_key.is_null() {
                    let slot = self.materialize(cx, &joined.plan, row, scope, batch)?;
                    children.push((field.to_string(), slot));
                    continue;
                }
            }

            let value = column.ty.from_storage(raw)?;

            if value.is_null() {
                record.set(field, Value::Null);
            } else {
                record.set(field, Entity::absent(rel.target(), value));
            }
        }

        batch.path.pop();

        Ok(Slot::Fresh(Node {
            model: model.name.clone(),
            key,
            depth: plan.depth,
            record,
            children,
        }))
    }

    /// Loads the has-many members of every entity of `batch`.
    async fn load_members(
        &self,
        cx: &mut Cx,
        batch: &Batch,
        scope: RelationScope,
    ) -> Result<Members> {
        let mut members = Members::new();

        if !scope.contains(RelationScope::HAS_MANY) {
            return Ok(members);
        }

        for ((name, depth), owners) in &batch.pending {
            if *depth <= 1 {
                continue;
            }

            let model = self.schema.model(name)?;
            let owner_depth = *depth;
            let depth = depth - 1;

            // Plain join-table relations sharing a table and owner column are
            // read with a single query.
            let mut shared: IndexMap<(&str, &str), Vec<&HasMany>> = IndexMap::new();

            for rel in &model.has_many {
                if rel.write_only {
                    continue;
                }

                if rel.conditional && !cx.directives.has_filter(&model.name, &rel.field) {
                    continue;
                }

                let directives = cx
                    .directives
                    .get(&model.name, Some(&rel.field))
                    .cloned()
                    .unwrap_or_default();

                let plain = directives.is_empty()
                    && rel.sort.is_none()
                    && rel.condition.is_none()
                    && !scope.contains(RelationScope::NEWEST);

                if rel.is_join_table() && plain {
                    shared
                        .entry((rel.table.as_str(), rel.self_column.as_str()))
                        .or_default()
                        .push(rel);
                    continue;
                }

                let loaded = if rel.is_join_table() {
                    self.join_members(cx, model, &[rel], owners, depth, scope, &directives)
                        .await?
                } else {
                    vec![
                        self.inline_members(cx, model, rel, owners, depth, scope, &directives)
                            .await?,
                    ]
                };

                collect(&mut members, model, owner_depth, &[rel], owners, loaded);
            }

            for rels in shared.into_values() {
                let loaded = self
                    .join_members(cx, model, &rels, owners, depth, scope, &Scoped::default())
                    .await?;
                collect(&mut members, model, owner_depth, &rels, owners, loaded);
            }
        }

        Ok(members)
    }

    /// Members of a relation whose target table holds the owner's key.
    #[allow(clippy::too_many_arguments)]
    async fn inline_members(
        &self,
        cx: &mut Cx,
        model: &Model,
        rel: &HasMany,
        owners: &[Key],
        depth: u8,
        scope: RelationScope,
        directives: &Scoped,
    ) -> Result<HashMap<Key, Vec<Value>>> {
        let target = self.target(model, RelationRef::HasMany(rel))?;
        let alias = root_alias(target, depth);
        let column = |name: &str| format!("{alias}.{}", target.resolve_column(name));

        let mut base = Clauses::default();

        if let Some((name, value)) = &rel.condition {
            base.and(column(name), Op::Eq, value.clone());
        }

        for (name, op, value) in &directives.filter {
            base.and(column(name), *op, value.clone());
        }

        let newest = scope.contains(RelationScope::NEWEST);

        if newest {
            base.order(column(&target.primary_key_column), Direction::Desc);
        }

        for (name, direction) in &directives.sort {
            base.order(column(name), *direction);
        }

        if directives.sort.is_empty() {
            if let Some(sort) = &rel.sort {
                base.order(column(&sort.column), sort.direction);
            }
        }

        base.limit = if newest { Some(1) } else { directives.limit };

        let mut ret: HashMap<Key, Vec<Value>> = HashMap::new();

        // A limit applies per owner
        if base.limit.is_some() {
            for owner in owners {
                let mut clauses = base.clone();
                clauses.and(column(&rel.self_column), Op::Eq, owner.to_value());

                let fetched = self.fetch(cx, target, depth, scope, clauses, None).await?;
                ret.insert(
                    owner.clone(),
                    fetched.into_iter().map(|(_, entity)| entity.into()).collect(),
                );
            }
        } else {
            let mut clauses = base;
            clauses.and(
                column(&rel.self_column),
                Op::In,
                Value::List(owners.iter().map(Key::to_value).collect()),
            );

            let fetched = self
                .fetch(cx, target, depth, scope, clauses, Some(&rel.self_column))
                .await?;

            for (group, entity) in fetched {
                if let Some(owner) = group.to_key() {
                    ret.entry(owner).or_default().push(entity.into());
                }
            }
        }

        Ok(ret)
    }

    /// Members of relations carried by a join table.
    ///
    /// All of `rels` share the join table and owner column. Returns one map
    /// per relation.
    #[allow(clippy::too_many_arguments)]
    async fn join_members(
        &self,
        cx: &mut Cx,
        model: &Model,
        rels: &[&HasMany],
        owners: &[Key],
        depth: u8,
        scope: RelationScope,
        directives: &Scoped,
    ) -> Result<Vec<HashMap<Key, Vec<Value>>>> {
        let Some(&first) = rels.first() else {
            return Ok(vec![]);
        };

        let table = &first.table;
        let self_column = &first.self_column;
        let externals: Vec<&str> = rels
            .iter()
            .map(|rel| rel.external_column.as_deref().unwrap_or_default())
            .collect();

        let memoize = directives.is_empty()
            && rels
                .iter()
                .all(|rel| rel.sort.is_none() && rel.condition.is_none())
            && !scope.contains(RelationScope::NEWEST);

        let mut links: Vec<IndexMap<Key, Vec<Key>>> = vec![IndexMap::new(); rels.len()];
        let mut missing = vec![];

        for owner in owners {
            let memoized = if memoize {
                externals
                    .iter()
                    .map(|external| cx.memo.get(table, self_column, external, owner))
                    .collect::<Option<Vec<_>>>()
            } else {
                None
            };

            match memoized {
                Some(found) => {
                    for (links, members) in links.iter_mut().zip(found) {
                        links.insert(owner.clone(), members.to_vec());
                    }
                }
                None => missing.push(owner.clone()),
            }
        }

        if !missing.is_empty() {
            let target = self.target(model, RelationRef::HasMany(first))?;
            let newest = scope.contains(RelationScope::NEWEST);
            let limit = if newest { Some(1) } else { directives.limit };

            let batches: Vec<Vec<Key>> = match limit {
                Some(_) => missing.iter().map(|owner| vec![owner.clone()]).collect(),
                None => vec![missing.clone()],
            };

            for batch in batches {
                let query = link_query(target, rels, &externals, &batch, directives, limit, newest);

                for row in self.exec(query).await?.into_rows() {
                    let Some(owner) = row.get_index(0).and_then(Value::to_key) else {
                        continue;
                    };

                    for (i, by_owner) in links.iter_mut().enumerate() {
                        if let Some(member) = row.get_index(i + 1).and_then(Value::to_key) {
                            by_owner.entry(owner.clone()).or_default().push(member);
                        }
                    }
                }
            }

            if memoize {
                for owner in &missing {
                    for (external, by_owner) in externals.iter().zip(&links) {
                        let members = by_owner.get(owner).cloned().unwrap_or_default();
                        cx.memo
                            .insert(table, self_column, external, owner.clone(), members);
                    }
                }
            }
        }

        let mut ret = Vec::with_capacity(rels.len());

        for (&rel, links) in rels.iter().zip(links) {
            let target = self.target(model, RelationRef::HasMany(rel))?;
            let keys: IndexSet<Key> = links.values().flatten().cloned().collect();
            let keys: Vec<Key> = keys.into_iter().collect();

            let entities = self
                .get_many(cx, target, &keys, depth, scope, Clauses::default())
                .await?;

            ret.push(
                links
                    .into_iter()
                    .map(|(owner, members)| {
                        let members = members
                            .iter()
                            .filter_map(|key| entities.get(key).cloned())
                            .map(Value::from)
                            .collect();
                        (owner, members)
                    })
                    .collect(),
            );
        }

        Ok(ret)
    }
}

/// Adds the columns and joins of `plan` to `query`.
fn select(plan: &Plan<'_>, mut query: Query) -> Query {
    for column in plan.model.readable_columns() {
        query = query.select_as(
            format!("{}.{}", plan.alias, column.name),
            label(&plan.alias, &column.name),
        );
    }

    for joined in &plan.children {
        let child = &joined.plan;

        query = query
            .join_as(JoinKind::Left, &child.model.table, &child.alias)
            .on(
                format!("{}.{}", plan.alias, joined.column),
                Op::Eq,
                format!("{}.{}", child.alias, joined.target_column),
            );

        for (column, op, value) in &joined.filter {
            let column = child.model.resolve_column(column);
            query = query.on_value(format!("{}.{column}", child.alias), *op, value.clone());
        }

        query = select(child, query);
    }

    query
}

/// Selects the owner column and one member column per relation.
fn link_query(
    target: &Model,
    rels: &[&HasMany],
    externals: &[&str],
    owners: &[Key],
    directives: &Scoped,
    limit: Option<u64>,
    newest: bool,
) -> Query {
    let first = rels[0];
    let table = &first.table;

    let mut columns = vec![format!("{table}.{}", first.self_column)];
    columns.extend(externals.iter().map(|external| format!("{table}.{external}")));

    let mut query = Query::select(columns).from(table);

    let sorts: Vec<(&str, Direction)> = if directives.sort.is_empty() {
        first
            .sort
            .iter()
            .map(|sort| (sort.column.as_str(), sort.direction))
            .collect()
    } else {
        directives
            .sort
            .iter()
            .map(|(column, direction)| (column.as_str(), *direction))
            .collect()
    };

    let needs_target =
        !sorts.is_empty() || !directives.filter.is_empty() || first.condition.is_some();

    // Columns the target declares are read from the target table, anything
    // else from the join table.
    let column = |name: &str| {
        let declared = target.column_for_field(name).or(target.column_by_name(name));
        match declared {
            Some(declared) if needs_target => format!("{}.{}", target.table, declared.name),
            _ => format!("{table}.{name}"),
        }
    };

    if needs_target {
        query = query.join(&target.table).on(
            format!("{}.{}", target.table, target.primary_key_column),
            Op::Eq,
            format!("{table}.{}", externals[0]),
        );
    }

    let owner_column = format!("{table}.{}", first.self_column);
    query = match owners {
        [owner] => query.where_(owner_column, Op::Eq, owner.to_value()),
        owners => query.where_(
            owner_column,
            Op::In,
            Value::List(owners.iter().map(Key::to_value).collect()),
        ),
    };

    if let Some((name, value)) = &first.condition {
        query = query.and_where(column(name), Op::Eq, value.clone());
    }

    for (name, op, value) in &directives.filter {
        query = query.and_where(column(name), *op, value.clone());
    }

    if newest {
        query = query.order_by(format!("{table}.{}", externals[0]), Direction::Desc);
    }

    for (name, direction) in sorts {
        query = query.order_by(column(name), direction);
    }

    if let Some(limit) = limit {
        query = query.limit(limit);
    }

    query
}

fn collect(
    members: &mut Members,
    model: &Model,
    depth: u8,
    rels: &[&HasMany],
    owners: &[Key],
    loaded: Vec<HashMap<Key, Vec<Value>>>,
) {
    for (rel, mut loaded) in rels.iter().zip(loaded) {
        for owner in owners {
            let list = loaded.remove(owner).unwrap_or_default();
            members
                .entry((model.name.clone(), owner.clone(), depth))
                .or_default()
                .push((rel.field.clone(), list));
        }
    }
}

/// Turns a materialized slot into its entity, completing cache entries.
fn assemble(
    cx: &mut Cx,
    slot: Slot,
    scope: RelationScope,
    members: &mut Members,
    done: &mut HashMap<(String, Key), (u8, Entity)>,
) -> Entity {
    match slot {
        Slot::Ready(entity) => entity,
        Slot::Dup(model, key) => {
            let id = (model, key);
            match done.get(&id) {
                Some((_, entity)) => entity.clone(),
                None => Entity::absent(id.0, id.1.to_value()),
            }
        }
        Slot::Fresh(node) => {
            let Node {
                model,
                key,
                depth,
                mut record,
                children,
            } = node;

            for (field, child) in children {
                let entity = assemble(cx, child, scope, members, done);
                record.set(field, entity);
            }

            if let Some(fields) = members.remove(&(model.clone(), key.clone(), depth)) {
                for (field, list) in fields {
                    record.set(field, Value::List(list));
                }
            }

            let entity = Entity::Present(record);
            cx.cache
                .finish(&model, key.clone(), entity.clone(), depth, scope);

            match done.get(&(model.clone(), key.clone())) {
                Some((deeper, _)) if *deeper > depth => {}
                _ => {
                    done.insert((model, key), (depth, entity.clone()));
                }
            }
            entity
        }
    }
}
