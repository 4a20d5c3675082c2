use crate::{
    engine::{root_alias, Clauses, Cx, CxHandle, Directives, Engine},
    RelationScope,
};

use strata_core::{
    driver::Response,
    schema::{Column, Model},
    stmt::{
        Condition, Connective, Direction, Entity, Expr, Filter, Key, Op, OrderBy, Query, Record,
        Value,
    },
    Result,
};

use indexmap::IndexMap;

/// A read of one entity type.
///
/// Configure the relation scope, the depth and any directives, then finish
/// with one of the loading methods. Directives registered with the `_in`
/// variants apply to the member query of a relation; the others apply to
/// the entities being read.
///
/// ```ignore
/// let tags = db
///     .read::<Tag>()
///     .depth(2)
///     .filter_in("l11n", "lang", Op::Eq, "de")
///     .newest(10)
///     .await?;
/// ```
pub struct Read<'a, T> {
    engine: &'a Engine,
    cx: CxHandle<'a>,
    model: String,
    load: fn(Record) -> Result<T>,
    scope: RelationScope,
    depth: u8,

    /// Directives of the entities being read
    own: Directives,

    /// Directives of relation member queries
    relations: Directives,

    /// Column keyset pagination compares against. Defaults to the key.
    pivot_column: Option<String>,
    order: Direction,
}

impl<'a, T> Read<'a, T> {
    pub(crate) fn new(
        engine: &'a Engine,
        cx: CxHandle<'a>,
        model: impl Into<String>,
        load: fn(Record) -> Result<T>,
    ) -> Read<'a, T> {
        Read {
            depth: engine.default_depth,
            engine,
            cx,
            model: model.into(),
            load,
            scope: RelationScope::ALL,
            own: Directives::default(),
            relations: Directives::default(),
            pivot_column: None,
            order: Direction::Asc,
        }
    }

    /// Relation categories to traverse. Defaults to [`RelationScope::ALL`].
    pub fn scope(mut self, scope: RelationScope) -> Self {
        self.scope = scope;
        self
    }

    /// How many levels of the relation graph to load. A depth of `1` loads
    /// the entity's own columns only.
    pub fn depth(mut self, depth: u8) -> Self {
        self.depth = depth;
        self
    }

    pub fn sort(mut self, column: &str, direction: Direction) -> Self {
        self.own.sort(&self.model, None, column, direction);
        self
    }

    pub fn filter(mut self, column: &str, op: Op, value: impl Into<Value>) -> Self {
        self.own.filter(&self.model, None, column, op, value.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.own.limit(&self.model, None, limit);
        self
    }

    /// Sorts the members of `relation`.
    ///
    /// `relation` names a field of the model being read, or `Model.field`
    /// for a relation further down the graph.
    pub fn sort_in(mut self, relation: &str, column: &str, direction: Direction) -> Self {
        let (model, field) = self.relation(relation);
        self.relations.sort(&model, Some(&field), column, direction);
        self
    }

    /// Filters the members of `relation`. A filter also enables traversal
    /// of a conditional relation.
    pub fn filter_in(
        mut self,
        relation: &str,
        column: &str,
        op: Op,
        value: impl Into<Value>,
    ) -> Self {
        let (model, field) = self.relation(relation);
        self.relations
            .filter(&model, Some(&field), column, op, value.into());
        self
    }

    /// Loads at most `limit` members of `relation` per owner.
    pub fn limit_in(mut self, relation: &str, limit: u64) -> Self {
        let (model, field) = self.relation(relation);
        self.relations.limit(&model, Some(&field), limit);
        self
    }

    /// Column used by [`after_pivot`](Read::after_pivot) and
    /// [`before_pivot`](Read::before_pivot).
    pub fn pivot_on(mut self, column: &str) -> Self {
        self.pivot_column = Some(column.to_string());
        self
    }

    /// Direction pages advance in. Defaults to ascending.
    pub fn order(mut self, direction: Direction) -> Self {
        self.order = direction;
        self
    }

    fn relation(&self, relation: &str) -> (String, String) {
        match relation.split_once('.') {
            Some((model, field)) => (model.to_string(), field.to_string()),
            None => (self.model.clone(), relation.to_string()),
        }
    }

    /// Loads the entity stored under `key`.
    pub async fn get(self, key: impl Into<Key>) -> Result<Option<T>> {
        let load = self.load;

        match self.get_entity(key).await? {
            Entity::Present(record) => Ok(Some(load(record)?)),
            Entity::Absent { .. } => Ok(None),
        }
    }

    /// Like [`get`](Read::get), but keeps the entity dynamic. A key that is
    /// not stored, or a depth below `1`, yields an absent entity.
    pub async fn get_entity(self, key: impl Into<Key>) -> Result<Entity> {
        let key = key.into();
        let model = self.model.clone();
        let mut entities = self.get_entities(&[key.clone()]).await?;

        Ok(entities
            .swap_remove(&key)
            .unwrap_or_else(|| Entity::absent(model, key.to_value())))
    }

    /// Loads every entity of `keys` that is stored, in request order.
    pub async fn get_many(
        self,
        keys: impl IntoIterator<Item = impl Into<Key>>,
    ) -> Result<IndexMap<Key, T>> {
        let load = self.load;
        let keys: Vec<Key> = keys.into_iter().map(Into::into).collect();

        let mut ret = IndexMap::with_capacity(keys.len());

        for (key, entity) in self.get_entities(&keys).await? {
            if let Entity::Present(record) = entity {
                ret.insert(key, load(record)?);
            }
        }

        Ok(ret)
    }

    async fn get_entities(mut self, keys: &[Key]) -> Result<IndexMap<Key, Entity>> {
        let (engine, depth, scope) = (self.engine, self.depth, self.scope);
        let model = engine.schema.model(&self.model)?;
        let clauses = self.clauses(model, &root_alias(model, depth))?;

        let cx = self.begin();
        let ret = engine.get_many(cx, model, keys, depth, scope, clauses).await;
        cx.end_call();

        ret
    }

    /// Loads every entity matching the filters.
    pub async fn all(self) -> Result<Vec<T>> {
        self.fetch(|_, _, clauses| Ok(clauses)).await
    }

    /// The page of entities that follows `pivot`.
    pub async fn after_pivot(self, pivot: impl Into<Value>, limit: u64) -> Result<Vec<T>> {
        let pivot = pivot.into();
        let direction = self.order;
        let column = self.pivot_column.clone();

        self.fetch(move |model, alias, mut clauses| {
            page(model, alias, &mut clauses, column.as_deref(), &pivot, direction)?;
            clauses.limit = Some(limit);
            Ok(clauses)
        })
        .await
    }

    /// The page of entities that precedes `pivot`, in page order.
    pub async fn before_pivot(self, pivot: impl Into<Value>, limit: u64) -> Result<Vec<T>> {
        let pivot = pivot.into();
        let direction = self.order.reverse();
        let column = self.pivot_column.clone();

        let mut ret = self
            .fetch(move |model, alias, mut clauses| {
                page(model, alias, &mut clauses, column.as_deref(), &pivot, direction)?;
                clauses.limit = Some(limit);
                Ok(clauses)
            })
            .await?;

        ret.reverse();
        Ok(ret)
    }

    /// Up to `limit` entities in random order.
    pub async fn random(self, limit: u64) -> Result<Vec<T>> {
        self.fetch(move |_, _, mut clauses| {
            clauses.order_by.insert(
                0,
                OrderBy {
                    expr: Expr::Random,
                    direction: Direction::Asc,
                },
            );
            clauses.limit = Some(limit);
            Ok(clauses)
        })
        .await
    }

    /// Entities where any autocomplete column contains `text`.
    ///
    /// Models without autocomplete columns match nothing.
    pub async fn find(self, text: &str) -> Result<Vec<T>> {
        let model = self.engine.schema.model(&self.model)?;

        if model.autocomplete_columns().next().is_none() {
            return Ok(vec![]);
        }

        let pattern = Value::String(format!("%{text}%"));

        self.fetch(move |model, alias, mut clauses| {
            let mut group = Filter::new();

            for column in model.autocomplete_columns() {
                group = group.or(format!("{alias}.{}", column.name), Op::Like, &pattern);
            }

            clauses.filter.push(Connective::And, Condition::Group(group));
            Ok(clauses)
        })
        .await
    }

    /// The `limit` entities with the highest keys, newest first.
    pub async fn newest(self, limit: u64) -> Result<Vec<T>> {
        self.fetch(move |model, alias, mut clauses| {
            clauses.order_by.insert(
                0,
                OrderBy {
                    expr: Expr::Column(format!("{alias}.{}", model.primary_key_column)),
                    direction: Direction::Desc,
                },
            );
            clauses.limit = Some(limit);
            Ok(clauses)
        })
        .await
    }

    /// Number of stored entities matching the filters.
    pub async fn count(self) -> Result<u64> {
        let model = self.engine.schema.model(&self.model)?;
        let mut query = Query::count(&model.table);

        if let Some(own) = self.own.get(&self.model, None) {
            for (name, op, value) in &own.filter {
                let column = model.resolve_column(name);
                let value = bind(model.column_by_name(column), *op, value)?;
                query = query.and_where(column, *op, value);
            }
        }

        let count = self.engine.exec(query).await.and_then(Response::into_scalar)?;

        match count {
            Value::I64(count) => Ok(count.max(0) as u64),
            value => Err(strata_core::Error::type_conversion(value, "u64")),
        }
    }

    async fn fetch(
        mut self,
        f: impl FnOnce(&Model, &str, Clauses) -> Result<Clauses>,
    ) -> Result<Vec<T>> {
        let (engine, depth, scope, load) = (self.engine, self.depth, self.scope, self.load);
        let model = engine.schema.model(&self.model)?;
        let alias = root_alias(model, depth);
        let clauses = f(model, &alias, self.clauses(model, &alias)?)?;

        if depth < 1 {
            return Ok(vec![]);
        }

        let cx = self.begin();
        let ret = engine.fetch(cx, model, depth, scope, clauses, None).await;
        cx.end_call();

        ret?.into_iter()
            .filter_map(|(_, entity)| entity.into_record())
            .map(load)
            .collect()
    }

    /// Installs the relation directives into the call context.
    fn begin(&mut self) -> &mut Cx {
        let relations = std::mem::take(&mut self.relations);
        let cx = self.cx.get_mut();
        cx.begin_call(relations);
        cx
    }

    /// Clauses of the entities' own directives.
    fn clauses(&self, model: &Model, alias: &str) -> Result<Clauses> {
        let mut clauses = Clauses::default();

        let Some(own) = self.own.get(&self.model, None) else {
            return Ok(clauses);
        };

        for (name, op, value) in &own.filter {
            let column = model.resolve_column(name);
            let value = bind(model.column_by_name(column), *op, value)?;
            clauses.and(format!("{alias}.{column}"), *op, value);
        }

        for (name, direction) in &own.sort {
            clauses.order(format!("{alias}.{}", model.resolve_column(name)), *direction);
        }

        clauses.limit = own.limit;

        Ok(clauses)
    }
}

/// Restricts `clauses` to the rows past `pivot`, walking in `direction`.
fn page(
    model: &Model,
    alias: &str,
    clauses: &mut Clauses,
    column: Option<&str>,
    pivot: &Value,
    direction: Direction,
) -> Result<()> {
    let column = match column {
        Some(column) => model.resolve_column(column),
        None => &model.primary_key_column,
    };

    let op = match direction {
        Direction::Asc => Op::Gt,
        Direction::Desc => Op::Lt,
    };

    let qualified = format!("{alias}.{column}");
    let pivot = bind(model.column_by_name(column), op, pivot)?;

    clauses.and(qualified.clone(), op, pivot);
    clauses.order_by.insert(
        0,
        OrderBy {
            expr: Expr::Column(qualified),
            direction,
        },
    );

    Ok(())
}

/// Coerces a comparison value into the storage form of `column`.
fn bind(column: Option<&Column>, op: Op, value: &Value) -> Result<Value> {
    let Some(column) = column else {
        return Ok(value.clone());
    };

    match (op, value) {
        (Op::In | Op::NotIn, Value::List(values)) => Ok(Value::List(
            values
                .iter()
                .map(|value| column.ty.to_storage(value))
                .collect::<Result<_>>()?,
        )),
        (Op::Like, _) => Ok(value.clone()),
        _ => column.ty.to_storage(value),
    }
}
