use crate::{
    Action, AggregateFunction, AsValue, Comparison, DatabaseQuery, Direction, Driver, EagerLoad,
    Entity, Executor, FieldRef, Filter, Join, JoinKind, Limit, QueryError, QueryField, Relation,
    Result, RowsAffected, Scope, Sort, Value, timestamp_now,
    stream::{StreamExt, TryStreamExt},
};
use std::{borrow::Cow, pin::pin};

/// Filters of one nested group, handed to the closure of [`QueryBuilder::group`].
#[derive(Debug, Clone, PartialEq)]
pub struct FilterBuilder {
    entity: Cow<'static, str>,
    filters: Vec<Filter>,
}

impl FilterBuilder {
    pub fn new(entity: impl Into<Cow<'static, str>>) -> Self {
        Self {
            entity: entity.into(),
            filters: Vec::new(),
        }
    }

    pub fn filter(
        self,
        field: impl Into<FieldRef>,
        op: Comparison,
        value: impl Into<Value>,
    ) -> Self {
        self.filter_by(Filter::compare(field, op, value))
    }

    pub fn filter_in(
        self,
        field: impl Into<FieldRef>,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        self.filter_by(Filter::subset(field, Scope::In, values))
    }

    pub fn filter_not_in(
        self,
        field: impl Into<FieldRef>,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        self.filter_by(Filter::subset(field, Scope::NotIn, values))
    }

    pub fn filter_by(mut self, mut filter: Filter) -> Self {
        filter.qualify(&self.entity);
        self.filters.push(filter);
        self
    }

    pub fn group(self, relation: Relation, f: impl FnOnce(FilterBuilder) -> FilterBuilder) -> Self {
        let group = f(FilterBuilder::new(self.entity.clone()));
        self.filter_by(Filter::group(relation, group.filters))
    }

    pub fn build(self, relation: Relation) -> Filter {
        Filter::group(relation, self.filters)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<M> {
    pub items: Vec<M>,
    pub metadata: PageMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMetadata {
    /// 1-based page number.
    pub page: u64,
    pub per: u64,
    /// Rows matching the query across all pages.
    pub total: u64,
}

impl PageMetadata {
    pub fn pages(&self) -> u64 {
        self.total.div_ceil(self.per.max(1))
    }
}

/// Fluent query construction for the model `M`, bound to one executor.
///
/// Mutators only shape the query. Nothing is sent to the executor until a
/// terminal method (`all`, `first`, `count`, `create`, ...) is awaited.
pub struct QueryBuilder<'e, M: Entity, E: Executor> {
    executor: &'e mut E,
    query: DatabaseQuery,
    eager_loads: Vec<Box<dyn EagerLoad<M, E> + 'e>>,
    with_soft_deleted: bool,
}

impl<'e, M: Entity, E: Executor> QueryBuilder<'e, M, E> {
    pub fn new(executor: &'e mut E) -> Self {
        Self {
            executor,
            query: DatabaseQuery::new(M::entity().name.clone(), Action::Select),
            eager_loads: Vec::new(),
            with_soft_deleted: false,
        }
    }

    pub fn query(&self) -> &DatabaseQuery {
        &self.query
    }

    fn qualify(&self, field: impl Into<FieldRef>) -> FieldRef {
        field.into().qualified(&self.query.entity)
    }

    pub fn filter(
        self,
        field: impl Into<FieldRef>,
        op: Comparison,
        value: impl Into<Value>,
    ) -> Self {
        self.filter_by(Filter::compare(field, op, value))
    }

    pub fn filter_in(
        self,
        field: impl Into<FieldRef>,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        self.filter_by(Filter::subset(field, Scope::In, values))
    }

    pub fn filter_not_in(
        self,
        field: impl Into<FieldRef>,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        self.filter_by(Filter::subset(field, Scope::NotIn, values))
    }

    pub fn filter_by(mut self, mut filter: Filter) -> Self {
        filter.qualify(&self.query.entity);
        self.query.filter.push(filter);
        self
    }

    /// Nested group of conditions joined by `relation`.
    pub fn group(self, relation: Relation, f: impl FnOnce(FilterBuilder) -> FilterBuilder) -> Self {
        let group = f(FilterBuilder::new(self.query.entity.clone()));
        self.filter_by(group.build(relation))
    }

    pub fn sort(mut self, field: impl Into<FieldRef>, direction: Direction) -> Self {
        let field = self.qualify(field);
        self.query.sorts.push(Sort { field, direction });
        self
    }

    pub fn limit(mut self, count: u64) -> Self {
        self.query.limit = Some(Limit { count, offset: 0 });
        self
    }

    pub fn limit_offset(mut self, count: u64, offset: u64) -> Self {
        self.query.limit = Some(Limit { count, offset });
        self
    }

    /// Inner join with `O` following the foreign key convention of the driver.
    ///
    /// `M` holding `<o>_id` joins on it, otherwise `O` is expected to hold `<m>_id`.
    pub fn join<O: Entity>(self) -> Self {
        let naming = self.executor.driver().key_naming();
        let (base, other) = (M::entity(), O::entity());
        let to_other = naming.foreign_key(&other.model, &other.id_key);
        if base.field(&to_other).is_some() {
            self.join_on::<O>(JoinKind::Inner, base.field_ref(to_other), other.id_ref())
        } else {
            let to_base = naming.foreign_key(&base.model, &base.id_key);
            self.join_on::<O>(JoinKind::Inner, base.id_ref(), other.field_ref(to_base))
        }
    }

    /// Join with `O` on `local = foreign`, `foreign` being a field of `O`.
    ///
    /// The selected fields become the fields of `M` followed by the fields of
    /// `O` labeled `entity_field`.
    pub fn join_on<O: Entity>(
        mut self,
        kind: JoinKind,
        local: impl Into<FieldRef>,
        foreign: impl Into<FieldRef>,
    ) -> Self {
        let other = O::entity();
        let local = self.qualify(local);
        let foreign = foreign.into().qualified(&other.name);
        if self.query.fields.is_empty() {
            self.query.fields = M::entity().query_fields();
        }
        self.query.fields.extend(other.fields.iter().map(|v| {
            let field = other.field_ref(v.name.clone());
            let alias = field.alias();
            QueryField::aliased(field, alias)
        }));
        self.query.joins.push(Join {
            kind,
            entity: other.name.clone(),
            local,
            foreign,
        });
        self
    }

    pub fn group_by(mut self, field: impl Into<FieldRef>) -> Self {
        let field = self.qualify(field);
        self.query.group_by.push(field);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.query.distinct = true;
        self
    }

    /// Eager load `relation` for every model returned by `all` or `first`.
    pub fn with(mut self, relation: impl EagerLoad<M, E> + 'e) -> Self {
        self.eager_loads.push(Box::new(relation));
        self
    }

    /// Also return the soft deleted rows.
    pub fn with_soft_deleted(mut self) -> Self {
        self.with_soft_deleted = true;
        self
    }

    /// The query that reads rows, with the soft delete scope applied.
    fn read_query(&self) -> DatabaseQuery {
        let mut query = self.query.clone();
        if self.with_soft_deleted {
            return query;
        }
        if let Some(deleted_at) = &M::entity().deleted_at {
            let field = FieldRef {
                entity: query.entity.clone(),
                name: deleted_at.clone(),
            };
            query.filter.push(Filter::or([
                Filter::compare(field.clone(), Comparison::Equals, Value::Null),
                Filter::compare(
                    field,
                    Comparison::GreaterThan,
                    Value::Timestamp(Some(timestamp_now())),
                ),
            ]));
        }
        query
    }

    async fn load(&mut self, query: DatabaseQuery) -> Result<Vec<M>> {
        let mut models = self
            .executor
            .fetch(query)
            .map(|row| row.and_then(M::from_row))
            .try_collect::<Vec<_>>()
            .await?;
        for eager_load in &self.eager_loads {
            eager_load.load(&mut *self.executor, &mut models).await?;
        }
        Ok(models)
    }

    pub async fn all(mut self) -> Result<Vec<M>> {
        let query = self.read_query();
        self.load(query).await
    }

    /// First matching model, `None` when nothing matches.
    pub async fn first(mut self) -> Result<Option<M>> {
        let mut query = self.read_query();
        query.limit = Some(Limit {
            count: 1,
            offset: query.limit.map(|v| v.offset).unwrap_or_default(),
        });
        Ok(self.load(query).await?.into_iter().next())
    }

    /// Rows of `M` paired with the joined `O`, requires a previous `join::<O>()`.
    pub async fn all_joined<O: Entity>(self) -> Result<Vec<(M, O)>> {
        let query = self.read_query();
        let other = O::entity();
        let aliases: Vec<_> = other
            .fields
            .iter()
            .map(|v| (other.field_ref(v.name.clone()).alias(), v.name.to_string()))
            .collect();
        self.executor
            .fetch(query)
            .map(|row| {
                let row = row?;
                let joined =
                    row.extract(aliases.iter().map(|(alias, name)| (alias.as_str(), name.as_str())));
                Ok((M::from_row(row)?, O::from_row(joined)?))
            })
            .try_collect()
            .await
    }

    async fn aggregate_value(
        &mut self,
        function: AggregateFunction,
        field: Option<FieldRef>,
    ) -> Result<Value> {
        let mut query = self.read_query();
        query.action = Action::Aggregate {
            function,
            field: field.map(|v| v.qualified(&query.entity)),
        };
        query.fields.clear();
        query.sorts.clear();
        query.limit = None;
        query.distinct = false;
        let mut stream = pin!(self.executor.fetch(query));
        let row = stream.next().await.transpose()?;
        Ok(row
            .and_then(|v| v.values.into_vec().into_iter().next())
            .unwrap_or_default())
    }

    /// Run an aggregate, the value is `None` when null or not representable as `T`.
    pub async fn aggregate<T: AsValue>(
        mut self,
        function: AggregateFunction,
        field: Option<FieldRef>,
    ) -> Result<Option<T>> {
        let value = self.aggregate_value(function, field).await?;
        if value.is_null() {
            return Ok(None);
        }
        match T::try_from_value(value) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                log::debug!("Aggregate result discarded: {:#}", e);
                Ok(None)
            }
        }
    }

    pub async fn count(self) -> Result<Option<i64>> {
        self.aggregate(AggregateFunction::Count, None).await
    }

    pub async fn sum<T: AsValue>(self, field: impl Into<FieldRef>) -> Result<Option<T>> {
        self.aggregate(AggregateFunction::Sum, Some(field.into()))
            .await
    }

    pub async fn avg<T: AsValue>(self, field: impl Into<FieldRef>) -> Result<Option<T>> {
        self.aggregate(AggregateFunction::Average, Some(field.into()))
            .await
    }

    pub async fn min<T: AsValue>(self, field: impl Into<FieldRef>) -> Result<Option<T>> {
        self.aggregate(AggregateFunction::Minimum, Some(field.into()))
            .await
    }

    pub async fn max<T: AsValue>(self, field: impl Into<FieldRef>) -> Result<Option<T>> {
        self.aggregate(AggregateFunction::Maximum, Some(field.into()))
            .await
    }

    /// Page `page` (1-based) of `per` items, together with the total count.
    pub async fn paginate(mut self, page: u64, per: u64) -> Result<Page<M>> {
        let offset = match page.checked_sub(1).and_then(|v| v.checked_mul(per)) {
            Some(offset) if per != 0 => offset,
            _ => return Err(QueryError::InvalidPage { page, per }.into()),
        };
        let total = match self.aggregate_value(AggregateFunction::Count, None).await? {
            v if v.is_null() => 0,
            v => u64::try_from_value(v)?,
        };
        let mut query = self.read_query();
        query.limit = Some(Limit {
            count: per,
            offset,
        });
        let items = self.load(query).await?;
        Ok(Page {
            items,
            metadata: PageMetadata { page, per, total },
        })
    }

    /// Insert one row built from `data`.
    pub async fn create<N: Into<Cow<'static, str>>>(
        self,
        data: impl IntoIterator<Item = (N, Value)>,
    ) -> Result<RowsAffected> {
        let def = M::entity();
        let mut query = DatabaseQuery::new(self.query.entity.clone(), Action::Insert);
        query.input = data.into_iter().map(|(k, v)| (k.into(), v)).collect();
        query.validate()?;
        let now = Value::Timestamp(Some(timestamp_now()));
        for stamp in [&def.created_at, &def.updated_at].into_iter().flatten() {
            if !query.input.iter().any(|(k, _)| k == stamp) {
                query.input.push((stamp.clone(), now.clone()));
            }
        }
        self.executor.execute(query).await
    }

    /// Update every matching row with `data`.
    pub async fn update<N: Into<Cow<'static, str>>>(
        self,
        data: impl IntoIterator<Item = (N, Value)>,
    ) -> Result<RowsAffected> {
        let mut query = self.query;
        query.action = Action::Update;
        query.input = data.into_iter().map(|(k, v)| (k.into(), v)).collect();
        query.validate()?;
        if let Some(updated_at) = &M::entity().updated_at {
            if !query.input.iter().any(|(k, _)| k == updated_at) {
                query
                    .input
                    .push((updated_at.clone(), Value::Timestamp(Some(timestamp_now()))));
            }
        }
        clear_read_clauses(&mut query);
        self.executor.execute(query).await
    }

    /// Delete every matching row, marking it when the entity has a soft delete field.
    pub async fn delete(self) -> Result<RowsAffected> {
        let Some(deleted_at) = &M::entity().deleted_at else {
            return self.force_delete().await;
        };
        let mut query = self.query;
        query.action = Action::Update;
        query.input = vec![(deleted_at.clone(), Value::Timestamp(Some(timestamp_now())))];
        query.validate()?;
        clear_read_clauses(&mut query);
        self.executor.execute(query).await
    }

    /// Delete every matching row, ignoring the soft delete field.
    pub async fn force_delete(self) -> Result<RowsAffected> {
        let mut query = self.query;
        query.action = Action::Delete;
        query.validate()?;
        clear_read_clauses(&mut query);
        self.executor.execute(query).await
    }
}

fn clear_read_clauses(query: &mut DatabaseQuery) {
    query.fields.clear();
    query.sorts.clear();
    query.group_by.clear();
    query.limit = None;
    query.distinct = false;
}
