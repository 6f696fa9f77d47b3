use std::{
    borrow::Cow,
    cmp::Ordering,
    collections::{HashMap, HashSet},
    sync::Arc,
};
use weir_core::{
    AGGREGATE_LABEL, Action, AggregateFunction, Comparison, DatabaseQuery, Direction, Error,
    FieldDef, FieldRef, Filter, JoinKind, QueryResult, Relation, Result, RowLabeled, RowNames,
    RowsAffected, SchemaAction, SchemaQuery, Scope, Value, ValueKey,
};

#[derive(Debug, Clone)]
pub(crate) struct Table {
    fields: Vec<FieldDef>,
    rows: Vec<Box<[Value]>>,
    next_id: i64,
}

/// One row of the base entity followed by the rows of the joined ones,
/// `None` where an outer join found nothing.
type Joined<'t> = Vec<Option<&'t [Value]>>;

/// Position of a column: `(source, column)`.
type Position = (usize, usize);

impl Table {
    fn new(fields: Vec<FieldDef>) -> Self {
        Self {
            fields,
            rows: Vec::new(),
            next_id: 1,
        }
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|v| v.name == name)
    }

    fn input_columns(
        &self,
        entity: &str,
        input: &[(Cow<'static, str>, Value)],
    ) -> Result<Vec<(usize, Value)>> {
        input
            .iter()
            .map(|(name, value)| {
                self.column(name)
                    .map(|i| (i, value.clone()))
                    .ok_or_else(|| Error::msg(format!("Table `{}` has no column `{}`", entity, name)))
            })
            .collect()
    }

    /// Not null and unique constraints of `row` against `rows`, `skip` is the index it replaces.
    fn check(
        &self,
        entity: &str,
        rows: &[Box<[Value]>],
        row: &[Value],
        skip: Option<usize>,
    ) -> Result<()> {
        for (i, field) in self.fields.iter().enumerate() {
            let value = &row[i];
            if value.is_null() {
                if !field.nullable {
                    return Err(Error::msg(format!(
                        "NOT NULL constraint failed: {}.{}",
                        entity, field.name
                    )));
                }
                continue;
            }
            if (field.unique || field.primary_key)
                && rows
                    .iter()
                    .enumerate()
                    .any(|(j, v)| Some(j) != skip && v[i].matches(value))
            {
                return Err(Error::msg(format!(
                    "UNIQUE constraint failed: {}.{}",
                    entity, field.name
                )));
            }
        }
        Ok(())
    }

    fn insert(&mut self, entity: &str, query: &DatabaseQuery) -> Result<RowsAffected> {
        let input = self.input_columns(entity, &query.input)?;
        let mut next_id = self.next_id;
        let mut last_affected_id = None;
        let row = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let given = input.iter().rev().find(|(c, _)| *c == i).map(|(_, v)| v);
                let value = match given {
                    Some(v) if !(field.auto_increment && v.is_null()) => v.clone(),
                    _ if field.auto_increment => Value::Int64(Some(next_id)),
                    _ => field.default.clone().unwrap_or_else(|| field.value.as_null()),
                };
                if field.auto_increment {
                    if let Some(id) = value.as_integer() {
                        next_id = next_id.max(id as i64 + 1);
                        last_affected_id = Some(id as i64);
                    }
                }
                value
            })
            .collect::<Box<[Value]>>();
        self.check(entity, &self.rows, &row, None)?;
        self.rows.push(row);
        self.next_id = next_id;
        Ok(RowsAffected {
            rows_affected: 1,
            last_affected_id,
        })
    }

    fn matching(&self, entity: &str, filter: &Filter) -> Result<Vec<usize>> {
        let sources = Sources {
            names: vec![entity],
            tables: vec![self],
        };
        let mut result = Vec::new();
        for (i, row) in self.rows.iter().enumerate() {
            if sources.evaluate(filter, &vec![Some(&**row)])? {
                result.push(i);
            }
        }
        Ok(result)
    }

    fn update(&mut self, entity: &str, query: &DatabaseQuery) -> Result<RowsAffected> {
        let input = self.input_columns(entity, &query.input)?;
        let matching = self.matching(entity, &query.filter)?;
        // Applied to a copy, the table changes only when every row passes
        let mut rows = self.rows.clone();
        for &i in &matching {
            for (column, value) in &input {
                rows[i][*column] = value.clone();
            }
        }
        for &i in &matching {
            self.check(entity, &rows, &rows[i], Some(i))?;
        }
        self.rows = rows;
        Ok(RowsAffected {
            rows_affected: matching.len() as u64,
            last_affected_id: None,
        })
    }

    fn delete(&mut self, entity: &str, query: &DatabaseQuery) -> Result<RowsAffected> {
        let matching: HashSet<_> = self.matching(entity, &query.filter)?.into_iter().collect();
        let mut i = 0;
        self.rows.retain(|_| {
            i += 1;
            !matching.contains(&(i - 1))
        });
        Ok(RowsAffected {
            rows_affected: matching.len() as u64,
            last_affected_id: None,
        })
    }
}

/// Entities taking part in a read, the base one first.
struct Sources<'t> {
    names: Vec<&'t str>,
    tables: Vec<&'t Table>,
}

impl<'t> Sources<'t> {
    fn resolve(&self, field: &FieldRef) -> Result<Position> {
        let source = if field.entity.is_empty() {
            Some(0)
        } else {
            self.names.iter().position(|v| *v == field.entity)
        };
        let Some(source) = source else {
            return Err(Error::msg(format!(
                "Entity `{}` is not part of the query",
                field.entity
            )));
        };
        let column = self.tables[source]
            .column(&field.name)
            .ok_or_else(|| Error::msg(format!("No such column: {}", field)))?;
        Ok((source, column))
    }

    fn value(&self, row: &Joined<'t>, (source, column): Position) -> Value {
        row[source]
            .map(|v| v[column].clone())
            .unwrap_or(Value::Null)
    }

    fn evaluate(&self, filter: &Filter, row: &Joined<'t>) -> Result<bool> {
        Ok(match filter {
            Filter::Compare { field, op, value } => {
                compare(&self.value(row, self.resolve(field)?), *op, value)
            }
            Filter::Subset {
                field,
                scope,
                values,
            } => {
                let left = self.value(row, self.resolve(field)?);
                if values.is_empty() {
                    *scope == Scope::NotIn
                } else if left.is_null() {
                    false
                } else {
                    let found = values.iter().any(|v| left.matches(v));
                    match scope {
                        Scope::In => found,
                        Scope::NotIn => !found && !values.iter().any(Value::is_null),
                    }
                }
            }
            Filter::Group { relation, filters } => {
                let filters: Vec<_> = filters.iter().filter(|v| !v.is_empty()).collect();
                match relation {
                    Relation::And => {
                        for filter in filters {
                            if !self.evaluate(filter, row)? {
                                return Ok(false);
                            }
                        }
                        true
                    }
                    Relation::Or => {
                        if filters.is_empty() {
                            return Ok(true);
                        }
                        for filter in filters {
                            if self.evaluate(filter, row)? {
                                return Ok(true);
                            }
                        }
                        false
                    }
                }
            }
        })
    }

    fn join(&self, query: &DatabaseQuery) -> Result<Vec<Joined<'t>>> {
        let mut rows: Vec<Joined<'t>> = self.tables[0]
            .rows
            .iter()
            .map(|v| vec![Some(&**v)])
            .collect();
        for (i, join) in query.joins.iter().enumerate() {
            let source = i + 1;
            let table = self.tables[source];
            let (local, foreign) = (self.resolve(&join.local)?, self.resolve(&join.foreign)?);
            let (local, foreign) = if local.0 == source {
                (foreign, local)
            } else {
                (local, foreign)
            };
            if foreign.0 != source || local.0 >= source {
                return Err(Error::msg(format!(
                    "Join with `{}` must compare one of its fields with a field of a previous entity",
                    join.entity
                )));
            }
            let mut result = Vec::new();
            let mut matched = vec![false; table.rows.len()];
            for row in &rows {
                let key = self.value(row, local);
                let mut found = false;
                for (j, other) in table.rows.iter().enumerate() {
                    if key.matches(&other[foreign.1]) {
                        found = true;
                        matched[j] = true;
                        let mut joined = row.clone();
                        joined.push(Some(&**other));
                        result.push(joined);
                    }
                }
                if !found && matches!(join.kind, JoinKind::Left | JoinKind::Outer) {
                    let mut joined = row.clone();
                    joined.push(None);
                    result.push(joined);
                }
            }
            if matches!(join.kind, JoinKind::Right | JoinKind::Outer) {
                for (j, other) in table.rows.iter().enumerate() {
                    if !matched[j] {
                        let mut joined = vec![None; source];
                        joined.push(Some(&**other));
                        result.push(joined);
                    }
                }
            }
            rows = result;
        }
        Ok(rows)
    }

    /// Rows sharing the same values of `fields`, in first seen order.
    fn group(&self, fields: &[FieldRef], rows: Vec<Joined<'t>>) -> Result<Vec<Vec<Joined<'t>>>> {
        let positions = fields
            .iter()
            .map(|v| self.resolve(v))
            .collect::<Result<Vec<_>>>()?;
        let mut index = HashMap::<Vec<ValueKey>, usize>::new();
        let mut groups = Vec::<Vec<Joined<'t>>>::new();
        for row in rows {
            let key = positions
                .iter()
                .map(|v| self.value(&row, *v).key())
                .collect();
            match index.get(&key) {
                Some(i) => groups[*i].push(row),
                None => {
                    index.insert(key, groups.len());
                    groups.push(vec![row]);
                }
            }
        }
        Ok(groups)
    }
}

fn compare(left: &Value, op: Comparison, right: &Value) -> bool {
    if right.is_null() {
        return match op {
            Comparison::Equals => left.is_null(),
            Comparison::NotEquals => !left.is_null(),
            _ => false,
        };
    }
    if op.is_pattern() {
        let (Some(text), Some(pattern)) = (left.as_str(), right.as_str()) else {
            return false;
        };
        let (text, pattern) = (text.to_ascii_lowercase(), pattern.to_ascii_lowercase());
        return match op {
            Comparison::HasPrefix => text.starts_with(&pattern),
            Comparison::HasSuffix => text.ends_with(&pattern),
            _ => text.contains(&pattern),
        };
    }
    match op {
        Comparison::Equals => left.matches(right),
        Comparison::NotEquals => !left.is_null() && !left.matches(right),
        _ => left.compare(right).is_some_and(|v| match op {
            Comparison::GreaterThan => v == Ordering::Greater,
            Comparison::LessThan => v == Ordering::Less,
            Comparison::GreaterOrEqual => v != Ordering::Less,
            Comparison::LessOrEqual => v != Ordering::Greater,
            _ => false,
        }),
    }
}

/// Ordering used by sorts, nulls come first.
fn order(left: &Value, right: &Value) -> Ordering {
    match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => left.compare(right).unwrap_or(Ordering::Equal),
    }
}

fn aggregate(function: AggregateFunction, values: Vec<Value>) -> Result<Value> {
    let values: Vec<_> = values.into_iter().filter(|v| !v.is_null()).collect();
    Ok(match function {
        AggregateFunction::Count => Value::Int64(Some(values.len() as i64)),
        _ if values.is_empty() => Value::Null,
        AggregateFunction::Sum if values.iter().all(|v| v.as_integer().is_some()) => {
            let sum: i128 = values.iter().filter_map(Value::as_integer).sum();
            Value::Int64(Some(i64::try_from(sum).map_err(|_| {
                Error::msg(format!("Integer overflow while summing to {}", sum))
            })?))
        }
        AggregateFunction::Sum | AggregateFunction::Average => {
            let floats = values
                .iter()
                .map(|v| {
                    v.as_float().ok_or_else(|| {
                        Error::msg(format!("Cannot aggregate the non numeric value {}", v.describe()))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let sum: f64 = floats.iter().sum();
            if function == AggregateFunction::Sum {
                Value::Float64(Some(sum))
            } else {
                Value::Float64(Some(sum / floats.len() as f64))
            }
        }
        AggregateFunction::Minimum | AggregateFunction::Maximum => {
            let pick = if function == AggregateFunction::Minimum {
                Ordering::Less
            } else {
                Ordering::Greater
            };
            values
                .into_iter()
                .reduce(|acc, v| if order(&v, &acc) == pick { v } else { acc })
                .unwrap_or_default()
        }
    })
}

/// Tables of one in memory database.
#[derive(Debug, Clone, Default)]
pub struct Store {
    tables: HashMap<String, Table>,
}

impl Store {
    fn table_mut(&mut self, entity: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(entity)
            .ok_or_else(|| Error::msg(format!("Table `{}` does not exist", entity)))
    }

    fn sources<'t>(&'t self, query: &'t DatabaseQuery) -> Result<Sources<'t>> {
        let names: Vec<&str> = std::iter::once(&query.entity)
            .chain(query.joins.iter().map(|v| &v.entity))
            .map(|v| &**v)
            .collect();
        let tables = names
            .iter()
            .map(|v| {
                self.tables
                    .get(*v)
                    .ok_or_else(|| Error::msg(format!("Table `{}` does not exist", v)))
            })
            .collect::<Result<_>>()?;
        Ok(Sources { names, tables })
    }

    pub(crate) fn execute(&mut self, query: &DatabaseQuery) -> Result<Vec<QueryResult>> {
        let entity = &*query.entity;
        match query.action {
            Action::Select | Action::Aggregate { .. } => self.read(query),
            Action::Insert => Ok(vec![self.table_mut(entity)?.insert(entity, query)?.into()]),
            Action::Update => Ok(vec![self.table_mut(entity)?.update(entity, query)?.into()]),
            Action::Delete => Ok(vec![self.table_mut(entity)?.delete(entity, query)?.into()]),
        }
    }

    fn read(&self, query: &DatabaseQuery) -> Result<Vec<QueryResult>> {
        let sources = self.sources(query)?;
        let mut rows = Vec::new();
        for row in sources.join(query)? {
            if sources.evaluate(&query.filter, &row)? {
                rows.push(row);
            }
        }
        if let Action::Aggregate { function, field } = &query.action {
            let groups = if query.group_by.is_empty() {
                vec![rows]
            } else {
                sources.group(&query.group_by, rows)?
            };
            let position = field.as_ref().map(|v| sources.resolve(v)).transpose()?;
            let labels: RowNames = Arc::from([AGGREGATE_LABEL.to_string()]);
            return groups
                .into_iter()
                .map(|group| {
                    let values = group
                        .iter()
                        .map(|row| match position {
                            Some(v) => sources.value(row, v),
                            None => Value::Boolean(Some(true)),
                        })
                        .collect();
                    let value = aggregate(*function, values)?;
                    Ok(QueryResult::from(RowLabeled::new(
                        labels.clone(),
                        Box::new([value]),
                    )))
                })
                .collect();
        }
        if !query.group_by.is_empty() {
            rows = sources
                .group(&query.group_by, rows)?
                .into_iter()
                .filter_map(|v| v.into_iter().next())
                .collect();
        }
        let sorts = query
            .sorts
            .iter()
            .map(|v| Ok((sources.resolve(&v.field)?, v.direction)))
            .collect::<Result<Vec<_>>>()?;
        rows.sort_by(|a, b| {
            for (position, direction) in &sorts {
                let ordering = order(&sources.value(a, *position), &sources.value(b, *position));
                let ordering = match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
        let (labels, positions): (Vec<String>, Vec<Position>) = if query.fields.is_empty() {
            sources
                .tables
                .iter()
                .enumerate()
                .flat_map(|(source, table)| {
                    table
                        .fields
                        .iter()
                        .enumerate()
                        .map(move |(column, field)| (field.name.to_string(), (source, column)))
                })
                .unzip()
        } else {
            query
                .fields
                .iter()
                .map(|v| Ok((v.label().to_string(), sources.resolve(&v.field)?)))
                .collect::<Result<Vec<_>>>()?
                .into_iter()
                .unzip()
        };
        let labels: RowNames = labels.into();
        let mut seen = HashSet::new();
        let (offset, count) = query
            .limit
            .map(|v| (v.offset as usize, v.count as usize))
            .unwrap_or((0, usize::MAX));
        Ok(rows
            .iter()
            .map(|row| {
                positions
                    .iter()
                    .map(|v| sources.value(row, *v))
                    .collect::<Box<[Value]>>()
            })
            .filter(|values| {
                !query.distinct || seen.insert(values.iter().map(Value::key).collect::<Vec<_>>())
            })
            .skip(offset)
            .take(count)
            .map(|values| QueryResult::from(RowLabeled::new(labels.clone(), values)))
            .collect())
    }

    pub(crate) fn schema(&mut self, query: &SchemaQuery) -> Result<()> {
        let entity = &*query.entity;
        match query.action {
            SchemaAction::Create => {
                if self.tables.contains_key(entity) {
                    return Err(Error::msg(format!("Table `{}` already exists", entity)));
                }
                self.tables
                    .insert(entity.to_string(), Table::new(query.create_fields.clone()));
            }
            SchemaAction::Update => {
                let table = self.table_mut(entity)?;
                for field in &query.create_fields {
                    if table.column(&field.name).is_some() {
                        return Err(Error::msg(format!(
                            "Table `{}` already has a column `{}`",
                            entity, field.name
                        )));
                    }
                    let value = field.default.clone().unwrap_or_else(|| field.value.as_null());
                    if value.is_null() && !field.nullable && !table.rows.is_empty() {
                        return Err(Error::msg(format!(
                            "Cannot add the not null column `{}` without a default to the non empty table `{}`",
                            field.name, entity
                        )));
                    }
                    for row in &mut table.rows {
                        let mut values = std::mem::take(row).into_vec();
                        values.push(value.clone());
                        *row = values.into_boxed_slice();
                    }
                    table.fields.push(field.clone());
                }
                for name in &query.delete_fields {
                    let column = table.column(name).ok_or_else(|| {
                        Error::msg(format!("Table `{}` has no column `{}`", entity, name))
                    })?;
                    table.fields.remove(column);
                    for row in &mut table.rows {
                        let mut values = std::mem::take(row).into_vec();
                        values.remove(column);
                        *row = values.into_boxed_slice();
                    }
                }
            }
            SchemaAction::Delete => {
                self.tables.remove(entity);
            }
        }
        Ok(())
    }
}
