use crate::{
    Action, AGGREGATE_LABEL, AggregateFunction, Comparison, DatabaseQuery, Direction, FieldDef,
    FieldRef, Filter, QueryError, Relation, Result, SchemaAction, SchemaQuery, Scope, Value,
    possibly_parenthesized, separated_by, temporal_to_string, truncate_long, try_separated_by,
    writer::{Context, Fragment},
};
use std::fmt::{self, Display, Write};

/// How a dialect spells a limit with an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LimitStyle {
    /// `LIMIT <count> OFFSET <offset>`
    #[default]
    LimitOffset,
    /// `LIMIT <offset>, <count>`
    OffsetComma,
}

/// SQL text with the values bound to its placeholders, in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    pub sql: String,
    pub binds: Vec<Value>,
}

impl Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", truncate_long!(self.sql))
    }
}

/// Dialect printer converting abstract queries into concrete SQL statements.
///
/// Every method has a default rendering, a dialect overrides only what it
/// spells differently. Values never reach the text: each value position is
/// written as a placeholder and the value is appended to the context binds.
pub trait SqlWriter: Send + Sync {
    fn limit_style(&self) -> LimitStyle {
        LimitStyle::LimitOffset
    }

    /// Escape occurrences of `search` char with `replace` while copying into buffer.
    fn write_escaped(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &str,
        search: char,
        replace: &str,
    ) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    /// Copy the text of a LIKE pattern, the wildcards `%` and `_` and the
    /// escape character `\` itself match literally.
    fn write_pattern_escaped(&self, _context: &mut Context, out: &mut String, value: &str) {
        for c in value.chars() {
            if matches!(c, '\\' | '%' | '_') {
                out.push('\\');
            }
            out.push(c);
        }
    }

    /// Quote identifiers ("name") doubling inner quotes.
    fn write_identifier_quoted(&self, context: &mut Context, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(context, out, value, '"', "\"\"");
        out.push('"');
    }

    fn write_placeholder(&self, _context: &mut Context, out: &mut String) {
        out.push('?');
    }

    fn write_bind(&self, context: &mut Context, out: &mut String, value: Value) {
        context.bind(value);
        self.write_placeholder(context, out);
    }

    /// Render a field reference, qualified by its entity when known.
    fn write_field_ref(&self, context: &mut Context, out: &mut String, value: &FieldRef) {
        if context.qualify_columns && !value.entity.is_empty() {
            self.write_identifier_quoted(context, out, &value.entity);
            out.push('.');
        }
        self.write_identifier_quoted(context, out, &value.name);
    }

    fn write_query(&self, query: &DatabaseQuery) -> Result<Statement> {
        query.validate()?;
        let mut context = Context::default();
        let mut out = String::with_capacity(256);
        match &query.action {
            Action::Select => self.write_select(&mut context, &mut out, query)?,
            Action::Insert => self.write_insert(&mut context, &mut out, query)?,
            Action::Update => self.write_update(&mut context, &mut out, query)?,
            Action::Delete => self.write_delete(&mut context, &mut out, query)?,
            Action::Aggregate { function, field } => {
                self.write_aggregate(&mut context, &mut out, query, *function, field.as_ref())?
            }
        }
        Ok(Statement {
            sql: out,
            binds: context.binds,
        })
    }

    fn write_select(
        &self,
        context: &mut Context,
        out: &mut String,
        query: &DatabaseQuery,
    ) -> Result<()> {
        let previous = context.switch_fragment(Fragment::SqlSelect);
        out.push_str("SELECT ");
        if query.distinct {
            out.push_str("DISTINCT ");
        }
        if query.fields.is_empty() {
            out.push('*');
        } else {
            try_separated_by(
                out,
                &query.fields,
                |out, v| {
                    query.check_field(&v.field)?;
                    self.write_field_ref(context, out, &v.field);
                    if let Some(alias) = &v.alias {
                        out.push_str(" AS ");
                        self.write_identifier_quoted(context, out, alias);
                    }
                    Ok::<_, crate::Error>(())
                },
                ", ",
            )?;
        }
        out.push_str(" FROM ");
        self.write_identifier_quoted(context, out, &query.entity);
        self.write_joins(context, out, query)?;
        self.write_where(context, out, query)?;
        self.write_group_by(context, out, query)?;
        self.write_order_by(context, out, query)?;
        self.write_limit(context, out, query);
        context.switch_fragment(previous);
        Ok(())
    }

    fn write_aggregate(
        &self,
        context: &mut Context,
        out: &mut String,
        query: &DatabaseQuery,
        function: AggregateFunction,
        field: Option<&FieldRef>,
    ) -> Result<()> {
        let previous = context.switch_fragment(Fragment::SqlSelect);
        out.push_str("SELECT ");
        out.push_str(function.sql_name());
        out.push('(');
        match field {
            Some(field) => {
                query.check_field(field)?;
                self.write_field_ref(context, out, field);
            }
            None => out.push('*'),
        }
        out.push_str(") AS ");
        self.write_identifier_quoted(context, out, AGGREGATE_LABEL);
        out.push_str(" FROM ");
        self.write_identifier_quoted(context, out, &query.entity);
        self.write_joins(context, out, query)?;
        self.write_where(context, out, query)?;
        self.write_group_by(context, out, query)?;
        context.switch_fragment(previous);
        Ok(())
    }

    fn write_insert(
        &self,
        context: &mut Context,
        out: &mut String,
        query: &DatabaseQuery,
    ) -> Result<()> {
        let previous = context.switch_fragment(Fragment::SqlInsertInto);
        out.push_str("INSERT INTO ");
        self.write_identifier_quoted(context, out, &query.entity);
        out.push_str(" (");
        separated_by(
            out,
            &query.input,
            |out, (name, _)| self.write_identifier_quoted(context, out, name),
            ", ",
        );
        out.push_str(") VALUES (");
        separated_by(
            out,
            &query.input,
            |out, (_, v)| self.write_bind(context, out, v.clone()),
            ", ",
        );
        out.push(')');
        context.switch_fragment(previous);
        Ok(())
    }

    fn write_update(
        &self,
        context: &mut Context,
        out: &mut String,
        query: &DatabaseQuery,
    ) -> Result<()> {
        let previous = context.switch_fragment(Fragment::SqlUpdate);
        out.push_str("UPDATE ");
        self.write_identifier_quoted(context, out, &query.entity);
        out.push_str(" SET ");
        separated_by(
            out,
            &query.input,
            |out, (name, value)| {
                self.write_identifier_quoted(context, out, name);
                out.push_str(" = ");
                self.write_bind(context, out, value.clone());
            },
            ", ",
        );
        self.write_where(context, out, query)?;
        context.switch_fragment(previous);
        Ok(())
    }

    fn write_delete(
        &self,
        context: &mut Context,
        out: &mut String,
        query: &DatabaseQuery,
    ) -> Result<()> {
        let previous = context.switch_fragment(Fragment::SqlDeleteFrom);
        out.push_str("DELETE FROM ");
        self.write_identifier_quoted(context, out, &query.entity);
        self.write_where(context, out, query)?;
        context.switch_fragment(previous);
        Ok(())
    }

    fn write_joins(
        &self,
        context: &mut Context,
        out: &mut String,
        query: &DatabaseQuery,
    ) -> Result<()> {
        let previous = context.switch_fragment(Fragment::SqlJoin);
        for join in &query.joins {
            query.check_field(&join.local)?;
            query.check_field(&join.foreign)?;
            out.push(' ');
            out.push_str(join.kind.sql_name());
            out.push(' ');
            self.write_identifier_quoted(context, out, &join.entity);
            out.push_str(" ON ");
            self.write_field_ref(context, out, &join.local);
            out.push_str(" = ");
            self.write_field_ref(context, out, &join.foreign);
        }
        context.switch_fragment(previous);
        Ok(())
    }

    fn write_where(
        &self,
        context: &mut Context,
        out: &mut String,
        query: &DatabaseQuery,
    ) -> Result<()> {
        if query.filter.is_empty() {
            return Ok(());
        }
        let previous = context.switch_fragment(Fragment::SqlWhere);
        out.push_str(" WHERE ");
        self.write_filter(context, out, query, &query.filter, true)?;
        context.switch_fragment(previous);
        Ok(())
    }

    /// Render a filter node, `root` is true only for the top level group.
    fn write_filter(
        &self,
        context: &mut Context,
        out: &mut String,
        query: &DatabaseQuery,
        filter: &Filter,
        root: bool,
    ) -> Result<()> {
        match filter {
            Filter::Compare { field, op, value } => {
                self.write_compare(context, out, query, field, *op, value)
            }
            Filter::Subset {
                field,
                scope,
                values,
            } => self.write_subset(context, out, query, field, *scope, values),
            Filter::Group { relation, filters } => {
                self.write_group(context, out, query, *relation, filters, root)
            }
        }
    }

    fn write_comparison_operator(&self, _context: &mut Context, out: &mut String, op: Comparison) {
        out.push_str(match op {
            Comparison::Equals => "=",
            Comparison::NotEquals => "!=",
            Comparison::GreaterThan => ">",
            Comparison::LessThan => "<",
            Comparison::GreaterOrEqual => ">=",
            Comparison::LessOrEqual => "<=",
            Comparison::HasPrefix | Comparison::HasSuffix | Comparison::Contains => "LIKE",
        });
    }

    fn write_compare(
        &self,
        context: &mut Context,
        out: &mut String,
        query: &DatabaseQuery,
        field: &FieldRef,
        op: Comparison,
        value: &Value,
    ) -> Result<()> {
        query.check_field(field)?;
        if value.is_null() {
            let test = match op {
                Comparison::Equals => " IS NULL",
                Comparison::NotEquals => " IS NOT NULL",
                _ => {
                    return Err(QueryError::NullComparison {
                        field: field.clone(),
                        op,
                    }
                    .into());
                }
            };
            self.write_field_ref(context, out, field);
            out.push_str(test);
            return Ok(());
        }
        let value = if op.is_pattern() {
            let Some(text) = value.as_str() else {
                return Err(QueryError::InvalidOperand {
                    field: field.clone(),
                    op,
                    value: value.clone(),
                }
                .into());
            };
            let mut pattern = String::with_capacity(text.len() + 2);
            if op != Comparison::HasPrefix {
                pattern.push('%');
            }
            self.write_pattern_escaped(context, &mut pattern, text);
            if op != Comparison::HasSuffix {
                pattern.push('%');
            }
            Value::Varchar(Some(pattern))
        } else {
            value.clone()
        };
        self.write_field_ref(context, out, field);
        out.push(' ');
        self.write_comparison_operator(context, out, op);
        out.push(' ');
        self.write_bind(context, out, value);
        if op.is_pattern() {
            out.push_str(" ESCAPE '\\'");
        }
        Ok(())
    }

    fn write_subset(
        &self,
        context: &mut Context,
        out: &mut String,
        query: &DatabaseQuery,
        field: &FieldRef,
        scope: Scope,
        values: &[Value],
    ) -> Result<()> {
        query.check_field(field)?;
        if values.is_empty() {
            // Nothing is in the empty set
            out.push_str(match scope {
                Scope::In => "1 = 0",
                Scope::NotIn => "1 = 1",
            });
            return Ok(());
        }
        self.write_field_ref(context, out, field);
        out.push_str(match scope {
            Scope::In => " IN (",
            Scope::NotIn => " NOT IN (",
        });
        separated_by(
            out,
            values,
            |out, v| self.write_bind(context, out, v.clone()),
            ", ",
        );
        out.push(')');
        Ok(())
    }

    fn write_group(
        &self,
        context: &mut Context,
        out: &mut String,
        query: &DatabaseQuery,
        relation: Relation,
        filters: &[Filter],
        root: bool,
    ) -> Result<()> {
        let filters: Vec<_> = filters.iter().filter(|v| !v.is_empty()).collect();
        let separator = match relation {
            Relation::And => " AND ",
            Relation::Or => " OR ",
        };
        possibly_parenthesized!(
            out,
            !root && filters.len() > 1,
            try_separated_by(
                out,
                filters,
                |out, v| self.write_filter(context, out, query, v, false),
                separator,
            )?
        );
        Ok(())
    }

    fn write_group_by(
        &self,
        context: &mut Context,
        out: &mut String,
        query: &DatabaseQuery,
    ) -> Result<()> {
        if query.group_by.is_empty() {
            return Ok(());
        }
        let previous = context.switch_fragment(Fragment::SqlGroupBy);
        out.push_str(" GROUP BY ");
        try_separated_by(
            out,
            &query.group_by,
            |out, v| {
                query.check_field(v)?;
                self.write_field_ref(context, out, v);
                Ok::<_, crate::Error>(())
            },
            ", ",
        )?;
        context.switch_fragment(previous);
        Ok(())
    }

    fn write_order_by(
        &self,
        context: &mut Context,
        out: &mut String,
        query: &DatabaseQuery,
    ) -> Result<()> {
        if query.sorts.is_empty() {
            return Ok(());
        }
        let previous = context.switch_fragment(Fragment::SqlOrderBy);
        out.push_str(" ORDER BY ");
        try_separated_by(
            out,
            &query.sorts,
            |out, v| {
                query.check_field(&v.field)?;
                self.write_field_ref(context, out, &v.field);
                out.push_str(match v.direction {
                    Direction::Ascending => " ASC",
                    Direction::Descending => " DESC",
                });
                Ok::<_, crate::Error>(())
            },
            ", ",
        )?;
        context.switch_fragment(previous);
        Ok(())
    }

    fn write_limit(&self, _context: &mut Context, out: &mut String, query: &DatabaseQuery) {
        let Some(limit) = query.limit else {
            return;
        };
        let _ = match self.limit_style() {
            LimitStyle::LimitOffset if limit.offset == 0 => write!(out, " LIMIT {}", limit.count),
            LimitStyle::LimitOffset => {
                write!(out, " LIMIT {} OFFSET {}", limit.count, limit.offset)
            }
            LimitStyle::OffsetComma => write!(out, " LIMIT {}, {}", limit.offset, limit.count),
        };
    }

    /// One statement per element, executed in order.
    fn write_schema(&self, schema: &SchemaQuery) -> Result<Vec<String>> {
        schema.validate()?;
        let mut context = Context::new(Fragment::None, false);
        let mut result = Vec::new();
        match schema.action {
            SchemaAction::Create => {
                let mut out = String::with_capacity(256);
                self.write_create_table(&mut context, &mut out, schema);
                result.push(out);
            }
            SchemaAction::Update => {
                let previous = context.switch_fragment(Fragment::SqlAlterTable);
                for field in &schema.create_fields {
                    let mut out = String::with_capacity(128);
                    out.push_str("ALTER TABLE ");
                    self.write_identifier_quoted(&mut context, &mut out, &schema.entity);
                    out.push_str(" ADD COLUMN ");
                    self.write_column_def(&mut context, &mut out, field);
                    out.push(';');
                    result.push(out);
                }
                for name in &schema.delete_fields {
                    let mut out = String::with_capacity(128);
                    out.push_str("ALTER TABLE ");
                    self.write_identifier_quoted(&mut context, &mut out, &schema.entity);
                    out.push_str(" DROP COLUMN ");
                    self.write_identifier_quoted(&mut context, &mut out, name);
                    out.push(';');
                    result.push(out);
                }
                context.switch_fragment(previous);
            }
            SchemaAction::Delete => {
                let mut out = String::with_capacity(64);
                self.write_drop_table(&mut context, &mut out, schema);
                result.push(out);
            }
        }
        Ok(result)
    }

    fn write_create_table(&self, context: &mut Context, out: &mut String, schema: &SchemaQuery) {
        let previous = context.switch_fragment(Fragment::SqlCreateTable);
        out.push_str("CREATE TABLE ");
        self.write_identifier_quoted(context, out, &schema.entity);
        out.push_str(" (\n");
        separated_by(
            out,
            &schema.create_fields,
            |out, v| self.write_column_def(context, out, v),
            ",\n",
        );
        out.push_str("\n);");
        context.switch_fragment(previous);
    }

    fn write_drop_table(&self, context: &mut Context, out: &mut String, schema: &SchemaQuery) {
        let previous = context.switch_fragment(Fragment::SqlDropTable);
        out.push_str("DROP TABLE IF EXISTS ");
        self.write_identifier_quoted(context, out, &schema.entity);
        out.push(';');
        context.switch_fragment(previous);
    }

    fn write_column_def(&self, context: &mut Context, out: &mut String, field: &FieldDef) {
        self.write_identifier_quoted(context, out, &field.name);
        out.push(' ');
        self.write_column_type(context, out, &field.value);
        if field.primary_key {
            out.push_str(" PRIMARY KEY");
            if field.auto_increment {
                self.write_auto_increment(context, out);
            }
        } else {
            if !field.nullable {
                out.push_str(" NOT NULL");
            }
            if field.unique {
                out.push_str(" UNIQUE");
            }
        }
        if let Some(default) = &field.default {
            out.push_str(" DEFAULT ");
            self.write_value(context, out, default);
        }
        if let Some(references) = &field.references {
            out.push_str(" REFERENCES ");
            self.write_identifier_quoted(context, out, &references.entity);
            out.push('(');
            self.write_identifier_quoted(context, out, &references.name);
            out.push(')');
        }
    }

    fn write_auto_increment(&self, _context: &mut Context, out: &mut String) {
        out.push_str(" AUTOINCREMENT");
    }

    fn write_transaction_begin(&self, out: &mut String) {
        out.push_str("BEGIN;");
    }

    fn write_transaction_commit(&self, out: &mut String) {
        out.push_str("COMMIT;");
    }

    fn write_transaction_rollback(&self, out: &mut String) {
        out.push_str("ROLLBACK;");
    }

    /// Render the SQL type for a `Value` prototype.
    fn write_column_type(&self, _context: &mut Context, out: &mut String, value: &Value) {
        match value {
            Value::Boolean(..) => out.push_str("BOOLEAN"),
            Value::Int8(..) => out.push_str("TINYINT"),
            Value::Int16(..) => out.push_str("SMALLINT"),
            Value::Int32(..) => out.push_str("INTEGER"),
            Value::Int64(..) => out.push_str("BIGINT"),
            Value::UInt8(..) => out.push_str("UTINYINT"),
            Value::UInt16(..) => out.push_str("USMALLINT"),
            Value::UInt32(..) => out.push_str("UINTEGER"),
            Value::UInt64(..) => out.push_str("UBIGINT"),
            Value::Float32(..) => out.push_str("FLOAT"),
            Value::Float64(..) => out.push_str("DOUBLE"),
            Value::Varchar(..) => out.push_str("VARCHAR"),
            Value::Blob(..) => out.push_str("BLOB"),
            Value::Date(..) => out.push_str("DATE"),
            Value::Time(..) => out.push_str("TIME"),
            Value::Timestamp(..) => out.push_str("TIMESTAMP"),
            Value::Uuid(..) => out.push_str("UUID"),
            Value::Null => log::error!("Cannot derive a column type from an untyped NULL"),
        };
    }

    /// Render a literal value, only used where placeholders are not allowed (defaults).
    fn write_value(&self, context: &mut Context, out: &mut String, value: &Value) {
        match value {
            v if v.is_null() => out.push_str("NULL"),
            Value::Boolean(Some(v)) => self.write_value_bool(context, out, *v),
            Value::Float32(Some(v)) => {
                let _ = write!(out, "{}", v);
            }
            Value::Float64(Some(v)) => {
                let _ = write!(out, "{}", v);
            }
            Value::Varchar(Some(v)) => self.write_value_string(context, out, v),
            Value::Blob(Some(v)) => self.write_value_blob(context, out, v),
            Value::Uuid(Some(v)) => self.write_value_string(context, out, &v.to_string()),
            v => {
                if let Some(text) = temporal_to_string(v) {
                    self.write_value_string(context, out, &text);
                } else if let Some(integer) = v.as_integer() {
                    let _ = write!(out, "{}", integer);
                }
            }
        }
    }

    fn write_value_bool(&self, _context: &mut Context, out: &mut String, value: bool) {
        out.push_str(if value { "TRUE" } else { "FALSE" });
    }

    fn write_value_string(&self, context: &mut Context, out: &mut String, value: &str) {
        out.push('\'');
        self.write_escaped(context, out, value, '\'', "''");
        out.push('\'');
    }

    fn write_value_blob(&self, _context: &mut Context, out: &mut String, value: &[u8]) {
        out.push_str("X'");
        for b in value {
            let _ = write!(out, "{:02X}", b);
        }
        out.push('\'');
    }
}

/// Writer with the default rendering and no dialect overrides.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericSqlWriter {}

impl GenericSqlWriter {
    pub const fn new() -> Self {
        Self {}
    }
}

impl SqlWriter for GenericSqlWriter {}
