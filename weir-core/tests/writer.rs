#[cfg(test)]
mod tests {
    use indoc::indoc;
    use weir_core::{
        Action, AggregateFunction, Comparison, DatabaseQuery, Direction, FieldDef, FieldRef,
        Filter, GenericSqlWriter, Join, JoinKind, Limit, LimitStyle, QueryError, QueryField,
        SchemaAction, SchemaQuery, Sort, SqlWriter, Statement, Value, writer::Context,
    };

    const WRITER: GenericSqlWriter = GenericSqlWriter::new();

    fn field(name: &'static str) -> FieldRef {
        FieldRef::new("planet", name)
    }

    fn select() -> DatabaseQuery {
        DatabaseQuery::new("planet", Action::Select)
    }

    fn query_error(query: &DatabaseQuery) -> QueryError {
        WRITER
            .write_query(query)
            .expect_err("The query should not be written")
            .downcast::<QueryError>()
            .expect("Expected a QueryError")
    }

    struct BacktickWriter;
    impl SqlWriter for BacktickWriter {
        fn limit_style(&self) -> LimitStyle {
            LimitStyle::OffsetComma
        }
        fn write_identifier_quoted(&self, context: &mut Context, out: &mut String, value: &str) {
            out.push('`');
            self.write_escaped(context, out, value, '`', "``");
            out.push('`');
        }
    }

    struct NumberedWriter;
    impl SqlWriter for NumberedWriter {
        fn write_placeholder(&self, context: &mut Context, out: &mut String) {
            out.push('$');
            out.push_str(&context.counter.to_string());
        }
    }

    #[test]
    fn select_everything() {
        let statement = WRITER.write_query(&select()).unwrap();
        assert_eq!(statement.sql, r#"SELECT * FROM "planet""#);
        assert!(statement.binds.is_empty());
    }

    #[test]
    fn empty_groups_produce_no_where() {
        let mut query = select();
        query.filter.push(Filter::or(Vec::<Filter>::new()));
        query.filter.push(Filter::and([Filter::or(Vec::<Filter>::new())]));
        let statement = WRITER.write_query(&query).unwrap();
        assert_eq!(statement.sql, r#"SELECT * FROM "planet""#);
    }

    #[test]
    fn nested_groups() {
        let mut query = select();
        query
            .filter
            .push(Filter::compare(field("a"), Comparison::Equals, 1));
        query.filter.push(Filter::or([
            Filter::compare(field("b"), Comparison::Equals, 2),
            Filter::compare(field("c"), Comparison::Equals, 3),
        ]));
        query
            .filter
            .push(Filter::compare(field("d"), Comparison::Equals, 4));
        let statement = WRITER.write_query(&query).unwrap();
        assert_eq!(
            statement.sql,
            r#"SELECT * FROM "planet" WHERE "planet"."a" = ? AND ("planet"."b" = ? OR "planet"."c" = ?) AND "planet"."d" = ?"#
        );
        assert_eq!(
            statement.binds,
            [1, 2, 3, 4].map(|v| Value::Int32(Some(v))).to_vec()
        );
    }

    #[test]
    fn single_child_group_is_not_parenthesized() {
        let mut query = select();
        query.filter.push(Filter::or([Filter::compare(
            field("a"),
            Comparison::LessOrEqual,
            1.5,
        )]));
        query.filter.push(Filter::compare(
            field("b"),
            Comparison::GreaterOrEqual,
            2.5,
        ));
        let statement = WRITER.write_query(&query).unwrap();
        assert_eq!(
            statement.sql,
            r#"SELECT * FROM "planet" WHERE "planet"."a" <= ? AND "planet"."b" >= ?"#
        );
    }

    #[test]
    fn null_comparisons() {
        let mut query = select();
        query
            .filter
            .push(Filter::compare(field("star_id"), Comparison::Equals, Value::Null));
        query.filter.push(Filter::compare(
            field("name"),
            Comparison::NotEquals,
            Value::Varchar(None),
        ));
        let statement = WRITER.write_query(&query).unwrap();
        assert_eq!(
            statement.sql,
            r#"SELECT * FROM "planet" WHERE "planet"."star_id" IS NULL AND "planet"."name" IS NOT NULL"#
        );
        assert!(statement.binds.is_empty());

        let mut query = select();
        query.filter.push(Filter::compare(
            field("mass"),
            Comparison::GreaterThan,
            Value::Float64(None),
        ));
        assert!(matches!(
            query_error(&query),
            QueryError::NullComparison {
                op: Comparison::GreaterThan,
                ..
            }
        ));
    }

    #[test]
    fn patterns() {
        let mut query = select();
        query
            .filter
            .push(Filter::compare(field("name"), Comparison::HasPrefix, "Ea"));
        query
            .filter
            .push(Filter::compare(field("name"), Comparison::HasSuffix, "th"));
        query
            .filter
            .push(Filter::compare(field("name"), Comparison::Contains, "ar"));
        let statement = WRITER.write_query(&query).unwrap();
        assert_eq!(
            statement.sql,
            r#"SELECT * FROM "planet" WHERE "planet"."name" LIKE ? ESCAPE '\' AND "planet"."name" LIKE ? ESCAPE '\' AND "planet"."name" LIKE ? ESCAPE '\'"#
        );
        assert_eq!(
            statement.binds,
            vec![
                Value::Varchar(Some("Ea%".into())),
                Value::Varchar(Some("%th".into())),
                Value::Varchar(Some("%ar%".into())),
            ]
        );

        let mut query = select();
        query
            .filter
            .push(Filter::compare(field("name"), Comparison::HasPrefix, "100%"));
        query
            .filter
            .push(Filter::compare(field("name"), Comparison::Contains, "a_c\\d"));
        let statement = WRITER.write_query(&query).unwrap();
        assert_eq!(
            statement.binds,
            vec![
                Value::Varchar(Some("100\\%%".into())),
                Value::Varchar(Some("%a\\_c\\\\d%".into())),
            ]
        );

        let mut query = select();
        query
            .filter
            .push(Filter::compare(field("name"), Comparison::Contains, 5));
        assert!(matches!(
            query_error(&query),
            QueryError::InvalidOperand { .. }
        ));
    }

    #[test]
    fn subsets() {
        let mut query = select();
        query.filter.push(Filter::subset(
            field("id"),
            weir_core::Scope::In,
            [1i64, 2, 3],
        ));
        query.filter.push(Filter::subset(
            field("name"),
            weir_core::Scope::NotIn,
            ["Pluto"],
        ));
        let statement = WRITER.write_query(&query).unwrap();
        assert_eq!(
            statement.sql,
            r#"SELECT * FROM "planet" WHERE "planet"."id" IN (?, ?, ?) AND "planet"."name" NOT IN (?)"#
        );
        assert_eq!(statement.binds.len(), 4);

        let mut query = select();
        query.filter.push(Filter::subset(
            field("id"),
            weir_core::Scope::In,
            Vec::<i64>::new(),
        ));
        query.filter.push(Filter::subset(
            field("id"),
            weir_core::Scope::NotIn,
            Vec::<i64>::new(),
        ));
        let statement = WRITER.write_query(&query).unwrap();
        assert_eq!(
            statement.sql,
            r#"SELECT * FROM "planet" WHERE 1 = 0 AND 1 = 1"#
        );
        assert!(statement.binds.is_empty());
    }

    #[test]
    fn sorts_and_limits() {
        let mut query = select();
        query.sorts.push(Sort::new(field("name"), Direction::Ascending));
        query.sorts.push(Sort::new(field("id"), Direction::Descending));
        query.limit = Some(Limit {
            count: 10,
            offset: 20,
        });
        let statement = WRITER.write_query(&query).unwrap();
        assert_eq!(
            statement.sql,
            r#"SELECT * FROM "planet" ORDER BY "planet"."name" ASC, "planet"."id" DESC LIMIT 10 OFFSET 20"#
        );

        query.sorts.clear();
        query.limit = Some(Limit {
            count: 1,
            offset: 0,
        });
        let statement = WRITER.write_query(&query).unwrap();
        assert_eq!(statement.sql, r#"SELECT * FROM "planet" LIMIT 1"#);
    }

    #[test]
    fn dialect_hooks() {
        let mut query = select();
        query.limit = Some(Limit {
            count: 10,
            offset: 20,
        });
        let statement = BacktickWriter.write_query(&query).unwrap();
        assert_eq!(statement.sql, "SELECT * FROM `planet` LIMIT 20, 10");

        let mut query = select();
        query
            .filter
            .push(Filter::compare(field("a"), Comparison::Equals, 1));
        query
            .filter
            .push(Filter::compare(field("b"), Comparison::NotEquals, 2));
        let statement = NumberedWriter.write_query(&query).unwrap();
        assert_eq!(
            statement.sql,
            r#"SELECT * FROM "planet" WHERE "planet"."a" = $1 AND "planet"."b" != $2"#
        );
    }

    #[test]
    fn insert_update_delete() {
        let mut query = DatabaseQuery::new("planet", Action::Insert);
        query.input = vec![
            ("name".into(), "Earth".into()),
            ("mass".into(), 5.97.into()),
        ];
        let statement = WRITER.write_query(&query).unwrap();
        assert_eq!(
            statement.sql,
            r#"INSERT INTO "planet" ("name", "mass") VALUES (?, ?)"#
        );
        assert_eq!(
            statement.binds,
            vec![Value::Varchar(Some("Earth".into())), Value::Float64(Some(5.97))]
        );

        let mut query = DatabaseQuery::new("planet", Action::Update);
        query.input = vec![("name".into(), "Terra".into())];
        query
            .filter
            .push(Filter::compare(field("id"), Comparison::Equals, 3i64));
        let statement = WRITER.write_query(&query).unwrap();
        assert_eq!(
            statement.sql,
            r#"UPDATE "planet" SET "name" = ? WHERE "planet"."id" = ?"#
        );
        assert_eq!(
            statement.binds,
            vec![Value::Varchar(Some("Terra".into())), Value::Int64(Some(3))]
        );

        let mut query = DatabaseQuery::new("planet", Action::Delete);
        query
            .filter
            .push(Filter::compare(field("id"), Comparison::Equals, 3i64));
        let statement = WRITER.write_query(&query).unwrap();
        assert_eq!(
            statement.sql,
            r#"DELETE FROM "planet" WHERE "planet"."id" = ?"#
        );
    }

    #[test]
    fn payload_validation() {
        let query = DatabaseQuery::new("planet", Action::Insert);
        assert!(matches!(
            query_error(&query),
            QueryError::EmptyPayload {
                action: "Insert",
                ..
            }
        ));
        let mut query = select();
        query.input = vec![("name".into(), "Earth".into())];
        assert!(matches!(
            query_error(&query),
            QueryError::UnexpectedPayload { .. }
        ));
        let mut query = DatabaseQuery::new("planet", Action::Delete);
        query.joins.push(Join {
            kind: JoinKind::Inner,
            entity: "star".into(),
            local: field("star_id"),
            foreign: FieldRef::new("star", "id"),
        });
        assert_eq!(
            query_error(&query),
            QueryError::JoinedWrite {
                entity: "planet".into(),
                action: "Delete",
            }
        );
    }

    #[test]
    fn field_resolution() {
        let mut query = select();
        query.filter.push(Filter::compare(
            FieldRef::new("moon", "name"),
            Comparison::Equals,
            "Io",
        ));
        assert!(matches!(
            query_error(&query),
            QueryError::UnresolvedField { .. }
        ));

        let mut query = select();
        query.sorts.push(Sort::new(field(""), Direction::Ascending));
        assert!(matches!(query_error(&query), QueryError::EmptyField { .. }));
    }

    #[test]
    fn aggregates() {
        let mut query = DatabaseQuery::new(
            "planet",
            Action::Aggregate {
                function: AggregateFunction::Count,
                field: None,
            },
        );
        query.group_by.push(field("star_id"));
        let statement = WRITER.write_query(&query).unwrap();
        assert_eq!(
            statement.sql,
            r#"SELECT COUNT(*) AS "weir_aggregate" FROM "planet" GROUP BY "planet"."star_id""#
        );

        let mut query = DatabaseQuery::new(
            "planet",
            Action::Aggregate {
                function: AggregateFunction::Sum,
                field: Some(field("mass")),
            },
        );
        query
            .filter
            .push(Filter::compare(field("mass"), Comparison::GreaterThan, 1.0));
        let statement = WRITER.write_query(&query).unwrap();
        assert_eq!(
            statement.sql,
            r#"SELECT SUM("planet"."mass") AS "weir_aggregate" FROM "planet" WHERE "planet"."mass" > ?"#
        );
    }

    #[test]
    fn joins_and_distinct() {
        let mut query = select();
        query.fields = vec![
            QueryField::new(field("id")),
            QueryField::aliased(FieldRef::new("star", "name"), "star_name"),
        ];
        query.joins.push(Join {
            kind: JoinKind::Inner,
            entity: "star".into(),
            local: field("star_id"),
            foreign: FieldRef::new("star", "id"),
        });
        query.filter.push(Filter::compare(
            FieldRef::new("star", "name"),
            Comparison::Equals,
            "Sun",
        ));
        let statement = WRITER.write_query(&query).unwrap();
        assert_eq!(
            statement.sql,
            r#"SELECT "planet"."id", "star"."name" AS "star_name" FROM "planet" INNER JOIN "star" ON "planet"."star_id" = "star"."id" WHERE "star"."name" = ?"#
        );

        let mut query = select();
        query.distinct = true;
        query.fields = vec![QueryField::new(field("name"))];
        query.joins.push(Join {
            kind: JoinKind::Left,
            entity: "moon".into(),
            local: field("id"),
            foreign: FieldRef::new("moon", "planet_id"),
        });
        let statement = WRITER.write_query(&query).unwrap();
        assert_eq!(
            statement.sql,
            r#"SELECT DISTINCT "planet"."name" FROM "planet" LEFT JOIN "moon" ON "planet"."id" = "moon"."planet_id""#
        );
    }

    #[test]
    fn create_table() {
        let query = SchemaQuery {
            create_fields: vec![
                FieldDef::new("id", Value::Int64(None))
                    .primary_key()
                    .auto_increment(),
                FieldDef::new("name", Value::Varchar(None)).unique(),
                FieldDef::new("nickname", Value::Varchar(None))
                    .nullable()
                    .default("it's"),
                FieldDef::new("mass", Value::Float64(None))
                    .nullable()
                    .default(1.5),
                FieldDef::new("star_id", Value::Int64(None))
                    .references(FieldRef::new("star", "id")),
            ],
            ..SchemaQuery::new("planet", SchemaAction::Create)
        };
        let statements = WRITER.write_schema(&query).unwrap();
        assert_eq!(
            statements,
            [indoc! {r#"
                CREATE TABLE "planet" (
                "id" BIGINT PRIMARY KEY AUTOINCREMENT,
                "name" VARCHAR NOT NULL UNIQUE,
                "nickname" VARCHAR DEFAULT 'it''s',
                "mass" DOUBLE DEFAULT 1.5,
                "star_id" BIGINT NOT NULL REFERENCES "star"("id")
                );"#}]
        );
    }

    #[test]
    fn alter_and_drop_table() {
        let query = SchemaQuery {
            create_fields: vec![FieldDef::new("radius", Value::Float32(None)).nullable()],
            delete_fields: vec!["mass".into()],
            ..SchemaQuery::new("planet", SchemaAction::Update)
        };
        assert_eq!(
            WRITER.write_schema(&query).unwrap(),
            [
                r#"ALTER TABLE "planet" ADD COLUMN "radius" FLOAT;"#,
                r#"ALTER TABLE "planet" DROP COLUMN "mass";"#,
            ]
        );
        let query = SchemaQuery::new("planet", SchemaAction::Delete);
        assert_eq!(
            WRITER.write_schema(&query).unwrap(),
            [r#"DROP TABLE IF EXISTS "planet";"#]
        );
        let query = SchemaQuery::new("planet", SchemaAction::Create);
        assert!(WRITER.write_schema(&query).is_err());
    }

    #[test]
    fn statement_display_is_truncated() {
        let statement = Statement {
            sql: format!("SELECT {} FROM \"planet\"", "\"name\", ".repeat(100)),
            binds: Vec::new(),
        };
        let display = statement.to_string();
        assert!(display.ends_with("..."));
        assert!(display.len() <= 500);
        let statement = WRITER.write_query(&select()).unwrap();
        assert_eq!(statement.to_string(), r#"SELECT * FROM "planet""#);
    }

    #[test]
    fn transaction_statements() {
        let mut sql = String::new();
        WRITER.write_transaction_begin(&mut sql);
        WRITER.write_transaction_commit(&mut sql);
        WRITER.write_transaction_rollback(&mut sql);
        assert_eq!(sql, "BEGIN;COMMIT;ROLLBACK;");
    }

    #[test]
    fn filter_helpers() {
        assert!(Filter::default().is_empty());
        assert!(Filter::or([Filter::and(Vec::<Filter>::new())]).is_empty());
        let mut filter = Filter::compare("name", Comparison::Equals, "Mars");
        filter.push(Filter::compare("id", Comparison::Equals, 4));
        assert!(matches!(&filter, Filter::Group { filters, .. } if filters.len() == 2));
        filter.qualify(&"planet".into());
        assert_eq!(
            filter.fields(),
            vec![&FieldRef::new("planet", "name"), &FieldRef::new("planet", "id")]
        );
    }
}
