#[cfg(test)]
mod tests {
    use indoc::indoc;
    use time::PrimitiveDateTime;
    use weir::{
        Comparison, Direction, Entity, GenericSqlWriter, JoinKind, Relation, SchemaQuery,
        SqlWriter, Value,
    };
    use weir_memory::MemoryDriver;

    #[derive(Entity)]
    #[weir(entity = "trains")]
    struct Train {
        id: Option<i64>,
        #[weir(unique)]
        code: String,
        #[weir(default = 8)]
        cars: i16,
        #[weir(references = Line)]
        line_id: Option<i64>,
        #[weir(updated_at)]
        updated_at: Option<PrimitiveDateTime>,
    }

    #[derive(Entity)]
    #[weir(entity = "lines")]
    struct Line {
        id: Option<i64>,
        name: String,
        electric: bool,
    }

    const WRITER: GenericSqlWriter = GenericSqlWriter::new();

    #[test]
    fn create_from_entity() {
        let statements = WRITER
            .write_schema(&SchemaQuery::create_entity::<Train>())
            .expect("Failed to write the trains");
        assert_eq!(
            statements,
            [indoc! {r#"
                CREATE TABLE "trains" (
                "id" BIGINT PRIMARY KEY AUTOINCREMENT,
                "code" VARCHAR NOT NULL UNIQUE,
                "cars" SMALLINT NOT NULL DEFAULT 8,
                "line_id" BIGINT REFERENCES "lines"("id"),
                "updated_at" TIMESTAMP
                );"#}]
        );
        assert_eq!(
            WRITER
                .write_schema(&SchemaQuery::delete_entity::<Line>())
                .expect("Failed to write the lines"),
            [r#"DROP TABLE IF EXISTS "lines";"#]
        );
    }

    #[test]
    fn builder_to_statement() {
        let mut connection = MemoryDriver::new().connection();
        let builder = Train::query(&mut connection)
            .join::<Line>()
            .filter(Line::electric, Comparison::Equals, true)
            .group(Relation::Or, |v| {
                v.filter(Train::cars, Comparison::GreaterOrEqual, 10)
                    .filter("code", Comparison::HasPrefix, "IC")
            })
            .sort(Train::code, Direction::Descending)
            .limit_offset(20, 40);
        let statement = WRITER
            .write_query(builder.query())
            .expect("Failed to write the query");
        assert_eq!(
            statement.sql,
            [
                r#"SELECT "trains"."id", "trains"."code", "trains"."cars", "trains"."line_id", "trains"."updated_at","#,
                r#" "lines"."id" AS "lines_id", "lines"."name" AS "lines_name", "lines"."electric" AS "lines_electric""#,
                r#" FROM "trains" INNER JOIN "lines" ON "trains"."line_id" = "lines"."id""#,
                r#" WHERE "lines"."electric" = ? AND ("trains"."cars" >= ? OR "trains"."code" LIKE ? ESCAPE '\')"#,
                r#" ORDER BY "trains"."code" DESC LIMIT 20 OFFSET 40"#,
            ]
            .concat()
        );
        assert_eq!(
            statement.binds,
            [
                Value::Boolean(Some(true)),
                Value::Int32(Some(10)),
                Value::Varchar(Some("IC%".into())),
            ]
        );
        drop(builder);

        let builder = Line::query(&mut connection).join_on::<Train>(
            JoinKind::Left,
            Line::id,
            Train::line_id,
        );
        let statement = WRITER
            .write_query(builder.query())
            .expect("Failed to write the query");
        assert!(
            statement
                .sql
                .ends_with(r#" FROM "lines" LEFT JOIN "trains" ON "lines"."id" = "trains"."line_id""#)
        );
        assert!(statement.binds.is_empty());
    }
}
