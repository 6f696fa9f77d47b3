#[cfg(test)]
mod tests {
    use indoc::indoc;
    use weir_core::{
        Action, Comparison, DatabaseQuery, Entity, Filter, SchemaQuery, SqlWriter, Value,
    };
    use weir_sqlite::SqliteSqlWriter;
    use weir_tests::{Planet, PlanetTag, Tag};

    const WRITER: SqliteSqlWriter = SqliteSqlWriter {};

    #[test]
    fn create_table() {
        assert_eq!(
            WRITER
                .write_schema(&SchemaQuery::create_entity::<Planet>())
                .expect("Failed to write the planets table"),
            [indoc! {r#"
                CREATE TABLE "planets" (
                "id" INTEGER PRIMARY KEY AUTOINCREMENT,
                "name" TEXT NOT NULL,
                "radius" REAL,
                "habitable" INTEGER NOT NULL DEFAULT 0,
                "star_id" INTEGER REFERENCES "stars"("id"),
                "created_at" TEXT,
                "updated_at" TEXT,
                "deleted_at" TEXT
                );"#}]
        );
        assert_eq!(
            WRITER
                .write_schema(&SchemaQuery::create_entity::<PlanetTag>())
                .expect("Failed to write the pivot table"),
            [indoc! {r#"
                CREATE TABLE "planet+tag" (
                "id" INTEGER PRIMARY KEY AUTOINCREMENT,
                "planet_id" INTEGER REFERENCES "planets"("id"),
                "tag_id" TEXT REFERENCES "tags"("id")
                );"#}]
        );
        assert_eq!(
            WRITER
                .write_schema(&SchemaQuery::create_entity::<Tag>())
                .expect("Failed to write the tags table")[0],
            indoc! {r#"
                CREATE TABLE "tags" (
                "id" TEXT PRIMARY KEY,
                "name" TEXT NOT NULL UNIQUE
                );"#}
        );
    }

    #[test]
    fn binds() {
        let mut query = DatabaseQuery::new(Planet::entity().name.clone(), Action::Update);
        query.input = vec![
            ("habitable".into(), Value::Boolean(Some(true))),
            ("name".into(), Value::from("Earth")),
        ];
        query.filter.push(Filter::compare(
            Planet::radius,
            Comparison::GreaterThan,
            6000.0,
        ));
        let statement = WRITER.write_query(&query).expect("Failed to write the update");
        assert_eq!(
            statement.sql,
            r#"UPDATE "planets" SET "habitable" = ?, "name" = ? WHERE "planets"."radius" > ?"#
        );
        assert_eq!(
            statement.binds,
            [
                Value::Boolean(Some(true)),
                Value::Varchar(Some("Earth".into())),
                Value::Float64(Some(6000.0)),
            ]
        );
    }
}
