use crate::{Planet, silent_logs};
use std::borrow::Cow;
use weir::{
    Entity, EntityMigration, Executor, FieldDef, Migration, MigrationLog, MigrationRunner, Result,
    SchemaBuilder, Value,
    future::{BoxFuture, FutureExt},
};

#[derive(Entity, Debug, Clone, PartialEq)]
#[weir(entity = "comets")]
struct Comet {
    id: Option<i64>,
    name: String,
    period: Option<f64>,
}

/// Moons built field by field.
struct CreateMoons;

impl<E: Executor> Migration<E> for CreateMoons {
    fn name(&self) -> Cow<'static, str> {
        "create_moons".into()
    }

    fn prepare<'a>(&'a self, executor: &'a mut E) -> BoxFuture<'a, Result<()>> {
        SchemaBuilder::create(executor, "moons")
            .id()
            .field(FieldDef::new("name", Value::Varchar(None)).unique())
            .parent::<Planet>()
            .run()
            .boxed()
    }

    fn revert<'a>(&'a self, executor: &'a mut E) -> BoxFuture<'a, Result<()>> {
        SchemaBuilder::delete(executor, "moons").run().boxed()
    }
}

struct AddCometColor;

impl<E: Executor> Migration<E> for AddCometColor {
    fn name(&self) -> Cow<'static, str> {
        "add_comet_color".into()
    }

    fn prepare<'a>(&'a self, executor: &'a mut E) -> BoxFuture<'a, Result<()>> {
        SchemaBuilder::update(executor, "comets")
            .field(FieldDef::new("color", Value::Varchar(None)).nullable())
            .run()
            .boxed()
    }

    fn revert<'a>(&'a self, executor: &'a mut E) -> BoxFuture<'a, Result<()>> {
        SchemaBuilder::update(executor, "comets")
            .delete_field("color")
            .run()
            .boxed()
    }
}

pub async fn migrations<E: Executor>(executor: &mut E) {
    MigrationLog::drop_table(executor)
        .await
        .expect("Failed to drop the migration log");
    Comet::drop_table(executor)
        .await
        .expect("Failed to drop the comets");
    SchemaBuilder::delete(executor, "moons")
        .run()
        .await
        .expect("Failed to drop the moons");

    // First batch
    let runner = MigrationRunner::new()
        .add(EntityMigration::<Comet>::new())
        .add(CreateMoons);
    assert_eq!(
        runner
            .pending(executor)
            .await
            .expect("Failed to list the pending migrations"),
        ["create_comets", "create_moons"]
    );
    assert_eq!(
        runner
            .prepare_batch(executor)
            .await
            .expect("Failed to prepare the first batch"),
        ["create_comets", "create_moons"]
    );
    assert!(
        runner
            .pending(executor)
            .await
            .expect("Failed to list the pending migrations")
            .is_empty()
    );
    assert!(
        runner
            .prepare_batch(executor)
            .await
            .expect("Failed to prepare an empty batch")
            .is_empty()
    );
    let mut halley = Comet {
        id: None,
        name: "Halley".into(),
        period: Some(75.3),
    };
    halley.save(executor).await.expect("Failed to save a comet");
    silent_logs! {
        assert!(
            SchemaBuilder::create(executor, "moons")
                .id()
                .run()
                .await
                .is_err(),
            "The moons were already created"
        );
    }

    // Second batch
    let runner = runner.add(AddCometColor);
    assert_eq!(
        runner
            .prepare_batch(executor)
            .await
            .expect("Failed to prepare the second batch"),
        ["add_comet_color"]
    );
    let logs = runner
        .logs(executor)
        .await
        .expect("Failed to read the migration log");
    assert_eq!(
        logs.iter()
            .map(|v| (v.name.as_str(), v.batch))
            .collect::<Vec<_>>(),
        [
            ("create_comets", 1),
            ("create_moons", 1),
            ("add_comet_color", 2)
        ]
    );
    assert!(logs.iter().all(|v| v.created_at.is_some()));
    let stored = Comet::find(executor, halley.id)
        .await
        .expect("Failed to read a comet after adding a column")
        .expect("Halley should exist");
    assert_eq!(stored, halley);

    // Revert
    assert_eq!(
        runner
            .revert_last_batch(executor)
            .await
            .expect("Failed to revert the last batch"),
        ["add_comet_color"]
    );
    assert_eq!(
        runner
            .pending(executor)
            .await
            .expect("Failed to list the pending migrations"),
        ["add_comet_color"]
    );
    assert_eq!(
        runner
            .revert_all(executor)
            .await
            .expect("Failed to revert every migration"),
        ["create_moons", "create_comets"]
    );
    assert!(
        runner
            .logs(executor)
            .await
            .expect("Failed to read the migration log")
            .is_empty()
    );
    silent_logs! {
        assert!(
            Comet::query(executor).count().await.is_err(),
            "The comets were dropped"
        );
    }
    assert!(
        runner
            .revert_all(executor)
            .await
            .expect("Failed to revert nothing")
            .is_empty()
    );
}
