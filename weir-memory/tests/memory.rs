#[cfg(test)]
mod tests {
    use std::time::Duration;
    use tokio::time::timeout;
    use weir_core::{
        Connection, ConnectionProvider, Entity, FieldDef, SchemaBuilder, Transaction,
        UrlProvider, Value, future::FutureExt,
    };
    use weir_memory::{MemoryConnection, MemoryDriver};
    use weir_tests::{Galaxy, create_tables, execute_tests, init_logs, silent_logs};

    #[tokio::test]
    async fn memory() {
        init_logs();
        let connection = MemoryConnection::connect("memory://".into())
            .await
            .expect("Could not open the database");
        execute_tests(connection).await;
    }

    #[tokio::test]
    async fn wrong_url() {
        silent_logs! {
            assert!(
                MemoryConnection::connect("sqlite://some_value".into())
                    .await
                    .is_err()
            );
        };
    }

    #[tokio::test]
    async fn separate_databases() {
        init_logs();
        let provider = UrlProvider::<MemoryConnection>::new("memory://");
        let mut first = provider.acquire().await.expect("Could not open the database");
        create_tables(&mut first).await;
        Galaxy::new("Milky Way")
            .save(&mut first)
            .await
            .expect("Failed to save a galaxy");
        let mut second = provider.acquire().await.expect("Could not open the database");
        silent_logs! {
            assert!(
                Galaxy::query(&mut second).count().await.is_err(),
                "Every url connection opens a new database"
            );
        }
        provider.release(second).await;
        provider.release(first).await;
    }

    #[tokio::test]
    async fn transaction_holds_the_database() {
        init_logs();
        let driver = MemoryDriver::new();
        let mut first = driver.connection();
        let mut second = driver.connection();
        create_tables(&mut first).await;
        let mut transaction = first.begin().await.expect("Failed to begin a transaction");
        Galaxy::new("Milky Way")
            .save(&mut transaction)
            .await
            .expect("Failed to save a galaxy");
        assert!(
            timeout(Duration::from_millis(50), Galaxy::query(&mut second).count())
                .await
                .is_err(),
            "Other connections wait for the transaction to end"
        );
        transaction
            .commit()
            .await
            .expect("Failed to commit the transaction");
        assert_eq!(
            Galaxy::query(&mut second)
                .count()
                .await
                .expect("Failed to count the galaxies"),
            Some(1)
        );
    }

    #[tokio::test]
    async fn shared_driver() {
        init_logs();
        let driver = MemoryDriver::new();
        driver
            .with_connection(|connection| {
                async move {
                    create_tables(connection).await;
                    let mut galaxy = Galaxy::new("Andromeda");
                    galaxy.save(connection).await
                }
                .boxed()
            })
            .await
            .expect("Failed to save a galaxy");
        let count = driver
            .with_connection(|connection| Galaxy::query(connection).count().boxed())
            .await
            .expect("Failed to count the galaxies");
        assert_eq!(count, Some(1));
        silent_logs! {
            let result = driver
                .with_connection(|connection| {
                    async move { Galaxy::new("Andromeda").save(connection).await }.boxed()
                })
                .await;
            assert!(result.is_err(), "The galaxy name is unique");
        }
    }

    #[tokio::test]
    async fn alter_table() {
        init_logs();
        let mut connection = MemoryDriver::new().connection();
        create_tables(&mut connection).await;
        Galaxy::new("Milky Way")
            .save(&mut connection)
            .await
            .expect("Failed to save a galaxy");
        SchemaBuilder::update(&mut connection, "galaxies")
            .field(FieldDef::new("arms", Value::Int32(None)).default(4))
            .run()
            .await
            .expect("Failed to add a column");
        let galaxy = Galaxy::query(&mut connection)
            .first()
            .await
            .expect("Failed to read a galaxy")
            .expect("The galaxy should exist");
        assert_eq!(galaxy.name, "Milky Way");
        silent_logs! {
            assert!(
                SchemaBuilder::update(&mut connection, "galaxies")
                    .delete_field("spiral")
                    .run()
                    .await
                    .is_err(),
                "The column does not exist"
            );
        }
        SchemaBuilder::update(&mut connection, "galaxies")
            .delete_field("arms")
            .run()
            .await
            .expect("Failed to drop a column");
    }
}
