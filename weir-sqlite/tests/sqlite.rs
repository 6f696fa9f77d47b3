#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Mutex;
    use tokio::fs;
    use weir_sqlite::SqliteDriver;
    use weir_tests::{execute_tests, init_logs};

    static MUTEX: Mutex<()> = Mutex::new(());

    #[tokio::test]
    async fn sqlite() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/tests.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH).await.expect(
                format!("Failed to remove existing test database file {}", DB_PATH).as_str(),
            );
        }
        assert!(
            !Path::new(DB_PATH).exists(),
            "Database file should not exist before test"
        );
        let driver = SqliteDriver::new();
        let connection = driver
            .connect(format!("sqlite://{}?mode=rwc", DB_PATH).into())
            .await
            .expect("Could not open the database");
        assert!(
            Path::new(DB_PATH).exists(),
            "Database file should be created after connection"
        );
        execute_tests(connection).await;
    }

    #[tokio::test]
    async fn sqlite_in_memory() {
        init_logs();
        let connection = SqliteDriver::new()
            .connect("sqlite::memory:".into())
            .await
            .expect("Could not open the database");
        execute_tests(connection).await;
    }
}
