mod aggregates;
mod crud;
mod filters;
mod joins;
mod migrations;
mod models;
mod recorder;
mod relations;
mod soft_delete;
mod transactions;

use aggregates::aggregates;
use crud::crud;
use filters::{filters, pagination};
use joins::joins;
use log::LevelFilter;
use migrations::migrations;
pub use models::*;
pub use recorder::*;
use relations::{eager_loading, siblings};
use soft_delete::soft_delete;
use std::env;
use transactions::transactions;
use weir::Connection;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Behavior every driver must share, run it from the tests of the driver.
pub async fn execute_tests<C: Connection>(connection: C) {
    let mut recorder = Recorder::new(connection);
    crud(&mut recorder).await;
    filters(&mut recorder).await;
    pagination(&mut recorder).await;
    aggregates(&mut recorder).await;
    eager_loading(&mut recorder).await;
    siblings(&mut recorder).await;
    soft_delete(&mut recorder).await;
    joins(&mut recorder).await;
    transactions(&mut recorder).await;
    migrations(&mut recorder).await;
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
