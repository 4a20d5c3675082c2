mod exec_log;
pub use exec_log::ExecLog;

mod logging_driver;
pub use logging_driver::{DriverOp, LoggingDriver};

pub mod models;

pub use std_util::*;

use strata::{db::Builder, Db};
use strata_driver_sqlite::Sqlite;

/// A database over a fresh in-memory SQLite store with every fixture table
/// created, plus the log of the statements it executes.
pub struct Test {
    pub db: Db,
    pub log: ExecLog,
}

pub async fn setup(mut builder: Builder) -> Test {
    let _ = env_logger::builder().is_test(true).try_init();

    let driver = LoggingDriver::new(Box::new(Sqlite::in_memory()));
    let log = ExecLog::new(driver.ops_log_handle());

    let db = builder.build(driver).await.unwrap();
    db.execute_batch(models::SCHEMA).await.unwrap();

    Test { db, log }
}

#[macro_export]
macro_rules! models {
    (
        $( $model:ident ),*
    ) => {{
        let mut builder = strata::Db::builder();
        $( builder.register::<$model>(); )*
        builder
    }};
}
