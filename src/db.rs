use std::sync::Arc;

use sqlx::MySqlPool;

use crate::lifecycle::AppState;
use crate::store::{MySqlLedger, MySqlRequestStore};

pub async fn init_db(database_url: &str) -> MySqlPool {
    MySqlPool::connect(database_url)
        .await
        .expect("Failed to connect to database")
}

/// Production wiring: MySQL-backed ledger and request store behind the
/// engine. Tests build the same state over the in-memory adapters.
pub fn mysql_state(pool: &MySqlPool) -> AppState {
    AppState::new(
        Arc::new(MySqlLedger::new(pool.clone())),
        Arc::new(MySqlRequestStore::new(pool.clone())),
    )
}
