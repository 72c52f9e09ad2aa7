// sauda_server/src/state.rs

use crate::config::AppConfig;
use sauda::OrderWorkflow;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub db_pool: PgPool,
  pub workflow: OrderWorkflow,
  pub config: Arc<AppConfig>,
}
