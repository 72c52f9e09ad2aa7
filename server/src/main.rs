// sauda_server/src/main.rs

mod config;
mod errors;
mod services;
mod state;
mod web;

use crate::config::AppConfig;
use crate::services::xpay::{CardPaymentsUnavailable, XPayClient};
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use sauda::payments::{PaymentIntentCreator, PaymentVerifier};
use sauda::OrderWorkflow;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting order service...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      panic!("Configuration error: {}", e);
    }
  };

  let db_pool = match PgPool::connect(&app_config.database_url).await {
    Ok(pool) => {
      tracing::info!("Successfully connected to the database.");
      pool
    }
    Err(e) => {
      tracing::error!(error = %e, "Failed to connect to the database.");
      panic!("Database connection error: {}", e);
    }
  };

  if let Err(e) = sqlx::migrate!("../core/migrations").run(&db_pool).await {
    tracing::error!(error = %e, "Failed to run database migrations.");
    panic!("Migration error: {}", e);
  }

  // One gateway client serves as both verifier and intent creator; without
  // credentials, card payments are disabled but COD keeps working.
  let (verifier, intents): (Arc<dyn PaymentVerifier>, Arc<dyn PaymentIntentCreator>) =
    match XPayClient::from_config(&app_config) {
      Some(client) => {
        let client = Arc::new(client);
        (client.clone(), client)
      }
      None => {
        tracing::warn!("Payment gateway credentials not configured; card payments are disabled.");
        let stub = Arc::new(CardPaymentsUnavailable);
        (stub.clone(), stub)
      }
    };

  let workflow = OrderWorkflow::new(
    db_pool.clone(),
    app_config.fee_policy(),
    verifier,
    intents,
    app_config.session_config(),
  );

  let app_state = AppState {
    db_pool: db_pool.clone(),
    workflow,
    config: app_config.clone(),
  };

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
