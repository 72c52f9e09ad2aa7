// sauda_server/src/web/routes.rs

use actix_web::web;

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/orders")
          .route("", web::post().to(crate::web::handlers::order_handlers::create_order_handler))
          .route(
            "/transitions",
            web::get().to(crate::web::handlers::order_handlers::allowed_transitions_handler),
          )
          .route(
            "/prepare-card-payment",
            web::post().to(crate::web::handlers::order_handlers::prepare_card_payment_handler),
          )
          // The payment provider redirects the customer's browser here; it is
          // the only unauthenticated order route.
          .route(
            "/payment-callback",
            web::get().to(crate::web::handlers::order_handlers::payment_callback_handler),
          )
          .route(
            "/{order_id}/status",
            web::patch().to(crate::web::handlers::order_handlers::update_order_status_handler),
          ),
      ),
  );
}
