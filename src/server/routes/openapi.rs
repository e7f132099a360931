//! OpenAPI document endpoint
//!
//! Serves the specification document embedded into the binary at build time,
//! byte for byte. The permissive CORS header lets browser-based API viewers
//! load it directly.

use crate::server::state::AppState;
use actix_web::{HttpResponse, web};

/// Configure the OpenAPI document route
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/openapi.yaml", web::get().to(get_openapi));
}

/// Serve the embedded OpenAPI YAML document unmodified
pub async fn get_openapi(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/yaml")
        .insert_header(("Access-Control-Allow-Origin", "*"))
        .body(state.openapi.clone())
}
