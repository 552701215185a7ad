//! handlers/auth_guard.rs
//! Chequeo de token estático (`Authorization: Token <t>` o `Bearer <t>`).

use actix_web::{http::header, HttpRequest, HttpResponse};
use serde_json::json;

use crate::config::proxy_config::ProxyConfig;

/// `Err` trae ya la respuesta 403 lista para devolver.
pub fn authorize(req: &HttpRequest, config: &ProxyConfig) -> Result<(), HttpResponse> {
    if !config.auth_enabled() {
        return Ok(());
    }

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Token ").or_else(|| v.strip_prefix("Bearer ")))
        .map(str::trim);

    match token {
        Some(t) if config.api_tokens.iter().any(|known| known == t) => Ok(()),
        Some(_) => Err(HttpResponse::Forbidden().json(json!({
            "detail": "Invalid token."
        }))),
        None => Err(HttpResponse::Forbidden().json(json!({
            "detail": "Authentication credentials were not provided."
        }))),
    }
}
