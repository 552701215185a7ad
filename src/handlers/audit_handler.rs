//! handlers/audit_handler.rs
//! Consulta del historial de auditoría.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::config::proxy_config::ProxyConfig;
use crate::handlers::auth_guard;
use crate::services::audit_service::AuditService;

#[derive(Deserialize)]
pub struct PaginationQuery {
    page: Option<u64>,
    page_size: Option<u64>,
}

/// GET /api/audit
pub async fn list_audit_endpoint(
    req: HttpRequest,
    audit_service: web::Data<AuditService>,
    config: web::Data<ProxyConfig>,
    query: web::Query<PaginationQuery>,
) -> HttpResponse {
    if let Err(resp) = auth_guard::authorize(&req, &config) {
        return resp;
    }

    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(10);

    match audit_service.list_entries(page, page_size).await {
        Ok(list) => HttpResponse::Ok().json(list),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": "Internal server error",
            "details": format!("{:?}", e)
        })),
    }
}

/// GET /api/audit/{id}
pub async fn get_audit_endpoint(
    req: HttpRequest,
    audit_service: web::Data<AuditService>,
    config: web::Data<ProxyConfig>,
    path: web::Path<String>,
) -> HttpResponse {
    if let Err(resp) = auth_guard::authorize(&req, &config) {
        return resp;
    }

    let request_id = path.into_inner();

    match audit_service.get_entry(&request_id).await {
        Ok(Some(entry)) => HttpResponse::Ok().json(entry),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Audit entry not found",
            "details": request_id
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": "Internal server error",
            "details": format!("{:?}", e)
        })),
    }
}
