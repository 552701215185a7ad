//! handlers/api_handler.rs
//! Endpoint genérico para las 16 operaciones del proveedor.

use actix_web::{http::header, web, HttpRequest, HttpResponse};
use serde_json::{json, Map, Value};

use crate::config::operation_registry::{self, OperationSpec};
use crate::config::proxy_config::ProxyConfig;
use crate::handlers::auth_guard;
use crate::models::operation_model::{HttpVerb, OperationId};
use crate::models::params_model::{query_to_value, ValidationError};
use crate::services::dispatch_service::DispatchService;

/// Id del Request Record creado para esta llamada
pub const AUDIT_ID_HEADER: &str = "X-Audit-Request-Id";

/// `/api/<operation>/` con el verbo de la operación.
/// Auth -> validación -> dispatch. Si la validación falla no se audita nada.
pub async fn operation_endpoint(
    operation: OperationId,
    req: HttpRequest,
    body: web::Bytes,
    dispatcher: web::Data<DispatchService>,
    config: web::Data<ProxyConfig>,
) -> HttpResponse {
    if let Err(resp) = auth_guard::authorize(&req, &config) {
        return resp;
    }

    let spec = operation_registry::lookup(operation);
    let params = match extract_params(spec, &req, &body) {
        Ok(params) => params,
        Err(e) => {
            log::info!("(api) {} rechazada por validación: {:?}", operation, e.errors);
            return HttpResponse::BadRequest().json(json!({ "errors": e.errors }));
        }
    };

    match dispatcher.dispatch(operation, params).await {
        Ok(dispatched) => HttpResponse::build(dispatched.status)
            .append_header((AUDIT_ID_HEADER, dispatched.request_id))
            .json(dispatched.envelope),
        Err(e) => {
            log::error!("(api) {} error interno: {}", operation, e);
            HttpResponse::build(e.status()).json(e.envelope())
        }
    }
}

/// Verbo no soportado por la operación. Como en el resto del API, la
/// autenticación va primero: sin token válido es 403, no 405.
pub async fn method_not_allowed_endpoint(
    allowed: HttpVerb,
    req: HttpRequest,
    config: web::Data<ProxyConfig>,
) -> HttpResponse {
    if let Err(resp) = auth_guard::authorize(&req, &config) {
        return resp;
    }

    HttpResponse::MethodNotAllowed()
        .insert_header((header::ALLOW, allowed.to_method().as_str()))
        .json(json!({ "detail": format!("Method \"{}\" not allowed.", req.method()) }))
}

/// GET lee del query string; el resto, del cuerpo JSON (vacío = sin campos).
fn extract_params(
    spec: &OperationSpec,
    req: &HttpRequest,
    body: &[u8],
) -> Result<Option<Value>, ValidationError> {
    let Some(schema) = spec.schema else {
        return Ok(None);
    };

    let raw = if spec.verb.reads_query() {
        let pairs = web::Query::<Vec<(String, String)>>::from_query(req.query_string())
            .map_err(|e| ValidationError::single("non_field_errors", e.to_string()))?
            .into_inner();
        query_to_value(pairs)
    } else if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Map::new())
    } else {
        serde_json::from_slice(body).map_err(|e| {
            ValidationError::single("non_field_errors", format!("JSON parse error - {e}"))
        })?
    };

    schema(raw).map(Some)
}
