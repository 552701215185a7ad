//! services/dispatch_service.rs
//! Pipeline de auditoría y despacho: registra la petición, llama al
//! proveedor una sola vez, registra el resultado y decide el status HTTP.

use std::sync::Arc;

use actix_web::http::StatusCode;
use serde_json::Value;

use crate::config::operation_registry;
use crate::models::answer_model::{Envelope, UpstreamError};
use crate::models::audit_model::{NewOutcome, RequestHandle};
use crate::models::operation_model::OperationId;
use crate::models::params_model::audit_payload;
use crate::services::audit_service::AuditStore;
use crate::services::upstream_client::{UpstreamCall, UpstreamClient};

pub const CODE_VALIDATION_ERROR: &str = "validation_error";
pub const CODE_INTERNAL_ERROR: &str = "internal_error";
pub const CODE_AUDIT_ERROR: &str = "audit_error";

/// Fallos propios del pipeline. Los errores del proveedor NO llegan aquí:
/// se auditan y se devuelven como `Dispatched` con status 400.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No se pudo escribir el Request Record; el proveedor no fue llamado.
    #[error("failed to record request for {operation}: {source:#}")]
    RequestAudit {
        operation: OperationId,
        #[source]
        source: anyhow::Error,
    },
    /// El proveedor ya respondió pero no se pudo escribir el Outcome Record.
    #[error("failed to record outcome of request {request_id}: {source:#}")]
    OutcomeAudit {
        request_id: String,
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    pub fn envelope(&self) -> Envelope {
        let description = match self {
            DispatchError::RequestAudit { .. } => "Request could not be recorded; upstream not called",
            DispatchError::OutcomeAudit { .. } => "Upstream call completed but its outcome could not be recorded",
        };
        Envelope {
            code: CODE_AUDIT_ERROR.to_string(),
            description: description.to_string(),
            result: None,
        }
    }
}

/// Resultado de un despacho completo (ambos registros escritos).
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub request_id: String,
    pub status: StatusCode,
    pub envelope: Envelope,
}

/// Status para una respuesta exitosa del proveedor según su `code`.
pub fn status_for_answer_code(code: &str) -> StatusCode {
    match code {
        CODE_VALIDATION_ERROR => StatusCode::BAD_REQUEST,
        CODE_INTERNAL_ERROR => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::OK,
    }
}

/// Un fallo tipado del proveedor siempre es 400, sea cual sea su código.
pub fn status_for_upstream_error(_err: &UpstreamError) -> StatusCode {
    StatusCode::BAD_REQUEST
}

#[derive(Clone)]
pub struct DispatchService {
    audit: Arc<dyn AuditStore>,
    upstream: Arc<dyn UpstreamClient>,
}

impl DispatchService {
    pub fn new(audit: Arc<dyn AuditStore>, upstream: Arc<dyn UpstreamClient>) -> Self {
        Self { audit, upstream }
    }

    /// Ejecuta `operation` con `params` ya validados (o `None` si la
    /// operación no tiene esquema).
    pub async fn dispatch(
        &self,
        operation: OperationId,
        params: Option<Value>,
    ) -> Result<Dispatched, DispatchError> {
        let spec = operation_registry::lookup(operation);

        // 1) payload canónico para auditoría
        let payload = audit_payload(params.as_ref()).map_err(|e| DispatchError::RequestAudit {
            operation,
            source: anyhow::Error::new(e).context("No se pudo serializar el payload"),
        })?;

        // 2) Request Record, antes de tocar al proveedor
        let request = self
            .audit
            .create_request(operation, payload.as_deref())
            .await
            .map_err(|source| {
                log::error!("(dispatch) No se pudo auditar petición {}: {:?}", operation, source);
                DispatchError::RequestAudit { operation, source }
            })?;

        log::info!(
            "(dispatch) {} -> {} (request_id={})",
            operation,
            spec.upstream,
            request.id
        );

        // 3) una sola llamada al proveedor
        let call = UpstreamCall {
            operation: spec.upstream,
            verb: spec.verb,
            params: params.as_ref(),
        };

        // 4) / 5) Outcome Record y status
        match self.upstream.invoke(call).await {
            Ok(answer) => {
                self.record_outcome(
                    &request,
                    NewOutcome {
                        code: &answer.code,
                        description: &answer.description,
                        result: Some(&answer.result),
                        is_failure: false,
                    },
                )
                .await?;

                let status = status_for_answer_code(&answer.code);
                log::info!(
                    "(dispatch) {} respondió code={} status={} (request_id={})",
                    operation,
                    answer.code,
                    status.as_u16(),
                    request.id
                );
                Ok(Dispatched {
                    request_id: request.id,
                    status,
                    envelope: Envelope::from(answer),
                })
            }
            Err(err) => {
                self.record_outcome(
                    &request,
                    NewOutcome {
                        code: &err.code,
                        description: &err.description,
                        result: None,
                        is_failure: true,
                    },
                )
                .await?;

                let status = status_for_upstream_error(&err);
                log::warn!(
                    "(dispatch) {} falló en el proveedor: {} (request_id={})",
                    operation,
                    err,
                    request.id
                );
                Ok(Dispatched {
                    request_id: request.id,
                    status,
                    envelope: Envelope::from(err),
                })
            }
        }
    }

    async fn record_outcome(
        &self,
        request: &RequestHandle,
        outcome: NewOutcome<'_>,
    ) -> Result<(), DispatchError> {
        self.audit
            .create_outcome(request, outcome)
            .await
            .map_err(|source| {
                log::error!(
                    "(dispatch) Resultado de {} (request_id={}) sin auditar: {:?}",
                    request.operation,
                    request.id,
                    source
                );
                DispatchError::OutcomeAudit {
                    request_id: request.id.clone(),
                    source,
                }
            })
    }
}
