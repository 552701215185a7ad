//! models/audit_model.rs
//! Registros de auditoría (petición + resultado) y vistas para listarlos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::operation_model::OperationId;

/// Identidad de un Request Record ya persistido.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHandle {
    pub id: String,
    pub operation: OperationId,
}

/// Datos para crear el Outcome Record de una petición.
#[derive(Debug, Clone)]
pub struct NewOutcome<'a> {
    pub code: &'a str,
    pub description: &'a str,
    pub result: Option<&'a Value>,
    pub is_failure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub id: String,
    pub request_id: String,
    pub code: String,
    pub description: String,
    pub result: Option<Value>,
    pub is_failure: bool,
    pub created_at: DateTime<Utc>,
}

/// Una petición con su resultado (si llegó a escribirse).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub operation: OperationId,
    /// JSON tal cual se guardó; `None` para operaciones sin parámetros
    pub payload: Option<String>,
    pub created_at: DateTime<Utc>,
    pub outcome: Option<OutcomeRecord>,
}

/// Para listar auditoría con paginación
#[derive(Debug, Clone, Serialize)]
pub struct ListAuditResponse {
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub items: Vec<AuditEntry>,
}
