//! tests/support.rs
//! Dobles de prueba compartidos: base en memoria, proveedor y auditoría falsos.

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;

use crate::models::answer_model::{Answer, UpstreamError};
use crate::models::audit_model::{NewOutcome, RequestHandle};
use crate::models::operation_model::OperationId;
use crate::services::audit_service::{AuditService, AuditStore};
use crate::services::upstream_client::{UpstreamCall, UpstreamClient};

pub fn answer_success() -> Answer {
    Answer::new("ok", "ok", json!([]))
}

pub fn answer_validation_error() -> Answer {
    Answer::new("validation_error", "validation_error", json!([]))
}

pub fn answer_internal_error() -> Answer {
    Answer::new("internal_error", "internal_error", json!([]))
}

pub fn upstream_error() -> UpstreamError {
    UpstreamError::new("400", "error")
}

/// SQLite en memoria con una sola conexión que no se recicla
/// (cada conexión nueva sería otra base vacía).
pub async fn memory_audit_service() -> AuditService {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    let service = AuditService::new(pool);
    service
        .run_migrations()
        .await
        .expect("Failed to run migrations");
    service
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub operation: &'static str,
    pub params: Option<Value>,
}

/// Proveedor falso: siempre responde lo mismo y guarda cada llamada.
pub struct StubUpstream {
    response: Result<Answer, UpstreamError>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl StubUpstream {
    pub fn answering(answer: Answer) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(answer),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(error: UpstreamError) -> Arc<Self> {
        Arc::new(Self {
            response: Err(error),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpstreamClient for StubUpstream {
    async fn invoke(&self, call: UpstreamCall<'_>) -> Result<Answer, UpstreamError> {
        self.calls.lock().unwrap().push(RecordedCall {
            operation: call.operation,
            params: call.params.cloned(),
        });
        self.response.clone()
    }
}

/// Auditoría que falla a propósito en uno de los dos pasos.
pub struct FlakyAudit {
    pub inner: AuditService,
    pub fail_request: bool,
    pub fail_outcome: bool,
}

#[async_trait]
impl AuditStore for FlakyAudit {
    async fn create_request(
        &self,
        operation: OperationId,
        payload: Option<&str>,
    ) -> Result<RequestHandle> {
        if self.fail_request {
            return Err(anyhow!("disk I/O error"));
        }
        self.inner.create_request(operation, payload).await
    }

    async fn create_outcome(&self, request: &RequestHandle, outcome: NewOutcome<'_>) -> Result<()> {
        if self.fail_outcome {
            return Err(anyhow!("disk I/O error"));
        }
        self.inner.create_outcome(request, outcome).await
    }
}

/// Parámetros válidos de `add_task` tal como los mandaría un cliente.
pub fn add_task_input() -> Value {
    json!({
        "name": "test",
        "sender_email": "test@test.test",
        "sender_name": "test name",
        "subject": "test subj",
        "text": "test text",
        "type_task": 1,
        "start": "2017-08-01T00:00:00+00:00",
        "end": "2017-09-01T00:00:00+00:00",
        "user_id": "1234",
        "template_id": "1234",
        "duplicates": true
    })
}

/// Entrada mínima válida para cada operación (GET se expresa como JSON
/// aquí; los tests HTTP usan query string).
pub fn sample_input(operation: OperationId) -> Value {
    match operation {
        OperationId::GetSenderAddresses => json!({}),
        OperationId::AddSenderAddress | OperationId::DelSenderAddress => {
            json!({ "address": "test@test.text" })
        }
        OperationId::GetTasks => json!({ "range_start": 1, "range_end": 10 }),
        OperationId::GetTask => json!({ "id_task": 1 }),
        OperationId::AddTask => add_task_input(),
        OperationId::EditTask => {
            let mut input = add_task_input();
            input["id_task"] = json!(7);
            input
        }
        OperationId::EditTaskStatus => json!({ "id_task": 7, "task_state": "stopped" }),
        OperationId::GetTemplate | OperationId::DelTemplate => json!({ "id_template": 3 }),
        OperationId::AddTemplate => json!({ "name": "tpl", "text": "hello" }),
        OperationId::EditTemplate => json!({ "id_template": 3, "name": "tpl", "text": "hello" }),
        OperationId::GetState => json!({ "id_task": 7, "start": "2017-08-01" }),
        OperationId::GetStateDetailing => json!({ "id_task": 7, "state": "delivered" }),
        OperationId::SendMessage => json!({
            "sender_email": "from@test.test",
            "sender_name": "From",
            "recipient_email": "to@test.test",
            "recipient_name": "To",
            "subject": "subj",
            "text": "body"
        }),
        OperationId::GetStatusMessages => json!({ "id_messages": ["m1", "m2"] }),
    }
}
