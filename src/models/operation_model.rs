//! models/operation_model.rs
//! Identificadores cerrados de las operaciones expuestas por el proxy.

use std::fmt;
use std::str::FromStr;

use actix_web::http::Method;
use anyhow::anyhow;
use serde::{Deserialize, Serialize};

/// Las 16 operaciones soportadas. El texto (`as_str`) es a la vez el
/// segmento de URL bajo `/api/` y el valor guardado en auditoría.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationId {
    GetSenderAddresses,
    AddSenderAddress,
    DelSenderAddress,
    GetTasks,
    GetTask,
    AddTask,
    EditTask,
    EditTaskStatus,
    GetTemplate,
    AddTemplate,
    EditTemplate,
    DelTemplate,
    GetState,
    GetStateDetailing,
    SendMessage,
    GetStatusMessages,
}

impl OperationId {
    pub const ALL: [OperationId; 16] = [
        OperationId::GetSenderAddresses,
        OperationId::AddSenderAddress,
        OperationId::DelSenderAddress,
        OperationId::GetTasks,
        OperationId::GetTask,
        OperationId::AddTask,
        OperationId::EditTask,
        OperationId::EditTaskStatus,
        OperationId::GetTemplate,
        OperationId::AddTemplate,
        OperationId::EditTemplate,
        OperationId::DelTemplate,
        OperationId::GetState,
        OperationId::GetStateDetailing,
        OperationId::SendMessage,
        OperationId::GetStatusMessages,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationId::GetSenderAddresses => "get_sender_addresses",
            OperationId::AddSenderAddress => "add_sender_address",
            OperationId::DelSenderAddress => "del_sender_address",
            OperationId::GetTasks => "get_tasks",
            OperationId::GetTask => "get_task",
            OperationId::AddTask => "add_task",
            OperationId::EditTask => "edit_task",
            OperationId::EditTaskStatus => "edit_task_status",
            OperationId::GetTemplate => "get_template",
            OperationId::AddTemplate => "add_template",
            OperationId::EditTemplate => "edit_template",
            OperationId::DelTemplate => "del_template",
            OperationId::GetState => "get_state",
            OperationId::GetStateDetailing => "get_state_detailing",
            OperationId::SendMessage => "send_message",
            OperationId::GetStatusMessages => "get_status_messages",
        }
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationId::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| anyhow!("Operación desconocida: {}", s))
    }
}

/// Verbo HTTP permitido para una operación (exactamente uno por operación).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpVerb {
    pub fn to_method(self) -> Method {
        match self {
            HttpVerb::Get => Method::GET,
            HttpVerb::Post => Method::POST,
            HttpVerb::Put => Method::PUT,
            HttpVerb::Delete => Method::DELETE,
        }
    }

    /// GET lee del query string; el resto del cuerpo JSON.
    pub fn reads_query(self) -> bool {
        matches!(self, HttpVerb::Get)
    }
}
