//! config/operation_registry.rs
//! Tabla fija de operaciones: esquema de parámetros, operación del proveedor
//! y verbo HTTP permitido. Rutas y dispatch se construyen a partir de aquí.

use serde_json::Value;

use crate::models::operation_model::{HttpVerb, OperationId};
use crate::models::params_model::{self as params, validate_params, ValidationError};

/// Valida/coacciona la entrada cruda y devuelve el JSON canónico.
pub type SchemaFn = fn(Value) -> Result<Value, ValidationError>;

#[derive(Debug, Clone, Copy)]
pub struct OperationSpec {
    pub id: OperationId,
    pub verb: HttpVerb,
    /// Nombre de la operación en el cliente del proveedor
    pub upstream: &'static str,
    /// `None` => la operación no acepta parámetros
    pub schema: Option<SchemaFn>,
}

impl OperationSpec {
    pub fn path(&self) -> String {
        format!("/{}/", self.id.as_str())
    }
}

pub static REGISTRY: [OperationSpec; 16] = [
    OperationSpec {
        id: OperationId::GetSenderAddresses,
        verb: HttpVerb::Get,
        upstream: "get_sender_addresses",
        schema: None,
    },
    OperationSpec {
        id: OperationId::AddSenderAddress,
        verb: HttpVerb::Post,
        upstream: "add_sender_address",
        schema: Some(validate_params::<params::SenderAddress>),
    },
    OperationSpec {
        id: OperationId::DelSenderAddress,
        verb: HttpVerb::Delete,
        upstream: "del_sender_address",
        schema: Some(validate_params::<params::SenderAddress>),
    },
    OperationSpec {
        id: OperationId::GetTasks,
        verb: HttpVerb::Get,
        upstream: "get_tasks",
        schema: Some(validate_params::<params::GetTasks>),
    },
    OperationSpec {
        id: OperationId::GetTask,
        verb: HttpVerb::Get,
        upstream: "get_task",
        schema: Some(validate_params::<params::GetTask>),
    },
    OperationSpec {
        id: OperationId::AddTask,
        verb: HttpVerb::Post,
        upstream: "add_task",
        schema: Some(validate_params::<params::AddTask>),
    },
    OperationSpec {
        id: OperationId::EditTask,
        verb: HttpVerb::Put,
        upstream: "edit_task",
        schema: Some(validate_params::<params::EditTask>),
    },
    OperationSpec {
        id: OperationId::EditTaskStatus,
        verb: HttpVerb::Put,
        upstream: "edit_task_status",
        schema: Some(validate_params::<params::EditTaskStatus>),
    },
    OperationSpec {
        id: OperationId::GetTemplate,
        verb: HttpVerb::Get,
        upstream: "get_template",
        schema: Some(validate_params::<params::GetTemplate>),
    },
    OperationSpec {
        id: OperationId::AddTemplate,
        verb: HttpVerb::Post,
        upstream: "add_template",
        schema: Some(validate_params::<params::AddTemplate>),
    },
    OperationSpec {
        id: OperationId::EditTemplate,
        verb: HttpVerb::Put,
        upstream: "edit_template",
        schema: Some(validate_params::<params::EditTemplate>),
    },
    OperationSpec {
        id: OperationId::DelTemplate,
        verb: HttpVerb::Delete,
        upstream: "del_template",
        schema: Some(validate_params::<params::DelTemplate>),
    },
    OperationSpec {
        id: OperationId::GetState,
        verb: HttpVerb::Get,
        upstream: "get_state",
        schema: Some(validate_params::<params::GetState>),
    },
    OperationSpec {
        id: OperationId::GetStateDetailing,
        verb: HttpVerb::Get,
        upstream: "get_state_detailing",
        schema: Some(validate_params::<params::GetStateDetailing>),
    },
    OperationSpec {
        id: OperationId::SendMessage,
        verb: HttpVerb::Post,
        upstream: "send_transactional_message",
        schema: Some(validate_params::<params::SendMessage>),
    },
    OperationSpec {
        id: OperationId::GetStatusMessages,
        verb: HttpVerb::Get,
        upstream: "get_status_transactional_message",
        schema: Some(validate_params::<params::GetStatusMessages>),
    },
];

/// Busca la entrada de una operación. La tabla cubre todo `OperationId`.
pub fn lookup(id: OperationId) -> &'static OperationSpec {
    REGISTRY
        .iter()
        .find(|spec| spec.id == id)
        .unwrap_or_else(|| unreachable!("operación {} sin entrada en REGISTRY", id))
}
