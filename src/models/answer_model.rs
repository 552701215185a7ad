//! models/answer_model.rs
//! Respuestas del proveedor (Answer / UpstreamError) y el sobre uniforme
//! que devolvemos al cliente HTTP.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Respuesta exitosa del proveedor. `code` se trata como opaco.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub code: String,
    pub description: String,
    pub result: Value,
}

impl Answer {
    pub fn new(code: impl Into<String>, description: impl Into<String>, result: Value) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            result,
        }
    }
}

/// Fallo tipado reportado por el proveedor (o por el transporte hacia él).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("upstream error {code}: {description}")]
pub struct UpstreamError {
    pub code: String,
    pub description: String,
}

impl UpstreamError {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
        }
    }
}

/// Sobre `{code, description, result?}`. `result` sólo existe en el camino
/// exitoso; en fallos se omite del JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub code: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl From<Answer> for Envelope {
    fn from(answer: Answer) -> Self {
        Envelope {
            code: answer.code,
            description: answer.description,
            result: Some(answer.result),
        }
    }
}

impl From<UpstreamError> for Envelope {
    fn from(err: UpstreamError) -> Self {
        Envelope {
            code: err.code,
            description: err.description,
            result: None,
        }
    }
}
