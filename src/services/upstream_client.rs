//! services/upstream_client.rs
//! Cliente hacia el proveedor de email. El pipeline sólo conoce el trait;
//! `HttpUpstreamClient` es el adaptador HTTP genérico que usa el binario.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::config::proxy_config::UpstreamConfig;
use crate::models::answer_model::{Answer, UpstreamError};
use crate::models::operation_model::HttpVerb;

pub const TRANSPORT_ERROR: &str = "transport_error";
pub const INVALID_RESPONSE: &str = "invalid_response";

/// Una llamada concreta: operación del proveedor + parámetros ya validados.
#[derive(Debug, Clone, Copy)]
pub struct UpstreamCall<'a> {
    pub operation: &'static str,
    pub verb: HttpVerb,
    pub params: Option<&'a Value>,
}

#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn invoke(&self, call: UpstreamCall<'_>) -> Result<Answer, UpstreamError>;
}

#[derive(Clone, Debug)]
pub struct HttpUpstreamClient {
    http_client: Client,
    base_url: String,
    login: String,
    password: String,
}

impl HttpUpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("No se pudo construir el cliente HTTP del proveedor")?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            login: config.login.clone(),
            password: config.password.clone(),
        })
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstreamClient {
    async fn invoke(&self, call: UpstreamCall<'_>) -> Result<Answer, UpstreamError> {
        let url = format!("{}/{}", self.base_url, call.operation);

        let builder = match call.verb {
            HttpVerb::Get => self.http_client.get(&url),
            HttpVerb::Post => self.http_client.post(&url),
            HttpVerb::Put => self.http_client.put(&url),
            HttpVerb::Delete => self.http_client.delete(&url),
        }
        .basic_auth(&self.login, Some(&self.password));

        // GET/DELETE viajan en query string, POST/PUT como JSON
        let builder = match (call.verb, call.params) {
            (_, None) => builder,
            (HttpVerb::Get | HttpVerb::Delete, Some(params)) => builder.query(&query_pairs(params)),
            (HttpVerb::Post | HttpVerb::Put, Some(params)) => builder.json(params),
        };

        let response = builder.send().await.map_err(|e| {
            log::warn!("Fallo de transporte hacia {}: {}", url, e);
            UpstreamError::new(TRANSPORT_ERROR, e.to_string())
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::new(TRANSPORT_ERROR, e.to_string()))?;

        parse_response(status, &body)
    }
}

/// Forma del JSON del proveedor: `{"Code", "Description", "Result"}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawAnswer {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Value,
}

/// El código puede llegar como texto o como número.
fn code_text(code: &Value) -> String {
    match code {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn parse_response(status: StatusCode, body: &[u8]) -> Result<Answer, UpstreamError> {
    let parsed = serde_json::from_slice::<RawAnswer>(body);

    if status.is_success() {
        let raw = parsed.map_err(|e| {
            UpstreamError::new(INVALID_RESPONSE, format!("Respuesta no válida del proveedor: {e}"))
        })?;
        return Ok(Answer::new(
            raw.code.as_ref().map(code_text).unwrap_or_else(|| "ok".to_string()),
            raw.description.unwrap_or_default(),
            raw.result,
        ));
    }

    match parsed {
        Ok(raw) => Err(UpstreamError {
            code: raw
                .code
                .as_ref()
                .map(code_text)
                .unwrap_or_else(|| status.as_u16().to_string()),
            description: raw
                .description
                .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string()),
        }),
        Err(_) => Err(UpstreamError::new(
            status.as_u16().to_string(),
            String::from_utf8_lossy(body).into_owned(),
        )),
    }
}

/// Aplana un objeto JSON a pares de query string. Los `null` se omiten
/// y las listas se repiten por clave.
pub fn query_pairs(params: &Value) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    if let Value::Object(map) = params {
        for (key, value) in map {
            match value {
                Value::Null => {}
                Value::Array(items) => {
                    for item in items {
                        pairs.push((key.clone(), scalar_text(item)));
                    }
                }
                other => pairs.push((key.clone(), scalar_text(other))),
            }
        }
    }
    pairs
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
