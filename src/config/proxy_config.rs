//! config/proxy_config.rs
//! Configuración del proxy, leída de variables de entorno (.env vía dotenv).

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

/// Credenciales y destino del proveedor de email.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub login: String,
    pub password: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub bind_host: String,
    pub bind_port: u16,
    pub workers: usize,
    pub database_path: PathBuf,
    /// Vacío => autenticación desactivada
    pub api_tokens: Vec<String>,
    pub upstream: UpstreamConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        ProxyConfig {
            bind_host: "0.0.0.0".to_string(),
            bind_port: 5022,
            workers: 1,
            database_path: PathBuf::from("data").join("audit.db"),
            api_tokens: Vec::new(),
            upstream: UpstreamConfig {
                base_url: "https://integrationapi.net/email/v1".to_string(),
                login: String::new(),
                password: String::new(),
                timeout_secs: 30,
            },
        }
    }
}

impl ProxyConfig {
    /// Lee la config del entorno; lo que falte toma el valor por defecto,
    /// salvo las credenciales del proveedor, que son obligatorias.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ProxyConfig::default();

        let bind_port = match lookup("BIND_PORT") {
            Some(v) => v.parse().context("BIND_PORT inválido")?,
            None => defaults.bind_port,
        };
        let workers = match lookup("HTTP_WORKERS") {
            Some(v) => v.parse().context("HTTP_WORKERS inválido")?,
            None => defaults.workers,
        };
        let timeout_secs = match lookup("UPSTREAM_TIMEOUT_SECS") {
            Some(v) => v.parse().context("UPSTREAM_TIMEOUT_SECS inválido")?,
            None => defaults.upstream.timeout_secs,
        };

        let login = lookup("UPSTREAM_LOGIN").ok_or_else(|| anyhow!("Falta UPSTREAM_LOGIN"))?;
        let password =
            lookup("UPSTREAM_PASSWORD").ok_or_else(|| anyhow!("Falta UPSTREAM_PASSWORD"))?;

        let api_tokens = lookup("API_TOKENS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(ProxyConfig {
            bind_host: lookup("BIND_HOST").unwrap_or(defaults.bind_host),
            bind_port,
            workers,
            database_path: lookup("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            api_tokens,
            upstream: UpstreamConfig {
                base_url: lookup("UPSTREAM_BASE_URL").unwrap_or(defaults.upstream.base_url),
                login,
                password,
                timeout_secs,
            },
        })
    }

    pub fn auth_enabled(&self) -> bool {
        !self.api_tokens.is_empty()
    }
}
