//! config/mod.rs
//! Configuración del proceso y tabla de operaciones.

pub mod operation_registry;
pub mod proxy_config;
