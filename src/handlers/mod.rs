//! handlers/mod.rs
//! Módulo que agrupa los handlers HTTP (operaciones del proveedor, auditoría).

pub mod api_handler;
pub mod audit_handler;
pub mod auth_guard;
