//! services/mod.rs
//! Módulo que agrupa distintos "servicios" o "capas de negocio" de la app.

pub mod audit_service;
pub mod dispatch_service;
pub mod upstream_client;
