//! models/mod.rs
//! Módulo raíz para modelos/estructuras compartidas.

pub mod answer_model;
pub mod audit_model;
pub mod operation_model;
pub mod params_model;
