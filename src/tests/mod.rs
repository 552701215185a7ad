//! tests/mod.rs
//! Pruebas unitarias y de integración HTTP.

mod dispatch_tests;
mod support;
