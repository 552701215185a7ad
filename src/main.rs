use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::config::proxy_config::ProxyConfig;
use crate::logger::init_logger;
use crate::services::audit_service::AuditService;
use crate::services::dispatch_service::DispatchService;
use crate::services::upstream_client::HttpUpstreamClient;

mod app;
mod config;
mod handlers;
mod logger;
mod models;
mod services;
#[cfg(test)]
mod tests;

async fn setup_database(config: &ProxyConfig) -> Result<Pool<Sqlite>> {
    // 1) Crear carpeta de la base si hace falta
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("No se pudo crear directorio {:?}", parent))?;
    }

    log::info!("Conectando a SQLite en {:?}", config.database_path);

    // 2) Conectarnos con SQLx
    let options = SqliteConnectOptions::new()
        .filename(&config.database_path)
        .create_if_missing(true);
    let db_pool = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .context("No se pudo conectar a la base de datos SQLite")?;

    Ok(db_pool)
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv().ok(); // Cargar .env al inicio
    init_logger();

    let config = ProxyConfig::from_env().context("Configuración inválida")?;
    if !config.auth_enabled() {
        log::warn!("API_TOKENS vacío: la autenticación está desactivada");
    }

    let db_pool = setup_database(&config).await?;

    // AuditService
    let audit_service = AuditService::new(db_pool.clone());
    audit_service.run_migrations().await?;

    // Cliente del proveedor + pipeline
    let upstream = HttpUpstreamClient::new(&config.upstream)?;
    let dispatch_service = DispatchService::new(
        Arc::new(audit_service.clone()),
        Arc::new(upstream),
    );

    // Levantar servidor
    let bind = (config.bind_host.clone(), config.bind_port);
    let workers = config.workers.max(1);
    log::info!("Levantando servidor en {}:{}", bind.0, bind.1);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(audit_service.clone()))
            .app_data(web::Data::new(dispatch_service.clone()))
            .configure(app::init_app)
    })
    .workers(workers)
    .bind(bind)?
    .run()
    .await?;

    Ok(())
}
