//! services/audit_service.rs
//! Registro append-only de peticiones al proveedor y sus resultados.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite};
use uuid::Uuid;

use crate::models::audit_model::{
    AuditEntry, ListAuditResponse, NewOutcome, OutcomeRecord, RequestHandle,
};
use crate::models::operation_model::OperationId;

/// Lo que el pipeline necesita del almacén de auditoría.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Persiste el Request Record. Debe quedar escrito antes de llamar al proveedor.
    async fn create_request(
        &self,
        operation: OperationId,
        payload: Option<&str>,
    ) -> Result<RequestHandle>;

    /// Persiste el Outcome Record ligado a `request` (1:1).
    async fn create_outcome(&self, request: &RequestHandle, outcome: NewOutcome<'_>) -> Result<()>;
}

#[derive(Clone, Debug)]
pub struct AuditService {
    db_pool: Pool<Sqlite>,
}

impl AuditService {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        AuditService { db_pool }
    }

    /// Corre migraciones con sqlx
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db_pool)
            .await
            .context("Fallo en migraciones de auditoría")?;
        Ok(())
    }

    /// Obtiene una petición con su resultado
    pub async fn get_entry(&self, request_id: &str) -> Result<Option<AuditEntry>> {
        let row = sqlx::query(&format!("{SELECT_ENTRIES} WHERE r.id = ?1"))
            .bind(request_id)
            .fetch_optional(&self.db_pool)
            .await
            .context("Fallo al consultar auditoría")?;

        row.map(|r| entry_from_row(&r)).transpose()
    }

    /// Lista auditoría con paginación, más reciente primero
    pub async fn list_entries(&self, page: u64, page_size: u64) -> Result<ListAuditResponse> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, 500);
        // páginas fuera de rango dan una lista vacía, no un desbordamiento
        let offset = (page - 1)
            .checked_mul(page_size)
            .and_then(|o| i64::try_from(o).ok())
            .unwrap_or(i64::MAX);

        // total
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM upstream_requests")
            .fetch_one(&self.db_pool)
            .await
            .context("Fallo al contar auditoría")?;

        // items
        let rows = sqlx::query(&format!(
            "{SELECT_ENTRIES} ORDER BY r.created_at DESC, r.rowid DESC LIMIT ?1 OFFSET ?2"
        ))
        .bind(page_size as i64)
        .bind(offset)
        .fetch_all(&self.db_pool)
        .await
        .context("Fallo al listar auditoría")?;

        let items = rows
            .iter()
            .map(entry_from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(ListAuditResponse {
            total: total as u64,
            page,
            page_size,
            items,
        })
    }
}

#[async_trait]
impl AuditStore for AuditService {
    async fn create_request(
        &self,
        operation: OperationId,
        payload: Option<&str>,
    ) -> Result<RequestHandle> {
        let request_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO upstream_requests (id, operation, payload, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&request_id)
        .bind(operation.as_str())
        .bind(payload)
        .bind(&now)
        .execute(&self.db_pool)
        .await
        .context("Fallo al insertar upstream_request")?;

        Ok(RequestHandle {
            id: request_id,
            operation,
        })
    }

    async fn create_outcome(&self, request: &RequestHandle, outcome: NewOutcome<'_>) -> Result<()> {
        let outcome_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let result_json = outcome
            .result
            .map(serde_json::to_string)
            .transpose()
            .context("No se pudo serializar result")?;

        sqlx::query(
            r#"
            INSERT INTO upstream_outcomes (
                id, request_id, code, description, result, is_failure, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&outcome_id)
        .bind(&request.id)
        .bind(outcome.code)
        .bind(outcome.description)
        .bind(result_json)
        .bind(outcome.is_failure as i32)
        .bind(&now)
        .execute(&self.db_pool)
        .await
        .context("Fallo al insertar upstream_outcome")?;

        Ok(())
    }
}

const SELECT_ENTRIES: &str = r#"
    SELECT
        r.id AS request_id, r.operation, r.payload, r.created_at AS request_created_at,
        o.id AS outcome_id, o.code, o.description, o.result, o.is_failure,
        o.created_at AS outcome_created_at
    FROM upstream_requests r
    LEFT JOIN upstream_outcomes o ON o.request_id = r.id
"#;

// parsea strings a boolean, JSON e ISO8601
fn entry_from_row(row: &SqliteRow) -> Result<AuditEntry> {
    let request_id: String = row.try_get("request_id")?;
    let created_at: String = row.try_get("request_created_at")?;

    let outcome_id: Option<String> = row.try_get("outcome_id")?;
    let outcome = match outcome_id {
        Some(id) => {
            let result: Option<String> = row.try_get("result")?;
            let outcome_created_at: String = row.try_get("outcome_created_at")?;
            let is_failure: i64 = row.try_get("is_failure")?;
            Some(OutcomeRecord {
                id,
                request_id: request_id.clone(),
                code: row.try_get("code")?,
                description: row.try_get("description")?,
                result: result
                    .map(|r| serde_json::from_str(&r))
                    .transpose()
                    .context("result guardado no es JSON")?,
                is_failure: is_failure != 0,
                created_at: outcome_created_at.parse()?,
            })
        }
        None => None,
    };

    let operation: String = row.try_get("operation")?;

    Ok(AuditEntry {
        id: request_id,
        operation: operation.parse()?,
        payload: row.try_get("payload")?,
        created_at: created_at.parse()?,
        outcome,
    })
}
