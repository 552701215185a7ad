//! tests/dispatch_tests.rs
//! Pruebas del pipeline: auditoría antes/después y mapeo de status.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_rt::test;
    use actix_web::http::StatusCode;
    use serde_json::{json, Value};

    use crate::config::operation_registry::{self, REGISTRY};
    use crate::models::answer_model::{Answer, UpstreamError};
    use crate::models::operation_model::OperationId;
    use crate::services::audit_service::AuditService;
    use crate::services::dispatch_service::{DispatchError, DispatchService};
    use crate::tests::support::{
        add_task_input, answer_internal_error, answer_success, answer_validation_error,
        memory_audit_service, sample_input, upstream_error, FlakyAudit, StubUpstream,
    };

    fn validated(operation: OperationId, input: Value) -> Option<Value> {
        operation_registry::lookup(operation)
            .schema
            .map(|schema| schema(input).expect("sample input should validate"))
    }

    async fn service_with(upstream: Arc<StubUpstream>) -> (AuditService, DispatchService) {
        let audit = memory_audit_service().await;
        let dispatch = DispatchService::new(Arc::new(audit.clone()), upstream);
        (audit, dispatch)
    }

    #[test]
    async fn test_every_operation_writes_one_request_and_one_outcome() {
        for spec in REGISTRY.iter() {
            let upstream = StubUpstream::answering(answer_success());
            let (audit, dispatch) = service_with(upstream.clone()).await;

            let params = validated(spec.id, sample_input(spec.id));
            let dispatched = dispatch
                .dispatch(spec.id, params.clone())
                .await
                .expect("dispatch should succeed");

            assert_eq!(dispatched.status, StatusCode::OK, "{}", spec.id);

            let list = audit.list_entries(1, 100).await.unwrap();
            assert_eq!(list.total, 1, "{}", spec.id);
            let entry = &list.items[0];
            assert_eq!(entry.id, dispatched.request_id);
            assert_eq!(entry.operation, spec.id);

            let outcome = entry.outcome.as_ref().expect("outcome must exist");
            assert_eq!(outcome.request_id, entry.id);
            assert!(!outcome.is_failure);

            let calls = upstream.calls();
            assert_eq!(calls.len(), 1, "{}", spec.id);
            assert_eq!(calls[0].operation, spec.upstream);
            assert_eq!(calls[0].params, params);
        }
    }

    #[test]
    async fn test_success_codes_map_to_status() {
        let cases = [
            (answer_success(), StatusCode::OK),
            (answer_validation_error(), StatusCode::BAD_REQUEST),
            (answer_internal_error(), StatusCode::INTERNAL_SERVER_ERROR),
            (Answer::new("queued", "something else", json!(null)), StatusCode::OK),
        ];

        for (answer, expected) in cases {
            let code = answer.code.clone();
            let (audit, dispatch) = service_with(StubUpstream::answering(answer)).await;

            let dispatched = dispatch
                .dispatch(OperationId::GetSenderAddresses, None)
                .await
                .unwrap();

            assert_eq!(dispatched.status, expected, "code {}", code);
            assert_eq!(dispatched.envelope.code, code);

            let entry = audit.list_entries(1, 10).await.unwrap().items.remove(0);
            let outcome = entry.outcome.unwrap();
            assert!(!outcome.is_failure, "code {} is still the success path", code);
            assert_eq!(outcome.code, code);
        }
    }

    #[test]
    async fn test_upstream_error_is_always_bad_request() {
        for code in ["400", "500", "internal_error", "ok"] {
            let upstream = StubUpstream::failing(UpstreamError::new(code, "boom"));
            let (audit, dispatch) = service_with(upstream).await;

            let dispatched = dispatch
                .dispatch(OperationId::GetSenderAddresses, None)
                .await
                .unwrap();

            assert_eq!(dispatched.status, StatusCode::BAD_REQUEST, "code {}", code);

            let entry = audit.list_entries(1, 10).await.unwrap().items.remove(0);
            let outcome = entry.outcome.unwrap();
            assert!(outcome.is_failure);
            assert_eq!(outcome.code, code);
            assert_eq!(outcome.description, "boom");
            assert_eq!(outcome.result, None);
        }
    }

    #[test]
    async fn test_add_task_success_scenario() {
        let upstream = StubUpstream::answering(answer_success());
        let (audit, dispatch) = service_with(upstream).await;

        let params = validated(OperationId::AddTask, add_task_input());
        let dispatched = dispatch
            .dispatch(OperationId::AddTask, params)
            .await
            .unwrap();

        assert_eq!(dispatched.status, StatusCode::OK);
        assert_eq!(
            serde_json::to_value(&dispatched.envelope).unwrap(),
            json!({ "code": "ok", "description": "ok", "result": [] })
        );

        let entry = audit.list_entries(1, 10).await.unwrap().items.remove(0);
        assert_eq!(entry.operation.as_str(), "add_task");

        // lo enviado + los valores por defecto materializados
        let mut expected = add_task_input();
        expected["contact_list"] = Value::Null;
        let stored: Value = serde_json::from_str(entry.payload.as_deref().unwrap()).unwrap();
        assert_eq!(stored, expected);
        assert!(!entry.outcome.unwrap().is_failure);
    }

    #[test]
    async fn test_add_task_upstream_error_scenario() {
        let (audit, dispatch) = service_with(StubUpstream::failing(upstream_error())).await;

        let params = validated(OperationId::AddTask, add_task_input());
        let dispatched = dispatch
            .dispatch(OperationId::AddTask, params)
            .await
            .unwrap();

        assert_eq!(dispatched.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            serde_json::to_value(&dispatched.envelope).unwrap(),
            json!({ "code": "400", "description": "error" })
        );

        let entry = audit.list_entries(1, 10).await.unwrap().items.remove(0);
        assert!(entry.outcome.unwrap().is_failure);
    }

    #[test]
    async fn test_parameterless_operation_stores_null_payload() {
        let upstream = StubUpstream::answering(answer_success());
        let (audit, dispatch) = service_with(upstream.clone()).await;

        dispatch
            .dispatch(OperationId::GetSenderAddresses, None)
            .await
            .unwrap();

        let entry = audit.list_entries(1, 10).await.unwrap().items.remove(0);
        assert_eq!(entry.payload, None);
        assert_eq!(upstream.calls()[0].params, None);
    }

    #[test]
    async fn test_empty_schema_payload_is_not_null() {
        // get_tasks sin campos: se materializan los defaults, no queda NULL
        let (audit, dispatch) = service_with(StubUpstream::answering(answer_success())).await;

        let params = validated(OperationId::GetTasks, json!({}));
        dispatch.dispatch(OperationId::GetTasks, params).await.unwrap();

        let entry = audit.list_entries(1, 10).await.unwrap().items.remove(0);
        assert_eq!(
            entry.payload.as_deref(),
            Some(r#"{"range_end":100,"range_start":1}"#)
        );
    }

    #[test]
    async fn test_request_audit_failure_skips_upstream() {
        let upstream = StubUpstream::answering(answer_success());
        let flaky = FlakyAudit {
            inner: memory_audit_service().await,
            fail_request: true,
            fail_outcome: false,
        };
        let inner = flaky.inner.clone();
        let dispatch = DispatchService::new(Arc::new(flaky), upstream.clone());

        let params = validated(OperationId::SendMessage, sample_input(OperationId::SendMessage));
        let err = dispatch
            .dispatch(OperationId::SendMessage, params)
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::RequestAudit { operation: OperationId::SendMessage, .. }));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.envelope().code, "audit_error");
        assert!(upstream.calls().is_empty(), "upstream must not be called");
        assert_eq!(inner.list_entries(1, 10).await.unwrap().total, 0);
    }

    #[test]
    async fn test_outcome_audit_failure_is_internal_error() {
        let upstream = StubUpstream::answering(answer_success());
        let flaky = FlakyAudit {
            inner: memory_audit_service().await,
            fail_request: false,
            fail_outcome: true,
        };
        let inner = flaky.inner.clone();
        let dispatch = DispatchService::new(Arc::new(flaky), upstream.clone());

        let err = dispatch
            .dispatch(OperationId::GetSenderAddresses, None)
            .await
            .unwrap_err();

        let DispatchError::OutcomeAudit { request_id, .. } = &err else {
            panic!("expected OutcomeAudit, got {err:?}");
        };
        assert_eq!(upstream.calls().len(), 1);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        // la petición quedó registrada, el resultado no
        let entry = inner.get_entry(request_id).await.unwrap().unwrap();
        assert!(entry.outcome.is_none());
    }

    #[test]
    async fn test_outcome_audit_failure_on_upstream_error_is_internal_error() {
        let flaky = FlakyAudit {
            inner: memory_audit_service().await,
            fail_request: false,
            fail_outcome: true,
        };
        let dispatch = DispatchService::new(Arc::new(flaky), StubUpstream::failing(upstream_error()));

        let err = dispatch
            .dispatch(OperationId::GetSenderAddresses, None)
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::OutcomeAudit { .. }));
    }

    #[test]
    async fn test_repeated_dispatch_creates_independent_records() {
        let (audit, dispatch) = service_with(StubUpstream::answering(answer_success())).await;

        let first = dispatch
            .dispatch(OperationId::GetSenderAddresses, None)
            .await
            .unwrap();
        let second = dispatch
            .dispatch(OperationId::GetSenderAddresses, None)
            .await
            .unwrap();

        assert_ne!(first.request_id, second.request_id);
        let list = audit.list_entries(1, 10).await.unwrap();
        assert_eq!(list.total, 2);
        assert!(list.items.iter().all(|e| e.outcome.is_some()));
    }
}
