//! End-to-end tests of the query facade against a scripted mock service.

use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::json;

use data_api_mapper::wire::{
    BeginTransactionRequest, BeginTransactionResponse, TransactionControlRequest,
    TransactionStatusResponse,
};
use data_api_mapper::{
    ConverterRegistry, DataService, Error, ParamBuilder, QueryService, Result, StatementRequest,
    StatementResponse, Value, WireColumn, WireValue,
};

/// Replays scripted statement responses and records every request.
#[derive(Default)]
struct MockService {
    statement_responses: Mutex<VecDeque<StatementResponse>>,
    statement_requests: Mutex<Vec<StatementRequest>>,
    begin_requests: Mutex<Vec<BeginTransactionRequest>>,
    commit_requests: Mutex<Vec<TransactionControlRequest>>,
    rollback_requests: Mutex<Vec<TransactionControlRequest>>,
}

impl MockService {
    fn scripted(responses: Vec<StatementResponse>) -> Self {
        Self {
            statement_responses: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    fn recorded_sql(&self) -> Vec<String> {
        self.statement_requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.sql.clone())
            .collect()
    }
}

#[async_trait]
impl DataService for MockService {
    async fn execute_statement(&self, request: StatementRequest) -> Result<StatementResponse> {
        self.statement_requests.lock().unwrap().push(request);
        self.statement_responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Remote("no scripted response left".to_string()))
    }

    async fn begin_transaction(
        &self,
        request: BeginTransactionRequest,
    ) -> Result<BeginTransactionResponse> {
        self.begin_requests.lock().unwrap().push(request);
        Ok(BeginTransactionResponse {
            transaction_id: "txn-123".to_string(),
        })
    }

    async fn commit_transaction(
        &self,
        request: TransactionControlRequest,
    ) -> Result<TransactionStatusResponse> {
        self.commit_requests.lock().unwrap().push(request);
        Ok(TransactionStatusResponse {
            transaction_status: "committed".to_string(),
        })
    }

    async fn rollback_transaction(
        &self,
        request: TransactionControlRequest,
    ) -> Result<TransactionStatusResponse> {
        self.rollback_requests.lock().unwrap().push(request);
        Ok(TransactionStatusResponse {
            transaction_status: "rolled back".to_string(),
        })
    }
}

fn column(name: &str, type_name: &str) -> WireColumn {
    WireColumn {
        name: name.to_string(),
        table_name: "items".to_string(),
        type_name: type_name.to_string(),
        nullable: 0,
    }
}

fn rows_response(columns: Vec<WireColumn>, records: Vec<Vec<WireValue>>) -> StatementResponse {
    StatementResponse {
        records: Some(records),
        column_metadata: Some(columns),
        number_of_records_updated: None,
    }
}

fn update_response(n: i64) -> StatementResponse {
    StatementResponse {
        number_of_records_updated: Some(n),
        ..StatementResponse::default()
    }
}

fn id_page(ids: std::ops::Range<i64>) -> StatementResponse {
    rows_response(
        vec![column("id", "int8")],
        ids.map(|i| vec![WireValue::long(i)]).collect(),
    )
}

fn service(mock: MockService) -> QueryService<MockService> {
    QueryService::new(mock, "creds", "target", "testdb")
}

#[tokio::test]
async fn query_decodes_rows_with_registry() {
    let mock = MockService::scripted(vec![rows_response(
        vec![
            column("id", "int8"),
            column("num", "numeric"),
            column("doc", "jsonb"),
        ],
        vec![vec![
            WireValue::long(1),
            WireValue::string("1.12345"),
            WireValue::string(r#"{"float_value": 1.11}"#),
        ]],
    )]);
    let svc = service(mock);

    let params = ParamBuilder::new().long("id", 1).build();
    let output = svc
        .query("select * from items where id = :id", params, &ConverterRegistry::graphql())
        .await
        .unwrap();
    let rows = output.rows().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("id"), Some(&Value::Long(1)));
    assert_eq!(rows[0].get("num"), Some(&Value::Double(1.12345)));
    assert_eq!(rows[0].get("doc"), Some(&Value::Json(json!({"float_value": 1.11}))));
}

#[tokio::test]
async fn query_falls_back_to_affected_count() {
    let svc = service(MockService::scripted(vec![update_response(3)]));
    let output = svc
        .query("delete from items", vec![], &ConverterRegistry::new())
        .await
        .unwrap();
    assert_eq!(output.affected(), Some(3));
}

#[tokio::test]
async fn execute_raw_returns_untouched_response() {
    let svc = service(MockService::scripted(vec![update_response(7)]));
    let response = svc.execute_raw("insert into items default values", vec![]).await.unwrap();
    assert_eq!(response.number_of_records_updated, Some(7));
    assert!(response.column_metadata.is_none());
}

#[tokio::test]
async fn pagination_stops_on_short_page_and_keeps_order() {
    // Five records with page size two: pages of 2, 2, 1.
    let svc = service(MockService::scripted(vec![
        id_page(0..2),
        id_page(2..4),
        id_page(4..5),
    ]));

    let rows = svc
        .query_paginated("select id from items", vec![], &ConverterRegistry::new(), 2)
        .await
        .unwrap();

    let ids: Vec<i64> = rows.iter().map(|r| r.get("id").unwrap().as_i64().unwrap()).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);

    let sql = svc_sql(&svc);
    assert_eq!(
        sql,
        vec![
            "select id from items LIMIT 2 OFFSET 0",
            "select id from items LIMIT 2 OFFSET 2",
            "select id from items LIMIT 2 OFFSET 4",
        ]
    );
}

#[tokio::test]
async fn pagination_confirms_exhaustion_after_full_final_page() {
    // Four records with page size two: the second full page triggers one
    // extra empty fetch.
    let svc = service(MockService::scripted(vec![
        id_page(0..2),
        id_page(2..4),
        id_page(4..4),
    ]));

    let rows = svc
        .query_paginated("select id from items", vec![], &ConverterRegistry::new(), 2)
        .await
        .unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(svc_sql(&svc).len(), 3);
}

#[tokio::test]
async fn pagination_rejects_update_counts() {
    let svc = service(MockService::scripted(vec![update_response(1)]));
    let err = svc
        .query_paginated("delete from items", vec![], &ConverterRegistry::new(), 2)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch(_)));
}

#[tokio::test]
async fn pagination_stops_at_first_failing_page() {
    // Only one scripted response: the second fetch fails remotely.
    let svc = service(MockService::scripted(vec![id_page(0..2)]));
    let err = svc
        .query_paginated("select id from items", vec![], &ConverterRegistry::new(), 2)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Remote(_)));
}

#[tokio::test]
async fn transaction_threads_id_into_statements() {
    let svc = service(MockService::scripted(vec![update_response(1), update_response(1)]));

    let txn = svc.begin().await.unwrap();
    assert_eq!(txn.id(), "txn-123");
    txn.execute("update items set a = 1", vec![]).await.unwrap();
    txn.execute("update items set b = 2", vec![]).await.unwrap();
    let status = txn.commit().await.unwrap();
    assert_eq!(status, "committed");

    let mock = svc_mock(&svc);
    let requests = mock.statement_requests.lock().unwrap();
    assert!(requests.iter().all(|r| r.transaction_id.as_deref() == Some("txn-123")));
    let commits = mock.commit_requests.lock().unwrap();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].transaction_id, "txn-123");
    assert!(mock.rollback_requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn rollback_uses_captured_id_once() {
    let svc = service(MockService::default());
    let txn = svc.begin().await.unwrap();
    let status = txn.rollback().await.unwrap();
    assert_eq!(status, "rolled back");

    let mock = svc_mock(&svc);
    assert_eq!(mock.rollback_requests.lock().unwrap().len(), 1);
    assert!(mock.commit_requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn statements_outside_transactions_carry_no_id() {
    let svc = service(MockService::scripted(vec![update_response(0)]));
    svc.execute("select 1", vec![]).await.unwrap();

    let mock = svc_mock(&svc);
    let requests = mock.statement_requests.lock().unwrap();
    assert_eq!(requests[0].transaction_id, None);
    assert_eq!(requests[0].credentials_ref, "creds");
    assert_eq!(requests[0].target_ref, "target");
    assert_eq!(requests[0].database, "testdb");
    assert!(requests[0].include_metadata);
}

#[tokio::test]
async fn decimal_round_trips_through_encode_and_native_decode() {
    let original = Decimal::from_str("1.12345").unwrap();
    let params = ParamBuilder::new().decimal("num", original).build();
    // The wire payload a DECIMAL-hinted parameter carries is exactly what
    // the service echoes back for a numeric column.
    let echoed = params[0].value.clone();

    let svc = service(MockService::scripted(vec![rows_response(
        vec![column("num", "numeric")],
        vec![vec![echoed]],
    )]));
    let rows = svc
        .query("select num from items", params, &ConverterRegistry::native())
        .await
        .unwrap()
        .rows()
        .unwrap();
    assert_eq!(rows[0].get("num"), Some(&Value::Decimal(original)));
}

// The facade borrows its service; these helpers reach back into the mock.
fn svc_mock(svc: &QueryService<MockService>) -> &MockService {
    svc.service_ref()
}

fn svc_sql(svc: &QueryService<MockService>) -> Vec<String> {
    svc_mock(svc).recorded_sql()
}
