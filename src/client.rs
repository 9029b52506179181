//! Query execution, pagination, and transaction sequencing over the
//! external data service.
//!
//! [`QueryService`] is a stateless facade: it holds the opaque credentials,
//! target, and database identifiers and threads them into every call. No
//! caching, pooling, or retry lives here; each instance is independent.

use async_trait::async_trait;
use tracing::debug;

use crate::convert::ConverterRegistry;
use crate::decode::{Record, RecordDecoder};
use crate::error::{Error, Result};
use crate::shape::ResultShape;
use crate::wire::{
    BeginTransactionRequest, BeginTransactionResponse, Parameter, StatementRequest,
    StatementResponse, TransactionControlRequest, TransactionStatusResponse, WireValue,
};

/// The external data service collaborator.
///
/// Transport, authentication, and connection management live behind this
/// seam. Implementations surface their own failures as [`Error::Remote`];
/// this layer passes them through unmodified and never retries.
#[async_trait]
pub trait DataService: Send + Sync {
    async fn execute_statement(&self, request: StatementRequest) -> Result<StatementResponse>;

    async fn begin_transaction(
        &self,
        request: BeginTransactionRequest,
    ) -> Result<BeginTransactionResponse>;

    async fn commit_transaction(
        &self,
        request: TransactionControlRequest,
    ) -> Result<TransactionStatusResponse>;

    async fn rollback_transaction(
        &self,
        request: TransactionControlRequest,
    ) -> Result<TransactionStatusResponse>;
}

/// A wrapped row-returning result: resolved shape plus raw rows, decodable
/// later under any registry.
#[derive(Debug, Clone)]
pub struct QueryResponse {
    pub shape: ResultShape,
    pub records: Vec<Vec<WireValue>>,
}

impl QueryResponse {
    pub fn decode(&self, registry: &ConverterRegistry) -> Result<Vec<Record>> {
        RecordDecoder::new(&self.shape, registry).decode(&self.records)
    }
}

/// Outcome of [`QueryService::execute`]: the same RPC answers SELECT-shaped
/// and write-shaped statements differently.
#[derive(Debug, Clone)]
pub enum StatementOutcome {
    /// The response carried column metadata.
    Rows(QueryResponse),
    /// Update-count form, for statements returning no rows.
    Updated(i64),
}

/// Outcome of [`QueryService::query`]: decoded records, or the number of
/// rows affected when the statement returned none.
#[derive(Debug, Clone)]
pub enum QueryOutput {
    Rows(Vec<Record>),
    Affected(i64),
}

impl QueryOutput {
    pub fn rows(self) -> Option<Vec<Record>> {
        match self {
            QueryOutput::Rows(rows) => Some(rows),
            QueryOutput::Affected(_) => None,
        }
    }

    pub fn affected(&self) -> Option<i64> {
        match self {
            QueryOutput::Rows(_) => None,
            QueryOutput::Affected(n) => Some(*n),
        }
    }
}

/// Default page size for [`QueryService::query_paginated`].
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Stateless facade over one database on one data service target.
pub struct QueryService<S> {
    service: S,
    credentials_ref: String,
    target_ref: String,
    database: String,
}

impl<S: DataService> QueryService<S> {
    pub fn new(
        service: S,
        credentials_ref: impl Into<String>,
        target_ref: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            service,
            credentials_ref: credentials_ref.into(),
            target_ref: target_ref.into(),
            database: database.into(),
        }
    }

    /// Borrow the underlying service collaborator.
    pub fn service_ref(&self) -> &S {
        &self.service
    }

    fn request(
        &self,
        sql: &str,
        parameters: Vec<Parameter>,
        transaction_id: Option<&str>,
    ) -> StatementRequest {
        StatementRequest {
            credentials_ref: self.credentials_ref.clone(),
            target_ref: self.target_ref.clone(),
            database: self.database.clone(),
            sql: sql.to_string(),
            parameters,
            include_metadata: true,
            transaction_id: transaction_id.map(ToString::to_string),
        }
    }

    /// Send a statement and return the untouched wire response. Escape hatch
    /// for callers that want the raw form.
    pub async fn execute_raw(
        &self,
        sql: &str,
        parameters: Vec<Parameter>,
    ) -> Result<StatementResponse> {
        self.execute_raw_in(sql, parameters, None).await
    }

    async fn execute_raw_in(
        &self,
        sql: &str,
        parameters: Vec<Parameter>,
        transaction_id: Option<&str>,
    ) -> Result<StatementResponse> {
        debug!(
            params = parameters.len(),
            in_transaction = transaction_id.is_some(),
            "executing statement"
        );
        self.service
            .execute_statement(self.request(sql, parameters, transaction_id))
            .await
    }

    /// Send a statement and wrap the response: a shape plus raw rows when
    /// column metadata came back, the update count otherwise.
    pub async fn execute(
        &self,
        sql: &str,
        parameters: Vec<Parameter>,
    ) -> Result<StatementOutcome> {
        self.execute_in(sql, parameters, None).await
    }

    async fn execute_in(
        &self,
        sql: &str,
        parameters: Vec<Parameter>,
        transaction_id: Option<&str>,
    ) -> Result<StatementOutcome> {
        let response = self.execute_raw_in(sql, parameters, transaction_id).await?;
        Ok(wrap_response(response))
    }

    /// Execute and decode under the given registry. Row-returning statements
    /// yield records; write statements yield the affected-row count.
    pub async fn query(
        &self,
        sql: &str,
        parameters: Vec<Parameter>,
        registry: &ConverterRegistry,
    ) -> Result<QueryOutput> {
        self.query_in(sql, parameters, registry, None).await
    }

    async fn query_in(
        &self,
        sql: &str,
        parameters: Vec<Parameter>,
        registry: &ConverterRegistry,
        transaction_id: Option<&str>,
    ) -> Result<QueryOutput> {
        match self.execute_in(sql, parameters, transaction_id).await? {
            StatementOutcome::Rows(response) => Ok(QueryOutput::Rows(response.decode(registry)?)),
            StatementOutcome::Updated(n) => Ok(QueryOutput::Affected(n)),
        }
    }

    /// Fetch all rows of `sql` page by page, appending `LIMIT`/`OFFSET` to
    /// the caller's SQL and flattening the pages in order.
    /// [`DEFAULT_PAGE_SIZE`] is the conventional `page_size`.
    ///
    /// A page with fewer than `page_size` records ends the loop; a full page
    /// always triggers one more fetch, so a result set that is an exact
    /// multiple of `page_size` costs one extra empty fetch. That extra fetch
    /// is part of the observed contract and is kept.
    pub async fn query_paginated(
        &self,
        sql: &str,
        parameters: Vec<Parameter>,
        registry: &ConverterRegistry,
        page_size: usize,
    ) -> Result<Vec<Record>> {
        self.query_paginated_in(sql, parameters, registry, page_size, None)
            .await
    }

    async fn query_paginated_in(
        &self,
        sql: &str,
        parameters: Vec<Parameter>,
        registry: &ConverterRegistry,
        page_size: usize,
        transaction_id: Option<&str>,
    ) -> Result<Vec<Record>> {
        let mut all = Vec::new();
        let mut offset = 0usize;
        loop {
            let paged_sql = format!("{sql} LIMIT {page_size} OFFSET {offset}");
            let page = match self
                .query_in(&paged_sql, parameters.clone(), registry, transaction_id)
                .await?
            {
                QueryOutput::Rows(rows) => rows,
                QueryOutput::Affected(_) => {
                    return Err(Error::ShapeMismatch(
                        "paginated statement returned an update count, not rows".to_string(),
                    ));
                }
            };
            debug!(offset, fetched = page.len(), "fetched page");
            let last = page.len() < page_size;
            all.extend(page);
            if last {
                return Ok(all);
            }
            offset += page_size;
        }
    }

    /// Open a transaction on the service and capture its identifier.
    ///
    /// Statements issued through the returned handle carry that identifier,
    /// so the service associates them with the open transaction. The handle
    /// is not safe for concurrent statement submission; ordering within one
    /// transaction is caller-serialized.
    pub async fn begin(&self) -> Result<Transaction<'_, S>> {
        let response = self
            .service
            .begin_transaction(BeginTransactionRequest {
                credentials_ref: self.credentials_ref.clone(),
                target_ref: self.target_ref.clone(),
                database: self.database.clone(),
            })
            .await?;
        debug!(id = %response.transaction_id, "transaction started");
        Ok(Transaction {
            service: self,
            id: response.transaction_id,
        })
    }

    fn control(&self, transaction_id: &str) -> TransactionControlRequest {
        TransactionControlRequest {
            credentials_ref: self.credentials_ref.clone(),
            target_ref: self.target_ref.clone(),
            transaction_id: transaction_id.to_string(),
        }
    }
}

/// An open transaction: a captured server-issued identifier, nothing more.
/// Closure is the service's responsibility; there is no local state machine.
/// Committing or rolling back consumes the handle, so a second terminal
/// call cannot be expressed.
pub struct Transaction<'a, S> {
    service: &'a QueryService<S>,
    id: String,
}

impl<S: DataService> Transaction<'_, S> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn execute_raw(
        &self,
        sql: &str,
        parameters: Vec<Parameter>,
    ) -> Result<StatementResponse> {
        self.service
            .execute_raw_in(sql, parameters, Some(&self.id))
            .await
    }

    pub async fn execute(
        &self,
        sql: &str,
        parameters: Vec<Parameter>,
    ) -> Result<StatementOutcome> {
        self.service.execute_in(sql, parameters, Some(&self.id)).await
    }

    pub async fn query(
        &self,
        sql: &str,
        parameters: Vec<Parameter>,
        registry: &ConverterRegistry,
    ) -> Result<QueryOutput> {
        self.service
            .query_in(sql, parameters, registry, Some(&self.id))
            .await
    }

    pub async fn query_paginated(
        &self,
        sql: &str,
        parameters: Vec<Parameter>,
        registry: &ConverterRegistry,
        page_size: usize,
    ) -> Result<Vec<Record>> {
        self.service
            .query_paginated_in(sql, parameters, registry, page_size, Some(&self.id))
            .await
    }

    /// Commit on the service, returning its reported transaction status.
    pub async fn commit(self) -> Result<String> {
        debug!(id = %self.id, "committing transaction");
        let response = self
            .service
            .service
            .commit_transaction(self.service.control(&self.id))
            .await?;
        Ok(response.transaction_status)
    }

    /// Roll back on the service, returning its reported transaction status.
    pub async fn rollback(self) -> Result<String> {
        debug!(id = %self.id, "rolling back transaction");
        let response = self
            .service
            .service
            .rollback_transaction(self.service.control(&self.id))
            .await?;
        Ok(response.transaction_status)
    }
}

fn wrap_response(response: StatementResponse) -> StatementOutcome {
    match response.column_metadata {
        Some(columns) => StatementOutcome::Rows(QueryResponse {
            shape: ResultShape::from_wire(&columns),
            records: response.records.unwrap_or_default(),
        }),
        None => StatementOutcome::Updated(response.number_of_records_updated.unwrap_or(0)),
    }
}
