//! Backend repositories
//!
//! Repository pattern implementations over the hosted backend's table API.
//! Each repository handles the reads and writes for a specific entity and is
//! the only place that knows which tables, columns and filters that entity
//! needs.

pub mod banner;
pub mod media;
pub mod model;

pub use banner::{BannerRepository, RestBannerRepository};
pub use media::{MediaFilter, MediaRepository, RestMediaRepository};
pub use model::{ModelRepository, RestModelRepository};

use crate::backend::BackendError;
use serde::Serialize;

/// Serialize an insert/patch payload into a backend row value
pub(crate) fn to_row<T: Serialize>(value: &T) -> Result<serde_json::Value, BackendError> {
    serde_json::to_value(value)
        .map_err(|e| BackendError::unknown(format!("failed to serialize row: {}", e)))
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Recording fake for the `Backend` trait.
    //!
    //! Queued results are handed out in order; every received request is
    //! kept so tests can assert on the exact tables, filters and payloads
    //! a repository produced.

    use crate::backend::{Backend, BackendError, MutateRequest, QueryResult, SelectRequest};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingBackend {
        pub selects: Mutex<Vec<SelectRequest>>,
        pub mutates: Mutex<Vec<MutateRequest>>,
        select_results: Mutex<VecDeque<Result<QueryResult, BackendError>>>,
        mutate_results: Mutex<VecDeque<Result<QueryResult, BackendError>>>,
    }

    impl RecordingBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn queue_select(&self, result: Result<QueryResult, BackendError>) {
            self.select_results.lock().unwrap().push_back(result);
        }

        pub fn queue_select_rows(&self, rows: serde_json::Value, total: Option<i64>) {
            self.queue_select(Ok(QueryResult { rows, total }));
        }

        pub fn queue_mutate(&self, result: Result<QueryResult, BackendError>) {
            self.mutate_results.lock().unwrap().push_back(result);
        }

        pub fn queue_mutate_rows(&self, rows: serde_json::Value) {
            self.queue_mutate(Ok(QueryResult { rows, total: None }));
        }

        pub fn recorded_selects(&self) -> Vec<SelectRequest> {
            self.selects.lock().unwrap().clone()
        }

        pub fn recorded_mutates(&self) -> Vec<MutateRequest> {
            self.mutates.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Backend for RecordingBackend {
        async fn query(&self, req: SelectRequest) -> Result<QueryResult, BackendError> {
            self.selects.lock().unwrap().push(req);
            self.select_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Ok(QueryResult {
                        rows: serde_json::json!([]),
                        total: None,
                    })
                })
        }

        async fn mutate(&self, req: MutateRequest) -> Result<QueryResult, BackendError> {
            self.mutates.lock().unwrap().push(req);
            self.mutate_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Ok(QueryResult {
                        rows: serde_json::json!([]),
                        total: None,
                    })
                })
        }

        fn credentials_changed(&self) {}
    }
}
