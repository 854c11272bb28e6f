// Unit of work: ordered, best-effort grouping of adapter calls.
//
// Backends without transactions run the "transaction" callback against the
// same non-transactional operation set. Operations execute in the order the
// callback issues them. There is no atomicity, no isolation and no
// rollback: writes that succeeded before a failure stay in place.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::db::adapter::{Adapter, AdapterResult, BatchOutcome, FindManyQuery, WhereClause};
use crate::db::value::Record;
use crate::error::AdapterError;

/// Handle passed to a unit-of-work callback.
///
/// Exposes the adapter's CRUD operations. After the first failed operation
/// every further call returns [`AdapterError::Aborted`] without reaching the
/// backend.
#[derive(Debug, Clone)]
pub struct UnitOfWork {
    adapter: Arc<dyn Adapter>,
    state: Arc<UnitState>,
}

#[derive(Debug, Default)]
struct UnitState {
    failed: AtomicBool,
    executed: AtomicUsize,
}

impl UnitOfWork {
    pub fn new(adapter: Arc<dyn Adapter>) -> Self {
        Self {
            adapter,
            state: Arc::new(UnitState::default()),
        }
    }

    /// Number of operations that completed successfully.
    pub fn executed(&self) -> usize {
        self.state.executed.load(Ordering::SeqCst)
    }

    /// Whether an operation in this unit has failed.
    pub fn is_aborted(&self) -> bool {
        self.state.failed.load(Ordering::SeqCst)
    }

    async fn run<T>(&self, op: impl Future<Output = AdapterResult<T>>) -> AdapterResult<T> {
        if self.is_aborted() {
            return Err(AdapterError::Aborted);
        }
        match op.await {
            Ok(value) => {
                self.state.executed.fetch_add(1, Ordering::SeqCst);
                Ok(value)
            }
            Err(e) => {
                self.state.failed.store(true, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    pub async fn create(
        &self,
        model: &str,
        data: Record,
        force_allow_id: bool,
    ) -> AdapterResult<Record> {
        self.run(self.adapter.create(model, data, force_allow_id)).await
    }

    pub async fn find_one(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
    ) -> AdapterResult<Option<Record>> {
        self.run(self.adapter.find_one(model, where_clauses)).await
    }

    pub async fn find_many(&self, model: &str, query: FindManyQuery) -> AdapterResult<Vec<Record>> {
        self.run(self.adapter.find_many(model, query)).await
    }

    pub async fn count(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<i64> {
        self.run(self.adapter.count(model, where_clauses)).await
    }

    pub async fn update(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        data: Record,
    ) -> AdapterResult<Option<Record>> {
        self.run(self.adapter.update(model, where_clauses, data)).await
    }

    pub async fn update_many(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        data: Record,
    ) -> AdapterResult<BatchOutcome> {
        self.run(self.adapter.update_many(model, where_clauses, data)).await
    }

    pub async fn delete(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<()> {
        self.run(self.adapter.delete(model, where_clauses)).await
    }

    pub async fn delete_many(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
    ) -> AdapterResult<BatchOutcome> {
        self.run(self.adapter.delete_many(model, where_clauses)).await
    }
}

/// Run `work` as a sequential best-effort unit against `adapter`.
///
/// The callback's result is returned as-is. If it fails, the error reaches
/// the caller and nothing that already ran is undone.
pub async fn run_unit_of_work<F, Fut, T>(adapter: Arc<dyn Adapter>, work: F) -> AdapterResult<T>
where
    F: FnOnce(UnitOfWork) -> Fut,
    Fut: Future<Output = AdapterResult<T>>,
{
    let uow = UnitOfWork::new(adapter);
    let result = work(uow.clone()).await;
    if let Err(ref e) = result {
        tracing::debug!(
            executed = uow.executed(),
            "unit of work failed, earlier writes are kept: {e}"
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Adapter that records created models and fails on a chosen model.
    #[derive(Debug, Default)]
    struct RecordingAdapter {
        created: Mutex<Vec<String>>,
        fail_model: Option<String>,
    }

    #[async_trait]
    impl Adapter for RecordingAdapter {
        fn id(&self) -> &str {
            "recording"
        }

        async fn create(&self, model: &str, data: Record, _: bool) -> AdapterResult<Record> {
            if self.fail_model.as_deref() == Some(model) {
                return Err(AdapterError::Creation {
                    model: model.into(),
                });
            }
            self.created.lock().unwrap().push(model.to_string());
            Ok(data)
        }

        async fn find_one(&self, _: &str, _: &[WhereClause]) -> AdapterResult<Option<Record>> {
            Ok(None)
        }

        async fn find_many(&self, _: &str, _: FindManyQuery) -> AdapterResult<Vec<Record>> {
            Ok(Vec::new())
        }

        async fn count(&self, _: &str, _: &[WhereClause]) -> AdapterResult<i64> {
            Ok(self.created.lock().unwrap().len() as i64)
        }

        async fn update(
            &self,
            _: &str,
            _: &[WhereClause],
            _: Record,
        ) -> AdapterResult<Option<Record>> {
            Ok(None)
        }

        async fn update_many(
            &self,
            _: &str,
            _: &[WhereClause],
            _: Record,
        ) -> AdapterResult<BatchOutcome> {
            Ok(BatchOutcome::default())
        }

        async fn delete(&self, _: &str, _: &[WhereClause]) -> AdapterResult<()> {
            Ok(())
        }

        async fn delete_many(&self, _: &str, _: &[WhereClause]) -> AdapterResult<BatchOutcome> {
            Ok(BatchOutcome::default())
        }
    }

    #[tokio::test]
    async fn test_runs_in_order_and_returns_result() {
        let adapter = Arc::new(RecordingAdapter::default());
        let result = run_unit_of_work(adapter.clone(), |uow| async move {
            uow.create("user", Record::new(), false).await?;
            uow.create("session", Record::new(), false).await?;
            Ok(uow.executed())
        })
        .await
        .unwrap();

        assert_eq!(result, 2);
        assert_eq!(*adapter.created.lock().unwrap(), vec!["user", "session"]);
    }

    #[tokio::test]
    async fn test_failure_keeps_earlier_writes_and_propagates() {
        let adapter = Arc::new(RecordingAdapter {
            fail_model: Some("session".into()),
            ..Default::default()
        });
        let err = run_unit_of_work(adapter.clone(), |uow| async move {
            uow.create("user", Record::new(), false).await?;
            uow.create("session", Record::new(), false).await?;
            uow.create("account", Record::new(), false).await?;
            Ok(())
        })
        .await
        .unwrap_err();

        assert!(matches!(err, AdapterError::Creation { ref model } if model == "session"));
        assert_eq!(*adapter.created.lock().unwrap(), vec!["user"]);
    }

    #[tokio::test]
    async fn test_calls_after_failure_are_refused() {
        let adapter = Arc::new(RecordingAdapter {
            fail_model: Some("session".into()),
            ..Default::default()
        });
        let err = run_unit_of_work(adapter.clone(), |uow| async move {
            let _ = uow.create("session", Record::new(), false).await;
            assert!(uow.is_aborted());
            uow.create("account", Record::new(), false).await?;
            Ok(())
        })
        .await
        .unwrap_err();

        assert!(matches!(err, AdapterError::Aborted));
        assert!(adapter.created.lock().unwrap().is_empty());
    }
}
