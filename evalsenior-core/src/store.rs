//! Record store abstraction
//!
//! The store is an opaque remote collection of review records reachable
//! through three operations. Writes are best-effort: a call resolves once the
//! request has been dispatched, and concurrent writers are not coordinated.

use async_trait::async_trait;

use crate::review::ReviewRecord;
use crate::Result;

/// Remote collection of review records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Endpoint this store talks to
    fn endpoint(&self) -> &str;

    /// A store of the same kind pointed at another endpoint
    fn rebind(&self, endpoint: &str) -> Result<Self>
    where
        Self: Sized;

    /// Fetch every record
    async fn list(&self) -> Result<Vec<ReviewRecord>>;

    /// Write the full record, replacing any record with the same id
    async fn put(&self, review: &ReviewRecord) -> Result<()>;

    /// Delete the record with the given id
    async fn remove(&self, id: &str) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory store used by session tests

    use super::*;
    use crate::Error;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    pub(crate) struct MemoryInner {
        pub records: Vec<ReviewRecord>,
        pub fail_list: bool,
        pub fail_writes: bool,
        pub lists: usize,
        pub puts: Vec<ReviewRecord>,
        pub removes: Vec<String>,
    }

    #[derive(Debug, Clone, Default)]
    pub(crate) struct MemoryStore {
        pub endpoint: String,
        pub inner: Arc<Mutex<MemoryInner>>,
    }

    impl MemoryStore {
        pub fn with_records(records: Vec<ReviewRecord>) -> Self {
            let store = Self {
                endpoint: "https://store.test/exec".to_string(),
                ..Default::default()
            };
            store.inner.lock().unwrap().records = records;
            store
        }

        pub fn inner(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
            self.inner.lock().unwrap()
        }
    }

    #[async_trait]
    impl RecordStore for MemoryStore {
        fn endpoint(&self) -> &str {
            &self.endpoint
        }

        fn rebind(&self, endpoint: &str) -> Result<Self> {
            Ok(Self {
                endpoint: endpoint.to_string(),
                inner: Arc::clone(&self.inner),
            })
        }

        async fn list(&self) -> Result<Vec<ReviewRecord>> {
            let mut inner = self.inner();
            inner.lists += 1;
            if inner.fail_list {
                return Err(Error::Transport("connection refused".to_string()));
            }
            Ok(inner.records.clone())
        }

        async fn put(&self, review: &ReviewRecord) -> Result<()> {
            let mut inner = self.inner();
            inner.puts.push(review.clone());
            if inner.fail_writes {
                return Err(Error::Transport("connection reset".to_string()));
            }
            match inner.records.iter_mut().find(|r| r.id == review.id) {
                Some(existing) => *existing = review.clone(),
                None => inner.records.push(review.clone()),
            }
            Ok(())
        }

        async fn remove(&self, id: &str) -> Result<()> {
            let mut inner = self.inner();
            inner.removes.push(id.to_string());
            if inner.fail_writes {
                return Err(Error::Transport("connection reset".to_string()));
            }
            inner.records.retain(|r| r.id != id);
            Ok(())
        }
    }
}
