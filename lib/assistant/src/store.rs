//! Thread persistence.
//!
//! `ThreadStore` is the contract the thread manager depends on. The server
//! provides a Postgres implementation; [`MemoryThreadStore`] backs tests and
//! deployments without a database.

use crate::error::ThreadStoreError;
use crate::thread::{NewThread, Thread, ThreadMessage};
use async_trait::async_trait;
use penwise_core::{ThreadId, UserId};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Largest page a listing returns.
pub const MAX_PAGE_SIZE: usize = 200;

/// Pagination options for listing a user's threads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListThreadsQuery {
    /// Maximum number of threads to return.
    pub num_items: Option<usize>,
    /// Id of the last thread of the previous page.
    pub cursor: Option<ThreadId>,
}

impl ListThreadsQuery {
    /// The page size after clamping to `1..=MAX_PAGE_SIZE`, if one was asked for.
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.num_items.map(|n| n.clamp(1, MAX_PAGE_SIZE))
    }
}

/// Durable storage of threads and their messages.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Creates an active thread.
    async fn create(&self, new: NewThread) -> Result<Thread, ThreadStoreError>;

    /// Loads a thread by id.
    async fn get(&self, id: ThreadId) -> Result<Option<Thread>, ThreadStoreError>;

    /// Lists a user's threads, newest first.
    async fn list_by_user(
        &self,
        user_id: &UserId,
        query: &ListThreadsQuery,
    ) -> Result<Vec<Thread>, ThreadStoreError>;

    /// Appends messages to a thread.
    async fn append_messages(
        &self,
        thread_id: ThreadId,
        messages: &[ThreadMessage],
    ) -> Result<(), ThreadStoreError>;

    /// Returns the last `limit` messages of a thread, oldest first.
    async fn recent_messages(
        &self,
        thread_id: ThreadId,
        limit: usize,
    ) -> Result<Vec<ThreadMessage>, ThreadStoreError>;
}

#[derive(Debug, Default)]
struct MemoryInner {
    /// Threads in creation order.
    threads: Vec<Thread>,
    messages: HashMap<ThreadId, Vec<ThreadMessage>>,
}

/// In-process thread store.
#[derive(Debug, Default)]
pub struct MemoryThreadStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryThreadStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully formed thread, keeping its status and timestamp.
    pub async fn insert(&self, thread: Thread) {
        self.inner.write().await.threads.push(thread);
    }
}

#[async_trait]
impl ThreadStore for MemoryThreadStore {
    async fn create(&self, new: NewThread) -> Result<Thread, ThreadStoreError> {
        let thread = Thread::new(new);
        self.inner.write().await.threads.push(thread.clone());
        Ok(thread)
    }

    async fn get(&self, id: ThreadId) -> Result<Option<Thread>, ThreadStoreError> {
        let inner = self.inner.read().await;
        Ok(inner.threads.iter().find(|t| t.id == id).cloned())
    }

    async fn list_by_user(
        &self,
        user_id: &UserId,
        query: &ListThreadsQuery,
    ) -> Result<Vec<Thread>, ThreadStoreError> {
        let inner = self.inner.read().await;
        let newest_first = inner.threads.iter().rev().filter(|t| t.is_owned_by(user_id));

        let page: Vec<&Thread> = match query.cursor {
            Some(cursor) => {
                let mut iter = newest_first.skip_while(|t| t.id != cursor);
                if iter.next().is_none() {
                    return Err(ThreadStoreError::InvalidCursor { cursor });
                }
                iter.collect()
            }
            None => newest_first.collect(),
        };

        let limit = query.limit().unwrap_or(usize::MAX);
        Ok(page.into_iter().take(limit).cloned().collect())
    }

    async fn append_messages(
        &self,
        thread_id: ThreadId,
        messages: &[ThreadMessage],
    ) -> Result<(), ThreadStoreError> {
        let mut inner = self.inner.write().await;
        if !inner.threads.iter().any(|t| t.id == thread_id) {
            return Err(ThreadStoreError::ThreadNotFound { id: thread_id });
        }
        inner
            .messages
            .entry(thread_id)
            .or_default()
            .extend_from_slice(messages);
        Ok(())
    }

    async fn recent_messages(
        &self,
        thread_id: ThreadId,
        limit: usize,
    ) -> Result<Vec<ThreadMessage>, ThreadStoreError> {
        let inner = self.inner.read().await;
        let messages = inner.messages.get(&thread_id).map_or(&[][..], Vec::as_slice);
        let start = messages.len().saturating_sub(limit);
        Ok(messages[start..].to_vec())
    }
}
