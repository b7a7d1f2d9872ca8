//! The key/value contract shared by the production store and the test fake.

use crate::StoreError;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Narrow string/list interface over the persisted store.
///
/// Missing keys read as empty, never as an error. List operations are
/// FIFO: `rpush` appends to the tail, `lpop` removes from the head, and a
/// popped value is gone regardless of what the caller does with it.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a string value; `None` when the key is absent.
    async fn get_str(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a string value, replacing any previous value.
    async fn set_str(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a key. Deleting an absent key is a no-op.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Append a value to the tail of a list.
    async fn rpush(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Pop the head of a list; `None` when the list is empty or absent.
    async fn lpop(&self, key: &str) -> Result<Option<String>, StoreError>;
}

#[derive(Debug)]
enum MemoryValue {
    Str(String),
    List(VecDeque<String>),
}

/// In-memory `KvStore` with the same missing-key and FIFO semantics as the
/// Redis implementation. Used by unit and pipeline tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, MemoryValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, MemoryValue>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of entries currently in a list key. Test helper.
    pub fn list_len(&self, key: &str) -> usize {
        match self.lock().get(key) {
            Some(MemoryValue::List(list)) => list.len(),
            _ => 0,
        }
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get_str(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(match self.lock().get(key) {
            Some(MemoryValue::Str(s)) => Some(s.clone()),
            _ => None,
        })
    }

    async fn set_str(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock()
            .insert(key.to_string(), MemoryValue::Str(value.to_string()));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.lock().remove(key);
        Ok(())
    }

    async fn rpush(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        match inner
            .entry(key.to_string())
            .or_insert_with(|| MemoryValue::List(VecDeque::new()))
        {
            MemoryValue::List(list) => {
                list.push_back(value.to_string());
                Ok(())
            }
            MemoryValue::Str(_) => {
                // Mirrors Redis: list ops on a string key are a type error.
                Err(StoreError::Redis(redis::RedisError::from((
                    redis::ErrorKind::TypeError,
                    "rpush on string key",
                ))))
            }
        }
    }

    async fn lpop(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut inner = self.lock();
        Ok(match inner.get_mut(key) {
            Some(MemoryValue::List(list)) => list.pop_front(),
            _ => None,
        })
    }
}
