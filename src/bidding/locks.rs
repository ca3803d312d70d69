// region:    --- Imports
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

// endregion: --- Imports

// region:    --- Keyed Locks
/// 키별 비동기 락. 서로 다른 키는 병렬로 진행된다.
///
/// 아무도 보유하거나 기다리지 않는 항목은 가드가 해제될 때 제거된다.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    entries: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// `key`의 락을 획득할 때까지 대기
    pub async fn lock(&self, key: K) -> KeyedGuard<'_, K> {
        let entry = {
            let mut entries = self.entries.lock();
            Arc::clone(entries.entry(key.clone()).or_default())
        };
        let guard = Arc::clone(&entry).lock_owned().await;
        KeyedGuard {
            locks: self,
            key,
            entry,
            guard: Some(guard),
        }
    }

    /// 현재 추적 중인 키 개수
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
pub struct KeyedGuard<'a, K>
where
    K: Eq + Hash + Clone,
{
    locks: &'a KeyedLocks<K>,
    key: K,
    entry: Arc<AsyncMutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K> Drop for KeyedGuard<'_, K>
where
    K: Eq + Hash + Clone,
{
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut entries = self.locks.entries.lock();
        // 맵과 이 가드만 참조하고 있으면 대기자가 없다
        if Arc::strong_count(&self.entry) == 2 {
            if let Some(current) = entries.get(&self.key) {
                if Arc::ptr_eq(current, &self.entry) {
                    entries.remove(&self.key);
                }
            }
        }
    }
}

// endregion: --- Keyed Locks

// endregion: --- Tests
