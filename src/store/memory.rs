//! In-memory favorites store
//!
//! Behaves like a well-mannered remote store and can be told to fail or
//! stall specific operations, which is how rollback paths get exercised.

use crate::catchment::{School, SchoolId};
use crate::constants::limits::MAX_FAVORITES;
use crate::error::{Error, Result};
use crate::store::{FavoritesStore, StoreOp};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Favorites store held in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    schools: Mutex<Vec<School>>,
    failures: Mutex<VecDeque<StoreOp>>,
    delays: Mutex<HashMap<StoreOp, Duration>>,
    calls: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with existing schools
    pub fn with_schools(schools: Vec<School>) -> Self {
        Self {
            schools: Mutex::new(schools),
            ..Self::default()
        }
    }

    /// Reject the next call of `op`
    pub fn fail_next(&self, op: StoreOp) {
        lock(&self.failures).push_back(op);
    }

    /// Stall every call of `op` before answering
    pub fn delay(&self, op: StoreOp, delay: Duration) {
        lock(&self.delays).insert(op, delay);
    }

    /// Number of calls received, failed ones included
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Current contents, bypassing failure injection
    pub fn snapshot(&self) -> Vec<School> {
        lock(&self.schools).clone()
    }

    async fn enter(&self, op: StoreOp) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = lock(&self.delays).get(&op).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut failures = lock(&self.failures);
        if let Some(idx) = failures.iter().position(|f| *f == op) {
            failures.remove(idx);
            return Err(Error::rejected(format!("Simulated {} failure", op)));
        }
        Ok(())
    }
}

impl FavoritesStore for MemoryStore {
    async fn list(&self) -> Result<Vec<School>> {
        self.enter(StoreOp::List).await?;
        Ok(self.snapshot())
    }

    async fn create(&self, school: &School) -> Result<()> {
        self.enter(StoreOp::Create).await?;
        let mut schools = lock(&self.schools);
        if schools.iter().any(|s| s.id == school.id) {
            return Err(Error::rejected(format!("School {} already exists", school.id)));
        }
        if schools.iter().filter(|s| s.is_favorite).count() >= MAX_FAVORITES {
            return Err(Error::Capacity(format!(
                "At most {} favorite schools can be stored",
                MAX_FAVORITES
            )));
        }
        schools.push(school.clone());
        Ok(())
    }

    async fn update(&self, school: &School) -> Result<()> {
        self.enter(StoreOp::Update).await?;
        let mut schools = lock(&self.schools);
        let stored = schools
            .iter_mut()
            .find(|s| s.id == school.id)
            .ok_or_else(|| Error::NotFound(format!("School not found: {}", school.id)))?;
        *stored = school.clone();
        Ok(())
    }

    async fn delete(&self, id: SchoolId) -> Result<()> {
        self.enter(StoreOp::Delete).await?;
        let mut schools = lock(&self.schools);
        let idx = schools
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| Error::NotFound(format!("School not found: {}", id)))?;
        schools.remove(idx);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinates;

    fn school(name: &str) -> School {
        School::new(name, "", Coordinates::new(51.5, -0.12))
    }

    #[tokio::test]
    async fn test_crud() {
        let store = MemoryStore::new();
        let mut a = school("A");

        store.create(&a).await.unwrap();
        a.name = "A2".to_string();
        store.update(&a).await.unwrap();
        assert_eq!(store.list().await.unwrap()[0].name, "A2");

        store.delete(a.id).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
        assert_eq!(store.calls(), 5);
    }

    #[tokio::test]
    async fn test_unknown_ids() {
        let store = MemoryStore::new();
        let a = school("A");
        assert!(matches!(store.update(&a).await, Err(Error::NotFound(_))));
        assert!(matches!(store.delete(a.id).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_fail_next_is_one_shot_and_per_op() {
        let store = MemoryStore::new();
        let a = school("A");
        store.fail_next(StoreOp::Create);

        store.list().await.unwrap();
        let err = store.create(&a).await.unwrap_err();
        assert!(matches!(err, Error::Persistence { retryable: false, .. }));
        assert!(store.snapshot().is_empty());

        store.create(&a).await.unwrap();
        assert_eq!(store.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_capacity_enforced() {
        let store = MemoryStore::new();
        for i in 0..MAX_FAVORITES {
            store.create(&school(&format!("S{}", i))).await.unwrap();
        }
        assert!(matches!(
            store.create(&school("extra")).await,
            Err(Error::Capacity(_))
        ));
    }
}
