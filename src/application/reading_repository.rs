// Repository trait for persisted readings
use crate::domain::reading::{Reading, Scope};
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
pub trait ReadingRepository: Send + Sync {
    /// Stored readings for a scope within the inclusive date range,
    /// ascending by day.
    async fn find(&self, scope: &Scope, from: NaiveDate, to: NaiveDate)
        -> anyhow::Result<Vec<Reading>>;

    /// Conditional write keyed on (scope, date): the first writer wins and
    /// later writes for the same day are discarded. Returns whether the
    /// reading was newly inserted.
    async fn insert_if_absent(&self, scope: &Scope, reading: &Reading) -> anyhow::Result<bool>;

    /// Remove every reading for a scope, returning the deleted count.
    async fn delete_scope(&self, scope: &Scope) -> anyhow::Result<u64>;

    /// Remove all stored readings, returning the deleted count.
    async fn delete_all(&self) -> anyhow::Result<u64>;
}
