//! Retention of the newest datasets
//!
//! Eviction runs inside the same transaction that inserted the new dataset,
//! while the store's writer lock is held, so no concurrent upload can observe
//! the table between insert and trim.

use std::num::NonZeroU32;

use sqlx::SqliteConnection;

use crate::config::DEFAULT_RETENTION_LIMIT;

/// Keep the `keep` most recently created datasets system-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    keep: NonZeroU32,
}

impl RetentionPolicy {
    pub const fn new(keep: NonZeroU32) -> Self {
        Self { keep }
    }

    /// Policy for a configured limit; `None` when the limit is zero.
    pub fn from_limit(limit: u32) -> Option<Self> {
        NonZeroU32::new(limit).map(Self::new)
    }

    pub fn keep(&self) -> u32 {
        self.keep.get()
    }

    /// Delete every dataset older than the newest `keep`, returning the evicted ids in ascending order.
    ///
    /// Equipment rows go with their dataset through `ON DELETE CASCADE`.
    pub(crate) async fn enforce(&self, conn: &mut SqliteConnection) -> Result<Vec<i64>, sqlx::Error> {
        let mut evicted: Vec<i64> = sqlx::query_scalar(
            r#"
            DELETE FROM datasets
            WHERE id NOT IN (
                SELECT id FROM datasets ORDER BY id DESC LIMIT ?
            )
            RETURNING id
            "#,
        )
        .bind(i64::from(self.keep.get()))
        .fetch_all(&mut *conn)
        .await?;

        evicted.sort_unstable();
        Ok(evicted)
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::from_limit(DEFAULT_RETENTION_LIMIT).unwrap_or(Self::new(NonZeroU32::MIN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keeps_five() {
        assert_eq!(RetentionPolicy::default().keep(), 5);
    }

    #[test]
    fn test_zero_limit_is_not_a_policy() {
        assert_eq!(RetentionPolicy::from_limit(0), None);
        assert_eq!(RetentionPolicy::from_limit(1).map(|p| p.keep()), Some(1));
    }
}
