//! Result of a guarded (compare-and-set) update.

use fleetcare_core::error::CoreError;
use fleetcare_core::types::DbId;

/// Outcome of an `UPDATE ... WHERE <guard>` statement.
///
/// `Blocked` carries the row as it stood when the guard failed, so callers
/// can explain the conflict without a second read.
#[derive(Debug)]
pub enum Guarded<T, C = T> {
    /// The guard held and the update was applied.
    Applied(T),
    /// No row with the requested id exists.
    Missing,
    /// The row exists but the guard rejected the update.
    Blocked(C),
}

impl<T, C> Guarded<T, C> {
    /// Convert into a `Result`, building the conflict error from the
    /// blocking row.
    pub fn into_result<F>(
        self,
        entity: &'static str,
        id: DbId,
        on_blocked: F,
    ) -> Result<T, CoreError>
    where
        F: FnOnce(C) -> CoreError,
    {
        match self {
            Guarded::Applied(value) => Ok(value),
            Guarded::Missing => Err(CoreError::NotFound { entity, id }),
            Guarded::Blocked(current) => Err(on_blocked(current)),
        }
    }

    /// Build from the pair of an attempted guarded write and a fallback read.
    pub fn from_attempt(applied: Option<T>, current: Option<C>) -> Self {
        match (applied, current) {
            (Some(value), _) => Guarded::Applied(value),
            (None, Some(current)) => Guarded::Blocked(current),
            (None, None) => Guarded::Missing,
        }
    }
}
