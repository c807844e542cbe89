use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Per-(user, scheme) write serialization. A portfolio is unique per pair,
/// so this is the per-portfolio lock even before the row exists. Readers
/// never take these locks.
#[derive(Default)]
pub struct PortfolioLocks {
    inner: Mutex<HashMap<(String, i32), Arc<AsyncMutex<()>>>>,
}

impl PortfolioLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, user_id: &str, scheme_code: i32) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            map.entry((user_id.to_string(), scheme_code))
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
