use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::model::LeavePolicy;
use crate::repository::{LeaveRepository, RepositoryError};

/// The policy is one process-wide value, so the cache has a single key.
const POLICY_KEY: () = ();

/// Read-through cache in front of the repository's policy fetch.
#[derive(Clone)]
pub struct PolicyCache {
    cache: Cache<(), Arc<LeavePolicy>>,
}

impl PolicyCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(1)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(
        &self,
        repository: &dyn LeaveRepository,
    ) -> Result<Arc<LeavePolicy>, RepositoryError> {
        self.cache
            .try_get_with(POLICY_KEY, async {
                repository.load_policy().await.map(Arc::new)
            })
            .await
            .map_err(|e| match Arc::try_unwrap(e) {
                Ok(err) => err,
                Err(shared) => RepositoryError::Unavailable(shared.to_string()),
            })
    }

    pub async fn replace(&self, policy: LeavePolicy) {
        self.cache.insert(POLICY_KEY, Arc::new(policy)).await;
    }

    pub async fn invalidate(&self) {
        self.cache.invalidate(&POLICY_KEY).await;
    }
}
