// ABOUTME: Per-domain async mutex serializing DNS read-modify-write within one process.
// ABOUTME: Two runs binding subdomains of the same domain push one after the other.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

use crate::types::DomainName;

/// Registry of one async mutex per domain.
///
/// Cloning shares the registry. Locks are process-local; runs in other
/// processes are not excluded.
#[derive(Debug, Clone, Default)]
pub struct DomainLocks {
    locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

/// A held domain lock that releases on drop.
pub struct DomainGuard {
    domain: String,
    _guard: OwnedMutexGuard<()>,
}

impl std::fmt::Debug for DomainGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainGuard")
            .field("domain", &self.domain)
            .finish()
    }
}

impl Drop for DomainGuard {
    fn drop(&mut self) {
        tracing::debug!(domain = %self.domain, "released DNS lock");
    }
}

impl DomainLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the lock on `domain`.
    pub async fn acquire(&self, domain: &DomainName) -> DomainGuard {
        let mutex = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry(domain.as_str().to_string()).or_default())
        };

        tracing::debug!(domain = %domain, "waiting for DNS lock");
        let guard = mutex.lock_owned().await;

        DomainGuard {
            domain: domain.as_str().to_string(),
            _guard: guard,
        }
    }

    /// Run `fut` while holding the lock on `domain`.
    ///
    /// The lock is released when `fut` completes, errors, or panics.
    pub async fn with_lock<F, T>(&self, domain: &DomainName, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        let _guard = self.acquire(domain).await;
        fut.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn domain(name: &str) -> DomainName {
        DomainName::parse(name).unwrap()
    }

    #[tokio::test]
    async fn same_domain_runs_never_overlap() {
        let locks = DomainLocks::new();
        let inside = Arc::new(AtomicU32::new(0));
        let max_seen = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let locks = locks.clone();
            let inside = Arc::clone(&inside);
            let max_seen = Arc::clone(&max_seen);
            handles.push(tokio::spawn(async move {
                locks
                    .with_lock(&domain("example.com"), async {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        inside.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_domains_do_not_block() {
        let locks = DomainLocks::new();
        let _held = locks.acquire(&domain("example.com")).await;

        let other = tokio::time::timeout(
            Duration::from_secs(1),
            locks.acquire(&domain("example.org")),
        )
        .await;
        assert!(other.is_ok());
    }
}
