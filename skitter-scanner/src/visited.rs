use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Addresses that have been claimed for fetching during one crawl.
///
/// Claiming is the only mutation and it is a single test-and-set, so two
/// branches can never both observe an address as unclaimed. The set is
/// shared between branches behind an `Arc`.
#[derive(Debug, Default)]
pub struct VisitedSet {
    claimed: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `url` for the calling branch.
    ///
    /// Returns `true` if the address was unclaimed and is now owned by the
    /// caller, `false` if another branch got there first.
    pub fn try_claim(&self, url: &str) -> bool {
        let mut claimed = self.lock();
        if claimed.contains(url) {
            return false;
        }
        claimed.insert(url.to_string())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Inserts are the only writes, so a panic elsewhere cannot leave the set
    // half-updated.
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.claimed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_first_claim_wins() {
        let visited = VisitedSet::new();
        assert!(visited.try_claim("http://example.com/"));
        assert!(!visited.try_claim("http://example.com/"));
        assert!(visited.try_claim("http://example.com/other"));
        assert_eq!(visited.len(), 2);
    }

    #[test]
    fn test_lost_claim_leaves_set_unchanged() {
        let visited = VisitedSet::new();
        assert!(visited.is_empty());
        assert!(visited.try_claim("a"));
        assert!(!visited.try_claim("a"));
        assert!(!visited.try_claim("a"));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_concurrent_claims_have_one_winner() {
        for n in [2, 8, 64] {
            let visited = Arc::new(VisitedSet::new());
            let barrier = Arc::new(std::sync::Barrier::new(n));

            let handles: Vec<_> = (0..n)
                .map(|_| {
                    let visited = visited.clone();
                    let barrier = barrier.clone();
                    std::thread::spawn(move || {
                        barrier.wait();
                        visited.try_claim("http://example.com/contended")
                    })
                })
                .collect();

            let winners = handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|won| *won)
                .count();

            assert_eq!(winners, 1, "expected exactly one winner among {} claimants", n);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_across_tasks() {
        let visited = Arc::new(VisitedSet::new());
        let mut handles = Vec::new();
        for _ in 0..100 {
            let visited = visited.clone();
            handles.push(tokio::spawn(async move { visited.try_claim("same") }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(visited.len(), 1);
    }
}
