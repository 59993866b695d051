use crate::models::ContractRecord;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Duration;

pub const DEFAULT_QUIESCENCE: Duration = Duration::from_millis(300);

pub fn matches_search(record: &ContractRecord, needle_lower: &str) -> bool {
    record.name.to_ascii_lowercase().contains(needle_lower)
        || record.parties.to_ascii_lowercase().contains(needle_lower)
}

/// Narrows the collection to records whose name or parties contain the term,
/// case-insensitively. An empty term keeps everything.
pub fn apply_search(contracts: &mut Vec<ContractRecord>, term: &str) {
    let term = term.trim();
    if term.is_empty() {
        return;
    }
    let needle = term.to_ascii_lowercase();
    contracts.retain(|contract| matches_search(contract, &needle));
}

/// Emits the latest submitted term to subscribers once the quiescence window
/// elapses without a newer submission. Each submission supersedes the pending
/// one via a generation counter; superseded timers fire and drop their term.
pub struct SearchDebouncer {
    quiescence: Duration,
    generation: Arc<AtomicU64>,
    tx: watch::Sender<String>,
}

impl SearchDebouncer {
    pub fn new(quiescence: Duration) -> (Self, watch::Receiver<String>) {
        let (tx, rx) = watch::channel(String::new());
        let debouncer = Self {
            quiescence,
            generation: Arc::new(AtomicU64::new(0)),
            tx,
        };
        (debouncer, rx)
    }

    pub fn submit(&self, term: String) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let counter = Arc::clone(&self.generation);
        let tx = self.tx.clone();
        let quiescence = self.quiescence;
        tokio::spawn(async move {
            tokio::time::sleep(quiescence).await;
            if counter.load(Ordering::SeqCst) == generation {
                let _ = tx.send(term);
            }
        });
    }

    /// Bypasses the quiescence window; used when filters are cleared and the
    /// view must not briefly show stale search results.
    pub fn force(&self, term: String) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let _ = self.tx.send(term);
    }
}
