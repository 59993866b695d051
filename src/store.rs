use crate::errors::AppResult;
use crate::models::ContractRecord;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Where the raw collection comes from. The HTTP client implements this; tests
/// inject fakes.
#[async_trait]
pub trait ContractsSource: Send + Sync {
    async fn fetch_contracts(&self) -> AppResult<Vec<ContractRecord>>;
}

#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub contracts: Vec<ContractRecord>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Default)]
struct StoreState {
    contracts: Vec<ContractRecord>,
    error: Option<String>,
}

/// Holds the raw, unfiltered collection for the session. A failed load keeps
/// the previous collection and records the failure message; nothing is
/// retried automatically.
pub struct ContractStore {
    source: Arc<dyn ContractsSource>,
    state: Mutex<StoreState>,
    in_flight: AtomicU64,
}

impl ContractStore {
    pub fn new(source: Arc<dyn ContractsSource>) -> Self {
        Self {
            source,
            state: Mutex::new(StoreState::default()),
            in_flight: AtomicU64::new(0),
        }
    }

    /// Fetches the collection and applies the result. Overlapping calls apply
    /// in completion order: whichever resolves last wins, and if both fail the
    /// most recent failure's message is the one kept.
    pub async fn load(&self) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let result = self.source.fetch_contracts().await;

        {
            let mut state = self.lock_state();
            match result {
                Ok(contracts) => {
                    state.contracts = dedupe_by_id(contracts);
                    state.error = None;
                }
                Err(error) => {
                    tracing::warn!(%error, "contract load failed, retaining previous collection");
                    state.error = Some(error.to_string());
                }
            }
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    pub async fn refresh(&self) {
        self.load().await;
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.lock_state();
        StoreSnapshot {
            contracts: state.contracts.clone(),
            loading: self.in_flight.load(Ordering::SeqCst) > 0,
            error: state.error.clone(),
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, StoreState> {
        // A poisoned lock only means a writer panicked; the held collection
        // is still the best data available.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn dedupe_by_id(contracts: Vec<ContractRecord>) -> Vec<ContractRecord> {
    let mut seen: HashSet<String> = HashSet::with_capacity(contracts.len());
    let mut unique = Vec::with_capacity(contracts.len());
    let mut dropped = 0usize;
    for contract in contracts {
        if seen.insert(contract.id.clone()) {
            unique.push(contract);
        } else {
            dropped += 1;
        }
    }
    if dropped > 0 {
        tracing::warn!(dropped, "dropped contracts with duplicate ids");
    }
    unique
}
