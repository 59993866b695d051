use crate::kv::KvStore;
use crate::models::{ContractRecord, ContractStatus, DateRange, FilterState, RiskLevel};
use std::sync::Arc;

pub const FILTERS_KEY: &str = "filters";

/// A record passes when every active predicate holds. Records without an
/// expiry date cannot satisfy an active date range and are excluded by it.
pub fn matches_filters(state: &FilterState, record: &ContractRecord) -> bool {
    if let Some(expected) = state.status_filter {
        if record.status != expected {
            return false;
        }
    }

    if let Some(expected) = state.risk_filter {
        if record.risk != expected {
            return false;
        }
    }

    if let Some(range) = state.date_range.as_ref() {
        let Some(expiry) = record.expiry else {
            return false;
        };
        if !range.contains(expiry) {
            return false;
        }
    }

    true
}

pub fn apply_filters(contracts: &mut Vec<ContractRecord>, state: &FilterState) {
    contracts.retain(|contract| matches_filters(state, contract));
}

/// Owns the user's view parameters. Every mutation persists the full state to
/// the injected key-value store; persistence failures are logged, never
/// surfaced. Restoring from a corrupt or absent entry falls back to defaults.
pub struct FilterManager {
    state: FilterState,
    kv: Arc<dyn KvStore>,
}

impl FilterManager {
    pub fn restore(kv: Arc<dyn KvStore>) -> Self {
        let state = match kv.get(FILTERS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<FilterState>(&raw) {
                Ok(state) => state,
                Err(error) => {
                    tracing::debug!(%error, "persisted filters unreadable, using defaults");
                    FilterState::default()
                }
            },
            Ok(None) => FilterState::default(),
            Err(error) => {
                tracing::warn!(%error, "filter storage unavailable, using defaults");
                FilterState::default()
            }
        };
        Self { state, kv }
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn set_status_filter(&mut self, status: Option<ContractStatus>) {
        if self.state.status_filter == status {
            return;
        }
        self.state.status_filter = status;
        self.reset_page_and_persist();
    }

    pub fn set_risk_filter(&mut self, risk: Option<RiskLevel>) {
        if self.state.risk_filter == risk {
            return;
        }
        self.state.risk_filter = risk;
        self.reset_page_and_persist();
    }

    pub fn set_date_range(&mut self, range: Option<DateRange>) {
        if self.state.date_range == range {
            return;
        }
        self.state.date_range = range;
        self.reset_page_and_persist();
    }

    pub fn set_search_term(&mut self, term: &str) {
        if self.state.search_term == term {
            return;
        }
        self.state.search_term = term.to_string();
        self.reset_page_and_persist();
    }

    pub fn set_page(&mut self, page: u32) {
        let page = page.max(1);
        if self.state.page == page {
            return;
        }
        self.state.page = page;
        self.persist();
    }

    pub fn clear(&mut self) {
        self.state = FilterState::default();
        self.persist();
    }

    pub fn active_filter_count(&self) -> usize {
        let mut count = 0;
        if self.state.status_filter.is_some() {
            count += 1;
        }
        if self.state.risk_filter.is_some() {
            count += 1;
        }
        if self.state.date_range.is_some() {
            count += 1;
        }
        count
    }

    fn reset_page_and_persist(&mut self) {
        self.state.page = 1;
        self.persist();
    }

    fn persist(&self) {
        let raw = match serde_json::to_string(&self.state) {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!(%error, "failed to serialize filter state");
                return;
            }
        };
        if let Err(error) = self.kv.set(FILTERS_KEY, &raw) {
            tracing::warn!(%error, "failed to persist filter state");
        }
    }
}
