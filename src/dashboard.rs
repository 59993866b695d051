use crate::aggregate;
use crate::filters::FilterManager;
use crate::kv::KvStore;
use crate::models::{
    AggregateSnapshot, ContractRecord, ContractStatus, DateRange, FilterState, MonthBucket, Page,
    RiskLevel,
};
use crate::paginate::{paginate, DEFAULT_PAGE_SIZE};
use crate::search::{apply_search, SearchDebouncer, DEFAULT_QUIESCENCE};
use crate::store::{ContractStore, ContractsSource};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::time::Duration;

#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub page_size: usize,
    pub quiescence: Duration,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            quiescence: DEFAULT_QUIESCENCE,
        }
    }
}

/// Everything one render of the dashboard needs. KPI cards aggregate the raw
/// collection so headline numbers survive filtering; the table page and the
/// timeline reflect the searched and filtered collection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub page: Page<ContractRecord>,
    pub kpis: AggregateSnapshot,
    pub expiry_timeline: Vec<MonthBucket>,
    pub active_filter_count: usize,
    pub loading: bool,
    pub error: Option<String>,
}

/// Composes the store, filter state, search debouncer, aggregation and
/// pagination stages behind the operations a dashboard view invokes.
pub struct DashboardCore {
    store: ContractStore,
    filters: Mutex<FilterManager>,
    debouncer: SearchDebouncer,
    effective_term: watch::Receiver<String>,
    page_size: usize,
}

impl DashboardCore {
    pub fn new(source: Arc<dyn ContractsSource>, kv: Arc<dyn KvStore>) -> Self {
        Self::with_options(source, kv, DashboardOptions::default())
    }

    pub fn with_options(
        source: Arc<dyn ContractsSource>,
        kv: Arc<dyn KvStore>,
        options: DashboardOptions,
    ) -> Self {
        let filters = FilterManager::restore(kv);
        let (debouncer, effective_term) = SearchDebouncer::new(options.quiescence);
        // A restored search term takes effect immediately rather than waiting
        // out a quiescence window nobody is typing through.
        debouncer.force(filters.state().search_term.clone());
        Self {
            store: ContractStore::new(source),
            filters: Mutex::new(filters),
            debouncer,
            effective_term,
            page_size: options.page_size.max(1),
        }
    }

    pub async fn load(&self) {
        self.store.load().await;
    }

    pub async fn refresh(&self) {
        self.store.refresh().await;
    }

    pub fn set_search_term(&self, term: &str) {
        self.filters().set_search_term(term);
        self.debouncer.submit(term.to_string());
    }

    pub fn set_status_filter(&self, status: Option<ContractStatus>) {
        self.filters().set_status_filter(status);
    }

    pub fn set_risk_filter(&self, risk: Option<RiskLevel>) {
        self.filters().set_risk_filter(risk);
    }

    pub fn set_date_range(&self, range: Option<DateRange>) {
        self.filters().set_date_range(range);
    }

    pub fn set_page(&self, page: u32) {
        self.filters().set_page(page);
    }

    pub fn clear_filters(&self) {
        self.filters().clear();
        self.debouncer.force(String::new());
    }

    pub fn filter_state(&self) -> FilterState {
        self.filters().state().clone()
    }

    pub fn view(&self) -> DashboardView {
        let snapshot = self.store.snapshot();
        let state = self.filter_state();
        let term = self.effective_term.borrow().clone();

        let mut working = snapshot.contracts.clone();
        apply_search(&mut working, &term);
        crate::filters::apply_filters(&mut working, &state);

        let page = paginate(&working, state.page, self.page_size);
        if page.page != state.page {
            // A filter change shrank the result set below the current page;
            // keep the persisted state consistent with what is shown.
            self.filters().set_page(page.page);
        }

        let active_filter_count = self.filters().active_filter_count();
        DashboardView {
            kpis: aggregate::snapshot(&snapshot.contracts),
            expiry_timeline: aggregate::expiry_by_month(&working),
            page,
            active_filter_count,
            loading: snapshot.loading,
            error: snapshot.error,
        }
    }

    fn filters(&self) -> MutexGuard<'_, FilterManager> {
        self.filters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
