pub mod aggregate;
pub mod api;
pub mod dashboard;
pub mod errors;
pub mod export;
pub mod filters;
pub mod kv;
pub mod models;
pub mod paginate;
pub mod search;
pub mod session;
pub mod store;

pub use api::{ApiClient, ApiConfig};
pub use dashboard::{DashboardCore, DashboardOptions, DashboardView};
pub use errors::{AppError, AppResult};
pub use filters::FilterManager;
pub use kv::{KvStore, MemoryKv, SqliteKv};
pub use models::{
    AggregateSnapshot, AskRequest, AskResponse, ContractDetail, ContractRecord, ContractStatus,
    DateRange, FilterState, MonthBucket, Page, RiskLevel, UploadRequest, UploadResponse,
};
pub use search::SearchDebouncer;
pub use session::SessionManager;
pub use store::{ContractStore, ContractsSource, StoreSnapshot};

/// Installs a stderr subscriber honoring `RUST_LOG`, defaulting to `info`.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}
