use crate::api::ApiClient;
use crate::errors::AppResult;
use crate::kv::KvStore;
use std::sync::Arc;

pub const TOKEN_KEY: &str = "token";

/// Token lifecycle for a dashboard session. The bearer token is persisted as
/// a plain string under the `token` key; a missing or unreadable entry just
/// starts the session logged out.
pub struct SessionManager {
    api: Arc<ApiClient>,
    kv: Arc<dyn KvStore>,
}

impl SessionManager {
    pub fn restore(api: Arc<ApiClient>, kv: Arc<dyn KvStore>) -> Self {
        match kv.get(TOKEN_KEY) {
            Ok(Some(token)) if !token.is_empty() => api.set_token(Some(token)),
            Ok(_) => {}
            Err(error) => {
                tracing::warn!(%error, "token storage unavailable, starting logged out");
            }
        }
        Self { api, kv }
    }

    /// Exchanges credentials for a bearer token and persists it. A rejected
    /// login surfaces as `AppError::Auth` and leaves any prior session alone.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<()> {
        let token = self.api.login(username, password).await?;
        if let Err(error) = self.kv.set(TOKEN_KEY, &token) {
            tracing::warn!(%error, "failed to persist session token");
        }
        Ok(())
    }

    pub fn logout(&self) {
        self.api.set_token(None);
        if let Err(error) = self.kv.remove(TOKEN_KEY) {
            tracing::warn!(%error, "failed to clear persisted session token");
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.api.token().is_some()
    }
}
