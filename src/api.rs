use crate::errors::{AppError, AppResult};
use crate::models::{
    AskRequest, AskResponse, ContractDetail, ContractRecord, LoginRequest, TokenResponse,
    UploadRequest, UploadResponse,
};
use crate::store::ContractsSource;
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use std::sync::RwLock;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            token: None,
            timeout_secs: 30,
        }
    }
}

/// HTTP client for the contract backend. The bearer token is attached to
/// every request once set; the login call installs it automatically.
pub struct ApiClient {
    config: ApiConfig,
    token: RwLock<Option<String>>,
    client: Client,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| AppError::Internal(error.to_string()))?;
        let token = RwLock::new(config.token.clone());
        Ok(Self {
            config,
            token,
            client,
        })
    }

    pub fn set_token(&self, token: Option<String>) {
        if let Ok(mut slot) = self.token.write() {
            *slot = token;
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|slot| slot.clone())
    }

    pub async fn login(&self, username: &str, password: &str) -> AppResult<String> {
        let url = format!("{}/login", self.config.base_url);
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AppError::Auth(if message.is_empty() {
                "invalid credentials".to_string()
            } else {
                message
            }));
        }

        let token: TokenResponse = response.json().await?;
        self.set_token(Some(token.token.clone()));
        Ok(token.token)
    }

    pub async fn list_contracts(&self) -> AppResult<Vec<ContractRecord>> {
        let url = format!("{}/contracts", self.config.base_url);
        let response = self.authorized(self.client.get(&url)).send().await?;
        let raw: Vec<serde_json::Value> = self.handle_response(response).await?;
        Ok(decode_contracts(raw))
    }

    pub async fn contract_detail(&self, id: &str) -> AppResult<ContractDetail> {
        let url = format!(
            "{}/contracts/{}",
            self.config.base_url,
            urlencoding::encode(id)
        );
        let response = self.authorized(self.client.get(&url)).send().await?;
        self.handle_response(response).await
    }

    pub async fn upload(&self, request: &UploadRequest) -> AppResult<UploadResponse> {
        let url = format!("{}/upload", self.config.base_url);
        let response = self
            .authorized(self.client.post(&url))
            .json(request)
            .send()
            .await?;
        self.handle_response(response).await
    }

    pub async fn ask(&self, request: &AskRequest) -> AppResult<AskResponse> {
        let url = format!("{}/ask", self.config.base_url);
        let response = self
            .authorized(self.client.post(&url))
            .json(request)
            .send()
            .await?;
        self.handle_response(response).await
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token() {
            Some(token) => request.header(header::AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Auth(if body.is_empty() {
                "authorization rejected".to_string()
            } else {
                body
            }));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound("resource not found".to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Fetch(format!("server returned {status}: {body}")));
        }

        let body = response.json().await?;
        Ok(body)
    }
}

#[async_trait]
impl ContractsSource for ApiClient {
    async fn fetch_contracts(&self) -> AppResult<Vec<ContractRecord>> {
        self.list_contracts().await
    }
}

/// Decodes the contract list element by element so one malformed record
/// cannot fail the whole load.
fn decode_contracts(raw: Vec<serde_json::Value>) -> Vec<ContractRecord> {
    let mut contracts = Vec::with_capacity(raw.len());
    let mut skipped = 0usize;
    for value in raw {
        match serde_json::from_value::<ContractRecord>(value) {
            Ok(record) => contracts.push(record),
            Err(error) => {
                skipped += 1;
                tracing::warn!(%error, "skipping malformed contract record");
            }
        }
    }
    if skipped > 0 {
        tracing::warn!(skipped, "dropped malformed records from contract response");
    }
    contracts
}
