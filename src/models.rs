use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractStatus {
    Active,
    #[serde(rename = "Renewal Due")]
    RenewalDue,
    Expired,
    #[serde(other)]
    Unknown,
}

impl ContractStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::RenewalDue => "Renewal Due",
            Self::Expired => "Expired",
            Self::Unknown => "Unknown",
        }
    }

    pub const KNOWN: [ContractStatus; 3] = [Self::Active, Self::RenewalDue, Self::Expired];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    #[serde(other)]
    Unknown,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContractRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parties: String,
    #[serde(default)]
    pub uploaded_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expiry: Option<NaiveDate>,
    pub status: ContractStatus,
    pub risk: RiskLevel,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterState {
    pub status_filter: Option<ContractStatus>,
    pub risk_filter: Option<RiskLevel>,
    pub date_range: Option<DateRange>,
    pub search_term: String,
    pub page: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            status_filter: None,
            risk_filter: None,
            date_range: None,
            search_term: String::new(),
            page: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MonthBucket {
    pub month: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSnapshot {
    pub total: usize,
    pub active: usize,
    pub renewal_due: usize,
    pub expired: usize,
    pub high_risk: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub total_pages: u32,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clause {
    pub title: String,
    pub summary: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractInsight {
    pub risk: RiskLevel,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceSnippet {
    pub source: String,
    pub snippet: String,
    pub relevance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDetail {
    #[serde(flatten)]
    pub contract: ContractRecord,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub clauses: Vec<Clause>,
    #[serde(default)]
    pub insights: Vec<ContractInsight>,
    #[serde(default)]
    pub evidence: Vec<EvidenceSnippet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub filename: String,
    pub content_type: String,
    #[serde(default)]
    pub expiry: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<ContractStatus>,
    #[serde(default)]
    pub risk: Option<RiskLevel>,
}

// The upload and ask endpoints keep the backend's snake_case field names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub doc_id: String,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub doc_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk_id: String,
    pub text: String,
    #[serde(default)]
    pub relevance: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    #[serde(default)]
    pub retrieved_chunks: Vec<RetrievedChunk>,
}
