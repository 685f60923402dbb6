//! Core types and traits for the keyword planner

use crate::error::PlannerResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One keyword with its volume, cost and competition figures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordResult {
    /// The keyword text as returned by the service, or as requested for placeholders
    pub keyword: String,
    /// Average monthly searches
    pub search_volume: Option<i64>,
    /// Average cost per click in micros of the account currency
    pub cpc: Option<i64>,
    /// Competition level, or the raw service code when it has no label
    pub competition: Option<Competition>,
    /// Monthly search volumes in the order the service returned them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_history: Option<Vec<MonthlyVolume>>,
}

impl KeywordResult {
    /// Placeholder for a keyword the service did not report on
    pub fn placeholder(keyword: &str, null_to_zero: bool, with_monthly_history: bool) -> Self {
        let zero = null_to_zero.then_some(0);
        Self {
            keyword: keyword.to_string(),
            search_volume: zero,
            cpc: zero,
            competition: null_to_zero.then_some(Competition::Code(0)),
            monthly_history: if with_monthly_history && null_to_zero {
                Some(Vec::new())
            } else {
                None
            },
        }
    }
}

/// Search volume for a single calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyVolume {
    pub year: i32,
    /// 1 = January, 12 = December
    pub month: u32,
    pub count: i64,
}

/// Labelled competition levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompetitionLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for CompetitionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompetitionLevel::Low => write!(f, "Low"),
            CompetitionLevel::Medium => write!(f, "Medium"),
            CompetitionLevel::High => write!(f, "High"),
        }
    }
}

/// Competition as reported for a keyword.
///
/// Serializes as `"Low"`/`"Medium"`/`"High"` or as the bare numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Competition {
    Level(CompetitionLevel),
    Code(i32),
}

impl Competition {
    /// Translate a service competition code: 2, 3 and 4 become Low, Medium
    /// and High; any other code is kept as is.
    pub fn from_code(code: i32) -> Self {
        match code {
            2 => Competition::Level(CompetitionLevel::Low),
            3 => Competition::Level(CompetitionLevel::Medium),
            4 => Competition::Level(CompetitionLevel::High),
            other => Competition::Code(other),
        }
    }
}

impl fmt::Display for Competition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Competition::Level(level) => write!(f, "{level}"),
            Competition::Code(code) => write!(f, "{code}"),
        }
    }
}

/// Debug options for planner calls
#[derive(Debug, Clone, Default)]
pub struct DebugOptions {
    /// Enable verbose logging
    pub enabled: bool,
    /// Log outgoing operations
    pub log_requests: bool,
    /// Log response summaries
    pub log_responses: bool,
}

/// Which networks a plan or idea query covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeywordPlanNetwork {
    GoogleSearch,
    GoogleSearchAndPartners,
}

impl fmt::Display for KeywordPlanNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeywordPlanNetwork::GoogleSearch => write!(f, "GOOGLE_SEARCH"),
            KeywordPlanNetwork::GoogleSearchAndPartners => write!(f, "GOOGLE_SEARCH_AND_PARTNERS"),
        }
    }
}

/// Keyword match types used when populating a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchType {
    Exact,
    Phrase,
    Broad,
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchType::Exact => write!(f, "EXACT"),
            MatchType::Phrase => write!(f, "PHRASE"),
            MatchType::Broad => write!(f, "BROAD"),
        }
    }
}

/// Forecast window of a keyword plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForecastInterval {
    NextWeek,
    NextMonth,
    NextQuarter,
}

impl fmt::Display for ForecastInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForecastInterval::NextWeek => write!(f, "NEXT_WEEK"),
            ForecastInterval::NextMonth => write!(f, "NEXT_MONTH"),
            ForecastInterval::NextQuarter => write!(f, "NEXT_QUARTER"),
        }
    }
}

/// Language and location restriction, as numeric criterion ids
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Targeting {
    pub language: Option<u64>,
    pub location: Option<u64>,
}

/// Metrics attached to an idea or a historical metrics row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordMetrics {
    pub avg_monthly_searches: i64,
    pub average_cpc_micros: i64,
    pub competition_code: i32,
    pub monthly_search_volumes: Vec<MonthlyVolume>,
}

/// A single keyword idea as returned by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeaRecord {
    pub text: String,
    pub metrics: Option<KeywordMetrics>,
}

/// A historical metrics row, keyed by the search query text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoricalMetric {
    pub search_query: String,
    pub metrics: Option<KeywordMetrics>,
}

/// A "generate keyword ideas" query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeaRequest {
    pub seed_keywords: Vec<String>,
    pub targeting: Targeting,
    pub network: KeywordPlanNetwork,
}

/// One page of keyword ideas
#[derive(Debug, Clone, Default)]
pub struct IdeaPage {
    pub results: Vec<IdeaRecord>,
    /// Present when more pages follow
    pub next_page_token: Option<String>,
}

/// Mutations and queries against the keyword plan resource model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOperation {
    CreatePlan {
        name: String,
        forecast: ForecastInterval,
    },
    CreateCampaign {
        plan: String,
        name: String,
        cpc_bid_micros: i64,
        network: KeywordPlanNetwork,
        targeting: Targeting,
    },
    CreateAdGroup {
        campaign: String,
        name: String,
        cpc_bid_micros: i64,
    },
    CreateKeywords {
        ad_group: String,
        keywords: Vec<String>,
        cpc_bid_micros: i64,
        match_type: MatchType,
    },
    CreateNegatives {
        campaign: String,
        keywords: Vec<String>,
        match_type: MatchType,
    },
    FetchMetrics {
        plan: String,
        include_average_cpc: bool,
    },
    DeletePlan {
        plan: String,
    },
}

impl PlanOperation {
    /// Short name used in logs and error messages
    pub fn kind(&self) -> &'static str {
        match self {
            PlanOperation::CreatePlan { .. } => "create_plan",
            PlanOperation::CreateCampaign { .. } => "create_campaign",
            PlanOperation::CreateAdGroup { .. } => "create_ad_group",
            PlanOperation::CreateKeywords { .. } => "create_keywords",
            PlanOperation::CreateNegatives { .. } => "create_negatives",
            PlanOperation::FetchMetrics { .. } => "fetch_metrics",
            PlanOperation::DeletePlan { .. } => "delete_plan",
        }
    }
}

/// What the service returns for a [`PlanOperation`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanResponse {
    /// Resource names of created entities, in operation order
    Created(Vec<String>),
    /// Historical metrics rows
    Metrics(Vec<HistoricalMetric>),
    /// Resource name of the removed entity
    Removed(String),
}

/// Trait that keyword planning backends must satisfy
#[async_trait::async_trait]
pub trait KeywordPlanService: Send + Sync + std::fmt::Debug {
    /// Name of the backend
    fn name(&self) -> &str;

    /// Fetch one page of keyword ideas
    async fn generate_keyword_ideas(
        &self,
        request: &IdeaRequest,
        page_token: Option<&str>,
    ) -> PlannerResult<IdeaPage>;

    /// Submit a keyword plan operation
    async fn submit(&self, operation: &PlanOperation) -> PlannerResult<PlanResponse>;

    /// Backend configuration with secrets masked (for debugging/logging)
    fn config(&self) -> HashMap<String, String> {
        HashMap::new()
    }
}

/// Provider configuration trait for consistent configuration patterns
pub trait ProviderConfig {
    /// Validate the configuration
    fn validate(&self) -> PlannerResult<()>;

    /// Get the base URL for API requests
    fn base_url(&self) -> &str;
}
