//! Google Ads REST backend
//!
//! Talks to the keyword planning endpoints of the Google Ads API over its JSON
//! REST interface. Obtaining the OAuth access token is up to the caller; the
//! provider only attaches it.

use crate::{
    error::{PlannerError, PlannerResult},
    types::{
        HistoricalMetric, IdeaPage, IdeaRecord, IdeaRequest, KeywordMetrics, KeywordPlanService,
        MonthlyVolume, PlanOperation, PlanResponse, ProviderConfig, Targeting,
    },
    utils::http::{build_url, HttpClient},
};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::env;

/// Default REST endpoint, including the API version
pub const DEFAULT_BASE_URL: &str = "https://googleads.googleapis.com/v15";

/// Google Ads configuration
#[derive(Debug, Clone)]
pub struct GoogleAdsConfig {
    /// Developer token of the manager account
    pub developer_token: String,
    /// OAuth2 access token with the `adwords` scope
    pub access_token: String,
    /// Customer the plans are created under, digits only
    pub customer_id: String,
    /// Manager account to authenticate as, digits only
    pub login_customer_id: Option<String>,
    /// Base URL for the API, including the version segment
    pub base_url: String,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for GoogleAdsConfig {
    fn default() -> Self {
        Self {
            developer_token: String::new(),
            access_token: String::new(),
            customer_id: String::new(),
            login_customer_id: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl GoogleAdsConfig {
    /// Read the configuration from `GOOGLE_ADS_*` environment variables.
    ///
    /// `GOOGLE_ADS_DEVELOPER_TOKEN`, `GOOGLE_ADS_ACCESS_TOKEN` and
    /// `GOOGLE_ADS_CUSTOMER_ID` are required; `GOOGLE_ADS_LOGIN_CUSTOMER_ID`
    /// and `GOOGLE_ADS_BASE_URL` are optional.
    pub fn from_env() -> PlannerResult<Self> {
        let required = |name: &str| {
            env::var(name)
                .ok()
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| PlannerError::Config(format!("{name} is not set")))
        };

        let config = Self {
            developer_token: required("GOOGLE_ADS_DEVELOPER_TOKEN")?,
            access_token: required("GOOGLE_ADS_ACCESS_TOKEN")?,
            customer_id: normalize_customer_id(&required("GOOGLE_ADS_CUSTOMER_ID")?),
            login_customer_id: env::var("GOOGLE_ADS_LOGIN_CUSTOMER_ID")
                .ok()
                .map(|id| normalize_customer_id(&id))
                .filter(|id| !id.is_empty()),
            base_url: env::var("GOOGLE_ADS_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            ..Default::default()
        };

        config.validate()?;
        Ok(config)
    }
}

impl ProviderConfig for GoogleAdsConfig {
    fn validate(&self) -> PlannerResult<()> {
        if self.developer_token.is_empty() {
            return Err(PlannerError::Config(
                "Google Ads developer token is required".to_string(),
            ));
        }
        if self.access_token.is_empty() {
            return Err(PlannerError::Config(
                "Google Ads access token is required".to_string(),
            ));
        }
        if !is_customer_id(&self.customer_id) {
            return Err(PlannerError::Config(format!(
                "Invalid Google Ads customer id '{}': expected 10 digits",
                self.customer_id
            )));
        }
        if let Some(login) = &self.login_customer_id {
            if !is_customer_id(login) {
                return Err(PlannerError::Config(format!(
                    "Invalid Google Ads login customer id '{login}': expected 10 digits"
                )));
            }
        }
        Ok(())
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Strip the dashes from a `123-456-7890` style customer id
pub fn normalize_customer_id(id: &str) -> String {
    id.chars().filter(|c| !c.is_whitespace() && *c != '-').collect()
}

fn is_customer_id(id: &str) -> bool {
    id.len() == 10 && id.chars().all(|c| c.is_ascii_digit())
}

/// Google Ads REST keyword planning backend
#[derive(Debug)]
pub struct GoogleAdsProvider {
    config: GoogleAdsConfig,
    http_client: HttpClient,
}

impl GoogleAdsProvider {
    /// Create a new provider from a developer token, an access token and a customer id
    pub fn new(developer_token: &str, access_token: &str, customer_id: &str) -> PlannerResult<Self> {
        Self::with_config(GoogleAdsConfig {
            developer_token: developer_token.to_string(),
            access_token: access_token.to_string(),
            customer_id: customer_id.to_string(),
            ..Default::default()
        })
    }

    /// Create a new provider with custom configuration
    pub fn with_config(mut config: GoogleAdsConfig) -> PlannerResult<Self> {
        config.customer_id = normalize_customer_id(&config.customer_id);
        config.login_customer_id = config
            .login_customer_id
            .as_deref()
            .map(normalize_customer_id);
        config.validate()?;

        let http_client = HttpClient::with_timeout(config.timeout_ms)?;
        Ok(Self {
            config,
            http_client,
        })
    }

    /// Set custom base URL (for testing or proxies)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.to_string();
        self
    }

    fn headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", self.config.access_token),
        );
        headers.insert(
            "developer-token".to_string(),
            self.config.developer_token.clone(),
        );
        if let Some(login) = &self.config.login_customer_id {
            headers.insert("login-customer-id".to_string(), login.clone());
        }
        headers
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> PlannerResult<T>
    where
        B: Serialize + ?Sized,
        T: for<'de> Deserialize<'de>,
    {
        let url = build_url(&self.config.base_url, path)?;
        log::debug!("Google Ads request: POST {url}");
        self.http_client
            .post_json_with_headers(&url, body, &self.headers())
            .await
    }

    /// Run one `:mutate` call and return the resource names it produced
    async fn mutate(&self, resource: &str, operations: Vec<Value>) -> PlannerResult<Vec<String>> {
        let path = format!("customers/{}/{resource}:mutate", self.config.customer_id);
        let response: MutateResponse = self.post(&path, &json!({ "operations": operations })).await?;

        Ok(response
            .results
            .into_iter()
            .map(|result| result.resource_name)
            .collect())
    }
}

fn geo_target_constant(id: u64) -> String {
    format!("geoTargetConstants/{id}")
}

fn language_constant(id: u64) -> String {
    format!("languageConstants/{id}")
}

fn campaign_body(
    plan: &str,
    name: &str,
    cpc_bid_micros: i64,
    network: &impl ToString,
    targeting: &Targeting,
) -> Value {
    let mut campaign = json!({
        "name": name,
        "cpcBidMicros": cpc_bid_micros.to_string(),
        "keywordPlanNetwork": network.to_string(),
        "keywordPlan": plan,
    });

    if let Some(location) = targeting.location {
        campaign["geoTargets"] = json!([{ "geoTargetConstant": geo_target_constant(location) }]);
    }
    if let Some(language) = targeting.language {
        campaign["languageConstants"] = json!([language_constant(language)]);
    }

    campaign
}

#[async_trait::async_trait]
impl KeywordPlanService for GoogleAdsProvider {
    fn name(&self) -> &str {
        "google_ads"
    }

    async fn generate_keyword_ideas(
        &self,
        request: &IdeaRequest,
        page_token: Option<&str>,
    ) -> PlannerResult<IdeaPage> {
        let body = GenerateIdeasRequest {
            keyword_seed: KeywordSeed {
                keywords: &request.seed_keywords,
            },
            keyword_plan_network: request.network.to_string(),
            language: request.targeting.language.map(language_constant),
            geo_target_constants: request
                .targeting
                .location
                .map(geo_target_constant)
                .into_iter()
                .collect(),
            page_token,
        };

        let path = format!("customers/{}:generateKeywordIdeas", self.config.customer_id);
        let response: GenerateIdeasResponse = self.post(&path, &body).await?;

        let results = response
            .results
            .into_iter()
            .map(|idea| {
                Ok(IdeaRecord {
                    text: idea.text,
                    metrics: idea.keyword_idea_metrics.map(WireMetrics::into_metrics).transpose()?,
                })
            })
            .collect::<PlannerResult<Vec<_>>>()?;

        Ok(IdeaPage {
            results,
            next_page_token: response.next_page_token.filter(|token| !token.is_empty()),
        })
    }

    async fn submit(&self, operation: &PlanOperation) -> PlannerResult<PlanResponse> {
        log::debug!("Submitting {} to Google Ads", operation.kind());

        match operation {
            PlanOperation::CreatePlan { name, forecast } => {
                let op = json!({
                    "create": {
                        "name": name,
                        "forecastPeriod": { "dateInterval": forecast.to_string() },
                    }
                });
                Ok(PlanResponse::Created(self.mutate("keywordPlans", vec![op]).await?))
            }
            PlanOperation::CreateCampaign {
                plan,
                name,
                cpc_bid_micros,
                network,
                targeting,
            } => {
                let op = json!({
                    "create": campaign_body(plan, name, *cpc_bid_micros, network, targeting)
                });
                Ok(PlanResponse::Created(
                    self.mutate("keywordPlanCampaigns", vec![op]).await?,
                ))
            }
            PlanOperation::CreateAdGroup {
                campaign,
                name,
                cpc_bid_micros,
            } => {
                let op = json!({
                    "create": {
                        "name": name,
                        "cpcBidMicros": cpc_bid_micros.to_string(),
                        "keywordPlanCampaign": campaign,
                    }
                });
                Ok(PlanResponse::Created(
                    self.mutate("keywordPlanAdGroups", vec![op]).await?,
                ))
            }
            PlanOperation::CreateKeywords {
                ad_group,
                keywords,
                cpc_bid_micros,
                match_type,
            } => {
                let ops = keywords
                    .iter()
                    .map(|text| {
                        json!({
                            "create": {
                                "text": text,
                                "cpcBidMicros": cpc_bid_micros.to_string(),
                                "matchType": match_type.to_string(),
                                "keywordPlanAdGroup": ad_group,
                            }
                        })
                    })
                    .collect();
                Ok(PlanResponse::Created(
                    self.mutate("keywordPlanAdGroupKeywords", ops).await?,
                ))
            }
            PlanOperation::CreateNegatives {
                campaign,
                keywords,
                match_type,
            } => {
                let ops = keywords
                    .iter()
                    .map(|text| {
                        json!({
                            "create": {
                                "text": text,
                                "matchType": match_type.to_string(),
                                "negative": true,
                                "keywordPlanCampaign": campaign,
                            }
                        })
                    })
                    .collect();
                Ok(PlanResponse::Created(
                    self.mutate("keywordPlanCampaignKeywords", ops).await?,
                ))
            }
            PlanOperation::FetchMetrics {
                plan,
                include_average_cpc,
            } => {
                let body = json!({
                    "historicalMetricsOptions": { "includeAverageCpc": include_average_cpc }
                });
                let response: HistoricalMetricsResponse = self
                    .post(&format!("{plan}:generateHistoricalMetrics"), &body)
                    .await?;

                let rows = response
                    .metrics
                    .into_iter()
                    .map(|row| {
                        Ok(HistoricalMetric {
                            search_query: row.search_query,
                            metrics: row.keyword_metrics.map(WireMetrics::into_metrics).transpose()?,
                        })
                    })
                    .collect::<PlannerResult<Vec<_>>>()?;

                Ok(PlanResponse::Metrics(rows))
            }
            PlanOperation::DeletePlan { plan } => {
                let removed = self
                    .mutate("keywordPlans", vec![json!({ "remove": plan })])
                    .await?;
                Ok(PlanResponse::Removed(
                    removed.into_iter().next().unwrap_or_else(|| plan.clone()),
                ))
            }
        }
    }

    fn config(&self) -> HashMap<String, String> {
        let mut config = HashMap::new();
        config.insert("provider".to_string(), "google_ads".to_string());
        config.insert("developer_token".to_string(), "***".to_string());
        config.insert("access_token".to_string(), "***".to_string());
        config.insert("customer_id".to_string(), self.config.customer_id.clone());
        if let Some(login) = &self.config.login_customer_id {
            config.insert("login_customer_id".to_string(), login.clone());
        }
        config.insert("base_url".to_string(), self.config.base_url.clone());
        config
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateIdeasRequest<'a> {
    keyword_seed: KeywordSeed<'a>,
    keyword_plan_network: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    geo_target_constants: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct KeywordSeed<'a> {
    keywords: &'a [String],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateIdeasResponse {
    #[serde(default)]
    results: Vec<WireIdea>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireIdea {
    #[serde(default)]
    text: String,
    #[serde(default)]
    keyword_idea_metrics: Option<WireMetrics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoricalMetricsResponse {
    #[serde(default)]
    metrics: Vec<WireHistoricalRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireHistoricalRow {
    #[serde(default)]
    search_query: String,
    #[serde(default)]
    keyword_metrics: Option<WireMetrics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMetrics {
    #[serde(default, deserialize_with = "int64")]
    avg_monthly_searches: i64,
    #[serde(default, deserialize_with = "int64")]
    average_cpc_micros: i64,
    #[serde(default)]
    competition: Option<EnumRepr>,
    #[serde(default)]
    monthly_search_volumes: Vec<WireMonthlyVolume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMonthlyVolume {
    #[serde(default)]
    month: Option<EnumRepr>,
    #[serde(default, deserialize_with = "int64")]
    year: i64,
    #[serde(default, deserialize_with = "int64")]
    monthly_searches: i64,
}

#[derive(Debug, Deserialize)]
struct MutateResponse {
    #[serde(default)]
    results: Vec<MutateResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MutateResult {
    #[serde(default)]
    resource_name: String,
}

/// Proto enums arrive by name, or by number when the caller asked for that
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum EnumRepr {
    Number(i32),
    Name(String),
}

/// Proto3 JSON renders int64 as a string; accept numbers and null too
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Int64Repr {
    Number(i64),
    Text(String),
}

fn int64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Int64Repr>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Int64Repr::Number(n)) => Ok(n),
        Some(Int64Repr::Text(text)) => text.parse().map_err(de::Error::custom),
    }
}

/// `KeywordPlanCompetitionLevel` code for a wire value
fn competition_code(value: &EnumRepr) -> i32 {
    match value {
        EnumRepr::Number(code) => *code,
        EnumRepr::Name(name) => match name.as_str() {
            "UNSPECIFIED" => 0,
            "LOW" => 2,
            "MEDIUM" => 3,
            "HIGH" => 4,
            _ => 1,
        },
    }
}

/// Calendar month (1-12) for a `MonthOfYear` wire value
fn month_number(value: &EnumRepr) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "JANUARY",
        "FEBRUARY",
        "MARCH",
        "APRIL",
        "MAY",
        "JUNE",
        "JULY",
        "AUGUST",
        "SEPTEMBER",
        "OCTOBER",
        "NOVEMBER",
        "DECEMBER",
    ];

    match value {
        // MonthOfYear numbers January as 2
        EnumRepr::Number(code @ 2..=13) => Some((*code - 1) as u32),
        EnumRepr::Number(_) => None,
        EnumRepr::Name(name) => MONTHS
            .iter()
            .position(|month| *month == name.as_str())
            .map(|index| index as u32 + 1),
    }
}

impl WireMetrics {
    fn into_metrics(self) -> PlannerResult<KeywordMetrics> {
        let mut monthly_search_volumes = Vec::with_capacity(self.monthly_search_volumes.len());

        for entry in self.monthly_search_volumes {
            let Some(month) = entry.month.as_ref().and_then(month_number) else {
                log::debug!("Skipping monthly volume without a calendar month: {entry:?}");
                continue;
            };
            let year = i32::try_from(entry.year)
                .map_err(|_| PlannerError::Parse(format!("Year out of range: {}", entry.year)))?;

            monthly_search_volumes.push(MonthlyVolume {
                year,
                month,
                count: entry.monthly_searches,
            });
        }

        Ok(KeywordMetrics {
            avg_monthly_searches: self.avg_monthly_searches,
            average_cpc_micros: self.average_cpc_micros,
            competition_code: self.competition.as_ref().map(competition_code).unwrap_or(0),
            monthly_search_volumes,
        })
    }
}
