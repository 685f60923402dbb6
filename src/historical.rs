//! Historical search volumes through an ephemeral keyword plan
//!
//! The service only reports historical metrics for keywords that live in a
//! keyword plan, so every run builds one (plan, campaign, ad group, keywords,
//! optional negatives), asks for its metrics and deletes the plan again.
//! Deleting the plan removes everything created under it.
//!
//! The plan is held by a [`PlanScope`] from the moment it exists. Every exit
//! path goes through [`PlanScope::release`], which issues the delete and then
//! decides which error, if any, reaches the caller:
//!
//! | run      | delete | caller sees                                   |
//! |----------|--------|-----------------------------------------------|
//! | ok       | ok     | the rows                                      |
//! | error    | ok     | the run error, unchanged                      |
//! | ok       | error  | `ResourceLeak { primary: None }`              |
//! | error    | error  | `ResourceLeak { primary: Some(run error) }`   |

use crate::{
    error::{PlannerError, PlannerResult},
    ideas::extract_keyword,
    query::KeywordQuery,
    types::{
        ForecastInterval, KeywordPlanNetwork, KeywordPlanService, KeywordResult, MatchType,
        PlanOperation, PlanResponse,
    },
    utils::debug,
};
use chrono::Utc;

/// Max CPC bid of the plan campaign
pub const CAMPAIGN_BID_MICROS: i64 = 1_000_000;
/// Max CPC bid of the plan ad group
pub const AD_GROUP_BID_MICROS: i64 = 2_500_000;
/// Max CPC bid of each plan keyword
pub const KEYWORD_BID_MICROS: i64 = 2_000_000;

/// Handles of the entities created for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanResources {
    pub plan: String,
    pub campaign: String,
    pub ad_group: String,
}

fn resource_name(prefix: &str) -> String {
    format!("{prefix} #{}", Utc::now().format("%Y%m%d%H%M%S%.6f"))
}

/// Pull the first resource name out of a create response
fn created_handle(operation: &PlanOperation, response: PlanResponse) -> PlannerResult<String> {
    match response {
        PlanResponse::Created(names) => names.into_iter().next().ok_or_else(|| {
            PlannerError::UnexpectedResponse(format!(
                "{} returned no resource name",
                operation.kind()
            ))
        }),
        other => Err(PlannerError::UnexpectedResponse(format!(
            "{} returned {other:?}",
            operation.kind()
        ))),
    }
}

/// A keyword plan that must be deleted before the run ends.
///
/// Dropping the scope without calling [`PlanScope::release`] (for instance
/// when the surrounding future is cancelled) cannot delete the plan, so it
/// logs the leaked resource name instead.
pub struct PlanScope<'a> {
    service: &'a dyn KeywordPlanService,
    plan: String,
    released: bool,
}

impl<'a> PlanScope<'a> {
    /// Create the plan. Nothing needs cleaning up if this fails.
    pub async fn acquire(service: &'a dyn KeywordPlanService, name: String) -> PlannerResult<Self> {
        let operation = PlanOperation::CreatePlan {
            name,
            forecast: ForecastInterval::NextQuarter,
        };
        let response = service.submit(&operation).await?;
        let plan = created_handle(&operation, response)?;
        log::debug!("Created keyword plan {plan}");

        Ok(Self {
            service,
            plan,
            released: false,
        })
    }

    pub fn handle(&self) -> &str {
        &self.plan
    }

    /// Delete the plan and fold the deletion result into `outcome`
    pub async fn release<T>(mut self, outcome: PlannerResult<T>) -> PlannerResult<T> {
        self.released = true;
        let plan = std::mem::take(&mut self.plan);

        let cleanup = self
            .service
            .submit(&PlanOperation::DeletePlan { plan: plan.clone() })
            .await;

        match (outcome, cleanup) {
            (outcome, Ok(_)) => {
                log::debug!("Deleted keyword plan {plan}");
                outcome
            }
            (Ok(_), Err(cleanup)) => {
                log::error!("Keyword plan {plan} could not be deleted: {cleanup}");
                Err(PlannerError::ResourceLeak {
                    plan,
                    cleanup: Box::new(cleanup),
                    primary: None,
                })
            }
            (Err(primary), Err(cleanup)) => {
                log::error!(
                    "Keyword plan {plan} could not be deleted after a failed run ({primary}): {cleanup}"
                );
                Err(PlannerError::ResourceLeak {
                    plan,
                    cleanup: Box::new(cleanup),
                    primary: Some(Box::new(primary)),
                })
            }
        }
    }
}

impl Drop for PlanScope<'_> {
    fn drop(&mut self) {
        if !self.released {
            log::error!(
                "Keyword plan {} dropped without being deleted; it is left on the remote account",
                self.plan
            );
        }
    }
}

/// Runs the create, populate, query, delete sequence for one keyword batch
#[derive(Debug)]
pub struct HistoricalVolumeOrchestrator<'a> {
    service: &'a dyn KeywordPlanService,
}

impl<'a> HistoricalVolumeOrchestrator<'a> {
    pub fn new(service: &'a dyn KeywordPlanService) -> Self {
        Self { service }
    }

    /// Historical metrics for `keywords`, one row per keyword the service knows.
    ///
    /// Targeting, exclusions and the monthly history flag come from `query`.
    /// Keywords the service has no data for are simply absent from the result.
    pub async fn run(
        &self,
        keywords: &[String],
        query: &KeywordQuery,
    ) -> PlannerResult<Vec<KeywordResult>> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let scope =
            PlanScope::acquire(self.service, resource_name("Keyword plan for traffic estimate"))
                .await?;
        let outcome = self.populate_and_fetch(scope.handle(), keywords, query).await;

        scope.release(outcome).await
    }

    async fn create(&self, operation: PlanOperation) -> PlannerResult<String> {
        let response = self.service.submit(&operation).await?;
        created_handle(&operation, response)
    }

    async fn populate_and_fetch(
        &self,
        plan: &str,
        keywords: &[String],
        query: &KeywordQuery,
    ) -> PlannerResult<Vec<KeywordResult>> {
        let campaign = self
            .create(PlanOperation::CreateCampaign {
                plan: plan.to_string(),
                name: resource_name("Keyword plan campaign"),
                cpc_bid_micros: CAMPAIGN_BID_MICROS,
                network: KeywordPlanNetwork::GoogleSearch,
                targeting: query.targeting,
            })
            .await?;

        let ad_group = self
            .create(PlanOperation::CreateAdGroup {
                campaign: campaign.clone(),
                name: resource_name("Keyword plan ad group"),
                cpc_bid_micros: AD_GROUP_BID_MICROS,
            })
            .await?;

        let resources = PlanResources {
            plan: plan.to_string(),
            campaign,
            ad_group,
        };
        debug::log(&query.debug, "Keyword plan resources", &format!("{resources:?}"));

        self.create(PlanOperation::CreateKeywords {
            ad_group: resources.ad_group.clone(),
            keywords: keywords.to_vec(),
            cpc_bid_micros: KEYWORD_BID_MICROS,
            match_type: MatchType::Broad,
        })
        .await?;

        if !query.exclude.is_empty() {
            self.create(PlanOperation::CreateNegatives {
                campaign: resources.campaign.clone(),
                keywords: query.exclude.clone(),
                match_type: MatchType::Broad,
            })
            .await?;
        }

        let fetch = PlanOperation::FetchMetrics {
            plan: resources.plan.clone(),
            include_average_cpc: true,
        };
        debug::log_request(&query.debug, "Historical metrics request", &resources.plan);

        let rows = match self.service.submit(&fetch).await? {
            PlanResponse::Metrics(rows) => rows,
            other => {
                return Err(PlannerError::UnexpectedResponse(format!(
                    "{} returned {other:?}",
                    fetch.kind()
                )))
            }
        };

        debug::log_response(
            &query.debug,
            &format!(
                "Historical metrics returned {} rows for {} keywords",
                rows.len(),
                keywords.len()
            ),
        );

        Ok(rows
            .iter()
            .map(|row| {
                extract_keyword(
                    &row.search_query,
                    row.metrics.as_ref(),
                    query.with_monthly_history,
                    true,
                )
            })
            .collect())
    }
}
