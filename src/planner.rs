//! The planner entry point: search volumes and keyword ideas

use crate::{
    error::{PlannerError, PlannerResult},
    historical::HistoricalVolumeOrchestrator,
    ideas::KeywordIdeaFetcher,
    query::{KeywordQuery, QueryOptions},
    reconcile::reconcile,
    types::{KeywordPlanService, KeywordResult},
    utils::{
        debug,
        keywords::{chunk_keywords, CHUNK_SIZE},
    },
};

/// Keyword planner over one backend.
///
/// The planner holds no per-call state: options are passed to each call and
/// frozen into a [`KeywordQuery`] before any request goes out, so one planner
/// can serve several callers.
#[derive(Debug)]
pub struct KeywordPlanner {
    service: Box<dyn KeywordPlanService>,
}

impl KeywordPlanner {
    pub fn new(service: Box<dyn KeywordPlanService>) -> Self {
        Self { service }
    }

    /// The backend this planner talks to
    pub fn service(&self) -> &dyn KeywordPlanService {
        self.service.as_ref()
    }

    /// Search volume, CPC and competition for each keyword.
    ///
    /// Keywords are normalized, include terms appended, and the list is sent
    /// in chunks of [`CHUNK_SIZE`], one keyword plan per chunk. Rows from all
    /// chunks are kept. Every requested keyword appears exactly once in the
    /// result; keywords the service did not report on get placeholder rows
    /// according to `options.null_to_zero`.
    pub async fn search_volumes<I, S>(
        &self,
        keywords: I,
        options: &QueryOptions,
    ) -> PlannerResult<Vec<KeywordResult>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let query = KeywordQuery::new(keywords, options);
        let chunks = chunk_keywords(&query.keywords, CHUNK_SIZE);

        debug::log(
            &query.debug,
            "Performing search volume query",
            &format!(
                "backend: {}, keywords: {}, chunks: {}",
                self.service.name(),
                query.keywords.len(),
                chunks.len()
            ),
        );

        let orchestrator = HistoricalVolumeOrchestrator::new(self.service.as_ref());
        let mut obtained = Vec::with_capacity(query.keywords.len());

        for (index, chunk) in chunks.into_iter().enumerate() {
            debug::log(
                &query.debug,
                "Search volume chunk",
                &format!("{}: {} keywords", index + 1, chunk.len()),
            );

            let rows = orchestrator
                .run(chunk, &query)
                .await
                .map_err(|error| self.report(error))?;
            obtained.extend(rows);
        }

        let results = reconcile(
            &query.keywords,
            obtained,
            query.null_to_zero,
            query.with_monthly_history,
        );

        debug::log_response(&query.debug, &format!("Returning {} keywords", results.len()));
        Ok(results)
    }

    /// Related keyword ideas for one or more seed keywords.
    ///
    /// Seeds are normalized and include terms appended; ideas matching an
    /// exclude term are dropped. All result pages are collected.
    pub async fn keyword_ideas<I, S>(
        &self,
        seeds: I,
        options: &QueryOptions,
    ) -> PlannerResult<Vec<KeywordResult>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let query = KeywordQuery::new(seeds, options);

        debug::log(
            &query.debug,
            "Performing keyword ideas query",
            &format!("backend: {}, seeds: {}", self.service.name(), query.keywords.len()),
        );

        KeywordIdeaFetcher::new(self.service.as_ref())
            .fetch(&query)
            .await
            .map_err(|error| self.report(error))
    }

    /// Log a hint for `error` and hand it back unchanged
    fn report(&self, error: PlannerError) -> PlannerError {
        log::warn!(
            "Keyword planner call with backend '{}' failed: {error}. {}",
            self.service.name(),
            troubleshooting_hint(&error)
        );
        error
    }
}

/// Troubleshooting advice for an error
fn troubleshooting_hint(error: &PlannerError) -> &'static str {
    match error.primary() {
        _ if error.is_leak() => {
            "A keyword plan was left on the account. Remove it in the Google Ads UI or retry the delete with the plan resource name from the error."
        }
        PlannerError::Transport {
            status_code: Some(401 | 403),
            ..
        } => {
            "This is likely an authentication issue. Check that the access token is fresh and that the developer token is approved for this account."
        }
        PlannerError::Transport { .. } => {
            "The API could not be reached. Check network connectivity and try again."
        }
        PlannerError::RemoteApi {
            status_code: Some(429),
            ..
        } => "The API quota is exhausted. Reduce request frequency or wait for the quota to reset.",
        PlannerError::RemoteApi {
            status_code: Some(400),
            ..
        } => "The request was rejected. Check the language and location criterion ids and the customer id.",
        PlannerError::RemoteApi {
            status_code: Some(500..=599),
            ..
        } => "Google Ads is experiencing server issues. Try again later.",
        PlannerError::Config(_) => "Check the Google Ads configuration values.",
        _ => "Check your Google Ads credentials and make sure the request is valid.",
    }
}
