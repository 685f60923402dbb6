//! Keyword idea retrieval and the shared row mapping

use crate::{
    error::{PlannerError, PlannerResult},
    query::KeywordQuery,
    types::{
        Competition, IdeaRecord, IdeaRequest, KeywordMetrics, KeywordPlanNetwork,
        KeywordPlanService, KeywordResult,
    },
    utils::debug,
};
use futures::{stream, Stream, TryStreamExt};

/// Map one service row onto a [`KeywordResult`].
///
/// Rows without metrics report 0 for volume, CPC and competition. Monthly
/// history is attached only when requested and when metrics are present, in
/// the order the service returned it. With `translate_competition` the
/// competition code goes through [`Competition::from_code`]; without it the
/// raw code is kept.
pub fn extract_keyword(
    text: &str,
    metrics: Option<&KeywordMetrics>,
    with_monthly_history: bool,
    translate_competition: bool,
) -> KeywordResult {
    let Some(metrics) = metrics else {
        return KeywordResult {
            keyword: text.to_string(),
            search_volume: Some(0),
            cpc: Some(0),
            competition: Some(Competition::Code(0)),
            monthly_history: None,
        };
    };

    let competition = if translate_competition {
        Competition::from_code(metrics.competition_code)
    } else {
        Competition::Code(metrics.competition_code)
    };

    KeywordResult {
        keyword: text.to_string(),
        search_volume: Some(metrics.avg_monthly_searches),
        cpc: Some(metrics.average_cpc_micros),
        competition: Some(competition),
        monthly_history: with_monthly_history.then(|| metrics.monthly_search_volumes.clone()),
    }
}

enum PageState {
    First,
    Next(String),
    Done,
}

async fn next_page(
    service: &dyn KeywordPlanService,
    request: &IdeaRequest,
    state: PageState,
) -> PlannerResult<Option<(Vec<IdeaRecord>, PageState)>> {
    let token = match state {
        PageState::First => None,
        PageState::Next(token) => Some(token),
        PageState::Done => return Ok(None),
    };

    let page = service
        .generate_keyword_ideas(request, token.as_deref())
        .await?;

    let next = match page.next_page_token {
        Some(token) if !token.is_empty() => PageState::Next(token),
        _ => PageState::Done,
    };

    Ok(Some((page.results, next)))
}

/// Lazily walk every page of an idea query.
///
/// Pages are requested one at a time as the stream is polled; the first
/// failing page ends the stream with that error.
pub fn idea_stream<'a>(
    service: &'a dyn KeywordPlanService,
    request: &'a IdeaRequest,
) -> impl Stream<Item = PlannerResult<IdeaRecord>> + Send + 'a {
    stream::try_unfold(PageState::First, move |state| {
        next_page(service, request, state)
    })
    .map_ok(|records| stream::iter(records.into_iter().map(Ok::<IdeaRecord, PlannerError>)))
    .try_flatten()
}

/// Whether `text` contains every word of `term` (broad-match negative)
fn matches_negative(text: &str, term: &str) -> bool {
    let words: Vec<&str> = text.split_whitespace().collect();
    term.split_whitespace().all(|needle| words.contains(&needle))
}

/// Runs "generate keyword ideas" queries
#[derive(Debug)]
pub struct KeywordIdeaFetcher<'a> {
    service: &'a dyn KeywordPlanService,
}

impl<'a> KeywordIdeaFetcher<'a> {
    pub fn new(service: &'a dyn KeywordPlanService) -> Self {
        Self { service }
    }

    /// Fetch all ideas for the query's keywords as seeds.
    ///
    /// Ideas matching an excluded term are dropped. Errors from the service
    /// are returned as they are.
    pub async fn fetch(&self, query: &KeywordQuery) -> PlannerResult<Vec<KeywordResult>> {
        if query.keywords.is_empty() {
            return Ok(Vec::new());
        }

        let request = IdeaRequest {
            seed_keywords: query.keywords.clone(),
            targeting: query.targeting,
            network: KeywordPlanNetwork::GoogleSearchAndPartners,
        };

        debug::log_request(
            &query.debug,
            "Keyword ideas request",
            &format!(
                "backend: {}, seeds: {}",
                self.service.name(),
                request.seed_keywords.join(", ")
            ),
        );

        let records: Vec<IdeaRecord> = idea_stream(self.service, &request).try_collect().await?;
        let total = records.len();

        let results: Vec<KeywordResult> = records
            .iter()
            .filter(|record| {
                let text = record.text.to_lowercase();
                !query
                    .exclude
                    .iter()
                    .any(|term| matches_negative(&text, term))
            })
            .map(|record| {
                extract_keyword(
                    &record.text,
                    record.metrics.as_ref(),
                    query.with_monthly_history,
                    false,
                )
            })
            .collect();

        debug::log_response(
            &query.debug,
            &format!(
                "Received {total} keyword ideas, {} after exclusions",
                results.len()
            ),
        );

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryOptions;
    use crate::types::{IdeaPage, MonthlyVolume, PlanOperation, PlanResponse};
    use std::sync::{Arc, Mutex};

    #[derive(Debug)]
    struct PagedService {
        pages: Vec<IdeaPage>,
        requested_tokens: Arc<Mutex<Vec<Option<String>>>>,
        seeds: Arc<Mutex<Vec<String>>>,
    }

    impl PagedService {
        fn new(pages: Vec<IdeaPage>) -> Self {
            Self {
                pages,
                requested_tokens: Arc::new(Mutex::new(Vec::new())),
                seeds: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait::async_trait]
    impl KeywordPlanService for PagedService {
        fn name(&self) -> &str {
            "paged"
        }

        async fn generate_keyword_ideas(
            &self,
            request: &IdeaRequest,
            page_token: Option<&str>,
        ) -> PlannerResult<IdeaPage> {
            self.requested_tokens
                .lock()
                .unwrap()
                .push(page_token.map(str::to_string));
            *self.seeds.lock().unwrap() = request.seed_keywords.clone();

            let index: usize = match page_token {
                None => 0,
                Some(token) => token.trim_start_matches("page-").parse().unwrap(),
            };
            self.pages
                .get(index)
                .cloned()
                .ok_or_else(|| PlannerError::RemoteApi {
                    message: format!("no page {index}"),
                    status_code: Some(400),
                    payload: None,
                })
        }

        async fn submit(&self, operation: &PlanOperation) -> PlannerResult<PlanResponse> {
            Err(PlannerError::UnexpectedResponse(format!(
                "{} not supported",
                operation.kind()
            )))
        }
    }

    fn idea(text: &str, volume: i64, competition_code: i32) -> IdeaRecord {
        IdeaRecord {
            text: text.to_string(),
            metrics: Some(KeywordMetrics {
                avg_monthly_searches: volume,
                average_cpc_micros: 1_500_000,
                competition_code,
                monthly_search_volumes: vec![
                    MonthlyVolume {
                        year: 2024,
                        month: 12,
                        count: volume,
                    },
                    MonthlyVolume {
                        year: 2024,
                        month: 11,
                        count: volume / 2,
                    },
                ],
            }),
        }
    }

    #[test]
    fn test_extract_without_metrics_defaults_to_zero() {
        let result = extract_keyword("bare", None, true, true);
        assert_eq!(result.search_volume, Some(0));
        assert_eq!(result.cpc, Some(0));
        assert_eq!(result.competition, Some(Competition::Code(0)));
        assert_eq!(result.monthly_history, None);
    }

    #[test]
    fn test_extract_keeps_history_order_and_raw_code() {
        let record = idea("shoes", 5000, 3);
        let result = extract_keyword("shoes", record.metrics.as_ref(), true, false);

        assert_eq!(result.search_volume, Some(5000));
        assert_eq!(result.cpc, Some(1_500_000));
        assert_eq!(result.competition, Some(Competition::Code(3)));
        let history = result.monthly_history.unwrap();
        assert_eq!(history[0].month, 12);
        assert_eq!(history[1].month, 11);

        let translated = extract_keyword("shoes", record.metrics.as_ref(), false, true);
        assert_eq!(translated.competition, Some(Competition::from_code(3)));
        assert_eq!(translated.monthly_history, None);
    }

    #[tokio::test]
    async fn test_fetch_drains_every_page() {
        let service = PagedService::new(vec![
            IdeaPage {
                results: vec![idea("running shoes", 100, 2), idea("trail shoes", 50, 4)],
                next_page_token: Some("page-1".to_string()),
            },
            IdeaPage {
                results: vec![idea("shoe store", 10, 3)],
                next_page_token: Some("page-2".to_string()),
            },
            IdeaPage {
                results: vec![IdeaRecord {
                    text: "shoe laces".to_string(),
                    metrics: None,
                }],
                next_page_token: Some(String::new()),
            },
        ]);

        let query = KeywordQuery::new(["Shoes"], &QueryOptions::new().with_monthly_history());
        let results = KeywordIdeaFetcher::new(&service).fetch(&query).await.unwrap();

        let keywords: Vec<&str> = results.iter().map(|r| r.keyword.as_str()).collect();
        assert_eq!(
            keywords,
            vec!["running shoes", "trail shoes", "shoe store", "shoe laces"]
        );
        assert_eq!(
            *service.requested_tokens.lock().unwrap(),
            vec![None, Some("page-1".to_string()), Some("page-2".to_string())]
        );
        assert!(results[0].monthly_history.is_some());
        assert_eq!(results[3].monthly_history, None);
    }

    #[tokio::test]
    async fn test_fetch_propagates_page_error() {
        let service = PagedService::new(vec![IdeaPage {
            results: vec![idea("a", 1, 2)],
            next_page_token: Some("page-5".to_string()),
        }]);

        let query = KeywordQuery::new(["a"], &QueryOptions::new());
        let error = KeywordIdeaFetcher::new(&service)
            .fetch(&query)
            .await
            .unwrap_err();

        assert!(matches!(error, PlannerError::RemoteApi { .. }));
    }

    #[tokio::test]
    async fn test_fetch_applies_exclusions_and_includes() {
        let service = PagedService::new(vec![IdeaPage {
            results: vec![
                idea("free running shoes", 10, 2),
                idea("running shoes", 20, 2),
                idea("Shoes Free Shipping", 30, 2),
                idea("freestyle shoes", 40, 2),
            ],
            next_page_token: None,
        }]);

        let options = QueryOptions::new().include(["sneakers"]).exclude(["free"]);
        let query = KeywordQuery::new(["shoes"], &options);
        let results = KeywordIdeaFetcher::new(&service).fetch(&query).await.unwrap();

        let keywords: Vec<&str> = results.iter().map(|r| r.keyword.as_str()).collect();
        assert_eq!(keywords, vec!["running shoes", "freestyle shoes"]);
        assert_eq!(*service.seeds.lock().unwrap(), vec!["shoes", "sneakers"]);
    }

    #[tokio::test]
    async fn test_fetch_without_seeds_skips_the_call() {
        let service = PagedService::new(Vec::new());
        let query = KeywordQuery::new(["  "], &QueryOptions::new());
        let results = KeywordIdeaFetcher::new(&service).fetch(&query).await.unwrap();

        assert!(results.is_empty());
        assert!(service.requested_tokens.lock().unwrap().is_empty());
    }

    #[test]
    fn test_matches_negative_requires_every_word() {
        assert!(matches_negative("cheap red shoes", "red cheap"));
        assert!(!matches_negative("cheap shoes", "red cheap"));
        assert!(!matches_negative("freestyle", "free"));
    }
}
