//! # Keyword Planner
//!
//! Search volumes, cost-per-click, competition and keyword ideas from the
//! Google Ads keyword planning API, reshaped into one uniform result model.
//!
//! Two calls are offered by [`KeywordPlanner`]:
//!
//! * [`KeywordPlanner::search_volumes`] builds a short-lived keyword plan per
//!   batch of keywords, reads its historical metrics and deletes it again.
//!   Every requested keyword comes back exactly once, with placeholder rows
//!   for keywords the API has no data for.
//! * [`KeywordPlanner::keyword_ideas`] asks for related keywords to one or more
//!   seeds and collects every result page.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use keyword_planner::{providers::GoogleAdsProvider, KeywordPlanner, QueryOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = GoogleAdsProvider::new("DEVELOPER_TOKEN", "ACCESS_TOKEN", "123-456-7890")?;
//!     let planner = KeywordPlanner::new(Box::new(provider));
//!
//!     let options = QueryOptions::new()
//!         .language(1000)
//!         .location(2840)
//!         .convert_null_to_zero();
//!
//!     for keyword in planner.search_volumes(["rust", "Rust lang"], &options).await? {
//!         println!("{}: {:?}", keyword.keyword, keyword.search_volume);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Concurrency
//!
//! Calls run their remote requests one after another and never in parallel.
//! A [`KeywordPlanner`] keeps no per-call state, so sharing it is safe;
//! [`QueryOptions`] is a plain value built before the call and never mutated
//! by it.

pub mod error;
pub mod historical;
pub mod ideas;
pub mod planner;
pub mod providers;
pub mod query;
pub mod reconcile;
pub mod types;
pub mod utils;

// Re-export common types
pub use error::{PlannerError, PlannerResult as Result};
pub use planner::KeywordPlanner;
pub use query::{KeywordQuery, QueryOptions};
pub use types::{
    Competition, CompetitionLevel, DebugOptions, KeywordPlanService, KeywordResult, MonthlyVolume,
};
pub use utils::keywords::{chunk_keywords, normalize_keywords, CHUNK_SIZE};
