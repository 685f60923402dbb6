//! Caller-facing query options and the frozen per-call query built from them

use crate::types::{DebugOptions, Targeting};
use crate::utils::keywords::{merge_keywords, normalize_keywords};

/// Options shared by volume and idea queries.
///
/// Built with consuming setters and handed to the planner by reference, so a
/// single value can be reused for many calls without being mutated by them.
///
/// ```rust
/// use keyword_planner::QueryOptions;
///
/// let options = QueryOptions::new()
///     .language(1000)
///     .location(2840)
///     .exclude(["free", "cheap"])
///     .with_monthly_history()
///     .convert_null_to_zero();
/// assert!(options.null_to_zero);
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Language criterion id (e.g. 1000 for English)
    pub language: Option<u64>,
    /// Geo target criterion id (e.g. 2840 for the United States)
    pub location: Option<u64>,
    /// Extra terms added to every request
    pub include: Vec<String>,
    /// Terms excluded from matching
    pub exclude: Vec<String>,
    /// Attach monthly search volumes to each result
    pub with_monthly_history: bool,
    /// Report missing figures as 0 instead of null
    pub null_to_zero: bool,
    /// Debug options
    pub debug: Option<DebugOptions>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn language(mut self, language: u64) -> Self {
        self.language = Some(language);
        self
    }

    pub fn location(mut self, location: u64) -> Self {
        self.location = Some(location);
        self
    }

    pub fn include<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.include = normalize_keywords(terms);
        self
    }

    pub fn exclude<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude = normalize_keywords(terms);
        self
    }

    pub fn with_monthly_history(mut self) -> Self {
        self.with_monthly_history = true;
        self
    }

    pub fn convert_null_to_zero(mut self) -> Self {
        self.null_to_zero = true;
        self
    }

    pub fn with_debug(mut self, debug: DebugOptions) -> Self {
        self.debug = Some(debug);
        self
    }

    pub fn targeting(&self) -> Targeting {
        Targeting {
            language: self.language,
            location: self.location,
        }
    }
}

/// Everything one planner call needs, fixed at the start of the call
#[derive(Debug, Clone)]
pub struct KeywordQuery {
    /// Normalized keywords plus include terms, in first-seen order
    pub keywords: Vec<String>,
    pub targeting: Targeting,
    /// Normalized exclude terms
    pub exclude: Vec<String>,
    pub with_monthly_history: bool,
    pub null_to_zero: bool,
    pub debug: Option<DebugOptions>,
}

impl KeywordQuery {
    pub fn new<I, S>(keywords: I, options: &QueryOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let normalized = normalize_keywords(keywords);
        let include = normalize_keywords(&options.include);

        Self {
            keywords: merge_keywords(&normalized, &include),
            targeting: options.targeting(),
            exclude: normalize_keywords(&options.exclude),
            with_monthly_history: options.with_monthly_history,
            null_to_zero: options.null_to_zero,
            debug: options.debug.clone(),
        }
    }
}
