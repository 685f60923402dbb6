//! Keyword planning backend implementations

pub mod google_ads;

// Re-export providers for convenience
pub use google_ads::{GoogleAdsConfig, GoogleAdsProvider};
