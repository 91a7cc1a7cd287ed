// meshly-core: domain model, checkin analysis, and the collection pipeline

pub mod checkin;
pub mod collector;
pub mod error;
pub mod model;
pub mod rows;
pub mod scrape;
pub mod survey;

pub use checkin::CheckinBreakdown;
pub use collector::Collector;
pub use error::CoreError;
pub use scrape::DashboardCollector;
pub use survey::{AggregationPolicy, Summary, Survey, UsageTotals};
