pub mod analytics;
pub mod pagination;

pub use analytics::{AdminSummary, AnalyticsService, WeeklyHistogram};
pub use pagination::{Page, PageMeta, PageRequest, PaginationService};
