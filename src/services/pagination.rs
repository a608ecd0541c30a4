use crate::db::models::Event;
use crate::db::repositories::EventsRepository;
use crate::error::Result;
use log::debug;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 20;

/// Requested page; always holds `page >= 1` and `limit >= 1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Non-positive values fall back to the defaults
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: if page >= 1 { page } else { DEFAULT_PAGE },
            limit: if limit >= 1 { limit } else { DEFAULT_LIMIT },
        }
    }

    /// Build from raw query-string values; missing or non-numeric values use the defaults
    pub fn from_params(page: Option<&str>, limit: Option<&str>) -> Self {
        let parse = |value: Option<&str>| value.and_then(|v| v.trim().parse::<i64>().ok());
        Self::new(
            parse(page).unwrap_or(DEFAULT_PAGE),
            parse(limit).unwrap_or(DEFAULT_LIMIT),
        )
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Pagination metadata returned beside every page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub total_records: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub records: Vec<Event>,
    pub pagination: PageMeta,
}

pub fn total_pages(total_records: i64, limit: i64) -> i64 {
    if total_records <= 0 || limit <= 0 {
        return 0;
    }
    total_records / limit + i64::from(total_records % limit != 0)
}

/// Offset paging over the event log, most recent first
#[derive(Clone)]
pub struct PaginationService {
    events: EventsRepository,
}

impl PaginationService {
    pub fn new(events: EventsRepository) -> Self {
        Self { events }
    }

    /// A page past the end is an empty page with correct metadata, not an error
    pub async fn get_page(&self, request: PageRequest) -> Result<Page> {
        let total_records = self.events.count().await?;
        let records = self
            .events
            .list_page(request.offset(), request.limit())
            .await?;

        debug!(
            "Loaded page {} ({} records, limit {}, {} total)",
            request.page(),
            records.len(),
            request.limit(),
            total_records
        );

        Ok(Page {
            records,
            pagination: PageMeta {
                page: request.page(),
                limit: request.limit(),
                total_records,
                total_pages: total_pages(total_records, request.limit()),
            },
        })
    }
}
