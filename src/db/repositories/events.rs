use crate::db::models::{Event, EventRow, NewEvent, ValidEvent};
use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use sqlx::SqlitePool;
use std::sync::Arc;

const EVENT_COLUMNS: &str = "id, event_type, description, camera_id, timestamp";

/// Events repository: the append-only event log.
///
/// Two orderings are exposed and must not be mixed up: listings are
/// "most recent first" by `timestamp` (ties broken by `id`), while newness
/// detection for observers is by `id` alone. Backfilled rows with past
/// timestamps are the case where the two disagree.
#[derive(Clone)]
pub struct EventsRepository {
    pool: Arc<SqlitePool>,
    time_zone: FixedOffset,
}

impl EventsRepository {
    /// Create a new events repository whose calendar days follow `time_zone`
    pub fn new(pool: Arc<SqlitePool>, time_zone: FixedOffset) -> Self {
        Self { pool, time_zone }
    }

    pub fn time_zone(&self) -> FixedOffset {
        self.time_zone
    }

    /// Append an event stamped with the store's clock
    pub async fn append(&self, event: &NewEvent) -> Result<i64> {
        let event = event.validate()?;

        let result = sqlx::query(
            r#"
            INSERT INTO events (event_type, description, camera_id)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&event.event_type)
        .bind(&event.description)
        .bind(&event.camera_id)
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::Storage(format!("Failed to append event: {}", e)))?;

        Ok(result.last_insert_rowid())
    }

    /// Append an event with a caller-supplied timestamp (backfill and seeding)
    pub async fn append_with_timestamp(
        &self,
        event: &NewEvent,
        timestamp: DateTime<Utc>,
    ) -> Result<i64> {
        let ValidEvent {
            event_type,
            description,
            camera_id,
        } = event.validate()?;

        let result = sqlx::query(
            r#"
            INSERT INTO events (event_type, description, camera_id, timestamp)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(event_type)
        .bind(description)
        .bind(camera_id)
        .bind(timestamp.timestamp_millis())
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::Storage(format!("Failed to append backfilled event: {}", e)))?;

        Ok(result.last_insert_rowid())
    }

    /// Total number of events
    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| Error::Storage(format!("Failed to count events: {}", e)))
    }

    /// Number of events at or after `start_time`
    pub async fn count_since(&self, start_time: DateTime<Utc>) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE timestamp >= ?")
            .bind(start_time.timestamp_millis())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| Error::Storage(format!("Failed to count recent events: {}", e)))
    }

    /// Number of events falling on `date` in the store's time zone
    pub async fn count_on(&self, date: NaiveDate) -> Result<i64> {
        let start = self.start_of_day(date)?;
        let end = match date.succ_opt() {
            Some(next) => self.start_of_day(next)?,
            None => return Err(Error::Validation(format!("date out of range: {}", date))),
        };

        sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE timestamp >= ? AND timestamp < ?")
            .bind(start.timestamp_millis())
            .bind(end.timestamp_millis())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| Error::Storage(format!("Failed to count events for {}: {}", date, e)))
    }

    /// Event counts per local weekday for timestamps in `[start, end]`,
    /// indexed Monday first.
    pub async fn weekday_counts(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<[i64; 7]> {
        // strftime('%w') numbers days from Sunday = 0
        let rows = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT CAST(strftime('%w', (timestamp / 1000) + ?, 'unixepoch') AS INTEGER) AS day_index,
                   COUNT(*) AS count
            FROM events
            WHERE timestamp >= ? AND timestamp <= ?
            GROUP BY day_index
            "#,
        )
        .bind(i64::from(self.time_zone.local_minus_utc()))
        .bind(start.timestamp_millis())
        .bind(end.timestamp_millis())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Storage(format!("Failed to aggregate events by weekday: {}", e)))?;

        let mut counts = [0i64; 7];
        for (day_index, count) in rows {
            let weekday = weekday_from_sunday(day_index).ok_or_else(|| {
                Error::Storage(format!("Unexpected weekday index: {}", day_index))
            })?;
            counts[weekday.num_days_from_monday() as usize] += count;
        }

        Ok(counts)
    }

    /// Most recent first by timestamp, ties broken by id
    pub async fn list_page(&self, offset: i64, limit: i64) -> Result<Vec<Event>> {
        if limit <= 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events
            ORDER BY timestamp DESC, id DESC
            LIMIT ? OFFSET ?
            "#
        ))
        .bind(limit)
        .bind(offset.max(0))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Storage(format!("Failed to list events: {}", e)))?;

        into_events(rows)
    }

    /// Every event, most recent first
    pub async fn list_all(&self) -> Result<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY timestamp DESC, id DESC"
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Storage(format!("Failed to list events: {}", e)))?;

        into_events(rows)
    }

    /// Events with `id > last_id`, oldest first
    pub async fn list_newer_than(&self, last_id: i64, limit: i64) -> Result<Vec<Event>> {
        if limit <= 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events
            WHERE id > ?
            ORDER BY id ASC
            LIMIT ?
            "#
        ))
        .bind(last_id)
        .bind(limit)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Storage(format!("Failed to list new events: {}", e)))?;

        into_events(rows)
    }

    /// The event with the highest id, if any
    pub async fn latest(&self) -> Result<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY id DESC LIMIT 1"
        ))
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| Error::Storage(format!("Failed to get latest event: {}", e)))?;

        row.map(Event::try_from).transpose()
    }

    /// Delete every event. Administrative only; ids keep counting upwards.
    pub async fn clear(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM events")
            .execute(&*self.pool)
            .await
            .map_err(|e| Error::Storage(format!("Failed to clear events: {}", e)))?;

        Ok(result.rows_affected())
    }

    fn start_of_day(&self, date: NaiveDate) -> Result<DateTime<Utc>> {
        self.time_zone
            .from_local_datetime(&date.and_time(NaiveTime::MIN))
            .single()
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(|| Error::Validation(format!("date out of range: {}", date)))
    }
}

fn into_events(rows: Vec<EventRow>) -> Result<Vec<Event>> {
    rows.into_iter().map(Event::try_from).collect()
}

fn weekday_from_sunday(day_index: i64) -> Option<Weekday> {
    match day_index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DatabaseService;
    use crate::db::models::DEFAULT_CAMERA_ID;
    use chrono::Duration;

    async fn repo_with_offset(offset_secs: i32) -> EventsRepository {
        let db = DatabaseService::in_memory().await.unwrap();
        EventsRepository::new(db.pool, FixedOffset::east_opt(offset_secs).unwrap())
    }

    async fn repo() -> EventsRepository {
        repo_with_offset(0).await
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[tokio::test]
    async fn append_assigns_strictly_increasing_ids() {
        let repo = repo().await;

        let mut previous = 0;
        for i in 0..10 {
            let id = repo
                .append(&NewEvent::new(format!("Motion Detected {}", i)))
                .await
                .unwrap();
            assert!(id > previous);
            previous = id;
        }
        assert_eq!(repo.count().await.unwrap(), 10);
    }

    #[tokio::test]
    async fn append_fills_defaults_and_timestamp() {
        let repo = repo().await;
        let before = Utc::now() - Duration::seconds(5);

        let id = repo.append(&NewEvent::new("Person Detected")).await.unwrap();
        let stored = repo.latest().await.unwrap().unwrap();

        assert_eq!(stored.id, id);
        assert_eq!(stored.event_type, "Person Detected");
        assert_eq!(stored.description, "");
        assert_eq!(stored.camera_id, DEFAULT_CAMERA_ID);
        assert!(stored.timestamp >= before);
        assert!(stored.timestamp <= Utc::now() + Duration::seconds(5));
    }

    #[tokio::test]
    async fn invalid_append_adds_no_row() {
        let repo = repo().await;
        repo.append(&NewEvent::new("Alert")).await.unwrap();

        let err = repo.append(&NewEvent::default()).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        let err = repo
            .append_with_timestamp(&NewEvent::new(""), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_page_orders_by_timestamp_then_id() {
        let repo = repo().await;
        let a = repo
            .append_with_timestamp(&NewEvent::new("a"), at("2026-01-12T08:00:00Z"))
            .await
            .unwrap();
        let b = repo
            .append_with_timestamp(&NewEvent::new("b"), at("2026-01-14T08:00:00Z"))
            .await
            .unwrap();
        // Same timestamp as `b`, inserted later
        let c = repo
            .append_with_timestamp(&NewEvent::new("c"), at("2026-01-14T08:00:00Z"))
            .await
            .unwrap();
        // Backfilled: newest id, oldest timestamp
        let d = repo
            .append_with_timestamp(&NewEvent::new("d"), at("2025-12-15T09:15:23Z"))
            .await
            .unwrap();

        let ids: Vec<i64> = repo.list_page(0, 10).await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![c, b, a, d]);

        let ids: Vec<i64> = repo.list_page(1, 2).await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![b, a]);

        assert!(repo.list_page(10, 10).await.unwrap().is_empty());
        assert!(repo.list_page(0, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_newer_than_is_ascending_by_id_and_capped() {
        let repo = repo().await;
        for i in 0..5 {
            repo.append(&NewEvent::new(format!("e{}", i))).await.unwrap();
        }
        // Backfilled row still counts as new for observers
        let backfilled = repo
            .append_with_timestamp(&NewEvent::new("old"), at("2020-01-01T00:00:00Z"))
            .await
            .unwrap();

        let newer = repo.list_newer_than(3, 10).await.unwrap();
        let ids: Vec<i64> = newer.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![4, 5, backfilled]);

        let capped = repo.list_newer_than(0, 2).await.unwrap();
        assert_eq!(capped.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2]);

        assert!(repo.list_newer_than(backfilled, 10).await.unwrap().is_empty());
        assert_eq!(repo.latest().await.unwrap().unwrap().id, backfilled);
    }

    #[tokio::test]
    async fn count_since_is_inclusive() {
        let repo = repo().await;
        repo.append_with_timestamp(&NewEvent::new("a"), at("2026-01-10T00:00:00Z"))
            .await
            .unwrap();
        repo.append_with_timestamp(&NewEvent::new("b"), at("2026-01-12T00:00:00Z"))
            .await
            .unwrap();
        repo.append_with_timestamp(&NewEvent::new("c"), at("2026-01-13T00:00:00Z"))
            .await
            .unwrap();

        assert_eq!(repo.count_since(at("2026-01-12T00:00:00Z")).await.unwrap(), 2);
        assert_eq!(repo.count_since(at("2026-01-14T00:00:00Z")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn count_on_uses_store_time_zone() {
        // UTC+02:00
        let repo = repo_with_offset(2 * 3600).await;
        // 2026-01-18 23:30 local
        repo.append_with_timestamp(&NewEvent::new("late"), at("2026-01-18T21:30:00Z"))
            .await
            .unwrap();
        // 2026-01-19 00:30 local, still the 18th in UTC
        repo.append_with_timestamp(&NewEvent::new("early"), at("2026-01-18T22:30:00Z"))
            .await
            .unwrap();

        let jan_18 = NaiveDate::from_ymd_opt(2026, 1, 18).unwrap();
        let jan_19 = NaiveDate::from_ymd_opt(2026, 1, 19).unwrap();
        assert_eq!(repo.count_on(jan_18).await.unwrap(), 1);
        assert_eq!(repo.count_on(jan_19).await.unwrap(), 1);

        let utc_repo = EventsRepository::new(repo.pool.clone(), FixedOffset::east_opt(0).unwrap());
        assert_eq!(utc_repo.count_on(jan_18).await.unwrap(), 2);
        assert_eq!(utc_repo.count_on(jan_19).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn weekday_counts_bucket_in_store_time_zone() {
        // UTC-05:00
        let repo = repo_with_offset(-5 * 3600).await;
        // Monday 2026-01-19 02:00 UTC is Sunday 21:00 local
        repo.append_with_timestamp(&NewEvent::new("a"), at("2026-01-19T02:00:00Z"))
            .await
            .unwrap();
        // Monday 15:00 UTC is Monday 10:00 local
        repo.append_with_timestamp(&NewEvent::new("b"), at("2026-01-19T15:00:00Z"))
            .await
            .unwrap();
        // Outside the window
        repo.append_with_timestamp(&NewEvent::new("c"), at("2026-01-01T15:00:00Z"))
            .await
            .unwrap();

        let counts = repo
            .weekday_counts(at("2026-01-13T00:00:00Z"), at("2026-01-20T00:00:00Z"))
            .await
            .unwrap();
        assert_eq!(counts[Weekday::Mon.num_days_from_monday() as usize], 1);
        assert_eq!(counts[Weekday::Sun.num_days_from_monday() as usize], 1);
        assert_eq!(counts.iter().sum::<i64>(), 2);
    }

    #[tokio::test]
    async fn clear_returns_deleted_count_and_ids_are_not_reused() {
        let repo = repo().await;
        repo.append(&NewEvent::new("a")).await.unwrap();
        let last = repo.append(&NewEvent::new("b")).await.unwrap();

        assert_eq!(repo.clear().await.unwrap(), 2);
        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(repo.latest().await.unwrap().is_none());

        let next = repo.append(&NewEvent::new("c")).await.unwrap();
        assert!(next > last);
    }

    #[tokio::test]
    async fn closed_pool_reports_storage_error() {
        let repo = repo().await;
        repo.pool.close().await;

        assert!(matches!(repo.count().await, Err(Error::Storage(_))));
        assert!(matches!(
            repo.append(&NewEvent::new("a")).await,
            Err(Error::Storage(_))
        ));
    }
}
