use crate::db::repositories::EventsRepository;
use crate::error::Result;
use chrono::{DateTime, Duration, Utc, Weekday};
use log::debug;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;

/// Length of the trailing window covered by the weekly histogram
pub const HISTOGRAM_WINDOW_DAYS: i64 = 7;

/// Output order of the histogram buckets
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Event counts per weekday. Always has all seven buckets, Monday first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeeklyHistogram {
    counts: [i64; 7],
}

impl WeeklyHistogram {
    /// Counts indexed Monday first
    pub fn from_counts(counts: [i64; 7]) -> Self {
        Self { counts }
    }

    pub fn get(&self, weekday: Weekday) -> i64 {
        self.counts[weekday.num_days_from_monday() as usize]
    }

    pub fn total(&self) -> i64 {
        self.counts.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Weekday, i64)> + '_ {
        WEEKDAYS.iter().map(move |day| (*day, self.get(*day)))
    }
}

impl Serialize for WeeklyHistogram {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(WEEKDAYS.len()))?;
        for (day, count) in self.iter() {
            map.serialize_entry(weekday_name(day), &count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct AdminSummary {
    pub total_events: i64,
    pub events_today: i64,
}

/// Time-windowed aggregation over the event log.
///
/// Buckets and "today" follow the repository's time zone, the same one the
/// seed path uses.
#[derive(Clone)]
pub struct AnalyticsService {
    events: EventsRepository,
}

impl AnalyticsService {
    pub fn new(events: EventsRepository) -> Self {
        Self { events }
    }

    /// Counts per weekday over `[now - 7 days, now]`
    pub async fn weekly_histogram(&self, now: DateTime<Utc>) -> Result<WeeklyHistogram> {
        let start = now - Duration::days(HISTOGRAM_WINDOW_DAYS);
        let counts = self.events.weekday_counts(start, now).await?;
        let histogram = WeeklyHistogram::from_counts(counts);

        debug!(
            "Weekly histogram from {} to {}: {} events",
            start,
            now,
            histogram.total()
        );

        Ok(histogram)
    }

    /// Total events and events on the current local day
    pub async fn admin_summary(&self, now: DateTime<Utc>) -> Result<AdminSummary> {
        let today = now.with_timezone(&self.events.time_zone()).date_naive();

        Ok(AdminSummary {
            total_events: self.events.count().await?,
            events_today: self.events.count_on(today).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewEvent;
    use crate::db::DatabaseService;
    use chrono::FixedOffset;

    async fn setup(offset_secs: i32) -> (AnalyticsService, EventsRepository) {
        let db = DatabaseService::in_memory().await.unwrap();
        let repo = EventsRepository::new(db.pool, FixedOffset::east_opt(offset_secs).unwrap());
        (AnalyticsService::new(repo.clone()), repo)
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[tokio::test]
    async fn empty_store_has_seven_zero_buckets() {
        let (service, _) = setup(0).await;
        let histogram = service.weekly_histogram(Utc::now()).await.unwrap();

        let json = serde_json::to_value(histogram).unwrap();
        let map = json.as_object().unwrap();
        assert_eq!(map.len(), 7);
        assert!(map.values().all(|v| v.as_i64() == Some(0)));
    }

    #[tokio::test]
    async fn buckets_by_record_weekday_within_window() {
        let (service, repo) = setup(0).await;
        // Monday 2026-01-19 13:00
        let now = at("2026-01-19T13:00:00Z");

        let stamps = [
            "2026-01-12T12:00:00Z", // before the window
            "2026-01-12T14:00:00Z", // Monday, inside
            "2026-01-14T09:00:00Z", // Wednesday
            "2026-01-14T10:00:00Z", // Wednesday
            "2026-01-17T10:00:00Z", // Saturday
            "2026-01-19T12:59:59Z", // Monday, today
            "2026-01-19T13:00:01Z", // after now
        ];
        for stamp in stamps {
            repo.append_with_timestamp(&NewEvent::new("Rock_FIST"), at(stamp))
                .await
                .unwrap();
        }

        let histogram = service.weekly_histogram(now).await.unwrap();
        assert_eq!(histogram.get(Weekday::Mon), 2);
        assert_eq!(histogram.get(Weekday::Wed), 2);
        assert_eq!(histogram.get(Weekday::Sat), 1);
        assert_eq!(histogram.get(Weekday::Tue), 0);
        assert_eq!(histogram.total(), 5);
        assert_eq!(
            histogram.total(),
            repo.count_since(now - Duration::days(7)).await.unwrap() - 1
        );
    }

    #[tokio::test]
    async fn window_bounds_are_inclusive() {
        let (service, repo) = setup(0).await;
        let now = at("2026-01-19T13:00:00Z");
        repo.append_with_timestamp(&NewEvent::new("edge"), now - Duration::days(7))
            .await
            .unwrap();
        repo.append_with_timestamp(&NewEvent::new("edge"), now)
            .await
            .unwrap();

        let histogram = service.weekly_histogram(now).await.unwrap();
        assert_eq!(histogram.get(Weekday::Mon), 2);
    }

    #[tokio::test]
    async fn bucketing_follows_store_time_zone() {
        // UTC+10:00: Sunday 20:00 UTC is Monday 06:00 local
        let (service, repo) = setup(10 * 3600).await;
        repo.append_with_timestamp(&NewEvent::new("Person Detected"), at("2026-01-18T20:00:00Z"))
            .await
            .unwrap();

        let histogram = service
            .weekly_histogram(at("2026-01-19T00:00:00Z"))
            .await
            .unwrap();
        assert_eq!(histogram.get(Weekday::Mon), 1);
        assert_eq!(histogram.get(Weekday::Sun), 0);
    }

    #[test]
    fn serializes_in_weekday_order() {
        let histogram = WeeklyHistogram::from_counts([1, 2, 3, 4, 5, 6, 7]);
        let json = serde_json::to_string(&histogram).unwrap();
        assert_eq!(
            json,
            r#"{"Monday":1,"Tuesday":2,"Wednesday":3,"Thursday":4,"Friday":5,"Saturday":6,"Sunday":7}"#
        );
    }

    #[tokio::test]
    async fn admin_summary_counts_today_in_local_time() {
        // UTC-03:00
        let (service, repo) = setup(-3 * 3600).await;
        let now = at("2026-01-19T12:00:00Z"); // 09:00 local
        repo.append_with_timestamp(&NewEvent::new("a"), at("2026-01-19T02:00:00Z")) // 18th local
            .await
            .unwrap();
        repo.append_with_timestamp(&NewEvent::new("b"), at("2026-01-19T04:00:00Z")) // 19th local
            .await
            .unwrap();
        repo.append_with_timestamp(&NewEvent::new("c"), at("2026-01-19T11:00:00Z"))
            .await
            .unwrap();

        let summary = service.admin_summary(now).await.unwrap();
        assert_eq!(
            summary,
            AdminSummary {
                total_events: 3,
                events_today: 2
            }
        );
    }
}
