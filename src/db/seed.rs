//! Deterministic sample data for demos and dashboards.
//!
//! Timestamps are built in the repository's time zone so the weekly
//! histogram attributes every sample to the weekday it was generated for.

use crate::db::models::NewEvent;
use crate::db::repositories::EventsRepository;
use crate::error::Result;
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveTime, TimeZone, Utc};
use log::info;

pub const SAMPLE_EVENT_TYPE: &str = "Rock_FIST";

/// Local detection times for a past day, indexed Monday first
const WEEKDAY_TIMES: [&[(u32, u32, u32)]; 7] = [
    &[(8, 45, 12), (10, 22, 38), (14, 55, 27)],
    &[(9, 8, 45), (11, 33, 19), (13, 47, 52), (15, 12, 8)],
    &[(8, 28, 33), (10, 5, 17), (10, 42, 51), (12, 18, 29), (14, 55, 43)],
    &[(9, 15, 8), (11, 42, 36), (13, 28, 14), (15, 5, 49), (16, 33, 22)],
    &[(8, 55, 41), (10, 22, 17), (11, 8, 53), (14, 45, 29)],
    &[(10, 15, 33), (14, 42, 8)],
    &[(11, 22, 14), (15, 8, 47)],
];

/// Local detection times for the current day; only those already past are used
const TODAY_TIMES: &[(u32, u32, u32)] = &[
    (8, 12, 45),
    (9, 33, 17),
    (10, 5, 28),
    (10, 48, 52),
    (11, 22, 14),
    (11, 55, 39),
    (12, 18, 7),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub cleared: u64,
    pub inserted: usize,
}

/// Sample timestamps for the seven local days before `now` plus today, oldest first
pub fn sample_timestamps(now: DateTime<Utc>, time_zone: FixedOffset) -> Vec<DateTime<Utc>> {
    let today = now.with_timezone(&time_zone).date_naive();
    let mut timestamps = Vec::new();

    for days_back in (1..=7).rev() {
        let date = today - Duration::days(days_back);
        let times = WEEKDAY_TIMES[date.weekday().num_days_from_monday() as usize];
        for &(hour, minute, second) in times {
            if let Some(ts) = local_timestamp(time_zone, date, hour, minute, second) {
                timestamps.push(ts);
            }
        }
    }

    for &(hour, minute, second) in TODAY_TIMES {
        match local_timestamp(time_zone, today, hour, minute, second) {
            Some(ts) if ts <= now => timestamps.push(ts),
            _ => {}
        }
    }

    timestamps
}

/// Clear the store and backfill the sample week
pub async fn reseed(repo: &EventsRepository, now: DateTime<Utc>) -> Result<SeedReport> {
    let cleared = repo.clear().await?;
    info!("Cleared {} existing events", cleared);

    let timestamps = sample_timestamps(now, repo.time_zone());
    let event = NewEvent::new(SAMPLE_EVENT_TYPE);
    for timestamp in &timestamps {
        repo.append_with_timestamp(&event, *timestamp).await?;
    }
    info!("Inserted {} sample events", timestamps.len());

    Ok(SeedReport {
        cleared,
        inserted: timestamps.len(),
    })
}

fn local_timestamp(
    time_zone: FixedOffset,
    date: chrono::NaiveDate,
    hour: u32,
    minute: u32,
    second: u32,
) -> Option<DateTime<Utc>> {
    let time = NaiveTime::from_hms_opt(hour, minute, second)?;
    time_zone
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(|local| local.with_timezone(&Utc))
}
