//! Rankings and highlights derived from aggregated totals. Every function
//! here is pure.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::types::{DayBucket, EntityTotal, HourBucket, MS_PER_MINUTE, RankedEntity, Streak, WeekdayBucket};

/// Top `k` entities by total time. Ties go to whichever entity was
/// encountered first.
pub fn top_k(entities: &[EntityTotal], k: usize) -> Vec<RankedEntity> {
    let mut sorted: Vec<&EntityTotal> = entities.iter().collect();
    sorted.sort_by(|a, b| {
        b.total_ms
            .cmp(&a.total_ms)
            .then(a.first_seen.cmp(&b.first_seen))
    });

    sorted
        .into_iter()
        .take(k)
        .enumerate()
        .map(|(i, e)| RankedEntity {
            rank: i + 1,
            name: e.name.clone(),
            artist: e.artist.clone(),
            total_ms: e.total_ms,
            plays: e.plays,
        })
        .collect()
}

/// Busiest hour of the day; the earliest hour wins a tie. `None` when
/// nothing was played.
pub fn most_active_hour(hourly_ms: &[u64; 24]) -> Option<HourBucket> {
    let mut best: Option<HourBucket> = None;
    for (hour, &total_ms) in hourly_ms.iter().enumerate() {
        if total_ms > 0 && best.is_none_or(|b| total_ms > b.total_ms) {
            best = Some(HourBucket {
                hour: hour as u8,
                total_ms,
            });
        }
    }
    best
}

/// Every weekday sharing the maximum total. Ties are reported together,
/// Monday first.
pub fn most_active_weekdays(weekday_ms: &[u64; 7]) -> Vec<WeekdayBucket> {
    let max = weekday_ms.iter().copied().max().unwrap_or(0);
    if max == 0 {
        return Vec::new();
    }

    weekday_ms
        .iter()
        .enumerate()
        .filter(|(_, total)| **total == max)
        .map(|(i, total)| WeekdayBucket::new(i as u8, *total))
        .collect()
}

/// Dates with any listening time.
pub fn active_dates(daily_ms: &BTreeMap<NaiveDate, u64>) -> Vec<NaiveDate> {
    daily_ms
        .iter()
        .filter(|(_, total)| **total > 0)
        .map(|(date, _)| *date)
        .collect()
}

/// Longest run of consecutive active days. The earliest run wins a tie.
pub fn longest_streak(daily_ms: &BTreeMap<NaiveDate, u64>) -> Option<Streak> {
    let dates = active_dates(daily_ms);
    let first = *dates.first()?;

    let mut best = Streak {
        days: 1,
        start: first,
        end: first,
    };
    let mut current = best;

    for pair in dates.windows(2) {
        if pair[0].succ_opt() == Some(pair[1]) {
            current.days += 1;
            current.end = pair[1];
        } else {
            current = Streak {
                days: 1,
                start: pair[1],
                end: pair[1],
            };
        }

        if current.days > best.days {
            best = current;
        }
    }

    Some(best)
}

/// The single calendar day with the most listening; earliest date on a tie.
/// `None` when no day has any listening.
pub fn most_played_day(daily_ms: &BTreeMap<NaiveDate, u64>) -> Option<DayBucket> {
    let mut best: Option<DayBucket> = None;
    for (&date, &total_ms) in daily_ms.iter().filter(|&(_, &ms)| ms > 0) {
        if best.is_none_or(|b| total_ms > b.total_ms) {
            best = Some(DayBucket { date, total_ms });
        }
    }
    best
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn total_minutes(total_ms: u64) -> f64 {
    round2(total_ms as f64 / MS_PER_MINUTE)
}

/// Average minutes per active day, or 0 when there are no active days.
pub fn average_daily_minutes(total_ms: u64, active_days: usize) -> f64 {
    if active_days == 0 {
        return 0.0;
    }
    round2(total_ms as f64 / MS_PER_MINUTE / active_days as f64)
}
