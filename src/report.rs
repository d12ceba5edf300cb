use std::fmt::Write;

use crate::error::ExportError;
use crate::types::{
    AnalysisResult, MS_PER_DAY, MS_PER_HOUR, MS_PER_MINUTE, RankedEntity, WeekdayBucket,
};
use crate::utils::{NumberFormatOptions, format_date_for_display, format_decimal, format_number};

/// Render the plain-text report. Sections always appear in the same order:
/// habits, artists, tracks, albums, milestones, then diagnostics if anything
/// was skipped.
pub fn render_text(result: &AnalysisResult, options: &NumberFormatOptions) -> String {
    let mut out = String::new();
    let num = |n: u64| format_number(n, options);
    let dec = |v: f64| format_decimal(v, options);

    let _ = writeln!(out, "Your All Time History");
    let _ = writeln!(
        out,
        "{} · {} {} · timezone {}",
        result.source,
        num(result.files_loaded as u64),
        if result.files_loaded == 1 { "file" } else { "files" },
        result.timezone
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "Listening Habits");
    let _ = writeln!(
        out,
        "Total Minutes Listened: {} minutes",
        dec(result.total_minutes)
    );
    let _ = writeln!(
        out,
        "Average Listening Time per Day: {} minutes",
        dec(result.average_daily_minutes)
    );
    match (result.most_active_hour, result.time_period) {
        (Some(hour), Some(period)) => {
            let _ = writeln!(
                out,
                "Most Active Listening Hour: {:02}:00 ({} jams!)",
                hour.hour,
                period.label()
            );
        }
        _ => {
            let _ = writeln!(out, "Most Active Listening Hour: n/a");
        }
    }
    let _ = writeln!(
        out,
        "Days with Most Listening Activity: {}",
        describe_weekdays(&result.most_active_weekdays)
    );
    let _ = writeln!(out);

    write_ranking(&mut out, "Top Artists", &result.top_artists, options);
    write_ranking(&mut out, "Top Tracks", &result.top_tracks, options);
    write_ranking(&mut out, "Top Albums", &result.top_albums, options);

    let _ = writeln!(out, "Milestones and Achievements");
    let _ = writeln!(
        out,
        "Unique Tracks Streamed: {} tracks",
        num(result.unique_tracks as u64)
    );
    let _ = writeln!(out, "Total Plays: {} plays", num(result.total_plays));
    let _ = writeln!(
        out,
        "Total Hours Listened: {} hours ({} full days of music)",
        dec(result.total_hours()),
        dec(result.total_ms as f64 / MS_PER_DAY)
    );
    match result.longest_streak {
        Some(streak) => {
            let _ = writeln!(
                out,
                "Longest Listening Streak: {} consecutive {} ({} to {})",
                num(u64::from(streak.days)),
                if streak.days == 1 { "day" } else { "days" },
                format_date_for_display(streak.start),
                format_date_for_display(streak.end)
            );
        }
        None => {
            let _ = writeln!(out, "Longest Listening Streak: 0 consecutive days");
        }
    }
    match result.most_played_day {
        Some(day) => {
            let _ = writeln!(
                out,
                "Most Played Day: {} with {} hours streamed",
                format_date_for_display(day.date),
                dec(day.total_ms as f64 / MS_PER_HOUR)
            );
        }
        None => {
            let _ = writeln!(out, "Most Played Day: n/a");
        }
    }

    if result.rejected_records > 0 || !result.skipped_files.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Diagnostics");
        let _ = writeln!(
            out,
            "Rejected Records: {} of {}",
            num(result.rejected_records as u64),
            num(result.total_records as u64)
        );
        let _ = writeln!(
            out,
            "Skipped Files: {}",
            num(result.skipped_files.len() as u64)
        );
        for skipped in &result.skipped_files {
            let _ = writeln!(out, "\t{}", skipped.reason);
        }
    }

    out
}

fn write_ranking(
    out: &mut String,
    title: &str,
    entries: &[RankedEntity],
    options: &NumberFormatOptions,
) {
    let _ = writeln!(out, "{title}:");
    if entries.is_empty() {
        let _ = writeln!(out, "\t(none)");
    }
    for entry in entries {
        let label = match &entry.artist {
            Some(artist) => format!("{} by {}", entry.name, artist),
            None => entry.name.clone(),
        };
        let ms = entry.total_ms as f64;
        let _ = writeln!(
            out,
            "\t{}. {} – {} ms ({} minutes | {} hours | {} days)",
            entry.rank,
            label,
            format_number(entry.total_ms, options),
            format_decimal(ms / MS_PER_MINUTE, options),
            format_decimal(ms / MS_PER_HOUR, options),
            format_decimal(ms / MS_PER_DAY, options)
        );
    }
    let _ = writeln!(out);
}

/// "Mondays", "Fridays and Sundays", "Mondays, Fridays and Sundays".
pub fn describe_weekdays(weekdays: &[WeekdayBucket]) -> String {
    let names: Vec<String> = weekdays.iter().map(|w| format!("{}s", w.name)).collect();
    match names.as_slice() {
        [] => "n/a".to_string(),
        [only] => only.clone(),
        [rest @ .., last] => format!("{} and {}", rest.join(", "), last),
    }
}

/// JSON form of the result; keys are the `AnalysisResult` field names.
pub fn to_json(result: &AnalysisResult, pretty: bool) -> Result<String, ExportError> {
    let json = if pretty {
        simd_json::to_string_pretty(result)
    } else {
        simd_json::to_string(result)
    };
    json.map_err(|e| ExportError::Serialize(e.to_string()))
}
