use anyhow::{Context, Result};
use chrono::NaiveDate;
use chrono_tz::Tz;
use num_format::{Locale, ToFormattedString};

#[derive(Clone, Debug)]
pub struct NumberFormatOptions {
    pub use_comma: bool,
    pub use_human: bool,
    pub locale: String,
    pub decimal_places: usize,
}

impl Default for NumberFormatOptions {
    fn default() -> Self {
        Self {
            use_comma: true,
            use_human: false,
            locale: "en".to_string(),
            decimal_places: 2,
        }
    }
}

impl NumberFormatOptions {
    fn locale(&self) -> Locale {
        match self.locale.as_str() {
            "de" => Locale::de,
            "fr" => Locale::fr,
            "es" => Locale::es,
            "it" => Locale::it,
            "ja" => Locale::ja,
            "ko" => Locale::ko,
            "zh" => Locale::zh,
            _ => Locale::en,
        }
    }
}

/// Format a whole number for display. Accepts both u32 and u64.
pub fn format_number(n: impl Into<u64>, options: &NumberFormatOptions) -> String {
    let n: u64 = n.into();

    if options.use_human {
        if n >= 1_000_000_000_000 {
            format!(
                "{:.prec$}t",
                n as f64 / 1_000_000_000_000.0,
                prec = options.decimal_places
            )
        } else if n >= 1_000_000_000 {
            format!(
                "{:.prec$}b",
                n as f64 / 1_000_000_000.0,
                prec = options.decimal_places
            )
        } else if n >= 1_000_000 {
            format!(
                "{:.prec$}m",
                n as f64 / 1_000_000.0,
                prec = options.decimal_places
            )
        } else if n >= 1_000 {
            format!(
                "{:.prec$}k",
                n as f64 / 1_000.0,
                prec = options.decimal_places
            )
        } else {
            n.to_string()
        }
    } else if options.use_comma {
        n.to_formatted_string(&options.locale())
    } else {
        n.to_string()
    }
}

/// Format a non-negative quantity with a fixed number of decimals and, when
/// enabled, locale grouping of the integer part.
pub fn format_decimal(value: f64, options: &NumberFormatOptions) -> String {
    let places = options.decimal_places.min(9);
    let scale = 10u64.pow(places as u32);
    let scaled = (value.max(0.0) * scale as f64).round() as u64;
    let whole = scaled / scale;
    let frac = scaled % scale;

    let (whole_str, separator) = if options.use_comma {
        let locale = options.locale();
        (whole.to_formatted_string(&locale), locale.decimal())
    } else {
        (whole.to_string(), ".")
    };

    if places == 0 {
        whole_str
    } else {
        format!("{whole_str}{separator}{frac:0places$}")
    }
}

pub fn format_date_for_display(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Get the system's local timezone as an IANA timezone string (e.g., "America/Chicago")
pub fn get_local_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// The system timezone, or UTC when it can't be determined.
pub fn local_timezone() -> Tz {
    get_local_timezone().parse().unwrap_or(Tz::UTC)
}

/// Resolve a configured timezone name; empty means the system timezone.
pub fn resolve_timezone(name: &str) -> Result<Tz> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(local_timezone());
    }
    name.parse::<Tz>()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Unknown timezone: {name}"))
}
