use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::warn;

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── TimezoneHandler ───────────────────────────────────────────────────────────

/// Converts stored UTC instants into a configured display timezone.
///
/// Ledger timestamps are always stored in UTC; this handler only affects how
/// they are shown.
pub struct TimezoneHandler {
    display_tz: Tz,
}

impl TimezoneHandler {
    /// Create a handler for the given IANA timezone name.
    ///
    /// If `tz_name` is not a recognised IANA timezone, falls back to UTC
    /// and logs a warning.
    pub fn new(tz_name: &str) -> Self {
        let tz = tz_name.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "TimezoneHandler: unrecognised timezone \"{}\", falling back to UTC",
                tz_name
            );
            Tz::UTC
        });
        Self { display_tz: tz }
    }

    /// The resolved display timezone.
    pub fn timezone(&self) -> Tz {
        self.display_tz
    }

    /// Validate that `tz_name` is a recognised IANA timezone identifier.
    pub fn validate_timezone(tz_name: &str) -> bool {
        tz_name.parse::<Tz>().is_ok()
    }

    /// Format a UTC instant in the display timezone with a strftime pattern.
    pub fn format(&self, ts: DateTime<Utc>, pattern: &str) -> String {
        ts.with_timezone(&self.display_tz).format(pattern).to_string()
    }

    /// Format a UTC instant as `YYYY-MM-DD HH:MM:SS TZ` in the display zone.
    pub fn format_standard(&self, ts: DateTime<Utc>) -> String {
        self.format(ts, "%Y-%m-%d %H:%M:%S %Z")
    }
}
