use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::{CoreError, Result};

/// Current instant in UTC.
pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Render a timestamp as an RFC 3339 string.
///
/// Formatting can only fail for dates outside the RFC 3339 year range; those
/// never come out of `now_utc`, so this falls back to the default rendering
/// instead of surfacing an error to callers that only want a log field.
pub fn format_rfc3339(timestamp: OffsetDateTime) -> String {
    timestamp
        .format(&Rfc3339)
        .unwrap_or_else(|_| timestamp.to_string())
}

/// Parse an RFC 3339 string into a timestamp.
pub fn parse_rfc3339(value: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|e| CoreError::invalid_timestamp(format!("'{value}': {e}")))
}
