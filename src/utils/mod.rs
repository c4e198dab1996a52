use chrono::{DateTime, SecondsFormat, Utc};

/// Current UTC time as ISO-8601 with microseconds and a trailing `Z`
pub fn iso8601_now() -> String {
    iso8601(Utc::now())
}

/// Format a UTC timestamp as ISO-8601 with microseconds and a trailing `Z`
pub fn iso8601(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Resolve when Ctrl+C is received. If the handler cannot be installed the
/// error is logged and the future never resolves.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Truncate a string to at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_iso8601_format() {
        let time = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
        assert_eq!(iso8601(time), "2024-03-05T07:08:09.000000Z");
    }

    #[test]
    fn test_iso8601_now_is_utc() {
        let stamp = iso8601_now();
        assert!(stamp.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(&stamp).is_ok());
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("", 5), "");
    }
}
