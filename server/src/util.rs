use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Parse an ISO-8601 timestamp as produced by the browser extension
/// ("2025-10-03T09:23:00Z" or with an explicit offset).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Deterministic device fingerprint over the user-supplied identity fields.
pub fn make_fingerprint(user: &str, name: &str, platform: &str, browser: &str) -> String {
    let raw = format!("{}:{}:{}:{}", user, name, platform, browser);
    let digest = Sha256::digest(raw.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_zulu_and_offset() {
        let a = parse_timestamp("2025-10-03T09:23:00Z").unwrap();
        let b = parse_timestamp("2025-10-03T09:23:00+00:00").unwrap();
        assert_eq!(a, b);

        assert!(parse_timestamp("not a timestamp").is_none());
        assert!(parse_timestamp("2025-10-03").is_none());
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = make_fingerprint("alice", "My MacBook Pro", "MacOS", "Chrome-124.0.0");
        let b = make_fingerprint("alice", "My MacBook Pro", "MacOS", "Chrome-124.0.0");
        let c = make_fingerprint("bob", "My MacBook Pro", "MacOS", "Chrome-124.0.0");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
