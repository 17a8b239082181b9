//! Ownership challenges: `<address>:<unix seconds>:<registry tag>`.
//!
//! The server keeps no record of issued challenges. A challenge is honored
//! while its embedded timestamp is inside the freshness window.

/// Tag closing every challenge string.
pub const DEFAULT_REGISTRY_TAG: &str = "starRegistry";

/// How long a challenge stays valid, in seconds.
pub const DEFAULT_CHALLENGE_WINDOW_SECS: u64 = 300;

/// Build the challenge string for `address` issued at `issued_at`.
pub fn format_challenge(address: &str, issued_at: i64, tag: &str) -> String {
    format!("{}:{}:{}", address, issued_at, tag)
}

/// A challenge message split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Challenge<'a> {
    /// Address the challenge was issued for.
    pub address: &'a str,
    /// Issue time, when the second field is a whole number.
    pub issued_at: Option<i64>,
    /// Trailing registry tag.
    pub tag: Option<&'a str>,
}

/// Result of checking a challenge's age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh { elapsed: i64 },
    Expired { elapsed: i64 },
    /// The timestamp field is missing or not a number.
    Unreadable,
}

impl<'a> Challenge<'a> {
    /// Split a message on `:`. Never fails; missing parts are `None`.
    pub fn parse(message: &'a str) -> Self {
        let mut parts = message.split(':');
        let address = parts.next().unwrap_or_default();
        let issued_at = parts.next().and_then(|s| s.trim().parse::<i64>().ok());
        let tag = parts.next();
        Self {
            address,
            issued_at,
            tag,
        }
    }

    /// Age of the challenge at `now`, checked against `window_secs`.
    ///
    /// A challenge exactly `window_secs` old is still fresh.
    pub fn freshness(&self, now: i64, window_secs: u64) -> Freshness {
        let Some(issued_at) = self.issued_at else {
            return Freshness::Unreadable;
        };
        let elapsed = now.saturating_sub(issued_at);
        if elapsed > i64::try_from(window_secs).unwrap_or(i64::MAX) {
            Freshness::Expired { elapsed }
        } else {
            Freshness::Fresh { elapsed }
        }
    }
}
