//! Core type definitions with validation.

use std::fmt;

use chrono::Duration;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The idle threshold was negative.
    #[error("idle threshold must not be negative, got {seconds}s")]
    NegativeThreshold { seconds: i64 },

    /// The timezone name is not a known IANA zone.
    #[error("unknown timezone: {name}")]
    UnknownTimezone { name: String },

    /// Invalid domain mode value.
    #[error("invalid domain mode: {value}")]
    InvalidDomainMode { value: String },

    /// Invalid category match value.
    #[error("invalid category match: {value}")]
    InvalidCategoryMatch { value: String },
}

/// Maximum gap between two consecutive events of the same session.
///
/// A gap equal to the threshold keeps the events together; only a strictly
/// larger gap starts a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IdleThreshold(Duration);

impl IdleThreshold {
    /// 30 minutes.
    pub const DEFAULT_MINUTES: u32 = 30;

    /// Creates a threshold after validation.
    pub fn new(duration: Duration) -> Result<Self, ValidationError> {
        if duration < Duration::zero() {
            return Err(ValidationError::NegativeThreshold {
                seconds: duration.num_seconds(),
            });
        }
        Ok(Self(duration))
    }

    /// Creates a threshold from whole minutes. Never fails.
    pub fn from_minutes(minutes: u32) -> Self {
        Self(Duration::minutes(i64::from(minutes)))
    }

    /// Returns the threshold as a duration.
    pub const fn as_duration(self) -> Duration {
        self.0
    }

    /// Returns the threshold in whole minutes (truncated).
    pub fn num_minutes(self) -> i64 {
        self.0.num_minutes()
    }
}

impl Default for IdleThreshold {
    fn default() -> Self {
        Self::from_minutes(Self::DEFAULT_MINUTES)
    }
}

impl fmt::Display for IdleThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.0.num_minutes())
    }
}

/// Parses an IANA timezone name such as `UTC` or `Europe/Berlin`.
pub fn parse_timezone(name: &str) -> Result<Tz, ValidationError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ValidationError::UnknownTimezone {
            name: name.to_string(),
        })
}

/// How much of a URL host is kept as the event's domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DomainMode {
    /// Full host with a leading `www.` removed (`mail.google.com`).
    #[default]
    Host,
    /// Registrable part of the host only (`google.com`).
    Registrable,
}

impl DomainMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Registrable => "registrable",
        }
    }
}

impl fmt::Display for DomainMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DomainMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "host" => Ok(Self::Host),
            "registrable" => Ok(Self::Registrable),
            _ => Err(ValidationError::InvalidDomainMode {
                value: s.to_string(),
            }),
        }
    }
}

/// How category patterns are compared against an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CategoryMatch {
    /// Pattern is a domain; matches that domain and its subdomains.
    /// The longest matching pattern wins.
    #[default]
    Domain,
    /// Pattern is a substring of the lower-cased URL.
    /// The first rule with a matching pattern wins.
    Url,
}

impl CategoryMatch {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Url => "url",
        }
    }
}

impl fmt::Display for CategoryMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CategoryMatch {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "domain" => Ok(Self::Domain),
            "url" => Ok(Self::Url),
            _ => Err(ValidationError::InvalidCategoryMatch {
                value: s.to_string(),
            }),
        }
    }
}
