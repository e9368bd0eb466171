//! Trigger adapters.
//!
//! Each adapter turns a container update event into a publish on an
//! external channel through its injected port. Shared here: the
//! configuration vocabulary common to every trigger (`threshold`,
//! `mode`) and secret masking for safe configuration display.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod mqtt;
pub mod slack;

/// Smallest update kind a trigger fires for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateThreshold {
    #[default]
    All,
    Major,
    Minor,
    Patch,
}

impl FromStr for UpdateThreshold {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            other => Err(format!(
                "must be one of all, major, minor, patch (got `{other}`)"
            )),
        }
    }
}

impl fmt::Display for UpdateThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::All => "all",
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Patch => "patch",
        };
        f.write_str(s)
    }
}

/// Whether a trigger fires per container or once per batch of updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    #[default]
    Simple,
    Batch,
}

impl FromStr for TriggerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple" => Ok(Self::Simple),
            "batch" => Ok(Self::Batch),
            other => Err(format!("must be one of simple, batch (got `{other}`)")),
        }
    }
}

impl fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Simple => "simple",
            Self::Batch => "batch",
        })
    }
}

/// Redact a secret to its first and last character with `*` fill
/// (`token` → `t***n`). Short values are fully redacted.
pub(crate) fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() < 3 {
        return "*".repeat(chars.len());
    }
    let mut masked = String::new();
    masked.push(chars[0]);
    masked.push_str(&"*".repeat(chars.len() - 2));
    masked.push(chars[chars.len() - 1]);
    masked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_keeps_first_and_last_char() {
        assert_eq!(mask("token"), "t***n");
        assert_eq!(mask("secret-password"), "s*************d");
    }

    #[test]
    fn mask_hides_short_secrets_entirely() {
        assert_eq!(mask("ab"), "**");
        assert_eq!(mask(""), "");
    }

    #[test]
    fn threshold_and_mode_parse_lowercase() {
        assert_eq!("patch".parse::<UpdateThreshold>(), Ok(UpdateThreshold::Patch));
        assert_eq!("batch".parse::<TriggerMode>(), Ok(TriggerMode::Batch));
        assert!("weekly".parse::<UpdateThreshold>().is_err());
        assert!("ALL".parse::<UpdateThreshold>().is_err());
    }
}
