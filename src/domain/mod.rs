//! Domain types for account management.
//!
//! The preference vocabularies an account can choose from, and the login
//! lockout policy.

pub mod lockout;

pub use lockout::LockoutPolicy;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Interface theme an account can pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Default,
    Dopamine,
    Macaron,
    Teal,
    Uniklo,
}

impl Theme {
    pub const ALL: [Self; 5] = [
        Self::Default,
        Self::Dopamine,
        Self::Macaron,
        Self::Teal,
        Self::Uniklo,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Dopamine => "dopamine",
            Self::Macaron => "macaron",
            Self::Teal => "teal",
            Self::Uniklo => "uniklo",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|theme| theme.as_str() == s)
            .ok_or_else(|| format!("Unknown theme: {s}"))
    }
}

/// Preferred interface language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Zh,
    En,
}

impl Language {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Zh => "zh",
            Self::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zh" => Ok(Self::Zh),
            "en" => Ok(Self::En),
            other => Err(format!("Unknown language: {other}")),
        }
    }
}
