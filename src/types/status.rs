//! Availability tiers, resolved status records and the required-level policy

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::CompatError;

/// Cross-browser availability tier.
///
/// Serialized the way Baseline data spells it: `"high"` (widely available),
/// `"low"` (newly available), `false` (limited) and `null` (no data).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tier {
    WidelyAvailable,
    NewlyAvailable,
    Limited,
    #[default]
    Unknown,
}

impl Tier {
    /// Weight used by the score calculator
    pub fn weight(self) -> f64 {
        match self {
            Tier::WidelyAvailable => 1.0,
            Tier::NewlyAvailable => 0.7,
            Tier::Limited => 0.3,
            Tier::Unknown => 0.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::WidelyAvailable => "widely available",
            Tier::NewlyAvailable => "newly available",
            Tier::Limited => "limited availability",
            Tier::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Tier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Tier::WidelyAvailable => serializer.serialize_str("high"),
            Tier::NewlyAvailable => serializer.serialize_str("low"),
            Tier::Limited => serializer.serialize_bool(false),
            Tier::Unknown => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Tier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TierVisitor;

        impl<'de> Visitor<'de> for TierVisitor {
            type Value = Tier;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(r#""high", "low", false or null"#)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Tier, E> {
                match v {
                    "high" => Ok(Tier::WidelyAvailable),
                    "low" => Ok(Tier::NewlyAvailable),
                    other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
                }
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Tier, E> {
                if v {
                    Err(E::invalid_value(de::Unexpected::Bool(true), &self))
                } else {
                    Ok(Tier::Limited)
                }
            }

            fn visit_none<E: de::Error>(self) -> Result<Tier, E> {
                Ok(Tier::Unknown)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Tier, E> {
                Ok(Tier::Unknown)
            }
        }

        deserializer.deserialize_any(TierVisitor)
    }
}

/// Resolved availability of one feature. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AvailabilityStatus {
    #[serde(rename = "baseline", default)]
    pub tier: Tier,
    /// Date the feature became newly available
    #[serde(rename = "baseline_low_date", skip_serializing_if = "Option::is_none", default)]
    pub since_low: Option<String>,
    /// Date the feature became widely available
    #[serde(rename = "baseline_high_date", skip_serializing_if = "Option::is_none", default)]
    pub since_high: Option<String>,
    /// Browser name -> first supporting version
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub support: BTreeMap<String, String>,
}

impl AvailabilityStatus {
    pub fn new(tier: Tier) -> Self {
        Self {
            tier,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_dates(mut self, since_low: Option<&str>, since_high: Option<&str>) -> Self {
        self.since_low = since_low.map(str::to_string);
        self.since_high = since_high.map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_support(mut self, browser: &str, version: &str) -> Self {
        self.support.insert(browser.to_string(), version.to_string());
        self
    }

    /// The date that matches the current tier, if known
    pub fn since(&self) -> Option<&str> {
        match self.tier {
            Tier::WidelyAvailable => self.since_high.as_deref().or(self.since_low.as_deref()),
            Tier::NewlyAvailable => self.since_low.as_deref(),
            Tier::Limited | Tier::Unknown => None,
        }
    }
}

/// Minimum tier a project requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RequiredLevel {
    /// Accept widely and newly available features
    #[default]
    Low,
    /// Accept only widely available features
    High,
}

impl RequiredLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequiredLevel::Low => "low",
            RequiredLevel::High => "high",
        }
    }
}

impl std::fmt::Display for RequiredLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RequiredLevel {
    type Err = CompatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RequiredLevel::Low),
            "high" => Ok(RequiredLevel::High),
            other => Err(CompatError::validation(
                "required_level",
                format!("expected \"low\" or \"high\", got \"{other}\""),
            )),
        }
    }
}

/// Whether `tier` satisfies `level`
pub fn meets_level(tier: Tier, level: RequiredLevel) -> bool {
    match level {
        RequiredLevel::High => tier == Tier::WidelyAvailable,
        RequiredLevel::Low => matches!(tier, Tier::WidelyAvailable | Tier::NewlyAvailable),
    }
}
