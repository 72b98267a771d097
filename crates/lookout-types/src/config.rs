use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Per-tenant scan configuration, owned and mutated by the admin layer.
/// The scan engine only ever reads it. Credentials are opaque strings here;
/// encryption at rest is the admin layer's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantConfig {
    pub tenant_id: Uuid,
    pub api_id: Option<String>,
    pub api_hash: Option<String>,
    pub phone_number: Option<String>,
    pub session_path: Option<String>,
    #[serde(default)]
    pub targets: Vec<ScanTarget>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub lookback: Lookback,
}

impl TenantConfig {
    /// Keywords lowered, trimmed, empties dropped. Done once at load so the
    /// match engine never re-normalizes per message.
    pub fn normalized_keywords(&self) -> Vec<String> {
        normalize_terms(&self.keywords)
    }

    pub fn normalized_links(&self) -> Vec<String> {
        normalize_terms(&self.links)
    }
}

fn normalize_terms(terms: &[String]) -> Vec<String> {
    terms
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Relative window used when a target carries no explicit dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lookback {
    OneDay,
    #[default]
    SevenDays,
    ThirtyDays,
}

impl Lookback {
    pub fn duration(self) -> Duration {
        match self {
            Lookback::OneDay => Duration::days(1),
            Lookback::SevenDays => Duration::days(7),
            Lookback::ThirtyDays => Duration::days(30),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Lookback::OneDay => "1day",
            Lookback::SevenDays => "7days",
            Lookback::ThirtyDays => "30days",
        }
    }

    /// Unknown strings fall back to the 7-day default rather than erroring,
    /// matching what stored configs have historically contained.
    pub fn parse(s: &str) -> Self {
        match s {
            "1day" => Lookback::OneDay,
            "30days" => Lookback::ThirtyDays,
            _ => Lookback::SevenDays,
        }
    }
}

impl Serialize for Lookback {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Lookback {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Lookback::parse(&s))
    }
}

/// One group to scan. Resolved to a tagged variant at config-load time; the
/// engine never re-interprets the raw JSON shape downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanTarget {
    /// Bare group id — window comes from the tenant's lookback.
    Bare { group_id: i64 },
    /// Group with an explicit (possibly half-open) date window.
    Windowed {
        group_id: i64,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    },
}

impl ScanTarget {
    pub fn group_id(&self) -> i64 {
        match self {
            ScanTarget::Bare { group_id } => *group_id,
            ScanTarget::Windowed { group_id, .. } => *group_id,
        }
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        match self {
            ScanTarget::Bare { .. } => None,
            ScanTarget::Windowed { start_date, .. } => *start_date,
        }
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        match self {
            ScanTarget::Bare { .. } => None,
            ScanTarget::Windowed { end_date, .. } => *end_date,
        }
    }
}

/// Stored configs contain either a bare integer id or an object with
/// `id`/`startDate`/`endDate` fields. Both shapes are accepted; an object
/// without dates collapses to `Bare`. Unparseable date strings are dropped,
/// not errors, so one bad entry cannot wedge a tenant's whole config.
#[derive(Deserialize)]
#[serde(untagged)]
enum TargetRepr {
    Bare(i64),
    Object {
        id: i64,
        #[serde(rename = "startDate")]
        start_date: Option<String>,
        #[serde(rename = "endDate")]
        end_date: Option<String>,
    },
}

fn parse_config_date(s: Option<String>) -> Option<NaiveDate> {
    s.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}

impl<'de> Deserialize<'de> for ScanTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match TargetRepr::deserialize(deserializer)? {
            TargetRepr::Bare(group_id) => Ok(ScanTarget::Bare { group_id }),
            TargetRepr::Object {
                id,
                start_date,
                end_date,
            } => {
                let start_date = parse_config_date(start_date);
                let end_date = parse_config_date(end_date);
                if start_date.is_none() && end_date.is_none() {
                    Ok(ScanTarget::Bare { group_id: id })
                } else {
                    Ok(ScanTarget::Windowed {
                        group_id: id,
                        start_date,
                        end_date,
                    })
                }
            }
        }
    }
}

impl Serialize for ScanTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        match self {
            ScanTarget::Bare { group_id } => serializer.serialize_i64(*group_id),
            ScanTarget::Windowed {
                group_id,
                start_date,
                end_date,
            } => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("id", group_id)?;
                if let Some(d) = start_date {
                    map.serialize_entry("startDate", &d.format("%Y-%m-%d").to_string())?;
                }
                if let Some(d) = end_date {
                    map.serialize_entry("endDate", &d.format("%Y-%m-%d").to_string())?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_accepts_bare_id() {
        let t: ScanTarget = serde_json::from_str("-1001234567890").unwrap();
        assert_eq!(t, ScanTarget::Bare { group_id: -1001234567890 });
    }

    #[test]
    fn test_target_accepts_windowed_object() {
        let t: ScanTarget =
            serde_json::from_str(r#"{"id": 42, "startDate": "2024-01-01", "endDate": "2024-01-31"}"#)
                .unwrap();
        assert_eq!(
            t,
            ScanTarget::Windowed {
                group_id: 42,
                start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
                end_date: NaiveDate::from_ymd_opt(2024, 1, 31),
            }
        );
    }

    #[test]
    fn test_target_object_without_dates_collapses_to_bare() {
        let t: ScanTarget = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        assert_eq!(t, ScanTarget::Bare { group_id: 42 });
    }

    #[test]
    fn test_target_drops_unparseable_dates() {
        let t: ScanTarget =
            serde_json::from_str(r#"{"id": 42, "startDate": "tomorrow", "endDate": "2024-02-01"}"#)
                .unwrap();
        assert_eq!(
            t,
            ScanTarget::Windowed {
                group_id: 42,
                start_date: None,
                end_date: NaiveDate::from_ymd_opt(2024, 2, 1),
            }
        );
    }

    #[test]
    fn test_lookback_parse_and_fallback() {
        assert_eq!(Lookback::parse("1day"), Lookback::OneDay);
        assert_eq!(Lookback::parse("30days"), Lookback::ThirtyDays);
        assert_eq!(Lookback::parse("forever"), Lookback::SevenDays);
        let lb: Lookback = serde_json::from_str("\"1day\"").unwrap();
        assert_eq!(lb, Lookback::OneDay);
    }

    #[test]
    fn test_keyword_normalization() {
        let config = TenantConfig {
            tenant_id: Uuid::new_v4(),
            api_id: None,
            api_hash: None,
            phone_number: None,
            session_path: None,
            targets: vec![],
            keywords: vec!["  Acme ".into(), "".into(), "  ".into(), "GiveAway".into()],
            links: vec![],
            lookback: Lookback::default(),
        };
        assert_eq!(config.normalized_keywords(), vec!["acme", "giveaway"]);
    }
}
