//! # Core Domain Types
//!
//! Advertisement records and their targeting conditions.
//!
//! JSON field names follow the public API (`startAt`, `endAt`,
//! `conditions.ageStart`, ...). Every targeting dimension is optional: an
//! absent or empty dimension means the advertisement is unrestricted on it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Targeted gender code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(Self::Male),
            "F" => Ok(Self::Female),
            other => Err(format!("invalid gender: {}", other)),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Targeted client platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
    Web,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Android => "android",
            Self::Web => "web",
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ios" => Ok(Self::Ios),
            "android" => Ok(Self::Android),
            "web" => Ok(Self::Web),
            other => Err(format!("invalid platform: {}", other)),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Targeting conditions of an advertisement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conditions {
    /// Lowest targeted age, inclusive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_start: Option<u8>,

    /// Highest targeted age, inclusive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_end: Option<u8>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genders: Vec<Gender>,

    /// ISO 3166-1 alpha-2 country codes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub countries: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<Platform>,
}

impl Conditions {
    /// Whether a viewer of the given age is targeted. Open bounds are unrestricted.
    pub fn accepts_age(&self, age: u8) -> bool {
        self.age_start.map_or(true, |start| start <= age)
            && self.age_end.map_or(true, |end| end >= age)
    }

    pub fn accepts_gender(&self, gender: Gender) -> bool {
        self.genders.is_empty() || self.genders.contains(&gender)
    }

    pub fn accepts_country(&self, country: &str) -> bool {
        self.countries.is_empty() || self.countries.iter().any(|c| c.eq_ignore_ascii_case(country))
    }

    pub fn accepts_platform(&self, platform: Platform) -> bool {
        self.platforms.is_empty() || self.platforms.contains(&platform)
    }
}

/// Payload for creating or replacing an advertisement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAdvertisement {
    pub title: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    #[serde(default)]
    pub conditions: Conditions,
}

/// A stored advertisement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advertisement {
    /// Identifier assigned by the document store
    pub id: String,
    pub title: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub conditions: Conditions,
}

impl Advertisement {
    /// Build a stored record from a creation payload
    pub fn from_new(id: String, created_at: DateTime<Utc>, new: NewAdvertisement) -> Self {
        Self {
            id,
            title: new.title,
            start_at: new.start_at,
            end_at: new.end_at,
            created_at,
            conditions: new.conditions,
        }
    }

    /// Replace the mutable fields, keeping identity and creation time
    pub fn apply(&mut self, update: NewAdvertisement) {
        self.title = update.title;
        self.start_at = update.start_at;
        self.end_at = update.end_at;
        self.conditions = update.conditions;
    }

    /// Whether the active window contains `now`
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.start_at <= now && self.end_at >= now
    }

    /// Whether the active window has already closed at `now`
    pub fn has_ended_before(&self, now: DateTime<Utc>) -> bool {
        self.end_at < now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_conditions_json_shape() {
        let json = r#"{"ageStart":18,"ageEnd":24,"genders":["M","F"],"platforms":["ios"]}"#;
        let conditions: Conditions = serde_json::from_str(json).unwrap();

        assert_eq!(conditions.age_start, Some(18));
        assert_eq!(conditions.age_end, Some(24));
        assert_eq!(conditions.genders, vec![Gender::Male, Gender::Female]);
        assert!(conditions.countries.is_empty());
        assert_eq!(conditions.platforms, vec![Platform::Ios]);

        let encoded = serde_json::to_value(&conditions).unwrap();
        assert!(encoded.get("countries").is_none());
    }

    #[test]
    fn test_empty_conditions_are_unrestricted() {
        let conditions = Conditions::default();
        assert!(conditions.accepts_age(99));
        assert!(conditions.accepts_gender(Gender::Female));
        assert!(conditions.accepts_country("TW"));
        assert!(conditions.accepts_platform(Platform::Web));
    }

    #[test]
    fn test_age_bounds_are_inclusive() {
        let conditions = Conditions {
            age_start: Some(18),
            age_end: Some(24),
            ..Default::default()
        };
        assert!(conditions.accepts_age(18));
        assert!(conditions.accepts_age(24));
        assert!(!conditions.accepts_age(17));
        assert!(!conditions.accepts_age(30));
    }

    #[test]
    fn test_active_window() {
        let now = Utc::now();
        let ad = Advertisement::from_new(
            "1".to_string(),
            now,
            NewAdvertisement {
                title: "A".to_string(),
                start_at: now - Duration::hours(1),
                end_at: now + Duration::hours(1),
                conditions: Conditions::default(),
            },
        );

        assert!(ad.is_active_at(now));
        assert!(!ad.is_active_at(now + Duration::hours(2)));
        assert!(ad.has_ended_before(now + Duration::hours(2)));
        assert!(!ad.has_ended_before(now));
    }
}
