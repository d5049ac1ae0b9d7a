//! # Advertisement Filter
//!
//! Translates validated listing criteria into the expression the document
//! store is queried with. Every filter requires the active window to
//! contain "now"; each supplied criterion adds one constraint on the
//! matching targeting condition.
//!
//! A targeting dimension the advertisement leaves empty is unrestricted, so
//! it matches any value supplied for that dimension.

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

use crate::core::query::ListQuery;
use crate::core::types::{Advertisement, Gender, Platform};

/// Query expression over advertisements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdFilter {
    /// `startAt <= active_at AND endAt >= active_at`
    pub active_at: DateTime<Utc>,
    /// `ageStart <= age AND ageEnd >= age`
    pub age: Option<u8>,
    pub gender: Option<Gender>,
    pub country: Option<String>,
    pub platform: Option<Platform>,
}

impl AdFilter {
    /// Filter that only requires the active window to contain `now`
    pub fn active_at(now: DateTime<Utc>) -> Self {
        Self {
            active_at: now,
            age: None,
            gender: None,
            country: None,
            platform: None,
        }
    }

    /// Build the filter for a validated listing query
    pub fn from_query(query: &ListQuery, now: DateTime<Utc>) -> Self {
        Self {
            active_at: now,
            age: query.age,
            gender: query.gender,
            country: query.country.clone(),
            platform: query.platform,
        }
    }

    /// Evaluate the filter against one record
    pub fn matches(&self, ad: &Advertisement) -> bool {
        let conditions = &ad.conditions;

        ad.is_active_at(self.active_at)
            && self.age.map_or(true, |age| conditions.accepts_age(age))
            && self.gender.map_or(true, |g| conditions.accepts_gender(g))
            && self
                .country
                .as_deref()
                .map_or(true, |c| conditions.accepts_country(c))
            && self.platform.map_or(true, |p| conditions.accepts_platform(p))
    }

    /// Render the filter as a MongoDB-style query document
    pub fn to_document(&self) -> Value {
        let now = self.active_at.to_rfc3339();
        let mut clauses = vec![
            json!({ "startAt": { "$lte": now } }),
            json!({ "endAt": { "$gte": now } }),
        ];

        if let Some(age) = self.age {
            clauses.push(unrestricted_or("conditions.ageStart", json!({ "$lte": age })));
            clauses.push(unrestricted_or("conditions.ageEnd", json!({ "$gte": age })));
        }
        if let Some(gender) = self.gender {
            clauses.push(unrestricted_or("conditions.genders", json!({ "$in": [gender.as_str()] })));
        }
        if let Some(country) = &self.country {
            clauses.push(unrestricted_or("conditions.countries", json!({ "$in": [country] })));
        }
        if let Some(platform) = self.platform {
            clauses.push(unrestricted_or(
                "conditions.platforms",
                json!({ "$in": [platform.as_str()] }),
            ));
        }

        let mut document = Map::new();
        document.insert("$and".to_string(), Value::Array(clauses));
        Value::Object(document)
    }
}

fn unrestricted_or(field: &str, constraint: Value) -> Value {
    json!({
        "$or": [
            { field: { "$exists": false } },
            { field: constraint },
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Conditions, NewAdvertisement};
    use chrono::Duration;

    fn ad(now: DateTime<Utc>, conditions: Conditions) -> Advertisement {
        Advertisement::from_new(
            "id".to_string(),
            now,
            NewAdvertisement {
                title: "A".to_string(),
                start_at: now - Duration::hours(1),
                end_at: now + Duration::hours(24),
                conditions,
            },
        )
    }

    #[test]
    fn test_age_range_filter() {
        let now = Utc::now();
        let target = ad(
            now,
            Conditions {
                age_start: Some(18),
                age_end: Some(24),
                genders: vec![Gender::Male, Gender::Female],
                ..Default::default()
            },
        );

        let twenty = ListQuery {
            age: Some(20),
            ..Default::default()
        };
        let thirty = ListQuery {
            age: Some(30),
            ..Default::default()
        };

        assert!(AdFilter::from_query(&twenty, now).matches(&target));
        assert!(!AdFilter::from_query(&thirty, now).matches(&target));
    }

    #[test]
    fn test_membership_filters() {
        let now = Utc::now();
        let target = ad(
            now,
            Conditions {
                countries: vec!["TW".to_string()],
                platforms: vec![Platform::Ios],
                ..Default::default()
            },
        );

        let matching = ListQuery {
            country: Some("TW".to_string()),
            platform: Some(Platform::Ios),
            gender: Some(Gender::Female),
            ..Default::default()
        };
        assert!(AdFilter::from_query(&matching, now).matches(&target));

        let wrong_country = ListQuery {
            country: Some("JP".to_string()),
            ..Default::default()
        };
        assert!(!AdFilter::from_query(&wrong_country, now).matches(&target));

        let wrong_platform = ListQuery {
            platform: Some(Platform::Web),
            ..Default::default()
        };
        assert!(!AdFilter::from_query(&wrong_platform, now).matches(&target));
    }

    #[test]
    fn test_inactive_ads_never_match() {
        let now = Utc::now();
        let target = ad(now, Conditions::default());

        assert!(AdFilter::active_at(now).matches(&target));
        assert!(!AdFilter::active_at(now + Duration::days(2)).matches(&target));
        assert!(!AdFilter::active_at(now - Duration::days(2)).matches(&target));
    }

    #[test]
    fn test_document_rendering() {
        let now = Utc::now();
        let query = ListQuery {
            age: Some(20),
            gender: Some(Gender::Male),
            ..Default::default()
        };
        let document = AdFilter::from_query(&query, now).to_document();
        let clauses = document["$and"].as_array().unwrap();

        // window (2) + age (2) + gender (1)
        assert_eq!(clauses.len(), 5);
        assert_eq!(clauses[0]["startAt"]["$lte"], json!(now.to_rfc3339()));
        assert_eq!(clauses[4]["$or"][1]["conditions.genders"]["$in"], json!(["M"]));
    }
}
