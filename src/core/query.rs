//! # List Query Parameters
//!
//! Parsing and validation of the targeting criteria a listing request
//! supplies. The validated query can be rendered back into a canonical
//! name/value map, which is what the cache key is derived from.

use std::collections::{BTreeMap, HashMap};

use crate::core::error::{AdError, AdResult};
use crate::core::types::{Gender, Platform};
use crate::core::validation::{normalize_country, validate_age};

/// Page size used when the request does not specify one
pub const DEFAULT_LIMIT: u32 = 5;

/// Largest page size a request may ask for
pub const MAX_LIMIT: u32 = 100;

/// Validated listing criteria
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub age: Option<u8>,
    pub gender: Option<Gender>,
    pub country: Option<String>,
    pub platform: Option<Platform>,
    pub limit: u32,
    pub offset: u64,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            age: None,
            gender: None,
            country: None,
            platform: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl ListQuery {
    /// Parse raw query parameters.
    ///
    /// Unknown parameters are ignored. `limit` is clamped to `1..=100` and
    /// `offset` to `>= 0` once they parse as integers.
    pub fn from_params(params: &HashMap<String, String>) -> AdResult<Self> {
        let mut query = Self::default();

        if let Some(raw) = non_empty(params, "age") {
            let age: i64 = raw
                .parse()
                .map_err(|_| AdError::validation("age", format!("invalid age: {}", raw)))?;
            query.age = Some(validate_age("age", age)?);
        }

        if let Some(raw) = non_empty(params, "gender") {
            query.gender = Some(raw.parse::<Gender>().map_err(|e| AdError::validation("gender", e))?);
        }

        if let Some(raw) = non_empty(params, "country") {
            query.country = Some(normalize_country(raw)?);
        }

        if let Some(raw) = non_empty(params, "platform") {
            query.platform = Some(raw.parse::<Platform>().map_err(|e| AdError::validation("platform", e))?);
        }

        if let Some(raw) = non_empty(params, "limit") {
            let limit: i64 = raw
                .parse()
                .map_err(|_| AdError::validation("limit", format!("invalid limit value: {}", raw)))?;
            query.limit = limit.clamp(1, i64::from(MAX_LIMIT)) as u32;
        }

        if let Some(raw) = non_empty(params, "offset") {
            let offset: i64 = raw
                .parse()
                .map_err(|_| AdError::validation("offset", format!("invalid offset value: {}", raw)))?;
            query.offset = offset.max(0) as u64;
        }

        Ok(query)
    }

    /// Canonical name/value view of the query, including the effective
    /// paging values since they change the result set.
    pub fn to_params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();

        if let Some(age) = self.age {
            params.insert("age".to_string(), age.to_string());
        }
        if let Some(gender) = self.gender {
            params.insert("gender".to_string(), gender.to_string());
        }
        if let Some(country) = &self.country {
            params.insert("country".to_string(), country.clone());
        }
        if let Some(platform) = self.platform {
            params.insert("platform".to_string(), platform.to_string());
        }
        params.insert("limit".to_string(), self.limit.to_string());
        params.insert("offset".to_string(), self.offset.to_string());

        params
    }
}

fn non_empty<'a>(params: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let query = ListQuery::from_params(&HashMap::new()).unwrap();
        assert_eq!(query, ListQuery::default());
        assert_eq!(query.limit, 5);
        assert_eq!(query.offset, 0);
    }

    #[test]
    fn test_full_query() {
        let query = ListQuery::from_params(&params(&[
            ("age", "20"),
            ("gender", "F"),
            ("country", "tw"),
            ("platform", "android"),
            ("limit", "10"),
            ("offset", "3"),
            ("unknown", "ignored"),
        ]))
        .unwrap();

        assert_eq!(query.age, Some(20));
        assert_eq!(query.gender, Some(Gender::Female));
        assert_eq!(query.country.as_deref(), Some("TW"));
        assert_eq!(query.platform, Some(Platform::Android));
        assert_eq!(query.limit, 10);
        assert_eq!(query.offset, 3);
    }

    #[test]
    fn test_paging_is_clamped() {
        let query = ListQuery::from_params(&params(&[("limit", "1000"), ("offset", "-4")])).unwrap();
        assert_eq!(query.limit, 100);
        assert_eq!(query.offset, 0);

        let query = ListQuery::from_params(&params(&[("limit", "0")])).unwrap();
        assert_eq!(query.limit, 1);
    }

    #[test]
    fn test_invalid_values_rejected() {
        for (name, value) in [
            ("age", "abc"),
            ("age", "0"),
            ("age", "101"),
            ("gender", "X"),
            ("country", "ZZ"),
            ("platform", "windows"),
            ("limit", "ten"),
            ("offset", "1.5"),
        ] {
            let result = ListQuery::from_params(&params(&[(name, value)]));
            assert!(
                matches!(result, Err(AdError::Validation { .. })),
                "{}={} should be rejected",
                name,
                value
            );
        }
    }

    #[test]
    fn test_params_include_paging() {
        let query = ListQuery::from_params(&params(&[("age", "20")])).unwrap();
        let rendered = query.to_params();

        assert_eq!(rendered.get("age").map(String::as_str), Some("20"));
        assert_eq!(rendered.get("limit").map(String::as_str), Some("5"));
        assert_eq!(rendered.get("offset").map(String::as_str), Some("0"));
        assert!(!rendered.contains_key("gender"));
    }
}
