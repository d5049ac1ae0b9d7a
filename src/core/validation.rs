//! # Input Validation
//!
//! Checks applied to advertisement payloads before they reach the store.
//! Query parameter validation lives in [`crate::core::query`].

use chrono::{DateTime, Utc};

use crate::core::error::{AdError, AdResult};
use crate::core::types::{Conditions, NewAdvertisement};

/// Youngest targetable age
pub const MIN_AGE: u8 = 1;

/// Oldest targetable age
pub const MAX_AGE: u8 = 100;

/// ISO 3166-1 alpha-2 codes
const COUNTRY_CODES: &[&str] = &[
    "AD", "AE", "AF", "AG", "AI", "AL", "AM", "AO", "AQ", "AR", "AS", "AT", "AU", "AW", "AX", "AZ",
    "BA", "BB", "BD", "BE", "BF", "BG", "BH", "BI", "BJ", "BL", "BM", "BN", "BO", "BQ", "BR", "BS",
    "BT", "BV", "BW", "BY", "BZ", "CA", "CC", "CD", "CF", "CG", "CH", "CI", "CK", "CL", "CM", "CN",
    "CO", "CR", "CU", "CV", "CW", "CX", "CY", "CZ", "DE", "DJ", "DK", "DM", "DO", "DZ", "EC", "EE",
    "EG", "EH", "ER", "ES", "ET", "FI", "FJ", "FK", "FM", "FO", "FR", "GA", "GB", "GD", "GE", "GF",
    "GG", "GH", "GI", "GL", "GM", "GN", "GP", "GQ", "GR", "GS", "GT", "GU", "GW", "GY", "HK", "HM",
    "HN", "HR", "HT", "HU", "ID", "IE", "IL", "IM", "IN", "IO", "IQ", "IR", "IS", "IT", "JE", "JM",
    "JO", "JP", "KE", "KG", "KH", "KI", "KM", "KN", "KP", "KR", "KW", "KY", "KZ", "LA", "LB", "LC",
    "LI", "LK", "LR", "LS", "LT", "LU", "LV", "LY", "MA", "MC", "MD", "ME", "MF", "MG", "MH", "MK",
    "ML", "MM", "MN", "MO", "MP", "MQ", "MR", "MS", "MT", "MU", "MV", "MW", "MX", "MY", "MZ", "NA",
    "NC", "NE", "NF", "NG", "NI", "NL", "NO", "NP", "NR", "NU", "NZ", "OM", "PA", "PE", "PF", "PG",
    "PH", "PK", "PL", "PM", "PN", "PR", "PS", "PT", "PW", "PY", "QA", "RE", "RO", "RS", "RU", "RW",
    "SA", "SB", "SC", "SD", "SE", "SG", "SH", "SI", "SJ", "SK", "SL", "SM", "SN", "SO", "SR", "SS",
    "ST", "SV", "SX", "SY", "SZ", "TC", "TD", "TF", "TG", "TH", "TJ", "TK", "TL", "TM", "TN", "TO",
    "TR", "TT", "TV", "TW", "TZ", "UA", "UG", "UM", "US", "UY", "UZ", "VA", "VC", "VE", "VG", "VI",
    "VN", "VU", "WF", "WS", "YE", "YT", "ZA", "ZM", "ZW",
];

/// Normalize a country code to upper case, rejecting unknown codes
pub fn normalize_country(code: &str) -> AdResult<String> {
    let upper = code.trim().to_ascii_uppercase();
    if COUNTRY_CODES.binary_search(&upper.as_str()).is_ok() {
        Ok(upper)
    } else {
        Err(AdError::validation("country", format!("invalid country code: {}", code)))
    }
}

/// Check that an age lies in the targetable range
pub fn validate_age(field: &str, age: i64) -> AdResult<u8> {
    if age < i64::from(MIN_AGE) || age > i64::from(MAX_AGE) {
        return Err(AdError::validation(
            field,
            format!("must be between {} and {}, got {}", MIN_AGE, MAX_AGE, age),
        ));
    }
    Ok(age as u8)
}

/// Validate a creation or replacement payload against the current time.
///
/// Returns the payload with country codes normalized to upper case.
pub fn validate_advertisement(ad: NewAdvertisement, now: DateTime<Utc>) -> AdResult<NewAdvertisement> {
    if ad.title.trim().is_empty() {
        return Err(AdError::validation("title", "must not be empty"));
    }

    if ad.start_at > ad.end_at {
        return Err(AdError::validation("startAt", "startAt must be before endAt"));
    }

    if ad.end_at <= now {
        return Err(AdError::validation("endAt", "endAt must be in the future"));
    }

    let conditions = validate_conditions(ad.conditions)?;

    Ok(NewAdvertisement { conditions, ..ad })
}

fn validate_conditions(conditions: Conditions) -> AdResult<Conditions> {
    if let Some(start) = conditions.age_start {
        validate_age("ageStart", i64::from(start))?;
    }
    if let Some(end) = conditions.age_end {
        validate_age("ageEnd", i64::from(end))?;
    }
    if let (Some(start), Some(end)) = (conditions.age_start, conditions.age_end) {
        if start > end {
            return Err(AdError::validation("ageStart", "ageStart must be less than or equal to ageEnd"));
        }
    }

    let countries = conditions
        .countries
        .iter()
        .map(|c| normalize_country(c))
        .collect::<AdResult<Vec<_>>>()?;

    Ok(Conditions { countries, ..conditions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Gender;
    use chrono::Duration;

    fn payload(now: DateTime<Utc>) -> NewAdvertisement {
        NewAdvertisement {
            title: "A".to_string(),
            start_at: now,
            end_at: now + Duration::hours(24),
            conditions: Conditions {
                age_start: Some(18),
                age_end: Some(24),
                genders: vec![Gender::Male, Gender::Female],
                countries: vec!["tw".to_string(), "JP".to_string()],
                platforms: vec![],
            },
        }
    }

    #[test]
    fn test_country_table_is_sorted() {
        assert!(COUNTRY_CODES.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_valid_payload_is_normalized() {
        let now = Utc::now();
        let ad = validate_advertisement(payload(now), now).unwrap();
        assert_eq!(ad.conditions.countries, vec!["TW".to_string(), "JP".to_string()]);
    }

    #[test]
    fn test_window_checks() {
        let now = Utc::now();

        let mut reversed = payload(now);
        reversed.start_at = reversed.end_at + Duration::seconds(1);
        assert!(matches!(
            validate_advertisement(reversed, now),
            Err(AdError::Validation { field, .. }) if field == "startAt"
        ));

        let mut expired = payload(now);
        expired.start_at = now - Duration::hours(2);
        expired.end_at = now - Duration::hours(1);
        assert!(matches!(
            validate_advertisement(expired, now),
            Err(AdError::Validation { field, .. }) if field == "endAt"
        ));
    }

    #[test]
    fn test_age_checks() {
        let now = Utc::now();

        let mut out_of_range = payload(now);
        out_of_range.conditions.age_end = Some(101);
        assert!(validate_advertisement(out_of_range, now).is_err());

        let mut inverted = payload(now);
        inverted.conditions.age_start = Some(30);
        inverted.conditions.age_end = Some(20);
        assert!(validate_advertisement(inverted, now).is_err());

        let mut zero = payload(now);
        zero.conditions.age_start = Some(0);
        assert!(validate_advertisement(zero, now).is_err());
    }

    #[test]
    fn test_unknown_country_rejected() {
        let now = Utc::now();
        let mut ad = payload(now);
        ad.conditions.countries = vec!["XX".to_string()];
        assert!(validate_advertisement(ad, now).is_err());
    }

    #[test]
    fn test_blank_title_rejected() {
        let now = Utc::now();
        let mut ad = payload(now);
        ad.title = "   ".to_string();
        assert!(validate_advertisement(ad, now).is_err());
    }
}
