/*!
 * Phone number extraction and normalization
 *
 * Registry phone fields are free text: several numbers, odd separators,
 * empty `()` placeholders. Only the first recognizable number is kept and
 * rewritten as `55` + area code + subscriber number.
 */

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Brazilian country calling code
pub const COUNTRY_CODE: &str = "55";

/// Shortest normalized value: country code + area code + 8-digit subscriber
pub const MIN_NORMALIZED_LEN: usize = 12;

/// Either `DD-NNNN[N]-NNNN` (optional hyphen/space separators) or
/// `(DD) ` followed by a run of digits, spaces and hyphens. Leftmost match
/// wins; at the same position the first alternative is preferred.
static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]{2})[- ]*([0-9]{4,5})[- ]*([0-9]{4})|\(([0-9]{2})\)\s*([0-9\s-]+)")
        .expect("phone pattern is valid")
});

/// Digit-only phone number starting with the country code, or empty
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NormalizedPhone(String);

impl NormalizedPhone {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Area code digits, when present
    pub fn area_code(&self) -> Option<&str> {
        self.0.get(2..4)
    }

    /// Subscriber digits after country and area code
    pub fn subscriber(&self) -> Option<&str> {
        self.0.get(4..).filter(|s| !s.is_empty())
    }
}

impl fmt::Display for NormalizedPhone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Apply the ninth-digit rule: 8-digit numbers in the mobile range 6-9
/// gained a leading `9` when Brazilian mobiles moved to nine digits.
pub fn apply_ninth_digit(subscriber: &str) -> String {
    let needs_nine = subscriber.len() == 8
        && subscriber.bytes().all(|b| b.is_ascii_digit())
        && matches!(subscriber.as_bytes()[0], b'6'..=b'9');

    if needs_nine {
        format!("9{}", subscriber)
    } else {
        subscriber.to_string()
    }
}

/// Extract and normalize the first phone number found in `raw`
pub fn normalize_first_phone(raw: &str) -> NormalizedPhone {
    if raw.trim().is_empty() || raw.contains("()") {
        return NormalizedPhone::empty();
    }

    let Some(caps) = PHONE_PATTERN.captures(raw) else {
        return NormalizedPhone::empty();
    };

    let (area_code, subscriber) = if let Some(area) = caps.get(1) {
        let head = caps.get(2).map_or("", |m| m.as_str());
        let tail = caps.get(3).map_or("", |m| m.as_str());
        (area.as_str(), format!("{}{}", head, tail))
    } else if let (Some(area), Some(run)) = (caps.get(4), caps.get(5)) {
        let digits: String = run.as_str().chars().filter(|c| c.is_ascii_digit()).collect();
        (area.as_str(), digits)
    } else {
        return NormalizedPhone::empty();
    };

    if subscriber.is_empty() {
        return NormalizedPhone::empty();
    }

    let subscriber = apply_ninth_digit(&subscriber);
    NormalizedPhone(format!("{}{}{}", COUNTRY_CODE, area_code, subscriber))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parenthesized_landline() {
        assert_eq!(normalize_first_phone("(82) 3311-1200").as_str(), "558233111200");
    }

    #[test]
    fn test_hyphenated_area_code() {
        assert_eq!(normalize_first_phone("82-33111200").as_str(), "558233111200");
        assert_eq!(normalize_first_phone("82 3311 1200").as_str(), "558233111200");
    }

    #[test]
    fn test_nine_digit_mobile() {
        assert_eq!(normalize_first_phone("(82) 98888-7777").as_str(), "5582988887777");
        assert_eq!(normalize_first_phone("82-988887777").as_str(), "5582988887777");
    }

    #[test]
    fn test_empty_markers() {
        assert!(normalize_first_phone("").is_empty());
        assert!(normalize_first_phone("   ").is_empty());
        assert!(normalize_first_phone("()").is_empty());
        assert!(normalize_first_phone("() 3311-1200").is_empty());
        assert!(normalize_first_phone("sem telefone").is_empty());
    }

    #[test]
    fn test_ninth_digit_rule() {
        assert_eq!(apply_ninth_digit("68887777"), "968887777");
        assert_eq!(apply_ninth_digit("98887777"), "998887777");
        assert_eq!(apply_ninth_digit("33111200"), "33111200");
        assert_eq!(apply_ninth_digit("988887777"), "988887777");
        assert_eq!(normalize_first_phone("(82) 6888-7777").as_str(), "5582968887777");
    }

    #[test]
    fn test_first_number_wins() {
        let phone = normalize_first_phone("(82) 3311-1200 / (82) 98888-7777");
        assert_eq!(phone.as_str(), "558233111200");

        let phone = normalize_first_phone("tel: 81-99999-0000, (82) 3311-1200");
        assert_eq!(phone.as_str(), "5581999990000");
    }

    #[test]
    fn test_parenthesized_run_strips_separators() {
        // The run after "(DD)" absorbs spaces and hyphens
        let phone = normalize_first_phone("(79) 3 2 1 1-4455");
        assert_eq!(phone.as_str(), "557932114455");
    }

    #[test]
    fn test_accessors() {
        let phone = normalize_first_phone("(82) 98888-7777");
        assert_eq!(phone.len(), 13);
        assert_eq!(phone.area_code(), Some("82"));
        assert_eq!(phone.subscriber(), Some("988887777"));
        assert_eq!(phone.to_string(), "5582988887777");
        assert_eq!(NormalizedPhone::empty().area_code(), None);
    }
}
