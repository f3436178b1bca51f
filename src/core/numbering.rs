/*!
 * Brazilian numbering plan
 *
 * Validates area codes (DDD) and subscriber formats, reports line types,
 * and resolves operator names from an optional prefix table. Without a
 * table the operator lookup reports `Unavailable`, which sends mobile
 * numbers to the heuristic tier.
 *
 * Prefix table format: one `prefix;carrier` pair per line, prefixes are
 * national digits (area code + leading subscriber digits), `#` starts a
 * comment. The longest matching prefix wins.
 */

use std::collections::HashMap;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use tracing::info;

use super::carrier::{CarrierLookup, LineType, NumberingPlan, PlanNumber};
use super::phone::{NormalizedPhone, COUNTRY_CODE};
use crate::error::{Result, SplitError};

/// Area codes assigned by Anatel
const AREA_CODES: &[u8] = &[
    11, 12, 13, 14, 15, 16, 17, 18, 19, //
    21, 22, 24, 27, 28, //
    31, 32, 33, 34, 35, 37, 38, //
    41, 42, 43, 44, 45, 46, 47, 48, 49, //
    51, 53, 54, 55, //
    61, 62, 63, 64, 65, 66, 67, 68, 69, //
    71, 73, 74, 75, 77, 79, //
    81, 82, 83, 84, 85, 86, 87, 88, 89, //
    91, 92, 93, 94, 95, 96, 97, 98, 99,
];

pub fn is_valid_area_code(code: &str) -> bool {
    code.len() == 2
        && code
            .parse::<u8>()
            .map(|n| AREA_CODES.contains(&n))
            .unwrap_or(false)
}

/// Prefix → operator name table with longest-prefix lookup
#[derive(Debug, Clone, Default)]
pub struct CarrierTable {
    prefixes: HashMap<String, String>,
    longest: usize,
}

impl CarrierTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, prefix: impl Into<String>, carrier: impl Into<String>) {
        let prefix = prefix.into();
        self.longest = self.longest.max(prefix.len());
        self.prefixes.insert(prefix, carrier.into());
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Operator for the longest prefix of `national` present in the table
    pub fn lookup(&self, national: &str) -> Option<&str> {
        let max = self.longest.min(national.len());
        (1..=max)
            .rev()
            .find_map(|len| self.prefixes.get(&national[..len]))
            .map(String::as_str)
    }

    /// Parse a table from `prefix;carrier` text
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .comment(Some(b'#'))
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut table = Self::new();
        for result in csv_reader.records() {
            let record = result?;
            let line = record.position().map(|p| p.line() as usize).unwrap_or(0);

            let prefix = record.get(0).unwrap_or("");
            let carrier = record.get(1).unwrap_or("");
            if prefix.is_empty() && record.len() <= 1 {
                continue;
            }
            if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
                return Err(SplitError::CarrierTable {
                    line,
                    reason: format!("prefix '{}' is not numeric", prefix),
                });
            }
            if carrier.is_empty() {
                return Err(SplitError::CarrierTable {
                    line,
                    reason: "missing carrier name".to_string(),
                });
            }
            table.insert(prefix, carrier);
        }

        Ok(table)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let table = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            prefixes = table.len(),
            "Loaded carrier prefix table"
        );
        Ok(table)
    }
}

/// Numbering plan for region BR
#[derive(Debug, Clone, Default)]
pub struct BrazilNumberingPlan {
    carriers: Option<CarrierTable>,
}

impl BrazilNumberingPlan {
    /// Plan validating numbers only; operator lookup is unavailable
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_carriers(carriers: CarrierTable) -> Self {
        Self {
            carriers: Some(carriers),
        }
    }
}

impl NumberingPlan for BrazilNumberingPlan {
    fn parse(&self, phone: &NormalizedPhone) -> Option<PlanNumber> {
        let digits = phone.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let national = match digits.strip_prefix(COUNTRY_CODE) {
            Some(rest) if digits.len() >= 12 => rest,
            _ => digits,
        };
        if !(10..=11).contains(&national.len()) {
            return None;
        }

        Some(PlanNumber {
            area_code: national[..2].to_string(),
            subscriber: national[2..].to_string(),
        })
    }

    fn is_valid(&self, number: &PlanNumber) -> bool {
        is_valid_area_code(&number.area_code) && self.line_type(number) != LineType::Other
    }

    fn line_type(&self, number: &PlanNumber) -> LineType {
        let subscriber = number.subscriber.as_bytes();
        match (subscriber.len(), subscriber.first()) {
            (8, Some(b'2'..=b'5')) => LineType::FixedLine,
            (9, Some(b'9')) => LineType::Mobile,
            _ => LineType::Other,
        }
    }

    fn carrier_name(&self, number: &PlanNumber) -> CarrierLookup {
        let Some(table) = &self.carriers else {
            return CarrierLookup::Unavailable;
        };

        match table.lookup(&number.national()) {
            Some(name) => CarrierLookup::Found(name.to_string()),
            None => CarrierLookup::Unknown,
        }
    }
}
