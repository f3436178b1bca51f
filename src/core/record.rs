/*!
 * Row validation and per-file identifier deduplication
 */

use std::collections::HashSet;

/// Number of leading fields consumed from every row
pub const RECORD_FIELDS: usize = 6;

/// Output header, one name per consumed field
pub const RECORD_HEADER: [&str; RECORD_FIELDS] = [
    "cnpj_completo",
    "razao_social",
    "endereco_completo",
    "email",
    "ano_abertura",
    "telefones",
];

/// Validated projection of one input row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    identifier: String,
    name: String,
    address: String,
    email: String,
    founding_year: String,
    phone_text: String,
}

impl Record {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn phone_text(&self) -> &str {
        &self.phone_text
    }

    /// The six fields in original column order
    pub fn fields(&self) -> [&str; RECORD_FIELDS] {
        [
            &self.identifier,
            &self.name,
            &self.address,
            &self.email,
            &self.founding_year,
            &self.phone_text,
        ]
    }
}

/// Outcome of validating one data row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowVerdict {
    /// Fewer than six fields
    Malformed,
    /// Identifier is not exactly 14 ASCII digits after trimming
    InvalidIdentifier,
    /// Identifier already accepted earlier in this file
    Duplicate,
    Accepted(Record),
}

/// Whether `value` is exactly 14 ASCII digits
pub fn is_valid_identifier(value: &str) -> bool {
    value.len() == 14 && value.bytes().all(|b| b.is_ascii_digit())
}

/// Per-file validator holding the set of identifiers already accepted.
///
/// Owned by a single file task and dropped with it; there is no
/// cross-file deduplication.
#[derive(Debug, Default)]
pub struct RecordValidator {
    seen: HashSet<String>,
    rows_seen: u64,
    rows_malformed: u64,
    invalid_identifiers: u64,
    duplicates: u64,
}

impl RecordValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate one row. Never fails; rejected rows are only counted.
    pub fn validate<S: AsRef<str>>(&mut self, fields: &[S]) -> RowVerdict {
        if fields.len() < RECORD_FIELDS {
            self.rows_malformed += 1;
            return RowVerdict::Malformed;
        }
        self.rows_seen += 1;

        let identifier = fields[0].as_ref().trim();
        if !is_valid_identifier(identifier) {
            self.invalid_identifiers += 1;
            return RowVerdict::InvalidIdentifier;
        }

        if !self.seen.insert(identifier.to_string()) {
            self.duplicates += 1;
            return RowVerdict::Duplicate;
        }

        RowVerdict::Accepted(Record {
            identifier: identifier.to_string(),
            name: fields[1].as_ref().to_string(),
            address: fields[2].as_ref().to_string(),
            email: fields[3].as_ref().to_string(),
            founding_year: fields[4].as_ref().to_string(),
            phone_text: fields[5].as_ref().to_string(),
        })
    }

    /// Rows with at least six fields
    pub fn rows_seen(&self) -> u64 {
        self.rows_seen
    }

    pub fn rows_malformed(&self) -> u64 {
        self.rows_malformed
    }

    pub fn invalid_identifiers(&self) -> u64 {
        self.invalid_identifiers
    }

    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }

    /// Records accepted so far
    pub fn unique_records(&self) -> u64 {
        self.seen.len() as u64
    }
}
