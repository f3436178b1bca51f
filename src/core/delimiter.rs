/*!
 * Delimiter auto-detection from a file's header line
 */

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info, warn};

use super::latin1::decode_latin1;
use crate::error::{Result, SplitError};

/// Minimum column count a usable header is expected to yield
pub const EXPECTED_COLUMNS: usize = 6;

/// Field delimiters considered during detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delimiter {
    Comma,
    Semicolon,
    Tab,
}

impl Delimiter {
    /// Candidates in tie-breaking priority order
    pub const CANDIDATES: [Delimiter; 3] = [Delimiter::Comma, Delimiter::Semicolon, Delimiter::Tab];

    pub fn as_char(self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Semicolon => ';',
            Delimiter::Tab => '\t',
        }
    }

    pub fn as_byte(self) -> u8 {
        self.as_char() as u8
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Tab => write!(f, "TAB"),
            other => write!(f, "{}", other.as_char()),
        }
    }
}

/// Delimiter selected for one file, with the column count it produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimiterChoice {
    pub delimiter: Delimiter,
    pub columns: usize,
}

impl DelimiterChoice {
    /// Whether the header reached the expected column count
    pub fn is_confident(&self) -> bool {
        self.columns >= EXPECTED_COLUMNS
    }
}

/// Count fields produced by splitting on `delimiter`.
///
/// Trailing empty fields are not counted, so `a;b;;` yields 2. A line
/// without the delimiter is a single field.
pub fn count_fields(line: &str, delimiter: char) -> usize {
    if !line.contains(delimiter) {
        return 1;
    }
    let parts: Vec<&str> = line.split(delimiter).collect();
    let trailing_empty = parts.iter().rev().take_while(|p| p.is_empty()).count();
    parts.len() - trailing_empty
}

/// Pick the candidate yielding the most fields; ties keep the earlier one
pub fn detect_delimiter(header: &str) -> DelimiterChoice {
    let mut best = DelimiterChoice {
        delimiter: Delimiter::Comma,
        columns: 0,
    };

    for delimiter in Delimiter::CANDIDATES {
        let columns = count_fields(header, delimiter.as_char());
        debug!(delimiter = %delimiter, columns, "Delimiter attempt");
        if columns > best.columns {
            best = DelimiterChoice { delimiter, columns };
        }
    }

    best
}

/// Read the first line of `path` as Latin-1, without the line terminator
pub fn read_header_line(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let read = reader.read_until(b'\n', &mut buf)?;
    if read == 0 {
        return Err(SplitError::EmptyInput(path.to_path_buf()));
    }

    while matches!(buf.last(), Some(b'\n') | Some(b'\r')) {
        buf.pop();
    }

    Ok(decode_latin1(&buf).into_owned())
}

/// Detect the delimiter for a file from its header line
pub fn detect_file_delimiter(path: &Path) -> Result<DelimiterChoice> {
    let header = read_header_line(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    debug!(file = %file_name, "Detecting delimiter");
    let choice = detect_delimiter(&header);

    if choice.is_confident() {
        info!(
            file = %file_name,
            delimiter = %choice.delimiter,
            columns = choice.columns,
            "Delimiter detected"
        );
    } else {
        warn!(
            file = %file_name,
            delimiter = %choice.delimiter,
            columns = choice.columns,
            "Header has fewer than {} columns; using best guess",
            EXPECTED_COLUMNS
        );
    }

    Ok(choice)
}
