//! Single-byte decoding for the registry extracts, which are not UTF-8.

use std::borrow::Cow;

use encoding_rs::WINDOWS_1252;

/// Decode bytes as Latin-1 compatible text (WINDOWS-1252 superset)
pub fn decode_latin1(bytes: &[u8]) -> Cow<'_, str> {
    WINDOWS_1252.decode_without_bom_handling(bytes).0
}
