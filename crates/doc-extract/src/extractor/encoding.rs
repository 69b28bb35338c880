//! Text decoding with optional encoding detection

use crate::error::{Error, Result};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Windows-1252 code points for bytes 0x80..=0x9F. Undefined slots map to
/// the C1 control with the same value.
const CP1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

/// Encoding a byte buffer was decoded with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Windows1252,
}

/// Decode file bytes to text.
///
/// With `autodetect`, a byte-order mark wins, then strict UTF-8, then
/// Windows-1252 (which accepts any byte sequence). Without it the bytes must
/// be valid UTF-8.
pub fn decode(bytes: &[u8], autodetect: bool, filename: &str) -> Result<String> {
    if !autodetect {
        return String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::file_parse(filename, format!("invalid UTF-8: {}", e)));
    }

    let (text, encoding) = detect_and_decode(bytes);
    if encoding != DetectedEncoding::Utf8 {
        tracing::debug!("Decoded {} as {:?}", filename, encoding);
    }
    Ok(text)
}

/// Decode with detection, reporting the encoding used.
pub fn detect_and_decode(bytes: &[u8]) -> (String, DetectedEncoding) {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return (String::from_utf8_lossy(rest).into_owned(), DetectedEncoding::Utf8);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        return (decode_utf16(rest, u16::from_le_bytes), DetectedEncoding::Utf16Le);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        return (decode_utf16(rest, u16::from_be_bytes), DetectedEncoding::Utf16Be);
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), DetectedEncoding::Utf8),
        Err(_) => (decode_windows_1252(bytes), DetectedEncoding::Windows1252),
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

fn decode_windows_1252(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            0x80..=0x9F => CP1252_HIGH[(b - 0x80) as usize],
            _ => b as char,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_utf8() {
        let (text, enc) = detect_and_decode("héllo".as_bytes());
        assert_eq!(text, "héllo");
        assert_eq!(enc, DetectedEncoding::Utf8);
    }

    #[test]
    fn test_utf8_bom_stripped() {
        let (text, enc) = detect_and_decode(b"\xEF\xBB\xBFabc");
        assert_eq!(text, "abc");
        assert_eq!(enc, DetectedEncoding::Utf8);
    }

    #[test]
    fn test_utf16_boms() {
        let le: Vec<u8> = [0xFF, 0xFE, b'h', 0, b'i', 0].to_vec();
        assert_eq!(detect_and_decode(&le), ("hi".to_string(), DetectedEncoding::Utf16Le));

        let be: Vec<u8> = [0xFE, 0xFF, 0, b'h', 0, b'i'].to_vec();
        assert_eq!(detect_and_decode(&be), ("hi".to_string(), DetectedEncoding::Utf16Be));
    }

    #[test]
    fn test_windows_1252_fallback() {
        // "café" with a Latin-1 e-acute and a cp1252 euro sign
        let bytes = b"caf\xE9 \x80";
        let (text, enc) = detect_and_decode(bytes);
        assert_eq!(text, "café €");
        assert_eq!(enc, DetectedEncoding::Windows1252);
    }

    #[test]
    fn test_strict_mode_rejects_invalid_utf8() {
        let err = decode(b"caf\xE9", false, "menu.txt").unwrap_err();
        assert!(matches!(err, Error::FileParse { ref filename, .. } if filename == "menu.txt"));

        assert_eq!(decode(b"caf\xE9", true, "menu.txt").unwrap(), "café");
    }
}
