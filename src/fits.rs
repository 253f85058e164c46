//! Primary FITS header reader.
//!
//! Only the primary HDU header is read: 2880-byte blocks of 80-character
//! cards, terminated by an `END` card. Data units are never touched.
use crate::error::PipelineError;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const BLOCK_LEN: usize = 2880;
pub const CARD_LEN: usize = 80;

/// Typed value of a header card.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Logical(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Undefined,
}

impl HeaderValue {
    /// YAML scalar used when the value seeds a generated document.
    pub fn to_yaml(&self) -> serde_yaml::Value {
        match self {
            HeaderValue::Logical(value) => serde_yaml::Value::Bool(*value),
            HeaderValue::Integer(value) => serde_yaml::Value::Number((*value).into()),
            HeaderValue::Float(value) => serde_yaml::Value::Number((*value).into()),
            HeaderValue::Text(value) => serde_yaml::Value::String(value.clone()),
            HeaderValue::Undefined => serde_yaml::Value::Null,
        }
    }
}

pub type Header = BTreeMap<String, HeaderValue>;

/// Read the primary header of `path` into a keyword map.
pub fn read_primary_header(path: &Path) -> Result<Header> {
    let mut file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut header = Header::new();
    let mut block = vec![0u8; BLOCK_LEN];
    let mut first_card = true;
    loop {
        let filled = read_block(&mut file, &mut block)
            .with_context(|| format!("read header block from {}", path.display()))?;
        if filled < BLOCK_LEN {
            return Err(invalid(path, "header ends before END card"));
        }
        for raw in block.chunks(CARD_LEN) {
            if !raw.is_ascii() {
                return Err(invalid(path, "header card is not ASCII"));
            }
            let card = std::str::from_utf8(raw)
                .map_err(|_| invalid(path, "header card is not ASCII"))?;
            let keyword = card[..8].trim_end();
            if first_card {
                if keyword != "SIMPLE" {
                    return Err(invalid(path, "first card is not SIMPLE"));
                }
                first_card = false;
            }
            if keyword == "END" {
                tracing::debug!(
                    path = %path.display(),
                    keys = header.len(),
                    "read primary header"
                );
                return Ok(header);
            }
            if let Some(value) = parse_card_value(card) {
                header.insert(keyword.to_string(), value);
            }
        }
    }
}

/// Look up a required keyword.
pub fn require<'a>(header: &'a Header, path: &Path, key: &str) -> Result<&'a HeaderValue> {
    header.get(key).ok_or_else(|| {
        PipelineError::MissingHeaderKey {
            path: path.to_path_buf(),
            key: key.to_string(),
        }
        .into()
    })
}

fn invalid(path: &Path, reason: &str) -> anyhow::Error {
    PipelineError::InvalidHeader {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
    .into()
}

fn read_block(file: &mut File, block: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < block.len() {
        let read = file.read(&mut block[filled..])?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    Ok(filled)
}

/// Parse the value field of a card, or `None` for commentary cards.
fn parse_card_value(card: &str) -> Option<HeaderValue> {
    let keyword = card[..8].trim_end();
    if keyword.is_empty() || keyword == "COMMENT" || keyword == "HISTORY" {
        return None;
    }
    if &card[8..10] != "= " {
        return None;
    }
    let field = card[10..].trim_start();
    if let Some(quoted) = field.strip_prefix('\'') {
        return Some(HeaderValue::Text(parse_quoted(quoted)));
    }
    let value = field.split('/').next().unwrap_or_default().trim();
    Some(parse_unquoted(value))
}

fn parse_quoted(rest: &str) -> String {
    let mut text = String::new();
    let mut chars = rest.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\'' {
            if chars.peek() == Some(&'\'') {
                chars.next();
                text.push('\'');
                continue;
            }
            break;
        }
        text.push(ch);
    }
    // Trailing blanks are not significant in FITS strings; leading ones are.
    text.trim_end().to_string()
}

fn parse_unquoted(value: &str) -> HeaderValue {
    match value {
        "" => HeaderValue::Undefined,
        "T" => HeaderValue::Logical(true),
        "F" => HeaderValue::Logical(false),
        _ => {
            if let Ok(int) = value.parse::<i64>() {
                return HeaderValue::Integer(int);
            }
            let normalized = value.replace(['D', 'd'], "E");
            match normalized.parse::<f64>() {
                Ok(float) => HeaderValue::Float(float),
                Err(_) => HeaderValue::Text(value.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn card(text: &str) -> String {
        format!("{text:<80}")
    }

    fn write_fits(path: &Path, cards: &[&str]) {
        let mut bytes = String::new();
        for text in cards {
            bytes.push_str(&card(text));
        }
        while bytes.len() % BLOCK_LEN != 0 {
            bytes.push(' ');
        }
        let mut file = File::create(path).expect("create fits");
        file.write_all(bytes.as_bytes()).expect("write fits");
    }

    #[test]
    fn reads_typed_values_from_primary_header() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("light_0.fits");
        write_fits(
            &path,
            &[
                "SIMPLE  =                    T / conforms to FITS standard",
                "BITPIX  =                   16",
                "NAXIS   =                    0",
                "FIELD   = 'Vega    '           / target name",
                "OBSERVER= 'O''Brien'",
                "EXPTIME =                 30.5",
                "CCD-TEMP=              -1.5D+1",
                "BLANKV  =",
                "COMMENT this is commentary",
                "HISTORY reduced elsewhere",
                "END",
            ],
        );

        let header = read_primary_header(&path).expect("read header");
        assert_eq!(header.get("SIMPLE"), Some(&HeaderValue::Logical(true)));
        assert_eq!(header.get("BITPIX"), Some(&HeaderValue::Integer(16)));
        assert_eq!(header.get("FIELD"), Some(&HeaderValue::Text("Vega".into())));
        assert_eq!(
            header.get("OBSERVER"),
            Some(&HeaderValue::Text("O'Brien".into()))
        );
        assert_eq!(header.get("EXPTIME"), Some(&HeaderValue::Float(30.5)));
        assert_eq!(header.get("CCD-TEMP"), Some(&HeaderValue::Float(-15.0)));
        assert_eq!(header.get("BLANKV"), Some(&HeaderValue::Undefined));
        assert!(!header.contains_key("COMMENT"));
        assert!(!header.contains_key("HISTORY"));
    }

    #[test]
    fn header_spanning_two_blocks_is_read_to_end() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("big.fits");
        let fillers: Vec<String> = (0..40).map(|i| format!("KEY{i:<5}= {i}")).collect();
        let mut cards = vec!["SIMPLE  =                    T"];
        cards.extend(fillers.iter().map(String::as_str));
        cards.push("FIELD   = 'M42'");
        cards.push("END");
        write_fits(&path, &cards);

        let header = read_primary_header(&path).expect("read header");
        assert_eq!(header.get("KEY39"), Some(&HeaderValue::Integer(39)));
        assert_eq!(header.get("FIELD"), Some(&HeaderValue::Text("M42".into())));
    }

    #[test]
    fn rejects_files_without_end_card() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("truncated.fits");
        write_fits(&path, &["SIMPLE  =                    T"]);
        let err = read_primary_header(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn rejects_non_fits_content() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("text.fits");
        std::fs::write(&path, "not a fits file").unwrap();
        assert!(read_primary_header(&path).is_err());

        let other = dir.path().join("other.fits");
        write_fits(&other, &["XTENSION= 'IMAGE   '", "END"]);
        assert!(read_primary_header(&other).is_err());
    }

    #[test]
    fn missing_required_key_is_reported() {
        let header = Header::new();
        let err = require(&header, Path::new("light_0.fits"), "FIELD").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MissingHeaderKey { key, .. }) if key == "FIELD"
        ));
    }
}
