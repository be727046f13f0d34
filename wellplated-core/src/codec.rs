//! Self-describing container codes.
//!
//! A code is exactly [`CODE_LENGTH`] printable ASCII characters:
//!
//! ```text
//!  H 12 PLATE 0000007
//!  │ │  │     └── sequence, zero padded to fill the remaining width
//!  │ │  └──────── prefix (0..=11 chars, never '.', never ending in a digit)
//!  │ └─────────── right column, two digits 01..=24
//!  └───────────── bottom row, 'A'..='P'
//! ```
//!
//! The first three segments form the format's [`BoundaryKey`]. Because the
//! bounds travel inside the code, a well can be checked against its
//! container without looking up the format.

use crate::{MalformedCodeError, Numbering, OverflowError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Total width of every container code; fits printable barcode labels.
pub const CODE_LENGTH: usize = 15;

/// Bottom row letter plus two column digits.
pub const HEADER_LENGTH: usize = 3;

/// Longest prefix that still leaves one sequence digit.
pub const PREFIX_MAX_LENGTH: usize = CODE_LENGTH - HEADER_LENGTH - 1;

pub const BOUNDARY_KEY_MAX_LENGTH: usize = HEADER_LENGTH + PREFIX_MAX_LENGTH;

pub const TOP_ROW: char = 'A';

/// 16 rows, as on a 384-well plate.
pub const MAX_BOTTOM_ROW: char = 'P';

pub const MIN_COLUMN: u8 = 1;

/// 24 columns, as on a 384-well plate.
pub const MAX_RIGHT_COLUMN: u8 = 24;

/// Largest operator-supplied barcode number.
pub const MAX_EXTERNAL_ID: u64 = 99_999_999_999;

/// Separates a container label from a well address, as in `PLATE0000007.H12`.
pub const POSITION_SEPARATOR: char = '.';

/// Why a prefix cannot be used, or `None` if it can.
fn prefix_problem(prefix: &str) -> Option<String> {
    if !prefix.chars().all(|c| c.is_ascii_graphic()) {
        return Some("must be printable ASCII without spaces".to_string());
    }
    if prefix.contains(POSITION_SEPARATOR) {
        return Some(format!("must not contain {:?}", POSITION_SEPARATOR));
    }
    if prefix.len() > PREFIX_MAX_LENGTH {
        return Some(format!("must be at most {} characters", PREFIX_MAX_LENGTH));
    }
    if prefix.ends_with(|c: char| c.is_ascii_digit()) {
        return Some("must not end with a digit".to_string());
    }
    None
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Two already-validated ASCII digits.
fn two_digit_value(bytes: &[u8]) -> u8 {
    (bytes[0] - b'0') * 10 + (bytes[1] - b'0')
}

pub(crate) fn check_bottom_row(bottom_row: char) -> Result<(), ValidationError> {
    if (TOP_ROW..=MAX_BOTTOM_ROW).contains(&bottom_row) {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: "bottom_row".to_string(),
            value: bottom_row.to_string(),
            reason: format!("must be a letter between {TOP_ROW} and {MAX_BOTTOM_ROW}"),
        })
    }
}

pub(crate) fn check_right_column(right_column: u8) -> Result<(), ValidationError> {
    if (MIN_COLUMN..=MAX_RIGHT_COLUMN).contains(&right_column) {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: "right_column".to_string(),
            value: right_column.to_string(),
            reason: format!("must be between {MIN_COLUMN} and {MAX_RIGHT_COLUMN}"),
        })
    }
}

pub(crate) fn check_prefix(prefix: &str) -> Result<(), ValidationError> {
    match prefix_problem(prefix) {
        None => Ok(()),
        Some(reason) => Err(ValidationError::InvalidValue {
            field: "prefix".to_string(),
            value: prefix.to_string(),
            reason,
        }),
    }
}

// ============================================================================
// BOUNDARY KEY
// ============================================================================

/// Bottom row, zero-padded right column, and prefix of a format.
///
/// Doubles as the format's natural key and the non-numeric head of every
/// code minted under it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BoundaryKey(String);

impl BoundaryKey {
    /// Derive the key from validated format parameters.
    pub fn derive(
        bottom_row: char,
        right_column: u8,
        prefix: &str,
    ) -> Result<Self, ValidationError> {
        check_bottom_row(bottom_row)?;
        check_right_column(right_column)?;
        check_prefix(prefix)?;
        Ok(Self(format!("{bottom_row}{right_column:02}{prefix}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn bottom_row(&self) -> char {
        self.0.as_bytes()[0] as char
    }

    pub fn right_column(&self) -> u8 {
        two_digit_value(&self.0.as_bytes()[1..HEADER_LENGTH])
    }

    pub fn prefix(&self) -> &str {
        &self.0[HEADER_LENGTH..]
    }

    /// Digits available for the sequence number.
    pub fn sequence_width(&self) -> usize {
        CODE_LENGTH - self.0.len()
    }

    /// Largest sequence number that fits after this key.
    pub fn capacity(&self) -> u64 {
        10u64.pow(self.sequence_width() as u32) - 1
    }
}

impl FromStr for BoundaryKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidValue {
            field: "boundary_key".to_string(),
            value: s.to_string(),
            reason: reason.to_string(),
        };
        if !s.is_ascii() || s.len() < HEADER_LENGTH {
            return Err(invalid("must start with a row letter and two column digits"));
        }
        let right_column = parse_digits(&s[1..HEADER_LENGTH])
            .ok_or_else(|| invalid("column must be two digits"))?;
        let right_column =
            u8::try_from(right_column).map_err(|_| invalid("column must be two digits"))?;
        Self::derive(s.as_bytes()[0] as char, right_column, &s[HEADER_LENGTH..])
    }
}

impl TryFrom<String> for BoundaryKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BoundaryKey> for String {
    fn from(key: BoundaryKey) -> String {
        key.0
    }
}

impl fmt::Display for BoundaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// CONTAINER CODE
// ============================================================================

/// Fields recovered from a container code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedCode {
    pub bottom_row: char,
    pub right_column: u8,
    pub prefix: String,
    pub sequence: u64,
}

/// A validated, immutable container code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContainerCode(String);

impl ContainerCode {
    /// Concatenate `key` with `sequence` zero-padded to [`CODE_LENGTH`].
    pub fn encode(key: &BoundaryKey, sequence: u64) -> Result<Self, OverflowError> {
        let width = key.sequence_width();
        if sequence > key.capacity() {
            return Err(OverflowError {
                boundary_key: key.to_string(),
                sequence,
                width,
            });
        }
        Ok(Self(format!("{key}{sequence:0width$}")))
    }

    pub fn encode_numbering(
        key: &BoundaryKey,
        numbering: Numbering,
    ) -> Result<Self, OverflowError> {
        Self::encode(key, numbering.sequence())
    }

    /// Parse a code into its bounds, prefix, and sequence number.
    pub fn decode(code: &str) -> Result<DecodedCode, MalformedCodeError> {
        if !code.chars().all(|c| c.is_ascii_graphic()) {
            return Err(MalformedCodeError::Charset {
                code: code.to_string(),
            });
        }
        if code.len() != CODE_LENGTH {
            return Err(MalformedCodeError::Length {
                code: code.to_string(),
                length: code.len(),
                expected: CODE_LENGTH,
            });
        }

        let bottom_row = code.as_bytes()[0] as char;
        if !(TOP_ROW..=MAX_BOTTOM_ROW).contains(&bottom_row) {
            return Err(MalformedCodeError::BottomRow {
                code: code.to_string(),
                found: bottom_row,
            });
        }

        let column_digits = &code[1..HEADER_LENGTH];
        let right_column = parse_digits(column_digits)
            .filter(|c| (MIN_COLUMN as u64..=MAX_RIGHT_COLUMN as u64).contains(c))
            .ok_or_else(|| MalformedCodeError::RightColumn {
                code: code.to_string(),
                found: column_digits.to_string(),
            })? as u8;

        // Prefixes never end in a digit, so the sequence is the trailing digit run.
        let remainder = &code[HEADER_LENGTH..];
        let split = remainder
            .rfind(|c: char| !c.is_ascii_digit())
            .map_or(0, |i| i + 1);
        let (prefix, digits) = remainder.split_at(split);
        let sequence = parse_digits(digits).ok_or_else(|| MalformedCodeError::MissingSequence {
            code: code.to_string(),
        })?;
        if let Some(reason) = prefix_problem(prefix) {
            return Err(MalformedCodeError::Prefix {
                code: code.to_string(),
                reason,
            });
        }

        Ok(DecodedCode {
            bottom_row,
            right_column,
            prefix: prefix.to_string(),
            sequence,
        })
    }

    /// Validate a code string received from outside (scanner, form, database).
    pub fn parse(code: &str) -> Result<Self, MalformedCodeError> {
        Self::decode(code)?;
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn bottom_row(&self) -> char {
        self.0.as_bytes()[0] as char
    }

    pub fn right_column(&self) -> u8 {
        two_digit_value(&self.0.as_bytes()[1..HEADER_LENGTH])
    }

    fn split_index(&self) -> usize {
        self.0
            .rfind(|c: char| !c.is_ascii_digit())
            .map_or(HEADER_LENGTH, |i| (i + 1).max(HEADER_LENGTH))
    }

    /// The format key this code was minted under.
    pub fn boundary_key(&self) -> BoundaryKey {
        BoundaryKey(self.0[..self.split_index()].to_string())
    }

    pub fn sequence(&self) -> u64 {
        self.0[self.split_index()..]
            .bytes()
            .fold(0u64, |acc, b| acc * 10 + u64::from(b - b'0'))
    }

    /// The code without its bounds header, as printed on labels.
    pub fn label(&self) -> &str {
        &self.0[HEADER_LENGTH..]
    }

    pub fn decoded(&self) -> DecodedCode {
        DecodedCode {
            bottom_row: self.bottom_row(),
            right_column: self.right_column(),
            prefix: self.boundary_key().prefix().to_string(),
            sequence: self.sequence(),
        }
    }
}

impl FromStr for ContainerCode {
    type Err = MalformedCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContainerCode {
    type Error = MalformedCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::decode(&value)?;
        Ok(Self(value))
    }
}

impl From<ContainerCode> for String {
    fn from(code: ContainerCode) -> String {
        code.0
    }
}

impl fmt::Display for ContainerCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// TESTS
// ============================================================================
