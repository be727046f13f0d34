//! Well addressing and bounds validation.
//!
//! Bounds come from the container code string itself, never from a join to
//! the format, so a position can be checked with nothing but its code.

use crate::{BoundsError, ContainerCode, WellplatedResult, MIN_COLUMN, TOP_ROW};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Battleship notation for wells up to 16 rows by 24 columns: `A1`, `A01`, `P24`.
static WELL_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<row>[A-P])(?P<column>[012]?[0-9])$").expect("well label pattern is valid")
});

/// Row letter and column number of a well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WellAddress {
    pub row: char,
    pub column: u8,
}

impl WellAddress {
    pub fn new(row: char, column: u8) -> Self {
        Self { row, column }
    }
}

impl FromStr for WellAddress {
    type Err = BoundsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label_error = || BoundsError::Label {
            label: s.to_string(),
        };
        let captures = WELL_LABEL.captures(s).ok_or_else(label_error)?;
        let row = captures["row"].chars().next().ok_or_else(label_error)?;
        let column = captures["column"].parse().map_err(|_| label_error())?;
        Ok(Self { row, column })
    }
}

impl fmt::Display for WellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02}", self.row, self.column)
    }
}

/// Check that `row`/`column` fall inside the bounds embedded in `code`.
///
/// Succeeds iff `'A' <= row <= bottom_row` and `1 <= column <= right_column`.
pub fn validate_position(code: &ContainerCode, row: char, column: u8) -> Result<(), BoundsError> {
    let bottom_row = code.bottom_row();
    if !(TOP_ROW..=bottom_row).contains(&row) {
        return Err(BoundsError::Row {
            container_code: code.to_string(),
            row,
            bottom_row,
        });
    }
    let right_column = code.right_column();
    if !(MIN_COLUMN..=right_column).contains(&column) {
        return Err(BoundsError::Column {
            container_code: code.to_string(),
            column,
            right_column,
        });
    }
    Ok(())
}

/// Decode an unvalidated code string, then check the well against it.
pub fn validate_position_str(code: &str, row: char, column: u8) -> WellplatedResult<()> {
    let code = ContainerCode::parse(code)?;
    validate_position(&code, row, column)?;
    Ok(())
}

/// Every well of a container in row-major order.
pub fn all_addresses(code: &ContainerCode) -> impl Iterator<Item = WellAddress> {
    let right_column = code.right_column();
    (TOP_ROW..=code.bottom_row()).flat_map(move |row| {
        (MIN_COLUMN..=right_column).map(move |column| WellAddress { row, column })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WellplatedError;

    fn plate() -> ContainerCode {
        ContainerCode::parse("H12PLATE0000007").unwrap()
    }

    #[test]
    fn test_validate_corners() {
        assert!(validate_position(&plate(), 'A', 1).is_ok());
        assert!(validate_position(&plate(), 'H', 12).is_ok());
    }

    #[test]
    fn test_validate_out_of_bounds() {
        assert!(matches!(
            validate_position(&plate(), 'I', 1),
            Err(BoundsError::Row { bottom_row: 'H', .. })
        ));
        assert!(matches!(
            validate_position(&plate(), 'A', 13),
            Err(BoundsError::Column { right_column: 12, .. })
        ));
        assert!(validate_position(&plate(), '@', 1).is_err());
        assert!(validate_position(&plate(), 'a', 1).is_err());
        assert!(validate_position(&plate(), 'A', 0).is_err());
    }

    #[test]
    fn test_single_well_tube() {
        let tube = ContainerCode::parse("A01start0000000").unwrap();
        assert!(validate_position(&tube, 'A', 1).is_ok());
        assert!(validate_position(&tube, 'B', 1).is_err());
        assert!(validate_position(&tube, 'A', 2).is_err());
    }

    #[test]
    fn test_validate_str_reports_malformed_code() {
        let err = validate_position_str("H12PLATE", 'A', 1).unwrap_err();
        assert!(matches!(err, WellplatedError::MalformedCode(_)));
        let err = validate_position_str("H12PLATE0000007", 'A', 13).unwrap_err();
        assert!(matches!(err, WellplatedError::Bounds(_)));
    }

    #[test]
    fn test_well_label_parsing() {
        assert_eq!("A1".parse::<WellAddress>().unwrap(), WellAddress::new('A', 1));
        assert_eq!("A01".parse::<WellAddress>().unwrap(), WellAddress::new('A', 1));
        assert_eq!("H12".parse::<WellAddress>().unwrap(), WellAddress::new('H', 12));
        assert_eq!("P24".parse::<WellAddress>().unwrap(), WellAddress::new('P', 24));
        for bad in ["", "A", "Q1", "AA1", "a1", "A100", "A31", "1A"] {
            assert!(bad.parse::<WellAddress>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_well_label_display_is_zero_padded() {
        assert_eq!(WellAddress::new('A', 1).to_string(), "A01");
        assert_eq!(WellAddress::new('P', 24).to_string(), "P24");
    }

    #[test]
    fn test_all_addresses_covers_plate() {
        let wells: Vec<_> = all_addresses(&plate()).collect();
        assert_eq!(wells.len(), 96);
        assert_eq!(wells[0], WellAddress::new('A', 1));
        assert_eq!(wells[95], WellAddress::new('H', 12));
    }
}
