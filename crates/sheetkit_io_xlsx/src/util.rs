//! Stateless helper utilities used by the grid kernel.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use crate::conf::{N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_ILLEGAL};
use crate::error::{GridMapError, Result};
use crate::spec::EnumCellValue;

////////////////////////////////////////////////////////////////////////////////
// #region ColumnLetters

/// Convert column letters (`A`, `z`, `AA`, ...) to a 1-based column number.
///
/// Bijective base-26: `A=1 … Z=26, AA=27`. Input is case-insensitive.
pub fn letter_to_number(letter: &str) -> Result<u32> {
    let c_letter = letter.trim();
    if c_letter.is_empty() {
        return Err(GridMapError::FormatError(
            "column letters cannot be empty".to_string(),
        ));
    }

    let mut n_value: u32 = 0;
    for chr in c_letter.chars() {
        if !chr.is_ascii_alphabetic() {
            return Err(GridMapError::FormatError(format!(
                "invalid column letters: {letter:?}"
            )));
        }
        let n_digit = u32::from(chr.to_ascii_uppercase() as u8 - b'A' + 1);
        n_value = n_value
            .checked_mul(26)
            .and_then(|val| val.checked_add(n_digit))
            .ok_or_else(|| {
                GridMapError::FormatError(format!("column letters overflow: {letter:?}"))
            })?;
    }
    Ok(n_value)
}

/// Convert a 1-based column number to canonical uppercase letters.
pub fn number_to_column(number: u32) -> Result<String> {
    if number == 0 {
        return Err(GridMapError::FormatError(
            "column number must be >= 1".to_string(),
        ));
    }

    let mut l_chars = Vec::new();
    let mut n_rest = number;
    while n_rest > 0 {
        let n_mod = (n_rest - 1) % 26;
        l_chars.push(char::from(b'A' + n_mod as u8));
        n_rest = (n_rest - n_mod) / 26;
    }
    Ok(l_chars.iter().rev().collect())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExcelSerialDates

fn derive_excel_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Convert a date/time to an Excel serial number (1900 date system).
pub fn convert_datetime_to_excel_serial(value: &NaiveDateTime) -> f64 {
    let n_ms = value
        .signed_duration_since(derive_excel_epoch())
        .num_milliseconds();
    n_ms as f64 / 86_400_000.0
}

/// Convert an Excel serial number to a date/time, rounded to milliseconds.
pub fn convert_excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let n_ms = (serial * 86_400_000.0).round();
    if n_ms > i64::MAX as f64 {
        return None;
    }
    let delta = TimeDelta::try_milliseconds(n_ms as i64)?;
    derive_excel_epoch().checked_add_signed(delta)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Cast a zero-based row index to the container row type.
pub fn cast_row_num(value: usize) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| GridMapError::FormatError(format!("row index overflow: {value}")))
}

/// Cast a zero-based column index to the container column type.
pub fn cast_col_num(value: usize) -> Result<u16> {
    u16::try_from(value)
        .map_err(|_| GridMapError::FormatError(format!("column index overflow: {value}")))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WidthEstimation

/// Estimate displayed width units for one encoded cell value.
///
/// Used by autofit inference logic.
pub fn estimate_width_len(value: &EnumCellValue, num_format: Option<&str>) -> usize {
    match value {
        EnumCellValue::Empty => 0,
        EnumCellValue::Text(s) => estimate_unicode_string_width(s),
        EnumCellValue::Boolean(b) => {
            if *b {
                4
            } else {
                5
            }
        }
        EnumCellValue::DateTime(_) => num_format.map_or(19, str::len),
        EnumCellValue::Number(n) => {
            if let Some(c_fmt) = num_format
                && let Some((_, c_frac)) = c_fmt.split_once('.')
            {
                let n_decimals = c_frac.chars().take_while(|chr| *chr == '0').count();
                return format!("{n:.n_decimals$}").len();
            }
            if n.fract() == 0.0 {
                return (*n as i64).to_string().len();
            }
            format!("{n:.4}").len()
        }
    }
}

fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_number_bijection_up_to_zzz() {
        for n in 1..=18_278u32 {
            let c_col = number_to_column(n).expect("column");
            assert_eq!(letter_to_number(&c_col).expect("number"), n);
        }
        assert_eq!(number_to_column(18_278).expect("ZZZ"), "ZZZ");
    }

    #[test]
    fn test_letters_are_case_insensitive_with_canonical_output() {
        assert_eq!(letter_to_number("a").expect("a"), 1);
        assert_eq!(letter_to_number("z").expect("z"), 26);
        assert_eq!(letter_to_number("aA").expect("aA"), 27);
        assert_eq!(letter_to_number("XFD").expect("XFD"), 16_384);
        for c_letter in ["ab", "Zz", "xfd", "Q"] {
            let n_col = letter_to_number(c_letter).expect("number");
            assert_eq!(
                number_to_column(n_col).expect("column"),
                c_letter.to_ascii_uppercase()
            );
        }
    }

    #[test]
    fn test_invalid_letters_are_format_errors() {
        for c_letter in ["", "A1", "-", "Ä", "A B"] {
            assert!(
                matches!(letter_to_number(c_letter), Err(GridMapError::FormatError(_))),
                "{c_letter:?}"
            );
        }
        assert!(matches!(
            letter_to_number("ZZZZZZZZZZ"),
            Err(GridMapError::FormatError(_))
        ));
        assert!(matches!(
            number_to_column(0),
            Err(GridMapError::FormatError(_))
        ));
    }

    #[test]
    fn test_excel_serial_conversion() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .expect("datetime");
        let serial = convert_datetime_to_excel_serial(&dt);
        assert!((serial - 45_292.5).abs() < 1e-9);
        assert_eq!(convert_excel_serial_to_datetime(serial), Some(dt));
        assert_eq!(convert_excel_serial_to_datetime(-1.0), None);
        assert_eq!(convert_excel_serial_to_datetime(f64::NAN), None);
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("a/b:c", "_"), "a_b_c");
        assert_eq!(sanitize_sheet_name("   ", "_"), "Sheet");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40), "_").len(), 31);
    }

    #[test]
    fn test_estimate_width_len() {
        assert_eq!(estimate_width_len(&EnumCellValue::Empty, None), 0);
        assert_eq!(
            estimate_width_len(&EnumCellValue::Number(3.14159), Some("0.00")),
            4
        );
        assert_eq!(estimate_width_len(&EnumCellValue::Number(1200.0), None), 4);
        assert_eq!(
            estimate_width_len(&EnumCellValue::Text("中文".to_string()), None),
            3
        );
    }
}
