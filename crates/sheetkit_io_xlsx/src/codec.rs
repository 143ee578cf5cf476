//! Cell codec: field values to cell primitives and back.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use uuid::Uuid;

use crate::error::{GridMapError, Result};
use crate::spec::{EnumCellValue, EnumFieldKind, EnumFieldValue};
use crate::util::convert_excel_serial_to_datetime;

const TUP_DATETIME_PATTERNS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d-%m-%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];
const TUP_DATE_PATTERNS: [&str; 3] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];

////////////////////////////////////////////////////////////////////////////////
// #region Encode

/// Encode one field value into its cell representation.
///
/// `Null` becomes [`EnumCellValue::Empty`]. Nested values have no cell form, and values
/// whose variant does not fit the declared `kind` are refused; both fail with
/// [`GridMapError::UnsupportedType`].
pub fn encode_field_value(
    field: &str,
    kind: EnumFieldKind,
    value: &EnumFieldValue,
) -> Result<EnumCellValue> {
    let fail = || GridMapError::UnsupportedType {
        field: field.to_string(),
        type_name: value.type_name().to_string(),
    };
    if !validate_value_kind(kind, value) {
        return Err(fail());
    }

    let cell = match value {
        EnumFieldValue::Null => EnumCellValue::Empty,
        EnumFieldValue::Text(val) => EnumCellValue::Text(val.clone()),
        EnumFieldValue::Char(val) => EnumCellValue::Text(val.to_string()),
        EnumFieldValue::Guid(val) => EnumCellValue::Text(val.to_string()),
        EnumFieldValue::Int(val) => EnumCellValue::Number(*val as f64),
        EnumFieldValue::UInt(val) => EnumCellValue::Number(*val as f64),
        EnumFieldValue::Float(val) => {
            if val.is_finite() {
                EnumCellValue::Number(*val)
            } else {
                EnumCellValue::Text(val.to_string())
            }
        }
        EnumFieldValue::Decimal(val) => match val.to_f64() {
            Some(n) => EnumCellValue::Number(n),
            None => EnumCellValue::Text(val.to_string()),
        },
        EnumFieldValue::Bool(val) => EnumCellValue::Boolean(*val),
        EnumFieldValue::DateTime(val) => EnumCellValue::DateTime(*val),
        EnumFieldValue::Date(val) => EnumCellValue::DateTime(val.and_time(chrono::NaiveTime::MIN)),
        EnumFieldValue::List(_) | EnumFieldValue::Composite(_) => return Err(fail()),
    };
    Ok(cell)
}

fn validate_value_kind(kind: EnumFieldKind, value: &EnumFieldValue) -> bool {
    use EnumFieldValue as V;

    if matches!(value, V::Null) {
        return true;
    }
    match kind {
        EnumFieldKind::Text => matches!(value, V::Text(_) | V::Char(_) | V::Guid(_)),
        EnumFieldKind::Char => matches!(value, V::Char(_)),
        EnumFieldKind::Guid => matches!(value, V::Guid(_)),
        EnumFieldKind::Integer | EnumFieldKind::UnsignedInteger => {
            matches!(value, V::Int(_) | V::UInt(_))
        }
        EnumFieldKind::Float => matches!(value, V::Float(_) | V::Int(_) | V::UInt(_)),
        EnumFieldKind::Decimal => matches!(value, V::Decimal(_) | V::Int(_) | V::UInt(_)),
        EnumFieldKind::Boolean => matches!(value, V::Bool(_)),
        EnumFieldKind::DateTime | EnumFieldKind::Date => {
            matches!(value, V::DateTime(_) | V::Date(_))
        }
        EnumFieldKind::Composite => false,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Decode

/// Decode a stored cell into a value of the field's declared kind.
///
/// Blank cells decode to `Null`. Stored values whose kind differs from the target are
/// converted through their text form.
pub fn decode_cell_value(
    field: &str,
    kind: EnumFieldKind,
    cell: &EnumCellValue,
) -> Result<EnumFieldValue> {
    if cell.is_blank() {
        return Ok(EnumFieldValue::Null);
    }

    let fail = || GridMapError::CellConversionError {
        field: field.to_string(),
        raw: convert_cell_to_text(cell),
        kind: kind.name().to_string(),
    };

    let value = match kind {
        EnumFieldKind::Text => EnumFieldValue::Text(convert_cell_to_text(cell)),
        EnumFieldKind::Char => {
            let c_text = convert_cell_to_text(cell);
            let mut chars = c_text.chars();
            match (chars.next(), chars.next()) {
                (Some(chr), None) => EnumFieldValue::Char(chr),
                _ => return Err(fail()),
            }
        }
        EnumFieldKind::Guid => Uuid::parse_str(convert_cell_to_text(cell).trim())
            .map(EnumFieldValue::Guid)
            .map_err(|_| fail())?,
        EnumFieldKind::Integer => EnumFieldValue::Int(derive_i64(cell).ok_or_else(fail)?),
        EnumFieldKind::UnsignedInteger => {
            let n = derive_i64(cell).ok_or_else(fail)?;
            EnumFieldValue::UInt(u64::try_from(n).map_err(|_| fail())?)
        }
        EnumFieldKind::Float => EnumFieldValue::Float(derive_f64(cell).ok_or_else(fail)?),
        EnumFieldKind::Decimal => {
            let decimal = match cell {
                EnumCellValue::Number(n) => Decimal::from_f64(*n),
                EnumCellValue::Text(s) => s.trim().parse::<Decimal>().ok(),
                EnumCellValue::Boolean(b) => Some(Decimal::from(u8::from(*b))),
                _ => None,
            };
            EnumFieldValue::Decimal(decimal.ok_or_else(fail)?)
        }
        EnumFieldKind::Boolean => EnumFieldValue::Bool(derive_bool(cell).ok_or_else(fail)?),
        EnumFieldKind::DateTime => {
            EnumFieldValue::DateTime(derive_datetime(cell).ok_or_else(fail)?)
        }
        EnumFieldKind::Date => EnumFieldValue::Date(derive_datetime(cell).ok_or_else(fail)?.date()),
        EnumFieldKind::Composite => {
            return Err(GridMapError::UnsupportedType {
                field: field.to_string(),
                type_name: kind.name().to_string(),
            });
        }
    };
    Ok(value)
}

/// Stringify a stored cell the way it would be shown without formatting.
pub fn convert_cell_to_text(cell: &EnumCellValue) -> String {
    match cell {
        EnumCellValue::Empty => String::new(),
        EnumCellValue::Text(s) => s.clone(),
        EnumCellValue::Number(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                (*n as i64).to_string()
            } else {
                n.to_string()
            }
        }
        EnumCellValue::Boolean(b) => b.to_string(),
        EnumCellValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

fn derive_i64(cell: &EnumCellValue) -> Option<i64> {
    match cell {
        EnumCellValue::Number(n) => {
            if n.fract() == 0.0 && *n >= i64::MIN as f64 && *n < i64::MAX as f64 {
                Some(*n as i64)
            } else {
                None
            }
        }
        EnumCellValue::Text(s) => s.trim().parse::<i64>().ok(),
        EnumCellValue::Boolean(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn derive_f64(cell: &EnumCellValue) -> Option<f64> {
    match cell {
        EnumCellValue::Number(n) => Some(*n),
        EnumCellValue::Text(s) => s.trim().parse::<f64>().ok(),
        EnumCellValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn derive_bool(cell: &EnumCellValue) -> Option<bool> {
    match cell {
        EnumCellValue::Boolean(b) => Some(*b),
        EnumCellValue::Number(n) => Some(*n != 0.0),
        EnumCellValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn derive_datetime(cell: &EnumCellValue) -> Option<NaiveDateTime> {
    match cell {
        EnumCellValue::DateTime(dt) => Some(*dt),
        EnumCellValue::Number(n) => convert_excel_serial_to_datetime(*n),
        EnumCellValue::Text(s) => {
            let c_text = s.trim();
            TUP_DATETIME_PATTERNS
                .iter()
                .find_map(|pattern| NaiveDateTime::parse_from_str(c_text, pattern).ok())
                .or_else(|| {
                    TUP_DATE_PATTERNS
                        .iter()
                        .find_map(|pattern| NaiveDate::parse_from_str(c_text, pattern).ok())
                        .map(|date| date.and_time(chrono::NaiveTime::MIN))
                })
        }
        _ => None,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .expect("date")
    }

    #[test]
    fn test_encode_dispatches_on_value_kind() {
        assert_eq!(
            encode_field_value("a", EnumFieldKind::Integer, &EnumFieldValue::Null).expect("null"),
            EnumCellValue::Empty
        );
        assert_eq!(
            encode_field_value("a", EnumFieldKind::Char, &EnumFieldValue::Char('x')).expect("char"),
            EnumCellValue::Text("x".to_string())
        );
        assert_eq!(
            encode_field_value("a", EnumFieldKind::Integer, &EnumFieldValue::Int(7)).expect("int"),
            EnumCellValue::Number(7.0)
        );
        assert_eq!(
            encode_field_value(
                "a",
                EnumFieldKind::Decimal,
                &EnumFieldValue::Decimal(Decimal::new(125, 2))
            )
            .expect("decimal"),
            EnumCellValue::Number(1.25)
        );
        assert_eq!(
            encode_field_value("a", EnumFieldKind::Boolean, &EnumFieldValue::Bool(true))
                .expect("bool"),
            EnumCellValue::Boolean(true)
        );
        assert_eq!(
            encode_field_value(
                "a",
                EnumFieldKind::Date,
                &EnumFieldValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"))
            )
            .expect("date"),
            EnumCellValue::DateTime(dt(2024, 1, 1))
        );
        assert_eq!(
            encode_field_value("a", EnumFieldKind::Float, &EnumFieldValue::Float(f64::NAN))
                .expect("nan"),
            EnumCellValue::Text("NaN".to_string())
        );
    }

    #[test]
    fn test_encode_nested_value_is_unsupported() {
        let err = encode_field_value(
            "address",
            EnumFieldKind::Text,
            &EnumFieldValue::Composite(BTreeMap::new()),
        )
        .expect_err("composite");
        assert!(matches!(
            err,
            GridMapError::UnsupportedType { ref field, ref type_name }
                if field == "address" && type_name == "composite"
        ));
        assert!(
            encode_field_value("tags", EnumFieldKind::Text, &EnumFieldValue::List(vec![]))
                .is_err()
        );
    }

    #[test]
    fn test_encode_rejects_value_of_another_kind() {
        let err = encode_field_value("id", EnumFieldKind::Integer, &"12".into())
            .expect_err("text in integer field");
        assert!(matches!(
            err,
            GridMapError::UnsupportedType { ref field, ref type_name }
                if field == "id" && type_name == "text"
        ));
        assert!(encode_field_value("ok", EnumFieldKind::Boolean, &1i64.into()).is_err());
        assert!(encode_field_value("c", EnumFieldKind::Char, &"ab".into()).is_err());

        assert_eq!(
            encode_field_value("price", EnumFieldKind::Float, &3i64.into()).expect("widen"),
            EnumCellValue::Number(3.0)
        );
        assert_eq!(
            encode_field_value("label", EnumFieldKind::Text, &EnumFieldValue::Char('z'))
                .expect("char as text"),
            EnumCellValue::Text("z".to_string())
        );
    }

    #[test]
    fn test_decode_numeric_kinds() {
        assert_eq!(
            decode_cell_value("id", EnumFieldKind::Integer, &EnumCellValue::Number(42.0))
                .expect("int"),
            EnumFieldValue::Int(42)
        );
        assert_eq!(
            decode_cell_value("id", EnumFieldKind::Integer, &EnumCellValue::Text(" 9 ".into()))
                .expect("int text"),
            EnumFieldValue::Int(9)
        );
        assert_eq!(
            decode_cell_value("f", EnumFieldKind::Float, &EnumCellValue::Number(2.5))
                .expect("float"),
            EnumFieldValue::Float(2.5)
        );
        assert_eq!(
            decode_cell_value("d", EnumFieldKind::Decimal, &EnumCellValue::Text("1.25".into()))
                .expect("decimal"),
            EnumFieldValue::Decimal(Decimal::new(125, 2))
        );
    }

    #[test]
    fn test_decode_conversion_failure_names_field_and_raw_value() {
        let err = decode_cell_value("id", EnumFieldKind::Integer, &EnumCellValue::Number(1.5))
            .expect_err("fraction");
        match err {
            GridMapError::CellConversionError { field, raw, kind } => {
                assert_eq!(field, "id");
                assert_eq!(raw, "1.5");
                assert_eq!(kind, "integer");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(
            decode_cell_value("c", EnumFieldKind::Char, &EnumCellValue::Text("ab".into()))
                .is_err()
        );
        assert!(
            decode_cell_value("u", EnumFieldKind::UnsignedInteger, &EnumCellValue::Number(-1.0))
                .is_err()
        );
    }

    #[test]
    fn test_decode_integer_out_of_range_fails() {
        let n_two_pow_63 = 9_223_372_036_854_775_808.0_f64;
        assert!(matches!(
            decode_cell_value("id", EnumFieldKind::Integer, &EnumCellValue::Number(n_two_pow_63)),
            Err(GridMapError::CellConversionError { .. })
        ));
        assert_eq!(
            decode_cell_value("id", EnumFieldKind::Integer, &EnumCellValue::Number(-n_two_pow_63))
                .expect("i64::MIN"),
            EnumFieldValue::Int(i64::MIN)
        );
    }

    #[test]
    fn test_decode_falls_back_to_text_form() {
        assert_eq!(
            decode_cell_value("name", EnumFieldKind::Text, &EnumCellValue::Number(12.0))
                .expect("text"),
            EnumFieldValue::Text("12".to_string())
        );
        assert_eq!(
            decode_cell_value("ok", EnumFieldKind::Boolean, &EnumCellValue::Text("TRUE".into()))
                .expect("bool"),
            EnumFieldValue::Bool(true)
        );
        let id = Uuid::from_u128(0x1234);
        assert_eq!(
            decode_cell_value("id", EnumFieldKind::Guid, &EnumCellValue::Text(id.to_string()))
                .expect("guid"),
            EnumFieldValue::Guid(id)
        );
    }

    #[test]
    fn test_decode_datetime_from_serial_and_text() {
        assert_eq!(
            decode_cell_value("d", EnumFieldKind::DateTime, &EnumCellValue::Number(45_292.0))
                .expect("serial"),
            EnumFieldValue::DateTime(dt(2024, 1, 1))
        );
        assert_eq!(
            decode_cell_value(
                "d",
                EnumFieldKind::Date,
                &EnumCellValue::Text("01-01-2024 00:00:00".into())
            )
            .expect("text"),
            EnumFieldValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"))
        );
    }

    #[test]
    fn test_blank_cells_decode_to_null() {
        assert_eq!(
            decode_cell_value("a", EnumFieldKind::Integer, &EnumCellValue::Text(String::new()))
                .expect("blank"),
            EnumFieldValue::Null
        );
    }
}
