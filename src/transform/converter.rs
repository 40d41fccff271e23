//! Schema-driven conversion of dynamic values into typed values
//!
//! Every value that ends up in a [`TypedRecord`](crate::record::TypedRecord) passes
//! through [`convert`]. The rules are fixed:
//!
//! | logical type       | input        | output                              |
//! |--------------------|--------------|-------------------------------------|
//! | `date`             | `YYYY-MM-DD` | days since 1970-01-01 (`i32`)       |
//! | `time-millis`      | `HH:MM:SS`   | millis since midnight (`i32`)       |
//! | `time-micros`      | `HH:MM:SS`   | micros since midnight (`i64`)       |
//! | `timestamp-millis` | `YYYY-MM-DD` | millis since epoch at 00:00 UTC     |
//! | `timestamp-micros` | `YYYY-MM-DD` | micros since epoch at 00:00 UTC     |
//! | `decimal`          | bytes        | bytes, unchanged                    |
//!
//! Without a logical type the physical type decides: numeric and boolean types parse
//! the value's text, `string` takes the text, anything else passes through.

use crate::error::{ConnectorError, Result};
use crate::model::DynamicValue;
use crate::record::TypedValue;
use crate::schema::{Field, FieldType, LogicalType};

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use std::num::IntErrorKind;

/// Day number of 1970-01-01 counted from 0001-01-01 as day 1
const EPOCH_DAYS_FROM_CE: i64 = 719_163;
const MILLIS_PER_DAY: i64 = 86_400_000;
const MICROS_PER_DAY: i64 = 86_400_000_000;

/// Convert `value` for `field`. An absent value converts to `None`.
pub fn convert(value: Option<&DynamicValue>, field: &Field) -> Result<Option<TypedValue>> {
    let Some(value) = value else {
        return Ok(None);
    };

    let typed = match &field.logical_type {
        Some(logical) => convert_logical(value, logical, field)?,
        None => convert_physical(value, field)?,
    };
    Ok(Some(typed))
}

fn convert_logical(value: &DynamicValue, logical: &LogicalType, field: &Field) -> Result<TypedValue> {
    match logical {
        LogicalType::Date => {
            let days = epoch_days(value, field)?;
            Ok(TypedValue::Int(narrow(days, field)?))
        }
        LogicalType::TimeMillis => {
            let time = parse_time(value, field)?;
            let millis = i64::from(time.num_seconds_from_midnight()) * 1_000
                + i64::from(time.nanosecond() / 1_000_000);
            Ok(TypedValue::Int(narrow(millis, field)?))
        }
        LogicalType::TimeMicros => {
            let time = parse_time(value, field)?;
            let micros = i64::from(time.num_seconds_from_midnight()) * 1_000_000
                + i64::from(time.nanosecond() / 1_000);
            Ok(TypedValue::Long(micros))
        }
        LogicalType::TimestampMillis => {
            let days = epoch_days(value, field)?;
            Ok(TypedValue::Long(scale(days, MILLIS_PER_DAY, field)?))
        }
        LogicalType::TimestampMicros => {
            let days = epoch_days(value, field)?;
            Ok(TypedValue::Long(scale(days, MICROS_PER_DAY, field)?))
        }
        LogicalType::Decimal { .. } => match value {
            DynamicValue::Bytes(bytes) => Ok(TypedValue::Bytes(bytes.clone())),
            other => Err(invalid(field, other, "decimal bytes")),
        },
        LogicalType::Other(_) => Err(ConnectorError::UnsupportedFieldType {
            field: field.name.clone(),
            display_name: field.display_name(),
        }),
    }
}

fn convert_physical(value: &DynamicValue, field: &Field) -> Result<TypedValue> {
    match field.field_type {
        FieldType::Int => parse_int::<i32>(value, field).map(TypedValue::Int),
        FieldType::Long => parse_int::<i64>(value, field).map(TypedValue::Long),
        FieldType::Double => value
            .to_string()
            .parse()
            .map(TypedValue::Double)
            .map_err(|_| invalid(field, value, "double")),
        FieldType::Float => value
            .to_string()
            .parse()
            .map(TypedValue::Float)
            .map_err(|_| invalid(field, value, "float")),
        // Anything but a case-insensitive "true" is false
        FieldType::Boolean => Ok(TypedValue::Boolean(match value {
            DynamicValue::Boolean(b) => *b,
            other => other.to_string().eq_ignore_ascii_case("true"),
        })),
        FieldType::String => Ok(TypedValue::String(value.to_string())),
        _ => Ok(passthrough(value)),
    }
}

fn passthrough(value: &DynamicValue) -> TypedValue {
    match value {
        DynamicValue::Text(s) => TypedValue::String(s.clone()),
        DynamicValue::Integer(n) => match i64::try_from(*n) {
            Ok(long) => TypedValue::Long(long),
            Err(_) => TypedValue::String(n.to_string()),
        },
        DynamicValue::Number(n) => TypedValue::Double(*n),
        DynamicValue::Boolean(b) => TypedValue::Boolean(*b),
        DynamicValue::Bytes(b) => TypedValue::Bytes(b.clone()),
    }
}

fn parse_int<T>(value: &DynamicValue, field: &Field) -> Result<T>
where
    T: std::str::FromStr<Err = std::num::ParseIntError>,
{
    let text = value.to_string();
    text.parse::<T>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => too_large(field, &text),
        _ => invalid(field, value, field.field_type.name()),
    })
}

/// Strict `YYYY-MM-DD`
pub(crate) fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    has_shape(text, "dddd-dd-dd")
        .then(|| NaiveDate::parse_from_str(text, "%Y-%m-%d").ok())
        .flatten()
}

fn epoch_days(value: &DynamicValue, field: &Field) -> Result<i64> {
    let date = parse_iso_date(&value.to_string())
        .ok_or_else(|| invalid(field, value, "date (YYYY-MM-DD)"))?;
    Ok(i64::from(date.num_days_from_ce()) - EPOCH_DAYS_FROM_CE)
}

/// `HH:MM:SS` with an optional fraction of up to nine digits
fn parse_time(value: &DynamicValue, field: &Field) -> Result<NaiveTime> {
    let text = value.to_string();
    let (clock, fraction) = match text.split_once('.') {
        Some((clock, fraction)) => (clock, Some(fraction)),
        None => (text.as_str(), None),
    };
    let fraction_ok = fraction.is_none_or(|f| {
        (1..=9).contains(&f.len()) && f.bytes().all(|b| b.is_ascii_digit())
    });

    (has_shape(clock, "dd:dd:dd") && fraction_ok)
        .then(|| NaiveTime::parse_from_str(&text, "%H:%M:%S%.f").ok())
        .flatten()
        .ok_or_else(|| invalid(field, value, "time (HH:MM:SS)"))
}

/// Fixed-width check: `d` is an ASCII digit, anything else must match exactly
fn has_shape(text: &str, shape: &str) -> bool {
    text.len() == shape.len()
        && text.bytes().zip(shape.bytes()).all(|(t, s)| match s {
            b'd' => t.is_ascii_digit(),
            _ => t == s,
        })
}

fn narrow(value: i64, field: &Field) -> Result<i32> {
    i32::try_from(value).map_err(|_| too_large(field, &value.to_string()))
}

fn scale(days: i64, unit: i64, field: &Field) -> Result<i64> {
    days.checked_mul(unit)
        .ok_or_else(|| too_large(field, &format!("{} days", days)))
}

fn too_large(field: &Field, value: &str) -> ConnectorError {
    ConnectorError::FieldValueTooLarge {
        field: field.name.clone(),
        value: value.to_string(),
    }
}

fn invalid(field: &Field, value: &DynamicValue, expected: &str) -> ConnectorError {
    ConnectorError::InvalidFieldValue {
        field: field.name.clone(),
        value: value.to_string(),
        expected: expected.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> DynamicValue {
        DynamicValue::Text(s.to_string())
    }

    fn logical(t: FieldType, l: LogicalType) -> Field {
        Field::new("f", t).with_logical_type(l)
    }

    fn run(value: DynamicValue, field: &Field) -> Result<Option<TypedValue>> {
        convert(Some(&value), field)
    }

    #[test]
    fn test_absent_value_is_null() {
        let field = Field::new("clicks", FieldType::Double);
        assert_eq!(convert(None, &field).unwrap(), None);
    }

    #[test]
    fn test_date_to_epoch_days() {
        let field = logical(FieldType::Int, LogicalType::Date);
        assert_eq!(
            run(text("2020-05-05"), &field).unwrap(),
            Some(TypedValue::Int(18387))
        );
        assert_eq!(
            run(text("1970-01-01"), &field).unwrap(),
            Some(TypedValue::Int(0))
        );
        assert_eq!(
            run(text("1969-12-31"), &field).unwrap(),
            Some(TypedValue::Int(-1))
        );
    }

    #[test]
    fn test_bad_date() {
        let field = logical(FieldType::Int, LogicalType::Date);
        for bad in ["05/05/2020", "2020-5-5", "2020-05-5", "2020-02-30", " 2020-05-05", "2020-05-05T00:00:00"] {
            let err = run(text(bad), &field).unwrap_err();
            assert!(
                matches!(err, ConnectorError::InvalidFieldValue { .. }),
                "{bad} should be rejected"
            );
        }

        let timestamp = logical(FieldType::Long, LogicalType::TimestampMillis);
        assert!(run(text("2020-5-5"), &timestamp).is_err());
    }

    #[test]
    fn test_bad_time() {
        let field = logical(FieldType::Int, LogicalType::TimeMillis);
        for bad in ["1:2:3", "01:02", "01:02:3", "24:00:00", "01:02:03.", "01:02:03.1234567890"] {
            let err = run(text(bad), &field).unwrap_err();
            assert!(
                matches!(err, ConnectorError::InvalidFieldValue { .. }),
                "{bad} should be rejected"
            );
        }
        assert_eq!(
            run(text("01:02:03.250"), &field).unwrap(),
            Some(TypedValue::Int(3_723_250))
        );
    }

    #[test]
    fn test_time_millis_and_micros() {
        let millis = logical(FieldType::Int, LogicalType::TimeMillis);
        assert_eq!(
            run(text("01:02:03"), &millis).unwrap(),
            Some(TypedValue::Int(3_723_000))
        );
        let micros = logical(FieldType::Long, LogicalType::TimeMicros);
        assert_eq!(
            run(text("23:59:59"), &micros).unwrap(),
            Some(TypedValue::Long(86_399_000_000))
        );
    }

    #[test]
    fn test_timestamps_are_midnight_utc() {
        let millis = logical(FieldType::Long, LogicalType::TimestampMillis);
        assert_eq!(
            run(text("2020-05-05"), &millis).unwrap(),
            Some(TypedValue::Long(1_588_636_800_000))
        );
        let micros = logical(FieldType::Long, LogicalType::TimestampMicros);
        assert_eq!(
            run(text("2020-05-05"), &micros).unwrap(),
            Some(TypedValue::Long(1_588_636_800_000_000))
        );
    }

    #[test]
    fn test_decimal_passes_bytes_through() {
        let field = logical(
            FieldType::Bytes,
            LogicalType::Decimal {
                precision: 10,
                scale: 2,
            },
        );
        let bytes = vec![0x00, 0x30, 0x39];
        assert_eq!(
            run(DynamicValue::Bytes(bytes.clone()), &field).unwrap(),
            Some(TypedValue::Bytes(bytes))
        );
        assert!(run(text("123.45"), &field).is_err());
    }

    #[test]
    fn test_unsupported_logical_type() {
        let field = logical(FieldType::String, LogicalType::Other("datetime".to_string()));
        match run(text("2020-05-05T00:00:00"), &field).unwrap_err() {
            ConnectorError::UnsupportedFieldType { field, display_name } => {
                assert_eq!(field, "f");
                assert_eq!(display_name, "datetime");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_double_and_boolean() {
        let double = Field::new("ctr", FieldType::Double);
        assert_eq!(
            run(text("3.5"), &double).unwrap(),
            Some(TypedValue::Double(3.5))
        );
        let boolean = Field::new("flag", FieldType::Boolean);
        assert_eq!(
            run(text("true"), &boolean).unwrap(),
            Some(TypedValue::Boolean(true))
        );
        assert_eq!(
            run(text("TRUE"), &boolean).unwrap(),
            Some(TypedValue::Boolean(true))
        );
        assert_eq!(
            run(text("yes"), &boolean).unwrap(),
            Some(TypedValue::Boolean(false))
        );
    }

    #[test]
    fn test_numeric_metric_into_integer_types() {
        let int = Field::new("clicks", FieldType::Int);
        assert_eq!(
            run(DynamicValue::Number(42.0), &int).unwrap(),
            Some(TypedValue::Int(42))
        );
        let long = Field::new("impressions", FieldType::Long);
        assert_eq!(
            run(DynamicValue::Number(120.0), &long).unwrap(),
            Some(TypedValue::Long(120))
        );
        assert!(run(DynamicValue::Number(1.5), &int).is_err());
    }

    #[test]
    fn test_float() {
        let field = Field::new("position", FieldType::Float);
        assert_eq!(
            run(DynamicValue::Number(4.25), &field).unwrap(),
            Some(TypedValue::Float(4.25))
        );
    }

    #[test]
    fn test_int_overflow_is_too_large() {
        let field = Field::new("clicks", FieldType::Int);
        let err = run(text("3000000000"), &field).unwrap_err();
        assert!(matches!(err, ConnectorError::FieldValueTooLarge { .. }));
    }

    #[test]
    fn test_unparseable_int() {
        let field = Field::new("clicks", FieldType::Int);
        let err = run(text("many"), &field).unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidFieldValue { .. }));
    }

    #[test]
    fn test_date_beyond_i32_days_is_too_large() {
        // chrono accepts years up to 262143; that is still within i32 days,
        // so exercise the narrowing helper directly
        let field = logical(FieldType::Int, LogicalType::Date);
        let err = narrow(i64::from(i32::MAX) + 1, &field).unwrap_err();
        assert!(matches!(err, ConnectorError::FieldValueTooLarge { .. }));
    }

    #[test]
    fn test_string_and_passthrough() {
        let string = Field::new("ctr", FieldType::String);
        assert_eq!(
            run(DynamicValue::Number(0.5), &string).unwrap(),
            Some(TypedValue::String("0.5".to_string()))
        );
        let bytes = Field::new("raw", FieldType::Bytes);
        assert_eq!(
            run(text("abc"), &bytes).unwrap(),
            Some(TypedValue::String("abc".to_string()))
        );
    }

    #[test]
    fn test_deterministic() {
        let field = logical(FieldType::Long, LogicalType::TimestampMillis);
        let a = run(text("2021-02-03"), &field).unwrap();
        let b = run(text("2021-02-03"), &field).unwrap();
        assert_eq!(a, b);
    }
}
