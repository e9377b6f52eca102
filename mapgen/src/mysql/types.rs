//! Value conversions between mapgen and mysql_async

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::query::BuiltQuery;
use crate::value::Value;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use mysql_async::{Params, Value as MySqlValue};

/// Named parameters for a rendered query; `Params::Empty` when it binds
/// nothing.
pub fn to_mysql_params(query: &BuiltQuery) -> Params {
    if query.params.is_empty() {
        return Params::Empty;
    }
    let named: HashMap<Vec<u8>, MySqlValue> = query
        .params
        .iter()
        .map(|(name, value)| (name.as_bytes().to_vec(), to_mysql_value(value)))
        .collect();
    Params::Named(named)
}

/// Driver value bound for a mapgen value.
///
/// Integers widen to `Int`/`UInt`; decimals and JSON go over the wire as text.
pub fn to_mysql_value(value: &Value) -> MySqlValue {
    match value {
        Value::Null => MySqlValue::NULL,
        Value::Bool(v) => MySqlValue::Int(i64::from(*v)),
        Value::I8(_) | Value::I16(_) | Value::I32(_) | Value::I64(_) => {
            MySqlValue::Int(value.as_i128().map_or(0, |v| v as i64))
        }
        Value::U8(_) | Value::U16(_) | Value::U32(_) | Value::U64(_) => {
            MySqlValue::UInt(value.as_i128().map_or(0, |v| v as u64))
        }
        Value::F32(v) => MySqlValue::Float(*v),
        Value::F64(v) => MySqlValue::Double(*v),
        Value::String(v) => MySqlValue::Bytes(v.as_bytes().to_vec()),
        Value::Bytes(v) => MySqlValue::Bytes(v.clone()),
        Value::Date(v) => date_parts(v, NaiveTime::MIN),
        Value::DateTime(v) => date_parts(&v.date(), v.time()),
        Value::Time(v) => {
            let (h, m, s, us) = clock(v);
            MySqlValue::Time(false, 0, h, m, s, us)
        }
        Value::Decimal(v) => MySqlValue::Bytes(v.to_string().into_bytes()),
        Value::Json(v) => MySqlValue::Bytes(v.to_string().into_bytes()),
    }
}

fn clock(time: &NaiveTime) -> (u8, u8, u8, u32) {
    (
        time.hour() as u8,
        time.minute() as u8,
        time.second() as u8,
        time.nanosecond() / 1_000,
    )
}

fn date_parts(date: &NaiveDate, time: NaiveTime) -> MySqlValue {
    let (h, m, s, us) = clock(&time);
    MySqlValue::Date(date.year() as u16, date.month() as u8, date.day() as u8, h, m, s, us)
}

/// Convert a driver value to a mapgen value.
///
/// Text columns arrive as bytes; valid UTF-8 becomes `Value::String`.
/// A DATETIME at exactly midnight is read back as `Value::Date`, which
/// `NaiveDateTime::from_value` accepts.
pub fn from_mysql_value(value: MySqlValue) -> Result<Value> {
    match value {
        MySqlValue::NULL => Ok(Value::Null),
        MySqlValue::Bytes(v) => match String::from_utf8(v) {
            Ok(s) => Ok(Value::String(s)),
            Err(e) => Ok(Value::Bytes(e.into_bytes())),
        },
        MySqlValue::Int(v) => Ok(Value::I64(v)),
        MySqlValue::UInt(v) => Ok(Value::U64(v)),
        MySqlValue::Float(v) => Ok(Value::F32(v)),
        MySqlValue::Double(v) => Ok(Value::F64(v)),
        MySqlValue::Date(year, month, day, hour, min, sec, micro) => {
            let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
                .ok_or_else(|| Error::TypeConversion {
                    expected: "date",
                    actual: format!("{}-{}-{}", year, month, day),
                })?;
            if hour == 0 && min == 0 && sec == 0 && micro == 0 {
                Ok(Value::Date(date))
            } else {
                let time =
                    NaiveTime::from_hms_micro_opt(hour as u32, min as u32, sec as u32, micro)
                        .ok_or_else(|| Error::TypeConversion {
                            expected: "time",
                            actual: format!("{}:{}:{}.{}", hour, min, sec, micro),
                        })?;
                Ok(Value::DateTime(NaiveDateTime::new(date, time)))
            }
        }
        MySqlValue::Time(is_neg, days, hours, mins, secs, micro) => {
            // TIME spans -838:59:59..838:59:59; NaiveTime is a time of day
            if is_neg || days > 0 || hours >= 24 {
                return Err(Error::TypeConversion {
                    expected: "time (00:00:00 to 23:59:59)",
                    actual: format!(
                        "{}{}:{:02}:{:02}",
                        if is_neg { "-" } else { "" },
                        days * 24 + hours as u32,
                        mins,
                        secs
                    ),
                });
            }
            let time = NaiveTime::from_hms_micro_opt(hours as u32, mins as u32, secs as u32, micro)
                .ok_or_else(|| Error::TypeConversion {
                    expected: "time",
                    actual: format!("{}:{}:{}.{}", hours, mins, secs, micro),
                })?;
            Ok(Value::Time(time))
        }
    }
}
