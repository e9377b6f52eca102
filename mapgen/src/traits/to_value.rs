//! Binding Rust values into queries

use crate::value::Value;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

/// Types that can be bound to a query placeholder.
///
/// Generated entities only bind the scalar types below; implement it for a
/// custom column type to use it in `Condition`s.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

// `$v` is `&Self` inside each conversion.
macro_rules! bind_as {
    ($($ty:ty => |$v:ident| $conv:expr;)*) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    let $v = self;
                    $conv
                }
            }
        )*
    };
}

bind_as! {
    bool => |v| Value::Bool(*v);
    i8 => |v| Value::I8(*v);
    i16 => |v| Value::I16(*v);
    i32 => |v| Value::I32(*v);
    i64 => |v| Value::I64(*v);
    u8 => |v| Value::U8(*v);
    u16 => |v| Value::U16(*v);
    u32 => |v| Value::U32(*v);
    u64 => |v| Value::U64(*v);
    f32 => |v| Value::F32(*v);
    f64 => |v| Value::F64(*v);
    NaiveDate => |v| Value::Date(*v);
    NaiveDateTime => |v| Value::DateTime(*v);
    NaiveTime => |v| Value::Time(*v);
    Decimal => |v| Value::Decimal(*v);
    str => |v| Value::String(v.to_owned());
    String => |v| Value::String(v.clone());
    [u8] => |v| Value::Bytes(v.to_vec());
    Vec<u8> => |v| Value::Bytes(v.clone());
    serde_json::Value => |v| Value::Json(v.clone());
    Value => |v| v.clone();
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, ToValue::to_value)
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}
