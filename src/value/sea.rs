//! Conversion into `sea_query` values.
//!
//! Drivers built on the sea-query value stack accept `sea_query::Values`;
//! this keeps a rendered parameter list usable there without re-typing it.

use super::Value;

impl Value {
    /// Convert into the equivalent `sea_query::Value`.
    ///
    /// `Null` has no type of its own and is sent as a null string.
    pub fn into_sea_value(self) -> sea_query::Value {
        match self {
            Value::Null => sea_query::Value::String(None),
            Value::Bool(b) => b.into(),
            Value::Int(i) => i.into(),
            Value::Float(f) => f.into(),
            Value::Decimal(d) => d.into(),
            Value::String(s) => s.into(),
            Value::Uuid(u) => u.into(),
            Value::Date(d) => d.into(),
            Value::Time(t) => t.into(),
            Value::DateTime(dt) => dt.into(),
            Value::Timestamp(ts) => ts.into(),
            Value::Json(j) => j.into(),
        }
    }
}

/// Convert an ordered parameter list into `sea_query::Values`
pub fn to_sea_values(params: &[Value]) -> sea_query::Values {
    sea_query::Values(params.iter().cloned().map(Value::into_sea_value).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sea_values_preserve_order() {
        let values = to_sea_values(&[Value::from("Grace"), Value::Int(7), Value::Null]);
        assert_eq!(values.0.len(), 3);
        assert_eq!(values.0[0], sea_query::Value::String(Some("Grace".to_string())));
        assert_eq!(values.0[1], sea_query::Value::BigInt(Some(7)));
        assert_eq!(values.0[2], sea_query::Value::String(None));
    }

    #[test]
    fn test_bool_maps_to_bool() {
        assert_eq!(
            Value::Bool(true).into_sea_value(),
            sea_query::Value::Bool(Some(true))
        );
    }
}
