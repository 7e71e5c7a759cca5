//! Conversion between Verdict values and Rhai values

use rhai::{Array, Dynamic, Map};
use verdict_core::{Result, Value, VerdictError};

/// Convert a value to a rhai::Dynamic
pub fn value_to_dynamic(value: &Value) -> Dynamic {
    match value {
        Value::Null => Dynamic::UNIT,
        Value::Bool(b) => Dynamic::from(*b),
        Value::Int(n) => Dynamic::from(*n),
        Value::Float(f) => Dynamic::from(*f),
        Value::Char(c) => Dynamic::from(*c),
        Value::Str(s) | Value::Type(s) => Dynamic::from(s.clone()),
        Value::List(items) => {
            let items: Array = items.iter().map(value_to_dynamic).collect();
            Dynamic::from(items)
        }
        Value::Map(entries) => {
            let mut map = Map::new();
            for (k, v) in entries {
                map.insert(k.to_string().into(), value_to_dynamic(v));
            }
            Dynamic::from(map)
        }
    }
}

/// Convert a rhai::Dynamic to a value
pub fn dynamic_to_value(value: &Dynamic) -> Result<Value> {
    if value.is_unit() {
        return Ok(Value::Null);
    }
    if let Ok(b) = value.as_bool() {
        return Ok(Value::Bool(b));
    }
    if let Ok(n) = value.as_int() {
        return Ok(Value::Int(n));
    }
    if let Ok(f) = value.as_float() {
        return Ok(Value::Float(f));
    }
    if let Ok(c) = value.as_char() {
        return Ok(Value::Char(c));
    }
    if value.is_string() {
        return Ok(Value::Str(value.to_string()));
    }
    if let Some(items) = value.clone().try_cast::<Array>() {
        return Ok(Value::List(
            items.iter().map(dynamic_to_value).collect::<Result<_>>()?,
        ));
    }
    if let Some(map) = value.clone().try_cast::<Map>() {
        let entries = map
            .iter()
            .map(|(k, v)| Ok((Value::Str(k.to_string()), dynamic_to_value(v)?)))
            .collect::<Result<_>>()?;
        return Ok(Value::Map(entries));
    }
    Err(VerdictError::Conversion(format!(
        "unsupported script value of type {}",
        value.type_name()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars() {
        assert!(value_to_dynamic(&Value::Null).is_unit());
        assert_eq!(value_to_dynamic(&Value::Int(7)).as_int().unwrap(), 7);
        assert_eq!(dynamic_to_value(&Dynamic::from(2.5_f64)).unwrap(), Value::Float(2.5));
        assert_eq!(dynamic_to_value(&Dynamic::from('x')).unwrap(), Value::Char('x'));
        assert_eq!(
            dynamic_to_value(&value_to_dynamic(&Value::Type("app::Update".into()))).unwrap(),
            Value::from("app::Update")
        );
    }

    #[test]
    fn test_collections() {
        let list = Value::from(vec![Value::Int(1), Value::from("a")]);
        assert_eq!(dynamic_to_value(&value_to_dynamic(&list)).unwrap(), list);

        let map = Value::Map(vec![(Value::Int(1), Value::Bool(true))]);
        assert_eq!(
            dynamic_to_value(&value_to_dynamic(&map)).unwrap(),
            Value::Map(vec![(Value::from("1"), Value::Bool(true))])
        );
    }

    #[test]
    fn test_unsupported() {
        let timestamp = Dynamic::from(std::time::Duration::from_secs(1));
        assert!(matches!(
            dynamic_to_value(&timestamp),
            Err(VerdictError::Conversion(_))
        ));
    }
}
