//! Target-directed value conversions.
//!
//! Conversions are total over the value union except where a string must be
//! parsed; those return [`VmError::NotConvertible`]. The to-string
//! conversion is the [`Value`] `Display` impl.

use skein_bytecode::{operand, Operand};

use crate::error::{VmError, VmResult};
use crate::value::Value;

impl Value {
    /// Converts to bool. Values are truthy: non-zero numbers, non-empty
    /// strings, and `true` convert to true; null converts to false.
    pub fn to_bool(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Int(i) => *i != 0,
            Value::String(s) => !s.is_empty(),
        }
    }

    /// Converts to an integer, truncating numbers and parsing strings.
    pub fn to_int(&self) -> VmResult<i64> {
        match self {
            Value::Null => Ok(0),
            Value::Bool(b) => Ok(*b as i64),
            Value::Number(n) => Ok(*n as i64),
            Value::Int(i) => Ok(*i),
            Value::String(s) => s.trim().parse().map_err(|_| VmError::NotConvertible {
                from: "string",
                to: "int",
            }),
        }
    }

    /// Converts to a 32-bit float, parsing strings.
    pub fn to_f32(&self) -> VmResult<f32> {
        match self {
            Value::Null => Ok(0.0),
            Value::Bool(b) => Ok(*b as i64 as f32),
            Value::Number(n) => Ok(*n),
            Value::Int(i) => Ok(*i as f32),
            Value::String(s) => s.trim().parse().map_err(|_| VmError::NotConvertible {
                from: "string",
                to: "float32",
            }),
        }
    }

    /// Converts to a 64-bit float, parsing strings.
    pub fn to_f64(&self) -> VmResult<f64> {
        match self {
            Value::Null => Ok(0.0),
            Value::Bool(b) => Ok(*b as i64 as f64),
            Value::Number(n) => Ok(*n as f64),
            Value::Int(i) => Ok(*i as f64),
            Value::String(s) => s.trim().parse().map_err(|_| VmError::NotConvertible {
                from: "string",
                to: "float64",
            }),
        }
    }
}

/// Reads an integer quantity from a float operand.
///
/// Substitution and argument counts are stored as float operands on the
/// wire; anything other than a non-negative float here is a malformed
/// program.
pub fn operand_to_int(operand: Option<&Operand>) -> VmResult<usize> {
    let operand = operand.ok_or(VmError::NilOperand)?;
    match &operand.value {
        Some(operand::Value::FloatValue(f)) if *f >= 0.0 => Ok(*f as usize),
        Some(operand::Value::FloatValue(_)) => Err(VmError::WrongType {
            want: "non-negative count",
            got: "number",
        }),
        Some(operand::Value::StringValue(_)) => Err(VmError::WrongType {
            want: "float operand",
            got: "string",
        }),
        Some(operand::Value::BoolValue(_)) => Err(VmError::WrongType {
            want: "float operand",
            got: "bool",
        }),
        None => Err(VmError::NilOperand),
    }
}

/// Converts an operand (e.g. a program initial value) to a machine value.
pub(crate) fn operand_to_value(operand: &Operand) -> Value {
    match &operand.value {
        Some(operand::Value::StringValue(s)) => Value::String(s.clone()),
        Some(operand::Value::BoolValue(b)) => Value::Bool(*b),
        Some(operand::Value::FloatValue(f)) => Value::Number(*f),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_bool_truthiness() {
        assert!(!Value::Null.to_bool());
        assert!(Value::Bool(true).to_bool());
        assert!(Value::Number(0.5).to_bool());
        assert!(!Value::Number(0.0).to_bool());
        assert!(!Value::Number(f32::NAN).to_bool());
        assert!(Value::Int(-1).to_bool());
        assert!(Value::from("x").to_bool());
        assert!(!Value::from("").to_bool());
    }

    #[test]
    fn test_to_int() {
        assert_eq!(Value::Null.to_int().unwrap(), 0);
        assert_eq!(Value::Bool(true).to_int().unwrap(), 1);
        assert_eq!(Value::Number(3.9).to_int().unwrap(), 3);
        assert_eq!(Value::from("42").to_int().unwrap(), 42);
        assert!(matches!(
            Value::from("nope").to_int(),
            Err(VmError::NotConvertible { to: "int", .. })
        ));
    }

    #[test]
    fn test_to_float() {
        assert_eq!(Value::Bool(true).to_f32().unwrap(), 1.0);
        assert_eq!(Value::Int(2).to_f64().unwrap(), 2.0);
        assert_eq!(Value::from("2.5").to_f32().unwrap(), 2.5);
        assert!(Value::from("two").to_f32().is_err());
    }

    #[test]
    fn test_operand_to_int() {
        assert_eq!(operand_to_int(Some(&Operand::float(3.0))).unwrap(), 3);
        assert!(matches!(operand_to_int(None), Err(VmError::NilOperand)));
        assert!(matches!(
            operand_to_int(Some(&Operand::string("3"))),
            Err(VmError::WrongType { .. })
        ));
        assert!(operand_to_int(Some(&Operand::float(-1.0))).is_err());
    }
}
