//! The default function library.
//!
//! Covers the operators the compiler lowers expressions to (both the bare
//! legacy names and the `Bool.`/`Number.`/`String.` method forms), the
//! documented dialogue-language builtins, and the visit-tracking pair.
//! Built fresh for every run and merged beneath the embedder's map, so
//! embedder entries override these.

use std::sync::Arc;

use rand::Rng;

use crate::error::{VmError, VmResult};
use crate::funcs::{FuncMap, Function, ParamKind};
use crate::value::Value;
use crate::vars::VariableStorage;
use crate::VISIT_VARIABLE_PREFIX;

fn num1(f: impl Fn(f32) -> f32 + Send + Sync + 'static) -> Function {
    Function::new(vec![ParamKind::Float32], move |args| {
        Ok(Some(Value::Number(f(args[0].to_f32()?))))
    })
}

fn num2(f: impl Fn(f32, f32) -> f32 + Send + Sync + 'static) -> Function {
    Function::new(vec![ParamKind::Float32, ParamKind::Float32], move |args| {
        Ok(Some(Value::Number(f(args[0].to_f32()?, args[1].to_f32()?))))
    })
}

fn num_cmp(f: impl Fn(f32, f32) -> bool + Send + Sync + 'static) -> Function {
    Function::new(vec![ParamKind::Float32, ParamKind::Float32], move |args| {
        Ok(Some(Value::Bool(f(args[0].to_f32()?, args[1].to_f32()?))))
    })
}

fn bool1(f: impl Fn(bool) -> bool + Send + Sync + 'static) -> Function {
    Function::new(vec![ParamKind::Bool], move |args| {
        Ok(Some(Value::Bool(f(args[0].to_bool()))))
    })
}

fn bool2(f: impl Fn(bool, bool) -> bool + Send + Sync + 'static) -> Function {
    Function::new(vec![ParamKind::Bool, ParamKind::Bool], move |args| {
        Ok(Some(Value::Bool(f(args[0].to_bool(), args[1].to_bool()))))
    })
}

fn str_cmp(f: impl Fn(&str, &str) -> bool + Send + Sync + 'static) -> Function {
    Function::new(vec![ParamKind::String, ParamKind::String], move |args| {
        Ok(Some(Value::Bool(f(
            &args[0].to_string(),
            &args[1].to_string(),
        ))))
    })
}

fn any_eq(negate: bool) -> Function {
    Function::new(vec![ParamKind::Any, ParamKind::Any], move |args| {
        Ok(Some(Value::Bool((args[0] == args[1]) != negate)))
    })
}

/// Integer modulo, returned as a number like every other arithmetic op.
fn modulo() -> Function {
    Function::new(vec![ParamKind::Int, ParamKind::Int], |args| {
        let (x, y) = (args[0].to_int()?, args[1].to_int()?);
        if y == 0 {
            return Err(VmError::FunctionArgMismatch(
                "modulo by zero".to_string(),
            ));
        }
        Ok(Some(Value::Number((x % y) as f32)))
    })
}

/// Addition does something different depending on the argument types, so
/// it cannot rely on implicit conversion: null yields the other operand,
/// a string on either side concatenates, and anything else adds
/// numerically.
fn add_values(x: &Value, y: &Value) -> VmResult<Value> {
    if x.is_null() {
        return Ok(y.clone());
    }
    if y.is_null() {
        return Ok(x.clone());
    }
    if let Value::String(xs) = x {
        return Ok(Value::String(format!("{xs}{y}")));
    }
    if let Value::String(ys) = y {
        return Ok(Value::String(format!("{x}{ys}")));
    }
    match x {
        Value::Int(xi) => Ok(Value::Int(xi + y.to_int()?)),
        _ => Ok(Value::Number(x.to_f32()? + y.to_f32()?)),
    }
}

/// Builds the default library. `vars` backs the visit-tracking builtins.
pub(crate) fn default_func_map(vars: &Arc<dyn VariableStorage>) -> FuncMap {
    let mut map = FuncMap::new();

    map.register(
        "None",
        Function::new(vec![ParamKind::Any], |args| Ok(Some(args[0].clone()))),
    );
    map.register("EqualTo", any_eq(false));
    map.register("NotEqualTo", any_eq(true));
    map.register("GreaterThan", num_cmp(|x, y| x > y));
    map.register("GreaterThanOrEqualTo", num_cmp(|x, y| x >= y));
    map.register("LessThan", num_cmp(|x, y| x < y));
    map.register("LessThanOrEqualTo", num_cmp(|x, y| x <= y));
    map.register("Or", bool2(|x, y| x || y));
    map.register("And", bool2(|x, y| x && y));
    map.register("Xor", bool2(|x, y| x != y));
    map.register("Not", bool1(|x| !x));
    map.register("UnaryMinus", num1(|x| -x));
    map.register(
        "Add",
        Function::new(vec![ParamKind::Any, ParamKind::Any], |args| {
            add_values(&args[0], &args[1]).map(Some)
        }),
    );
    map.register("Minus", num2(|x, y| x - y));
    map.register("Multiply", num2(|x, y| x * y));
    map.register("Divide", num2(|x, y| x / y));
    map.register("Modulo", modulo());

    map.register("Bool.EqualTo", bool2(|x, y| x == y));
    map.register("Bool.NotEqualTo", bool2(|x, y| x != y));
    map.register("Bool.Or", bool2(|x, y| x || y));
    map.register("Bool.And", bool2(|x, y| x && y));
    map.register("Bool.Xor", bool2(|x, y| x != y));
    map.register("Bool.Not", bool1(|x| !x));
    map.register("Number.EqualTo", num_cmp(|x, y| x == y));
    map.register("Number.NotEqualTo", num_cmp(|x, y| x != y));
    map.register("Number.Add", num2(|x, y| x + y));
    map.register("Number.Minus", num2(|x, y| x - y));
    map.register("Number.Multiply", num2(|x, y| x * y));
    map.register("Number.Divide", num2(|x, y| x / y));
    map.register("Number.Modulo", modulo());
    map.register("Number.UnaryMinus", num1(|x| -x));
    map.register("Number.GreaterThan", num_cmp(|x, y| x > y));
    map.register("Number.GreaterThanOrEqualTo", num_cmp(|x, y| x >= y));
    map.register("Number.LessThan", num_cmp(|x, y| x < y));
    map.register("Number.LessThanOrEqualTo", num_cmp(|x, y| x <= y));
    map.register("String.EqualTo", str_cmp(|x, y| x == y));
    map.register("String.NotEqualTo", str_cmp(|x, y| x != y));
    map.register(
        "String.Add",
        Function::new(vec![ParamKind::String, ParamKind::String], |args| {
            Ok(Some(Value::String(format!("{}{}", args[0], args[1]))))
        }),
    );

    map.register(
        "random",
        Function::new(vec![], |_| {
            Ok(Some(Value::Number(rand::thread_rng().gen::<f32>())))
        }),
    );
    map.register(
        "random_range",
        Function::new(vec![ParamKind::Int, ParamKind::Int], |args| {
            let (lo, hi) = (args[0].to_int()?, args[1].to_int()?);
            if hi <= lo {
                return Err(VmError::FunctionArgMismatch(format!(
                    "random_range: empty range [{lo}, {hi})"
                )));
            }
            Ok(Some(Value::Number(
                rand::thread_rng().gen_range(lo..hi) as f32
            )))
        }),
    );
    map.register(
        "dice",
        Function::new(vec![ParamKind::Int], |args| {
            let n = args[0].to_int()?;
            if n < 1 {
                return Err(VmError::FunctionArgMismatch(format!(
                    "dice: need at least one side, got {n}"
                )));
            }
            Ok(Some(Value::Number(
                rand::thread_rng().gen_range(1..=n) as f32
            )))
        }),
    );
    map.register("round", num1(|x| x.round()));
    map.register(
        "round_places",
        Function::new(vec![ParamKind::Float32, ParamKind::Int], |args| {
            let n = args[0].to_f32()?;
            let scale = 10f32.powi(args[1].to_int()? as i32);
            Ok(Some(Value::Number((n * scale).round() / scale)))
        }),
    );
    map.register("floor", num1(|x| x.floor()));
    map.register("ceil", num1(|x| x.ceil()));
    map.register("inc", num1(|x| x.trunc() + 1.0));
    map.register("dec", num1(|x| x.ceil() - 1.0));
    map.register("decimal", num1(|x| x.fract()));

    let visit_vars = Arc::clone(vars);
    map.register(
        "visited",
        Function::new(vec![ParamKind::String], move |args| {
            let key = format!("{VISIT_VARIABLE_PREFIX}{}", args[0]);
            Ok(Some(Value::Bool(visit_vars.get_value(&key).is_some())))
        }),
    );
    let visit_vars = Arc::clone(vars);
    map.register(
        "visited_count",
        Function::new(vec![ParamKind::String], move |args| {
            let key = format!("{VISIT_VARIABLE_PREFIX}{}", args[0]);
            let count = visit_vars
                .get_value(&key)
                .map(|v| v.to_int().unwrap_or(0))
                .unwrap_or(0);
            Ok(Some(Value::Int(count)))
        }),
    );

    map
}
