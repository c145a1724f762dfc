//! The function library.
//!
//! Functions callable from CALL_FUNC are registered with a signature — a
//! vector of parameter kinds, optionally variadic — and a trampoline
//! closure over a value slice. The machine converts each popped argument to
//! its declared kind before invoking, so trampolines receive values of the
//! variants they declared. A function returns zero or one values, plus an
//! optional error through its `Result`.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{VmError, VmResult};
use crate::value::Value;

/// The declared kind of a function parameter. Arguments are converted to
/// this kind before the function body runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    /// Convert the argument to bool.
    Bool,
    /// Convert the argument to an integer.
    Int,
    /// Convert the argument to a 32-bit float.
    Float32,
    /// Convert the argument to a 64-bit float.
    Float64,
    /// Convert the argument to a string.
    String,
    /// Pass the argument through unchanged.
    Any,
}

type FuncBody = dyn Fn(&[Value]) -> VmResult<Option<Value>> + Send + Sync;

/// A function callable from the machine.
pub struct Function {
    params: Vec<ParamKind>,
    variadic: bool,
    body: Box<FuncBody>,
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function")
            .field("params", &self.params)
            .field("variadic", &self.variadic)
            .finish()
    }
}

impl Function {
    /// A function with a fixed parameter list.
    pub fn new(
        params: Vec<ParamKind>,
        body: impl Fn(&[Value]) -> VmResult<Option<Value>> + Send + Sync + 'static,
    ) -> Self {
        Function {
            params,
            variadic: false,
            body: Box::new(body),
        }
    }

    /// A variadic function. The final entry of `params` is the kind of the
    /// variadic tail, which may bind zero or more arguments.
    pub fn variadic(
        params: Vec<ParamKind>,
        body: impl Fn(&[Value]) -> VmResult<Option<Value>> + Send + Sync + 'static,
    ) -> Self {
        assert!(!params.is_empty(), "variadic function needs a tail kind");
        Function {
            params,
            variadic: true,
            body: Box::new(body),
        }
    }

    /// The number of arguments the function requires.
    pub fn required_arity(&self) -> usize {
        if self.variadic {
            self.params.len() - 1
        } else {
            self.params.len()
        }
    }

    /// Whether `argc` provided arguments satisfy this signature.
    pub(crate) fn check_arity(&self, argc: usize) -> VmResult {
        if self.variadic {
            // The variadic tail is free to be empty.
            if argc < self.required_arity() {
                return Err(VmError::FunctionArgMismatch(format!(
                    "insufficient args provided by program [got {argc} < want {}]",
                    self.required_arity()
                )));
            }
        } else if argc != self.params.len() {
            return Err(VmError::FunctionArgMismatch(format!(
                "wrong number of args provided by program [got {argc}, want {}]",
                self.params.len()
            )));
        }
        Ok(())
    }

    /// The declared kind of positional argument `i`, with the variadic
    /// tail kind repeating.
    fn param_kind(&self, i: usize) -> ParamKind {
        if self.variadic && i >= self.params.len() - 1 {
            self.params[self.params.len() - 1]
        } else {
            self.params[i]
        }
    }

    /// Converts raw popped arguments to their declared kinds. Conversion
    /// failure is an argument mismatch.
    pub(crate) fn convert_args(&self, args: Vec<Value>) -> VmResult<Vec<Value>> {
        args.into_iter()
            .enumerate()
            .map(|(i, value)| {
                let kind = self.param_kind(i);
                convert_arg(value, kind).map_err(|err| {
                    VmError::FunctionArgMismatch(format!(
                        "argument {i} not convertible to {kind:?}: {err}"
                    ))
                })
            })
            .collect()
    }

    /// Invokes the function body.
    pub(crate) fn invoke(&self, args: &[Value]) -> VmResult<Option<Value>> {
        (self.body)(args)
    }
}

fn convert_arg(value: Value, kind: ParamKind) -> VmResult<Value> {
    Ok(match kind {
        ParamKind::Any => value,
        ParamKind::Bool => Value::Bool(value.to_bool()),
        ParamKind::Int => Value::Int(value.to_int()?),
        ParamKind::Float32 => Value::Number(value.to_f32()?),
        ParamKind::Float64 => Value::Number(value.to_f64()? as f32),
        ParamKind::String => Value::String(value.to_string()),
    })
}

/// A name-to-function map.
///
/// The machine merges the default library with the embedder's map at the
/// start of each run; embedder entries override defaults with the same
/// name.
#[derive(Clone, Default)]
pub struct FuncMap {
    funcs: FxHashMap<String, Arc<Function>>,
}

impl FuncMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a function, replacing any existing entry with the name.
    pub fn register(&mut self, name: impl Into<String>, function: Function) {
        self.funcs.insert(name.into(), Arc::new(function));
    }

    /// Looks up a function by name.
    pub fn get(&self, name: &str) -> Option<&Arc<Function>> {
        self.funcs.get(name)
    }

    /// Whether a function with the name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }

    /// Merges `other` into this map; entries in `other` win.
    pub fn merge(&mut self, other: FuncMap) {
        self.funcs.extend(other.funcs);
    }
}

impl std::fmt::Debug for FuncMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.funcs.keys().collect();
        names.sort();
        f.debug_struct("FuncMap").field("names", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_arity_check() {
        let f = Function::new(vec![ParamKind::Float32, ParamKind::Float32], |_| Ok(None));
        assert!(f.check_arity(2).is_ok());
        assert!(matches!(
            f.check_arity(1),
            Err(VmError::FunctionArgMismatch(_))
        ));
        assert!(f.check_arity(3).is_err());
    }

    #[test]
    fn test_variadic_arity_check() {
        let f = Function::variadic(vec![ParamKind::String, ParamKind::Any], |_| Ok(None));
        assert_eq!(f.required_arity(), 1);
        assert!(f.check_arity(1).is_ok());
        assert!(f.check_arity(5).is_ok());
        assert!(f.check_arity(0).is_err());
    }

    #[test]
    fn test_convert_args_per_schema() {
        let f = Function::new(
            vec![ParamKind::Float32, ParamKind::String, ParamKind::Bool],
            |_| Ok(None),
        );
        let args = f
            .convert_args(vec![Value::from("3"), Value::Number(1.5), Value::Null])
            .unwrap();
        assert_eq!(
            args,
            vec![Value::Number(3.0), Value::from("1.5"), Value::Bool(false)]
        );
    }

    #[test]
    fn test_convert_args_mismatch() {
        let f = Function::new(vec![ParamKind::Int], |_| Ok(None));
        assert!(matches!(
            f.convert_args(vec![Value::from("not a number")]),
            Err(VmError::FunctionArgMismatch(_))
        ));
    }

    #[test]
    fn test_merge_overrides() {
        let mut base = FuncMap::new();
        base.register("f", Function::new(vec![], |_| Ok(Some(Value::Int(1)))));
        let mut over = FuncMap::new();
        over.register("f", Function::new(vec![], |_| Ok(Some(Value::Int(2)))));
        base.merge(over);
        let f = base.get("f").unwrap();
        assert_eq!(f.invoke(&[]).unwrap(), Some(Value::Int(2)));
    }
}
