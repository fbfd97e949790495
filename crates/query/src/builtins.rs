//! Builtin functions: arithmetic, comparisons and aggregates.
//!
//! Operands are not coerced across types. Int64 and Float64 mix as numbers,
//! strings compare with strings and booleans with booleans; any other
//! pairing is a `TypeMismatch`. Equality never fails: values of unrelated
//! types are simply unequal.

use crate::function::FunctionRegistry;
use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;
use factview_core::{Error, Result, Value};

/// Installs every builtin into `registry`.
pub fn install(registry: &mut FunctionRegistry) {
    for op in ["+", "-", "*", "/"] {
        registry.define(op, &["a", "b"], move |args| arithmetic(op, &args[0], &args[1]));
    }

    registry
        .define_filter(">", &["a", "b"], |args| {
            Ok(compare(">", &args[0], &args[1])? == Some(Ordering::Greater))
        })
        .define_filter("<", &["a", "b"], |args| {
            Ok(compare("<", &args[0], &args[1])? == Some(Ordering::Less))
        })
        .define_filter(">=", &["a", "b"], |args| {
            Ok(matches!(
                compare(">=", &args[0], &args[1])?,
                Some(Ordering::Greater | Ordering::Equal)
            ))
        })
        .define_filter("<=", &["a", "b"], |args| {
            Ok(matches!(
                compare("<=", &args[0], &args[1])?,
                Some(Ordering::Less | Ordering::Equal)
            ))
        })
        .define_filter("=", &["a", "b"], |args| Ok(equals(&args[0], &args[1])))
        .define_filter("!=", &["a", "b"], |args| Ok(!equals(&args[0], &args[1])));

    registry.define_multi("range", &["start", "end"], |args| {
        match (&args[0], &args[1]) {
            (Value::Int64(start), Value::Int64(end)) => Ok((*start..*end).map(Value::Int64).collect()),
            (a, b) => Err(Error::type_mismatch("range", a.type_name(), b.type_name())),
        }
    });

    registry
        .define_aggregate("sum", &["value"], |columns| sum(&columns[0]))
        .define_aggregate("count", &["value"], |columns| {
            let count = columns[0].iter().filter(|v| !v.is_null()).count();
            Ok(Value::Int64(count as i64))
        })
        .define_aggregate("average", &["value"], |columns| average(&columns[0]))
        .define_aggregate("min", &["value"], |columns| {
            Ok(columns[0].iter().filter(|v| !v.is_null()).min().cloned().unwrap_or(Value::Null))
        })
        .define_aggregate("max", &["value"], |columns| {
            Ok(columns[0].iter().filter(|v| !v.is_null()).max().cloned().unwrap_or(Value::Null))
        });
}

/// Orders two scalars of compatible types. `None` when a NaN is involved.
pub fn compare(op: &str, a: &Value, b: &Value) -> Result<Option<Ordering>> {
    match (a, b) {
        (Value::Int64(x), Value::Int64(y)) => Ok(Some(x.cmp(y))),
        (Value::String(x), Value::String(y)) => Ok(Some(x.cmp(y))),
        (Value::Boolean(x), Value::Boolean(y)) => Ok(Some(x.cmp(y))),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) if x.is_nan() || y.is_nan() => Ok(None),
            (Some(_), Some(_)) => Ok(Some(a.cmp(b))),
            _ => Err(Error::type_mismatch(op, a.type_name(), b.type_name())),
        },
    }
}

/// Equality as facts see it: Int64 and Float64 compare by numeric value.
pub fn equals(a: &Value, b: &Value) -> bool {
    a == b
}

fn arithmetic(op: &str, a: &Value, b: &Value) -> Result<Value> {
    match (a, b) {
        (Value::Int64(x), Value::Int64(y)) if op != "/" => {
            let exact = match op {
                "+" => x.checked_add(*y),
                "-" => x.checked_sub(*y),
                _ => x.checked_mul(*y),
            };
            match exact {
                Some(v) => Ok(Value::Int64(v)),
                None => float_arithmetic(op, *x as f64, *y as f64),
            }
        }
        (Value::String(x), Value::String(y)) if op == "+" => {
            let mut joined = String::with_capacity(x.len() + y.len());
            joined.push_str(x);
            joined.push_str(y);
            Ok(Value::String(joined))
        }
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => float_arithmetic(op, x, y),
            _ => Err(Error::type_mismatch(op, a.type_name(), b.type_name())),
        },
    }
}

fn float_arithmetic(op: &str, x: f64, y: f64) -> Result<Value> {
    let v = match op {
        "+" => x + y,
        "-" => x - y,
        "*" => x * y,
        "/" => x / y,
        other => return Err(Error::unknown_function(other)),
    };
    Ok(Value::Float64(v))
}

fn sum(column: &[Value]) -> Result<Value> {
    let mut int_total: Option<i64> = Some(0);
    let mut float_total = 0.0;
    let mut saw_float = false;
    for value in column {
        match value {
            Value::Null => {}
            Value::Int64(v) => {
                int_total = int_total.and_then(|t| t.checked_add(*v));
                float_total += *v as f64;
            }
            Value::Float64(v) => {
                saw_float = true;
                float_total += v;
            }
            other => return Err(Error::type_mismatch("sum", other.type_name(), "number")),
        }
    }
    match int_total {
        Some(total) if !saw_float => Ok(Value::Int64(total)),
        _ => Ok(Value::Float64(float_total)),
    }
}

fn average(column: &[Value]) -> Result<Value> {
    let numbers: Vec<&Value> = column.iter().filter(|v| !v.is_null()).collect();
    if numbers.is_empty() {
        return Ok(Value::Null);
    }
    let mut total = 0.0;
    for value in &numbers {
        total += value
            .as_f64()
            .ok_or_else(|| Error::type_mismatch("average", value.type_name(), "number"))?;
    }
    Ok(Value::Float64(total / numbers.len() as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::FunctionBody;
    use alloc::vec;

    fn call(registry: &FunctionRegistry, name: &str, args: &[Value]) -> Result<Value> {
        match registry.get(name).unwrap().body() {
            FunctionBody::Scalar(f) => f(args),
            FunctionBody::Filter(f) => f(args).map(Value::Boolean),
            _ => panic!("not a scalar or filter"),
        }
    }

    fn aggregate(registry: &FunctionRegistry, name: &str, column: Vec<Value>) -> Result<Value> {
        match registry.get(name).unwrap().body() {
            FunctionBody::Aggregate(f) => f(&[column]),
            _ => panic!("not an aggregate"),
        }
    }

    #[test]
    fn test_arithmetic() {
        let registry = FunctionRegistry::with_builtins();
        let two = Value::Int64(2);
        let three = Value::Int64(3);
        assert_eq!(call(&registry, "+", &[two.clone(), three.clone()]).unwrap(), Value::Int64(5));
        assert_eq!(call(&registry, "-", &[two.clone(), three.clone()]).unwrap(), Value::Int64(-1));
        assert_eq!(call(&registry, "*", &[two.clone(), Value::Float64(1.5)]).unwrap(), Value::Float64(3.0));
        assert_eq!(call(&registry, "/", &[three, two]).unwrap(), Value::Float64(1.5));
        assert_eq!(
            call(&registry, "+", &[Value::from("a"), Value::from("b")]).unwrap(),
            Value::from("ab")
        );
    }

    #[test]
    fn test_arithmetic_overflow_falls_back_to_float() {
        let registry = FunctionRegistry::with_builtins();
        let result = call(&registry, "+", &[Value::Int64(i64::MAX), Value::Int64(1)]).unwrap();
        assert!(matches!(result, Value::Float64(_)));
    }

    #[test]
    fn test_type_mismatch() {
        let registry = FunctionRegistry::with_builtins();
        let err = call(&registry, ">", &[Value::from("a"), Value::Int64(1)]).unwrap_err();
        assert_eq!(err, Error::type_mismatch(">", "string", "int64"));
        assert!(call(&registry, "-", &[Value::from("a"), Value::from("b")]).is_err());
    }

    #[test]
    fn test_comparisons() {
        let registry = FunctionRegistry::with_builtins();
        let t = Value::Boolean(true);
        let f = Value::Boolean(false);
        assert_eq!(call(&registry, ">", &[Value::Int64(30), Value::Int64(18)]).unwrap(), t);
        assert_eq!(call(&registry, ">", &[Value::Int64(18), Value::Int64(18)]).unwrap(), f);
        assert_eq!(call(&registry, ">=", &[Value::Int64(18), Value::Float64(18.0)]).unwrap(), t);
        assert_eq!(call(&registry, "<", &[Value::from("a"), Value::from("b")]).unwrap(), t);
        assert_eq!(call(&registry, "=", &[Value::Int64(1), Value::Float64(1.0)]).unwrap(), t);
        assert_eq!(call(&registry, "=", &[Value::Int64(1), Value::from("1")]).unwrap(), f);
        assert_eq!(call(&registry, "!=", &[Value::Null, Value::Int64(0)]).unwrap(), t);
        assert_eq!(
            call(&registry, "<=", &[Value::Float64(f64::NAN), Value::Int64(0)]).unwrap(),
            f
        );
    }

    #[test]
    fn test_aggregates() {
        let registry = FunctionRegistry::with_builtins();
        let ints = vec![Value::Int64(1), Value::Null, Value::Int64(5)];
        assert_eq!(aggregate(&registry, "sum", ints.clone()).unwrap(), Value::Int64(6));
        assert_eq!(aggregate(&registry, "count", ints.clone()).unwrap(), Value::Int64(2));
        assert_eq!(aggregate(&registry, "average", ints.clone()).unwrap(), Value::Float64(3.0));
        assert_eq!(aggregate(&registry, "min", ints.clone()).unwrap(), Value::Int64(1));
        assert_eq!(aggregate(&registry, "max", ints).unwrap(), Value::Int64(5));

        let mixed = vec![Value::Int64(1), Value::Float64(0.5)];
        assert_eq!(aggregate(&registry, "sum", mixed).unwrap(), Value::Float64(1.5));
        assert_eq!(aggregate(&registry, "average", vec![]).unwrap(), Value::Null);
        assert!(aggregate(&registry, "sum", vec![Value::from("x")]).is_err());
    }
}
