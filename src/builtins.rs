use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::diagnostics::{RuntimeError, RuntimeResult};
use crate::eval;
use crate::value::{Builtin, BuiltinFn, RangeValue, Value};

// The shared constant values. Rust enums compare by value, so these stand
// in for the original's identity-compared singletons with the same
// observable semantics.
pub const TRUE: Value = Value::Boolean(true);
pub const FALSE: Value = Value::Boolean(false);
pub const NONE: Value = Value::Option(None);

pub fn native_bool(value: bool) -> Value {
    if value {
        TRUE
    } else {
        FALSE
    }
}

lazy_static! {
    static ref ALL_BUILTINS: HashMap<&'static str, BuiltinFn> = {
        let mut map: HashMap<&'static str, BuiltinFn> = HashMap::new();
        map.insert("len", builtin_len);
        map.insert("size", builtin_len);
        map.insert("count", builtin_len);
        map.insert("print", builtin_print);
        map.insert("hash", builtin_hash);
        map.insert("range", builtin_range);
        map.insert("each", builtin_each);
        map.insert("map", builtin_map);
        map
    };
}

pub fn is_builtin(name: &str) -> bool {
    ALL_BUILTINS.contains_key(name)
}

/// Resolved ahead of the environment chain, forming an implicit outermost
/// scope.
pub fn get_builtin(name: &str) -> Option<Value> {
    ALL_BUILTINS
        .get_key_value(name)
        .map(|(name, func)| Value::Builtin(Builtin { name, func: *func }))
}

fn expect_arity(name: &str, args: &[Value], expected: usize) -> RuntimeResult<()> {
    if args.len() != expected {
        return Err(RuntimeError::invalid_argument(format!(
            "{name}(): expected {expected} argument(s), got {}",
            args.len()
        )));
    }
    Ok(())
}

/// Element count of a string, list, map or range; 1 or 0 for an option.
/// Aliases: `size`, `count`.
fn builtin_len(args: &[Value]) -> RuntimeResult<Value> {
    expect_arity("len", args, 1)?;
    let length = match &args[0] {
        Value::Str(s) => s.chars().count() as i64,
        Value::List(list) => list.borrow().len() as i64,
        Value::Map(map) => map.borrow().len() as i64,
        Value::Range(range) => range.len() as i64,
        Value::Option(opt) => opt.is_some() as i64,
        other => {
            return Err(RuntimeError::invalid_argument(format!(
                "len(): invalid argument type {}",
                other.kind_name()
            )))
        }
    };
    Ok(Value::Integer(length))
}

/// Writes the print-renderings joined by spaces, immediately, and returns
/// the written string.
fn builtin_print(args: &[Value]) -> RuntimeResult<Value> {
    if args.is_empty() {
        return Err(RuntimeError::invalid_argument(
            "print(): expected at least 1 argument",
        ));
    }
    let text = args
        .iter()
        .map(Value::print_text)
        .collect::<Vec<_>>()
        .join(" ");
    println!("{text}");
    Ok(Value::Str(text))
}

/// The structural hash of a value, as used by map keys.
fn builtin_hash(args: &[Value]) -> RuntimeResult<Value> {
    expect_arity("hash", args, 1)?;
    let hash = args[0].structural_hash()?;
    Ok(Value::Integer(hash as i64))
}

/// Direction-aware integer range: start inclusive, end exclusive; counts
/// down when start exceeds end.
fn builtin_range(args: &[Value]) -> RuntimeResult<Value> {
    expect_arity("range", args, 2)?;
    match (&args[0], &args[1]) {
        (Value::Integer(start), Value::Integer(end)) => Ok(Value::Range(RangeValue {
            start: *start,
            end: *end,
        })),
        (left, right) => Err(RuntimeError::invalid_argument(format!(
            "range(): expected two INTEGER bounds, got {} and {}",
            left.kind_name(),
            right.kind_name()
        ))),
    }
}

/// Per-element argument lists for one iteration pass: element+index for
/// lists, strings and ranges; key+value+index for maps.
fn iteration_calls(name: &str, iterable: &Value) -> RuntimeResult<Vec<Vec<Value>>> {
    match iterable {
        Value::List(list) => Ok(list
            .borrow()
            .iter()
            .enumerate()
            .map(|(i, element)| vec![element.clone(), Value::Integer(i as i64)])
            .collect()),
        Value::Str(s) => Ok(s
            .chars()
            .enumerate()
            .map(|(i, ch)| vec![Value::Str(ch.to_string()), Value::Integer(i as i64)])
            .collect()),
        Value::Range(range) => Ok(range
            .values()
            .into_iter()
            .enumerate()
            .map(|(i, n)| vec![Value::Integer(n), Value::Integer(i as i64)])
            .collect()),
        Value::Map(map) => Ok(map
            .borrow()
            .iter()
            .enumerate()
            .map(|(i, (_, (key, value)))| {
                vec![key.clone(), value.clone(), Value::Integer(i as i64)]
            })
            .collect()),
        other => Err(RuntimeError::invalid_argument(format!(
            "{name}(): cannot iterate a {}",
            other.kind_name()
        ))),
    }
}

fn expect_callable<'a>(name: &str, value: &'a Value) -> RuntimeResult<&'a Value> {
    match value {
        Value::Function(_) | Value::Builtin(_) => Ok(value),
        other => Err(RuntimeError::invalid_argument(format!(
            "{name}(): expected a callable, got {}",
            other.kind_name()
        ))),
    }
}

/// Invokes the callable once per element for its side effects and hands the
/// original iterable back.
fn builtin_each(args: &[Value]) -> RuntimeResult<Value> {
    expect_arity("each", args, 2)?;
    let callable = expect_callable("each", &args[1])?;
    for call_args in iteration_calls("each", &args[0])? {
        let result = eval::apply_function(callable, &call_args, None)?;
        if let Value::Error(_) = result {
            return Ok(result);
        }
    }
    Ok(args[0].clone())
}

/// Like `each`, but collects the callable's results into a new list in
/// traversal order.
fn builtin_map(args: &[Value]) -> RuntimeResult<Value> {
    expect_arity("map", args, 2)?;
    let callable = expect_callable("map", &args[1])?;
    let calls = iteration_calls("map", &args[0])?;
    let mut collected = Vec::with_capacity(calls.len());
    for call_args in calls {
        let result = eval::apply_function(callable, &call_args, None)?;
        if let Value::Error(_) = result {
            return Ok(result);
        }
        collected.push(result);
    }
    Ok(Value::list(collected))
}
