use crate::ast::{Block, ConditionSet, InfixOp, Node, PrefixOp};
use crate::builtins::{self, native_bool, NONE};
use crate::diagnostics::{RuntimeError, RuntimeResult};
use crate::env::Environment;
use crate::span::Span;
use crate::value::{FunctionValue, MapValue, Value};
use std::rc::Rc;

/// True for the two control kinds that ride the value channel. Every
/// composition point checks this before combining results.
fn is_signal(value: &Value) -> bool {
    matches!(value, Value::ReturnSignal(_) | Value::Error(_))
}

pub fn eval(node: &Node, env: &Environment) -> RuntimeResult<Value> {
    match node {
        Node::Block(block) => eval_block(block, env),
        Node::Integer { value, .. } => Ok(Value::Integer(*value)),
        Node::Boolean { value, .. } => Ok(native_bool(*value)),
        Node::StringLit { value, .. } => Ok(Value::Str(value.clone())),
        Node::Placeholder { .. } => Ok(NONE),
        Node::Identifier { name, .. } => match builtins::get_builtin(name) {
            // Builtins shadow nothing: they are checked first, so a user
            // binding can never occlude one.
            Some(builtin) => Ok(builtin),
            None => env.get(name),
        },
        Node::OptionName { name, .. } => env.get(name),
        Node::Let {
            binding, value, ..
        } => {
            let bound = match value {
                Some(expr) => {
                    let evaluated = eval(expr, env)?;
                    if is_signal(&evaluated) {
                        return Ok(evaluated);
                    }
                    if binding.optional {
                        // An option name always holds an option; a plain
                        // initializer is wrapped once.
                        match evaluated {
                            opt @ Value::Option(_) => opt,
                            other => Value::some(other),
                        }
                    } else {
                        evaluated
                    }
                }
                None => NONE,
            };
            env.init(&binding.name, bound.clone())?;
            Ok(bound)
        }
        Node::Assign { target, value, .. } => {
            let evaluated = eval(value, env)?;
            if is_signal(&evaluated) {
                return Ok(evaluated);
            }
            match target.as_ref() {
                Node::Identifier { name, .. } | Node::OptionName { name, .. } => {
                    env.set(name, evaluated.clone())?;
                    Ok(evaluated)
                }
                Node::Index {
                    target: container,
                    index,
                    span,
                } => eval_index_assign(container, index, evaluated, env, *span),
                other => Err(RuntimeError::invalid_argument(format!(
                    "cannot assign to `{other}`"
                ))),
            }
        }
        Node::Return { value, .. } => {
            let evaluated = eval(value, env)?;
            match evaluated {
                signal @ (Value::ReturnSignal(_) | Value::Error(_)) => Ok(signal),
                other => Ok(Value::ReturnSignal(Box::new(other))),
            }
        }
        Node::List { elements, .. } => {
            let mut values = Vec::with_capacity(elements.len());
            for element in elements {
                let value = eval(element, env)?;
                if is_signal(&value) {
                    return Ok(value);
                }
                values.push(value);
            }
            Ok(Value::list(values))
        }
        Node::Map { pairs, .. } => {
            let mut map = MapValue::new();
            for (key_expr, value_expr) in pairs {
                let key = eval(key_expr, env)?;
                if is_signal(&key) {
                    return Ok(key);
                }
                let value = eval(value_expr, env)?;
                if is_signal(&value) {
                    return Ok(value);
                }
                let key_hash = key.structural_hash()?;
                map.insert(key_hash, key, value);
            }
            Ok(Value::map(map))
        }
        Node::Prefix { op, operand, .. } => {
            let operand = eval(operand, env)?;
            if is_signal(&operand) {
                return Ok(operand);
            }
            match op {
                PrefixOp::Bang => Ok(native_bool(!operand.is_truthy())),
                PrefixOp::Minus => match operand {
                    Value::Integer(i) => Ok(Value::Integer(i.wrapping_neg())),
                    other => Ok(Value::Error(format!(
                        "no such operator `-` for {}",
                        other.kind_name()
                    ))),
                },
            }
        }
        Node::Infix {
            op,
            left,
            right,
            span,
        } => {
            let left = eval(left, env)?;
            if is_signal(&left) {
                return Ok(left);
            }
            let right = eval(right, env)?;
            if is_signal(&right) {
                return Ok(right);
            }
            eval_infix(*op, left, right, *span)
        }
        Node::IfElse { arms, .. } => eval_if_else(arms, env),
        Node::Function { params, body, .. } => Ok(Value::Function(Rc::new(FunctionValue {
            params: params.clone(),
            body: body.clone(),
            env: env.clone(),
        }))),
        Node::Call { callee, args, span } => {
            let callee = eval(callee, env)?;
            if is_signal(&callee) {
                return Ok(callee);
            }
            let mut arg_values = Vec::with_capacity(args.len());
            for arg in args {
                let value = eval(arg, env)?;
                if is_signal(&value) {
                    return Ok(value);
                }
                arg_values.push(value);
            }
            apply_function(&callee, &arg_values, Some(*span))
        }
        Node::Index {
            target,
            index,
            span,
        } => {
            let target = eval(target, env)?;
            if is_signal(&target) {
                return Ok(target);
            }
            let index = eval(index, env)?;
            if is_signal(&index) {
                return Ok(index);
            }
            eval_index(&target, &index, *span)
        }
    }
}

/// Statements thread through in order; the block's value is its last
/// statement's value, or the absent option when the block is empty. A signal
/// stops the walk immediately.
pub fn eval_block(block: &Block, env: &Environment) -> RuntimeResult<Value> {
    let mut result = NONE;
    for node in &block.nodes {
        result = eval(node, env)?;
        if is_signal(&result) {
            return Ok(result);
        }
    }
    Ok(result)
}

/// Calls a closure or builtin. Shared with the iterating builtins, which is
/// why it stands alone instead of living on the evaluator's main match.
pub fn apply_function(callee: &Value, args: &[Value], span: Option<Span>) -> RuntimeResult<Value> {
    match callee {
        Value::Builtin(builtin) => (builtin.func)(args),
        Value::Function(func) => {
            if func.params.len() != args.len() {
                return Err(RuntimeError::Arity {
                    expected: func.params.len(),
                    got: args.len(),
                    span,
                });
            }
            let frame = Environment::enclosed(&func.env);
            for (param, arg) in func.params.iter().zip(args) {
                let bound = if param.optional {
                    match arg.clone() {
                        opt @ Value::Option(_) => opt,
                        other => Value::some(other),
                    }
                } else {
                    arg.clone()
                };
                frame.init(&param.name, bound)?;
            }
            let result = eval_block(&func.body, &frame)?;
            // The call boundary is where a return signal is absorbed.
            Ok(match result {
                Value::ReturnSignal(inner) => *inner,
                other => other,
            })
        }
        other => Err(RuntimeError::NotCallable {
            kind: other.kind_name(),
            span,
        }),
    }
}

fn eval_if_else(arms: &[ConditionSet], env: &Environment) -> RuntimeResult<Value> {
    for arm in arms {
        let taken = match &arm.condition {
            None => true,
            Some(condition) => {
                let value = eval(condition, env)?;
                if is_signal(&value) {
                    return Ok(value);
                }
                value.is_truthy()
            }
        };
        if !taken {
            continue;
        }
        let result = eval_block(&arm.consequence, env)?;
        // The chosen arm's value is wrapped as a populated option, so the
        // conditional always yields an option; signals pass unwrapped. An
        // empty arm wraps the block's absent option, giving `?(?())`.
        return Ok(match result {
            signal @ (Value::ReturnSignal(_) | Value::Error(_)) => signal,
            other => Value::some(other),
        });
    }
    Ok(NONE)
}

fn eval_infix(op: InfixOp, left: Value, right: Value, span: Span) -> RuntimeResult<Value> {
    // Both operands are already evaluated by the time the operator runs, so
    // `&&` and `||` never short-circuit.
    match op {
        InfixOp::And => return Ok(native_bool(left.is_truthy() && right.is_truthy())),
        InfixOp::Or => return Ok(native_bool(left.is_truthy() || right.is_truthy())),
        _ => {}
    }
    // Equality lives inside each type pair: comparing mismatched kinds is
    // an unsupported operator, not a false.
    match (&left, &right) {
        (Value::Integer(a), Value::Integer(b)) => eval_integer_infix(op, *a, *b, span),
        (Value::Boolean(a), Value::Boolean(b)) => match op {
            InfixOp::Eq => Ok(native_bool(a == b)),
            InfixOp::NotEq => Ok(native_bool(a != b)),
            _ => Ok(no_such_operator(op, &left, &right)),
        },
        (Value::Str(a), Value::Str(b)) => match op {
            InfixOp::Plus => Ok(Value::Str(format!("{a}{b}"))),
            InfixOp::Eq => Ok(native_bool(a == b)),
            InfixOp::NotEq => Ok(native_bool(a != b)),
            _ => Ok(no_such_operator(op, &left, &right)),
        },
        (Value::List(a), Value::List(b)) => match op {
            InfixOp::Plus => {
                let mut joined = a.borrow().clone();
                joined.extend(b.borrow().iter().cloned());
                Ok(Value::list(joined))
            }
            InfixOp::Eq => Ok(native_bool(left.equals(&right))),
            InfixOp::NotEq => Ok(native_bool(!left.equals(&right))),
            _ => Ok(no_such_operator(op, &left, &right)),
        },
        _ => Ok(no_such_operator(op, &left, &right)),
    }
}

fn eval_integer_infix(op: InfixOp, a: i64, b: i64, span: Span) -> RuntimeResult<Value> {
    let result = match op {
        InfixOp::Plus => Value::Integer(a.wrapping_add(b)),
        InfixOp::Minus => Value::Integer(a.wrapping_sub(b)),
        InfixOp::Star => Value::Integer(a.wrapping_mul(b)),
        InfixOp::Slash => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero { span: Some(span) });
            }
            Value::Integer(a.wrapping_div(b))
        }
        InfixOp::Percent => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero { span: Some(span) });
            }
            Value::Integer(a.wrapping_rem(b))
        }
        InfixOp::BitAnd => Value::Integer(a & b),
        InfixOp::BitOr => Value::Integer(a | b),
        InfixOp::BitXor => Value::Integer(a ^ b),
        InfixOp::Lt => native_bool(a < b),
        InfixOp::Gt => native_bool(a > b),
        InfixOp::LtEq => native_bool(a <= b),
        InfixOp::GtEq => native_bool(a >= b),
        InfixOp::Eq => native_bool(a == b),
        InfixOp::NotEq => native_bool(a != b),
        InfixOp::And | InfixOp::Or => {
            unreachable!("handled before the type dispatch")
        }
    };
    Ok(result)
}

fn no_such_operator(op: InfixOp, left: &Value, right: &Value) -> Value {
    Value::Error(format!(
        "no such operator `{}` between {} and {}",
        op.symbol(),
        left.kind_name(),
        right.kind_name()
    ))
}

/// Index reads are forgiving: a miss yields an empty result of the
/// container's flavor rather than a fault. Indexing with a callable is a
/// fault pointing at the iterating builtins instead.
fn eval_index(target: &Value, index: &Value, _span: Span) -> RuntimeResult<Value> {
    if matches!(index, Value::Function(_) | Value::Builtin(_)) {
        return Err(RuntimeError::invalid_argument(
            "a callable cannot be used as an index; use the `each` or `map` builtins",
        ));
    }
    match (target, index) {
        (Value::List(list), Value::Integer(i)) => {
            let list = list.borrow();
            match usize::try_from(*i).ok().and_then(|i| list.get(i)) {
                Some(value) => Ok(value.clone()),
                None => Ok(NONE),
            }
        }
        (Value::Str(s), Value::Integer(i)) => {
            let ch = usize::try_from(*i).ok().and_then(|i| s.chars().nth(i));
            Ok(Value::Str(ch.map(String::from).unwrap_or_default()))
        }
        (Value::Map(map), key) => {
            let key_hash = key.structural_hash()?;
            match map.borrow().get(key_hash) {
                Some((_, value)) => Ok(value.clone()),
                None => Ok(NONE),
            }
        }
        _ => Ok(no_such_operator_index(target, index)),
    }
}

fn no_such_operator_index(target: &Value, index: &Value) -> Value {
    Value::Error(format!(
        "no such operator `[]` between {} and {}",
        target.kind_name(),
        index.kind_name()
    ))
}

/// Writes through an index. Lists bound-check strictly (a write never
/// grows the list); maps insert or overwrite by key hash.
fn eval_index_assign(
    container: &Node,
    index: &Node,
    value: Value,
    env: &Environment,
    span: Span,
) -> RuntimeResult<Value> {
    let container = eval(container, env)?;
    if is_signal(&container) {
        return Ok(container);
    }
    let index = eval(index, env)?;
    if is_signal(&index) {
        return Ok(index);
    }
    match (&container, &index) {
        (Value::List(list), Value::Integer(i)) => {
            let mut list = list.borrow_mut();
            let len = list.len();
            match usize::try_from(*i).ok().filter(|&i| i < len) {
                Some(slot) => {
                    list[slot] = value.clone();
                    Ok(value)
                }
                None => Err(RuntimeError::IndexOutOfRange {
                    index: *i,
                    len,
                    span: Some(span),
                }),
            }
        }
        (Value::Map(map), key) => {
            let key_hash = key.structural_hash()?;
            map.borrow_mut().insert(key_hash, key.clone(), value.clone());
            Ok(value)
        }
        (target, index) => Err(RuntimeError::invalid_argument(format!(
            "cannot assign into a {} by {} index",
            target.kind_name(),
            index.kind_name()
        ))),
    }
}
