use std::cell::RefCell;
use std::fmt;
use std::hash::Hasher;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHasher};

use crate::ast::{Binding, Block};
use crate::diagnostics::{RuntimeError, RuntimeResult};
use crate::env::Environment;

/// Native callable. Registered by name in `builtins`; the evaluator treats
/// a resolved builtin exactly like a closure at call sites.
pub type BuiltinFn = fn(&[Value]) -> RuntimeResult<Value>;

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

/// Runtime values. ReturnSignal and Error are control, not data: they ride
/// the same propagation channel through blocks, conditionals and calls, and
/// are the only kinds without a structural hash.
#[derive(Clone)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    Str(String),
    List(Rc<RefCell<Vec<Value>>>),
    Map(Rc<RefCell<MapValue>>),
    Option(Option<Box<Value>>),
    Range(RangeValue),
    Function(Rc<FunctionValue>),
    Builtin(Builtin),
    ReturnSignal(Box<Value>),
    Error(String),
}

/// Hash-keyed storage backing a Map value. One slot per key hash; a
/// collision between structurally unequal keys silently reuses the slot
/// (accepted risk, never deduplicated by equality).
#[derive(Default)]
pub struct MapValue {
    entries: FxHashMap<u64, (Value, Value)>,
}

impl MapValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key_hash: u64) -> Option<&(Value, Value)> {
        self.entries.get(&key_hash)
    }

    pub fn insert(&mut self, key_hash: u64, key: Value, value: Value) {
        self.entries.insert(key_hash, (key, value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Traversal order is unspecified; callers may rely on set equality only.
    pub fn iter(&self) -> impl Iterator<Item = (&u64, &(Value, Value))> {
        self.entries.iter()
    }
}

/// Integer interval, start inclusive, end exclusive. Direction-aware: a
/// start above the end counts downward.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RangeValue {
    pub start: i64,
    pub end: i64,
}

impl RangeValue {
    pub fn values(&self) -> Vec<i64> {
        if self.start <= self.end {
            (self.start..self.end).collect()
        } else {
            let mut out: Vec<i64> = (self.end + 1..=self.start).collect();
            out.reverse();
            out
        }
    }

    pub fn len(&self) -> usize {
        self.start.wrapping_sub(self.end).unsigned_abs() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A closure: the literal's parameters and body plus a handle to the frame
/// that was active at its definition site.
pub struct FunctionValue {
    pub params: Vec<Binding>,
    pub body: Block,
    pub env: Environment,
}

// Per-kind seeds so that e.g. Integer(1) and Boolean(true) cannot collide
// on raw content.
const HASH_TAG_INTEGER: u64 = 0x01;
const HASH_TAG_BOOLEAN: u64 = 0x02;
const HASH_TAG_STRING: u64 = 0x03;
const HASH_TAG_LIST: u64 = 0x04;
const HASH_TAG_MAP: u64 = 0x05;
const HASH_TAG_OPTION: u64 = 0x06;
const HASH_TAG_RANGE: u64 = 0x07;

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Boolean(_) => "BOOLEAN",
            Value::Str(_) => "STRING",
            Value::List(_) => "LIST",
            Value::Map(_) => "MAP",
            Value::Option(_) => "OPTION",
            Value::Range(_) => "RANGE",
            Value::Function(_) => "FUNCTION",
            Value::Builtin(_) => "BUILTIN",
            Value::ReturnSignal(_) => "RETURN",
            Value::Error(_) => "ERROR",
        }
    }

    pub fn list(values: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(values)))
    }

    pub fn map(map: MapValue) -> Value {
        Value::Map(Rc::new(RefCell::new(map)))
    }

    pub fn some(inner: Value) -> Value {
        Value::Option(Some(Box::new(inner)))
    }

    /// Truthiness: booleans as themselves; integers truthy iff nonzero;
    /// strings, lists and maps truthy iff non-empty; options truthy iff
    /// populated; everything else is falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Str(s) => !s.is_empty(),
            Value::List(list) => !list.borrow().is_empty(),
            Value::Map(map) => !map.borrow().is_empty(),
            Value::Option(opt) => opt.is_some(),
            _ => false,
        }
    }

    /// The 64-bit structural hash that lets composite values key a Map.
    /// Equal values hash equal; list hashing is order-sensitive, map
    /// hashing is order-insensitive. Functions, builtins and the two
    /// control kinds are unhashable and fault instead of degrading.
    pub fn structural_hash(&self) -> RuntimeResult<u64> {
        match self {
            Value::Integer(i) => {
                let mut hasher = FxHasher::default();
                hasher.write_u64(HASH_TAG_INTEGER);
                hasher.write_i64(*i);
                Ok(hasher.finish())
            }
            Value::Boolean(b) => {
                let mut hasher = FxHasher::default();
                hasher.write_u64(HASH_TAG_BOOLEAN);
                hasher.write_u8(*b as u8);
                Ok(hasher.finish())
            }
            Value::Str(s) => {
                let mut hasher = FxHasher::default();
                hasher.write_u64(HASH_TAG_STRING);
                hasher.write(s.as_bytes());
                Ok(hasher.finish())
            }
            Value::List(list) => {
                // Seeding each element hash with its index makes the list
                // hash order-sensitive: permutations hash differently.
                let mut hasher = FxHasher::default();
                hasher.write_u64(HASH_TAG_LIST);
                for (index, element) in list.borrow().iter().enumerate() {
                    hasher.write_usize(index);
                    hasher.write_u64(element.structural_hash()?);
                }
                Ok(hasher.finish())
            }
            Value::Map(map) => {
                // Commutative combine: each entry contributes a hash seeded
                // by its own key hash, summed with wrapping add so insertion
                // order can never matter.
                let mut combined: u64 = 0;
                for (key_hash, (_, value)) in map.borrow().iter() {
                    let mut hasher = FxHasher::default();
                    hasher.write_u64(*key_hash);
                    hasher.write_u64(value.structural_hash()?);
                    combined = combined.wrapping_add(hasher.finish());
                }
                let mut hasher = FxHasher::default();
                hasher.write_u64(HASH_TAG_MAP);
                hasher.write_u64(combined);
                Ok(hasher.finish())
            }
            Value::Option(opt) => {
                let mut hasher = FxHasher::default();
                hasher.write_u64(HASH_TAG_OPTION);
                if let Some(inner) = opt {
                    hasher.write_u64(inner.structural_hash()?);
                }
                Ok(hasher.finish())
            }
            Value::Range(range) => {
                // Start and end feed the hasher in sequence, so the two
                // bounds combine asymmetrically.
                let mut hasher = FxHasher::default();
                hasher.write_u64(HASH_TAG_RANGE);
                hasher.write_i64(range.start);
                hasher.write_i64(range.end);
                Ok(hasher.finish())
            }
            Value::Function(_) | Value::Builtin(_) | Value::ReturnSignal(_) | Value::Error(_) => {
                Err(RuntimeError::UnhashableKey {
                    kind: self.kind_name(),
                })
            }
        }
    }

    /// Structural equality for the kinds that support it; values of
    /// different kinds never compare equal.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                let a = a.borrow();
                let b = b.borrow();
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                let a = a.borrow();
                let b = b.borrow();
                a.len() == b.len()
                    && a.iter().all(|(hash, (key, value))| match b.get(*hash) {
                        Some((other_key, other_value)) => {
                            key.equals(other_key) && value.equals(other_value)
                        }
                        None => false,
                    })
            }
            (Value::Option(a), Value::Option(b)) => match (a, b) {
                (None, None) => true,
                (Some(x), Some(y)) => x.equals(y),
                _ => false,
            },
            (Value::Range(a), Value::Range(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
            (Value::ReturnSignal(a), Value::ReturnSignal(b)) => a.equals(b),
            (Value::Error(a), Value::Error(b)) => a == b,
            _ => false,
        }
    }

    /// Human-facing rendering: strings unquoted, options transparent.
    pub fn print_text(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Option(None) => String::new(),
            Value::Option(Some(inner)) => inner.print_text(),
            Value::ReturnSignal(inner) => inner.print_text(),
            other => other.inspect(),
        }
    }

    /// Debug-facing rendering: strings quoted, options marked `?( ... )`.
    pub fn inspect(&self) -> String {
        match self {
            Value::Integer(i) => i.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Str(s) => format!("{s:?}"),
            Value::List(list) => {
                let elements = list
                    .borrow()
                    .iter()
                    .map(Value::inspect)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("[{elements}]")
            }
            Value::Map(map) => {
                let entries = map
                    .borrow()
                    .iter()
                    .map(|(_, (key, value))| format!("{}: {}", key.inspect(), value.inspect()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{{entries}}}")
            }
            Value::Option(None) => "?()".to_string(),
            Value::Option(Some(inner)) => format!("?({})", inner.inspect()),
            Value::Range(range) => format!("{}..{}", range.start, range.end),
            Value::Function(func) => {
                let params = func
                    .params
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({params}) => {{ {} }}", func.body)
            }
            Value::Builtin(builtin) => format!("builtin {}", builtin.name),
            Value::ReturnSignal(inner) => inner.inspect(),
            Value::Error(message) => format!("ERROR: {message}"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inspect())
    }
}
