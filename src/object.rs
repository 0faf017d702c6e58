//! Runtime values and the lexical environment.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hasher;
use std::rc::Rc;

use fnv::FnvHasher;

use crate::ast::Block;

/// A value produced by evaluation.
///
/// Heap-backed variants are reference counted so that environments, arrays
/// and hashes can share them freely; none of them is mutable from scripts.
/// `Return` and `Error` ride the same channel as ordinary values: the first
/// marks a `return` on its way to a call boundary, the second a runtime
/// error on its way to the driver.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    Null,
    Str(Rc<String>),
    Array(Rc<Vec<Value>>),
    Hash(Rc<HashMap<HashKey, HashPair>>),
    Function(Rc<Function>),
    Native(Native),
    Return(Box<Value>),
    Error(String),
}

/// Type tags as they appear in runtime error messages.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Type {
    Integer,
    Boolean,
    Null,
    Return,
    Error,
    Function,
    String,
    Native,
    Array,
    Hash,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Type::Integer => "Integer",
            Type::Boolean => "Boolean",
            Type::Null => "Null",
            Type::Return => "Return",
            Type::Error => "Error",
            Type::Function => "Function",
            Type::String => "String",
            Type::Native => "Native Function",
            Type::Array => "Array",
            Type::Hash => "Hash",
        };
        write!(f, "{}", label)
    }
}

/// Derived key under which hash entries are stored: the value's type tag
/// plus a 64-bit digest. Only integers, booleans and strings are hashable.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct HashKey {
    pub value_type: Type,
    pub digest: u64,
}

/// A hash entry keeps the original key value next to the stored value so
/// both remain observable.
#[derive(Debug, PartialEq, Clone)]
pub struct HashPair {
    pub key: Value,
    pub value: Value,
}

/// A user-defined function: the literal's parameter list and body, plus the
/// environment captured where the literal was evaluated.
#[derive(Clone)]
pub struct Function {
    pub parameters: Rc<Vec<String>>,
    pub body: Rc<Block>,
    pub env: Rc<Env>,
}

// The captured environment may in turn hold this function, so it is left
// out of the debug output.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("parameters", &self.parameters)
            .finish()
    }
}

pub type NativeFn = fn(&[Value]) -> Value;

/// A function implemented by the host.
#[derive(Debug, Clone, Copy)]
pub struct Native {
    pub name: &'static str,
    pub function: NativeFn,
}

impl Value {
    pub fn get_type(&self) -> Type {
        match self {
            Value::Integer(_) => Type::Integer,
            Value::Boolean(_) => Type::Boolean,
            Value::Null => Type::Null,
            Value::Str(_) => Type::String,
            Value::Array(_) => Type::Array,
            Value::Hash(_) => Type::Hash,
            Value::Function(_) => Type::Function,
            Value::Native(_) => Type::Native,
            Value::Return(_) => Type::Return,
            Value::Error(_) => Type::Error,
        }
    }

    /// Everything is truthy except `false` and `null`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(value) => *value,
            _ => true,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// The key under which this value may index a hash, if it is hashable.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Integer(value) => Some(HashKey {
                value_type: Type::Integer,
                digest: *value as u64,
            }),
            Value::Boolean(value) => Some(HashKey {
                value_type: Type::Boolean,
                digest: u64::from(*value),
            }),
            Value::Str(value) => {
                let mut hasher = FnvHasher::default();
                hasher.write(value.as_bytes());
                Some(HashKey {
                    value_type: Type::String,
                    digest: hasher.finish(),
                })
            }
            _ => None,
        }
    }

    /// Identity comparison backing `==`/`!=` on non-integer operands.
    ///
    /// Booleans and null compare as the canonical singletons; heap values
    /// compare by reference, so two equal-looking arrays built separately
    /// are not `==`. Cross-type comparisons are false.
    pub fn ref_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Boolean(lhs), Value::Boolean(rhs)) => lhs == rhs,
            (Value::Null, Value::Null) => true,
            (Value::Str(lhs), Value::Str(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Value::Array(lhs), Value::Array(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Value::Hash(lhs), Value::Hash(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Value::Function(lhs), Value::Function(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Value::Native(lhs), Value::Native(rhs)) => lhs.name == rhs.name,
            _ => false,
        }
    }
}

// Structural equality, used by tests; the `==` operator of the language
// goes through `ref_eq` instead.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(lhs), Value::Integer(rhs)) => lhs == rhs,
            (Value::Boolean(lhs), Value::Boolean(rhs)) => lhs == rhs,
            (Value::Null, Value::Null) => true,
            (Value::Str(lhs), Value::Str(rhs)) => lhs == rhs,
            (Value::Array(lhs), Value::Array(rhs)) => lhs == rhs,
            (Value::Hash(lhs), Value::Hash(rhs)) => lhs == rhs,
            (Value::Function(lhs), Value::Function(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Value::Native(lhs), Value::Native(rhs)) => lhs.name == rhs.name,
            (Value::Return(lhs), Value::Return(rhs)) => lhs == rhs,
            (Value::Error(lhs), Value::Error(rhs)) => lhs == rhs,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(value) => write!(f, "{}", value),
            Value::Boolean(value) => write!(f, "{}", value),
            Value::Null => write!(f, "null"),
            Value::Str(value) => write!(f, "{}", value),
            Value::Array(elements) => {
                let elements = elements
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                write!(f, "[{}]", elements)
            }
            Value::Hash(pairs) => {
                let pairs = pairs
                    .values()
                    .map(|pair| format!("{}: {}", pair.key, pair.value))
                    .collect::<Vec<_>>()
                    .join(",");
                write!(f, "{{{}}}", pairs)
            }
            Value::Function(function) => {
                write!(f, "fn({}) {{\n", function.parameters.join(","))?;
                for statement in &function.body.statements {
                    write!(f, "{}", statement)?;
                }
                write!(f, "\n}}")
            }
            Value::Native(_) => write!(f, "native function"),
            Value::Return(value) => write!(f, "{}", value),
            Value::Error(message) => write!(f, "Error: {}", message),
        }
    }
}

/// Chained name → value scope.
///
/// Environments are shared by reference: a closure keeps the environment it
/// was created in alive, and enclosed scopes reach outer names through the
/// parent pointer. `set` writes only into the receiving scope, so inner
/// scopes shadow rather than mutate outer ones.
#[derive(Debug)]
pub struct Env {
    parent: Option<Rc<Env>>,
    bindings: RefCell<HashMap<String, Value>>,
}

impl Env {
    pub fn new() -> Rc<Env> {
        Rc::new(Env {
            parent: None,
            bindings: RefCell::new(HashMap::new()),
        })
    }

    pub fn with_parent(parent: Rc<Env>) -> Rc<Env> {
        Rc::new(Env {
            parent: Some(parent),
            bindings: RefCell::new(HashMap::new()),
        })
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        match self.bindings.borrow().get(name) {
            Some(value) => Some(value.clone()),
            None => self.parent.as_ref().and_then(|parent| parent.get(name)),
        }
    }

    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.bindings.borrow_mut().insert(name.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string_value(text: &str) -> Value {
        Value::Str(Rc::new(text.to_string()))
    }

    #[test]
    fn string_hash_keys_depend_on_content() {
        let hello1 = string_value("Hello World");
        let hello2 = string_value("Hello World");
        let other = string_value("My name is johnny");
        assert_eq!(hello1.hash_key(), hello2.hash_key());
        assert_ne!(hello1.hash_key(), other.hash_key());
    }

    #[test]
    fn string_digest_is_fnv1a() {
        // Published FNV-1a 64 test vectors.
        assert_eq!(
            string_value("").hash_key().unwrap().digest,
            0xcbf29ce484222325
        );
        assert_eq!(
            string_value("a").hash_key().unwrap().digest,
            0xaf63dc4c8601ec8c
        );
    }

    #[test]
    fn integer_and_boolean_hash_keys() {
        assert_eq!(
            Value::Integer(7).hash_key(),
            Some(HashKey {
                value_type: Type::Integer,
                digest: 7,
            })
        );
        assert_eq!(
            Value::Boolean(true).hash_key(),
            Some(HashKey {
                value_type: Type::Boolean,
                digest: 1,
            })
        );
        assert_eq!(
            Value::Boolean(false).hash_key(),
            Some(HashKey {
                value_type: Type::Boolean,
                digest: 0,
            })
        );
    }

    #[test]
    fn equal_digests_of_different_types_are_different_keys() {
        assert_ne!(Value::Integer(1).hash_key(), Value::Boolean(true).hash_key());
    }

    #[test]
    fn only_integers_booleans_and_strings_are_hashable() {
        assert!(Value::Null.hash_key().is_none());
        assert!(Value::Array(Rc::new(vec![])).hash_key().is_none());
    }

    #[test]
    fn truthiness() {
        assert!(Value::Integer(0).is_truthy());
        assert!(Value::Integer(5).is_truthy());
        assert!(Value::Boolean(true).is_truthy());
        assert!(string_value("").is_truthy());
        assert!(Value::Array(Rc::new(vec![])).is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(!Value::Null.is_truthy());
    }

    #[test]
    fn reference_equality_of_strings() {
        let shared = Rc::new("abc".to_string());
        let lhs = Value::Str(shared.clone());
        let rhs = Value::Str(shared);
        assert!(lhs.ref_eq(&rhs));
        // Same content, different allocation.
        assert!(!lhs.ref_eq(&string_value("abc")));
    }

    #[test]
    fn reference_equality_of_singletons() {
        assert!(Value::Boolean(true).ref_eq(&Value::Boolean(true)));
        assert!(!Value::Boolean(true).ref_eq(&Value::Boolean(false)));
        assert!(Value::Null.ref_eq(&Value::Null));
        assert!(!Value::Null.ref_eq(&Value::Boolean(false)));
    }

    #[test]
    fn display_forms() {
        assert_eq!(Value::Integer(42).to_string(), "42");
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(string_value("raw text").to_string(), "raw text");
        assert_eq!(
            Value::Array(Rc::new(vec![
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(3),
            ]))
            .to_string(),
            "[1,2,3]"
        );
        assert_eq!(
            Value::Error("Type mismatch: Integer + Boolean".to_string()).to_string(),
            "Error: Type mismatch: Integer + Boolean"
        );
    }

    #[test]
    fn env_set_then_get() {
        let env = Env::new();
        env.set("foo", Value::Integer(42));
        assert_eq!(env.get("foo"), Some(Value::Integer(42)));
        assert_eq!(env.get("bar"), None);
    }

    #[test]
    fn get_walks_to_parent_on_miss() {
        let outer = Env::new();
        outer.set("foo", Value::Integer(1));
        let inner = Env::with_parent(outer);
        assert_eq!(inner.get("foo"), Some(Value::Integer(1)));
    }

    #[test]
    fn set_shadows_without_touching_parent() {
        let outer = Env::new();
        outer.set("foo", Value::Integer(1));
        let inner = Env::with_parent(outer.clone());
        inner.set("foo", Value::Integer(2));
        assert_eq!(inner.get("foo"), Some(Value::Integer(2)));
        assert_eq!(outer.get("foo"), Some(Value::Integer(1)));
    }

    #[test]
    fn rebinding_replaces_in_place() {
        let env = Env::new();
        env.set("foo", Value::Integer(1));
        env.set("foo", Value::Integer(2));
        assert_eq!(env.get("foo"), Some(Value::Integer(2)));
    }
}
