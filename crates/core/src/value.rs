//! Value type definitions for factview.
//!
//! This module defines the `Value` enum which represents any scalar that can
//! appear at one position of a fact.

use alloc::string::{String, ToString};
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};

/// A scalar value stored in a fact.
#[derive(Clone, Debug)]
pub enum Value {
    /// Absent value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit floating point
    Float64(f64),
    /// UTF-8 string
    String(String),
}

impl Value {
    /// Returns the name of this value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Int64(_) => "int64",
            Value::Float64(_) => "float64",
            Value::String(_) => "string",
        }
    }

    /// Returns true if this value is Null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if this value is an Int64 or a Float64.
    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int64(_) | Value::Float64(_))
    }

    /// Returns the boolean value if this is a Boolean, None otherwise.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the i64 value if this is an Int64, None otherwise.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as f64 if this is numeric, None otherwise.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int64(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns a reference to the string if this is a String, None otherwise.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Returns true when the value counts as "true" for filter purposes.
    ///
    /// Only `Boolean(true)` is truthy; there is no coercion from numbers or strings.
    pub fn is_true(&self) -> bool {
        matches!(self, Value::Boolean(true))
    }

    /// Returns a type ordering value for comparing different types.
    /// Both numeric types share a rank.
    fn type_order(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Int64(_) | Value::Float64(_) => 2,
            Value::String(_) => 3,
        }
    }
}

/// Numbers are one domain: `Int64(1)` and `Float64(1.0)` are the same value.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Null => 0u8.hash(state),
            Value::Boolean(b) => {
                1u8.hash(state);
                b.hash(state);
            }
            Value::Int64(i) => {
                2u8.hash(state);
                i.hash(state);
            }
            // Integral floats hash as the integer they equal.
            Value::Float64(f) => match integral(*f) {
                Some(i) => {
                    2u8.hash(state);
                    i.hash(state);
                }
                None if f.is_nan() => 3u8.hash(state),
                None => {
                    3u8.hash(state);
                    f.to_bits().hash(state);
                }
            },
            Value::String(s) => {
                4u8.hash(state);
                s.hash(state);
            }
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
            (Value::Float64(a), Value::Float64(b)) => compare_f64(*a, *b),
            (Value::Int64(a), Value::Float64(b)) => compare_int_f64(*a, *b),
            (Value::Float64(a), Value::Int64(b)) => compare_int_f64(*b, *a).reverse(),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            _ => self.type_order().cmp(&other.type_order()),
        }
    }
}

/// NaN sorts after every other float and equal to itself.
fn compare_f64(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// 2^63 as a float, the first value past `i64::MAX`.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Exact comparison of an integer with a float, without rounding the integer.
fn compare_int_f64(i: i64, f: f64) -> Ordering {
    if f.is_nan() || f >= I64_BOUND {
        return Ordering::Less;
    }
    if f < -I64_BOUND {
        return Ordering::Greater;
    }
    let whole = trunc_in_range(f);
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => compare_f64(whole, f),
        ord => ord,
    }
}

/// `f.trunc()` for `no_std`; exact for finite `f` with `|f| < 2^63`, where the
/// cast truncates toward zero and the result is representable.
fn trunc_in_range(f: f64) -> f64 {
    (f as i64) as f64
}

/// The integer a float equals exactly, if any.
fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && trunc_in_range(f) == f && (-I64_BOUND..I64_BOUND).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int64(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Int64(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    #[test]
    fn test_value_null() {
        let v = Value::Null;
        assert!(v.is_null());
        assert_eq!(v.type_name(), "null");
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Boolean(true).as_bool(), Some(true));
        assert_eq!(Value::Int64(100).as_i64(), Some(100));
        assert_eq!(Value::Float64(3.5).as_f64(), Some(3.5));
        assert_eq!(Value::Int64(2).as_f64(), Some(2.0));
        assert_eq!(Value::String("hello".into()).as_str(), Some("hello"));
        assert_eq!(Value::String("1".into()).as_f64(), None);
    }

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::Int64(42), Value::Int64(42));
        assert_eq!(Value::Int64(42), Value::Float64(42.0));
        assert_ne!(Value::Int64(42), Value::Float64(42.5));
        assert_eq!(Value::Float64(0.0), Value::Float64(-0.0));
        assert_eq!(Value::Float64(f64::NAN), Value::Float64(f64::NAN));
        assert_ne!(Value::String("1".into()), Value::Int64(1));
    }

    #[test]
    fn test_value_ordering() {
        assert!(Value::Int64(1) < Value::Int64(2));
        assert!(Value::String("a".into()) < Value::String("b".into()));
        assert!(Value::Null < Value::Boolean(false));
        assert!(Value::Int64(1) < Value::Float64(1.5));
        assert!(Value::Float64(0.5) < Value::Int64(1));
        assert_eq!(Value::Int64(1).cmp(&Value::Float64(1.0)), Ordering::Equal);
        assert!(Value::Int64(-2) < Value::Float64(-1.5));
        assert!(Value::Int64(i64::MAX) < Value::Float64(1e19));
        assert!(Value::Int64(i64::MIN) > Value::Float64(-1e19));
        assert!(Value::Int64(i64::MAX) < Value::Float64(f64::NAN));
        assert!(Value::Float64(f64::NAN) > Value::Float64(1e300));
    }

    #[test]
    fn test_value_sort_is_total() {
        let mut values = vec![
            Value::String("b".into()),
            Value::Int64(3),
            Value::Null,
            Value::Float64(2.5),
            Value::Boolean(true),
            Value::Int64(2),
        ];
        values.sort();
        let names: Vec<&str> = values.iter().map(|v| v.type_name()).collect();
        assert_eq!(names, vec!["null", "boolean", "int64", "float64", "int64", "string"]);
    }

    #[test]
    fn test_equal_numbers_hash_alike() {
        use core::hash::BuildHasher;
        let state = hashbrown::hash_map::DefaultHashBuilder::default();
        let hash = |v: &Value| state.hash_one(v);
        assert_eq!(hash(&Value::Int64(1)), hash(&Value::Float64(1.0)));
        assert_eq!(hash(&Value::Int64(0)), hash(&Value::Float64(-0.0)));
        assert_eq!(hash(&Value::Float64(f64::NAN)), hash(&Value::Float64(-f64::NAN)));
        assert_ne!(Value::Float64(1.5), Value::Int64(1));

        let mut set = hashbrown::HashSet::new();
        set.insert(Value::Int64(3));
        assert!(set.contains(&Value::Float64(3.0)));
        assert!(!set.insert(Value::Float64(3.0)));
    }

    #[test]
    fn test_value_from_impls() {
        let v: Value = 42i32.into();
        assert_eq!(v.as_i64(), Some(42));

        let v: Value = "hello".into();
        assert_eq!(v.as_str(), Some("hello"));

        let v: Value = None::<i64>.into();
        assert!(v.is_null());
    }

    #[test]
    fn test_value_display() {
        use alloc::string::ToString;
        assert_eq!(Value::Int64(5).to_string(), "5");
        assert_eq!(Value::String("x".into()).to_string(), "\"x\"");
        assert_eq!(Value::Null.to_string(), "null");
    }
}
