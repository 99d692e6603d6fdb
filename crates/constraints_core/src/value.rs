//! Runtime values handed to the engine.
//!
//! The engine never sees concrete Rust structs. Objects are exposed through
//! the [`Bean`] trait and every property value is a [`Value`], which keeps
//! validators and value extractors independent of user types.

use crate::declaration::AttributeValue;
use crate::types::{ContainerKind, TypeHierarchy, TypeRef};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// A monetary amount in a given currency.
#[derive(Debug, Clone, PartialEq)]
pub struct Money {
    /// Amount
    pub amount: Decimal,
    /// ISO 4217 currency code
    pub currency: String,
}

impl Money {
    /// Creates an amount from an integer number of currency units.
    pub fn of(amount: i64, currency: impl Into<String>) -> Self {
        Self {
            amount: Decimal::from(amount),
            currency: currency.into(),
        }
    }

    /// Creates an amount from a decimal.
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.currency, self.amount)
    }
}

/// An object whose properties can be read by name.
///
/// Implementors report their runtime class, which selects the metadata used
/// to validate them, and expose field and getter values through
/// [`Bean::property`].
pub trait Bean: fmt::Debug + Send + Sync {
    /// Runtime class of this object.
    fn class_name(&self) -> &str;

    /// Reads a property (field or getter). `None` when the bean has no such
    /// property, `Some(Value::Null)` when it is present but unset.
    fn property(&self, name: &str) -> Option<Value>;
}

/// Shared handle to a bean with identity semantics.
///
/// Two handles are equal only when they point at the same object, which is
/// what cycle detection relies on.
#[derive(Clone)]
pub struct BeanRef(Arc<dyn Bean>);

impl BeanRef {
    /// Wraps a bean.
    pub fn new(bean: impl Bean + 'static) -> Self {
        Self(Arc::new(bean))
    }

    /// Wraps an already shared bean.
    pub fn from_arc(bean: Arc<dyn Bean>) -> Self {
        Self(bean)
    }

    /// Identity of the underlying object.
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    /// Runtime class of the bean.
    pub fn class_name(&self) -> &str {
        self.0.class_name()
    }

    /// Reads a property of the bean.
    pub fn property(&self, name: &str) -> Option<Value> {
        self.0.property(name)
    }

    /// Borrows the bean.
    pub fn bean(&self) -> &dyn Bean {
        self.0.as_ref()
    }
}

impl PartialEq for BeanRef {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for BeanRef {}

impl fmt::Debug for BeanRef {
    // Only the identity: property values may lead back to this bean.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:x}", self.class_name(), self.identity())
    }
}

/// A bean backed by an ordered property table.
///
/// Properties can be set after construction, so cyclic graphs can be built
/// from shared [`BeanRef`]s.
pub struct DynamicBean {
    class: String,
    properties: RwLock<Vec<(String, Value)>>,
}

impl DynamicBean {
    /// Creates an empty bean of the given class.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            properties: RwLock::new(Vec::new()),
        }
    }

    /// Sets a property and returns the bean.
    pub fn with(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets or replaces a property.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        let mut properties = self
            .properties
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match properties.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => properties.push((name, value)),
        }
    }

    /// Converts the bean into a shared handle.
    pub fn into_ref(self) -> BeanRef {
        BeanRef::new(self)
    }
}

impl Bean for DynamicBean {
    fn class_name(&self) -> &str {
        &self.class
    }

    fn property(&self, name: &str) -> Option<Value> {
        self.properties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }
}

impl fmt::Debug for DynamicBean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .properties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(n, _)| n.clone())
            .collect();
        f.debug_struct("DynamicBean")
            .field("class", &self.class)
            .field("properties", &names)
            .finish()
    }
}

/// A value in an object graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null/missing value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Decimal value
    Decimal(Decimal),
    /// Text value
    Text(String),
    /// Monetary amount
    Money(Money),
    /// Point in time
    Temporal(DateTime<Utc>),
    /// Ordered list
    List(Vec<Value>),
    /// Set (iteration order is kept but not meaningful)
    Set(Vec<Value>),
    /// Map entries in insertion order
    Map(Vec<(Value, Value)>),
    /// Optional value
    Optional(Option<Box<Value>>),
    /// Array value
    Array(Vec<Value>),
    /// Bean reference
    Bean(BeanRef),
}

impl Value {
    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::Text(_) => "text",
            Value::Money(_) => "money",
            Value::Temporal(_) => "temporal",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Optional(_) => "optional",
            Value::Array(_) => "array",
            Value::Bean(_) => "bean",
        }
    }

    /// Attempts to get this value as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to get this value as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Attempts to get this value as a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Attempts to get any numeric value as a decimal.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            Value::Int(i) => Some(Decimal::from(*i)),
            Value::Float(f) => Decimal::from_f64(*f),
            _ => None,
        }
    }

    /// Attempts to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to get this value as a bean.
    pub fn as_bean(&self) -> Option<&BeanRef> {
        match self {
            Value::Bean(b) => Some(b),
            _ => None,
        }
    }

    /// Number of elements for containers and characters for text.
    pub fn size(&self) -> Option<usize> {
        match self {
            Value::Text(s) => Some(s.chars().count()),
            Value::List(v) | Value::Set(v) | Value::Array(v) => Some(v.len()),
            Value::Map(m) => Some(m.len()),
            _ => None,
        }
    }

    /// Returns true if the runtime shape of this value fits `declared`.
    ///
    /// Null fits every type. Container elements are checked recursively.
    pub fn conforms_to(&self, declared: &TypeRef, hierarchy: &dyn TypeHierarchy) -> bool {
        use ContainerKind as K;

        let elements_conform = |values: &[Value], index: usize| {
            let element = declared.type_argument(index).unwrap_or(TypeRef::Any);
            values.iter().all(|v| v.conforms_to(&element, hierarchy))
        };

        match (self, declared) {
            (Value::Null, _) | (_, TypeRef::Any) => true,
            (Value::Bool(_), TypeRef::Boolean) => true,
            (Value::Int(_), TypeRef::Integer | TypeRef::Number) => true,
            (Value::Float(_), TypeRef::Float | TypeRef::Number) => true,
            (Value::Decimal(_), TypeRef::Decimal | TypeRef::Number) => true,
            (Value::Text(_), TypeRef::Text) => true,
            (Value::Money(_), TypeRef::Money) => true,
            (Value::Temporal(_), TypeRef::Temporal) => true,
            (Value::List(v), TypeRef::Container(K::List | K::Collection, _)) => elements_conform(v, 0),
            (Value::Set(v), TypeRef::Container(K::Set | K::Collection, _)) => elements_conform(v, 0),
            (Value::Array(v), TypeRef::Container(K::Array, _)) => elements_conform(v, 0),
            (Value::Map(entries), TypeRef::Container(K::Map, _)) => {
                let key = declared.type_argument(0).unwrap_or(TypeRef::Any);
                let value = declared.type_argument(1).unwrap_or(TypeRef::Any);
                entries
                    .iter()
                    .all(|(k, v)| k.conforms_to(&key, hierarchy) && v.conforms_to(&value, hierarchy))
            }
            (Value::Optional(inner), TypeRef::Container(K::Optional, _)) => match inner {
                Some(v) => elements_conform(std::slice::from_ref(v.as_ref()), 0),
                None => true,
            },
            (Value::Bean(bean), TypeRef::Bean(class)) => {
                hierarchy.is_subclass_of(bean.class_name(), class)
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, values: &[Value]) -> fmt::Result {
            f.write_str("[")?;
            for (i, v) in values.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", v)?;
            }
            f.write_str("]")
        }

        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Text(s) => f.write_str(s),
            Value::Money(m) => write!(f, "{}", m),
            Value::Temporal(t) => write!(f, "{}", t.to_rfc3339()),
            Value::List(v) | Value::Set(v) | Value::Array(v) => join(f, v),
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                f.write_str("}")
            }
            Value::Optional(Some(v)) => write!(f, "Optional[{}]", v),
            Value::Optional(None) => f.write_str("Optional.empty"),
            Value::Bean(b) => write!(f, "{:?}", b),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<Money> for Value {
    fn from(m: Money) -> Self {
        Value::Money(m)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Temporal(t)
    }
}

impl From<BeanRef> for Value {
    fn from(b: BeanRef) -> Self {
        Value::Bean(b)
    }
}

impl From<DynamicBean> for Value {
    fn from(b: DynamicBean) -> Self {
        Value::Bean(b.into_ref())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<&AttributeValue> for Value {
    fn from(v: &AttributeValue) -> Self {
        match v {
            AttributeValue::Bool(b) => Value::Bool(*b),
            AttributeValue::Int(i) => Value::Int(*i),
            AttributeValue::Float(x) => Value::Float(*x),
            AttributeValue::Text(s) => Value::Text(s.clone()),
            AttributeValue::List(items) => Value::List(items.iter().map(Value::from).collect()),
        }
    }
}
