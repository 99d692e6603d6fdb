//! Declared (static) types of constrained elements.
//!
//! Validator resolution works on declared types, never on the runtime type of
//! a value. `TypeRef` models the handful of shapes the engine needs: scalar
//! kinds arranged in a small lattice, generic containers that are covariant in
//! their type arguments, and bean classes whose subtyping is answered by a
//! [`TypeHierarchy`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Answers subtype questions about bean classes and interfaces.
pub trait TypeHierarchy {
    /// Returns true if `sub` is `sup` or inherits from it, directly or not.
    fn is_subclass_of(&self, sub: &str, sup: &str) -> bool;
}

/// Hierarchy that only knows reflexive subtyping.
#[derive(Debug, Default, Clone, Copy)]
pub struct FlatHierarchy;

impl TypeHierarchy for FlatHierarchy {
    fn is_subclass_of(&self, sub: &str, sup: &str) -> bool {
        sub == sup
    }
}

/// Kinds of generic containers that value extractors understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContainerKind {
    /// Any iterable collection
    Collection,
    /// Ordered, indexable list
    List,
    /// Unordered set
    Set,
    /// Key/value map
    Map,
    /// Optional value
    Optional,
    /// Fixed array
    Array,
}

impl ContainerKind {
    /// Number of type arguments the container declares.
    pub fn arity(&self) -> usize {
        match self {
            ContainerKind::Map => 2,
            _ => 1,
        }
    }

    /// Type name used in paths and messages.
    pub fn name(&self) -> &'static str {
        match self {
            ContainerKind::Collection => "Collection",
            ContainerKind::List => "List",
            ContainerKind::Set => "Set",
            ContainerKind::Map => "Map",
            ContainerKind::Optional => "Optional",
            ContainerKind::Array => "Array",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A declared type.
///
/// Serialized as its textual form, e.g. `"Map<Text, List<Order>>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeRef {
    /// Top of the lattice (`Object`)
    Any,
    /// Boolean
    Boolean,
    /// Any numeric type
    Number,
    /// 64-bit signed integer
    Integer,
    /// 64-bit float
    Float,
    /// Arbitrary precision decimal
    Decimal,
    /// Character sequence
    Text,
    /// Monetary amount
    Money,
    /// Point in time
    Temporal,
    /// Generic container with its type arguments
    Container(ContainerKind, Vec<TypeRef>),
    /// Bean class or interface
    Bean(String),
}

impl TypeRef {
    /// `List<element>`
    pub fn list(element: TypeRef) -> Self {
        TypeRef::Container(ContainerKind::List, vec![element])
    }

    /// `Set<element>`
    pub fn set(element: TypeRef) -> Self {
        TypeRef::Container(ContainerKind::Set, vec![element])
    }

    /// `Collection<element>`
    pub fn collection(element: TypeRef) -> Self {
        TypeRef::Container(ContainerKind::Collection, vec![element])
    }

    /// `Map<key, value>`
    pub fn map(key: TypeRef, value: TypeRef) -> Self {
        TypeRef::Container(ContainerKind::Map, vec![key, value])
    }

    /// `Optional<element>`
    pub fn optional(element: TypeRef) -> Self {
        TypeRef::Container(ContainerKind::Optional, vec![element])
    }

    /// `element[]`
    pub fn array(element: TypeRef) -> Self {
        TypeRef::Container(ContainerKind::Array, vec![element])
    }

    /// Bean type for a class name.
    pub fn bean(class: impl Into<String>) -> Self {
        TypeRef::Bean(class.into())
    }

    /// Type of the argument array handed to cross-parameter validators.
    pub fn argument_array() -> Self {
        TypeRef::array(TypeRef::Any)
    }

    /// Returns the container kind if this is a generic container.
    pub fn container_kind(&self) -> Option<ContainerKind> {
        match self {
            TypeRef::Container(kind, _) => Some(*kind),
            _ => None,
        }
    }

    /// Returns the type argument at `index`, `Any` when it is not declared.
    pub fn type_argument(&self, index: usize) -> Option<TypeRef> {
        match self {
            TypeRef::Container(kind, args) if index < kind.arity() => {
                Some(args.get(index).cloned().unwrap_or(TypeRef::Any))
            }
            _ => None,
        }
    }

    /// Returns the bean class name for bean types.
    pub fn bean_class(&self) -> Option<&str> {
        match self {
            TypeRef::Bean(class) => Some(class),
            _ => None,
        }
    }

    /// Returns true if a value declared as `self` can be used where `target`
    /// is expected.
    pub fn is_assignable_to(&self, target: &TypeRef, hierarchy: &dyn TypeHierarchy) -> bool {
        use TypeRef::*;

        match (self, target) {
            (_, Any) => true,
            (Integer | Float | Decimal | Number, Number) => true,
            (Container(kind, args), Container(target_kind, target_args)) => {
                let kind_ok = kind == target_kind
                    || (*target_kind == ContainerKind::Collection
                        && matches!(kind, ContainerKind::List | ContainerKind::Set));
                kind_ok
                    && (0..target_kind.arity()).all(|i| {
                        let own = args.get(i).unwrap_or(&Any);
                        let other = target_args.get(i).unwrap_or(&Any);
                        own.is_assignable_to(other, hierarchy)
                    })
            }
            (Bean(sub), Bean(sup)) => hierarchy.is_subclass_of(sub, sup),
            (a, b) => a == b,
        }
    }

    /// Returns true if `self` is strictly more specific than `other`.
    pub fn is_strictly_narrower_than(&self, other: &TypeRef, hierarchy: &dyn TypeHierarchy) -> bool {
        self != other
            && self.is_assignable_to(other, hierarchy)
            && !other.is_assignable_to(self, hierarchy)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Any => f.write_str("Any"),
            TypeRef::Boolean => f.write_str("Boolean"),
            TypeRef::Number => f.write_str("Number"),
            TypeRef::Integer => f.write_str("Integer"),
            TypeRef::Float => f.write_str("Float"),
            TypeRef::Decimal => f.write_str("Decimal"),
            TypeRef::Text => f.write_str("Text"),
            TypeRef::Money => f.write_str("Money"),
            TypeRef::Temporal => f.write_str("Temporal"),
            TypeRef::Bean(class) => f.write_str(class),
            TypeRef::Container(kind, args) => {
                write!(f, "{}<", kind)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(">")
            }
        }
    }
}

/// Error returned when a type expression cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid type expression '{input}': {reason}")]
pub struct TypeParseError {
    /// The offending input
    pub input: String,
    /// What went wrong
    pub reason: String,
}

impl FromStr for TypeRef {
    type Err = TypeParseError;

    /// Parses expressions such as `Text`, `List<Text>`, `Map<Text, Order>`
    /// or `Integer[]`. Unknown simple names are bean classes.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut parser = TypeParser {
            input,
            chars: input.char_indices().peekable(),
        };
        let parsed = parser.parse_type()?;
        parser.skip_whitespace();
        if parser.chars.peek().is_some() {
            return Err(parser.error("unexpected trailing characters"));
        }
        Ok(parsed)
    }
}

impl TryFrom<String> for TypeRef {
    type Error = TypeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.to_string()
    }
}

struct TypeParser<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl TypeParser<'_> {
    fn error(&self, reason: &str) -> TypeParseError {
        TypeParseError {
            input: self.input.to_string(),
            reason: reason.to_string(),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.chars.peek(), Some((_, c)) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn identifier(&mut self) -> Result<String, TypeParseError> {
        self.skip_whitespace();
        let mut name = String::new();
        while let Some((_, c)) = self.chars.peek() {
            if c.is_alphanumeric() || *c == '_' || *c == '.' || *c == '$' {
                name.push(*c);
                self.chars.next();
            } else {
                break;
            }
        }
        if name.is_empty() {
            return Err(self.error("expected a type name"));
        }
        Ok(name)
    }

    fn expect(&mut self, expected: char) -> Result<(), TypeParseError> {
        self.skip_whitespace();
        match self.chars.next() {
            Some((_, c)) if c == expected => Ok(()),
            _ => Err(self.error(&format!("expected '{}'", expected))),
        }
    }

    fn parse_type(&mut self) -> Result<TypeRef, TypeParseError> {
        let name = self.identifier()?;
        self.skip_whitespace();

        let mut args = Vec::new();
        if matches!(self.chars.peek(), Some((_, '<'))) {
            self.chars.next();
            loop {
                args.push(self.parse_type()?);
                self.skip_whitespace();
                match self.chars.next() {
                    Some((_, ',')) => continue,
                    Some((_, '>')) => break,
                    _ => return Err(self.error("expected ',' or '>'")),
                }
            }
        }

        let mut parsed = match (name.as_str(), args.is_empty()) {
            ("Any" | "Object", true) => TypeRef::Any,
            ("Boolean" | "bool", true) => TypeRef::Boolean,
            ("Number", true) => TypeRef::Number,
            ("Integer" | "Long" | "int" | "long" | "i64", true) => TypeRef::Integer,
            ("Float" | "Double" | "float" | "double" | "f64", true) => TypeRef::Float,
            ("Decimal" | "BigDecimal", true) => TypeRef::Decimal,
            ("Text" | "String" | "CharSequence", true) => TypeRef::Text,
            ("Money" | "MonetaryAmount", true) => TypeRef::Money,
            ("Temporal" | "Instant" | "DateTime", true) => TypeRef::Temporal,
            ("List", _) => container(ContainerKind::List, args),
            ("Set", _) => container(ContainerKind::Set, args),
            ("Collection" | "Iterable", _) => container(ContainerKind::Collection, args),
            ("Map", _) => container(ContainerKind::Map, args),
            ("Optional", _) => container(ContainerKind::Optional, args),
            ("Array", _) => container(ContainerKind::Array, args),
            (_, true) => TypeRef::Bean(name.clone()),
            (_, false) => return Err(self.error("only containers take type arguments")),
        };

        loop {
            self.skip_whitespace();
            if matches!(self.chars.peek(), Some((_, '['))) {
                self.chars.next();
                self.expect(']')?;
                parsed = TypeRef::array(parsed);
            } else {
                break;
            }
        }

        if let TypeRef::Container(kind, args) = &parsed {
            if args.len() > kind.arity() {
                return Err(self.error("too many type arguments"));
            }
        }
        Ok(parsed)
    }
}

fn container(kind: ContainerKind, mut args: Vec<TypeRef>) -> TypeRef {
    while args.len() < kind.arity() {
        args.push(TypeRef::Any);
    }
    TypeRef::Container(kind, args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct TwoLevels;

    impl TypeHierarchy for TwoLevels {
        fn is_subclass_of(&self, sub: &str, sup: &str) -> bool {
            sub == sup || (sub == "Car" && sup == "Vehicle")
        }
    }

    #[test]
    fn test_parse_nested_containers() {
        let parsed: TypeRef = "Map<String, List<Order>>".parse().unwrap();
        assert_eq!(
            parsed,
            TypeRef::map(TypeRef::Text, TypeRef::list(TypeRef::bean("Order")))
        );
        assert_eq!(parsed.to_string(), "Map<Text, List<Order>>");
    }

    #[test]
    fn test_parse_arrays_and_raw_containers() {
        assert_eq!("Integer[]".parse::<TypeRef>().unwrap(), TypeRef::array(TypeRef::Integer));
        assert_eq!("List".parse::<TypeRef>().unwrap(), TypeRef::list(TypeRef::Any));
        assert!("List<Text".parse::<TypeRef>().is_err());
        assert!("Order<Text>".parse::<TypeRef>().is_err());
        assert!("Optional<Text, Text>".parse::<TypeRef>().is_err());
    }

    #[test]
    fn test_numeric_lattice() {
        let h = FlatHierarchy;
        assert!(TypeRef::Integer.is_assignable_to(&TypeRef::Number, &h));
        assert!(TypeRef::Decimal.is_assignable_to(&TypeRef::Any, &h));
        assert!(!TypeRef::Number.is_assignable_to(&TypeRef::Integer, &h));
        assert!(TypeRef::Integer.is_strictly_narrower_than(&TypeRef::Number, &h));
        assert!(!TypeRef::Text.is_assignable_to(&TypeRef::Number, &h));
    }

    #[test]
    fn test_container_covariance() {
        let h = TwoLevels;
        let cars = TypeRef::list(TypeRef::bean("Car"));
        assert!(cars.is_assignable_to(&TypeRef::list(TypeRef::bean("Vehicle")), &h));
        assert!(cars.is_assignable_to(&TypeRef::collection(TypeRef::Any), &h));
        assert!(!cars.is_assignable_to(&TypeRef::set(TypeRef::Any), &h));
        assert!(!TypeRef::list(TypeRef::bean("Vehicle")).is_assignable_to(&cars, &h));
    }

    #[test]
    fn test_type_arguments() {
        let map = TypeRef::map(TypeRef::Text, TypeRef::Integer);
        assert_eq!(map.type_argument(1), Some(TypeRef::Integer));
        assert_eq!(map.type_argument(2), None);
        assert_eq!(TypeRef::Text.type_argument(0), None);
    }
}
