//! Class declarations.
//!
//! These types describe what reflection would see on a class: its supertypes,
//! fields, methods and constructors with their declared types, and the
//! constraint annotations, cascade markers and group conversions attached to
//! each of them. The same element types are reused by external and
//! programmatic mappings, so they are serde friendly.

use crate::descriptor::ConstraintTarget;
use crate::group::Group;
use crate::types::TypeRef;
use crate::value::BeanRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Value of a constraint attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Boolean attribute
    Bool(bool),
    /// Integer attribute
    Int(i64),
    /// Floating point attribute
    Float(f64),
    /// Text attribute
    Text(String),
    /// Array attribute
    List(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Returns the text content.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer content.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the boolean content.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the array content.
    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Int(i) => write!(f, "{}", i),
            AttributeValue::Float(x) => write!(f, "{}", x),
            AttributeValue::Text(s) => f.write_str(s),
            AttributeValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Int(i)
    }
}

impl From<i32> for AttributeValue {
    fn from(i: i32) -> Self {
        AttributeValue::Int(i64::from(i))
    }
}

impl From<f64> for AttributeValue {
    fn from(x: f64) -> Self {
        AttributeValue::Float(x)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl<T: Into<AttributeValue>> From<Vec<T>> for AttributeValue {
    fn from(items: Vec<T>) -> Self {
        AttributeValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// A constraint as declared on an element.
///
/// # Example
///
/// ```rust
/// use constraints_core::ConstraintAnnotation;
///
/// let size = ConstraintAnnotation::new("Size")
///     .attr("min", 1)
///     .attr("max", 10)
///     .message("between {min} and {max}");
/// assert_eq!(size.kind, "Size");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintAnnotation {
    /// Constraint kind
    #[serde(alias = "annotation")]
    pub kind: String,

    /// Explicit message template, overriding the definition's default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Explicit groups; empty means `Default`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Group>,

    /// Payload markers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payload: Vec<String>,

    /// Explicit attributes
    #[serde(default, alias = "elements", skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttributeValue>,

    /// Validation target on executables
    #[serde(default)]
    pub validation_applies_to: ConstraintTarget,
}

impl ConstraintAnnotation {
    /// Creates an annotation of the given kind with no attributes.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: None,
            groups: Vec::new(),
            payload: Vec::new(),
            attributes: BTreeMap::new(),
            validation_applies_to: ConstraintTarget::Implicit,
        }
    }

    /// Sets an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Sets the message template.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the groups.
    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Group>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a payload marker.
    pub fn payload(mut self, payload: impl Into<String>) -> Self {
        self.payload.push(payload.into());
        self
    }

    /// Sets the validation target.
    pub fn applies_to(mut self, target: ConstraintTarget) -> Self {
        self.validation_applies_to = target;
        self
    }
}

/// A group conversion on a cascaded element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConversion {
    /// Group requested on the outer bean
    pub from: Group,
    /// Group used for the cascaded value
    pub to: Group,
}

impl GroupConversion {
    /// Creates a conversion.
    pub fn new(from: impl Into<Group>, to: impl Into<Group>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Constraints, cascading and conversions declared on one element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementDecl {
    /// Constraints on the element
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<ConstraintAnnotation>,

    /// Cascade marker (`@Valid`)
    #[serde(default, alias = "valid")]
    pub cascade: bool,

    /// Group conversions for the cascade
    #[serde(default, alias = "convert_groups", skip_serializing_if = "Vec::is_empty")]
    pub group_conversions: Vec<GroupConversion>,

    /// Declarations on type arguments of a container element
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub container_elements: Vec<ContainerElementDecl>,
}

impl ElementDecl {
    /// Returns true if nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
            && !self.cascade
            && self.group_conversions.is_empty()
            && self.container_elements.is_empty()
    }
}

/// Declarations on one type argument of a container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerElementDecl {
    /// Index of the type argument (0 for lists, 0 or 1 for maps)
    #[serde(default)]
    pub type_argument_index: usize,

    /// Declarations on the type argument
    #[serde(flatten)]
    pub element: ElementDecl,
}

impl ContainerElementDecl {
    /// Declares a type argument by index.
    pub fn new(type_argument_index: usize) -> Self {
        Self {
            type_argument_index,
            element: ElementDecl::default(),
        }
    }

    /// Adds a constraint on the type argument.
    pub fn constraint(mut self, constraint: ConstraintAnnotation) -> Self {
        self.element.constraints.push(constraint);
        self
    }

    /// Marks the type argument as cascaded.
    pub fn valid(mut self) -> Self {
        self.element.cascade = true;
        self
    }

    /// Adds a group conversion for the cascade.
    pub fn convert_group(mut self, from: impl Into<Group>, to: impl Into<Group>) -> Self {
        self.element.group_conversions.push(GroupConversion::new(from, to));
        self
    }

    /// Adds a nested type argument declaration.
    pub fn nested(mut self, nested: ContainerElementDecl) -> Self {
        self.element.container_elements.push(nested);
        self
    }
}

/// A field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    /// Field name
    pub name: String,
    /// Declared type
    pub declared_type: TypeRef,
    /// Declarations on the field
    pub element: ElementDecl,
}

/// An executable parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDecl {
    /// Declared name, when known
    pub name: Option<String>,
    /// Declared type
    pub declared_type: TypeRef,
    /// Declarations on the parameter
    pub element: ElementDecl,
}

/// Method or constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutableKind {
    /// Method
    Method,
    /// Constructor
    Constructor,
}

/// Name and parameter types of an executable.
///
/// Constructors use the simple class name as their name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Signature {
    /// Executable name
    pub name: String,
    /// Parameter types, rendered
    pub parameter_types: Vec<String>,
}

impl Signature {
    /// Creates a signature.
    pub fn new(name: impl Into<String>, parameter_types: &[TypeRef]) -> Self {
        Self {
            name: name.into(),
            parameter_types: parameter_types.iter().map(ToString::to_string).collect(),
        }
    }

    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.parameter_types.len()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.parameter_types.join(", "))
    }
}

/// Error returned when a signature cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid signature '{0}': expected name(Type, ...)")]
pub struct SignatureParseError(pub String);

impl FromStr for Signature {
    type Err = SignatureParseError;

    /// Parses `name(Type, Type)`. Generic arguments may contain commas.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let error = || SignatureParseError(input.to_string());
        let trimmed = input.trim();
        let open = trimmed.find('(').ok_or_else(error)?;
        let inner = trimmed
            .strip_suffix(')')
            .map(|s| &s[open + 1..])
            .ok_or_else(error)?;
        let name = trimmed[..open].trim();
        if name.is_empty() {
            return Err(error());
        }

        let mut types = Vec::new();
        let mut depth = 0usize;
        let mut current = String::new();
        for c in inner.chars() {
            match c {
                '<' => depth += 1,
                '>' => depth = depth.checked_sub(1).ok_or_else(error)?,
                ',' if depth == 0 => {
                    types.push(std::mem::take(&mut current));
                    continue;
                }
                _ => {}
            }
            current.push(c);
        }
        if !current.trim().is_empty() || !types.is_empty() {
            types.push(current);
        }

        let parameter_types = types
            .iter()
            .map(|t| t.trim().parse::<TypeRef>().map(|t| t.to_string()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| error())?;
        Ok(Self {
            name: name.to_string(),
            parameter_types,
        })
    }
}

impl TryFrom<String> for Signature {
    type Error = SignatureParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Signature> for String {
    fn from(value: Signature) -> Self {
        value.to_string()
    }
}

/// A method or constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutableDecl {
    /// Method or constructor
    pub kind: ExecutableKind,
    /// Name (simple class name for constructors)
    pub name: String,
    /// Parameters in declaration order
    pub parameters: Vec<ParameterDecl>,
    /// Return type; `None` for void methods and constructors
    pub return_type: Option<TypeRef>,
    /// Declarations on the return value
    pub return_value: ElementDecl,
    /// Cross-parameter constraints
    pub cross_parameter: Vec<ConstraintAnnotation>,
}

impl ExecutableDecl {
    /// Signature of the executable.
    pub fn signature(&self) -> Signature {
        let types: Vec<TypeRef> = self
            .parameters
            .iter()
            .map(|p| p.declared_type.clone())
            .collect();
        Signature::new(self.name.clone(), &types)
    }

    /// Returns true for methods without a return value.
    pub fn is_void(&self) -> bool {
        self.kind == ExecutableKind::Method && self.return_type.is_none()
    }

    /// Returns true if any parameter carries constraints or cascades.
    pub fn has_parameter_declarations(&self) -> bool {
        !self.cross_parameter.is_empty() || self.parameters.iter().any(|p| !p.element.is_empty())
    }
}

/// Supplies the default group sequence of a bean from its state.
pub trait DefaultGroupSequenceProvider: fmt::Debug + Send + Sync {
    /// Returns the sequence for `bean`, or for the class when `bean` is absent.
    fn group_sequence(&self, bean: Option<&BeanRef>) -> Vec<Group>;
}

/// Everything declared on one class or interface.
#[derive(Debug, Clone, Default)]
pub struct ClassDescriptor {
    /// Class name
    pub name: String,
    /// Direct superclass
    pub superclass: Option<String>,
    /// Directly implemented (or extended) interfaces
    pub interfaces: Vec<String>,
    /// True for interfaces
    pub is_interface: bool,
    /// Class-level constraints
    pub class_constraints: Vec<ConstraintAnnotation>,
    /// Fields in declaration order
    pub fields: Vec<FieldDecl>,
    /// Methods and constructors in declaration order
    pub executables: Vec<ExecutableDecl>,
    /// Redefined default group sequence
    pub default_group_sequence: Option<Vec<Group>>,
    /// Dynamic default group sequence
    pub group_sequence_provider: Option<Arc<dyn DefaultGroupSequenceProvider>>,
}

impl ClassDescriptor {
    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Looks up an executable by signature.
    pub fn executable(&self, signature: &Signature) -> Option<&ExecutableDecl> {
        self.executables.iter().find(|e| e.signature() == *signature)
    }

    /// Methods of the class.
    pub fn methods(&self) -> impl Iterator<Item = &ExecutableDecl> {
        self.executables
            .iter()
            .filter(|e| e.kind == ExecutableKind::Method)
    }

    /// Constructors of the class.
    pub fn constructors(&self) -> impl Iterator<Item = &ExecutableDecl> {
        self.executables
            .iter()
            .filter(|e| e.kind == ExecutableKind::Constructor)
    }

    /// Simple name of the class, used for constructor nodes.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit(['.', '$']).next().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_signature_parsing() {
        let sig: Signature = "placeOrder(String, Map<String, List<Item>>)".parse().unwrap();
        assert_eq!(sig.name, "placeOrder");
        assert_eq!(sig.parameter_types, vec!["Text", "Map<Text, List<Item>>"]);
        assert_eq!(sig.to_string(), "placeOrder(Text, Map<Text, List<Item>>)");

        let empty: Signature = "getName()".parse().unwrap();
        assert_eq!(empty.arity(), 0);
        assert!("noParens".parse::<Signature>().is_err());
        assert!("(Text)".parse::<Signature>().is_err());
    }

    #[test]
    fn test_annotation_builder() {
        let ann = ConstraintAnnotation::new("DecimalMin")
            .attr("value", "0")
            .attr("inclusive", false)
            .groups(["Expensive"]);
        assert_eq!(ann.attributes["value"], AttributeValue::Text("0".into()));
        assert_eq!(ann.attributes["inclusive"].as_bool(), Some(false));
        assert_eq!(ann.groups, vec![Group::new("Expensive")]);
    }

    #[test]
    fn test_attribute_display() {
        let list = AttributeValue::from(vec!["a", "b"]);
        assert_eq!(list.to_string(), "[a, b]");
        assert_eq!(AttributeValue::from(3).to_string(), "3");
    }

    #[test]
    fn test_simple_name() {
        let class = ClassDescriptor {
            name: "shop.model.Order".to_string(),
            ..Default::default()
        };
        assert_eq!(class.simple_name(), "Order");
    }
}
