//! Pluggable collaborators with their default implementations.

use chrono::{DateTime, Utc};
use constraints_core::{BeanRef, ElementType, ExecutableDecl, ExecutableKind, Node, Path, TypeRef};

/// Source of the current time for temporal constraints.
pub trait ClockProvider: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock reading the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClockProvider;

impl ClockProvider for SystemClockProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClockProvider(pub DateTime<Utc>);

impl ClockProvider for FixedClockProvider {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Names parameters in paths and cross-parameter scripts.
pub trait ParameterNameProvider: Send + Sync {
    /// One name per parameter of `executable`.
    fn parameter_names(&self, executable: &ExecutableDecl) -> Vec<String>;
}

/// Uses declared names and falls back to `arg0`, `arg1`, ...
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultParameterNameProvider;

impl ParameterNameProvider for DefaultParameterNameProvider {
    fn parameter_names(&self, executable: &ExecutableDecl) -> Vec<String> {
        executable
            .parameters
            .iter()
            .enumerate()
            .map(|(i, p)| p.name.clone().unwrap_or_else(|| format!("arg{}", i)))
            .collect()
    }
}

/// Decides whether properties may be read and cascaded.
///
/// Both questions are asked with the bean hosting the property (absent for
/// `validate_value`), the property node, the root class, the path to the
/// hosting bean and the kind of element declaring the property.
pub trait TraversableResolver: Send + Sync {
    /// Whether the property may be accessed at all.
    fn is_reachable(
        &self,
        bean: Option<&BeanRef>,
        property: &Node,
        root_class: &str,
        path_to_bean: &Path,
        element_type: ElementType,
    ) -> anyhow::Result<bool>;

    /// Whether a reachable property may be cascaded.
    fn is_cascadable(
        &self,
        bean: Option<&BeanRef>,
        property: &Node,
        root_class: &str,
        path_to_bean: &Path,
        element_type: ElementType,
    ) -> anyhow::Result<bool>;
}

/// Resolver that allows everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct TraverseAllResolver;

impl TraversableResolver for TraverseAllResolver {
    fn is_reachable(&self, _: Option<&BeanRef>, _: &Node, _: &str, _: &Path, _: ElementType) -> anyhow::Result<bool> {
        Ok(true)
    }

    fn is_cascadable(&self, _: Option<&BeanRef>, _: &Node, _: &str, _: &Path, _: ElementType) -> anyhow::Result<bool> {
        Ok(true)
    }
}

/// Recognises getters and derives property names from them.
pub trait GetterPropertySelectionStrategy: Send + Sync {
    /// Property name if `method` is a getter.
    fn property_name(&self, method: &ExecutableDecl) -> Option<String>;

    /// Candidate getter names for `property`.
    fn getter_names(&self, property: &str) -> Vec<String>;
}

/// JavaBeans conventions: `getX()` for any non-void type, `isX()` and
/// `hasX()` for booleans.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultGetterPropertySelectionStrategy;

impl DefaultGetterPropertySelectionStrategy {
    const PREFIXES: [&'static str; 3] = ["get", "is", "has"];
}

impl GetterPropertySelectionStrategy for DefaultGetterPropertySelectionStrategy {
    fn property_name(&self, method: &ExecutableDecl) -> Option<String> {
        if method.kind != ExecutableKind::Method || !method.parameters.is_empty() {
            return None;
        }
        let return_type = method.return_type.as_ref()?;
        Self::PREFIXES.iter().find_map(|prefix| {
            let rest = method.name.strip_prefix(prefix)?;
            let mut chars = rest.chars();
            let first = chars.next()?;
            if !first.is_uppercase() {
                return None;
            }
            if *prefix != "get" && *return_type != TypeRef::Boolean {
                return None;
            }
            Some(first.to_lowercase().chain(chars).collect())
        })
    }

    fn getter_names(&self, property: &str) -> Vec<String> {
        let mut chars = property.chars();
        let capitalized: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => return Vec::new(),
        };
        Self::PREFIXES
            .iter()
            .map(|prefix| format!("{}{}", prefix, capitalized))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use constraints_core::{MethodBuilder, ParameterBuilder};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_getter_detection() {
        let strategy = DefaultGetterPropertySelectionStrategy;
        let get = MethodBuilder::getter("getFirstName", TypeRef::Text).build();
        let is = MethodBuilder::getter("isActive", TypeRef::Boolean).build();
        let has_text = MethodBuilder::getter("hasName", TypeRef::Text).build();
        let void = MethodBuilder::method("getNothing").build();
        let with_param = MethodBuilder::getter("getItem", TypeRef::Text)
            .parameter(ParameterBuilder::new(TypeRef::Integer).build())
            .build();

        assert_eq!(strategy.property_name(&get).as_deref(), Some("firstName"));
        assert_eq!(strategy.property_name(&is).as_deref(), Some("active"));
        assert_eq!(strategy.property_name(&has_text), None);
        assert_eq!(strategy.property_name(&void), None);
        assert_eq!(strategy.property_name(&with_param), None);
        assert_eq!(
            strategy.getter_names("name"),
            vec!["getName", "isName", "hasName"]
        );
    }

    #[test]
    fn test_parameter_names_fall_back_to_position() {
        let method = MethodBuilder::method("book")
            .parameter(ParameterBuilder::new(TypeRef::Temporal).named("start").build())
            .parameter(ParameterBuilder::new(TypeRef::Temporal).build())
            .build();
        assert_eq!(
            DefaultParameterNameProvider.parameter_names(&method),
            vec!["start", "arg1"]
        );
    }
}
