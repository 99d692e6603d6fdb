//! Value extractors.
//!
//! An extractor pulls the values of one type argument out of a container
//! (list elements, map keys, map values, the content of an optional) along
//! with where each value sits in the container.

use constraints_core::{
    ContainerKind, ITERABLE_ELEMENT_NODE, LIST_ELEMENT_NODE, MAP_KEY_NODE, MAP_VALUE_NODE, Path, Result,
    ValidationError, Value,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Where an extracted value sits inside its container.
#[derive(Debug, Clone, PartialEq)]
pub enum Position {
    /// Element of an ordered container
    Indexed(usize),
    /// Key or value of a map entry
    Keyed(Value),
    /// Element of an unordered container
    Iterable,
    /// The single value of a wrapper
    Unwrapped,
}

/// A value pulled out of a container.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedValue {
    /// The element
    pub value: Value,
    /// Its position
    pub position: Position,
}

impl ExtractedValue {
    fn new(value: Value, position: Position) -> Self {
        Self { value, position }
    }
}

/// Extracts the values of one type argument of a container kind.
pub trait ValueExtractor: Send + Sync {
    /// Container kind handled.
    fn container(&self) -> ContainerKind;

    /// Type argument handled.
    fn type_argument_index(&self) -> usize;

    /// Node name for constraint violations on extracted values; `None` for
    /// wrappers, whose content is reported on the wrapper's own node.
    fn node_name(&self) -> Option<&'static str>;

    /// Extracts the values from `container`. Values of another shape yield
    /// nothing.
    fn extract(&self, container: &Value) -> Vec<ExtractedValue>;
}

fn indexed(values: &[Value]) -> Vec<ExtractedValue> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| ExtractedValue::new(v.clone(), Position::Indexed(i)))
        .collect()
}

fn unordered(values: &[Value]) -> Vec<ExtractedValue> {
    values
        .iter()
        .map(|v| ExtractedValue::new(v.clone(), Position::Iterable))
        .collect()
}

/// Elements of lists.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListValueExtractor;

impl ValueExtractor for ListValueExtractor {
    fn container(&self) -> ContainerKind {
        ContainerKind::List
    }

    fn type_argument_index(&self) -> usize {
        0
    }

    fn node_name(&self) -> Option<&'static str> {
        Some(LIST_ELEMENT_NODE)
    }

    fn extract(&self, container: &Value) -> Vec<ExtractedValue> {
        match container {
            Value::List(values) | Value::Array(values) => indexed(values),
            _ => Vec::new(),
        }
    }
}

/// Elements of arrays.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArrayValueExtractor;

impl ValueExtractor for ArrayValueExtractor {
    fn container(&self) -> ContainerKind {
        ContainerKind::Array
    }

    fn type_argument_index(&self) -> usize {
        0
    }

    fn node_name(&self) -> Option<&'static str> {
        Some(ITERABLE_ELEMENT_NODE)
    }

    fn extract(&self, container: &Value) -> Vec<ExtractedValue> {
        match container {
            Value::Array(values) | Value::List(values) => indexed(values),
            _ => Vec::new(),
        }
    }
}

/// Elements of sets.
#[derive(Debug, Default, Clone, Copy)]
pub struct SetValueExtractor;

impl ValueExtractor for SetValueExtractor {
    fn container(&self) -> ContainerKind {
        ContainerKind::Set
    }

    fn type_argument_index(&self) -> usize {
        0
    }

    fn node_name(&self) -> Option<&'static str> {
        Some(ITERABLE_ELEMENT_NODE)
    }

    fn extract(&self, container: &Value) -> Vec<ExtractedValue> {
        match container {
            Value::Set(values) => unordered(values),
            _ => Vec::new(),
        }
    }
}

/// Elements of any collection; lists and arrays keep their indexes.
#[derive(Debug, Default, Clone, Copy)]
pub struct CollectionValueExtractor;

impl ValueExtractor for CollectionValueExtractor {
    fn container(&self) -> ContainerKind {
        ContainerKind::Collection
    }

    fn type_argument_index(&self) -> usize {
        0
    }

    fn node_name(&self) -> Option<&'static str> {
        Some(ITERABLE_ELEMENT_NODE)
    }

    fn extract(&self, container: &Value) -> Vec<ExtractedValue> {
        match container {
            Value::List(values) | Value::Array(values) => indexed(values),
            Value::Set(values) => unordered(values),
            _ => Vec::new(),
        }
    }
}

/// Keys of maps.
#[derive(Debug, Default, Clone, Copy)]
pub struct MapKeyExtractor;

impl ValueExtractor for MapKeyExtractor {
    fn container(&self) -> ContainerKind {
        ContainerKind::Map
    }

    fn type_argument_index(&self) -> usize {
        0
    }

    fn node_name(&self) -> Option<&'static str> {
        Some(MAP_KEY_NODE)
    }

    fn extract(&self, container: &Value) -> Vec<ExtractedValue> {
        match container {
            Value::Map(entries) => entries
                .iter()
                .map(|(k, _)| ExtractedValue::new(k.clone(), Position::Keyed(k.clone())))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Values of maps.
#[derive(Debug, Default, Clone, Copy)]
pub struct MapValueExtractor;

impl ValueExtractor for MapValueExtractor {
    fn container(&self) -> ContainerKind {
        ContainerKind::Map
    }

    fn type_argument_index(&self) -> usize {
        1
    }

    fn node_name(&self) -> Option<&'static str> {
        Some(MAP_VALUE_NODE)
    }

    fn extract(&self, container: &Value) -> Vec<ExtractedValue> {
        match container {
            Value::Map(entries) => entries
                .iter()
                .map(|(k, v)| ExtractedValue::new(v.clone(), Position::Keyed(k.clone())))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Content of optionals; empty optionals yield null.
#[derive(Debug, Default, Clone, Copy)]
pub struct OptionalValueExtractor;

impl ValueExtractor for OptionalValueExtractor {
    fn container(&self) -> ContainerKind {
        ContainerKind::Optional
    }

    fn type_argument_index(&self) -> usize {
        0
    }

    fn node_name(&self) -> Option<&'static str> {
        None
    }

    fn extract(&self, container: &Value) -> Vec<ExtractedValue> {
        match container {
            Value::Optional(inner) => {
                let value = inner.as_deref().cloned().unwrap_or(Value::Null);
                vec![ExtractedValue::new(value, Position::Unwrapped)]
            }
            _ => Vec::new(),
        }
    }
}

/// Registered extractors keyed by container kind and type argument.
///
/// User extractors replace the built-in one for the same key; two user
/// extractors for the same key are a definition error.
#[derive(Clone)]
pub struct ValueExtractors {
    extractors: HashMap<(ContainerKind, usize), Arc<dyn ValueExtractor>>,
}

impl ValueExtractors {
    /// The built-in extractors.
    pub fn with_defaults() -> Self {
        let defaults: [Arc<dyn ValueExtractor>; 7] = [
            Arc::new(ListValueExtractor),
            Arc::new(ArrayValueExtractor),
            Arc::new(SetValueExtractor),
            Arc::new(CollectionValueExtractor),
            Arc::new(MapKeyExtractor),
            Arc::new(MapValueExtractor),
            Arc::new(OptionalValueExtractor),
        ];
        Self {
            extractors: defaults
                .into_iter()
                .map(|e| ((e.container(), e.type_argument_index()), e))
                .collect(),
        }
    }

    /// Adds user extractors on top of the built-in ones.
    pub fn with_user_extractors(user: &[Arc<dyn ValueExtractor>]) -> Result<Self> {
        let mut extractors = Self::with_defaults();
        let mut seen = HashMap::new();
        for extractor in user {
            let key = (extractor.container(), extractor.type_argument_index());
            if seen.insert(key, ()).is_some() {
                return Err(ValidationError::value_extraction(format!(
                    "More than one value extractor registered for {}<{}>",
                    key.0, key.1
                )));
            }
            debug!(container = %key.0, type_argument = key.1, "Registering value extractor");
            extractors.extractors.insert(key, extractor.clone());
        }
        Ok(extractors)
    }

    /// Extractor for a type argument of a container kind.
    pub fn find(&self, container: ContainerKind, type_argument_index: usize) -> Result<Arc<dyn ValueExtractor>> {
        self.extractors
            .get(&(container, type_argument_index))
            .cloned()
            .ok_or_else(|| {
                ValidationError::value_extraction(format!(
                    "No value extractor found for {}<{}>",
                    container, type_argument_index
                ))
            })
    }
}

impl fmt::Debug for ValueExtractors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.extractors.keys().collect();
        keys.sort();
        f.debug_struct("ValueExtractors").field("keys", &keys).finish()
    }
}

/// Marks the leaf of `path` as holding `position`.
pub(crate) fn mark_position(path: &mut Path, position: &Position) {
    match position {
        Position::Indexed(i) => path.make_leaf_iterable_with_index(*i),
        Position::Keyed(key) => path.make_leaf_iterable_with_key(key.clone()),
        Position::Iterable => path.make_leaf_iterable(),
        Position::Unwrapped => {}
    }
}
