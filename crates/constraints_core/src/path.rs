//! Property paths.
//!
//! A [`Path`] locates a value inside the validated object graph, starting at
//! the root bean (or at the executable for method validation). Index and key
//! information follows the usual convention: the node *holding* a container
//! is marked iterable, and the node for the element inside it is marked as
//! being in an iterable, carrying the same index or key. That gives the
//! familiar rendering `addresses[0].street` or `names[1].<list element>`.

use crate::types::ContainerKind;
use crate::value::Value;
use std::fmt;

/// Node name used for list and array elements.
pub const LIST_ELEMENT_NODE: &str = "<list element>";
/// Node name used for set and collection elements.
pub const ITERABLE_ELEMENT_NODE: &str = "<iterable element>";
/// Node name used for map keys.
pub const MAP_KEY_NODE: &str = "<map key>";
/// Node name used for map values.
pub const MAP_VALUE_NODE: &str = "<map value>";
/// Node name used for return values.
pub const RETURN_VALUE_NODE: &str = "<return value>";
/// Node name used for cross-parameter constraints.
pub const CROSS_PARAMETER_NODE: &str = "<cross-parameter>";

/// Kind of a path node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// A bean (class-level constraints)
    Bean,
    /// A field or getter property
    Property,
    /// A method
    Method,
    /// A constructor
    Constructor,
    /// An executable parameter
    Parameter,
    /// The argument array of an executable
    CrossParameter,
    /// The return value of an executable
    ReturnValue,
    /// An element inside a container
    ContainerElement,
}

/// One element of a [`Path`].
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    kind: ElementKind,
    name: Option<String>,
    iterable: bool,
    in_iterable: bool,
    index: Option<usize>,
    key: Option<Value>,
    container: Option<(ContainerKind, usize)>,
    parameter_index: Option<usize>,
}

impl Node {
    fn new(kind: ElementKind, name: Option<String>) -> Self {
        Self {
            kind,
            name,
            iterable: false,
            in_iterable: false,
            index: None,
            key: None,
            container: None,
            parameter_index: None,
        }
    }

    /// Kind of the node.
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Name of the node, if it has one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// True if the node is an element of an iterable or map.
    pub fn is_in_iterable(&self) -> bool {
        self.in_iterable
    }

    /// Index within the enclosing list or array.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Key within the enclosing map.
    pub fn key(&self) -> Option<&Value> {
        self.key.as_ref()
    }

    /// Container type and type-argument index this node was extracted from.
    pub fn container(&self) -> Option<(ContainerKind, usize)> {
        self.container
    }

    /// Parameter index for parameter nodes.
    pub fn parameter_index(&self) -> Option<usize> {
        self.parameter_index
    }

    fn render(&self, out: &mut String) {
        if let Some(name) = &self.name {
            out.push_str(name);
        }
        if self.iterable {
            out.push('[');
            if let Some(index) = self.index {
                out.push_str(&index.to_string());
            } else if let Some(key) = &self.key {
                out.push_str(&key.to_string());
            }
            out.push(']');
        }
    }
}

/// Ordered node sequence locating a value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    nodes: Vec<Node>,
    pending_container: Option<(ContainerKind, usize)>,
}

impl Path {
    /// Creates the empty root path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Nodes of the path, root first.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Last node of the path.
    pub fn leaf(&self) -> Option<&Node> {
        self.nodes.last()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true for the root path.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Remembers the container the next node is extracted from.
    pub fn set_type_parameter(&mut self, container: ContainerKind, type_argument_index: usize) {
        self.pending_container = Some((container, type_argument_index));
    }

    fn push(&mut self, mut node: Node) {
        if let Some(parent) = self.nodes.last() {
            if parent.iterable {
                node.in_iterable = true;
                node.index = parent.index;
                node.key = parent.key.clone();
            }
        }
        node.container = self.pending_container.take();
        self.nodes.push(node);
    }

    /// Appends a bean node (class-level constraints).
    pub fn add_bean_node(&mut self) {
        self.push(Node::new(ElementKind::Bean, None));
    }

    /// Appends a property node.
    pub fn add_property_node(&mut self, name: impl Into<String>) {
        self.push(Node::new(ElementKind::Property, Some(name.into())));
    }

    /// Appends a container element node.
    pub fn add_container_element_node(&mut self, name: impl Into<String>) {
        self.push(Node::new(ElementKind::ContainerElement, Some(name.into())));
    }

    /// Appends a method node.
    pub fn add_method_node(&mut self, name: impl Into<String>) {
        self.push(Node::new(ElementKind::Method, Some(name.into())));
    }

    /// Appends a constructor node.
    pub fn add_constructor_node(&mut self, name: impl Into<String>) {
        self.push(Node::new(ElementKind::Constructor, Some(name.into())));
    }

    /// Appends a parameter node.
    pub fn add_parameter_node(&mut self, name: impl Into<String>, index: usize) {
        let mut node = Node::new(ElementKind::Parameter, Some(name.into()));
        node.parameter_index = Some(index);
        self.push(node);
    }

    /// Appends the cross-parameter node.
    pub fn add_cross_parameter_node(&mut self) {
        self.push(Node::new(
            ElementKind::CrossParameter,
            Some(CROSS_PARAMETER_NODE.to_string()),
        ));
    }

    /// Appends the return value node.
    pub fn add_return_value_node(&mut self) {
        self.push(Node::new(
            ElementKind::ReturnValue,
            Some(RETURN_VALUE_NODE.to_string()),
        ));
    }

    /// Marks the leaf as a container and records the element index.
    pub fn make_leaf_iterable_with_index(&mut self, index: usize) {
        if let Some(leaf) = self.nodes.last_mut() {
            leaf.iterable = true;
            leaf.index = Some(index);
            leaf.key = None;
        }
    }

    /// Marks the leaf as a map and records the entry key.
    pub fn make_leaf_iterable_with_key(&mut self, key: Value) {
        if let Some(leaf) = self.nodes.last_mut() {
            leaf.iterable = true;
            leaf.index = None;
            leaf.key = Some(key);
        }
    }

    /// Marks the leaf as an unordered container.
    pub fn make_leaf_iterable(&mut self) {
        if let Some(leaf) = self.nodes.last_mut() {
            leaf.iterable = true;
            leaf.index = None;
            leaf.key = None;
        }
    }

    /// Removes and returns the leaf node.
    pub fn remove_leaf(&mut self) -> Option<Node> {
        self.nodes.pop()
    }

    /// Returns a copy of this path extended with a property node.
    pub fn with_property(&self, name: impl Into<String>) -> Self {
        let mut path = self.clone();
        path.add_property_node(name);
        path
    }

    /// Returns true if `self` is a prefix of `other`.
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        self.nodes.len() <= other.nodes.len()
            && self
                .nodes
                .iter()
                .zip(other.nodes.iter())
                .all(|(a, b)| a.kind == b.kind && a.name == b.name)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for node in &self.nodes {
            let mut rendered = String::new();
            node.render(&mut rendered);
            if rendered.is_empty() {
                continue;
            }
            if !out.is_empty() && !rendered.starts_with('[') {
                out.push('.');
            }
            out.push_str(&rendered);
        }
        f.write_str(&out)
    }
}
