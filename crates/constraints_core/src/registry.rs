//! Registry of class declarations and group definitions.

use crate::declaration::ClassDescriptor;
use crate::group::{Group, GroupDefinition};
use crate::types::TypeHierarchy;
use std::collections::{HashMap, HashSet};

/// Known classes, interfaces and groups.
///
/// The registry stands in for runtime reflection: the metadata providers
/// read class declarations from it and validator resolution uses it to
/// answer subtype questions.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, ClassDescriptor>,
    groups: HashMap<Group, GroupDefinition>,
}

impl ClassRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a class and returns the registry.
    pub fn with_class(mut self, class: ClassDescriptor) -> Self {
        self.register(class);
        self
    }

    /// Registers a group definition and returns the registry.
    pub fn with_group(mut self, definition: GroupDefinition) -> Self {
        self.define_group(definition);
        self
    }

    /// Registers or replaces a class.
    pub fn register(&mut self, class: ClassDescriptor) {
        self.classes.insert(class.name.clone(), class);
    }

    /// Registers or replaces a group definition.
    pub fn define_group(&mut self, definition: GroupDefinition) {
        self.groups.insert(definition.group.clone(), definition);
    }

    /// Looks up a class.
    pub fn get(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes.get(name)
    }

    /// Returns true if the class is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Names of all registered classes, sorted.
    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The class and all its supertypes, supertypes first and the class last.
    ///
    /// Every type appears once, after all of its own supertypes. Supertypes
    /// that are not registered are skipped.
    pub fn hierarchy(&self, name: &str) -> Vec<&ClassDescriptor> {
        let mut ordered = Vec::new();
        let mut visited = HashSet::new();
        self.visit(name, &mut visited, &mut ordered);
        ordered
    }

    fn visit<'a>(
        &'a self,
        name: &str,
        visited: &mut HashSet<String>,
        ordered: &mut Vec<&'a ClassDescriptor>,
    ) {
        if !visited.insert(name.to_string()) {
            return;
        }
        let Some(class) = self.classes.get(name) else {
            return;
        };
        if let Some(superclass) = &class.superclass {
            self.visit(superclass, visited, ordered);
        }
        for interface in &class.interfaces {
            self.visit(interface, visited, ordered);
        }
        ordered.push(class);
    }

    /// Direct supertypes of a class: superclass first, then interfaces.
    pub fn direct_supertypes(&self, name: &str) -> Vec<&str> {
        self.classes
            .get(name)
            .map(|class| {
                class
                    .superclass
                    .iter()
                    .chain(class.interfaces.iter())
                    .map(String::as_str)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Looks up a group definition.
    pub fn group_definition(&self, group: &Group) -> Option<&GroupDefinition> {
        self.groups.get(group)
    }

    /// Returns true if the group is defined as a sequence.
    pub fn is_sequence(&self, group: &Group) -> bool {
        self.groups.get(group).is_some_and(GroupDefinition::is_sequence)
    }

    /// Groups `group` directly extends.
    pub fn parent_groups(&self, group: &Group) -> Vec<Group> {
        match self.groups.get(group) {
            Some(definition) => definition.extends.clone(),
            None => Vec::new(),
        }
    }
}

impl TypeHierarchy for ClassRegistry {
    fn is_subclass_of(&self, sub: &str, sup: &str) -> bool {
        if sub == sup {
            return true;
        }
        let mut pending = vec![sub];
        let mut seen = HashSet::new();
        while let Some(current) = pending.pop() {
            if !seen.insert(current) {
                continue;
            }
            for parent in self.direct_supertypes(current) {
                if parent == sup {
                    return true;
                }
                pending.push(parent);
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn class(name: &str, superclass: Option<&str>, interfaces: &[&str]) -> ClassDescriptor {
        ClassDescriptor {
            name: name.to_string(),
            superclass: superclass.map(str::to_string),
            interfaces: interfaces.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn registry() -> ClassRegistry {
        ClassRegistry::new()
            .with_class(class("Named", None, &[]))
            .with_class(class("Priced", None, &["Named"]))
            .with_class(class("Item", None, &["Named"]))
            .with_class(class("Book", Some("Item"), &["Priced"]))
    }

    #[test]
    fn test_hierarchy_is_leaf_last_and_deduplicated() {
        let registry = registry();
        let names: Vec<&str> = registry
            .hierarchy("Book")
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Named", "Item", "Priced", "Book"]);
    }

    #[test]
    fn test_subtyping() {
        let registry = registry();
        assert!(registry.is_subclass_of("Book", "Named"));
        assert!(registry.is_subclass_of("Book", "Book"));
        assert!(!registry.is_subclass_of("Item", "Priced"));
        assert!(!registry.is_subclass_of("Unknown", "Named"));
    }

    #[test]
    fn test_group_definitions() {
        let registry = ClassRegistry::new()
            .with_group(GroupDefinition::group("Expensive", vec![Group::new("Priced")]))
            .with_group(GroupDefinition::sequence(
                "Complete",
                vec![Group::default_group(), Group::new("Expensive")],
            ));
        assert_eq!(
            registry.parent_groups(&Group::new("Expensive")),
            vec![Group::new("Priced")]
        );
        assert!(registry.is_sequence(&Group::new("Complete")));
        assert!(!registry.is_sequence(&Group::new("Expensive")));
    }
}
