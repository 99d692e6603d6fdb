//! Builder pattern for declaring classes.
//!
//! This module provides ergonomic builders for constructing class
//! declarations and their members with a fluent API.

use crate::declaration::{
    ClassDescriptor, ConstraintAnnotation, ContainerElementDecl, DefaultGroupSequenceProvider,
    ElementDecl, ExecutableDecl, ExecutableKind, FieldDecl, GroupConversion, ParameterDecl,
};
use crate::group::Group;
use crate::types::TypeRef;
use std::sync::Arc;

/// Builder for creating a `ClassDescriptor`.
///
/// # Example
///
/// ```rust
/// use constraints_core::{ClassBuilder, ConstraintAnnotation, FieldBuilder, TypeRef};
///
/// let order = ClassBuilder::new("Order")
///     .field(
///         FieldBuilder::new("customer", TypeRef::Text)
///             .constraint(ConstraintAnnotation::new("NotNull"))
///             .build(),
///     )
///     .build();
/// assert_eq!(order.fields.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ClassBuilder {
    class: ClassDescriptor,
}

impl ClassBuilder {
    /// Creates a new class builder.
    ///
    /// # Arguments
    ///
    /// * `name` - Class name, also usable as a group name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            class: ClassDescriptor {
                name: name.into(),
                ..Default::default()
            },
        }
    }

    /// Creates a new interface builder.
    pub fn interface(name: impl Into<String>) -> Self {
        let mut builder = Self::new(name);
        builder.class.is_interface = true;
        builder
    }

    /// Sets the superclass.
    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.class.superclass = Some(superclass.into());
        self
    }

    /// Adds an implemented interface.
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.class.interfaces.push(interface.into());
        self
    }

    /// Adds a class-level constraint.
    pub fn constraint(mut self, constraint: ConstraintAnnotation) -> Self {
        self.class.class_constraints.push(constraint);
        self
    }

    /// Adds a field.
    pub fn field(mut self, field: FieldDecl) -> Self {
        self.class.fields.push(field);
        self
    }

    /// Adds a method.
    pub fn method(mut self, method: ExecutableDecl) -> Self {
        self.class.executables.push(method);
        self
    }

    /// Adds a constructor.
    pub fn constructor(mut self, constructor: ExecutableDecl) -> Self {
        self.class.executables.push(constructor);
        self
    }

    /// Redefines the default group sequence.
    pub fn default_group_sequence<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Group>,
    {
        self.class.default_group_sequence = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    /// Sets a dynamic default group sequence provider.
    pub fn group_sequence_provider(mut self, provider: Arc<dyn DefaultGroupSequenceProvider>) -> Self {
        self.class.group_sequence_provider = Some(provider);
        self
    }

    /// Builds the class descriptor.
    pub fn build(self) -> ClassDescriptor {
        self.class
    }
}

/// Shared fluent setters for element declarations.
macro_rules! element_setters {
    ($field:ident) => {
        /// Adds a constraint.
        pub fn constraint(mut self, constraint: ConstraintAnnotation) -> Self {
            self.$field.constraints.push(constraint);
            self
        }

        /// Marks the element as cascaded.
        pub fn valid(mut self) -> Self {
            self.$field.cascade = true;
            self
        }

        /// Adds a group conversion for the cascade.
        pub fn convert_group(mut self, from: impl Into<Group>, to: impl Into<Group>) -> Self {
            self.$field
                .group_conversions
                .push(GroupConversion::new(from, to));
            self
        }

        /// Adds a type-argument declaration.
        pub fn container_element(mut self, element: ContainerElementDecl) -> Self {
            self.$field.container_elements.push(element);
            self
        }
    };
}

/// Builder for creating a `FieldDecl`.
///
/// # Example
///
/// ```rust
/// use constraints_core::{ConstraintAnnotation, ContainerElementDecl, FieldBuilder, TypeRef};
///
/// let names = FieldBuilder::new("names", TypeRef::list(TypeRef::Text))
///     .container_element(
///         ContainerElementDecl::new(0).constraint(ConstraintAnnotation::new("NotBlank")),
///     )
///     .valid()
///     .build();
/// assert!(names.element.cascade);
/// ```
#[derive(Debug)]
pub struct FieldBuilder {
    name: String,
    declared_type: TypeRef,
    element: ElementDecl,
}

impl FieldBuilder {
    /// Creates a new field builder.
    ///
    /// # Arguments
    ///
    /// * `name` - Field name
    /// * `declared_type` - Declared type of the field
    pub fn new(name: impl Into<String>, declared_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            declared_type,
            element: ElementDecl::default(),
        }
    }

    element_setters!(element);

    /// Builds the field.
    pub fn build(self) -> FieldDecl {
        FieldDecl {
            name: self.name,
            declared_type: self.declared_type,
            element: self.element,
        }
    }
}

/// Builder for creating a `ParameterDecl`.
#[derive(Debug)]
pub struct ParameterBuilder {
    name: Option<String>,
    declared_type: TypeRef,
    element: ElementDecl,
}

impl ParameterBuilder {
    /// Creates a new parameter builder.
    pub fn new(declared_type: TypeRef) -> Self {
        Self {
            name: None,
            declared_type,
            element: ElementDecl::default(),
        }
    }

    /// Sets the declared parameter name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    element_setters!(element);

    /// Builds the parameter.
    pub fn build(self) -> ParameterDecl {
        ParameterDecl {
            name: self.name,
            declared_type: self.declared_type,
            element: self.element,
        }
    }
}

/// Builder for creating an `ExecutableDecl`.
///
/// # Example
///
/// ```rust
/// use constraints_core::{ConstraintAnnotation, MethodBuilder, ParameterBuilder, TypeRef};
///
/// let place = MethodBuilder::method("placeOrder")
///     .parameter(
///         ParameterBuilder::new(TypeRef::Text)
///             .constraint(ConstraintAnnotation::new("NotNull"))
///             .build(),
///     )
///     .returns(TypeRef::bean("Order"))
///     .return_valid()
///     .build();
/// assert_eq!(place.signature().to_string(), "placeOrder(Text)");
/// ```
#[derive(Debug)]
pub struct MethodBuilder {
    executable: ExecutableDecl,
}

impl MethodBuilder {
    /// Starts a void method with no parameters.
    pub fn method(name: impl Into<String>) -> Self {
        Self {
            executable: ExecutableDecl {
                kind: ExecutableKind::Method,
                name: name.into(),
                parameters: Vec::new(),
                return_type: None,
                return_value: ElementDecl::default(),
                cross_parameter: Vec::new(),
            },
        }
    }

    /// Starts a getter returning `return_type`.
    pub fn getter(name: impl Into<String>, return_type: TypeRef) -> Self {
        Self::method(name).returns(return_type)
    }

    /// Starts a constructor of `class`.
    pub fn constructor(class: impl Into<String>) -> Self {
        let mut builder = Self::method(class);
        builder.executable.kind = ExecutableKind::Constructor;
        builder
    }

    /// Adds a parameter.
    pub fn parameter(mut self, parameter: ParameterDecl) -> Self {
        self.executable.parameters.push(parameter);
        self
    }

    /// Sets the return type.
    pub fn returns(mut self, return_type: TypeRef) -> Self {
        self.executable.return_type = Some(return_type);
        self
    }

    /// Adds a return value constraint.
    pub fn return_constraint(mut self, constraint: ConstraintAnnotation) -> Self {
        self.executable.return_value.constraints.push(constraint);
        self
    }

    /// Marks the return value as cascaded.
    pub fn return_valid(mut self) -> Self {
        self.executable.return_value.cascade = true;
        self
    }

    /// Adds a group conversion on the cascaded return value.
    pub fn return_convert_group(mut self, from: impl Into<Group>, to: impl Into<Group>) -> Self {
        self.executable
            .return_value
            .group_conversions
            .push(GroupConversion::new(from, to));
        self
    }

    /// Adds a type-argument declaration on the return value.
    pub fn return_container_element(mut self, element: ContainerElementDecl) -> Self {
        self.executable.return_value.container_elements.push(element);
        self
    }

    /// Adds a cross-parameter constraint.
    pub fn cross_parameter(mut self, constraint: ConstraintAnnotation) -> Self {
        self.executable.cross_parameter.push(constraint);
        self
    }

    /// Builds the executable.
    pub fn build(self) -> ExecutableDecl {
        self.executable
    }
}
