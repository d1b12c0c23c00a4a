//! Properties of classes.

use super::{Deprecation, Documentation, TypeRef};

// External imports (alphabetized)
use serde_json::Value as JsonValue;

/// Visibility of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Access {
    #[default]
    Public,
    Protected,
    Private,
}

/// Role a property plays in the generated code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// A data member of a model
    Custom,
    RequestAdapter,
    PathParameters,
    UrlTemplate,
    AdditionalData,
    BackingStore,
    QueryParameter,
    Headers,
    Options,
    /// Navigation from one request builder to a child
    RequestBuilder,
}

impl PropertyKind {
    /// Properties the serializer reads and writes
    pub fn is_serialized(&self) -> bool {
        matches!(self, Self::Custom)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub kind: PropertyKind,
    pub type_ref: TypeRef,
    pub default_value: Option<JsonValue>,
    pub serialization_name: Option<String>,
    pub read_only: bool,
    /// Set when an ancestor declares the same member
    pub exists_in_base_type: bool,
    pub access: Access,
    pub documentation: Documentation,
    pub deprecation: Option<Deprecation>,
}

impl Property {
    pub fn new(name: impl Into<String>, kind: PropertyKind, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            kind,
            type_ref,
            default_value: None,
            serialization_name: None,
            read_only: false,
            exists_in_base_type: false,
            access: Access::Public,
            documentation: Documentation::default(),
            deprecation: None,
        }
    }

    /// Name on the wire, the property name unless overridden
    pub fn wire_name(&self) -> &str {
        self.serialization_name.as_deref().unwrap_or(&self.name)
    }

    pub fn with_documentation(mut self, documentation: Documentation) -> Self {
        self.documentation = documentation;
        self
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    pub fn with_serialization_name(mut self, wire_name: impl Into<String>) -> Self {
        let wire_name = wire_name.into();
        if wire_name != self.name {
            self.serialization_name = Some(wire_name);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Primitive;

    #[test]
    fn test_wire_name_defaults_to_name() {
        let property = Property::new("displayName", PropertyKind::Custom, TypeRef::primitive(Primitive::String));
        assert_eq!(property.wire_name(), "displayName");

        let renamed = property.with_serialization_name("display-name");
        assert_eq!(renamed.wire_name(), "display-name");

        let same = Property::new("id", PropertyKind::Custom, TypeRef::primitive(Primitive::String))
            .with_serialization_name("id");
        assert!(same.serialization_name.is_none());
    }
}
