//! Classes: models, request builders and their inner helper types.

use super::{
    ClassId, ComposedType, Deprecation, DiscriminatorInfo, Documentation, Indexer, Method,
    NamespaceId, Property, PropertyKind, TypeDefinition, TypeRef,
};

/// What a class is generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Model,
    RequestBuilder,
    QueryParameterContainer,
    RequestConfiguration,
    Custom,
}

/// Owner of a class in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parent {
    Namespace(NamespaceId),
    Class(ClassId),
}

/// Import required by a class
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Using {
    pub name: String,
    /// Declaring namespace of a generated type
    pub namespace: Option<String>,
    pub external: bool,
    pub definition: Option<TypeDefinition>,
}

impl Using {
    pub fn external(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            external: true,
            definition: None,
        }
    }

    pub fn relative(
        name: impl Into<String>,
        namespace: impl Into<String>,
        definition: TypeDefinition,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: Some(namespace.into()),
            external: false,
            definition: Some(definition),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub name: String,
    pub kind: ClassKind,
    pub documentation: Documentation,
    pub deprecation: Option<Deprecation>,
    pub base: Option<TypeRef>,
    /// Used as the target of an error mapping
    pub is_error_definition: bool,
    /// Present on synthesized union and intersection wrappers
    pub composed_type: Option<ComposedType>,
    pub discriminator: Option<DiscriminatorInfo>,
    parent: Parent,
    namespace: NamespaceId,
    implements: Vec<TypeRef>,
    usings: Vec<Using>,
    properties: Vec<Property>,
    methods: Vec<Method>,
    indexers: Vec<Indexer>,
    inner_classes: Vec<ClassId>,
}

impl Class {
    pub fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            documentation: Documentation::default(),
            deprecation: None,
            base: None,
            is_error_definition: false,
            composed_type: None,
            discriminator: None,
            parent: Parent::Namespace(NamespaceId::ROOT),
            namespace: NamespaceId::ROOT,
            implements: Vec::new(),
            usings: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            indexers: Vec::new(),
            inner_classes: Vec::new(),
        }
    }

    pub fn parent(&self) -> Parent {
        self.parent
    }

    /// Namespace the class is declared in, through its outer class if nested
    pub fn namespace(&self) -> NamespaceId {
        self.namespace
    }

    pub fn is_inner(&self) -> bool {
        matches!(self.parent, Parent::Class(_))
    }

    pub(super) fn attach(&mut self, parent: Parent, namespace: NamespaceId) {
        self.parent = parent;
        self.namespace = namespace;
    }

    pub(super) fn push_inner_class(&mut self, id: ClassId) {
        self.inner_classes.push(id);
    }

    pub fn implements(&self) -> &[TypeRef] {
        &self.implements
    }

    pub fn add_implements(&mut self, type_ref: TypeRef) -> bool {
        if self.implements.iter().any(|t| t.name == type_ref.name) {
            return false;
        }
        self.implements.push(type_ref);
        true
    }

    pub fn usings(&self) -> &[Using] {
        &self.usings
    }

    pub fn add_using(&mut self, using: Using) -> bool {
        if self.usings.contains(&using) {
            return false;
        }
        self.usings.push(using);
        true
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut [Property] {
        &mut self.properties
    }

    /// Add a property unless one with the same name (case-insensitive) exists
    pub fn add_property(&mut self, property: Property) -> bool {
        if self.property(&property.name).is_some() {
            return false;
        }
        self.properties.push(property);
        true
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn property_by_wire_name(&self, wire_name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.kind.is_serialized() && p.wire_name() == wire_name)
    }

    pub fn has_property_of_kind(&self, kind: PropertyKind) -> bool {
        self.properties.iter().any(|p| p.kind == kind)
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn methods_mut(&mut self) -> &mut [Method] {
        &mut self.methods
    }

    /// Add a method unless one with the same name, kind and arity exists
    pub fn add_method(&mut self, method: Method) -> bool {
        if self.methods.iter().any(|m| {
            m.kind == method.kind
                && m.name.eq_ignore_ascii_case(&method.name)
                && m.parameters.len() == method.parameters.len()
        }) {
            return false;
        }
        self.methods.push(method);
        true
    }

    pub fn indexers(&self) -> &[Indexer] {
        &self.indexers
    }

    pub fn add_indexer(&mut self, indexer: Indexer) -> bool {
        if self
            .indexers
            .iter()
            .any(|i| i.name.eq_ignore_ascii_case(&indexer.name))
        {
            return false;
        }
        self.indexers.push(indexer);
        true
    }

    pub fn inner_classes(&self) -> &[ClassId] {
        &self.inner_classes
    }

    pub fn is_wrapper(&self) -> bool {
        self.composed_type.is_some()
    }

    /// Factories switch on the discriminator only with two targets or more
    pub fn emits_discriminator_switch(&self) -> bool {
        !self.is_wrapper()
            && self
                .discriminator
                .as_ref()
                .map(|d| d.len() >= 2)
                .unwrap_or(false)
    }

    /// Every type reference held by the class and its members
    pub fn type_refs(&self) -> Vec<&TypeRef> {
        let mut refs: Vec<&TypeRef> = Vec::new();
        refs.extend(self.base.iter());
        refs.extend(self.implements.iter());
        refs.extend(self.properties.iter().map(|p| &p.type_ref));
        for method in &self.methods {
            refs.push(&method.return_type);
            refs.extend(method.parameters.iter().map(|p| &p.type_ref));
            refs.extend(method.error_mappings().iter().map(|(_, t)| t));
        }
        for indexer in &self.indexers {
            refs.push(&indexer.index_type);
            refs.push(&indexer.return_type);
        }
        if let Some(composed) = &self.composed_type {
            refs.extend(composed.members.iter());
        }
        if let Some(discriminator) = &self.discriminator {
            refs.extend(discriminator.mappings().iter().map(|(_, t)| t));
        }
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Method, MethodKind, Primitive};

    fn string_property(name: &str) -> Property {
        Property::new(name, PropertyKind::Custom, TypeRef::primitive(Primitive::String))
    }

    #[test]
    fn test_property_names_are_unique_case_insensitively() {
        let mut class = Class::new("User", ClassKind::Model);
        assert!(class.add_property(string_property("name")));
        assert!(!class.add_property(string_property("Name")));
        assert_eq!(class.properties().len(), 1);
    }

    #[test]
    fn test_usings_and_implements_are_deduplicated() {
        let mut class = Class::new("User", ClassKind::Model);
        assert!(class.add_using(Using::external("Parsable")));
        assert!(!class.add_using(Using::external("Parsable")));
        assert!(class.add_implements(TypeRef::abstraction(crate::ir::Abstraction::Parsable)));
        assert!(!class.add_implements(TypeRef::abstraction(crate::ir::Abstraction::Parsable)));
    }

    #[test]
    fn test_switch_needs_two_mappings() {
        let mut class = Class::new("Entity", ClassKind::Model);
        let mut info = DiscriminatorInfo::new("kind");
        info.add_mapping("a", TypeRef::class("A", ClassId(1)));
        class.discriminator = Some(info.clone());
        assert!(!class.emits_discriminator_switch());

        info.add_mapping("b", TypeRef::class("B", ClassId(2)));
        class.discriminator = Some(info);
        assert!(class.emits_discriminator_switch());
    }

    #[test]
    fn test_methods_with_different_arity_coexist() {
        let mut class = Class::new("Builder", ClassKind::RequestBuilder);
        let void = TypeRef::primitive(Primitive::Void);
        assert!(class.add_method(Method::new("get", MethodKind::RequestExecutor, void.clone())));
        assert!(!class.add_method(Method::new("Get", MethodKind::RequestExecutor, void)));
    }
}
