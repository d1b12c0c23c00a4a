//! Language-agnostic code model of a generated SDK.
//!
//! Every node belongs to exactly one container. The tree is stored in an
//! arena ([`CodeModel`]) and nodes refer to each other through typed ids, so
//! back-references never own anything.
//!
//! # Examples
//!
//! ```
//! use sdkgen_core::ir::{Class, ClassKind, CodeModel};
//!
//! let mut model = CodeModel::new();
//! let ns = model.add_namespace("ApiSdk.models");
//! assert_eq!(model.add_namespace("ApiSdk.models"), ns);
//!
//! model.add_class(ns, Class::new("User", ClassKind::Model)).unwrap();
//! assert!(model.add_class(ns, Class::new("user", ClassKind::Model)).is_err());
//! ```

pub mod class;
pub mod composed;
pub mod discriminator;
pub mod documentation;
pub mod enumeration;
pub mod indexer;
pub mod method;
pub mod namespace;
pub mod property;
pub mod types;

pub use class::{Class, ClassKind, Parent, Using};
pub use composed::{ComposedKind, ComposedType};
pub use discriminator::DiscriminatorInfo;
pub use documentation::{Deprecation, Documentation};
pub use enumeration::{Enum, EnumOption};
pub use indexer::Indexer;
pub use method::{Method, MethodKind, Parameter, ParameterKind};
pub use namespace::Namespace;
pub use property::{Access, Property, PropertyKind};
pub use types::{Abstraction, CollectionKind, Primitive, TypeDefinition, TypeRef};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceId(pub(crate) usize);

impl NamespaceId {
    pub const ROOT: NamespaceId = NamespaceId(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnumId(pub(crate) usize);

/// Arena holding the whole tree
#[derive(Debug, Clone)]
pub struct CodeModel {
    namespaces: Vec<Namespace>,
    classes: Vec<Class>,
    enums: Vec<Enum>,
}

impl Default for CodeModel {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeModel {
    pub fn new() -> Self {
        Self {
            namespaces: vec![Namespace::new(String::new(), None)],
            classes: Vec::new(),
            enums: Vec::new(),
        }
    }

    pub fn root(&self) -> NamespaceId {
        NamespaceId::ROOT
    }

    /// Return the namespace with this dotted name, creating missing segments
    pub fn add_namespace(&mut self, dotted: &str) -> NamespaceId {
        let mut current = NamespaceId::ROOT;
        let mut prefix = String::new();
        for segment in dotted.split('.').filter(|s| !s.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(segment);
            let existing = self.namespaces[current.0]
                .namespaces
                .iter()
                .copied()
                .find(|child| self.namespaces[child.0].name == prefix);
            current = match existing {
                Some(child) => child,
                None => {
                    let id = NamespaceId(self.namespaces.len());
                    self.namespaces
                        .push(Namespace::new(prefix.clone(), Some(current)));
                    self.namespaces[current.0].namespaces.push(id);
                    id
                }
            };
        }
        current
    }

    pub fn find_namespace(&self, dotted: &str) -> Option<NamespaceId> {
        self.namespaces
            .iter()
            .position(|ns| ns.name == dotted)
            .map(NamespaceId)
    }

    pub fn namespace(&self, id: NamespaceId) -> &Namespace {
        &self.namespaces[id.0]
    }

    pub fn namespaces(&self) -> impl Iterator<Item = (NamespaceId, &Namespace)> {
        self.namespaces
            .iter()
            .enumerate()
            .map(|(i, ns)| (NamespaceId(i), ns))
    }

    /// Declare a class directly in a namespace
    pub fn add_class(&mut self, namespace: NamespaceId, mut class: Class) -> Result<ClassId> {
        if let Some(existing) = self.find_type(namespace, &class.name) {
            return Err(Error::NameCollision {
                name: format!("{} (already {})", class.name, self.definition_name(existing)),
                container: self.container_name(namespace),
            });
        }
        let id = ClassId(self.classes.len());
        class.attach(Parent::Namespace(namespace), namespace);
        log::trace!("declaring class {} in {}", class.name, self.container_name(namespace));
        self.classes.push(class);
        self.namespaces[namespace.0].classes.push(id);
        Ok(id)
    }

    /// Declare a class nested in another one
    pub fn add_inner_class(&mut self, outer: ClassId, mut class: Class) -> Result<ClassId> {
        if self.find_inner_class(outer, &class.name).is_some() {
            return Err(Error::NameCollision {
                name: class.name,
                container: self.classes[outer.0].name.clone(),
            });
        }
        let id = ClassId(self.classes.len());
        let namespace = self.classes[outer.0].namespace();
        class.attach(Parent::Class(outer), namespace);
        self.classes.push(class);
        self.classes[outer.0].push_inner_class(id);
        Ok(id)
    }

    pub fn add_enum(&mut self, namespace: NamespaceId, mut enumeration: Enum) -> Result<EnumId> {
        if let Some(existing) = self.find_type(namespace, &enumeration.name) {
            return Err(Error::NameCollision {
                name: format!("{} (already {})", enumeration.name, self.definition_name(existing)),
                container: self.container_name(namespace),
            });
        }
        let id = EnumId(self.enums.len());
        enumeration.attach(namespace);
        self.enums.push(enumeration);
        self.namespaces[namespace.0].enums.push(id);
        Ok(id)
    }

    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.0]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut Class {
        &mut self.classes[id.0]
    }

    pub fn enumeration(&self, id: EnumId) -> &Enum {
        &self.enums[id.0]
    }

    pub fn enumeration_mut(&mut self, id: EnumId) -> &mut Enum {
        &mut self.enums[id.0]
    }

    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &Class)> {
        self.classes.iter().enumerate().map(|(i, c)| (ClassId(i), c))
    }

    pub fn class_ids(&self) -> Vec<ClassId> {
        (0..self.classes.len()).map(ClassId).collect()
    }

    pub fn enums(&self) -> impl Iterator<Item = (EnumId, &Enum)> {
        self.enums.iter().enumerate().map(|(i, e)| (EnumId(i), e))
    }

    /// Case-insensitive lookup of a type declared directly in a namespace
    pub fn find_type(&self, namespace: NamespaceId, name: &str) -> Option<TypeDefinition> {
        let ns = &self.namespaces[namespace.0];
        ns.classes
            .iter()
            .find(|id| self.classes[id.0].name.eq_ignore_ascii_case(name))
            .map(|id| TypeDefinition::Class(*id))
            .or_else(|| {
                ns.enums
                    .iter()
                    .find(|id| self.enums[id.0].name.eq_ignore_ascii_case(name))
                    .map(|id| TypeDefinition::Enum(*id))
            })
    }

    pub fn find_inner_class(&self, outer: ClassId, name: &str) -> Option<ClassId> {
        self.classes[outer.0]
            .inner_classes()
            .iter()
            .copied()
            .find(|id| self.classes[id.0].name.eq_ignore_ascii_case(name))
    }

    /// A name free in the namespace, suffixed with a counter when taken
    pub fn unique_type_name(&self, namespace: NamespaceId, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut counter = 1;
        while self.find_type(namespace, &candidate).is_some() {
            candidate = format!("{}{}", base, counter);
            counter += 1;
        }
        candidate
    }

    pub fn definition_name(&self, definition: TypeDefinition) -> &str {
        match definition {
            TypeDefinition::Class(id) => &self.classes[id.0].name,
            TypeDefinition::Enum(id) => &self.enums[id.0].name,
        }
    }

    pub fn definition_namespace(&self, definition: TypeDefinition) -> NamespaceId {
        match definition {
            TypeDefinition::Class(id) => self.classes[id.0].namespace(),
            TypeDefinition::Enum(id) => self.enums[id.0].namespace(),
        }
    }

    /// Outermost class enclosing a possibly nested class
    pub fn top_level_class(&self, mut id: ClassId) -> ClassId {
        while let Parent::Class(outer) = self.classes[id.0].parent() {
            id = outer;
        }
        id
    }

    /// Dotted name including the namespace and any outer classes
    pub fn full_name(&self, definition: TypeDefinition) -> String {
        let mut segments = vec![self.definition_name(definition).to_string()];
        if let TypeDefinition::Class(mut id) = definition {
            while let Parent::Class(outer) = self.classes[id.0].parent() {
                segments.push(self.classes[outer.0].name.clone());
                id = outer;
            }
        }
        let namespace = &self.namespaces[self.definition_namespace(definition).0].name;
        if !namespace.is_empty() {
            segments.push(namespace.clone());
        }
        segments.reverse();
        segments.join(".")
    }

    /// Type reference pointing at a definition
    pub fn type_ref(&self, definition: TypeDefinition) -> TypeRef {
        TypeRef::internal(self.definition_name(definition), Some(definition))
    }

    /// Base classes from the direct parent up, stopping on a cycle
    pub fn ancestors(&self, id: ClassId) -> Vec<ClassId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(base) = self.classes[current.0]
            .base
            .as_ref()
            .and_then(TypeRef::class_id)
        {
            if base == id || result.contains(&base) {
                break;
            }
            result.push(base);
            current = base;
        }
        result
    }

    pub fn inherits_from(&self, id: ClassId, ancestor: ClassId) -> bool {
        self.ancestors(id).contains(&ancestor)
    }

    /// Classes deriving from `id`, directly or not, in arena order
    pub fn descendants(&self, id: ClassId) -> Vec<ClassId> {
        self.class_ids()
            .into_iter()
            .filter(|candidate| self.inherits_from(*candidate, id))
            .collect()
    }

    fn container_name(&self, namespace: NamespaceId) -> String {
        let name = &self.namespaces[namespace.0].name;
        if name.is_empty() {
            "<root>".to_string()
        } else {
            name.clone()
        }
    }

    /// Check the structural invariants of a fully resolved model
    pub fn verify(&self) -> Result<()> {
        for (id, class) in self.classes() {
            let owner = || self.full_name(TypeDefinition::Class(id));
            for type_ref in class.type_refs() {
                if type_ref.external {
                    continue;
                }
                let valid = match type_ref.definition {
                    Some(TypeDefinition::Class(target)) => target.0 < self.classes.len(),
                    Some(TypeDefinition::Enum(target)) => target.0 < self.enums.len(),
                    None => false,
                };
                if !valid {
                    return Err(Error::UnresolvedType {
                        name: type_ref.name.clone(),
                        owner: owner(),
                    });
                }
            }
            if let Some(discriminator) = &class.discriminator {
                for (value, target) in discriminator.mappings() {
                    if target.class_id().is_none() {
                        return Err(Error::UnresolvedType {
                            name: format!("{} (discriminator value '{}')", target.name, value),
                            owner: owner(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaces_are_idempotent() {
        let mut model = CodeModel::new();
        let a = model.add_namespace("ApiSdk.users.item");
        let b = model.add_namespace("ApiSdk.users.item");
        assert_eq!(a, b);
        let users = model.find_namespace("ApiSdk.users").unwrap();
        assert_eq!(model.namespace(a).parent(), Some(users));
        assert_eq!(model.namespace(a).segment(), "item");
        assert_eq!(model.add_namespace(""), model.root());
    }

    #[test]
    fn test_type_names_collide_case_insensitively() {
        let mut model = CodeModel::new();
        let ns = model.add_namespace("ApiSdk.models");
        model.add_enum(ns, Enum::new("Color")).unwrap();
        let err = model.add_class(ns, Class::new("COLOR", ClassKind::Model)).unwrap_err();
        assert!(matches!(err, Error::NameCollision { .. }));
        assert_eq!(model.unique_type_name(ns, "color"), "color1");
    }

    #[test]
    fn test_inner_classes_and_full_names() {
        let mut model = CodeModel::new();
        let ns = model.add_namespace("ApiSdk.users");
        let builder = model
            .add_class(ns, Class::new("UsersRequestBuilder", ClassKind::RequestBuilder))
            .unwrap();
        let inner = model
            .add_inner_class(
                builder,
                Class::new("UsersRequestBuilderGetQueryParameters", ClassKind::QueryParameterContainer),
            )
            .unwrap();
        assert_eq!(
            model.full_name(TypeDefinition::Class(inner)),
            "ApiSdk.users.UsersRequestBuilder.UsersRequestBuilderGetQueryParameters"
        );
        assert_eq!(model.top_level_class(inner), builder);
        assert_eq!(model.class(inner).namespace(), ns);
    }

    #[test]
    fn test_ancestors_stop_on_cycles() {
        let mut model = CodeModel::new();
        let ns = model.add_namespace("ApiSdk.models");
        let a = model.add_class(ns, Class::new("A", ClassKind::Model)).unwrap();
        let b = model.add_class(ns, Class::new("B", ClassKind::Model)).unwrap();
        model.class_mut(b).base = Some(TypeRef::class("A", a));
        model.class_mut(a).base = Some(TypeRef::class("B", b));
        assert_eq!(model.ancestors(b), vec![a]);
        assert!(model.inherits_from(b, a));
        assert_eq!(model.descendants(a), vec![b]);
    }

    #[test]
    fn test_verify_rejects_unresolved_internal_types() {
        let mut model = CodeModel::new();
        let ns = model.add_namespace("ApiSdk.models");
        let mut class = Class::new("User", ClassKind::Model);
        class.add_property(Property::new(
            "manager",
            PropertyKind::Custom,
            TypeRef::internal("Manager", None),
        ));
        model.add_class(ns, class).unwrap();
        let err = model.verify().unwrap_err();
        assert!(matches!(err, Error::UnresolvedType { ref name, .. } if name == "Manager"));
    }
}
