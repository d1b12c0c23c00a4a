//! Discriminator mappings for polymorphic models and wrappers.

use super::analysis::discriminator_target;
use super::Resolver;
use crate::diagnostics::Diagnostic;
use crate::document::{component_schema_name, Discriminator, Schema};
use crate::ir::{ClassId, DiscriminatorInfo, TypeRef};

pub const SCALAR_WRAPPER_DISCRIMINATOR: &str = "ScalarWrapperDiscriminator";

impl<'a, 'd> Resolver<'a, 'd> {
    pub(super) fn resolve_discriminators(&mut self) {
        let mut ids: Vec<(ClassId, &'a Schema)> =
            self.schemas.iter().map(|(id, schema)| (*id, *schema)).collect();
        ids.sort_by_key(|(id, _)| *id);

        for (id, schema) in ids {
            let info = if self.model.class(id).is_wrapper() {
                self.wrapper_discriminator(id, schema)
            } else {
                self.model_discriminator(id)
            };
            if let Some(info) = info {
                log::trace!(
                    "{} discriminates on '{}' with {} mappings",
                    self.model.class(id).name,
                    info.property_name,
                    info.len()
                );
                self.model.class_mut(id).discriminator = Some(info);
            }
        }
    }

    /// The class's own discriminator or the nearest ancestor's, with its declaring class
    fn declared_discriminator(&self, id: ClassId) -> Option<(ClassId, &'a Discriminator)> {
        std::iter::once(id)
            .chain(self.model.ancestors(id))
            .find_map(|candidate| {
                self.schemas
                    .get(&candidate)
                    .copied()
                    .and_then(|schema: &'a Schema| schema.discriminator.as_ref())
                    .filter(|d| !d.property_name.is_empty())
                    .map(|d| (candidate, d))
            })
    }

    fn model_discriminator(&self, id: ClassId) -> Option<DiscriminatorInfo> {
        let (_, declared) = self.declared_discriminator(id)?;
        let mut info = DiscriminatorInfo::new(declared.property_name.clone());

        // Own mapping first, the declaring ancestor's otherwise
        let own_mapping = self
            .schemas
            .get(&id)
            .and_then(|s| s.discriminator.as_ref())
            .filter(|d| !d.mapping.is_empty());
        let explicit = own_mapping.unwrap_or(declared);
        for (value, target) in &explicit.mapping {
            let Some(type_ref) = self.mapping_target(target) else {
                continue;
            };
            if let Some(target_id) = type_ref.class_id() {
                if target_id != id && self.model.inherits_from(target_id, id) {
                    info.add_mapping(value.clone(), type_ref);
                }
            }
        }

        for descendant in self.model.descendants(id) {
            let already_mapped = info
                .mappings()
                .iter()
                .any(|(_, t)| t.class_id() == Some(descendant));
            if already_mapped {
                continue;
            }
            if let Some(name) = self.component_of.get(&descendant) {
                let target = self.model.class(descendant);
                info.add_mapping(*name, TypeRef::class(target.name.clone(), descendant));
            }
        }
        Some(info)
    }

    fn wrapper_discriminator(&mut self, id: ClassId, schema: &'a Schema) -> Option<DiscriminatorInfo> {
        let declared = schema
            .discriminator
            .as_ref()
            .filter(|d| !d.property_name.is_empty())?;
        let class = self.model.class(id);
        let scalar_only = class
            .composed_type
            .as_ref()
            .map(|c| c.is_scalar_only())
            .unwrap_or(true);
        if scalar_only {
            let message = format!(
                "{} only wraps scalar types, its discriminator '{}' is ignored",
                class.name, declared.property_name
            );
            self.report(Diagnostic::warning(SCALAR_WRAPPER_DISCRIMINATOR, message));
            return None;
        }

        let mut info = DiscriminatorInfo::new(declared.property_name.clone());
        if !declared.mapping.is_empty() {
            for (value, target) in &declared.mapping {
                if let Some(type_ref) = self.mapping_target(target) {
                    info.add_mapping(value.clone(), type_ref);
                }
            }
        } else {
            for member in schema.one_of.iter().chain(&schema.any_of) {
                let Some(name) = member.reference.as_deref().and_then(component_schema_name) else {
                    continue;
                };
                if let Some(type_ref) = self.mapping_target(&name) {
                    info.add_mapping(name, type_ref);
                }
            }
        }
        Some(info)
    }

    /// Concrete class named by a mapping value, skipping invalid or missing targets
    fn mapping_target(&self, value: &str) -> Option<TypeRef> {
        let name = discriminator_target(self.document, value)?;
        if self.analysis.is_poisoned(name) {
            return None;
        }
        self.components
            .get(name)
            .filter(|t| t.class_id().is_some() && !t.is_collection())
            .map(|t| t.clone().with_nullable(false))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{build, class_named};
    use super::SCALAR_WRAPPER_DISCRIMINATOR;
    use serde_json::json;

    #[test]
    fn test_inherited_discriminator_with_implicit_mappings() {
        let (model, _) = build(json!({
            "openapi": "3.0.0",
            "info": {"title": "t", "version": "1"},
            "paths": {},
            "components": {"schemas": {
                "Pet": {"type": "object", "required": ["petType"],
                    "properties": {"petType": {"type": "string"}},
                    "discriminator": {"propertyName": "petType", "mapping": {
                        "dog": "#/components/schemas/Dog"
                    }}},
                "Dog": {"allOf": [{"$ref": "#/components/schemas/Pet"}, {"properties": {"bark": {"type": "boolean"}}}]},
                "Cat": {"allOf": [{"$ref": "#/components/schemas/Pet"}, {"properties": {"meow": {"type": "boolean"}}}]},
                "Kitten": {"allOf": [{"$ref": "#/components/schemas/Cat"}, {"properties": {"age": {"type": "integer"}}}]}
            }}
        }));
        let pet = model.class(class_named(&model, "ApiSdk.models", "Pet"));
        let info = pet.discriminator.as_ref().unwrap();
        assert_eq!(info.property_name, "petType");
        let keys: Vec<_> = info.mappings().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["dog", "Cat", "Kitten"]);
        assert!(pet.emits_discriminator_switch());

        let cat = model.class(class_named(&model, "ApiSdk.models", "Cat"));
        let info = cat.discriminator.as_ref().unwrap();
        assert_eq!(info.property_name, "petType");
        assert_eq!(info.len(), 1);
        assert!(!cat.emits_discriminator_switch());

        let kitten = model.class(class_named(&model, "ApiSdk.models", "Kitten"));
        assert!(kitten.discriminator.as_ref().unwrap().is_empty());
    }

    #[test]
    fn test_wrapper_discriminator_mappings() {
        let (model, diagnostics) = build(json!({
            "openapi": "3.0.0",
            "info": {"title": "t", "version": "1"},
            "paths": {},
            "components": {"schemas": {
                "A": {"type": "object", "properties": {"type": {"type": "string"}}},
                "B": {"type": "object", "properties": {"type": {"type": "string"}}},
                "AOrB": {
                    "oneOf": [{"$ref": "#/components/schemas/A"}, {"$ref": "#/components/schemas/B"}],
                    "discriminator": {"propertyName": "type"}
                },
                "Scalars": {
                    "oneOf": [{"type": "string"}, {"type": "integer"}],
                    "discriminator": {"propertyName": "type"}
                }
            }}
        }));
        let wrapper = model.class(class_named(&model, "ApiSdk.models", "AOrB"));
        let info = wrapper.discriminator.as_ref().unwrap();
        assert_eq!(info.property_name, "type");
        let keys: Vec<_> = info.mappings().iter().map(|(k, t)| (k.as_str(), t.name.as_str())).collect();
        assert_eq!(keys, [("A", "A"), ("B", "B")]);
        assert!(!wrapper.emits_discriminator_switch());

        let scalars = model.class(class_named(&model, "ApiSdk.models", "Scalars"));
        assert!(scalars.discriminator.is_none());
        assert!(diagnostics.contains_code(SCALAR_WRAPPER_DISCRIMINATOR));
    }
}
