//! Last pass: inherited member flags, usings and verification.

// Internal imports (std, crate)
use std::collections::HashSet;

use super::Resolver;
use crate::ir::{ClassId, CodeModel, NamespaceId, PropertyKind, TypeDefinition, TypeRef, Using};
use crate::Result;

impl<'a, 'd> Resolver<'a, 'd> {
    pub(super) fn finalize(mut self) -> Result<CodeModel> {
        self.mark_inherited_properties();
        self.add_usings();
        self.model.verify()?;
        log::debug!(
            "code model ready: {} classes, {} enums",
            self.model.classes().count(),
            self.model.enums().count()
        );
        Ok(self.model)
    }

    fn mark_inherited_properties(&mut self) {
        for id in self.model.class_ids() {
            let inherited: HashSet<String> = self
                .model
                .ancestors(id)
                .into_iter()
                .flat_map(|ancestor| {
                    self.model
                        .class(ancestor)
                        .properties()
                        .iter()
                        .filter(|p| p.kind == PropertyKind::Custom)
                        .map(|p| p.name.to_ascii_lowercase())
                        .collect::<Vec<_>>()
                })
                .collect();
            for property in self.model.class_mut(id).properties_mut() {
                property.exists_in_base_type = property.kind == PropertyKind::Custom
                    && inherited.contains(&property.name.to_ascii_lowercase());
            }
        }
    }

    /// Inner classes also contribute their usings to the enclosing top-level class
    fn add_usings(&mut self) {
        for id in self.model.class_ids() {
            let namespace = self.model.class(id).namespace();
            let usings: Vec<Using> = self
                .model
                .class(id)
                .type_refs()
                .into_iter()
                .filter_map(|type_ref| self.using_for(type_ref, namespace, id))
                .collect();
            let top = self.model.top_level_class(id);
            for using in usings {
                if top != id {
                    self.model.class_mut(top).add_using(using.clone());
                }
                self.model.class_mut(id).add_using(using);
            }
        }
    }

    fn using_for(&self, type_ref: &TypeRef, namespace: NamespaceId, owner: ClassId) -> Option<Using> {
        if type_ref.external {
            return (!type_ref.is_void()).then(|| Using::external(type_ref.name.clone()));
        }
        let definition = type_ref.definition?;
        if definition == TypeDefinition::Class(owner) {
            return None;
        }
        let declared_in = self.model.definition_namespace(definition);
        if declared_in == namespace {
            return None;
        }
        Some(Using::relative(
            self.model.definition_name(definition),
            self.model.namespace(declared_in).name.clone(),
            definition,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{build, class_named};
    use crate::ir::Abstraction;
    use serde_json::json;

    #[test]
    fn test_usings_cross_namespaces() {
        let (model, _) = build(json!({
            "openapi": "3.0.0",
            "info": {"title": "t", "version": "1"},
            "paths": {
                "/users": {"get": {"responses": {"200": {"description": "ok", "content": {
                    "application/json": {"schema": {"$ref": "#/components/schemas/User"}}
                }}}}}
            },
            "components": {"schemas": {
                "User": {"type": "object", "properties": {"id": {"type": "string"}}}
            }}
        }));
        let users = model.class(class_named(&model, "ApiSdk.users", "UsersRequestBuilder"));
        let user_using = users
            .usings()
            .iter()
            .find(|u| u.name == "User")
            .unwrap();
        assert!(!user_using.external);
        assert_eq!(user_using.namespace.as_deref(), Some("ApiSdk.models"));
        assert!(users
            .usings()
            .iter()
            .any(|u| u.external && u.name == Abstraction::RequestInformation.as_str()));
        // pulled up from the inner request configuration class
        assert!(users
            .usings()
            .iter()
            .any(|u| u.external && u.name == Abstraction::RequestHeaders.as_str()));

        let client = model.class(class_named(&model, "ApiSdk", "ApiClient"));
        assert!(client
            .usings()
            .iter()
            .any(|u| u.name == "UsersRequestBuilder" && u.namespace.as_deref() == Some("ApiSdk.users")));

        let user = model.class(class_named(&model, "ApiSdk.models", "User"));
        assert!(user.usings().iter().all(|u| u.external));
    }
}
