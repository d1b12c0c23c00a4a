//! Union (oneOf) and intersection (anyOf) wrapper classes.

use super::{InlineScope, Resolver};
use crate::document::Schema;
use crate::ir::{ClassId, ComposedKind, ComposedType, Property, PropertyKind, TypeRef};
use crate::naming::{cleanup_symbol_name, to_first_lower};
use crate::Result;

impl<'a, 'd> Resolver<'a, 'd> {
    /// One nullable property per member, in declaration order
    pub(super) fn populate_wrapper(&mut self, id: ClassId, schema: &'a Schema, pointer: &str) -> Result<()> {
        let (kind, keyword, members) = if !schema.one_of.is_empty() {
            (ComposedKind::Union, "oneOf", &schema.one_of)
        } else {
            (ComposedKind::Intersection, "anyOf", &schema.any_of)
        };
        let wrapper_name = self.model.class(id).name.clone();
        let namespace = self.model.class(id).namespace();

        let mut composed = ComposedType::new(kind);
        let mut inline_index = 0;
        for (index, member) in members.iter().enumerate() {
            if member.is_null_only() {
                continue;
            }
            let member_pointer = format!("{}/{}/{}", pointer, keyword, index);
            let scope = if member.declares_type() {
                inline_index += 1;
                InlineScope::new(namespace, format!("{}Member{}", wrapper_name, inline_index))
            } else {
                InlineScope::new(namespace, wrapper_name.clone())
            };
            let type_ref = self
                .resolve_schema(member, &scope, &member_pointer)?
                .with_nullable(false);
            composed.members.push(type_ref.clone());

            let name = to_first_lower(&cleanup_symbol_name(&member_label(&type_ref)));
            self.add_unique_property(
                id,
                Property::new(name, PropertyKind::Custom, type_ref.with_nullable(true)),
            );
        }
        log::trace!(
            "{} wraps {} members ({:?})",
            wrapper_name,
            composed.members.len(),
            kind
        );
        self.model.class_mut(id).composed_type = Some(composed);
        Ok(())
    }
}

/// Base for the property name of a wrapper member
fn member_label(type_ref: &TypeRef) -> String {
    if type_ref.is_collection() {
        format!("{}Collection", type_ref.name)
    } else {
        type_ref.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{build, class_named};
    use crate::ir::{ComposedKind, PropertyKind};
    use serde_json::json;

    #[test]
    fn test_union_wrapper_members() {
        let (model, _) = build(json!({
            "openapi": "3.0.0",
            "info": {"title": "t", "version": "1"},
            "paths": {},
            "components": {"schemas": {
                "A": {"type": "object", "properties": {"a": {"type": "string"}}},
                "B": {"type": "object", "properties": {"b": {"type": "string"}}},
                "AOrB": {"oneOf": [
                    {"$ref": "#/components/schemas/A"},
                    {"$ref": "#/components/schemas/B"},
                    {"type": "string"},
                    {"type": "object", "properties": {"c": {"type": "integer"}}}
                ]},
                "Either": {"anyOf": [{"type": "string"}, {"type": "integer"}]},
                "MaybeA": {"oneOf": [{"$ref": "#/components/schemas/A"}, {"type": "null"}]}
            }}
        }));
        let wrapper = model.class(class_named(&model, "ApiSdk.models", "AOrB"));
        let composed = wrapper.composed_type.as_ref().unwrap();
        assert_eq!(composed.kind, ComposedKind::Union);
        let members: Vec<_> = composed.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(members, ["A", "B", "string", "AOrBMember1"]);
        let names: Vec<_> = wrapper
            .properties()
            .iter()
            .filter(|p| p.kind == PropertyKind::Custom)
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, ["a", "b", "string", "aOrBMember1"]);
        assert!(wrapper.properties().iter().all(|p| p.type_ref.nullable));
        assert!(!wrapper.has_property_of_kind(PropertyKind::AdditionalData));

        let either = model.class(class_named(&model, "ApiSdk.models", "Either"));
        let either = either.composed_type.as_ref().unwrap();
        assert_eq!(either.kind, ComposedKind::Intersection);
        assert!(either.is_scalar_only());

        let ns = model.find_namespace("ApiSdk.models").unwrap();
        assert!(model.find_type(ns, "MaybeA").is_none());
    }
}
