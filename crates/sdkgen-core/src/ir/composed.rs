//! Union and intersection wrappers, and the member selection policy used by
//! their generated deserializers.

use super::{
    ClassId, CodeModel, CollectionKind, DiscriminatorInfo, Primitive, PropertyKind, TypeDefinition,
    TypeRef,
};

// External imports (alphabetized)
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComposedKind {
    /// `oneOf`: exactly one member describes the payload
    Union,
    /// `anyOf`: one or more members describe the payload
    Intersection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedType {
    pub kind: ComposedKind,
    /// Members in declaration order
    pub members: Vec<TypeRef>,
}

impl ComposedType {
    pub fn new(kind: ComposedKind) -> Self {
        Self {
            kind,
            members: Vec::new(),
        }
    }

    /// Whether every member is a primitive or a collection of primitives
    pub fn is_scalar_only(&self) -> bool {
        self.members.iter().all(|m| m.as_primitive().is_some())
    }

    /// Pick the member a payload deserializes into.
    ///
    /// The discriminator value, when present and mapped, decides. Otherwise
    /// the first member in declaration order whose structure accepts the
    /// payload is returned.
    pub fn select_member(
        &self,
        model: &CodeModel,
        discriminator: Option<&DiscriminatorInfo>,
        payload: &JsonValue,
    ) -> Option<TypeRef> {
        if let Some(info) = discriminator {
            let mapped = payload
                .get(&info.property_name)
                .and_then(JsonValue::as_str)
                .and_then(|value| info.mapping(value));
            if let Some(type_ref) = mapped {
                return Some(type_ref.clone());
            }
        }
        self.members
            .iter()
            .find(|member| accepts(model, member, payload))
            .cloned()
    }
}

/// Structural check of a JSON value against a type reference
pub fn accepts(model: &CodeModel, type_ref: &TypeRef, value: &JsonValue) -> bool {
    accepts_value(model, type_ref, value, &mut Vec::new())
}

/// `wrappers` holds the wrapper classes already being tried for this same
/// value; nested values start over with an empty list.
fn accepts_value(
    model: &CodeModel,
    type_ref: &TypeRef,
    value: &JsonValue,
    wrappers: &mut Vec<ClassId>,
) -> bool {
    if value.is_null() {
        return type_ref.nullable;
    }
    match type_ref.collection {
        CollectionKind::Array => {
            let element = type_ref.element();
            return value
                .as_array()
                .map(|items| items.iter().all(|i| i.is_null() || accepts(model, &element, i)))
                .unwrap_or(false);
        }
        CollectionKind::ComposedOfMultiple => {
            let inner = type_ref.element().into_collection();
            return value
                .as_array()
                .map(|items| items.iter().all(|i| accepts(model, &inner, i)))
                .unwrap_or(false);
        }
        CollectionKind::None => {}
    }
    if let Some(primitive) = type_ref.as_primitive() {
        return accepts_primitive(primitive, value);
    }
    match type_ref.definition {
        Some(TypeDefinition::Enum(id)) => value
            .as_str()
            .map(|s| model.enumeration(id).has_wire_value(s))
            .unwrap_or(false),
        Some(TypeDefinition::Class(id)) => accepts_class(model, id, value, wrappers),
        None => false,
    }
}

fn accepts_primitive(primitive: Primitive, value: &JsonValue) -> bool {
    match primitive {
        Primitive::Untyped => true,
        Primitive::Void => value.is_null(),
        Primitive::Boolean => value.is_boolean(),
        p if p.is_integral() => value.is_i64() || value.is_u64(),
        p if p.is_numeric() => value.is_number(),
        p if p.is_string_like() => value.is_string(),
        _ => false,
    }
}

fn accepts_class(model: &CodeModel, id: ClassId, value: &JsonValue, wrappers: &mut Vec<ClassId>) -> bool {
    let class = model.class(id);
    if let Some(composed) = &class.composed_type {
        // A wrapper reached again for the same value is a self-referencing union
        if wrappers.contains(&id) {
            return false;
        }
        wrappers.push(id);
        let accepted = composed
            .members
            .iter()
            .any(|m| accepts_value(model, m, value, wrappers));
        wrappers.pop();
        return accepted;
    }
    let Some(object) = value.as_object() else {
        return false;
    };
    let mut hierarchy = vec![id];
    hierarchy.extend(model.ancestors(id));
    let open = hierarchy
        .iter()
        .any(|c| model.class(*c).has_property_of_kind(PropertyKind::AdditionalData));
    object.iter().all(|(key, item)| {
        let declared = hierarchy
            .iter()
            .find_map(|c| model.class(*c).property_by_wire_name(key));
        match declared {
            Some(property) => item.is_null() || accepts(model, &property.type_ref, item),
            None => open,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Class, ClassKind, Property};
    use serde_json::json;

    fn closed_model(model: &mut CodeModel, name: &str, fields: &[(&str, Primitive)]) -> TypeRef {
        let ns = model.add_namespace("ApiSdk.models");
        let mut class = Class::new(name, ClassKind::Model);
        for (field, primitive) in fields {
            class.add_property(Property::new(
                *field,
                PropertyKind::Custom,
                TypeRef::primitive(*primitive),
            ));
        }
        let id = model.add_class(ns, class).unwrap();
        TypeRef::class(name, id)
    }

    #[test]
    fn test_first_structural_match_wins() {
        let mut model = CodeModel::new();
        let a = closed_model(&mut model, "A", &[("name", Primitive::String)]);
        let b = closed_model(&mut model, "B", &[("name", Primitive::String), ("age", Primitive::Integer)]);
        let composed = ComposedType {
            kind: ComposedKind::Union,
            members: vec![a, b, TypeRef::primitive(Primitive::String)],
        };

        let both = json!({"name": "x"});
        assert_eq!(composed.select_member(&model, None, &both).unwrap().name, "A");

        let only_b = json!({"name": "x", "age": 3});
        assert_eq!(composed.select_member(&model, None, &only_b).unwrap().name, "B");

        let scalar = json!("plain");
        assert_eq!(composed.select_member(&model, None, &scalar).unwrap().name, "string");

        assert!(composed.select_member(&model, None, &json!(true)).is_none());
    }

    #[test]
    fn test_discriminator_takes_precedence() {
        let mut model = CodeModel::new();
        let a = closed_model(&mut model, "A", &[("kind", Primitive::String)]);
        let b = closed_model(&mut model, "B", &[("kind", Primitive::String)]);
        let composed = ComposedType {
            kind: ComposedKind::Union,
            members: vec![a.clone(), b.clone()],
        };
        let mut info = DiscriminatorInfo::new("kind");
        info.add_mapping("a", a);
        info.add_mapping("b", b);

        let payload = json!({"kind": "b"});
        assert_eq!(composed.select_member(&model, Some(&info), &payload).unwrap().name, "B");
        let unmapped = json!({"kind": "c"});
        assert_eq!(composed.select_member(&model, Some(&info), &unmapped).unwrap().name, "A");
    }

    #[test]
    fn test_collections_and_scalars() {
        let model = CodeModel::new();
        let ints = TypeRef::primitive(Primitive::Integer).into_collection();
        assert!(accepts(&model, &ints, &json!([1, 2])));
        assert!(!accepts(&model, &ints, &json!([1, "x"])));
        let nested = ints.clone().into_collection();
        assert!(accepts(&model, &nested, &json!([[1], [2, 3]])));
        assert!(!accepts(&model, &TypeRef::primitive(Primitive::Integer), &json!(1.5)));
        assert!(accepts(&model, &TypeRef::primitive(Primitive::Double), &json!(1)));
    }

    #[test]
    fn test_self_referencing_wrapper_terminates() {
        let mut model = CodeModel::new();
        let ns = model.add_namespace("ApiSdk.models");
        let id = model.add_class(ns, Class::new("Tree", ClassKind::Model)).unwrap();
        let tree = TypeRef::class("Tree", id);
        let composed = ComposedType {
            kind: ComposedKind::Union,
            members: vec![tree.clone(), TypeRef::primitive(Primitive::String)],
        };
        model.class_mut(id).composed_type = Some(composed.clone());

        assert!(composed.select_member(&model, None, &json!(true)).is_none());
        assert!(!accepts(&model, &tree, &json!(true)));
        let chosen = composed.select_member(&model, None, &json!("leaf")).unwrap();
        assert_eq!(chosen.name, "Tree");
    }
}
