//! Schema objects of an API description.

// External imports (alphabetized)
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// `type` keyword; OpenAPI 3.1 allows a list such as `["string", "null"]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    Multiple(Vec<String>),
}

impl SchemaType {
    /// The first non-null type name
    pub fn primary(&self) -> Option<&str> {
        match self {
            Self::Single(name) => Some(name.as_str()).filter(|n| *n != "null"),
            Self::Multiple(names) => names.iter().map(String::as_str).find(|n| *n != "null"),
        }
    }

    pub fn includes_null(&self) -> bool {
        match self {
            Self::Single(name) => name == "null",
            Self::Multiple(names) => names.iter().any(|n| n == "null"),
        }
    }
}

/// `additionalProperties` is either a flag or a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<Schema>),
}

/// Discriminator object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Discriminator {
    #[serde(rename = "propertyName", default)]
    pub property_name: String,

    #[serde(default)]
    pub mapping: IndexMap<String, String>,
}

/// Schema object, reduced to the keywords the model compiler understands
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    #[serde(rename = "allOf", default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Schema>,

    #[serde(rename = "oneOf", default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Schema>,

    #[serde(rename = "anyOf", default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<Schema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Discriminator>,

    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enumeration: Vec<JsonValue>,

    #[serde(default)]
    pub nullable: bool,

    #[serde(rename = "readOnly", default)]
    pub read_only: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,

    #[serde(default)]
    pub deprecated: bool,

    /// Every keyword not modelled above, vendor extensions included
    #[serde(flatten)]
    pub extensions: IndexMap<String, JsonValue>,
}

/// Broad category a schema resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaShape<'a> {
    Reference(&'a str),
    Enum,
    Array,
    Object,
    Union,
    Intersection,
    Primitive,
    Untyped,
}

impl Schema {
    /// Shorthand used by tests and the resolver for `$ref`-only schemas
    pub fn reference_to(target: impl Into<String>) -> Self {
        Self {
            reference: Some(target.into()),
            ..Self::default()
        }
    }

    pub fn primary_type(&self) -> Option<&str> {
        self.schema_type.as_ref().and_then(SchemaType::primary)
    }

    /// Nullable through `nullable: true` or a `null` entry in `type`
    pub fn is_nullable(&self) -> bool {
        self.nullable
            || self
                .schema_type
                .as_ref()
                .map(SchemaType::includes_null)
                .unwrap_or(false)
    }

    /// A schema describing only the null value
    pub fn is_null_only(&self) -> bool {
        matches!(&self.schema_type, Some(SchemaType::Single(t)) if t == "null")
            || (self.nullable
                && self.schema_type.is_none()
                && self.reference.is_none()
                && self.properties.is_empty()
                && self.all_of.is_empty()
                && self.one_of.is_empty()
                && self.any_of.is_empty())
    }

    pub fn extension(&self, name: &str) -> Option<&JsonValue> {
        self.extensions.get(name)
    }

    /// Whether unknown properties are accepted on instances
    pub fn allows_additional_properties(&self) -> bool {
        !matches!(
            self.additional_properties,
            Some(AdditionalProperties::Allowed(false))
        )
    }

    /// String values of an enumerated schema, `null` and empty entries removed
    pub fn enum_values(&self) -> Vec<String> {
        self.enumeration
            .iter()
            .filter_map(|value| match value {
                JsonValue::String(s) if !s.is_empty() && s != "null" => Some(s.clone()),
                JsonValue::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect()
    }

    /// Flag enums use the `x-ms-enum-flags` extension
    pub fn is_flags_enum(&self) -> bool {
        self.extension("x-ms-enum-flags")
            .and_then(|v| v.get("isFlags"))
            .and_then(JsonValue::as_bool)
            .unwrap_or(false)
    }

    /// The single member of a two-member composition whose other member is only null
    pub fn collapse_nullable_composition(&self) -> Option<&Schema> {
        let members = if !self.one_of.is_empty() {
            &self.one_of
        } else {
            &self.any_of
        };
        if members.len() != 2 || !self.properties.is_empty() {
            return None;
        }
        match (members[0].is_null_only(), members[1].is_null_only()) {
            (true, false) => Some(&members[1]),
            (false, true) => Some(&members[0]),
            _ => None,
        }
    }

    /// Single-entry allOf without other keywords, an alias of its member
    pub fn single_all_of_alias(&self) -> Option<&Schema> {
        if self.all_of.len() == 1
            && self.properties.is_empty()
            && self.discriminator.is_none()
            && self.schema_type.is_none()
        {
            self.all_of.first()
        } else {
            None
        }
    }

    pub fn shape(&self) -> SchemaShape<'_> {
        if let Some(reference) = &self.reference {
            return SchemaShape::Reference(reference);
        }
        if !self.enum_values().is_empty()
            && matches!(self.primary_type(), None | Some("string"))
        {
            return SchemaShape::Enum;
        }
        if !self.one_of.is_empty() {
            return SchemaShape::Union;
        }
        if !self.any_of.is_empty() {
            return SchemaShape::Intersection;
        }
        if !self.all_of.is_empty() {
            return SchemaShape::Object;
        }
        match self.primary_type() {
            Some("array") => SchemaShape::Array,
            Some("object") => SchemaShape::Object,
            Some("string") | Some("integer") | Some("number") | Some("boolean") => {
                SchemaShape::Primitive
            }
            _ if self.items.is_some() => SchemaShape::Array,
            _ if !self.properties.is_empty() => SchemaShape::Object,
            _ => SchemaShape::Untyped,
        }
    }

    /// Whether resolving this schema inline declares a new class or enum
    pub fn declares_type(&self) -> bool {
        if let Some(member) = self.collapse_nullable_composition() {
            return member.declares_type();
        }
        if let Some(member) = self.single_all_of_alias() {
            return member.declares_type();
        }
        match self.shape() {
            SchemaShape::Enum | SchemaShape::Union | SchemaShape::Intersection => true,
            SchemaShape::Object => !self.is_free_form_object(),
            SchemaShape::Array => self.items.as_deref().is_some_and(Schema::declares_type),
            SchemaShape::Reference(_) | SchemaShape::Primitive | SchemaShape::Untyped => false,
        }
    }

    /// Objects without declared members are free-form maps, not models
    pub fn is_free_form_object(&self) -> bool {
        self.shape() == SchemaShape::Object
            && self.properties.is_empty()
            && self.all_of.is_empty()
            && self.discriminator.is_none()
    }

    /// Type signature used to decide whether two property definitions agree
    pub fn signature(&self) -> String {
        let mut signature = String::new();
        if let Some(reference) = &self.reference {
            signature.push_str(reference);
        }
        if let Some(primary) = self.primary_type() {
            signature.push_str(primary);
        }
        if let Some(format) = &self.format {
            signature.push(':');
            signature.push_str(format);
        }
        if let Some(items) = &self.items {
            signature.push('[');
            signature.push_str(&items.signature());
            signature.push(']');
        }
        for (keyword, members) in [
            ("allOf", &self.all_of),
            ("oneOf", &self.one_of),
            ("anyOf", &self.any_of),
        ] {
            if !members.is_empty() {
                signature.push_str(keyword);
                signature.push('(');
                for member in members {
                    signature.push_str(&member.signature());
                    signature.push(',');
                }
                signature.push(')');
            }
        }
        if !self.properties.is_empty() {
            signature.push('{');
            for key in self.properties.keys() {
                signature.push_str(key);
                signature.push(',');
            }
            signature.push('}');
        }
        signature
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: JsonValue) -> Schema {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_shape_detection() {
        assert_eq!(
            schema(json!({"$ref": "#/components/schemas/Pet"})).shape(),
            SchemaShape::Reference("#/components/schemas/Pet")
        );
        assert_eq!(
            schema(json!({"type": "string", "enum": ["a", "b"]})).shape(),
            SchemaShape::Enum
        );
        assert_eq!(
            schema(json!({"type": "array", "items": {"type": "string"}})).shape(),
            SchemaShape::Array
        );
        assert_eq!(
            schema(json!({"properties": {"a": {"type": "string"}}})).shape(),
            SchemaShape::Object
        );
        assert_eq!(
            schema(json!({"oneOf": [{"type": "string"}]})).shape(),
            SchemaShape::Union
        );
        assert_eq!(
            schema(json!({"anyOf": [{"type": "string"}]})).shape(),
            SchemaShape::Intersection
        );
        assert_eq!(
            schema(json!({"type": ["integer", "null"]})).shape(),
            SchemaShape::Primitive
        );
        assert_eq!(schema(json!({})).shape(), SchemaShape::Untyped);
    }

    #[test]
    fn test_declares_type() {
        assert!(schema(json!({"properties": {"a": {"type": "string"}}})).declares_type());
        assert!(schema(json!({"type": "string", "enum": ["a"]})).declares_type());
        assert!(schema(json!({"type": "array", "items": {"oneOf": [{"type": "string"}, {"type": "integer"}]}})).declares_type());
        assert!(!schema(json!({"type": "string"})).declares_type());
        assert!(!schema(json!({"type": "object"})).declares_type());
        assert!(!schema(json!({"type": "array", "items": {"type": "integer"}})).declares_type());
        assert!(!schema(json!({"$ref": "#/components/schemas/Pet"})).declares_type());
    }

    #[test]
    fn test_nullable_through_type_list() {
        let s = schema(json!({"type": ["string", "null"]}));
        assert!(s.is_nullable());
        assert_eq!(s.primary_type(), Some("string"));
    }

    #[test]
    fn test_collapse_nullable_composition() {
        let s = schema(json!({
            "anyOf": [{"$ref": "#/components/schemas/Pet"}, {"type": "null"}]
        }));
        let collapsed = s.collapse_nullable_composition().unwrap();
        assert_eq!(
            collapsed.reference.as_deref(),
            Some("#/components/schemas/Pet")
        );

        let two_real = schema(json!({"oneOf": [{"type": "string"}, {"type": "integer"}]}));
        assert!(two_real.collapse_nullable_composition().is_none());
    }

    #[test]
    fn test_enum_values_skip_null_and_empty() {
        let s = schema(json!({"type": "string", "enum": ["a", "", null, "null", "b"]}));
        assert_eq!(s.enum_values(), ["a", "b"]);
    }

    #[test]
    fn test_flags_extension_is_read() {
        let s = schema(json!({
            "type": "string",
            "enum": ["read", "write"],
            "x-ms-enum-flags": {"isFlags": true}
        }));
        assert!(s.is_flags_enum());
    }

    #[test]
    fn test_additional_properties_forms() {
        assert!(schema(json!({"type": "object"})).allows_additional_properties());
        assert!(!schema(json!({"type": "object", "additionalProperties": false}))
            .allows_additional_properties());
        let with_schema = schema(json!({"additionalProperties": {"type": "string"}}));
        assert!(matches!(
            with_schema.additional_properties,
            Some(AdditionalProperties::Schema(_))
        ));
    }

    #[test]
    fn test_signature_ignores_descriptions() {
        let a = schema(json!({"type": "string", "description": "one"}));
        let b = schema(json!({"type": "string", "description": "two"}));
        let c = schema(json!({"type": "integer"}));
        assert_eq!(a.signature(), b.signature());
        assert_ne!(a.signature(), c.signature());
    }
}
