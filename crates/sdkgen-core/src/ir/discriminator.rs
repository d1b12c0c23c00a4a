//! Polymorphic type resolution metadata.

use super::TypeRef;

/// Wire property carrying the concrete type and the value to type table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscriminatorInfo {
    pub property_name: String,
    mappings: Vec<(String, TypeRef)>,
}

impl DiscriminatorInfo {
    pub fn new(property_name: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            mappings: Vec::new(),
        }
    }

    /// Add a mapping; the first insertion of a key (case-insensitive) wins
    pub fn add_mapping(&mut self, value: impl Into<String>, type_ref: TypeRef) -> bool {
        let value = value.into();
        if self
            .mappings
            .iter()
            .any(|(existing, _)| existing.eq_ignore_ascii_case(&value))
        {
            return false;
        }
        self.mappings.push((value, type_ref));
        true
    }

    pub fn mappings(&self) -> &[(String, TypeRef)] {
        &self.mappings
    }

    pub fn mapping(&self, value: &str) -> Option<&TypeRef> {
        self.mappings
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(value))
            .map(|(_, type_ref)| type_ref)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
