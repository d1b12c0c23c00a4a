//! Serialization factories registered by generated clients.
//!
//! The registry is a plain value built by the caller and handed to the
//! renderers. Generated client constructors register each entry on the
//! request adapter instance they receive.

// Internal imports (std, crate)
use std::collections::BTreeMap;

use crate::conventions::{Import, LanguageConventions};

const FAMILIES: &[&str] = &["Json", "Text", "Form", "Multipart"];

/// Content type to factory tables for writers and parse nodes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SerializationRegistry {
    serializers: BTreeMap<String, String>,
    deserializers: BTreeMap<String, String>,
}

impl SerializationRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON, text, form and multipart factories
    pub fn defaults() -> Self {
        let mut registry = Self::new();
        registry.register_serializer("application/json", "JsonSerializationWriterFactory");
        registry.register_serializer("text/plain", "TextSerializationWriterFactory");
        registry.register_serializer(
            "application/x-www-form-urlencoded",
            "FormSerializationWriterFactory",
        );
        registry.register_serializer("multipart/form-data", "MultipartSerializationWriterFactory");
        registry.register_deserializer("application/json", "JsonParseNodeFactory");
        registry.register_deserializer("text/plain", "TextParseNodeFactory");
        registry.register_deserializer("application/x-www-form-urlencoded", "FormParseNodeFactory");
        registry
    }

    /// Defaults overridden entry by entry
    pub fn with_overrides(
        serializers: &BTreeMap<String, String>,
        deserializers: &BTreeMap<String, String>,
    ) -> Self {
        let mut registry = Self::defaults();
        for (content_type, factory) in serializers {
            registry.register_serializer(content_type, factory);
        }
        for (content_type, factory) in deserializers {
            registry.register_deserializer(content_type, factory);
        }
        registry
    }

    pub fn register_serializer(&mut self, content_type: &str, factory: &str) {
        self.serializers
            .insert(content_type.to_ascii_lowercase(), factory.to_string());
    }

    pub fn register_deserializer(&mut self, content_type: &str, factory: &str) {
        self.deserializers
            .insert(content_type.to_ascii_lowercase(), factory.to_string());
    }

    /// Serializer factories ordered by content type
    pub fn serializers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.serializers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn deserializers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.deserializers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.serializers.is_empty() && self.deserializers.is_empty()
    }

    /// Import bringing a factory into scope.
    ///
    /// Qualified names (`My.Serialization.CsvFactory`) import from their
    /// prefix; well-known factory families resolve to the runtime packages.
    pub fn factory_import(conventions: &dyn LanguageConventions, factory: &str) -> Option<Import> {
        if let Some((module, symbol)) = factory.rsplit_once('.') {
            return Some(Import::new(module, symbol));
        }
        FAMILIES
            .iter()
            .find(|family| factory.starts_with(*family))
            .map(|family| Import::new(conventions.serialization_module(family), factory))
    }

    /// Unqualified factory type name
    pub fn factory_name(factory: &str) -> &str {
        factory.rsplit('.').next().unwrap_or(factory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conventions::for_language;
    use crate::language::GenerationLanguage;

    #[test]
    fn test_defaults_cover_structured_types() {
        let registry = SerializationRegistry::defaults();
        let serializers: Vec<_> = registry.serializers().map(|(ct, _)| ct).collect();
        assert_eq!(
            serializers,
            [
                "application/json",
                "application/x-www-form-urlencoded",
                "multipart/form-data",
                "text/plain"
            ]
        );
        assert_eq!(registry.deserializers().count(), 3);
    }

    #[test]
    fn test_overrides_replace_defaults() {
        let mut serializers = BTreeMap::new();
        serializers.insert(
            "application/json".to_string(),
            "Contoso.Json.FastWriterFactory".to_string(),
        );
        let registry = SerializationRegistry::with_overrides(&serializers, &BTreeMap::new());
        let json = registry
            .serializers()
            .find(|(ct, _)| *ct == "application/json")
            .map(|(_, f)| f);
        assert_eq!(json, Some("Contoso.Json.FastWriterFactory"));
    }

    #[test]
    fn test_factory_imports() {
        let csharp = for_language(GenerationLanguage::CSharp);
        assert_eq!(
            SerializationRegistry::factory_import(csharp, "JsonParseNodeFactory"),
            Some(Import::new("Microsoft.Kiota.Serialization.Json", "JsonParseNodeFactory"))
        );
        assert_eq!(
            SerializationRegistry::factory_import(csharp, "Contoso.CsvFactory"),
            Some(Import::new("Contoso", "CsvFactory"))
        );
        assert_eq!(SerializationRegistry::factory_name("Contoso.CsvFactory"), "CsvFactory");
    }
}
