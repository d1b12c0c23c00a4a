//! Per-language naming and type conventions.
//!
//! Each target language provides a stateless [`LanguageConventions`]
//! implementation. Resolution stays language-neutral; the renderers ask the
//! convention service how to spell names, types, literals and imports.
//!
//! # Examples
//!
//! ```
//! use sdkgen_core::conventions::for_language;
//! use sdkgen_core::ir::{Primitive, TypeRef};
//! use sdkgen_core::language::GenerationLanguage;
//!
//! let python = for_language(GenerationLanguage::Python);
//! assert_eq!(python.property_name("displayName"), "display_name");
//! assert_eq!(python.primitive_name(Primitive::Boolean), "bool");
//! ```

pub mod csharp;
pub mod java;
pub mod python;
pub mod typescript;

// Internal imports (std, crate)
use std::collections::HashSet;

use crate::ir::{Abstraction, CodeModel, CollectionKind, Primitive, TypeRef};
use crate::language::GenerationLanguage;
use crate::naming::{cleanup_symbol_name, to_first_upper};

// External imports (alphabetized)
use serde_json::Value as JsonValue;

pub use csharp::CSharpConventions;
pub use java::JavaConventions;
pub use python::PythonConventions;
pub use typescript::TypeScriptConventions;

/// Module and symbol a generated file imports
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Import {
    pub module: String,
    pub symbol: String,
}

impl Import {
    pub fn new(module: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            symbol: symbol.into(),
        }
    }
}

/// Naming and type spelling rules of one target language
pub trait LanguageConventions: Send + Sync {
    fn language(&self) -> GenerationLanguage;

    /// Extension of generated source files, without the dot
    fn file_extension(&self) -> &'static str;

    fn reserved_words(&self) -> &'static HashSet<&'static str>;

    /// Appended to identifiers that clash with a reserved word
    fn escape_suffix(&self) -> &'static str {
        "Escaped"
    }

    fn is_reserved(&self, name: &str) -> bool {
        self.reserved_words().contains(name)
    }

    fn escape(&self, name: String) -> String {
        if self.is_reserved(&name) {
            format!("{}{}", name, self.escape_suffix())
        } else {
            name
        }
    }

    fn type_name(&self, name: &str) -> String {
        self.escape(to_first_upper(&cleanup_symbol_name(name)))
    }

    fn property_name(&self, name: &str) -> String;

    fn method_name(&self, name: &str) -> String;

    fn parameter_name(&self, name: &str) -> String;

    fn enum_option_name(&self, name: &str) -> String;

    /// File stem of the file declaring a type
    fn file_name(&self, type_name: &str) -> String;

    fn directory_name(&self, segment: &str) -> String;

    /// Stem of the per-namespace file, for languages that need one
    fn namespace_file_name(&self) -> Option<&'static str> {
        None
    }

    /// Spelling of a dotted namespace in declarations and imports
    fn namespace_name(&self, dotted: &str) -> String;

    fn primitive_name(&self, primitive: Primitive) -> &'static str;

    fn primitive_import(&self, _primitive: Primitive) -> Option<Import> {
        None
    }

    fn abstraction_name(&self, abstraction: Abstraction) -> &'static str;

    fn abstraction_import(&self, abstraction: Abstraction) -> Option<Import>;

    /// Module holding the serialization factories of a format family
    /// (`json`, `text`, `form`, `multipart`)
    fn serialization_module(&self, family: &str) -> String;

    fn collection_type(&self, element: &str) -> String;

    fn nullable_type(&self, spelled: String) -> String;

    /// Doc comment lines for a description
    fn doc_comment(&self, text: &str) -> Vec<String>;

    fn string_literal(&self, value: &str) -> String {
        format!(
            "\"{}\"",
            value.replace('\\', "\\\\").replace('"', "\\\"")
        )
    }

    fn null_literal(&self) -> &'static str {
        "null"
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        if value {
            "true"
        } else {
            "false"
        }
    }

    /// Source literal for a schema default value
    fn literal(&self, value: &JsonValue) -> String {
        match value {
            JsonValue::Null => self.null_literal().to_string(),
            JsonValue::Bool(b) => self.bool_literal(*b).to_string(),
            JsonValue::Number(n) => n.to_string(),
            JsonValue::String(s) => self.string_literal(s),
            other => self.string_literal(&other.to_string()),
        }
    }

    /// Full spelling of a type reference, collections and nullability included
    fn type_spelling(&self, model: &CodeModel, type_ref: &TypeRef) -> String {
        let base = self.element_spelling(model, type_ref);
        let spelled = match type_ref.collection {
            CollectionKind::None => base,
            CollectionKind::Array => self.collection_type(&base),
            CollectionKind::ComposedOfMultiple => {
                self.collection_type(&self.collection_type(&base))
            }
        };
        if type_ref.nullable {
            self.nullable_type(spelled)
        } else {
            spelled
        }
    }

    /// Spelling of the referenced type alone
    fn element_spelling(&self, model: &CodeModel, type_ref: &TypeRef) -> String {
        if let Some(primitive) = type_ref.as_primitive() {
            return self.primitive_name(primitive).to_string();
        }
        if let Some(abstraction) = type_ref.as_abstraction() {
            return self.abstraction_name(abstraction).to_string();
        }
        match type_ref.definition {
            Some(definition) => self.type_name(model.definition_name(definition)),
            None => self.type_name(&type_ref.name),
        }
    }

    /// Import needed to use an external type reference
    fn external_import(&self, type_ref: &TypeRef) -> Option<Import> {
        if let Some(primitive) = type_ref.as_primitive() {
            return self.primitive_import(primitive);
        }
        type_ref
            .as_abstraction()
            .and_then(|a| self.abstraction_import(a))
    }
}

/// Convention service of a language
pub fn for_language(language: GenerationLanguage) -> &'static dyn LanguageConventions {
    match language {
        GenerationLanguage::CSharp => &CSharpConventions,
        GenerationLanguage::Java => &JavaConventions,
        GenerationLanguage::TypeScript => &TypeScriptConventions,
        GenerationLanguage::Python => &PythonConventions,
    }
}

/// Build a reserved word table
pub(crate) fn word_set(words: &[&'static str]) -> HashSet<&'static str> {
    words.iter().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Class, ClassKind};

    #[test]
    fn test_every_language_has_a_service() {
        for language in GenerationLanguage::all() {
            assert_eq!(for_language(language).language(), language);
        }
    }

    #[test]
    fn test_reserved_words_are_escaped() {
        let csharp = for_language(GenerationLanguage::CSharp);
        assert_eq!(csharp.parameter_name("namespace"), "namespaceEscaped");
        let python = for_language(GenerationLanguage::Python);
        assert_eq!(python.property_name("from"), "from_");
        let java = for_language(GenerationLanguage::Java);
        assert_eq!(java.property_name("class"), "classEscaped");
    }

    #[test]
    fn test_type_spelling_decorates_collections_and_nullability() {
        let mut model = CodeModel::new();
        let ns = model.add_namespace("ApiSdk.models");
        let id = model.add_class(ns, Class::new("User", ClassKind::Model)).unwrap();
        let users = TypeRef::class("User", id).into_collection().with_nullable(true);

        let expectations = [
            (GenerationLanguage::CSharp, "List<User>?"),
            (GenerationLanguage::Java, "java.util.List<User>"),
            (GenerationLanguage::TypeScript, "User[] | null"),
            (GenerationLanguage::Python, "Optional[list[User]]"),
        ];
        for (language, expected) in expectations {
            assert_eq!(for_language(language).type_spelling(&model, &users), expected);
        }
    }

    #[test]
    fn test_primitive_spelling() {
        let expectations = [
            (GenerationLanguage::CSharp, "DateTimeOffset"),
            (GenerationLanguage::Java, "OffsetDateTime"),
            (GenerationLanguage::TypeScript, "Date"),
            (GenerationLanguage::Python, "datetime.datetime"),
        ];
        for (language, expected) in expectations {
            assert_eq!(
                for_language(language).primitive_name(Primitive::DateTimeOffset),
                expected
            );
        }
    }

    #[test]
    fn test_literals() {
        let python = for_language(GenerationLanguage::Python);
        assert_eq!(python.literal(&JsonValue::Bool(true)), "True");
        assert_eq!(python.literal(&JsonValue::Null), "None");
        let csharp = for_language(GenerationLanguage::CSharp);
        assert_eq!(csharp.literal(&serde_json::json!("a\"b")), "\"a\\\"b\"");
    }
}
