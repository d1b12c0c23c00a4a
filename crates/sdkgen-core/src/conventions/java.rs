//! Java conventions against the JVM abstractions.

// Internal imports (std, crate)
use std::collections::HashSet;

use super::{word_set, Import, LanguageConventions};
use crate::ir::{Abstraction, Primitive};
use crate::language::GenerationLanguage;
use crate::naming::{cleanup_symbol_name, to_first_lower, to_upper_camel_case};

// External imports (alphabetized)
use once_cell::sync::Lazy;

static RESERVED: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    word_set(&[
        "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class",
        "const", "continue", "default", "do", "double", "else", "enum", "extends", "final",
        "finally", "float", "for", "goto", "if", "implements", "import", "instanceof", "int",
        "interface", "long", "native", "new", "null", "package", "private", "protected",
        "public", "return", "short", "static", "strictfp", "super", "switch", "synchronized",
        "this", "throw", "throws", "transient", "true", "false", "try", "void", "volatile",
        "while", "var", "record", "yield",
    ])
});

#[derive(Debug, Clone, Copy, Default)]
pub struct JavaConventions;

impl LanguageConventions for JavaConventions {
    fn language(&self) -> GenerationLanguage {
        GenerationLanguage::Java
    }

    fn file_extension(&self) -> &'static str {
        "java"
    }

    fn reserved_words(&self) -> &'static HashSet<&'static str> {
        &RESERVED
    }

    fn property_name(&self, name: &str) -> String {
        self.escape(to_first_lower(&cleanup_symbol_name(name)))
    }

    fn method_name(&self, name: &str) -> String {
        self.escape(to_first_lower(&cleanup_symbol_name(name)))
    }

    fn parameter_name(&self, name: &str) -> String {
        self.escape(to_first_lower(&cleanup_symbol_name(name)))
    }

    fn enum_option_name(&self, name: &str) -> String {
        self.escape(to_upper_camel_case(&cleanup_symbol_name(name)))
    }

    fn file_name(&self, type_name: &str) -> String {
        type_name.to_string()
    }

    fn directory_name(&self, segment: &str) -> String {
        cleanup_symbol_name(segment).to_lowercase()
    }

    fn namespace_name(&self, dotted: &str) -> String {
        dotted
            .split('.')
            .map(|segment| self.directory_name(segment))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn primitive_name(&self, primitive: Primitive) -> &'static str {
        match primitive {
            Primitive::String => "String",
            Primitive::Boolean => "Boolean",
            Primitive::Integer => "Integer",
            Primitive::Int64 => "Long",
            Primitive::Float => "Float",
            Primitive::Double => "Double",
            Primitive::Decimal => "BigDecimal",
            Primitive::Byte => "Short",
            Primitive::Sbyte => "Byte",
            Primitive::Guid => "UUID",
            Primitive::DateTimeOffset => "OffsetDateTime",
            Primitive::DateOnly => "LocalDate",
            Primitive::TimeOnly => "LocalTime",
            Primitive::Duration => "PeriodAndDuration",
            Primitive::Binary => "InputStream",
            Primitive::Base64 | Primitive::Base64Url => "byte[]",
            Primitive::Void => "Void",
            Primitive::Untyped => "UntypedNode",
        }
    }

    fn primitive_import(&self, primitive: Primitive) -> Option<Import> {
        let module = match primitive {
            Primitive::Decimal => "java.math",
            Primitive::Guid => "java.util",
            Primitive::DateTimeOffset | Primitive::DateOnly | Primitive::TimeOnly => "java.time",
            Primitive::Duration => "com.microsoft.kiota",
            Primitive::Binary => "java.io",
            Primitive::Untyped => "com.microsoft.kiota.serialization",
            _ => return None,
        };
        Some(Import::new(module, self.primitive_name(primitive)))
    }

    fn abstraction_name(&self, abstraction: Abstraction) -> &'static str {
        match abstraction {
            Abstraction::PathParameters => "HashMap<String, Object>",
            Abstraction::AdditionalData => "Map<String, Object>",
            Abstraction::CancellationToken => "CompletableFuture",
            other => other.as_str(),
        }
    }

    fn abstraction_import(&self, abstraction: Abstraction) -> Option<Import> {
        let (module, symbol) = match abstraction {
            Abstraction::RequestAdapter
            | Abstraction::RequestInformation
            | Abstraction::RequestOption
            | Abstraction::RequestHeaders
            | Abstraction::ApiException => ("com.microsoft.kiota", abstraction.as_str()),
            Abstraction::ParseNode
            | Abstraction::SerializationWriter
            | Abstraction::AdditionalDataHolder
            | Abstraction::Parsable
            | Abstraction::ComposedTypeWrapper => {
                ("com.microsoft.kiota.serialization", abstraction.as_str())
            }
            Abstraction::BackingStore | Abstraction::BackedModel => {
                ("com.microsoft.kiota.store", abstraction.as_str())
            }
            Abstraction::PathParameters => ("java.util", "HashMap"),
            Abstraction::AdditionalData => ("java.util", "Map"),
            Abstraction::CancellationToken => ("java.util.concurrent", "CompletableFuture"),
        };
        Some(Import::new(module, symbol))
    }

    fn serialization_module(&self, family: &str) -> String {
        format!("com.microsoft.kiota.serialization.{}", family.to_lowercase())
    }

    fn collection_type(&self, element: &str) -> String {
        format!("java.util.List<{}>", element)
    }

    fn nullable_type(&self, spelled: String) -> String {
        spelled
    }

    fn doc_comment(&self, text: &str) -> Vec<String> {
        vec![
            "/**".to_string(),
            format!(" * {}", text.replace("*/", "*\\/")),
            " */".to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packages_are_lowercase() {
        let j = JavaConventions;
        assert_eq!(j.namespace_name("ApiSdk.Users.item"), "apisdk.users.item");
        assert_eq!(j.directory_name("Users"), "users");
        assert_eq!(j.method_name("Get"), "get");
    }

    #[test]
    fn test_imports() {
        let j = JavaConventions;
        assert_eq!(
            j.abstraction_import(Abstraction::PathParameters),
            Some(Import::new("java.util", "HashMap"))
        );
        assert_eq!(j.primitive_import(Primitive::String), None);
    }
}
