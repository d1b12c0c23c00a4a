//! TypeScript conventions against the JavaScript abstractions.

// Internal imports (std, crate)
use std::collections::HashSet;

use super::{word_set, Import, LanguageConventions};
use crate::ir::{Abstraction, Primitive};
use crate::language::GenerationLanguage;
use crate::naming::{cleanup_symbol_name, to_first_lower, to_first_upper, to_upper_camel_case};

// External imports (alphabetized)
use once_cell::sync::Lazy;

const ABSTRACTIONS: &str = "@microsoft/kiota-abstractions";

static RESERVED: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    word_set(&[
        "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
        "do", "else", "enum", "export", "extends", "false", "finally", "for", "function", "if",
        "import", "in", "instanceof", "new", "null", "return", "super", "switch", "this",
        "throw", "true", "try", "typeof", "var", "void", "while", "with", "as", "implements",
        "interface", "let", "package", "private", "protected", "public", "static", "yield",
        "any", "boolean", "constructor", "declare", "get", "module", "require", "number",
        "set", "string", "symbol", "type", "from", "of", "await",
    ])
});

#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptConventions;

impl LanguageConventions for TypeScriptConventions {
    fn language(&self) -> GenerationLanguage {
        GenerationLanguage::TypeScript
    }

    fn file_extension(&self) -> &'static str {
        "ts"
    }

    fn reserved_words(&self) -> &'static HashSet<&'static str> {
        &RESERVED
    }

    fn property_name(&self, name: &str) -> String {
        self.escape(to_first_lower(&cleanup_symbol_name(name)))
    }

    /// Executors are named after HTTP verbs, which are fine as method names
    fn method_name(&self, name: &str) -> String {
        to_first_lower(&cleanup_symbol_name(name))
    }

    fn parameter_name(&self, name: &str) -> String {
        self.escape(to_first_lower(&cleanup_symbol_name(name)))
    }

    fn enum_option_name(&self, name: &str) -> String {
        self.escape(to_upper_camel_case(&cleanup_symbol_name(name)))
    }

    fn file_name(&self, type_name: &str) -> String {
        to_first_lower(type_name)
    }

    fn directory_name(&self, segment: &str) -> String {
        to_first_lower(&cleanup_symbol_name(segment))
    }

    fn namespace_file_name(&self) -> Option<&'static str> {
        Some("index")
    }

    fn namespace_name(&self, dotted: &str) -> String {
        dotted
            .split('.')
            .map(|segment| self.directory_name(segment))
            .collect::<Vec<_>>()
            .join("/")
    }

    fn primitive_name(&self, primitive: Primitive) -> &'static str {
        match primitive {
            Primitive::String | Primitive::Base64 | Primitive::Base64Url => "string",
            Primitive::Boolean => "boolean",
            Primitive::Integer
            | Primitive::Int64
            | Primitive::Float
            | Primitive::Double
            | Primitive::Decimal
            | Primitive::Byte
            | Primitive::Sbyte => "number",
            Primitive::Guid => "Guid",
            Primitive::DateTimeOffset => "Date",
            Primitive::DateOnly => "DateOnly",
            Primitive::TimeOnly => "TimeOnly",
            Primitive::Duration => "Duration",
            Primitive::Binary => "ArrayBuffer",
            Primitive::Void => "void",
            Primitive::Untyped => "UntypedNode",
        }
    }

    fn primitive_import(&self, primitive: Primitive) -> Option<Import> {
        match primitive {
            Primitive::Guid => Some(Import::new("guid-typescript", "Guid")),
            Primitive::DateOnly
            | Primitive::TimeOnly
            | Primitive::Duration
            | Primitive::Untyped => Some(Import::new(ABSTRACTIONS, self.primitive_name(primitive))),
            _ => None,
        }
    }

    fn abstraction_name(&self, abstraction: Abstraction) -> &'static str {
        match abstraction {
            Abstraction::PathParameters => "Record<string, unknown>",
            Abstraction::AdditionalData => "Record<string, unknown>",
            Abstraction::ApiException => "ApiError",
            Abstraction::CancellationToken => "AbortSignal",
            other => other.as_str(),
        }
    }

    fn abstraction_import(&self, abstraction: Abstraction) -> Option<Import> {
        match abstraction {
            Abstraction::PathParameters
            | Abstraction::AdditionalData
            | Abstraction::CancellationToken => None,
            other => Some(Import::new(ABSTRACTIONS, self.abstraction_name(other))),
        }
    }

    fn serialization_module(&self, family: &str) -> String {
        format!("@microsoft/kiota-serialization-{}", family.to_lowercase())
    }

    fn collection_type(&self, element: &str) -> String {
        if element.contains(' ') {
            format!("({})[]", element)
        } else {
            format!("{}[]", element)
        }
    }

    fn nullable_type(&self, spelled: String) -> String {
        format!("{} | null", spelled)
    }

    fn doc_comment(&self, text: &str) -> Vec<String> {
        vec![
            "/**".to_string(),
            format!(" * {}", text.replace("*/", "*\\/")),
            " */".to_string(),
        ]
    }

    fn type_name(&self, name: &str) -> String {
        self.escape(to_first_upper(&cleanup_symbol_name(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_are_lower_camel() {
        let t = TypeScriptConventions;
        assert_eq!(t.file_name("UsersRequestBuilder"), "usersRequestBuilder");
        assert_eq!(t.directory_name("Users"), "users");
        assert_eq!(t.namespace_file_name(), Some("index"));
        assert_eq!(t.namespace_name("ApiSdk.users.item"), "apiSdk/users/item");
    }

    #[test]
    fn test_verbs_stay_usable_as_method_names() {
        let t = TypeScriptConventions;
        assert_eq!(t.method_name("delete"), "delete");
        assert_eq!(t.parameter_name("delete"), "deleteEscaped");
    }
}
