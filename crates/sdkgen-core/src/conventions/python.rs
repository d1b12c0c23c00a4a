//! Python conventions against the Python abstractions.

// Internal imports (std, crate)
use std::collections::HashSet;

use super::{word_set, Import, LanguageConventions};
use crate::ir::{Abstraction, Primitive};
use crate::language::GenerationLanguage;
use crate::naming::{cleanup_symbol_name, to_snake_case, to_upper_snake_case};

// External imports (alphabetized)
use once_cell::sync::Lazy;

static RESERVED: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    word_set(&[
        "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del",
        "elif", "else", "except", "False", "finally", "for", "from", "global", "if", "import",
        "in", "is", "lambda", "None", "nonlocal", "not", "or", "pass", "raise", "return",
        "True", "try", "while", "with", "yield", "self", "property", "type", "list", "dict",
        "str", "int", "float", "bool", "bytes", "object", "id", "format",
    ])
});

#[derive(Debug, Clone, Copy, Default)]
pub struct PythonConventions;

impl LanguageConventions for PythonConventions {
    fn language(&self) -> GenerationLanguage {
        GenerationLanguage::Python
    }

    fn file_extension(&self) -> &'static str {
        "py"
    }

    fn reserved_words(&self) -> &'static HashSet<&'static str> {
        &RESERVED
    }

    fn escape_suffix(&self) -> &'static str {
        "_"
    }

    fn property_name(&self, name: &str) -> String {
        self.escape(to_snake_case(&cleanup_symbol_name(name)))
    }

    fn method_name(&self, name: &str) -> String {
        self.escape(to_snake_case(&cleanup_symbol_name(name)))
    }

    fn parameter_name(&self, name: &str) -> String {
        self.escape(to_snake_case(&cleanup_symbol_name(name)))
    }

    fn enum_option_name(&self, name: &str) -> String {
        self.escape(to_upper_snake_case(&cleanup_symbol_name(name)))
    }

    fn file_name(&self, type_name: &str) -> String {
        to_snake_case(type_name)
    }

    fn directory_name(&self, segment: &str) -> String {
        to_snake_case(&cleanup_symbol_name(segment))
    }

    fn namespace_file_name(&self) -> Option<&'static str> {
        Some("__init__")
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
            Primitive::String => "str",
            Primitive::Boolean => "bool",
            Primitive::Integer | Primitive::Int64 | Primitive::Byte | Primitive::Sbyte => "int",
            Primitive::Float | Primitive::Double | Primitive::Decimal => "float",
            Primitive::Guid => "UUID",
            Primitive::DateTimeOffset => "datetime.datetime",
            Primitive::DateOnly => "datetime.date",
            Primitive::TimeOnly => "datetime.time",
            Primitive::Duration => "datetime.timedelta",
            Primitive::Binary | Primitive::Base64 | Primitive::Base64Url => "bytes",
            Primitive::Void => "None",
            Primitive::Untyped => "UntypedNode",
        }
    }

    fn primitive_import(&self, primitive: Primitive) -> Option<Import> {
        match primitive {
            Primitive::Guid => Some(Import::new("uuid", "UUID")),
            Primitive::DateTimeOffset
            | Primitive::DateOnly
            | Primitive::TimeOnly
            | Primitive::Duration => Some(Import::new("", "datetime")),
            Primitive::Untyped => Some(Import::new(
                "kiota_abstractions.serialization",
                "UntypedNode",
            )),
            _ => None,
        }
    }

    fn abstraction_name(&self, abstraction: Abstraction) -> &'static str {
        match abstraction {
            Abstraction::PathParameters => "dict[str, Any]",
            Abstraction::AdditionalData => "dict[str, Any]",
            Abstraction::ApiException => "APIError",
            Abstraction::CancellationToken => "None",
            other => other.as_str(),
        }
    }

    fn abstraction_import(&self, abstraction: Abstraction) -> Option<Import> {
        let module = match abstraction {
            Abstraction::PathParameters | Abstraction::AdditionalData => {
                return Some(Import::new("typing", "Any"))
            }
            Abstraction::CancellationToken => return None,
            Abstraction::RequestAdapter => "kiota_abstractions.request_adapter",
            Abstraction::RequestInformation => "kiota_abstractions.request_information",
            Abstraction::RequestOption => "kiota_abstractions.request_option",
            Abstraction::RequestHeaders => "kiota_abstractions.headers_collection",
            Abstraction::ApiException => "kiota_abstractions.api_error",
            Abstraction::BackingStore | Abstraction::BackedModel => "kiota_abstractions.store",
            Abstraction::ParseNode
            | Abstraction::SerializationWriter
            | Abstraction::AdditionalDataHolder
            | Abstraction::Parsable
            | Abstraction::ComposedTypeWrapper => "kiota_abstractions.serialization",
        };
        Some(Import::new(module, self.abstraction_name(abstraction)))
    }

    fn serialization_module(&self, family: &str) -> String {
        format!("kiota_serialization_{}", family.to_lowercase())
    }

    fn collection_type(&self, element: &str) -> String {
        format!("list[{}]", element)
    }

    fn nullable_type(&self, spelled: String) -> String {
        format!("Optional[{}]", spelled)
    }

    fn doc_comment(&self, text: &str) -> Vec<String> {
        vec![
            "\"\"\"".to_string(),
            text.replace("\"\"\"", "\\\"\\\"\\\""),
            "\"\"\"".to_string(),
        ]
    }

    fn null_literal(&self) -> &'static str {
        "None"
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        if value {
            "True"
        } else {
            "False"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case_members() {
        let p = PythonConventions;
        assert_eq!(p.method_name("toGetRequestInformation"), "to_get_request_information");
        assert_eq!(p.parameter_name("requestConfiguration"), "request_configuration");
        assert_eq!(p.enum_option_name("inProgress"), "IN_PROGRESS");
        assert_eq!(p.file_name("WithIdItemRequestBuilder"), "with_id_item_request_builder");
        assert_eq!(p.namespace_file_name(), Some("__init__"));
    }

    #[test]
    fn test_imports() {
        let p = PythonConventions;
        assert_eq!(
            p.abstraction_import(Abstraction::Parsable),
            Some(Import::new("kiota_abstractions.serialization", "Parsable"))
        );
        assert_eq!(p.abstraction_import(Abstraction::CancellationToken), None);
    }
}
