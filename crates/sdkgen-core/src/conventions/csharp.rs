//! C# conventions against the .NET abstractions.

// Internal imports (std, crate)
use std::collections::HashSet;

use super::{word_set, Import, LanguageConventions};
use crate::ir::{Abstraction, Primitive};
use crate::language::GenerationLanguage;
use crate::naming::{cleanup_symbol_name, to_first_upper, to_lower_camel_case, to_upper_camel_case};

// External imports (alphabetized)
use once_cell::sync::Lazy;

const ABSTRACTIONS: &str = "Microsoft.Kiota.Abstractions";
const SERIALIZATION: &str = "Microsoft.Kiota.Abstractions.Serialization";
const STORE: &str = "Microsoft.Kiota.Abstractions.Store";

static RESERVED: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    word_set(&[
        "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
        "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
        "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
        "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
        "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
        "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed",
        "short", "sizeof", "stackalloc", "static", "string", "struct", "switch", "this",
        "throw", "true", "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort",
        "using", "virtual", "void", "volatile", "while", "Task", "Date", "Time",
    ])
});

/// C# spelling rules
#[derive(Debug, Clone, Copy, Default)]
pub struct CSharpConventions;

impl LanguageConventions for CSharpConventions {
    fn language(&self) -> GenerationLanguage {
        GenerationLanguage::CSharp
    }

    fn file_extension(&self) -> &'static str {
        "cs"
    }

    fn reserved_words(&self) -> &'static HashSet<&'static str> {
        &RESERVED
    }

    fn property_name(&self, name: &str) -> String {
        self.escape(to_first_upper(&cleanup_symbol_name(name)))
    }

    fn method_name(&self, name: &str) -> String {
        self.escape(to_first_upper(&cleanup_symbol_name(name)))
    }

    fn parameter_name(&self, name: &str) -> String {
        self.escape(to_lower_camel_case(&cleanup_symbol_name(name)))
    }

    fn enum_option_name(&self, name: &str) -> String {
        self.escape(to_upper_camel_case(&cleanup_symbol_name(name)))
    }

    fn file_name(&self, type_name: &str) -> String {
        type_name.to_string()
    }

    fn directory_name(&self, segment: &str) -> String {
        to_first_upper(&cleanup_symbol_name(segment))
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
            Primitive::String => "string",
            Primitive::Boolean => "bool",
            Primitive::Integer => "int",
            Primitive::Int64 => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Decimal => "decimal",
            Primitive::Byte => "byte",
            Primitive::Sbyte => "sbyte",
            Primitive::Guid => "Guid",
            Primitive::DateTimeOffset => "DateTimeOffset",
            Primitive::DateOnly => "Date",
            Primitive::TimeOnly => "Time",
            Primitive::Duration => "TimeSpan",
            Primitive::Binary => "Stream",
            Primitive::Base64 | Primitive::Base64Url => "byte[]",
            Primitive::Void => "void",
            Primitive::Untyped => "UntypedNode",
        }
    }

    fn primitive_import(&self, primitive: Primitive) -> Option<Import> {
        let module = match primitive {
            Primitive::Guid | Primitive::DateTimeOffset | Primitive::Duration => "System",
            Primitive::Binary => "System.IO",
            Primitive::DateOnly | Primitive::TimeOnly => ABSTRACTIONS,
            Primitive::Untyped => SERIALIZATION,
            _ => return None,
        };
        Some(Import::new(module, self.primitive_name(primitive)))
    }

    fn abstraction_name(&self, abstraction: Abstraction) -> &'static str {
        match abstraction {
            Abstraction::RequestAdapter => "IRequestAdapter",
            Abstraction::RequestInformation => "RequestInformation",
            Abstraction::ParseNode => "IParseNode",
            Abstraction::SerializationWriter => "ISerializationWriter",
            Abstraction::PathParameters => "Dictionary<string, object>",
            Abstraction::AdditionalData => "IDictionary<string, object>",
            Abstraction::BackingStore => "IBackingStore",
            Abstraction::CancellationToken => "CancellationToken",
            Abstraction::RequestOption => "IRequestOption",
            Abstraction::RequestHeaders => "RequestHeaders",
            Abstraction::AdditionalDataHolder => "IAdditionalDataHolder",
            Abstraction::Parsable => "IParsable",
            Abstraction::BackedModel => "IBackedModel",
            Abstraction::ApiException => "ApiException",
            Abstraction::ComposedTypeWrapper => "IComposedTypeWrapper",
        }
    }

    fn abstraction_import(&self, abstraction: Abstraction) -> Option<Import> {
        let module = match abstraction {
            Abstraction::RequestAdapter
            | Abstraction::RequestInformation
            | Abstraction::RequestOption
            | Abstraction::RequestHeaders
            | Abstraction::ApiException => ABSTRACTIONS,
            Abstraction::ParseNode
            | Abstraction::SerializationWriter
            | Abstraction::AdditionalDataHolder
            | Abstraction::Parsable
            | Abstraction::ComposedTypeWrapper => SERIALIZATION,
            Abstraction::BackingStore | Abstraction::BackedModel => STORE,
            Abstraction::PathParameters | Abstraction::AdditionalData => {
                "System.Collections.Generic"
            }
            Abstraction::CancellationToken => "System.Threading",
        };
        Some(Import::new(module, self.abstraction_name(abstraction)))
    }

    fn serialization_module(&self, family: &str) -> String {
        format!("Microsoft.Kiota.Serialization.{}", to_first_upper(family))
    }

    fn collection_type(&self, element: &str) -> String {
        format!("List<{}>", element)
    }

    fn nullable_type(&self, spelled: String) -> String {
        if spelled.ends_with('?') {
            spelled
        } else {
            format!("{}?", spelled)
        }
    }

    fn doc_comment(&self, text: &str) -> Vec<String> {
        vec![format!(
            "/// <summary>{}</summary>",
            text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_casing() {
        let c = CSharpConventions;
        assert_eq!(c.property_name("display-name"), "DisplayName");
        assert_eq!(c.method_name("toGetRequestInformation"), "ToGetRequestInformation");
        assert_eq!(c.parameter_name("RequestConfiguration"), "requestConfiguration");
        assert_eq!(c.namespace_name("ApiSdk.users.item"), "ApiSdk.Users.Item");
        assert_eq!(c.enum_option_name("in_progress"), "InProgress");
    }

    #[test]
    fn test_doc_comment_escapes_markup() {
        let c = CSharpConventions;
        assert_eq!(c.doc_comment("a < b"), ["/// <summary>a &lt; b</summary>"]);
    }
}
