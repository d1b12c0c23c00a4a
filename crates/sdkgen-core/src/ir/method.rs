//! Methods and their parameters.

use super::{Access, Deprecation, Documentation, TypeRef};
use crate::document::HttpMethod;

// External imports (alphabetized)
use serde_json::Value as JsonValue;

/// Role a method plays in the generated code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Constructor,
    ClientConstructor,
    RawUrlConstructor,
    Serializer,
    Deserializer,
    /// Static `createFromDiscriminatorValue`
    Factory,
    RequestGenerator,
    RequestExecutor,
    Getter,
    Setter,
    IndexerAccessor,
    RequestBuilderWithParameters,
}

impl MethodKind {
    /// Rank used to keep constructors first when ordering members
    pub fn constructor_rank(&self) -> u8 {
        match self {
            Self::Constructor => 0,
            Self::ClientConstructor => 1,
            Self::RawUrlConstructor => 2,
            _ => 3,
        }
    }

    pub fn is_constructor(&self) -> bool {
        self.constructor_rank() < 3
    }
}

/// Role a parameter plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    RequestBody,
    RequestConfiguration,
    PathParameters,
    Cancellation,
    Custom,
    RequestAdapter,
    RawUrl,
    ParseNode,
    Serializer,
    /// A value substituted in the URL template
    Path,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
    pub type_ref: TypeRef,
    pub optional: bool,
    pub default_value: Option<JsonValue>,
    pub serialization_name: Option<String>,
    pub documentation: Documentation,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: ParameterKind, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            kind,
            type_ref,
            optional: false,
            default_value: None,
            serialization_name: None,
            documentation: Documentation::default(),
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_documentation(mut self, documentation: Documentation) -> Self {
        self.documentation = documentation;
        self
    }

    pub fn wire_name(&self) -> &str {
        self.serialization_name.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub kind: MethodKind,
    pub access: Access,
    pub is_async: bool,
    pub is_static: bool,
    pub parameters: Vec<Parameter>,
    pub return_type: TypeRef,
    pub http_method: Option<HttpMethod>,
    pub accepted_response_types: Vec<String>,
    pub request_body_content_type: Option<String>,
    error_mappings: Vec<(String, TypeRef)>,
    /// Base URL set by the client constructor
    pub base_url: Option<String>,
    pub documentation: Documentation,
    pub deprecation: Option<Deprecation>,
}

impl Method {
    pub fn new(name: impl Into<String>, kind: MethodKind, return_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            kind,
            access: Access::Public,
            is_async: false,
            is_static: false,
            parameters: Vec::new(),
            return_type,
            http_method: None,
            accepted_response_types: Vec::new(),
            request_body_content_type: None,
            error_mappings: Vec::new(),
            base_url: None,
            documentation: Documentation::default(),
            deprecation: None,
        }
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_documentation(mut self, documentation: Documentation) -> Self {
        self.documentation = documentation;
        self
    }

    pub fn parameter_of_kind(&self, kind: ParameterKind) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.kind == kind)
    }

    /// Map a status code (`404`) or range (`4XX`) to an error type.
    ///
    /// Keys are unique case-insensitively; the first mapping wins.
    pub fn add_error_mapping(&mut self, code: &str, type_ref: TypeRef) -> bool {
        let code = code.to_ascii_uppercase();
        if self.error_mappings.iter().any(|(c, _)| *c == code) {
            return false;
        }
        self.error_mappings.push((code, type_ref));
        true
    }

    pub fn error_mappings(&self) -> &[(String, TypeRef)] {
        &self.error_mappings
    }

    pub fn error_mappings_mut(&mut self) -> impl Iterator<Item = &mut TypeRef> {
        self.error_mappings.iter_mut().map(|(_, t)| t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Abstraction, Primitive};

    #[test]
    fn test_error_mapping_keys_are_case_insensitive() {
        let mut method = Method::new("get", MethodKind::RequestExecutor, TypeRef::primitive(Primitive::Void));
        let error = TypeRef::abstraction(Abstraction::ApiException);
        assert!(method.add_error_mapping("4xx", error.clone()));
        assert!(!method.add_error_mapping("4XX", error.clone()));
        assert!(method.add_error_mapping("500", error));
        let codes: Vec<_> = method.error_mappings().iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(codes, ["4XX", "500"]);
    }

    #[test]
    fn test_constructor_rank() {
        assert!(MethodKind::Constructor.constructor_rank() < MethodKind::ClientConstructor.constructor_rank());
        assert!(MethodKind::RawUrlConstructor.is_constructor());
        assert!(!MethodKind::Factory.is_constructor());
    }
}
