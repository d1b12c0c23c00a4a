//! API description loading and the parsed document model.
//!
//! This module is the document-loading collaborator: it performs the file
//! and network I/O and the JSON/YAML parsing, and hands a typed
//! [`ApiDocument`] to the pure resolution pipeline.
//!
//! # Examples
//!
//! ```no_run
//! use sdkgen_core::document::ApiDocument;
//! use sdkgen_core::error::Result;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let document = ApiDocument::from_file_or_url("openapi.yaml").await?;
//! println!("{} {}", document.info.title, document.info.version);
//! # Ok(())
//! # }
//! ```

pub mod operation;
pub mod schema;

// Internal imports (std, crate)
use std::path::Path;

pub use operation::{
    media_type_matches, normalize_media_type, HttpMethod, MediaType, Operation, Parameter,
    ParameterLocation, PathItem, RequestBody, Response,
};
pub use schema::{AdditionalProperties, Discriminator, Schema, SchemaShape, SchemaType};

use crate::{Error, Result};

// External imports (alphabetized)
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::fs;

const SCHEMA_REFERENCE_PREFIX: &str = "#/components/schemas/";
const PARAMETER_REFERENCE_PREFIX: &str = "#/components/parameters/";
const RESPONSE_REFERENCE_PREFIX: &str = "#/components/responses/";
const REQUEST_BODY_REFERENCE_PREFIX: &str = "#/components/requestBodies/";
const MAX_REFERENCE_HOPS: usize = 16;

/// A parsed OpenAPI 3.x description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiDocument {
    #[serde(default)]
    pub openapi: String,

    #[serde(default)]
    pub info: Info,

    #[serde(default)]
    pub servers: Vec<Server>,

    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,

    #[serde(default)]
    pub components: Components,
}

/// Info object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Server object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Server {
    #[serde(default)]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Components object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: IndexMap<String, Schema>,

    #[serde(default)]
    pub parameters: IndexMap<String, Parameter>,

    #[serde(default)]
    pub responses: IndexMap<String, Response>,

    #[serde(rename = "requestBodies", default)]
    pub request_bodies: IndexMap<String, RequestBody>,
}

impl ApiDocument {
    /// Load a description from a file or an http(s) URL (YAML or JSON)
    pub async fn from_file_or_url<P: AsRef<str>>(location: P) -> Result<Self> {
        let location = location.as_ref();

        if location.starts_with("http://") || location.starts_with("https://") {
            return Self::from_url(location).await;
        }

        Self::from_file(location).await
    }

    /// Load a description from a file (YAML or JSON)
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Reading API description from {}", path.display());
        let content = fs::read_to_string(path).await?;
        Self::parse_content(&content).map_err(|e| {
            Error::document(format!(
                "Failed to parse API description at {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Load a description from a URL (YAML or JSON)
    pub async fn from_url(url: &str) -> Result<Self> {
        log::debug!("Fetching API description from {}", url);
        let response = reqwest::get(url).await.map_err(|e| {
            Error::document(format!("Failed to fetch API description from {}: {}", url, e))
        })?;

        if !response.status().is_success() {
            return Err(Error::document(format!(
                "Failed to fetch API description from {}: HTTP {}",
                url,
                response.status()
            )));
        }

        let content = response.text().await.map_err(|e| {
            Error::document(format!("Failed to read response from {}: {}", url, e))
        })?;

        Self::parse_content(&content).map_err(|e| {
            Error::document(format!(
                "Failed to parse API description from {}: {}",
                url, e
            ))
        })
    }

    /// Parse content as either JSON or YAML
    pub fn parse_content(content: &str) -> Result<Self> {
        let json: JsonValue = match serde_json::from_str(content) {
            Ok(json) => json,
            Err(_) => {
                // YAML keys such as `200:` are integers, going through a JSON
                // value turns them into strings
                let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;
                serde_json::to_value(yaml)?
            }
        };
        Self::from_json_value(json)
    }

    /// Build a document from an already parsed JSON value
    pub fn from_json_value(json: JsonValue) -> Result<Self> {
        if json.get("swagger").is_some() {
            return Err(Error::document(
                "Swagger 2.0 descriptions are not supported, convert to OpenAPI 3 first",
            ));
        }
        if !json.is_object() {
            return Err(Error::document("the description root must be an object"));
        }
        Ok(serde_json::from_value(json)?)
    }

    /// First server URL, trailing slash removed
    pub fn base_url(&self) -> Option<String> {
        self.servers
            .first()
            .map(|s| s.url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
    }

    /// Look up a component schema by name
    pub fn component_schema(&self, name: &str) -> Option<&Schema> {
        self.components.schemas.get(name)
    }

    /// Resolve a schema `$ref` to the component name and schema it targets
    pub fn resolve_schema_reference<'a>(
        &'a self,
        reference: &str,
        pointer: &str,
    ) -> Result<(&'a str, &'a Schema)> {
        component_schema_name(reference)
            .and_then(|name| self.components.schemas.get_key_value(name.as_str()))
            .map(|(name, schema)| (name.as_str(), schema))
            .ok_or_else(|| Error::UnresolvedReference {
                reference: reference.to_string(),
                pointer: pointer.to_string(),
            })
    }

    /// Follow `$ref` chains on a parameter
    pub fn resolve_parameter<'a>(
        &'a self,
        parameter: &'a Parameter,
        pointer: &str,
    ) -> Result<&'a Parameter> {
        follow_references(
            parameter,
            |p| p.reference.as_deref(),
            |r| lookup(&self.components.parameters, r, PARAMETER_REFERENCE_PREFIX),
            pointer,
        )
    }

    /// Follow `$ref` chains on a response
    pub fn resolve_response<'a>(
        &'a self,
        response: &'a Response,
        pointer: &str,
    ) -> Result<&'a Response> {
        follow_references(
            response,
            |r| r.reference.as_deref(),
            |r| lookup(&self.components.responses, r, RESPONSE_REFERENCE_PREFIX),
            pointer,
        )
    }

    /// Follow `$ref` chains on a request body
    pub fn resolve_request_body<'a>(
        &'a self,
        body: &'a RequestBody,
        pointer: &str,
    ) -> Result<&'a RequestBody> {
        follow_references(
            body,
            |b| b.reference.as_deref(),
            |r| lookup(&self.components.request_bodies, r, REQUEST_BODY_REFERENCE_PREFIX),
            pointer,
        )
    }

    /// Parameters of an operation merged with those of its path item.
    ///
    /// Operation-level parameters override path-level ones with the same
    /// name and location.
    pub fn effective_parameters<'a>(
        &'a self,
        path_item: &'a PathItem,
        operation: &'a Operation,
        pointer: &str,
    ) -> Result<Vec<&'a Parameter>> {
        let mut merged: Vec<&Parameter> = Vec::new();
        for parameter in path_item.parameters.iter().chain(&operation.parameters) {
            let resolved = self.resolve_parameter(parameter, pointer)?;
            merged.retain(|p| !(p.name == resolved.name && p.location == resolved.location));
            merged.push(resolved);
        }
        Ok(merged)
    }

    /// Visit every schema in the description, depth first, with its JSON pointer
    pub fn for_each_schema(&self, mut visit: impl FnMut(&str, &Schema)) {
        for (name, schema) in &self.components.schemas {
            let pointer = format!("{}{}", SCHEMA_REFERENCE_PREFIX, escape_pointer(name));
            walk_schema(&pointer, schema, &mut visit);
        }
        for (path, item) in &self.paths {
            let path_pointer = format!("#/paths/{}", escape_pointer(path));
            for (index, parameter) in item.parameters.iter().enumerate() {
                if let Some(schema) = &parameter.schema {
                    let pointer = format!("{path_pointer}/parameters/{index}/schema");
                    walk_schema(&pointer, schema, &mut visit);
                }
            }
            for (method, operation) in item.operations() {
                let op_pointer = format!("{path_pointer}/{}", method.as_str().to_lowercase());
                for (index, parameter) in operation.parameters.iter().enumerate() {
                    if let Some(schema) = &parameter.schema {
                        let pointer = format!("{op_pointer}/parameters/{index}/schema");
                        walk_schema(&pointer, schema, &mut visit);
                    }
                }
                if let Some(body) = &operation.request_body {
                    for (media, content) in &body.content {
                        if let Some(schema) = &content.schema {
                            let pointer = format!(
                                "{op_pointer}/requestBody/content/{}/schema",
                                escape_pointer(media)
                            );
                            walk_schema(&pointer, schema, &mut visit);
                        }
                    }
                }
                for (code, response) in &operation.responses {
                    for (media, content) in &response.content {
                        if let Some(schema) = &content.schema {
                            let pointer = format!(
                                "{op_pointer}/responses/{code}/content/{}/schema",
                                escape_pointer(media)
                            );
                            walk_schema(&pointer, schema, &mut visit);
                        }
                    }
                }
            }
        }
    }
}

/// Visit a schema and every schema nested in it, depth first
pub fn walk_schema(pointer: &str, schema: &Schema, visit: &mut impl FnMut(&str, &Schema)) {
    visit(pointer, schema);
    for (name, property) in &schema.properties {
        walk_schema(
            &format!("{pointer}/properties/{}", escape_pointer(name)),
            property,
            visit,
        );
    }
    if let Some(items) = &schema.items {
        walk_schema(&format!("{pointer}/items"), items, visit);
    }
    if let Some(AdditionalProperties::Schema(additional)) = &schema.additional_properties {
        walk_schema(&format!("{pointer}/additionalProperties"), additional, visit);
    }
    for (keyword, members) in [
        ("allOf", &schema.all_of),
        ("oneOf", &schema.one_of),
        ("anyOf", &schema.any_of),
    ] {
        for (index, member) in members.iter().enumerate() {
            walk_schema(&format!("{pointer}/{keyword}/{index}"), member, visit);
        }
    }
}

fn lookup<'a, T>(
    components: &'a IndexMap<String, T>,
    reference: &str,
    prefix: &str,
) -> Option<&'a T> {
    reference
        .strip_prefix(prefix)
        .map(unescape_pointer)
        .and_then(|name| components.get(name.as_str()))
}

fn follow_references<'a, T>(
    start: &'a T,
    reference_of: impl Fn(&T) -> Option<&str>,
    lookup: impl Fn(&str) -> Option<&'a T>,
    pointer: &str,
) -> Result<&'a T> {
    let mut current = start;
    for _ in 0..MAX_REFERENCE_HOPS {
        match reference_of(current) {
            None => return Ok(current),
            Some(reference) => {
                current = lookup(reference).ok_or_else(|| Error::UnresolvedReference {
                    reference: reference.to_string(),
                    pointer: pointer.to_string(),
                })?;
            }
        }
    }
    Err(Error::input(
        pointer,
        "reference chain does not terminate",
    ))
}

/// Component name targeted by a `#/components/schemas/...` reference
pub fn component_schema_name(reference: &str) -> Option<String> {
    reference
        .strip_prefix(SCHEMA_REFERENCE_PREFIX)
        .filter(|name| !name.is_empty())
        .map(unescape_pointer)
}

/// Reference string pointing at a component schema
pub fn component_schema_reference(name: &str) -> String {
    format!("{}{}", SCHEMA_REFERENCE_PREFIX, escape_pointer(name))
}

/// Escape a JSON pointer token
pub fn escape_pointer(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Unescape a JSON pointer token
pub fn unescape_pointer(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    const PETSTORE_YAML: &str = r#"
openapi: 3.0.0
info:
  title: Petstore
  version: 1.0.0
servers:
  - url: https://petstore.example.com/v1/
paths:
  /pets/{petId}:
    parameters:
      - $ref: '#/components/parameters/petId'
    get:
      responses:
        200:
          description: ok
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Pet'
components:
  parameters:
    petId:
      name: petId
      in: path
      required: true
      schema:
        type: string
  schemas:
    Pet:
      type: object
      properties:
        name:
          type: string
"#;

    #[test]
    fn test_parse_yaml_with_integer_status_codes() {
        let document = ApiDocument::parse_content(PETSTORE_YAML).unwrap();
        assert_eq!(document.info.title, "Petstore");
        let item = &document.paths["/pets/{petId}"];
        let operation = item.get.as_ref().unwrap();
        assert!(operation.responses.contains_key("200"));
        assert_eq!(
            document.base_url().as_deref(),
            Some("https://petstore.example.com/v1")
        );
    }

    #[test]
    fn test_parse_json() {
        let content = json!({
            "openapi": "3.1.0",
            "info": {"title": "T", "version": "1"},
            "paths": {}
        })
        .to_string();
        let document = ApiDocument::parse_content(&content).unwrap();
        assert_eq!(document.openapi, "3.1.0");
    }

    #[test]
    fn test_swagger_is_rejected() {
        let err = ApiDocument::parse_content(r#"{"swagger": "2.0"}"#).unwrap_err();
        assert!(err.to_string().contains("Swagger 2.0"));
    }

    #[test]
    fn test_parameter_references_are_followed() {
        let document = ApiDocument::parse_content(PETSTORE_YAML).unwrap();
        let item = &document.paths["/pets/{petId}"];
        let operation = item.get.as_ref().unwrap();
        let parameters = document
            .effective_parameters(item, operation, "#/paths/~1pets~1{petId}/get")
            .unwrap();
        assert_eq!(parameters.len(), 1);
        assert_eq!(parameters[0].name, "petId");
        assert!(parameters[0].is_in(ParameterLocation::Path));
    }

    #[test]
    fn test_unresolved_schema_reference() {
        let document = ApiDocument::parse_content(PETSTORE_YAML).unwrap();
        let err = document
            .resolve_schema_reference("#/components/schemas/Missing", "#/x")
            .unwrap_err();
        assert!(matches!(err, Error::UnresolvedReference { .. }));
        let (name, _) = document
            .resolve_schema_reference("#/components/schemas/Pet", "#/x")
            .unwrap();
        assert_eq!(name, "Pet");
    }

    #[test]
    fn test_for_each_schema_visits_nested_schemas() {
        let document = ApiDocument::parse_content(PETSTORE_YAML).unwrap();
        let mut pointers = Vec::new();
        document.for_each_schema(|pointer, _| pointers.push(pointer.to_string()));
        assert!(pointers.contains(&"#/components/schemas/Pet/properties/name".to_string()));
        assert!(pointers
            .iter()
            .any(|p| p.starts_with("#/paths/~1pets~1{petId}/get/responses/200")));
    }

    #[test]
    fn test_pointer_escaping() {
        assert_eq!(escape_pointer("/a~b"), "~1a~0b");
        assert_eq!(unescape_pointer("~1a~0b"), "/a~b");
        assert_eq!(
            component_schema_name("#/components/schemas/microsoft.graph.user").as_deref(),
            Some("microsoft.graph.user")
        );
    }

    #[tokio::test]
    async fn test_from_file_or_url_reads_files() -> crate::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("openapi.yaml");
        tokio::fs::write(&path, PETSTORE_YAML).await?;

        let document = ApiDocument::from_file_or_url(path.to_string_lossy()).await?;
        assert!(document.component_schema("Pet").is_some());
        Ok(())
    }
}
