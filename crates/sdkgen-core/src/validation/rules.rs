//! Individual validation predicates.

// Internal imports (std, crate)
use crate::document::{
    escape_pointer, normalize_media_type, ApiDocument, HttpMethod, MediaType, Operation, Schema,
    SchemaShape,
};

// External imports (alphabetized)
use indexmap::IndexMap;

const FORM_URL_ENCODED: &str = "application/x-www-form-urlencoded";

const STRING_FORMATS: &[&str] = &[
    "base64url",
    "binary",
    "byte",
    "char",
    "commonmark",
    "date",
    "date-time",
    "duration",
    "email",
    "hostname",
    "html",
    "idn-email",
    "idn-hostname",
    "ipv4",
    "ipv6",
    "iri",
    "iri-reference",
    "json-pointer",
    "password",
    "regex",
    "relative-json-pointer",
    "time",
    "unknown",
    "uri",
    "uri-reference",
    "uri-template",
    "uuid",
];
const INTEGER_FORMATS: &[&str] = &["int8", "int16", "int32", "int64", "uint8", "uint16"];
const NUMBER_FORMATS: &[&str] = &[
    "decimal", "double", "float", "int8", "int16", "int32", "int64", "uint8", "uint16",
];

/// Formats that are recognized but map to a plain string
const UNSUPPORTED_FORMATS: &[&str] = &[
    "email",
    "hostname",
    "idn-email",
    "idn-hostname",
    "ipv4",
    "ipv6",
    "iri",
    "iri-reference",
    "json-pointer",
    "regex",
    "relative-json-pointer",
    "uri",
    "uri-reference",
    "uri-template",
];

/// Sink taking a JSON pointer and a message
pub(super) type Report<'r> = dyn FnMut(String, String) + 'r;

pub(super) fn no_server_entry(document: &ApiDocument, report: &mut Report<'_>) {
    if document.servers.iter().all(|s| s.url.trim().is_empty()) {
        report(
            "#/servers".to_string(),
            "no server entry is declared, the client will need a base URL at runtime".to_string(),
        );
    }
}

pub(super) fn multiple_server_entries(document: &ApiDocument, report: &mut Report<'_>) {
    if document.servers.len() > 1 {
        report(
            "#/servers".to_string(),
            format!(
                "{} server entries are declared, only the first one is used",
                document.servers.len()
            ),
        );
    }
}

pub(super) fn get_with_body(document: &ApiDocument, report: &mut Report<'_>) {
    for (pointer, method, operation) in operations(document) {
        if method == HttpMethod::Get && operation.request_body.is_some() {
            report(
                format!("{pointer}/requestBody"),
                "a GET operation should not declare a request body".to_string(),
            );
        }
    }
}

pub(super) fn no_content_with_body(document: &ApiDocument, report: &mut Report<'_>) {
    for (pointer, _, operation) in operations(document) {
        let Some(response) = operation.responses.get("204") else {
            continue;
        };
        let pointer = format!("{pointer}/responses/204");
        let content = document
            .resolve_response(response, &pointer)
            .map(|r| &r.content)
            .unwrap_or(&response.content);
        if !content.is_empty() {
            report(
                pointer,
                "a 204 response should not declare a body, its content is ignored".to_string(),
            );
        }
    }
}

pub(super) fn divergent_response_schema(document: &ApiDocument, report: &mut Report<'_>) {
    for (pointer, _, operation) in operations(document) {
        let pointer = format!("{pointer}/responses");
        let mut signatures: Vec<String> = Vec::new();
        for (code, response) in &operation.responses {
            if !is_success_code(code) {
                continue;
            }
            let Ok(response) = document.resolve_response(response, &pointer) else {
                continue;
            };
            for schema in response.content.values().filter_map(|m| m.schema.as_ref()) {
                let signature = schema.signature();
                if !signatures.contains(&signature) {
                    signatures.push(signature);
                }
            }
        }
        if signatures.len() > 1 {
            report(
                pointer,
                "success responses declare different schemas, only the first one is used"
                    .to_string(),
            );
        }
    }
}

pub(super) fn missing_discriminator(document: &ApiDocument, report: &mut Report<'_>) {
    document.for_each_schema(|pointer, schema| {
        if schema.discriminator.is_some() {
            return;
        }
        let members = if schema.one_of.is_empty() {
            &schema.any_of
        } else {
            &schema.one_of
        };
        let objects = members
            .iter()
            .filter(|member| is_object_like(document, member))
            .count();
        if objects > 1 {
            report(
                pointer.to_string(),
                format!(
                    "composed schema with {objects} object members has no discriminator, deserialization falls back to the first match"
                ),
            );
        }
    });
}

pub(super) fn inconsistent_type_format_pair(document: &ApiDocument, report: &mut Report<'_>) {
    document.for_each_schema(|pointer, schema| {
        let (Some(primary), Some(format)) = (schema.primary_type(), schema.format.as_deref())
        else {
            return;
        };
        let format = format.to_lowercase();
        let allowed: &[&str] = match primary {
            "string" => STRING_FORMATS,
            "integer" => INTEGER_FORMATS,
            "number" => NUMBER_FORMATS,
            "boolean" => &[],
            _ => return,
        };
        if is_known_format(&format) && !allowed.contains(&format.as_str()) {
            report(
                pointer.to_string(),
                format!("format '{format}' is not consistent with type '{primary}'"),
            );
        }
    });
}

pub(super) fn known_and_not_supported_formats(document: &ApiDocument, report: &mut Report<'_>) {
    document.for_each_schema(|pointer, schema| {
        if let Some(format) = schema.format.as_deref() {
            let format = format.to_lowercase();
            if UNSUPPORTED_FORMATS.contains(&format.as_str()) {
                report(
                    pointer.to_string(),
                    format!("format '{format}' is not supported and is generated as a string"),
                );
            }
        }
    });
}

pub(super) fn url_form_encoded_complex(document: &ApiDocument, report: &mut Report<'_>) {
    for (pointer, _, operation) in operations(document) {
        if let Some(body) = &operation.request_body {
            let body_pointer = format!("{pointer}/requestBody");
            if let Ok(body) = document.resolve_request_body(body, &body_pointer) {
                check_form_content(document, &body.content, &body_pointer, report);
            }
        }
        for (code, response) in &operation.responses {
            let response_pointer = format!("{pointer}/responses/{code}");
            if let Ok(response) = document.resolve_response(response, &response_pointer) {
                check_form_content(document, &response.content, &response_pointer, report);
            }
        }
    }
}

fn check_form_content(
    document: &ApiDocument,
    content: &IndexMap<String, MediaType>,
    pointer: &str,
    report: &mut Report<'_>,
) {
    for (media, media_type) in content {
        if normalize_media_type(media) != FORM_URL_ENCODED {
            continue;
        }
        let Some(schema) = &media_type.schema else {
            continue;
        };
        let pointer = format!("{pointer}/content/{}/schema", escape_pointer(media));
        let target = dereference(document, schema);
        if target.shape() != SchemaShape::Object {
            report(
                pointer,
                "form encoded payloads must be objects".to_string(),
            );
            continue;
        }
        let mut properties = Vec::new();
        all_of_properties(document, target, &mut properties, &mut Vec::new());
        for (name, property) in properties {
            if is_object_like(document, property) {
                report(
                    format!("{pointer}/properties/{}", escape_pointer(name)),
                    format!("property '{name}' is an object, form encoding only supports flat payloads"),
                );
            }
        }
    }
}

pub(super) fn unsupported_inheritance(document: &ApiDocument, report: &mut Report<'_>) {
    for_each_redefinition(document, |pointer, name, first, second| {
        if first.signature() != second.signature() {
            report(
                pointer,
                format!("property '{name}' is redefined with an incompatible type across allOf members"),
            );
        }
    });
}

pub(super) fn conflicting_all_of_defaults(document: &ApiDocument, report: &mut Report<'_>) {
    for_each_redefinition(document, |pointer, name, first, second| {
        if let (Some(a), Some(b)) = (&first.default, &second.default) {
            if a != b {
                report(
                    pointer,
                    format!("property '{name}' has conflicting default values {a} and {b}"),
                );
            }
        }
    });
}

/// Call `visit` for each later definition of a property merged from allOf members
fn for_each_redefinition(
    document: &ApiDocument,
    mut visit: impl FnMut(String, &str, &Schema, &Schema),
) {
    document.for_each_schema(|pointer, schema| {
        if schema.all_of.is_empty() {
            return;
        }
        let mut properties = Vec::new();
        all_of_properties(document, schema, &mut properties, &mut Vec::new());
        for (index, (name, definition)) in properties.iter().enumerate() {
            if let Some((_, first)) = properties[..index].iter().find(|(n, _)| n == name) {
                let property_pointer = format!("{pointer}/properties/{}", escape_pointer(name));
                visit(property_pointer, name, first, definition);
            }
        }
    });
}

/// Properties contributed by every allOf member, inherited ones first, duplicates kept
fn all_of_properties<'a>(
    document: &'a ApiDocument,
    schema: &'a Schema,
    properties: &mut Vec<(&'a str, &'a Schema)>,
    visited: &mut Vec<&'a str>,
) {
    for member in &schema.all_of {
        match &member.reference {
            Some(reference) => {
                let Ok((name, target)) = document.resolve_schema_reference(reference, "") else {
                    continue;
                };
                if visited.contains(&name) {
                    continue;
                }
                visited.push(name);
                all_of_properties(document, target, properties, visited);
            }
            None => all_of_properties(document, member, properties, visited),
        }
    }
    properties.extend(schema.properties.iter().map(|(n, s)| (n.as_str(), s)));
}

/// Follow `$ref` chains, stopping on cycles and dangling references
fn dereference<'a>(document: &'a ApiDocument, schema: &'a Schema) -> &'a Schema {
    let mut current = schema;
    let mut seen: Vec<&str> = Vec::new();
    while let Some(reference) = current.reference.as_deref() {
        if seen.contains(&reference) {
            break;
        }
        seen.push(reference);
        match document.resolve_schema_reference(reference, "") {
            Ok((_, target)) => current = target,
            Err(_) => break,
        }
    }
    current
}

fn is_object_like(document: &ApiDocument, schema: &Schema) -> bool {
    let target = dereference(document, schema);
    if target.reference.is_some() {
        return false;
    }
    match target.shape() {
        SchemaShape::Object => true,
        SchemaShape::Union | SchemaShape::Intersection => target
            .one_of
            .iter()
            .chain(&target.any_of)
            .any(|member| dereference(document, member).shape() == SchemaShape::Object),
        _ => false,
    }
}

fn is_known_format(format: &str) -> bool {
    STRING_FORMATS
        .iter()
        .chain(INTEGER_FORMATS)
        .chain(NUMBER_FORMATS)
        .any(|known| *known == format)
}

fn is_success_code(code: &str) -> bool {
    code.eq_ignore_ascii_case("2XX") || (code.len() == 3 && code.starts_with('2'))
}

fn operations(document: &ApiDocument) -> Vec<(String, HttpMethod, &Operation)> {
    document
        .paths
        .iter()
        .flat_map(|(path, item)| {
            let path_pointer = format!("#/paths/{}", escape_pointer(path));
            item.operations().map(move |(method, operation)| {
                (
                    format!("{path_pointer}/{}", method.as_str().to_lowercase()),
                    method,
                    operation,
                )
            })
        })
        .collect()
}
