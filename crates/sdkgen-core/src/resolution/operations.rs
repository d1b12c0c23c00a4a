//! Executor and generator methods of request builders, with their helper classes.

use super::url_tree::{NodeOperation, UrlNode};
use super::{InlineScope, Resolver};
use crate::diagnostics::Diagnostic;
use crate::document::{
    escape_pointer, media_type_matches, normalize_media_type, MediaType, ParameterLocation,
};
use crate::ir::{
    Abstraction, Class, ClassId, ClassKind, Deprecation, Documentation, Method, MethodKind,
    NamespaceId, Parameter, ParameterKind, Primitive, Property, PropertyKind, TypeRef,
};
use crate::naming::{
    avoid_structural_names, cleanup_symbol_name, sanitize_parameter_name_for_url_template,
    to_first_lower, to_first_upper,
};
use crate::Result;

// External imports (alphabetized)
use indexmap::IndexMap;

pub const SKIPPED_OPERATION: &str = "SkippedOperation";
pub const PRIMITIVE_ERROR_SCHEMA: &str = "PrimitiveErrorSchema";

/// Success codes whose schema can become the response type, in priority order
const SUCCESS_CODES: [&str; 6] = ["200", "201", "202", "203", "206", "2XX"];

/// Everything an operation needs, resolved before any member is declared
struct ResolvedOperation {
    return_type: TypeRef,
    accepted_response_types: Vec<String>,
    body: Option<(TypeRef, String)>,
    error_mappings: Vec<(String, TypeRef)>,
    query_parameters: Vec<Property>,
}

impl<'a, 'd> Resolver<'a, 'd> {
    /// Operations of a node that can be generated; the others are reported and skipped
    pub(super) fn checked_operations(&mut self, node: &UrlNode<'a>) -> Result<Vec<NodeOperation<'a>>> {
        let mut kept = Vec::with_capacity(node.operations.len());
        for operation in &node.operations {
            let pointer = operation.pointer();
            match self
                .analysis
                .check_operation(operation.path_item, operation.operation, &pointer)
            {
                Ok(()) => kept.push(*operation),
                Err(e) if e.is_run_fatal() => return Err(e),
                Err(e) => {
                    log::debug!("skipping {} {}: {}", operation.method, operation.path, e);
                    self.report(Diagnostic::from_error(SKIPPED_OPERATION, &e));
                }
            }
        }
        Ok(kept)
    }

    /// Declare the executor, the generator and the helper classes of one operation
    pub(super) fn add_operation(&mut self, builder: ClassId, operation: &NodeOperation<'a>) -> Result<()> {
        let builder_name = self.model.class(builder).name.clone();
        let namespace = self.model.class(builder).namespace();
        let verb = operation.method.pascal_name();
        let prefix = format!("{}{}", builder_name, verb);
        let resolved = self.resolve_operation(operation, &prefix, namespace)?;

        let query_class = if resolved.query_parameters.is_empty() {
            None
        } else {
            let mut class = Class::new(format!("{}QueryParameters", prefix), ClassKind::QueryParameterContainer);
            class.documentation = Documentation::new(operation.operation.documentation());
            for property in resolved.query_parameters {
                add_unique_property(&mut class, property);
            }
            Some(self.model.add_inner_class(builder, class)?)
        };

        let mut configuration = Class::new(format!("{}RequestConfiguration", prefix), ClassKind::RequestConfiguration);
        configuration.documentation = Documentation::new(Some(
            "Configuration for the request such as headers, query parameters, and middleware options.",
        ));
        configuration.add_property(
            Property::new("headers", PropertyKind::Headers, TypeRef::abstraction(Abstraction::RequestHeaders))
                .with_documentation(Documentation::new(Some("Request headers"))),
        );
        configuration.add_property(
            Property::new(
                "options",
                PropertyKind::Options,
                TypeRef::abstraction(Abstraction::RequestOption).into_collection(),
            )
            .with_documentation(Documentation::new(Some("Request options"))),
        );
        if let Some(query_id) = query_class {
            let query_ref = TypeRef::class(self.model.class(query_id).name.clone(), query_id).with_nullable(true);
            configuration.add_property(
                Property::new("queryParameters", PropertyKind::Custom, query_ref)
                    .with_documentation(Documentation::new(Some("Request query parameters"))),
            );
        }
        let configuration_id = self.model.add_inner_class(builder, configuration)?;
        let configuration_ref =
            TypeRef::class(self.model.class(configuration_id).name.clone(), configuration_id).with_nullable(true);

        let mut documentation = Documentation::new(operation.operation.documentation());
        documentation.external_link = operation.operation.external_docs.as_ref().map(|d| d.url.clone());
        let deprecation = Deprecation::from_schema(
            operation.operation.deprecated,
            operation.operation.extensions.get("x-ms-deprecation"),
        );
        let body_parameter = resolved.body.as_ref().map(|(type_ref, _)| {
            Parameter::new("body", ParameterKind::RequestBody, type_ref.clone().with_nullable(false))
                .with_documentation(Documentation::new(Some("The request body")))
        });
        let configuration_parameter = Parameter::new(
            "requestConfiguration",
            ParameterKind::RequestConfiguration,
            configuration_ref,
        )
        .optional()
        .with_documentation(Documentation::new(Some(
            "Configuration for the request such as headers, query parameters, and middleware options.",
        )));
        let content_type = resolved.body.as_ref().map(|(_, media)| media.clone());

        let return_type = if resolved.return_type.is_void() {
            resolved.return_type
        } else {
            resolved.return_type.with_nullable(true)
        };
        let mut executor = Method::new(
            operation.method.as_str().to_lowercase(),
            MethodKind::RequestExecutor,
            return_type,
        );
        executor.is_async = true;
        executor.http_method = Some(operation.method);
        executor.accepted_response_types = resolved.accepted_response_types.clone();
        executor.request_body_content_type = content_type.clone();
        executor.documentation = documentation.clone();
        executor.deprecation = deprecation.clone();
        executor.parameters.extend(body_parameter.clone());
        executor.parameters.push(configuration_parameter.clone());
        executor.parameters.push(
            Parameter::new(
                "cancellationToken",
                ParameterKind::Cancellation,
                TypeRef::abstraction(Abstraction::CancellationToken),
            )
            .optional()
            .with_documentation(Documentation::new(Some(
                "Cancellation token to use when cancelling requests",
            ))),
        );
        for (code, type_ref) in resolved.error_mappings {
            executor.add_error_mapping(&code, type_ref);
        }

        let mut generator = Method::new(
            format!("to{}RequestInformation", verb),
            MethodKind::RequestGenerator,
            TypeRef::abstraction(Abstraction::RequestInformation),
        );
        generator.http_method = Some(operation.method);
        generator.accepted_response_types = resolved.accepted_response_types;
        generator.request_body_content_type = content_type;
        generator.documentation = documentation;
        generator.deprecation = deprecation;
        generator.parameters.extend(body_parameter);
        generator.parameters.push(configuration_parameter);

        log::trace!("{} {} on {}", operation.method, operation.path, builder_name);
        let class = self.model.class_mut(builder);
        class.add_method(executor);
        class.add_method(generator);
        Ok(())
    }

    fn resolve_operation(
        &mut self,
        operation: &NodeOperation<'a>,
        prefix: &str,
        namespace: NamespaceId,
    ) -> Result<ResolvedOperation> {
        let pointer = operation.pointer();
        let (return_type, accepted_response_types) = self.response_type(operation, prefix, namespace, &pointer)?;
        let body = self.request_body(operation, prefix, namespace, &pointer)?;
        let error_mappings = self.error_mappings(operation, prefix, namespace, &pointer)?;

        let mut query_parameters = Vec::new();
        let parameters = self
            .document
            .effective_parameters(operation.path_item, operation.operation, &pointer)?;
        for (index, parameter) in parameters.into_iter().enumerate() {
            if !parameter.is_in(ParameterLocation::Query) {
                continue;
            }
            let type_ref = match &parameter.schema {
                Some(schema) => {
                    let scope = InlineScope::new(
                        namespace,
                        format!("{}{}QueryParameterType", prefix, to_first_upper(&cleanup_symbol_name(&parameter.name))),
                    );
                    self.resolve_schema(schema, &scope, &format!("{}/parameters/{}/schema", pointer, index))?
                }
                None => TypeRef::primitive(Primitive::String),
            };
            let name = avoid_structural_names(to_first_lower(&cleanup_symbol_name(&parameter.name)));
            let mut property = Property::new(
                name,
                PropertyKind::QueryParameter,
                type_ref.with_nullable(!parameter.required),
            )
            .with_serialization_name(sanitize_parameter_name_for_url_template(&parameter.name))
            .with_documentation(Documentation::new(parameter.description.as_deref()));
            property.deprecation = Deprecation::from_schema(parameter.deprecated, None);
            query_parameters.push(property);
        }

        Ok(ResolvedOperation {
            return_type,
            accepted_response_types,
            body,
            error_mappings,
            query_parameters,
        })
    }

    /// Response type and the accepted media types, structured ones first
    fn response_type(
        &mut self,
        operation: &NodeOperation<'a>,
        prefix: &str,
        namespace: NamespaceId,
        pointer: &str,
    ) -> Result<(TypeRef, Vec<String>)> {
        let responses = &operation.operation.responses;
        let mut declared: Vec<String> = Vec::new();
        for (code, response) in responses {
            if !code.starts_with('2') {
                continue;
            }
            let response = self.document.resolve_response(response, pointer)?;
            for media in response.content.keys() {
                let media = normalize_media_type(media);
                if !declared.contains(&media) {
                    declared.push(media);
                }
            }
        }
        let structured = &self.config.structured_mime_types;
        declared.sort_by_key(|media| {
            structured
                .iter()
                .position(|s| media_type_matches(media, s))
                .unwrap_or(usize::MAX)
        });

        for code in SUCCESS_CODES {
            let Some((key, response)) = responses.iter().find(|(k, _)| k.eq_ignore_ascii_case(code)) else {
                continue;
            };
            let response = self.document.resolve_response(response, pointer)?;
            if let Some((media, schema)) = self.structured_schema(&response.content) {
                let scope = InlineScope::new(namespace, format!("{}Response", prefix));
                let schema_pointer = format!(
                    "{}/responses/{}/content/{}/schema",
                    pointer,
                    escape_pointer(key),
                    escape_pointer(media)
                );
                let type_ref = self.resolve_schema(schema, &scope, &schema_pointer)?;
                return Ok((type_ref, declared));
            }
        }

        let fallback = if declared.is_empty() {
            TypeRef::primitive(Primitive::Void)
        } else if declared.iter().any(|media| media == "text/plain") {
            TypeRef::primitive(Primitive::String)
        } else {
            TypeRef::primitive(Primitive::Binary)
        };
        Ok((fallback, declared))
    }

    fn request_body(
        &mut self,
        operation: &NodeOperation<'a>,
        prefix: &str,
        namespace: NamespaceId,
        pointer: &str,
    ) -> Result<Option<(TypeRef, String)>> {
        let Some(body) = &operation.operation.request_body else {
            return Ok(None);
        };
        let body = self.document.resolve_request_body(body, pointer)?;
        if let Some((media, schema)) = self.structured_schema(&body.content) {
            let scope = InlineScope::new(namespace, format!("{}RequestBody", prefix));
            let schema_pointer = format!("{}/requestBody/content/{}/schema", pointer, escape_pointer(media));
            let type_ref = self.resolve_schema(schema, &scope, &schema_pointer)?;
            return Ok(Some((type_ref, normalize_media_type(media))));
        }
        Ok(body
            .content
            .keys()
            .next()
            .map(|media| (TypeRef::primitive(Primitive::Binary), normalize_media_type(media))))
    }

    /// Error types keyed by status code or range, `default` filling the ranges
    fn error_mappings(
        &mut self,
        operation: &NodeOperation<'a>,
        prefix: &str,
        namespace: NamespaceId,
        pointer: &str,
    ) -> Result<Vec<(String, TypeRef)>> {
        let mut mappings: Vec<(String, TypeRef)> = Vec::new();
        let mut fallback: Option<TypeRef> = None;
        for (code, response) in &operation.operation.responses {
            let code_upper = code.to_ascii_uppercase();
            let is_default = code_upper == "DEFAULT";
            if !is_default && !is_error_code(&code_upper) {
                continue;
            }
            let response = self.document.resolve_response(response, pointer)?;
            let Some((media, schema)) = self.structured_schema(&response.content) else {
                continue;
            };
            let scope = InlineScope::new(namespace, format!("{}{}Error", prefix, to_first_upper(&code.to_ascii_lowercase())));
            let schema_pointer = format!(
                "{}/responses/{}/content/{}/schema",
                pointer,
                escape_pointer(code),
                escape_pointer(media)
            );
            let type_ref = self.resolve_schema(schema, &scope, &schema_pointer)?;
            let Some(class_id) = type_ref.class_id().filter(|_| !type_ref.is_collection()) else {
                self.report(
                    Diagnostic::warning(
                        PRIMITIVE_ERROR_SCHEMA,
                        format!("error response {} does not describe an object and is ignored", code),
                    )
                    .with_pointer(schema_pointer),
                );
                continue;
            };
            self.model.class_mut(class_id).is_error_definition = true;
            let type_ref = type_ref.with_nullable(false);
            if is_default {
                fallback = Some(type_ref);
            } else {
                mappings.push((code_upper, type_ref));
            }
        }
        if let Some(fallback) = fallback {
            for range in ["4XX", "5XX"] {
                if !mappings.iter().any(|(code, _)| code == range) {
                    mappings.push((range.to_string(), fallback.clone()));
                }
            }
        }
        Ok(mappings)
    }

    /// First media type, in structured priority order, that carries a schema
    fn structured_schema<'m>(
        &self,
        content: &'m IndexMap<String, MediaType>,
    ) -> Option<(&'m str, &'m crate::document::Schema)> {
        self.config.structured_mime_types.iter().find_map(|structured| {
            content
                .iter()
                .filter(|(media, _)| media_type_matches(media, structured))
                .find_map(|(media, content)| content.schema.as_ref().map(|s| (media.as_str(), s)))
        })
    }

}

/// Add a query parameter, suffixing its name when a cleaned-up name collides
fn add_unique_property(class: &mut Class, property: Property) {
    let mut candidate = property.name.clone();
    let mut counter = 1;
    while class.property(&candidate).is_some() {
        candidate = format!("{}{}", property.name, counter);
        counter += 1;
    }
    class.add_property(Property {
        name: candidate,
        ..property
    });
}

/// `4XX`, `5XX` or a numeric code from 400 to 599
fn is_error_code(code: &str) -> bool {
    code == "4XX"
        || code == "5XX"
        || code
            .parse::<u16>()
            .map(|c| (400..600).contains(&c))
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::super::tests::{build, class_named};
    use super::{is_error_code, PRIMITIVE_ERROR_SCHEMA, SKIPPED_OPERATION};
    use crate::document::HttpMethod;
    use crate::ir::{ClassKind, MethodKind, ParameterKind, Primitive, PropertyKind};
    use serde_json::json;

    #[test]
    fn test_users_item_get_and_patch() {
        let (model, diagnostics) = build(json!({
            "openapi": "3.0.0",
            "info": {"title": "t", "version": "1"},
            "paths": {
                "/users/{id}": {
                    "get": {
                        "summary": "Get a user",
                        "externalDocs": {"url": "https://docs.example.com/users"},
                        "parameters": [{"name": "$select", "in": "query", "schema": {"type": "array", "items": {"type": "string"}}}],
                        "responses": {
                            "200": {"description": "ok", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/User"}}}},
                            "404": {"description": "missing", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Error"}}}},
                            "default": {"description": "err", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Error"}}}}
                        }
                    },
                    "patch": {
                        "requestBody": {"required": true, "content": {"application/json": {"schema": {"$ref": "#/components/schemas/User"}}}},
                        "responses": {"204": {"description": "done"}}
                    }
                }
            },
            "components": {"schemas": {
                "User": {"type": "object", "properties": {"id": {"type": "string"}}},
                "Error": {"type": "object", "properties": {"message": {"type": "string"}}}
            }}
        }));
        assert!(!diagnostics.has_errors());
        let users = class_named(&model, "ApiSdk.users", "UsersRequestBuilder");
        assert_eq!(model.class(users).indexers().len(), 1);
        assert_eq!(model.class(users).indexers()[0].serialization_name, "id");

        let item = class_named(&model, "ApiSdk.users.item", "WithIdItemRequestBuilder");
        let class = model.class(item);
        let executors: Vec<_> = class
            .methods()
            .iter()
            .filter(|m| m.kind == MethodKind::RequestExecutor)
            .collect();
        assert_eq!(executors.len(), 2);
        assert_eq!(executors[0].http_method, Some(HttpMethod::Get));
        assert_eq!(executors[1].http_method, Some(HttpMethod::Patch));
        let generators: Vec<_> = class
            .methods()
            .iter()
            .filter(|m| m.kind == MethodKind::RequestGenerator)
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(generators, ["toGetRequestInformation", "toPatchRequestInformation"]);

        let get = executors[0];
        assert!(get.is_async);
        assert_eq!(get.return_type.name, "User");
        assert!(get.return_type.nullable);
        assert_eq!(get.accepted_response_types, ["application/json"]);
        assert_eq!(get.documentation.external_link.as_deref(), Some("https://docs.example.com/users"));
        let codes: Vec<_> = get.error_mappings().iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(codes, ["404", "4XX", "5XX"]);
        let error = class_named(&model, "ApiSdk.models", "Error");
        assert!(model.class(error).is_error_definition);
        assert!(get.parameter_of_kind(ParameterKind::Cancellation).unwrap().optional);

        let patch = executors[1];
        assert!(patch.return_type.is_void());
        assert_eq!(patch.parameters[0].kind, ParameterKind::RequestBody);
        assert_eq!(patch.request_body_content_type.as_deref(), Some("application/json"));

        let inner: Vec<_> = class
            .inner_classes()
            .iter()
            .map(|id| (model.class(*id).name.as_str(), model.class(*id).kind))
            .collect();
        assert_eq!(
            inner,
            [
                ("WithIdItemRequestBuilderGetQueryParameters", ClassKind::QueryParameterContainer),
                ("WithIdItemRequestBuilderGetRequestConfiguration", ClassKind::RequestConfiguration),
                ("WithIdItemRequestBuilderPatchRequestConfiguration", ClassKind::RequestConfiguration),
            ]
        );
        let query = model.class(class.inner_classes()[0]);
        let select = query.property("select").unwrap();
        assert_eq!(select.kind, PropertyKind::QueryParameter);
        assert_eq!(select.wire_name(), "%24select");
        assert!(select.type_ref.is_collection());
    }

    #[test]
    fn test_fallback_response_types_and_inline_names() {
        let (model, diagnostics) = build(json!({
            "openapi": "3.0.0",
            "info": {"title": "t", "version": "1"},
            "paths": {
                "/files": {
                    "get": {"responses": {"200": {"description": "ok", "content": {"application/octet-stream": {}}}}},
                    "post": {
                        "requestBody": {"content": {"application/json": {"schema": {"type": "object", "properties": {"name": {"type": "string"}}}}}},
                        "responses": {
                            "201": {"description": "ok", "content": {"application/json": {"schema": {"type": "object", "properties": {"id": {"type": "string"}}}}}},
                            "500": {"description": "err", "content": {"application/json": {"schema": {"type": "string"}}}}
                        }
                    },
                    "put": {"responses": {"200": {"description": "ok", "content": {"text/plain": {}}}}}
                }
            }
        }));
        let files = class_named(&model, "ApiSdk.files", "FilesRequestBuilder");
        let executor = |name: &str| {
            model
                .class(files)
                .methods()
                .iter()
                .find(|m| m.kind == MethodKind::RequestExecutor && m.name == name)
                .unwrap()
                .clone()
        };
        assert_eq!(executor("get").return_type.as_primitive(), Some(Primitive::Binary));
        assert_eq!(executor("put").return_type.as_primitive(), Some(Primitive::String));
        let post = executor("post");
        assert_eq!(post.return_type.name, "FilesRequestBuilderPostResponse");
        assert_eq!(post.parameters[0].type_ref.name, "FilesRequestBuilderPostRequestBody");
        assert!(post.error_mappings().is_empty());
        class_named(&model, "ApiSdk.files", "FilesRequestBuilderPostResponse");
        assert!(diagnostics.contains_code(PRIMITIVE_ERROR_SCHEMA));
    }

    #[test]
    fn test_invalid_dependency_skips_the_operation() {
        let (model, diagnostics) = build(json!({
            "openapi": "3.0.0",
            "info": {"title": "t", "version": "1"},
            "paths": {
                "/things": {
                    "get": {"responses": {"200": {"description": "ok", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/C"}}}}}},
                    "delete": {"responses": {"204": {"description": "gone"}}}
                }
            },
            "components": {"schemas": {
                "A": {"type": "object", "discriminator": {"propertyName": "k"}, "properties": {"k": {"type": "string"}}},
                "B": {"type": "object", "discriminator": {"propertyName": "k"}, "properties": {"k": {"type": "string"}}},
                "C": {"allOf": [{"$ref": "#/components/schemas/A"}, {"$ref": "#/components/schemas/B"}]}
            }}
        }));
        assert!(diagnostics.contains_code(SKIPPED_OPERATION));
        let things = class_named(&model, "ApiSdk.things", "ThingsRequestBuilder");
        let verbs: Vec<_> = model
            .class(things)
            .methods()
            .iter()
            .filter(|m| m.kind == MethodKind::RequestExecutor)
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(verbs, ["delete"]);
    }

    #[test]
    fn test_error_codes() {
        assert!(is_error_code("404"));
        assert!(is_error_code("5XX"));
        assert!(!is_error_code("302"));
        assert!(!is_error_code("600"));
    }
}
