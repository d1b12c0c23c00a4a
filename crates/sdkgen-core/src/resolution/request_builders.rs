//! Request builder classes mirroring the URL tree.

// Internal imports (std, crate)
use std::collections::BTreeMap;

use super::url_tree::{NodeOperation, UrlNode, UrlTree};
use super::{type_name, Resolver};
use crate::document::{HttpMethod, ParameterLocation};
use crate::ir::{
    Abstraction, Access, Class, ClassId, ClassKind, Documentation, Indexer, Method, MethodKind,
    Parameter, ParameterKind, Primitive, Property, PropertyKind, TypeRef,
};
use crate::naming::{
    cleanup_symbol_name, path_parameters, replace_path_parameters,
    sanitize_parameter_name_for_url_template, to_first_lower, to_first_upper,
};
use crate::Result;

// External imports (alphabetized)
use serde_json::Value as JsonValue;

impl<'a, 'd> Resolver<'a, 'd> {
    /// Declare the client class and one builder per URL tree node
    pub(super) fn build_request_builders(&mut self, tree: &UrlTree<'a>) -> Result<()> {
        let namespace = self.model.add_namespace(&self.config.client_namespace_name);
        let mut client = Class::new(self.config.client_class_name.clone(), ClassKind::RequestBuilder);
        client.documentation = Documentation::new(Some(
            "The main entry point of the SDK, exposes the configuration and the fluent API.",
        ));
        let client_id = self.model.add_class(namespace, client)?;

        let base_url = self
            .config
            .base_url
            .as_ref()
            .map(|url| url.as_str().trim_end_matches('/').to_string())
            .or_else(|| self.document.base_url());
        let mut constructor = Method::new(
            "constructor",
            MethodKind::ClientConstructor,
            TypeRef::primitive(Primitive::Void),
        )
        .with_parameter(request_adapter_parameter())
        .with_documentation(Documentation::new(Some(&format!(
            "Instantiates a new {} and sets the default values.",
            self.config.client_class_name
        ))));
        constructor.base_url = base_url;
        self.model.class_mut(client_id).add_method(constructor);

        self.build_node(client_id, tree.root(), "", true)
    }

    fn build_node(&mut self, id: ClassId, node: &UrlNode<'a>, path: &str, is_root: bool) -> Result<()> {
        let operations = self.checked_operations(node)?;
        let template = self.url_template(path, &operations)?;
        self.add_builder_plumbing(id, template, is_root);
        for operation in &operations {
            self.add_operation(id, operation)?;
        }

        for child in node.children.values() {
            let child_path = format!("{}/{}", path, child.segment);
            let child_id = if child.is_parameter() {
                self.add_item_builder(id, child)?
            } else if path_parameters(&child.segment).is_empty() {
                self.add_navigation_builder(id, child, is_root)?
            } else {
                self.add_parameterized_builder(id, child)?
            };
            self.build_node(child_id, child, &child_path, false)?;
        }
        Ok(())
    }

    /// Properties and constructors every builder carries
    fn add_builder_plumbing(&mut self, id: ClassId, template: String, is_root: bool) {
        let class_name = self.model.class(id).name.clone();
        let class = self.model.class_mut(id);
        class.add_property(
            Property::new(
                "pathParameters",
                PropertyKind::PathParameters,
                TypeRef::abstraction(Abstraction::PathParameters),
            )
            .with_access(Access::Protected)
            .with_documentation(Documentation::new(Some("Path parameters for the request"))),
        );
        class.add_property(
            Property::new(
                "requestAdapter",
                PropertyKind::RequestAdapter,
                TypeRef::abstraction(Abstraction::RequestAdapter),
            )
            .with_access(Access::Protected)
            .with_documentation(Documentation::new(Some(
                "The request adapter to use to execute the requests.",
            ))),
        );
        let mut url_template = Property::new(
            "urlTemplate",
            PropertyKind::UrlTemplate,
            TypeRef::primitive(Primitive::String),
        )
        .with_access(Access::Protected)
        .with_documentation(Documentation::new(Some(
            "Url template to use to build the URL for the current request builder",
        )));
        url_template.default_value = Some(JsonValue::String(template));
        class.add_property(url_template);

        let documentation = Documentation::new(Some(&format!(
            "Instantiates a new {} and sets the default values.",
            class_name
        )));
        if !is_root {
            class.add_method(
                Method::new("constructor", MethodKind::Constructor, TypeRef::primitive(Primitive::Void))
                    .with_parameter(Parameter::new(
                        "pathParameters",
                        ParameterKind::PathParameters,
                        TypeRef::abstraction(Abstraction::PathParameters),
                    ))
                    .with_parameter(request_adapter_parameter())
                    .with_documentation(documentation.clone()),
            );
        }
        class.add_method(
            Method::new("constructor", MethodKind::RawUrlConstructor, TypeRef::primitive(Primitive::Void))
                .with_parameter(
                    Parameter::new("rawUrl", ParameterKind::RawUrl, TypeRef::primitive(Primitive::String))
                        .with_documentation(Documentation::new(Some(
                            "The raw URL to use for the request builder.",
                        ))),
                )
                .with_parameter(request_adapter_parameter())
                .with_documentation(documentation),
        );
    }

    /// `/users` under its parent: a navigation property
    fn add_navigation_builder(&mut self, parent: ClassId, node: &UrlNode<'a>, top_level: bool) -> Result<ClassId> {
        let mut segment = to_first_lower(&cleanup_symbol_name(&node.segment));
        let models_segment = self
            .config
            .models_namespace_name()
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_string();
        if top_level && segment.eq_ignore_ascii_case(&models_segment) {
            segment = format!("{}Requests", segment);
        }
        let namespace = self.child_namespace(parent, &segment);
        let id = self.add_builder_class(namespace, &format!("{}RequestBuilder", to_first_upper(&segment)))?;

        let mut property_name = segment.clone();
        if HttpMethod::all().any(|m| m.as_str().eq_ignore_ascii_case(&property_name)) {
            property_name.push_str("Path");
        }
        let builder_ref = self.class_ref(id);
        self.model.class_mut(parent).add_property(
            Property::new(property_name, PropertyKind::RequestBuilder, builder_ref)
                .with_documentation(Documentation::new(Some(&format!(
                    "The {} property",
                    node.segment
                )))),
        );
        Ok(id)
    }

    /// `/users/{id}` under its parent: an indexer
    fn add_item_builder(&mut self, parent: ClassId, node: &UrlNode<'a>) -> Result<ClassId> {
        let variable = node.segment.trim_start_matches('{').trim_end_matches('}');
        let base = to_first_upper(&cleanup_symbol_name(variable));
        let item_base = match base.strip_suffix("Id") {
            Some(stripped) if !stripped.is_empty() => stripped.to_string(),
            _ => base.clone(),
        };
        let namespace = self.child_namespace(parent, "item");
        let id = self.add_builder_class(namespace, &format!("With{}ItemRequestBuilder", item_base))?;

        let index_type = self
            .path_parameter_type(node, variable)
            .unwrap_or_else(|| TypeRef::primitive(Primitive::String));
        let indexer = Indexer {
            name: format!("By{}", base),
            serialization_name: sanitize_parameter_name_for_url_template(variable),
            index_parameter_name: to_first_lower(&cleanup_symbol_name(variable)),
            index_type,
            return_type: self.class_ref(id),
            documentation: Documentation::new(Some(&format!(
                "Gets an item from the {} collection",
                self.model.class(parent).name
            ))),
        };
        self.model.class_mut(parent).add_indexer(indexer);
        Ok(id)
    }

    /// `/reports(period={period})` under its parent: a builder method with path parameters
    fn add_parameterized_builder(&mut self, parent: ClassId, node: &UrlNode<'a>) -> Result<ClassId> {
        let replaced = replace_path_parameters(&node.segment, |name| {
            format!("With{}", to_first_upper(&cleanup_symbol_name(name)))
        });
        let method_name = to_first_lower(&cleanup_symbol_name(&replaced));
        let namespace = self.child_namespace(parent, &method_name);
        let id = self.add_builder_class(namespace, &format!("{}RequestBuilder", to_first_upper(&method_name)))?;

        let mut method = Method::new(
            method_name,
            MethodKind::RequestBuilderWithParameters,
            self.class_ref(id),
        )
        .with_documentation(Documentation::new(Some(&format!(
            "Provides operations to call the {} function.",
            node.segment
        ))));
        for variable in path_parameters(&node.segment) {
            let type_ref = self
                .path_parameter_type(node, &variable)
                .unwrap_or_else(|| TypeRef::primitive(Primitive::String));
            let mut parameter = Parameter::new(
                to_first_lower(&cleanup_symbol_name(&variable)),
                ParameterKind::Path,
                type_ref,
            )
            .with_documentation(Documentation::new(Some(&format!("Usage: {}", node.segment))));
            parameter.serialization_name = Some(sanitize_parameter_name_for_url_template(&variable));
            method.parameters.push(parameter);
        }
        self.model.class_mut(parent).add_method(method);
        Ok(id)
    }

    fn child_namespace(&mut self, parent: ClassId, segment: &str) -> crate::ir::NamespaceId {
        let parent_namespace = self.model.namespace(self.model.class(parent).namespace()).name.clone();
        self.model.add_namespace(&format!("{}.{}", parent_namespace, segment))
    }

    fn add_builder_class(&mut self, namespace: crate::ir::NamespaceId, name: &str) -> Result<ClassId> {
        let name = self.model.unique_type_name(namespace, &type_name(name));
        let mut class = Class::new(name, ClassKind::RequestBuilder);
        class.documentation = Documentation::new(Some("Builds and executes requests for operations under this path"));
        self.model.add_class(namespace, class)
    }

    /// Scalar type of a path variable, from the first operation declaring it
    fn path_parameter_type(&self, node: &UrlNode<'a>, variable: &str) -> Option<TypeRef> {
        node.operations.iter().find_map(|op| {
            let parameters = self
                .document
                .effective_parameters(op.path_item, op.operation, &op.pointer())
                .ok()?;
            parameters
                .into_iter()
                .find(|p| p.name == variable && p.is_in(ParameterLocation::Path))
                .and_then(|p| p.schema.as_ref())
                .map(|schema| {
                    TypeRef::primitive(Primitive::from_type_and_format(
                        schema.primary_type(),
                        schema.format.as_deref(),
                    ))
                })
                .filter(|t| t.as_primitive() != Some(Primitive::Untyped))
        })
    }

    /// RFC 6570 template of a builder: base URL, path and query expansion
    fn url_template(&self, path: &str, operations: &[NodeOperation<'a>]) -> Result<String> {
        let mut template = String::from("{+baseurl}");
        template.push_str(&replace_path_parameters(path, |name| {
            format!("{{{}}}", sanitize_parameter_name_for_url_template(name))
        }));

        // wire name -> (required by every operation declaring it, exploded)
        let mut query: BTreeMap<String, (bool, bool)> = BTreeMap::new();
        for op in operations {
            for parameter in self
                .document
                .effective_parameters(op.path_item, op.operation, &op.pointer())?
            {
                if !parameter.is_in(ParameterLocation::Query) {
                    continue;
                }
                let name = sanitize_parameter_name_for_url_template(&parameter.name);
                let entry = query
                    .entry(name)
                    .or_insert((parameter.required, parameter.explodes()));
                entry.0 &= parameter.required;
                entry.1 |= parameter.explodes();
            }
        }
        let expand = |(name, (_, explode)): (&String, &(bool, bool))| {
            if *explode {
                format!("{}*", name)
            } else {
                name.clone()
            }
        };
        let required: Vec<String> = query
            .iter()
            .filter(|(_, (required, _))| *required)
            .map(|(name, _)| format!("{}={{{}}}", name, name))
            .collect();
        let optional: Vec<String> = query.iter().filter(|(_, (required, _))| !*required).map(expand).collect();

        if !required.is_empty() {
            template.push('?');
            template.push_str(&required.join("&"));
        }
        if !optional.is_empty() {
            let operator = if required.is_empty() { '?' } else { '&' };
            template.push_str(&format!("{{{}{}}}", operator, optional.join(",")));
        }
        Ok(template)
    }
}

fn request_adapter_parameter() -> Parameter {
    Parameter::new(
        "requestAdapter",
        ParameterKind::RequestAdapter,
        TypeRef::abstraction(Abstraction::RequestAdapter),
    )
    .with_documentation(Documentation::new(Some(
        "The request adapter to use to execute the requests.",
    )))
}

#[cfg(test)]
mod tests {
    use super::super::tests::{build, class_named};
    use crate::ir::{MethodKind, ParameterKind, Primitive, PropertyKind};
    use serde_json::json;

    fn url_template(model: &crate::ir::CodeModel, id: crate::ir::ClassId) -> String {
        model
            .class(id)
            .properties()
            .iter()
            .find(|p| p.kind == PropertyKind::UrlTemplate)
            .and_then(|p| p.default_value.as_ref())
            .and_then(|v| v.as_str())
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_item_builder_and_indexer() {
        let (model, _) = build(json!({
            "openapi": "3.0.0",
            "info": {"title": "t", "version": "1"},
            "servers": [{"url": "https://api.example.com/v1/"}],
            "paths": {
                "/users": {"get": {
                    "parameters": [
                        {"name": "$top", "in": "query", "schema": {"type": "integer"}},
                        {"name": "tags", "in": "query", "schema": {"type": "array", "items": {"type": "string"}}},
                        {"name": "tenant", "in": "query", "required": true, "schema": {"type": "string"}}
                    ],
                    "responses": {"200": {"description": "ok"}}
                }},
                "/users/{user-id}": {
                    "parameters": [{"name": "user-id", "in": "path", "required": true, "schema": {"type": "integer", "format": "int64"}}],
                    "get": {"responses": {"200": {"description": "ok"}}}
                }
            }
        }));
        let client = class_named(&model, "ApiSdk", "ApiClient");
        let client_ctor = model
            .class(client)
            .methods()
            .iter()
            .find(|m| m.kind == MethodKind::ClientConstructor)
            .unwrap();
        assert_eq!(client_ctor.base_url.as_deref(), Some("https://api.example.com/v1"));
        assert!(!model.class(client).methods().iter().any(|m| m.kind == MethodKind::Constructor));
        assert_eq!(url_template(&model, client), "{+baseurl}");

        let users = class_named(&model, "ApiSdk.users", "UsersRequestBuilder");
        assert_eq!(
            model.class(client).property("users").unwrap().type_ref.class_id(),
            Some(users)
        );
        assert_eq!(
            url_template(&model, users),
            "{+baseurl}/users?tenant={tenant}{&%24top,tags*}"
        );

        let item = class_named(&model, "ApiSdk.users.item", "WithUserItemRequestBuilder");
        let indexers = model.class(users).indexers();
        assert_eq!(indexers.len(), 1);
        assert_eq!(indexers[0].name, "ByUserId");
        assert_eq!(indexers[0].serialization_name, "user%2Did");
        assert_eq!(indexers[0].index_parameter_name, "userId");
        assert_eq!(indexers[0].index_type.as_primitive(), Some(Primitive::Int64));
        assert_eq!(indexers[0].return_type.class_id(), Some(item));
        assert_eq!(url_template(&model, item), "{+baseurl}/users/{user%2Did}");
        let kinds: Vec<_> = model.class(item).methods().iter().map(|m| m.kind).collect();
        assert!(kinds.contains(&MethodKind::Constructor));
        assert!(kinds.contains(&MethodKind::RawUrlConstructor));
    }

    #[test]
    fn test_special_segments() {
        let (model, _) = build(json!({
            "openapi": "3.0.0",
            "info": {"title": "t", "version": "1"},
            "paths": {
                "/models": {"get": {"responses": {"200": {"description": "ok"}}}},
                "/jobs/get": {"get": {"responses": {"200": {"description": "ok"}}}},
                "/reports(period={period})": {"get": {"responses": {"200": {"description": "ok"}}}},
                "/things/{id}": {"get": {"responses": {"200": {"description": "ok"}}}}
            }
        }));
        let client = class_named(&model, "ApiSdk", "ApiClient");
        class_named(&model, "ApiSdk.modelsRequests", "ModelsRequestsRequestBuilder");
        assert!(model.class(client).property("modelsRequests").is_some());

        let jobs = class_named(&model, "ApiSdk.jobs", "JobsRequestBuilder");
        assert!(model.class(jobs).property("getPath").is_some());

        let method = model
            .class(client)
            .methods()
            .iter()
            .find(|m| m.kind == MethodKind::RequestBuilderWithParameters)
            .unwrap();
        assert_eq!(method.name, "reportsPeriodWithPeriod");
        assert_eq!(method.parameters.len(), 1);
        assert_eq!(method.parameters[0].kind, ParameterKind::Path);
        assert_eq!(method.parameters[0].wire_name(), "period");

        class_named(&model, "ApiSdk.things.item", "WithIdItemRequestBuilder");
    }
}
