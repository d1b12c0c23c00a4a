//! Rendering engine: from a verified [`CodeModel`] to source files.
//!
//! Every language is rendered by its own writer module, each a closed
//! `match` over [`CodeElement`]. The helpers on [`RenderContext`] carry the
//! language-neutral decisions (which members are serialized, how a wrapper
//! picks its member, which factories the client registers) so the writers
//! only decide on syntax.
//!
//! # Examples
//!
//! ```
//! use sdkgen_core::config::GenerationConfig;
//! use sdkgen_core::diagnostics::Diagnostics;
//! use sdkgen_core::document::ApiDocument;
//! use sdkgen_core::language::GenerationLanguage;
//! use sdkgen_core::rendering::{render_language, CancellationFlag, RenderOptions};
//! use sdkgen_core::resolution::build_code_model;
//!
//! let document = ApiDocument::parse_content(r#"{
//!     "openapi": "3.0.0",
//!     "info": {"title": "Pets", "version": "1"},
//!     "paths": {"/pets": {"get": {"responses": {"204": {"description": "done"}}}}}
//! }"#).unwrap();
//! let config = GenerationConfig::default();
//! let model = build_code_model(&document, &config, &mut Diagnostics::new()).unwrap();
//! let output = render_language(
//!     &model,
//!     GenerationLanguage::CSharp,
//!     &RenderOptions::from_config(&config),
//!     &CancellationFlag::new(),
//! )
//! .unwrap();
//! assert!(output.files.contains_key("Pets/PetsRequestBuilder.cs"));
//! ```

pub mod element;
pub mod paths;
pub mod writer;

mod csharp;
mod java;
mod python;
mod typescript;

// Internal imports (std, crate)
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::GenerationConfig;
use crate::conventions::{for_language, Import, LanguageConventions};
use crate::ir::{
    Abstraction, Class, ClassId, CodeModel, Documentation, EnumId, Method, MethodKind, ParameterKind,
    Primitive, Property, PropertyKind, TypeDefinition, TypeRef,
};
use crate::language::GenerationLanguage;
use crate::registry::SerializationRegistry;
use crate::{Error, Result};

// External imports (alphabetized)
use serde_json::Value as JsonValue;

pub use element::{class_elements, enum_elements, CodeElement};
pub use paths::{FileUnit, PathMap};
pub use writer::LanguageWriter;

/// Cooperative cancellation shared between the caller and rendering tasks
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Error::Cancelled)` once cancellation was requested
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Inputs of a rendering pass besides the code model
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub client_namespace_name: String,
    pub registry: SerializationRegistry,
}

impl RenderOptions {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            client_namespace_name: config.client_namespace_name.clone(),
            registry: config.serialization_registry(),
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from_config(&GenerationConfig::default())
    }
}

/// Files generated for one language, keyed by path relative to the output root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedOutput {
    pub language: GenerationLanguage,
    pub files: BTreeMap<String, String>,
}

/// Render every file of one language
pub fn render_language(
    model: &CodeModel,
    language: GenerationLanguage,
    options: &RenderOptions,
    cancellation: &CancellationFlag,
) -> Result<RenderedOutput> {
    cancellation.check()?;
    let conventions = for_language(language);
    let paths = paths::segment(model, conventions, &options.client_namespace_name)?;
    let context = RenderContext {
        model,
        conventions,
        options,
        paths: &paths,
    };

    let mut files = BTreeMap::new();
    let mut current_directory: Option<&str> = None;
    for (path, unit) in paths.files() {
        let directory = path.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
        if current_directory != Some(directory) {
            cancellation.check()?;
            current_directory = Some(directory);
        }
        let content = match language {
            GenerationLanguage::CSharp => csharp::render(&context, unit)?,
            GenerationLanguage::Java => java::render(&context, path, unit)?,
            GenerationLanguage::TypeScript => typescript::render(&context, path, unit)?,
            GenerationLanguage::Python => python::render(&context, path, unit)?,
        };
        files.insert(path.to_string(), content);
    }
    log::debug!("rendered {} {} files", files.len(), language);
    Ok(RenderedOutput { language, files })
}

/// How a value travels through parse nodes and serialization writers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValueKind {
    Primitive(Primitive),
    Enum(EnumId),
    Object(ClassId),
}

pub(crate) fn value_kind(type_ref: &TypeRef) -> ValueKind {
    if let Some(primitive) = type_ref.as_primitive() {
        return ValueKind::Primitive(primitive);
    }
    match type_ref.definition {
        Some(TypeDefinition::Class(id)) => ValueKind::Object(id),
        Some(TypeDefinition::Enum(id)) => ValueKind::Enum(id),
        None => ValueKind::Primitive(Primitive::Untyped),
    }
}

/// One member of a union or intersection wrapper
pub(crate) struct WrapperMember<'m> {
    pub property: &'m Property,
    pub type_ref: &'m TypeRef,
    /// Discriminator values mapped to this member
    pub discriminator_values: Vec<&'m str>,
}

impl WrapperMember<'_> {
    pub fn is_object(&self) -> bool {
        !self.type_ref.is_collection() && matches!(value_kind(self.type_ref), ValueKind::Object(_))
    }
}

/// Read-only state shared by the writers of one language pass
pub(crate) struct RenderContext<'m> {
    pub model: &'m CodeModel,
    pub conventions: &'static dyn LanguageConventions,
    pub options: &'m RenderOptions,
    pub paths: &'m PathMap,
}

impl<'m> RenderContext<'m> {
    pub fn spell(&self, type_ref: &TypeRef) -> String {
        self.conventions.type_spelling(self.model, type_ref)
    }

    /// Spelling without collection or nullability decoration
    pub fn spell_element(&self, type_ref: &TypeRef) -> String {
        self.conventions.element_spelling(self.model, type_ref)
    }

    pub fn class(&self, id: ClassId) -> &'m Class {
        self.model.class(id)
    }

    pub fn class_name(&self, id: ClassId) -> String {
        self.conventions.type_name(&self.model.class(id).name)
    }

    pub fn enum_name(&self, id: EnumId) -> String {
        self.conventions.type_name(&self.model.enumeration(id).name)
    }

    /// Declared name of whatever a reference points at
    pub fn definition_name(&self, definition: TypeDefinition) -> String {
        self.conventions.type_name(self.model.definition_name(definition))
    }

    pub fn abstraction(&self, abstraction: Abstraction) -> &'static str {
        self.conventions.abstraction_name(abstraction)
    }

    /// Documentation text rendered for this language, external link appended
    pub fn documentation_text(&self, documentation: &Documentation) -> Result<Option<String>> {
        let text = documentation.render(|type_ref| self.spell(type_ref))?;
        Ok(match (text, &documentation.external_link) {
            (Some(text), Some(link)) => Some(format!("{} Find more info here: {}", text, link)),
            (None, Some(link)) => Some(format!("Find more info here: {}", link)),
            (text, None) => text,
        })
    }

    /// Doc comment lines; empty when there is nothing to say
    pub fn doc_lines(&self, documentation: &Documentation) -> Result<Vec<String>> {
        Ok(self
            .documentation_text(documentation)?
            .map(|text| self.conventions.doc_comment(&text))
            .unwrap_or_default())
    }

    /// Imports for the runtime types a class uses
    pub fn external_imports(&self, class: &Class) -> BTreeSet<Import> {
        class
            .usings()
            .iter()
            .filter(|u| u.external)
            .filter_map(|u| {
                let type_ref = match u.name.parse::<Primitive>() {
                    Ok(primitive) => TypeRef::primitive(primitive),
                    Err(_) => TypeRef::abstraction(u.name.parse::<Abstraction>().ok()?),
                };
                self.conventions.external_import(&type_ref)
            })
            .collect()
    }

    /// File declaring a referenced type
    pub fn definition_path(&self, definition: TypeDefinition) -> Option<&'m str> {
        self.paths.definition_path(self.model, definition)
    }

    /// Generated types a file refers to, grouped by the file declaring them.
    ///
    /// Covers the class and its inner classes; types declared in `current` are left out.
    pub fn referenced_files(&self, id: ClassId, current: &str) -> BTreeMap<&'m str, BTreeSet<String>> {
        let mut pending = vec![id];
        let mut files: BTreeMap<&'m str, BTreeSet<String>> = BTreeMap::new();
        while let Some(next) = pending.pop() {
            let class = self.class(next);
            pending.extend(class.inner_classes().iter().copied());
            for definition in class.type_refs().into_iter().filter_map(|t| t.definition) {
                match self.definition_path(definition) {
                    Some(path) if path != current => {
                        files
                            .entry(path)
                            .or_default()
                            .insert(self.definition_name(definition));
                    }
                    _ => {}
                }
            }
        }
        files
    }

    pub fn url_template(&self, class: &'m Class) -> Option<&'m str> {
        class
            .properties()
            .iter()
            .find(|p| p.kind == PropertyKind::UrlTemplate)
            .and_then(|p| p.default_value.as_ref())
            .and_then(JsonValue::as_str)
    }

    /// Custom properties declared on this class itself, in member order
    pub fn own_properties(&self, class: &'m Class) -> Vec<&'m Property> {
        let mut properties: Vec<&Property> = class
            .properties()
            .iter()
            .filter(|p| p.kind == PropertyKind::Custom && !p.exists_in_base_type)
            .collect();
        properties.sort_by(|a, b| {
            a.name
                .to_ascii_lowercase()
                .cmp(&b.name.to_ascii_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });
        properties
    }

    /// Base class, when the class extends another generated one
    pub fn base_class(&self, class: &Class) -> Option<ClassId> {
        class.base.as_ref().and_then(TypeRef::class_id)
    }

    /// Error types without a generated base extend the runtime exception
    pub fn extends_api_exception(&self, class: &Class) -> bool {
        class.is_error_definition && class.base.is_none()
    }

    /// Whether the class or an ancestor keeps its values in a backing store
    pub fn is_backed(&self, id: ClassId) -> bool {
        std::iter::once(id)
            .chain(self.model.ancestors(id))
            .any(|c| self.model.class(c).has_property_of_kind(PropertyKind::BackingStore))
    }

    /// Whether the class derives from the runtime exception type
    pub fn is_exception(&self, id: ClassId) -> bool {
        std::iter::once(id)
            .chain(self.model.ancestors(id))
            .any(|c| self.extends_api_exception(self.model.class(c)))
    }

    /// Whether the request configuration of a method carries query parameters
    pub fn has_query_parameters(&self, method: &Method) -> bool {
        method
            .parameter_of_kind(ParameterKind::RequestConfiguration)
            .and_then(|p| p.type_ref.class_id())
            .map(|id| {
                self.model
                    .class(id)
                    .properties()
                    .iter()
                    .any(|p| p.kind == PropertyKind::Custom)
            })
            .unwrap_or(false)
    }

    /// Name of the request generator paired with an executor
    pub fn generator_name(&self, executor: &Method) -> String {
        let verb = executor.http_method.map(|m| m.pascal_name()).unwrap_or("Get");
        self.conventions
            .method_name(&format!("to{}RequestInformation", verb))
    }

    /// Value to type mappings of a factory switch, when one is emitted
    pub fn discriminator_switch(&self, class: &'m Class) -> Option<(&'m str, &'m [(String, TypeRef)])> {
        if !class.emits_discriminator_switch() {
            return None;
        }
        class
            .discriminator
            .as_ref()
            .map(|d| (d.property_name.as_str(), d.mappings()))
    }

    /// Members of a wrapper paired with their properties, in declaration order
    pub fn wrapper_members(&self, class: &'m Class) -> Vec<WrapperMember<'m>> {
        let Some(composed) = &class.composed_type else {
            return Vec::new();
        };
        let properties = class
            .properties()
            .iter()
            .filter(|p| p.kind == PropertyKind::Custom);
        composed
            .members
            .iter()
            .zip(properties)
            .map(|(type_ref, property)| WrapperMember {
                property,
                type_ref,
                discriminator_values: class
                    .discriminator
                    .as_ref()
                    .filter(|_| !composed.is_scalar_only())
                    .map(|d| {
                        d.mappings()
                            .iter()
                            .filter(|(_, t)| t.definition.is_some() && t.definition == type_ref.definition)
                            .map(|(value, _)| value.as_str())
                            .collect()
                    })
                    .unwrap_or_default(),
            })
            .collect()
    }

    /// Discriminator property of a wrapper that maps at least one member
    pub fn wrapper_discriminator(&self, class: &'m Class) -> Option<&'m str> {
        let property = class.discriminator.as_ref()?.property_name.as_str();
        self.wrapper_members(class)
            .iter()
            .any(|m| !m.discriminator_values.is_empty())
            .then_some(property)
    }

    /// Source expression of a property default value
    pub fn default_expression(&self, property: &Property) -> Option<String> {
        let value = property.default_value.as_ref()?;
        if let Some(id) = property.type_ref.enum_id() {
            let wire = value.as_str()?;
            let option = self
                .model
                .enumeration(id)
                .options()
                .iter()
                .find(|o| o.serialization_name == wire)?;
            return Some(format!(
                "{}.{}",
                self.enum_name(id),
                self.conventions.enum_option_name(&option.name)
            ));
        }
        match property.type_ref.as_primitive() {
            Some(p) if p.is_string_like() && p != Primitive::String => None,
            Some(_) => Some(self.conventions.literal(value)),
            None => None,
        }
    }

    /// Properties a model constructor initializes, backing store first
    pub fn initialized_properties(&self, class: &'m Class) -> Vec<&'m Property> {
        let mut properties: Vec<&Property> = class
            .properties()
            .iter()
            .filter(|p| match p.kind {
                PropertyKind::BackingStore | PropertyKind::AdditionalData => true,
                PropertyKind::Custom => !p.exists_in_base_type && p.default_value.is_some(),
                _ => false,
            })
            .collect();
        properties.sort_by_key(|p| p.kind != PropertyKind::BackingStore);
        properties
    }

    pub fn client_constructor(&self, class: &'m Class) -> Option<&'m Method> {
        class
            .methods()
            .iter()
            .find(|m| m.kind == MethodKind::ClientConstructor)
    }

    /// Factories the client constructor registers, with their imports
    pub fn registrations(&self) -> Vec<Registration<'m>> {
        let registry = &self.options.registry;
        let serializers = registry
            .serializers()
            .map(|(content_type, factory)| (true, content_type, factory));
        let deserializers = registry
            .deserializers()
            .map(|(content_type, factory)| (false, content_type, factory));
        serializers
            .chain(deserializers)
            .map(|(serializer, content_type, factory)| Registration {
                serializer,
                content_type,
                factory: SerializationRegistry::factory_name(factory),
                import: SerializationRegistry::factory_import(self.conventions, factory),
            })
            .collect()
    }

    /// `Accept` header value of a request generator
    pub fn accept_header(&self, method: &Method) -> Option<String> {
        if method.accepted_response_types.is_empty() {
            None
        } else {
            Some(method.accepted_response_types.join(", "))
        }
    }
}

/// One serializer or deserializer factory registered by the client
pub(crate) struct Registration<'m> {
    pub serializer: bool,
    pub content_type: &'m str,
    pub factory: &'m str,
    pub import: Option<Import>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::document::ApiDocument;
    use crate::resolution::build_code_model;
    use serde_json::json;

    pub(super) fn model_of(value: serde_json::Value) -> CodeModel {
        let document = ApiDocument::parse_content(&value.to_string()).unwrap();
        let mut diagnostics = Diagnostics::new();
        build_code_model(&document, &GenerationConfig::default(), &mut diagnostics).unwrap()
    }

    pub(super) fn render(model: &CodeModel, language: GenerationLanguage) -> RenderedOutput {
        render_language(model, language, &RenderOptions::default(), &CancellationFlag::new()).unwrap()
    }

    pub(super) fn pets() -> serde_json::Value {
        json!({
            "openapi": "3.0.0",
            "info": {"title": "Pets", "version": "1"},
            "servers": [{"url": "https://api.example.com/v1"}],
            "paths": {
                "/pets": {
                    "get": {
                        "parameters": [{"name": "limit", "in": "query", "schema": {"type": "integer"}}],
                        "responses": {"200": {"description": "ok", "content": {"application/json": {
                            "schema": {"type": "array", "items": {"$ref": "#/components/schemas/Pet"}}
                        }}}}
                    },
                    "post": {
                        "requestBody": {"content": {"application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}}},
                        "responses": {
                            "201": {"description": "created", "content": {"application/json": {
                                "schema": {"$ref": "#/components/schemas/Pet"}
                            }}},
                            "4XX": {"description": "bad", "content": {"application/json": {
                                "schema": {"$ref": "#/components/schemas/Error"}
                            }}}
                        }
                    }
                },
                "/pets/{petId}": {
                    "get": {
                        "parameters": [{"name": "petId", "in": "path", "required": true, "schema": {"type": "string"}}],
                        "responses": {"200": {"description": "ok", "content": {"application/json": {
                            "schema": {"$ref": "#/components/schemas/PetOrString"}
                        }}}}
                    }
                }
            },
            "components": {"schemas": {
                "Pet": {
                    "type": "object",
                    "properties": {
                        "petType": {"type": "string"},
                        "name": {"type": "string"},
                        "age": {"type": "integer", "default": 1},
                        "status": {"$ref": "#/components/schemas/Status"}
                    },
                    "discriminator": {"propertyName": "petType", "mapping": {
                        "cat": "#/components/schemas/Cat",
                        "dog": "#/components/schemas/Dog"
                    }}
                },
                "Cat": {"allOf": [{"$ref": "#/components/schemas/Pet"}, {"type": "object", "properties": {"indoor": {"type": "boolean"}}}]},
                "Dog": {"allOf": [{"$ref": "#/components/schemas/Pet"}, {"type": "object", "properties": {"barks": {"type": "boolean"}}}]},
                "Status": {"type": "string", "enum": ["available", "sold"]},
                "Error": {"type": "object", "properties": {"message": {"type": "string"}}},
                "PetOrString": {"oneOf": [{"$ref": "#/components/schemas/Pet"}, {"type": "string"}]}
            }}
        })
    }

    #[test]
    fn test_cancelled_flag_stops_rendering() {
        let model = model_of(pets());
        let flag = CancellationFlag::new();
        flag.cancel();
        let err = render_language(&model, GenerationLanguage::Java, &RenderOptions::default(), &flag).unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn test_rendering_is_byte_identical_across_runs() {
        for language in GenerationLanguage::all() {
            let first = render(&model_of(pets()), language);
            let second = render(&model_of(pets()), language);
            assert_eq!(first, second, "{}", language);
            assert!(first.files.values().all(|content| content.ends_with('\n')));
        }
    }

    #[test]
    fn test_every_planned_path_is_rendered() {
        let model = model_of(pets());
        for language in GenerationLanguage::all() {
            let conventions = for_language(language);
            let planned = paths::segment(&model, conventions, "ApiSdk").unwrap();
            let output = render(&model, language);
            let rendered: Vec<&str> = output.files.keys().map(String::as_str).collect();
            let expected: Vec<&str> = planned.files().map(|(p, _)| p).collect();
            assert_eq!(rendered, expected);
        }
    }

    #[test]
    fn test_wrapper_members_follow_declaration_order() {
        let model = model_of(pets());
        let (_, wrapper) = model
            .classes()
            .find(|(_, c)| c.name == "PetOrString")
            .unwrap();
        let options = RenderOptions::default();
        let paths = paths::segment(&model, for_language(GenerationLanguage::Python), "ApiSdk").unwrap();
        let context = RenderContext {
            model: &model,
            conventions: for_language(GenerationLanguage::Python),
            options: &options,
            paths: &paths,
        };
        let members = context.wrapper_members(wrapper);
        assert_eq!(members.len(), 2);
        assert!(members[0].is_object());
        assert!(!members[1].is_object());
    }
}
