//! Schema resolution: from an [`ApiDocument`] to a verified [`CodeModel`].
//!
//! The passes run in a fixed order:
//!
//! 1. pre-analysis of references and compositions ([`analysis`])
//! 2. URL tree construction and filtering ([`url_tree`])
//! 3. request builders and their operations
//! 4. every remaining valid component
//! 5. structural members of models (serializers, factories, additional data)
//! 6. discriminator mappings
//! 7. usings, inherited property flags and verification
//!
//! Everything here is synchronous and free of I/O.
//!
//! # Examples
//!
//! ```
//! use sdkgen_core::config::GenerationConfig;
//! use sdkgen_core::diagnostics::Diagnostics;
//! use sdkgen_core::document::ApiDocument;
//! use sdkgen_core::resolution::build_code_model;
//!
//! let document = ApiDocument::parse_content(r#"{
//!     "openapi": "3.0.0",
//!     "info": {"title": "Pets", "version": "1"},
//!     "paths": {"/pets": {"get": {"responses": {"200": {"description": "ok"}}}}}
//! }"#).unwrap();
//! let config = GenerationConfig::default();
//! let mut diagnostics = Diagnostics::new();
//! let model = build_code_model(&document, &config, &mut diagnostics).unwrap();
//! assert!(model.find_namespace("ApiSdk.pets").is_some());
//! ```

pub mod analysis;
mod composed;
mod discriminators;
mod finalize;
mod models;
mod operations;
mod request_builders;
pub mod url_tree;

// Internal imports (std, crate)
use std::collections::{HashMap, HashSet};

use crate::config::GenerationConfig;
use crate::diagnostics::{Diagnostic, DiagnosticsCollector};
use crate::document::{ApiDocument, Schema, SchemaShape};
use crate::ir::{
    ClassId, CodeModel, Deprecation, Documentation, Enum, EnumOption, NamespaceId, Primitive,
    TypeRef,
};
use crate::naming::{cleanup_symbol_name, to_first_upper};
use crate::{Error, Result};

use analysis::{alias_of, component_pointer, Analysis, INVALID_SCHEMA};
use url_tree::{PathFilter, UrlTree};

pub use url_tree::{NodeOperation, PathPattern, UrlNode};

/// Enum option renamed because its symbol clashed with an earlier option
pub const RENAMED_ENUM_OPTION: &str = "RenamedEnumOption";

/// Build and verify the code model of a description
pub fn build_code_model(
    document: &ApiDocument,
    config: &GenerationConfig,
    diagnostics: &mut dyn DiagnosticsCollector,
) -> Result<CodeModel> {
    let analysis = Analysis::run(document, diagnostics)?;
    let filter = PathFilter::new(&config.include_patterns, &config.exclude_patterns)?;
    let tree = UrlTree::build(document, &filter, diagnostics);

    let mut resolver = Resolver::new(document, config, analysis, diagnostics);
    resolver.build_request_builders(&tree)?;
    resolver.resolve_components()?;
    resolver.add_structural_members();
    resolver.resolve_discriminators();
    resolver.finalize()
}

/// Where an inline schema's generated type is declared and how it is named
#[derive(Debug, Clone)]
pub(crate) struct InlineScope {
    pub namespace: NamespaceId,
    pub name: String,
}

impl InlineScope {
    pub fn new(namespace: NamespaceId, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
        }
    }
}

/// Mutable state shared by the resolution passes
pub(crate) struct Resolver<'a, 'd> {
    document: &'a ApiDocument,
    config: &'a GenerationConfig,
    analysis: Analysis<'a>,
    diagnostics: &'d mut dyn DiagnosticsCollector,
    model: CodeModel,
    /// Component name to the type it generated (or aliases)
    components: HashMap<&'a str, TypeRef>,
    /// Component name of each component class
    component_of: HashMap<ClassId, &'a str>,
    /// Schema each model or wrapper class was generated from
    schemas: HashMap<ClassId, &'a Schema>,
    /// Whether instances of a model accept undeclared properties
    open_models: HashMap<ClassId, bool>,
    /// Components currently being resolved
    in_progress: HashSet<&'a str>,
    models_namespace: NamespaceId,
}

impl<'a, 'd> Resolver<'a, 'd> {
    fn new(
        document: &'a ApiDocument,
        config: &'a GenerationConfig,
        analysis: Analysis<'a>,
        diagnostics: &'d mut dyn DiagnosticsCollector,
    ) -> Self {
        let mut model = CodeModel::new();
        let models_namespace = model.add_namespace(&config.models_namespace_name());
        Self {
            document,
            config,
            analysis,
            diagnostics,
            model,
            components: HashMap::new(),
            component_of: HashMap::new(),
            schemas: HashMap::new(),
            open_models: HashMap::new(),
            in_progress: HashSet::new(),
            models_namespace,
        }
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.report(diagnostic);
    }

    /// Generate every valid component in declaration order
    fn resolve_components(&mut self) -> Result<()> {
        let document = self.document;
        for name in document.components.schemas.keys() {
            if self.analysis.is_poisoned(name) {
                continue;
            }
            match self.resolve_component(name) {
                Ok(_) => {}
                Err(e) if e.is_run_fatal() => return Err(e),
                Err(e) => self.report(Diagnostic::from_error(INVALID_SCHEMA, &e)),
            }
        }
        Ok(())
    }

    /// Type generated for a component, generating it on first use
    pub(crate) fn resolve_component(&mut self, name: &'a str) -> Result<TypeRef> {
        if let Some(existing) = self.components.get(name) {
            return Ok(existing.clone());
        }
        let pointer = component_pointer(name);
        if self.analysis.is_poisoned(name) {
            return Err(Error::input(pointer, format!("schema '{}' is invalid", name)));
        }
        let (name, schema) = self.document.resolve_schema_reference(&pointer, &pointer)?;
        if !self.in_progress.insert(name) {
            return Err(Error::input(pointer, format!("'{}' refers to itself", name)));
        }
        let result = self.generate_component(name, schema, &pointer);
        self.in_progress.remove(name);
        let type_ref = result?;
        self.components.insert(name, type_ref.clone());
        Ok(type_ref)
    }

    fn generate_component(&mut self, name: &'a str, schema: &'a Schema, pointer: &str) -> Result<TypeRef> {
        if let Some(target) = alias_of(schema) {
            let target = self
                .document
                .components
                .schemas
                .get_key_value(target)
                .map(|(k, _)| k.as_str())
                .ok_or_else(|| Error::UnresolvedReference {
                    reference: component_pointer(target),
                    pointer: pointer.to_string(),
                })?;
            return self.resolve_component(target);
        }
        let scope = self.component_scope(name);
        match schema.shape() {
            SchemaShape::Object => {
                let plan = match self.analysis.plan(name) {
                    Some(plan) => plan.clone(),
                    None => self.analysis.plan_inline(schema, pointer)?,
                };
                let id = self.allocate_model(&scope, schema)?;
                let type_ref = self.class_ref(id);
                // Registered before population so recursive references find it
                self.components.insert(name, type_ref.clone());
                self.component_of.insert(id, name);
                self.populate_model(id, &plan, pointer)?;
                Ok(type_ref)
            }
            SchemaShape::Union | SchemaShape::Intersection
                if schema.collapse_nullable_composition().is_none() =>
            {
                let id = self.allocate_model(&scope, schema)?;
                let type_ref = self.class_ref(id);
                self.components.insert(name, type_ref.clone());
                self.component_of.insert(id, name);
                self.populate_wrapper(id, schema, pointer)?;
                Ok(type_ref)
            }
            _ => self.resolve_schema(schema, &scope, pointer),
        }
    }

    /// Namespace and class name of a component, dotted names add sub-namespaces
    fn component_scope(&mut self, name: &str) -> InlineScope {
        let (prefix, last) = match name.rsplit_once('.') {
            Some((prefix, last)) if !last.is_empty() => (Some(prefix), last),
            _ => (None, name),
        };
        let namespace = match prefix {
            Some(prefix) => {
                let segments: Vec<String> = prefix
                    .split('.')
                    .filter(|s| !s.is_empty())
                    .map(cleanup_symbol_name)
                    .collect();
                let dotted = format!("{}.{}", self.config.models_namespace_name(), segments.join("."));
                self.model.add_namespace(&dotted)
            }
            None => self.models_namespace,
        };
        InlineScope::new(namespace, type_name(last))
    }

    /// Type reference for any schema, generating inline types in `scope`
    pub(crate) fn resolve_schema(
        &mut self,
        schema: &'a Schema,
        scope: &InlineScope,
        pointer: &str,
    ) -> Result<TypeRef> {
        if let Some(member) = schema.collapse_nullable_composition() {
            return Ok(self.resolve_schema(member, scope, pointer)?.with_nullable(true));
        }
        if let Some(member) = schema.single_all_of_alias() {
            let type_ref = self.resolve_schema(member, scope, &format!("{}/allOf/0", pointer))?;
            return Ok(type_ref.with_nullable(schema.is_nullable()));
        }
        let type_ref = match schema.shape() {
            SchemaShape::Reference(reference) => {
                let (name, _) = self.document.resolve_schema_reference(reference, pointer)?;
                self.resolve_component(name)?
            }
            SchemaShape::Enum => self.add_enum(schema, scope, pointer)?,
            SchemaShape::Array => match &schema.items {
                Some(items) => self
                    .resolve_schema(items, scope, &format!("{}/items", pointer))?
                    .with_nullable(false)
                    .into_collection(),
                None => TypeRef::primitive(Primitive::Untyped).into_collection(),
            },
            SchemaShape::Object if schema.is_free_form_object() => {
                TypeRef::primitive(Primitive::Untyped)
            }
            SchemaShape::Object => {
                let plan = self.analysis.plan_inline(schema, pointer)?;
                let id = self.allocate_model(scope, schema)?;
                self.populate_model(id, &plan, pointer)?;
                self.class_ref(id)
            }
            SchemaShape::Union | SchemaShape::Intersection => {
                let id = self.allocate_model(scope, schema)?;
                self.populate_wrapper(id, schema, pointer)?;
                self.class_ref(id)
            }
            SchemaShape::Primitive => TypeRef::primitive(Primitive::from_type_and_format(
                schema.primary_type(),
                schema.format.as_deref(),
            )),
            SchemaShape::Untyped => TypeRef::primitive(Primitive::Untyped),
        };
        Ok(type_ref.with_nullable(schema.is_nullable()))
    }

    fn add_enum(&mut self, schema: &'a Schema, scope: &InlineScope, pointer: &str) -> Result<TypeRef> {
        let name = self
            .model
            .unique_type_name(scope.namespace, &type_name(&scope.name));
        let mut enumeration = Enum::new(name.clone());
        enumeration.flags = schema.is_flags_enum();
        enumeration.documentation = schema_documentation(schema);
        enumeration.deprecation =
            Deprecation::from_schema(schema.deprecated, schema.extension("x-ms-deprecation"));
        for value in schema.enum_values() {
            if enumeration.has_exact_wire_value(&value) {
                continue;
            }
            let symbol = type_name(&value);
            let name = enumeration.unique_option_name(&symbol);
            if name != symbol {
                self.report(
                    Diagnostic::warning(
                        RENAMED_ENUM_OPTION,
                        format!(
                            "enum value '{}' of {} is exposed as '{}', '{}' is already taken",
                            value, enumeration.name, name, symbol
                        ),
                    )
                    .with_pointer(pointer),
                );
            }
            enumeration.add_option(EnumOption {
                name,
                serialization_name: value,
                documentation: Documentation::default(),
            });
        }
        let id = self.model.add_enum(scope.namespace, enumeration)?;
        Ok(TypeRef::enumeration(name, id))
    }

    fn class_ref(&self, id: ClassId) -> TypeRef {
        TypeRef::class(self.model.class(id).name.clone(), id)
    }
}

/// Class or enum name for a raw description name
pub(crate) fn type_name(raw: &str) -> String {
    to_first_upper(&cleanup_symbol_name(raw))
}

/// Description of a schema, its title when it has none
pub(crate) fn schema_documentation(schema: &Schema) -> Documentation {
    Documentation::new(schema.description.as_deref().or(schema.title.as_deref()))
}
