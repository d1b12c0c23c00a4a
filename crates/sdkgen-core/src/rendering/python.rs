//! Python writer.
//!
//! Type imports between generated modules sit under `TYPE_CHECKING`; the
//! methods that need a type at run time import it locally, which keeps
//! mutually referencing models importable. Base classes are the exception
//! and are imported at module level.

// Internal imports (std, crate)
use std::collections::{BTreeMap, BTreeSet};

use super::paths::relative_package_path;
use super::{
    class_elements, enum_elements, value_kind, CodeElement, FileUnit, LanguageWriter,
    RenderContext, ValueKind, WrapperMember,
};
use crate::ir::{
    Abstraction, Class, ClassId, ClassKind, ComposedKind, EnumId, Indexer, Method, MethodKind,
    Parameter, ParameterKind, Primitive, Property, PropertyKind, TypeRef,
};
use crate::Result;

const MODEL_IMPORTS: &[(&str, &str)] = &[
    ("dataclasses", "dataclass"),
    ("dataclasses", "field"),
    ("kiota_abstractions.serialization", "Parsable"),
    ("kiota_abstractions.serialization", "ParseNode"),
    ("kiota_abstractions.serialization", "SerializationWriter"),
    ("typing", "Any"),
    ("typing", "Callable"),
    ("typing", "Optional"),
    ("typing", "TYPE_CHECKING"),
    ("typing", "Union"),
];

const REQUEST_IMPORTS: &[(&str, &str)] = &[
    ("dataclasses", "dataclass"),
    ("dataclasses", "field"),
    ("kiota_abstractions.method", "Method"),
    ("kiota_abstractions.request_adapter", "RequestAdapter"),
    ("kiota_abstractions.request_information", "RequestInformation"),
    ("kiota_abstractions.request_option", "RequestOption"),
    ("kiota_abstractions.serialization", "Parsable"),
    ("kiota_abstractions.serialization", "ParsableFactory"),
    ("typing", "Any"),
    ("typing", "Optional"),
    ("typing", "TYPE_CHECKING"),
    ("typing", "Union"),
];

/// Attributes of `APIError` a generated error property must not shadow
const ERROR_MEMBERS: &[&str] = &["args", "message", "response_headers", "response_status_code"];

pub(super) fn render(context: &RenderContext<'_>, path: &str, unit: FileUnit) -> Result<String> {
    let mut writer = LanguageWriter::new("    ");
    match unit {
        FileUnit::Class(id) => write_class_file(context, &mut writer, path, id)?,
        FileUnit::Enum(id) => write_enum_file(context, &mut writer, id)?,
        // Package markers carry no code
        FileUnit::Namespace(_) => {}
    }
    Ok(writer.finish())
}

fn write_class_file(
    context: &RenderContext<'_>,
    writer: &mut LanguageWriter,
    path: &str,
    id: ClassId,
) -> Result<()> {
    let class = context.class(id);
    let mut imports: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut import = |module: &str, symbol: &str| {
        imports
            .entry(module.to_string())
            .or_default()
            .insert(symbol.to_string());
    };
    let standard = if class.kind == ClassKind::RequestBuilder {
        REQUEST_IMPORTS
    } else {
        MODEL_IMPORTS
    };
    for (module, symbol) in standard {
        import(module, symbol);
    }
    for external in context.external_imports(class) {
        import(&external.module, &external.symbol);
    }
    if context.client_constructor(class).is_some() {
        for registration in context.registrations() {
            if let Some(external) = registration.import {
                import(&external.module, &external.symbol);
            }
        }
    }
    if context.extends_api_exception(class) {
        if let Some(external) = context
            .conventions
            .abstraction_import(Abstraction::ApiException)
        {
            import(&external.module, &external.symbol);
        }
    }
    if is_intersection(class) {
        import("kiota_abstractions.serialization", "ParseNodeHelper");
    }
    if context.is_backed(id) {
        import("kiota_abstractions.store", "BackingStoreFactorySingleton");
    }

    writer.write_line("from __future__ import annotations");
    for (module, symbols) in &imports {
        if module.is_empty() {
            for symbol in symbols {
                writer.write_line(format!("import {}", symbol));
            }
        } else {
            let symbols: Vec<&str> = symbols.iter().map(String::as_str).collect();
            writer.write_line(format!("from {} import {}", module, symbols.join(", ")));
        }
    }

    let base_file = class
        .base
        .as_ref()
        .and_then(|b| b.definition)
        .and_then(|d| context.definition_path(d));
    let referenced = context.referenced_files(id, path);
    if let Some(base_file) = base_file {
        if let Some(symbols) = referenced.get(base_file) {
            write_from(writer, &relative_package_path(path, base_file), symbols);
        }
    }
    let deferred: Vec<_> = referenced
        .iter()
        .filter(|(file, _)| Some(**file) != base_file)
        .collect();
    if !deferred.is_empty() {
        writer.blank_line();
        writer.start_block("if TYPE_CHECKING:");
        for (file, symbols) in deferred {
            write_from(writer, &relative_package_path(path, file), symbols);
        }
        writer.end_block(None);
    }
    writer.blank_line();
    write_class(context, writer, path, id)
}

fn write_from(writer: &mut LanguageWriter, module: &str, symbols: &BTreeSet<String>) {
    let symbols: Vec<&str> = symbols.iter().map(String::as_str).collect();
    writer.write_line(format!("from {} import {}", module, symbols.join(", ")));
}

/// Import lines for generated types a method needs at run time
fn write_local_imports<'t>(
    context: &RenderContext<'_>,
    writer: &mut LanguageWriter,
    path: &str,
    type_refs: impl IntoIterator<Item = &'t TypeRef>,
) {
    let mut files: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
    for definition in type_refs.into_iter().filter_map(|t| t.definition) {
        if let Some(file) = context.definition_path(definition).filter(|f| *f != path) {
            files
                .entry(file)
                .or_default()
                .insert(context.definition_name(definition));
        }
    }
    if files.is_empty() {
        return;
    }
    for (file, symbols) in &files {
        write_from(writer, &relative_package_path(path, file), symbols);
    }
    writer.blank_line();
}

fn is_dataclass(class: &Class) -> bool {
    class.kind != ClassKind::RequestBuilder
}

fn write_class(
    context: &RenderContext<'_>,
    writer: &mut LanguageWriter,
    path: &str,
    id: ClassId,
) -> Result<()> {
    let class = context.class(id);
    let mut inner_classes = Vec::new();
    let mut members_started = false;
    let mut body_written = false;
    for element in class_elements(context.model, id) {
        if !members_started
            && !matches!(
                element,
                CodeElement::Property(_) | CodeElement::ClassDeclaration(_) | CodeElement::Using(_)
            )
        {
            members_started = true;
            if class.kind == ClassKind::QueryParameterContainer {
                write_query_parameter_mapping(context, writer, class);
                body_written = true;
            }
        }
        match element {
            CodeElement::Using(_) => {}
            CodeElement::ClassDeclaration(_) => write_declaration(context, writer, id)?,
            CodeElement::Property(property) => {
                body_written |= write_property(context, writer, path, id, property)?;
            }
            CodeElement::Indexer(indexer) => {
                write_indexer(context, writer, path, indexer)?;
                body_written = true;
            }
            CodeElement::Method(method) => {
                body_written |= write_method(context, writer, path, id, method)?;
            }
            CodeElement::InnerClass(inner) => inner_classes.push(inner),
            CodeElement::BlockEnd => {
                if !body_written {
                    writer.write_line("pass");
                }
                writer.end_block(None);
            }
            CodeElement::EnumDeclaration(_) | CodeElement::EnumOption(_) => {}
        }
    }
    for inner in inner_classes {
        writer.blank_line();
        write_class(context, writer, path, inner)?;
    }
    Ok(())
}

fn write_declaration(context: &RenderContext<'_>, writer: &mut LanguageWriter, id: ClassId) -> Result<()> {
    let class = context.class(id);
    let mut bases: Vec<String> = Vec::new();
    if let Some(base) = &class.base {
        bases.push(context.spell_element(base));
    } else if context.extends_api_exception(class) {
        bases.push(context.abstraction(Abstraction::ApiException).to_string());
    }
    bases.extend(class.implements().iter().map(|t| context.spell(t)));
    if is_dataclass(class) {
        writer.write_line("@dataclass");
    }
    let header = if bases.is_empty() {
        format!("class {}:", context.class_name(id))
    } else {
        format!("class {}({}):", context.class_name(id), bases.join(", "))
    };
    writer.start_block(header);
    writer.write_lines(context.doc_lines(&class.documentation)?);
    if let Some(deprecation) = &class.deprecation {
        writer.write_line(format!("# Deprecated: {}", deprecation.message(&class.name)));
    }
    Ok(())
}

fn member_name(context: &RenderContext<'_>, owner: ClassId, property: &Property) -> String {
    let name = context.conventions.property_name(&property.name);
    if context.is_exception(owner) && ERROR_MEMBERS.contains(&name.as_str()) {
        format!("{}_escaped", name)
    } else {
        name
    }
}

/// Spelling without the `Optional[...]` decoration
fn spell_plain(context: &RenderContext<'_>, type_ref: &TypeRef) -> String {
    context.spell(&type_ref.clone().with_nullable(false))
}

fn write_comment(context: &RenderContext<'_>, writer: &mut LanguageWriter, property: &Property) -> Result<()> {
    if let Some(text) = context.documentation_text(&property.documentation)? {
        writer.write_line(format!("# {}", text));
    }
    Ok(())
}

/// Returns whether anything was written into the class body
fn write_property(
    context: &RenderContext<'_>,
    writer: &mut LanguageWriter,
    path: &str,
    owner: ClassId,
    property: &Property,
) -> Result<bool> {
    if property.exists_in_base_type {
        return Ok(false);
    }
    let name = member_name(context, owner, property);
    let class = context.class(owner);
    match property.kind {
        PropertyKind::RequestBuilder => {
            let type_name = context.spell(&property.type_ref);
            writer.blank_line();
            writer.write_line("@property");
            writer.start_block(format!("def {}(self) -> {}:", name, type_name));
            writer.write_lines(context.doc_lines(&property.documentation)?);
            write_local_imports(context, writer, path, [&property.type_ref]);
            writer.write_line(format!(
                "return {}(self.path_parameters, self.request_adapter)",
                type_name
            ));
            writer.end_block(None);
        }
        PropertyKind::AdditionalData => {
            write_comment(context, writer, property)?;
            writer.write_line(format!(
                "{}: {} = field(default_factory=dict)",
                name,
                context.spell(&property.type_ref)
            ));
        }
        PropertyKind::BackingStore => {
            write_comment(context, writer, property)?;
            writer.write_line(format!(
                "{}: {} = field(default_factory=BackingStoreFactorySingleton(backing_store_factory=None).backing_store_factory.create_backing_store, repr=False)",
                name,
                context.spell(&property.type_ref)
            ));
        }
        PropertyKind::Headers => {
            write_comment(context, writer, property)?;
            let type_name = context.spell(&property.type_ref);
            writer.write_line(format!("{}: {} = field(default_factory={})", name, type_name, type_name));
        }
        PropertyKind::Options => {
            write_comment(context, writer, property)?;
            writer.write_line(format!(
                "{}: {} = field(default_factory=list)",
                name,
                context.spell(&property.type_ref)
            ));
        }
        PropertyKind::Custom if class.kind == ClassKind::RequestConfiguration => {
            write_comment(context, writer, property)?;
            writer.write_line(format!(
                "{}: Optional[{}] = field(default_factory=lambda: {}())",
                name,
                spell_plain(context, &property.type_ref),
                context.spell_element(&property.type_ref)
            ));
        }
        PropertyKind::Custom | PropertyKind::QueryParameter => {
            write_comment(context, writer, property)?;
            writer.write_line(format!(
                "{}: Optional[{}] = None",
                name,
                spell_plain(context, &property.type_ref)
            ));
        }
        // Request builders assign these in their constructor
        PropertyKind::PathParameters | PropertyKind::RequestAdapter | PropertyKind::UrlTemplate => {
            return Ok(false)
        }
    }
    Ok(true)
}

fn write_query_parameter_mapping(context: &RenderContext<'_>, writer: &mut LanguageWriter, class: &Class) {
    writer.blank_line();
    writer.start_block("def get_query_parameter(self, original_name: str) -> str:");
    for property in class
        .properties()
        .iter()
        .filter(|p| p.kind == PropertyKind::QueryParameter)
    {
        writer.start_block(format!(
            "if original_name == {}:",
            context
                .conventions
                .string_literal(&context.conventions.property_name(&property.name))
        ));
        writer.write_line(format!(
            "return {}",
            context.conventions.string_literal(property.wire_name())
        ));
        writer.end_block(None);
    }
    writer.write_line("return original_name");
    writer.end_block(None);
}

fn write_indexer(
    context: &RenderContext<'_>,
    writer: &mut LanguageWriter,
    path: &str,
    indexer: &Indexer,
) -> Result<()> {
    let return_type = context.spell(&indexer.return_type);
    let parameter = context.conventions.parameter_name(&indexer.index_parameter_name);
    writer.blank_line();
    writer.start_block(format!(
        "def {}(self, {}: {}) -> {}:",
        context.conventions.method_name(&indexer.name),
        parameter,
        context.spell(&indexer.index_type),
        return_type
    ));
    writer.write_lines(context.doc_lines(&indexer.documentation)?);
    writer.write_line("url_tpl_params = self.path_parameters.copy()");
    writer.write_line(format!(
        "url_tpl_params[{}] = {}",
        context.conventions.string_literal(&indexer.serialization_name),
        parameter
    ));
    write_local_imports(context, writer, path, [&indexer.return_type]);
    writer.write_line(format!("return {}(url_tpl_params, self.request_adapter)", return_type));
    writer.end_block(None);
    Ok(())
}

fn parameter_declaration(context: &RenderContext<'_>, parameter: &Parameter) -> String {
    let name = context.conventions.parameter_name(&parameter.name);
    if parameter.optional {
        format!("{}: Optional[{}] = None", name, spell_plain(context, &parameter.type_ref))
    } else {
        format!("{}: {}", name, context.spell(&parameter.type_ref))
    }
}

fn parameter_list(context: &RenderContext<'_>, method: &Method) -> String {
    std::iter::once("self".to_string())
        .chain(
            method
                .parameters
                .iter()
                .filter(|p| p.kind != ParameterKind::Cancellation)
                .map(|p| parameter_declaration(context, p)),
        )
        .collect::<Vec<_>>()
        .join(", ")
}

fn has_method(class: &Class, kind: MethodKind) -> bool {
    class.methods().iter().any(|m| m.kind == kind)
}

/// Whether the class itself defines `__post_init__`
fn defines_post_init(context: &RenderContext<'_>, class: &Class) -> bool {
    context
        .initialized_properties(class)
        .iter()
        .any(|p| p.kind == PropertyKind::Custom && context.default_expression(p).is_some())
}

fn inherits_post_init(context: &RenderContext<'_>, class: &Class) -> bool {
    let mut current = context.base_class(class);
    while let Some(id) = current {
        let base = context.class(id);
        if defines_post_init(context, base) {
            return true;
        }
        current = context.base_class(base);
    }
    false
}

/// Returns whether anything was written into the class body
fn write_method(
    context: &RenderContext<'_>,
    writer: &mut LanguageWriter,
    path: &str,
    owner: ClassId,
    method: &Method,
) -> Result<bool> {
    let class = context.class(owner);
    let name = context.class_name(owner);
    let docs = context.doc_lines(&method.documentation)?;
    match method.kind {
        MethodKind::Constructor if class.kind == ClassKind::RequestBuilder => {
            writer.blank_line();
            writer.start_block(
                "def __init__(self, path_parameters: Union[str, dict[str, Any]], request_adapter: RequestAdapter) -> None:",
            );
            writer.write_lines(&docs);
            writer.start_block("if isinstance(path_parameters, str):");
            writer.write_line("self.path_parameters: dict[str, Any] = {\"request-raw-url\": path_parameters}");
            writer.end_block(None);
            writer.start_block("else:");
            writer.write_line("self.path_parameters = dict(path_parameters)");
            writer.end_block(None);
            writer.write_line("self.request_adapter = request_adapter");
            write_url_template(context, writer, class);
            writer.end_block(None);
        }
        MethodKind::Constructor => {
            if !defines_post_init(context, class) {
                return Ok(false);
            }
            writer.blank_line();
            writer.start_block("def __post_init__(self) -> None:");
            writer.write_lines(&docs);
            if inherits_post_init(context, class) {
                writer.write_line("super().__post_init__()");
            }
            let defaults: Vec<(&Property, String)> = context
                .initialized_properties(class)
                .into_iter()
                .filter(|p| p.kind == PropertyKind::Custom)
                .filter_map(|p| context.default_expression(p).map(|value| (p, value)))
                .collect();
            write_local_imports(
                context,
                writer,
                path,
                defaults
                    .iter()
                    .map(|(p, _)| &p.type_ref)
                    .filter(|t| t.enum_id().is_some()),
            );
            for (property, value) in defaults {
                let member = member_name(context, owner, property);
                writer.start_block(format!("if self.{} is None:", member));
                writer.write_line(format!("self.{} = {}", member, value));
                writer.end_block(None);
            }
            writer.end_block(None);
        }
        MethodKind::RawUrlConstructor => {
            writer.blank_line();
            writer.start_block(format!("def with_url(self, raw_url: str) -> {}:", name));
            writer.write_lines(&docs);
            if has_method(class, MethodKind::Constructor) {
                writer.write_line(format!("return {}(raw_url, self.request_adapter)", name));
            } else {
                writer.write_line(format!("builder = {}(self.request_adapter)", name));
                writer.write_line("builder.path_parameters = {\"request-raw-url\": raw_url}");
                writer.write_line("return builder");
            }
            writer.end_block(None);
        }
        MethodKind::ClientConstructor => {
            writer.blank_line();
            writer.start_block(format!("def __init__({}) -> None:", parameter_list(context, method)));
            writer.write_lines(&docs);
            writer.write_line("self.path_parameters: dict[str, Any] = {}");
            writer.write_line("self.request_adapter = request_adapter");
            write_url_template(context, writer, class);
            for registration in context.registrations() {
                writer.write_line(format!(
                    "request_adapter.{}({}, {}())",
                    if registration.serializer {
                        "register_serializer"
                    } else {
                        "register_deserializer"
                    },
                    context.conventions.string_literal(registration.content_type),
                    registration.factory
                ));
            }
            if let Some(base_url) = method.base_url.as_deref().filter(|u| !u.is_empty()) {
                writer.start_block("if not request_adapter.base_url:");
                writer.write_line(format!(
                    "request_adapter.base_url = {}",
                    context.conventions.string_literal(base_url)
                ));
                writer.end_block(None);
            }
            writer.write_line("self.path_parameters[\"baseurl\"] = request_adapter.base_url");
            writer.end_block(None);
        }
        MethodKind::Factory => write_factory(context, writer, path, owner, &docs),
        MethodKind::Deserializer => write_deserializer(context, writer, path, owner, &docs),
        MethodKind::Serializer => write_serializer(context, writer, owner, &docs),
        MethodKind::RequestExecutor => write_executor(context, writer, path, method, &docs),
        MethodKind::RequestGenerator => write_generator(context, writer, method, &docs),
        MethodKind::RequestBuilderWithParameters => {
            let return_type = context.spell(&method.return_type);
            writer.blank_line();
            writer.start_block(format!(
                "def {}({}) -> {}:",
                context.conventions.method_name(&method.name),
                parameter_list(context, method),
                return_type
            ));
            writer.write_lines(&docs);
            writer.write_line("url_tpl_params = self.path_parameters.copy()");
            for parameter in method.parameters.iter().filter(|p| p.kind == ParameterKind::Path) {
                writer.write_line(format!(
                    "url_tpl_params[{}] = {}",
                    context.conventions.string_literal(parameter.wire_name()),
                    context.conventions.parameter_name(&parameter.name)
                ));
            }
            write_local_imports(context, writer, path, [&method.return_type]);
            writer.write_line(format!("return {}(url_tpl_params, self.request_adapter)", return_type));
            writer.end_block(None);
        }
        // Dataclass fields are their own accessors
        MethodKind::Getter | MethodKind::Setter | MethodKind::IndexerAccessor => return Ok(false),
    }
    Ok(true)
}

fn write_url_template(context: &RenderContext<'_>, writer: &mut LanguageWriter, class: &Class) {
    if let Some(template) = context.url_template(class) {
        writer.write_line(format!("self.url_template = {}", context.conventions.string_literal(template)));
    }
}

fn primitive_suffix(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::String => "str",
        Primitive::Boolean => "bool",
        Primitive::Integer | Primitive::Int64 | Primitive::Byte | Primitive::Sbyte => "int",
        Primitive::Float | Primitive::Double | Primitive::Decimal => "float",
        Primitive::Guid => "uuid",
        Primitive::DateTimeOffset => "datetime",
        Primitive::DateOnly => "date",
        Primitive::TimeOnly => "time",
        Primitive::Duration => "timedelta",
        Primitive::Binary | Primitive::Base64 | Primitive::Base64Url => "bytes",
        Primitive::Void | Primitive::Untyped => "object",
    }
}

fn is_object_like(type_ref: &TypeRef) -> bool {
    matches!(
        value_kind(type_ref),
        ValueKind::Object(_) | ValueKind::Primitive(Primitive::Untyped)
    )
}

fn parse_expression(context: &RenderContext<'_>, node: &str, type_ref: &TypeRef) -> String {
    let element = context.spell_element(type_ref);
    let collection = type_ref.is_collection();
    match value_kind(type_ref) {
        _ if is_object_like(type_ref) && collection => {
            format!("{}.get_collection_of_object_values({})", node, element)
        }
        _ if is_object_like(type_ref) => format!("{}.get_object_value({})", node, element),
        ValueKind::Enum(_) if collection => {
            format!("{}.get_collection_of_enum_values({})", node, element)
        }
        ValueKind::Enum(_) => format!("{}.get_enum_value({})", node, element),
        ValueKind::Primitive(_) if collection => {
            format!("{}.get_collection_of_primitive_values({})", node, element)
        }
        ValueKind::Primitive(primitive) => format!("{}.get_{}_value()", node, primitive_suffix(primitive)),
        ValueKind::Object(_) => format!("{}.get_object_value({})", node, element),
    }
}

fn write_statement(key: &str, accessor: &str, type_ref: &TypeRef) -> String {
    let collection = type_ref.is_collection();
    let method = match value_kind(type_ref) {
        _ if is_object_like(type_ref) && collection => "write_collection_of_object_values".to_string(),
        _ if is_object_like(type_ref) => "write_object_value".to_string(),
        ValueKind::Enum(_) if collection => "write_collection_of_enum_values".to_string(),
        ValueKind::Enum(_) => "write_enum_value".to_string(),
        ValueKind::Primitive(_) if collection => "write_collection_of_primitive_values".to_string(),
        ValueKind::Primitive(primitive) => format!("write_{}_value", primitive_suffix(primitive)),
        ValueKind::Object(_) => "write_object_value".to_string(),
    };
    format!("writer.{}({}, {})", method, key, accessor)
}

fn is_intersection(class: &Class) -> bool {
    class
        .composed_type
        .as_ref()
        .map(|c| c.kind == ComposedKind::Intersection)
        .unwrap_or(false)
}

fn write_mapping_value(context: &RenderContext<'_>, writer: &mut LanguageWriter, property: &str) {
    writer.start_block("try:");
    writer.write_line(format!(
        "child_node = parse_node.get_child_node({})",
        context.conventions.string_literal(property)
    ));
    writer.write_line("mapping_value = child_node.get_str_value() if child_node else None");
    writer.end_block(None);
    writer.start_block("except AttributeError:");
    writer.write_line("mapping_value = None");
    writer.end_block(None);
}

fn mapping_condition(context: &RenderContext<'_>, values: &[&str]) -> String {
    let checks = values
        .iter()
        .map(|v| format!("mapping_value.casefold() == {}.casefold()", context.conventions.string_literal(v)))
        .collect::<Vec<_>>()
        .join(" or ");
    format!("mapping_value and ({})", checks)
}

fn write_factory(
    context: &RenderContext<'_>,
    writer: &mut LanguageWriter,
    path: &str,
    owner: ClassId,
    docs: &[String],
) {
    let class = context.class(owner);
    let name = context.class_name(owner);
    writer.blank_line();
    writer.write_line("@staticmethod");
    writer.start_block(format!(
        "def create_from_discriminator_value(parse_node: ParseNode) -> {}:",
        name
    ));
    writer.write_lines(docs);
    if class.is_wrapper() {
        write_wrapper_factory(context, writer, path, owner);
    } else if let Some((property, mappings)) = context.discriminator_switch(class) {
        write_mapping_value(context, writer, property);
        for (value, type_ref) in mappings {
            writer.start_block(format!("if {}:", mapping_condition(context, &[value.as_str()])));
            write_local_imports(context, writer, path, [type_ref]);
            writer.write_line(format!("return {}()", context.spell_element(type_ref)));
            writer.end_block(None);
        }
        writer.write_line(format!("return {}()", name));
    } else {
        writer.write_line(format!("return {}()", name));
    }
    writer.end_block(None);
}

fn write_wrapper_factory(context: &RenderContext<'_>, writer: &mut LanguageWriter, path: &str, owner: ClassId) {
    let class = context.class(owner);
    let members = context.wrapper_members(class);
    let intersection = is_intersection(class);
    write_local_imports(context, writer, path, members.iter().map(|m| m.type_ref));
    writer.write_line(format!("result = {}()", context.class_name(owner)));
    if let Some(property) = context.wrapper_discriminator(class) {
        write_mapping_value(context, writer, property);
    }
    let target = |member: &WrapperMember<'_>| format!("result.{}", member_name(context, owner, member.property));

    let mut branches: Vec<(String, String)> = Vec::new();
    if !intersection {
        for member in members.iter().filter(|m| m.is_object() && !m.discriminator_values.is_empty()) {
            branches.push((
                mapping_condition(context, &member.discriminator_values),
                format!("{} = {}()", target(member), context.spell_element(member.type_ref)),
            ));
        }
    }
    for member in members.iter().filter(|m| !m.is_object()) {
        let local = format!("{}_value", member_name(context, owner, member.property));
        branches.push((
            format!(
                "({} := {}) is not None",
                local,
                parse_expression(context, "parse_node", member.type_ref)
            ),
            format!("{} = {}", target(member), local),
        ));
    }
    let objects: Vec<String> = members
        .iter()
        .filter(|m| m.is_object())
        .map(|m| format!("{} = {}()", target(m), context.spell_element(m.type_ref)))
        .collect();
    let fallback: Vec<String> = if intersection {
        objects
    } else {
        objects.into_iter().take(1).collect()
    };
    write_branches(writer, &branches, &fallback);
    writer.write_line("return result");
}

/// `if`/`elif` chain with an optional `else`
fn write_branches(writer: &mut LanguageWriter, branches: &[(String, String)], fallback: &[String]) {
    for (index, (condition, body)) in branches.iter().enumerate() {
        let keyword = if index == 0 { "if" } else { "elif" };
        writer.start_block(format!("{} {}:", keyword, condition));
        writer.write_line(body);
        writer.end_block(None);
    }
    if fallback.is_empty() {
        return;
    }
    if branches.is_empty() {
        writer.write_lines(fallback);
    } else {
        writer.start_block("else:");
        writer.write_lines(fallback);
        writer.end_block(None);
    }
}

fn write_deserializer(
    context: &RenderContext<'_>,
    writer: &mut LanguageWriter,
    path: &str,
    owner: ClassId,
    docs: &[String],
) {
    let class = context.class(owner);
    writer.blank_line();
    writer.start_block("def get_field_deserializers(self) -> dict[str, Callable[[ParseNode], None]]:");
    writer.write_lines(docs);
    if class.is_wrapper() {
        let members: Vec<String> = context
            .wrapper_members(class)
            .iter()
            .filter(|m| m.is_object())
            .map(|m| format!("self.{}", member_name(context, owner, m.property)))
            .collect();
        if is_intersection(class) && !members.is_empty() {
            writer.start_block(format!("if {}:", members.join(" or ")));
            writer.write_line(format!(
                "return ParseNodeHelper.merge_deserializers_for_intersection_wrapper({})",
                members.join(", ")
            ));
            writer.end_block(None);
        } else {
            for member in &members {
                writer.start_block(format!("if {}:", member));
                writer.write_line(format!("return {}.get_field_deserializers()", member));
                writer.end_block(None);
            }
        }
        writer.write_line("return {}");
        writer.end_block(None);
        return;
    }
    let properties = context.own_properties(class);
    write_local_imports(
        context,
        writer,
        path,
        properties.iter().map(|p| &p.type_ref),
    );
    writer.start_block("fields: dict[str, Callable[[Any], None]] = {");
    for property in &properties {
        writer.write_line(format!(
            "{}: lambda n : setattr(self, '{}', {}),",
            context.conventions.string_literal(property.wire_name()),
            member_name(context, owner, property),
            parse_expression(context, "n", &property.type_ref)
        ));
    }
    writer.end_block(Some("}"));
    if class.base.is_some() {
        writer.write_line("super_fields = super().get_field_deserializers()");
        writer.write_line("fields.update(super_fields)");
    }
    writer.write_line("return fields");
    writer.end_block(None);
}

fn write_serializer(context: &RenderContext<'_>, writer: &mut LanguageWriter, owner: ClassId, docs: &[String]) {
    let class = context.class(owner);
    writer.blank_line();
    writer.start_block("def serialize(self, writer: SerializationWriter) -> None:");
    writer.write_lines(docs);
    if class.is_wrapper() {
        let members = context.wrapper_members(class);
        let intersection = is_intersection(class);
        let branches: Vec<(String, String)> = members
            .iter()
            .filter(|m| !(intersection && m.is_object()))
            .map(|m| {
                let accessor = format!("self.{}", member_name(context, owner, m.property));
                (
                    format!("{} is not None", accessor),
                    write_statement("None", &accessor, m.type_ref),
                )
            })
            .collect();
        let objects: Vec<String> = members
            .iter()
            .filter(|m| intersection && m.is_object())
            .map(|m| format!("self.{}", member_name(context, owner, m.property)))
            .collect();
        let fallback: Vec<String> = if objects.is_empty() {
            Vec::new()
        } else {
            vec![format!("writer.write_object_value(None, {})", objects.join(", "))]
        };
        write_branches(writer, &branches, &fallback);
        if branches.is_empty() && fallback.is_empty() {
            writer.write_line("pass");
        }
        writer.end_block(None);
        return;
    }
    if class.base.is_some() {
        writer.write_line("super().serialize(writer)");
    }
    for property in context.own_properties(class).into_iter().filter(|p| !p.read_only) {
        writer.write_line(write_statement(
            &context.conventions.string_literal(property.wire_name()),
            &format!("self.{}", member_name(context, owner, property)),
            &property.type_ref,
        ));
    }
    if let Some(property) = class
        .properties()
        .iter()
        .find(|p| p.kind == PropertyKind::AdditionalData)
    {
        writer.write_line(format!(
            "writer.write_additional_data_value(self.{})",
            member_name(context, owner, property)
        ));
    }
    writer.end_block(None);
}

fn write_executor(
    context: &RenderContext<'_>,
    writer: &mut LanguageWriter,
    path: &str,
    method: &Method,
    docs: &[String],
) {
    let return_type = &method.return_type;
    let annotation = if return_type.is_void() {
        "None".to_string()
    } else {
        format!("Optional[{}]", spell_plain(context, return_type))
    };
    writer.blank_line();
    writer.start_block(format!(
        "async def {}({}) -> {}:",
        context.conventions.method_name(&method.name),
        parameter_list(context, method),
        annotation
    ));
    writer.write_lines(docs);
    let mut arguments: Vec<&str> = Vec::new();
    if method.parameter_of_kind(ParameterKind::RequestBody).is_some() {
        arguments.push("body");
    }
    arguments.push("request_configuration");
    writer.write_line(format!(
        "request_info = self.{}({})",
        context.generator_name(method),
        arguments.join(", ")
    ));
    let mappings = method.error_mappings();
    write_local_imports(
        context,
        writer,
        path,
        mappings
            .iter()
            .map(|(_, t)| t)
            .chain(std::iter::once(return_type)),
    );
    writer.start_block("error_mapping: dict[str, type[ParsableFactory]] = {");
    for (code, type_ref) in mappings {
        writer.write_line(format!(
            "{}: {},",
            context.conventions.string_literal(code),
            context.spell_element(type_ref)
        ));
    }
    writer.end_block(Some("}"));
    let element = context.spell_element(return_type);
    let collection = return_type.is_collection();
    let call = match value_kind(return_type) {
        _ if return_type.is_void() => "send_no_response_content_async(request_info, error_mapping)".to_string(),
        _ if is_object_like(return_type) => format!(
            "{}(request_info, {}, error_mapping)",
            if collection {
                "send_collection_async"
            } else {
                "send_async"
            },
            element
        ),
        ValueKind::Enum(_) => format!(
            "{}(request_info, {}, error_mapping)",
            if collection {
                "send_collection_of_enum_async"
            } else {
                "send_enum_async"
            },
            element
        ),
        _ => format!(
            "{}(request_info, \"{}\", error_mapping)",
            if collection {
                "send_collection_of_primitive_async"
            } else {
                "send_primitive_async"
            },
            element
        ),
    };
    writer.write_line(format!("return await self.request_adapter.{}", call));
    writer.end_block(None);
}

fn write_generator(context: &RenderContext<'_>, writer: &mut LanguageWriter, method: &Method, docs: &[String]) {
    writer.blank_line();
    writer.start_block(format!(
        "def {}({}) -> RequestInformation:",
        context.conventions.method_name(&method.name),
        parameter_list(context, method)
    ));
    writer.write_lines(docs);
    writer.write_line(format!(
        "request_info = RequestInformation(Method.{}, self.url_template, self.path_parameters)",
        method.http_method.map(|m| m.as_str()).unwrap_or("GET")
    ));
    writer.start_block("if request_configuration:");
    writer.write_line("request_info.headers.add_all(request_configuration.headers)");
    writer.write_line("request_info.add_request_options(request_configuration.options)");
    if context.has_query_parameters(method) {
        writer.write_line(
            "request_info.set_query_string_parameters_from_raw_object(request_configuration.query_parameters)",
        );
    }
    writer.end_block(None);
    if let Some(accept) = context.accept_header(method) {
        writer.write_line(format!(
            "request_info.headers.try_add(\"Accept\", {})",
            context.conventions.string_literal(&accept)
        ));
    }
    if let Some(body) = method.parameter_of_kind(ParameterKind::RequestBody) {
        let content_type = context.conventions.string_literal(
            method
                .request_body_content_type
                .as_deref()
                .unwrap_or("application/octet-stream"),
        );
        let statement = match value_kind(&body.type_ref) {
            ValueKind::Object(_) => format!(
                "request_info.set_content_from_parsable(self.request_adapter, {}, body)",
                content_type
            ),
            ValueKind::Primitive(Primitive::Binary) => {
                format!("request_info.set_stream_content(body, {})", content_type)
            }
            _ => format!(
                "request_info.set_content_from_scalar(self.request_adapter, {}, body)",
                content_type
            ),
        };
        writer.write_line(statement);
    }
    writer.write_line("return request_info");
    writer.end_block(None);
}

fn write_enum_file(context: &RenderContext<'_>, writer: &mut LanguageWriter, id: EnumId) -> Result<()> {
    let enumeration = context.model.enumeration(id);
    writer.write_line("from enum import Enum");
    writer.blank_line();
    let mut options = 0;
    for element in enum_elements(context.model, id) {
        match element {
            CodeElement::EnumDeclaration(_) => {
                writer.start_block(format!("class {}(str, Enum):", context.enum_name(id)));
                writer.write_lines(context.doc_lines(&enumeration.documentation)?);
                if let Some(deprecation) = &enumeration.deprecation {
                    writer.write_line(format!("# Deprecated: {}", deprecation.message(&enumeration.name)));
                }
            }
            CodeElement::EnumOption(option) => {
                options += 1;
                if let Some(text) = context.documentation_text(&option.documentation)? {
                    writer.write_line(format!("# {}", text));
                }
                writer.write_line(format!(
                    "{} = {}",
                    context.conventions.enum_option_name(&option.name),
                    context.conventions.string_literal(&option.serialization_name)
                ));
            }
            CodeElement::BlockEnd => {
                if options == 0 {
                    writer.write_line("pass");
                }
                writer.end_block(None);
            }
            CodeElement::Using(_)
            | CodeElement::ClassDeclaration(_)
            | CodeElement::Property(_)
            | CodeElement::Indexer(_)
            | CodeElement::Method(_)
            | CodeElement::InnerClass(_) => {}
        }
    }
    Ok(())
}
