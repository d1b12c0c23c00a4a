//! TypeScript writer.
//!
//! Inner classes are emitted at module level, after the class declaring
//! them, and exported from the same file.

// Internal imports (std, crate)
use std::collections::{BTreeMap, BTreeSet};

use super::paths::relative_module_path;
use super::{
    class_elements, enum_elements, value_kind, CodeElement, FileUnit, LanguageWriter,
    RenderContext, ValueKind, WrapperMember,
};
use crate::ir::{
    Access, Class, ClassId, ClassKind, ComposedKind, EnumId, Indexer, Method, MethodKind,
    NamespaceId, Parameter, ParameterKind, Primitive, Property, PropertyKind, TypeRef,
};
use crate::Result;

const ABSTRACTIONS: &str = "@microsoft/kiota-abstractions";

const MODEL_SYMBOLS: &[&str] = &["Parsable", "ParseNode", "SerializationWriter"];

const REQUEST_SYMBOLS: &[&str] = &[
    "HttpMethod",
    "Parsable",
    "ParsableFactory",
    "RequestAdapter",
    "RequestHeaders",
    "RequestInformation",
    "RequestOption",
];

/// Members of the JavaScript `Error` a generated error property must not shadow
const ERROR_MEMBERS: &[&str] = &["cause", "message", "name", "stack"];

pub(super) fn render(context: &RenderContext<'_>, path: &str, unit: FileUnit) -> Result<String> {
    let mut writer = LanguageWriter::new("    ");
    match unit {
        FileUnit::Class(id) => write_class_file(context, &mut writer, path, id)?,
        FileUnit::Enum(id) => write_enum_file(context, &mut writer, id)?,
        FileUnit::Namespace(id) => write_index_file(context, &mut writer, path, id),
    }
    Ok(writer.finish())
}

fn write_header(writer: &mut LanguageWriter) {
    writer.write_line("/* tslint:disable */");
    writer.write_line("/* eslint-disable */");
    writer.write_line("// Generated by sdkgen");
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
        REQUEST_SYMBOLS
    } else {
        MODEL_SYMBOLS
    };
    for symbol in standard {
        import(ABSTRACTIONS, symbol);
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
        import(ABSTRACTIONS, context.abstraction(crate::ir::Abstraction::ApiException));
    }
    if is_intersection(class) {
        import(ABSTRACTIONS, "ParseNodeHelper");
    }
    if context.is_backed(id) {
        import(ABSTRACTIONS, "BackingStoreFactorySingleton");
    }

    write_header(writer);
    for (module, symbols) in &imports {
        write_import(writer, module, symbols);
    }
    for (file, symbols) in context.referenced_files(id, path) {
        write_import(writer, &relative_module_path(path, file), &symbols);
    }
    writer.blank_line();
    write_class(context, writer, id)
}

fn write_import(writer: &mut LanguageWriter, module: &str, symbols: &BTreeSet<String>) {
    let symbols: Vec<&str> = symbols.iter().map(String::as_str).collect();
    writer.write_line(format!("import {{ {} }} from '{}';", symbols.join(", "), module));
}

fn write_class(context: &RenderContext<'_>, writer: &mut LanguageWriter, id: ClassId) -> Result<()> {
    let class = context.class(id);
    let mut inner_classes = Vec::new();
    let mut members_started = false;
    for element in class_elements(context.model, id) {
        if !members_started && !matches!(element, CodeElement::Property(_) | CodeElement::ClassDeclaration(_) | CodeElement::Using(_)) {
            members_started = true;
            if class.kind == ClassKind::QueryParameterContainer {
                write_wire_names(context, writer, class);
            }
        }
        match element {
            CodeElement::Using(_) => {}
            CodeElement::ClassDeclaration(_) => write_declaration(context, writer, id)?,
            CodeElement::Property(property) => write_property(context, writer, id, property)?,
            CodeElement::Indexer(indexer) => write_indexer(context, writer, indexer)?,
            CodeElement::Method(method) => write_method(context, writer, id, method)?,
            CodeElement::InnerClass(inner) => inner_classes.push(inner),
            CodeElement::BlockEnd => writer.end_block(Some("}")),
            CodeElement::EnumDeclaration(_) | CodeElement::EnumOption(_) => {}
        }
    }
    for inner in inner_classes {
        writer.blank_line();
        write_class(context, writer, inner)?;
    }
    Ok(())
}

fn write_declaration(context: &RenderContext<'_>, writer: &mut LanguageWriter, id: ClassId) -> Result<()> {
    let class = context.class(id);
    writer.write_lines(context.doc_lines(&class.documentation)?);
    if let Some(deprecation) = &class.deprecation {
        writer.write_line(format!("/** @deprecated {} */", deprecation.message(&class.name)));
    }
    let mut header = format!("export class {}", context.class_name(id));
    if let Some(base) = &class.base {
        header.push_str(&format!(" extends {}", context.spell_element(base)));
    } else if context.extends_api_exception(class) {
        header.push_str(&format!(
            " extends {}",
            context.abstraction(crate::ir::Abstraction::ApiException)
        ));
    }
    let interfaces: Vec<String> = class.implements().iter().map(|t| context.spell(t)).collect();
    if !interfaces.is_empty() {
        header.push_str(&format!(" implements {}", interfaces.join(", ")));
    }
    writer.start_block(format!("{} {{", header));
    Ok(())
}

fn member_name(context: &RenderContext<'_>, owner: ClassId, property: &Property) -> String {
    let name = context.conventions.property_name(&property.name);
    if context.is_exception(owner) && ERROR_MEMBERS.contains(&name.as_str()) {
        format!("{}Escaped", name)
    } else {
        name
    }
}

fn access_modifier(access: Access) -> &'static str {
    match access {
        Access::Public => "public",
        Access::Protected => "protected",
        Access::Private => "private",
    }
}

/// Spelling without the `| null` decoration
fn spell_plain(context: &RenderContext<'_>, type_ref: &TypeRef) -> String {
    context.spell(&type_ref.clone().with_nullable(false))
}

fn write_property(
    context: &RenderContext<'_>,
    writer: &mut LanguageWriter,
    owner: ClassId,
    property: &Property,
) -> Result<()> {
    if property.exists_in_base_type {
        return Ok(());
    }
    let class = context.class(owner);
    let name = member_name(context, owner, property);
    let type_name = context.spell(&property.type_ref);
    writer.write_lines(context.doc_lines(&property.documentation)?);
    if let Some(deprecation) = &property.deprecation {
        writer.write_line(format!("/** @deprecated {} */", deprecation.message(&property.name)));
    }
    match property.kind {
        PropertyKind::RequestBuilder => {
            writer.start_block(format!("public get {}(): {} {{", name, type_name));
            writer.write_line(format!(
                "return new {}(this.pathParameters, this.requestAdapter);",
                type_name
            ));
            writer.end_block(Some("}"));
        }
        PropertyKind::Custom if class.kind == ClassKind::Model && context.is_backed(owner) => {
            let wire = context.conventions.string_literal(property.wire_name());
            writer.start_block(format!("public get {}(): {} | undefined {{", name, type_name));
            writer.write_line(format!("return this.backingStore.get({});", wire));
            writer.end_block(Some("}"));
            writer.start_block(format!("public set {}(value: {} | undefined) {{", name, type_name));
            writer.write_line(format!("this.backingStore.set({}, value);", wire));
            writer.end_block(Some("}"));
        }
        PropertyKind::Custom if class.kind == ClassKind::RequestConfiguration => {
            writer.write_line(format!(
                "public {}?: {} = new {}();",
                name,
                spell_plain(context, &property.type_ref),
                context.spell_element(&property.type_ref)
            ));
        }
        PropertyKind::Custom | PropertyKind::AdditionalData | PropertyKind::QueryParameter => {
            writer.write_line(format!("public {}?: {};", name, type_name));
        }
        PropertyKind::Headers => {
            writer.write_line(format!("public {}: {} = new {}();", name, type_name, type_name));
        }
        PropertyKind::Options => {
            writer.write_line(format!("public {}: {} = [];", name, type_name));
        }
        PropertyKind::BackingStore
        | PropertyKind::PathParameters
        | PropertyKind::RequestAdapter
        | PropertyKind::UrlTemplate => {
            writer.write_line(format!("{} {}: {};", access_modifier(property.access), name, type_name));
        }
    }
    Ok(())
}

/// Wire names of the query parameters, keyed by property name
fn write_wire_names(context: &RenderContext<'_>, writer: &mut LanguageWriter, class: &Class) {
    writer.start_block("public static readonly wireNames: Record<string, string> = {");
    for property in class
        .properties()
        .iter()
        .filter(|p| p.kind == PropertyKind::QueryParameter)
    {
        writer.write_line(format!(
            "\"{}\": {},",
            context.conventions.property_name(&property.name),
            context.conventions.string_literal(property.wire_name())
        ));
    }
    writer.end_block(Some("};"));
}

fn write_indexer(context: &RenderContext<'_>, writer: &mut LanguageWriter, indexer: &Indexer) -> Result<()> {
    let return_type = context.spell(&indexer.return_type);
    let parameter = context.conventions.parameter_name(&indexer.index_parameter_name);
    writer.blank_line();
    writer.write_lines(context.doc_lines(&indexer.documentation)?);
    writer.start_block(format!(
        "public {}({}: {}): {} {{",
        context.conventions.method_name(&indexer.name),
        parameter,
        context.spell(&indexer.index_type),
        return_type
    ));
    writer.write_line("const urlTplParams: Record<string, unknown> = { ...this.pathParameters };");
    writer.write_line(format!(
        "urlTplParams[{}] = {};",
        context.conventions.string_literal(&indexer.serialization_name),
        parameter
    ));
    writer.write_line(format!("return new {}(urlTplParams, this.requestAdapter);", return_type));
    writer.end_block(Some("}"));
    Ok(())
}

fn parameter_declaration(context: &RenderContext<'_>, parameter: &Parameter) -> String {
    let name = context.conventions.parameter_name(&parameter.name);
    if parameter.optional {
        format!("{}?: {} | undefined", name, spell_plain(context, &parameter.type_ref))
    } else {
        format!("{}: {}", name, context.spell(&parameter.type_ref))
    }
}

fn parameter_list(context: &RenderContext<'_>, method: &Method) -> String {
    method
        .parameters
        .iter()
        .filter(|p| p.kind != ParameterKind::Cancellation)
        .map(|p| parameter_declaration(context, p))
        .collect::<Vec<_>>()
        .join(", ")
}

fn has_method(class: &Class, kind: MethodKind) -> bool {
    class.methods().iter().any(|m| m.kind == kind)
}

fn write_method(
    context: &RenderContext<'_>,
    writer: &mut LanguageWriter,
    owner: ClassId,
    method: &Method,
) -> Result<()> {
    let class = context.class(owner);
    let name = context.class_name(owner);
    writer.blank_line();
    writer.write_lines(context.doc_lines(&method.documentation)?);
    if let Some(deprecation) = &method.deprecation {
        writer.write_line(format!("/** @deprecated {} */", deprecation.message(&method.name)));
    }
    match method.kind {
        // One constructor takes either the path parameters or a raw URL
        MethodKind::Constructor if class.kind == ClassKind::RequestBuilder => {
            writer.start_block(
                "public constructor(pathParameters: Record<string, unknown> | string, requestAdapter: RequestAdapter) {",
            );
            writer.write_line(
                "this.pathParameters = typeof pathParameters === \"string\" ? { \"request-raw-url\": pathParameters } : { ...pathParameters };",
            );
            writer.write_line("this.requestAdapter = requestAdapter;");
            write_url_template(context, writer, class);
            writer.end_block(Some("}"));
        }
        MethodKind::Constructor => {
            writer.start_block("public constructor() {");
            if class.base.is_some() || context.extends_api_exception(class) {
                writer.write_line("super();");
            }
            for property in context.initialized_properties(class) {
                match property.kind {
                    PropertyKind::BackingStore => writer.write_line(
                        "this.backingStore = BackingStoreFactorySingleton.instance.createBackingStore();",
                    ),
                    PropertyKind::AdditionalData => writer.write_line(format!(
                        "this.{} = {{}};",
                        member_name(context, owner, property)
                    )),
                    _ => {
                        if let Some(value) = context.default_expression(property) {
                            writer.write_line(format!(
                                "this.{} = {};",
                                member_name(context, owner, property),
                                value
                            ));
                        }
                    }
                }
            }
            writer.end_block(Some("}"));
        }
        MethodKind::RawUrlConstructor => {
            writer.start_block(format!("public withUrl(rawUrl: string): {} {{", name));
            if has_method(class, MethodKind::Constructor) {
                writer.write_line(format!("return new {}(rawUrl, this.requestAdapter);", name));
            } else {
                writer.write_line(format!("const builder = new {}(this.requestAdapter);", name));
                writer.write_line("builder.pathParameters = { \"request-raw-url\": rawUrl };");
                writer.write_line("return builder;");
            }
            writer.end_block(Some("}"));
        }
        MethodKind::ClientConstructor => {
            writer.start_block(format!("public constructor({}) {{", parameter_list(context, method)));
            writer.write_line("this.pathParameters = {};");
            writer.write_line("this.requestAdapter = requestAdapter;");
            write_url_template(context, writer, class);
            for registration in context.registrations() {
                writer.write_line(format!(
                    "requestAdapter.{}({}, new {}());",
                    if registration.serializer {
                        "registerSerializer"
                    } else {
                        "registerDeserializer"
                    },
                    context.conventions.string_literal(registration.content_type),
                    registration.factory
                ));
            }
            if let Some(base_url) = method.base_url.as_deref().filter(|u| !u.is_empty()) {
                writer.start_block("if (!requestAdapter.baseUrl) {");
                writer.write_line(format!(
                    "requestAdapter.baseUrl = {};",
                    context.conventions.string_literal(base_url)
                ));
                writer.end_block(Some("}"));
            }
            writer.write_line("this.pathParameters[\"baseurl\"] = requestAdapter.baseUrl;");
            writer.end_block(Some("}"));
        }
        MethodKind::Factory => write_factory(context, writer, owner),
        MethodKind::Deserializer => write_deserializer(context, writer, owner),
        MethodKind::Serializer => write_serializer(context, writer, owner),
        MethodKind::RequestExecutor => write_executor(context, writer, method),
        MethodKind::RequestGenerator => write_generator(context, writer, method),
        MethodKind::RequestBuilderWithParameters => {
            let return_type = context.spell(&method.return_type);
            writer.start_block(format!(
                "public {}({}): {} {{",
                context.conventions.method_name(&method.name),
                parameter_list(context, method),
                return_type
            ));
            writer.write_line("const urlTplParams: Record<string, unknown> = { ...this.pathParameters };");
            for parameter in method.parameters.iter().filter(|p| p.kind == ParameterKind::Path) {
                writer.write_line(format!(
                    "urlTplParams[{}] = {};",
                    context.conventions.string_literal(parameter.wire_name()),
                    context.conventions.parameter_name(&parameter.name)
                ));
            }
            writer.write_line(format!("return new {}(urlTplParams, this.requestAdapter);", return_type));
            writer.end_block(Some("}"));
        }
        // Accessors are properties in TypeScript
        MethodKind::Getter | MethodKind::Setter | MethodKind::IndexerAccessor => {}
    }
    Ok(())
}

fn write_url_template(context: &RenderContext<'_>, writer: &mut LanguageWriter, class: &Class) {
    if let Some(template) = context.url_template(class) {
        writer.write_line(format!("this.urlTemplate = {};", context.conventions.string_literal(template)));
    }
}

fn primitive_suffix(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::String => "String",
        Primitive::Boolean => "Boolean",
        Primitive::Integer
        | Primitive::Int64
        | Primitive::Float
        | Primitive::Double
        | Primitive::Decimal
        | Primitive::Byte
        | Primitive::Sbyte => "Number",
        Primitive::Guid => "Guid",
        Primitive::DateTimeOffset => "Date",
        Primitive::DateOnly => "DateOnly",
        Primitive::TimeOnly => "TimeOnly",
        Primitive::Duration => "Duration",
        Primitive::Binary | Primitive::Base64 | Primitive::Base64Url => "ByteArray",
        Primitive::Void | Primitive::Untyped => "Object",
    }
}

fn is_object_like(type_ref: &TypeRef) -> bool {
    matches!(
        value_kind(type_ref),
        ValueKind::Object(_) | ValueKind::Primitive(Primitive::Untyped)
    )
}

fn factory_reference(context: &RenderContext<'_>, type_ref: &TypeRef) -> String {
    format!("{}.createFromDiscriminatorValue", context.spell_element(type_ref))
}

fn parse_expression(context: &RenderContext<'_>, node: &str, type_ref: &TypeRef) -> String {
    let element = context.spell_element(type_ref);
    let collection = type_ref.is_collection();
    match value_kind(type_ref) {
        _ if is_object_like(type_ref) => format!(
            "{}.{}<{}>({})",
            node,
            if collection {
                "getCollectionOfObjectValues"
            } else {
                "getObjectValue"
            },
            element,
            factory_reference(context, type_ref)
        ),
        ValueKind::Enum(_) => format!(
            "{}.{}<{}>({})",
            node,
            if collection {
                "getCollectionOfEnumValues"
            } else {
                "getEnumValue"
            },
            element,
            element
        ),
        ValueKind::Primitive(_) if collection => {
            format!("{}.getCollectionOfPrimitiveValues<{}>()", node, element)
        }
        ValueKind::Primitive(primitive) => format!("{}.get{}Value()", node, primitive_suffix(primitive)),
        ValueKind::Object(_) => format!("{}.getObjectValue<{}>({})", node, element, factory_reference(context, type_ref)),
    }
}

fn write_statement(context: &RenderContext<'_>, key: &str, accessor: &str, type_ref: &TypeRef) -> String {
    let element = context.spell_element(type_ref);
    let collection = type_ref.is_collection();
    let method = match value_kind(type_ref) {
        _ if is_object_like(type_ref) && collection => format!("writeCollectionOfObjectValues<{}>", element),
        _ if is_object_like(type_ref) => format!("writeObjectValue<{}>", element),
        ValueKind::Enum(_) if collection => format!("writeCollectionOfEnumValues<{}>", element),
        ValueKind::Enum(_) => format!("writeEnumValue<{}>", element),
        ValueKind::Primitive(_) if collection => format!("writeCollectionOfPrimitiveValues<{}>", element),
        ValueKind::Primitive(primitive) => format!("write{}Value", primitive_suffix(primitive)),
        ValueKind::Object(_) => format!("writeObjectValue<{}>", element),
    };
    format!("writer.{}({}, {});", method, key, accessor)
}

fn is_intersection(class: &Class) -> bool {
    class
        .composed_type
        .as_ref()
        .map(|c| c.kind == ComposedKind::Intersection)
        .unwrap_or(false)
}

fn write_factory(context: &RenderContext<'_>, writer: &mut LanguageWriter, owner: ClassId) {
    let class = context.class(owner);
    let name = context.class_name(owner);
    writer.start_block(format!(
        "public static createFromDiscriminatorValue(parseNode: ParseNode): {} {{",
        name
    ));
    if class.is_wrapper() {
        write_wrapper_factory(context, writer, owner);
    } else if let Some((property, mappings)) = context.discriminator_switch(class) {
        writer.write_line(format!(
            "const mappingValue = parseNode.getChildNode({})?.getStringValue();",
            context.conventions.string_literal(property)
        ));
        writer.start_block("switch (mappingValue) {");
        for (value, type_ref) in mappings {
            writer.write_line(format!("case {}:", context.conventions.string_literal(value)));
            writer.increase_indent();
            writer.write_line(format!("return new {}();", context.spell_element(type_ref)));
            writer.decrease_indent();
        }
        writer.end_block(Some("}"));
        writer.write_line(format!("return new {}();", name));
    } else {
        writer.write_line(format!("return new {}();", name));
    }
    writer.end_block(Some("}"));
}

fn write_wrapper_factory(context: &RenderContext<'_>, writer: &mut LanguageWriter, owner: ClassId) {
    let class = context.class(owner);
    let members = context.wrapper_members(class);
    let intersection = is_intersection(class);
    writer.write_line(format!("const result = new {}();", context.class_name(owner)));
    if let Some(property) = context.wrapper_discriminator(class) {
        writer.write_line(format!(
            "const mappingValue = parseNode.getChildNode({})?.getStringValue();",
            context.conventions.string_literal(property)
        ));
    }
    let target = |member: &WrapperMember<'_>| format!("result.{}", member_name(context, owner, member.property));

    let mut branches: Vec<(String, String)> = Vec::new();
    if !intersection {
        for member in members.iter().filter(|m| m.is_object() && !m.discriminator_values.is_empty()) {
            let condition = member
                .discriminator_values
                .iter()
                .map(|v| format!("mappingValue === {}", context.conventions.string_literal(v)))
                .collect::<Vec<_>>()
                .join(" || ");
            branches.push((
                condition,
                format!("{} = new {}();", target(member), context.spell_element(member.type_ref)),
            ));
        }
    }
    for member in members.iter().filter(|m| !m.is_object()) {
        let read = parse_expression(context, "parseNode", member.type_ref);
        branches.push((format!("{} !== undefined", read), format!("{} = {};", target(member), read)));
    }
    let objects: Vec<String> = members
        .iter()
        .filter(|m| m.is_object())
        .map(|m| format!("{} = new {}();", target(m), context.spell_element(m.type_ref)))
        .collect();
    let fallback: Vec<String> = if intersection {
        objects
    } else {
        objects.into_iter().take(1).collect()
    };
    write_branches(writer, &branches, &fallback);
    writer.write_line("return result;");
}

/// `if`/`else if` chain with an optional `else`
fn write_branches(writer: &mut LanguageWriter, branches: &[(String, String)], fallback: &[String]) {
    for (index, (condition, body)) in branches.iter().enumerate() {
        if index == 0 {
            writer.start_block(format!("if ({}) {{", condition));
        } else {
            writer.decrease_indent();
            writer.start_block(format!("}} else if ({}) {{", condition));
        }
        writer.write_line(body);
    }
    match (branches.is_empty(), fallback.is_empty()) {
        (true, _) => writer.write_lines(fallback),
        (false, true) => writer.end_block(Some("}")),
        (false, false) => {
            writer.decrease_indent();
            writer.start_block("} else {");
            writer.write_lines(fallback);
            writer.end_block(Some("}"));
        }
    }
}

fn write_deserializer(context: &RenderContext<'_>, writer: &mut LanguageWriter, owner: ClassId) {
    let class = context.class(owner);
    writer.start_block("public getFieldDeserializers(): Record<string, (node: ParseNode) => void> {");
    if class.is_wrapper() {
        let members: Vec<String> = context
            .wrapper_members(class)
            .iter()
            .filter(|m| m.is_object())
            .map(|m| format!("this.{}", member_name(context, owner, m.property)))
            .collect();
        if is_intersection(class) && !members.is_empty() {
            writer.start_block(format!("if ({}) {{", members.join(" || ")));
            writer.write_line(format!(
                "return ParseNodeHelper.mergeDeserializersForIntersectionWrapper({});",
                members.join(", ")
            ));
            writer.end_block(Some("}"));
        } else {
            for member in &members {
                writer.start_block(format!("if ({}) {{", member));
                writer.write_line(format!("return {}.getFieldDeserializers();", member));
                writer.end_block(Some("}"));
            }
        }
        writer.write_line("return {};");
        writer.end_block(Some("}"));
        return;
    }
    writer.start_block("return {");
    if class.base.is_some() {
        writer.write_line("...super.getFieldDeserializers(),");
    }
    for property in context.own_properties(class) {
        writer.write_line(format!(
            "{}: n => {{ this.{} = {}; }},",
            context.conventions.string_literal(property.wire_name()),
            member_name(context, owner, property),
            parse_expression(context, "n", &property.type_ref)
        ));
    }
    writer.end_block(Some("};"));
    writer.end_block(Some("}"));
}

fn write_serializer(context: &RenderContext<'_>, writer: &mut LanguageWriter, owner: ClassId) {
    let class = context.class(owner);
    writer.start_block("public serialize(writer: SerializationWriter): void {");
    if class.is_wrapper() {
        let members = context.wrapper_members(class);
        let intersection = is_intersection(class);
        let branches: Vec<(String, String)> = members
            .iter()
            .filter(|m| !(intersection && m.is_object()))
            .map(|m| {
                let accessor = format!("this.{}", member_name(context, owner, m.property));
                (
                    format!("{} !== undefined", accessor),
                    write_statement(context, "undefined", &accessor, m.type_ref),
                )
            })
            .collect();
        let objects: Vec<String> = members
            .iter()
            .filter(|m| intersection && m.is_object())
            .map(|m| format!("this.{}", member_name(context, owner, m.property)))
            .collect();
        let fallback: Vec<String> = if objects.is_empty() {
            Vec::new()
        } else {
            vec![format!("writer.writeObjectValue(undefined, {});", objects.join(", "))]
        };
        write_branches(writer, &branches, &fallback);
        writer.end_block(Some("}"));
        return;
    }
    if class.base.is_some() {
        writer.write_line("super.serialize(writer);");
    }
    for property in context.own_properties(class).into_iter().filter(|p| !p.read_only) {
        writer.write_line(write_statement(
            context,
            &context.conventions.string_literal(property.wire_name()),
            &format!("this.{}", member_name(context, owner, property)),
            &property.type_ref,
        ));
    }
    if let Some(property) = class
        .properties()
        .iter()
        .find(|p| p.kind == PropertyKind::AdditionalData)
    {
        writer.write_line(format!(
            "writer.writeAdditionalData(this.{});",
            member_name(context, owner, property)
        ));
    }
    writer.end_block(Some("}"));
}

fn write_executor(context: &RenderContext<'_>, writer: &mut LanguageWriter, method: &Method) {
    let return_type = &method.return_type;
    let promised = if return_type.is_void() {
        "void".to_string()
    } else {
        format!("{} | undefined", spell_plain(context, return_type))
    };
    writer.start_block(format!(
        "public async {}({}): Promise<{}> {{",
        context.conventions.method_name(&method.name),
        parameter_list(context, method),
        promised
    ));
    let mut arguments: Vec<&str> = Vec::new();
    if method.parameter_of_kind(ParameterKind::RequestBody).is_some() {
        arguments.push("body");
    }
    arguments.push("requestConfiguration");
    writer.write_line(format!(
        "const requestInfo = this.{}({});",
        context.generator_name(method),
        arguments.join(", ")
    ));
    writer.start_block("const errorMapping = {");
    for (code, type_ref) in method.error_mappings() {
        writer.write_line(format!(
            "{}: {},",
            context.conventions.string_literal(code),
            factory_reference(context, type_ref)
        ));
    }
    writer.end_block(Some("} as Record<string, ParsableFactory<Parsable>>;"));
    let element = context.spell_element(return_type);
    let collection = return_type.is_collection();
    let call = match value_kind(return_type) {
        _ if return_type.is_void() => "sendNoResponseContent(requestInfo, errorMapping)".to_string(),
        _ if is_object_like(return_type) => format!(
            "{}<{}>(requestInfo, {}, errorMapping)",
            if collection { "sendCollection" } else { "send" },
            element,
            factory_reference(context, return_type)
        ),
        ValueKind::Enum(_) => format!(
            "{}<{}>(requestInfo, {}, errorMapping)",
            if collection { "sendCollectionOfEnum" } else { "sendEnum" },
            element,
            element
        ),
        _ => format!(
            "{}<{}>(requestInfo, \"{}\", errorMapping)",
            if collection {
                "sendCollectionOfPrimitive"
            } else {
                "sendPrimitive"
            },
            element,
            element
        ),
    };
    writer.write_line(format!("return this.requestAdapter.{};", call));
    writer.end_block(Some("}"));
}

/// Name of the query parameter class a generator's configuration carries
fn query_parameters_type(context: &RenderContext<'_>, method: &Method) -> Option<String> {
    let configuration = method
        .parameter_of_kind(ParameterKind::RequestConfiguration)?
        .type_ref
        .class_id()?;
    context
        .class(configuration)
        .properties()
        .iter()
        .find(|p| p.kind == PropertyKind::Custom)
        .map(|p| context.spell_element(&p.type_ref))
}

fn write_generator(context: &RenderContext<'_>, writer: &mut LanguageWriter, method: &Method) {
    writer.start_block(format!(
        "public {}({}): RequestInformation {{",
        context.conventions.method_name(&method.name),
        parameter_list(context, method)
    ));
    writer.write_line(format!(
        "const requestInfo = new RequestInformation(HttpMethod.{}, this.urlTemplate, this.pathParameters);",
        method.http_method.map(|m| m.as_str()).unwrap_or("GET")
    ));
    writer.start_block("if (requestConfiguration) {");
    writer.write_line("requestInfo.addRequestHeaders(requestConfiguration.headers);");
    writer.write_line("requestInfo.addRequestOptions(requestConfiguration.options);");
    if context.has_query_parameters(method) {
        if let Some(query) = query_parameters_type(context, method) {
            writer.write_line(format!(
                "requestInfo.addQueryParameters(requestConfiguration.queryParameters, {}.wireNames);",
                query
            ));
        }
    }
    writer.end_block(Some("}"));
    if let Some(accept) = context.accept_header(method) {
        writer.write_line(format!(
            "requestInfo.headers.tryAdd(\"Accept\", {});",
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
                "requestInfo.setContentFromParsable(this.requestAdapter, {}, body);",
                content_type
            ),
            ValueKind::Primitive(Primitive::Binary) => {
                format!("requestInfo.setStreamContent(body, {});", content_type)
            }
            _ => format!(
                "requestInfo.setContentFromScalar(this.requestAdapter, {}, body);",
                content_type
            ),
        };
        writer.write_line(statement);
    }
    writer.write_line("return requestInfo;");
    writer.end_block(Some("}"));
}

fn write_enum_file(context: &RenderContext<'_>, writer: &mut LanguageWriter, id: EnumId) -> Result<()> {
    let enumeration = context.model.enumeration(id);
    write_header(writer);
    for element in enum_elements(context.model, id) {
        match element {
            CodeElement::EnumDeclaration(_) => {
                writer.write_lines(context.doc_lines(&enumeration.documentation)?);
                if let Some(deprecation) = &enumeration.deprecation {
                    writer.write_line(format!("/** @deprecated {} */", deprecation.message(&enumeration.name)));
                }
                writer.start_block(format!("export enum {} {{", context.enum_name(id)));
            }
            CodeElement::EnumOption(option) => {
                writer.write_lines(context.doc_lines(&option.documentation)?);
                writer.write_line(format!(
                    "{} = {},",
                    context.conventions.enum_option_name(&option.name),
                    context.conventions.string_literal(&option.serialization_name)
                ));
            }
            CodeElement::BlockEnd => writer.end_block(Some("}")),
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

/// `index.ts`: re-exports every type file of the namespace
fn write_index_file(context: &RenderContext<'_>, writer: &mut LanguageWriter, path: &str, id: NamespaceId) {
    let namespace = context.model.namespace(id);
    let units = namespace
        .classes()
        .iter()
        .map(|c| FileUnit::Class(*c))
        .chain(namespace.enums().iter().map(|e| FileUnit::Enum(*e)));
    let modules: BTreeSet<String> = units
        .filter_map(|unit| context.paths.path_of(unit))
        .map(|file| relative_module_path(path, file))
        .collect();
    write_header(writer);
    for module in modules {
        writer.write_line(format!("export * from '{}';", module));
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{model_of, pets, render};
    use crate::language::GenerationLanguage;

    #[test]
    fn test_models_and_index() {
        let output = render(&model_of(pets()), GenerationLanguage::TypeScript);
        let pet = &output.files["models/pet.ts"];
        assert!(pet.contains("import { Cat } from './cat';"));
        assert!(pet.contains("export class Pet implements AdditionalDataHolder, Parsable {"));
        assert!(pet.contains("\"name\": n => { this.name = n.getStringValue(); },"));
        assert!(pet.contains("\"status\": n => { this.status = n.getEnumValue<Status>(Status); },"));
        assert!(pet.contains("case \"cat\":"));
        assert!(pet.contains("this.age = 1;"));

        let cat = &output.files["models/cat.ts"];
        assert!(cat.contains("export class Cat extends Pet {"));
        assert!(cat.contains("...super.getFieldDeserializers(),"));

        let error = &output.files["models/error.ts"];
        assert!(error.contains("extends ApiError"));
        assert!(error.contains("public messageEscaped?: string"));

        let index = &output.files["models/index.ts"];
        assert!(index.contains("export * from './pet';"));
        assert!(index.contains("export * from './status';"));

        let status = &output.files["models/status.ts"];
        assert!(status.contains("Available = \"available\","));
    }

    #[test]
    fn test_request_builders() {
        let output = render(&model_of(pets()), GenerationLanguage::TypeScript);
        let builder = &output.files["pets/petsRequestBuilder.ts"];
        assert!(builder.contains("import { Pet } from '../models/pet';"));
        assert!(builder.contains("public async get(requestConfiguration?: PetsRequestBuilderGetRequestConfiguration | undefined): Promise<Pet[] | undefined> {"));
        assert!(builder.contains("return this.requestAdapter.sendCollection<Pet>(requestInfo, Pet.createFromDiscriminatorValue, errorMapping);"));
        assert!(builder.contains("public withUrl(rawUrl: string): PetsRequestBuilder {"));
        assert!(builder.contains("export class PetsRequestBuilderGetQueryParameters {"));
        assert!(builder.contains(".wireNames);"));
        assert!(!builder.contains("cancellationToken"));

        let client = &output.files["apiClient.ts"];
        assert!(client.contains("requestAdapter.registerSerializer(\"application/json\", new JsonSerializationWriterFactory());"));
        assert!(client.contains("builder.pathParameters = { \"request-raw-url\": rawUrl };"));
        assert!(client.contains("import { PetsRequestBuilder } from './pets/petsRequestBuilder';"));
    }
}
