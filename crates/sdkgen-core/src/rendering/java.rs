//! Java writer.

// Internal imports (std, crate)
use std::collections::BTreeSet;

use super::{
    class_elements, enum_elements, value_kind, CodeElement, FileUnit, LanguageWriter,
    RenderContext, ValueKind,
};
use crate::ir::{
    Abstraction, Access, Class, ClassId, ClassKind, ComposedKind, Deprecation, EnumId, Indexer,
    Method, MethodKind, Parameter, ParameterKind, Primitive, Property, PropertyKind, TypeRef,
};
use crate::naming::to_first_upper;
use crate::Result;

const STANDARD_IMPORTS: &[&str] = &[
    "com.microsoft.kiota.serialization.Parsable",
    "com.microsoft.kiota.serialization.ParseNode",
    "com.microsoft.kiota.serialization.SerializationWriter",
    "java.util.HashMap",
    "java.util.Map",
    "java.util.Objects",
];

const REQUEST_IMPORTS: &[&str] = &[
    "com.microsoft.kiota.HttpMethod",
    "com.microsoft.kiota.QueryParameter",
    "com.microsoft.kiota.RequestAdapter",
    "com.microsoft.kiota.RequestHeaders",
    "com.microsoft.kiota.RequestInformation",
    "com.microsoft.kiota.RequestOption",
    "com.microsoft.kiota.serialization.ParsableFactory",
];

/// Accessors of `java.lang.Throwable` a generated error property must not override
const THROWABLE_MEMBERS: &[&str] = &["cause", "localizedMessage", "message", "stackTrace", "suppressed"];

const NULLABLE: &str = "@jakarta.annotation.Nullable";
const NONNULL: &str = "@jakarta.annotation.Nonnull";

pub(super) fn render(context: &RenderContext<'_>, _path: &str, unit: FileUnit) -> Result<String> {
    let mut writer = LanguageWriter::new("    ");
    match unit {
        FileUnit::Class(id) => write_class_file(context, &mut writer, id)?,
        FileUnit::Enum(id) => write_enum_file(context, &mut writer, id)?,
        FileUnit::Namespace(_) => {}
    }
    Ok(writer.finish())
}

fn package_of(context: &RenderContext<'_>, dotted: &str) -> String {
    context.conventions.namespace_name(dotted)
}

fn write_class_file(context: &RenderContext<'_>, writer: &mut LanguageWriter, id: ClassId) -> Result<()> {
    let class = context.class(id);
    let elements = class_elements(context.model, id);
    let package = package_of(context, &context.model.namespace(class.namespace()).name);

    let mut imports: BTreeSet<String> = STANDARD_IMPORTS.iter().map(|s| s.to_string()).collect();
    if class.kind == ClassKind::RequestBuilder {
        imports.extend(REQUEST_IMPORTS.iter().map(|s| s.to_string()));
    }
    for element in &elements {
        if let CodeElement::Using(using) = element {
            if let (false, Some(namespace), Some(definition)) =
                (using.external, using.namespace.as_deref(), using.definition)
            {
                let top = match definition {
                    crate::ir::TypeDefinition::Class(c) => {
                        context.class_name(context.model.top_level_class(c))
                    }
                    crate::ir::TypeDefinition::Enum(e) => context.enum_name(e),
                };
                imports.insert(format!("{}.{}", package_of(context, namespace), top));
            }
        }
    }
    imports.extend(
        context
            .external_imports(class)
            .into_iter()
            .map(|i| format!("{}.{}", i.module, i.symbol)),
    );
    if context.client_constructor(class).is_some() {
        imports.extend(
            context
                .registrations()
                .into_iter()
                .filter_map(|r| r.import)
                .map(|i| format!("{}.{}", i.module, i.symbol)),
        );
    }
    if context.is_exception(id) {
        imports.insert("com.microsoft.kiota.ApiException".to_string());
    }
    if class.is_wrapper() {
        imports.insert("com.microsoft.kiota.serialization.ParseNodeHelper".to_string());
    }
    if context.is_backed(id) {
        imports.insert("com.microsoft.kiota.store.BackingStoreFactorySingleton".to_string());
    }

    writer.write_line(format!("package {};", package));
    writer.blank_line();
    for import in imports {
        writer.write_line(format!("import {};", import));
    }
    writer.blank_line();
    write_class(context, writer, &elements, false)?;
    Ok(())
}

fn write_class(
    context: &RenderContext<'_>,
    writer: &mut LanguageWriter,
    elements: &[CodeElement<'_>],
    nested: bool,
) -> Result<()> {
    let mut owner: Option<ClassId> = None;
    let mut accessors_written = false;
    for element in elements {
        if let (Some(id), false) = (owner, accessors_written) {
            if !matches!(element, CodeElement::Property(_)) {
                write_accessors(context, writer, id)?;
                accessors_written = true;
            }
        }
        match *element {
            CodeElement::Using(_) => {}
            CodeElement::ClassDeclaration(id) => {
                owner = Some(id);
                write_declaration(context, writer, id, nested)?;
            }
            CodeElement::Property(property) => {
                if let Some(id) = owner {
                    write_property(context, writer, id, property)?;
                }
            }
            CodeElement::Indexer(indexer) => write_indexer(context, writer, indexer)?,
            CodeElement::Method(method) => {
                if let Some(id) = owner {
                    write_method(context, writer, id, method)?;
                }
            }
            CodeElement::InnerClass(inner) => {
                writer.blank_line();
                write_class(context, writer, &class_elements(context.model, inner), true)?;
            }
            CodeElement::BlockEnd => writer.end_block(Some("}")),
            CodeElement::EnumDeclaration(_) | CodeElement::EnumOption(_) => {}
        }
    }
    Ok(())
}

fn access_modifier(access: Access) -> &'static str {
    match access {
        Access::Public => "public",
        Access::Protected => "protected",
        Access::Private => "private",
    }
}

fn write_deprecation(writer: &mut LanguageWriter, deprecation: Option<&Deprecation>, element: &str) {
    if let Some(deprecation) = deprecation {
        writer.write_line(format!("@Deprecated // {}", deprecation.message(element)));
    }
}

fn write_declaration(
    context: &RenderContext<'_>,
    writer: &mut LanguageWriter,
    id: ClassId,
    nested: bool,
) -> Result<()> {
    let class = context.class(id);
    writer.write_lines(context.doc_lines(&class.documentation)?);
    write_deprecation(writer, class.deprecation.as_ref(), &class.name);
    writer.write_line("@jakarta.annotation.Generated(\"com.microsoft.kiota\")");
    let mut header = format!(
        "public {}class {}",
        if nested { "static " } else { "" },
        context.class_name(id)
    );
    if let Some(base) = &class.base {
        header.push_str(&format!(" extends {}", context.spell(base)));
    } else if context.extends_api_exception(class) {
        header.push_str(&format!(" extends {}", context.abstraction(Abstraction::ApiException)));
    }
    let interfaces: Vec<String> = class.implements().iter().map(|t| context.spell(t)).collect();
    if !interfaces.is_empty() {
        header.push_str(&format!(" implements {}", interfaces.join(", ")));
    }
    writer.start_block(format!("{} {{", header));
    Ok(())
}

/// Accessor suffix of a property (`getX`/`setX`)
fn accessor_name(context: &RenderContext<'_>, owner: ClassId, property: &Property) -> String {
    let name = context.conventions.property_name(&property.name);
    if context.is_exception(owner) && THROWABLE_MEMBERS.contains(&name.as_str()) {
        format!("{}Escaped", to_first_upper(&name))
    } else {
        to_first_upper(&name)
    }
}

fn is_model(class: &Class) -> bool {
    class.kind == ClassKind::Model
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
    let name = context.conventions.property_name(&property.name);
    let type_name = context.spell(&property.type_ref);
    match property.kind {
        PropertyKind::RequestBuilder => {
            writer.blank_line();
            writer.write_lines(context.doc_lines(&property.documentation)?);
            write_deprecation(writer, property.deprecation.as_ref(), &property.name);
            writer.write_line(NONNULL);
            writer.start_block(format!("public {} {}() {{", type_name, name));
            writer.write_line(format!("return new {}(pathParameters, requestAdapter);", type_name));
            writer.end_block(Some("}"));
        }
        // Backed models keep their values in the store, not in fields
        PropertyKind::Custom if is_model(class) && context.is_backed(owner) => {}
        _ if is_model(class) => {
            writer.write_lines(context.doc_lines(&property.documentation)?);
            writer.write_line(format!("private {} {};", type_name, name));
        }
        PropertyKind::QueryParameter => {
            writer.write_lines(context.doc_lines(&property.documentation)?);
            write_deprecation(writer, property.deprecation.as_ref(), &property.name);
            writer.write_line(format!(
                "@QueryParameter(name = {})",
                context.conventions.string_literal(property.wire_name())
            ));
            writer.write_line(NULLABLE);
            writer.write_line(format!("public {} {};", type_name, name));
        }
        PropertyKind::Headers => {
            writer.write_lines(context.doc_lines(&property.documentation)?);
            writer.write_line(format!("public {} {} = new {}();", type_name, name, type_name));
        }
        PropertyKind::Options => {
            writer.write_lines(context.doc_lines(&property.documentation)?);
            writer.write_line(format!("public {} {} = new java.util.ArrayList<>();", type_name, name));
        }
        PropertyKind::Custom if class.kind == ClassKind::RequestConfiguration => {
            writer.write_lines(context.doc_lines(&property.documentation)?);
            writer.write_line(NULLABLE);
            writer.write_line(format!(
                "public {} {} = new {}();",
                type_name,
                name,
                context.spell_element(&property.type_ref)
            ));
        }
        _ => {
            writer.write_lines(context.doc_lines(&property.documentation)?);
            writer.write_line(format!(
                "{} {} {};",
                access_modifier(property.access),
                type_name,
                name
            ));
        }
    }
    Ok(())
}

/// Getters and setters of a model's properties
fn write_accessors(context: &RenderContext<'_>, writer: &mut LanguageWriter, owner: ClassId) -> Result<()> {
    let class = context.class(owner);
    if !is_model(class) {
        return Ok(());
    }
    let backed = context.is_backed(owner);
    for property in class.properties() {
        if property.exists_in_base_type
            || !matches!(
                property.kind,
                PropertyKind::Custom | PropertyKind::AdditionalData | PropertyKind::BackingStore
            )
        {
            continue;
        }
        let name = context.conventions.property_name(&property.name);
        let accessor = accessor_name(context, owner, property);
        let type_name = context.spell(&property.type_ref);
        let through_store = backed && property.kind == PropertyKind::Custom;
        let wire = context.conventions.string_literal(property.wire_name());

        writer.blank_line();
        writer.write_lines(context.doc_lines(&property.documentation)?);
        write_deprecation(writer, property.deprecation.as_ref(), &property.name);
        writer.write_line(if property.type_ref.nullable { NULLABLE } else { NONNULL });
        writer.start_block(format!("public {} get{}() {{", type_name, accessor));
        if through_store {
            writer.write_line(format!("return this.backingStore.get({});", wire));
        } else {
            writer.write_line(format!("return this.{};", name));
        }
        writer.end_block(Some("}"));

        if property.kind == PropertyKind::BackingStore {
            continue;
        }
        writer.blank_line();
        writer.start_block(format!(
            "public void set{}({} final {} value) {{",
            accessor,
            if property.type_ref.nullable { NULLABLE } else { NONNULL },
            type_name
        ));
        if through_store {
            writer.write_line(format!("this.backingStore.set({}, value);", wire));
        } else {
            writer.write_line(format!("this.{} = value;", name));
        }
        writer.end_block(Some("}"));
    }
    Ok(())
}

fn write_indexer(context: &RenderContext<'_>, writer: &mut LanguageWriter, indexer: &Indexer) -> Result<()> {
    let return_type = context.spell(&indexer.return_type);
    let parameter = context.conventions.parameter_name(&indexer.index_parameter_name);
    writer.blank_line();
    writer.write_lines(context.doc_lines(&indexer.documentation)?);
    writer.write_line(NONNULL);
    writer.start_block(format!(
        "public {} {}({} final {} {}) {{",
        return_type,
        context.conventions.method_name(&indexer.name),
        NONNULL,
        context.spell(&indexer.index_type),
        parameter
    ));
    writer.write_line(format!("Objects.requireNonNull({});", parameter));
    writer.write_line("final HashMap<String, Object> urlTplParams = new HashMap<String, Object>(this.pathParameters);");
    writer.write_line(format!(
        "urlTplParams.put({}, {});",
        context.conventions.string_literal(&indexer.serialization_name),
        parameter
    ));
    writer.write_line(format!("return new {}(urlTplParams, requestAdapter);", return_type));
    writer.end_block(Some("}"));
    Ok(())
}

fn parameter_declaration(context: &RenderContext<'_>, parameter: &Parameter) -> String {
    let annotation = if parameter.optional || parameter.type_ref.nullable {
        NULLABLE
    } else {
        NONNULL
    };
    format!(
        "{} final {} {}",
        annotation,
        context.spell(&parameter.type_ref),
        context.conventions.parameter_name(&parameter.name)
    )
}

/// Parameters Java signatures carry; cancellation is not part of the Java API
fn java_parameters(method: &Method) -> impl Iterator<Item = &Parameter> {
    method
        .parameters
        .iter()
        .filter(|p| p.kind != ParameterKind::Cancellation)
}

fn parameter_list(context: &RenderContext<'_>, method: &Method) -> String {
    java_parameters(method)
        .map(|p| parameter_declaration(context, p))
        .collect::<Vec<_>>()
        .join(", ")
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
    let docs = context.doc_lines(&method.documentation)?;
    writer.write_lines(&docs);
    write_deprecation(writer, method.deprecation.as_ref(), &method.name);
    match method.kind {
        MethodKind::Constructor if class.kind == ClassKind::RequestBuilder => {
            writer.start_block(format!("public {}({}) {{", name, parameter_list(context, method)));
            writer.write_line("this.pathParameters = new HashMap<String, Object>(pathParameters);");
            writer.write_line("this.requestAdapter = requestAdapter;");
            write_url_template(context, writer, class);
            writer.end_block(Some("}"));
        }
        MethodKind::Constructor => {
            writer.start_block(format!("public {}() {{", name));
            if class.base.is_some() {
                writer.write_line("super();");
            }
            for property in context.initialized_properties(class) {
                match property.kind {
                    PropertyKind::BackingStore => writer.write_line(
                        "this.backingStore = BackingStoreFactorySingleton.instance.createBackingStore();",
                    ),
                    PropertyKind::AdditionalData => writer.write_line(format!(
                        "this.set{}(new HashMap<>());",
                        accessor_name(context, owner, property)
                    )),
                    PropertyKind::Custom => {
                        if let Some(value) = context.default_expression(property) {
                            writer.write_line(format!(
                                "this.set{}({});",
                                accessor_name(context, owner, property),
                                value
                            ));
                        }
                    }
                    _ => {}
                }
            }
            writer.end_block(Some("}"));
        }
        MethodKind::RawUrlConstructor => {
            writer.start_block(format!("public {}({}) {{", name, parameter_list(context, method)));
            writer.write_line("this.pathParameters = new HashMap<String, Object>();");
            writer.write_line("this.pathParameters.put(\"request-raw-url\", rawUrl);");
            writer.write_line("this.requestAdapter = requestAdapter;");
            write_url_template(context, writer, class);
            writer.end_block(Some("}"));
        }
        MethodKind::ClientConstructor => {
            writer.start_block(format!("public {}({}) {{", name, parameter_list(context, method)));
            writer.write_line("Objects.requireNonNull(requestAdapter);");
            writer.write_line("this.pathParameters = new HashMap<String, Object>();");
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
                writer.start_block("if (requestAdapter.getBaseUrl() == null || requestAdapter.getBaseUrl().isEmpty()) {");
                writer.write_line(format!(
                    "requestAdapter.setBaseUrl({});",
                    context.conventions.string_literal(base_url)
                ));
                writer.end_block(Some("}"));
            }
            writer.write_line("pathParameters.put(\"baseurl\", requestAdapter.getBaseUrl());");
            writer.end_block(Some("}"));
        }
        MethodKind::Factory => write_factory(context, writer, owner, method),
        MethodKind::Deserializer => write_deserializer(context, writer, owner),
        MethodKind::Serializer => write_serializer(context, writer, owner),
        MethodKind::RequestExecutor => write_executor(context, writer, method, &docs),
        MethodKind::RequestGenerator => write_generator(context, writer, method, &docs),
        MethodKind::RequestBuilderWithParameters => {
            let return_type = context.spell(&method.return_type);
            writer.write_line(NONNULL);
            writer.start_block(format!(
                "public {} {}({}) {{",
                return_type,
                context.conventions.method_name(&method.name),
                parameter_list(context, method)
            ));
            writer.write_line("final HashMap<String, Object> urlTplParams = new HashMap<String, Object>(this.pathParameters);");
            for parameter in method.parameters.iter().filter(|p| p.kind == ParameterKind::Path) {
                writer.write_line(format!(
                    "urlTplParams.put({}, {});",
                    context.conventions.string_literal(parameter.wire_name()),
                    context.conventions.parameter_name(&parameter.name)
                ));
            }
            writer.write_line(format!("return new {}(urlTplParams, requestAdapter);", return_type));
            writer.end_block(Some("}"));
        }
        // Model accessors come from the properties themselves
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
        Primitive::Integer => "Integer",
        Primitive::Int64 => "Long",
        Primitive::Float => "Float",
        Primitive::Double => "Double",
        Primitive::Decimal => "BigDecimal",
        Primitive::Byte => "Short",
        Primitive::Sbyte => "Byte",
        Primitive::Guid => "UUID",
        Primitive::DateTimeOffset => "OffsetDateTime",
        Primitive::DateOnly => "LocalDate",
        Primitive::TimeOnly => "LocalTime",
        Primitive::Duration => "PeriodAndDuration",
        Primitive::Binary | Primitive::Base64 | Primitive::Base64Url => "ByteArray",
        Primitive::Void | Primitive::Untyped => "Object",
    }
}

fn factory_reference(context: &RenderContext<'_>, type_ref: &TypeRef) -> String {
    format!("{}::createFromDiscriminatorValue", context.spell_element(type_ref))
}

fn enum_parser(context: &RenderContext<'_>, type_ref: &TypeRef) -> String {
    format!("{}::forValue", context.spell_element(type_ref))
}

fn is_object_like(type_ref: &TypeRef) -> bool {
    matches!(
        value_kind(type_ref),
        ValueKind::Object(_) | ValueKind::Primitive(Primitive::Untyped)
    )
}

fn parse_expression(context: &RenderContext<'_>, node: &str, type_ref: &TypeRef) -> String {
    let collection = type_ref.is_collection();
    match value_kind(type_ref) {
        _ if is_object_like(type_ref) && collection => format!(
            "{}.getCollectionOfObjectValues({})",
            node,
            factory_reference(context, type_ref)
        ),
        _ if is_object_like(type_ref) => {
            format!("{}.getObjectValue({})", node, factory_reference(context, type_ref))
        }
        ValueKind::Enum(_) if collection => format!(
            "{}.getCollectionOfEnumValues({})",
            node,
            enum_parser(context, type_ref)
        ),
        ValueKind::Enum(_) => format!("{}.getEnumValue({})", node, enum_parser(context, type_ref)),
        ValueKind::Primitive(_) if collection => format!(
            "{}.getCollectionOfPrimitiveValues({}.class)",
            node,
            context.spell_element(type_ref)
        ),
        ValueKind::Primitive(primitive) => format!("{}.get{}Value()", node, primitive_suffix(primitive)),
        ValueKind::Object(_) => format!("{}.getObjectValue({})", node, factory_reference(context, type_ref)),
    }
}

fn write_statement(key: &str, accessor: &str, type_ref: &TypeRef) -> String {
    let collection = type_ref.is_collection();
    let method = match value_kind(type_ref) {
        _ if is_object_like(type_ref) && collection => "writeCollectionOfObjectValues".to_string(),
        _ if is_object_like(type_ref) => "writeObjectValue".to_string(),
        ValueKind::Enum(_) if collection => "writeCollectionOfEnumValues".to_string(),
        ValueKind::Enum(_) => "writeEnumValue".to_string(),
        ValueKind::Primitive(_) if collection => "writeCollectionOfPrimitiveValues".to_string(),
        ValueKind::Primitive(primitive) => format!("write{}Value", primitive_suffix(primitive)),
        ValueKind::Object(_) => "writeObjectValue".to_string(),
    };
    format!("writer.{}({}, {});", method, key, accessor)
}

fn write_factory(context: &RenderContext<'_>, writer: &mut LanguageWriter, owner: ClassId, method: &Method) {
    let class = context.class(owner);
    let name = context.class_name(owner);
    writer.write_line(NONNULL);
    writer.start_block(format!(
        "public static {} createFromDiscriminatorValue({}) {{",
        name,
        parameter_list(context, method)
    ));
    writer.write_line("Objects.requireNonNull(parseNode);");
    if class.is_wrapper() {
        write_wrapper_factory(context, writer, owner);
    } else if let Some((property, mappings)) = context.discriminator_switch(class) {
        writer.write_line(format!(
            "final ParseNode mappingValueNode = parseNode.getChildNode({});",
            context.conventions.string_literal(property)
        ));
        writer.start_block("if (mappingValueNode != null) {");
        writer.write_line("final String mappingValue = mappingValueNode.getStringValue();");
        writer.start_block("switch (mappingValue) {");
        for (value, type_ref) in mappings {
            writer.write_line(format!(
                "case {}: return new {}();",
                context.conventions.string_literal(value),
                context.spell_element(type_ref)
            ));
        }
        writer.end_block(Some("}"));
        writer.end_block(Some("}"));
        writer.write_line(format!("return new {}();", name));
    } else {
        writer.write_line(format!("return new {}();", name));
    }
    writer.end_block(Some("}"));
}

fn is_intersection(class: &Class) -> bool {
    class
        .composed_type
        .as_ref()
        .map(|c| c.kind == ComposedKind::Intersection)
        .unwrap_or(false)
}

fn write_wrapper_factory(context: &RenderContext<'_>, writer: &mut LanguageWriter, owner: ClassId) {
    let class = context.class(owner);
    let members = context.wrapper_members(class);
    let intersection = is_intersection(class);
    writer.write_line(format!(
        "final {} result = new {}();",
        context.class_name(owner),
        context.class_name(owner)
    ));
    if let Some(property) = context.wrapper_discriminator(class) {
        writer.write_line(format!(
            "final ParseNode mappingValueNode = parseNode.getChildNode({});",
            context.conventions.string_literal(property)
        ));
        writer.write_line(
            "final String mappingValue = mappingValueNode == null ? null : mappingValueNode.getStringValue();",
        );
    }
    let setter = |member: &super::WrapperMember<'_>| {
        format!("result.set{}", accessor_name(context, owner, member.property))
    };

    let mut branches: Vec<(String, String)> = Vec::new();
    if !intersection {
        for member in members.iter().filter(|m| m.is_object() && !m.discriminator_values.is_empty()) {
            let condition = member
                .discriminator_values
                .iter()
                .map(|v| format!("{}.equalsIgnoreCase(mappingValue)", context.conventions.string_literal(v)))
                .collect::<Vec<_>>()
                .join(" || ");
            branches.push((
                condition,
                format!("{}(new {}());", setter(member), context.spell_element(member.type_ref)),
            ));
        }
    }
    for member in members.iter().filter(|m| !m.is_object()) {
        let read = parse_expression(context, "parseNode", member.type_ref);
        branches.push((format!("{} != null", read), format!("{}({});", setter(member), read)));
    }
    let objects: Vec<String> = members
        .iter()
        .filter(|m| m.is_object())
        .map(|m| format!("{}(new {}());", setter(m), context.spell_element(m.type_ref)))
        .collect();
    let fallback: Vec<String> = if intersection {
        objects
    } else {
        objects.into_iter().take(1).collect()
    };

    for (index, (condition, body)) in branches.iter().enumerate() {
        let keyword = if index == 0 { "if" } else { "} else if" };
        if index == 0 {
            writer.start_block(format!("{} ({}) {{", keyword, condition));
        } else {
            writer.decrease_indent();
            writer.start_block(format!("{} ({}) {{", keyword, condition));
        }
        writer.write_line(body);
    }
    if !branches.is_empty() {
        if fallback.is_empty() {
            writer.end_block(Some("}"));
        } else {
            writer.decrease_indent();
            writer.start_block("} else {");
            writer.write_lines(&fallback);
            writer.end_block(Some("}"));
        }
    } else {
        writer.write_lines(&fallback);
    }
    writer.write_line("return result;");
}

fn write_deserializer(context: &RenderContext<'_>, writer: &mut LanguageWriter, owner: ClassId) {
    let class = context.class(owner);
    let map_type = "Map<String, java.util.function.Consumer<ParseNode>>";
    let hash_map = "HashMap<String, java.util.function.Consumer<ParseNode>>";
    writer.write_line(NONNULL);
    writer.start_block(format!("public {} getFieldDeserializers() {{", map_type));
    if class.is_wrapper() {
        let getters: Vec<String> = context
            .wrapper_members(class)
            .iter()
            .filter(|m| m.is_object())
            .map(|m| format!("this.get{}()", accessor_name(context, owner, m.property)))
            .collect();
        if is_intersection(class) && !getters.is_empty() {
            let checks: Vec<String> = getters.iter().map(|g| format!("{} != null", g)).collect();
            writer.start_block(format!("if ({}) {{", checks.join(" || ")));
            writer.write_line(format!(
                "return ParseNodeHelper.mergeDeserializersForIntersectionWrapper({});",
                getters.join(", ")
            ));
            writer.end_block(Some("}"));
        } else {
            for getter in &getters {
                writer.start_block(format!("if ({} != null) {{", getter));
                writer.write_line(format!("return {}.getFieldDeserializers();", getter));
                writer.end_block(Some("}"));
            }
        }
        writer.write_line(format!("return new {}();", hash_map));
        writer.end_block(Some("}"));
        return;
    }
    let properties = context.own_properties(class);
    if class.base.is_some() {
        writer.write_line(format!(
            "final {} deserializerMap = new {}(super.getFieldDeserializers());",
            hash_map, hash_map
        ));
    } else {
        writer.write_line(format!(
            "final {} deserializerMap = new {}({});",
            hash_map,
            hash_map,
            properties.len()
        ));
    }
    for property in properties {
        writer.write_line(format!(
            "deserializerMap.put({}, (n) -> {{ this.set{}({}); }});",
            context.conventions.string_literal(property.wire_name()),
            accessor_name(context, owner, property),
            parse_expression(context, "n", &property.type_ref)
        ));
    }
    writer.write_line("return deserializerMap;");
    writer.end_block(Some("}"));
}

fn write_serializer(context: &RenderContext<'_>, writer: &mut LanguageWriter, owner: ClassId) {
    let class = context.class(owner);
    writer.start_block(format!(
        "public void serialize({} final SerializationWriter writer) {{",
        NONNULL
    ));
    writer.write_line("Objects.requireNonNull(writer);");
    if class.is_wrapper() {
        let members = context.wrapper_members(class);
        let intersection = is_intersection(class);
        let mut index = 0;
        for member in &members {
            if intersection && member.is_object() {
                continue;
            }
            let getter = format!("this.get{}()", accessor_name(context, owner, member.property));
            if index == 0 {
                writer.start_block(format!("if ({} != null) {{", getter));
            } else {
                writer.decrease_indent();
                writer.start_block(format!("}} else if ({} != null) {{", getter));
            }
            writer.write_line(write_statement("null", &getter, member.type_ref));
            index += 1;
        }
        let objects: Vec<String> = members
            .iter()
            .filter(|m| intersection && m.is_object())
            .map(|m| format!("this.get{}()", accessor_name(context, owner, m.property)))
            .collect();
        let merged = format!("writer.writeObjectValue(null, {});", objects.join(", "));
        match (index, objects.is_empty()) {
            (0, true) => {}
            (0, false) => writer.write_line(merged),
            (_, true) => writer.end_block(Some("}")),
            (_, false) => {
                writer.decrease_indent();
                writer.start_block("} else {");
                writer.write_line(merged);
                writer.end_block(Some("}"));
            }
        }
        writer.end_block(Some("}"));
        return;
    }
    if class.base.is_some() {
        writer.write_line("super.serialize(writer);");
    }
    for property in context.own_properties(class).into_iter().filter(|p| !p.read_only) {
        writer.write_line(write_statement(
            &context.conventions.string_literal(property.wire_name()),
            &format!("this.get{}()", accessor_name(context, owner, property)),
            &property.type_ref,
        ));
    }
    if let Some(property) = class
        .properties()
        .iter()
        .find(|p| p.kind == PropertyKind::AdditionalData)
    {
        writer.write_line(format!(
            "writer.writeAdditionalData(this.get{}());",
            accessor_name(context, owner, property)
        ));
    }
    writer.end_block(Some("}"));
}

/// Overload without the optional request configuration
fn write_overload(
    context: &RenderContext<'_>,
    writer: &mut LanguageWriter,
    method: &Method,
    return_type: &str,
    name: &str,
) {
    let required: Vec<&Parameter> = java_parameters(method).filter(|p| !p.optional).collect();
    let declarations: Vec<String> = required.iter().map(|p| parameter_declaration(context, p)).collect();
    let mut arguments: Vec<String> = required
        .iter()
        .map(|p| context.conventions.parameter_name(&p.name))
        .collect();
    arguments.push("null".to_string());
    writer.start_block(format!("public {} {}({}) {{", return_type, name, declarations.join(", ")));
    let call = format!("{}({});", name, arguments.join(", "));
    if return_type == "void" {
        writer.write_line(call);
    } else {
        writer.write_line(format!("return {}", call));
    }
    writer.end_block(Some("}"));
    writer.blank_line();
}

fn write_executor(context: &RenderContext<'_>, writer: &mut LanguageWriter, method: &Method, docs: &[String]) {
    let return_type = &method.return_type;
    let spelled = if return_type.is_void() {
        "void".to_string()
    } else {
        context.spell(return_type)
    };
    let name = context.conventions.method_name(&method.name);
    let annotation = (!return_type.is_void()).then_some(NULLABLE);
    writer.write_lines(annotation);
    write_overload(context, writer, method, &spelled, &name);
    writer.write_lines(docs);
    writer.write_lines(annotation);
    writer.start_block(format!("public {} {}({}) {{", spelled, name, parameter_list(context, method)));
    let mut arguments: Vec<&str> = Vec::new();
    if method.parameter_of_kind(ParameterKind::RequestBody).is_some() {
        writer.write_line("Objects.requireNonNull(body);");
        arguments.push("body");
    }
    arguments.push("requestConfiguration");
    writer.write_line(format!(
        "final RequestInformation requestInfo = {}({});",
        context.generator_name(method),
        arguments.join(", ")
    ));
    let factory_map = "HashMap<String, ParsableFactory<? extends Parsable>>";
    writer.write_line(format!("final {} errorMapping = new {}();", factory_map, factory_map));
    for (code, type_ref) in method.error_mappings() {
        writer.write_line(format!(
            "errorMapping.put({}, {});",
            context.conventions.string_literal(code),
            factory_reference(context, type_ref)
        ));
    }
    let collection = return_type.is_collection();
    let call = match value_kind(return_type) {
        _ if return_type.is_void() => {
            "this.requestAdapter.sendPrimitive(requestInfo, errorMapping, Void.class);".to_string()
        }
        _ if is_object_like(return_type) => format!(
            "this.requestAdapter.{}(requestInfo, errorMapping, {});",
            if collection { "sendCollection" } else { "send" },
            factory_reference(context, return_type)
        ),
        ValueKind::Enum(_) => format!(
            "this.requestAdapter.{}(requestInfo, errorMapping, {});",
            if collection { "sendEnumCollection" } else { "sendEnum" },
            enum_parser(context, return_type)
        ),
        _ => format!(
            "this.requestAdapter.{}(requestInfo, errorMapping, {}.class);",
            if collection { "sendPrimitiveCollection" } else { "sendPrimitive" },
            context.spell_element(return_type)
        ),
    };
    if return_type.is_void() {
        writer.write_line(call);
    } else {
        writer.write_line(format!("return {}", call));
    }
    writer.end_block(Some("}"));
}

fn write_generator(context: &RenderContext<'_>, writer: &mut LanguageWriter, method: &Method, docs: &[String]) {
    let name = context.conventions.method_name(&method.name);
    writer.write_line(NONNULL);
    write_overload(context, writer, method, "RequestInformation", &name);
    writer.write_lines(docs);
    writer.write_line(NONNULL);
    writer.start_block(format!("public RequestInformation {}({}) {{", name, parameter_list(context, method)));
    let body = method.parameter_of_kind(ParameterKind::RequestBody);
    if body.is_some() {
        writer.write_line("Objects.requireNonNull(body);");
    }
    writer.write_line(format!(
        "final RequestInformation requestInfo = new RequestInformation(HttpMethod.{}, urlTemplate, pathParameters);",
        method.http_method.map(|m| m.as_str()).unwrap_or("GET")
    ));
    writer.start_block("if (requestConfiguration != null) {");
    writer.write_line("requestInfo.headers.putAll(requestConfiguration.headers);");
    writer.write_line("requestInfo.addRequestOptions(requestConfiguration.options);");
    if context.has_query_parameters(method) {
        writer.write_line("requestInfo.addQueryParameters(requestConfiguration.queryParameters);");
    }
    writer.end_block(Some("}"));
    if let Some(accept) = context.accept_header(method) {
        writer.write_line(format!(
            "requestInfo.headers.tryAdd(\"Accept\", {});",
            context.conventions.string_literal(&accept)
        ));
    }
    if let Some(body) = body {
        let content_type = context.conventions.string_literal(
            method
                .request_body_content_type
                .as_deref()
                .unwrap_or("application/octet-stream"),
        );
        let statement = match value_kind(&body.type_ref) {
            ValueKind::Object(_) if body.type_ref.is_collection() => format!(
                "requestInfo.setContentFromParsable(requestAdapter, {}, body.toArray(new {}[0]));",
                content_type,
                context.spell_element(&body.type_ref)
            ),
            ValueKind::Object(_) => format!(
                "requestInfo.setContentFromParsable(requestAdapter, {}, body);",
                content_type
            ),
            ValueKind::Primitive(Primitive::Binary) => {
                format!("requestInfo.setStreamContent(body, {});", content_type)
            }
            _ => format!(
                "requestInfo.setContentFromScalar(requestAdapter, {}, body);",
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
    let name = context.enum_name(id);
    let package = package_of(context, &context.model.namespace(enumeration.namespace()).name);
    writer.write_line(format!("package {};", package));
    writer.blank_line();
    writer.write_line("import com.microsoft.kiota.serialization.ValuedEnum;");
    writer.write_line("import java.util.Objects;");
    writer.blank_line();
    let count = enumeration.options().len();
    let mut position = 0;
    for element in enum_elements(context.model, id) {
        match element {
            CodeElement::EnumDeclaration(_) => {
                writer.write_lines(context.doc_lines(&enumeration.documentation)?);
                write_deprecation(writer, enumeration.deprecation.as_ref(), &enumeration.name);
                writer.write_line("@jakarta.annotation.Generated(\"com.microsoft.kiota\")");
                writer.start_block(format!("public enum {} implements ValuedEnum {{", name));
            }
            CodeElement::EnumOption(option) => {
                position += 1;
                writer.write_lines(context.doc_lines(&option.documentation)?);
                writer.write_line(format!(
                    "{}({}){}",
                    context.conventions.enum_option_name(&option.name),
                    context.conventions.string_literal(&option.serialization_name),
                    if position == count { ";" } else { "," }
                ));
            }
            CodeElement::BlockEnd => {
                if count == 0 {
                    writer.write_line(";");
                }
                writer.write_line("public final String value;");
                writer.start_block(format!("{}(final String value) {{", name));
                writer.write_line("this.value = value;");
                writer.end_block(Some("}"));
                writer.write_line(NONNULL);
                writer.start_block("public String getValue() {");
                writer.write_line("return this.value;");
                writer.end_block(Some("}"));
                writer.write_line(NULLABLE);
                writer.start_block(format!(
                    "public static {} forValue({} final String searchValue) {{",
                    name, NONNULL
                ));
                writer.write_line("Objects.requireNonNull(searchValue);");
                writer.start_block("switch (searchValue) {");
                for option in enumeration.options() {
                    writer.write_line(format!(
                        "case {}: return {};",
                        context.conventions.string_literal(&option.serialization_name),
                        context.conventions.enum_option_name(&option.name)
                    ));
                }
                writer.write_line("default: return null;");
                writer.end_block(Some("}"));
                writer.end_block(Some("}"));
                writer.end_block(Some("}"));
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

#[cfg(test)]
mod tests {
    use super::super::tests::{model_of, pets, render};
    use crate::language::GenerationLanguage;

    #[test]
    fn test_models_use_accessors() {
        let output = render(&model_of(pets()), GenerationLanguage::Java);
        let pet = &output.files["models/Pet.java"];
        assert!(pet.starts_with("package apisdk.models;\n"));
        assert!(pet.contains("public class Pet implements AdditionalDataHolder, Parsable {"));
        assert!(pet.contains("private String name;"));
        assert!(pet.contains("public String getName() {"));
        assert!(pet.contains("deserializerMap.put(\"name\", (n) -> { this.setName(n.getStringValue()); });"));
        assert!(pet.contains("deserializerMap.put(\"status\", (n) -> { this.setStatus(n.getEnumValue(Status::forValue)); });"));
        assert!(pet.contains("case \"cat\": return new Cat();"));
        assert!(pet.contains("this.setAge(1);"));

        let cat = &output.files["models/Cat.java"];
        assert!(cat.contains("public class Cat extends Pet {"));
        assert!(cat.contains("super.serialize(writer);"));

        let error = &output.files["models/Error.java"];
        assert!(error.contains("public class Error extends ApiException implements AdditionalDataHolder, Parsable {"));
        assert!(error.contains("getMessageEscaped()"));
    }

    #[test]
    fn test_request_builder_methods() {
        let output = render(&model_of(pets()), GenerationLanguage::Java);
        let builder = &output.files["pets/PetsRequestBuilder.java"];
        assert!(builder.contains("import apisdk.models.Pet;"));
        assert!(builder.contains("public java.util.List<Pet> get() {"));
        assert!(builder.contains("return this.requestAdapter.sendCollection(requestInfo, errorMapping, Pet::createFromDiscriminatorValue);"));
        assert!(builder.contains("errorMapping.put(\"4XX\", Error::createFromDiscriminatorValue);"));
        assert!(builder.contains("public WithPetItemRequestBuilder byPetId("));
        assert!(builder.contains("public static class PetsRequestBuilderGetQueryParameters {"));
        assert!(!builder.contains("cancellationToken"));

        let status = &output.files["models/Status.java"];
        assert!(status.contains("Available(\"available\"),"));
        assert!(status.contains("Sold(\"sold\");"));
        assert!(status.contains("case \"sold\": return Sold;"));
    }
}
