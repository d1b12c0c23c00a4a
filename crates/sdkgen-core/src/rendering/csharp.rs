//! C# writer.

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
use crate::naming::to_first_lower;
use crate::Result;

const STANDARD_USINGS: &[&str] = &[
    "Microsoft.Kiota.Abstractions",
    "Microsoft.Kiota.Abstractions.Extensions",
    "Microsoft.Kiota.Abstractions.Serialization",
    "System",
    "System.Collections.Generic",
    "System.IO",
    "System.Threading",
    "System.Threading.Tasks",
];

/// Members of `System.Exception` a generated error property must not hide
const EXCEPTION_MEMBERS: &[&str] = &[
    "Data",
    "HelpLink",
    "HResult",
    "InnerException",
    "Message",
    "Source",
    "StackTrace",
    "TargetSite",
];

pub(super) fn render(context: &RenderContext<'_>, unit: FileUnit) -> Result<String> {
    let mut writer = LanguageWriter::new("    ");
    match unit {
        FileUnit::Class(id) => write_class_file(context, &mut writer, id)?,
        FileUnit::Enum(id) => write_enum_file(context, &mut writer, id)?,
        FileUnit::Namespace(_) => {}
    }
    Ok(writer.finish())
}

fn write_class_file(context: &RenderContext<'_>, writer: &mut LanguageWriter, id: ClassId) -> Result<()> {
    let class = context.class(id);
    let elements = class_elements(context.model, id);
    let own_namespace = context
        .conventions
        .namespace_name(&context.model.namespace(class.namespace()).name);

    let mut usings: BTreeSet<String> = STANDARD_USINGS.iter().map(|s| s.to_string()).collect();
    for element in &elements {
        if let CodeElement::Using(using) = element {
            if let Some(namespace) = using.namespace.as_deref().filter(|_| !using.external) {
                usings.insert(context.conventions.namespace_name(namespace));
            }
        }
    }
    usings.extend(context.external_imports(class).into_iter().map(|i| i.module));
    if context.client_constructor(class).is_some() {
        usings.extend(
            context
                .registrations()
                .into_iter()
                .filter_map(|r| r.import)
                .map(|i| i.module),
        );
    }
    usings.remove(&own_namespace);

    writer.write_line("// <auto-generated/>");
    for using in usings {
        writer.write_line(format!("using {};", using));
    }
    writer.write_line(format!("namespace {}", own_namespace));
    writer.start_block("{");
    write_class(context, writer, &elements)?;
    writer.end_block(Some("}"));
    Ok(())
}

fn write_class(
    context: &RenderContext<'_>,
    writer: &mut LanguageWriter,
    elements: &[CodeElement<'_>],
) -> Result<()> {
    let mut owner: Option<ClassId> = None;
    for element in elements {
        match *element {
            CodeElement::Using(_) => {}
            CodeElement::ClassDeclaration(id) => {
                owner = Some(id);
                write_declaration(context, writer, id)?;
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
                write_class(context, writer, &class_elements(context.model, inner))?;
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

fn obsolete(context: &RenderContext<'_>, deprecation: &Deprecation, element: &str) -> String {
    format!(
        "[Obsolete({})]",
        context.conventions.string_literal(&deprecation.message(element))
    )
}

fn write_declaration(context: &RenderContext<'_>, writer: &mut LanguageWriter, id: ClassId) -> Result<()> {
    let class = context.class(id);
    writer.write_lines(context.doc_lines(&class.documentation)?);
    if let Some(deprecation) = &class.deprecation {
        writer.write_line(obsolete(context, deprecation, &class.name));
    }
    let mut supertypes = Vec::new();
    if let Some(base) = &class.base {
        supertypes.push(context.spell(base));
    } else if context.extends_api_exception(class) {
        supertypes.push(context.abstraction(Abstraction::ApiException).to_string());
    }
    supertypes.extend(class.implements().iter().map(|t| context.spell(t)));
    let name = context.class_name(id);
    if supertypes.is_empty() {
        writer.write_line(format!("public partial class {}", name));
    } else {
        writer.write_line(format!("public partial class {} : {}", name, supertypes.join(", ")));
    }
    writer.start_block("{");
    Ok(())
}

fn member_name(context: &RenderContext<'_>, owner: ClassId, property: &Property) -> String {
    let name = context.conventions.property_name(&property.name);
    if context.is_exception(owner) && EXCEPTION_MEMBERS.contains(&name.as_str()) {
        format!("{}Escaped", name)
    } else {
        name
    }
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
    let access = access_modifier(property.access);
    writer.write_lines(context.doc_lines(&property.documentation)?);
    if let Some(deprecation) = &property.deprecation {
        writer.write_line(obsolete(context, deprecation, &property.name));
    }
    match property.kind {
        PropertyKind::RequestBuilder => {
            writer.write_line(format!("{} {} {}", access, type_name, name));
            writer.start_block("{");
            writer.write_line(format!("get => new {}(PathParameters, RequestAdapter);", type_name));
            writer.end_block(Some("}"));
        }
        PropertyKind::QueryParameter => {
            if let Some(wire) = &property.serialization_name {
                writer.write_line(format!(
                    "[QueryParameter({})]",
                    context.conventions.string_literal(wire)
                ));
            }
            writer.write_line(format!("{} {} {} {{ get; set; }}", access, type_name, name));
        }
        PropertyKind::Headers | PropertyKind::Options => {
            writer.write_line(format!(
                "{} {} {} {{ get; set; }} = new {}();",
                access, type_name, name, type_name
            ));
        }
        PropertyKind::Custom if class.kind == ClassKind::RequestConfiguration => {
            writer.write_line(format!(
                "{} {} {} {{ get; set; }} = new {}();",
                access,
                type_name,
                name,
                context.spell_element(&property.type_ref)
            ));
        }
        PropertyKind::BackingStore => {
            writer.write_line(format!("public {} {} {{ get; private set; }}", type_name, name));
        }
        PropertyKind::Custom if context.is_backed(owner) => {
            let wire = context.conventions.string_literal(property.wire_name());
            writer.write_line(format!("{} {} {}", access, type_name, name));
            writer.start_block("{");
            writer.write_line(format!("get {{ return BackingStore?.Get<{}>({}); }}", type_name, wire));
            writer.write_line(format!("set {{ BackingStore?.Set({}, value); }}", wire));
            writer.end_block(Some("}"));
        }
        _ => {
            writer.write_line(format!("{} {} {} {{ get; set; }}", access, type_name, name));
        }
    }
    Ok(())
}

fn write_indexer(context: &RenderContext<'_>, writer: &mut LanguageWriter, indexer: &Indexer) -> Result<()> {
    let return_type = context.spell(&indexer.return_type);
    writer.write_lines(context.doc_lines(&indexer.documentation)?);
    writer.write_line(format!(
        "public {} this[{} position]",
        return_type,
        context.spell(&indexer.index_type)
    ));
    writer.start_block("{");
    writer.write_line("get");
    writer.start_block("{");
    writer.write_line("var urlTplParams = new Dictionary<string, object>(PathParameters);");
    writer.write_line(format!(
        "urlTplParams.Add({}, position);",
        context.conventions.string_literal(&indexer.serialization_name)
    ));
    writer.write_line(format!("return new {}(urlTplParams, RequestAdapter);", return_type));
    writer.end_block(Some("}"));
    writer.end_block(Some("}"));
    Ok(())
}

fn parameter_list(context: &RenderContext<'_>, method: &Method) -> String {
    method
        .parameters
        .iter()
        .map(|parameter| parameter_declaration(context, parameter))
        .collect::<Vec<_>>()
        .join(", ")
}

fn parameter_declaration(context: &RenderContext<'_>, parameter: &Parameter) -> String {
    let name = context.conventions.parameter_name(&parameter.name);
    let type_name = context.spell(&parameter.type_ref);
    if parameter.optional {
        format!("{} {} = default", type_name, name)
    } else {
        format!("{} {}", type_name, name)
    }
}

fn write_method(
    context: &RenderContext<'_>,
    writer: &mut LanguageWriter,
    owner: ClassId,
    method: &Method,
) -> Result<()> {
    let class = context.class(owner);
    writer.blank_line();
    writer.write_lines(context.doc_lines(&method.documentation)?);
    if method.kind == MethodKind::RequestExecutor {
        for (code, type_ref) in method.error_mappings() {
            writer.write_line(format!(
                "/// <exception cref=\"{}\">When receiving a {} status code</exception>",
                context.spell_element(type_ref),
                code
            ));
        }
    }
    if let Some(deprecation) = &method.deprecation {
        writer.write_line(obsolete(context, deprecation, &method.name));
    }
    match method.kind {
        MethodKind::Constructor if class.kind == ClassKind::RequestBuilder => {
            writer.write_line(format!("public {}({})", context.class_name(owner), parameter_list(context, method)));
            writer.start_block("{");
            writer.write_line("PathParameters = new Dictionary<string, object>(pathParameters);");
            writer.write_line("RequestAdapter = requestAdapter;");
            write_url_template(context, writer, class);
            writer.end_block(Some("}"));
        }
        MethodKind::Constructor => write_model_constructor(context, writer, owner)?,
        MethodKind::RawUrlConstructor => {
            writer.write_line(format!("public {}({})", context.class_name(owner), parameter_list(context, method)));
            writer.start_block("{");
            writer.write_line("PathParameters = new Dictionary<string, object> { { \"request-raw-url\", rawUrl } };");
            writer.write_line("RequestAdapter = requestAdapter;");
            write_url_template(context, writer, class);
            writer.end_block(Some("}"));
        }
        MethodKind::ClientConstructor => write_client_constructor(context, writer, owner, method),
        MethodKind::Factory => write_factory(context, writer, owner, method),
        MethodKind::Deserializer => write_deserializer(context, writer, owner),
        MethodKind::Serializer => write_serializer(context, writer, owner),
        MethodKind::RequestExecutor => write_executor(context, writer, method),
        MethodKind::RequestGenerator => write_generator(context, writer, method),
        MethodKind::RequestBuilderWithParameters => {
            let return_type = context.spell(&method.return_type);
            writer.write_line(format!(
                "public {} {}({})",
                return_type,
                context.conventions.method_name(&method.name),
                parameter_list(context, method)
            ));
            writer.start_block("{");
            writer.write_line("var urlTplParams = new Dictionary<string, object>(PathParameters);");
            for parameter in method.parameters.iter().filter(|p| p.kind == ParameterKind::Path) {
                writer.write_line(format!(
                    "urlTplParams.Add({}, {});",
                    context.conventions.string_literal(parameter.wire_name()),
                    context.conventions.parameter_name(&parameter.name)
                ));
            }
            writer.write_line(format!("return new {}(urlTplParams, RequestAdapter);", return_type));
            writer.end_block(Some("}"));
        }
        // Properties and indexers cover accessors in C#
        MethodKind::Getter | MethodKind::Setter | MethodKind::IndexerAccessor => {}
    }
    Ok(())
}

fn write_url_template(context: &RenderContext<'_>, writer: &mut LanguageWriter, class: &Class) {
    if let Some(template) = context.url_template(class) {
        writer.write_line(format!("UrlTemplate = {};", context.conventions.string_literal(template)));
    }
}

fn write_model_constructor(context: &RenderContext<'_>, writer: &mut LanguageWriter, owner: ClassId) -> Result<()> {
    let class = context.class(owner);
    let base = if class.base.is_some() { " : base()" } else { "" };
    writer.write_line(format!("public {}(){}", context.class_name(owner), base));
    writer.start_block("{");
    for property in context.initialized_properties(class) {
        match property.kind {
            PropertyKind::BackingStore => writer.write_line(
                "BackingStore = BackingStoreFactorySingleton.Instance.CreateBackingStore();",
            ),
            PropertyKind::AdditionalData => writer.write_line(format!(
                "{} = new Dictionary<string, object>();",
                context.conventions.property_name(&property.name)
            )),
            PropertyKind::Custom => {
                if let Some(value) = context.default_expression(property) {
                    writer.write_line(format!("{} = {};", member_name(context, owner, property), value));
                }
            }
            _ => {}
        }
    }
    writer.end_block(Some("}"));
    Ok(())
}

fn write_client_constructor(
    context: &RenderContext<'_>,
    writer: &mut LanguageWriter,
    owner: ClassId,
    method: &Method,
) {
    let class = context.class(owner);
    writer.write_line(format!("public {}({})", context.class_name(owner), parameter_list(context, method)));
    writer.start_block("{");
    writer.write_line("_ = requestAdapter ?? throw new ArgumentNullException(nameof(requestAdapter));");
    writer.write_line("PathParameters = new Dictionary<string, object>();");
    writer.write_line("RequestAdapter = requestAdapter;");
    write_url_template(context, writer, class);
    for registration in context.registrations() {
        let target = if registration.serializer {
            "RegisterSerializer"
        } else {
            "RegisterDeserializer"
        };
        writer.write_line(format!(
            "RequestAdapter.{}({}, new {}());",
            target,
            context.conventions.string_literal(registration.content_type),
            registration.factory
        ));
    }
    if let Some(base_url) = method.base_url.as_deref().filter(|u| !u.is_empty()) {
        writer.write_line("if (string.IsNullOrEmpty(RequestAdapter.BaseUrl))");
        writer.start_block("{");
        writer.write_line(format!("RequestAdapter.BaseUrl = {};", context.conventions.string_literal(base_url)));
        writer.end_block(Some("}"));
    }
    writer.write_line("PathParameters.TryAdd(\"baseurl\", RequestAdapter.BaseUrl);");
    writer.end_block(Some("}"));
}

/// `Get{X}Value` family of a primitive
fn primitive_suffix(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::String => "String",
        Primitive::Boolean => "Bool",
        Primitive::Integer => "Int",
        Primitive::Int64 => "Long",
        Primitive::Float => "Float",
        Primitive::Double => "Double",
        Primitive::Decimal => "Decimal",
        Primitive::Byte => "Byte",
        Primitive::Sbyte => "Sbyte",
        Primitive::Guid => "Guid",
        Primitive::DateTimeOffset => "DateTimeOffset",
        Primitive::DateOnly => "Date",
        Primitive::TimeOnly => "Time",
        Primitive::Duration => "TimeSpan",
        Primitive::Binary | Primitive::Base64 | Primitive::Base64Url => "ByteArray",
        Primitive::Void | Primitive::Untyped => "Object",
    }
}

fn factory_reference(context: &RenderContext<'_>, type_ref: &TypeRef) -> String {
    format!("{}.CreateFromDiscriminatorValue", context.spell_element(type_ref))
}

/// Expression reading a value of `type_ref` from the parse node `node`
fn parse_expression(context: &RenderContext<'_>, node: &str, type_ref: &TypeRef) -> String {
    let element = context.spell_element(type_ref);
    let collection = type_ref.is_collection();
    match value_kind(type_ref) {
        ValueKind::Object(_) | ValueKind::Primitive(Primitive::Untyped) if collection => format!(
            "{}.GetCollectionOfObjectValues<{}>({})?.AsList()",
            node,
            element,
            factory_reference(context, type_ref)
        ),
        ValueKind::Object(_) | ValueKind::Primitive(Primitive::Untyped) => format!(
            "{}.GetObjectValue<{}>({})",
            node,
            element,
            factory_reference(context, type_ref)
        ),
        ValueKind::Enum(_) if collection => {
            format!("{}.GetCollectionOfEnumValues<{}>()?.AsList()", node, element)
        }
        ValueKind::Enum(_) => format!("{}.GetEnumValue<{}>()", node, element),
        ValueKind::Primitive(_) if collection => {
            format!("{}.GetCollectionOfPrimitiveValues<{}>()?.AsList()", node, element)
        }
        ValueKind::Primitive(primitive) => format!("{}.Get{}Value()", node, primitive_suffix(primitive)),
    }
}

/// Statement writing `accessor` under the key `key` (`null` for wrapper members)
fn write_statement(context: &RenderContext<'_>, key: &str, accessor: &str, type_ref: &TypeRef) -> String {
    let element = context.spell_element(type_ref);
    let collection = type_ref.is_collection();
    match value_kind(type_ref) {
        ValueKind::Object(_) | ValueKind::Primitive(Primitive::Untyped) if collection => format!(
            "writer.WriteCollectionOfObjectValues<{}>({}, {});",
            element, key, accessor
        ),
        ValueKind::Object(_) | ValueKind::Primitive(Primitive::Untyped) => {
            format!("writer.WriteObjectValue<{}>({}, {});", element, key, accessor)
        }
        ValueKind::Enum(_) if collection => format!(
            "writer.WriteCollectionOfEnumValues<{}>({}, {});",
            element, key, accessor
        ),
        ValueKind::Enum(_) => format!("writer.WriteEnumValue<{}>({}, {});", element, key, accessor),
        ValueKind::Primitive(_) if collection => format!(
            "writer.WriteCollectionOfPrimitiveValues<{}>({}, {});",
            element, key, accessor
        ),
        ValueKind::Primitive(primitive) => format!(
            "writer.Write{}Value({}, {});",
            primitive_suffix(primitive),
            key,
            accessor
        ),
    }
}

fn write_factory(context: &RenderContext<'_>, writer: &mut LanguageWriter, owner: ClassId, method: &Method) {
    let class = context.class(owner);
    let name = context.class_name(owner);
    writer.write_line(format!("public static {} CreateFromDiscriminatorValue({})", name, parameter_list(context, method)));
    writer.start_block("{");
    writer.write_line("_ = parseNode ?? throw new ArgumentNullException(nameof(parseNode));");
    if class.is_wrapper() {
        write_wrapper_factory(context, writer, owner);
    } else if let Some((property, mappings)) = context.discriminator_switch(class) {
        writer.write_line(format!(
            "var mappingValue = parseNode.GetChildNode({})?.GetStringValue();",
            context.conventions.string_literal(property)
        ));
        writer.write_line("return mappingValue switch");
        writer.write_line("{");
        writer.increase_indent();
        for (value, type_ref) in mappings {
            writer.write_line(format!(
                "{} => new {}(),",
                context.conventions.string_literal(value),
                context.spell_element(type_ref)
            ));
        }
        writer.write_line(format!("_ => new {}(),", name));
        writer.decrease_indent();
        writer.write_line("};");
    } else {
        writer.write_line(format!("return new {}();", name));
    }
    writer.end_block(Some("}"));
}

fn write_wrapper_factory(context: &RenderContext<'_>, writer: &mut LanguageWriter, owner: ClassId) {
    let class = context.class(owner);
    let members = context.wrapper_members(class);
    let intersection = class
        .composed_type
        .as_ref()
        .map(|c| c.kind == ComposedKind::Intersection)
        .unwrap_or(false);
    if let Some(property) = context.wrapper_discriminator(class) {
        writer.write_line(format!(
            "var mappingValue = parseNode.GetChildNode({})?.GetStringValue();",
            context.conventions.string_literal(property)
        ));
    }
    writer.write_line(format!("var result = new {}();", context.class_name(owner)));

    let mut branches: Vec<(String, Vec<String>)> = Vec::new();
    if !intersection {
        for member in members.iter().filter(|m| m.is_object() && !m.discriminator_values.is_empty()) {
            let condition = member
                .discriminator_values
                .iter()
                .map(|value| {
                    format!(
                        "{}.Equals(mappingValue, StringComparison.OrdinalIgnoreCase)",
                        context.conventions.string_literal(value)
                    )
                })
                .collect::<Vec<_>>()
                .join(" || ");
            branches.push((
                condition,
                vec![format!(
                    "result.{} = new {}();",
                    context.conventions.property_name(&member.property.name),
                    context.spell_element(member.type_ref)
                )],
            ));
        }
    }
    for member in members.iter().filter(|m| !m.is_object()) {
        let name = context.conventions.property_name(&member.property.name);
        let local = format!("{}Value", to_first_lower(&name));
        let spelled = context.spell(&member.type_ref.clone().with_nullable(false));
        branches.push((
            format!(
                "{} is {} {}",
                parse_expression(context, "parseNode", member.type_ref),
                spelled,
                local
            ),
            vec![format!("result.{} = {};", name, local)],
        ));
    }
    let objects: Vec<_> = members.iter().filter(|m| m.is_object()).collect();
    let fallback: Vec<String> = if intersection {
        objects
            .iter()
            .map(|m| {
                format!(
                    "result.{} = new {}();",
                    context.conventions.property_name(&m.property.name),
                    context.spell_element(m.type_ref)
                )
            })
            .collect()
    } else {
        objects
            .first()
            .map(|m| {
                vec![format!(
                    "result.{} = new {}();",
                    context.conventions.property_name(&m.property.name),
                    context.spell_element(m.type_ref)
                )]
            })
            .unwrap_or_default()
    };

    for (index, (condition, body)) in branches.iter().enumerate() {
        let keyword = if index == 0 { "if" } else { "else if" };
        writer.write_line(format!("{}({})", keyword, condition));
        writer.start_block("{");
        writer.write_lines(body);
        writer.end_block(Some("}"));
    }
    if !fallback.is_empty() {
        if branches.is_empty() {
            writer.write_lines(&fallback);
        } else {
            writer.write_line("else");
            writer.start_block("{");
            writer.write_lines(&fallback);
            writer.end_block(Some("}"));
        }
    }
    writer.write_line("return result;");
}

fn write_deserializer(context: &RenderContext<'_>, writer: &mut LanguageWriter, owner: ClassId) {
    let class = context.class(owner);
    let dictionary = "IDictionary<string, Action<IParseNode>>";
    let modifier = if class.base.is_some() { "override" } else { "virtual" };
    writer.write_line(format!("public {} {} GetFieldDeserializers()", modifier, dictionary));
    writer.start_block("{");
    if class.is_wrapper() {
        let members = context.wrapper_members(class);
        let objects: Vec<String> = members
            .iter()
            .filter(|m| m.is_object())
            .map(|m| context.conventions.property_name(&m.property.name))
            .collect();
        let intersection = class
            .composed_type
            .as_ref()
            .map(|c| c.kind == ComposedKind::Intersection)
            .unwrap_or(false);
        if intersection && !objects.is_empty() {
            let checks = objects.iter().map(|o| format!("{} != null", o)).collect::<Vec<_>>();
            writer.write_line(format!("if({})", checks.join(" || ")));
            writer.start_block("{");
            writer.write_line(format!(
                "return ParseNodeHelper.MergeDeserializersForIntersectionWrapper({});",
                objects.join(", ")
            ));
            writer.end_block(Some("}"));
        } else {
            for (index, object) in objects.iter().enumerate() {
                let keyword = if index == 0 { "if" } else { "else if" };
                writer.write_line(format!("{}({} != null)", keyword, object));
                writer.start_block("{");
                writer.write_line(format!("return {}.GetFieldDeserializers();", object));
                writer.end_block(Some("}"));
            }
        }
        writer.write_line("return new Dictionary<string, Action<IParseNode>>();");
        writer.end_block(Some("}"));
        return;
    }
    if class.base.is_some() {
        writer.write_line("return new Dictionary<string, Action<IParseNode>>(base.GetFieldDeserializers())");
    } else {
        writer.write_line("return new Dictionary<string, Action<IParseNode>>");
    }
    writer.write_line("{");
    writer.increase_indent();
    for property in context.own_properties(class) {
        writer.write_line(format!(
            "{{ {}, n => {{ {} = {}; }} }},",
            context.conventions.string_literal(property.wire_name()),
            member_name(context, owner, property),
            parse_expression(context, "n", &property.type_ref)
        ));
    }
    writer.decrease_indent();
    writer.write_line("};");
    writer.end_block(Some("}"));
}

fn write_serializer(context: &RenderContext<'_>, writer: &mut LanguageWriter, owner: ClassId) {
    let class = context.class(owner);
    let modifier = if class.base.is_some() { "override" } else { "virtual" };
    writer.write_line(format!("public {} void Serialize(ISerializationWriter writer)", modifier));
    writer.start_block("{");
    writer.write_line("_ = writer ?? throw new ArgumentNullException(nameof(writer));");
    if class.is_wrapper() {
        let members = context.wrapper_members(class);
        let intersection = class
            .composed_type
            .as_ref()
            .map(|c| c.kind == ComposedKind::Intersection)
            .unwrap_or(false);
        let mut index = 0;
        for member in &members {
            if intersection && member.is_object() {
                continue;
            }
            let name = context.conventions.property_name(&member.property.name);
            let keyword = if index == 0 { "if" } else { "else if" };
            writer.write_line(format!("{}({} != null)", keyword, name));
            writer.start_block("{");
            writer.write_line(write_statement(context, "null", &name, member.type_ref));
            writer.end_block(Some("}"));
            index += 1;
        }
        if intersection {
            let objects: Vec<String> = members
                .iter()
                .filter(|m| m.is_object())
                .map(|m| context.conventions.property_name(&m.property.name))
                .collect();
            if !objects.is_empty() {
                let statement = format!(
                    "writer.WriteObjectValue<{}>(null, {});",
                    context.spell_element(&objects_owner(context, owner)),
                    objects.join(", ")
                );
                if index == 0 {
                    writer.write_line(statement);
                } else {
                    writer.write_line("else");
                    writer.start_block("{");
                    writer.write_line(statement);
                    writer.end_block(Some("}"));
                }
            }
        }
        writer.end_block(Some("}"));
        return;
    }
    if class.base.is_some() {
        writer.write_line("base.Serialize(writer);");
    }
    for property in context.own_properties(class).into_iter().filter(|p| !p.read_only) {
        writer.write_line(write_statement(
            context,
            &context.conventions.string_literal(property.wire_name()),
            &member_name(context, owner, property),
            &property.type_ref,
        ));
    }
    if let Some(property) = class
        .properties()
        .iter()
        .find(|p| p.kind == PropertyKind::AdditionalData)
    {
        writer.write_line(format!(
            "writer.WriteAdditionalData({});",
            context.conventions.property_name(&property.name)
        ));
    }
    writer.end_block(Some("}"));
}

/// Type reference to a wrapper itself, used as the static type of merged writes
fn objects_owner(context: &RenderContext<'_>, owner: ClassId) -> TypeRef {
    TypeRef::class(context.class(owner).name.clone(), owner)
}

fn write_executor(context: &RenderContext<'_>, writer: &mut LanguageWriter, method: &Method) {
    let return_type = &method.return_type;
    let signature_type = if return_type.is_void() {
        "Task".to_string()
    } else {
        format!("Task<{}>", context.spell(return_type))
    };
    writer.write_line(format!(
        "public async {} {}Async({})",
        signature_type,
        context.conventions.method_name(&method.name),
        parameter_list(context, method)
    ));
    writer.start_block("{");
    let mut arguments: Vec<&str> = Vec::new();
    if method.parameter_of_kind(ParameterKind::RequestBody).is_some() {
        writer.write_line("_ = body ?? throw new ArgumentNullException(nameof(body));");
        arguments.push("body");
    }
    arguments.push("requestConfiguration");
    writer.write_line(format!(
        "var requestInfo = {}({});",
        context.generator_name(method),
        arguments.join(", ")
    ));
    if method.error_mappings().is_empty() {
        writer.write_line("var errorMapping = new Dictionary<string, ParsableFactory<IParsable>>();");
    } else {
        writer.write_line("var errorMapping = new Dictionary<string, ParsableFactory<IParsable>>");
        writer.write_line("{");
        writer.increase_indent();
        for (code, type_ref) in method.error_mappings() {
            writer.write_line(format!(
                "{{ {}, {} }},",
                context.conventions.string_literal(code),
                factory_reference(context, type_ref)
            ));
        }
        writer.decrease_indent();
        writer.write_line("};");
    }
    let element = context.spell_element(return_type);
    let tail = "errorMapping, cancellationToken).ConfigureAwait(false);";
    if return_type.is_void() {
        writer.write_line(format!("await RequestAdapter.SendNoContentAsync(requestInfo, {}", tail));
    } else {
        match value_kind(return_type) {
            ValueKind::Object(_) | ValueKind::Primitive(Primitive::Untyped) if return_type.is_collection() => {
                writer.write_line(format!(
                    "var collectionResult = await RequestAdapter.SendCollectionAsync<{}>(requestInfo, {}, {}",
                    element,
                    factory_reference(context, return_type),
                    tail
                ));
                writer.write_line("return collectionResult?.AsList();");
            }
            ValueKind::Object(_) | ValueKind::Primitive(Primitive::Untyped) => {
                writer.write_line(format!(
                    "return await RequestAdapter.SendAsync<{}>(requestInfo, {}, {}",
                    element,
                    factory_reference(context, return_type),
                    tail
                ));
            }
            _ if return_type.is_collection() => {
                writer.write_line(format!(
                    "var collectionResult = await RequestAdapter.SendPrimitiveCollectionAsync<{}>(requestInfo, {}",
                    element, tail
                ));
                writer.write_line("return collectionResult?.AsList();");
            }
            _ => {
                writer.write_line(format!(
                    "return await RequestAdapter.SendPrimitiveAsync<{}>(requestInfo, {}",
                    element, tail
                ));
            }
        }
    }
    writer.end_block(Some("}"));
}

fn write_generator(context: &RenderContext<'_>, writer: &mut LanguageWriter, method: &Method) {
    let verb = method.http_method.map(|m| m.as_str()).unwrap_or("GET");
    writer.write_line(format!(
        "public RequestInformation {}({})",
        context.conventions.method_name(&method.name),
        parameter_list(context, method)
    ));
    writer.start_block("{");
    let body = method.parameter_of_kind(ParameterKind::RequestBody);
    if body.is_some() {
        writer.write_line("_ = body ?? throw new ArgumentNullException(nameof(body));");
    }
    writer.write_line(format!(
        "var requestInfo = new RequestInformation(Method.{}, UrlTemplate, PathParameters);",
        verb
    ));
    writer.write_line("if (requestConfiguration != null)");
    writer.start_block("{");
    writer.write_line("requestInfo.Headers.AddAll(requestConfiguration.Headers);");
    writer.write_line("requestInfo.AddRequestOptions(requestConfiguration.Options);");
    if context.has_query_parameters(method) {
        writer.write_line("requestInfo.AddQueryParameters(requestConfiguration.QueryParameters);");
    }
    writer.end_block(Some("}"));
    if let Some(accept) = context.accept_header(method) {
        writer.write_line(format!(
            "requestInfo.Headers.TryAdd(\"Accept\", {});",
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
                "requestInfo.SetContentFromParsableCollection(RequestAdapter, {}, body);",
                content_type
            ),
            ValueKind::Object(_) => format!(
                "requestInfo.SetContentFromParsable(RequestAdapter, {}, body);",
                content_type
            ),
            ValueKind::Primitive(Primitive::Binary) => {
                format!("requestInfo.SetStreamContent(body, {});", content_type)
            }
            _ if body.type_ref.is_collection() => format!(
                "requestInfo.SetContentFromScalarCollection(RequestAdapter, {}, body);",
                content_type
            ),
            _ => format!(
                "requestInfo.SetContentFromScalar(RequestAdapter, {}, body);",
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
    let namespace = context
        .conventions
        .namespace_name(&context.model.namespace(enumeration.namespace()).name);
    writer.write_line("// <auto-generated/>");
    writer.write_line("using System;");
    writer.write_line("using System.Runtime.Serialization;");
    writer.write_line(format!("namespace {}", namespace));
    writer.start_block("{");
    let mut position = 0u32;
    for element in enum_elements(context.model, id) {
        match element {
            CodeElement::EnumDeclaration(_) => {
                writer.write_lines(context.doc_lines(&enumeration.documentation)?);
                if let Some(deprecation) = &enumeration.deprecation {
                    writer.write_line(obsolete(context, deprecation, &enumeration.name));
                }
                if enumeration.flags {
                    writer.write_line("[Flags]");
                }
                writer.write_line(format!("public enum {}", context.enum_name(id)));
                writer.start_block("{");
            }
            CodeElement::EnumOption(option) => {
                writer.write_lines(context.doc_lines(&option.documentation)?);
                writer.write_line(format!(
                    "[EnumMember(Value = {})]",
                    context.conventions.string_literal(&option.serialization_name)
                ));
                let name = context.conventions.enum_option_name(&option.name);
                if enumeration.flags {
                    writer.write_line(format!("{} = {},", name, 1u64 << position.min(63)));
                } else {
                    writer.write_line(format!("{},", name));
                }
                position += 1;
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
    writer.end_block(Some("}"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::tests::{model_of, pets, render};
    use crate::language::GenerationLanguage;
    use serde_json::json;

    #[test]
    fn test_model_with_discriminator_switch() {
        let output = render(&model_of(pets()), GenerationLanguage::CSharp);
        let pet = &output.files["Models/Pet.cs"];
        assert!(pet.starts_with("// <auto-generated/>\n"));
        assert!(pet.contains("namespace ApiSdk.Models\n{"));
        assert!(pet.contains("public partial class Pet : IAdditionalDataHolder, IParsable"));
        assert!(pet.contains("var mappingValue = parseNode.GetChildNode(\"petType\")?.GetStringValue();"));
        assert!(pet.contains("\"cat\" => new Cat(),"));
        assert!(pet.contains("_ => new Pet(),"));
        assert!(pet.contains("Age = 1;"));
        assert!(pet.contains("{ \"name\", n => { Name = n.GetStringValue(); } },"));
        assert!(pet.contains("writer.WriteEnumValue<Status>(\"status\", Status);"));
        assert!(pet.contains("writer.WriteAdditionalData(AdditionalData);"));

        let cat = &output.files["Models/Cat.cs"];
        assert!(cat.contains("public partial class Cat : Pet"));
        assert!(cat.contains("public override IDictionary<string, Action<IParseNode>> GetFieldDeserializers()"));
        assert!(cat.contains("base.Serialize(writer);"));
        assert!(!cat.contains("mappingValue"));
    }

    #[test]
    fn test_request_builders() {
        let output = render(&model_of(pets()), GenerationLanguage::CSharp);
        let client = &output.files["ApiClient.cs"];
        assert!(client.contains("using ApiSdk.Pets;"));
        assert!(client.contains("RequestAdapter.RegisterSerializer(\"application/json\", new JsonSerializationWriterFactory());"));
        assert!(client.contains("RequestAdapter.BaseUrl = \"https://api.example.com/v1\";"));
        assert!(client.contains("get => new PetsRequestBuilder(PathParameters, RequestAdapter);"));

        let pets = &output.files["Pets/PetsRequestBuilder.cs"];
        assert!(pets.contains("public async Task<List<Pet>?> GetAsync("));
        assert!(pets.contains("SendCollectionAsync<Pet>(requestInfo, Pet.CreateFromDiscriminatorValue"));
        assert!(pets.contains("{ \"4XX\", Error.CreateFromDiscriminatorValue },"));
        assert!(pets.contains("requestInfo.SetContentFromParsable(RequestAdapter, \"application/json\", body);"));
        assert!(pets.contains("public WithPetItemRequestBuilder this[string position]"));
        assert!(pets.contains("urlTplParams.Add(\"petId\", position);"));
        assert!(pets.contains("public partial class PetsRequestBuilderGetQueryParameters"));
        assert!(pets.contains("requestInfo.AddQueryParameters(requestConfiguration.QueryParameters);"));

        let error = &output.files["Models/Error.cs"];
        assert!(error.contains("public partial class Error : ApiException, IAdditionalDataHolder, IParsable"));
        assert!(error.contains("MessageEscaped"));
    }

    #[test]
    fn test_single_mapping_emits_no_switch() {
        let model = model_of(json!({
            "openapi": "3.0.0",
            "info": {"title": "t", "version": "1"},
            "paths": {},
            "components": {"schemas": {
                "Shape": {
                    "type": "object",
                    "properties": {"kind": {"type": "string"}},
                    "discriminator": {"propertyName": "kind", "mapping": {"circle": "#/components/schemas/Circle"}}
                },
                "Circle": {"allOf": [{"$ref": "#/components/schemas/Shape"}, {"type": "object", "properties": {"radius": {"type": "number"}}}]}
            }}
        }));
        let output = render(&model, GenerationLanguage::CSharp);
        let shape = &output.files["Models/Shape.cs"];
        assert!(!shape.contains("mappingValue"));
        assert!(shape.contains("return new Shape();"));
    }

    #[test]
    fn test_union_wrapper_prefers_first_object_member() {
        let output = render(&model_of(pets()), GenerationLanguage::CSharp);
        let wrapper = &output.files["Models/PetOrString.cs"];
        assert!(wrapper.contains("var result = new PetOrString();"));
        assert!(wrapper.contains("if(parseNode.GetStringValue() is string stringValue)"));
        assert!(wrapper.contains("else\n"));
        assert!(wrapper.contains("result.Pet = new Pet();"));
        assert!(wrapper.contains("return Pet.GetFieldDeserializers();"));
    }
}
