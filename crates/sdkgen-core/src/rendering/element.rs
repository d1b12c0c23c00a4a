//! Code elements of a class and their output order.
//!
//! Writers never iterate the code model directly; they walk the sorted
//! element list of each class so every language emits members in the same,
//! total order.

// Internal imports (std, crate)
use std::cmp::Ordering;

use crate::ir::{ClassId, CodeModel, EnumId, EnumOption, Indexer, Method, Property, Using};

/// One piece of a generated type, in the order writers emit them
#[derive(Debug, Clone, Copy)]
pub enum CodeElement<'m> {
    Using(&'m Using),
    ClassDeclaration(ClassId),
    EnumDeclaration(EnumId),
    Property(&'m Property),
    Indexer(&'m Indexer),
    Method(&'m Method),
    EnumOption(&'m EnumOption),
    InnerClass(ClassId),
    BlockEnd,
}

impl<'m> CodeElement<'m> {
    fn rank(&self) -> u8 {
        match self {
            Self::Using(_) => 0,
            Self::ClassDeclaration(_) | Self::EnumDeclaration(_) => 1,
            Self::Property(_) => 2,
            Self::Indexer(_) => 3,
            Self::Method(_) => 4,
            Self::EnumOption(_) => 5,
            Self::InnerClass(_) => 6,
            Self::BlockEnd => 7,
        }
    }
}

/// Case-insensitive comparison, ordinal on ties
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_ascii_lowercase()
        .cmp(&b.to_ascii_lowercase())
        .then_with(|| a.cmp(b))
}

/// Total order over the elements of one type.
///
/// Enum options compare equal to each other so a stable sort keeps their
/// declaration order.
pub fn compare(model: &CodeModel, a: &CodeElement<'_>, b: &CodeElement<'_>) -> Ordering {
    a.rank().cmp(&b.rank()).then_with(|| match (a, b) {
        (CodeElement::Using(x), CodeElement::Using(y)) => x.cmp(y),
        (CodeElement::Property(x), CodeElement::Property(y)) => compare_names(&x.name, &y.name),
        (CodeElement::Indexer(x), CodeElement::Indexer(y)) => compare_names(&x.name, &y.name),
        (CodeElement::Method(x), CodeElement::Method(y)) => x
            .kind
            .constructor_rank()
            .cmp(&y.kind.constructor_rank())
            .then_with(|| compare_names(&x.name, &y.name))
            .then_with(|| x.parameters.len().cmp(&y.parameters.len())),
        (CodeElement::InnerClass(x), CodeElement::InnerClass(y)) => {
            compare_names(&model.class(*x).name, &model.class(*y).name)
        }
        _ => Ordering::Equal,
    })
}

/// Every element of a class, sorted
pub fn class_elements(model: &CodeModel, id: ClassId) -> Vec<CodeElement<'_>> {
    let class = model.class(id);
    let mut elements = vec![CodeElement::ClassDeclaration(id), CodeElement::BlockEnd];
    elements.extend(class.usings().iter().map(CodeElement::Using));
    elements.extend(class.properties().iter().map(CodeElement::Property));
    elements.extend(class.indexers().iter().map(CodeElement::Indexer));
    elements.extend(class.methods().iter().map(CodeElement::Method));
    elements.extend(class.inner_classes().iter().copied().map(CodeElement::InnerClass));
    elements.sort_by(|a, b| compare(model, a, b));
    elements
}

/// Every element of an enum, options in declaration order
pub fn enum_elements(model: &CodeModel, id: EnumId) -> Vec<CodeElement<'_>> {
    let enumeration = model.enumeration(id);
    let mut elements = vec![CodeElement::EnumDeclaration(id)];
    elements.extend(enumeration.options().iter().map(CodeElement::EnumOption));
    elements.push(CodeElement::BlockEnd);
    elements.sort_by(|a, b| compare(model, a, b));
    elements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{
        Class, ClassKind, Enum, EnumOption, Documentation, MethodKind, Parameter, ParameterKind,
        Primitive, PropertyKind, TypeRef,
    };

    fn void() -> TypeRef {
        TypeRef::primitive(Primitive::Void)
    }

    fn label(model: &CodeModel, element: &CodeElement<'_>) -> String {
        match element {
            CodeElement::Using(u) => format!("using {}", u.name),
            CodeElement::ClassDeclaration(_) | CodeElement::EnumDeclaration(_) => "declaration".into(),
            CodeElement::Property(p) => format!("property {}", p.name),
            CodeElement::Indexer(i) => format!("indexer {}", i.name),
            CodeElement::Method(m) => format!("method {}/{}", m.name, m.parameters.len()),
            CodeElement::EnumOption(o) => format!("option {}", o.name),
            CodeElement::InnerClass(id) => format!("inner {}", model.class(*id).name),
            CodeElement::BlockEnd => "end".into(),
        }
    }

    #[test]
    fn test_class_member_order() {
        let mut model = CodeModel::new();
        let ns = model.add_namespace("ApiSdk.users");
        let mut class = Class::new("UsersRequestBuilder", ClassKind::RequestBuilder);
        class.add_property(Property::new("zeta", PropertyKind::Custom, void()));
        class.add_property(Property::new("Alpha", PropertyKind::Custom, void()));
        class.add_property(Property::new("beta", PropertyKind::Custom, void()));
        class.add_method(Method::new("get", MethodKind::RequestExecutor, void()));
        class.add_method(
            Method::new("get", MethodKind::RequestGenerator, void())
                .with_parameter(Parameter::new("body", ParameterKind::RequestBody, void())),
        );
        class.add_method(Method::new("constructor", MethodKind::RawUrlConstructor, void()));
        class.add_method(Method::new("constructor", MethodKind::Constructor, void()));
        class.add_using(Using::external("RequestAdapter"));
        let id = model.add_class(ns, class).unwrap();
        model
            .add_inner_class(id, Class::new("UsersRequestBuilderGetRequestConfiguration", ClassKind::RequestConfiguration))
            .unwrap();

        let labels: Vec<_> = class_elements(&model, id).iter().map(|e| label(&model, e)).collect();
        assert_eq!(
            labels,
            [
                "using RequestAdapter",
                "declaration",
                "property Alpha",
                "property beta",
                "property zeta",
                "method constructor/0",
                "method constructor/0",
                "method get/0",
                "method get/1",
                "inner UsersRequestBuilderGetRequestConfiguration",
                "end",
            ]
        );
        let methods: Vec<_> = class_elements(&model, id)
            .into_iter()
            .filter_map(|e| match e {
                CodeElement::Method(m) => Some(m.kind),
                _ => None,
            })
            .collect();
        assert_eq!(methods[0], MethodKind::Constructor);
        assert_eq!(methods[1], MethodKind::RawUrlConstructor);
    }

    #[test]
    fn test_enum_options_keep_declaration_order() {
        let mut model = CodeModel::new();
        let ns = model.add_namespace("ApiSdk.models");
        let mut enumeration = Enum::new("Status");
        for value in ["retired", "active", "Beta"] {
            enumeration.add_option(EnumOption {
                name: value.to_string(),
                serialization_name: value.to_string(),
                documentation: Documentation::default(),
            });
        }
        let id = model.add_enum(ns, enumeration).unwrap();
        let labels: Vec<_> = enum_elements(&model, id).iter().map(|e| label(&model, e)).collect();
        assert_eq!(
            labels,
            ["declaration", "option retired", "option active", "option Beta", "end"]
        );
    }
}
