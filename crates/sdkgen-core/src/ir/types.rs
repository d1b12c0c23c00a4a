//! Type references and the built-in type tables.

// Internal imports (std, crate)
use std::fmt;
use std::str::FromStr;

use super::{ClassId, EnumId};

/// How many collection levels wrap a referenced type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CollectionKind {
    #[default]
    None,
    /// One level of collection
    Array,
    /// A collection of collections
    ComposedOfMultiple,
}

/// The node a resolved type reference points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeDefinition {
    Class(ClassId),
    Enum(EnumId),
}

impl TypeDefinition {
    pub fn as_class(&self) -> Option<ClassId> {
        match self {
            Self::Class(id) => Some(*id),
            Self::Enum(_) => None,
        }
    }

    pub fn as_enum(&self) -> Option<EnumId> {
        match self {
            Self::Enum(id) => Some(*id),
            Self::Class(_) => None,
        }
    }
}

/// A reference from one node of the code model to a type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub name: String,
    pub collection: CollectionKind,
    pub nullable: bool,
    /// Primitives and runtime abstractions live outside the generated code
    pub external: bool,
    pub definition: Option<TypeDefinition>,
}

impl TypeRef {
    pub fn primitive(primitive: Primitive) -> Self {
        Self::external_named(primitive.as_str())
    }

    pub fn abstraction(abstraction: Abstraction) -> Self {
        Self::external_named(abstraction.as_str())
    }

    fn external_named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            collection: CollectionKind::None,
            nullable: false,
            external: true,
            definition: None,
        }
    }

    /// Reference to a generated class
    pub fn class(name: impl Into<String>, id: ClassId) -> Self {
        Self::internal(name, Some(TypeDefinition::Class(id)))
    }

    /// Reference to a generated enum
    pub fn enumeration(name: impl Into<String>, id: EnumId) -> Self {
        Self::internal(name, Some(TypeDefinition::Enum(id)))
    }

    /// Reference to a generated type, resolved or not
    pub fn internal(name: impl Into<String>, definition: Option<TypeDefinition>) -> Self {
        Self {
            name: name.into(),
            collection: CollectionKind::None,
            nullable: false,
            external: false,
            definition,
        }
    }

    pub fn with_collection(mut self, collection: CollectionKind) -> Self {
        self.collection = collection;
        self
    }

    /// Wrap the reference in one more collection level
    pub fn into_collection(mut self) -> Self {
        self.collection = match self.collection {
            CollectionKind::None => CollectionKind::Array,
            _ => CollectionKind::ComposedOfMultiple,
        };
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// The same reference without its collection wrapper
    pub fn element(&self) -> Self {
        Self {
            collection: CollectionKind::None,
            ..self.clone()
        }
    }

    pub fn is_collection(&self) -> bool {
        self.collection != CollectionKind::None
    }

    pub fn as_primitive(&self) -> Option<Primitive> {
        if self.external {
            self.name.parse().ok()
        } else {
            None
        }
    }

    pub fn as_abstraction(&self) -> Option<Abstraction> {
        if self.external {
            self.name.parse().ok()
        } else {
            None
        }
    }

    pub fn is_void(&self) -> bool {
        self.as_primitive() == Some(Primitive::Void)
    }

    pub fn class_id(&self) -> Option<ClassId> {
        self.definition.and_then(|d| d.as_class())
    }

    pub fn enum_id(&self) -> Option<EnumId> {
        self.definition.and_then(|d| d.as_enum())
    }
}

/// Scalar types every target language spells natively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Primitive {
    String,
    Boolean,
    Integer,
    Int64,
    Float,
    Double,
    Decimal,
    Byte,
    Sbyte,
    Guid,
    DateTimeOffset,
    DateOnly,
    TimeOnly,
    Duration,
    Binary,
    Base64,
    Base64Url,
    Void,
    Untyped,
}

impl Primitive {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Int64 => "int64",
            Self::Float => "float",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::Byte => "byte",
            Self::Sbyte => "sbyte",
            Self::Guid => "guid",
            Self::DateTimeOffset => "dateTimeOffset",
            Self::DateOnly => "dateOnly",
            Self::TimeOnly => "timeOnly",
            Self::Duration => "duration",
            Self::Binary => "binary",
            Self::Base64 => "base64",
            Self::Base64Url => "base64url",
            Self::Void => "void",
            Self::Untyped => "untyped",
        }
    }

    pub fn all() -> impl Iterator<Item = Self> {
        use Primitive::*;
        [
            String,
            Boolean,
            Integer,
            Int64,
            Float,
            Double,
            Decimal,
            Byte,
            Sbyte,
            Guid,
            DateTimeOffset,
            DateOnly,
            TimeOnly,
            Duration,
            Binary,
            Base64,
            Base64Url,
            Void,
            Untyped,
        ]
        .iter()
        .copied()
    }

    /// Map a schema `type`/`format` pair onto a primitive
    pub fn from_type_and_format(schema_type: Option<&str>, format: Option<&str>) -> Self {
        let format = format.map(str::to_ascii_lowercase);
        match (schema_type, format.as_deref()) {
            (Some("string"), Some("base64url")) => Self::Base64Url,
            (Some("string"), Some("binary")) => Self::Binary,
            (Some("string"), Some("byte")) => Self::Base64,
            (Some("string"), Some("duration")) => Self::Duration,
            (Some("string"), Some("time")) => Self::TimeOnly,
            (Some("string"), Some("date")) => Self::DateOnly,
            (Some("string"), Some("date-time")) => Self::DateTimeOffset,
            (Some("string"), Some("uuid")) => Self::Guid,
            (Some("string"), _) => Self::String,
            (Some("number"), Some("double")) => Self::Double,
            (Some("number"), Some("float")) => Self::Float,
            (Some("number"), Some("decimal")) => Self::Decimal,
            (Some("number") | Some("integer"), Some("int8")) => Self::Sbyte,
            (Some("number") | Some("integer"), Some("uint8")) => Self::Byte,
            (Some("number") | Some("integer"), Some("int64")) => Self::Int64,
            (Some("number"), Some("int32")) => Self::Integer,
            (Some("number"), _) => Self::Double,
            (Some("integer"), _) => Self::Integer,
            (Some("boolean"), _) => Self::Boolean,
            _ => Self::Untyped,
        }
    }

    /// Whether values travel as JSON strings
    pub fn is_string_like(&self) -> bool {
        matches!(
            self,
            Self::String
                | Self::Guid
                | Self::DateTimeOffset
                | Self::DateOnly
                | Self::TimeOnly
                | Self::Duration
                | Self::Binary
                | Self::Base64
                | Self::Base64Url
        )
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, Self::Integer | Self::Int64 | Self::Byte | Self::Sbyte)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integral() || matches!(self, Self::Float | Self::Double | Self::Decimal)
    }
}

impl FromStr for Primitive {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("Unknown primitive: {}", s))
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Types provided by the runtime abstractions library of each language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Abstraction {
    RequestAdapter,
    RequestInformation,
    ParseNode,
    SerializationWriter,
    PathParameters,
    AdditionalData,
    BackingStore,
    CancellationToken,
    RequestOption,
    RequestHeaders,
    AdditionalDataHolder,
    Parsable,
    BackedModel,
    ApiException,
    ComposedTypeWrapper,
}

impl Abstraction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequestAdapter => "RequestAdapter",
            Self::RequestInformation => "RequestInformation",
            Self::ParseNode => "ParseNode",
            Self::SerializationWriter => "SerializationWriter",
            Self::PathParameters => "PathParameters",
            Self::AdditionalData => "AdditionalData",
            Self::BackingStore => "BackingStore",
            Self::CancellationToken => "CancellationToken",
            Self::RequestOption => "RequestOption",
            Self::RequestHeaders => "RequestHeaders",
            Self::AdditionalDataHolder => "AdditionalDataHolder",
            Self::Parsable => "Parsable",
            Self::BackedModel => "BackedModel",
            Self::ApiException => "ApiException",
            Self::ComposedTypeWrapper => "ComposedTypeWrapper",
        }
    }

    pub fn all() -> impl Iterator<Item = Self> {
        use Abstraction::*;
        [
            RequestAdapter,
            RequestInformation,
            ParseNode,
            SerializationWriter,
            PathParameters,
            AdditionalData,
            BackingStore,
            CancellationToken,
            RequestOption,
            RequestHeaders,
            AdditionalDataHolder,
            Parsable,
            BackedModel,
            ApiException,
            ComposedTypeWrapper,
        ]
        .iter()
        .copied()
    }
}

impl FromStr for Abstraction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("Unknown abstraction: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_mapping_table() {
        use Primitive::*;
        let cases = [
            (Some("string"), Some("base64url"), Base64Url),
            (Some("string"), Some("binary"), Binary),
            (Some("string"), Some("byte"), Base64),
            (Some("string"), Some("duration"), Duration),
            (Some("string"), Some("time"), TimeOnly),
            (Some("string"), Some("date"), DateOnly),
            (Some("string"), Some("date-time"), DateTimeOffset),
            (Some("string"), Some("uuid"), Guid),
            (Some("string"), Some("email"), String),
            (Some("number"), Some("float"), Float),
            (Some("number"), Some("decimal"), Decimal),
            (Some("integer"), Some("int8"), Sbyte),
            (Some("number"), Some("uint8"), Byte),
            (Some("integer"), Some("int64"), Int64),
            (Some("number"), Some("int32"), Integer),
            (Some("number"), None, Double),
            (Some("integer"), None, Integer),
            (Some("boolean"), None, Boolean),
            (None, None, Untyped),
        ];
        for (schema_type, format, expected) in cases {
            assert_eq!(
                Primitive::from_type_and_format(schema_type, format),
                expected,
                "{:?}/{:?}",
                schema_type,
                format
            );
        }
    }

    #[test]
    fn test_collection_nesting() {
        let single = TypeRef::primitive(Primitive::String).into_collection();
        assert_eq!(single.collection, CollectionKind::Array);
        let nested = single.into_collection();
        assert_eq!(nested.collection, CollectionKind::ComposedOfMultiple);
        assert!(!nested.element().is_collection());
    }

    #[test]
    fn test_external_lookups() {
        let adapter = TypeRef::abstraction(Abstraction::RequestAdapter);
        assert_eq!(adapter.as_abstraction(), Some(Abstraction::RequestAdapter));
        assert_eq!(adapter.as_primitive(), None);
        assert!(TypeRef::primitive(Primitive::Void).is_void());
        assert_eq!("dateOnly".parse::<Primitive>().unwrap(), Primitive::DateOnly);
    }
}
