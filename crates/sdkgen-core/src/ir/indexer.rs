use super::{Documentation, TypeRef};

/// Access to an item request builder through one path variable
#[derive(Debug, Clone, PartialEq)]
pub struct Indexer {
    /// `By{Variable}`
    pub name: String,
    /// Path variable name, sanitized for the URL template
    pub serialization_name: String,
    pub index_parameter_name: String,
    pub index_type: TypeRef,
    pub return_type: TypeRef,
    pub documentation: Documentation,
}
