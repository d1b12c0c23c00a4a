use super::{ClassId, EnumId, NamespaceId};

/// Dot-segmented container of types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    /// Full dotted name, empty for the root
    pub name: String,
    pub(super) parent: Option<NamespaceId>,
    pub(super) namespaces: Vec<NamespaceId>,
    pub(super) classes: Vec<ClassId>,
    pub(super) enums: Vec<EnumId>,
}

impl Namespace {
    pub(super) fn new(name: String, parent: Option<NamespaceId>) -> Self {
        Self {
            name,
            parent,
            namespaces: Vec::new(),
            classes: Vec::new(),
            enums: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NamespaceId> {
        self.parent
    }

    /// Last segment of the dotted name
    pub fn segment(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or_default()
    }

    pub fn namespaces(&self) -> &[NamespaceId] {
        &self.namespaces
    }

    pub fn classes(&self) -> &[ClassId] {
        &self.classes
    }

    pub fn enums(&self) -> &[EnumId] {
        &self.enums
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.enums.is_empty()
    }
}
