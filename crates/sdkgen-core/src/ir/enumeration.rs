use super::{Deprecation, Documentation, NamespaceId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumOption {
    pub name: String,
    pub serialization_name: String,
    pub documentation: Documentation,
}

/// Enumerated string type
#[derive(Debug, Clone, PartialEq)]
pub struct Enum {
    pub name: String,
    pub flags: bool,
    pub documentation: Documentation,
    pub deprecation: Option<Deprecation>,
    namespace: NamespaceId,
    options: Vec<EnumOption>,
}

impl Enum {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: false,
            documentation: Documentation::default(),
            deprecation: None,
            namespace: NamespaceId::ROOT,
            options: Vec::new(),
        }
    }

    pub fn namespace(&self) -> NamespaceId {
        self.namespace
    }

    pub(super) fn attach(&mut self, namespace: NamespaceId) {
        self.namespace = namespace;
    }

    /// Options in declaration order
    pub fn options(&self) -> &[EnumOption] {
        &self.options
    }

    /// Append an option unless one with the same name (case-insensitive) exists
    pub fn add_option(&mut self, option: EnumOption) -> bool {
        if self
            .options
            .iter()
            .any(|o| o.name.eq_ignore_ascii_case(&option.name))
        {
            return false;
        }
        self.options.push(option);
        true
    }

    /// `base`, or `base` with the first free numeric suffix when an option
    /// already uses that name (case-insensitive)
    pub fn unique_option_name(&self, base: &str) -> String {
        let taken = |name: &str| self.options.iter().any(|o| o.name.eq_ignore_ascii_case(name));
        if !taken(base) {
            return base.to_string();
        }
        (2..)
            .map(|suffix| format!("{}{}", base, suffix))
            .find(|name| !taken(name))
            .unwrap_or_else(|| base.to_string())
    }

    /// Whether an option serializes to exactly `value`
    pub fn has_exact_wire_value(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.serialization_name == value)
    }

    pub fn has_wire_value(&self, value: &str) -> bool {
        self.options
            .iter()
            .any(|o| o.serialization_name.eq_ignore_ascii_case(value))
    }
}
