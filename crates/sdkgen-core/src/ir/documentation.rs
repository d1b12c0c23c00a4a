//! Documentation and deprecation metadata attached to code model nodes.

// Internal imports (std, crate)
use std::collections::BTreeMap;

use super::TypeRef;
use crate::naming::clean_description;
use crate::Result;

// External imports (alphabetized)
use serde_json::Value as JsonValue;
use tera::{Context, Tera};

/// Description of a node.
///
/// `template` holds generated prose that mentions other types; each
/// `{{ Placeholder }}` in it is bound to the spelling of the matching entry
/// of `type_references` in the language being rendered. `description` is
/// text taken verbatim from the API description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Documentation {
    pub description: Option<String>,
    pub template: Option<String>,
    pub type_references: BTreeMap<String, TypeRef>,
    pub external_link: Option<String>,
}

impl Documentation {
    pub fn new(description: Option<&str>) -> Self {
        Self {
            description: description
                .map(clean_description)
                .filter(|d| !d.is_empty()),
            ..Self::default()
        }
    }

    pub fn with_template(
        mut self,
        template: impl Into<String>,
        references: impl IntoIterator<Item = (&'static str, TypeRef)>,
    ) -> Self {
        self.template = Some(template.into());
        self.type_references = references
            .into_iter()
            .map(|(key, type_ref)| (key.to_string(), type_ref))
            .collect();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.template.is_none() && self.external_link.is_none()
    }

    /// Render the description for one language
    pub fn render(&self, spell: impl Fn(&TypeRef) -> String) -> Result<Option<String>> {
        let mut parts = Vec::new();
        if let Some(description) = &self.description {
            parts.push(description.clone());
        }
        if let Some(template) = &self.template {
            if self.type_references.is_empty() {
                parts.push(template.clone());
            } else {
                let mut context = Context::new();
                for (key, type_ref) in &self.type_references {
                    context.insert(key.as_str(), &spell(type_ref));
                }
                parts.push(Tera::one_off(template, &context, false)?);
            }
        }
        if parts.is_empty() {
            return Ok(None);
        }
        Ok(Some(parts.join(" ")))
    }
}

/// Deprecation information for a node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deprecation {
    pub description: Option<String>,
    pub date: Option<String>,
    pub removal_date: Option<String>,
    pub version: Option<String>,
}

impl Deprecation {
    /// Build from the `deprecated` flag and the `x-ms-deprecation` extension
    pub fn from_schema(deprecated: bool, extension: Option<&JsonValue>) -> Option<Self> {
        let field = |name: &str| {
            extension
                .and_then(|e| e.get(name))
                .and_then(JsonValue::as_str)
                .map(str::to_string)
        };
        if !deprecated && extension.is_none() {
            return None;
        }
        Some(Self {
            description: field("description"),
            date: field("date"),
            removal_date: field("removalDate"),
            version: field("version"),
        })
    }

    /// One-line message suitable for a deprecation attribute
    pub fn message(&self, element: &str) -> String {
        let mut message = match &self.description {
            Some(description) => clean_description(description),
            None => format!("{} is deprecated", element),
        };
        if let Some(date) = &self.date {
            message.push_str(&format!(" as of {}", date));
        }
        if let Some(version) = &self.version {
            message.push_str(&format!(" on {}", version));
        }
        if let Some(removal) = &self.removal_date {
            message.push_str(&format!(" and will be removed {}", removal));
        }
        message
    }
}
