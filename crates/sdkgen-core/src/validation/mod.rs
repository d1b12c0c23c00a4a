//! Advisory checks over a raw API description.
//!
//! Every rule is an independent predicate over the [`ApiDocument`]; findings
//! are warnings and never stop a generation run.
//!
//! # Examples
//!
//! ```
//! use sdkgen_core::document::ApiDocument;
//! use sdkgen_core::validation::{validate, RuleSet, ValidationRule};
//!
//! let document = ApiDocument::parse_content("openapi: 3.0.1\ninfo:\n  title: t\n  version: '1'\npaths: {}\n").unwrap();
//! let diagnostics = validate(&document, &RuleSet::default());
//! assert_eq!(diagnostics[0].code, ValidationRule::NoServerEntry.as_str());
//! ```

mod rules;

// Internal imports (std, crate)
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::diagnostics::Diagnostic;
use crate::document::ApiDocument;
use crate::error::{Error, Result};

// External imports (alphabetized)
use serde::{Deserialize, Serialize};

/// Name accepted by [`RuleSet::from_names`] for every rule at once
pub const ALL_RULES: &str = "all";

/// Closed set of validation rules
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ValidationRule {
    NoServerEntry,
    MultipleServerEntries,
    GetWithBody,
    NoContentWithBody,
    DivergentResponseSchema,
    MissingDiscriminator,
    InconsistentTypeFormatPair,
    KnownAndNotSupportedFormats,
    UrlFormEncodedComplex,
    UnsupportedInheritance,
    ConflictingAllOfDefaults,
}

impl ValidationRule {
    /// Rule name, also used as the diagnostic code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoServerEntry => "NoServerEntry",
            Self::MultipleServerEntries => "MultipleServerEntries",
            Self::GetWithBody => "GetWithBody",
            Self::NoContentWithBody => "NoContentWithBody",
            Self::DivergentResponseSchema => "DivergentResponseSchema",
            Self::MissingDiscriminator => "MissingDiscriminator",
            Self::InconsistentTypeFormatPair => "InconsistentTypeFormatPair",
            Self::KnownAndNotSupportedFormats => "KnownAndNotSupportedFormats",
            Self::UrlFormEncodedComplex => "UrlFormEncodedComplex",
            Self::UnsupportedInheritance => "UnsupportedInheritance",
            Self::ConflictingAllOfDefaults => "ConflictingAllOfDefaults",
        }
    }

    /// Returns an iterator over all rules, in evaluation order
    pub fn all() -> impl Iterator<Item = Self> {
        use ValidationRule::*;
        [
            NoServerEntry,
            MultipleServerEntries,
            GetWithBody,
            NoContentWithBody,
            DivergentResponseSchema,
            MissingDiscriminator,
            InconsistentTypeFormatPair,
            KnownAndNotSupportedFormats,
            UrlFormEncodedComplex,
            UnsupportedInheritance,
            ConflictingAllOfDefaults,
        ]
        .iter()
        .copied()
    }

    fn check(&self, document: &ApiDocument, diagnostics: &mut Vec<Diagnostic>) {
        let mut report = |pointer: String, message: String| {
            diagnostics.push(Diagnostic::warning(self.as_str(), message).with_pointer(pointer));
        };
        match self {
            Self::NoServerEntry => rules::no_server_entry(document, &mut report),
            Self::MultipleServerEntries => rules::multiple_server_entries(document, &mut report),
            Self::GetWithBody => rules::get_with_body(document, &mut report),
            Self::NoContentWithBody => rules::no_content_with_body(document, &mut report),
            Self::DivergentResponseSchema => {
                rules::divergent_response_schema(document, &mut report)
            }
            Self::MissingDiscriminator => rules::missing_discriminator(document, &mut report),
            Self::InconsistentTypeFormatPair => {
                rules::inconsistent_type_format_pair(document, &mut report)
            }
            Self::KnownAndNotSupportedFormats => {
                rules::known_and_not_supported_formats(document, &mut report)
            }
            Self::UrlFormEncodedComplex => rules::url_form_encoded_complex(document, &mut report),
            Self::UnsupportedInheritance => rules::unsupported_inheritance(document, &mut report),
            Self::ConflictingAllOfDefaults => {
                rules::conflicting_all_of_defaults(document, &mut report)
            }
        }
    }
}

impl FromStr for ValidationRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .find(|rule| rule.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::config(format!("Unknown validation rule: {}", s)))
    }
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rules enabled for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    enabled: BTreeSet<ValidationRule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            enabled: ValidationRule::all().collect(),
        }
    }
}

impl RuleSet {
    /// No rule enabled
    pub fn none() -> Self {
        Self {
            enabled: BTreeSet::new(),
        }
    }

    /// Rules named in `names`; `all` stands for every rule
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let mut set = Self::none();
        for name in names {
            let name = name.as_ref();
            if name.trim().eq_ignore_ascii_case(ALL_RULES) {
                set.enabled.extend(ValidationRule::all());
            } else {
                set.enabled.insert(name.parse()?);
            }
        }
        Ok(set)
    }

    /// Every rule except the ones named in `disabled`
    pub fn without<S: AsRef<str>>(disabled: &[S]) -> Result<Self> {
        let disabled = Self::from_names(disabled)?;
        Ok(Self {
            enabled: Self::default()
                .enabled
                .difference(&disabled.enabled)
                .copied()
                .collect(),
        })
    }

    pub fn is_enabled(&self, rule: ValidationRule) -> bool {
        self.enabled.contains(&rule)
    }

    pub fn iter(&self) -> impl Iterator<Item = ValidationRule> + '_ {
        self.enabled.iter().copied()
    }
}

/// Run the enabled rules, warnings come out in rule order
pub fn validate(document: &ApiDocument, rules: &RuleSet) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for rule in ValidationRule::all().filter(|r| rules.is_enabled(*r)) {
        let before = diagnostics.len();
        rule.check(document, &mut diagnostics);
        log::trace!("rule {} raised {} warnings", rule, diagnostics.len() - before);
    }
    log::debug!("validation raised {} warnings", diagnostics.len());
    diagnostics
}
