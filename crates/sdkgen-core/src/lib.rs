//! sdkgen Core Library
//!
//! This library compiles OpenAPI descriptions into a language-neutral code
//! model of a client SDK and renders that model as C#, Java, TypeScript and
//! Python sources.

pub mod config;
pub mod conventions;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod generate;
pub mod ir;
pub mod language;
pub mod naming;
pub mod output;
pub mod registry;
pub mod rendering;
pub mod resolution;
pub mod validation;

pub use crate::{
    config::GenerationConfig,
    diagnostics::{Diagnostic, Diagnostics, DiagnosticsCollector, Severity},
    document::ApiDocument,
    error::{Error, Result},
    generate::{generate, generate_document, render_document, GenerationReport},
    language::GenerationLanguage,
    rendering::{CancellationFlag, RenderedOutput},
    validation::{RuleSet, ValidationRule},
};
