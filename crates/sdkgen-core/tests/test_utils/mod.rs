//! Test utilities for sdkgen-core integration tests

// Internal imports (std, crate)
use std::path::PathBuf;

// External imports (alphabetized)
use anyhow::{bail, Context};
use sdkgen_core::ir::{Class, CodeModel, TypeDefinition};
use sdkgen_core::resolution::build_code_model;
use sdkgen_core::{
    render_document, ApiDocument, CancellationFlag, Diagnostics, GenerationConfig,
    GenerationLanguage, RenderedOutput,
};
use tempfile::TempDir;

/// Creates a temporary directory for test outputs
#[allow(dead_code)]
pub fn create_temp_dir() -> anyhow::Result<(TempDir, PathBuf)> {
    let temp_dir = tempfile::tempdir()?;
    let temp_path = temp_dir.path().to_path_buf();
    Ok((temp_dir, temp_path))
}

/// Path of a file under `tests/fixtures`
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// The store description shared by the generation tests
pub async fn store_document() -> anyhow::Result<ApiDocument> {
    let path = fixture_path("store.yaml");
    ApiDocument::from_file(&path)
        .await
        .with_context(|| format!("Failed to load {}", path.display()))
}

/// Default configuration generating every language
pub fn all_languages_config() -> GenerationConfig {
    GenerationConfig {
        languages: GenerationLanguage::all().collect(),
        ..GenerationConfig::default()
    }
}

/// Build the verified code model of a description
pub fn build_model(document: &ApiDocument) -> anyhow::Result<(CodeModel, Diagnostics)> {
    let mut diagnostics = Diagnostics::new();
    let model = build_code_model(document, &GenerationConfig::default(), &mut diagnostics)?;
    Ok((model, diagnostics))
}

/// Render every language of `config` without writing anything
pub async fn render_all(
    document: &ApiDocument,
    config: &GenerationConfig,
) -> anyhow::Result<Vec<RenderedOutput>> {
    let mut diagnostics = Diagnostics::new();
    Ok(render_document(document, config, &CancellationFlag::new(), &mut diagnostics).await?)
}

/// Look up a class by namespace and name
pub fn class_named<'m>(model: &'m CodeModel, namespace: &str, name: &str) -> anyhow::Result<&'m Class> {
    let ns = model
        .find_namespace(namespace)
        .with_context(|| format!("namespace {} not found", namespace))?;
    match model.find_type(ns, name) {
        Some(TypeDefinition::Class(id)) => Ok(model.class(id)),
        other => bail!("{}.{} is not a class: {:?}", namespace, name, other),
    }
}

/// Rendered text of one file
pub fn file<'o>(output: &'o RenderedOutput, path: &str) -> anyhow::Result<&'o str> {
    output
        .files
        .get(path)
        .map(String::as_str)
        .with_context(|| format!("{} did not render {}", output.language, path))
}
