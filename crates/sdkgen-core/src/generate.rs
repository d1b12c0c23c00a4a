//! Generation entry points.
//!
//! A run loads the description, reports validation warnings, builds the code
//! model once and renders every requested language on the blocking pool
//! before the files are written.

// Internal imports (std, crate)
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::GenerationConfig;
use crate::diagnostics::Diagnostics;
use crate::document::ApiDocument;
use crate::language::GenerationLanguage;
use crate::output::{write_output, WriteSummary};
use crate::rendering::{render_language, CancellationFlag, RenderOptions, RenderedOutput};
use crate::resolution::build_code_model;
use crate::validation::{validate, RuleSet};
use crate::{Error, Result};

// External imports (alphabetized)
use futures::future::try_join_all;

/// Files written for one language
#[derive(Debug, Clone)]
pub struct LanguageOutput {
    pub language: GenerationLanguage,
    pub directory: PathBuf,
    pub summary: WriteSummary,
}

/// Outcome of a successful generation run
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub diagnostics: Diagnostics,
    pub outputs: Vec<LanguageOutput>,
}

/// Load the configured description, generate every language and write the files
pub async fn generate(
    config: &GenerationConfig,
    cancellation: &CancellationFlag,
) -> Result<GenerationReport> {
    config.validate()?;
    let document = ApiDocument::from_file_or_url(&config.openapi_path).await?;
    generate_document(&document, config, cancellation).await
}

/// Generate from an already loaded description
pub async fn generate_document(
    document: &ApiDocument,
    config: &GenerationConfig,
    cancellation: &CancellationFlag,
) -> Result<GenerationReport> {
    let mut report = GenerationReport::default();
    let rendered = render_document(document, config, cancellation, &mut report.diagnostics).await?;
    cancellation.check()?;

    let writes = rendered.iter().map(|output| async move {
        let directory = config.language_output_path(output.language);
        let summary = write_output(&directory, output, config.clean_output).await?;
        Ok::<_, Error>(LanguageOutput {
            language: output.language,
            directory,
            summary,
        })
    });
    report.outputs = try_join_all(writes).await?;
    Ok(report)
}

/// Render every configured language without touching the file system
pub async fn render_document(
    document: &ApiDocument,
    config: &GenerationConfig,
    cancellation: &CancellationFlag,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<RenderedOutput>> {
    let rules = RuleSet::without(&config.disabled_validation_rules)?;
    diagnostics.extend(validate(document, &rules));
    cancellation.check()?;

    let model = Arc::new(build_code_model(document, config, diagnostics)?);
    log::debug!(
        "code model built with {} classes and {} enums",
        model.classes().count(),
        model.enums().count()
    );
    let options = RenderOptions::from_config(config);

    let mut languages: Vec<GenerationLanguage> = Vec::new();
    for language in &config.languages {
        if !languages.contains(language) {
            languages.push(*language);
        }
    }
    let tasks = languages.into_iter().map(|language| {
        let model = Arc::clone(&model);
        let options = options.clone();
        let cancellation = cancellation.clone();
        tokio::task::spawn_blocking(move || {
            render_language(&model, language, &options, &cancellation)
        })
    });
    let results = try_join_all(tasks)
        .await
        .map_err(|e| Error::Task(e.to_string()))?;
    results.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PETS: &str = r##"{
        "openapi": "3.0.1",
        "info": {"title": "Pets", "version": "1.0"},
        "servers": [{"url": "https://pets.example.com"}],
        "paths": {
            "/pets": {
                "get": {
                    "requestBody": {"content": {"application/json": {"schema": {"type": "string"}}}},
                    "responses": {"200": {"description": "ok", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}}}}
                }
            }
        },
        "components": {"schemas": {"Pet": {"type": "object", "properties": {"name": {"type": "string"}}}}}
    }"##;

    #[tokio::test]
    async fn test_render_document_collects_warnings() -> crate::Result<()> {
        let document = ApiDocument::parse_content(PETS)?;
        let mut config = GenerationConfig::default();
        config.languages = vec![GenerationLanguage::CSharp, GenerationLanguage::Python];
        let mut diagnostics = Diagnostics::new();

        let outputs =
            render_document(&document, &config, &CancellationFlag::new(), &mut diagnostics).await?;

        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].language, GenerationLanguage::CSharp);
        assert!(diagnostics.contains_code("GetWithBody"));
        Ok(())
    }

    #[tokio::test]
    async fn test_disabled_rules_are_skipped() -> crate::Result<()> {
        let document = ApiDocument::parse_content(PETS)?;
        let mut config = GenerationConfig::default();
        config.disabled_validation_rules = vec!["GetWithBody".to_string()];
        let mut diagnostics = Diagnostics::new();

        render_document(&document, &config, &CancellationFlag::new(), &mut diagnostics).await?;

        assert!(!diagnostics.contains_code("GetWithBody"));
        Ok(())
    }

    #[tokio::test]
    async fn test_cancelled_run_stops() -> crate::Result<()> {
        let document = ApiDocument::parse_content(PETS)?;
        let config = GenerationConfig::default();
        let cancellation = CancellationFlag::new();
        cancellation.cancel();

        let result =
            render_document(&document, &config, &cancellation, &mut Diagnostics::new()).await;

        assert!(matches!(result, Err(Error::Cancelled)));
        Ok(())
    }

    #[tokio::test]
    async fn test_generate_writes_language_directories() -> crate::Result<()> {
        let dir = tempdir()?;
        let spec_path = dir.path().join("openapi.json");
        tokio::fs::write(&spec_path, PETS).await?;
        let output = dir.path().join("out");
        let mut config = GenerationConfig::new(
            spec_path.to_string_lossy(),
            output.to_string_lossy(),
        );
        config.languages = vec![GenerationLanguage::Java, GenerationLanguage::TypeScript];

        let report = generate(&config, &CancellationFlag::new()).await?;

        assert_eq!(report.outputs.len(), 2);
        assert!(output.join("java").join("ApiClient.java").exists());
        assert!(output.join("typescript").join("apiClient.ts").exists());

        let again = generate(&config, &CancellationFlag::new()).await?;
        assert!(again.outputs.iter().all(|o| o.summary.written.is_empty()));
        Ok(())
    }
}
