//! sdkgen CLI entrypoint
//! Parses command-line arguments and dispatches to the core generator.

mod watch;

// Internal imports (std, crate)
use std::path::PathBuf;

// External imports (alphabetized)
use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use sdkgen_core::document::ApiDocument;
use sdkgen_core::resolution::url_tree::{PathFilter, UrlTree};
use sdkgen_core::{
    generate, validation, CancellationFlag, Diagnostic, Diagnostics, GenerationConfig,
    GenerationLanguage, GenerationReport, RuleSet, Severity,
};
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser)]
#[command(name = "sdkgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is not set (e.g. info, debug, sdkgen_core=trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate client SDK models from an OpenAPI description
    Generate(GenerateArgs),
    /// Print the URL tree of a description after filtering
    Show {
        /// Path or URL to the OpenAPI description (YAML or JSON)
        #[arg(short = 'd', long = "openapi")]
        openapi: String,
        /// Glob patterns of paths to include, optionally suffixed with #METHOD
        #[arg(short = 'i', long = "include-path")]
        include_patterns: Vec<String>,
        /// Glob patterns of paths to exclude, optionally suffixed with #METHOD
        #[arg(short = 'e', long = "exclude-path")]
        exclude_patterns: Vec<String>,
    },
    /// Run the validation rules and print their warnings
    Validate {
        /// Path or URL to the OpenAPI description (YAML or JSON)
        #[arg(short = 'd', long = "openapi")]
        openapi: String,
        /// Rules to skip, or `all`
        #[arg(long = "disable-validation-rules", value_delimiter = ',')]
        disabled_rules: Vec<String>,
        /// Print the warnings as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Default)]
struct GenerateArgs {
    /// Configuration file (YAML or TOML); discovered in the working directory when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Path or URL to the OpenAPI description (YAML or JSON)
    #[arg(short = 'd', long = "openapi")]
    openapi: Option<String>,
    /// Output directory for generated code
    #[arg(short = 'o', long = "output")]
    output: Option<String>,
    /// Target languages, repeat or separate with commas
    #[arg(short = 'l', long = "language", value_enum, value_delimiter = ',')]
    languages: Vec<GenerationLanguage>,
    /// Name of the generated client class
    #[arg(short = 'c', long = "class-name")]
    class_name: Option<String>,
    /// Namespace of the generated client
    #[arg(short = 'n', long = "namespace-name")]
    namespace_name: Option<String>,
    /// Glob patterns of paths to include, optionally suffixed with #METHOD
    #[arg(short = 'i', long = "include-path")]
    include_patterns: Vec<String>,
    /// Glob patterns of paths to exclude, optionally suffixed with #METHOD
    #[arg(short = 'e', long = "exclude-path")]
    exclude_patterns: Vec<String>,
    /// Validation rules to skip, or `all`
    #[arg(long = "disable-validation-rules", value_delimiter = ',')]
    disabled_rules: Vec<String>,
    /// Structured mime types, in order of preference
    #[arg(short = 'm', long = "structured-mime-types", value_delimiter = ',')]
    structured_mime_types: Vec<String>,
    /// Whether models keep undeclared properties
    #[arg(long = "additional-data")]
    additional_data: Option<bool>,
    /// Generate models with a backing store
    #[arg(short = 'b', long = "backing-store")]
    backing_store: bool,
    /// Remove the output directory before writing
    #[arg(long = "clean-output")]
    clean_output: bool,
    /// Base URL overriding the description's servers
    #[arg(long = "base-url")]
    base_url: Option<Url>,
    /// Regenerate whenever the description file changes
    #[arg(long)]
    watch: bool,
}

impl GenerateArgs {
    /// Configuration file (explicit or discovered) amended by the flags
    async fn resolve_config(&self) -> anyhow::Result<GenerationConfig> {
        let path = match &self.config {
            Some(path) => Some(path.clone()),
            None => GenerationConfig::discover(".")
                .await
                .context("Failed to look for a configuration file")?,
        };
        let mut config = match path {
            Some(path) => {
                tracing::info!("Using configuration {}", path.display());
                GenerationConfig::from_file(&path)
                    .await
                    .with_context(|| format!("Failed to load configuration {}", path.display()))?
            }
            None => GenerationConfig::default(),
        };

        if let Some(openapi) = &self.openapi {
            config.openapi_path = openapi.clone();
        }
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        if !self.languages.is_empty() {
            config.languages = self.languages.clone();
        }
        if let Some(class_name) = &self.class_name {
            config.client_class_name = class_name.clone();
        }
        if let Some(namespace_name) = &self.namespace_name {
            config.client_namespace_name = namespace_name.clone();
        }
        config.include_patterns.extend(self.include_patterns.iter().cloned());
        config.exclude_patterns.extend(self.exclude_patterns.iter().cloned());
        config
            .disabled_validation_rules
            .extend(self.disabled_rules.iter().cloned());
        if !self.structured_mime_types.is_empty() {
            config.structured_mime_types = self.structured_mime_types.clone();
        }
        if let Some(additional_data) = self.additional_data {
            config.include_additional_data = additional_data;
        }
        config.uses_backing_store |= self.backing_store;
        config.clean_output |= self.clean_output;
        if let Some(base_url) = &self.base_url {
            config.base_url = Some(base_url.clone());
        }

        if config.openapi_path.is_empty() {
            bail!("No OpenAPI description given, pass --openapi or set openapi_path in the configuration");
        }
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .with_context(|| format!("Invalid log level '{}'", cli.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Generate(args) => {
            let config = args.resolve_config().await?;
            if args.watch {
                watch::run(&config).await
            } else {
                let report = run_generation(&config).await?;
                if report.diagnostics.has_errors() {
                    bail!("Generation skipped parts of the description, see the errors above");
                }
                Ok(())
            }
        }
        Commands::Show {
            openapi,
            include_patterns,
            exclude_patterns,
        } => {
            let document = load_document(&openapi).await?;
            let filter = PathFilter::new(&include_patterns, &exclude_patterns)
                .context("Invalid path pattern")?;
            let mut diagnostics = Diagnostics::new();
            let tree = UrlTree::build(&document, &filter, &mut diagnostics);
            report_diagnostics(diagnostics.iter());
            print!("{}", tree.render_tree());
            Ok(())
        }
        Commands::Validate {
            openapi,
            disabled_rules,
            json,
        } => {
            let document = load_document(&openapi).await?;
            let rules = RuleSet::without(&disabled_rules).context("Invalid rule name")?;
            let warnings = validation::validate(&document, &rules);
            if json {
                println!("{}", serde_json::to_string_pretty(&warnings)?);
            } else {
                for warning in &warnings {
                    println!("{}", warning);
                }
                tracing::info!("{} warnings", warnings.len());
            }
            Ok(())
        }
    }
}

/// One generation pass with its diagnostics logged
pub(crate) async fn run_generation(config: &GenerationConfig) -> anyhow::Result<GenerationReport> {
    tracing::info!("Generating from {}", config.openapi_path);
    let report = generate(config, &CancellationFlag::new())
        .await
        .with_context(|| format!("Failed to generate from {}", config.openapi_path))?;
    report_diagnostics(report.diagnostics.iter());
    for output in &report.outputs {
        tracing::info!(
            "{}: {} files written, {} unchanged in {}",
            output.language,
            output.summary.written.len(),
            output.summary.unchanged.len(),
            output.directory.display()
        );
    }
    Ok(report)
}

async fn load_document(location: &str) -> anyhow::Result<ApiDocument> {
    ApiDocument::from_file_or_url(location)
        .await
        .with_context(|| format!("Failed to load OpenAPI description {}", location))
}

fn report_diagnostics<'a>(diagnostics: impl Iterator<Item = &'a Diagnostic>) {
    for diagnostic in diagnostics {
        match diagnostic.severity {
            Severity::Warning => tracing::warn!("{}", diagnostic),
            Severity::Error => tracing::error!("{}", diagnostic),
        }
    }
}
