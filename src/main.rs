//! lessonforge command-line entry point
//!
//! Compiles one lesson from a JSON request read from a file or stdin and prints the
//! JSON report on stdout.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use lessonforge::config::AppConfig;
use lessonforge::core::llm::ProviderRegistry;
use lessonforge::core::pipeline::{CompileFailure, CompileReport, CompileRequest, LessonCompiler};
use lessonforge::core::resolution::EntityResolver;
use lessonforge::core::storage::{SqliteLessonRepository, SurrealGraphStore};
use lessonforge::core::text::{ScriptRunSegmenter, Segmenter};

/// Compile a lesson descriptor into a trilingual lesson document
#[derive(Parser, Debug)]
#[command(name = "lessonforge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Compile request JSON; `-` or omitted reads stdin
    #[arg(value_name = "REQUEST")]
    request: Option<PathBuf>,

    /// Model selector, overriding the request
    #[arg(long)]
    model: Option<String>,

    /// Repair budget per generation, overriding the request
    #[arg(long, value_name = "N")]
    max_repair: Option<u32>,

    /// Compile without persisting the lesson
    #[arg(long)]
    dry_run: bool,

    /// Record exhausted cards as absent instead of failing
    #[arg(long)]
    partial: bool,
}

impl Cli {
    fn request_path(&self) -> Option<&PathBuf> {
        self.request.as_ref().filter(|p| p.as_os_str() != "-")
    }

    /// Apply command-line overrides to a request read from input.
    fn apply(&self, mut request: CompileRequest) -> CompileRequest {
        if let Some(model) = &self.model {
            request = request.with_model(model.clone());
        }
        if let Some(max_repair) = self.max_repair {
            request = request.with_max_repair(max_repair);
        }
        if self.dry_run {
            request = request.dry_run();
        }
        if self.partial {
            request = request.partial();
        }
        request
    }
}

fn read_request(path: Option<&PathBuf>) -> anyhow::Result<CompileRequest> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading request {}", path.display()))?,
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("reading request from stdin")?;
            raw
        }
    };
    serde_json::from_str(&raw).context("parsing compile request")
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let _log_guard = lessonforge::core::logging::init(&config.logging, &config.log_dir());
    tracing::info!("{} v{} starting", lessonforge::NAME, lessonforge::VERSION);

    let request = cli.apply(read_request(cli.request_path())?);

    let repository = Arc::new(
        SqliteLessonRepository::open(config.sqlite_path())
            .await
            .context("opening lesson store")?,
    );
    let graph = Arc::new(
        SurrealGraphStore::open(config.graph_path())
            .await
            .context("opening graph store")?,
    );
    let providers = ProviderRegistry::from_config(&config.providers, config.generation.max_tokens)
        .context("configuring providers")?;
    let segmenter: Arc<dyn Segmenter> = Arc::new(ScriptRunSegmenter::new());
    let resolver = Arc::new(EntityResolver::new(graph, segmenter.clone(), &config.resolution));

    let compiler = LessonCompiler::new(providers, repository, resolver, segmenter, &config);

    let report = match compiler.compile(&request).await {
        Ok(response) => CompileReport::Ok(Box::new(response)),
        Err(err) => {
            tracing::error!(stage = %err.stage(), "compile failed: {err}");
            let failure = CompileFailure::from(&err);
            eprintln!("{:?}", miette::Report::new(err));
            CompileReport::Error(failure)
        }
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(if report.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
