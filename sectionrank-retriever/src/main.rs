use anyhow::{Context, anyhow};
use clap::{Args as ClapArgs, Parser, Subcommand};
use sectionrank_retriever::{
    JobIndexStore, RelatedResult, RetrieverConfig, Section, UploadedDocument,
    extraction::PlainTextExtractor, storage::FsDocumentStore,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Find related sections across a set of text documents.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for stored uploads (defaults to <tmp>/sectionrank)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze documents as one job and summarize the index
    Analyze {
        #[command(flatten)]
        job: JobArgs,
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
    /// List every section of the analyzed documents
    Sections {
        #[command(flatten)]
        job: JobArgs,
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
    /// Show the sections most related to one section
    Related {
        #[command(flatten)]
        job: JobArgs,
        /// Section id, either full or as <file>:<page>:<chunk>
        #[arg(short, long)]
        section: String,
        /// Maximum number of results (defaults to topK from the config)
        #[arg(short)]
        k: Option<usize>,
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
}

#[derive(ClapArgs, Debug)]
struct JobArgs {
    /// Text files to analyze; pages are separated by form feeds
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// Keep the stored uploads instead of deleting the job on exit
    #[arg(long)]
    keep: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum OutputFormat {
    Summary,
    Full,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(OutputFormat::Summary),
            "full" => Ok(OutputFormat::Full),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid format: {s}")),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JobSummary {
    job_id: String,
    documents: Vec<String>,
    sections: usize,
    vocabulary_terms: usize,
    kept: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RelatedOutput {
    job_id: String,
    section: String,
    results: Vec<RelatedResult>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => RetrieverConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => RetrieverConfig::default(),
    };
    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("sectionrank"));
    let store = JobIndexStore::new(
        config,
        Arc::new(PlainTextExtractor::new()),
        Arc::new(FsDocumentStore::new(&data_dir)),
    )?;

    let job = match &args.command {
        Commands::Analyze { job, .. }
        | Commands::Sections { job, .. }
        | Commands::Related { job, .. } => job,
    };

    let mut uploads = Vec::with_capacity(job.files.len());
    for path in &job.files {
        let upload = UploadedDocument::from_path(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        uploads.push(upload);
    }
    let job_id = store.analyze(uploads).await?;

    let outcome = match &args.command {
        Commands::Analyze { format, .. } => {
            print_summary(&store, &job_id, job.keep, &data_dir, format).await
        }
        Commands::Sections { format, .. } => {
            print_sections(&store.sections(&job_id).await, format)
        }
        Commands::Related {
            section, k, format, ..
        } => print_related(&store, &job_id, section, *k, format).await,
    };

    if !job.keep {
        store.delete_job(&job_id).await?;
    }
    outcome
}

async fn print_summary(
    store: &JobIndexStore,
    job_id: &str,
    kept: bool,
    data_dir: &std::path::Path,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let sections = store.sections(job_id).await;
    let vocabulary_terms = store
        .registry()
        .get(job_id)
        .await
        .map(|index| index.vocabulary_size())
        .unwrap_or(0);
    let summary = JobSummary {
        job_id: job_id.to_string(),
        documents: store
            .documents(job_id)
            .await
            .into_iter()
            .map(|d| d.name)
            .collect(),
        sections: sections.len(),
        vocabulary_terms,
        kept,
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Summary | OutputFormat::Full => {
            println!("Job: {}", summary.job_id);
            println!("Documents: {}", summary.documents.join(", "));
            println!("Sections: {}", summary.sections);
            println!("Vocabulary terms: {}", summary.vocabulary_terms);
            if kept {
                println!("Uploads kept in {}", data_dir.join(job_id).display());
            }
            if *format == OutputFormat::Full {
                println!();
                for section in &sections {
                    println!("  {} | {}", section.id, section.title);
                }
            }
        }
    }
    Ok(())
}

fn print_sections(sections: &[Section], format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(sections)?);
        }
        OutputFormat::Summary => {
            println!("Found {} sections:", sections.len());
            for section in sections {
                println!(
                    "  {} | {} | {} words",
                    section.id,
                    section.title,
                    section.text.split_whitespace().count()
                );
            }
        }
        OutputFormat::Full => {
            for section in sections {
                println!("Section: {}", section.id);
                println!("Document: {}", section.doc_id);
                println!("Title: {}", section.title);
                println!("Text:\n{}", section.text);
                println!("{}", "-".repeat(80));
            }
        }
    }
    Ok(())
}

async fn print_related(
    store: &JobIndexStore,
    job_id: &str,
    section: &str,
    k: Option<usize>,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let section_id = resolve_section_id(store, job_id, section)
        .await
        .ok_or_else(|| anyhow!("Unknown section: {section}"))?;
    let output = RelatedOutput {
        job_id: job_id.to_string(),
        results: store.related(job_id, &section_id, k).await,
        section: section_id,
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Summary => {
            println!(
                "Found {} sections related to {}:",
                output.results.len(),
                output.section
            );
            for result in &output.results {
                println!("  {:.4} | {} | {}", result.score, result.id, result.title);
            }
        }
        OutputFormat::Full => {
            for result in &output.results {
                println!("Section: {}", result.id);
                println!("Score: {:.4}", result.score);
                println!("Title: {}", result.title);
                println!("Snippet: {}", result.snippet);
                println!("{}", "-".repeat(80));
            }
        }
    }
    Ok(())
}

/// Accept a full section id or one relative to the job (`<file>:<page>:<chunk>`).
async fn resolve_section_id(store: &JobIndexStore, job_id: &str, section: &str) -> Option<String> {
    if store.section(job_id, section).await.is_some() {
        return Some(section.to_string());
    }
    let qualified = format!("{job_id}_{section}");
    store
        .section(job_id, &qualified)
        .await
        .map(|_| qualified)
}
