//! Anchorsmith: anchor text and internal link suggestions.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anchorsmith_chat::{LlmClient, LlmConfig, TextGenerator};
use anchorsmith_core::{
    LinkColumns, MatchMode, OpportunityColumns, PipelineConfig, ReferenceColumns,
};
use anchorsmith_ingest::{file, table, ContentFetcher};
use anchorsmith_resolve::search_links;
use anchorsmith_runtime::{assemble_all, write_results, Pipeline};
use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod routes;
mod state;

use state::AppState;

#[derive(Parser, Debug)]
#[command(
    name = "anchorsmith",
    version,
    about = "Suggest SEO anchor texts and match them to internal links"
)]
struct Cli {
    /// Pipeline config file (JSON)
    #[arg(long, global = true, env = "ANCHORSMITH_CONFIG")]
    config: Option<PathBuf>,

    /// LLM provider config file (JSON)
    #[arg(long, global = true, env = "ANCHORSMITH_LLM_CONFIG")]
    llm_config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full pipeline over an opportunity table
    Run(RunArgs),
    /// Suggest anchor texts for a topic
    Anchors(AnchorsArgs),
    /// Search a live-link table for a topic
    Search(SearchArgs),
    /// Extract readable text from a file or URL
    Extract(ExtractArgs),
    /// Start the HTTP API
    Serve {
        #[arg(long, env = "PORT")]
        port: Option<u16>,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Opportunity table (CSV)
    #[arg(long)]
    opportunities: PathBuf,
    /// Reference link table (CSV)
    #[arg(long)]
    references: PathBuf,
    /// Output CSV; stdout when omitted
    #[arg(long, short)]
    output: Option<PathBuf>,

    #[arg(long, default_value = "Target")]
    ref_topic_col: String,
    #[arg(long, default_value = "Client URL")]
    ref_url_col: String,
    #[arg(long)]
    ref_language_col: Option<String>,
    #[arg(long, default_value = "URL")]
    opp_url_col: String,
    #[arg(long, default_value = "Anchor")]
    opp_anchor_col: String,
    #[arg(long)]
    opp_text_col: Option<String>,

    /// joint or language_aware
    #[arg(long)]
    match_mode: Option<MatchMode>,
    /// Rows processed at once
    #[arg(long)]
    concurrency: Option<usize>,
    /// Fetch source pages for rows without text
    #[arg(long, default_value_t = false)]
    fetch: bool,
}

#[derive(Args, Debug)]
struct AnchorsArgs {
    /// Seed keyword
    #[arg(long)]
    topic: String,
    /// Source text
    #[arg(long, conflicts_with_all = ["file", "url"])]
    text: Option<String>,
    #[arg(long, conflicts_with = "url")]
    file: Option<PathBuf>,
    #[arg(long)]
    url: Option<String>,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Live-link table (CSV)
    #[arg(long)]
    links: PathBuf,
    #[arg(long)]
    topic: String,
    #[arg(long, default_value = "Target")]
    topic_col: String,
    #[arg(long, default_value = "Client URL")]
    url_col: String,
    #[arg(long, default_value = "Anchor")]
    anchor_col: String,
    /// Output CSV; stdout when omitted
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    #[arg(long, conflicts_with = "url", required_unless_present = "url")]
    file: Option<PathBuf>,
    #[arg(long)]
    url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig::load(cli.config.as_deref())?;
    let llm_config = LlmConfig::load(cli.llm_config.as_deref())?;

    match cli.command {
        Command::Run(args) => run(config, &llm_config, args).await,
        Command::Anchors(args) => anchors(config, &llm_config, args).await,
        Command::Search(args) => search(args),
        Command::Extract(args) => extract(&config, args).await,
        Command::Serve { port } => serve(config, llm_config, port).await,
        Command::Config => {
            let view = serde_json::json!({
                "pipeline": config,
                "llm": llm_config.to_response(),
            });
            println!("{}", serde_json::to_string_pretty(&view)?);
            Ok(())
        }
    }
}

fn output_writer(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout()),
    })
}

async fn run(
    mut config: PipelineConfig,
    llm_config: &LlmConfig,
    args: RunArgs,
) -> anyhow::Result<()> {
    if let Some(mode) = args.match_mode {
        config.match_mode = mode;
    }
    if let Some(n) = args.concurrency {
        config.concurrency = n;
    }
    config.fetch_missing_content |= args.fetch;

    // Configuration problems surface before any row is processed
    let client = LlmClient::from_config(llm_config)?;
    let references = table::load_references(
        &args.references,
        &ReferenceColumns {
            topic: args.ref_topic_col,
            url: args.ref_url_col,
            language: args.ref_language_col,
        },
    )?;
    let opportunities = table::load_opportunities(
        &args.opportunities,
        &OpportunityColumns {
            source_url: args.opp_url_col,
            anchor: args.opp_anchor_col,
            text: args.opp_text_col,
        },
    )?;

    info!("Generating anchors with {}", client.describe());
    let pipeline = Pipeline::new(config, Arc::new(client))?;
    let output = pipeline.run(&opportunities, &references).await?;
    let records = assemble_all(&output.outcomes, pipeline.config().round_similarity);

    write_results(output_writer(args.output.as_deref())?, &records)?;
    if let Some(path) = &args.output {
        info!("Wrote {} records to {}", records.len(), path.display());
    }
    Ok(())
}

async fn anchors(
    config: PipelineConfig,
    llm_config: &LlmConfig,
    args: AnchorsArgs,
) -> anyhow::Result<()> {
    let text = anchor_source_text(&config, &args).await?;
    let client = LlmClient::from_config(llm_config)?;
    let pipeline = Pipeline::new(config, Arc::new(client))?;
    let anchors = pipeline.suggest(&text, Some(&args.topic)).await;
    if anchors.is_empty() {
        bail!("no anchor suggestions generated");
    }
    for (i, anchor) in anchors.iter().enumerate() {
        println!("{}. {} ({})", i + 1, anchor.phrase, anchor.origin);
    }
    Ok(())
}

/// Source text for `anchors`. A failed fetch warns and leaves the topic alone
/// to drive generation.
async fn anchor_source_text(config: &PipelineConfig, args: &AnchorsArgs) -> anyhow::Result<String> {
    Ok(match (&args.text, &args.file, &args.url) {
        (Some(text), _, _) => text.clone(),
        (None, Some(path), _) => file::extract_text(path)?
            .with_context(|| format!("{} does not contain text", path.display()))?,
        (None, None, Some(url)) => {
            let fetcher =
                ContentFetcher::new(std::time::Duration::from_secs(config.fetch_timeout_secs))?;
            fetcher.fetch_text_or_empty(url).await
        }
        (None, None, None) => String::new(),
    })
}

fn search(args: SearchArgs) -> anyhow::Result<()> {
    let rows = table::load_link_rows(
        &args.links,
        &LinkColumns {
            topic: args.topic_col,
            url: args.url_col,
            anchor: args.anchor_col,
        },
    )?;
    let hits = search_links(&rows, &args.topic);
    if hits.is_empty() {
        info!("No matching internal URLs found for '{}'", args.topic);
    }
    table::write_records(output_writer(args.output.as_deref())?, &hits)?;
    Ok(())
}

async fn extract(config: &PipelineConfig, args: ExtractArgs) -> anyhow::Result<()> {
    let text = match (args.file, args.url) {
        (Some(path), _) => file::extract_text(&path)?
            .with_context(|| format!("{} does not contain text", path.display()))?,
        (None, Some(url)) => {
            let fetcher =
                ContentFetcher::new(std::time::Duration::from_secs(config.fetch_timeout_secs))?;
            let page = fetcher.fetch(&url).await?;
            if let Some(title) = page.title {
                println!("# {}", title);
            }
            page.text
        }
        (None, None) => bail!("--file or --url is required"),
    };
    println!("{}", text);
    Ok(())
}

async fn serve(
    mut config: PipelineConfig,
    llm_config: LlmConfig,
    port: Option<u16>,
) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.port = port;
    }
    let port = config.port;

    match llm_config.resolve_provider() {
        Some(target) => info!("LLM provider: {} ({})", target.provider, target.model),
        None => info!("No LLM credential configured; generation endpoints will return 503"),
    }

    let state = Arc::new(AppState::new(config, llm_config)?);
    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Anchorsmith server listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_writer_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        {
            let mut out = output_writer(Some(&path)).unwrap();
            out.write_all(b"a,b\n").unwrap();
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a,b\n");
    }

    #[test]
    fn test_output_writer_reports_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = output_writer(Some(&dir.path().join("missing/out.csv")))
            .err()
            .unwrap();
        assert!(err.to_string().contains("cannot create"));
    }

    #[tokio::test]
    async fn test_anchor_source_text_survives_fetch_failure() {
        let args = AnchorsArgs {
            topic: "darts".into(),
            text: None,
            file: None,
            url: Some("http://127.0.0.1:9/post".into()),
        };
        let text = anchor_source_text(&PipelineConfig::default(), &args)
            .await
            .unwrap();
        assert!(text.is_empty());
    }

    #[test]
    fn test_cli_parses_run_flags() {
        let cli = Cli::try_parse_from([
            "anchorsmith",
            "run",
            "--opportunities",
            "opps.csv",
            "--references",
            "refs.csv",
            "--match-mode",
            "joint",
            "--concurrency",
            "4",
        ])
        .unwrap();
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.match_mode, Some(MatchMode::Joint));
                assert_eq!(args.concurrency, Some(4));
                assert_eq!(args.ref_topic_col, "Target");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
