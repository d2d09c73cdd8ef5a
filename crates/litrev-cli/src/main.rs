use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use litrev::arxiv::client::ArxivClient;
use litrev::sources::arxiv::ArxivSource;
use litrev::sources::local::LocalArchiveSource;
use litrev::sources::semantic_scholar::SemanticScholarSource;
use litrev::{
    CitationEnricher, CitationGraphCrawler, KeywordExpr, LitrevConfig, RecordResolver,
    ResolveOptions, RetryPolicy, SourceId, bibtex, download::PdfDownloader, filter,
};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "litrev",
    about = "Literature review toolkit: resolve, filter and enrich paper metadata",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to the platform config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve titles into a BibTeX bibliography.
    Fetch {
        titles: Vec<String>,
        /// File with one title per line.
        #[arg(long)]
        titles_file: Option<PathBuf>,
        /// Write the bibliography here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Source priority order (repeatable: arxiv, own, googlescholar,
        /// semanticscholar).
        #[arg(long = "source", action = clap::ArgAction::Append)]
        sources: Vec<SourceId>,
        /// Accept hits whose title does not match the query.
        #[arg(long)]
        no_check_title: bool,
        /// Keep the cite keys the sources assigned.
        #[arg(long)]
        no_key: bool,
    },

    /// List recent arXiv papers in the configured categories.
    Feed {
        /// Window start, YYYY-MM-DD.
        #[arg(long)]
        from: NaiveDate,
        /// Window end, YYYY-MM-DD.
        #[arg(long)]
        to: NaiveDate,
        /// Words that must all appear (prefix ~ to forbid one).
        #[arg(long = "all", action = clap::ArgAction::Append)]
        all: Vec<String>,
        /// Words of which at least one must appear.
        #[arg(long = "any", action = clap::ArgAction::Append)]
        any: Vec<String>,
    },

    /// Citation counts and per-day rates for titles.
    Cite {
        titles: Vec<String>,
        #[arg(long)]
        titles_file: Option<PathBuf>,
    },

    /// Expand seeds one hop along the citation graph.
    Crawl {
        seeds: Vec<String>,
        #[arg(long)]
        seeds_file: Option<PathBuf>,
        /// Titles already known, never reported (defaults to the seeds).
        #[arg(long)]
        known_file: Option<PathBuf>,
        #[arg(long = "all", action = clap::ArgAction::Append)]
        all: Vec<String>,
        #[arg(long = "any", action = clap::ArgAction::Append)]
        any: Vec<String>,
    },

    /// Download the PDFs of a bibliography.
    Download {
        /// BibTeX file with `url` fields.
        bib: PathBuf,
        /// Target directory (must exist).
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn load_config(path: Option<&Path>) -> Result<LitrevConfig> {
    match path {
        Some(path) => LitrevConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => match LitrevConfig::default_path().filter(|p| p.exists()) {
            Some(path) => LitrevConfig::load(&path)
                .with_context(|| format!("loading config {}", path.display())),
            None => Ok(LitrevConfig::default()),
        },
    }
}

fn gather(inline: Vec<String>, file: Option<&Path>, what: &str) -> Result<Vec<String>> {
    let mut titles = inline;
    if let Some(path) = file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        titles.extend(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(ToOwned::to_owned),
        );
    }
    if titles.is_empty() {
        bail!("no {what} given");
    }
    Ok(titles)
}

fn keyword_expr(all: Vec<String>, any: Vec<String>) -> KeywordExpr {
    match (all.is_empty(), any.is_empty()) {
        (true, true) => KeywordExpr::Any,
        (false, true) => KeywordExpr::all_of(all),
        (true, false) => KeywordExpr::any_of(any),
        (false, false) => {
            KeywordExpr::AllOf(vec![KeywordExpr::all_of(all), KeywordExpr::any_of(any)])
        }
    }
}

fn build_resolver(config: &LitrevConfig, retry: &RetryPolicy) -> RecordResolver {
    let mut resolver = RecordResolver::new()
        .with_source(
            SourceId::Arxiv,
            Arc::new(ArxivSource::new(ArxivClient::new(), retry.clone())),
        )
        .with_source(
            SourceId::SemanticScholar,
            Arc::new(SemanticScholarSource::new(
                config.semantic_scholar_api_key.clone(),
                retry.clone(),
            )),
        );
    if let Some(dir) = &config.archive_dir {
        resolver = resolver.with_source(SourceId::LocalArchive, Arc::new(LocalArchiveSource::new(dir)));
    }
    resolver
}

fn semantic(config: &LitrevConfig, retry: &RetryPolicy) -> Arc<SemanticScholarSource> {
    Arc::new(SemanticScholarSource::new(
        config.semantic_scholar_api_key.clone(),
        retry.clone(),
    ))
}

// ─── Main ───────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, finishing up");
                cancel.cancel();
            }
        });
    }
    let retry = config.retry_policy().with_cancel(cancel);

    match cli.command {
        Commands::Fetch {
            titles,
            titles_file,
            out,
            sources,
            no_check_title,
            no_key,
        } => {
            let titles = gather(titles, titles_file.as_deref(), "titles")?;
            let titles = filter::dedupe(titles);
            let mut resolver = build_resolver(&config, &retry);
            if !sources.is_empty() {
                resolver = resolver.with_order(sources);
            }
            let opts = ResolveOptions {
                check_title: !no_check_title,
                assign_key: !no_key,
            };
            let bibliography = resolver.bibtex_many(&titles, opts).await;
            match out {
                Some(path) => std::fs::write(&path, bibliography)
                    .with_context(|| format!("writing {}", path.display()))?,
                None => print!("{bibliography}"),
            }
        }

        Commands::Feed { from, to, all, any } => {
            let client = ArxivClient::new();
            let entries = retry
                .run("arxiv feed", || {
                    client.list_window(
                        &config.arxiv_categories,
                        from,
                        to,
                        config.arxiv_max_results,
                    )
                })
                .await?;
            let expr = keyword_expr(all, any);
            let titles = filter::dedupe(litrev::arxiv::select_titles(&entries, &expr));
            for title in titles {
                println!("{title}");
            }
        }

        Commands::Cite {
            titles,
            titles_file,
        } => {
            let titles = gather(titles, titles_file.as_deref(), "titles")?;
            let enricher = CitationEnricher::new(semantic(&config, &retry), retry.clone());
            let (counts, rates) = enricher.stats_many(&titles, true).await;
            for (title, count) in &counts {
                let rate = rates.get(title).copied().unwrap_or(0.0);
                println!("{count:>7}  {rate:>8.3}/day  {title}");
            }
        }

        Commands::Crawl {
            seeds,
            seeds_file,
            known_file,
            all,
            any,
        } => {
            let seeds = gather(seeds, seeds_file.as_deref(), "seeds")?;
            let known = match known_file.as_deref() {
                Some(path) => Some(gather(Vec::new(), Some(path), "known titles")?),
                None => None,
            };
            let crawler = CitationGraphCrawler::new(semantic(&config, &retry), retry.clone());
            let found = crawler
                .crawl_one_hop(&seeds, known.as_deref(), &keyword_expr(all, any))
                .await?;
            for title in found {
                println!("{title}");
            }
        }

        Commands::Download { bib, dir } => {
            let text = std::fs::read_to_string(&bib)
                .with_context(|| format!("reading {}", bib.display()))?;
            let records = bibtex::parse(&text)?;
            let downloader = PdfDownloader::new(retry.clone());
            let written = downloader.download_all(&records, &dir).await?;
            println!("downloaded {written} of {} PDFs", records.len());
        }
    }

    Ok(())
}
