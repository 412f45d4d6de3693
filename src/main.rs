mod db;
mod export;
mod fetch;
mod ids;
mod pipeline;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "factlet", about = "HTML to retrieval-ready knowledge artifacts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Queue URLs for a domain and fetch their HTML snapshots
    Ingest {
        /// Domain the URLs belong to
        domain: String,
        /// URLs to queue
        urls: Vec<String>,
        /// Max pages to fetch this run (default: all unfetched)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Extract one document and print the artifact as JSON
    Extract {
        /// Canonical URL of the document
        url: String,
        /// Read HTML from this file instead of fetching the URL
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Pretty-print the JSON output
        #[arg(short, long)]
        pretty: bool,
    },
    /// Run the extraction pipeline over fetched snapshots
    Process {
        /// Max snapshots to process (default: all unextracted)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Export a domain's artifacts as NDJSON
    Export {
        /// Domain to export
        domain: String,
        /// Output file
        #[arg(short, long, default_value = "factlets.ndjson")]
        out: PathBuf,
    },
    /// Show ingestion statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ingest { domain, urls, limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            if !urls.is_empty() {
                let inserted = db::insert_pages(&conn, &domain, &urls)?;
                println!("Queued {} new URLs ({} given)", inserted, urls.len());
            }
            let pages = db::fetch_unfetched(&conn, limit)?;
            if pages.is_empty() {
                println!("No unfetched pages. Queue URLs first or everything is fetched.");
                return Ok(());
            }
            println!("Fetching {} pages (streaming to DB)...", pages.len());
            let stats = fetch::fetch_pages_streaming(&conn, pages).await?;
            println!(
                "Done: {} fetched ({} ok, {} errors).",
                stats.total, stats.ok, stats.errors
            );
            Ok(())
        }
        Commands::Extract { url, file, pretty } => {
            let html = match file {
                Some(path) => std::fs::read_to_string(path)?,
                None => fetch::fetch_single_page(&url).await?,
            };
            let artifact = pipeline::extract(&html, &url);
            let json = if pretty {
                serde_json::to_string_pretty(&artifact)?
            } else {
                serde_json::to_string(&artifact)?
            };
            println!("{}", json);
            Ok(())
        }
        Commands::Process { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let snapshots = db::fetch_unextracted(&conn, limit)?;
            if snapshots.is_empty() {
                println!("No unextracted snapshots. Run 'ingest' first.");
                return Ok(());
            }
            println!("Processing {} snapshots...", snapshots.len());
            let counts = process_snapshots(&conn, &snapshots)?;
            counts.print();
            Ok(())
        }
        Commands::Export { domain, out } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let stored = db::fetch_extractions_for_domain(&conn, &domain)?;
            if stored.is_empty() {
                println!("No extractions for domain '{}'.", domain);
                return Ok(());
            }
            let mut lines = Vec::new();
            for (_url, json) in &stored {
                let artifact: pipeline::ExtractionResult = serde_json::from_str(json)?;
                lines.extend(export::to_ndjson(&artifact)?);
            }
            let count = lines.len();
            std::fs::write(&out, lines.join("\n") + "\n")?;
            println!(
                "Exported {} records from {} documents to {}",
                count,
                stored.len(),
                out.display()
            );
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Queued:      {}", s.total);
            println!("Fetched:     {}", s.fetched);
            println!("Unfetched:   {}", s.unfetched);
            println!("Snapshots:   {}", s.snapshots);
            println!("Fetch errors:{}", s.errors);
            println!("Extracted:   {}", s.extracted);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

struct ProcessCounts {
    documents: usize,
    sections: usize,
    units: usize,
    edges: usize,
}

impl ProcessCounts {
    fn print(&self) {
        println!(
            "Saved {} documents: {} sections, {} units, {} edges.",
            self.documents, self.sections, self.units, self.edges,
        );
    }
}

fn process_snapshots(
    conn: &rusqlite::Connection,
    snapshots: &[db::SnapshotPage],
) -> anyhow::Result<ProcessCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(snapshots.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut counts = ProcessCounts {
        documents: 0,
        sections: 0,
        units: 0,
        edges: 0,
    };

    for chunk in snapshots.chunks(500) {
        let rows: Vec<db::ExtractionRow> = chunk
            .par_iter()
            .map(|page| {
                let artifact = pipeline::extract(&page.html, &page.url);
                let row = db::ExtractionRow {
                    doc_id: artifact.doc_id.clone(),
                    domain: page.domain.clone(),
                    url: page.url.clone(),
                    content_hash: artifact.content_hash.clone(),
                    title: artifact.title.clone(),
                    result_json: serde_json::to_string(&artifact)?,
                    section_count: artifact.sections.len(),
                    unit_count: artifact.units.len(),
                    edge_count: artifact.edges.len(),
                };
                Ok(row)
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        for r in &rows {
            counts.sections += r.section_count;
            counts.units += r.unit_count;
            counts.edges += r.edge_count;
        }
        counts.documents += rows.len();
        db::save_extractions(conn, &rows)?;
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(counts)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
