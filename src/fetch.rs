use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::db::SnapshotRow;

const CONCURRENCY: usize = 10;
const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;
const REQUEST_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = "factlet-ingestor/1.0";

/// Fetch stats returned after completion.
pub struct FetchStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

fn build_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()?)
}

/// Fetch pages concurrently, saving each snapshot to DB as it arrives.
pub async fn fetch_pages_streaming(
    conn: &Connection,
    pages: Vec<(i64, String, String)>,
) -> Result<FetchStats> {
    let client = Arc::new(build_client()?);
    let semaphore = Arc::new(Semaphore::new(CONCURRENCY));
    let total = pages.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    // Channel: workers send results, main loop saves to DB
    let (tx, mut rx) = tokio::sync::mpsc::channel::<SnapshotRow>(CONCURRENCY * 2);

    for (page_id, domain, url) in pages {
        let client = Arc::clone(&client);
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let _permit = sem.acquire().await.unwrap();
            let row = fetch_with_retry(&client, page_id, &domain, &url).await;
            let _ = tx.send(row).await;
        });
    }

    // Drop our copy of tx so rx closes when all spawned tasks finish
    drop(tx);

    let mut ok = 0usize;
    let mut errors = 0usize;

    // Prepare statements once, reuse for each row
    let mut insert_stmt = conn.prepare(
        "INSERT OR REPLACE INTO html_snapshots (page_id, domain, url, html, status, error, latency_ms)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    let mut update_stmt =
        conn.prepare("UPDATE pages SET fetched = 1, fetched_at = datetime('now') WHERE id = ?1")?;

    while let Some(row) = rx.recv().await {
        if row.error.is_some() {
            errors += 1;
        } else {
            ok += 1;
        }
        insert_stmt.execute(rusqlite::params![
            row.page_id, row.domain, row.url, row.html, row.status, row.error, row.latency_ms,
        ])?;
        update_stmt.execute(rusqlite::params![row.page_id])?;
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("Fetched {} pages ({} ok, {} errors)", total, ok, errors);

    Ok(FetchStats { total, ok, errors })
}

async fn fetch_with_retry(
    client: &reqwest::Client,
    page_id: i64,
    domain: &str,
    url: &str,
) -> SnapshotRow {
    for attempt in 0..MAX_RETRIES {
        let row = fetch_one(client, page_id, domain, url).await;

        let should_retry = match row.status.map(|s| s as u16) {
            Some(429) => true,
            Some(s) if s >= 500 => true,
            None if row.error.is_some() => true,
            _ => false,
        };
        if !should_retry {
            return row;
        }

        let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
        warn!(
            "Retryable failure on {} (attempt {}/{}), backing off {:.1}s",
            url,
            attempt + 1,
            MAX_RETRIES,
            backoff.as_secs_f64()
        );
        tokio::time::sleep(backoff).await;
    }

    fetch_one(client, page_id, domain, url).await
}

async fn fetch_one(client: &reqwest::Client, page_id: i64, domain: &str, url: &str) -> SnapshotRow {
    let start = Instant::now();
    let response = client.get(url).send().await;
    let elapsed = start.elapsed().as_millis() as i64;

    match response {
        Ok(resp) => {
            let status = resp.status();
            match resp.text().await {
                Ok(body) if status.is_success() => SnapshotRow {
                    page_id,
                    domain: domain.to_string(),
                    url: url.to_string(),
                    html: Some(body),
                    status: Some(status.as_u16() as i32),
                    error: None,
                    latency_ms: Some(elapsed),
                },
                Ok(_) => SnapshotRow {
                    page_id,
                    domain: domain.to_string(),
                    url: url.to_string(),
                    html: None,
                    status: Some(status.as_u16() as i32),
                    error: Some(format!("HTTP {}", status.as_u16())),
                    latency_ms: Some(elapsed),
                },
                Err(e) => SnapshotRow {
                    page_id,
                    domain: domain.to_string(),
                    url: url.to_string(),
                    html: None,
                    status: Some(status.as_u16() as i32),
                    error: Some(e.to_string()),
                    latency_ms: Some(elapsed),
                },
            }
        }
        Err(e) => SnapshotRow {
            page_id,
            domain: domain.to_string(),
            url: url.to_string(),
            html: None,
            status: e.status().map(|s| i32::from(s.as_u16())),
            error: Some(e.to_string()),
            latency_ms: Some(elapsed),
        },
    }
}

/// Fetch a single URL and return its HTML body.
pub async fn fetch_single_page(url: &str) -> Result<String> {
    let client = build_client()?;
    let resp = client.get(url).send().await?.error_for_status()?;
    Ok(resp.text().await?)
}
