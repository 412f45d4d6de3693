use anyhow::Result;
use rusqlite::Connection;

const DB_PATH: &str = "data/factlet.sqlite";

pub fn connect() -> Result<Connection> {
    if let Some(dir) = std::path::Path::new(DB_PATH).parent() {
        std::fs::create_dir_all(dir)?;
    }
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS pages (
            id         INTEGER PRIMARY KEY,
            domain     TEXT NOT NULL,
            url        TEXT UNIQUE NOT NULL,
            fetched    BOOLEAN NOT NULL DEFAULT 0,
            fetched_at TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_pages_fetched ON pages(fetched);
        CREATE INDEX IF NOT EXISTS idx_pages_domain ON pages(domain);

        CREATE TABLE IF NOT EXISTS html_snapshots (
            id         INTEGER PRIMARY KEY,
            page_id    INTEGER NOT NULL REFERENCES pages(id),
            domain     TEXT NOT NULL,
            url        TEXT NOT NULL,
            html       TEXT,
            status     INTEGER,
            error      TEXT,
            latency_ms INTEGER,
            fetched_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(domain, url)
        );
        CREATE INDEX IF NOT EXISTS idx_snapshots_domain ON html_snapshots(domain);

        -- One finished artifact per document, stored whole as JSON with the
        -- headline counts denormalized for cheap stats.
        CREATE TABLE IF NOT EXISTS extractions (
            doc_id        TEXT PRIMARY KEY,
            domain        TEXT NOT NULL,
            url           TEXT UNIQUE NOT NULL,
            content_hash  TEXT NOT NULL,
            title         TEXT,
            result_json   TEXT NOT NULL,
            section_count INTEGER NOT NULL,
            unit_count    INTEGER NOT NULL,
            edge_count    INTEGER NOT NULL,
            extracted_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_extractions_domain ON extractions(domain);
        ",
    )?;
    Ok(())
}

// ── Fetch queue ──

pub fn insert_pages(conn: &Connection, domain: &str, urls: &[String]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare("INSERT OR IGNORE INTO pages (domain, url) VALUES (?1, ?2)")?;
        for url in urls {
            count += stmt.execute(rusqlite::params![domain, url])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub fn fetch_unfetched(
    conn: &Connection,
    limit: Option<usize>,
) -> Result<Vec<(i64, String, String)>> {
    let sql = match limit {
        Some(n) => format!(
            "SELECT id, domain, url FROM pages WHERE fetched = 0 ORDER BY id LIMIT {}",
            n
        ),
        None => "SELECT id, domain, url FROM pages WHERE fetched = 0 ORDER BY id".to_string(),
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub struct SnapshotRow {
    pub page_id: i64,
    pub domain: String,
    pub url: String,
    pub html: Option<String>,
    pub status: Option<i32>,
    pub error: Option<String>,
    pub latency_ms: Option<i64>,
}

// ── Extraction ──

pub struct SnapshotPage {
    pub snapshot_id: i64,
    pub domain: String,
    pub url: String,
    pub html: String,
}

/// Snapshots with HTML that have no extraction yet.
pub fn fetch_unextracted(conn: &Connection, limit: Option<usize>) -> Result<Vec<SnapshotPage>> {
    let sql = format!(
        "SELECT hs.id, hs.domain, hs.url, hs.html
         FROM html_snapshots hs
         LEFT JOIN extractions e ON e.url = hs.url
         WHERE hs.html IS NOT NULL AND e.url IS NULL
         ORDER BY hs.id{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(SnapshotPage {
                snapshot_id: row.get(0)?,
                domain: row.get(1)?,
                url: row.get(2)?,
                html: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub struct ExtractionRow {
    pub doc_id: String,
    pub domain: String,
    pub url: String,
    pub content_hash: String,
    pub title: String,
    pub result_json: String,
    pub section_count: usize,
    pub unit_count: usize,
    pub edge_count: usize,
}

pub fn save_extractions(conn: &Connection, rows: &[ExtractionRow]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO extractions
             (doc_id, domain, url, content_hash, title, result_json,
              section_count, unit_count, edge_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        for r in rows {
            stmt.execute(rusqlite::params![
                r.doc_id,
                r.domain,
                r.url,
                r.content_hash,
                r.title,
                r.result_json,
                r.section_count as i64,
                r.unit_count as i64,
                r.edge_count as i64,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

pub fn fetch_extractions_for_domain(
    conn: &Connection,
    domain: &str,
) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(
        "SELECT url, result_json FROM extractions WHERE domain = ?1 ORDER BY url",
    )?;
    let rows = stmt
        .query_map([domain], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub total: usize,
    pub fetched: usize,
    pub unfetched: usize,
    pub snapshots: usize,
    pub errors: usize,
    pub extracted: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let total: usize = conn.query_row("SELECT COUNT(*) FROM pages", [], |r| r.get(0))?;
    let fetched: usize =
        conn.query_row("SELECT COUNT(*) FROM pages WHERE fetched = 1", [], |r| r.get(0))?;
    let snapshots: usize =
        conn.query_row("SELECT COUNT(*) FROM html_snapshots", [], |r| r.get(0))?;
    let errors: usize = conn.query_row(
        "SELECT COUNT(*) FROM html_snapshots WHERE error IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let extracted: usize =
        conn.query_row("SELECT COUNT(*) FROM extractions", [], |r| r.get(0))?;
    Ok(Stats {
        total,
        fetched,
        unfetched: total - fetched,
        snapshots,
        errors,
        extracted,
    })
}
