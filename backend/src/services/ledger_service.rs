use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use shared::shared_settlement::SettlementResult;

/// Env var naming the ledger file (JSON lines, one settled spin per line,
/// oldest first). Unset means persistence is disabled and the game runs on
/// in-memory ledgers alone.
const LEDGER_PATH_ENV: &str = "GT_TAVERN_LEDGER_PATH";

/// Best-effort persisted ledger behind the per-session in-memory ledgers.
/// A write failure is logged and swallowed: the in-memory entry is already
/// recorded and a spin must never be blocked by storage trouble.
#[derive(Clone)]
pub struct LedgerStore {
    path: Option<PathBuf>,
}

impl LedgerStore {
    pub fn from_env() -> Self {
        match std::env::var(LEDGER_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => {
                info!("📒 Ledger persistence enabled at {}", path);
                Self { path: Some(PathBuf::from(path)) }
            }
            _ => {
                info!("📒 {} not set; ledger persistence disabled.", LEDGER_PATH_ENV);
                Self { path: None }
            }
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: Some(path.into()) }
    }

    /// Loads every persisted record, newest first, for pre-populating a fresh
    /// session's ledger. Purely a read. Malformed rows are skipped with a
    /// warning rather than failing the whole load.
    pub async fn load_all(&self) -> Vec<SettlementResult> {
        let Some(path) = &self.path else {
            return Vec::new();
        };

        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                warn!("📒 Failed to read ledger file {}: {}", path.display(), err);
                return Vec::new();
            }
        };

        let mut records = Vec::new();
        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<SettlementResult>(line) {
                Ok(record) => records.push(record),
                Err(err) => warn!("📒 Skipping malformed ledger row: {}", err),
            }
        }

        // File is append-order; sessions display newest first.
        records.reverse();
        info!("📒 Loaded {} ledger entries.", records.len());
        records
    }

    /// Appends a single record. Pure append, never clears or rewrites
    /// existing rows.
    pub async fn append(&self, record: &SettlementResult) {
        let Some(path) = &self.path else {
            return;
        };

        let line = match serde_json::to_string(record) {
            Ok(line) => line,
            Err(err) => {
                warn!("📒 Failed to serialize ledger row: {}", err);
                return;
            }
        };

        let result = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .await?;
            file.write_all(line.as_bytes()).await?;
            file.write_all(b"\n").await?;
            file.flush().await
        }
        .await;

        match result {
            Ok(()) => info!("📒 Appended 1 ledger entry."),
            Err(err) => warn!("📒 Failed to append ledger row: {}", err),
        }
    }
}
