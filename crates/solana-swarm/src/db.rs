use crate::paths::SwarmPaths;
use eyre::Context as _;
use std::path::Path;

// Local, embedded "SQLite-like" store (Turso, pure Rust).
//
// Two tables: generated wallets (ordered by `position`, which is the 0-based creation order) and
// the cached token directory. Both use upsert so replays of the same data are idempotent.

pub struct Db {
    // Keep the database handle alive for the lifetime of the connection.
    _db: turso::Database,
    conn: turso::Connection,
}

// `turso::Database` / `turso::Connection` may not implement `Debug`.
impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletRow {
    pub position: i64,
    pub public_key: String,
    /// Base58 of the 64-byte keypair (secret || public).
    pub secret_key_b58: String,
}

#[derive(Debug, Clone)]
pub struct TokenRow<'a> {
    pub address: &'a str,
    pub name: &'a str,
    pub symbol: &'a str,
    pub decimals: i64,
    pub daily_volume: f64,
    pub created_at: &'a str,
    pub raw_json: &'a str,
}

impl Db {
    pub async fn open(paths: &SwarmPaths) -> eyre::Result<Self> {
        crate::fsutil::ensure_private_dir(&paths.data_dir)?;
        Self::open_at(&paths.db_file).await
    }

    pub async fn open_at(path: &Path) -> eyre::Result<Self> {
        let p_s = path.to_string_lossy();
        let db = turso::Builder::new_local(p_s.as_ref())
            .build()
            .await
            .context("open turso local db")?;
        let conn = db.connect().context("connect turso db")?;

        let this = Self { _db: db, conn };
        this.init().await?;
        Ok(this)
    }

    async fn init(&self) -> eyre::Result<()> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS swarm_wallets (\
                  public_key TEXT PRIMARY KEY,\
                  secret_key TEXT NOT NULL,\
                  position INTEGER NOT NULL\
                )",
                (),
            )
            .await
            .context("create swarm_wallets")?;

        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS swarm_tokens (\
                  address TEXT PRIMARY KEY,\
                  name TEXT NOT NULL,\
                  symbol TEXT NOT NULL,\
                  decimals INTEGER NOT NULL,\
                  daily_volume REAL NOT NULL,\
                  created_at TEXT NOT NULL,\
                  raw_json TEXT NOT NULL\
                )",
                (),
            )
            .await
            .context("create swarm_tokens")?;

        Ok(())
    }

    #[cfg(test)]
    pub async fn execute_sql(&self, sql: &str) -> eyre::Result<()> {
        self.conn.execute(sql, ()).await.context("execute sql")?;
        Ok(())
    }

    pub async fn upsert_wallet(&self, w: &WalletRow) -> eyre::Result<()> {
        self.conn
            .execute(
                "INSERT INTO swarm_wallets (public_key, secret_key, position) \
                 VALUES (?, ?, ?) \
                 ON CONFLICT(public_key) DO UPDATE SET \
                   secret_key=excluded.secret_key",
                (
                    w.public_key.as_str(),
                    w.secret_key_b58.as_str(),
                    w.position,
                ),
            )
            .await
            .context("upsert swarm_wallets")?;
        Ok(())
    }

    pub async fn list_wallets(&self) -> eyre::Result<Vec<WalletRow>> {
        let mut rows = self
            .conn
            .query(
                "SELECT position, public_key, secret_key FROM swarm_wallets ORDER BY position ASC",
                (),
            )
            .await
            .context("query swarm_wallets")?;

        let mut out: Vec<WalletRow> = vec![];
        while let Some(row) = rows.next().await.context("next row")? {
            out.push(WalletRow {
                position: row.get(0).context("row.position")?,
                public_key: row.get(1).context("row.public_key")?,
                secret_key_b58: row.get(2).context("row.secret_key")?,
            });
        }
        Ok(out)
    }

    pub async fn upsert_token(&self, t: &TokenRow<'_>) -> eyre::Result<()> {
        self.conn
            .execute(
                "INSERT INTO swarm_tokens \
                   (address, name, symbol, decimals, daily_volume, created_at, raw_json) \
                 VALUES (?, ?, ?, ?, ?, ?, ?) \
                 ON CONFLICT(address) DO UPDATE SET \
                   name=excluded.name, \
                   symbol=excluded.symbol, \
                   decimals=excluded.decimals, \
                   daily_volume=excluded.daily_volume, \
                   created_at=excluded.created_at, \
                   raw_json=excluded.raw_json",
                (
                    t.address,
                    t.name,
                    t.symbol,
                    t.decimals,
                    t.daily_volume,
                    t.created_at,
                    t.raw_json,
                ),
            )
            .await
            .context("upsert swarm_tokens")?;
        Ok(())
    }

    /// Raw documents in storage scan order (no `ORDER BY`).
    pub async fn list_token_json(&self) -> eyre::Result<Vec<String>> {
        let mut rows = self
            .conn
            .query("SELECT raw_json FROM swarm_tokens", ())
            .await
            .context("query swarm_tokens")?;

        let mut out: Vec<String> = vec![];
        while let Some(row) = rows.next().await.context("next row")? {
            out.push(row.get(0).context("row.raw_json")?);
        }
        Ok(out)
    }

    pub async fn count_tokens(&self) -> eyre::Result<i64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM swarm_tokens", ())
            .await
            .context("count swarm_tokens")?;
        let Some(row) = rows.next().await.context("next row")? else {
            eyre::bail!("count query returned no rows");
        };
        let n: i64 = row.get(0).context("row.count")?;
        Ok(n)
    }
}
