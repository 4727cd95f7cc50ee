use crate::{
    db::{Db, WalletRow},
    errors::SwarmError,
};
use eyre::Context as _;
use solana_sdk::{pubkey::Pubkey, signature::Keypair, signer::Signer as _};
use tracing::info;
use zeroize::Zeroizing;

/// A locally generated Solana keypair. The secret half never leaves this module except to be
/// persisted or to sign.
pub struct Wallet {
    keypair: Keypair,
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("pubkey", &self.pubkey())
            .finish_non_exhaustive()
    }
}

impl Wallet {
    fn generate() -> Self {
        Self {
            keypair: Keypair::new(),
        }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub const fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    fn secret_b58(&self) -> String {
        let bytes = Zeroizing::new(self.keypair.to_bytes());
        bs58::encode(bytes.as_slice()).into_string()
    }

    fn from_row(row: &WalletRow) -> eyre::Result<Self> {
        let bytes = Zeroizing::new(
            bs58::decode(row.secret_key_b58.trim())
                .into_vec()
                .context("decode base58 secret key")?,
        );
        if bytes.len() != 64 {
            eyre::bail!("stored keypair must be 64 bytes, got {}", bytes.len());
        }
        let keypair = Keypair::try_from(bytes.as_slice()).context("parse solana keypair bytes")?;
        let w = Self { keypair };
        if w.pubkey().to_string() != row.public_key {
            eyre::bail!(
                "stored secret does not match public key {}",
                row.public_key
            );
        }
        Ok(w)
    }
}

/// Ordered collection of generated wallets, mirrored in the `swarm_wallets` table.
///
/// Positions are 1-based at the API surface and 0-based in storage; [`KeypairStore::get`] is the
/// only place that translates between the two.
#[derive(Debug, Default)]
pub struct KeypairStore {
    wallets: Vec<Wallet>,
}

impl KeypairStore {
    /// Rebuild the collection from storage in creation order. Called once at startup.
    pub async fn load_all(db: &Db) -> eyre::Result<Self> {
        let rows = db.list_wallets().await.context("load wallets")?;
        let mut wallets = Vec::with_capacity(rows.len());
        for row in &rows {
            let w = Wallet::from_row(row)
                .with_context(|| format!("load wallet at position {}", row.position))?;
            wallets.push(w);
        }
        info!(count = wallets.len(), "loaded wallets");
        Ok(Self { wallets })
    }

    /// Generate a keypair, persist it, then append it. Nothing is appended when the write fails,
    /// so indices never refer to a wallet that would vanish on restart.
    pub async fn create(&mut self, db: &Db) -> Result<(usize, &Wallet), SwarmError> {
        let wallet = Wallet::generate();
        let position = i64::try_from(self.wallets.len())
            .map_err(|e| SwarmError::Persist(format!("wallet position overflow: {e}")))?;
        let row = WalletRow {
            position,
            public_key: wallet.pubkey().to_string(),
            secret_key_b58: wallet.secret_b58(),
        };
        db.upsert_wallet(&row)
            .await
            .map_err(|e| SwarmError::Persist(format!("{e:#}")))?;

        self.wallets.push(wallet);
        let index = self.wallets.len();
        info!(index, pubkey = %row.public_key, "created wallet");
        let created = self
            .wallets
            .last()
            .ok_or_else(|| SwarmError::Persist("wallet vanished after append".into()))?;
        Ok((index, created))
    }

    /// `(1-based index, public key)` in creation order.
    pub fn list(&self) -> Vec<(usize, Pubkey)> {
        self.wallets
            .iter()
            .enumerate()
            .map(|(i, w)| (i + 1, w.pubkey()))
            .collect()
    }

    pub fn get(&self, index: i64) -> Result<&Wallet, SwarmError> {
        let out_of_range = || SwarmError::InvalidIndex {
            index,
            count: self.wallets.len(),
        };
        let slot = index
            .checked_sub(1)
            .and_then(|i| usize::try_from(i).ok())
            .ok_or_else(out_of_range)?;
        self.wallets.get(slot).ok_or_else(out_of_range)
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }
}
