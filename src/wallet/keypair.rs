use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::{Result as TransactionResult, Transaction},
};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::{ChainStatus, WalletAdapter, WalletError};
use crate::config;

/// Local keypair wallet backed by an RPC endpoint.
pub struct KeypairWallet {
    keypair: Keypair,
    rpc: RpcClient,
    confirm_attempts: u32,
    confirm_interval: Duration,
}

impl KeypairWallet {
    pub fn new(keypair: Keypair, rpc_url: &str) -> Self {
        Self {
            keypair,
            rpc: RpcClient::new_with_commitment(rpc_url.to_string(), CommitmentConfig::confirmed()),
            confirm_attempts: 60,
            confirm_interval: Duration::from_millis(500),
        }
    }

    pub fn from_config(config: &config::Wallet) -> Result<Self, WalletError> {
        let keypair = load_keypair(config.keypair_path.as_deref(), config.private_key_env.as_deref())?;
        info!(pubkey = %keypair.pubkey(), rpc_url = %config.rpc_url, "Keypair wallet ready");
        Ok(Self::new(keypair, &config.rpc_url))
    }
}

impl WalletAdapter for KeypairWallet {
    async fn connect(&self) -> Result<Pubkey, WalletError> {
        Ok(self.keypair.pubkey())
    }

    async fn balance(&self, owner: &Pubkey) -> Result<u64, WalletError> {
        Ok(self.rpc.get_balance(owner).await?)
    }

    #[instrument(skip(self, transaction))]
    async fn sign(&self, mut transaction: Transaction) -> Result<Transaction, WalletError> {
        let blockhash = self.rpc.get_latest_blockhash().await?;
        transaction.try_sign(&[&self.keypair], blockhash)?;
        debug!(blockhash = %blockhash, "Transaction signed");
        Ok(transaction)
    }

    #[instrument(skip(self, transaction))]
    async fn send(&self, transaction: &Transaction) -> Result<Signature, WalletError> {
        let signature = self.rpc.send_transaction(transaction).await?;
        info!(signature = %signature, "Transaction submitted");
        Ok(signature)
    }

    #[instrument(skip(self))]
    async fn wait_for_confirmation(&self, signature: &Signature) -> Result<(), WalletError> {
        for attempt in 1..=self.confirm_attempts {
            if let Some(status) = self.rpc.get_signature_status(signature).await? {
                return match status {
                    Ok(()) => {
                        info!(attempt, "Transaction confirmed");
                        Ok(())
                    }
                    Err(e) => Err(WalletError::TransactionFailed {
                        signature: *signature,
                        reason: e.to_string(),
                    }),
                };
            }
            tokio::time::sleep(self.confirm_interval).await;
        }

        warn!(signature = %signature, "Confirmation wait exhausted");
        Err(WalletError::ConfirmationTimeout(*signature))
    }

    async fn signature_status(
        &self,
        signature: &Signature,
        recent_blockhash: Option<&Hash>,
    ) -> Result<ChainStatus, WalletError> {
        let status = self
            .rpc
            .get_signature_status_with_commitment_and_history(signature, self.rpc.commitment(), true)
            .await?;

        let blockhash_valid = match (&status, recent_blockhash) {
            (None, Some(blockhash)) => Some(
                self.rpc
                    .is_blockhash_valid(blockhash, CommitmentConfig::processed())
                    .await?,
            ),
            _ => None,
        };

        let chain_status = classify_status(status, blockhash_valid);
        debug!(signature = %signature, status = ?chain_status, "Signature status checked");
        Ok(chain_status)
    }
}

/// Maps an RPC signature lookup to a [`ChainStatus`]. A missing status only
/// counts as expired when the blockhash is known to be invalid.
fn classify_status(
    status: Option<TransactionResult<()>>,
    blockhash_valid: Option<bool>,
) -> ChainStatus {
    match status {
        Some(Ok(())) => ChainStatus::Confirmed,
        Some(Err(e)) => ChainStatus::Failed(e.to_string()),
        None if blockhash_valid == Some(false) => ChainStatus::Expired,
        None => ChainStatus::Pending,
    }
}

/// Loads a keypair from a file (JSON array or raw 64 bytes) or from an
/// environment variable (base58 or JSON array). The file wins when both are
/// configured and the file exists.
pub fn load_keypair(keypair_path: Option<&str>, private_key_env: Option<&str>) -> Result<Keypair, WalletError> {
    if let Some(path) = keypair_path {
        debug!(path = %path, "Loading keypair from file");

        if Path::new(path).exists() {
            let bytes = fs::read(path)
                .map_err(|e| WalletError::KeypairLoad(format!("{}: {}", path, e)))?;
            return keypair_from_file_bytes(&bytes);
        }
        warn!(path = %path, "Keypair file not found, trying environment variable");
    }

    if let Some(env_var) = private_key_env {
        debug!(env_var = %env_var, "Loading keypair from environment variable");

        if let Ok(secret) = std::env::var(env_var) {
            return keypair_from_secret(&secret);
        }
        warn!(env_var = %env_var, "Environment variable not set");
    }

    Err(WalletError::KeypairLoad("no keypair file or private key configured".to_string()))
}

fn keypair_from_file_bytes(bytes: &[u8]) -> Result<Keypair, WalletError> {
    if let Ok(json_bytes) = serde_json::from_slice::<Vec<u8>>(bytes) {
        return keypair_from_bytes(&json_bytes);
    }
    if bytes.len() == 64 {
        return keypair_from_bytes(bytes);
    }
    Err(WalletError::KeypairLoad(
        "expected 64 raw bytes or a JSON array keypair file".to_string(),
    ))
}

/// Parses a base58 (Solana CLI export) or JSON-array secret key.
pub fn keypair_from_secret(secret: &str) -> Result<Keypair, WalletError> {
    let secret = secret.trim();

    if secret.starts_with('[') {
        let bytes: Vec<u8> = serde_json::from_str(secret)
            .map_err(|e| WalletError::KeypairLoad(format!("invalid JSON key: {}", e)))?;
        return keypair_from_bytes(&bytes);
    }

    let bytes = bs58::decode(secret)
        .into_vec()
        .map_err(|e| WalletError::KeypairLoad(format!("invalid base58 key: {}", e)))?;
    keypair_from_bytes(&bytes)
}

fn keypair_from_bytes(bytes: &[u8]) -> Result<Keypair, WalletError> {
    if bytes.len() != 64 {
        return Err(WalletError::KeypairLoad(format!(
            "expected 64 key bytes, got {}",
            bytes.len()
        )));
    }
    Keypair::from_bytes(bytes).map_err(|e| WalletError::KeypairLoad(e.to_string()))
}
