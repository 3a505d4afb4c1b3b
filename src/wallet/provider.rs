use serde::Serialize;
use solana_client::client_error::ClientError as RpcClientError;
use solana_sdk::{
    hash::Hash, pubkey::Pubkey, signature::Signature, signer::SignerError, transaction::Transaction,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

#[derive(thiserror::Error, Debug)]
pub enum WalletError {
    #[error("Wallet not connected")]
    NotConnected,

    #[error("Failed to load keypair: {0}")]
    KeypairLoad(String),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcClientError),

    #[error("Signing rejected: {0}")]
    Signing(#[from] SignerError),

    #[error("Wallet returned an unsigned transaction")]
    Unsigned,

    #[error("Transaction {0} was not confirmed in time")]
    ConfirmationTimeout(Signature),

    #[error("Transaction {signature} failed on chain: {reason}")]
    TransactionFailed { signature: Signature, reason: String },
}

/// Where a submitted signature stands on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainStatus {
    Confirmed,
    /// Landed but the transaction errored
    Failed(String),
    /// Not seen yet and its blockhash is still valid
    Pending,
    /// Not seen and its blockhash has expired, so it can never land
    Expired,
}

/// Capability set a payment needs from a wallet.
///
/// Signing and sending are separate so the signature can be recorded
/// before anything is broadcast.
#[allow(async_fn_in_trait)]
pub trait WalletAdapter {
    /// Opens the wallet and returns its address.
    async fn connect(&self) -> Result<Pubkey, WalletError>;

    async fn balance(&self, owner: &Pubkey) -> Result<u64, WalletError>;

    /// Sets a recent blockhash and signs as fee payer.
    async fn sign(&self, transaction: Transaction) -> Result<Transaction, WalletError>;

    /// Broadcasts a signed transaction. An error does not prove the
    /// transaction was never broadcast.
    async fn send(&self, transaction: &Transaction) -> Result<Signature, WalletError>;

    /// Waits until the signature is confirmed or the wallet gives up.
    async fn wait_for_confirmation(&self, signature: &Signature) -> Result<(), WalletError>;

    /// Single status check, no waiting. `recent_blockhash` lets the wallet
    /// tell a dropped transaction from one that is still in flight.
    async fn signature_status(
        &self,
        signature: &Signature,
        recent_blockhash: Option<&Hash>,
    ) -> Result<ChainStatus, WalletError>;
}

/// Fee payer signature of a signed transaction.
pub fn payer_signature(transaction: &Transaction) -> Result<Signature, WalletError> {
    transaction
        .signatures
        .first()
        .copied()
        .filter(|signature| *signature != Signature::default())
        .ok_or(WalletError::Unsigned)
}

/// Snapshot of the wallet connection shared with the payment flows and the
/// renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WalletState {
    pub connected: bool,
    pub address: Option<String>,
    pub balance_lamports: Option<u64>,
    pub network: String,
}

impl WalletState {
    pub fn balance_sol(&self) -> Option<f64> {
        self.balance_lamports.map(|lamports| lamports as f64 / 1_000_000_000.0)
    }
}

/// Process-wide wallet context.
pub struct WalletProvider<W> {
    adapter: W,
    network: String,
    state: RwLock<WalletState>,
    pubkey: RwLock<Option<Pubkey>>,
}

impl<W: WalletAdapter> WalletProvider<W> {
    pub fn new(adapter: W, network: impl Into<String>) -> Arc<Self> {
        let network = network.into();
        Arc::new(Self {
            adapter,
            state: RwLock::new(WalletState {
                network: network.clone(),
                ..WalletState::default()
            }),
            network,
            pubkey: RwLock::new(None),
        })
    }

    #[instrument(skip(self), fields(network = %self.network))]
    pub async fn connect(&self) -> Result<WalletState, WalletError> {
        let pubkey = self.adapter.connect().await?;
        let balance = match self.adapter.balance(&pubkey).await {
            Ok(lamports) => Some(lamports),
            Err(e) => {
                warn!(address = %pubkey, "Balance lookup failed: {}", e);
                None
            }
        };

        *self.pubkey.write().await = Some(pubkey);
        let mut state = self.state.write().await;
        state.connected = true;
        state.address = Some(pubkey.to_string());
        state.balance_lamports = balance;

        info!(address = %pubkey, balance_lamports = ?balance, "Wallet connected");
        Ok(state.clone())
    }

    pub async fn disconnect(&self) {
        *self.pubkey.write().await = None;
        let mut state = self.state.write().await;
        *state = WalletState {
            network: self.network.clone(),
            ..WalletState::default()
        };
        info!("Wallet disconnected");
    }

    pub async fn state(&self) -> WalletState {
        self.state.read().await.clone()
    }

    /// Connected address, or `NotConnected`.
    pub async fn pubkey(&self) -> Result<Pubkey, WalletError> {
        self.pubkey.read().await.ok_or(WalletError::NotConnected)
    }

    pub async fn refresh_balance(&self) -> Result<u64, WalletError> {
        let pubkey = self.pubkey().await?;
        let lamports = self.adapter.balance(&pubkey).await?;
        self.state.write().await.balance_lamports = Some(lamports);
        Ok(lamports)
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    /// Signing capability, available only while connected.
    pub async fn signer(&self) -> Result<&W, WalletError> {
        self.pubkey().await?;
        Ok(&self.adapter)
    }
}
