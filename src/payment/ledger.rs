//! Persisted wallet payment intents
//!
//! Every wallet payment is written down before the wallet is asked to sign,
//! and advanced after each step. A payment that landed on chain but whose
//! report to the backend was lost stays `Submitted`/`Confirmed` and can be
//! re-reported later.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use tokenomics_core::{CryptoPaymentQuote, PackageTier};

#[derive(thiserror::Error, Debug)]
pub enum LedgerError {
    #[error("Ledger I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ledger serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown payment intent: {0}")]
    UnknownIntent(String),

    #[error("Payment intent {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: IntentStatus,
        to: IntentStatus,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    /// Backend quoted an amount; nothing signed yet
    Quoted,
    /// Transaction sent, signature known
    Submitted,
    /// Confirmed on chain
    Confirmed,
    /// Backend acknowledged the signature
    Reported,
    Failed,
}

impl IntentStatus {
    fn can_move_to(self, next: IntentStatus) -> bool {
        use IntentStatus::*;
        matches!(
            (self, next),
            (Quoted, Submitted)
                | (Submitted, Confirmed)
                | (Confirmed, Reported)
                | (Quoted, Failed)
                | (Submitted, Failed)
                | (Confirmed, Failed)
        )
    }

    /// Paid on chain (or possibly paid) but not yet acknowledged.
    pub fn awaits_report(self) -> bool {
        matches!(self, IntentStatus::Submitted | IntentStatus::Confirmed)
    }
}

impl fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IntentStatus::Quoted => "quoted",
            IntentStatus::Submitted => "submitted",
            IntentStatus::Confirmed => "confirmed",
            IntentStatus::Reported => "reported",
            IntentStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub session_id: String,
    pub package: PackageTier,
    pub wallet_address: String,
    pub payment_address: String,
    pub lamports: u64,
    pub network: String,
    pub status: IntentStatus,
    pub signature: Option<String>,
    /// Blockhash the transaction was signed against
    #[serde(default)]
    pub recent_blockhash: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct PaymentLedger {
    path: Option<PathBuf>,
    intents: DashMap<String, PaymentIntent>,
}

impl PaymentLedger {
    /// Ledger without a backing file.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            intents: DashMap::new(),
        }
    }

    /// Opens the ledger at `path`, loading existing intents if the file exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        let intents = DashMap::new();

        if path.exists() {
            let content = fs::read_to_string(&path)?;
            if !content.trim().is_empty() {
                let stored: Vec<PaymentIntent> = serde_json::from_str(&content)?;
                for intent in stored {
                    intents.insert(intent.id.clone(), intent);
                }
            }
            debug!(path = %path.display(), count = intents.len(), "Payment ledger loaded");
        }

        Ok(Self {
            path: Some(path),
            intents,
        })
    }

    /// Records a fresh quote before anything is signed.
    pub fn record_quote(
        &self,
        package: PackageTier,
        wallet_address: &str,
        network: &str,
        quote: &CryptoPaymentQuote,
    ) -> Result<PaymentIntent, LedgerError> {
        let now = Utc::now();
        let intent = PaymentIntent {
            id: generate_intent_id(),
            session_id: quote.session_id.clone(),
            package,
            wallet_address: wallet_address.to_string(),
            payment_address: quote.payment_address.clone(),
            lamports: quote.lamports(),
            network: network.to_string(),
            status: IntentStatus::Quoted,
            signature: None,
            recent_blockhash: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        };

        self.persist_with(&intent)?;
        self.intents.insert(intent.id.clone(), intent.clone());
        info!(intent_id = %intent.id, session_id = %intent.session_id, lamports = intent.lamports, "Payment intent recorded");
        Ok(intent)
    }

    /// Records the signature of a signed transaction. Called before the
    /// transaction is broadcast.
    pub fn mark_submitted(
        &self,
        id: &str,
        signature: &str,
        recent_blockhash: &str,
    ) -> Result<PaymentIntent, LedgerError> {
        self.transition(id, IntentStatus::Submitted, |intent| {
            intent.signature = Some(signature.to_string());
            intent.recent_blockhash = Some(recent_blockhash.to_string());
        })
    }

    pub fn mark_confirmed(&self, id: &str) -> Result<PaymentIntent, LedgerError> {
        self.transition(id, IntentStatus::Confirmed, |_| {})
    }

    pub fn mark_reported(&self, id: &str) -> Result<PaymentIntent, LedgerError> {
        self.transition(id, IntentStatus::Reported, |_| {})
    }

    pub fn mark_failed(&self, id: &str, reason: &str) -> Result<PaymentIntent, LedgerError> {
        self.transition(id, IntentStatus::Failed, |intent| {
            intent.failure_reason = Some(reason.to_string());
        })
    }

    pub fn get(&self, id: &str) -> Option<PaymentIntent> {
        self.intents.get(id).map(|entry| entry.value().clone())
    }

    /// All intents, oldest first.
    pub fn all(&self) -> Vec<PaymentIntent> {
        let mut intents: Vec<_> = self.intents.iter().map(|entry| entry.value().clone()).collect();
        intents.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        intents
    }

    /// Intents with a signature that the backend has not acknowledged.
    pub fn unreported(&self) -> Vec<PaymentIntent> {
        self.all()
            .into_iter()
            .filter(|intent| intent.status.awaits_report())
            .collect()
    }

    /// Applies a status change. The file is written before the in-memory
    /// entry changes, so a failed write leaves both at the old state.
    fn transition<F>(&self, id: &str, next: IntentStatus, update: F) -> Result<PaymentIntent, LedgerError>
    where
        F: FnOnce(&mut PaymentIntent),
    {
        let mut intent = self
            .get(id)
            .ok_or_else(|| LedgerError::UnknownIntent(id.to_string()))?;

        if !intent.status.can_move_to(next) {
            return Err(LedgerError::InvalidTransition {
                id: id.to_string(),
                from: intent.status,
                to: next,
            });
        }

        update(&mut intent);
        intent.status = next;
        intent.updated_at = Utc::now();

        self.persist_with(&intent)?;
        self.intents.insert(id.to_string(), intent.clone());
        debug!(intent_id = %id, status = %next, "Payment intent updated");
        Ok(intent)
    }

    /// Writes the current snapshot with `pending` in place of its stored
    /// version.
    fn persist_with(&self, pending: &PaymentIntent) -> Result<(), LedgerError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut snapshot: Vec<_> = self
            .all()
            .into_iter()
            .filter(|intent| intent.id != pending.id)
            .collect();
        snapshot.push(pending.clone());
        snapshot.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        let content = serde_json::to_string_pretty(&snapshot)?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, content)?;
        if let Err(e) = fs::rename(&tmp_path, path) {
            warn!(path = %path.display(), "Atomic ledger rename failed: {}", e);
            return Err(e.into());
        }
        Ok(())
    }
}

fn generate_intent_id() -> String {
    let random: [u8; 6] = rand::random();
    format!("intent_{}_{}", Utc::now().timestamp_millis(), hex::encode(random))
}
