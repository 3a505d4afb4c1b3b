//! Wallet payment: quote, native SOL transfer, confirmation and report.

use solana_sdk::{
    hash::Hash, pubkey::Pubkey, signature::Signature, system_instruction, transaction::Transaction,
};
use std::str::FromStr;
use tracing::{error, info, instrument, warn};

use tokenomics_core::{
    CryptoPaymentConfirmation, CryptoPaymentQuote, CryptoPaymentRequest, PackageTier, PaymentAck,
};

use super::ledger::{IntentStatus, LedgerError, PaymentIntent, PaymentLedger};
use crate::client::ClientError;
use crate::wallet::{payer_signature, ChainStatus, WalletAdapter, WalletError, WalletProvider};

/// Message shown to the user for any failed wallet payment.
pub const PAYMENT_FAILED_ALERT: &str = "Payment failed. Please try again.";

/// Backend calls the wallet payment path depends on.
#[allow(async_fn_in_trait)]
pub trait CryptoPaymentBackend {
    async fn create_crypto_payment(
        &self,
        request: &CryptoPaymentRequest,
    ) -> Result<CryptoPaymentQuote, ClientError>;

    async fn confirm_crypto_payment(
        &self,
        confirmation: &CryptoPaymentConfirmation,
    ) -> Result<PaymentAck, ClientError>;
}

#[derive(thiserror::Error, Debug)]
pub enum PaymentError {
    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("Payment quote failed: {0}")]
    Quote(#[source] ClientError),

    #[error("Invalid payment address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Quoted amount must be positive")]
    InvalidAmount,

    #[error("Insufficient balance: {balance} lamports available, {required} required")]
    InsufficientFunds { balance: u64, required: u64 },

    #[error("Transaction rejected: {0}")]
    Rejected(#[source] WalletError),

    #[error("Transaction {signature} submission failed: {source}")]
    Submission {
        signature: Signature,
        #[source]
        source: WalletError,
    },

    #[error("Transaction confirmation failed: {0}")]
    Confirmation(#[source] WalletError),

    #[error("Payment report failed: {0}")]
    Report(#[source] ClientError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Transaction {signature} was sent but the ledger update failed: {source}")]
    Untracked {
        signature: Signature,
        #[source]
        source: LedgerError,
    },
}

impl PaymentError {
    /// Single user-facing alert; the variant only matters for logs.
    pub fn alert(&self) -> &'static str {
        PAYMENT_FAILED_ALERT
    }

    /// Signature of a transfer that may have moved funds despite the error.
    pub fn signature(&self) -> Option<Signature> {
        match self {
            PaymentError::Submission { signature, .. } | PaymentError::Untracked { signature, .. } => {
                Some(*signature)
            }
            _ => None,
        }
    }
}

/// A completed wallet payment.
#[derive(Debug, Clone)]
pub struct WalletPayment {
    pub intent: PaymentIntent,
    pub signature: Signature,
    pub ack: PaymentAck,
}

/// Outcome of re-reporting stranded intents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResumeReport {
    pub reported: Vec<String>,
    /// Signature not yet visible as confirmed
    pub pending: Vec<String>,
    /// Failed on chain or expired; marked failed in the ledger
    pub abandoned: Vec<(String, String)>,
    /// Check or report errored this run; still awaiting a report
    pub failed: Vec<(String, String)>,
}

fn untracked(signature: Signature, source: LedgerError) -> PaymentError {
    error!(signature = %signature, "Ledger update failed after the transfer was sent: {}", source);
    PaymentError::Untracked { signature, source }
}

/// One native transfer of exactly `lamports` from payer to recipient.
pub fn build_transfer(payer: &Pubkey, recipient: &Pubkey, lamports: u64) -> Transaction {
    let instruction = system_instruction::transfer(payer, recipient, lamports);
    Transaction::new_with_payer(&[instruction], Some(payer))
}

pub struct WalletCheckout<'a, B, W> {
    backend: &'a B,
    wallet: &'a WalletProvider<W>,
    ledger: &'a PaymentLedger,
}

impl<'a, B, W> WalletCheckout<'a, B, W>
where
    B: CryptoPaymentBackend,
    W: WalletAdapter,
{
    pub fn new(backend: &'a B, wallet: &'a WalletProvider<W>, ledger: &'a PaymentLedger) -> Self {
        Self { backend, wallet, ledger }
    }

    /// Runs the whole wallet payment for a package. Nothing is retried.
    #[instrument(skip(self))]
    pub async fn pay(&self, package: PackageTier) -> Result<WalletPayment, PaymentError> {
        let payer = self
            .wallet
            .pubkey()
            .await
            .map_err(|_| PaymentError::WalletNotConnected)?;
        let wallet_address = payer.to_string();

        let request = CryptoPaymentRequest {
            wallet_address: wallet_address.clone(),
            package_id: package,
            network: self.wallet.network().to_string(),
        };
        let quote = self
            .backend
            .create_crypto_payment(&request)
            .await
            .map_err(PaymentError::Quote)?;

        let recipient = Pubkey::from_str(&quote.payment_address).map_err(|e| {
            PaymentError::InvalidAddress {
                address: quote.payment_address.clone(),
                reason: e.to_string(),
            }
        })?;

        let lamports = quote.lamports();
        if lamports == 0 {
            return Err(PaymentError::InvalidAmount);
        }
        if lamports != package.lamports() {
            warn!(
                quoted = lamports,
                listed = package.lamports(),
                "Backend quote differs from the listed package price"
            );
        }

        if let Some(balance) = self.wallet.state().await.balance_lamports {
            if balance < lamports {
                return Err(PaymentError::InsufficientFunds {
                    balance,
                    required: lamports,
                });
            }
        }

        let intent = self
            .ledger
            .record_quote(package, &wallet_address, self.wallet.network(), &quote)?;

        let signer = self
            .wallet
            .signer()
            .await
            .map_err(|_| PaymentError::WalletNotConnected)?;

        let transaction = build_transfer(&payer, &recipient, lamports);
        let signed = match signer.sign(transaction).await {
            Ok(signed) => signed,
            Err(e) => {
                error!(intent_id = %intent.id, "Wallet rejected payment: {}", e);
                self.ledger.mark_failed(&intent.id, &e.to_string())?;
                return Err(PaymentError::Rejected(e));
            }
        };
        let signature = match payer_signature(&signed) {
            Ok(signature) => signature,
            Err(e) => {
                self.ledger.mark_failed(&intent.id, &e.to_string())?;
                return Err(PaymentError::Rejected(e));
            }
        };

        // Nothing is broadcast unless the signature is on disk.
        self.ledger.mark_submitted(
            &intent.id,
            &signature.to_string(),
            &signed.message.recent_blockhash.to_string(),
        )?;

        if let Err(e) = signer.send(&signed).await {
            error!(
                intent_id = %intent.id,
                signature = %signature,
                "Payment submission failed, left for resume: {}",
                e
            );
            return Err(PaymentError::Submission { signature, source: e });
        }
        info!(intent_id = %intent.id, signature = %signature, lamports, "Payment submitted");

        if let Err(e) = signer.wait_for_confirmation(&signature).await {
            error!(signature = %signature, "Payment confirmation failed: {}", e);
            if matches!(e, WalletError::TransactionFailed { .. }) {
                self.ledger
                    .mark_failed(&intent.id, &e.to_string())
                    .map_err(|source| untracked(signature, source))?;
            }
            return Err(PaymentError::Confirmation(e));
        }
        self.ledger
            .mark_confirmed(&intent.id)
            .map_err(|source| untracked(signature, source))?;

        let ack = self.report(&intent, &signature.to_string()).await?;
        let intent = self
            .ledger
            .mark_reported(&intent.id)
            .map_err(|source| untracked(signature, source))?;

        if let Err(e) = self.wallet.refresh_balance().await {
            warn!("Balance refresh after payment failed: {}", e);
        }

        info!(
            intent_id = %intent.id,
            session_id = %intent.session_id,
            status = %ack.status,
            "Wallet payment completed"
        );
        Ok(WalletPayment { intent, signature, ack })
    }

    /// Re-reports intents that were submitted or confirmed but never
    /// acknowledged by the backend.
    #[instrument(skip(self))]
    pub async fn resume(&self) -> Result<ResumeReport, PaymentError> {
        let signer = self
            .wallet
            .signer()
            .await
            .map_err(|_| PaymentError::WalletNotConnected)?;
        let mut report = ResumeReport::default();

        for intent in self.ledger.unreported() {
            let Some(signature_str) = intent.signature.clone() else {
                continue;
            };

            if intent.status == IntentStatus::Submitted {
                let signature = match Signature::from_str(&signature_str) {
                    Ok(signature) => signature,
                    Err(e) => {
                        report.failed.push((intent.id.clone(), e.to_string()));
                        continue;
                    }
                };
                let blockhash = intent
                    .recent_blockhash
                    .as_deref()
                    .and_then(|hash| Hash::from_str(hash).ok());

                match signer.signature_status(&signature, blockhash.as_ref()).await {
                    Ok(ChainStatus::Confirmed) => {
                        self.ledger.mark_confirmed(&intent.id)?;
                    }
                    Ok(ChainStatus::Pending) => {
                        report.pending.push(intent.id.clone());
                        continue;
                    }
                    Ok(ChainStatus::Failed(reason)) => {
                        warn!(intent_id = %intent.id, "Payment failed on chain: {}", reason);
                        self.ledger.mark_failed(&intent.id, &reason)?;
                        report.abandoned.push((intent.id.clone(), reason));
                        continue;
                    }
                    Ok(ChainStatus::Expired) => {
                        let reason = "blockhash expired before the transaction landed".to_string();
                        warn!(intent_id = %intent.id, "{}", reason);
                        self.ledger.mark_failed(&intent.id, &reason)?;
                        report.abandoned.push((intent.id.clone(), reason));
                        continue;
                    }
                    Err(e) => {
                        report.failed.push((intent.id.clone(), e.to_string()));
                        continue;
                    }
                }
            }

            match self.report(&intent, &signature_str).await {
                Ok(_) => {
                    self.ledger.mark_reported(&intent.id)?;
                    report.reported.push(intent.id.clone());
                }
                Err(e) => report.failed.push((intent.id.clone(), e.to_string())),
            }
        }

        info!(
            reported = report.reported.len(),
            pending = report.pending.len(),
            abandoned = report.abandoned.len(),
            failed = report.failed.len(),
            "Stranded payments processed"
        );
        Ok(report)
    }

    async fn report(&self, intent: &PaymentIntent, signature: &str) -> Result<PaymentAck, PaymentError> {
        let confirmation = CryptoPaymentConfirmation {
            session_id: intent.session_id.clone(),
            transaction_hash: signature.to_string(),
            wallet_address: intent.wallet_address.clone(),
        };

        self.backend
            .confirm_crypto_payment(&confirmation)
            .await
            .map_err(|e| {
                error!(intent_id = %intent.id, "Payment report failed: {}", e);
                PaymentError::Report(e)
            })
    }
}
