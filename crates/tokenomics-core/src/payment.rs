use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::PackageTier;

/// Hosted checkout session returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub url: String,
    pub session_id: String,
}

/// Raw checkout status as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutStatusResponse {
    pub status: String,
    pub payment_status: String,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutStatusResponse {
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }

    pub fn is_expired(&self) -> bool {
        self.status == "expired"
    }
}

/// Request for a wallet payment quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoPaymentRequest {
    pub wallet_address: String,
    pub package_id: PackageTier,
    pub network: String,
}

/// Where and how much to pay for a wallet payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoPaymentQuote {
    #[serde(alias = "address")]
    pub payment_address: String,
    /// Amount in SOL.
    pub amount: f64,
    #[serde(default)]
    pub amount_lamports: Option<u64>,
    pub session_id: String,
}

impl CryptoPaymentQuote {
    /// Quoted amount in lamports. An explicit lamport figure wins over the
    /// SOL amount.
    pub fn lamports(&self) -> u64 {
        self.amount_lamports
            .unwrap_or_else(|| (self.amount * 1_000_000_000.0).round() as u64)
    }
}

/// Proof of an on-chain payment reported back to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoPaymentConfirmation {
    pub session_id: String,
    pub transaction_hash: String,
    pub wallet_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAck {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_lamports_from_sol_amount() {
        let quote: CryptoPaymentQuote = serde_json::from_value(serde_json::json!({
            "address": "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin",
            "amount": 1.25,
            "session_id": "sol_1"
        }))
        .unwrap();
        assert_eq!(quote.lamports(), 1_250_000_000);

        let explicit = CryptoPaymentQuote { amount_lamports: Some(7), ..quote };
        assert_eq!(explicit.lamports(), 7);
    }

    #[test]
    fn test_checkout_status_flags() {
        let status: CheckoutStatusResponse = serde_json::from_value(serde_json::json!({
            "status": "complete",
            "payment_status": "paid",
            "amount_total": 7900,
            "currency": "usd"
        }))
        .unwrap();
        assert!(status.is_paid());
        assert!(!status.is_expired());
        assert!(status.metadata.is_empty());
    }
}
