//! Payment orchestration
//!
//! Two independent paths: a hosted card checkout with bounded status
//! polling, and a native SOL transfer signed by the connected wallet and
//! tracked in the payment ledger.

pub mod checkout;
pub mod crypto;
pub mod ledger;

pub use checkout::{CheckoutBackend, CheckoutPoller, CheckoutState, PollOutcome};
pub use crypto::{
    build_transfer, CryptoPaymentBackend, PaymentError, ResumeReport, WalletCheckout, WalletPayment,
    PAYMENT_FAILED_ALERT,
};
pub use ledger::{IntentStatus, LedgerError, PaymentIntent, PaymentLedger};
