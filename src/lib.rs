// Configuration
pub mod config;

// Form collection and request shaping
pub mod form;

// Backend client (generation requestor)
pub mod client;

// Results rendering
pub mod render;

// Payment orchestration
pub mod payment;

// Wallet provider
pub mod wallet;

// Re-export commonly used types for convenience
pub use client::{BackendClient, ClientError};
pub use config::Config;
pub use form::{FormError, FormState};
pub use payment::{CheckoutPoller, CheckoutState, PaymentLedger, WalletCheckout};
pub use tokenomics_core::*;
pub use wallet::{KeypairWallet, WalletProvider, WalletState};
