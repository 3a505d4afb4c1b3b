//! Wallet provider: connection state, balance and the sign-and-send
//! capability used by wallet payments.

pub mod keypair;
pub mod provider;

pub use keypair::KeypairWallet;
pub use provider::{
    payer_signature, ChainStatus, WalletAdapter, WalletError, WalletProvider, WalletState,
};
