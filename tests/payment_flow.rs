use solana_client::client_error::ClientErrorKind;
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    signer::SignerError,
    system_instruction::SystemInstruction,
    transaction::Transaction,
};
use std::path::PathBuf;
use std::sync::Mutex;

use tokenomics_studio::client::ClientError;
use tokenomics_studio::payment::{
    CryptoPaymentBackend, IntentStatus, PaymentError, PaymentLedger, WalletCheckout,
    PAYMENT_FAILED_ALERT,
};
use tokenomics_studio::wallet::{ChainStatus, WalletAdapter, WalletError, WalletProvider};
use tokenomics_studio::{
    CryptoPaymentConfirmation, CryptoPaymentQuote, CryptoPaymentRequest, PackageTier, PaymentAck,
};

struct MockBackend {
    payment_address: String,
    amount: f64,
    failing_reports: Mutex<u32>,
    requests: Mutex<Vec<CryptoPaymentRequest>>,
    confirmations: Mutex<Vec<CryptoPaymentConfirmation>>,
}

impl MockBackend {
    fn new(payment_address: String, amount: f64) -> Self {
        Self {
            payment_address,
            amount,
            failing_reports: Mutex::new(0),
            requests: Mutex::new(Vec::new()),
            confirmations: Mutex::new(Vec::new()),
        }
    }

    fn fail_next_reports(&self, count: u32) {
        *self.failing_reports.lock().unwrap() = count;
    }
}

impl CryptoPaymentBackend for MockBackend {
    async fn create_crypto_payment(
        &self,
        request: &CryptoPaymentRequest,
    ) -> Result<CryptoPaymentQuote, ClientError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(CryptoPaymentQuote {
            payment_address: self.payment_address.clone(),
            amount: self.amount,
            amount_lamports: None,
            session_id: "sol_session_42".to_string(),
        })
    }

    async fn confirm_crypto_payment(
        &self,
        confirmation: &CryptoPaymentConfirmation,
    ) -> Result<PaymentAck, ClientError> {
        let mut failing = self.failing_reports.lock().unwrap();
        if *failing > 0 {
            *failing -= 1;
            return Err(ClientError::from_status(502, "bad gateway"));
        }
        self.confirmations.lock().unwrap().push(confirmation.clone());
        Ok(PaymentAck {
            status: "success".to_string(),
            message: None,
        })
    }
}

#[derive(Clone, Copy, PartialEq)]
enum SendMode {
    Ok,
    /// Broadcasts, then loses the RPC response
    BroadcastThenError,
}

#[derive(Clone, Copy, PartialEq)]
enum ConfirmMode {
    Ok,
    TimesOut,
    FailsOnChain,
}

struct MockWallet {
    keypair: Keypair,
    balance: u64,
    reject: bool,
    send: SendMode,
    confirm: ConfirmMode,
    chain_status: Mutex<ChainStatus>,
    /// Removed while confirmation is awaited, so later ledger writes fail
    doomed_dir: Option<PathBuf>,
    sent: Mutex<Vec<Transaction>>,
}

impl MockWallet {
    fn funded(balance: u64) -> Self {
        Self {
            keypair: Keypair::new(),
            balance,
            reject: false,
            send: SendMode::Ok,
            confirm: ConfirmMode::Ok,
            chain_status: Mutex::new(ChainStatus::Confirmed),
            doomed_dir: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::funded(10_000_000_000)
        }
    }

    fn set_chain_status(&self, status: ChainStatus) {
        *self.chain_status.lock().unwrap() = status;
    }

    fn sent(&self) -> Vec<Transaction> {
        self.sent.lock().unwrap().clone()
    }
}

impl WalletAdapter for MockWallet {
    async fn connect(&self) -> Result<Pubkey, WalletError> {
        Ok(self.keypair.pubkey())
    }

    async fn balance(&self, _owner: &Pubkey) -> Result<u64, WalletError> {
        Ok(self.balance)
    }

    async fn sign(&self, mut transaction: Transaction) -> Result<Transaction, WalletError> {
        if self.reject {
            return Err(WalletError::Signing(SignerError::UserCancel(
                "User rejected the request".to_string(),
            )));
        }
        transaction.try_sign(&[&self.keypair], Hash::new_unique())?;
        Ok(transaction)
    }

    async fn send(&self, transaction: &Transaction) -> Result<Signature, WalletError> {
        self.sent.lock().unwrap().push(transaction.clone());
        match self.send {
            SendMode::Ok => Ok(transaction.signatures[0]),
            SendMode::BroadcastThenError => Err(WalletError::Rpc(
                ClientErrorKind::Custom("rpc response lost after broadcast".to_string()).into(),
            )),
        }
    }

    async fn wait_for_confirmation(&self, signature: &Signature) -> Result<(), WalletError> {
        if let Some(dir) = &self.doomed_dir {
            std::fs::remove_dir_all(dir).unwrap();
        }
        match self.confirm {
            ConfirmMode::Ok => Ok(()),
            ConfirmMode::TimesOut => Err(WalletError::ConfirmationTimeout(*signature)),
            ConfirmMode::FailsOnChain => Err(WalletError::TransactionFailed {
                signature: *signature,
                reason: "custom program error: 0x1".to_string(),
            }),
        }
    }

    async fn signature_status(
        &self,
        _signature: &Signature,
        _recent_blockhash: Option<&Hash>,
    ) -> Result<ChainStatus, WalletError> {
        Ok(self.chain_status.lock().unwrap().clone())
    }
}

fn transferred_lamports(transaction: &Transaction) -> u64 {
    let instruction = &transaction.message.instructions[0];
    match bincode::deserialize::<SystemInstruction>(&instruction.data).unwrap() {
        SystemInstruction::Transfer { lamports } => lamports,
        other => panic!("unexpected instruction: {:?}", other),
    }
}

#[tokio::test]
async fn test_wallet_payment_sends_quoted_amount_and_reports() {
    let recipient = Pubkey::new_unique();
    let backend = MockBackend::new(recipient.to_string(), 1.25);
    let wallet = WalletProvider::new(MockWallet::funded(5_000_000_000), "devnet");
    wallet.connect().await.unwrap();
    let ledger = PaymentLedger::in_memory();

    let payment = WalletCheckout::new(&backend, wallet.as_ref(), &ledger)
        .pay(PackageTier::Pro)
        .await
        .unwrap();

    let request = backend.requests.lock().unwrap()[0].clone();
    assert_eq!(request.package_id, PackageTier::Pro);
    assert_eq!(request.network, "devnet");

    let sent = wallet.signer().await.unwrap().sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(transferred_lamports(&sent[0]), 1_250_000_000);
    assert!(sent[0].message.account_keys.contains(&recipient));

    let confirmations = backend.confirmations.lock().unwrap().clone();
    assert_eq!(confirmations.len(), 1);
    assert_eq!(confirmations[0].session_id, "sol_session_42");
    assert_eq!(confirmations[0].transaction_hash, payment.signature.to_string());
    assert_eq!(confirmations[0].wallet_address, request.wallet_address);

    assert_eq!(payment.signature, sent[0].signatures[0]);
    assert_eq!(payment.intent.status, IntentStatus::Reported);
    assert_eq!(ledger.all().len(), 1);
    assert!(ledger.unreported().is_empty());
}

#[tokio::test]
async fn test_disconnected_wallet_never_requests_quote() {
    let backend = MockBackend::new(Pubkey::new_unique().to_string(), 0.5);
    let wallet = WalletProvider::new(MockWallet::funded(5_000_000_000), "devnet");
    let ledger = PaymentLedger::in_memory();

    let err = WalletCheckout::new(&backend, wallet.as_ref(), &ledger)
        .pay(PackageTier::Basic)
        .await
        .unwrap_err();

    assert!(matches!(err, PaymentError::WalletNotConnected));
    assert!(backend.requests.lock().unwrap().is_empty());
    assert!(ledger.all().is_empty());
}

#[tokio::test]
async fn test_rejected_signature_marks_intent_failed() {
    let backend = MockBackend::new(Pubkey::new_unique().to_string(), 0.5);
    let wallet = WalletProvider::new(MockWallet::rejecting(), "devnet");
    wallet.connect().await.unwrap();
    let ledger = PaymentLedger::in_memory();

    let err = WalletCheckout::new(&backend, wallet.as_ref(), &ledger)
        .pay(PackageTier::Basic)
        .await
        .unwrap_err();

    assert!(matches!(err, PaymentError::Rejected(_)));
    assert_eq!(err.alert(), PAYMENT_FAILED_ALERT);
    assert!(backend.confirmations.lock().unwrap().is_empty());

    let intents = ledger.all();
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].status, IntentStatus::Failed);
    assert!(intents[0].failure_reason.as_deref().unwrap().contains("User rejected"));
}

#[tokio::test]
async fn test_insufficient_balance_stops_before_signing() {
    let backend = MockBackend::new(Pubkey::new_unique().to_string(), 3.0);
    let wallet = WalletProvider::new(MockWallet::funded(100_000_000), "devnet");
    wallet.connect().await.unwrap();
    let ledger = PaymentLedger::in_memory();

    let err = WalletCheckout::new(&backend, wallet.as_ref(), &ledger)
        .pay(PackageTier::Premium)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PaymentError::InsufficientFunds { balance: 100_000_000, required: 3_000_000_000 }
    ));
    assert!(wallet.signer().await.unwrap().sent().is_empty());
    assert!(ledger.all().is_empty());
}

#[tokio::test]
async fn test_malformed_payment_address_is_rejected() {
    let backend = MockBackend::new("not-a-solana-address".to_string(), 0.5);
    let wallet = WalletProvider::new(MockWallet::funded(5_000_000_000), "devnet");
    wallet.connect().await.unwrap();
    let ledger = PaymentLedger::in_memory();

    let err = WalletCheckout::new(&backend, wallet.as_ref(), &ledger)
        .pay(PackageTier::Basic)
        .await
        .unwrap_err();

    assert!(matches!(err, PaymentError::InvalidAddress { .. }));
    assert!(wallet.signer().await.unwrap().sent().is_empty());
}

#[tokio::test]
async fn test_lost_report_is_recovered_by_resume() {
    let backend = MockBackend::new(Pubkey::new_unique().to_string(), 0.5);
    backend.fail_next_reports(1);
    let wallet = WalletProvider::new(MockWallet::funded(5_000_000_000), "devnet");
    wallet.connect().await.unwrap();
    let ledger = PaymentLedger::in_memory();
    let flow = WalletCheckout::new(&backend, wallet.as_ref(), &ledger);

    let err = flow.pay(PackageTier::Basic).await.unwrap_err();
    assert!(matches!(err, PaymentError::Report(_)));

    let stranded = ledger.unreported();
    assert_eq!(stranded.len(), 1);
    assert_eq!(stranded[0].status, IntentStatus::Confirmed);

    let summary = flow.resume().await.unwrap();
    assert_eq!(summary.reported, vec![stranded[0].id.clone()]);
    assert!(summary.pending.is_empty());
    assert!(summary.failed.is_empty());

    assert_eq!(ledger.get(&stranded[0].id).unwrap().status, IntentStatus::Reported);
    assert_eq!(backend.confirmations.lock().unwrap().len(), 1);
}

fn provider(wallet: MockWallet) -> std::sync::Arc<WalletProvider<MockWallet>> {
    WalletProvider::new(wallet, "devnet")
}

#[tokio::test]
async fn test_lost_send_response_is_recovered_by_resume() {
    let backend = MockBackend::new(Pubkey::new_unique().to_string(), 0.5);
    let wallet = provider(MockWallet {
        send: SendMode::BroadcastThenError,
        ..MockWallet::funded(5_000_000_000)
    });
    wallet.connect().await.unwrap();
    let ledger = PaymentLedger::in_memory();
    let flow = WalletCheckout::new(&backend, wallet.as_ref(), &ledger);

    let err = flow.pay(PackageTier::Basic).await.unwrap_err();
    let sent = wallet.signer().await.unwrap().sent();
    assert_eq!(sent.len(), 1);
    assert!(matches!(err, PaymentError::Submission { .. }));
    assert_eq!(err.signature(), Some(sent[0].signatures[0]));

    let stranded = ledger.unreported();
    assert_eq!(stranded.len(), 1);
    assert_eq!(stranded[0].status, IntentStatus::Submitted);
    assert_eq!(stranded[0].signature, Some(sent[0].signatures[0].to_string()));
    assert_eq!(
        stranded[0].recent_blockhash,
        Some(sent[0].message.recent_blockhash.to_string())
    );

    let summary = flow.resume().await.unwrap();
    assert_eq!(summary.reported, vec![stranded[0].id.clone()]);
    assert_eq!(ledger.get(&stranded[0].id).unwrap().status, IntentStatus::Reported);

    let confirmations = backend.confirmations.lock().unwrap().clone();
    assert_eq!(confirmations[0].transaction_hash, sent[0].signatures[0].to_string());
}

#[tokio::test]
async fn test_confirmation_timeout_stays_submitted_until_resume_confirms() {
    let backend = MockBackend::new(Pubkey::new_unique().to_string(), 0.5);
    let wallet = provider(MockWallet {
        confirm: ConfirmMode::TimesOut,
        ..MockWallet::funded(5_000_000_000)
    });
    wallet.connect().await.unwrap();
    let ledger = PaymentLedger::in_memory();
    let flow = WalletCheckout::new(&backend, wallet.as_ref(), &ledger);

    let err = flow.pay(PackageTier::Basic).await.unwrap_err();
    assert!(matches!(err, PaymentError::Confirmation(WalletError::ConfirmationTimeout(_))));
    let id = ledger.unreported()[0].id.clone();
    assert_eq!(ledger.get(&id).unwrap().status, IntentStatus::Submitted);

    wallet.signer().await.unwrap().set_chain_status(ChainStatus::Pending);
    let summary = flow.resume().await.unwrap();
    assert_eq!(summary.pending, vec![id.clone()]);
    assert!(summary.reported.is_empty());
    assert_eq!(ledger.get(&id).unwrap().status, IntentStatus::Submitted);
    assert!(backend.confirmations.lock().unwrap().is_empty());

    wallet.signer().await.unwrap().set_chain_status(ChainStatus::Confirmed);
    let summary = flow.resume().await.unwrap();
    assert_eq!(summary.reported, vec![id.clone()]);
    assert_eq!(ledger.get(&id).unwrap().status, IntentStatus::Reported);
}

#[tokio::test]
async fn test_on_chain_failure_marks_intent_failed() {
    let backend = MockBackend::new(Pubkey::new_unique().to_string(), 0.5);
    let wallet = provider(MockWallet {
        confirm: ConfirmMode::FailsOnChain,
        ..MockWallet::funded(5_000_000_000)
    });
    wallet.connect().await.unwrap();
    let ledger = PaymentLedger::in_memory();

    let err = WalletCheckout::new(&backend, wallet.as_ref(), &ledger)
        .pay(PackageTier::Basic)
        .await
        .unwrap_err();

    assert!(matches!(err, PaymentError::Confirmation(WalletError::TransactionFailed { .. })));
    let intents = ledger.all();
    assert_eq!(intents[0].status, IntentStatus::Failed);
    assert!(intents[0].failure_reason.as_deref().unwrap().contains("0x1"));
    assert!(ledger.unreported().is_empty());
    assert!(backend.confirmations.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_resume_closes_failed_and_expired_transfers() {
    let backend = MockBackend::new(Pubkey::new_unique().to_string(), 0.5);
    let wallet = provider(MockWallet {
        confirm: ConfirmMode::TimesOut,
        ..MockWallet::funded(5_000_000_000)
    });
    wallet.connect().await.unwrap();
    let ledger = PaymentLedger::in_memory();
    let flow = WalletCheckout::new(&backend, wallet.as_ref(), &ledger);

    flow.pay(PackageTier::Basic).await.unwrap_err();
    flow.pay(PackageTier::Basic).await.unwrap_err();
    let ids: Vec<String> = ledger.unreported().into_iter().map(|intent| intent.id).collect();
    assert_eq!(ids.len(), 2);

    let signer = wallet.signer().await.unwrap();
    signer.set_chain_status(ChainStatus::Failed("insufficient funds for fee".to_string()));
    let summary = flow.resume().await.unwrap();
    assert_eq!(summary.abandoned.len(), 2);
    assert!(summary.pending.is_empty());
    assert!(ledger.unreported().is_empty());
    for id in &ids {
        let intent = ledger.get(id).unwrap();
        assert_eq!(intent.status, IntentStatus::Failed);
        assert_eq!(intent.failure_reason.as_deref(), Some("insufficient funds for fee"));
    }

    flow.pay(PackageTier::Basic).await.unwrap_err();
    signer.set_chain_status(ChainStatus::Expired);
    let summary = flow.resume().await.unwrap();
    assert_eq!(summary.abandoned.len(), 1);
    assert!(ledger.unreported().is_empty());
    assert!(backend.confirmations.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_ledger_failure_after_send_surfaces_signature() {
    let dir = tempfile::tempdir().unwrap();
    let ledger_dir = dir.path().join("ledger");
    std::fs::create_dir(&ledger_dir).unwrap();

    let backend = MockBackend::new(Pubkey::new_unique().to_string(), 0.5);
    let wallet = provider(MockWallet {
        doomed_dir: Some(ledger_dir.clone()),
        ..MockWallet::funded(5_000_000_000)
    });
    wallet.connect().await.unwrap();
    let ledger = PaymentLedger::open(ledger_dir.join("intents.json")).unwrap();

    let err = WalletCheckout::new(&backend, wallet.as_ref(), &ledger)
        .pay(PackageTier::Basic)
        .await
        .unwrap_err();

    let sent = wallet.signer().await.unwrap().sent();
    assert!(matches!(err, PaymentError::Untracked { .. }));
    assert_eq!(err.signature(), Some(sent[0].signatures[0]));

    let intent = &ledger.all()[0];
    assert_eq!(intent.status, IntentStatus::Submitted);
    assert_eq!(intent.signature, Some(sent[0].signatures[0].to_string()));
}
