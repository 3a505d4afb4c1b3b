use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::fmt::Display;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tokenomics_studio::config::{self, Config};
use tokenomics_studio::form::{templates, FormState};
use tokenomics_studio::payment::{
    checkout::{self, CheckoutPoller, CheckoutState},
    PaymentLedger, WalletCheckout, PAYMENT_FAILED_ALERT,
};
use tokenomics_studio::render::{self, chart, report};
use tokenomics_studio::wallet::{KeypairWallet, WalletProvider, WalletState};
use tokenomics_studio::{BackendClient, PackageTier};

const USAGE: &str = "\
Usage: tokenomics <command>

Commands:
  templates                      List form templates
  generate <form.toml> [--out <dir>]
                                 Generate tokenomics from a form file
  project <id>                   Show a generated project
  pdf <id> <dir>                 Export the rendered document
  checkout <basic|pro|premium>   Start a hosted card checkout
  status <session_id|return_url> Poll a checkout session
  wallet                         Show wallet address and balance
  pay <basic|pro|premium>        Pay with the configured Solana wallet
  resume                         Re-report wallet payments the backend never acknowledged";

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Templates,
    Generate { form: PathBuf, out: Option<PathBuf> },
    Project { id: String },
    Pdf { id: String, dir: PathBuf },
    Checkout { package: PackageTier },
    Status { session: String },
    Wallet,
    Pay { package: PackageTier },
    Resume,
    Help,
}

impl Command {
    fn parse(args: &[String]) -> Result<Self> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        let command = match args.as_slice() {
            [] | ["help"] | ["--help"] | ["-h"] => Command::Help,
            ["templates"] => Command::Templates,
            ["generate", form] => Command::Generate { form: PathBuf::from(form), out: None },
            ["generate", form, "--out", dir] => Command::Generate {
                form: PathBuf::from(form),
                out: Some(PathBuf::from(dir)),
            },
            ["project", id] => Command::Project { id: id.to_string() },
            ["pdf", id, dir] => Command::Pdf { id: id.to_string(), dir: PathBuf::from(dir) },
            ["checkout", package] => Command::Checkout { package: package.parse()? },
            ["status", session] => Command::Status { session: session.to_string() },
            ["wallet"] => Command::Wallet,
            ["pay", package] => Command::Pay { package: package.parse()? },
            ["resume"] => Command::Resume,
            _ => bail!("Unrecognized arguments: {}\n\n{}", args.join(" "), USAGE),
        };
        Ok(command)
    }
}

fn init_tracing(logging: &config::Logging) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&logging.directory)
        .with_context(|| format!("Failed to create log directory: {}", logging.directory))?;

    let file_appender = tracing_appender::rolling::daily(&logging.directory, &logging.file_prefix);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    // Console output stays terse; the report itself goes to stdout.
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact();

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .json()
        .with_current_span(false)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level)),
        )
        .init();

    Ok(guard)
}

fn alert(message: &str) {
    eprintln!("{} {}", "❌".red(), message.red().bold());
}

/// Shows the alert built by `message` when `result` is an error and hands
/// the result back unchanged.
fn or_alert<T, E, F>(result: Result<T, E>, message: F) -> Result<T, E>
where
    E: Display,
    F: FnOnce(&E) -> String,
{
    if let Err(e) = &result {
        alert(&message(e));
    }
    result
}

fn wallet_alert<E>(_: &E) -> String {
    "Please connect your wallet first".to_string()
}

fn open_wallet(config: &Config) -> Result<Arc<WalletProvider<KeypairWallet>>> {
    let adapter = KeypairWallet::from_config(&config.wallet)?;
    Ok(WalletProvider::new(adapter, config.wallet.network.clone()))
}

/// Connected wallet state for the renderer, when a wallet is configured.
async fn ambient_wallet_state(config: &Config) -> Option<WalletState> {
    let wallet = open_wallet(config).ok()?;
    match wallet.connect().await {
        Ok(state) => Some(state),
        Err(e) => {
            warn!("Wallet unavailable: {}", e);
            None
        }
    }
}

async fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Help => println!("{}", USAGE),

        Command::Templates => {
            for template in templates::all() {
                let utilities: Vec<_> = template.desired_utility.iter().map(|u| u.as_str()).collect();
                println!(
                    "{:<18} {} | {} | {}",
                    template.name.bold(),
                    template.project_type,
                    template.economic_model,
                    utilities.join(", ")
                );
            }
        }

        Command::Generate { form, out } => {
            let content = std::fs::read_to_string(&form)
                .with_context(|| format!("Failed to read form file: {}", form.display()))?;
            let request = match FormState::from_toml(&content).and_then(|state| state.build()) {
                Ok(request) => request,
                Err(e) => {
                    alert(&e.to_string());
                    bail!(e);
                }
            };

            let client = BackendClient::from_config(config)?;
            println!("{}", "⏳ Generating tokenomics...".bright_blue());
            let result = match client.generate(&request).await {
                Ok(result) => result,
                Err(e) => {
                    alert(&e.user_message());
                    bail!(e);
                }
            };

            let wallet_state = ambient_wallet_state(config).await;
            report::print_lines(&report::render_result(&result, wallet_state.as_ref()));

            if let Some(dir) = out {
                let bytes = client.fetch_document(&result.project.id).await?;
                let path = report::export_document(&bytes, &dir, &result.project)?;
                println!("📄 Document saved to {}", path.display());
            }
        }

        Command::Project { id } => {
            let client = BackendClient::from_config(config)?;
            let project = or_alert(client.get_project(&id).await, |e| e.user_message())?;
            let chart_lines = chart::render_bar_chart(
                &tokenomics_studio::ChartEntry::from_allocations(&project.allocations),
                chart::DEFAULT_BAR_WIDTH,
            );
            render::print_lines(&report::render_project(&project, &chart_lines));
        }

        Command::Pdf { id, dir } => {
            let client = BackendClient::from_config(config)?;
            let project = or_alert(client.get_project(&id).await, |e| e.user_message())?;
            let bytes = or_alert(client.fetch_document(&id).await, |e| e.user_message())?;
            let path = report::export_document(&bytes, &dir, &project)?;
            println!("📄 Document saved to {}", path.display());
        }

        Command::Checkout { package } => {
            let client = BackendClient::from_config(config)?;
            let session = or_alert(
                checkout::start_checkout(&client, package, &config.api.origin_url).await,
                |e| e.user_message(),
            )?;

            println!(
                "💳 {} (${:.2})",
                package.name().bold(),
                package.usd_price()
            );
            println!("   Complete payment at: {}", session.url.bright_blue());
            println!("   Then run: tokenomics status {}", session.session_id);
        }

        Command::Status { session } => {
            let Some(session_id) = checkout::session_id_from_return(&session) else {
                alert("No session_id found");
                bail!("No session_id in {}", session);
            };

            let client = BackendClient::from_config(config)?;
            let poller = CheckoutPoller::from_config(config);
            println!("{}", "⏳ Checking payment status...".bright_blue());

            let outcome = poller.poll(&client, &session_id).await;
            match outcome.state {
                CheckoutState::Success => println!("{}", "✅ Payment successful!".green().bold()),
                CheckoutState::Failed => alert("Payment session expired. Please try again."),
                CheckoutState::Timeout => alert(&format!(
                    "Payment status check timed out after {} attempts. Please check your email for confirmation.",
                    outcome.attempts
                )),
                CheckoutState::Error => alert(
                    outcome.error.as_deref().unwrap_or("Error checking payment status. Please try again."),
                ),
                CheckoutState::Checking => unreachable!("poll only returns terminal states"),
            }
            if outcome.state != CheckoutState::Success {
                bail!("Checkout ended in state {}", outcome.state);
            }
        }

        Command::Wallet => {
            let wallet = open_wallet(config)?;
            let state = wallet.connect().await?;
            println!("👛 {}", state.address.as_deref().unwrap_or("?").bold());
            println!("   Network: {}", state.network);
            match state.balance_sol() {
                Some(sol) => println!("   Balance: {:.4} SOL", sol),
                None => println!("   Balance: unavailable"),
            }
        }

        Command::Pay { package } => {
            let wallet = or_alert(open_wallet(config), wallet_alert)?;
            or_alert(wallet.connect().await, wallet_alert)?;

            let client = BackendClient::from_config(config)?;
            let ledger = or_alert(PaymentLedger::open(&config.ledger.path), |_| {
                PAYMENT_FAILED_ALERT.to_string()
            })?;
            let flow = WalletCheckout::new(&client, wallet.as_ref(), &ledger);

            println!(
                "⏳ Paying {} SOL for {}...",
                package.sol_price(),
                package.name()
            );
            match flow.pay(package).await {
                Ok(payment) => {
                    println!("{}", "✅ Payment successful!".green().bold());
                    println!("   Transaction: {}", payment.signature);
                    println!("   Session: {}", payment.intent.session_id);
                }
                Err(e) => {
                    error!("Wallet payment failed: {}", e);
                    alert(e.alert());
                    if let Some(signature) = e.signature() {
                        println!("   Transaction: {}", signature);
                        println!("   Run `tokenomics resume` to check it on chain and report it.");
                    }
                    return Err(e.into());
                }
            }
        }

        Command::Resume => {
            let wallet = or_alert(open_wallet(config), wallet_alert)?;
            or_alert(wallet.connect().await, wallet_alert)?;

            let client = BackendClient::from_config(config)?;
            let ledger = or_alert(PaymentLedger::open(&config.ledger.path), |_| {
                PAYMENT_FAILED_ALERT.to_string()
            })?;
            let flow = WalletCheckout::new(&client, wallet.as_ref(), &ledger);

            let summary = or_alert(flow.resume().await, |_| PAYMENT_FAILED_ALERT.to_string())?;
            println!(
                "Reported: {}  Pending: {}  Abandoned: {}  Failed: {}",
                summary.reported.len().to_string().green(),
                summary.pending.len().to_string().yellow(),
                summary.abandoned.len().to_string().red(),
                summary.failed.len().to_string().red()
            );
            for (id, reason) in summary.abandoned.iter().chain(&summary.failed) {
                println!("   {} {}", id, reason);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };
    let _guard = match init_tracing(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };

    info!(command = ?command, api = %config.api.base_url, "tokenomics starting");

    match run(command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Command failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
