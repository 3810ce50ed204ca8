use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use ethers::providers::{Http, Provider};
use ethers::types::{Address, U256};
use ethers::utils::parse_units;
use eyre::{eyre, Result};
use log::info;

use pylink::configure::{self, AppConfig};
use pylink::logger::setup_logger;
use pylink::models::assets::{parse_address, PAYMENT_ASSETS};
use pylink::models::errors::PaymentError;
use pylink::models::rail::{Rail, RecipientKind};
use pylink::payment::adapters::mock::{MockNativePay, MockWallet, SheetOutcome};
use pylink::payment::adapters::rpc::RpcWallet;
use pylink::payment::adapters::traits::WalletChain;
use pylink::payment::wallet::asset_balances;
use pylink::payment::{DispatchOutcome, PaymentDispatcher};
use pylink::send::{
    leave_result, resolve_candidates, FeeSchedule, MoneyRequest, ResultAction, TransferSummary, WizardController,
    WizardStep,
};

/// Account the simulated wallet connects with
const DEMO_ACCOUNT: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

#[derive(Parser)]
#[command(name = "pylink")]
#[command(about = "Send money to PyLink users or PayPal accounts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show fee, total and rewards for an amount
    Quote {
        #[arg(long)]
        amount: String,
        #[arg(long, default_value = "pylink")]
        kind: String,
    },
    /// Look up username suggestions
    Recipients {
        #[arg(long)]
        handle: String,
    },
    /// List payable assets and the wallet's balances
    Assets,
    /// Build the code a payer scans to send you money
    Request {
        #[arg(long)]
        handle: String,
        #[arg(long, default_value = "")]
        amount: String,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// Run the send-money wizard end to end
    Send {
        #[arg(long, default_value = "pylink")]
        kind: String,
        #[arg(long)]
        handle: String,
        #[arg(long)]
        amount: String,
        #[arg(long, default_value = "wallet")]
        rail: String,
        #[arg(long)]
        asset: Option<String>,
        /// Pretend the device cannot show the native payment sheet
        #[arg(long, action = clap::ArgAction::SetTrue)]
        native_unavailable: bool,
        /// Decline the first signature or the payment sheet
        #[arg(long, action = clap::ArgAction::SetTrue)]
        reject: bool,
        /// Run the simulated wallet without a connected account
        #[arg(long, action = clap::ArgAction::SetTrue)]
        disconnected: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv().ok();

    let cli = Cli::parse();
    let config = configure::load_config()?;
    setup_logger(&config).map_err(|e| eyre!("Failed to initialize logger: {}", e))?;

    match cli.command {
        Commands::Quote { amount, kind } => {
            let kind = parse_kind(&kind)?;
            let quote = FeeSchedule::default().quote(&amount, kind);
            println!("{}", serde_json::to_string_pretty(&quote)?);
        }
        Commands::Recipients { handle } => {
            let candidates = resolve_candidates(&handle);
            if candidates.is_empty() {
                println!("Type at least two characters to search");
            }
            for c in candidates {
                let badge = if c.verified { " ✓" } else { "" };
                println!("[{}] {} @{}{}", c.initial(), c.display_name, c.handle, badge);
            }
        }
        Commands::Assets => {
            let wallet = build_wallet(&config, false, false)?;
            let balances = asset_balances(wallet.as_ref()).await?;
            for asset in PAYMENT_ASSETS.iter() {
                let balance = balances
                    .iter()
                    .find(|b| b.symbol == asset.symbol)
                    .map(|b| b.balance.as_str())
                    .unwrap_or("-");
                println!("{:<6} {:<24} {}", asset.symbol, asset.name, balance);
            }
        }
        Commands::Request { handle, amount, note } => {
            let request = MoneyRequest::new(&handle, &amount, &note)?;
            println!("Share this code to get paid as @{}", request.handle);
            if let Some(requesting) = request.requesting() {
                println!("Requesting {}", requesting);
            }
            if let Some(note) = request.note.as_deref() {
                println!("Note: {}", note);
            }
            println!("{}", request.encode()?);
        }
        Commands::Send {
            kind,
            handle,
            amount,
            rail,
            asset,
            native_unavailable,
            reject,
            disconnected,
        } => {
            let native = Arc::new(MockNativePay::new("simulated-sheet"));
            if native_unavailable {
                native.set_available(Some(false));
            }
            if reject {
                native.set_outcome(SheetOutcome::Reject("Payment sheet closed".to_string()));
            }
            let wallet = build_wallet(&config, disconnected, reject)?;
            let mut dispatcher = PaymentDispatcher::new(native, wallet, config.dispatch_settings()?);

            let request = SendRequest {
                kind: parse_kind(&kind)?,
                handle,
                amount,
                rail: Rail::from_str(&rail).ok_or_else(|| eyre!("unknown rail: {}", rail))?,
                asset,
            };
            run_send(&mut dispatcher, request).await?;
        }
    }

    Ok(())
}

struct SendRequest {
    kind: RecipientKind,
    handle: String,
    amount: String,
    rail: Rail,
    asset: Option<String>,
}

async fn run_send(dispatcher: &mut PaymentDispatcher, request: SendRequest) -> Result<()> {
    let mut wizard = WizardController::new();

    // Step 1
    wizard.set_recipient_kind(request.kind);
    wizard.set_handle(&request.handle);
    expect_step(&mut wizard, WizardStep::Amount)?;

    // Step 2
    wizard.set_amount(&request.amount);
    let quote = wizard.quote();
    expect_step(&mut wizard, WizardStep::Payment)?;

    // Step 3
    wizard.set_rail_options(dispatcher.available_rails(&quote).await);
    wizard.set_wallet_connected(dispatcher.wallet_connected());
    wizard.select_rail(request.rail)?;
    if let Some(asset) = request.asset.as_deref() {
        wizard.select_asset(asset)?;
    }
    expect_step(&mut wizard, WizardStep::Review)?;

    // Step 4
    let order = wizard.review()?;
    println!(
        "Sending ${} to {} via {} (fee ${})",
        quote.total_display(),
        order.recipient.display(),
        order.rail.label(),
        pylink::send::fee::format_cents(quote.fee)
    );

    let mut outcome = dispatcher.confirm(&order).await?;
    let mut retriggered_after_reject = false;
    loop {
        match outcome {
            DispatchOutcome::Succeeded { .. } => break,
            DispatchOutcome::AwaitingWalletTrigger => {
                info!("wallet modal open, confirming transaction");
            }
            DispatchOutcome::ApprovalConfirmed { ref tx_hash } => {
                println!("Approval confirmed in {}, sending payment", tx_hash);
            }
        }

        outcome = match dispatcher.trigger_wallet().await {
            Ok(next) => next,
            // a declined signature leaves the modal open; try once more
            Err(PaymentError::UserRejected(msg)) if !retriggered_after_reject => {
                println!("{}", msg);
                retriggered_after_reject = true;
                DispatchOutcome::AwaitingWalletTrigger
            }
            Err(e) => return Err(e.into()),
        };
    }

    let attempt = dispatcher.attempt().ok_or(PaymentError::NoActiveAttempt)?;
    let summary = TransferSummary::from_attempt(&order, attempt)?;
    println!("{}", summary);

    leave_result(ResultAction::BackToDashboard, &mut wizard, dispatcher);
    Ok(())
}

fn expect_step(wizard: &mut WizardController, expected: WizardStep) -> Result<()> {
    let step = wizard.step();
    if wizard.advance() != expected {
        return Err(eyre!("step {} ({}) is incomplete", step.number(), step.title()));
    }
    Ok(())
}

fn parse_kind(kind: &str) -> Result<RecipientKind> {
    RecipientKind::from_str(kind).ok_or_else(|| eyre!("unknown recipient kind: {}", kind))
}

/// A node when `rpc_url` is configured, the simulated wallet otherwise
fn build_wallet(config: &AppConfig, disconnected: bool, reject: bool) -> Result<Arc<dyn WalletChain>> {
    let account = match config.wallet_account.as_deref() {
        Some(account) => Some(parse_address(account)?),
        None => None,
    };

    if let Some(rpc_url) = config.rpc_url.as_deref() {
        info!("wallet rail uses node at {}", rpc_url);
        let provider = Provider::<Http>::try_from(rpc_url)?;
        return Ok(Arc::new(RpcWallet::new(Arc::new(provider), account)));
    }

    let wallet = MockWallet::disconnected("simulated-wallet");
    if !disconnected {
        let owner = match account {
            Some(account) => account,
            None => parse_address(DEMO_ACCOUNT)?,
        };
        wallet.connect(owner);
        fund(&wallet, owner)?;
    }
    if reject {
        wallet.reject_next_write("User rejected the request.");
    }
    Ok(Arc::new(wallet))
}

fn fund(wallet: &MockWallet, owner: Address) -> Result<()> {
    for asset in PAYMENT_ASSETS.iter() {
        let amount: U256 = parse_units(10_000u64, asset.decimals)?.into();
        if asset.is_native() {
            wallet.set_native_balance(owner, amount);
        } else {
            wallet.set_token_balance(asset.address()?, owner, amount);
        }
    }
    Ok(())
}
