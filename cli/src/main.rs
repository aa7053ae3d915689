//! MonieKing wallet command line
//!
//! Runs wallet operations against an in-memory demo wallet and prints the
//! results as JSON.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use monieking_common::{parse_amount, Clock, Currency, CurrencyPair, Money, ProductId, SystemClock};
use monieking_fx::Quote;
use monieking_ledger::{LedgerConfig, Product, Session, WalletService};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod fixtures;
mod scenario;

use scenario::{Scenario, ScenarioRunner};

/// MonieKing wallet CLI
#[derive(Parser, Debug)]
#[command(name = "monieking")]
#[command(about = "Multi-currency wallet ledger and conversion engine")]
struct Args {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Random seed for reproducible transaction ids
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Preview a conversion without touching balances
    Quote {
        #[arg(long)]
        amount: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    /// Convert between two balances of the demo wallet
    Convert {
        #[arg(long)]
        amount: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    /// Send money to a recipient; the fee is charged on top
    Send {
        #[arg(long)]
        amount: String,
        #[arg(long, default_value = "USD")]
        currency: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        note: Option<String>,
    },
    /// Buy a catalog product
    Buy {
        #[arg(long)]
        product: u32,
    },
    /// List the product catalog
    Products {
        /// Only show this category
        #[arg(long)]
        category: Option<String>,
        /// Hide out-of-stock products
        #[arg(long)]
        in_stock: bool,
    },
    /// List the configured conversion rates
    Rates,
    /// Show the demo wallet balances and their total
    Wallet {
        /// Currency the total is expressed in
        #[arg(long, default_value = "USD")]
        base: String,
    },
    /// Run a scripted scenario
    Demo {
        #[arg(short, long, default_value = "history")]
        scenario: String,
    },
}

#[derive(Serialize)]
struct BalanceView {
    currency: Currency,
    amount: String,
    display: String,
}

impl From<Money> for BalanceView {
    fn from(money: Money) -> Self {
        Self {
            display: money.display_amount(),
            amount: money.value.to_string(),
            currency: money.currency,
        }
    }
}

#[derive(Serialize)]
struct QuoteView<'a> {
    pair: CurrencyPair,
    #[serde(flatten)]
    quote: &'a Quote,
    effective_rate: Decimal,
    display: String,
}

impl<'a> From<&'a Quote> for QuoteView<'a> {
    fn from(quote: &'a Quote) -> Self {
        Self {
            pair: quote.pair(),
            effective_rate: quote.effective_rate(),
            display: format!(
                "{} -> {}",
                quote.gross_amount.display_amount(),
                quote.converted_amount.display_amount()
            ),
            quote,
        }
    }
}

#[derive(Serialize)]
struct RateView {
    pair: CurrencyPair,
    rate: Decimal,
}

#[derive(Serialize)]
struct CatalogView<'a> {
    categories: Vec<&'a str>,
    products: Vec<&'a Product>,
}

#[derive(Serialize)]
struct SessionView {
    logged_in: bool,
    last_activity: String,
    expires_in_secs: i64,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.json_logs);

    let config = LedgerConfig::from_env();
    config.validate()?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let catalog = fixtures::demo_catalog();
    let service = match args.seed {
        Some(seed) => WalletService::seeded(config, catalog, clock, seed)?,
        None => WalletService::new(config, catalog, clock)?,
    };
    let wallet_id = service.open_wallet(fixtures::DEMO_OWNER, fixtures::demo_balances())?;
    let mut session = service.login(wallet_id)?;

    info!(wallet_id = %wallet_id, command = ?args.command, "Starting MonieKing CLI");

    match args.command {
        Command::Quote { amount, from, to } => {
            let quote = service.quote(
                parse_amount(&amount)?,
                &Currency::new(from),
                &Currency::new(to),
            )?;
            print_json(&QuoteView::from(&quote))?;
        }
        Command::Convert { amount, from, to } => {
            let tx = service.convert_and_apply(
                &mut session,
                parse_amount(&amount)?,
                &Currency::new(from),
                &Currency::new(to),
            )?;
            print_json(&tx)?;
            print_balances(&service, &mut session)?;
        }
        Command::Send {
            amount,
            currency,
            to,
            note,
        } => {
            let amount = Money::parse(&amount, Currency::new(currency))?;
            let tx = service.send(&mut session, amount, &to, note)?;
            print_json(&tx)?;
            print_balances(&service, &mut session)?;
        }
        Command::Buy { product } => {
            let tx = service.purchase(&mut session, ProductId(product))?;
            print_json(&tx)?;
            print_balances(&service, &mut session)?;
        }
        Command::Products { category, in_stock } => {
            let catalog = service.catalog();
            let mut products: Vec<&Product> = match &category {
                Some(category) => catalog.by_category(category).collect(),
                None => catalog.all().collect(),
            };
            if in_stock {
                let available: Vec<&Product> = catalog.available().collect();
                products.retain(|product| available.contains(product));
            }
            print_json(&CatalogView {
                categories: catalog.categories(),
                products,
            })?;
        }
        Command::Rates => {
            let table = service.ledger().engine().rate_table();
            info!(table = table.name(), "Listing rates");
            let rates: Vec<RateView> = table
                .supported_pairs()
                .into_iter()
                .map(|pair| RateView {
                    rate: table.rate(&pair.from, &pair.to),
                    pair,
                })
                .collect();
            print_json(&rates)?;
        }
        Command::Wallet { base } => {
            print_balances(&service, &mut session)?;
            let valuation = service.total_balance(&mut session, &Currency::new(base))?;
            print_json(&valuation)?;
            print_json(&SessionView {
                logged_in: session.is_logged_in(),
                last_activity: session.last_activity().to_rfc3339(),
                expires_in_secs: service.session_time_remaining(&session).num_seconds(),
            })?;
        }
        Command::Demo { scenario } => {
            let scenario = Scenario::load(&scenario)?;
            let mut runner = ScenarioRunner::new(&service, session);
            let report = runner.run(&scenario)?;
            print_json(&report)?;

            session = runner.session().clone();
            print_json(&service.list_transactions(&mut session)?)?;
            print_balances(&service, &mut session)?;
        }
    }

    session.logout();
    Ok(())
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_balances(service: &WalletService, session: &mut Session) -> anyhow::Result<()> {
    let wallet = service.get_wallet(session)?;
    let balances: Vec<BalanceView> = wallet.balances().into_iter().map(BalanceView::from).collect();
    print_json(&balances)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
