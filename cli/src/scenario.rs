//! Scripted wallet scenarios for the `demo` command.

use anyhow::{anyhow, bail, Context};
use monieking_common::{parse_amount, Currency, Money, ProductId, WalletError};
use monieking_ledger::{Session, Transaction, TransactionStatus, WalletService};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// A wallet scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: String,
    pub steps: Vec<ScenarioStep>,
}

/// A step in a scenario. Amounts are decimal strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScenarioStep {
    Send {
        recipient: String,
        amount: String,
        currency: String,
        description: Option<String>,
    },
    Receive {
        sender: String,
        amount: String,
        currency: String,
        description: Option<String>,
    },
    Convert {
        amount: String,
        from: String,
        to: String,
    },
    Buy { product: u32 },
    /// Fail the run unless the wallet holds exactly this balance.
    AssertBalance { currency: String, amount: String },
}

/// Outcome counts of a scenario run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    pub scenario: String,
    /// Steps that produced a completed transaction.
    pub completed: u64,
    /// Steps whose transaction was recorded as failed.
    pub failed: u64,
    /// Steps rejected before anything was recorded.
    pub rejected: u64,
    pub assertions: u64,
}

impl Scenario {
    /// Load a scenario by name.
    pub fn load(name: &str) -> anyhow::Result<Self> {
        match name {
            "history" => Ok(Self::history()),
            "shopping" => Ok(Self::shopping()),
            "overdraft" => Ok(Self::overdraft()),
            _ => Err(anyhow!("Unknown scenario: {}", name)),
        }
    }

    pub fn names() -> &'static [&'static str] {
        &["history", "shopping", "overdraft"]
    }

    /// Replays a typical month of wallet activity.
    fn history() -> Self {
        Self {
            name: "history".to_string(),
            description: "Transfers and conversions across three currencies".to_string(),
            steps: vec![
                send("John Doe", "200", "USD", Some("Payment for services")),
                receive("Sarah Smith", "150", "EUR", Some("Refund")),
                convert("50", "USD", "EUR"),
                send("Michael Brown", "75", "GBP", Some("Dinner split")),
                receive("Tech Corp Ltd", "300", "USD", Some("Freelance payment")),
                convert("100", "EUR", "USD"),
                send("Jane Wilson", "500", "USD", Some("Rent contribution")),
                assert_balance("USD", "896.87"),
                assert_balance("EUR", "735.08"),
                assert_balance("GBP", "244.37"),
            ],
        }
    }

    fn shopping() -> Self {
        Self {
            name: "shopping".to_string(),
            description: "Catalog purchases including an out-of-stock item".to_string(),
            steps: vec![
                ScenarioStep::Buy { product: 2 },
                ScenarioStep::Buy { product: 5 },
                ScenarioStep::Buy { product: 8 },
                assert_balance("USD", "702.00"),
            ],
        }
    }

    /// A transfer larger than the balance is recorded as failed.
    fn overdraft() -> Self {
        Self {
            name: "overdraft".to_string(),
            description: "Oversized transfer leaves balances untouched".to_string(),
            steps: vec![
                send("Jane Wilson", "5000", "USD", None),
                convert("2", "NGN", "USD"),
                assert_balance("USD", "1250.00"),
                assert_balance("NGN", "580000"),
            ],
        }
    }
}

fn send(recipient: &str, amount: &str, currency: &str, description: Option<&str>) -> ScenarioStep {
    ScenarioStep::Send {
        recipient: recipient.to_string(),
        amount: amount.to_string(),
        currency: currency.to_string(),
        description: description.map(str::to_string),
    }
}

fn receive(sender: &str, amount: &str, currency: &str, description: Option<&str>) -> ScenarioStep {
    ScenarioStep::Receive {
        sender: sender.to_string(),
        amount: amount.to_string(),
        currency: currency.to_string(),
        description: description.map(str::to_string),
    }
}

fn convert(amount: &str, from: &str, to: &str) -> ScenarioStep {
    ScenarioStep::Convert {
        amount: amount.to_string(),
        from: from.to_string(),
        to: to.to_string(),
    }
}

fn assert_balance(currency: &str, amount: &str) -> ScenarioStep {
    ScenarioStep::AssertBalance {
        currency: currency.to_string(),
        amount: amount.to_string(),
    }
}

/// Runs scenario steps against one logged-in wallet.
pub struct ScenarioRunner<'a> {
    service: &'a WalletService,
    session: Session,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(service: &'a WalletService, session: Session) -> Self {
        Self { service, session }
    }

    pub fn run(&mut self, scenario: &Scenario) -> anyhow::Result<ScenarioReport> {
        info!(scenario = %scenario.name, steps = scenario.steps.len(), "Running scenario");
        let mut report = ScenarioReport {
            scenario: scenario.name.clone(),
            ..ScenarioReport::default()
        };

        for (index, step) in scenario.steps.iter().enumerate() {
            if let ScenarioStep::AssertBalance { currency, amount } = step {
                self.check_balance(currency, amount)
                    .with_context(|| format!("step {} failed", index + 1))?;
                report.assertions += 1;
                continue;
            }

            let recorded_before = self.history_len()?;
            match self.apply(step)? {
                Ok(tx) if tx.is_pending() => {
                    warn!(tx_id = %tx.id, "Step left transaction unsettled");
                    report.failed += 1;
                }
                Ok(tx) => {
                    info!(
                        step = index + 1,
                        tx_id = %tx.id,
                        amount = %tx.money().display_amount(),
                        status = ?tx.status,
                        "Step applied"
                    );
                    if tx.status == TransactionStatus::Completed {
                        report.completed += 1;
                    } else {
                        report.failed += 1;
                    }
                }
                Err(e) if e.requires_login() => return Err(e.into()),
                Err(e) => {
                    warn!(step = index + 1, code = e.error_code(), error = %e, "Step rejected");
                    if self.history_len()? > recorded_before {
                        report.failed += 1;
                    } else {
                        report.rejected += 1;
                    }
                }
            }
        }

        info!(
            completed = report.completed,
            failed = report.failed,
            rejected = report.rejected,
            "Scenario complete"
        );
        Ok(report)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn history_len(&mut self) -> anyhow::Result<usize> {
        Ok(self.service.list_transactions(&mut self.session)?.len())
    }

    /// Outer error for malformed steps; inner error for wallet rejections.
    fn apply(&mut self, step: &ScenarioStep) -> anyhow::Result<Result<Transaction, WalletError>> {
        let session = &mut self.session;
        let result = match step {
            ScenarioStep::Send {
                recipient,
                amount,
                currency,
                description,
            } => {
                let amount = Money::parse(amount, Currency::new(currency.as_str()))?;
                self.service
                    .send(session, amount, recipient, description.clone())
            }
            ScenarioStep::Receive {
                sender,
                amount,
                currency,
                description,
            } => {
                let amount = Money::parse(amount, Currency::new(currency.as_str()))?;
                self.service
                    .receive(session, amount, sender, description.clone())
            }
            ScenarioStep::Convert { amount, from, to } => {
                let amount = parse_amount(amount)?;
                self.service.convert_and_apply(
                    session,
                    amount,
                    &Currency::new(from.as_str()),
                    &Currency::new(to.as_str()),
                )
            }
            ScenarioStep::Buy { product } => self.service.purchase(session, ProductId(*product)),
            ScenarioStep::AssertBalance { .. } => bail!("assertions are not wallet operations"),
        };
        Ok(result)
    }

    fn check_balance(&mut self, currency: &str, amount: &str) -> anyhow::Result<()> {
        let expected = parse_amount(amount)?;
        let currency = Currency::new(currency);
        let actual = self.service.get_wallet(&mut self.session)?.balance(&currency);
        if actual != expected {
            bail!("{} balance is {}, expected {}", currency, actual, expected);
        }
        Ok(())
    }
}
