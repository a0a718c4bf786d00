mod display;

use std::process::ExitCode;

use anyhow::{Context, bail};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use loantrack_core::{
    Borrower, DailyBoard, DailyCollectionCard, DefaulterInfo, DefaulterSummary, HealthStatus,
    Loan, LoanStatus, MonthlyBoard, derive_card,
};
use loantrack_sync::http::{ApiClient, BorrowerQuery, PaymentMethod};
use loantrack_sync::views;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "loantrack", version)]
#[command(about = "Loan collections from the terminal")]
struct Cli {
    /// API root, including the version prefix.
    #[arg(
        long,
        global = true,
        env = "LOANTRACK_API_URL",
        default_value = "http://localhost:3000/api/v1"
    )]
    api_url: String,
    /// Bearer token sent with every request.
    #[arg(long, global = true, env = "LOANTRACK_TOKEN", hide_env_values = true)]
    token: Option<String>,
    /// Evaluate cards and overdue days as of this date (YYYY-MM-DD).
    #[arg(long, global = true)]
    today: Option<NaiveDate>,
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Portfolio totals and today's collections.
    Dashboard,
    /// Daily collection cards.
    Daily {
        #[arg(long, value_enum, default_value_t = StatusFilter::All)]
        status: StatusFilter,
    },
    /// Monthly-interest loans.
    Monthly {
        #[arg(long, value_enum, default_value_t = StatusFilter::All)]
        status: StatusFilter,
    },
    /// Full detail for one loan.
    Loan { id: String },
    /// The daily collection card for one loan.
    Card { id: String },
    /// Record a daily installment.
    Collect {
        id: String,
        #[arg(long)]
        amount: Decimal,
        #[arg(long, value_enum, default_value_t = Method::Cash)]
        method: Method,
        /// Day number on the card this payment covers.
        #[arg(long)]
        day: Option<u32>,
    },
    /// Disburse a pending loan.
    Disburse { id: String },
    /// Defaulted loans with borrower contacts.
    Defaulters {
        #[arg(long)]
        search: Option<String>,
    },
    Borrowers {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = false)]
        blacklisted: bool,
    },
    Borrower { id: String },
    /// Backend health check.
    Health,
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusFilter {
    All,
    Pending,
    Active,
    Closed,
    Defaulted,
}

impl From<StatusFilter> for Option<LoanStatus> {
    fn from(value: StatusFilter) -> Self {
        match value {
            StatusFilter::All => None,
            StatusFilter::Pending => Some(LoanStatus::Pending),
            StatusFilter::Active => Some(LoanStatus::Active),
            StatusFilter::Closed => Some(LoanStatus::Closed),
            StatusFilter::Defaulted => Some(LoanStatus::Defaulted),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Method {
    Cash,
    Upi,
    BankTransfer,
    Cheque,
}

impl From<Method> for PaymentMethod {
    fn from(value: Method) -> Self {
        match value {
            Method::Cash => PaymentMethod::Cash,
            Method::Upi => PaymentMethod::Upi,
            Method::BankTransfer => PaymentMethod::BankTransfer,
            Method::Cheque => PaymentMethod::Cheque,
        }
    }
}

/// Everything a command fetched, ready to render.
enum Output {
    Dashboard(views::Dashboard),
    Daily(DailyBoard),
    Monthly(MonthlyBoard),
    Loan(Box<views::LoanDetail>),
    Card(Loan, DailyCollectionCard),
    Collected(Loan, Option<DailyCollectionCard>),
    Disbursed(Loan),
    Defaulters(Vec<DefaulterInfo>, DefaulterSummary),
    Borrowers(Vec<Borrower>),
    Borrower(views::BorrowerDetail),
    Health(HealthStatus),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let client = ApiClient::new(cli.api_url).with_token(cli.token);
    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());
    info!(api = client.base_url(), %today, "loantrack v{}", env!("CARGO_PKG_VERSION"));

    // Ctrl-C drops the in-flight fetch; nothing it produced is rendered.
    let fetched = tokio::select! {
        res = fetch(&client, cli.command, today) => res,
        _ = tokio::signal::ctrl_c() => {
            warn!("cancelled");
            eprintln!("cancelled");
            return ExitCode::from(130);
        }
    };

    match fetched.and_then(|output| render(output, cli.json)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn fetch(client: &ApiClient, command: Command, today: NaiveDate) -> anyhow::Result<Output> {
    let output = match command {
        Command::Dashboard => Output::Dashboard(
            views::dashboard(client)
                .await
                .context("loading dashboard")?,
        ),
        Command::Daily { status } => Output::Daily(
            views::daily_board(client, status.into(), today)
                .await
                .context("loading daily loans")?,
        ),
        Command::Monthly { status } => Output::Monthly(
            views::monthly_board(client, status.into())
                .await
                .context("loading monthly loans")?,
        ),
        Command::Loan { id } => Output::Loan(Box::new(
            views::loan_detail(client, &id, today)
                .await
                .with_context(|| format!("loading loan {id}"))?,
        )),
        Command::Card { id } => {
            let loan = client
                .get_loan(&id)
                .await
                .with_context(|| format!("loading loan {id}"))?;
            if !loan.has_daily_card() {
                bail!("loan {} is not a daily-card loan", loan.loan_number);
            }
            let card = derive_card(&loan, today)?;
            Output::Card(loan, card)
        }
        Command::Collect {
            id,
            amount,
            method,
            day,
        } => {
            // Without --day the payment covers the first unfilled box.
            let loan = match day {
                Some(day) => {
                    client
                        .submit_daily_payment(&id, amount, method.into(), Some(day))
                        .await
                }
                None => {
                    client
                        .collect_next_day(&id, amount, method.into(), today)
                        .await
                }
            }
            .with_context(|| format!("collecting {amount} on loan {id}"))?;
            let card = if loan.has_daily_card() {
                Some(derive_card(&loan, today)?)
            } else {
                None
            };
            Output::Collected(loan, card)
        }
        Command::Disburse { id } => Output::Disbursed(
            client
                .disburse_loan(&id)
                .await
                .with_context(|| format!("disbursing loan {id}"))?,
        ),
        Command::Defaulters { search } => {
            let mut rows = views::defaulters(client, today)
                .await
                .context("loading defaulters")?;
            if let Some(q) = search.as_deref() {
                rows.retain(|d| d.matches(q));
            }
            let summary = DefaulterSummary::of(&rows);
            Output::Defaulters(rows, summary)
        }
        Command::Borrowers {
            search,
            blacklisted,
        } => {
            let query = BorrowerQuery {
                search: search.clone(),
                is_blacklisted: blacklisted.then_some(true),
                ..BorrowerQuery::default()
            };
            let mut borrowers = client
                .list_borrowers(&query)
                .await
                .context("loading borrowers")?
                .items;
            if let Some(q) = search.as_deref() {
                borrowers.retain(|b| b.matches(q));
            }
            Output::Borrowers(borrowers)
        }
        Command::Borrower { id } => Output::Borrower(
            views::borrower_detail(client, &id)
                .await
                .with_context(|| format!("loading borrower {id}"))?,
        ),
        Command::Health => Output::Health(client.health().await.context("health check")?),
    };
    Ok(output)
}

fn render(output: Output, as_json: bool) -> anyhow::Result<()> {
    if as_json {
        let value = match &output {
            Output::Dashboard(view) => to_json(view)?,
            Output::Daily(board) => {
                let cards: Vec<_> = board
                    .cards()
                    .map(|(loan, card)| json!({"loan": loan, "card": card}))
                    .collect();
                json!({"summary": board.summary(), "loans": board.loans(), "cards": cards})
            }
            Output::Monthly(board) => {
                json!({"summary": board.summary(), "loans": board.loans()})
            }
            Output::Loan(detail) => to_json(detail)?,
            Output::Card(loan, card) | Output::Collected(loan, Some(card)) => {
                json!({"loan": loan, "card": card})
            }
            Output::Collected(loan, None) | Output::Disbursed(loan) => to_json(loan)?,
            Output::Defaulters(rows, summary) => json!({"summary": summary, "defaulters": rows}),
            Output::Borrowers(borrowers) => to_json(borrowers)?,
            Output::Borrower(detail) => to_json(detail)?,
            Output::Health(health) => to_json(health)?,
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match &output {
        Output::Dashboard(view) => display::print_dashboard(view),
        Output::Daily(board) => display::print_daily_board(board),
        Output::Monthly(board) => display::print_monthly_board(board),
        Output::Loan(detail) => display::print_loan_detail(detail),
        Output::Card(loan, card) => display::print_card(loan, card),
        Output::Collected(loan, card) => {
            println!(
                "Recorded payment on {}; total paid {}",
                loan.loan_number,
                display::format_inr(loan.total_paid())
            );
            if let Some(card) = card {
                display::print_card(loan, card);
            }
        }
        Output::Disbursed(loan) => println!(
            "{} is now {} (disbursed {})",
            loan.loan_number,
            loan.status,
            display::format_date(loan.disbursement_date)
        ),
        Output::Defaulters(rows, summary) => display::print_defaulters(rows, summary),
        Output::Borrowers(borrowers) => display::print_borrowers(borrowers),
        Output::Borrower(detail) => display::print_borrower_detail(detail),
        Output::Health(health) => display::print_health(health),
    }
    Ok(())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}
