//! CLI binary for the FinTrack personal finance backend.

use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use fintrack_rs::aggregate::{CategoryBucket, MonthBucket, Summary, TransactionFilter};
use fintrack_rs::categorize::{PreparedImport, category_color, prepare_extracted, suggest_category};
use fintrack_rs::client::FinTrackBlockingClient;
use fintrack_rs::error::FinTrackError;
use fintrack_rs::format::{Locale, format_long_date, format_pesos, month_label};
use fintrack_rs::ingest::{self, IngestReport};
use fintrack_rs::ledger::Ledger;
use fintrack_rs::models::{
    MonthKey, NaiveDate, RawTransaction, Session, Transaction, TransactionId, TransactionInput,
    UNCATEGORIZED, UserCreate, UserId,
};
use fintrack_rs::session::SessionStore;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use secrecy::SecretString;

/// Environment variable overriding the stored access token.
const TOKEN_ENV: &str = "FINTRACK_TOKEN";

/// Environment variable overriding the stored user ID.
const USER_ENV: &str = "FINTRACK_USER_ID";

/// Default backend address.
const DEFAULT_API_URL: &str = "http://localhost:8000";

/// FinTrack CLI: track income and expenses against a FinTrack backend.
#[derive(Debug, Parser)]
#[command(name = "fintrack", version, about)]
struct Cli {
    /// Backend base URL.
    #[arg(long, global = true, env = "FINTRACK_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
    /// Override the session directory (default: XDG data dir).
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Create an account.
    Register(RegisterArgs),
    /// Log in and remember the session.
    Login(LoginArgs),
    /// Forget the stored session.
    Logout,
    /// List transactions, optionally filtered.
    Transactions(FilterArgs),
    /// Show the balance summary with monthly and per-category totals.
    Dashboard {
        /// Filters applied to the monthly and category tables.
        #[command(flatten)]
        filter: FilterArgs,
        /// Label months in English instead of Spanish.
        #[arg(long)]
        english: bool,
    },
    /// Record a transaction.
    Add(AddArgs),
    /// Change fields of an existing transaction.
    Edit(EditArgs),
    /// Delete a transaction.
    Delete {
        /// Transaction ID.
        id: TransactionId,
    },
    /// Extract movements from a PDF bank statement.
    Upload {
        /// Path to the statement.
        file: PathBuf,
        /// Save the extracted movements as transactions.
        #[arg(long)]
        save: bool,
    },
}

/// Arguments for the `register` subcommand.
#[derive(Debug, Args)]
struct RegisterArgs {
    /// Account e-mail.
    #[arg(long)]
    email: String,
    /// Account password.
    #[arg(long, env = "FINTRACK_PASSWORD", hide_env_values = true)]
    password: String,
    /// Display name.
    #[arg(long)]
    name: Option<String>,
}

/// Arguments for the `login` subcommand.
#[derive(Debug, Args)]
struct LoginArgs {
    /// Account e-mail.
    #[arg(long)]
    email: String,
    /// Account password.
    #[arg(long, env = "FINTRACK_PASSWORD", hide_env_values = true)]
    password: String,
}

/// Transaction filters shared by `transactions` and `dashboard`.
#[derive(Debug, Default, Args)]
struct FilterArgs {
    /// Start date (inclusive, YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    from: Option<NaiveDate>,
    /// End date (inclusive, YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    to: Option<NaiveDate>,
    /// Only this category (exact name).
    #[arg(long)]
    category: Option<String>,
    /// Minimum signed amount.
    #[arg(long, allow_negative_numbers = true)]
    min_amount: Option<f64>,
    /// Maximum signed amount.
    #[arg(long, allow_negative_numbers = true)]
    max_amount: Option<f64>,
    /// Description substring (case-insensitive).
    #[arg(long)]
    description: Option<String>,
    /// Only this month (YYYY-MM).
    #[arg(long, value_parser = parse_month)]
    month: Option<MonthKey>,
}

/// Arguments for the `add` subcommand.
#[derive(Debug, Args)]
struct AddArgs {
    /// Description.
    #[arg(long)]
    description: String,
    /// Signed amount: negative for expenses, positive for income.
    #[arg(long, allow_negative_numbers = true)]
    amount: f64,
    /// Posting date (YYYY-MM-DD, default: today).
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
    /// Category (default: suggested from the description).
    #[arg(long)]
    category: Option<String>,
}

/// Arguments for the `edit` subcommand.
#[derive(Debug, Args)]
struct EditArgs {
    /// Transaction ID.
    id: TransactionId,
    /// New description.
    #[arg(long)]
    description: Option<String>,
    /// New signed amount.
    #[arg(long, allow_negative_numbers = true)]
    amount: Option<f64>,
    /// New posting date (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
    /// New category.
    #[arg(long)]
    category: Option<String>,
}

/// Parses a date string in `YYYY-MM-DD` format for clap.
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|err| format!("{err}"))
}

/// Parses a month string in `YYYY-MM` format for clap.
fn parse_month(s: &str) -> Result<MonthKey, String> {
    s.parse::<MonthKey>().map_err(|err| format!("{err}"))
}

/// Runs the CLI, returning an appropriate exit code.
fn run() -> io::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let _dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let store = match create_store(cli.data_dir) {
        Ok(store) => store,
        Err(err) => {
            writeln!(
                io::stderr().lock(),
                "{} failed to initialize session storage: {err}",
                "error:".red().bold()
            )?;
            return Ok(ExitCode::FAILURE);
        }
    };

    dispatch(&cli.api_url, &store, cli.command)
}

/// Creates the session store, using `data_dir` if provided or the
/// default XDG data directory otherwise.
fn create_store(data_dir: Option<PathBuf>) -> fintrack_rs::error::Result<SessionStore> {
    let dir = match data_dir {
        Some(dir) => dir,
        None => SessionStore::default_dir()?,
    };
    SessionStore::new(dir)
}

/// Builds a blocking client, optionally authenticated.
fn build_client(
    api_url: &str,
    token: Option<SecretString>,
) -> fintrack_rs::error::Result<FinTrackBlockingClient> {
    let mut builder = FinTrackBlockingClient::builder().base_url(api_url);
    if let Some(secret) = token {
        builder = builder.secret_token(secret);
    }
    builder.build()
}

/// Builds a session from the override environment variables, if both are
/// set and the user ID is numeric.
fn session_from_env(token: Option<String>, user_id: Option<String>) -> Option<Session> {
    let token = token.filter(|val| !val.is_empty())?;
    let user_id = user_id?.parse::<UserId>().ok()?;
    Some(Session {
        token: SecretString::from(token),
        user_id,
        email: None,
    })
}

/// Finds the active session: environment overrides first, then the
/// stored session. Prints a hint and returns `None` if there is none.
fn resolve_session(store: &SessionStore) -> io::Result<Option<Session>> {
    if let Some(session) =
        session_from_env(std::env::var(TOKEN_ENV).ok(), std::env::var(USER_ENV).ok())
    {
        return Ok(Some(session));
    }
    match store.load() {
        Ok(Some(session)) => Ok(Some(session)),
        Ok(None) => {
            let mut err = io::stderr().lock();
            writeln!(err, "{} not logged in", "error:".red().bold())?;
            writeln!(
                err,
                "  {} run {} or set {} and {}",
                "hint:".cyan(),
                "fintrack login".bold(),
                TOKEN_ENV,
                USER_ENV
            )?;
            Ok(None)
        }
        Err(err) => {
            writeln!(
                io::stderr().lock(),
                "{} failed to read session: {err}",
                "error:".red().bold()
            )?;
            Ok(None)
        }
    }
}

/// Prints a failed operation to stderr and returns the failure code.
fn report_failure(action: &str, err: &FinTrackError) -> io::Result<ExitCode> {
    let mut out = io::stderr().lock();
    writeln!(out, "{} {action} failed: {err}", "error:".red().bold())?;
    if matches!(*err, FinTrackError::Api { status: 401, .. }) {
        writeln!(
            out,
            "  {} the session may have expired; run {}",
            "hint:".cyan(),
            "fintrack login".bold()
        )?;
    }
    Ok(ExitCode::FAILURE)
}

/// Dispatches to the appropriate subcommand handler.
fn dispatch(api_url: &str, store: &SessionStore, command: Command) -> io::Result<ExitCode> {
    match command {
        Command::Register(args) => with_client(api_url, None, |client| cmd_register(client, args)),
        Command::Login(args) => {
            with_client(api_url, None, |client| cmd_login(client, store, &args))
        }
        Command::Logout => cmd_logout(store),
        Command::Transactions(args) => with_session(api_url, store, |client, user| {
            cmd_transactions(client, user, &args)
        }),
        Command::Dashboard { filter, english } => with_session(api_url, store, |client, user| {
            cmd_dashboard(client, user, &filter, english)
        }),
        Command::Add(args) => {
            with_session(api_url, store, |client, user| cmd_add(client, user, args))
        }
        Command::Edit(args) => {
            with_session(api_url, store, |client, user| cmd_edit(client, user, args))
        }
        Command::Delete { id } => {
            with_session(api_url, store, |client, user| cmd_delete(client, user, id))
        }
        Command::Upload { file, save } => with_session(api_url, store, |client, user| {
            cmd_upload(client, user, &file, save)
        }),
    }
}

/// Resolves the session, builds an authenticated client and runs `op`
/// for the logged-in user.
fn with_session<F>(api_url: &str, store: &SessionStore, op: F) -> io::Result<ExitCode>
where
    F: FnOnce(&FinTrackBlockingClient, UserId) -> io::Result<ExitCode>,
{
    let Some(session) = resolve_session(store)? else {
        return Ok(ExitCode::FAILURE);
    };
    let user = session.user_id;
    with_client(api_url, Some(session.token), |client| op(client, user))
}

/// Builds a client and runs `op` with it.
fn with_client<F>(api_url: &str, token: Option<SecretString>, op: F) -> io::Result<ExitCode>
where
    F: FnOnce(&FinTrackBlockingClient) -> io::Result<ExitCode>,
{
    match build_client(api_url, token) {
        Ok(client) => op(&client),
        Err(err) => {
            writeln!(
                io::stderr().lock(),
                "{} failed to build client: {err}",
                "error:".red().bold()
            )?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Executes the `register` subcommand.
fn cmd_register(client: &FinTrackBlockingClient, args: RegisterArgs) -> io::Result<ExitCode> {
    let request = UserCreate {
        email: args.email,
        password: SecretString::from(args.password),
        name: args.name,
    };
    let spinner = make_spinner("Creating account...");
    let result = client.register(&request);
    spinner.finish_and_clear();

    match result {
        Ok(user) => {
            writeln!(
                io::stdout().lock(),
                "{} account {} created (user {})",
                "ok:".green().bold(),
                user.email.bold(),
                user.id
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_failure("registration", &err),
    }
}

/// Executes the `login` subcommand: logs in and stores the session.
fn cmd_login(
    client: &FinTrackBlockingClient,
    store: &SessionStore,
    args: &LoginArgs,
) -> io::Result<ExitCode> {
    let password = SecretString::from(args.password.clone());
    let spinner = make_spinner("Logging in...");
    let result = client.login(&args.email, &password);
    spinner.finish_and_clear();

    let response = match result {
        Ok(response) => response,
        Err(err) => return report_failure("login", &err),
    };
    let session = Session::from_login(response, Some(args.email.clone()));
    if let Err(err) = store.save(&session) {
        return report_failure("saving the session", &err);
    }
    writeln!(
        io::stdout().lock(),
        "{} logged in as {} (user {})",
        "ok:".green().bold(),
        args.email.bold(),
        session.user_id
    )?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `logout` subcommand.
fn cmd_logout(store: &SessionStore) -> io::Result<ExitCode> {
    match store.clear() {
        Ok(true) => {
            writeln!(io::stdout().lock(), "{} logged out", "ok:".green().bold())?;
            Ok(ExitCode::SUCCESS)
        }
        Ok(false) => {
            writeln!(io::stdout().lock(), "{}", "No stored session.".dimmed())?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_failure("logout", &err),
    }
}

/// Fetches and normalizes the user's transactions.
fn load_ledger(client: &FinTrackBlockingClient, user: UserId) -> Result<Ledger, FinTrackError> {
    let spinner = make_spinner("Loading transactions...");
    let result = client.list_transactions(user);
    spinner.finish_and_clear();
    Ok(Ledger::from_raw(result?))
}

/// Builds a [`TransactionFilter`] from CLI arguments.
fn build_filter(args: &FilterArgs) -> TransactionFilter {
    let mut filter = TransactionFilter::new();
    if let Some(from) = args.from {
        filter = filter.since(from);
    }
    if let Some(to) = args.to {
        filter = filter.until(to);
    }
    if let Some(category) = args.category.as_deref() {
        filter = filter.category(category);
    }
    match (args.min_amount, args.max_amount) {
        (Some(min), Some(max)) => filter = filter.amount_range(min, max),
        (Some(min), None) => filter = filter.min_amount(min),
        (None, Some(max)) => filter = filter.max_amount(max),
        (None, None) => {}
    }
    if let Some(needle) = args.description.as_deref() {
        filter = filter.description(needle);
    }
    if let Some(month) = args.month {
        filter = filter.month(month);
    }
    filter
}

/// Executes the `transactions` subcommand.
fn cmd_transactions(
    client: &FinTrackBlockingClient,
    user: UserId,
    args: &FilterArgs,
) -> io::Result<ExitCode> {
    let mut ledger = match load_ledger(client, user) {
        Ok(ledger) => ledger,
        Err(err) => return report_failure("loading transactions", &err),
    };
    print_report(&ledger.report())?;
    ledger.set_filter(build_filter(args));
    print_transactions_table(&ledger.visible())?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `dashboard` subcommand.
fn cmd_dashboard(
    client: &FinTrackBlockingClient,
    user: UserId,
    args: &FilterArgs,
    english: bool,
) -> io::Result<ExitCode> {
    let mut ledger = match load_ledger(client, user) {
        Ok(ledger) => ledger,
        Err(err) => return report_failure("loading transactions", &err),
    };
    print_report(&ledger.report())?;
    ledger.set_filter(build_filter(args));
    let mut dashboard = ledger.dashboard();
    if english {
        for bucket in &mut dashboard.months {
            bucket.label = month_label(bucket.key, Locale::English);
        }
    }

    print_summary(&dashboard.summary)?;
    print_months_table(&dashboard.months)?;
    print_categories_table(&dashboard.categories)?;
    print_spending_table(&dashboard.spending)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `add` subcommand.
fn cmd_add(client: &FinTrackBlockingClient, user: UserId, args: AddArgs) -> io::Result<ExitCode> {
    let category = args
        .category
        .unwrap_or_else(|| suggest_category(&args.description).to_owned());
    let input = TransactionInput {
        date: args.date.unwrap_or_else(today),
        description: args.description,
        amount: args.amount,
        category: Some(category),
    };
    match client.create_transaction(user, &input) {
        Ok(raw) => print_saved("created", raw),
        Err(err) => report_failure("creating the transaction", &err),
    }
}

/// Applies the fields given on the command line over an existing
/// transaction.
fn merge_edit(existing: &Transaction, args: &EditArgs) -> TransactionInput {
    let category = args.category.clone().or_else(|| {
        (existing.category != UNCATEGORIZED).then(|| existing.category.clone())
    });
    TransactionInput {
        date: args.date.unwrap_or(existing.date),
        description: args
            .description
            .clone()
            .unwrap_or_else(|| existing.description.clone()),
        amount: args.amount.unwrap_or(existing.amount),
        category,
    }
}

/// Executes the `edit` subcommand.
fn cmd_edit(client: &FinTrackBlockingClient, user: UserId, args: EditArgs) -> io::Result<ExitCode> {
    let ledger = match load_ledger(client, user) {
        Ok(ledger) => ledger,
        Err(err) => return report_failure("loading transactions", &err),
    };
    print_report(&ledger.report())?;
    let Some(existing) = ledger.get(args.id) else {
        writeln!(
            io::stderr().lock(),
            "{} transaction {} not found",
            "error:".red().bold(),
            args.id
        )?;
        return Ok(ExitCode::FAILURE);
    };
    let input = merge_edit(existing, &args);
    match client.update_transaction(user, args.id, &input) {
        Ok(raw) => print_saved("updated", raw),
        Err(err) => report_failure("updating the transaction", &err),
    }
}

/// Executes the `delete` subcommand.
fn cmd_delete(
    client: &FinTrackBlockingClient,
    user: UserId,
    id: TransactionId,
) -> io::Result<ExitCode> {
    match client.delete_transaction(user, id) {
        Ok(()) => {
            writeln!(
                io::stdout().lock(),
                "{} transaction {id} deleted",
                "ok:".green().bold()
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_failure("deleting the transaction", &err),
    }
}

/// Executes the `upload` subcommand: extracts movements from a statement
/// and optionally saves them.
fn cmd_upload(
    client: &FinTrackBlockingClient,
    user: UserId,
    file: &Path,
    save: bool,
) -> io::Result<ExitCode> {
    let file_name = file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_owned();
    let bytes = match fs::read(file) {
        Ok(bytes) => bytes,
        Err(err) => {
            writeln!(
                io::stderr().lock(),
                "{} cannot read {}: {err}",
                "error:".red().bold(),
                file.display()
            )?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let spinner = make_spinner("Extracting movements...");
    let result = client.upload_pdf(user, &file_name, bytes);
    spinner.finish_and_clear();
    let response = match result {
        Ok(response) => response,
        Err(err) => return report_failure("statement upload", &err),
    };

    let prepared = prepare_extracted(&response.transactions, today());
    print_import_table(&prepared)?;
    if !save || prepared.inputs.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }

    let progress = ProgressBar::new(u64::try_from(prepared.inputs.len()).unwrap_or(u64::MAX));
    let mut failed = 0_usize;
    for input in &prepared.inputs {
        if let Err(err) = client.create_transaction(user, input) {
            failed += 1;
            progress.suspend(|| {
                let _ignored = writeln!(
                    io::stderr().lock(),
                    "{} {}: {err}",
                    "error:".red().bold(),
                    input.description
                );
            });
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    let saved = prepared.inputs.len() - failed;
    writeln!(
        io::stdout().lock(),
        "{} saved {saved} of {} movements",
        "ok:".green().bold(),
        prepared.inputs.len()
    )?;
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Today's date in local time.
fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

// ── Output formatting ────────────────────────────────────────────────

/// Creates a spinner with the given message.
fn make_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_owned());
    spinner.enable_steady_tick(core::time::Duration::from_millis(80));
    spinner
}

/// Converts a `#rrggbb` colour into a table colour.
fn hex_color(hex: &str) -> Option<Color> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let value = u32::from_str_radix(digits, 16).ok()?;
    let [_, r, g, b] = value.to_be_bytes();
    Some(Color::Rgb { r, g, b })
}

/// Table cell for a signed amount: red for expenses, green for income.
fn amount_cell(amount: f64) -> Cell {
    let cell = Cell::new(format_pesos(amount));
    if amount < 0.0_f64 {
        cell.fg(Color::Red)
    } else if amount > 0.0_f64 {
        cell.fg(Color::Green)
    } else {
        cell.fg(Color::DarkGrey)
    }
}

/// Table cell for a category, drawn in its chart colour.
fn category_cell(category: &str) -> Cell {
    let cell = Cell::new(category);
    match hex_color(category_color(category)) {
        Some(color) => cell.fg(color),
        None => cell,
    }
}

/// Warns on stderr about records that were corrected while loading.
fn print_report(report: &IngestReport) -> io::Result<()> {
    if !report.has_corrections() {
        return Ok(());
    }
    let mut err = io::stderr().lock();
    if report.skipped_dates > 0 {
        writeln!(
            err,
            "{} {} transaction(s) skipped: unreadable date",
            "warning:".yellow().bold(),
            report.skipped_dates
        )?;
    }
    if report.zeroed_amounts > 0 {
        writeln!(
            err,
            "{} {} transaction(s) shown with amount 0: unreadable amount",
            "warning:".yellow().bold(),
            report.zeroed_amounts
        )?;
    }
    Ok(())
}

/// Prints a transaction returned by a create or update call.
fn print_saved(verb: &str, raw: RawTransaction) -> io::Result<ExitCode> {
    let mut report = IngestReport::default();
    let id = raw.id;
    writeln!(
        io::stdout().lock(),
        "{} transaction {id} {verb}",
        "ok:".green().bold()
    )?;
    if let Some(tx) = ingest::normalize(raw, &mut report) {
        print_transactions_table(&[tx])?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Prints transactions in a table.
fn print_transactions_table(txs: &[Transaction]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if txs.is_empty() {
        writeln!(out, "{}", "No transactions found.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("Date").fg(Color::Cyan),
        Cell::new("Description").fg(Color::Cyan),
        Cell::new("Category").fg(Color::Cyan),
        Cell::new("Amount").fg(Color::Cyan),
    ]);

    for tx in txs {
        _ = table.add_row(vec![
            Cell::new(tx.id),
            Cell::new(format_long_date(tx.date)),
            Cell::new(&tx.description),
            category_cell(&tx.category),
            amount_cell(tx.amount),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Transactions".green().bold(),
        format_args!("({})", txs.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints the balance summary.
fn print_summary(summary: &Summary) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{}", "Summary".green().bold())?;
    writeln!(
        out,
        "  {:<10} {}",
        "Income",
        format_pesos(summary.total_income).green()
    )?;
    writeln!(
        out,
        "  {:<10} {}",
        "Expenses",
        format_pesos(summary.total_expenses).red()
    )?;
    let balance = format_pesos(summary.balance);
    if summary.balance < 0.0_f64 {
        writeln!(out, "  {:<10} {}", "Balance", balance.red().bold())?;
    } else {
        writeln!(out, "  {:<10} {}", "Balance", balance.green().bold())?;
    }
    writeln!(out)?;
    Ok(())
}

/// Prints monthly totals in a table.
fn print_months_table(months: &[MonthBucket]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if months.is_empty() {
        writeln!(out, "{}", "No months to show.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Month").fg(Color::Cyan),
        Cell::new("Income").fg(Color::Cyan),
        Cell::new("Expenses").fg(Color::Cyan),
        Cell::new("Net").fg(Color::Cyan),
    ]);
    for bucket in months {
        _ = table.add_row(vec![
            Cell::new(&bucket.label),
            Cell::new(format_pesos(bucket.totals.income)).fg(Color::Green),
            Cell::new(format_pesos(bucket.totals.expenses)).fg(Color::Red),
            amount_cell(bucket.totals.net),
        ]);
    }

    writeln!(out, "{}", "By month".green().bold())?;
    writeln!(out, "{table}")?;
    writeln!(out)?;
    Ok(())
}

/// Prints per-category totals in a table.
fn print_categories_table(categories: &[CategoryBucket]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if categories.is_empty() {
        writeln!(out, "{}", "No categories to show.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Category").fg(Color::Cyan),
        Cell::new("Income").fg(Color::Cyan),
        Cell::new("Expenses").fg(Color::Cyan),
        Cell::new("Net").fg(Color::Cyan),
    ]);
    for bucket in categories {
        _ = table.add_row(vec![
            category_cell(&bucket.name),
            Cell::new(format_pesos(bucket.totals.income)).fg(Color::Green),
            Cell::new(format_pesos(bucket.totals.expenses)).fg(Color::Red),
            amount_cell(bucket.totals.net),
        ]);
    }

    writeln!(out, "{}", "By category".green().bold())?;
    writeln!(out, "{table}")?;
    writeln!(out)?;
    Ok(())
}

/// Prints each category's share of total spending.
fn print_spending_table(spending: &[CategoryBucket]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    let total: f64 = spending.iter().map(|bucket| bucket.totals.expenses).sum();
    if total <= 0.0_f64 {
        writeln!(out, "{}", "No spending to show.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Category").fg(Color::Cyan),
        Cell::new("Spent").fg(Color::Cyan),
        Cell::new("Share").fg(Color::Cyan),
    ]);
    for bucket in spending {
        let share = bucket.totals.expenses / total * 100.0_f64;
        _ = table.add_row(vec![
            category_cell(&bucket.name),
            Cell::new(format_pesos(bucket.totals.expenses)),
            Cell::new(format!("{share:.1}%")),
        ]);
    }

    writeln!(out, "{}", "Spending".green().bold())?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints statement movements prepared for import.
fn print_import_table(prepared: &PreparedImport) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if prepared.inputs.is_empty() {
        writeln!(out, "{}", "No movements found in the statement.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Date").fg(Color::Cyan),
        Cell::new("Description").fg(Color::Cyan),
        Cell::new("Suggested category").fg(Color::Cyan),
        Cell::new("Amount").fg(Color::Cyan),
    ]);
    for input in &prepared.inputs {
        let category = input.category.as_deref().unwrap_or(UNCATEGORIZED);
        _ = table.add_row(vec![
            Cell::new(format_long_date(input.date)),
            Cell::new(&input.description),
            category_cell(category),
            amount_cell(input.amount),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Statement movements".green().bold(),
        format_args!("({})", prepared.inputs.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    drop(out);

    let mut err = io::stderr().lock();
    if prepared.defaulted_dates > 0 {
        writeln!(
            err,
            "{} {} movement(s) had no readable date and were dated today",
            "warning:".yellow().bold(),
            prepared.defaulted_dates
        )?;
    }
    if prepared.zeroed_amounts > 0 {
        writeln!(
            err,
            "{} {} movement(s) had no readable amount and were set to 0",
            "warning:".yellow().bold(),
            prepared.zeroed_amounts
        )?;
    }
    Ok(())
}

/// Entry point.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            // If stderr itself failed there is nothing left to report to.
            let _ignored = writeln!(io::stderr(), "fatal I/O error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use fintrack_rs::aggregate::Totals;
    use fintrack_rs::models::{AmountField, ExtractedTransaction};

    /// Creates a test transaction.
    fn test_transaction(id: i64, date: NaiveDate, amount: f64, category: &str) -> Transaction {
        Transaction {
            id: TransactionId::new(id),
            date,
            description: format!("movement {id}"),
            amount,
            category: category.to_owned(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ── argument parsing tests ───────────────────────────────────────

    #[test]
    fn parse_date_valid() {
        assert_eq!(parse_date("2024-01-15").unwrap(), date(2024, 1, 15));
    }

    #[test]
    fn parse_date_invalid() {
        assert!(parse_date("not-a-date").is_err());
        assert!(parse_date("15/01/2024").is_err());
    }

    #[test]
    fn parse_month_valid_and_invalid() {
        assert_eq!(parse_month("2024-03").unwrap(), MonthKey::new(2024, 3).unwrap());
        assert!(parse_month("2024-13").is_err());
    }

    #[test]
    fn cli_parses_negative_amounts() {
        let cli = Cli::try_parse_from([
            "fintrack",
            "add",
            "--description",
            "HEB",
            "--amount",
            "-120.5",
        ])
        .unwrap();
        let Command::Add(args) = cli.command else {
            panic!("expected add");
        };
        assert!((args.amount + 120.5).abs() < 1e-9);
        assert!(args.category.is_none());
    }

    #[test]
    fn cli_parses_dashboard_filters() {
        let cli = Cli::try_parse_from([
            "fintrack",
            "--api-url",
            "http://example.test",
            "dashboard",
            "--month",
            "2024-01",
            "--english",
        ])
        .unwrap();
        assert_eq!(cli.api_url, "http://example.test");
        let Command::Dashboard { filter, english } = cli.command else {
            panic!("expected dashboard");
        };
        assert!(english);
        assert_eq!(filter.month, MonthKey::new(2024, 1));
    }

    // ── create_store tests ───────────────────────────────────────────

    #[test]
    fn create_store_with_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = create_store(Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(store.dir(), dir.path());
    }

    #[test]
    fn logout_without_session_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let store = create_store(Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(cmd_logout(&store).unwrap(), ExitCode::SUCCESS);
    }

    #[test]
    fn logout_clears_saved_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = create_store(Some(dir.path().to_path_buf())).unwrap();
        let session = session_from_env(Some("tok".to_owned()), Some("3".to_owned())).unwrap();
        store.save(&session).unwrap();
        assert_eq!(cmd_logout(&store).unwrap(), ExitCode::SUCCESS);
        assert!(store.load().unwrap().is_none());
    }

    // ── session override tests ───────────────────────────────────────

    #[test]
    fn session_from_env_requires_both_values() {
        assert!(session_from_env(None, Some("1".to_owned())).is_none());
        assert!(session_from_env(Some("tok".to_owned()), None).is_none());
        assert!(session_from_env(Some(String::new()), Some("1".to_owned())).is_none());
        assert!(session_from_env(Some("tok".to_owned()), Some("abc".to_owned())).is_none());
        let session = session_from_env(Some("tok".to_owned()), Some(" 7 ".to_owned())).unwrap();
        assert_eq!(session.user_id, UserId::new(7));
    }

    #[test]
    fn build_client_with_and_without_token() {
        assert!(build_client(DEFAULT_API_URL, None).is_ok());
        let client =
            build_client(DEFAULT_API_URL, Some(SecretString::from("tok".to_owned()))).unwrap();
        assert!(client.has_token());
    }

    // ── build_filter tests ───────────────────────────────────────────

    #[test]
    fn build_filter_no_args() {
        assert!(build_filter(&FilterArgs::default()).is_empty());
    }

    #[test]
    fn build_filter_all_args() {
        let args = FilterArgs {
            from: Some(date(2024, 1, 1)),
            to: Some(date(2024, 12, 31)),
            category: Some("Hospedaje".to_owned()),
            min_amount: Some(-500.0),
            max_amount: Some(0.0),
            description: Some("hotel".to_owned()),
            month: MonthKey::new(2024, 6),
        };
        let filter = build_filter(&args);
        assert_eq!(filter.date_from, Some(date(2024, 1, 1)));
        assert_eq!(filter.date_to, Some(date(2024, 12, 31)));
        assert_eq!(filter.category.as_deref(), Some("Hospedaje"));
        assert_eq!(filter.min_amount, Some(-500.0));
        assert_eq!(filter.max_amount, Some(0.0));
        assert_eq!(filter.description.as_deref(), Some("hotel"));
        assert_eq!(filter.month, MonthKey::new(2024, 6));
    }

    #[test]
    fn build_filter_single_amount_bound() {
        let args = FilterArgs {
            min_amount: Some(0.0),
            ..FilterArgs::default()
        };
        let filter = build_filter(&args);
        assert_eq!(filter.min_amount, Some(0.0));
        assert!(filter.max_amount.is_none());
    }

    // ── merge_edit tests ─────────────────────────────────────────────

    #[test]
    fn merge_edit_keeps_unspecified_fields() {
        let existing = test_transaction(4, date(2024, 2, 1), -60.0, "Transporte");
        let args = EditArgs {
            id: TransactionId::new(4),
            description: None,
            amount: Some(-75.0),
            date: None,
            category: None,
        };
        let input = merge_edit(&existing, &args);
        assert_eq!(input.date, existing.date);
        assert_eq!(input.description, existing.description);
        assert!((input.amount + 75.0).abs() < 1e-9);
        assert_eq!(input.category.as_deref(), Some("Transporte"));
    }

    #[test]
    fn merge_edit_does_not_send_placeholder_category() {
        let existing = test_transaction(4, date(2024, 2, 1), -60.0, UNCATEGORIZED);
        let args = EditArgs {
            id: TransactionId::new(4),
            description: Some("Taxi".to_owned()),
            amount: None,
            date: Some(date(2024, 2, 2)),
            category: None,
        };
        let input = merge_edit(&existing, &args);
        assert!(input.category.is_none());
        assert_eq!(input.description, "Taxi");
        assert_eq!(input.date, date(2024, 2, 2));
    }

    // ── output helper tests ──────────────────────────────────────────

    #[test]
    fn hex_color_parses_rgb() {
        assert_eq!(
            hex_color("#ff9ff3"),
            Some(Color::Rgb {
                r: 255,
                g: 159,
                b: 243
            })
        );
        assert_eq!(hex_color("ff9ff3"), None);
        assert_eq!(hex_color("#fff"), None);
        assert_eq!(hex_color("#zzzzzz"), None);
    }

    #[test]
    fn make_spinner_creates_spinner() {
        let spinner = make_spinner("Testing...");
        spinner.finish_and_clear();
    }

    #[test]
    fn print_transactions_table_empty() {
        assert!(print_transactions_table(&[]).is_ok());
    }

    #[test]
    fn print_transactions_table_with_data() {
        let txs = vec![
            test_transaction(1, date(2024, 1, 9), 2000.0, "Nómina"),
            test_transaction(2, date(2024, 1, 10), -120.0, UNCATEGORIZED),
            test_transaction(3, date(2024, 1, 11), 0.0, "Hospedaje"),
        ];
        assert!(print_transactions_table(&txs).is_ok());
    }

    #[test]
    fn print_dashboard_sections() {
        let totals = Totals {
            expenses: 120.0,
            income: 2000.0,
            net: 1880.0,
        };
        let summary = Summary {
            total_expenses: 120.0,
            total_income: 2000.0,
            balance: 1880.0,
        };
        let month = MonthBucket {
            key: MonthKey::new(2024, 1).unwrap(),
            label: "enero de 2024".to_owned(),
            totals,
        };
        let category = CategoryBucket {
            name: "Compras y Supermercado".to_owned(),
            totals,
        };
        assert!(print_summary(&summary).is_ok());
        assert!(print_months_table(&[month]).is_ok());
        assert!(print_months_table(&[]).is_ok());
        assert!(print_categories_table(&[category.clone()]).is_ok());
        assert!(print_categories_table(&[]).is_ok());
        assert!(print_spending_table(&[category]).is_ok());
        assert!(print_spending_table(&[]).is_ok());
    }

    #[test]
    fn print_report_with_corrections() {
        let report = IngestReport {
            accepted: 3,
            skipped_dates: 1,
            zeroed_amounts: 1,
        };
        assert!(print_report(&report).is_ok());
        assert!(print_report(&IngestReport::default()).is_ok());
    }

    #[test]
    fn print_import_table_with_data() {
        let rows = vec![ExtractedTransaction {
            fecha_operacion: Some("04-Jun-2025".to_owned()),
            fecha_cargo: None,
            descripcion: "VIVA AEROBUS".to_owned(),
            monto: Some(AmountField::Text("1,530.00".to_owned())),
        }];
        let prepared = prepare_extracted(&rows, date(2025, 7, 1));
        assert!(print_import_table(&prepared).is_ok());
        assert!(print_import_table(&PreparedImport::default()).is_ok());
    }

    #[test]
    fn print_saved_returns_success() {
        let raw = RawTransaction {
            id: TransactionId::new(9),
            date: Some("2024-01-10".to_owned()),
            description: Some("HEB".to_owned()),
            amount: Some(AmountField::Number(-120.0)),
            category: None,
            user_id: None,
            created_at: None,
        };
        assert_eq!(print_saved("created", raw).unwrap(), ExitCode::SUCCESS);
    }
}
