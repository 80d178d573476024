use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tramite::agenda::REMINDER_WINDOW_DAYS;
use tramite::client::ResourceClient;
use tramite::config::Config;
use tramite::format::parse_due_date;
use tramite::models::*;
use tramite::render;
use tramite::session::{SessionFile, SessionProvider, SignUpOutcome};
use tramite::store::{LoadStatus, Removal, Workspace};

#[derive(Parser)]
#[command(name = "tramite")]
#[command(about = "Track the recurring obligations of your companies")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        #[arg(short, long)]
        email: String,
    },
    /// Create an account
    Signup {
        #[arg(short, long)]
        email: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Monthly total, upcoming and overdue obligations
    Dashboard,
    /// Manage companies
    #[command(subcommand)]
    Companies(CompanyCommands),
    /// Manage the obligations of a company
    #[command(subcommand)]
    Obligations(ObligationCommands),
    /// Pending obligations due within the next 7 days, across all companies
    Reminders,
}

#[derive(Subcommand)]
enum CompanyCommands {
    /// List your companies
    List,
    /// Register a company
    Add {
        /// Trade name
        #[arg(long)]
        name: String,
        /// Registered legal name
        #[arg(long)]
        legal_name: String,
        /// Legal identification number
        #[arg(long)]
        legal_id: String,
        #[arg(long)]
        phone: Option<String>,
    },
}

#[derive(Subcommand)]
enum ObligationCommands {
    /// List the obligations of a company
    List { company: CompanyId },
    /// Add an obligation to a company
    Add {
        company: CompanyId,
        #[arg(long)]
        title: String,
        /// Due date as YYYY-MM-DD
        #[arg(long, value_parser = parse_date)]
        due: NaiveDate,
        /// Estimated amount in colones
        #[arg(long)]
        amount: Option<Decimal>,
        /// Única, Mensual (Anual is not available yet)
        #[arg(long, default_value = "Única")]
        frequency: Frequency,
    },
    /// Mark an obligation completed, or pending again
    Toggle {
        company: CompanyId,
        obligation: ObligationId,
    },
    /// Delete an obligation
    Remove {
        company: CompanyId,
        obligation: ObligationId,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    parse_due_date(s).map_err(|e| e.to_string())
}

/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "tramite=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::from_env()?;
    let http = config.http_client()?;
    let session = SessionProvider::from_config(&config, http.clone())
        .with_file(SessionFile::default_location()?);
    let client = ResourceClient::new(config.api_url.clone(), http, &session);
    let workspace = Workspace::connected(client, &session);

    match cli.command {
        Commands::Login { email } => {
            let password = dialoguer::Password::new()
                .with_prompt("Password")
                .interact()?;
            let signed_in = session.sign_in(&email, &password).await?;
            println!("Signed in as {}", signed_in.user_label());
        }
        Commands::Signup { email } => {
            let password = dialoguer::Password::new()
                .with_prompt("Password")
                .with_confirmation("Repeat password", "Passwords do not match")
                .interact()?;
            match session.sign_up(&email, &password).await? {
                SignUpOutcome::PendingConfirmation { email } => {
                    println!("Check {} to confirm your account, then log in.", email);
                }
                SignUpOutcome::SignedIn(s) => println!("Signed in as {}", s.user_label()),
            }
        }
        Commands::Logout => {
            if let Err(e) = session.sign_out().await {
                tracing::warn!("Identity provider did not acknowledge sign-out: {}", e);
            }
            println!("Signed out.");
        }
        Commands::Whoami => match session.get_session().await? {
            Some(s) => println!("{} (session valid until {})", s.user_label(), s.expires_at),
            None => println!("Not signed in."),
        },
        Commands::Dashboard => {
            require_session(&session).await?;
            workspace.dashboard.load().await;
            let state = workspace.dashboard.state();
            match (state.status, state.summary) {
                (LoadStatus::Ready, Some(summary)) => print!("{}", render::dashboard(&summary)),
                _ => bail!(state.error.unwrap_or_else(|| "Dashboard unavailable".into())),
            }
        }
        Commands::Companies(command) => {
            require_session(&session).await?;
            match command {
                CompanyCommands::List => {
                    workspace.companies.load().await;
                    println!("{}", render::companies(&workspace.companies.state()).trim_end());
                }
                CompanyCommands::Add {
                    name,
                    legal_name,
                    legal_id,
                    phone,
                } => {
                    let company = workspace
                        .create_company(CreateCompanyInput {
                            display_name: name,
                            legal_name,
                            external_identifier: legal_id,
                            phone,
                        })
                        .await?;
                    println!("Created company [{}] {}", company.id, company.display_name);
                    println!("{}", render::companies(&workspace.companies.state()).trim_end());
                }
            }
        }
        Commands::Obligations(command) => {
            require_session(&session).await?;
            run_obligations(&workspace, command).await?;
        }
        Commands::Reminders => {
            require_session(&session).await?;
            run_reminders(&workspace).await?;
        }
    }

    Ok(())
}

async fn require_session(session: &SessionProvider) -> anyhow::Result<()> {
    match session.get_session().await? {
        Some(_) => Ok(()),
        None => bail!("Not signed in. Run `tramite login --email <email>` first."),
    }
}

/// Digest of obligations due within the reminder window. Companies whose
/// obligations could not be loaded are reported and make the command fail,
/// so an empty digest always means nothing is due.
async fn run_reminders(workspace: &Workspace) -> anyhow::Result<()> {
    workspace.companies.load().await;
    let companies = workspace.companies.state();
    if companies.status != LoadStatus::Ready {
        bail!(companies.error.unwrap_or_else(|| "Companies unavailable".into()));
    }

    let digest = workspace.reminders(today(), REMINDER_WINDOW_DAYS).await;
    print!("{}", render::reminders(&digest));

    if !digest.is_complete() {
        bail!(
            "Could not load obligations for {} of {} companies",
            digest.failed.len(),
            companies.items.len()
        );
    }
    Ok(())
}

async fn run_obligations(workspace: &Workspace, command: ObligationCommands) -> anyhow::Result<()> {
    let company = match &command {
        ObligationCommands::List { company }
        | ObligationCommands::Add { company, .. }
        | ObligationCommands::Toggle { company, .. }
        | ObligationCommands::Remove { company, .. } => *company,
    };

    workspace.select_company(Some(company)).await;
    let state = workspace.obligations.state();
    if state.status == LoadStatus::Failed {
        bail!(state.error.unwrap_or_default());
    }

    match command {
        ObligationCommands::List { .. } => {}
        ObligationCommands::Add {
            title,
            due,
            amount,
            frequency,
            ..
        } => {
            let created = workspace
                .obligations
                .create(CreateObligationInput {
                    company_id: company,
                    title,
                    due_date: due,
                    estimated_amount: amount,
                    frequency,
                })
                .await?;
            println!("Created obligation [{}] {}", created.id, created.title);
        }
        ObligationCommands::Toggle { obligation, .. } => {
            let target = state
                .items
                .iter()
                .find(|o| o.id == obligation)
                .with_context(|| format!("Obligation {} not found in company {}", obligation, company))?;
            workspace.obligations.toggle_completed(target).await?;
            println!("Status updated.");
        }
        ObligationCommands::Remove { obligation, yes, .. } => {
            let confirm = |prompt: &str| {
                yes || dialoguer::Confirm::new()
                    .with_prompt(prompt)
                    .default(false)
                    .interact()
                    .unwrap_or(false)
            };
            match workspace.obligations.remove(obligation, &confirm).await? {
                Removal::Removed => println!("Obligation deleted."),
                Removal::Declined => println!("Nothing deleted."),
            }
        }
    }

    println!(
        "{}",
        render::obligations(&workspace.obligations.state(), today()).trim_end()
    );
    Ok(())
}
