use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use immo_ledger::{
    config::{self, AppConfig, database},
    core::{
        billing,
        billing::{NewExpenseItem, NewPeriod},
        documents::{self, DocumentRenderer, NewDocument, PdfFileRenderer, TemplateDirRenderer},
        format::swiss_date,
        ids::{BuildingId, KeyId, KeyIssueId, LeaseId, PeriodId, TenantId, UnitId},
        keys::{self, KeyRecipient, NewKey, NewKeyIssue},
        ledger::{self, NewLease, NewVacancy},
        property, qr_bill, report, ticket,
    },
    entities::{document::DocumentKind, expense_item::AllocationKey, vacancy::VacancyReason},
    errors::{Error, Result},
    integrations::{
        registry::{self, GeoAdminClient},
        signature::{self, DocuSealClient},
    },
};
use sea_orm::DatabaseConnection;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "immo", version, about = "Property management back office")]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the schema and seed the configured buildings
    Init,
    /// Print portfolio key figures as JSON
    Summary,
    /// List open maintenance tickets
    Tickets,
    /// Show the lease/vacancy history of a unit and its consistency issues
    Timeline {
        /// Unit id
        #[arg(long)]
        unit: i64,
    },
    /// Render the utility-cost statements of a billing period
    Statement {
        /// Billing period id
        #[arg(long)]
        period: i64,
        /// Directory the rendered statements are written to
        #[arg(long, default_value = "out")]
        out: PathBuf,
    },
    /// Print the QR-bill payload for one month's rent
    RentBill {
        /// Lease id
        #[arg(long)]
        lease: i64,
        /// Month as YYYY-MM
        #[arg(long)]
        month: String,
    },
    /// Fill registry id, construction year and units from the federal registry
    RegistrySeed {
        /// Building id
        #[arg(long)]
        building: i64,
    },
    /// Start a lease; superseded intervals of the unit are closed
    LeaseStart {
        /// Unit id
        #[arg(long)]
        unit: i64,
        /// Tenant id
        #[arg(long)]
        tenant: i64,
        /// First day as YYYY-MM-DD
        #[arg(long)]
        start: String,
        /// Monthly net rent
        #[arg(long)]
        net_rent: f64,
        /// Monthly utility-cost advance
        #[arg(long, default_value_t = 0.0)]
        advance: f64,
        /// Security deposit
        #[arg(long)]
        deposit: Option<f64>,
    },
    /// Record a vacancy; the running lease of the unit ends the day before
    VacancyStart {
        /// Unit id
        #[arg(long)]
        unit: i64,
        /// First vacant day as YYYY-MM-DD
        #[arg(long)]
        start: String,
        /// no_tenant, renovation, owner_use or other
        #[arg(long, default_value = "no_tenant")]
        reason: String,
        /// Free-text note
        #[arg(long, default_value = "")]
        note: String,
    },
    /// End a lease, optionally followed by a vacancy
    LeaseEnd {
        /// Lease id
        #[arg(long)]
        lease: i64,
        /// Last day as YYYY-MM-DD
        #[arg(long)]
        end: String,
        /// Open a vacancy with this reason the day after
        #[arg(long)]
        vacancy: Option<String>,
    },
    /// Create a billing period for a building
    PeriodCreate {
        /// Building id
        #[arg(long)]
        building: i64,
        /// Label, e.g. 2024/25
        #[arg(long)]
        label: String,
        /// First day as YYYY-MM-DD
        #[arg(long)]
        start: String,
        /// Last day as YYYY-MM-DD
        #[arg(long)]
        end: String,
    },
    /// Add an expense item to an open billing period
    ExpenseAdd {
        /// Billing period id
        #[arg(long)]
        period: i64,
        /// Invoice date as YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Description
        #[arg(long)]
        description: String,
        /// Category, e.g. heating
        #[arg(long, default_value = "")]
        category: String,
        /// Amount; negative for refunds
        #[arg(long, allow_negative_numbers = true)]
        amount: f64,
        /// area, headcount or consumption
        #[arg(long, default_value = "area")]
        key: String,
    },
    /// Register a key type of a building
    KeyAdd {
        /// Building id
        #[arg(long)]
        building: i64,
        /// Key number
        #[arg(long)]
        number: String,
        /// Locking system
        #[arg(long, default_value = "")]
        system: String,
        /// Doors it opens
        #[arg(long, default_value = "")]
        function: String,
        /// Copies owned
        #[arg(long)]
        count: i32,
    },
    /// Hand out a key copy to a tenant or a named person
    KeyIssue {
        /// Key id
        #[arg(long)]
        key: i64,
        /// Receiving tenant id
        #[arg(long, conflicts_with = "to", required_unless_present = "to")]
        tenant: Option<i64>,
        /// Receiving person outside the tenant list
        #[arg(long)]
        to: Option<String>,
        /// Hand-over date as YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Receipt was signed
        #[arg(long)]
        signed: bool,
    },
    /// Record the return of a key copy
    KeyReturn {
        /// Key issue id
        #[arg(long)]
        issue: i64,
        /// Return date as YYYY-MM-DD
        #[arg(long)]
        date: String,
    },
    /// Send a lease contract PDF to the tenant for e-signature
    SendLease {
        /// Lease id
        #[arg(long)]
        lease: i64,
        /// Contract PDF to send
        #[arg(long, value_name = "PATH")]
        pdf: PathBuf,
    },
    /// Apply an e-signature callback body stored in a file
    SignCallback {
        /// JSON file with the callback body
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn parse_month(month: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
        .map_err(|_| Error::validation(format!("Invalid month '{month}', expected YYYY-MM")))
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| Error::validation(format!("Invalid date '{value}', expected YYYY-MM-DD")))
}

/// Reads a snake_case code such as `owner_use` into its enum.
fn parse_code<T: DeserializeOwned>(what: &str, value: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| Error::validation(format!("Unknown {what} '{value}'")))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn show_timeline(db: &DatabaseConnection, unit_id: i64) -> Result<()> {
    let unit = property::get_unit(db, UnitId(unit_id)).await?;
    let timeline = ledger::unit_timeline(db, UnitId(unit_id)).await?;

    println!("{} ({} intervals)", unit.label, timeline.len());
    for interval in &timeline {
        let reference = interval.reference();
        let end = interval.end().map_or_else(|| "open".to_string(), swiss_date);
        println!(
            "  {:?} #{}: {} - {}",
            reference.kind,
            reference.id,
            swiss_date(interval.start()),
            end
        );
    }
    for issue in ledger::check_timeline(&timeline) {
        println!("  issue: {issue:?}");
    }
    Ok(())
}

async fn render_statements(
    db: &DatabaseConnection,
    config: &AppConfig,
    period_id: i64,
    out: &Path,
) -> Result<()> {
    let statement = billing::build_statement(db, config, PeriodId(period_id)).await?;
    let renderer = TemplateDirRenderer::new(&config.documents);
    let today = Utc::now().date_naive();
    std::fs::create_dir_all(out)?;

    for line in &statement.lines {
        let prepared =
            documents::statement_context(&statement.period, &statement.building, line, today);
        let content = prepared.render(&renderer)?;
        let filename = prepared.filename(renderer.file_extension());
        std::fs::write(out.join(&filename), &content)?;

        documents::store_document(
            db,
            NewDocument {
                kind: DocumentKind::Statement,
                title: prepared.title.clone(),
                filename,
                content,
                lease_id: None,
                building_id: Some(BuildingId(statement.building.id)),
            },
        )
        .await?;
    }

    for warning in &statement.warnings {
        warn!(period_id, "{warning}");
    }
    info!(
        period_id,
        statements = statement.lines.len(),
        total = statement.total_allocated(),
        out = %out.display(),
        "Rendered statements"
    );
    Ok(())
}

async fn run(cmd: Commands, db: &DatabaseConnection, config: &AppConfig) -> Result<()> {
    match cmd {
        Commands::Init => {
            let buildings = property::list_buildings(db).await?;
            println!("{} buildings in the database", buildings.len());
        }
        Commands::Summary => {
            print_json(&report::portfolio_summary(db).await?)?;
        }
        Commands::Tickets => {
            for open in ticket::open_tickets(db).await? {
                println!(
                    "#{} [{:?}] {} - {}",
                    open.id,
                    open.priority,
                    open.status.label(),
                    open.subject
                );
            }
        }
        Commands::Timeline { unit } => show_timeline(db, unit).await?,
        Commands::Statement { period, out } => {
            render_statements(db, config, period, &out).await?;
        }
        Commands::RentBill { lease, month } => {
            let month = parse_month(&month)?;
            let bill = qr_bill::monthly_rent_bill(db, config, LeaseId(lease), month).await?;
            println!("{}", bill.payload()?);
        }
        Commands::RegistrySeed { building } => {
            let client = GeoAdminClient::new(&config.registry)?;
            let seed =
                registry::seed_building_from_registry(db, &client, BuildingId(building)).await?;
            for warning in &seed.warnings {
                warn!(building_id = building, "{warning}");
            }
            println!(
                "registry id {:?}, construction year {:?}, {} units created",
                seed.registry_id, seed.construction_year, seed.units_created
            );
        }
        Commands::LeaseStart {
            unit,
            tenant,
            start,
            net_rent,
            advance,
            deposit,
        } => {
            let mut input = NewLease::new(UnitId(unit), TenantId(tenant), parse_date(&start)?)
                .with_rent(net_rent, advance);
            input.deposit = deposit;
            let lease = ledger::start_lease(db, config.ledger.policy, input).await?;
            println!("lease {} started on {}", lease.id, swiss_date(lease.start_date));
        }
        Commands::VacancyStart {
            unit,
            start,
            reason,
            note,
        } => {
            let mut input = NewVacancy::new(
                UnitId(unit),
                parse_date(&start)?,
                parse_code::<VacancyReason>("vacancy reason", &reason)?,
            );
            input.note = note;
            let vacancy = ledger::start_vacancy(db, config.ledger.policy, input).await?;
            println!(
                "vacancy {} from {}",
                vacancy.id,
                swiss_date(vacancy.start_date)
            );
        }
        Commands::LeaseEnd {
            lease,
            end,
            vacancy,
        } => {
            let follow_up = vacancy
                .map(|reason| parse_code::<VacancyReason>("vacancy reason", &reason))
                .transpose()?;
            let ended = ledger::end_lease(
                db,
                config.ledger.policy,
                LeaseId(lease),
                parse_date(&end)?,
                follow_up,
            )
            .await?;
            println!(
                "lease {} ends {}",
                ended.lease.id,
                ended.lease.end_date.map_or_else(String::new, swiss_date)
            );
            if let Some(vacancy) = ended.vacancy {
                println!("vacancy {} opened", vacancy.id);
            }
        }
        Commands::PeriodCreate {
            building,
            label,
            start,
            end,
        } => {
            let period = billing::create_period(
                db,
                NewPeriod {
                    building_id: BuildingId(building),
                    label,
                    start_date: parse_date(&start)?,
                    end_date: parse_date(&end)?,
                },
            )
            .await?;
            println!("period {} ({}) created", period.id, period.label);
        }
        Commands::ExpenseAdd {
            period,
            date,
            description,
            category,
            amount,
            key,
        } => {
            let item = billing::add_expense_item(
                db,
                NewExpenseItem {
                    period_id: PeriodId(period),
                    date: parse_date(&date)?,
                    description,
                    category,
                    amount,
                    allocation_key: parse_code::<AllocationKey>("allocation key", &key)?,
                },
            )
            .await?;
            println!("expense item {} added", item.id);
        }
        Commands::KeyAdd {
            building,
            number,
            system,
            function,
            count,
        } => {
            let key = keys::create_key(
                db,
                NewKey {
                    building_id: BuildingId(building),
                    system,
                    number,
                    function,
                    total_count: count,
                },
            )
            .await?;
            println!("key {} ({}) registered", key.id, key.number);
        }
        Commands::KeyIssue {
            key,
            tenant,
            to,
            date,
            signed,
        } => {
            let recipient = match tenant {
                Some(tenant) => KeyRecipient::Tenant(TenantId(tenant)),
                None => KeyRecipient::External(to.unwrap_or_default()),
            };
            let issue = keys::issue_key(
                db,
                NewKeyIssue {
                    key_id: KeyId(key),
                    recipient,
                    issued_on: parse_date(&date)?,
                    signed,
                },
            )
            .await?;
            let left = keys::available(db, KeyId(key)).await?;
            println!("key issue {} recorded, {left} copies left", issue.id);
        }
        Commands::KeyReturn { issue, date } => {
            let returned = keys::return_key(db, KeyIssueId(issue), parse_date(&date)?).await?;
            let left = keys::available(db, KeyId(returned.key_id)).await?;
            println!("key issue {} returned, {left} copies left", returned.id);
        }
        Commands::SendLease { lease, pdf } => {
            let client = DocuSealClient::from_env(&config.signature)?;
            let renderer = PdfFileRenderer::new(pdf);
            let lease = signature::send_lease_for_signature(
                db,
                config,
                &renderer,
                &client,
                LeaseId(lease),
                Utc::now().date_naive(),
            )
            .await?;
            println!(
                "lease {} sent, tracking id {}",
                lease.id,
                lease.signature_tracking_id.unwrap_or_default()
            );
        }
        Commands::SignCallback { file } => {
            let body = std::fs::read(&file)?;
            let payload = signature::parse_callback(&body)?;
            let client = DocuSealClient::from_env(&config.signature)?;
            let outcome = signature::handle_signature_callback(db, &client, &payload).await?;
            for warning in &outcome.warnings {
                warn!("{warning}");
            }
            if outcome.is_ignored() {
                println!("callback ignored");
            } else {
                println!("lease {:?} now {:?}", outcome.lease_id, outcome.status);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();
    let cli = Cli::parse();

    // 3. Load the main application configuration
    let app_config = config::load_app_configuration()?;

    // 4. Initialize database
    let database_url = database::get_database_url(&app_config);
    if database_url.starts_with("sqlite://data/") {
        std::fs::create_dir_all("data")?;
    }
    let db = database::init_db(&database_url)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Seed configured buildings on first start
    property::seed_buildings(&db, &app_config)
        .await
        .inspect_err(|e| error!("Failed to seed buildings: {}", e))?;

    // 6. Run the command
    run(cli.cmd, &db, &app_config)
        .await
        .inspect_err(|e| error!(class = ?e.class(), "{e}"))
}
