use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use dotenvy::dotenv;
use registrar::events::{EventBus, TracingEventSink};
use registrar::modules::matricules::MatriculeService;
use registrar::modules::matricules::batch::{
    BatchReport, StudentBatchTarget, run_student_batch, run_user_batch,
};
use registrar_cli::seeder::{self, SeedConfig};
use registrar_config::{DatabaseConfig, MatriculeConfig};
use registrar_db::{AccountFilter, Backend, EnrollmentFilter};
use registrar_models::{ClassId, UserId};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "registrar-cli")]
#[command(about = "Registrar CLI - matricule backfill and seeding tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate matricules for accounts
    GenerateUser {
        /// Only this account
        #[arg(long, conflicts_with = "all")]
        user_id: Option<UserId>,

        /// Every account lacking a matricule (or every account with --force)
        #[arg(long)]
        all: bool,

        /// Replace existing matricules
        #[arg(long)]
        force: bool,
    },
    /// Generate student matricules or registration numbers for enrollments
    GenerateStudent {
        /// Only enrollments in this class
        #[arg(long, conflicts_with = "all")]
        class_id: Option<ClassId>,

        /// Every enrollment
        #[arg(long)]
        all: bool,

        /// Regenerate registration numbers instead of student matricules
        #[arg(long)]
        registration: bool,

        /// Replace existing identifiers
        #[arg(long)]
        force: bool,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Print a non-sequential matricule that is not yet taken
    Random {
        #[arg(short = 'p', long)]
        prefix: String,
    },
    /// Seed the database with fake schools, staff and students
    Seed {
        /// Number of schools to create
        #[arg(short = 's', long, default_value = "1")]
        schools: usize,

        /// Number of staff accounts
        #[arg(long, default_value = "20")]
        accounts: usize,

        /// Number of enrolled students
        #[arg(long, default_value = "50")]
        students: usize,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "registrar=warn,registrar_db=warn".into()),
        )
        .compact()
        .init();

    let cli = Cli::parse();

    let store = match Backend::connect(&DatabaseConfig::from_env()).await {
        Ok(store) => store,
        Err(e) => {
            eprintln!("❌ Failed to open the store: {:#}", e);
            std::process::exit(1);
        }
    };
    let matricules = MatriculeService::new(store, MatriculeConfig::from_env());
    let events = EventBus::new().with_sink(Arc::new(TracingEventSink));

    match cli.command {
        Commands::GenerateUser {
            user_id,
            all,
            force,
        } => handle_generate_user(&matricules, &events, user_id, all, force).await,
        Commands::GenerateStudent {
            class_id,
            all,
            registration,
            force,
            yes,
        } => {
            handle_generate_student(&matricules, &events, class_id, all, registration, force, yes)
                .await
        }
        Commands::Random { prefix } => handle_random(&matricules, &prefix).await,
        Commands::Seed {
            schools,
            accounts,
            students,
        } => handle_seed(&matricules, &events, schools, accounts, students).await,
    }
}

async fn handle_generate_user(
    matricules: &MatriculeService<Backend>,
    events: &EventBus,
    user_id: Option<UserId>,
    all: bool,
    force: bool,
) {
    if user_id.is_none() && !all {
        eprintln!("❌ Pass --user-id <id> or --all");
        std::process::exit(2);
    }

    let filter = AccountFilter {
        id: user_id,
        missing_matricule_only: false,
    };

    match run_user_batch(matricules, events, filter, force).await {
        Ok(report) => print_report("accounts", &report),
        Err(e) => {
            eprintln!("\n❌ Error generating matricules: {}", e);
            std::process::exit(1);
        }
    }
}

async fn handle_generate_student(
    matricules: &MatriculeService<Backend>,
    events: &EventBus,
    class_id: Option<ClassId>,
    all: bool,
    registration: bool,
    force: bool,
    yes: bool,
) {
    if class_id.is_none() && !all {
        eprintln!("❌ Pass --class-id <id> or --all");
        std::process::exit(2);
    }

    let target = if registration {
        StudentBatchTarget::RegistrationNumber
    } else {
        StudentBatchTarget::Matricule
    };

    if force && !yes {
        let what = match target {
            StudentBatchTarget::RegistrationNumber => "registration numbers",
            StudentBatchTarget::Matricule => "student matricules",
        };
        let confirmed = Confirm::new()
            .with_prompt(format!("Replace existing {}?", what))
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirmed {
            println!("Aborted.");
            return;
        }
    }

    let filter = EnrollmentFilter { id: None, class_id };

    match run_student_batch(matricules, events, filter, target, force).await {
        Ok(report) => print_report("enrollments", &report),
        Err(e) => {
            eprintln!("\n❌ Error generating student identifiers: {}", e);
            std::process::exit(1);
        }
    }
}

async fn handle_random(matricules: &MatriculeService<Backend>, prefix: &str) {
    match matricules.generate_random_matricule(prefix).await {
        Ok(matricule) => println!("{}", matricule),
        Err(e) => {
            eprintln!("❌ Error generating matricule: {}", e);
            std::process::exit(1);
        }
    }
}

async fn handle_seed(
    matricules: &MatriculeService<Backend>,
    events: &EventBus,
    schools: usize,
    accounts: usize,
    students: usize,
) {
    let config = SeedConfig::new(schools)
        .with_accounts(accounts)
        .with_students(students);

    match seeder::seed_all(matricules, events, config).await {
        Ok(summary) => {
            println!(
                "   {} schools, {} staff accounts, {} students",
                summary.schools, summary.accounts, summary.students
            );
        }
        Err(e) => {
            eprintln!("\n❌ Error seeding database: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn print_report(noun: &str, report: &BatchReport) {
    for assignment in &report.assignments {
        println!("✅ {} → {}", assignment.subject_id, assignment.identifier);
    }
    for failure in &report.failures {
        eprintln!("❌ {}: {}", failure.id, failure.error);
    }

    println!(
        "\n{} {} processed: {} generated, {} skipped, {} failed",
        report.processed,
        noun,
        report.generated,
        report.skipped,
        report.failures.len()
    );

    if !report.is_clean() {
        std::process::exit(1);
    }
}
