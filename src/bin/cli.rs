use anyhow::Context;
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use dotenvy::dotenv;
use registrar::cli::seed_semesters;
use registrar::db::load_catalog;
use registrar::modules::authorization::engine::check_role_permission;
use registrar::modules::roles::service::RoleService;
use registrar::modules::semesters::service::SemesterService;
use registrar::registrar_config::{CatalogConfig, StorageBackend, StorageConfig};
use registrar::registrar_core::{AppError, PermissionCatalog};
use registrar::registrar_db::{init_db_pool, run_migrations};
use registrar::registrar_models::{RoleId, SemesterId};
use registrar::state::AppState;

#[derive(Parser)]
#[command(name = "registrar-cli")]
#[command(about = "Registrar CLI - Administrative tools for the Registrar API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the permission catalog
    Catalog,
    /// Insert the default roles that are missing
    SeedRoles,
    /// Create demo fall, spring and summer semesters for an academic year
    SeedSemesters {
        /// First calendar year of the academic year (defaults to the current year)
        #[arg(short = 'y', long)]
        year: Option<i32>,
    },
    /// Check whether a role holds a capability
    Check {
        /// Role id or role name
        #[arg(short = 'r', long)]
        role: String,

        /// Catalog module
        #[arg(short = 'm', long)]
        module: String,

        /// Module action
        #[arg(short = 'a', long)]
        action: String,
    },
    /// Make a semester the current one
    SetCurrentSemester {
        /// Semester id
        id: SemesterId,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("\n❌ {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let catalog = load_catalog(&CatalogConfig::from_env())?;

    if let Commands::Catalog = cli.command {
        print_catalog(&catalog);
        return Ok(());
    }

    let state = connect(catalog).await?;

    match cli.command {
        Commands::Catalog => Ok(()),
        Commands::SeedRoles => handle_seed_roles(&state).await,
        Commands::SeedSemesters { year } => handle_seed_semesters(&state, year).await,
        Commands::Check {
            role,
            module,
            action,
        } => handle_check(&state, &role, &module, &action).await,
        Commands::SetCurrentSemester { id, yes } => handle_set_current(&state, id, yes).await,
    }
}

/// Postgres-backed state regardless of `STORAGE_BACKEND`.
async fn connect(catalog: PermissionCatalog) -> anyhow::Result<AppState> {
    let mut storage = StorageConfig::from_env()?;
    storage.backend = StorageBackend::Postgres;

    let pool = init_db_pool(&storage).await?;
    run_migrations(&pool).await?;
    Ok(AppState::postgres(pool, catalog))
}

fn app_error(e: AppError) -> anyhow::Error {
    e.error
}

fn print_catalog(catalog: &PermissionCatalog) {
    for module in catalog.module_definitions() {
        println!("{} ({} / {})", module.id, module.name, module.name_localized);
        for action in &module.actions {
            println!("  - {}", action);
        }
    }
    println!("\n{} capabilities", catalog.capabilities().len());
}

async fn handle_seed_roles(state: &AppState) -> anyhow::Result<()> {
    let inserted = RoleService::seed_default_roles(state)
        .await
        .map_err(app_error)?;
    println!("✅ Seeded {} default role(s)", inserted);
    Ok(())
}

async fn handle_seed_semesters(state: &AppState, year: Option<i32>) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();
    let year = year.unwrap_or_else(|| today.year());

    let inserted = seed_semesters(state, year, today)
        .await
        .map_err(app_error)?;
    println!(
        "✅ Seeded {} semester(s) for academic year {}-{}",
        inserted,
        year,
        year + 1
    );
    Ok(())
}

async fn handle_check(
    state: &AppState,
    role: &str,
    module: &str,
    action: &str,
) -> anyhow::Result<()> {
    let role_id = match role.parse::<RoleId>() {
        Ok(id) => id,
        Err(_) => state
            .roles
            .find_by_name(role)
            .await
            .map_err(app_error)?
            .map(|r| r.id)
            .with_context(|| format!("Role '{}' not found", role))?,
    };

    let allowed = check_role_permission(&state.catalog, state.roles.as_ref(), role_id, module, action)
        .await
        .map_err(app_error)?;

    if allowed {
        println!("✅ {} may {}.{}", role, module, action);
    } else {
        println!("⛔ {} may not {}.{}", role, module, action);
    }
    Ok(())
}

async fn handle_set_current(state: &AppState, id: SemesterId, yes: bool) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();
    let semester = SemesterService::get_semester(state, id, today)
        .await
        .map_err(app_error)?;

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Make '{}' ({}) the current semester?",
                semester.semester.name, semester.semester.academic_year
            ))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            println!("Aborted");
            return Ok(());
        }
    }

    let updated = SemesterService::set_current_semester(state, id, today)
        .await
        .map_err(app_error)?;
    println!(
        "✅ '{}' is now the current semester (status: {:?})",
        updated.semester.name, updated.status
    );
    Ok(())
}
