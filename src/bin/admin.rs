//! CLI administration tool for ab-redirector.
//!
//! Manages variants directly against the database, through the same
//! [`VariantService`] as the HTTP API, so the probability budget and its
//! per-link locking apply identically.
//!
//! # Usage
//!
//! ```bash
//! # Show the variants of short URL 42
//! cargo run --bin admin -- variant list 42
//!
//! # Send 30% of its traffic to another page
//! cargo run --bin admin -- variant add 42 https://b.example.com/ 0.3
//!
//! # Pause a variant
//! cargo run --bin admin -- variant set 7 --inactive
//!
//! # Delete a variant
//! cargo run --bin admin -- variant remove 7
//!
//! # Generate a SESSION_SECRET
//! cargo run --bin admin -- secret generate
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` or `DB_HOST` / `DB_PORT` / `DB_USER` / `DB_PASSWORD` / `DB_NAME`

use ab_redirector::application::services::VariantService;
use ab_redirector::config::Config;
use ab_redirector::domain::entities::{Variant, VariantPatch};
use ab_redirector::domain::probability::Probability;
use ab_redirector::infrastructure::persistence::{PgShortUrlRepository, PgVariantRepository};

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

type PgVariantService = VariantService<PgVariantRepository, PgShortUrlRepository>;

/// CLI tool for managing ab-redirector.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage the variants of short URLs
    Variant {
        #[command(subcommand)]
        action: VariantAction,
    },

    /// Session secret helpers
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Variant management subcommands.
#[derive(Subcommand)]
enum VariantAction {
    /// List the variants of a short URL with its budget usage
    List {
        /// Short URL id
        short_url_id: i64,
    },

    /// Add a variant to a short URL
    Add {
        /// Short URL id
        short_url_id: i64,

        /// Destination URL (http or https)
        target_url: String,

        /// Share of traffic between 0 and 1
        probability: f64,

        /// Create the variant paused
        #[arg(long)]
        inactive: bool,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Change a variant
    #[command(group(ArgGroup::new("state").args(["active", "inactive"])))]
    Set {
        /// Variant id
        id: i64,

        /// New destination URL
        #[arg(long)]
        target: Option<String>,

        /// New share of traffic between 0 and 1
        #[arg(long)]
        probability: Option<f64>,

        /// Resume the variant
        #[arg(long)]
        active: bool,

        /// Pause the variant
        #[arg(long)]
        inactive: bool,
    },

    /// Delete a variant
    Remove {
        /// Variant id
        id: i64,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Session secret subcommands.
#[derive(Subcommand)]
enum SecretAction {
    /// Generate a random value for SESSION_SECRET
    Generate {
        /// Print only the secret
        #[arg(long)]
        raw: bool,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    run(Cli::parse()).await
}

/// Executes one command. Only commands that need the database open a pool.
async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Secret { action } => handle_secret_action(action),
        Commands::Variant { action } => handle_variant_action(action, &connect().await?).await,
        Commands::Db { action } => handle_db_action(action, &connect().await?).await,
    }
}

async fn connect() -> Result<PgPool> {
    let database_url = Config::load_database_url()?;
    PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")
}

fn probability(value: f64) -> Result<Probability> {
    Probability::from_f64(value).with_context(|| format!("Invalid probability: {value}"))
}

fn state_label(variant: &Variant) -> ColoredString {
    if variant.is_active {
        "ACTIVE".green()
    } else {
        "PAUSED".yellow()
    }
}

/// Dispatches variant management commands.
async fn handle_variant_action(action: VariantAction, pool: &PgPool) -> Result<()> {
    let pool = Arc::new(pool.clone());
    let service = VariantService::new(
        Arc::new(PgVariantRepository::new(pool.clone())),
        Arc::new(PgShortUrlRepository::new(pool)),
    );

    match action {
        VariantAction::List { short_url_id } => list_variants(&service, short_url_id).await?,
        VariantAction::Add {
            short_url_id,
            target_url,
            probability: p,
            inactive,
            yes,
        } => add_variant(&service, short_url_id, &target_url, p, !inactive, yes).await?,
        VariantAction::Set {
            id,
            target,
            probability: p,
            active,
            inactive,
        } => {
            let patch = VariantPatch {
                target_url: target,
                probability: p.map(probability).transpose()?,
                is_active: match (active, inactive) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
            };
            set_variant(&service, id, patch).await?;
        }
        VariantAction::Remove { id, yes } => remove_variant(&service, id, yes).await?,
    }

    Ok(())
}

/// Lists the variants of a short URL.
///
/// # Output Format
///
/// ```text
/// Variants of short URL 42
///
///   ID   Probability  Status   Target
///   ─────────────────────────────────────────────────────────────
///   7    0.3000       ACTIVE   https://b.example.com/
///   9    0.2000       PAUSED   https://c.example.com/
///
///   Allocated: 0.3000  Remaining: 0.7000
/// ```
async fn list_variants(service: &PgVariantService, short_url_id: i64) -> Result<()> {
    println!(
        "{}",
        format!("📋 Variants of short URL {short_url_id}")
            .bright_blue()
            .bold()
    );
    println!();

    let variants = service
        .list_all(short_url_id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list variants: {}", e))?;
    let allocation = service
        .allocation(short_url_id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to compute allocation: {}", e))?;

    if variants.is_empty() {
        println!("{}", "  No variants, all traffic goes to the primary target".yellow());
        println!();
        return Ok(());
    }

    println!(
        "  {:<4} {:<12} {:<8} {}",
        "ID".bright_white().bold(),
        "Probability".bright_white().bold(),
        "Status".bright_white().bold(),
        "Target".bright_white().bold()
    );
    println!("  {}", "─".repeat(75).bright_black());

    for variant in &variants {
        println!(
            "  {:<4} {:<12} {:<8} {}",
            variant.id.to_string().bright_black(),
            variant.probability.to_string(),
            state_label(variant),
            variant.target_url.cyan()
        );
    }

    println!();
    println!(
        "  Allocated: {}  Remaining: {}",
        allocation.allocated.to_string().bright_white().bold(),
        allocation.remaining.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

/// Adds a variant after confirmation.
async fn add_variant(
    service: &PgVariantService,
    short_url_id: i64,
    target_url: &str,
    p: f64,
    is_active: bool,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "➕ Add Variant".bright_blue().bold());
    println!();

    let p = probability(p)?;

    println!("  Short URL:   {}", short_url_id.to_string().cyan());
    println!("  Target:      {}", target_url.cyan());
    println!("  Probability: {}", p.to_string().bright_yellow());
    println!("  Active:      {is_active}");
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Create this variant?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let variant = service
        .create(short_url_id, target_url, p, is_active)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create variant: {}", e))?;

    println!(
        "{} {}",
        "✅ Variant created with id".green().bold(),
        variant.id.to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

/// Applies a partial update to a variant.
async fn set_variant(service: &PgVariantService, id: i64, patch: VariantPatch) -> Result<()> {
    if patch.is_empty() {
        anyhow::bail!("Nothing to change: pass --target, --probability, --active or --inactive");
    }

    let variant = service
        .update(id, patch)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to update variant: {}", e))?;

    println!("{}", "✅ Variant updated".green().bold());
    println!("  Target:      {}", variant.target_url.cyan());
    println!("  Probability: {}", variant.probability.to_string().bright_yellow());
    println!("  Status:      {}", state_label(&variant));
    println!();

    Ok(())
}

/// Deletes a variant after confirmation (default: No).
async fn remove_variant(service: &PgVariantService, id: i64, skip_confirm: bool) -> Result<()> {
    println!("{}", "🗑  Remove Variant".bright_blue().bold());
    println!();

    let variant = service
        .get(id)
        .await
        .map_err(|e| anyhow::anyhow!("Variant lookup failed: {}", e))?;

    println!("  Variant:     {}", variant.id.to_string().bright_black());
    println!("  Target:      {}", variant.target_url.cyan());
    println!("  Probability: {}", variant.probability.to_string().bright_yellow());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete this variant?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    service
        .delete(id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to delete variant: {}", e))?;

    println!("{}", "✅ Variant deleted".green().bold());
    println!();

    Ok(())
}

fn handle_secret_action(action: SecretAction) -> Result<()> {
    match action {
        SecretAction::Generate { raw } => {
            let secret = generate_secret();
            if raw {
                println!("{secret}");
            } else {
                println!("{}", "🔑 Generated session secret".bright_blue().bold());
                println!();
                println!("  SESSION_SECRET={}", secret.bright_yellow().bold());
                println!();
            }
        }
    }

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;
            let variants: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ab_tests")
                .fetch_one(pool)
                .await?;
            let visits: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM redirect_visits")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Variants:   {}", variants.to_string().bright_green().bold());
            println!("  Visits:     {}", visits.to_string().bright_green().bold());
            println!();
        }
    }

    Ok(())
}

/// Generates a random session secret.
///
/// # Format
///
/// - Length: 48 characters
/// - Character set: A-Z, a-z, 0-9
fn generate_secret() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    const SECRET_LEN: usize = 48;

    let mut rng = rand::rng();

    (0..SECRET_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    fn test_generated_secret_is_long_enough() {
        let secret = generate_secret();
        assert!(secret.len() >= ab_redirector::config::MIN_SESSION_SECRET_LEN);
        assert_ne!(secret, generate_secret());
    }

    #[test]
    fn test_set_rejects_active_and_inactive_together() {
        let result = Cli::try_parse_from(["admin", "variant", "set", "7", "--active", "--inactive"]);
        assert!(result.is_err());
    }

    #[tokio::test]
    #[serial]
    async fn test_secret_generate_needs_no_database() {
        // SAFETY: Tests are run serially due to #[serial], so no concurrent access
        unsafe {
            env::set_var("DATABASE_URL", "postgres://nobody@127.0.0.1:1/unreachable");
        }

        let cli = Cli::try_parse_from(["admin", "secret", "generate", "--raw"]).unwrap();
        let result = run(cli).await;

        unsafe {
            env::remove_var("DATABASE_URL");
        }
        assert!(result.is_ok());
    }
}
