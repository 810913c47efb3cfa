//! Speakeasy CLI
//!
//! Dictation in, delivered message out: correct the text, resolve the
//! recipient against the contact directory, and send through Telegram.

use clap::{Parser, Subcommand};
use speakeasy::config::Config;
use speakeasy::correct::Corrector;
use speakeasy::delivery::{BotApiDelivery, Delivery, DryRunDelivery};
use speakeasy::directory::ContactDirectory;
use speakeasy::error::Error;
use speakeasy::pipeline::{self, PreparedMessage};
use speakeasy::Result;
use std::time::Duration;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Speakeasy - voice-dictation messaging assistant
#[derive(Parser)]
#[command(name = "speakeasy")]
#[command(about = "Correct dictated messages and deliver them to the right contact")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Correct a dictated message, resolve the recipient, and send it
    Send {
        /// Raw speech-to-text transcription
        text: String,

        /// Explicit recipient (name, alias, or @handle); otherwise detected
        #[arg(long)]
        to: Option<String>,

        /// Skip grammar correction entirely
        #[arg(long)]
        raw: bool,

        /// Prepare and log instead of hitting the network
        #[arg(long)]
        dry_run: bool,
    },

    /// Show what would be sent without sending it
    Preview {
        /// Raw speech-to-text transcription
        text: String,

        /// Explicit recipient (name, alias, or @handle); otherwise detected
        #[arg(long)]
        to: Option<String>,

        /// Skip grammar correction entirely
        #[arg(long)]
        raw: bool,
    },

    /// Manage the contact directory
    Contacts {
        #[command(subcommand)]
        command: ContactCommands,
    },

    /// Store the Telegram bot token in the contact store settings
    SetToken {
        token: String,
    },

    /// Show store, AI provider, and delivery status
    Status,
}

#[derive(Subcommand)]
enum ContactCommands {
    /// Add a contact
    Add {
        /// Display name (the contact id is derived from it)
        name: String,

        /// Telegram @username or phone number
        handle: String,

        #[arg(long, default_value = "colleague")]
        role: String,

        /// Extra alias (repeatable)
        #[arg(long = "alias")]
        aliases: Vec<String>,

        #[arg(long, default_value = "")]
        notes: String,
    },

    /// List all contacts
    List,

    /// Remove a contact by id
    Remove {
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = Config::default();

    match cli.command {
        Commands::Send {
            text,
            to,
            raw,
            dry_run,
        } => cmd_send(&config, &text, to.as_deref(), !raw, dry_run).await,
        Commands::Preview { text, to, raw } => {
            cmd_preview(&config, &text, to.as_deref(), !raw).await
        }
        Commands::Contacts { command } => match command {
            ContactCommands::Add {
                name,
                handle,
                role,
                aliases,
                notes,
            } => cmd_contacts_add(&config, &name, &handle, &role, &aliases, &notes),
            ContactCommands::List => cmd_contacts_list(&config),
            ContactCommands::Remove { id } => cmd_contacts_remove(&config, &id),
        },
        Commands::SetToken { token } => cmd_set_token(&config, &token),
        Commands::Status => cmd_status(&config),
    }
}

// ============================================================================
// CLI Commands
// ============================================================================

fn load_directory(config: &Config) -> Result<ContactDirectory> {
    let mut directory = ContactDirectory::new(config);
    let count = directory.load()?;
    debug!(contacts = count, "contact store loaded");
    Ok(directory)
}

async fn prepare_message(
    config: &Config,
    directory: &ContactDirectory,
    text: &str,
    to: Option<&str>,
    fix_grammar: bool,
) -> PreparedMessage {
    let corrector = Corrector::new(config);
    let prepared = pipeline::prepare(&corrector, directory, text, to, fix_grammar).await;
    if let Some(err) = &prepared.correction_error {
        warn!(error = %err, "AI correction degraded to basic cleanup");
    }
    prepared
}

async fn cmd_send(
    config: &Config,
    text: &str,
    to: Option<&str>,
    fix_grammar: bool,
    dry_run: bool,
) -> Result<()> {
    let directory = load_directory(config)?;
    let prepared = prepare_message(config, &directory, text, to, fix_grammar).await;
    let outbound = prepared.into_outbound()?;

    let mut delivery: Box<dyn Delivery> = if dry_run {
        Box::new(DryRunDelivery::new())
    } else {
        let token = bot_token(config, &directory)?;
        Box::new(BotApiDelivery::new(
            &token,
            Duration::from_secs(config.request_timeout_secs),
        ))
    };

    delivery.connect().await?;
    let entity = delivery.resolve_handle(&outbound.target.handle).await?;
    let message_id = delivery.send(&entity, &outbound.body).await?;
    delivery.disconnect().await?;

    println!(
        "Sent to {} ({}) as message {}",
        outbound.target.name, outbound.target.handle, message_id
    );
    println!("Body: {}", outbound.body);
    Ok(())
}

async fn cmd_preview(
    config: &Config,
    text: &str,
    to: Option<&str>,
    fix_grammar: bool,
) -> Result<()> {
    let directory = load_directory(config)?;
    let prepared = prepare_message(config, &directory, text, to, fix_grammar).await;

    println!("Original:   {}", prepared.original_text);
    println!("Corrected:  {}", prepared.corrected_text);
    println!("Body:       {}", prepared.body);
    match &prepared.target {
        Some(target) => println!("Recipient:  {} ({})", target.name, target.handle),
        None => println!(
            "Recipient:  unresolved (hint: {})",
            prepared.recipient_hint.as_deref().unwrap_or("none")
        ),
    }
    println!("Confidence: {:.2}", prepared.confidence);
    println!(
        "Ready:      {}",
        if prepared.is_ready() { "yes" } else { "no" }
    );
    Ok(())
}

fn cmd_contacts_add(
    config: &Config,
    name: &str,
    handle: &str,
    role: &str,
    aliases: &[String],
    notes: &str,
) -> Result<()> {
    let mut directory = load_directory(config)?;
    let id = directory.create(name, handle, role, aliases, notes)?;
    println!("Added {} ({} -> {})", id, name, handle);
    Ok(())
}

fn cmd_contacts_list(config: &Config) -> Result<()> {
    let directory = load_directory(config)?;

    if directory.is_empty() {
        println!("No contacts.");
        return Ok(());
    }

    for entry in directory.list() {
        println!(
            "{}  {}  {}  [{}]  aliases: {}",
            entry.id,
            entry.record.name,
            entry.record.handle,
            entry.record.role,
            entry.aliases.join(", ")
        );
    }
    Ok(())
}

fn cmd_contacts_remove(config: &Config, id: &str) -> Result<()> {
    let mut directory = load_directory(config)?;
    let removed = directory.delete(id)?;
    println!("Removed {} ({})", id, removed.name);
    Ok(())
}

fn cmd_set_token(config: &Config, token: &str) -> Result<()> {
    let mut directory = load_directory(config)?;
    directory.set_setting("telegram_bot_token", serde_json::json!(token))?;
    println!("Token saved to {}", config.store_file.display());
    Ok(())
}

fn cmd_status(config: &Config) -> Result<()> {
    let directory = load_directory(config)?;
    let corrector = Corrector::new(config);
    let delivery_configured = bot_token(config, &directory).is_ok();

    println!("Store:     {}", config.store_file.display());
    println!("Contacts:  {}", directory.len());
    println!("Grammar:   {}", corrector.active_provider());
    println!(
        "Delivery:  {}",
        if delivery_configured {
            "configured"
        } else {
            "not configured"
        }
    );
    Ok(())
}

/// Bot token from store settings, falling back to the environment
fn bot_token(config: &Config, directory: &ContactDirectory) -> Result<String> {
    directory
        .setting("telegram_bot_token")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .or_else(|| config.telegram_bot_token.clone())
        .ok_or_else(|| {
            Error::Config(
                "no Telegram bot token; run `speakeasy set-token` or set TELEGRAM_BOT_TOKEN"
                    .to_string(),
            )
        })
}
