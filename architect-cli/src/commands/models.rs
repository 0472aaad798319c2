//! AI models management commands.
//!
//! Provides commands for listing the models a key can reach and managing
//! API credentials.

use anyhow::{Result, bail};
use architect_models::{Capabilities, CredentialSource, ModelDescriptor, ModelResolver};
use clap::{Args, Subcommand};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use dialoguer::{Password, theme::ColorfulTheme};

use super::{Session, env_hint};

/// Models management arguments.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommands,
}

/// Models subcommands.
#[derive(Subcommand, Debug)]
pub enum ModelsCommands {
    /// List models available to your API key
    List {
        /// Provider to query (e.g., gemini, groq, xai, deepseek)
        #[arg(long, short)]
        provider: String,

        /// Filter by capability (text, vision)
        #[arg(long)]
        capability: Option<String>,
    },
    /// Manage API credentials
    Auth {
        /// Provider to configure (e.g., gemini, groq)
        provider: Option<String>,

        /// List configured providers
        #[arg(long)]
        list: bool,

        /// Delete stored credentials
        #[arg(long)]
        delete: bool,
    },
}

/// Run models command.
pub async fn run(args: ModelsArgs) -> Result<()> {
    match args.command {
        ModelsCommands::List {
            provider,
            capability,
        } => list_models(&provider, capability.as_deref()).await,
        ModelsCommands::Auth {
            provider,
            list,
            delete,
        } => manage_auth(provider, list, delete),
    }
}

/// List the live catalog of one provider.
async fn list_models(provider: &str, capability_filter: Option<&str>) -> Result<()> {
    let filter = capability_filter.map(parse_capability).transpose()?;
    let session = Session::load()?;
    let credential = session.credential(provider)?;
    let resolver = ModelResolver::new(session.registry.clone());

    let models = match &filter {
        Some(filter) => {
            resolver
                .list_models_matching(provider, &credential, filter)
                .await
        }
        None => resolver.list_models(provider, &credential).await,
    };
    let models = match models {
        Ok(models) => models,
        Err(err) => bail!("{err}\nhint: {}", err.kind.hint()),
    };

    if models.is_empty() {
        if filter.is_some() {
            println!("No models match the specified filters.");
        } else {
            println!("{provider} returned no models.");
        }
        return Ok(());
    }

    println!("{}", models_table(provider, &models));
    Ok(())
}

fn models_table(provider: &str, models: &[ModelDescriptor]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Model").fg(Color::Cyan),
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("Capabilities").fg(Color::Cyan),
    ]);

    for model in models {
        table.add_row(vec![
            Cell::new(&model.id),
            Cell::new(model.qualified_id(provider)),
            Cell::new(model.capabilities),
        ]);
    }
    table
}

/// Manage API credentials for providers.
fn manage_auth(provider: Option<String>, list: bool, delete: bool) -> Result<()> {
    let session = Session::load()?;
    let store = &session.credentials;

    // List configured providers
    if list {
        let providers = store.list_providers();
        if providers.is_empty() {
            println!("No API credentials configured.");
            println!();
            println!("Configure credentials with: architect models auth <provider>");
        } else {
            println!("Configured providers:");
            println!();
            for provider in providers {
                let source_str = match store.credential_source(&provider) {
                    Some(CredentialSource::Keyring) => "(keyring)",
                    Some(CredentialSource::Environment) => "(environment)",
                    None => "",
                };
                println!("  {provider} {source_str}");
            }
        }
        return Ok(());
    }

    // Require provider for other operations
    let Some(provider) = provider else {
        bail!("Provider required. Use --list to see configured providers.");
    };
    session.registry.get(&provider)?;

    // Delete credentials
    if delete {
        match store.delete(&provider) {
            Ok(()) => println!("Credentials for '{provider}' deleted."),
            Err(architect_models::Error::CredentialsNotFound(_)) => {
                println!("No credentials found for '{provider}'.");
            }
            Err(e) => bail!("Failed to delete credentials: {e}"),
        }
        return Ok(());
    }

    // Store new credentials (interactive)
    match env_hint(&provider) {
        Some(hint) => println!("Enter API key for {provider}. {hint}"),
        None => println!("Enter API key for {provider}."),
    }

    let key = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("API key")
        .interact()?;

    store.set(&provider, &key)?;
    println!("Credentials for '{provider}' saved to keyring.");

    Ok(())
}

/// Parse a capability string into a Capabilities filter.
fn parse_capability(cap: &str) -> Result<Capabilities> {
    let mut caps = Capabilities::default();

    match cap.to_lowercase().as_str() {
        "text" | "chat" => caps.text = true,
        "vision" | "image" | "images" => caps.vision = true,
        _ => bail!("Unknown capability '{cap}'. Valid: text, vision"),
    }

    Ok(caps)
}
