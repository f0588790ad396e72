//! Key command - manage the stored API credential.

use clap::{Args, Subcommand};
use console::style;

use super::{API_KEY_ENV, Context};

/// Arguments for the key command.
#[derive(Args)]
pub struct KeyArgs {
    #[command(subcommand)]
    command: KeyCommand,
}

#[derive(Subcommand)]
enum KeyCommand {
    /// Store an API key
    Set {
        /// The API key
        key: String,
    },

    /// Remove the stored API key
    Clear,

    /// Show which API key would be used
    Status,
}

pub async fn run(args: KeyArgs, ctx: &Context) -> anyhow::Result<()> {
    match args.command {
        KeyCommand::Set { key } => set_key(ctx, &key),
        KeyCommand::Clear => clear_key(ctx),
        KeyCommand::Status => show_status(ctx),
    }
}

fn set_key(ctx: &Context, key: &str) -> anyhow::Result<()> {
    if key.trim().is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    let store = ctx.settings_store();
    store.save_api_key(key)?;
    println!(
        "{} API key stored in {}",
        style("✓").green(),
        store.dir().display()
    );
    Ok(())
}

fn clear_key(ctx: &Context) -> anyhow::Result<()> {
    ctx.settings_store().clear_api_key()?;
    println!("{} Stored API key removed", style("✓").green());
    Ok(())
}

fn show_status(ctx: &Context) -> anyhow::Result<()> {
    let stored = ctx.settings_store().load().api_key;
    let env = std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty());

    match (env, stored) {
        (Some(key), _) => println!(
            "{} Using {} from {}",
            style("✓").green(),
            mask(&key),
            API_KEY_ENV
        ),
        (None, Some(key)) => println!(
            "{} Using stored key {}",
            style("✓").green(),
            mask(&key)
        ),
        (None, None) => {
            println!("{} No API key configured", style("⚠").yellow());
            println!("Run: invox key set <KEY>");
        }
    }

    Ok(())
}

/// Show only the first few characters of a secret.
fn mask(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    format!("{}…", visible)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_hides_secret() {
        assert_eq!(mask("AIzaSyExampleKey"), "AIza…");
        assert_eq!(mask("ab"), "ab…");
    }
}
