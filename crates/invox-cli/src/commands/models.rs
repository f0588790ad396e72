//! Models command - list extraction models and pick the preferred one.

use clap::{Args, Subcommand};
use console::style;

use invox_core::settings::ModelChoice;

use super::{Context, parse_model};

/// Arguments for the models command.
#[derive(Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    command: ModelsCommand,
}

#[derive(Subcommand)]
enum ModelsCommand {
    /// List available models
    List,

    /// Set the preferred model
    Use {
        /// Model identifier (e.g. gemini-2.5-pro)
        #[arg(value_parser = parse_model)]
        model: ModelChoice,
    },
}

pub async fn run(args: ModelsArgs, ctx: &Context) -> anyhow::Result<()> {
    match args.command {
        ModelsCommand::List => list_models(ctx),
        ModelsCommand::Use { model } => use_model(ctx, model),
    }
}

fn list_models(ctx: &Context) -> anyhow::Result<()> {
    println!("{}", style("Available Models").bold());
    println!();

    let active = ctx.settings_store().load().model;

    for model in ModelChoice::ALL {
        let active_marker = if model == active { " (active)" } else { "" };
        println!(
            "{} {}{}",
            style(format!("▸ {:<24}", model.id())).bold().cyan(),
            style(model.description()).dim(),
            style(active_marker).green().bold()
        );
    }

    println!();
    println!("Commands:");
    println!("  invox models use <model>          Switch the preferred model");
    println!("  invox extract <file> -m <model>   Use a model for one run");

    Ok(())
}

fn use_model(ctx: &Context, model: ModelChoice) -> anyhow::Result<()> {
    ctx.settings_store().save_model(model)?;
    println!(
        "{} Switched to {}",
        style("✓").green(),
        style(model.id()).cyan().bold()
    );
    Ok(())
}
