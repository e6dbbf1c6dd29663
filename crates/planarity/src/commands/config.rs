use anyhow::Result;
use colored::Colorize;

use crate::cli::ConfigCommands;
use crate::config::Config;

pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(),
        ConfigCommands::Set { key, value } => set(&key, &value),
    }
}

fn show() -> Result<()> {
    let path = Config::path()?;
    let config = Config::load_or_default();
    if path.exists() {
        println!("{} {}", "Config file:".bold(), path.display());
    } else {
        println!(
            "{} {} {}",
            "Config file:".bold(),
            path.display(),
            "(not created yet, showing defaults)".dimmed()
        );
    }
    println!();
    for (key, value) in config.effective() {
        println!("  {} {value}", format!("{key:<32}").cyan());
    }
    Ok(())
}

fn set(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load_or_default();
    config.set(key, value)?;
    let path = config.save()?;
    println!(
        "{} {key} = {value} ({})",
        "Saved".green().bold(),
        path.display()
    );
    Ok(())
}
