use anyhow::Result;
use colored::Colorize;
use tracing::warn;

use crate::bot::Autoplayer;
use crate::config::Config;
use crate::console::{Console, ConsolePlayer};
use crate::multiplayer::{MatchOutcome, MemoryBroker, Role, run_match};

pub fn run(role: Role, seed: Option<u64>) -> Result<()> {
    let config = Config::load_or_default();
    let runtime = super::runtime()?;
    let mut console = Console::new();
    runtime.block_on(play_match(&mut console, &config, role, seed))?;
    Ok(())
}

/// Play one match at the console against the autoplayer, which takes the
/// other role on a fresh in-memory broker.
pub(crate) async fn play_match(
    console: &mut Console,
    config: &Config,
    role: Role,
    seed: Option<u64>,
) -> Result<MatchOutcome> {
    let broker = MemoryBroker::new();
    let local_settings = config.match_settings(role);
    let bot_settings = config.match_settings(role.other());
    // Only the host side ever generates, so both can share the seed.
    let mut local_generator = super::generator(seed, config.generator_config())?;
    let mut bot_generator = super::generator(seed, config.generator_config())?;
    let mut bot = Autoplayer::new(config.bot_delay());

    println!(
        "{}",
        format!("Playing as {role} against the autoplayer. Type `start` when paired.").bold()
    );
    let outcome = {
        let mut player = ConsolePlayer::new(console);
        let local = run_match(&broker, &local_settings, &mut local_generator, &mut player);
        let remote = run_match(&broker, &bot_settings, &mut bot_generator, &mut bot);
        tokio::pin!(local);
        tokio::select! {
            outcome = &mut local => outcome,
            result = remote => {
                if let Err(e) = result {
                    warn!("autoplayer stopped: {e}");
                }
                local.await
            }
        }
    };
    console.settle().await;
    tracing::debug!(messages = broker.published().len(), "match traffic");
    let outcome = outcome?;

    match outcome {
        MatchOutcome::Won { score } => {
            println!("{}", format!("You won! Score {score}").green().bold())
        }
        MatchOutcome::Lost => println!("{}", "The autoplayer won this one.".red().bold()),
        MatchOutcome::Cancelled => println!("{}", "Match cancelled.".yellow()),
        MatchOutcome::Abandoned => println!(
            "{}",
            "Left mid-transfer; the autoplayer would have given up once its retries ran out.".yellow()
        ),
        MatchOutcome::Left => println!("{}", "You left the match.".yellow()),
    }
    Ok(outcome)
}
