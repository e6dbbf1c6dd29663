use anyhow::Result;
use colored::Colorize;

use crate::config::Config;
use crate::console::{Console, ConsolePlayer};
use crate::game::run_solo;
use crate::graph::generator::Generator;
use crate::ledger::{PlayerSlot, ScoreLedger};
use crate::session::{Level, Mode, Session, SessionState};

pub fn run(
    mode: Option<Mode>,
    level: Option<Level>,
    player: Option<u8>,
    seed: Option<u64>,
) -> Result<()> {
    let config = Config::load_or_default();
    let player = match player {
        Some(number) => PlayerSlot::new(number)
            .ok_or_else(|| anyhow::anyhow!("Invalid player: {number}. Must be between 1 and 5."))?,
        None => config.player(),
    };
    let mode = mode.unwrap_or_else(|| config.mode());
    let level = level.unwrap_or_else(|| config.level());
    let mut generator = super::generator(seed, config.generator_config())?;

    let runtime = super::runtime()?;
    let mut console = Console::new();
    let mut ledger = ScoreLedger::new();
    runtime.block_on(play_one(
        &mut console,
        &mut generator,
        &mut ledger,
        player,
        mode,
        level,
    ))?;
    Ok(())
}

/// Play one puzzle at the console and record a solved score.
pub(crate) async fn play_one(
    console: &mut Console,
    generator: &mut Generator,
    ledger: &mut ScoreLedger,
    player: PlayerSlot,
    mode: Mode,
    level: Level,
) -> Result<SessionState> {
    let mut session = Session::new(mode, level);
    let state = run_solo(&mut session, generator, &mut ConsolePlayer::new(console)).await?;
    tracing::info!(%player, %mode, %level, ?state, "game over");

    if let SessionState::Solved { score } = state {
        if ledger.record(player, mode, score) {
            println!(
                "{}",
                format!("New best for {player} in {mode}: {score}").green()
            );
        }
    }
    console.settle().await;
    Ok(state)
}
