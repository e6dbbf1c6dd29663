use anyhow::Result;
use colored::Colorize;
use inquire::{InquireError, Select};
use std::fmt::Display;

use crate::config::Config;
use crate::console::Console;
use crate::ledger::{PlayerSlot, ScoreLedger};
use crate::multiplayer::Role;
use crate::session::{Level, Mode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuItem {
    Singleplayer,
    Multiplayer,
    Leaderboard,
    Quit,
}

impl Display for MenuItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Singleplayer => "Singleplayer",
            Self::Multiplayer => "Multiplayer",
            Self::Leaderboard => "Leaderboard",
            Self::Quit => "Quit",
        };
        f.write_str(name)
    }
}

/// Ask for one of `options`. `None` when the user escapes out.
fn choose<T: Display + Copy + PartialEq>(
    prompt: &str,
    options: Vec<T>,
    current: T,
) -> Result<Option<T>> {
    let cursor = options.iter().position(|o| *o == current).unwrap_or(0);
    match Select::new(prompt, options)
        .with_starting_cursor(cursor)
        .prompt()
    {
        Ok(choice) => Ok(Some(choice)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// The main menu. The leaderboard lives as long as this loop.
pub fn run() -> Result<()> {
    let config = Config::load_or_default();
    let runtime = super::runtime()?;
    let mut console = Console::new();
    let mut ledger = ScoreLedger::new();
    let mut generator = super::generator(None, config.generator_config())?;
    let mut player = config.player();
    let mut mode = config.mode();
    let mut level = config.level();
    let mut role = Role::Host;

    println!("{}", "Planarity".bold());
    loop {
        let items = vec![
            MenuItem::Singleplayer,
            MenuItem::Multiplayer,
            MenuItem::Leaderboard,
            MenuItem::Quit,
        ];
        match choose("Main menu", items, MenuItem::Singleplayer)? {
            Some(MenuItem::Singleplayer) => {
                let Some(p) = choose("Player", PlayerSlot::all().collect(), player)? else {
                    continue;
                };
                let Some(m) = choose("Mode", Mode::all().to_vec(), mode)? else {
                    continue;
                };
                let Some(l) = choose("Level", Level::all().to_vec(), level)? else {
                    continue;
                };
                (player, mode, level) = (p, m, l);
                runtime.block_on(super::play::play_one(
                    &mut console,
                    &mut generator,
                    &mut ledger,
                    player,
                    mode,
                    level,
                ))?;
            }
            Some(MenuItem::Multiplayer) => {
                let Some(r) = choose("Role", vec![Role::Host, Role::Join], role)? else {
                    continue;
                };
                role = r;
                let played = runtime.block_on(super::duel::play_match(&mut console, &config, role, None));
                if let Err(e) = played {
                    println!("{}", format!("Match failed: {e:#}").red());
                }
            }
            Some(MenuItem::Leaderboard) => print_leaderboard(&ledger),
            Some(MenuItem::Quit) | None => return Ok(()),
        }
    }
}

/// One line per player and mode, the leader of each mode starred.
pub fn leaderboard_lines(ledger: &ScoreLedger) -> Vec<String> {
    let mut lines = Vec::new();
    for &mode in Mode::all() {
        lines.push(mode.display_name().to_string());
        for player in PlayerSlot::all() {
            let line = match ledger.best(player, mode) {
                Some(score) if ledger.is_leader(player, mode) => format!("  {player}  {score} *"),
                Some(score) => format!("  {player}  {score}"),
                None => format!("  {player}  -"),
            };
            lines.push(line);
        }
    }
    lines
}

fn print_leaderboard(ledger: &ScoreLedger) {
    for line in leaderboard_lines(ledger) {
        if line.ends_with('*') {
            println!("{}", line.green().bold());
        } else if line.starts_with(' ') {
            println!("{line}");
        } else {
            println!("{}", line.bold());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(n: u8) -> PlayerSlot {
        PlayerSlot::new(n).unwrap()
    }

    #[test]
    fn empty_leaderboard() {
        let lines = leaderboard_lines(&ScoreLedger::new());
        assert_eq!(lines.len(), 3 * 6);
        assert_eq!(lines[0], "Classic");
        assert_eq!(lines[1], "  Player 1  -");
    }

    #[test]
    fn ties_are_all_starred() {
        let mut ledger = ScoreLedger::new();
        ledger.record(slot(2), Mode::Crazy, 12);
        ledger.record(slot(4), Mode::Crazy, 12);
        ledger.record(slot(5), Mode::Crazy, 30);
        let lines = leaderboard_lines(&ledger);
        let crazy = &lines[12..18];
        assert_eq!(crazy[0], "Crazy");
        assert_eq!(crazy[2], "  Player 2  12 *");
        assert_eq!(crazy[4], "  Player 4  12 *");
        assert_eq!(crazy[5], "  Player 5  30");
    }
}
