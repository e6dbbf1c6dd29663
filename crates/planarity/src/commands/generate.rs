use anyhow::Result;

use crate::cli::PuzzleFormat;
use crate::config::Config;
use crate::graph::Puzzle;
use crate::multiplayer::wire::{encode_edges, encode_nodes};

pub fn run(seed: Option<u64>, format: PuzzleFormat) -> Result<()> {
    let config = Config::load_or_default();
    let mut generator = super::generator(seed, config.generator_config())?;
    let generated = generator.generate_detailed()?;
    tracing::info!(
        crossings = generated.puzzle.crossings(),
        edges = generated.puzzle.edges().len(),
        rejections = generated.rejections,
        "generated puzzle"
    );
    tracing::debug!(
        lines = ?generated.arrangement.lines,
        intersections = ?generated.arrangement.intersections,
        "line arrangement"
    );
    print!("{}", render(&generated.puzzle, format)?);
    Ok(())
}

/// Text form of `puzzle`, newline-terminated.
pub fn render(puzzle: &Puzzle, format: PuzzleFormat) -> Result<String> {
    let text = match format {
        PuzzleFormat::Wire => format!(
            "{}\n{}\n",
            encode_nodes(&puzzle.nodes),
            encode_edges(puzzle.edges())
        ),
        PuzzleFormat::Yaml => serde_yaml::to_string(puzzle)?,
        PuzzleFormat::Json => format!("{}\n", serde_json::to_string_pretty(puzzle)?),
    };
    Ok(text)
}
