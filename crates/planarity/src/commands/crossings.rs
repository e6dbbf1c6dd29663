use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use crate::graph::{Puzzle, crossing_pairs};
use crate::multiplayer::wire::{decode_edges, decode_nodes};

pub fn run(file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let puzzle = parse_puzzle(&text).with_context(|| format!("Invalid puzzle in {}", file.display()))?;

    let edges = puzzle.edges();
    let pairs: Vec<_> = crossing_pairs(&puzzle.nodes, edges).collect();
    if pairs.is_empty() {
        println!("{}", "0 crossings: the layout is planar.".green().bold());
        return Ok(());
    }
    println!("{}", format!("{} crossings", pairs.len()).yellow().bold());
    for (i, j) in pairs {
        println!("  {} crosses {}", edges[i], edges[j]);
    }
    Ok(())
}

/// Read a puzzle as JSON, as the two wire payloads on separate lines, or as YAML.
pub fn parse_puzzle(text: &str) -> Result<Puzzle> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') {
        let puzzle: Puzzle = serde_json::from_str(text)?;
        return Ok(puzzle.validated()?);
    }
    if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        let mut lines = trimmed.lines().map(str::trim).filter(|l| !l.is_empty());
        let nodes = lines.next().unwrap_or_default();
        let edges = lines
            .next()
            .ok_or_else(|| anyhow::anyhow!("Wire format needs an edge line after the node line"))?;
        let puzzle = Puzzle::new(decode_nodes(nodes)?, decode_edges(edges)?)?;
        return Ok(puzzle);
    }
    let puzzle: Puzzle = serde_yaml::from_str(text)?;
    Ok(puzzle.validated()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::PuzzleFormat;
    use crate::commands::generate::render;
    use crate::graph::{reference_layout, topology};

    fn scrambled() -> Puzzle {
        let mut nodes = reference_layout();
        nodes.0.swap(0, 1);
        Puzzle::new(nodes, topology(12)).unwrap()
    }

    #[test]
    fn reads_every_generated_format() {
        let puzzle = scrambled();
        for format in [PuzzleFormat::Wire, PuzzleFormat::Yaml, PuzzleFormat::Json] {
            let text = render(&puzzle, format).unwrap();
            assert_eq!(parse_puzzle(&text).unwrap(), puzzle, "{format:?}");
        }
    }

    #[test]
    fn wire_needs_both_lines() {
        let err = parse_puzzle("5,41;6,42;7,43;8,44;9,45;10,46;e\n").unwrap_err();
        assert!(err.to_string().contains("edge line"));
    }

    #[test]
    fn wire_edge_line_needs_ten_edges() {
        let err = parse_puzzle("5,41;6,42;7,43;8,44;9,45;10,46;e\n0,1;1,2;\n").unwrap_err();
        assert!(err.to_string().contains("at least 10 edges"), "{err}");
    }

    #[test]
    fn yaml_edges_are_validated() {
        let text = "nodes: [{x: 5, y: 41}, {x: 6, y: 41}, {x: 7, y: 41}, \
                    {x: 8, y: 41}, {x: 9, y: 41}, {x: 10, y: 41}]\n\
                    edges: [[0, 7]]\n";
        assert!(parse_puzzle(text).is_err());
    }
}
