use anyhow::Result;
use colored::Colorize;
use rayon::prelude::*;
use std::collections::BTreeMap;

use crate::config::Config;
use crate::graph::generator::{Generated, Generator, GeneratorConfig, GeneratorError};

/// Aggregate over a batch of generated puzzles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Survey {
    pub generated: u64,
    pub failures: u64,
    /// Puzzles per edge count.
    pub edge_counts: BTreeMap<usize, u64>,
    pub min_crossings: Option<usize>,
    pub max_crossings: Option<usize>,
    pub total_crossings: u64,
    pub total_rejections: u64,
}

impl Survey {
    fn add(mut self, result: Result<Generated, GeneratorError>) -> Self {
        match result {
            Ok(generated) => {
                let crossings = generated.puzzle.crossings();
                self.generated += 1;
                *self
                    .edge_counts
                    .entry(generated.puzzle.edges().len())
                    .or_default() += 1;
                self.min_crossings = Some(self.min_crossings.map_or(crossings, |m| m.min(crossings)));
                self.max_crossings = Some(self.max_crossings.map_or(crossings, |m| m.max(crossings)));
                self.total_crossings += crossings as u64;
                self.total_rejections += u64::from(generated.rejections);
            }
            Err(e) => {
                tracing::debug!("generation failed: {e}");
                self.failures += 1;
            }
        }
        self
    }

    fn merge(mut self, other: Self) -> Self {
        self.generated += other.generated;
        self.failures += other.failures;
        for (edges, count) in other.edge_counts {
            *self.edge_counts.entry(edges).or_default() += count;
        }
        self.min_crossings = match (self.min_crossings, other.min_crossings) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.max_crossings = self.max_crossings.max(other.max_crossings);
        self.total_crossings += other.total_crossings;
        self.total_rejections += other.total_rejections;
        self
    }

    pub fn mean_crossings(&self) -> f64 {
        if self.generated == 0 {
            return 0.0;
        }
        self.total_crossings as f64 / self.generated as f64
    }

    pub fn mean_rejections(&self) -> f64 {
        if self.generated == 0 {
            return 0.0;
        }
        self.total_rejections as f64 / self.generated as f64
    }
}

/// Generate `count` puzzles in parallel, puzzle `i` from seed `base + i`.
pub fn survey(count: u64, base: u64, config: &GeneratorConfig) -> Survey {
    (0..count)
        .into_par_iter()
        .map(|i| {
            Generator::from_seed(base.wrapping_add(i), config.clone())
                .and_then(|mut generator| generator.generate_detailed())
        })
        .fold(Survey::default, Survey::add)
        .reduce(Survey::default, Survey::merge)
}

pub fn run(count: u64, seed: Option<u64>, quiet: bool) -> Result<()> {
    let config = Config::load_or_default();
    let base = seed.unwrap_or_else(rand::random);
    if !quiet {
        println!("Generating {count} puzzles from seed {base}...");
    }
    let report = survey(count, base, &config.generator_config());

    println!("{}", "Generator survey".bold());
    println!("  generated        {}", report.generated);
    if report.failures > 0 {
        println!("  failures         {}", report.failures.to_string().red());
    } else {
        println!("  failures         {}", "0".green());
    }
    for (edges, n) in &report.edge_counts {
        let share = *n as f64 * 100.0 / report.generated.max(1) as f64;
        println!("  {edges:>2} edges         {n} ({share:.1}%)");
    }
    if let (Some(min), Some(max)) = (report.min_crossings, report.max_crossings) {
        println!(
            "  crossings        min {min}, max {max}, mean {:.2}",
            report.mean_crossings()
        );
    }
    println!("  rejections/puzzle {:.2}", report.mean_rejections());
    Ok(())
}
