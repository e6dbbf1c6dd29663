pub mod completion;
pub mod config;
pub mod crossings;
pub mod duel;
pub mod generate;
pub mod menu;
pub mod play;
pub mod survey;

use anyhow::{Context, Result};

use crate::graph::generator::{Generator, GeneratorConfig};

/// Single-threaded runtime the game loops run on.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to start the game runtime")
}

/// Seeded generator when `seed` is given, otherwise from OS entropy.
pub(crate) fn generator(seed: Option<u64>, config: GeneratorConfig) -> Result<Generator> {
    let generator = match seed {
        Some(seed) => Generator::from_seed(seed, config)?,
        None => Generator::from_entropy(config)?,
    };
    Ok(generator)
}
