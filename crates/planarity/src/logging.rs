use tracing_subscriber::EnvFilter;

/// Filter directive for the command-line verbosity flags.
pub fn directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over the flags.
pub fn init(verbose: u8, quiet: bool, no_color: bool) {
    if no_color {
        colored::control::set_override(false);
    }
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directive(verbose, quiet)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_target(verbose > 1)
        .try_init();
}
