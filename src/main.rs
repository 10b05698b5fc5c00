use anyhow::Result;
use linkroute::cli;

fn main() -> Result<()> {
    // Process CLI arguments first (before logging init for cleaner output)
    let options = match cli::process_cli() {
        cli::CliResult::Exit(code) => {
            if code == 0 {
                return Ok(());
            }
            std::process::exit(code);
        }
        cli::CliResult::Continue(options) => options,
    };
    // Routes log::info!() etc. to <tmp>/linkroute_debug.log; --log-level wins over DEBUG_LEVEL.
    linkroute::debug::init_log_bridge(options.log_level);

    log::info!("Starting linkroute {}", linkroute::VERSION);

    match cli::run(options) {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("linkroute: error: {e:#}");
            log::error!("{e:#}");
            std::process::exit(1);
        }
    }
}
