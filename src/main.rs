use campusflow::cli::commands::Cli;
use campusflow::cli::handlers;
use campusflow::io::config_io;
use campusflow::logging;
use clap::Parser;

fn main() {
    let cli = Cli::parse();

    let config = match config_io::read_config(&config_io::config_path()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };
    logging::init_logging(cli.verbose, config.log.level.as_deref());

    if let Err(e) = handlers::dispatch(cli, config) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
