mod commands;
mod terminal;

use commands::{CommandLine, Commands, cdn, rules};
use terminal::{logging, print, spinner};
use underlay_common::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose, commands.quiet);

    let cfg = Config {
        no_banner: commands.no_banner,
        quiet: commands.quiet,
        ..Config::default()
    };

    print::banner(cfg.no_banner, cfg.quiet);

    let result = match commands.command {
        Commands::Cdn(args) => {
            print::header("origin discovery", cfg.quiet);
            cdn::cdn(args, &cfg).await
        }
        Commands::Rules { refresh } => {
            print::header("exclusion rules", cfg.quiet);
            rules::rules(refresh, &cfg).await
        }
    };

    spinner::finish();
    if cfg.quiet == 0 {
        print::end_of_program();
    }
    result
}
