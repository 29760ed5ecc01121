pub mod cdn;
pub mod rules;

use clap::{ArgAction, Args, Parser, Subcommand};
use underlay_common::models::signal::SignalKind;
use underlay_common::target::Target;

#[derive(Parser)]
#[command(name = "underlay", version)]
#[command(about = "Finds the origin servers of sites hidden behind a CDN.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Less output (-q hides headers, -qq prints results only)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Do not print the banner
    #[arg(long, global = true)]
    pub no_banner: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search the index for the origin of a CDN-fronted site
    #[command(alias = "c")]
    Cdn(CdnArgs),
    /// Show or refresh the cached CDN address ranges
    #[command(alias = "r")]
    Rules {
        /// Download both provider lists again, ignoring cache age
        #[arg(long)]
        refresh: bool,
    },
}

#[derive(Args)]
pub struct CdnArgs {
    /// Host or URL of the target site
    #[arg(short, long)]
    pub url: Target,

    /// Signal kinds to search with, comma separated (host, title, icon)
    #[arg(short, long, value_delimiter = ',')]
    pub pattern: Vec<SignalKind>,

    /// Append the results to logs/<host>.log
    #[arg(long)]
    pub log: bool,

    /// Print the results as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Index account email, overrides fofa.json
    #[arg(long, env = "UNDERLAY_FOFA_EMAIL", hide_env_values = true)]
    pub email: Option<String>,

    /// Index API key, overrides fofa.json
    #[arg(long, env = "UNDERLAY_FOFA_KEY", hide_env_values = true)]
    pub key: Option<String>,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
