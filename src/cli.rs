use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "knifepool")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Bootstrap a fleet of hosts with knife, in parallel", long_about = None)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,

    /// File containing hosts to be bootstrapped (tab-separated)
    #[arg(short, long, default_value = "./sample.tsv")]
    pub file: String,

    /// Config file (default: ~/.config/knifepool/config.toml)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Number of parallel bootstrap workers
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Directory for per-host output logs
    #[arg(long)]
    pub log_dir: Option<String>,

    /// Also write the error report as JSON to this file
    #[arg(long)]
    pub report: Option<String>,

    /// Dry run - show the commands that would run
    #[arg(short, long)]
    pub dry_run: bool,

    /// Exit with status 2 when any host failed
    #[arg(long)]
    pub fail_on_errors: bool,

    /// SSH user for the bootstrap
    #[arg(long, env = "superuserName", default_value = "", hide_env_values = true)]
    pub ssh_user: String,

    /// SSH password for the bootstrap (prefer the environment variable)
    #[arg(long, env = "superuserPw", default_value = "", hide_env_values = true)]
    pub ssh_password: String,
}
