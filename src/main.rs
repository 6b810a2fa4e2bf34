use anyhow::Result;
use clap::Parser;
use protonfetcher::commands::{
    self, Config, DEFAULT_EXTRACT_DIR, DEFAULT_OUTPUT_DIR, Request, Settings,
};
use protonfetcher::fork::Fork;
use protonfetcher::runtime::RealRuntime;
use std::io::Write;
use std::path::PathBuf;

/// protonfetcher - fetch and extract Proton releases
///
/// Downloads a GE-Proton, Proton-EM or CachyOS release from GitHub,
/// unpacks it into Steam's compatibility tools directory and points the
/// fork's three links at the newest installed versions.
///
/// If the GITHUB_TOKEN environment variable is set, it is used for
/// authentication, which avoids the anonymous API rate limit.
#[derive(Parser, Debug)]
#[command(author, version = env!("PROTONFETCHER_VERSION"), about)]
struct Cli {
    /// Directory to extract the asset to
    #[arg(
        long = "extract-dir",
        short = 'x',
        env = "PROTONFETCHER_EXTRACT_DIR",
        value_name = "PATH",
        default_value = DEFAULT_EXTRACT_DIR
    )]
    extract_dir: PathBuf,

    /// Directory to download the asset to
    #[arg(
        long = "output",
        short = 'o',
        env = "PROTONFETCHER_OUTPUT_DIR",
        value_name = "PATH",
        default_value = DEFAULT_OUTPUT_DIR
    )]
    output: PathBuf,

    /// Release tag to download instead of the latest (e.g. GE-Proton10-11)
    #[arg(long, short = 'r', value_name = "TAG")]
    release: Option<String>,

    /// Proton fork: GE-Proton (default), Proton-EM or CachyOS
    #[arg(long, short = 'f', value_name = "FORK")]
    fork: Option<Fork>,

    /// List the 20 most recent release tags for the selected fork
    #[arg(long, short = 'l')]
    list: bool,

    /// List the fork's links and the folders they point to (all forks without --fork)
    #[arg(long)]
    ls: bool,

    /// Remove a release folder and the links pointing at it
    #[arg(long, value_name = "TAG")]
    rm: Option<String>,

    /// Recreate the fork's links from the installed releases
    #[arg(long)]
    relink: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// GitHub API URL (defaults to https://api.github.com)
    #[arg(long = "api-url", value_name = "URL")]
    api_url: Option<String>,

    /// GitHub URL (defaults to https://github.com)
    #[arg(long = "github-url", value_name = "URL")]
    github_url: Option<String>,
}

impl Cli {
    fn request(&self) -> Request {
        Request {
            release: self.release.clone(),
            list: self.list,
            ls: self.ls,
            rm: self.rm.clone(),
            relink: self.relink,
        }
    }

    fn settings(&self) -> Settings {
        Settings {
            extract_dir: self.extract_dir.clone(),
            output_dir: self.output.clone(),
            api_url: self.api_url.clone(),
            github_url: self.github_url.clone(),
        }
    }
}

fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let action = cli.request().action()?;
    let config = Config::new(RealRuntime, cli.settings())?;
    let mut stdout = std::io::stdout().lock();
    commands::run(&config, action, cli.fork, &mut stdout).await
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);
    log::debug!("Debug logging enabled");

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
