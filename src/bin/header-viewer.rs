use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use reqwest::Url;
use tokio::io::BufReader;

use header_reflector::config::load_viewer_config;
use header_reflector::observability::logging;
use header_reflector::viewer::{
    render_panes, ChallengeError, GateState, HeaderViewer, HttpFetcher, Pane, PromptChallenge,
    TurnstileChallenge, ViewState,
};

#[derive(Parser)]
#[command(name = "header-viewer")]
#[command(about = "Live view of the headers your requests carry", long_about = None)]
struct Cli {
    /// TOML configuration file; its [viewer] section supplies defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reflector endpoint URL.
    #[arg(short, long)]
    url: Option<String>,

    /// Polling period in seconds.
    #[arg(short, long)]
    interval: Option<u64>,

    /// Which pane to show.
    #[arg(short, long, value_enum, default_value_t = PaneArg::All)]
    pane: PaneArg,

    /// Turnstile token obtained from the widget; skips the terminal prompt.
    #[arg(long, requires = "turnstile_secret")]
    turnstile_token: Option<String>,

    /// Turnstile secret key used to verify the token.
    #[arg(long, requires = "turnstile_token")]
    turnstile_secret: Option<String>,

    /// Override the Turnstile siteverify endpoint.
    #[arg(long)]
    siteverify_url: Option<String>,

    /// Exit after the first fetch resolves.
    #[arg(long)]
    once: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum PaneArg {
    Request,
    Device,
    Response,
    All,
}

impl PaneArg {
    fn panes(self) -> &'static [Pane] {
        match self {
            PaneArg::Request => &[Pane::RequestHeaders],
            PaneArg::Device => &[Pane::DeviceInfo],
            PaneArg::Response => &[Pane::ResponseHeaders],
            PaneArg::All => &Pane::ALL,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_viewer_config(cli.config.as_deref())?;
    logging::init(&config.observability);

    let endpoint = Url::parse(cli.url.as_deref().unwrap_or(&config.viewer.endpoint))?;
    let interval = Duration::from_secs(cli.interval.unwrap_or(config.viewer.poll_interval_secs).max(1));
    let panes = cli.pane.panes();

    let mut viewer = HeaderViewer::new(HttpFetcher::new(endpoint), interval);

    if let (Some(token), Some(secret)) = (cli.turnstile_token, cli.turnstile_secret) {
        let siteverify =
            Url::parse(cli.siteverify_url.as_deref().unwrap_or(&config.viewer.siteverify_url))?;
        let mut challenge = TurnstileChallenge::new(siteverify, secret, token);
        if let Err(e) = viewer.verify(&mut challenge).await {
            eprintln!("{e}, falling back to the terminal check");
        }
    }

    if viewer.gate() == GateState::Unverified {
        let mut challenge =
            PromptChallenge::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());
        loop {
            match viewer.verify(&mut challenge).await {
                Ok(()) => break,
                Err(ChallengeError::Aborted) => return Err(ChallengeError::Aborted.into()),
                Err(e) => eprintln!("{e}, try again"),
            }
        }
    }

    let mut updates = viewer.subscribe();
    draw(&updates.borrow_and_update(), panes)?;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                draw(&state, panes)?;
                if cli.once && !state.is_loading() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

fn draw(state: &ViewState, panes: &[Pane]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    // Clear screen, cursor home.
    write!(stdout, "\x1b[2J\x1b[H{}", render_panes(state, panes))?;
    stdout.flush()
}
