use crate::preview::{run_preview_email, run_token, PreviewEmailArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use lead_capture::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Squamish Lead Capture",
    about = "Run the neighbourhood guide lead capture service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the guide access email rendered for a lead
    PreviewEmail(PreviewEmailArgs),
    /// Print a freshly minted access token
    Token,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::PreviewEmail(args) => run_preview_email(args),
        Command::Token => run_token(),
    }
}
