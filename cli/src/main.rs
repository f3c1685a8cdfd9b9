mod commands;
mod util;

use clap::{Parser, Subcommand};

use chatlink_client::FileStore;
use util::ConnectionArgs;

#[derive(Parser)]
#[command(
    name = "chatlink",
    version,
    about = "chatlink CLI: talk to a chat backend whose request format keeps moving"
)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a message and print the reply (fallback text if the backend is down)
    Send {
        /// Message text
        message: String,
        /// Reply language, e.g. "de" (defaults to "en")
        #[arg(long)]
        language: Option<String>,
        /// Ask the backend to stream, where the negotiated format supports it
        #[arg(long)]
        stream: bool,
    },
    /// Probe every request format against the test endpoint and cache the winner
    Probe,
    /// Check backend health
    Health {
        /// Ignore a cached healthy result
        #[arg(long)]
        force: bool,
    },
    /// Forget the current conversation and the negotiated format
    Reset {
        /// Only forget the negotiated format
        #[arg(long)]
        format_only: bool,
    },
    /// Show stored identity, conversation, format and connection state
    Status,
    /// Run health, auth and format negotiation checks
    Doctor,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    util::init_tracing(cli.log_json);

    let mut client = util::build_client(&cli.connection);

    let code = match cli.command {
        Commands::Send {
            message,
            language,
            stream,
        } => commands::chat::send(&mut client, &message, language, stream).await,
        Commands::Probe => commands::probe::run(&mut client).await,
        Commands::Health { force } => commands::health::run(&mut client, force).await,
        Commands::Reset { format_only } => commands::session::reset(&mut client, format_only),
        Commands::Status => {
            commands::session::status(&client, &state_location(&cli.connection))
        }
        Commands::Doctor => commands::doctor::run(&mut client).await,
    };

    std::process::exit(code);
}

fn state_location(args: &ConnectionArgs) -> String {
    if args.ephemeral {
        return "memory".to_string();
    }
    args.state_file
        .clone()
        .unwrap_or_else(FileStore::default_path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn send_parses_language_and_stream() {
        let cli = Cli::try_parse_from([
            "chatlink",
            "--api-url",
            "http://chat.local:9000",
            "--ephemeral",
            "send",
            "hallo",
            "--language",
            "de",
            "--stream",
        ])
        .unwrap();

        assert_eq!(cli.connection.api_url, "http://chat.local:9000");
        assert!(cli.connection.ephemeral);
        assert_eq!(state_location(&cli.connection), "memory");
        match cli.command {
            Commands::Send {
                message,
                language,
                stream,
            } => {
                assert_eq!(message, "hallo");
                assert_eq!(language.as_deref(), Some("de"));
                assert!(stream);
            }
            _ => panic!("expected send"),
        }
    }

    #[test]
    fn explicit_state_file_is_reported() {
        let cli = Cli::try_parse_from([
            "chatlink",
            "--state-file",
            "/tmp/chatlink-test.json",
            "status",
        ])
        .unwrap();
        assert_eq!(state_location(&cli.connection), "/tmp/chatlink-test.json");
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn reset_accepts_format_only() {
        let cli = Cli::try_parse_from(["chatlink", "reset", "--format-only"]).unwrap();
        assert!(matches!(cli.command, Commands::Reset { format_only: true }));
    }
}
