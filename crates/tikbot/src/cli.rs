use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tikbot")]
#[command(author, version, about = "Telegram bot that downloads TikTok videos without watermark", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot in normal mode
    Run {
        /// Use webhook mode instead of long polling (requires WEBHOOK_URL)
        #[arg(long)]
        webhook: bool,
    },

    /// Run the provider chain once for a link and print the outcome
    Resolve {
        /// TikTok video URL
        url: String,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve and download a video to a local file
    Download {
        /// TikTok video URL
        url: String,

        /// Output path
        #[arg(short, long, default_value = "tiktok.mp4")]
        output: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_runs_bot() {
        let cli = Cli::try_parse_from(["tikbot"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_run_webhook() {
        let cli = Cli::try_parse_from(["tikbot", "run", "--webhook"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Run { webhook: true })));
    }

    #[test]
    fn test_download_defaults() {
        let cli = Cli::try_parse_from(["tikbot", "download", "https://vm.tiktok.com/ZM123/"]).unwrap();
        match cli.command {
            Some(Commands::Download { url, output }) => {
                assert_eq!(url, "https://vm.tiktok.com/ZM123/");
                assert_eq!(output, PathBuf::from("tiktok.mp4"));
            }
            _ => panic!("expected download subcommand"),
        }
    }

    #[test]
    fn test_resolve_requires_url() {
        assert!(Cli::try_parse_from(["tikbot", "resolve"]).is_err());
    }
}
