//! CLI parser.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dbot")]
#[command(about = "Community chat bot with long-term conversation context", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Run the Telegram bot (config from env; token can override BOT_TOKEN).
    Run {
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Talk to the configured backend from stdin, one message per line, as the given user.
    Chat {
        #[arg(short, long)]
        user_id: i64,
    },
    /// Print message and summary counts of a user.
    Stats {
        #[arg(short, long)]
        user_id: i64,
    },
    /// Delete a user's messages and summaries.
    Clear {
        #[arg(short, long)]
        user_id: i64,
    },
    /// Write every table to a JSON file.
    Backup {
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Store the system instruction template, from the argument or a file.
    SetPrompt {
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        text: Option<String>,
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Print the system instructions the next turn would use.
    ShowPrompt,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_and_backup() {
        let cli = Cli::try_parse_from(["dbot", "chat", "--user-id", "42"]).unwrap();
        assert_eq!(cli.command, Commands::Chat { user_id: 42 });

        let cli = Cli::try_parse_from(["dbot", "backup", "-o", "out.json"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Backup {
                output: PathBuf::from("out.json")
            }
        );
    }

    #[test]
    fn test_set_prompt_needs_text_or_file() {
        assert!(Cli::try_parse_from(["dbot", "set-prompt"]).is_err());
        assert!(Cli::try_parse_from(["dbot", "set-prompt", "hi", "--file", "p.txt"]).is_err());
        let cli = Cli::try_parse_from(["dbot", "set-prompt", "--file", "p.txt"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::SetPrompt {
                text: None,
                file: Some(PathBuf::from("p.txt"))
            }
        );
    }

    #[test]
    fn test_run_token_override() {
        let cli = Cli::try_parse_from(["dbot", "run", "--token", "123:abc"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Run {
                token: Some("123:abc".to_string())
            }
        );
    }
}
