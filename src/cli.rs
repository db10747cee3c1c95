use clap::{Args, Parser, Subcommand};
use clap_complete::aot::Shell;
use std::path::PathBuf;

use crate::environment::{self, DefaultSelection, Environment};

#[derive(Debug, Parser)]
#[command(
    name = "groucho",
    version,
    about = "Operator console for the Groucho the Hunter containers and debug browser"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// `--dev` / `--prod` selection; the default depends on the command.
#[derive(Debug, Clone, Copy, Args)]
pub struct EnvFlags {
    /// Development environment
    #[arg(long)]
    pub dev: bool,
    /// Production environment
    #[arg(long)]
    pub prod: bool,
}

impl EnvFlags {
    pub fn select(&self, default: DefaultSelection) -> Vec<Environment> {
        environment::select(self.dev, self.prod, default)
    }
}

/// Exactly one environment, development unless `--prod` is given.
#[derive(Debug, Clone, Copy, Args)]
pub struct OneEnv {
    /// Development environment (default)
    #[arg(long, conflicts_with = "prod")]
    pub dev: bool,
    /// Production environment
    #[arg(long)]
    pub prod: bool,
}

impl OneEnv {
    pub fn environment(&self) -> Environment {
        if self.prod {
            Environment::Production
        } else {
            Environment::Development
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start game containers (development by default)
    Start {
        #[command(flatten)]
        envs: EnvFlags,
        /// Rebuild images before starting
        #[arg(short, long)]
        build: bool,
    },
    /// Stop game containers (both by default)
    Stop {
        #[command(flatten)]
        envs: EnvFlags,
        /// Also remove containers and volumes
        #[arg(long)]
        remove: bool,
    },
    /// Restart game containers (development by default)
    Restart {
        #[command(flatten)]
        envs: EnvFlags,
    },
    /// Show container, reachability and host status (both by default)
    Status {
        #[command(flatten)]
        envs: EnvFlags,
        /// Wait up to SECS for the game to become reachable first
        #[arg(long, value_name = "SECS")]
        wait: Option<u64>,
    },
    /// Show container logs
    Logs {
        #[command(flatten)]
        env: OneEnv,
        /// Follow log output until Ctrl+C
        #[arg(short, long)]
        follow: bool,
        /// Number of lines to show from the end
        #[arg(short = 'n', long, default_value_t = 100)]
        tail: usize,
    },
    /// Run a command inside a running container
    Exec {
        #[command(flatten)]
        env: OneEnv,
        /// Command to execute
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },
    /// Open an interactive shell in a running container
    Shell {
        #[command(flatten)]
        env: OneEnv,
    },
    /// Build container images (development by default)
    Build {
        #[command(flatten)]
        envs: EnvFlags,
        /// Build without the layer cache
        #[arg(long)]
        no_cache: bool,
    },
    /// Remove containers, volumes and images for both environments
    Clean {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Interactive terminal menu
    Menu,
    /// Check Docker, compose files and Chrome
    Doctor,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
    /// Manage the debug Chrome instance
    Chrome(ChromeArgs),
}

#[derive(Debug, Args)]
pub struct ChromeArgs {
    /// Chrome or Chromium executable
    #[arg(long, env = "CHROME_PATH", value_name = "PATH", global = true)]
    pub chrome_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: ChromeCommands,
}

#[derive(Debug, Subcommand)]
pub enum ChromeCommands {
    /// Launch Chrome with remote debugging enabled
    Start {
        /// Profile to launch with
        #[arg(short, long, default_value = "default")]
        profile: String,
        /// Page to open (defaults to the development URL)
        #[arg(short, long)]
        url: Option<String>,
        /// Extra arguments passed to Chrome
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Stop the debug Chrome instance
    Stop {
        /// Kill immediately instead of asking Chrome to exit
        #[arg(short, long)]
        force: bool,
    },
    /// Show debug Chrome status
    Status,
    /// Manage Chrome profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommands {
    /// Create a new profile
    Create { name: String },
    /// Delete a profile
    Delete {
        name: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Wipe a profile back to a fresh state
    Reset {
        name: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// List profiles
    List,
    /// Archive a profile to a .tar.gz file
    Backup {
        name: String,
        /// Output file (default: <profiles dir>/<name>_backup_<timestamp>.tar.gz)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Restore a profile from a backup archive
    Restore {
        archive: PathBuf,
        /// Profile name (default: derived from the archive name)
        #[arg(short, long)]
        name: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn exec_takes_trailing_command() {
        let cli = Cli::parse_from(["groucho", "exec", "--prod", "--", "npm", "test", "-w"]);
        match cli.command {
            Commands::Exec { env, command } => {
                assert_eq!(env.environment(), Environment::Production);
                assert_eq!(command, vec!["npm", "test", "-w"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn logs_tail_defaults_to_100() {
        let cli = Cli::parse_from(["groucho", "-v", "logs", "-f"]);
        assert!(cli.global.verbose);
        match cli.command {
            Commands::Logs { follow, tail, .. } => {
                assert!(follow);
                assert_eq!(tail, 100);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn stop_defaults_to_both_environments() {
        let cli = Cli::parse_from(["groucho", "stop", "--remove"]);
        match cli.command {
            Commands::Stop { envs, remove } => {
                assert!(remove);
                assert_eq!(envs.select(DefaultSelection::Both), Environment::ALL.to_vec());
                assert_eq!(
                    envs.select(DefaultSelection::Development),
                    vec![Environment::Development]
                );
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn logs_rejects_both_environments() {
        assert!(Cli::try_parse_from(["groucho", "logs", "--dev", "--prod"]).is_err());
    }

    #[test]
    fn chrome_start_collects_extra_args() {
        let cli = Cli::parse_from([
            "groucho",
            "chrome",
            "--chrome-path",
            "/opt/chrome",
            "start",
            "-p",
            "work",
            "--",
            "--incognito",
        ]);
        match cli.command {
            Commands::Chrome(ChromeArgs {
                chrome_path,
                command: ChromeCommands::Start { profile, url, args },
            }) => {
                assert_eq!(chrome_path, Some(PathBuf::from("/opt/chrome")));
                assert_eq!(profile, "work");
                assert_eq!(url, None);
                assert_eq!(args, vec!["--incognito"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
