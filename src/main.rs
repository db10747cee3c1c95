use std::sync::Arc;

use clap::{CommandFactory, Parser};
use clap_complete::aot::generate;
use groucho::browser::BrowserSession;
use groucho::cli::{ChromeArgs, ChromeCommands, Cli, Commands};
use groucho::commands;
use groucho::config::validate::filter_directive;
use groucho::config::{Config, DEFAULT_LOG_LEVEL};
use groucho::docker::DockerRuntime;
use groucho::environment::DefaultSelection;
use groucho::lifecycle::ContainerController;
use groucho::status::StatusAggregator;
use groucho::ui::TerminalPrompt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = commands::load_config();

    let level = config
        .as_ref()
        .map(|c| c.log_level.as_str())
        .unwrap_or(DEFAULT_LOG_LEVEL);
    init_tracing(
        cli.global.verbose,
        level,
        matches!(cli.command, Commands::Menu),
    );

    let code = match run(cli, config).await {
        Ok(code) => code,
        Err(e) => {
            report(e);
            1
        }
    };
    std::process::exit(code);
}

/// `RUST_LOG` wins, then the configured level; `-v` forces debug. The menu
/// owns the terminal, so its logs are discarded.
fn init_tracing(verbose: bool, level: &str, discard: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directive(level)))
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if discard {
        builder.with_writer(std::io::sink).init();
    } else {
        builder.with_writer(std::io::stderr).init();
    }
}

fn report(err: anyhow::Error) {
    match err.downcast::<groucho::Error>() {
        Ok(e) => eprintln!("{:?}", miette::Report::new(e)),
        Err(e) => eprintln!("Error: {:#}", e),
    }
}

async fn run(cli: Cli, config: anyhow::Result<Arc<Config>>) -> anyhow::Result<i32> {
    if let Commands::Completions { shell } = cli.command {
        generate(shell, &mut Cli::command(), "groucho", &mut std::io::stdout());
        return Ok(0);
    }
    let config = config?;

    match cli.command {
        Commands::Start { envs, build } => {
            let controller = commands::connect(config).await?;
            let envs = envs.select(DefaultSelection::Development);
            commands::containers::start(&controller, &envs, build).await?;
        }
        Commands::Stop { envs, remove } => {
            let controller = commands::connect(config).await?;
            let envs = envs.select(DefaultSelection::Both);
            commands::containers::stop(&controller, &envs, remove).await?;
        }
        Commands::Restart { envs } => {
            let controller = commands::connect(config).await?;
            let envs = envs.select(DefaultSelection::Development);
            commands::containers::restart(&controller, &envs).await?;
        }
        Commands::Status { envs, wait } => {
            let runtime = Arc::new(DockerRuntime::local()?);
            let aggregator = StatusAggregator::new(ContainerController::new(runtime, config));
            let envs = envs.select(DefaultSelection::Both);
            commands::status::run(&aggregator, &envs, wait).await?;
        }
        Commands::Logs { env, follow, tail } => {
            let controller = commands::connect(config).await?;
            commands::logs::run(&controller, env.environment(), follow, tail).await?;
        }
        Commands::Exec { env, command } => {
            let controller = commands::connect(config).await?;
            return commands::exec::run(&controller, env.environment(), command).await;
        }
        Commands::Shell { env } => {
            let controller = commands::connect(config).await?;
            return commands::exec::shell(&controller, env.environment()).await;
        }
        Commands::Build { envs, no_cache } => {
            let controller = commands::connect(config).await?;
            let envs = envs.select(DefaultSelection::Development);
            commands::containers::build(&controller, &envs, no_cache).await?;
        }
        Commands::Clean { force } => {
            let controller = commands::connect(config).await?;
            commands::containers::clean(&controller, force, &TerminalPrompt).await?;
        }
        Commands::Menu => commands::menu::run(config).await?,
        Commands::Doctor => commands::doctor::run(&config, None).await?,
        Commands::Chrome(ChromeArgs {
            chrome_path,
            command,
        }) => {
            let mut session = BrowserSession::new(&config).with_executable(chrome_path);
            match command {
                ChromeCommands::Start { profile, url, args } => {
                    commands::chrome::start(&mut session, &profile, url.as_deref(), &args).await?
                }
                ChromeCommands::Stop { force } => commands::chrome::stop(&mut session, force).await?,
                ChromeCommands::Status => commands::chrome::status(&mut session).await?,
                ChromeCommands::Profile { command } => {
                    commands::chrome::profile(&mut session, command, &TerminalPrompt).await?;
                }
            }
        }
        Commands::Completions { .. } => {}
    }
    Ok(0)
}
