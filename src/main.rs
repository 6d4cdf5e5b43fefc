mod app;
mod command;
mod config;
mod format;
mod i18n;
mod log_view;
mod pyenv;
mod runner;
mod tui;
mod version_filter;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::sync::mpsc;

use app::App;
use command::CommandChain;
use config::Config;
use format::{format_output, LogLine};
use i18n::I18n;
use pyenv::{generate_env_name, Pyenv};
use runner::CommandRunner;

#[derive(Parser)]
#[command(name = "pvm")]
#[command(about = "Browse pyenv interpreters, look up pip packages and install them into fresh virtualenvs")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive interface (default)
    Ui,
    /// List installed Python versions
    Versions {
        /// Print the list as a JSON array
        #[arg(long)]
        json: bool,
    },
    /// Show pip metadata for a package under one Python version
    Show {
        /// Package name
        package: String,
        /// Python version as listed by `pyenv versions`
        #[arg(long = "python", short = 'p')]
        python: String,
    },
    /// Create a virtualenv from a Python version and install a package into it
    Install {
        /// Package name
        package: String,
        /// Python version as listed by `pyenv versions`
        #[arg(long = "python", short = 'p')]
        python: String,
        /// Virtualenv name [default: generated]
        #[arg(long = "env", short = 'e')]
        env: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match Config::new() {
        Ok(config) => config,
        Err(err) => {
            let i18n = I18n::new(&Config::default().get_effective_language());
            eprintln!("{}", i18n.t_format("config_fallback", &[&format!("{:#}", err)]).yellow());
            Config::default()
        }
    };
    config.apply_env_overrides();

    let i18n = I18n::new(&config.get_effective_language());
    let pyenv = Pyenv::new(config.pyenv.program.clone());

    match cli.command.unwrap_or(Commands::Ui) {
        Commands::Ui => {
            // Blocking on purpose: the list is fixed for the whole session.
            let versions = pyenv.load_versions(&i18n);
            let app = App::new(pyenv, config.venv.name_prefix.clone(), versions);
            if let Err(err) = tui::run(app, &i18n, config.display.alt_screen) {
                eprintln!("{}", i18n.t_format("warning_interactive_failed", &[&format!("{:#}", err)]).red());
            }
        }
        Commands::Versions { json } => {
            let versions = pyenv.load_versions(&i18n);
            if json {
                println!("{}", serde_json::to_string_pretty(&versions)?);
            } else {
                for version in versions {
                    println!("{}", version);
                }
            }
        }
        Commands::Show { package, python } => {
            if let Some(chain) = pyenv.search_command(&package, &python) {
                run_once(chain, &i18n);
            }
        }
        Commands::Install { package, python, env } => {
            let env_name = env
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| generate_env_name(&config.venv.name_prefix, &package, &python));
            if let Some(chain) = pyenv.install_command(&package, &python, env_name.trim()) {
                run_once(chain, &i18n);
            }
        }
    }

    Ok(())
}

/// Run one chain through a runner and print its formatted output.
fn run_once(chain: CommandChain, i18n: &I18n) {
    let running = i18n.t("running");
    let error = i18n.t("error_marker");
    println!("{}", LogLine::Running(chain.to_string()).to_console(&running, &error));

    let (tx, rx) = mpsc::channel();
    CommandRunner::spawn(0, chain, tx);
    for event in rx {
        for line in format_output(&event.output) {
            println!("{}", line.to_console(&running, &error));
        }
    }
}
