use std::io;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

use skillforge::cli;
use skillforge::cli::validate::OutputFormat;
use skillforge::report::EXIT_TOOL_ERROR;

#[derive(Parser)]
#[command(name = "skillforge", version)]
#[command(about = "Scaffold agent skill packages from templates and validate them", long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new skill package from a template
    Init {
        /// Skill name (hyphen-case, also the directory name)
        name: String,

        /// Directory to create the skill in (defaults to init.registry_path)
        #[arg(long)]
        path: Option<String>,

        /// Template id (see `skillforge templates`)
        #[arg(long)]
        template: Option<String>,

        /// Fill name, title, status, date and quick-start placeholders
        #[arg(long)]
        auto_fill: bool,

        /// Also create a research log for the skill
        #[arg(long)]
        create_research_log: bool,

        /// Display name (defaults to the title-cased skill name)
        #[arg(long)]
        display_name: Option<String>,

        /// Status line value used by --auto-fill
        #[arg(long)]
        status: Option<String>,

        /// Quick-start estimate used by --auto-fill
        #[arg(long)]
        quick_start_minutes: Option<u32>,

        /// Leave a partially written directory in place if a write fails
        #[arg(long)]
        keep_partial: bool,

        /// Path to config file (defaults to ./skillforge.toml or ~/.config/skillforge/config.toml)
        #[arg(long)]
        config: Option<String>,
    },

    /// Validate one or more skill packages
    Validate {
        /// Package directories; a directory of packages expands to each `*/SKILL.md`
        #[arg(required = true)]
        paths: Vec<String>,

        /// Run every rule, including warnings and the optional-section audit
        #[arg(long)]
        full_check: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Path to config file
        #[arg(long)]
        config: Option<String>,
    },

    /// List available templates
    Templates {
        /// Path to config file
        #[arg(long)]
        config: Option<String>,
    },

    /// Check configuration and template directories
    ConfigCheck {
        /// Path to config file
        #[arg(long)]
        config: Option<String>,
    },

    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn dispatch(command: Commands) -> anyhow::Result<i32> {
    match command {
        Commands::Init {
            name,
            path,
            template,
            auto_fill,
            create_research_log,
            display_name,
            status,
            quick_start_minutes,
            keep_partial,
            config,
        } => {
            cli::init::run(
                name,
                path,
                template,
                auto_fill,
                create_research_log,
                display_name,
                status,
                quick_start_minutes,
                keep_partial,
                config,
            )?;
            Ok(0)
        }
        Commands::Validate {
            paths,
            full_check,
            format,
            config,
        } => cli::validate::run(paths, full_check, format, config).await,
        Commands::Templates { config } => {
            cli::templates::run(config)?;
            Ok(0)
        }
        Commands::ConfigCheck { config } => {
            cli::config_check::run(config)?;
            Ok(0)
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "skillforge", &mut io::stdout());
            Ok(0)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match dispatch(cli.command).await {
        Ok(code) => code,
        // Anything that escapes a subcommand is a tool-level failure.
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            EXIT_TOOL_ERROR
        }
    };
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_init_defaults() {
        let cli = Cli::try_parse_from(["skillforge", "init", "my-skill"]).unwrap();
        match cli.command {
            Commands::Init {
                name,
                path,
                template,
                auto_fill,
                keep_partial,
                ..
            } => {
                assert_eq!(name, "my-skill");
                assert!(path.is_none());
                assert!(template.is_none());
                assert!(!auto_fill);
                assert!(!keep_partial);
            }
            _ => panic!("expected init"),
        }
    }

    #[test]
    fn test_parse_init_with_all_args() {
        let cli = Cli::try_parse_from([
            "skillforge",
            "init",
            "my-skill",
            "--path",
            "skills/public",
            "--template",
            "minimal-skeleton",
            "--auto-fill",
            "--create-research-log",
            "--display-name",
            "My Skill",
            "--status",
            "Experimental",
            "--quick-start-minutes",
            "10",
            "--keep-partial",
        ])
        .unwrap();
        match cli.command {
            Commands::Init {
                path,
                template,
                auto_fill,
                create_research_log,
                quick_start_minutes,
                keep_partial,
                ..
            } => {
                assert_eq!(path.as_deref(), Some("skills/public"));
                assert_eq!(template.as_deref(), Some("minimal-skeleton"));
                assert!(auto_fill && create_research_log && keep_partial);
                assert_eq!(quick_start_minutes, Some(10));
            }
            _ => panic!("expected init"),
        }
    }

    #[test]
    fn test_parse_validate() {
        let cli = Cli::try_parse_from([
            "skillforge",
            "-vv",
            "validate",
            "a",
            "b",
            "--full-check",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Validate {
                paths,
                full_check,
                format,
                ..
            } => {
                assert_eq!(paths, vec!["a", "b"]);
                assert!(full_check);
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("expected validate"),
        }
    }

    #[test]
    fn test_validate_requires_a_path() {
        assert!(Cli::try_parse_from(["skillforge", "validate"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
