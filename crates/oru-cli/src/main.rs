//! ORU CLI
//!
//! Command-line interface for publishing, ingesting and inspecting HL7 v2
//! ORU messages

mod commands;
mod output;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use oru_core::{ConfigLoader, ConfigOverrides, LogFormat, init_tracing};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "oru")]
#[command(about = "ORU: HL7 v2 observation result ingestion")]
#[command(version = oru_core::VERSION)]
#[command(
    long_about = "ORU decodes pipe-delimited HL7 v2 ORU messages into structured documents.\n\
It publishes message files to a spool topic, consumes the topic into a document\n\
collection, and decodes or queries individual messages.\n\
\n\
Examples:\n  \
oru produce --input-dir ./msghl7     # Publish every file of ./msghl7\n  \
oru consume                          # Ingest until interrupted\n  \
oru consume --once                   # Ingest what is queued, then exit\n  \
oru decode message.hl7 --pretty      # Print the decoded document\n  \
oru query message.hl7 PID.5.1        # Print one field component\n  \
oru config init                      # Initialize configuration file"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        help = "Path to configuration file (.orurc.toml/.orurc.json/oru.yaml)"
    )]
    config: Option<PathBuf>,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log output format
    #[arg(long, global = true, value_enum, help = "Log format (default: from config)")]
    log_format: Option<LogFormatArg>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Consume messages from the spool topic into the document store
    Consume {
        #[arg(long, env = "ORU_SPOOL_DIR", help = "Spool queue root directory")]
        spool_dir: Option<PathBuf>,

        #[arg(long, env = "ORU_TOPIC", help = "Topic to consume")]
        topic: Option<String>,

        #[arg(long, env = "ORU_GROUP_ID", help = "Consumer group id")]
        group_id: Option<String>,

        #[arg(long, env = "ORU_STORE_DIR", help = "Document store data directory")]
        store_dir: Option<PathBuf>,

        /// Exit once the topic is drained
        #[arg(long, help = "Exit once every queued message has been handled")]
        once: bool,

        #[arg(long, help = "Stop after this many messages")]
        max_messages: Option<usize>,
    },

    /// Publish every file of a directory to the spool topic
    Produce {
        #[arg(long, env = "ORU_INPUT_DIR", help = "Directory of message files")]
        input_dir: Option<PathBuf>,

        #[arg(long, env = "ORU_SPOOL_DIR", help = "Spool queue root directory")]
        spool_dir: Option<PathBuf>,

        #[arg(long, env = "ORU_TOPIC", help = "Topic to publish to")]
        topic: Option<String>,
    },

    /// Decode message files and print the resulting documents
    Decode {
        #[arg(required = true, help = "Message files to decode")]
        paths: Vec<PathBuf>,

        #[arg(long, help = "Pretty-print the documents")]
        pretty: bool,

        #[arg(
            short = 'j',
            long,
            help = "Number of decode threads (default: number of CPU cores)"
        )]
        threads: Option<usize>,
    },

    /// Print the value at a field path such as PID.5.1
    Query {
        #[arg(help = "Message file")]
        file: PathBuf,

        #[arg(help = "Field path: SEGMENT.field[.component]")]
        path: String,

        #[arg(long, help = "Print the value from every matching segment")]
        all: bool,
    },

    /// Configuration file management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version information
    #[command(alias = "ver")]
    Version {
        /// Show detailed version information
        #[arg(long, help = "Show detailed version and build information")]
        detailed: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Initialize a new configuration file
    Init {
        /// Configuration file format
        #[arg(long, default_value = "toml", help = "Configuration file format")]
        format: ConfigFormat,

        /// Overwrite existing configuration file
        #[arg(long, help = "Overwrite existing configuration file")]
        force: bool,
    },

    /// Display the effective configuration
    Show {
        #[arg(long, default_value = "toml", help = "Output format")]
        format: ConfigFormat,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ConfigFormat {
    /// TOML configuration format
    Toml,
    /// JSON configuration format
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

impl Commands {
    fn overrides(&self) -> ConfigOverrides {
        match self {
            Commands::Consume {
                spool_dir,
                topic,
                group_id,
                store_dir,
                ..
            } => ConfigOverrides {
                spool_dir: spool_dir.clone(),
                topic: topic.clone(),
                group_id: group_id.clone(),
                store_dir: store_dir.clone(),
                input_dir: None,
            },
            Commands::Produce {
                input_dir,
                spool_dir,
                topic,
            } => ConfigOverrides {
                spool_dir: spool_dir.clone(),
                topic: topic.clone(),
                input_dir: input_dir.clone(),
                ..Default::default()
            },
            _ => ConfigOverrides::default(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize colored output
    if !cli.no_color && std::env::var("NO_COLOR").is_err() {
        colored::control::set_override(true);
    } else {
        colored::control::set_override(false);
    }

    let mut config = match ConfigLoader::load(cli.config.as_deref(), None) {
        Ok(config) => config,
        Err(e) => {
            output::print_error(&e.to_string());
            std::process::exit(2);
        }
    };
    if let Some(command) = &cli.command {
        config.apply_overrides(command.overrides());
    }

    // Initialize tracing based on verbosity
    let filter = match cli.verbose {
        0 => config.logging.filter.clone(),
        1 => "oru=debug".to_string(),
        _ => "oru=trace".to_string(),
    };
    let format = cli
        .log_format
        .map(LogFormat::from)
        .unwrap_or(config.logging.format);
    init_tracing(&filter, format);

    match run_command(cli, config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            output::print_error(&format!("{e:#}"));
            std::process::exit(1);
        }
    }
}

async fn run_command(cli: Cli, config: oru_core::OruConfig) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Consume {
            once, max_messages, ..
        }) => commands::consume_command(config, once, max_messages).await,

        Some(Commands::Produce { .. }) => commands::produce_command(config).await,

        Some(Commands::Decode {
            paths,
            pretty,
            threads,
        }) => commands::decode_command(paths, pretty, threads),

        Some(Commands::Query { file, path, all }) => commands::query_command(file, &path, all),

        Some(Commands::Config { action }) => match action {
            ConfigAction::Init { format, force } => commands::config_init_command(format, force),
            ConfigAction::Show { format } => commands::config_show_command(&config, format),
        },

        Some(Commands::Version { detailed }) => {
            if detailed {
                println!("oru {}", oru_core::VERSION);
                println!("Build information:");
                println!("  Target: {}", std::env::consts::ARCH);
                println!("  OS: {}", std::env::consts::OS);
            } else {
                println!("{}", oru_core::VERSION);
            }
            Ok(())
        }

        None => {
            // No subcommand provided, show help
            let mut cmd = Cli::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    #[serial]
    fn test_consume_flags_override_config() {
        let cli = Cli::try_parse_from([
            "oru",
            "consume",
            "--topic",
            "lab",
            "--store-dir",
            "/tmp/store",
            "--once",
        ])
        .unwrap();
        let overrides = cli.command.unwrap().overrides();
        assert_eq!(overrides.topic.as_deref(), Some("lab"));
        assert_eq!(overrides.store_dir, Some(PathBuf::from("/tmp/store")));
        assert_eq!(overrides.input_dir, None);
    }

    #[test]
    #[serial]
    fn test_environment_supplies_overrides() {
        unsafe {
            std::env::set_var("ORU_GROUP_ID", "nightly");
            std::env::set_var("ORU_SPOOL_DIR", "/var/spool/oru");
        }
        let cli = Cli::try_parse_from(["oru", "consume"]).unwrap();
        unsafe {
            std::env::remove_var("ORU_GROUP_ID");
            std::env::remove_var("ORU_SPOOL_DIR");
        }

        let overrides = cli.command.unwrap().overrides();
        assert_eq!(overrides.group_id.as_deref(), Some("nightly"));
        assert_eq!(overrides.spool_dir, Some(PathBuf::from("/var/spool/oru")));
    }

    #[test]
    #[serial]
    fn test_flag_wins_over_environment() {
        unsafe {
            std::env::set_var("ORU_TOPIC", "from-env");
        }
        let cli = Cli::try_parse_from(["oru", "produce", "--topic", "from-flag"]).unwrap();
        unsafe {
            std::env::remove_var("ORU_TOPIC");
        }

        let overrides = cli.command.unwrap().overrides();
        assert_eq!(overrides.topic.as_deref(), Some("from-flag"));
    }
}
