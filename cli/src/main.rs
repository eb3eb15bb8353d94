// Use modules from the library crate
use componentry::commands::{self, SourceOptions, add::AddOptions};
use componentry::scaffold::{InitKind, InitOptions};
use componentry::{DEFAULT_SERVE_PORT, config, logging, registry, scaffold};

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "componentry",
    about = "Build, serve and install source-code component registries",
    version
)]
struct Cli {
    /// Show debug output on the terminal
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct RegistryArgs {
    /// Read components from a built registry directory instead of a URL
    #[arg(long, value_name = "DIR")]
    registry_dir: Option<PathBuf>,

    /// Registry base URL (overrides the configured registry_url)
    #[arg(long, value_name = "URL", conflicts_with = "registry_dir")]
    registry: Option<String>,
}

impl From<RegistryArgs> for SourceOptions {
    fn from(args: RegistryArgs) -> Self {
        SourceOptions {
            registry_dir: args.registry_dir,
            registry_url: args.registry,
        }
    }
}

#[derive(Parser)]
enum Command {
    /// Build a registry from a component source tree
    ///
    /// Every immediate subdirectory of SOURCE is one component. Each gets a
    /// <name>.json manifest in OUTPUT, plus an index.json listing them all.
    ///
    /// Examples:
    ///   componentry build registry/components -o public/r
    ///   componentry build src/ui -o public/r --config componentry.toml
    Build {
        /// Component source directory
        source: PathBuf,

        /// Registry output directory
        #[arg(long, short = 'o', default_value = "public/r")]
        output: PathBuf,

        /// Build settings (TOML)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },

    /// Serve a built registry directory over HTTP
    ///
    /// Manifests are available at http://127.0.0.1:<port>/r/<name>.json
    Serve {
        /// Registry output directory
        #[arg(default_value = "public/r")]
        dir: PathBuf,

        /// Port to listen on
        #[arg(long, short = 'p', default_value_t = DEFAULT_SERVE_PORT)]
        port: u16,
    },

    /// List the components a registry publishes
    List {
        #[command(flatten)]
        registry: RegistryArgs,
    },

    /// Install components and their registry dependencies into this project
    ///
    /// With no component names, pick from the registry's list interactively.
    ///
    /// Examples:
    ///   componentry add button dialog
    ///   componentry add card --overwrite
    ///   componentry add button --registry-dir ../ui/public/r
    Add {
        /// Component names
        components: Vec<String>,

        /// Replace already-installed components without asking
        #[arg(long)]
        overwrite: bool,

        /// Never prompt; already-installed components are skipped
        #[arg(long, short = 'y')]
        yes: bool,

        /// Project root
        #[arg(long, default_value = ".")]
        cwd: PathBuf,

        #[command(flatten)]
        registry: RegistryArgs,
    },

    /// Write a starter configuration file
    Init {
        /// What to initialize
        #[arg(long, value_enum, default_value = "project")]
        kind: InitKind,

        /// Directory to write into
        #[arg(long, default_value = ".")]
        cwd: PathBuf,

        /// Directory the `@/` alias points into
        #[arg(long, default_value = "src")]
        root_dir: String,

        /// Import alias prefix
        #[arg(long, default_value = "@/")]
        alias_prefix: String,

        /// Subdirectory of components/ that installs go into (empty for none)
        #[arg(long, default_value = "ui")]
        ui_subdir: String,

        /// Component source directory mentioned in registry settings
        #[arg(long, default_value = "components")]
        source_dir: String,

        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Show or change user settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Parser)]
enum ConfigCommand {
    /// Print the effective settings
    Show,

    /// Change a setting
    ///
    /// Keys: registry_url, listing_url, project_config
    ///
    /// Example:
    ///   componentry config set registry_url http://127.0.0.1:8086
    Set {
        key: String,
        value: String,
    },

    /// Print the settings file location
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose)?;

    match cli.command {
        Command::Build {
            source,
            output,
            config,
        } => {
            if !source.is_dir() {
                anyhow::bail!("source directory '{}' does not exist", source.display());
            }
            commands::build::build(&source, &output, config).await?;
            Ok(())
        }

        Command::Serve { dir, port } => registry::server::serve(dir, port).await,

        Command::List { registry } => {
            let options: SourceOptions = registry.into();
            commands::list::list(&options).await?;
            Ok(())
        }

        Command::Add {
            components,
            overwrite,
            yes,
            cwd,
            registry,
        } => {
            let options = AddOptions {
                components,
                overwrite,
                yes,
                cwd,
                source: registry.into(),
            };
            commands::add::add(options).await?;
            Ok(())
        }

        Command::Init {
            kind,
            cwd,
            root_dir,
            alias_prefix,
            ui_subdir,
            source_dir,
            force,
        } => {
            let options = InitOptions {
                kind,
                root_dir,
                alias_prefix,
                ui_subdir,
                source_dir,
                force,
            };
            let written =
                scaffold::init(&cwd, &options).context("Failed to write configuration")?;
            for path in written {
                println!("✅ Created {}", path.display());
            }
            Ok(())
        }

        Command::Config { command } => match command {
            ConfigCommand::Show => {
                let settings = config::load_settings()?;
                let content =
                    toml::to_string_pretty(&settings).context("Failed to serialize config")?;
                print!("{}", content);
                Ok(())
            }

            ConfigCommand::Set { key, value } => {
                config::set_setting(&key, &value).context("Failed to update config")?;
                println!("✅ Set {} = {}", key, value);
                Ok(())
            }

            ConfigCommand::Path => {
                println!("{}", config::get_config_path()?.display());
                Ok(())
            }
        },
    }
}
