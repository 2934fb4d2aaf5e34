use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use sop_master::config::{
    default_config_toml, find_config_file, get_config, load_config, save_config, Config,
    CONFIG_FILE_NAME,
};
use sop_master::docx::{render_docx, DOCX_FILENAME};
use sop_master::formatter::format_document_with_title;
use sop_master::generator::GeminiGenerator;
use sop_master::mcp::McpServer;
use sop_master::orchestrator::{AccessPolicy, Orchestrator};
use sop_master::ui::{self, Spinner, Status};
use sop_master::utils::HttpClient;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// SOP Master - Turn rough notes into a Standard Operating Procedure
#[derive(Parser, Debug)]
#[command(name = "sop-master")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Turn meeting notes and transcripts into a Standard Operating Procedure (.docx)", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model request timeout in seconds (overrides config)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Show all environment variables
    #[arg(long, global = true)]
    env: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate an SOP from notes (file or stdin) and export it as .docx
    #[command(alias = "g")]
    Generate {
        /// Notes file; reads stdin when omitted
        input: Option<PathBuf>,

        /// Where to write the Word document
        #[arg(long, short, default_value = DOCX_FILENAME)]
        output: PathBuf,

        /// Access password, when the tool is gated
        #[arg(long)]
        password: Option<String>,

        /// Gemini API key for this run (ignored when one is configured)
        #[arg(long)]
        api_key: Option<String>,

        /// Print the Markdown only, do not write a .docx
        #[arg(long)]
        no_docx: bool,
    },

    /// Convert an existing Markdown SOP to .docx without calling the model
    Format {
        /// Markdown file
        input: PathBuf,

        /// Where to write the Word document
        #[arg(long, short, default_value = DOCX_FILENAME)]
        output: PathBuf,

        /// Document title (default from config)
        #[arg(long)]
        title: Option<String>,
    },

    /// Run the MCP server (for Claude Desktop and other MCP clients)
    Serve {
        /// Run in streamable HTTP mode instead of stdio
        #[arg(long)]
        http: bool,

        /// Port for HTTP mode
        #[arg(long, short, default_value_t = 3000)]
        port: u16,

        /// Host to bind to for HTTP mode
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Write a default configuration file
    Init {
        /// Destination (default: ./sop-master.toml)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },

    /// Print the effective configuration with secrets masked
    Show,
}

/// Print all available environment variables
fn print_env_vars() {
    println!("SOP Master - Environment Variables");
    println!();
    println!("Secrets:");
    println!("  GEMINI_API_KEY              Gemini API key used for every session");
    println!("  APP_PASSWORD                Access password; unset leaves the tool open");
    println!();
    println!("Configuration overrides (section__key):");
    println!("  SOP_MASTER_API_KEYS__GEMINI                   Same as GEMINI_API_KEY, takes priority");
    println!("  SOP_MASTER_ACCESS__PASSWORD                   Same as APP_PASSWORD, takes priority");
    println!("  SOP_MASTER_ACCESS__PURCHASE_LINK              Link shown after a wrong password");
    println!("  SOP_MASTER_ACCESS__MAX_USAGE_PER_SESSION      Generations per session (default: 10)");
    println!("  SOP_MASTER_ACCESS__UNLIMITED                  Disable the per-session limit (default: false)");
    println!("  SOP_MASTER_GENERATION__MODEL                  Gemini model (default: gemini-2.5-flash)");
    println!("  SOP_MASTER_GENERATION__BASE_URL               API base URL");
    println!("  SOP_MASTER_GENERATION__TIMEOUT_SECONDS        Model request timeout (default: 120)");
    println!("  SOP_MASTER_DOCUMENT__TITLE                    Title heading of exported documents");
    println!();
    println!("Other Settings:");
    println!("  RUST_LOG                    Rust logging level (e.g., debug, info, warn, error)");
    println!("  HTTPS_PROXY                 HTTPS proxy URL for the model API");
    println!();
    println!("Example:");
    println!("  export GEMINI_API_KEY=\"your-key-here\"");
    println!("  export SOP_MASTER_ACCESS__MAX_USAGE_PER_SESSION=\"20\"");
}

fn resolve_config(path: Option<&Path>) -> Result<(Config, Option<PathBuf>)> {
    if let Some(path) = path {
        let config = load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        return Ok((config, Some(path.to_path_buf())));
    }

    match find_config_file() {
        Some(found) => {
            let config = load_config(&found)
                .with_context(|| format!("Failed to load config from {}", found.display()))?;
            Ok((config, Some(found)))
        }
        None => Ok((get_config()?, None)),
    }
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    // stdout is the MCP channel in stdio mode
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("sop_master={}", level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_orchestrator(config: &Config, timeout: Duration) -> Result<Orchestrator> {
    let http = HttpClient::with_timeout(timeout).context("Failed to build HTTP client")?;
    let generator = GeminiGenerator::with_endpoint(
        http,
        &config.generation.base_url,
        &config.generation.model,
    );
    Ok(Orchestrator::new(
        Arc::new(generator),
        AccessPolicy::from(config),
        config.api_keys.gemini.clone(),
    ))
}

fn read_notes(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            if ui::stdin_is_terminal() {
                anyhow::bail!("No input file given and nothing piped on stdin");
            }
            let mut notes = String::new();
            std::io::stdin()
                .read_to_string(&mut notes)
                .context("Failed to read stdin")?;
            Ok(notes)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.env {
        print_env_vars();
        return Ok(());
    }

    let (config, config_path) = resolve_config(cli.config.as_deref())?;
    init_tracing(&cli, &config);
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    let timeout = cli
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.generation.timeout());

    match cli.command {
        Some(Commands::Generate {
            input,
            output,
            password,
            api_key,
            no_docx,
        }) => {
            let notes = read_notes(input.as_deref())?;
            let orchestrator = build_orchestrator(&config, timeout)?;
            let mut session = orchestrator.new_session();

            if let Some(password) = password {
                if let Err(e) = orchestrator.unlock(&mut session, &password) {
                    ui::print_status(Status::Locked, &e.user_message());
                    anyhow::bail!("{}", e);
                }
            }
            if let Some(api_key) = api_key {
                orchestrator.set_session_api_key(&mut session, &api_key);
            }

            let spinner = if cli.quiet || !ui::is_terminal() {
                Spinner::hidden()
            } else {
                Spinner::new("Organising notes into an SOP...")
            };

            let markdown = match orchestrator.generate(&mut session, &notes).await {
                Ok(markdown) => {
                    spinner.finish_with_success("SOP generated");
                    markdown.to_string()
                }
                Err(e) => {
                    spinner.finish_with_error("Generation failed");
                    ui::print_status(Status::Error, &e.user_message());
                    anyhow::bail!("{}", e);
                }
            };

            println!("{}", markdown);

            if !no_docx {
                let artifact = orchestrator.export_docx(&session)?;
                std::fs::write(&output, &artifact.bytes)
                    .with_context(|| format!("Failed to write {}", output.display()))?;
                if !cli.quiet {
                    ui::print_status(
                        Status::Success,
                        &format!(
                            "Saved {} ({})",
                            output.display(),
                            ui::format_file_size(artifact.len() as u64)
                        ),
                    );
                }
            }
        }

        Some(Commands::Format {
            input,
            output,
            title,
        }) => {
            let markdown = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let title = title.unwrap_or_else(|| config.document.title.clone());
            let doc = format_document_with_title(&markdown, &title);
            let bytes = render_docx(&doc)?;
            std::fs::write(&output, &bytes)
                .with_context(|| format!("Failed to write {}", output.display()))?;

            if !cli.quiet {
                ui::print_section(&title);
                ui::print_outline(&doc);
                ui::print_divider();
                ui::print_status(
                    Status::Success,
                    &format!(
                        "Saved {} ({} blocks, {})",
                        output.display(),
                        doc.len(),
                        ui::format_file_size(bytes.len() as u64)
                    ),
                );
            }
        }

        Some(Commands::Serve { http, port, host }) => {
            let orchestrator = build_orchestrator(&config, timeout)?;
            if !orchestrator.has_configured_api_key() {
                tracing::warn!("No Gemini API key configured; clients must call set_api_key");
                if !cli.quiet {
                    ui::print_status(
                        Status::Warning,
                        "No Gemini API key configured. Clients must call set_api_key.",
                    );
                }
            }
            let server = McpServer::new(Arc::new(orchestrator))?;

            if http {
                let addr = format!("{}:{}", host, port);
                let (bound_addr, handle) = server.run_http(&addr).await?;
                tracing::info!("MCP server listening on {}", bound_addr);

                handle
                    .await
                    .map_err(|e| anyhow::anyhow!("Server task failed: {}", e))?;
            } else {
                server.run().await?;
            }
        }

        Some(Commands::Config { command }) => match command {
            ConfigCommands::Init { path, force } => {
                let path = path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
                save_config(&path, &Config::default(), force)?;
                if !cli.quiet {
                    ui::print_status(
                        Status::Success,
                        &format!("Wrote default configuration to {}", path.display()),
                    );
                }
            }
            ConfigCommands::Show => {
                match &config_path {
                    Some(path) => ui::print_status(
                        Status::Info,
                        &format!("Config file: {}", path.display()),
                    ),
                    None => ui::print_status(
                        Status::Info,
                        "No config file found, showing defaults and environment",
                    ),
                }
                let rendered = toml::to_string_pretty(&config.redacted())
                    .context("Failed to render configuration")?;
                println!("{}", rendered);
            }
        },

        Some(Commands::Completions { shell }) => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "sop-master", &mut std::io::stdout());
        }

        None => {
            println!("No command provided. Use --help for usage information.");
            println!("Common commands:");
            println!("  generate <notes.txt>   - Generate an SOP and save it as .docx");
            println!("  format <sop.md>        - Convert Markdown to .docx offline");
            println!("  serve                  - Run MCP server");
            println!("  config init            - Write a default config file");
            println!();
            println!("Default config:");
            println!("{}", default_config_toml()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["sop-master"]);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        assert!(cli.timeout.is_none());
        assert!(!cli.env);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::parse_from(["sop-master", "-vv"]);
        assert_eq!(cli.verbose, 2);

        let cli = Cli::parse_from(["sop-master", "--verbose"]);
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn test_cli_timeout_and_config() {
        let cli = Cli::parse_from([
            "sop-master",
            "--timeout",
            "60",
            "--config",
            "/path/to/sop-master.toml",
        ]);
        assert_eq!(cli.timeout, Some(60));
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/sop-master.toml")));
    }

    #[test]
    fn test_cli_generate_defaults() {
        let cli = Cli::parse_from(["sop-master", "generate"]);
        match cli.command {
            Some(Commands::Generate {
                input,
                output,
                password,
                api_key,
                no_docx,
            }) => {
                assert!(input.is_none());
                assert_eq!(output, PathBuf::from("SOP_Output.docx"));
                assert!(password.is_none());
                assert!(api_key.is_none());
                assert!(!no_docx);
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_cli_generate_with_options() {
        let cli = Cli::parse_from([
            "sop-master",
            "g",
            "notes.txt",
            "-o",
            "out.docx",
            "--password",
            "pw",
            "--no-docx",
        ]);
        match cli.command {
            Some(Commands::Generate {
                input,
                output,
                password,
                no_docx,
                ..
            }) => {
                assert_eq!(input, Some(PathBuf::from("notes.txt")));
                assert_eq!(output, PathBuf::from("out.docx"));
                assert_eq!(password.as_deref(), Some("pw"));
                assert!(no_docx);
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_cli_format_command() {
        let cli = Cli::parse_from(["sop-master", "format", "sop.md", "--title", "SOP"]);
        match cli.command {
            Some(Commands::Format { input, title, .. }) => {
                assert_eq!(input, PathBuf::from("sop.md"));
                assert_eq!(title.as_deref(), Some("SOP"));
            }
            _ => panic!("Expected Format command"),
        }
    }

    #[test]
    fn test_cli_serve_command() {
        let cli = Cli::parse_from(["sop-master", "serve"]);
        match &cli.command {
            Some(Commands::Serve { http, port, host }) => {
                assert!(!*http);
                assert_eq!(*port, 3000);
                assert_eq!(host, "127.0.0.1");
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_config_init() {
        let cli = Cli::parse_from(["sop-master", "config", "init", "--force"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                command: ConfigCommands::Init { force: true, .. }
            })
        ));
    }

    #[test]
    fn test_cli_completions() {
        let cli = Cli::parse_from(["sop-master", "completions", "bash"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Completions { shell: Shell::Bash })
        ));
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
