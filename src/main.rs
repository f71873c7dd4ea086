//! MCP Server Template - Rust Implementation
//!
//! Serves the example MCP server over stdio, or scaffolds a new server
//! project from the bundled templates.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use mcp_server_template::config::Config;
use mcp_server_template::error::Result;
use mcp_server_template::mcp::example::ExampleHandler;
use mcp_server_template::mcp::McpServer;
use mcp_server_template::template::{self, Layout, Placeholder, RuntimeSource, TemplateContext};

/// MCP Server Template
#[derive(Parser)]
#[command(name = "mcp-server-template")]
#[command(author, version, about = "Scaffold and run stdio Model Context Protocol servers")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Identity overrides shared by `serve` and `generate`
#[derive(Args, Default)]
struct IdentityArgs {
    /// Server version (`--version` prints this tool's own version)
    #[arg(long = "server-version")]
    server_version: Option<String>,

    /// Server description
    #[arg(long)]
    description: Option<String>,

    /// Author
    #[arg(long)]
    author: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the example server on stdio (default)
    Serve {
        /// Server name (also the resource URI scheme)
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        identity: IdentityArgs,
    },

    /// Generate a new MCP server project
    Generate {
        /// Server name (also the crate name and resource URI scheme)
        #[arg(long)]
        name: String,

        /// Project layout
        #[arg(long, default_value_t = Layout::Full)]
        layout: Layout,

        /// Output directory
        #[arg(long)]
        out: PathBuf,

        /// JSON file mapping placeholder names to code snippets
        #[arg(long)]
        snippets: Option<PathBuf>,

        /// Write into a non-empty output directory
        #[arg(long)]
        force: bool,

        /// Local checkout of the runtime crate the project depends on
        /// (defaults to the tree this binary was built from)
        #[arg(long, conflicts_with = "runtime_git")]
        runtime_path: Option<PathBuf>,

        /// Git repository of the runtime crate the project depends on
        #[arg(long)]
        runtime_git: Option<String>,

        #[command(flatten)]
        identity: IdentityArgs,
    },

    /// List the placeholder tokens templates may contain
    Placeholders,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve {
        name: None,
        identity: IdentityArgs::default(),
    }) {
        Commands::Serve { name, identity } => {
            let config = load_config(name, identity)?;
            run_server(config).await
        }
        Commands::Generate {
            name,
            layout,
            out,
            snippets,
            force,
            runtime_path,
            runtime_git,
            identity,
        } => {
            let config = load_config(Some(name), identity)?;
            let mut context = TemplateContext::new(config.identity)?;
            match (runtime_path, runtime_git) {
                (Some(path), _) => context.set_runtime(RuntimeSource::path(&path)?),
                (None, Some(url)) => context.set_runtime(RuntimeSource::git(url)?),
                (None, None) => {}
            }
            if let Some(path) = snippets {
                context.load_snippets(&path)?;
            }

            let written = template::generate(layout, &context, &out, force)?;
            for path in written {
                eprintln!("  created {}", path.display());
            }
            eprintln!("Generated {} server in {}", layout, out.display());
            Ok(())
        }
        Commands::Placeholders => {
            for placeholder in Placeholder::ALL {
                println!("{:<42} {}", placeholder.marker(), placeholder.description());
            }
            Ok(())
        }
    }
}

/// Environment first, then flags; validated once both are applied
fn load_config(name: Option<String>, identity: IdentityArgs) -> Result<Config> {
    Config::new().with_overrides(
        name,
        identity.server_version,
        identity.description,
        identity.author,
    )
}

async fn run_server(config: Config) -> Result<()> {
    let name = config.identity.name.clone();
    let handler = ExampleHandler::new(config.identity.clone());
    let mut server = McpServer::new(config.identity, handler);

    if let Err(e) = server.run_stdio().await {
        tracing::error!("Fatal error in {} MCP Server: {}", name, e);
        std::process::exit(1);
    }

    // Stdin is read on a blocking thread that would otherwise hold the runtime open
    std::process::exit(0);
}
