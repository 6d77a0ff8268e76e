use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

mod commands;

use commands::{CliError, Session};

#[derive(Parser, Debug)]
#[command(name = "forgeflow", version = "0.6.0")]
#[command(about = "Forgeflow CLI - plan, synthesize and run component workflows")]
struct Cli {
    /// TOML config file, applied before FORGEFLOW_* environment variables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Seed the registry with the built-in components
    Init {
        /// Additional TOML manifest to register after the built-ins
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// Plan, synthesize and execute a workflow for a goal
    Run {
        #[arg(long)]
        goal: String,
        /// Initial context as JSON (a bare string is used as `input`)
        #[arg(long)]
        input: Option<String>,
        /// Source file to classify before planning
        #[arg(long)]
        code: Option<PathBuf>,
    },
    /// List registered components
    List {
        /// Only this kind (tool, agent, team)
        #[arg(long)]
        kind: Option<String>,
    },
    /// Classify a source file as tool, agent or team
    Classify { path: PathBuf },
    /// Synthesize and register a new component
    Generate {
        #[arg(long)]
        name: String,
        /// Component kind (tool, agent, team)
        #[arg(long, default_value = "agent")]
        kind: String,
        #[arg(long)]
        goal: String,
    },
    /// Regenerate an existing component for a new goal
    Regenerate {
        #[arg(long)]
        name: String,
        #[arg(long)]
        goal: String,
    },
    /// Record a 1-5 rating for a component
    Feedback {
        #[arg(long)]
        name: String,
        #[arg(long)]
        rating: u8,
        #[arg(long, default_value = "")]
        comment: String,
    },
    /// Store a deployment descriptor for a component
    Deploy {
        #[arg(long)]
        name: String,
        #[arg(long)]
        endpoint: String,
        /// Deployment target family
        #[arg(long, default_value = "container")]
        target: String,
        #[arg(long)]
        region: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize JSON logging once.
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let env_filter = match "info".parse() {
        Ok(directive) => env_filter.add_directive(directive),
        Err(_) => env_filter,
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .json()
        .try_init();

    let cli = Cli::parse();

    if let Err(e) = dispatch(cli).await {
        tracing::error!(error = %e, code = e.error_code(), "Command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let session = Session::open(cli.config.as_deref())?;

    let output = match cli.command {
        Commands::Init { manifest } => session.init(manifest.as_deref())?,
        Commands::Run { goal, input, code } => {
            session.run(&goal, input.as_deref(), code.as_deref()).await?
        }
        Commands::List { kind } => session.list(kind.as_deref())?,
        Commands::Classify { path } => session.classify(&path)?,
        Commands::Generate { name, kind, goal } => session.generate(&name, &kind, &goal).await?,
        Commands::Regenerate { name, goal } => session.regenerate(&name, &goal).await?,
        Commands::Feedback {
            name,
            rating,
            comment,
        } => session.feedback(&name, rating, &comment)?,
        Commands::Deploy {
            name,
            endpoint,
            target,
            region,
        } => session.deploy(&name, &endpoint, &target, region)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);

    // A failed orchestration still prints its structured result first.
    if output.get("success") == Some(&Value::Bool(false)) {
        let message = output
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("orchestration failed");
        return Err(CliError::Orchestration(message.to_string()));
    }
    Ok(())
}
