use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use fabric_registry::{Config, EnvironmentFlags, Error, Workspace};

/// fabreg - Inspect Hyperledger Fabric environments, wallets and gateways
#[derive(Parser)]
#[command(name = "fabreg", version, about)]
struct Cli {
    /// Registry storage directory
    #[arg(long, env = "FABRIC_REGISTRY_DIR")]
    storage_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List registered environments, local ones first
    Environments {
        /// Only environments carrying one of these tags
        #[arg(long)]
        include: Vec<EnvironmentFlags>,
        /// Drop environments carrying any of these tags
        #[arg(long)]
        exclude: Vec<EnvironmentFlags>,
    },
    /// List the nodes of an environment
    Nodes {
        /// Environment name
        environment: String,
        /// Include hidden nodes
        #[arg(long)]
        all: bool,
        /// Only nodes lacking a wallet or identity
        #[arg(long)]
        without_identities: bool,
    },
    /// List the organizations (MSP IDs) of an environment
    Orgs {
        /// Environment name
        environment: String,
        /// Leave out orderer organizations
        #[arg(long)]
        hide_orderers: bool,
    },
    /// Report whether any node still needs a wallet and identity
    SetupRequired {
        /// Environment name
        environment: String,
    },
    /// List wallets, reconciling environment identities
    Wallets {
        /// Do not move local environment wallets to the front
        #[arg(long)]
        hide_local: bool,
    },
    /// List the identities an environment exports for a wallet
    Identities {
        /// Environment name
        environment: String,
        /// Wallet name
        wallet: String,
    },
    /// List gateways
    Gateways {
        /// Do not move local environment gateways to the front
        #[arg(long)]
        hide_local: bool,
    },
    /// Delete a node file from an environment
    DeleteNode {
        /// Environment name
        environment: String,
        /// Node name
        node: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,fabric_registry=info",
        1 => "info,fabric_registry=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(dir) = cli.storage_dir {
        config = config.with_storage_dir(dir);
    }
    let workspace = Workspace::from_config(&config);

    match cli.command {
        Command::Environments { include, exclude } => {
            print_json(&workspace.environments().get_all(&include, &exclude).await?)
        }
        Command::Nodes {
            environment,
            all,
            without_identities,
        } => {
            let env = workspace.environment(&environment).await?;
            print_json(&env.get_nodes(without_identities, all).await?)
        }
        Command::Orgs {
            environment,
            hide_orderers,
        } => {
            let env = workspace.environment(&environment).await?;
            print_json(&env.get_all_organization_names(!hide_orderers).await?)
        }
        Command::SetupRequired { environment } => {
            let env = workspace.environment(&environment).await?;
            print_json(&env.require_setup().await?)
        }
        Command::Wallets { hide_local } => {
            print_json(&workspace.wallets().get_all(!hide_local).await?)
        }
        Command::Identities {
            environment,
            wallet,
        } => {
            let env = workspace.environment(&environment).await?;
            print_json(&env.get_identities(&wallet).await?)
        }
        Command::Gateways { hide_local } => {
            print_json(&workspace.gateways().get_all(!hide_local).await?)
        }
        Command::DeleteNode { environment, node } => {
            let env = workspace.environment(&environment).await?;
            let target = env
                .get_nodes(false, true)
                .await?
                .into_iter()
                .find(|n| n.name == node)
                .ok_or_else(|| Error::not_found("nodes", &node, Some(environment.as_str())))?;
            env.delete_node(&target).await?;
            tracing::info!(environment = %environment, node = %node, "deleted node");
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
