//! vcloudctl - VCloud provider CLI
//!
//! Query instances and load balancers the way the orchestration framework
//! would, using the same configuration file.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use vcloud_provider::{Config, Node, Service, VCloud, VCloudError, VCloudProvider};

/// VCloud provider CLI
#[derive(Parser)]
#[command(name = "vcloudctl")]
#[command(version = vcloud_provider::PKG_VERSION)]
#[command(about = "Inspect VCloud instances and load balancers")]
struct Args {
    /// Config file (default: ~/.vcloud/config.toml, then /etc/vcloud/config.toml)
    #[arg(short, long, env = "VCLOUD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve an instance: existence, power state and metadata
    Instance {
        /// Provider ID, e.g. "vcloud://instance-123" or "instance-123"
        provider_id: String,
        /// Node name, used when the provider ID is empty
        #[arg(long, default_value = "")]
        node_name: String,
    },

    /// Show the load balancer backing a service
    Lb {
        /// Service name
        service_name: String,
        /// Service UID
        service_uid: String,
        /// Service namespace
        #[arg(short, long, default_value = "default")]
        namespace: String,
    },

    /// Print full version with build metadata
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Command::Version => {
            println!("vcloudctl {}", vcloud_provider::version_string());
        }
        Command::Instance {
            provider_id,
            node_name,
        } => {
            let provider = connect(args.config.as_deref())?;
            let node = Node::new(node_name).with_provider_id(provider_id);
            let instances = provider.instances();

            let exists = instances.instance_exists(&node).await?;
            println!("exists: {exists}");
            if !exists {
                return Ok(());
            }

            let shutdown = instances.instance_shutdown(&node).await?;
            println!("shutdown: {shutdown}");

            match instances.instance_metadata(&node).await {
                Ok(metadata) => println!("{}", serde_json::to_string_pretty(&metadata)?),
                Err(VCloudError::InstanceNotFound) => println!("instance disappeared"),
                Err(e) => return Err(e.into()),
            }
        }
        Command::Lb {
            service_name,
            service_uid,
            namespace,
        } => {
            let provider = connect(args.config.as_deref())?;
            let service = Service::new(service_name, namespace, service_uid);
            let lb = provider.load_balancer();
            println!("name: {}", lb.load_balancer_name(&service));

            match lb.get_load_balancer(&service).await? {
                Some(status) => println!("{}", serde_json::to_string_pretty(&status)?),
                None => println!("not found"),
            }
        }
    }

    Ok(())
}

fn connect(config_path: Option<&Path>) -> vcloud_provider::Result<VCloudProvider> {
    let config = Config::load(config_path)?;
    VCloud::builder().from_config(config).build()
}
