use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing::info;

use krex_core::{FieldNode, ResourceListing, ResourceTypeDescriptor};
use krex_explorer::Explorer;
use krex_kubectl::{GetOutput, KubectlConfig, KubectlRunner};

#[derive(Parser, Debug)]
#[command(name = "krexctl", version, about = "Browse cluster API resources and their field schemas")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    /// Tool context to pass on every call
    #[arg(long = "context", global = true)]
    context: Option<String>,

    /// Kubeconfig path to pass on every call
    #[arg(long = "kubeconfig", global = true)]
    kubeconfig: Option<PathBuf>,

    /// Tool binary to spawn (default: kubectl)
    #[arg(long = "kubectl", global = true)]
    kubectl: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output {
    Human,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Scope {
    Namespaced,
    Cluster,
    All,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List resource types served by the cluster
    Resources {
        /// Restrict to one side of the namespaced/cluster partition
        #[arg(long = "scope", value_enum, default_value_t = Scope::All)]
        scope: Scope,
    },
    /// Print the recursive field tree of a resource type
    Fields {
        /// Resource name, short name, or kind
        resource: String,
    },
    /// Print the documentation for a resource type or one of its field paths
    Explain {
        /// Resource name, short name, or kind
        resource: String,
        /// Dotted field path, e.g. pods.spec.containers
        #[arg(long = "path")]
        path: Option<String>,
    },
    /// Raw object listing for a resource type
    Get {
        /// Resource name, short name, or kind
        resource: String,
        /// Wide columns
        #[arg(long = "wide", action = ArgAction::SetTrue)]
        wide: bool,
        /// Full YAML objects
        #[arg(long = "yaml", action = ArgAction::SetTrue)]
        yaml: bool,
        /// All namespaces
        #[arg(short = 'A', long = "all-namespaces", action = ArgAction::SetTrue)]
        all_namespaces: bool,
    },
    /// Raw describe output for a resource type
    Describe {
        /// Resource name, short name, or kind
        resource: String,
        /// All namespaces
        #[arg(short = 'A', long = "all-namespaces", action = ArgAction::SetTrue)]
        all_namespaces: bool,
    },
}

fn init_tracing() {
    let env = std::env::var("KREX_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("KREX_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid KREX_METRICS_ADDR; expected host:port");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();

    let config = KubectlConfig {
        binary: cli.kubectl.clone(),
        context: cli.context.clone(),
        kubeconfig: cli.kubeconfig.clone(),
    };
    let explorer = Explorer::new(Arc::new(KubectlRunner::new(config)));

    match cli.command {
        Commands::Resources { scope } => {
            info!(?scope, "resources invoked");
            let listing = explorer.resources().await;
            let selected: Vec<&ResourceTypeDescriptor> = match scope {
                Scope::Namespaced => listing.namespaced().collect(),
                Scope::Cluster => listing.cluster_scoped().collect(),
                Scope::All => listing.resources.iter().collect(),
            };
            match cli.output {
                Output::Human => {
                    println!(
                        "{:<34} {:<14} {:<30} {:<12} {}",
                        "NAME", "SHORTNAMES", "APIVERSION", "NAMESPACED", "KIND"
                    );
                    for r in &selected {
                        println!(
                            "{:<34} {:<14} {:<30} {:<12} {}",
                            r.name, r.short_name, r.api_version, r.namespaced, r.kind
                        );
                    }
                }
                Output::Json => println!("{}", serde_json::to_string_pretty(&selected)?),
            }
        }
        Commands::Fields { resource } => {
            info!(resource = %resource, "fields invoked");
            let listing = explorer.resources().await;
            let Some(rt) = find_resource(&listing, &resource) else {
                eprintln!("unknown resource type: {}", resource);
                return Ok(());
            };
            let report = explorer.field_tree(rt).await;
            match cli.output {
                Output::Human => print_tree(&report.root, 0),
                Output::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }
        Commands::Explain { resource, path } => {
            info!(resource = %resource, path = ?path, "explain invoked");
            let listing = explorer.resources().await;
            let Some(rt) = find_resource(&listing, &resource) else {
                eprintln!("unknown resource type: {}", resource);
                return Ok(());
            };
            let path = path.unwrap_or_else(|| rt.name.clone());
            match explorer.explain_path(rt, &path).await {
                Some(text) => println!("{}", text),
                None => eprintln!("explain failed for {}", path),
            }
        }
        Commands::Get {
            resource,
            wide,
            yaml,
            all_namespaces,
        } => {
            info!(resource = %resource, wide, yaml, all_namespaces, "get invoked");
            let listing = explorer.resources().await;
            let Some(rt) = find_resource(&listing, &resource) else {
                eprintln!("unknown resource type: {}", resource);
                return Ok(());
            };
            let output = if yaml {
                GetOutput::Yaml
            } else if wide {
                GetOutput::Wide
            } else {
                GetOutput::Plain
            };
            match explorer.get_raw(rt, output, all_namespaces).await {
                Some(text) => print!("{}", text),
                None => eprintln!("get failed for {}", rt.name),
            }
        }
        Commands::Describe {
            resource,
            all_namespaces,
        } => {
            info!(resource = %resource, all_namespaces, "describe invoked");
            let listing = explorer.resources().await;
            let Some(rt) = find_resource(&listing, &resource) else {
                eprintln!("unknown resource type: {}", resource);
                return Ok(());
            };
            match explorer.describe_raw(rt, all_namespaces).await {
                Some(text) => print!("{}", text),
                None => eprintln!("describe failed for {}", rt.name),
            }
        }
    }

    Ok(())
}

/// Resolve a user-supplied resource query against the listing: plural
/// name, any short alias, or the kind.
fn find_resource<'a>(
    listing: &'a ResourceListing,
    query: &str,
) -> Option<&'a ResourceTypeDescriptor> {
    listing.resources.iter().find(|r| {
        r.name == query || r.kind == query || r.short_name.split(',').any(|s| s == query)
    })
}

fn print_tree(node: &FieldNode, depth: usize) {
    let indent = "  ".repeat(depth);
    match node.type_token() {
        Some(token) => println!("{}{}: {}", indent, node.name(), token),
        None => {
            println!("{}{}", indent, node.name());
            for child in node.children() {
                print_tree(child, depth + 1);
            }
        }
    }
}
