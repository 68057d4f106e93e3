use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "firecamp",
    about = "Service-lifecycle control plane for stateful services",
    version
)]
pub struct Cli {
    /// Path to the embedded redb metadata store.
    #[arg(long, global = true, env = "FIRECAMP_STORE_PATH", default_value = "firecamp.redb")]
    pub store_path: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a service from a YAML request file.
    Create {
        /// Path to a CreateService request YAML file.
        request: PathBuf,
        #[arg(long, default_value = "example.com")]
        domain: String,
        #[arg(long, default_value = "vpc-1")]
        vpc_id: String,
        #[arg(long, default_value = "us-east-1")]
        region: String,
    },

    /// Delete a service and release its resources.
    Delete { cluster: String, service: String },

    /// Mark a service ACTIVE once its post-start initialization has run.
    Init { cluster: String, service: String },

    /// Show a service's attributes and members.
    Get { cluster: String, service: String },

    /// List every service in a cluster.
    List { cluster: String },

    /// Start the HTTP API server against an embedded store and local drivers.
    Bootstrap {
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
        /// Bearer token required on every request. Generated if omitted.
        #[arg(long, env = "FIRECAMP_AUTH_TOKEN")]
        auth_token: Option<String>,
        #[arg(long, default_value = "example.com")]
        domain: String,
        #[arg(long, default_value = "vpc-1")]
        vpc_id: String,
        #[arg(long, default_value = "us-east-1")]
        region: String,
        /// Use an in-memory store instead of the embedded redb file — state
        /// is lost on server stop.
        #[arg(long)]
        ephemeral: bool,
    },
}
