mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "kubestrap")]
#[command(about = "Bootstrap Kubernetes clusters over SSH with kubeadm", long_about = None)]
struct Cli {
    /// More log output (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize master0, install the network plugin and join every other node
    Init {
        /// Cluster description file
        #[arg(long, short = 'c')]
        config: PathBuf,
        /// Offline packages are already on every node
        #[arg(long)]
        packages_present: bool,
    },
    /// Join nodes to an already initialized cluster
    Join {
        #[command(subcommand)]
        target: JoinTarget,
    },
    /// Reset every node in the cluster
    Reset {
        /// Cluster description file
        #[arg(long, short = 'c')]
        config: PathBuf,
        /// Also remove kubelet, kubeadm and kubectl
        #[arg(long)]
        remove_kube_components: bool,
    },
    /// Print the join credentials found in saved `kubeadm init` output
    Token {
        /// File holding the init output
        file: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum JoinTarget {
    /// Join every master after master0 as a control-plane node
    Masters(JoinArgs),
    /// Join every worker
    Workers(JoinArgs),
}

#[derive(Args)]
pub struct JoinArgs {
    /// Cluster description file
    #[arg(long, short = 'c')]
    pub config: PathBuf,
    /// Bootstrap token (abcdef.0123456789abcdef)
    #[arg(long)]
    pub token: String,
    /// Discovery token CA cert hash, without the sha256: prefix
    #[arg(long)]
    pub ca_cert_hash: String,
    /// Certificate key from `kubeadm init --upload-certs` (masters only)
    #[arg(long, default_value = "")]
    pub certificate_key: String,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "kubestrap=info",
        1 => "kubestrap=debug",
        _ => "kubestrap=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    // .env may carry KUBESTRAP_SSH_PASSWORD
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    commands::handle_command(cli.command)
}
