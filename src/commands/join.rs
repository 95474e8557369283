//! Join nodes to an existing cluster with known credentials

use crate::commands::{load_cluster, runtime};
use crate::{JoinArgs, JoinTarget};
use anyhow::{Context, Result, bail};
use kubestrap::cluster::Token;
use kubestrap::fanout::Fanout;
use kubestrap::phases::{preflight, token};
use std::sync::Arc;

pub fn handle_join(target: JoinTarget) -> Result<()> {
    let (args, masters) = match target {
        JoinTarget::Masters(args) => (args, true),
        JoinTarget::Workers(args) => (args, false),
    };

    if masters && args.certificate_key.is_empty() {
        bail!("--certificate-key is required to join masters");
    }
    let creds = credentials(&args);
    if masters {
        token::validate(&creds)?;
    } else {
        token::validate_discovery(&creds)?;
    }

    let cluster = Arc::new(load_cluster(&args.config)?);
    preflight::connect(&cluster);

    let fanout = Fanout::new(cluster.settings.parallelism);
    let rt = runtime()?;
    if masters {
        rt.block_on(kubestrap::join_other_masters(&cluster, &creds, &fanout))
            .context("Joining masters failed")?;
    } else {
        rt.block_on(kubestrap::join_workers(&cluster, &creds, &fanout))
            .context("Joining workers failed")?;
    }
    println!("✓ Join complete");
    Ok(())
}

fn credentials(args: &JoinArgs) -> Token {
    Token {
        token: args.token.trim().to_string(),
        ca_cert_hash: args
            .ca_cert_hash
            .trim()
            .trim_start_matches("sha256:")
            .to_string(),
        certificate_key: args.certificate_key.trim().to_string(),
    }
}
