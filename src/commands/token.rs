//! Recover join credentials from saved init output

use anyhow::{Context, Result};
use kubestrap::phases::token;
use std::fs;
use std::path::Path;

pub fn handle_token(file: &Path) -> Result<()> {
    let output = fs::read_to_string(file)
        .with_context(|| format!("Failed to read init output: {}", file.display()))?;
    let creds = token::from_init_output(&output)?;

    println!("token:           {}", creds.token);
    println!("ca-cert-hash:    sha256:{}", creds.ca_cert_hash);
    println!("certificate-key: {}", creds.certificate_key);
    Ok(())
}
