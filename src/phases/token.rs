//! Join credentials from `kubeadm init` output

use crate::cluster::Token;
use crate::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

const TOKEN_MARKER: &str = "--token ";
const HASH_MARKER: &str = "sha256:";
const CERT_KEY_MARKER: &str = "--certificate-key ";

const TOKEN_LEN: usize = 23;
const HASH_LEN: usize = 64;
const CERT_KEY_LEN: usize = 64;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]{6}\.[a-z0-9]{16}$").expect("valid token regex"));
static HEX64_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-f0-9]{64}$").expect("valid hex regex"));

/// The `len` characters right after the first `marker`, or an empty string
/// when the marker is missing or the output is cut short
fn after_marker(output: &str, marker: &str, len: usize) -> String {
    output
        .find(marker)
        .map(|at| at + marker.len())
        .and_then(|start| output.get(start..start + len))
        .map(str::to_string)
        .unwrap_or_default()
}

/// Pull the bootstrap token, CA cert hash and certificate key out of init
/// output. Never fails: missing pieces come back empty.
pub fn extract_token(output: &str) -> Token {
    Token {
        token: after_marker(output, TOKEN_MARKER, TOKEN_LEN),
        ca_cert_hash: after_marker(output, HASH_MARKER, HASH_LEN),
        certificate_key: after_marker(output, CERT_KEY_MARKER, CERT_KEY_LEN),
    }
}

/// Check the two credentials every join needs
pub fn validate_discovery(token: &Token) -> Result<()> {
    if !TOKEN_RE.is_match(&token.token) {
        return Err(Error::malformed_init_output(format!(
            "bootstrap token '{}' is missing or not of the form [a-z0-9]{{6}}.[a-z0-9]{{16}}",
            token.token
        )));
    }
    if !HEX64_RE.is_match(&token.ca_cert_hash) {
        return Err(Error::malformed_init_output(
            "discovery token CA cert hash is missing or not 64 hex characters",
        ));
    }
    Ok(())
}

/// Reject credentials that cannot possibly work for a control-plane join
pub fn validate(token: &Token) -> Result<()> {
    validate_discovery(token)?;
    if !HEX64_RE.is_match(&token.certificate_key) {
        return Err(Error::malformed_init_output(
            "certificate key is missing or not 64 hex characters (was --upload-certs passed?)",
        ));
    }
    Ok(())
}

/// Extract and validate in one step
pub fn from_init_output(output: &str) -> Result<Token> {
    let token = extract_token(output);
    validate(&token)?;
    Ok(token)
}
