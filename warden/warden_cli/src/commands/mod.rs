//! Subcommands of the `warden` binary
//!
//! Every command reports its verdict through [`Verdict`], which main turns
//! into the process exit code.

pub mod check;
pub mod explain;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use warden_capability::{parse_permission, CallChain, Permission, ProtectionDomain};

use crate::fixture::ChainFixture;

/// Arguments shared by every command that decides a request
#[derive(Args, Debug)]
pub struct RequestArgs {
    /// TOML file describing the call chain, innermost domain first
    #[clap(long)]
    pub chain: PathBuf,

    /// Requested permission, e.g. `runtime:exitVM` or `file:/etc/passwd:read`
    #[clap(long)]
    pub permission: String,

    /// Print the result as JSON
    #[clap(long)]
    pub json: bool,
}

impl RequestArgs {
    pub fn load(&self) -> Result<(Box<dyn Permission>, CallChain)> {
        let permission = parse_permission(&self.permission)
            .with_context(|| format!("invalid permission '{}'", self.permission))?;
        let chain = load_chain(&self.chain)?;
        Ok((permission, chain))
    }
}

fn load_chain(path: &Path) -> Result<CallChain> {
    let chain = ChainFixture::load(path)
        .and_then(ChainFixture::into_chain)
        .with_context(|| format!("failed to load chain from {}", path.display()))?;
    tracing::debug!(domains = chain.len(), path = %path.display(), "loaded call chain");
    Ok(chain)
}

/// Outcome of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Denied,
}

/// JSON view of a protection domain
#[derive(Debug, Serialize)]
pub struct DomainReport {
    /// Position in the chain, 0 being innermost
    pub index: usize,
    pub id: String,
    pub code_source: String,
    pub loader: Option<String>,
    pub principals: Vec<String>,
}

impl DomainReport {
    pub fn new(index: usize, domain: &ProtectionDomain) -> Self {
        Self {
            index,
            id: domain.id().to_string(),
            code_source: domain.code_source().to_string(),
            loader: domain.loader().map(str::to_string),
            principals: domain.principals().iter().map(ToString::to_string).collect(),
        }
    }
}

/// Finds the chain position of `domain`
pub fn position(chain: &CallChain, domain: &ProtectionDomain) -> usize {
    chain
        .iter()
        .position(|d| d.id() == domain.id())
        .unwrap_or_default()
}
