//! `warden check`: a full engine decision on a checked thread

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use warden_core::GateConfig;
use warden_gate::{run_checked, SecurityGate};

use super::{position, DomainReport, RequestArgs, Verdict};

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[clap(flatten)]
    pub request: RequestArgs,

    /// Gate configuration file (TOML)
    #[clap(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    permission: String,
    allowed: bool,
    reason: Option<&'static str>,
    error: Option<String>,
    domain: Option<DomainReport>,
    audit_entries: Option<usize>,
}

/// Implementation of the check command
pub fn execute(args: &CheckArgs) -> Result<Verdict> {
    let config = GateConfig::load(args.config.as_deref()).context("failed to load gate config")?;
    let (permission, chain) = args.request.load()?;

    let gate = SecurityGate::from_config(&config);
    let outcome = run_checked(|| gate.check(permission.as_ref(), &chain));

    let error = outcome.as_ref().err();
    let report = CheckReport {
        permission: permission.to_string(),
        allowed: error.is_none(),
        reason: error.map(|e| e.reason().as_str()),
        error: error.map(ToString::to_string),
        domain: error
            .and_then(|e| e.domain())
            .map(|domain| DomainReport::new(position(&chain, domain), domain)),
        audit_entries: gate.audit_log().map(|log| log.len()),
    };

    if args.request.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if let Some(error) = &report.error {
        println!("denied ({}): {}", report.reason.unwrap_or_default(), error);
    } else {
        println!("allowed: {}", report.permission);
    }

    if let Some(entries) = report.audit_entries {
        tracing::info!(entries, "audit log after decision");
    }

    Ok(if report.allowed {
        Verdict::Allowed
    } else {
        Verdict::Denied
    })
}
