//! `warden explain`: the pure first-denial scan, without the engine

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use warden_capability::find_first_denial;

use super::{position, DomainReport, RequestArgs, Verdict};

/// Arguments for the explain command
#[derive(Args, Debug)]
pub struct ExplainArgs {
    #[clap(flatten)]
    pub request: RequestArgs,
}

#[derive(Debug, Serialize)]
struct ExplainReport {
    permission: String,
    allowed: bool,
    chain_length: usize,
    denied_by: Option<DomainReport>,
}

/// Implementation of the explain command
///
/// Reports which domain would deny the request. Checking flags, the
/// self-protection rule and the sinks are not involved.
pub fn execute(args: &ExplainArgs) -> Result<Verdict> {
    let (permission, chain) = args.request.load()?;
    let denier = find_first_denial(permission.as_ref(), &chain);

    let report = ExplainReport {
        permission: permission.to_string(),
        allowed: denier.is_none(),
        chain_length: chain.len(),
        denied_by: denier.map(|domain| DomainReport::new(position(&chain, domain), domain)),
    };

    if args.request.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match &report.denied_by {
            None => println!("allowed: every domain implies {}", report.permission),
            Some(domain) => {
                println!("denied: {}", report.permission);
                println!("  first denying domain: #{} {}", domain.index, domain.id);
                println!("  code source: {}", domain.code_source);
                if let Some(loader) = &domain.loader {
                    println!("  loader: {}", loader);
                }
                if !domain.principals.is_empty() {
                    println!("  principals: {}", domain.principals.join(", "));
                }
            }
        }
    }

    Ok(if report.allowed {
        Verdict::Allowed
    } else {
        Verdict::Denied
    })
}
