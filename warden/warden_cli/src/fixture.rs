//! Call chain fixtures
//!
//! A fixture describes a call chain as TOML, innermost domain first:
//!
//! ```toml
//! [[domain]]
//! location = "file:/srv/plugins/report.wasm"
//! loader = "plugins"
//! principals = [{ kind = "user", name = "alice" }]
//! grants = ["file:/srv/data/-:read", "runtime:plugin.*"]
//!
//! [[domain]]
//! location = "system"
//! privileged = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use warden_capability::{
    parse_permission, AllPermission, CallChain, CodeSource, PermissionParseError, Principal,
    ProtectionDomain,
};

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Failed to read fixture {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse fixture: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid grant '{grant}' in domain #{index}")]
    Grant {
        index: usize,
        grant: String,
        #[source]
        source: PermissionParseError,
    },
}

#[derive(Debug, Deserialize)]
pub struct ChainFixture {
    #[serde(rename = "domain", default)]
    pub domains: Vec<DomainFixture>,
}

#[derive(Debug, Deserialize)]
pub struct DomainFixture {
    pub location: Option<String>,

    pub loader: Option<String>,

    #[serde(default)]
    pub principals: Vec<PrincipalFixture>,

    /// Permission specs such as `runtime:exitVM`
    #[serde(default)]
    pub grants: Vec<String>,

    /// Grants every permission
    #[serde(default)]
    pub privileged: bool,
}

#[derive(Debug, Deserialize)]
pub struct PrincipalFixture {
    pub kind: String,
    pub name: String,
}

impl ChainFixture {
    pub fn from_toml_str(text: &str) -> Result<Self, FixtureError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let text = fs::read_to_string(path).map_err(|source| FixtureError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Builds the described chain
    pub fn into_chain(self) -> Result<CallChain, FixtureError> {
        self.domains
            .into_iter()
            .enumerate()
            .map(|(index, domain)| domain.build(index))
            .collect()
    }
}

impl DomainFixture {
    fn build(self, index: usize) -> Result<Arc<ProtectionDomain>, FixtureError> {
        let code_source = self
            .location
            .map(CodeSource::new)
            .unwrap_or_else(CodeSource::unknown);
        let mut builder = ProtectionDomain::builder(code_source);

        if let Some(loader) = self.loader {
            builder = builder.loader(loader);
        }
        for principal in self.principals {
            builder = builder.principal(Principal::new(principal.kind, principal.name));
        }
        if self.privileged {
            builder = builder.grant(AllPermission);
        }
        for grant in self.grants {
            let permission = parse_permission(&grant).map_err(|source| FixtureError::Grant {
                index,
                grant: grant.clone(),
                source,
            })?;
            builder = builder.grant_boxed(permission);
        }

        Ok(builder.build())
    }
}
