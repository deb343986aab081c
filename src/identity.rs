//! Caller identity and role resolution.
//!
//! Every mutating command records who acted. Rather than requiring `--as`
//! on every invocation, identity is resolved through a chain:
//!
//! 1. `--as <name>` flag
//! 2. `FURROW_IDENTITY` env var
//! 3. `identity` in `~/.furrow/config.toml`
//!
//! The role follows the same chain (`--role`, `FURROW_ROLE`, `role`). The
//! engine trusts the resolved role; commands check it before calling in.

use std::{env, fmt, str::FromStr};

use clap::ValueEnum;
use serde::Deserialize;

use crate::config::Config;

/// Error message shown when identity cannot be resolved.
pub const IDENTITY_REQUIRED: &str = "identity required: pass --as <name>, \
    set FURROW_IDENTITY, or add `identity = \"...\"` to ~/.furrow/config.toml";

/// Error message shown when role cannot be resolved.
pub const ROLE_REQUIRED: &str = "role required: pass --role <role>, \
    set FURROW_ROLE, or add `role = \"...\"` to ~/.furrow/config.toml";

/// What a caller is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Manages the catalog, farms, plantings, and stock.
    Owner,
    /// Works the plots: completes and skips tasks.
    Farmer,
    /// Read-only access.
    Subscriber,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Farmer => "farmer",
            Self::Subscriber => "subscriber",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "farmer" => Ok(Self::Farmer),
            "subscriber" => Ok(Self::Subscriber),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A resolved caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub name: String,
    pub role: Role,
}

impl Actor {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }

    /// Fails unless the actor holds one of `allowed`.
    pub fn require(&self, allowed: &[Role]) -> Result<(), String> {
        if allowed.contains(&self.role) {
            return Ok(());
        }
        let allowed = allowed
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(" or ");
        Err(format!(
            "permission denied: {} is a {}, this needs {allowed}",
            self.name, self.role
        ))
    }
}

/// Resolve the acting identity and role from the tiered chain.
pub fn resolve_actor(
    config: &Config,
    explicit_name: Option<&str>,
    explicit_role: Option<Role>,
) -> Result<Actor, String> {
    let name = resolve_name(config, explicit_name, env::var("FURROW_IDENTITY").ok())?;
    let role = resolve_role(config, explicit_role, env::var("FURROW_ROLE").ok())?;
    Ok(Actor::new(name, role))
}

fn resolve_name(
    config: &Config,
    explicit: Option<&str>,
    from_env: Option<String>,
) -> Result<String, String> {
    // 1. Explicit --as flag.
    if let Some(name) = explicit {
        return Ok(name.to_string());
    }

    // 2. FURROW_IDENTITY environment variable.
    if let Some(name) = from_env
        && !name.is_empty()
    {
        return Ok(name);
    }

    // 3. ~/.furrow/config.toml.
    config
        .identity
        .clone()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| IDENTITY_REQUIRED.to_string())
}

fn resolve_role(
    config: &Config,
    explicit: Option<Role>,
    from_env: Option<String>,
) -> Result<Role, String> {
    if let Some(role) = explicit {
        return Ok(role);
    }

    if let Some(role) = from_env
        && !role.is_empty()
    {
        return role.parse();
    }

    config.role.ok_or_else(|| ROLE_REQUIRED.to_string())
}
