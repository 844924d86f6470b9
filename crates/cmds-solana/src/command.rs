//! Compile-time registry of commands.
//!
//! Each command module registers itself with [`inventory::submit`] and a
//! [`CommandDescription`], the CLI lists them with [`collect_commands`].

use std::collections::BTreeMap;

/// Error type of commands.
pub type CommandError = anyhow::Error;

#[derive(Debug, Clone, Copy)]
pub struct CommandDescription {
    /// Unique name to identify the command.
    pub name: &'static str,
    /// One-line summary.
    pub about: &'static str,
}

impl CommandDescription {
    pub const fn new(name: &'static str, about: &'static str) -> Self {
        Self { name, about }
    }
}

inventory::collect!(CommandDescription);

pub fn collect_commands() -> BTreeMap<&'static str, &'static CommandDescription> {
    inventory::iter::<CommandDescription>()
        .map(|c| (c.name, c))
        .collect()
}
