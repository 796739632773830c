//! Command metadata published by the backend.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ScriptError;

/// Name and ordered parameter names of one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    pub name: String,
    pub parameter_names: Vec<String>,
}

impl CommandDescriptor {
    pub fn new(name: impl Into<String>, parameter_names: Vec<String>) -> Self {
        Self {
            name: name.into(),
            parameter_names,
        }
    }

    pub fn arity(&self) -> usize {
        self.parameter_names.len()
    }

    /// Render a script line with every argument written as a JSON string,
    /// e.g. `TYPE_XPATH "//input" "hello"`.
    pub fn render(&self, args: &[String]) -> Result<String, ScriptError> {
        if args.len() != self.arity() {
            return Err(ScriptError::ArityMismatch {
                command: self.name.clone(),
                expected: self.arity(),
                actual: args.len(),
            });
        }

        let mut line = self.name.clone();
        for arg in args {
            line.push(' ');
            line.push_str(&serde_json::Value::String(arg.clone()).to_string());
        }
        Ok(line)
    }
}

/// Command catalog, keyed by command name.
///
/// On the wire it is a JSON object mapping each name to its parameter names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Vec<String>>", into = "BTreeMap<String, Vec<String>>")]
pub struct CommandCatalog {
    commands: Vec<CommandDescriptor>,
}

impl CommandCatalog {
    pub fn new(commands: Vec<CommandDescriptor>) -> Self {
        Self { commands }
    }

    /// Look a command up by name. Exact matches win over case-insensitive ones.
    pub fn get(&self, name: &str) -> Option<&CommandDescriptor> {
        self.commands
            .iter()
            .find(|c| c.name == name)
            .or_else(|| self.commands.iter().find(|c| c.name.eq_ignore_ascii_case(name)))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|c| c.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Check that `name` exists and `args` match its arity.
    pub fn validate(&self, name: &str, args: &[String]) -> Result<&CommandDescriptor, ScriptError> {
        let descriptor = self
            .get(name)
            .ok_or_else(|| ScriptError::UnknownCommand(name.to_string()))?;
        if descriptor.arity() != args.len() {
            return Err(ScriptError::ArityMismatch {
                command: descriptor.name.clone(),
                expected: descriptor.arity(),
                actual: args.len(),
            });
        }
        Ok(descriptor)
    }
}

impl From<BTreeMap<String, Vec<String>>> for CommandCatalog {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            commands: map
                .into_iter()
                .map(|(name, parameter_names)| CommandDescriptor {
                    name,
                    parameter_names,
                })
                .collect(),
        }
    }
}

impl From<CommandCatalog> for BTreeMap<String, Vec<String>> {
    fn from(catalog: CommandCatalog) -> Self {
        catalog
            .commands
            .into_iter()
            .map(|c| (c.name, c.parameter_names))
            .collect()
    }
}
