//! Compiled drawing scripts.
//!
//! A script is the flat, paint-ordered command stream a graph compiles to.
//! Scripts are immutable once built; the registry swaps whole entries so
//! drivers can read them concurrently without coordination. The canonical
//! wire encoding doubles as the change detector: two scripts are the same
//! rendering exactly when their bytes are equal.

pub mod command;
pub mod encode;

use std::fmt::Display;

use serde::{Deserialize, Serialize};

pub use command::ScriptCommand;

/// Externally addressable name of a registered script.
///
/// Root and main sentinels are reserved names; scenes otherwise pick their
/// own ids (commonly a UUID string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GraphId(String);

impl GraphId {
    /// Name the root scene's graph registers under.
    pub fn root() -> GraphId {
        GraphId("_root_".to_string())
    }

    /// Conventional name for an application's main graph.
    pub fn main() -> GraphId {
        GraphId("_main_".to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == "_root_"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GraphId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for GraphId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for GraphId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An ordered drawing-command sequence with its canonical byte encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    commands: Vec<ScriptCommand>,
    wire: Vec<u8>,
}

impl Script {
    /// Build a script, computing the wire bytes once.
    pub fn from_commands(commands: Vec<ScriptCommand>) -> Self {
        let wire = encode::encode(&commands);
        Self { commands, wire }
    }

    pub fn empty() -> Self {
        Self::from_commands(Vec::new())
    }

    pub fn commands(&self) -> &[ScriptCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Canonical byte encoding. Byte equality here is the no-op change
    /// detection contract.
    pub fn wire_bytes(&self) -> &[u8] {
        &self.wire
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_id_sentinels() {
        assert!(GraphId::root().is_root());
        assert!(!GraphId::main().is_root());
        assert_eq!(GraphId::from("_root_"), GraphId::root());
    }

    #[test]
    fn empty_script_has_empty_command_list() {
        let s = Script::empty();
        assert!(s.is_empty());
        assert_eq!(s.len(), 0);
    }

    #[test]
    fn equal_commands_equal_bytes() {
        let cmds = vec![
            ScriptCommand::PushState,
            ScriptCommand::Translate(10.0, 20.0),
            ScriptCommand::DrawRect {
                width: 100.0,
                height: 50.0,
            },
            ScriptCommand::PopState,
        ];
        let a = Script::from_commands(cmds.clone());
        let b = Script::from_commands(cmds);
        assert_eq!(a.wire_bytes(), b.wire_bytes());
    }
}
