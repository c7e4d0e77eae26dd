//! Element descriptors
//!
//! Immutable snapshots of tree nodes, handed to wrappers, test actions
//! and report sinks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between a suite path and a child name
pub const PATH_SEPARATOR: char = '.';

/// Prefix marking a compartment path
pub const COMPARTMENT_MARKER: char = '@';

/// Kind of test element
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Session,
    Compartment,
    Suite,
    Test,
}

impl ElementKind {
    pub fn is_suite(&self) -> bool {
        !matches!(self, ElementKind::Test)
    }

    /// Path of a child named `name` below a parent of this kind.
    pub fn child_path(&self, parent_path: &str, name: &str) -> String {
        match self {
            ElementKind::Session => format!("{COMPARTMENT_MARKER}{name}"),
            ElementKind::Compartment => name.to_string(),
            ElementKind::Suite | ElementKind::Test => {
                format!("{parent_path}{PATH_SEPARATOR}{name}")
            }
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Session => write!(f, "session"),
            ElementKind::Compartment => write!(f, "compartment"),
            ElementKind::Suite => write!(f, "suite"),
            ElementKind::Test => write!(f, "test"),
        }
    }
}

/// Snapshot of a test element as seen during execution
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementInfo {
    pub name: String,
    pub display_name: String,
    pub path: String,
    /// Path of the parent element, `None` for the session
    pub parent: Option<String>,
    pub kind: ElementKind,
    pub enabled: bool,
}

impl ElementInfo {
    pub fn is_test(&self) -> bool {
        self.kind == ElementKind::Test
    }
}

impl fmt::Display for ElementInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.display_name)
        } else {
            write!(f, "{}", self.path)
        }
    }
}
