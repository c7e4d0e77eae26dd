//! Test element tree
//!
//! The tree is declared through builders: a suite's content closure
//! receives a [`SuiteBuilder`] and declares tests, nested suites and
//! fixtures through it. Content closures are deferred until the tree is
//! parameterized, so data-driven children are created at a well-defined
//! point.
//!
//! ```text
//! Session ("")
//! └── Compartment ("@Default")
//!     └── Suite ("calc")
//!         ├── Test ("calc.add")
//!         └── Suite ("calc.edge")
//!             └── Test ("calc.edge.overflow")
//! ```

use std::collections::HashSet;

use crate::configuration::Configuration;
use crate::models::{ElementInfo, ElementKind};

mod session;
mod suite;

pub use session::{Compartment, Session, SessionBuilder};
pub use suite::{Suite, SuiteBuilder};
pub use test::{Test, TestAction, TestScope};

/// A node of the tree
pub enum TestElement {
    Test(Test),
    Suite(Suite),
}

impl TestElement {
    pub fn core(&self) -> &ElementCore {
        match self {
            TestElement::Test(test) => test.core(),
            TestElement::Suite(suite) => suite.core(),
        }
    }

    pub(crate) fn core_mut(&mut self) -> &mut ElementCore {
        match self {
            TestElement::Test(test) => test.core_mut(),
            TestElement::Suite(suite) => suite.core_mut(),
        }
    }

    pub fn as_suite(&self) -> Option<&Suite> {
        match self {
            TestElement::Suite(suite) => Some(suite),
            TestElement::Test(_) => None,
        }
    }
}

/// Identity, enabled state and configuration shared by all elements
#[derive(Debug)]
pub struct ElementCore {
    name: String,
    display_name: String,
    path: String,
    parent: Option<String>,
    kind: ElementKind,
    enabled: bool,
    configuration: Configuration,
}

impl ElementCore {
    pub(crate) fn new(
        parent: Option<&ElementCore>,
        kind: ElementKind,
        declaration: Declaration,
    ) -> Self {
        let path = match parent {
            Some(parent) => parent.kind.child_path(&parent.path, &declaration.name),
            None => String::new(),
        };
        Self {
            display_name: declaration
                .display_name
                .unwrap_or_else(|| declaration.name.clone()),
            name: declaration.name,
            path,
            parent: parent.map(|p| p.path.clone()),
            kind,
            enabled: true,
            configuration: declaration.configuration,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_display_name(&mut self, display_name: impl Into<String>) {
        self.display_name = display_name.into();
    }

    pub fn info(&self) -> ElementInfo {
        ElementInfo {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            path: self.path.clone(),
            parent: self.parent.clone(),
            kind: self.kind,
            enabled: self.enabled,
        }
    }
}

/// Name, display name and configuration of an element being declared
#[derive(Clone, Debug)]
pub struct Declaration {
    name: String,
    display_name: Option<String>,
    configuration: Configuration,
}

impl Declaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            configuration: Configuration::empty(),
        }
    }

    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Attach `configuration` after any already attached.
    pub fn configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = self.configuration.chained_with(&configuration);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn renamed(mut self, name: String) -> Self {
        self.name = name;
        self
    }
}

impl From<&str> for Declaration {
    fn from(name: &str) -> Self {
        Declaration::new(name)
    }
}

impl From<String> for Declaration {
    fn from(name: String) -> Self {
        Declaration::new(name)
    }
}

/// Names already taken among siblings
#[derive(Debug, Default)]
pub(crate) struct SiblingNames {
    used: HashSet<String>,
}

impl SiblingNames {
    /// `name` if still free, else `name (2)`, `name (3)`, ...
    pub(crate) fn claim(&mut self, name: &str) -> String {
        if self.used.insert(name.to_string()) {
            return name.to_string();
        }
        let mut occurrence = 2;
        loop {
            let candidate = format!("{name} ({occurrence})");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            occurrence += 1;
        }
    }
}
