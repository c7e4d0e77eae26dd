//! Session root and compartments

use std::sync::Arc;
use tracing::warn;

use super::{Declaration, ElementCore, SiblingNames, Suite, SuiteBuilder, TestElement};
use crate::configuration::Configuration;
use crate::executor::InvocationMode;
use crate::models::ElementKind;

const DEFAULT_COMPARTMENT: &str = "Default";

/// A first-level partition of the tree
#[derive(Clone, Debug)]
pub struct Compartment {
    name: String,
    configuration: Configuration,
}

impl Compartment {
    pub fn new(name: impl Into<String>, configuration: Configuration) -> Self {
        Self {
            name: name.into(),
            configuration,
        }
    }

    /// Inherits the session's configuration.
    pub fn default_compartment() -> Self {
        Self::new(DEFAULT_COMPARTMENT, Configuration::empty())
    }

    pub fn concurrent() -> Self {
        Self::new(
            "Concurrent",
            Configuration::invocation(InvocationMode::Concurrent),
        )
    }

    pub fn sequential() -> Self {
        Self::new(
            "Sequential",
            Configuration::invocation(InvocationMode::Sequential),
        )
    }

    /// Holds the primary execution resource while it runs.
    pub fn primary_resource() -> Self {
        Self::new("PrimaryResource", Configuration::primary_resource())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }
}

/// Root of the tree. Runs its compartments one after another.
pub struct Session {
    root: Suite,
    top_level: SiblingNames,
}

impl Session {
    pub(crate) fn new(configuration: Configuration) -> Self {
        let declaration = Declaration::new("Session").configuration(configuration);
        Self {
            root: Suite::new(ElementCore::new(None, ElementKind::Session, declaration), None),
            top_level: SiblingNames::default(),
        }
    }

    pub fn root(&self) -> &Suite {
        &self.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut Suite {
        &mut self.root
    }

    pub fn compartments(&self) -> &[Arc<TestElement>] {
        self.root.children()
    }

    pub(crate) fn builder(&mut self) -> SessionBuilder<'_> {
        SessionBuilder { session: self }
    }
}

/// Declares compartments and top-level suites
pub struct SessionBuilder<'a> {
    session: &'a mut Session,
}

impl<'a> SessionBuilder<'a> {
    /// Runs `content` against the compartment, created on first use.
    /// Later calls for the same compartment name add to it; the first
    /// call's configuration stays in effect.
    pub fn compartment<C>(&mut self, compartment: Compartment, content: C) -> &mut Self
    where
        C: FnOnce(&mut SuiteBuilder<'_>),
    {
        let Session { root, top_level } = &mut *self.session;

        let position = root
            .children()
            .iter()
            .position(|child| child.core().name() == compartment.name());
        let index = match position {
            Some(index) => index,
            None => {
                let declaration =
                    Declaration::new(compartment.name).configuration(compartment.configuration);
                let core = ElementCore::new(Some(root.core()), ElementKind::Compartment, declaration);
                root.push(TestElement::Suite(Suite::new(core, None)))
            }
        };

        let path = root.children()[index].core().path().to_string();
        match Arc::get_mut(&mut root.children_mut()[index]) {
            Some(TestElement::Suite(suite)) => {
                let mut builder = suite.builder_with(top_level);
                content(&mut builder);
            }
            _ => warn!("Compartment '{}' is shared, declarations ignored", path),
        }
        self
    }

    /// Declares a top-level suite in the default compartment.
    pub fn suite<D, C>(&mut self, declaration: D, content: C) -> &mut Self
    where
        D: Into<Declaration>,
        C: FnOnce(&mut SuiteBuilder<'_>) + Send + 'static,
    {
        let declaration = declaration.into();
        self.compartment(Compartment::default_compartment(), move |s| {
            s.suite(declaration, content);
        })
    }
}
