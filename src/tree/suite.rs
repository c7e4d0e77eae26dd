//! Suites and the suite builder

use futures::FutureExt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use super::{Declaration, ElementCore, SiblingNames, Test, TestAction, TestElement, TestScope};
use crate::fixture::{Fixture, FixtureRegistry};
use crate::models::ElementKind;

/// Deferred suite content, run when the tree is parameterized
pub(crate) type SuiteContent = Box<dyn FnOnce(&mut SuiteBuilder<'_>) + Send>;

pub struct Suite {
    core: ElementCore,
    children: Vec<Arc<TestElement>>,
    content: Mutex<Option<SuiteContent>>,
    names: SiblingNames,
    fixtures: Arc<FixtureRegistry>,
}

impl Suite {
    pub(crate) fn new(core: ElementCore, content: Option<SuiteContent>) -> Self {
        let fixtures = Arc::new(FixtureRegistry::new(core.path()));
        Self {
            core,
            children: Vec::new(),
            content: Mutex::new(content),
            names: SiblingNames::default(),
            fixtures,
        }
    }

    pub fn core(&self) -> &ElementCore {
        &self.core
    }

    pub(crate) fn core_mut(&mut self) -> &mut ElementCore {
        &mut self.core
    }

    /// Children in declaration order
    pub fn children(&self) -> &[Arc<TestElement>] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut [Arc<TestElement>] {
        &mut self.children
    }

    /// Append a child, returning its index.
    pub(crate) fn push(&mut self, child: TestElement) -> usize {
        self.children.push(Arc::new(child));
        self.children.len() - 1
    }

    pub(crate) fn fixtures(&self) -> &Arc<FixtureRegistry> {
        &self.fixtures
    }

    /// Run the deferred content, if any is left.
    pub(crate) fn materialize(&mut self) {
        let content = self
            .content
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(content) = content {
            let mut builder = self.builder();
            content(&mut builder);
        }
    }

    pub(crate) fn builder(&mut self) -> SuiteBuilder<'_> {
        SuiteBuilder {
            parent: &self.core,
            children: &mut self.children,
            names: &mut self.names,
            fixtures: &self.fixtures,
        }
    }

    /// A builder claiming child names from `names` instead of the suite's own.
    pub(crate) fn builder_with<'a>(&'a mut self, names: &'a mut SiblingNames) -> SuiteBuilder<'a> {
        SuiteBuilder {
            parent: &self.core,
            children: &mut self.children,
            names,
            fixtures: &self.fixtures,
        }
    }
}

/// Declares the children and fixtures of a suite
pub struct SuiteBuilder<'a> {
    parent: &'a ElementCore,
    children: &'a mut Vec<Arc<TestElement>>,
    names: &'a mut SiblingNames,
    fixtures: &'a Arc<FixtureRegistry>,
}

impl<'a> SuiteBuilder<'a> {
    /// Path of the suite being declared
    pub fn path(&self) -> &str {
        self.parent.path()
    }

    /// Number of children declared so far
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn test<D, F, Fut>(&mut self, declaration: D, action: F) -> &mut Self
    where
        D: Into<Declaration>,
        F: Fn(TestScope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let declaration = self.claim(declaration.into());
        let core = ElementCore::new(Some(self.parent), ElementKind::Test, declaration);
        let action: TestAction = Arc::new(move |scope| action(scope).boxed());
        self.children
            .push(Arc::new(TestElement::Test(Test::new(core, action))));
        self
    }

    /// Declares a nested suite. `content` runs when the tree is
    /// parameterized, not here.
    pub fn suite<D, C>(&mut self, declaration: D, content: C) -> &mut Self
    where
        D: Into<Declaration>,
        C: FnOnce(&mut SuiteBuilder<'_>) + Send + 'static,
    {
        let declaration = self.claim(declaration.into());
        let core = ElementCore::new(Some(self.parent), ElementKind::Suite, declaration);
        self.children
            .push(Arc::new(TestElement::Suite(Suite::new(core, Some(Box::new(content))))));
        self
    }

    /// Declares a fixture owned by this suite. Its value is created on
    /// first access and torn down when the suite finishes.
    pub fn fixture<T, F, Fut>(&mut self, name: impl Into<String>, factory: F) -> Fixture<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        Fixture::new(name.into(), self.fixtures, factory)
    }

    fn claim(&mut self, declaration: Declaration) -> Declaration {
        let name = self.names.claim(declaration.name());
        declaration.renamed(name)
    }
}
