//! Test execution engine
//!
//! Two phases, always session first:
//!
//! 1. [`parameterize`] resolves enabled state, display names and the
//!    selection for the whole tree.
//! 2. [`execute`] traverses the frozen tree, composing at each element
//!    report setup, traversal wrappers, the element's wrapping chain and
//!    either the test body or the suite's children followed by fixture
//!    teardown.

mod context;
mod parallel;
mod parameterize;
mod runner;

pub use context::{ExecutionContext, InvocationMode};
pub use parameterize::parameterize;
pub use runner::execute;

pub(crate) use parameterize::enabled_test_paths;
