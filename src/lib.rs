//! testtree - a tree-structured test execution engine
//!
//! Tests are declared as a tree of suites below a single session. Each
//! element carries a [`Configuration`] that can disable it, wrap its
//! execution, switch its children between sequential and concurrent
//! invocation, stop the run after too many failures, or attach further
//! report sinks. Suites own lazily created [`Fixture`]s that are torn
//! down in reverse creation order when the suite finishes.
//!
//! ## Phases
//!
//! 1. **Declaration**: [`TestRun::session`] runs the declaration code.
//! 2. **Parameterization**: suite contents are materialized, enabled
//!    state is resolved and the selection is applied.
//! 3. **Execution**: the tree is traversed, emitting one Starting and
//!    one Finished event per element to the report sinks.
//!
//! ## Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use testtree::{Configuration, Declaration, HarnessSettings, TestRun};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let mut run = TestRun::new(HarnessSettings::default());
//! run.session(|session| {
//!     session.suite("calc", |s| {
//!         s.test("add", |_| async {
//!             anyhow::ensure!(2 + 2 == 4);
//!             Ok(())
//!         });
//!         s.test(
//!             Declaration::new("slow").configuration(Configuration::timeout(Duration::from_secs(1))),
//!             |_| async { Ok(()) },
//!         );
//!     });
//! })?;
//!
//! let report = run.run(None).await?;
//! println!("{}", report.summary);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod configuration;
pub mod error;
pub mod executor;
pub mod fixture;
pub mod harness;
pub mod models;
pub mod output;
pub mod report;
pub mod resource;
pub mod selection;
pub mod settings;
pub mod tree;
pub mod utils;

pub use configuration::{Configuration, Inner};
pub use error::{ConfigurationError, EngineError, FixtureError};
pub use executor::{ExecutionContext, InvocationMode};
pub use fixture::Fixture;
pub use harness::{RunOutcome, RunReport, TestRun};
pub use models::{Event, Failure, FailureKind};
pub use report::{CollectingReport, ReportSink};
pub use selection::{PatternSelection, SelectAll, Selection};
pub use settings::HarnessSettings;
pub use tree::{Compartment, Declaration, Session, SessionBuilder, SuiteBuilder, TestScope};
