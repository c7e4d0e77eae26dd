//! Test run harness
//!
//! [`TestRun`] owns the single session of a run. It applies harness
//! settings to the session, runs both engine phases and summarizes the
//! outcome. [`run_with_args`] wraps it for test binaries.
//!
//! ```no_run
//! use clap::Parser;
//! use testtree::cli::Args;
//!
//! #[tokio::main]
//! async fn main() {
//!     let code = testtree::harness::run_with_args(Args::parse(), |session| {
//!         session.suite("math", |s| {
//!             s.test("add", |_| async {
//!                 anyhow::ensure!(1 + 1 == 2);
//!                 Ok(())
//!             });
//!         });
//!     })
//!     .await;
//!     std::process::exit(code);
//! }
//! ```

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::cli::Args;
use crate::configuration::Configuration;
use crate::error::{ConfigurationError, EngineError};
use crate::executor::{enabled_test_paths, execute, parameterize};
use crate::models::{Failure, FailureKind, RunSummary};
use crate::output::ResultFormatter;
use crate::report::{FanOutReport, ReportSink, SummaryReport, TracingReport};
use crate::settings::{print_env_help, EnvConfig, HarnessSettings};
use crate::tree::{Session, SessionBuilder};
use crate::utils::logger::init_logger;

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    Passed,
    /// Completed with genuine test or suite failures
    Failed { failures: usize },
    /// Stopped by an aborting failure
    Aborted { failures: usize, cause: Failure },
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Passed => 0,
            RunOutcome::Failed { .. } => 1,
            RunOutcome::Aborted { cause, .. } if cause.kind() == FailureKind::Configuration => 3,
            RunOutcome::Aborted { .. } => 2,
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, RunOutcome::Passed)
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub summary: RunSummary,
    pub outcome: RunOutcome,
}

pub struct TestRun {
    settings: HarnessSettings,
    session: Option<Session>,
}

impl TestRun {
    pub fn new(settings: HarnessSettings) -> Self {
        Self {
            settings,
            session: None,
        }
    }

    pub fn settings(&self) -> &HarnessSettings {
        &self.settings
    }

    /// Declare the run's session. A run has exactly one.
    pub fn session<F>(&mut self, declare: F) -> Result<&mut Self, ConfigurationError>
    where
        F: FnOnce(&mut SessionBuilder<'_>),
    {
        if self.session.is_some() {
            return Err(ConfigurationError::SessionAlreadyDeclared);
        }
        let mut session = Session::new(self.session_configuration());
        declare(&mut session.builder());
        self.session = Some(session);
        Ok(self)
    }

    fn session_configuration(&self) -> Configuration {
        let invocation = Configuration::invocation(self.settings.invocation);
        match self.settings.fail_fast {
            Some(limit) => invocation.chained_with(&Configuration::fail_fast(limit)),
            None => invocation,
        }
    }

    /// Parameterize the session with the settings' selection.
    pub fn parameterize(&mut self) -> Result<&Session, ConfigurationError> {
        let selection = self.settings.selection();
        let session = self.session.as_mut().ok_or(ConfigurationError::NoSession)?;
        parameterize(session, &selection)?;
        Ok(session)
    }

    /// Paths of the tests a run would execute.
    pub fn list(&mut self) -> Result<Vec<String>, ConfigurationError> {
        let session = self.parameterize()?;
        Ok(enabled_test_paths(session.root()))
    }

    pub fn into_session(self) -> Option<Session> {
        self.session
    }

    pub async fn run(self, report: Option<Arc<dyn ReportSink>>) -> Result<RunReport, EngineError> {
        self.run_until_cancelled(report, CancellationToken::new())
            .await
    }

    /// Run both phases. `report`, if given, receives every event after
    /// the harness's own sinks.
    pub async fn run_until_cancelled(
        mut self,
        report: Option<Arc<dyn ReportSink>>,
        cancellation: CancellationToken,
    ) -> Result<RunReport, EngineError> {
        self.parameterize()?;
        let session = self.session.take().ok_or(ConfigurationError::NoSession)?;

        let summary = Arc::new(SummaryReport::new());
        let mut sinks = FanOutReport::new()
            .with(summary.clone())
            .with(Arc::new(TracingReport));
        if let Some(report) = report {
            sinks = sinks.with(report);
        }

        let result = execute(Arc::new(session), Arc::new(sinks), cancellation).await;
        let summary = summary.summary();
        let failures = summary.failures();

        let outcome = match result {
            Ok(()) if failures == 0 => RunOutcome::Passed,
            Ok(()) => RunOutcome::Failed { failures },
            Err(EngineError::Aborted { cause }) => RunOutcome::Aborted { failures, cause },
            Err(error) => return Err(error),
        };
        info!(
            "Run finished: {}/{} passed, {} failure(s)",
            summary.passed, summary.total, failures
        );
        Ok(RunReport { summary, outcome })
    }
}

/// Resolve settings from `args`, the environment and an optional settings
/// file, declare the session, run it and print the summary. Returns the
/// process exit code.
pub async fn run_with_args<F>(args: Args, declare: F) -> i32
where
    F: FnOnce(&mut SessionBuilder<'_>),
{
    if args.env_help {
        print_env_help();
        return 0;
    }
    let settings = match args.resolve(&EnvConfig::load()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Invalid settings: {e:#}");
            return 3;
        }
    };
    init_logger(settings.log_level());

    let formatter = ResultFormatter::new(settings.output_format());
    let mut run = TestRun::new(settings);
    if let Err(e) = run.session(declare) {
        error!("{}", e);
        return EngineError::from(e).exit_code();
    }

    if args.list {
        return match run.list() {
            Ok(paths) => {
                for path in paths {
                    println!("{path}");
                }
                0
            }
            Err(e) => {
                error!("{}", e);
                EngineError::from(e).exit_code()
            }
        };
    }

    let cancellation = CancellationToken::new();
    let interrupt = {
        let cancellation = cancellation.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling run");
                cancellation.cancel();
            }
        })
    };

    let code = match run.run_until_cancelled(None, cancellation).await {
        Ok(report) => {
            println!("{}", formatter.format_summary(&report.summary));
            if let RunOutcome::Aborted { cause, .. } = &report.outcome {
                error!("Run aborted: {:#}", cause);
            }
            report.outcome.exit_code()
        }
        Err(e) => {
            error!("{}", e);
            e.exit_code()
        }
    };
    interrupt.abort();
    code
}
