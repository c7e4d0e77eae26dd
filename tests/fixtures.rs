mod common;

use anyhow::{anyhow, bail};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use common::{run_collecting, Log};
use testtree::error::FixtureError;
use testtree::{
    CollectingReport, Configuration, Declaration, FailureKind, Fixture, HarnessSettings,
    SuiteBuilder, TestRun,
};

/// A fixture that logs its creation and teardown, failing on close
/// when `fails_on_close` is set.
fn logged_fixture(s: &mut SuiteBuilder<'_>, log: &Log, name: &'static str, fails_on_close: bool) -> Fixture<String> {
    let created = log.clone();
    let closed = log.clone();
    s.fixture(name, move || {
        let log = created.clone();
        async move {
            log.push(format!("{name} creating"));
            Ok(name.to_string())
        }
    })
    .close_with(move |_| {
        let log = closed.clone();
        async move {
            if fails_on_close {
                log.push(format!("{name} failing on close"));
                bail!("{name} failed on close");
            }
            log.push(format!("{name} closing"));
            Ok(())
        }
    })
}

#[tokio::test]
async fn test_teardown_runs_in_reverse_and_aggregates_failures() {
    let log = Log::default();
    let (collected, report) = run_collecting(HarnessSettings::default(), {
        let log = log.clone();
        move |session| {
            session.suite("s1", move |s| {
                let f1 = logged_fixture(s, &log, "F1", false);
                let f2 = logged_fixture(s, &log, "F2", true);
                let f3 = logged_fixture(s, &log, "F3", true);

                let t1_log = log.clone();
                s.test("t1", move |_| {
                    let (log, f1, f2, f3) = (t1_log.clone(), f1.clone(), f2.clone(), f3.clone());
                    async move {
                        log.push("t1 begin");
                        f1.get().await?;
                        f2.get().await?;
                        f3.get().await?;
                        log.push("t1 end");
                        Ok(())
                    }
                });

                let failing_around = Configuration::around_all({
                    let log = log.clone();
                    move |_, _inner| {
                        let log = log.clone();
                        async move {
                            log.push("inner aroundAll failing");
                            Err(anyhow!("inner aroundAll failed"))
                        }
                    }
                });
                s.suite(
                    Declaration::new("inner").configuration(failing_around),
                    |s| {
                        s.test("unreached", |_| async { Ok(()) });
                    },
                );

                let t2_log = log.clone();
                s.test("t2", move |_| {
                    let log = t2_log.clone();
                    async move {
                        log.push("t2 begin");
                        log.push("t2 end");
                        Ok(())
                    }
                });
            });
        }
    })
    .await;

    assert_eq!(
        log.entries(),
        vec![
            "t1 begin",
            "F1 creating",
            "F2 creating",
            "F3 creating",
            "t1 end",
            "inner aroundAll failing",
            "t2 begin",
            "t2 end",
            "F3 failing on close",
            "F2 failing on close",
            "F1 closing",
        ]
    );

    let failures: Vec<_> = collected
        .finished()
        .iter()
        .filter_map(|f| f.failure.clone().map(|failure| (f.element.path.clone(), failure)))
        .collect();
    assert_eq!(failures.len(), 2);

    let (path, inner) = &failures[0];
    assert_eq!(path, "s1.inner");
    assert_eq!(inner.message(), "inner aroundAll failed");

    let (path, teardown) = &failures[1];
    assert_eq!(path, "s1");
    assert_eq!(teardown.message(), "F3 failed on close");
    assert_eq!(teardown.suppressed().len(), 1);
    assert_eq!(teardown.suppressed()[0].message(), "F2 failed on close");

    assert!(collected.finished_for("s1.inner.unreached").is_none());
    assert_eq!(report.summary.passed, 2);
    assert_eq!(report.summary.suite_failures, 2);
    assert_eq!(report.outcome.exit_code(), 1);
}

#[tokio::test]
async fn test_fixture_is_shared_by_nested_suites_and_created_once() {
    let log = Log::default();
    let (_, report) = run_collecting(HarnessSettings::default(), {
        let log = log.clone();
        move |session| {
            session.suite("outer", move |s| {
                let counter = logged_fixture(s, &log, "shared", false);
                for name in ["a", "b"] {
                    let counter = counter.clone();
                    s.suite(name, move |s| {
                        s.test("uses", move |_| {
                            let counter = counter.clone();
                            async move {
                                assert_eq!(counter.get().await?.as_str(), "shared");
                                Ok(())
                            }
                        });
                    });
                }
            });
        }
    })
    .await;

    assert!(report.outcome.is_passed());
    assert_eq!(log.entries(), vec!["shared creating", "shared closing"]);
}

#[tokio::test]
async fn test_fixture_is_unavailable_after_its_suite() {
    let escaped: Arc<Mutex<Option<Fixture<u32>>>> = Arc::default();
    let (_, report) = run_collecting(HarnessSettings::default(), {
        let escaped = escaped.clone();
        move |session| {
            session.suite("s", move |s| {
                let value = s.fixture("value", || async { Ok(7u32) });
                *escaped.lock().unwrap() = Some(value.clone());
                s.test("reads", move |_| {
                    let value = value.clone();
                    async move {
                        assert_eq!(*value.get().await?, 7);
                        Ok(())
                    }
                });
            });
        }
    })
    .await;
    assert!(report.outcome.is_passed());

    let fixture = escaped.lock().unwrap().take().unwrap();
    let error = fixture.get().await.unwrap_err();
    assert!(matches!(
        error.downcast_ref::<FixtureError>(),
        Some(FixtureError::OutsideExecution { .. }) | Some(FixtureError::SuiteGone { .. })
    ));
}

#[tokio::test]
async fn test_fixture_torn_down_when_test_fails() {
    let log = Log::default();
    let (collected, _) = run_collecting(HarnessSettings::default(), {
        let log = log.clone();
        move |session| {
            session.suite("s", move |s| {
                let resource = logged_fixture(s, &log, "R", false);
                s.test("fails", move |_| {
                    let resource = resource.clone();
                    async move {
                        resource.get().await?;
                        Err(anyhow!("test failed"))
                    }
                });
            });
        }
    })
    .await;

    assert_eq!(log.entries(), vec!["R creating", "R closing"]);
    assert!(collected.finished_for("s").unwrap().succeeded());
    assert!(collected.finished_for("s.fails").unwrap().failed());
}

#[tokio::test]
async fn test_fixture_torn_down_when_run_is_cancelled() {
    let log = Log::default();
    let mut run = TestRun::new(HarnessSettings::default());
    run.session({
        let log = log.clone();
        move |session| {
            session.suite("s", move |s| {
                let resource = logged_fixture(s, &log, "R", false);
                let started = log.clone();
                s.test("waits", move |_| {
                    let (resource, log) = (resource.clone(), started.clone());
                    async move {
                        resource.get().await?;
                        log.push("waiting");
                        tokio::time::sleep(Duration::from_secs(10)).await;
                        Ok(())
                    }
                });
            });
        }
    })
    .unwrap();

    let token = CancellationToken::new();
    let canceller = {
        let (token, log) = (token.clone(), log.clone());
        tokio::spawn(async move {
            while !log.entries().iter().any(|entry| entry == "waiting") {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            token.cancel();
        })
    };

    let collected = Arc::new(CollectingReport::new());
    let report = run
        .run_until_cancelled(Some(collected.clone()), token)
        .await
        .unwrap();
    canceller.await.unwrap();

    assert_eq!(log.entries(), vec!["R creating", "waiting", "R closing"]);
    let waits = collected.finished_for("s.waits").unwrap();
    assert_eq!(waits.failure.as_ref().unwrap().kind(), FailureKind::Cancelled);
    assert!(collected.finished_for("s").is_some());

    let events = collected.events();
    let starting = events.iter().filter(|event| event.is_starting()).count();
    assert_eq!(starting * 2, events.len());
    assert_eq!(report.outcome.exit_code(), 2);
}
