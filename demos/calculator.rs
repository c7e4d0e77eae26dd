//! Calculator test binary
//!
//! A small test tree run through the harness: a data-driven suite, a
//! fixture shared by a suite's tests, a concurrent compartment and a
//! timed-out test.
//!
//! ```bash
//! cargo run --example calculator -- --format summary
//! cargo run --example calculator -- --include 'arithmetic.*' --list
//! TESTTREE_FAIL_FAST=0 cargo run --example calculator
//! ```

use anyhow::{bail, ensure};
use clap::Parser;
use std::sync::Mutex;
use std::time::Duration;

use testtree::cli::Args;
use testtree::harness::run_with_args;
use testtree::{Compartment, Configuration, Declaration};

/// A calculator with a running total
#[derive(Default)]
struct Calculator {
    total: Mutex<i64>,
}

impl Calculator {
    fn add(&self, value: i64) -> i64 {
        let mut total = self.total.lock().unwrap_or_else(|e| e.into_inner());
        *total += value;
        *total
    }
}

fn divide(a: i64, b: i64) -> anyhow::Result<i64> {
    if b == 0 {
        bail!("division by zero");
    }
    Ok(a / b)
}

#[tokio::main]
async fn main() {
    let code = run_with_args(Args::parse(), |session| {
        session
            .suite("arithmetic", |s| {
                for (a, b, sum) in [(1, 1, 2), (2, 3, 5), (-4, 4, 0)] {
                    s.test(format!("add {a} {b}"), move |_| async move {
                        ensure!(a + b == sum, "{a} + {b} != {sum}");
                        Ok(())
                    });
                }
                s.test("divide", |_| async {
                    ensure!(divide(9, 3)? == 3);
                    Ok(())
                });
                s.test(
                    Declaration::new("divide by zero").display_name("divide by zero (known bug)"),
                    |_| async {
                        divide(1, 0)?;
                        Ok(())
                    },
                );
            })
            .suite("accumulator", |s| {
                let calculator = s
                    .fixture("calculator", || async { Ok(Calculator::default()) })
                    .close_with(|calculator| async move {
                        tracing::info!("final total {}", calculator.add(0));
                        Ok(())
                    });
                for step in 1..=3 {
                    let calculator = calculator.clone();
                    s.test(format!("step {step}"), move |_| {
                        let calculator = calculator.clone();
                        async move {
                            let total = calculator.get().await?.add(step);
                            ensure!(total == step * (step + 1) / 2);
                            Ok(())
                        }
                    });
                }
            })
            .compartment(Compartment::concurrent(), |c| {
                c.suite("timing", |s| {
                    for ms in [10, 20, 30] {
                        s.test(format!("sleep {ms}ms"), move |_| async move {
                            tokio::time::sleep(Duration::from_millis(ms)).await;
                            Ok(())
                        });
                    }
                    s.test(
                        Declaration::new("too slow")
                            .configuration(Configuration::timeout(Duration::from_millis(50))),
                        |_| async {
                            tokio::time::sleep(Duration::from_secs(1)).await;
                            Ok(())
                        },
                    );
                });
            });
    })
    .await;
    std::process::exit(code);
}
