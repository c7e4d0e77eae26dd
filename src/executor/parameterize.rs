//! Tree parameterization
//!
//! Resolves each element's enabled state and display name before
//! execution: resets, applies the element's parameterizing actions,
//! inherits disablement, applies the selection, and disables suites left
//! without enabled children. Running it again yields the same tree.

use std::sync::Arc;
use tracing::{debug, info};

use crate::error::ConfigurationError;
use crate::selection::Selection;
use crate::tree::{ElementCore, Session, Suite, TestElement};

pub fn parameterize(
    session: &mut Session,
    selection: &dyn Selection,
) -> Result<(), ConfigurationError> {
    info!("Parameterizing session");
    parameterize_suite(session.root_mut(), true, selection)?;

    let enabled = count_enabled_tests(session.root());
    info!("{} test(s) enabled", enabled);
    Ok(())
}

fn parameterize_core(core: &mut ElementCore, parent_enabled: bool) {
    core.set_enabled(true);
    let configuration = core.configuration().clone();
    configuration.parameterize(core);
    if !parent_enabled {
        core.set_enabled(false);
    }
}

fn parameterize_suite(
    suite: &mut Suite,
    parent_enabled: bool,
    selection: &dyn Selection,
) -> Result<(), ConfigurationError> {
    parameterize_core(suite.core_mut(), parent_enabled);
    suite.materialize();

    let enabled = suite.core().is_enabled();
    for child in suite.children_mut() {
        parameterize_element(child, enabled, selection)?;
    }

    if enabled && suite.children().iter().all(|child| !child.core().is_enabled()) {
        debug!("{} has no enabled children, disabling", suite.core().path());
        suite.core_mut().set_enabled(false);
    }
    Ok(())
}

fn parameterize_element(
    element: &mut Arc<TestElement>,
    parent_enabled: bool,
    selection: &dyn Selection,
) -> Result<(), ConfigurationError> {
    let path = element.core().path().to_string();
    let element = Arc::get_mut(element).ok_or(ConfigurationError::TreeFrozen { path })?;

    match element {
        TestElement::Test(test) => {
            let core = test.core_mut();
            parameterize_core(core, parent_enabled);
            if core.is_enabled() && !selection.includes(core.path()) {
                debug!("{} excluded by selection", core.path());
                core.set_enabled(false);
            }
        }
        TestElement::Suite(suite) => parameterize_suite(suite, parent_enabled, selection)?,
    }
    Ok(())
}

pub(crate) fn count_enabled_tests(suite: &Suite) -> usize {
    enabled_test_paths(suite).len()
}

/// Paths of the enabled tests below `suite`, in declaration order
pub(crate) fn enabled_test_paths(suite: &Suite) -> Vec<String> {
    let mut paths = Vec::new();
    collect_enabled(suite, &mut paths);
    paths
}

fn collect_enabled(suite: &Suite, paths: &mut Vec<String>) {
    for child in suite.children() {
        match child.as_ref() {
            TestElement::Test(test) if test.core().is_enabled() => {
                paths.push(test.core().path().to_string());
            }
            TestElement::Test(_) => {}
            TestElement::Suite(nested) => collect_enabled(nested, paths),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::Configuration;
    use crate::selection::{PatternSelection, SelectAll};
    use crate::tree::Declaration;

    fn session() -> Session {
        let mut session = Session::new(Configuration::empty());
        session
            .builder()
            .suite("calc", |s| {
                s.test("add", |_| async { Ok(()) })
                    .test(
                        Declaration::new("div").configuration(Configuration::disabled()),
                        |_| async { Ok(()) },
                    )
                    .suite("edge", |s| {
                        s.test("overflow", |_| async { Ok(()) });
                    });
            })
            .suite(
                Declaration::new("off").configuration(Configuration::disabled()),
                |s| {
                    s.test("never", |_| async { Ok(()) });
                },
            )
            .suite("empty", |_| {});
        session
    }

    fn enabled(session: &Session, path: &str) -> bool {
        fn find(suite: &Suite, path: &str) -> Option<bool> {
            for child in suite.children() {
                if child.core().path() == path {
                    return Some(child.core().is_enabled());
                }
                if let Some(nested) = child.as_suite() {
                    if let Some(found) = find(nested, path) {
                        return Some(found);
                    }
                }
            }
            None
        }
        find(session.root(), path).unwrap_or_else(|| panic!("no element {path}"))
    }

    #[test]
    fn test_disablement_is_inherited_and_propagated() {
        let mut session = session();
        parameterize(&mut session, &SelectAll).unwrap();

        assert!(enabled(&session, "calc.add"));
        assert!(!enabled(&session, "calc.div"));
        assert!(!enabled(&session, "off"));
        assert!(!enabled(&session, "off.never"));
        assert!(!enabled(&session, "empty"));
        assert_eq!(
            enabled_test_paths(session.root()),
            vec!["calc.add", "calc.edge.overflow"]
        );
    }

    #[test]
    fn test_parameterization_is_idempotent() {
        let mut session = session();
        parameterize(&mut session, &SelectAll).unwrap();
        let first = enabled_test_paths(session.root());
        parameterize(&mut session, &SelectAll).unwrap();
        assert_eq!(enabled_test_paths(session.root()), first);
        assert!(!enabled(&session, "off"));
    }

    #[test]
    fn test_selection_disables_suites_left_empty() {
        let mut session = session();
        let selection = PatternSelection::new("calc.edge.*", "");
        parameterize(&mut session, &selection).unwrap();

        assert_eq!(enabled_test_paths(session.root()), vec!["calc.edge.overflow"]);
        assert!(enabled(&session, "calc"));
        assert!(!enabled(&session, "calc.add"));
    }

    #[test]
    fn test_everything_excluded_disables_session() {
        let mut session = session();
        parameterize(&mut session, &PatternSelection::new("", "*")).unwrap();
        assert!(!session.root().core().is_enabled());
        assert!(!session.compartments()[0].core().is_enabled());
    }

    #[test]
    fn test_shared_tree_is_frozen() {
        let mut session = session();
        parameterize(&mut session, &SelectAll).unwrap();
        let _shared = session.compartments()[0].clone();

        let error = parameterize(&mut session, &SelectAll).unwrap_err();
        assert_eq!(
            error,
            ConfigurationError::TreeFrozen {
                path: "@Default".into()
            }
        );
    }
}
