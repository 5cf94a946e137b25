// hartirq/src/test/mod.rs

// Self-test entry point.
//
// The suites exercise the registry, dispatcher, signal allocator, and
// timeout scheduler against a recording mock of the hardware seam, so they
// run identically on target (via run_all_tests) and on a host under
// cargo test.


pub mod signal_test;
pub mod timer_test;

use crate::{error_print, info_print, println, warn_print};

/// Outcome of a single test case.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TestResult {
    Pass,
    Fail,
    Skip,
}

/// One test case: a name, the function, and a short description.
pub struct TestCase {
    pub name: &'static str,
    pub func: fn() -> TestResult,
    pub description: &'static str,
}

/// Runs test cases and keeps score.
pub struct TestRunner {
    total: usize,
    passed: usize,
    failed: usize,
    skipped: usize,
}

impl TestRunner {
    pub fn new() -> Self {
        Self {
            total: 0,
            passed: 0,
            failed: 0,
            skipped: 0,
        }
    }

    /// Runs a single test case.
    pub fn run_test(&mut self, test: &TestCase) {
        self.total += 1;

        println!("Running test: {} - {}", test.name, test.description);

        match (test.func)() {
            TestResult::Pass => {
                self.passed += 1;
                info_print!("  [PASS] {}", test.name);
            }
            TestResult::Fail => {
                self.failed += 1;
                error_print!("  [FAIL] {}", test.name);
            }
            TestResult::Skip => {
                self.skipped += 1;
                warn_print!("  [SKIP] {}", test.name);
            }
        }
    }

    /// Runs a named suite of test cases.
    pub fn run_suite(&mut self, suite_name: &str, tests: &[TestCase]) {
        println!("=== {} Test Suite ===", suite_name);

        for test in tests {
            self.run_test(test);
        }

        println!("=== {} Test Suite Complete ===", suite_name);
    }

    /// Prints the final tally.
    pub fn print_summary(&self) {
        println!("=== Test Summary ===");
        println!("Total tests: {}", self.total);
        info_print!("Passed: {}", self.passed);
        if self.failed > 0 {
            error_print!("Failed: {}", self.failed);
        } else {
            info_print!("Failed: {}", self.failed);
        }
        if self.skipped > 0 {
            warn_print!("Skipped: {}", self.skipped);
        } else {
            info_print!("Skipped: {}", self.skipped);
        }
        println!("==================");
    }

    /// Whether every test ran and passed.
    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.total > 0
    }
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs every suite and prints a summary.
pub fn run_all_tests() {
    let mut runner = TestRunner::new();

    registry_test::run_registry_tests(&mut runner);
    dispatch_test::run_dispatch_tests(&mut runner);
    signal_test::run_signal_tests(&mut runner);
    timer_test::run_timer_tests(&mut runner);

    runner.print_summary();

    if runner.all_passed() {
        info_print!("All test suites completed successfully!");
    } else {
        warn_print!("Some tests failed or were skipped");
    }
}

// Host drivers: each suite gets its own cargo-test entry so failures are
// attributed per area. Suites use disjoint hart ids, so they can run on
// parallel test threads.
#[cfg(test)]
mod harness {
    use super::*;

    fn stdout_sink(text: &str) {
        std::print!("{}", text);
    }

    fn host_runner() -> TestRunner {
        crate::console::set_sink(stdout_sink);
        TestRunner::new()
    }

    #[test]
    fn registry_suite() {
        let mut runner = host_runner();
        registry_test::run_registry_tests(&mut runner);
        assert!(runner.all_passed());
    }

    #[test]
    fn dispatch_suite() {
        let mut runner = host_runner();
        dispatch_test::run_dispatch_tests(&mut runner);
        assert!(runner.all_passed());
    }

    #[test]
    fn signal_suite() {
        let mut runner = host_runner();
        signal_test::run_signal_tests(&mut runner);
        assert!(runner.all_passed());
    }

    #[test]
    fn timer_suite() {
        let mut runner = host_runner();
        timer_test::run_timer_tests(&mut runner);
        assert!(runner.all_passed());
    }
}
