// hartirq/src/test/signal_test.rs

// Software signal allocation, delivery, coalescing, and permission
// checks. Uses harts 4 through 6 and signal ids from 100 up, each test
// with its own ids since definitions are system-wide.

use core::sync::atomic::Ordering;

use super::mock::{self, check};
use super::{TestCase, TestResult, TestRunner};
use crate::println;
use crate::trap::infrastructure::dispatcher;
use crate::trap::{self, TrapError};

/// Raising an undefined signal fails; defining it first makes the raise
/// deliver exactly one dispatch on the target hart.
fn test_define_then_raise() -> TestResult {
    let board = mock::board(4);
    let hits = mock::counter();

    check!(
        trap::raise_machine_signal(board.ctx, 100) == Err(TrapError::InvalidSource),
        "undefined signal raised"
    );

    check!(
        trap::define_signal(board.ctx, 100, 4).is_ok(),
        "definition rejected"
    );
    check!(
        trap::register_machine_isr(board.ctx, Some(mock::counting_isr), mock::counter_ptr(hits), 100)
            .is_ok(),
        "signal handler registration rejected"
    );

    check!(trap::raise_machine_signal(board.ctx, 100).is_ok(), "raise rejected");
    check!(board.hal.soft_pending_on(4), "soft interrupt not posted");

    dispatcher::dispatch(board.ctx, mock::MCAUSE_MSOFT, 0);
    check!(
        hits.load(Ordering::Relaxed) == 1,
        "signal did not deliver exactly once"
    );
    check!(!board.hal.soft_pending_on(4), "soft interrupt not acknowledged");

    // Nothing further pending.
    dispatcher::dispatch(board.ctx, mock::MCAUSE_MSOFT, 0);
    check!(hits.load(Ordering::Relaxed) == 1, "spurious second delivery");
    TestResult::Pass
}

/// Signal ids must be unique and above the board source range.
fn test_define_collisions() -> TestResult {
    let board = mock::board(4);
    check!(trap::define_signal(board.ctx, 101, 4).is_ok(), "definition rejected");
    check!(
        trap::define_signal(board.ctx, 101, 4) == Err(TrapError::InvalidSource),
        "duplicate definition accepted"
    );
    check!(
        trap::define_signal(board.ctx, 5, 4) == Err(TrapError::InvalidSource),
        "board-range id accepted as signal"
    );
    TestResult::Pass
}

/// Signals raised on one hart deliver on the hart they were bound to.
fn test_cross_hart_delivery() -> TestResult {
    let raiser = mock::board(5);
    let target = mock::board(6);
    let hits = mock::counter();

    check!(
        trap::define_signal(raiser.ctx, 102, 6).is_ok(),
        "definition rejected"
    );
    check!(
        trap::register_machine_isr(target.ctx, Some(mock::counting_isr), mock::counter_ptr(hits), 102)
            .is_ok(),
        "target registration rejected"
    );

    check!(trap::raise_machine_signal(raiser.ctx, 102).is_ok(), "raise rejected");
    check!(
        raiser.hal.soft_pending_on(6),
        "inter-hart interrupt not posted to target"
    );

    dispatcher::dispatch(target.ctx, mock::MCAUSE_MSOFT, 0);
    check!(
        hits.load(Ordering::Relaxed) == 1,
        "signal did not deliver on target hart"
    );
    TestResult::Pass
}

/// Raising a signal twice before it is serviced coalesces into one
/// delivery.
fn test_coalescing() -> TestResult {
    let board = mock::board(4);
    let hits = mock::counter();
    let _ = trap::define_signal(board.ctx, 103, 4);
    let _ = trap::register_machine_isr(
        board.ctx,
        Some(mock::counting_isr),
        mock::counter_ptr(hits),
        103,
    );

    let _ = trap::raise_machine_signal(board.ctx, 103);
    let _ = trap::raise_machine_signal(board.ctx, 103);
    dispatcher::dispatch(board.ctx, mock::MCAUSE_MSOFT, 0);
    check!(
        hits.load(Ordering::Relaxed) == 1,
        "coalesced raises delivered more than once"
    );
    TestResult::Pass
}

/// Pending signals are serviced in ascending id order when several arrive
/// together.
fn test_ascending_order() -> TestResult {
    let board = mock::board(4);
    let log: &'static mock::CallLog = mock::leak(mock::CallLog::new());

    for id in [107u16, 105, 106] {
        let _ = trap::define_signal(board.ctx, id, 4);
        let _ = trap::register_machine_isr(
            board.ctx,
            Some(mock::logging_isr),
            mock::log_ptr(log),
            id,
        );
    }
    // Raise out of order; service order must follow the ids.
    let _ = trap::raise_machine_signal(board.ctx, 107);
    let _ = trap::raise_machine_signal(board.ctx, 105);
    let _ = trap::raise_machine_signal(board.ctx, 106);

    dispatcher::dispatch(board.ctx, mock::MCAUSE_MSOFT, 0);
    check!(log.len() == 3, "not all signals serviced");
    check!(
        log.get(0) == Some(105) && log.get(1) == Some(106) && log.get(2) == Some(107),
        "signals serviced out of id order"
    );
    TestResult::Pass
}

/// A masked signal stays pending and delivers once unmasked.
fn test_masked_signal_stays_pending() -> TestResult {
    let board = mock::board(4);
    let hits = mock::counter();
    let _ = trap::define_signal(board.ctx, 104, 4);
    let _ = trap::register_machine_isr(
        board.ctx,
        Some(mock::counting_isr),
        mock::counter_ptr(hits),
        104,
    );
    let _ = trap::set_priority(board.ctx, 104, 0);

    let _ = trap::raise_machine_signal(board.ctx, 104);
    dispatcher::dispatch(board.ctx, mock::MCAUSE_MSOFT, 0);
    check!(hits.load(Ordering::Relaxed) == 0, "masked signal delivered");

    let _ = trap::set_priority(board.ctx, 104, 1);
    dispatcher::dispatch(board.ctx, mock::MCAUSE_MSOFT, 0);
    check!(
        hits.load(Ordering::Relaxed) == 1,
        "unmasked signal lost its pending state"
    );
    TestResult::Pass
}

/// The user-mode raise path is gated on a machine-mode permission grant.
fn test_user_raise_permission() -> TestResult {
    let board = mock::board(4);
    let handle = trap::interrupts_user_handle(4);
    let _ = trap::define_signal(board.ctx, 108, 4);

    check!(
        trap::raise_user_signal(handle, 108) == Err(TrapError::PermissionDenied),
        "ungranted user raise accepted"
    );
    check!(
        trap::set_user_permission(board.ctx, 108, true).is_ok(),
        "grant rejected"
    );
    check!(trap::raise_user_signal(handle, 108).is_ok(), "granted raise rejected");
    check!(
        trap::raise_user_signal(handle, 109) == Err(TrapError::InvalidSource),
        "undefined user raise accepted"
    );
    TestResult::Pass
}

pub fn run_signal_tests(runner: &mut TestRunner) {
    println!("Starting software signal tests...");

    let tests = [
        TestCase {
            name: "define_then_raise",
            func: test_define_then_raise,
            description: "Definition gates raising; delivery is exactly once",
        },
        TestCase {
            name: "define_collisions",
            func: test_define_collisions,
            description: "Ids are unique and above the board range",
        },
        TestCase {
            name: "cross_hart_delivery",
            func: test_cross_hart_delivery,
            description: "Signals route to their bound hart",
        },
        TestCase {
            name: "coalescing",
            func: test_coalescing,
            description: "Unserviced raises coalesce into one pending bit",
        },
        TestCase {
            name: "ascending_order",
            func: test_ascending_order,
            description: "Simultaneous signals service in ascending id order",
        },
        TestCase {
            name: "masked_signal_stays_pending",
            func: test_masked_signal_stays_pending,
            description: "Masked signals stay pending until deliverable",
        },
        TestCase {
            name: "user_raise_permission",
            func: test_user_raise_permission,
            description: "User raises require a grant",
        },
    ];

    runner.run_suite("Software Signals", &tests);
}
