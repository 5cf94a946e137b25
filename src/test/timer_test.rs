// hartirq/src/test/timer_test.rs

// Timeout scheduler behavior: countdown ordering, same-tick expiry order,
// idempotent cancellation, argument validation, and the frozen-timer mode.
// Uses hart 7. Ticks are driven by dispatching machine timer interrupts,
// the same path hardware takes.

use core::sync::atomic::Ordering;

use super::mock::{self, check};
use super::{TestCase, TestResult, TestRunner};
use crate::println;
use crate::trap::infrastructure::dispatcher;
use crate::trap::{self, sources, Timeout, TimeoutState, TrapError};

fn ticking_board() -> mock::TestBoard {
    let board = mock::board(7);
    let _ = trap::timer_config(10);
    trap::set_timer_tick(board.ctx, 100).expect("tick setup failed");
    board
}

fn tick(board: &mock::TestBoard, times: usize) {
    for _ in 0..times {
        dispatcher::dispatch(board.ctx, mock::MCAUSE_MTIMER, 0);
    }
}

/// Frequency configuration is validated and readable; the tick cannot be
/// enabled before it.
fn test_timer_config() -> TestResult {
    let board = mock::board(7);
    check!(trap::get_timer_freq() == -1, "frequency readable before config");
    check!(
        trap::set_timer_tick(board.ctx, 100) == Err(TrapError::InvalidArgument),
        "tick accepted before frequency config"
    );
    check!(
        trap::timer_config(0) == Err(TrapError::InvalidArgument),
        "zero frequency accepted"
    );
    check!(trap::timer_config(10).is_ok(), "frequency rejected");
    check!(
        trap::get_timer_freq() == 10_000_000,
        "frequency readback wrong"
    );

    check!(trap::set_timer_tick(board.ctx, 100).is_ok(), "tick rejected");
    // 100 us at 10 MHz is 1000 timer counts.
    check!(
        board.hal.compare_deadline() == 1000,
        "first compare deadline wrong"
    );
    check!(
        board.hal.routing_open(sources::MACHINE_TIMER_INTERRUPT),
        "timer source not routed"
    );
    TestResult::Pass
}

/// Arming A for 3 ticks and B for 5, then advancing 3 ticks, fires A
/// exactly once and leaves B armed with 2 remaining; 2 more ticks fire B.
fn test_countdown_ordering() -> TestResult {
    let board = ticking_board();
    let a: &'static Timeout = mock::leak(Timeout::new());
    let b: &'static Timeout = mock::leak(Timeout::new());
    let a_fired = mock::counter();
    let b_fired = mock::counter();

    check!(
        trap::set_machine_timeout(board.ctx, a, mock::counting_callback, mock::counter_ptr(a_fired), 3)
            .is_ok(),
        "arming A rejected"
    );
    check!(
        trap::set_machine_timeout(board.ctx, b, mock::counting_callback, mock::counter_ptr(b_fired), 5)
            .is_ok(),
        "arming B rejected"
    );

    tick(&board, 3);
    check!(a_fired.load(Ordering::Relaxed) == 1, "A did not fire exactly once");
    check!(a.state() == TimeoutState::Fired, "A not marked fired");
    check!(b.state() == TimeoutState::Armed, "B no longer armed");
    check!(b.remaining_ticks() == 2, "B remaining count wrong");

    tick(&board, 2);
    check!(b_fired.load(Ordering::Relaxed) == 1, "B did not fire");
    check!(b.state() == TimeoutState::Fired, "B not marked fired");
    TestResult::Pass
}

/// Handles expiring on the same tick fire in the order they were armed.
fn test_same_tick_order() -> TestResult {
    let board = ticking_board();
    let log: &'static mock::CallLog = mock::leak(mock::CallLog::new());
    let first: &'static Timeout = mock::leak(Timeout::new());
    let second: &'static Timeout = mock::leak(Timeout::new());
    let tag_one: &'static mock::Tagged = mock::leak(mock::Tagged { log, tag: 1 });
    let tag_two: &'static mock::Tagged = mock::leak(mock::Tagged { log, tag: 2 });

    let _ = trap::set_machine_timeout(
        board.ctx,
        first,
        mock::tagged_callback,
        tag_one as *const mock::Tagged as *mut core::ffi::c_void,
        2,
    );
    let _ = trap::set_machine_timeout(
        board.ctx,
        second,
        mock::tagged_callback,
        tag_two as *const mock::Tagged as *mut core::ffi::c_void,
        2,
    );

    tick(&board, 2);
    check!(log.len() == 2, "both callbacks did not run");
    check!(
        log.get(0) == Some(1) && log.get(1) == Some(2),
        "same-tick callbacks out of arming order"
    );
    TestResult::Pass
}

/// Cancellation stops an armed handle, and cancelling a fired or already
/// cancelled handle is a successful no-op.
fn test_cancel_idempotent() -> TestResult {
    let board = ticking_board();
    let armed: &'static Timeout = mock::leak(Timeout::new());
    let fired: &'static Timeout = mock::leak(Timeout::new());
    let armed_count = mock::counter();
    let fired_count = mock::counter();

    let _ = trap::set_machine_timeout(
        board.ctx,
        armed,
        mock::counting_callback,
        mock::counter_ptr(armed_count),
        2,
    );
    check!(trap::cancel_timeout(armed).is_ok(), "cancel rejected");
    check!(armed.state() == TimeoutState::Cancelled, "not cancelled");
    tick(&board, 3);
    check!(
        armed_count.load(Ordering::Relaxed) == 0,
        "cancelled handle fired"
    );
    check!(trap::cancel_timeout(armed).is_ok(), "double cancel failed");

    let _ = trap::set_machine_timeout(
        board.ctx,
        fired,
        mock::counting_callback,
        mock::counter_ptr(fired_count),
        1,
    );
    tick(&board, 1);
    check!(fired_count.load(Ordering::Relaxed) == 1, "handle did not fire");
    check!(
        trap::cancel_timeout(fired).is_ok(),
        "cancel after fire errored"
    );
    check!(fired.state() == TimeoutState::Fired, "fired state overwritten");
    tick(&board, 2);
    check!(
        fired_count.load(Ordering::Relaxed) == 1,
        "second callback after cancel"
    );
    TestResult::Pass
}

/// Tick counts must be positive and the tick must be running.
fn test_invalid_arguments() -> TestResult {
    let board = mock::board(7);
    let _ = trap::timer_config(10);
    let handle: &'static Timeout = mock::leak(Timeout::new());

    check!(
        trap::set_machine_timeout(
            board.ctx,
            handle,
            mock::counting_callback,
            core::ptr::null_mut(),
            2
        ) == Err(TrapError::InvalidArgument),
        "timeout accepted with tick disabled"
    );

    let _ = trap::set_timer_tick(board.ctx, 100);
    for ticks in [0, -3] {
        check!(
            trap::set_machine_timeout(
                board.ctx,
                handle,
                mock::counting_callback,
                core::ptr::null_mut(),
                ticks
            ) == Err(TrapError::InvalidArgument),
            "non-positive tick count {} accepted",
            ticks
        );
    }
    check!(handle.state() == TimeoutState::Idle, "handle state disturbed");
    TestResult::Pass
}

/// Setting the tick period to 0 freezes every countdown until the tick is
/// re-enabled.
fn test_period_zero_freezes() -> TestResult {
    let board = ticking_board();
    let handle: &'static Timeout = mock::leak(Timeout::new());
    let count = mock::counter();
    let _ = trap::set_machine_timeout(
        board.ctx,
        handle,
        mock::counting_callback,
        mock::counter_ptr(count),
        2,
    );

    check!(trap::set_timer_tick(board.ctx, 0).is_ok(), "tick disable rejected");
    check!(
        !board.hal.routing_open(sources::MACHINE_TIMER_INTERRUPT),
        "timer source still routed"
    );
    tick(&board, 4);
    check!(handle.state() == TimeoutState::Armed, "countdown ran while frozen");
    check!(handle.remaining_ticks() == 2, "remaining changed while frozen");

    check!(trap::set_timer_tick(board.ctx, 100).is_ok(), "tick re-enable rejected");
    tick(&board, 2);
    check!(count.load(Ordering::Relaxed) == 1, "handle did not fire after thaw");
    TestResult::Pass
}

/// Every serviced tick re-arms the compare register one period ahead.
fn test_compare_rearm() -> TestResult {
    let board = ticking_board();
    board.hal.set_time(5000);
    tick(&board, 1);
    check!(
        board.hal.compare_deadline() == 6000,
        "compare not re-armed one period ahead"
    );
    TestResult::Pass
}

/// The user-mode path arms timeouts through the subsystem handle.
fn test_user_timeout() -> TestResult {
    let board = ticking_board();
    let handle = trap::interrupts_user_handle(7);
    let timeout: &'static Timeout = mock::leak(Timeout::new());
    let count = mock::counter();

    check!(
        trap::set_user_timeout(
            handle,
            timeout,
            mock::counting_callback,
            mock::counter_ptr(count),
            1
        )
        .is_ok(),
        "user timeout rejected"
    );
    tick(&board, 1);
    check!(count.load(Ordering::Relaxed) == 1, "user timeout did not fire");
    TestResult::Pass
}

pub fn run_timer_tests(runner: &mut TestRunner) {
    println!("Starting timeout scheduler tests...");

    let tests = [
        TestCase {
            name: "timer_config",
            func: test_timer_config,
            description: "Frequency validation and first compare deadline",
        },
        TestCase {
            name: "countdown_ordering",
            func: test_countdown_ordering,
            description: "Earlier-expiring handles fire on earlier ticks",
        },
        TestCase {
            name: "same_tick_order",
            func: test_same_tick_order,
            description: "Same-tick expiry follows arming order",
        },
        TestCase {
            name: "cancel_idempotent",
            func: test_cancel_idempotent,
            description: "Cancellation is idempotent across states",
        },
        TestCase {
            name: "invalid_arguments",
            func: test_invalid_arguments,
            description: "Non-positive counts and disabled ticks are rejected",
        },
        TestCase {
            name: "period_zero_freezes",
            func: test_period_zero_freezes,
            description: "Period 0 freezes all countdowns",
        },
        TestCase {
            name: "compare_rearm",
            func: test_compare_rearm,
            description: "Each tick programs the next deadline",
        },
        TestCase {
            name: "user_timeout",
            func: test_user_timeout,
            description: "User-mode arming through the handle",
        },
    ];

    runner.run_suite("Timeout Scheduler", &tests);
}
