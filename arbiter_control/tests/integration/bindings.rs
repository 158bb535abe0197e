//! Integration test: trigger bindings driving the scheduler.
//!
//! Each test builds a one-mechanism scheduler whose triggers read operator
//! buttons, then steps it with scripted button states.

use arbiter_common::hal::types::{ActuationFrame, HalStatus};
use arbiter_common::input::controller::Buttons;
use arbiter_common::sched::state::{MechanismId, RoutineId, StopReason};
use arbiter_control::routine::lifecycle::Routine;
use arbiter_control::scheduler::builder::SchedulerBuilder;
use arbiter_control::scheduler::registry::Holder;
use arbiter_control::scheduler::tick::Scheduler;
use arbiter_control::trigger::binder::{BindingKind, Trigger};
use arbiter_control::trigger::sources::button;

use super::OPERATOR;

// ── Helpers ─────────────────────────────────────────────────────────

const ARM: MechanismId = MechanismId(0);

fn scheduler_with(kind: BindingKind) -> (Scheduler, RoutineId) {
    let mut b = SchedulerBuilder::new();
    b.mechanism(ARM, "arm").unwrap();
    b.default_routine(ARM, Routine::new("arm_hold", &[ARM]).unwrap());
    let work = b.routine(Routine::new("arm_work", &[ARM]).unwrap()).unwrap();
    b.trigger(Trigger::new("button_a", button(OPERATOR, Buttons::A)).bind(kind, work));
    (b.build().unwrap(), work)
}

fn step(s: &mut Scheduler, held: bool) {
    let mut status = HalStatus::default();
    if held {
        status.input.controller_mut(OPERATOR).unwrap().buttons = Buttons::A;
    }
    s.tick(&status, &mut ActuationFrame::new());
}

/// Step through `presses`, recording whether the routine is scheduled
/// after each tick.
fn trace(kind: BindingKind, presses: &[bool]) -> Vec<bool> {
    let (mut s, work) = scheduler_with(kind);
    presses
        .iter()
        .map(|&held| {
            step(&mut s, held);
            s.is_scheduled(work)
        })
        .collect()
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn toggle_starts_stops_and_restarts() {
    let states = trace(
        BindingKind::ToggleOnTrue,
        &[false, true, false, true, false, true, true],
    );
    assert_eq!(states, vec![false, true, true, false, false, true, true]);
}

#[test]
fn toggle_after_interruption_schedules_again() {
    let mut b = SchedulerBuilder::new();
    b.mechanism(ARM, "arm").unwrap();
    b.default_routine(ARM, Routine::new("arm_hold", &[ARM]).unwrap());
    let work = b.routine(Routine::new("arm_work", &[ARM]).unwrap()).unwrap();
    let other = b.routine(Routine::new("arm_other", &[ARM]).unwrap()).unwrap();
    b.trigger(Trigger::new("button_a", button(OPERATOR, Buttons::A)).toggle_on_true(work));
    let mut s = b.build().unwrap();

    step(&mut s, false);
    step(&mut s, true);
    assert!(s.is_scheduled(work));

    s.schedule(other);
    step(&mut s, false);
    assert!(!s.is_scheduled(work));
    assert_eq!(s.routine(work).unwrap().last_stop(), Some(StopReason::Interrupted));

    // Toggle memory says "on", but the routine is gone: schedule, not cancel.
    step(&mut s, true);
    assert!(s.is_scheduled(work));
    assert_eq!(s.holder(ARM), Some(Holder::Routine(work)));
}

#[test]
fn condition_true_on_first_poll_fires_nothing() {
    for kind in [
        BindingKind::OnTrue,
        BindingKind::WhileTrue,
        BindingKind::ToggleOnTrue,
    ] {
        assert_eq!(trace(kind, &[true, true, true]), vec![false; 3], "{kind:?}");
    }
    assert_eq!(
        trace(BindingKind::WhileFalse, &[false, false]),
        vec![false; 2]
    );
}

#[test]
fn while_true_follows_the_button() {
    let states = trace(BindingKind::WhileTrue, &[false, true, true, false, true]);
    assert_eq!(states, vec![false, true, true, false, true]);
}

#[test]
fn while_false_inverts_the_button() {
    let states = trace(BindingKind::WhileFalse, &[true, false, false, true]);
    assert_eq!(states, vec![false, true, true, false]);
}

#[test]
fn on_true_keeps_running_after_release() {
    let states = trace(BindingKind::OnTrue, &[false, true, false, false]);
    assert_eq!(states, vec![false, true, true, true]);
}

#[test]
fn on_false_fires_on_release() {
    let states = trace(BindingKind::OnFalse, &[true, true, false, false]);
    assert_eq!(states, vec![false, false, true, true]);
}

#[test]
fn default_returns_after_while_true_release() {
    let (mut s, work) = scheduler_with(BindingKind::WhileTrue);
    step(&mut s, false);
    assert_eq!(s.holder(ARM), Some(Holder::Default));

    step(&mut s, true);
    assert_eq!(s.holder(ARM), Some(Holder::Routine(work)));
    assert!(!s.registry().default_routine(ARM).unwrap().is_scheduled());

    step(&mut s, false);
    assert_eq!(s.holder(ARM), Some(Holder::Default));
    assert!(s.registry().default_routine(ARM).unwrap().is_scheduled());
    assert_eq!(s.routine(work).unwrap().last_stop(), Some(StopReason::Cancelled));
}
