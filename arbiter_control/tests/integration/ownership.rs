//! Integration test: mechanism ownership under randomized request streams.
//!
//! A pool of routines with overlapping requirements, mixed interrupt
//! behaviors and every exit path (cancel, interrupt, finish, fault in
//! `on_start`, fault in `on_tick`, instant) is driven by a seeded request
//! stream. After every tick:
//! 1. No two scheduled routines share a mechanism.
//! 2. Registry bookkeeping is consistent (`Scheduler::verify`).
//! 3. Every routine has had exactly one more `on_start` than `on_stop`
//!    while scheduled, and equal counts while idle.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use arbiter_common::hal::types::{ActuationFrame, ActuatorRequest, HalStatus};
use arbiter_common::sched::error::{RoutineError, SchedulerError};
use arbiter_common::sched::state::{
    Flow, InterruptBehavior, MechanismId, RoutineId, RoutineKind, StopReason,
};
use arbiter_control::routine::lifecycle::Routine;
use arbiter_control::scheduler::builder::SchedulerBuilder;
use arbiter_control::scheduler::registry::Holder;
use arbiter_control::scheduler::tick::Scheduler;

// ── Helpers ─────────────────────────────────────────────────────────

type Log = Rc<RefCell<HashMap<&'static str, (u32, u32)>>>;

const MECHANISMS: [MechanismId; 4] = [MechanismId(0), MechanismId(1), MechanismId(2), MechanismId(3)];
const DEFAULT_NAMES: [&str; 4] = ["d0", "d1", "d2", "d3"];
const NAMES: [&str; 10] = ["r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9"];

/// Deterministic 64-bit LCG.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

#[derive(Clone, Copy, Debug)]
enum Exit {
    Continuous,
    FinishAfter(u32),
    FaultAfter(u32),
    FaultOnStart,
    Instant,
}

fn counted(name: &'static str, reqs: &[MechanismId], log: &Log, exit: Exit) -> Routine {
    let starts = log.clone();
    let stops = log.clone();
    let fault_on_start = matches!(exit, Exit::FaultOnStart);
    let mut ticks = 0u32;

    let mut routine = Routine::new(name, reqs)
        .unwrap()
        .on_start(move |_| {
            starts.borrow_mut().entry(name).or_default().0 += 1;
            if fault_on_start {
                return Err(RoutineError::Fault("start".into()));
            }
            Ok(Flow::Continue)
        })
        .on_tick(move |ctx| {
            ticks += 1;
            for &m in &MECHANISMS {
                if ctx.requires(m) {
                    ctx.actuate(m, 0, ActuatorRequest::Output(0.5))?;
                }
            }
            match exit {
                Exit::FinishAfter(n) if ticks >= n => Ok(Flow::Finished),
                Exit::FaultAfter(n) if ticks >= n => Err(RoutineError::Fault("tick".into())),
                _ => Ok(Flow::Continue),
            }
        })
        .on_stop(move |_, _| {
            stops.borrow_mut().entry(name).or_default().1 += 1;
            Ok(())
        });
    if let Exit::Instant = exit {
        routine = routine.with_kind(RoutineKind::Instant);
    }
    routine
}

fn random_pool(rng: &mut Lcg, log: &Log) -> (Scheduler, Vec<RoutineId>) {
    let mut b = SchedulerBuilder::new();
    for (i, &m) in MECHANISMS.iter().enumerate() {
        b.mechanism(m, DEFAULT_NAMES[i]).unwrap();
        b.default_routine(m, counted(DEFAULT_NAMES[i], &[m], log, Exit::Continuous));
    }

    let mut ids = Vec::new();
    for &name in &NAMES {
        let count = 1 + rng.below(3) as usize;
        let reqs: Vec<MechanismId> = (0..count)
            .map(|_| MECHANISMS[rng.below(MECHANISMS.len() as u64) as usize])
            .collect();
        let exit = match rng.below(6) {
            0 => Exit::FinishAfter(1 + rng.below(5) as u32),
            1 => Exit::FaultAfter(1 + rng.below(5) as u32),
            2 => Exit::FaultOnStart,
            3 => Exit::Instant,
            _ => Exit::Continuous,
        };
        let interrupt = if rng.below(4) == 0 {
            InterruptBehavior::CancelIncoming
        } else {
            InterruptBehavior::CancelSelf
        };
        let routine = counted(name, &reqs, log, exit).with_interrupt(interrupt);
        ids.push(b.routine(routine).unwrap());
    }
    (b.build().unwrap(), ids)
}

fn assert_invariants(s: &Scheduler, ids: &[RoutineId], log: &Log) {
    s.verify().unwrap();

    let scheduled: Vec<RoutineId> = ids.iter().copied().filter(|&id| s.is_scheduled(id)).collect();
    for (i, &a) in scheduled.iter().enumerate() {
        for &b in &scheduled[i + 1..] {
            let ra = s.routine(a).unwrap();
            let rb = s.routine(b).unwrap();
            for m in ra.requirements() {
                assert!(
                    !rb.requires(*m),
                    "{} and {} both hold {m}",
                    ra.name(),
                    rb.name()
                );
            }
        }
    }

    let log = log.borrow();
    for &id in ids {
        let r = s.routine(id).unwrap();
        let (starts, stops) = log.get(r.name()).copied().unwrap_or_default();
        let expected = u32::from(r.is_scheduled());
        assert_eq!(starts - stops, expected, "start/stop imbalance for {}", r.name());
    }
    for (i, &m) in MECHANISMS.iter().enumerate() {
        let d = s.registry().default_routine(m).unwrap();
        let (starts, stops) = log.get(DEFAULT_NAMES[i]).copied().unwrap_or_default();
        assert_eq!(starts - stops, u32::from(d.is_scheduled()));
        if let Some(Holder::Routine(_)) = s.holder(m) {
            assert!(!d.is_scheduled(), "default of {m} running while displaced");
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn random_request_streams_preserve_ownership() {
    for seed in 1..=25u64 {
        let mut rng = Lcg(seed);
        let log: Log = Rc::default();
        let (mut s, ids) = random_pool(&mut rng, &log);
        let status = HalStatus::default();

        for _ in 0..200 {
            for _ in 0..rng.below(4) {
                let id = ids[rng.below(ids.len() as u64) as usize];
                if rng.below(3) == 0 {
                    s.cancel(id);
                } else {
                    s.schedule(id);
                }
            }
            let mut frame = ActuationFrame::new();
            s.tick(&status, &mut frame);
            assert_invariants(&s, &ids, &log);
        }

        let mut frame = ActuationFrame::new();
        s.shutdown(&status, &mut frame);
        for (name, (starts, stops)) in log.borrow().iter() {
            assert_eq!(starts, stops, "seed {seed}: {name} not stopped at shutdown");
        }
    }
}

#[test]
fn cancel_incoming_holder_survives_conflict() {
    let log: Log = Rc::default();
    let m = MECHANISMS[0];
    let mut b = SchedulerBuilder::new();
    b.mechanism(m, "m").unwrap();
    b.default_routine(m, counted("d0", &[m], &log, Exit::Continuous));
    let guard = b
        .routine(
            counted("r0", &[m], &log, Exit::Continuous)
                .with_interrupt(InterruptBehavior::CancelIncoming),
        )
        .unwrap();
    let intruder = b
        .routine(counted("r1", &[m], &log, Exit::Continuous))
        .unwrap();
    let mut s = b.build().unwrap();
    let status = HalStatus::default();

    s.schedule(guard);
    s.tick(&status, &mut ActuationFrame::new());
    s.schedule(intruder);
    let report = s.tick(&status, &mut ActuationFrame::new());

    assert_eq!(report.conflicts, 1);
    assert!(s.is_scheduled(guard));
    assert!(!s.is_scheduled(intruder));
    assert_eq!(log.borrow().get("r1"), None);
}

#[test]
fn interrupted_routine_sees_interrupted_reason() {
    let reasons: Rc<RefCell<Vec<StopReason>>> = Rc::default();
    let seen = reasons.clone();
    let m = MECHANISMS[1];
    let mut b = SchedulerBuilder::new();
    b.mechanism(m, "m").unwrap();
    b.default_routine(m, Routine::new("d", &[m]).unwrap());
    let first = b
        .routine(Routine::new("first", &[m]).unwrap().on_stop(move |_, reason| {
            seen.borrow_mut().push(reason);
            Ok(())
        }))
        .unwrap();
    let second = b.routine(Routine::new("second", &[m]).unwrap()).unwrap();
    let mut s = b.build().unwrap();
    let status = HalStatus::default();

    s.schedule(first);
    s.tick(&status, &mut ActuationFrame::new());
    s.schedule(second);
    s.tick(&status, &mut ActuationFrame::new());

    assert_eq!(*reasons.borrow(), vec![StopReason::Interrupted]);
    assert_eq!(s.holder(m), Some(Holder::Routine(second)));
}

#[test]
fn unbound_mechanism_fails_build() {
    let mut b = SchedulerBuilder::new();
    b.mechanism(MECHANISMS[0], "m").unwrap();
    b.default_routine(MECHANISMS[0], Routine::new("d", &[MECHANISMS[0]]).unwrap());
    b.routine(Routine::new("wanders", &[MECHANISMS[0], MECHANISMS[3]]).unwrap())
        .unwrap();
    assert_eq!(
        b.build().unwrap_err(),
        SchedulerError::UnboundMechanism {
            routine: "wanders",
            mechanism: MECHANISMS[3],
        }
    );
}
