//! Trigger bindings.
//!
//! A [`Trigger`] samples one condition per tick and turns its edges into
//! [`Request`]s according to each attached [`Binding`]:
//!
//! | Binding        | Rising edge        | Falling edge |
//! |----------------|--------------------|--------------|
//! | `OnTrue`       | schedule           |              |
//! | `OnFalse`      |                    | schedule     |
//! | `WhileTrue`    | schedule           | cancel       |
//! | `WhileFalse`   | cancel             | schedule     |
//! | `ToggleOnTrue` | schedule or cancel |              |
//!
//! The binder never touches routines directly; requests are applied by the
//! scheduler in order.

use tracing::trace;

use arbiter_common::hal::types::HalStatus;
use arbiter_common::sched::state::{RoutineId, TriggerId};

use super::edge::{Edge, EdgeDetector};

/// Scheduling request emitted by a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Schedule(RoutineId),
    Cancel(RoutineId),
}

impl Request {
    pub const fn routine(self) -> RoutineId {
        match self {
            Self::Schedule(id) | Self::Cancel(id) => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    OnTrue,
    OnFalse,
    WhileTrue,
    WhileFalse,
    ToggleOnTrue,
}

/// One edge-to-request rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub kind: BindingKind,
    pub routine: RoutineId,
    toggled_on: bool,
}

impl Binding {
    pub const fn new(kind: BindingKind, routine: RoutineId) -> Self {
        Self {
            kind,
            routine,
            toggled_on: false,
        }
    }

    /// Request for `edge`, if any. `scheduled` reports whether the routine is
    /// currently scheduled (toggle memory is reset if it stopped on its own).
    pub fn react(&mut self, edge: Edge, scheduled: bool) -> Option<Request> {
        use BindingKind::*;

        let r = self.routine;
        match (self.kind, edge) {
            (OnTrue, Edge::Rising) | (OnFalse, Edge::Falling) => Some(Request::Schedule(r)),
            (WhileTrue, Edge::Rising) | (WhileFalse, Edge::Falling) => Some(Request::Schedule(r)),
            (WhileTrue, Edge::Falling) | (WhileFalse, Edge::Rising) => Some(Request::Cancel(r)),
            (ToggleOnTrue, Edge::Rising) => {
                if self.toggled_on && scheduled {
                    self.toggled_on = false;
                    Some(Request::Cancel(r))
                } else {
                    self.toggled_on = true;
                    Some(Request::Schedule(r))
                }
            }
            _ => None,
        }
    }
}

/// Condition sampled once per tick.
pub type Condition = Box<dyn FnMut(&HalStatus) -> bool>;

/// A named condition with its edge memory and bindings.
pub struct Trigger {
    name: &'static str,
    condition: Condition,
    edge: EdgeDetector,
    bindings: Vec<Binding>,
}

impl core::fmt::Debug for Trigger {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Trigger")
            .field("name", &self.name)
            .field("edge", &self.edge)
            .field("bindings", &self.bindings)
            .finish_non_exhaustive()
    }
}

impl Trigger {
    pub fn new<F>(name: &'static str, condition: F) -> Self
    where
        F: FnMut(&HalStatus) -> bool + 'static,
    {
        Self {
            name,
            condition: Box::new(condition),
            edge: EdgeDetector::new(),
            bindings: Vec::new(),
        }
    }

    pub fn bind(mut self, kind: BindingKind, routine: RoutineId) -> Self {
        self.bindings.push(Binding::new(kind, routine));
        self
    }

    pub fn on_true(self, routine: RoutineId) -> Self {
        self.bind(BindingKind::OnTrue, routine)
    }

    pub fn on_false(self, routine: RoutineId) -> Self {
        self.bind(BindingKind::OnFalse, routine)
    }

    pub fn while_true(self, routine: RoutineId) -> Self {
        self.bind(BindingKind::WhileTrue, routine)
    }

    pub fn while_false(self, routine: RoutineId) -> Self {
        self.bind(BindingKind::WhileFalse, routine)
    }

    pub fn toggle_on_true(self, routine: RoutineId) -> Self {
        self.bind(BindingKind::ToggleOnTrue, routine)
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Sample the condition and append the resulting requests.
    pub fn poll(
        &mut self,
        status: &HalStatus,
        is_scheduled: &dyn Fn(RoutineId) -> bool,
        out: &mut Vec<Request>,
    ) {
        let edge = self.edge.update((self.condition)(status));
        if edge == Edge::None {
            return;
        }
        trace!(trigger = self.name, ?edge, "trigger edge");
        for binding in &mut self.bindings {
            if let Some(req) = binding.react(edge, is_scheduled(binding.routine)) {
                out.push(req);
            }
        }
    }
}

/// All triggers, polled in registration order.
#[derive(Debug, Default)]
pub struct TriggerBinder {
    triggers: Vec<Trigger>,
}

impl TriggerBinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, trigger: Trigger) -> TriggerId {
        let id = TriggerId(self.triggers.len() as u16);
        self.triggers.push(trigger);
        id
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    pub fn get(&self, id: TriggerId) -> Option<&Trigger> {
        self.triggers.get(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trigger> {
        self.triggers.iter()
    }

    /// Poll every trigger once.
    pub fn poll(
        &mut self,
        status: &HalStatus,
        is_scheduled: &dyn Fn(RoutineId) -> bool,
        out: &mut Vec<Request>,
    ) {
        for trigger in &mut self.triggers {
            trigger.poll(status, is_scheduled, out);
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
