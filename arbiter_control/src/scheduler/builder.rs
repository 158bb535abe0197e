//! Scheduler construction and setup validation.
//!
//! All setup errors surface from [`SchedulerBuilder::build`], before the
//! first tick.

use tracing::info;

use arbiter_common::sched::error::SchedulerError;
use arbiter_common::sched::state::{MechanismId, RoutineId, TriggerId};

use crate::routine::lifecycle::Routine;
use crate::trigger::binder::{Trigger, TriggerBinder};

use super::registry::SubsystemRegistry;
use super::tick::Scheduler;

/// Collects mechanisms, routines and triggers, then validates them.
#[derive(Debug, Default)]
pub struct SchedulerBuilder {
    mechanisms: Vec<(MechanismId, &'static str)>,
    defaults: Vec<(MechanismId, Routine)>,
    routines: Vec<Routine>,
    binder: TriggerBinder,
}

impl SchedulerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a mechanism.
    pub fn mechanism(&mut self, id: MechanismId, name: &'static str) -> Result<(), SchedulerError> {
        if self.mechanisms.iter().any(|&(m, _)| m == id) {
            return Err(SchedulerError::DuplicateMechanism(id));
        }
        self.mechanisms.push((id, name));
        Ok(())
    }

    /// Install the default routine for `id`, replacing any earlier one.
    pub fn default_routine(&mut self, id: MechanismId, routine: Routine) {
        self.defaults.retain(|(m, _)| *m != id);
        self.defaults.push((id, routine));
    }

    /// Add an explicit routine to the pool.
    pub fn routine(&mut self, routine: Routine) -> Result<RoutineId, SchedulerError> {
        let id = u16::try_from(self.routines.len())
            .map_err(|_| SchedulerError::CapacityExceeded("routines"))?;
        self.routines.push(routine);
        Ok(RoutineId(id))
    }

    pub fn trigger(&mut self, trigger: Trigger) -> TriggerId {
        self.binder.add(trigger)
    }

    pub fn build(self) -> Result<Scheduler, SchedulerError> {
        let Self {
            mechanisms,
            mut defaults,
            routines,
            binder,
        } = self;

        if let Some((id, routine)) = defaults
            .iter()
            .find(|(id, _)| !mechanisms.iter().any(|(m, _)| m == id))
        {
            return Err(SchedulerError::UnboundMechanism {
                routine: routine.name(),
                mechanism: *id,
            });
        }

        let mut registry = SubsystemRegistry::new();
        for &(id, name) in &mechanisms {
            let pos = defaults
                .iter()
                .position(|(m, _)| *m == id)
                .ok_or(SchedulerError::MissingDefault {
                    mechanism: id,
                    name,
                })?;
            let (_, default) = defaults.swap_remove(pos);
            registry.register(id, name, default)?;
        }

        for routine in &routines {
            if let Some(&m) = routine.requirements().iter().find(|m| !registry.contains(**m)) {
                return Err(SchedulerError::UnboundMechanism {
                    routine: routine.name(),
                    mechanism: m,
                });
            }
        }

        for trigger in binder.iter() {
            if let Some(b) = trigger
                .bindings()
                .iter()
                .find(|b| b.routine.index() >= routines.len())
            {
                return Err(SchedulerError::UnknownRoutine(b.routine));
            }
        }

        info!(
            mechanisms = registry.len(),
            routines = routines.len(),
            triggers = binder.len(),
            "scheduler built"
        );
        Ok(Scheduler::new(registry, routines, binder))
    }
}
