//! Works out who actually covers each active duty slot.
//!
//! Precedence per slot: the rostered teacher if present, otherwise the
//! substitute an administrator assigned to the absence, otherwise the next
//! teacher from the substitute pool. Each absence needing automatic cover
//! takes exactly one pool position, and all of that teacher's slots in the
//! same resolution share it.

use super::DutyAssignment;
use crate::models::{Location, ScheduleEntry, Teacher};
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

/// A regular duty slot active right now, joined with its teacher and location
#[derive(Debug, Clone)]
pub struct ActiveSlot {
    pub entry: ScheduleEntry,
    pub teacher: Teacher,
    pub location: Option<Location>,
}

/// One teacher's absence for today
#[derive(Debug, Clone)]
pub struct TodayAbsence {
    pub teacher_id: Uuid,
    pub reason: Option<String>,
    /// First manually assigned substitute, if any
    pub substitute: Option<Teacher>,
}

/// Resolve the effective assignment for every active slot, in slot order
pub fn resolve(
    slots: &[ActiveSlot],
    absences: &[TodayAbsence],
    pool: &[Teacher],
) -> Vec<DutyAssignment> {
    let mut by_teacher: HashMap<Uuid, &TodayAbsence> = HashMap::new();
    for absence in absences {
        // Earliest record wins if a teacher was marked absent twice
        by_teacher.entry(absence.teacher_id).or_insert(absence);
    }

    let (assignments, _) = slots.iter().fold(
        (Vec::with_capacity(slots.len()), Rotation::new(pool)),
        |(mut assignments, mut rotation), slot| {
            let absence = by_teacher.get(&slot.teacher.id).copied();
            assignments.push(assign(slot, absence, &mut rotation));
            (assignments, rotation)
        },
    );

    assignments
}

fn assign(slot: &ActiveSlot, absence: Option<&TodayAbsence>, rotation: &mut Rotation<'_>) -> DutyAssignment {
    let Some(absence) = absence else {
        return DutyAssignment::rostered(slot);
    };

    if let Some(substitute) = &absence.substitute {
        return DutyAssignment::covered(slot, substitute.clone(), absence.reason.clone());
    }

    match rotation.cover(&slot.teacher) {
        Some(substitute) => DutyAssignment::covered(slot, substitute.clone(), absence.reason.clone()),
        None => DutyAssignment::rostered(slot),
    }
}

/// Round-robin cursor over the substitute pool, fresh for every resolution
struct Rotation<'a> {
    pool: &'a [Teacher],
    next: usize,
    chosen: HashMap<Uuid, Option<&'a Teacher>>,
}

impl<'a> Rotation<'a> {
    fn new(pool: &'a [Teacher]) -> Self {
        Self {
            pool,
            next: 0,
            chosen: HashMap::new(),
        }
    }

    /// Substitute for an absent teacher, advancing only on their first slot
    fn cover(&mut self, absent: &Teacher) -> Option<&'a Teacher> {
        if let Some(choice) = self.chosen.get(&absent.id) {
            return *choice;
        }

        let choice = if self.pool.is_empty() {
            warn!(
                "No substitute available for absent teacher {} ({}); duty left uncovered",
                absent.name, absent.id
            );
            None
        } else {
            let picked = self.pool.get(self.next % self.pool.len());
            self.next += 1;
            picked
        };

        self.chosen.insert(absent.id, choice);
        choice
    }
}
