use belt_blast_core::{ColumnIndex, ShooterId, ShooterState};
use belt_blast_world::{query, World};
use rand::{seq::IteratorRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Player input chosen by the autopilot for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    /// Tap the front shooter of a table column.
    Select(ColumnIndex),
    /// Tap a queued shooter.
    Activate(ShooterId),
}

/// Seeded stand-in for a player tapping columns and queued shooters.
#[derive(Debug)]
pub(crate) struct Autopilot {
    rng: ChaCha8Rng,
    belt_limit: usize,
}

impl Autopilot {
    /// Creates an autopilot that keeps at most `belt_limit` shooters in motion.
    pub(crate) fn new(seed: u64, belt_limit: usize) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            belt_limit: belt_limit.max(1),
        }
    }

    /// Picks at most one action for the current frame.
    ///
    /// Launching from the queue takes priority over refilling it. Refills
    /// keep one slot free so a returning shooter always finds room.
    pub(crate) fn plan(&mut self, world: &World) -> Option<Action> {
        if query::outcome(world).is_some() {
            return None;
        }

        let shooters = query::shooters(world);
        let in_motion = shooters
            .iter()
            .filter(|snapshot| {
                matches!(
                    snapshot.state,
                    ShooterState::Transitioning | ShooterState::OnBelt | ShooterState::Returning
                )
            })
            .count();

        if in_motion < self.belt_limit {
            let ready = query::ready_slots(world).iter().flatten().find(|id| {
                shooters
                    .get(**id)
                    .is_some_and(|snapshot| snapshot.state == ShooterState::InQueue)
            });
            if let Some(id) = ready {
                return Some(Action::Activate(*id));
            }
        }

        let free_slots = query::ready_slots(world)
            .iter()
            .filter(|slot| slot.is_none())
            .count();
        if free_slots > 1 || query::is_queue_empty(world) {
            let column = query::table_columns(world)
                .iter()
                .enumerate()
                .filter(|(_, column)| !column.is_empty())
                .map(|(index, _)| index)
                .choose(&mut self.rng)?;
            let column = u32::try_from(column).ok()?;
            return Some(Action::Select(ColumnIndex::new(column)));
        }

        None
    }
}
