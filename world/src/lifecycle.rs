use std::{collections::VecDeque, time::Duration};

use belt_blast_core::{
    BeltLayout, BeltStep, BlockColor, CellCoord, ShooterId, ShooterSnapshot, ShooterState,
    SlotIndex, Vec2,
};

use crate::grid::{BlockGrid, Claim};

/// Schedule entry whose target is reserved by the owning shooter.
#[derive(Debug)]
pub(crate) struct PendingShot {
    step: BeltStep,
    claim: Claim,
}

impl PendingShot {
    pub(crate) fn new(step: BeltStep, claim: Claim) -> Self {
        Self { step, claim }
    }
}

/// Shot released by a shooter during a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Shot {
    pub(crate) shooter: ShooterId,
    pub(crate) cell: CellCoord,
    pub(crate) origin: Vec2,
}

/// Notable transition reached while advancing a shooter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Signal {
    /// Nothing requires the world's attention.
    Idle,
    /// The glide toward the belt entry finished.
    ReachedEntry,
    /// The bounce before a boosted pass finished.
    BounceFinished,
    /// All four belt segments were traversed.
    LapComplete,
    /// The last round was fired.
    Depleted,
    /// The death animation finished.
    DeathFinished,
}

/// Parameters shared by every shooter during a tick.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TickContext {
    pub(crate) belt: BeltLayout,
    pub(crate) belt_speed: f32,
    pub(crate) death_duration: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GlidePurpose {
    Settle,
    EnterBelt,
    Bounce,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Glide {
    from: Vec2,
    to: Vec2,
    elapsed: Duration,
    duration: Duration,
    purpose: GlidePurpose,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct BeltProgress {
    segment: u32,
    elapsed: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Motion {
    Still,
    Glide(Glide),
    Belt(BeltProgress),
    Dying(Duration),
}

/// Authoritative state of a single shooter.
#[derive(Debug)]
pub(crate) struct Shooter {
    id: ShooterId,
    color: BlockColor,
    ammo: u32,
    state: ShooterState,
    boosted: bool,
    position: Vec2,
    schedule: VecDeque<PendingShot>,
    awaiting_schedule: bool,
    motion: Motion,
}

impl Shooter {
    pub(crate) fn in_table(id: ShooterId, color: BlockColor, ammo: u32, position: Vec2) -> Self {
        Self {
            id,
            color,
            ammo,
            state: ShooterState::InTable,
            boosted: false,
            position,
            schedule: VecDeque::new(),
            awaiting_schedule: false,
            motion: Motion::Still,
        }
    }

    pub(crate) fn id(&self) -> ShooterId {
        self.id
    }

    pub(crate) fn color(&self) -> BlockColor {
        self.color
    }

    pub(crate) fn ammo(&self) -> u32 {
        self.ammo
    }

    pub(crate) fn state(&self) -> ShooterState {
        self.state
    }

    pub(crate) fn is_awaiting_schedule(&self) -> bool {
        self.awaiting_schedule
    }

    pub(crate) fn snapshot(&self, slot: Option<SlotIndex>) -> ShooterSnapshot {
        ShooterSnapshot {
            id: self.id,
            color: self.color,
            ammo: self.ammo,
            state: self.state,
            boosted: self.boosted,
            position: self.position,
            slot,
            pending_shots: u32::try_from(self.schedule.len()).unwrap_or(u32::MAX),
        }
    }

    /// Places a table shooter at its column position without animating.
    pub(crate) fn place(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Registers the shooter into the queue and glides it to its slot.
    pub(crate) fn enter_queue(&mut self, slot_position: Vec2, duration: Duration) {
        self.state = ShooterState::InQueue;
        self.boosted = false;
        self.glide_to(slot_position, duration, GlidePurpose::Settle);
    }

    /// Starts the glide toward the belt entry and waits for a fresh schedule.
    pub(crate) fn head_for_belt(&mut self, entry: Vec2, duration: Duration) {
        self.state = ShooterState::Transitioning;
        self.awaiting_schedule = true;
        self.glide_to(entry, duration, GlidePurpose::EnterBelt);
    }

    /// Starts the short bounce toward the queue that precedes a boosted pass.
    pub(crate) fn bounce_toward(&mut self, target: Vec2, duration: Duration) {
        self.state = ShooterState::Returning;
        self.glide_to(target, duration, GlidePurpose::Bounce);
    }

    pub(crate) fn boost(&mut self) {
        self.boosted = true;
    }

    /// Attaches a freshly claimed schedule.
    pub(crate) fn attach_schedule(&mut self, shots: Vec<PendingShot>) {
        self.schedule = shots.into();
        self.awaiting_schedule = false;
    }

    /// Begins perimeter traversal; only valid once the schedule is attached.
    pub(crate) fn start_belt(&mut self, entry: Vec2) -> bool {
        if self.state != ShooterState::Transitioning
            || self.awaiting_schedule
            || self.motion != Motion::Still
        {
            return false;
        }
        self.state = ShooterState::OnBelt;
        self.position = entry;
        self.motion = Motion::Belt(BeltProgress {
            segment: 0,
            elapsed: 0.0,
        });
        true
    }

    pub(crate) fn is_boosted(&self) -> bool {
        self.boosted
    }

    pub(crate) fn start_dying(&mut self) {
        self.state = ShooterState::Dying;
        self.motion = Motion::Dying(Duration::ZERO);
    }

    pub(crate) fn mark_destroyed(&mut self) {
        self.state = ShooterState::Destroyed;
        self.motion = Motion::Still;
        self.awaiting_schedule = false;
    }

    /// Hands every unfired claim back to the grid.
    pub(crate) fn release_schedule(&mut self, grid: &mut BlockGrid) -> Vec<CellCoord> {
        self.schedule
            .drain(..)
            .map(|pending| grid.release(pending.claim))
            .collect()
    }

    /// Advances motion by `dt`, appending any shots fired to `shots`.
    pub(crate) fn advance(
        &mut self,
        dt: Duration,
        context: &TickContext,
        shots: &mut Vec<Shot>,
    ) -> Signal {
        match self.motion {
            Motion::Still => Signal::Idle,
            Motion::Glide(glide) => self.advance_glide(glide, dt),
            Motion::Belt(progress) => self.advance_belt(progress, dt, context, shots),
            Motion::Dying(elapsed) => {
                let elapsed = elapsed.saturating_add(dt);
                if elapsed >= context.death_duration {
                    self.motion = Motion::Still;
                    Signal::DeathFinished
                } else {
                    self.motion = Motion::Dying(elapsed);
                    Signal::Idle
                }
            }
        }
    }

    fn glide_to(&mut self, to: Vec2, duration: Duration, purpose: GlidePurpose) {
        self.motion = Motion::Glide(Glide {
            from: self.position,
            to,
            elapsed: Duration::ZERO,
            duration,
            purpose,
        });
    }

    fn advance_glide(&mut self, mut glide: Glide, dt: Duration) -> Signal {
        glide.elapsed = glide.elapsed.saturating_add(dt);
        if glide.elapsed < glide.duration {
            let percent = glide.elapsed.as_secs_f32() / glide.duration.as_secs_f32();
            self.position = glide.from.lerp(glide.to, ease_in_out(percent));
            self.motion = Motion::Glide(glide);
            return Signal::Idle;
        }

        self.position = glide.to;
        self.motion = Motion::Still;
        match glide.purpose {
            GlidePurpose::Settle => Signal::Idle,
            GlidePurpose::EnterBelt => Signal::ReachedEntry,
            GlidePurpose::Bounce => Signal::BounceFinished,
        }
    }

    fn advance_belt(
        &mut self,
        mut progress: BeltProgress,
        dt: Duration,
        context: &TickContext,
        shots: &mut Vec<Shot>,
    ) -> Signal {
        let waypoints = context.belt.waypoints();
        let side_length = context.belt.side_length();
        let speed = if self.boosted {
            context.belt_speed * 2.0
        } else {
            context.belt_speed
        };

        let mut remaining = dt.as_secs_f32();
        loop {
            let Some(segment) = usize::try_from(progress.segment)
                .ok()
                .filter(|segment| *segment < waypoints.len())
            else {
                self.motion = Motion::Still;
                return Signal::LapComplete;
            };
            let start = waypoints[segment];
            let end = waypoints[(segment + 1) % waypoints.len()];
            let travel_time = if speed > 0.0 {
                start.distance(end) / speed
            } else {
                0.0
            };

            progress.elapsed += remaining;
            let fraction = if travel_time > 0.0 {
                (progress.elapsed / travel_time).min(1.0)
            } else {
                1.0
            };
            self.position = start.lerp(end, fraction);

            let offset = ((fraction * side_length as f32).floor() as u32)
                .min(side_length.saturating_sub(1));
            let current_step = BeltStep::new(progress.segment * side_length + offset);
            self.fire_due(current_step, shots);

            if self.ammo == 0 {
                self.motion = Motion::Still;
                return Signal::Depleted;
            }

            if progress.elapsed < travel_time {
                self.motion = Motion::Belt(progress);
                return Signal::Idle;
            }

            remaining = progress.elapsed - travel_time;
            progress = BeltProgress {
                segment: progress.segment + 1,
                elapsed: 0.0,
            };
            if progress.segment as usize >= waypoints.len() {
                self.motion = Motion::Still;
                return Signal::LapComplete;
            }
        }
    }

    fn fire_due(&mut self, current_step: BeltStep, shots: &mut Vec<Shot>) {
        while self.ammo > 0 {
            let due = self
                .schedule
                .front()
                .is_some_and(|pending| pending.step <= current_step);
            if !due {
                break;
            }
            let Some(pending) = self.schedule.pop_front() else {
                break;
            };
            self.ammo -= 1;
            shots.push(Shot {
                shooter: self.id,
                cell: pending.claim.fire(),
                origin: self.position,
            });
        }
    }
}

/// Cubic ease-in/ease-out curve with flat tangents at both ends.
fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
