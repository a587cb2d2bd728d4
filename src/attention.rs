use crate::particle::Particle;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Cosmetic emphasis state machine: Idle -> Emphasized -> Idle.
///
/// Reads the particle store, never writes it. At most one particle is
/// emphasized at a time, only non-decorative, not-yet-discussed ones are
/// eligible, and every emphasis is time-bounded.
pub struct AttentionScheduler {
    /// Seconds between emphasis attempts
    interval: f32,
    /// Seconds an emphasis lasts
    hold: f32,
    state: State,
    rng: StdRng,
}

enum State {
    Idle { next_at: f32 },
    Emphasized { id: String, until: f32 },
}

impl AttentionScheduler {
    pub fn new(interval: f32, hold: f32, seed: u64) -> Self {
        Self {
            interval,
            hold,
            state: State::Idle { next_at: interval },
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Advance the state machine against the current simulation clock.
    pub fn tick(&mut self, now: f32, particles: &[Particle]) {
        match &self.state {
            State::Idle { next_at } if now >= *next_at => {
                let eligible: Vec<&Particle> = particles
                    .iter()
                    .filter(|p| !p.pearl && !p.meta.discussed)
                    .collect();
                if eligible.is_empty() {
                    self.state = State::Idle {
                        next_at: now + self.interval,
                    };
                } else {
                    let pick = eligible[self.rng.gen_range(0..eligible.len())];
                    self.state = State::Emphasized {
                        id: pick.id.clone(),
                        until: now + self.hold,
                    };
                }
            }
            State::Emphasized { until, .. } if now >= *until => {
                self.state = State::Idle {
                    next_at: now + self.interval,
                };
            }
            _ => {}
        }
    }

    /// The currently emphasized particle id, if any.
    pub fn emphasized(&self) -> Option<&str> {
        match &self.state {
            State::Emphasized { id, .. } => Some(id.as_str()),
            State::Idle { .. } => None,
        }
    }
}
