use serde::{Deserialize, Serialize};

/// All physics tunables consolidated into one struct
///
/// Values are per-increment quantities: the stepper runs once per redraw
/// signal with no delta-time scaling, so "per second" intuitions do not
/// apply directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsSettings {
    // === Integration Parameters ===
    /// Gravitational acceleration added to vy each increment (0.05-0.6)
    pub gravity: f32,
    /// Velocity damping factor applied every increment (0.9-1.0)
    pub damping: f32,
    /// Horizontal velocity factor on floor contact (0.5-1.0)
    pub floor_friction: f32,

    // === Restitution Parameters ===
    /// Wall bounce factor, inverted on contact (0.0-0.9)
    pub wall_restitution: f32,
    /// Floor bounce factor before impact softening (0.0-0.9)
    pub floor_restitution: f32,
    /// How strongly fast impacts lose extra energy (0.0-0.5)
    pub impact_softening: f32,
    /// Pairwise collision restitution, impulse split between the pair (0.0-1.0)
    pub collision_restitution: f32,

    // === Settling Parameters ===
    /// Velocity magnitude below which a floor-contacting particle settles (0.01-0.5)
    pub settle_epsilon: f32,
    /// Tolerated pairwise overlap before separation kicks in (0.0-2.0)
    pub overlap_allowance: f32,
    /// Gap kept between particle edge and container walls/floor (0.0-6.0)
    pub wall_margin: f32,

    // === Deformation Parameters ===
    /// Squash magnitude per unit of floor-impact speed (0.0-0.2)
    pub squash_factor: f32,
    /// Interpolation coefficient easing scale toward its target (0.05-0.5)
    pub scale_response: f32,

    // === Release Parameters ===
    /// Base delay in seconds before the first newly added particle drops (0.0-2.0)
    pub release_base_delay: f32,
    /// Extra delay per additional particle in the same pass (0.05-1.0)
    pub release_stagger: f32,

    // === Pre-Simulation Bounds ===
    /// Increments for a full archive build (100-5000)
    pub settle_iterations: usize,
    /// Increments for inserting into an already-settled archive (50-2000)
    pub insert_iterations: usize,

    // === Population Parameters ===
    /// Number of decorative pearls created at store init (0-40)
    pub pearl_count: usize,
    /// Entry blob radius range
    pub blob_radius_min: f32,
    pub blob_radius_max: f32,
    /// Pearl radius range (wider than blobs)
    pub pearl_radius_min: f32,
    pub pearl_radius_max: f32,

    // === Spawn Parameters ===
    /// Live-mode horizontal spawn spread as a fraction of width (0.0-0.3)
    pub live_spawn_spread: f32,
    /// Archive-mode horizontal spawn spread as a fraction of width (0.0-0.45)
    pub archive_spawn_spread: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            // Integration - soft, syrupy fall
            gravity: 0.18,
            damping: 0.995,
            floor_friction: 0.82,

            // Restitution - walls bounce a little, the floor barely
            wall_restitution: 0.4,
            floor_restitution: 0.35,
            impact_softening: 0.12,
            collision_restitution: 0.7,

            // Settling
            settle_epsilon: 0.06,
            overlap_allowance: 0.5,
            wall_margin: 2.0,

            // Deformation
            squash_factor: 0.05,
            scale_response: 0.18,

            // Release - staggered so a burst of entries does not land at once
            release_base_delay: 0.3,
            release_stagger: 0.15,

            // Pre-simulation - generous budgets for the expected pile sizes
            settle_iterations: 900,
            insert_iterations: 300,

            // Population
            pearl_count: 12,
            blob_radius_min: 6.0,
            blob_radius_max: 9.0,
            pearl_radius_min: 3.0,
            pearl_radius_max: 10.0,

            // Spawn - live entries enter through a narrow mouth
            live_spawn_spread: 0.08,
            archive_spawn_spread: 0.38,
        }
    }
}

impl PhysicsSettings {
    /// Adjust gravity within bounds
    pub fn adjust_gravity(&mut self, delta: f32) {
        self.gravity = (self.gravity + delta).clamp(0.05, 0.6);
    }

    /// Adjust damping within bounds
    pub fn adjust_damping(&mut self, delta: f32) {
        self.damping = (self.damping + delta).clamp(0.9, 1.0);
    }

    /// Adjust wall restitution within bounds
    pub fn adjust_wall_restitution(&mut self, delta: f32) {
        self.wall_restitution = (self.wall_restitution + delta).clamp(0.0, 0.9);
    }

    /// Adjust floor restitution within bounds
    pub fn adjust_floor_restitution(&mut self, delta: f32) {
        self.floor_restitution = (self.floor_restitution + delta).clamp(0.0, 0.9);
    }

    /// Adjust pairwise collision restitution within bounds
    pub fn adjust_collision_restitution(&mut self, delta: f32) {
        self.collision_restitution = (self.collision_restitution + delta).clamp(0.0, 1.0);
    }

    /// Adjust squash factor within bounds
    pub fn adjust_squash_factor(&mut self, delta: f32) {
        self.squash_factor = (self.squash_factor + delta).clamp(0.0, 0.2);
    }

    /// Adjust release stagger within bounds
    pub fn adjust_release_stagger(&mut self, delta: f32) {
        self.release_stagger = (self.release_stagger + delta).clamp(0.05, 1.0);
    }

    /// Adjust pearl count within bounds
    pub fn adjust_pearl_count(&mut self, delta: i32) {
        self.pearl_count = (self.pearl_count as i32 + delta).clamp(0, 40) as usize;
    }

    /// Clamp every field to its documented range; used after config import
    /// so a hand-edited file cannot produce a degenerate simulation.
    pub fn clamp_all(&mut self) {
        self.gravity = self.gravity.clamp(0.05, 0.6);
        self.damping = self.damping.clamp(0.9, 1.0);
        self.floor_friction = self.floor_friction.clamp(0.5, 1.0);
        self.wall_restitution = self.wall_restitution.clamp(0.0, 0.9);
        self.floor_restitution = self.floor_restitution.clamp(0.0, 0.9);
        self.impact_softening = self.impact_softening.clamp(0.0, 0.5);
        self.collision_restitution = self.collision_restitution.clamp(0.0, 1.0);
        self.settle_epsilon = self.settle_epsilon.clamp(0.01, 0.5);
        self.overlap_allowance = self.overlap_allowance.clamp(0.0, 2.0);
        self.wall_margin = self.wall_margin.clamp(0.0, 6.0);
        self.squash_factor = self.squash_factor.clamp(0.0, 0.2);
        self.scale_response = self.scale_response.clamp(0.05, 0.5);
        self.release_base_delay = self.release_base_delay.clamp(0.0, 2.0);
        self.release_stagger = self.release_stagger.clamp(0.05, 1.0);
        self.settle_iterations = self.settle_iterations.clamp(100, 5000);
        self.insert_iterations = self.insert_iterations.clamp(50, 2000);
        self.pearl_count = self.pearl_count.min(40);
        self.blob_radius_min = self.blob_radius_min.clamp(2.0, 12.0);
        self.blob_radius_max = self.blob_radius_max.clamp(self.blob_radius_min, 14.0);
        self.pearl_radius_min = self.pearl_radius_min.clamp(1.0, 12.0);
        self.pearl_radius_max = self.pearl_radius_max.clamp(self.pearl_radius_min, 14.0);
        self.live_spawn_spread = self.live_spawn_spread.clamp(0.0, 0.3);
        self.archive_spawn_spread = self.archive_spawn_spread.clamp(0.0, 0.45);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjustments_clamp() {
        let mut s = PhysicsSettings::default();
        s.adjust_gravity(10.0);
        assert_eq!(s.gravity, 0.6);
        s.adjust_gravity(-10.0);
        assert_eq!(s.gravity, 0.05);
        s.adjust_damping(1.0);
        assert_eq!(s.damping, 1.0);
        s.adjust_pearl_count(-100);
        assert_eq!(s.pearl_count, 0);
    }

    #[test]
    fn test_clamp_all_repairs_degenerate_values() {
        let mut s = PhysicsSettings {
            gravity: 99.0,
            damping: 0.0,
            settle_iterations: 1,
            blob_radius_min: 50.0,
            blob_radius_max: 0.1,
            ..PhysicsSettings::default()
        };
        s.clamp_all();
        assert_eq!(s.gravity, 0.6);
        assert_eq!(s.damping, 0.9);
        assert_eq!(s.settle_iterations, 100);
        assert!(s.blob_radius_max >= s.blob_radius_min);
    }
}
