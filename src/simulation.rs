use crate::particle::{EntryDescriptor, Particle};
use crate::settings::PhysicsSettings;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Simulated time added per live-mode increment (the frame loop targets 60fps)
pub const FRAME_DT: f32 = 1.0 / 60.0;

/// Minimum center distance used when normalizing a collision contact
const MIN_SEPARATION: f32 = 1e-4;

/// How far above the container mouth live entries spawn (randomized extra)
const LIVE_DROP_HEADROOM: f32 = 36.0;

/// Which temporal behavior the store runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Entries fall in real time, driven by the redraw signal
    #[default]
    Live,
    /// Historical view: the pile is pre-simulated to rest, never stepped live
    Archive,
}

impl ViewMode {
    pub fn name(&self) -> &str {
        match self {
            ViewMode::Live => "LIVE",
            ViewMode::Archive => "ARCHIVE",
        }
    }
}

/// The particle store plus the reconciliation and stepping machinery.
///
/// One instance corresponds to one view instance (one day's container); a
/// different day or a container resize discards the whole store and builds a
/// fresh one. Within its lifetime particles are only ever added, never
/// removed.
pub struct PileSimulation {
    pub width: f32,
    pub height: f32,
    pub mode: ViewMode,
    pub settings: PhysicsSettings,
    /// Simulated time since store creation; drives staggered releases
    pub elapsed: f32,
    particles: Vec<Particle>,
    /// Set after the first archive reconciliation runs the full pre-build
    archive_built: bool,
    rng: StdRng,
}

impl PileSimulation {
    pub fn new(width: f32, height: f32, mode: ViewMode, settings: PhysicsSettings, seed: u64) -> Self {
        let mut sim = Self {
            width: width.max(1.0),
            height: height.max(1.0),
            mode,
            settings,
            elapsed: 0.0,
            particles: Vec::new(),
            archive_built: false,
            rng: StdRng::seed_from_u64(seed),
        };
        sim.spawn_pearls();
        sim
    }

    /// Decorative pearls are generated exactly once, at store init, and are
    /// never touched by reconciliation afterwards.
    fn spawn_pearls(&mut self) {
        let s = self.settings.clone();
        for i in 0..s.pearl_count {
            let r = self.rng.gen_range(s.pearl_radius_min..=s.pearl_radius_max);
            let (x, y) = match self.mode {
                ViewMode::Live => {
                    let x = self.spawn_x(r, 0.45);
                    let y = -(r + self.rng.gen_range(0.0..=self.height * 0.5));
                    (x, y)
                }
                ViewMode::Archive => self.archive_spawn_point(r),
            };
            self.particles.push(Particle::pearl(i, x, y, r));
        }
    }

    /// Random horizontal spawn position around the container center,
    /// spread given as a fraction of width, clamped inside the walls.
    fn spawn_x(&mut self, r: f32, spread_frac: f32) -> f32 {
        let spread = self.width * spread_frac;
        let x = self.width * 0.5 + self.rng.gen_range(-spread..=spread);
        let min_x = r + self.settings.wall_margin;
        let max_x = (self.width - r - self.settings.wall_margin).max(min_x);
        x.clamp(min_x, max_x)
    }

    /// Archive spawns drop particles partway down the container so the
    /// bounded pre-simulation reaches the floor quickly.
    fn archive_spawn_point(&mut self, r: f32) -> (f32, f32) {
        let spread = self.settings.archive_spawn_spread;
        let x = self.spawn_x(r, spread);
        let y = self.rng.gen_range(self.height * 0.25..=self.height * 0.6);
        (x, y)
    }

    // === Reconciler ===

    /// Merge an externally supplied descriptor list into the store.
    ///
    /// Existing particles keep their physical state and receive fresh
    /// metadata; unmatched descriptors spawn new particles with mode-specific
    /// spawn parameters. Returns the ids of newly created particles (used by
    /// the host for the cosmetic "recently added" overlay).
    ///
    /// Idempotent with respect to physical state: reconciling the same list
    /// twice never regenerates spawn positions for matched particles.
    pub fn reconcile(&mut self, descriptors: &[EntryDescriptor]) -> Vec<String> {
        let mut claimed = vec![false; self.particles.len()];
        let mut matched: Vec<Option<usize>> = vec![None; descriptors.len()];

        // Exact ids bind first, across the whole pool, so a note-matching
        // placeholder earlier in the store can never steal a descriptor
        // whose own particle sits later.
        for (d, desc) in descriptors.iter().enumerate() {
            if let Some(i) = (0..self.particles.len())
                .find(|&i| !claimed[i] && self.particles[i].matches_id(desc))
            {
                claimed[i] = true;
                matched[d] = Some(i);
            }
        }
        // Remaining descriptors fall back to note matching against the
        // still-unclaimed optimistic placeholders.
        for (d, desc) in descriptors.iter().enumerate() {
            if matched[d].is_some() {
                continue;
            }
            if let Some(i) = (0..self.particles.len())
                .find(|&i| !claimed[i] && self.particles[i].matches_note(desc))
            {
                claimed[i] = true;
                matched[d] = Some(i);
            }
        }

        let mut created_ids = Vec::new();
        let mut created_idx = Vec::new();
        let mut new_in_pass = 0usize;

        for (d, desc) in descriptors.iter().enumerate() {
            match matched[d] {
                Some(i) => self.particles[i].carry_forward(desc),
                None => {
                    let p = self.spawn_blob(desc, new_in_pass);
                    new_in_pass += 1;
                    created_ids.push(p.id.clone());
                    created_idx.push(self.particles.len());
                    self.particles.push(p);
                }
            }
        }

        if self.mode == ViewMode::Archive {
            if !self.archive_built {
                // First assembly of this archive: settle everything at once.
                self.presettle_all();
                self.archive_built = true;
            } else if !created_idx.is_empty() {
                self.presettle_new(&created_idx);
            }
        }

        created_ids
    }

    fn spawn_blob(&mut self, desc: &EntryDescriptor, index_in_pass: usize) -> Particle {
        let s = self.settings.clone();
        let r = self.rng.gen_range(s.blob_radius_min..=s.blob_radius_max);
        match self.mode {
            ViewMode::Live => {
                // Enter through the narrow mouth, off-screen, on a stagger.
                let x = self.spawn_x(r, s.live_spawn_spread);
                let y = -(r + self.rng.gen_range(0.0..=LIVE_DROP_HEADROOM));
                let mut p = Particle::blob(desc, x, y, r);
                p.release_at =
                    self.elapsed + s.release_base_delay + index_in_pass as f32 * s.release_stagger;
                p
            }
            ViewMode::Archive => {
                let (x, y) = self.archive_spawn_point(r);
                let mut p = Particle::blob(desc, x, y, r);
                p.active = true;
                p
            }
        }
    }

    // === Physics Stepper ===

    /// Advance one live increment. Invoked once per redraw signal; never
    /// called in archive mode.
    pub fn step(&mut self) {
        self.elapsed += FRAME_DT;
        self.integrate_once();
    }

    /// One full pass of the per-increment rules: activation, integration,
    /// boundary response, pairwise collisions, damping, containment, and
    /// finally settle detection on the increment's final positions.
    fn integrate_once(&mut self) {
        let s = self.settings.clone();
        let (width, height) = (self.width, self.height);
        let elapsed = self.elapsed;

        for p in &mut self.particles {
            if !p.active && elapsed >= p.release_at {
                p.active = true;
            }
            if !p.active || p.settled {
                continue;
            }

            // Semi-implicit Euler
            p.vy += s.gravity;
            p.x += p.vx;
            p.y += p.vy;

            // Walls
            let min_x = p.r + s.wall_margin;
            let max_x = (width - p.r - s.wall_margin).max(min_x);
            if p.x < min_x {
                p.x = min_x;
                p.vx = -p.vx * s.wall_restitution;
            } else if p.x > max_x {
                p.x = max_x;
                p.vx = -p.vx * s.wall_restitution;
            }

            // Floor
            let floor = height - p.r - s.wall_margin;
            if p.y >= floor {
                let impact = p.vy.max(0.0);
                p.y = floor;
                p.vx *= s.floor_friction;

                // Fast impacts lose more energy; tiny rebounds are dropped
                // entirely so contact can come to rest.
                let bounce = impact * (s.floor_restitution / (1.0 + impact * s.impact_softening));
                p.vy = if bounce > s.settle_epsilon + s.gravity {
                    -bounce
                } else {
                    0.0
                };

                let squash = (impact * s.squash_factor).min(0.45);
                p.tsx = 1.0 + squash;
                p.tsy = 1.0 - squash;
            }
        }

        self.resolve_collisions();

        // Global damping and deformation easing
        for p in &mut self.particles {
            if p.active && !p.settled {
                p.vx *= s.damping;
                p.vy *= s.damping;
            }
            p.sx += (p.tsx - p.sx) * s.scale_response;
            p.sy += (p.tsy - p.sy) * s.scale_response;
        }

        self.contain();
        self.settle_pass();
    }

    /// Settle detection, run after collision resolution so positions are
    /// final for the increment. A floor-contacting particle whose velocity
    /// has dropped under the epsilon comes to rest, but never while it still
    /// interpenetrates a neighbor beyond the overlap allowance: settled
    /// particles are immovable, so freezing an overlapping pair would lock
    /// the overlap in permanently.
    fn settle_pass(&mut self) {
        let eps = self.settings.settle_epsilon;
        let allow = self.settings.overlap_allowance;
        let margin = self.settings.wall_margin;
        let height = self.height;

        for i in 0..self.particles.len() {
            let p = &self.particles[i];
            if !p.active || p.settled || p.vx.abs() >= eps || p.vy.abs() >= eps {
                continue;
            }
            if p.y < height - p.r - margin - 1e-3 {
                continue;
            }
            let overlapping = self.particles.iter().enumerate().any(|(j, q)| {
                if j == i || !q.active {
                    return false;
                }
                let dx = q.x - p.x;
                let dy = q.y - p.y;
                let min_dist = p.r + q.r - allow;
                dx * dx + dy * dy < min_dist * min_dist
            });
            if overlapping {
                continue;
            }
            let p = &mut self.particles[i];
            p.vx = 0.0;
            p.vy = 0.0;
            p.settled = true;
            p.tsx = 1.0;
            p.tsy = 1.0;
        }
    }

    /// Pairwise collision resolution, each unordered pair considered once.
    ///
    /// Settled particles are immovable: when one side of a pair is settled
    /// the full positional correction and the full impulse go to the mover.
    /// This is what lets already-settled archive particles act as static
    /// obstacles during incremental insertion. Settled-settled pairs are
    /// skipped outright: a particle never settles while overlapping and
    /// settled positions are never written, so no such pair can
    /// interpenetrate.
    fn resolve_collisions(&mut self) {
        let allow = self.settings.overlap_allowance;
        let rest = self.settings.collision_restitution;
        let n = self.particles.len();

        for i in 0..n {
            for j in (i + 1)..n {
                let (head, tail) = self.particles.split_at_mut(j);
                let a = &mut head[i];
                let b = &mut tail[0];

                if !a.active || !b.active {
                    continue;
                }
                if a.settled && b.settled {
                    continue;
                }

                let dx = b.x - a.x;
                let dy = b.y - a.y;
                let min_dist = a.r + b.r - allow;
                let dist_sq = dx * dx + dy * dy;
                if dist_sq >= min_dist * min_dist {
                    continue;
                }

                // Clamp degenerate separations before normalizing
                let dist = dist_sq.sqrt().max(MIN_SEPARATION);
                let nx = dx / dist;
                let ny = dy / dist;
                let overlap = min_dist - dist;

                // Impulse only when the pair is converging
                let rel_vn = (b.vx - a.vx) * nx + (b.vy - a.vy) * ny;
                let imp = if rel_vn < 0.0 { -rel_vn * rest } else { 0.0 };

                if a.settled {
                    b.x += nx * overlap;
                    b.y += ny * overlap;
                    b.vx += nx * imp;
                    b.vy += ny * imp;
                } else if b.settled {
                    a.x -= nx * overlap;
                    a.y -= ny * overlap;
                    a.vx -= nx * imp;
                    a.vy -= ny * imp;
                } else {
                    let half = overlap * 0.5;
                    a.x -= nx * half;
                    a.y -= ny * half;
                    b.x += nx * half;
                    b.y += ny * half;

                    let half_imp = imp * 0.5;
                    a.vx -= nx * half_imp;
                    a.vy -= ny * half_imp;
                    b.vx += nx * half_imp;
                    b.vy += ny * half_imp;
                }
            }
        }
    }

    /// Post-collision containment: positional corrections may not push a
    /// particle through a wall or the floor.
    fn contain(&mut self) {
        let m = self.settings.wall_margin;
        let (w, h) = (self.width, self.height);
        for p in &mut self.particles {
            if !p.active || p.settled {
                continue;
            }
            let min_x = p.r + m;
            let max_x = (w - p.r - m).max(min_x);
            p.x = p.x.clamp(min_x, max_x);
            let floor = h - p.r - m;
            if p.y > floor {
                p.y = floor;
            }
        }
    }

    // === Pre-Simulator ===

    /// Full archive build: everything starts active, the same per-increment
    /// rules run for a fixed budget, then the whole pile is forced to rest.
    /// Bounded-time approximation: visual plausibility over exactness.
    fn presettle_all(&mut self) {
        for p in &mut self.particles {
            p.active = true;
            p.release_at = 0.0;
        }
        for _ in 0..self.settings.settle_iterations {
            self.integrate_once();
        }
        for p in &mut self.particles {
            Self::force_rest(p);
        }
    }

    /// Incremental archive insertion: only the new particles move; the
    /// settled pile reads as static obstacles and is never disturbed.
    fn presettle_new(&mut self, new_idx: &[usize]) {
        for _ in 0..self.settings.insert_iterations {
            self.integrate_once();
        }
        for &i in new_idx {
            if let Some(p) = self.particles.get_mut(i) {
                Self::force_rest(p);
            }
        }
    }

    fn force_rest(p: &mut Particle) {
        p.vx = 0.0;
        p.vy = 0.0;
        p.settled = true;
        p.sx = 1.0;
        p.sy = 1.0;
        p.tsx = 1.0;
        p.tsy = 1.0;
    }

    // === Snapshot accessors ===

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Non-decorative particles only
    pub fn blobs(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(|p| !p.pearl)
    }

    pub fn find_blob(&self, id: &str) -> Option<&Particle> {
        self.blobs().find(|p| p.id == id)
    }

    pub fn blob_count(&self) -> usize {
        self.blobs().count()
    }

    pub fn settled_count(&self) -> usize {
        self.particles.iter().filter(|p| p.settled).count()
    }

    /// Floor line for a particle of radius `r`
    pub fn floor_y(&self, r: f32) -> f32 {
        self.height - r - self.settings.wall_margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptors(n: usize) -> Vec<EntryDescriptor> {
        (0..n)
            .map(|i| EntryDescriptor::new(format!("entry-{i}"), format!("note {i}")))
            .collect()
    }

    fn live_sim() -> PileSimulation {
        PileSimulation::new(160.0, 120.0, ViewMode::Live, PhysicsSettings::default(), 42)
    }

    fn archive_sim() -> PileSimulation {
        PileSimulation::new(160.0, 120.0, ViewMode::Archive, PhysicsSettings::default(), 42)
    }

    fn no_pearls() -> PhysicsSettings {
        PhysicsSettings {
            pearl_count: 0,
            ..PhysicsSettings::default()
        }
    }

    #[test]
    fn test_pearls_created_once_and_untouched() {
        let mut sim = live_sim();
        let pearls_before: Vec<(String, f32)> = sim
            .particles()
            .iter()
            .filter(|p| p.pearl)
            .map(|p| (p.id.clone(), p.r))
            .collect();
        assert_eq!(pearls_before.len(), sim.settings.pearl_count);

        sim.reconcile(&descriptors(4));
        let pearls_after: Vec<(String, f32)> = sim
            .particles()
            .iter()
            .filter(|p| p.pearl)
            .map(|p| (p.id.clone(), p.r))
            .collect();
        assert_eq!(pearls_before, pearls_after);
    }

    #[test]
    fn test_stagger_ordering() {
        let mut sim = live_sim();
        sim.reconcile(&descriptors(3));

        let releases: Vec<f32> = sim.blobs().map(|p| p.release_at).collect();
        assert_eq!(releases.len(), 3);
        let stagger = sim.settings.release_stagger;
        for pair in releases.windows(2) {
            assert!(
                pair[1] - pair[0] >= stagger - 1e-6,
                "releases must increase by at least the stagger: {pair:?}"
            );
        }
    }

    #[test]
    fn test_empty_to_first_drop_scenario() {
        let mut sim =
            PileSimulation::new(160.0, 120.0, ViewMode::Live, no_pearls(), 7);
        sim.reconcile(&[EntryDescriptor::new("entry-0", "first entry")]);

        let p = sim.find_blob("entry-0").unwrap();
        assert!(!p.active);
        assert!((p.release_at - sim.settings.release_base_delay).abs() < 1e-6);
        assert!(p.y < 0.0, "live spawns start above the container");

        // Step past the release time: the particle must activate.
        let release = sim.find_blob("entry-0").unwrap().release_at;
        while sim.elapsed < release + FRAME_DT {
            sim.step();
        }
        assert!(sim.find_blob("entry-0").unwrap().active);

        // And eventually settle on the floor with zero velocity.
        for _ in 0..5000 {
            if sim.find_blob("entry-0").unwrap().settled {
                break;
            }
            sim.step();
        }
        let p = sim.find_blob("entry-0").unwrap();
        assert!(p.settled, "particle should settle within the step budget");
        assert_eq!((p.vx, p.vy), (0.0, 0.0));
        assert!((p.y - sim.floor_y(p.r)).abs() < 1e-3);
    }

    #[test]
    fn test_settling_idempotence() {
        let mut sim =
            PileSimulation::new(160.0, 120.0, ViewMode::Live, no_pearls(), 7);
        sim.reconcile(&[EntryDescriptor::new("entry-0", "first entry")]);
        for _ in 0..5000 {
            if sim.find_blob("entry-0").unwrap().settled {
                break;
            }
            sim.step();
        }
        let settled = sim.find_blob("entry-0").unwrap().clone();
        assert!(settled.settled);

        for _ in 0..200 {
            sim.step();
            let p = sim.find_blob("entry-0").unwrap();
            assert_eq!((p.vx, p.vy), (0.0, 0.0));
            assert_eq!((p.x, p.y), (settled.x, settled.y));
            assert!(p.settled);
        }
    }

    #[test]
    fn test_containment() {
        let mut sim = live_sim();
        sim.reconcile(&descriptors(8));
        for step in 0..2500 {
            sim.step();
            if step % 50 != 0 {
                continue;
            }
            let m = sim.settings.wall_margin;
            for p in sim.particles() {
                if !p.active {
                    continue;
                }
                assert!(p.x >= p.r + m - 1e-3, "left wall breached at step {step}");
                assert!(p.x <= sim.width - p.r - m + 1e-3, "right wall breached at step {step}");
                assert!(p.y <= sim.floor_y(p.r) + 1e-3, "floor breached at step {step}");
            }
        }
    }

    #[test]
    fn test_reconciliation_idempotence() {
        let mut sim = live_sim();
        let descs = descriptors(5);
        sim.reconcile(&descs);
        for _ in 0..300 {
            sim.step();
        }

        let before: Vec<(String, f32, f32, f32, f32, bool)> = sim
            .blobs()
            .map(|p| (p.id.clone(), p.x, p.y, p.vx, p.vy, p.settled))
            .collect();

        let created = sim.reconcile(&descs);
        assert!(created.is_empty());

        let after: Vec<(String, f32, f32, f32, f32, bool)> = sim
            .blobs()
            .map(|p| (p.id.clone(), p.x, p.y, p.vx, p.vy, p.settled))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_archive_full_build_settles_everything() {
        let mut sim = archive_sim();
        sim.reconcile(&descriptors(6));

        for p in sim.particles() {
            assert!(p.active);
            assert!(p.settled);
            assert_eq!((p.vx, p.vy), (0.0, 0.0));
            assert!(p.y <= sim.floor_y(p.r) + 1e-3);
        }
    }

    #[test]
    fn test_non_penetration_at_rest() {
        let mut sim = PileSimulation::new(
            160.0,
            120.0,
            ViewMode::Archive,
            PhysicsSettings {
                pearl_count: 4,
                ..PhysicsSettings::default()
            },
            11,
        );
        sim.reconcile(&descriptors(6));

        let allow = sim.settings.overlap_allowance;
        let ps = sim.particles();
        for i in 0..ps.len() {
            for j in (i + 1)..ps.len() {
                let (a, b) = (&ps[i], &ps[j]);
                let dist = ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt();
                assert!(
                    dist >= a.r + b.r - allow - 0.05,
                    "settled pair {i}/{j} overlaps: dist={dist} radii={}+{}",
                    a.r,
                    b.r
                );
            }
        }
    }

    #[test]
    fn test_archive_insertion_stability() {
        let mut sim = PileSimulation::new(160.0, 120.0, ViewMode::Archive, no_pearls(), 3);
        let mut descs = descriptors(5);
        sim.reconcile(&descs);

        let prior: Vec<(String, f32, f32)> =
            sim.blobs().map(|p| (p.id.clone(), p.x, p.y)).collect();

        descs.push(EntryDescriptor::new("entry-5", "late arrival"));
        sim.reconcile(&descs);

        // The settled five are numerically untouched.
        for (id, x, y) in &prior {
            let p = sim.find_blob(id).unwrap();
            assert_eq!((p.x, p.y), (*x, *y), "prior particle {id} moved");
            assert!(p.settled);
        }

        // The newcomer is settled, contained, and not overlapping the pile.
        let new = sim.find_blob("entry-5").unwrap();
        assert!(new.settled);
        assert!(new.y <= sim.floor_y(new.r) + 1e-3);
        let allow = sim.settings.overlap_allowance;
        for (id, x, y) in &prior {
            let old = sim.find_blob(id).unwrap();
            let dist = ((new.x - x).powi(2) + (new.y - y).powi(2)).sqrt();
            assert!(
                dist >= new.r + old.r - allow - 0.05,
                "new particle overlaps settled {id}"
            );
        }
    }

    #[test]
    fn test_optimistic_to_confirmed_transition() {
        let mut sim = PileSimulation::new(160.0, 120.0, ViewMode::Live, no_pearls(), 9);
        let optimistic = EntryDescriptor {
            optimistic: true,
            ..EntryDescriptor::new("local-1", "feeling tired")
        };
        sim.reconcile(&[optimistic]);
        for _ in 0..120 {
            sim.step();
        }
        let before = sim.find_blob("local-1").unwrap().clone();

        // Server confirms with a different id but the same note text.
        let confirmed = EntryDescriptor::new("entry-9", " Feeling Tired ");
        let created = sim.reconcile(&[confirmed]);
        assert!(created.is_empty(), "the optimistic particle must be reused");

        assert_eq!(sim.blob_count(), 1);
        let p = sim.find_blob("entry-9").unwrap();
        assert!(!p.optimistic);
        assert_eq!((p.x, p.y), (before.x, before.y));
        assert_eq!((p.vx, p.vy), (before.vx, before.vy));
    }

    #[test]
    fn test_optimistic_survives_intervening_reconcile() {
        let mut sim = PileSimulation::new(160.0, 120.0, ViewMode::Live, no_pearls(), 9);
        let first = EntryDescriptor {
            optimistic: true,
            ..EntryDescriptor::new("local-0", "quiet morning")
        };
        sim.reconcile(&[first.clone()]);

        // A second provisional entry arrives while the first is still
        // unconfirmed; re-reconciling must not confirm the first early.
        let second = EntryDescriptor {
            optimistic: true,
            ..EntryDescriptor::new("local-1", "lunch outside")
        };
        sim.reconcile(&[first.clone(), second.clone()]);
        assert!(sim.find_blob("local-0").unwrap().optimistic);

        // The server confirms the first under its real id; the particle is
        // reused via note matching rather than duplicated.
        let confirmed = EntryDescriptor::new("entry-0", "quiet morning");
        let created = sim.reconcile(&[confirmed, second]);
        assert!(created.is_empty(), "confirmation must reuse the particle: {created:?}");
        assert_eq!(sim.blob_count(), 2);
        assert!(!sim.find_blob("entry-0").unwrap().optimistic);
        assert!(sim.find_blob("local-0").is_none());
    }

    #[test]
    fn test_exact_id_wins_over_note_match() {
        let mut sim = PileSimulation::new(160.0, 120.0, ViewMode::Live, no_pearls(), 21);
        let placeholder = EntryDescriptor {
            optimistic: true,
            ..EntryDescriptor::new("local-0", "same note")
        };
        let twin = EntryDescriptor::new("entry-7", "same note");
        sim.reconcile(&[placeholder.clone(), twin.clone()]);
        assert_eq!(sim.blob_count(), 2);

        // With the twin listed first, its own particle sits later in the
        // store than the note-matching placeholder; the id must still bind.
        let created = sim.reconcile(&[twin.clone(), placeholder.clone()]);
        assert!(created.is_empty());
        assert_eq!(sim.blob_count(), 2);
        assert!(sim.find_blob("local-0").unwrap().optimistic);

        // And the placeholder still content-matches its own confirmation.
        let confirmed = EntryDescriptor::new("entry-8", "Same Note ");
        let created = sim.reconcile(&[twin, confirmed]);
        assert!(created.is_empty());
        assert_eq!(sim.blob_count(), 2);
        assert!(!sim.find_blob("entry-8").unwrap().optimistic);
    }

    #[test]
    fn test_crowded_archive_never_locks_overlap() {
        let mut sim = PileSimulation::new(
            120.0,
            140.0,
            ViewMode::Archive,
            PhysicsSettings {
                pearl_count: 8,
                ..PhysicsSettings::default()
            },
            11,
        );
        sim.reconcile(&descriptors(10));

        let allow = sim.settings.overlap_allowance;
        let ps = sim.particles();
        for i in 0..ps.len() {
            for j in (i + 1)..ps.len() {
                let (a, b) = (&ps[i], &ps[j]);
                let dist = ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt();
                assert!(
                    dist >= a.r + b.r - allow - 0.05,
                    "pair {i}/{j} locked overlapping: dist={dist} radii={}+{}",
                    a.r,
                    b.r
                );
            }
        }
    }

    #[test]
    fn test_malformed_descriptor_still_produces_particle() {
        let mut sim = PileSimulation::new(160.0, 120.0, ViewMode::Live, no_pearls(), 5);
        let malformed = EntryDescriptor {
            id: String::new(),
            ..EntryDescriptor::new("", "no id on this one")
        };
        sim.reconcile(&[malformed]);
        assert_eq!(sim.blob_count(), 1, "visible count stays consistent");
    }

    #[test]
    fn test_activation_is_monotonic() {
        let mut sim = PileSimulation::new(160.0, 120.0, ViewMode::Live, no_pearls(), 13);
        sim.reconcile(&descriptors(3));
        let mut seen_active: Vec<String> = Vec::new();
        for _ in 0..600 {
            sim.step();
            for p in sim.blobs() {
                if seen_active.iter().any(|id| id == &p.id) {
                    assert!(p.active, "activation must never revert");
                } else if p.active {
                    seen_active.push(p.id.clone());
                }
            }
        }
        assert_eq!(seen_active.len(), 3);
    }
}
