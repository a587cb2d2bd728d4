use crate::attention::AttentionScheduler;
use crate::braille;
use crate::config::AppConfig;
use crate::feed::EntryFeed;
use crate::particle::Particle;
use crate::presets::{Preset, PresetManager};
use crate::simulation::{PileSimulation, ViewMode, FRAME_DT};
use std::collections::HashSet;
use std::path::Path;

/// Seconds a newly added particle keeps its ripple color
const RECENT_FLASH_SECS: f32 = 1.5;

/// Focus state for parameter editing in the sidebar
/// Alphabetically ordered for consistent UI display
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Focus {
    #[default]
    None,
    // Alphabetical order
    Collision,
    Damping,
    FloorBounce,
    Gravity,
    Speed,
    Squash,
    Stagger,
    WallBounce,
    // Controls box (not a param)
    Controls,
}

impl Focus {
    /// Tab cycles through parameters in alphabetical order
    pub fn next(&self) -> Focus {
        match self {
            Focus::None | Focus::Controls => Focus::Collision,
            Focus::Collision => Focus::Damping,
            Focus::Damping => Focus::FloorBounce,
            Focus::FloorBounce => Focus::Gravity,
            Focus::Gravity => Focus::Speed,
            Focus::Speed => Focus::Squash,
            Focus::Squash => Focus::Stagger,
            Focus::Stagger => Focus::WallBounce,
            Focus::WallBounce => Focus::Collision, // Loop back
        }
    }

    /// Shift+Tab cycles in reverse
    pub fn prev(&self) -> Focus {
        match self {
            Focus::None | Focus::Controls => Focus::WallBounce,
            Focus::Collision => Focus::WallBounce, // Loop back
            Focus::Damping => Focus::Collision,
            Focus::FloorBounce => Focus::Damping,
            Focus::Gravity => Focus::FloorBounce,
            Focus::Speed => Focus::Gravity,
            Focus::Squash => Focus::Speed,
            Focus::Stagger => Focus::Squash,
            Focus::WallBounce => Focus::Stagger,
        }
    }

    /// Line index in the parameters box (alphabetical order)
    pub fn line_index(&self) -> u16 {
        match self {
            Focus::None | Focus::Controls => 0,
            Focus::Collision => 0,
            Focus::Damping => 1,
            Focus::FloorBounce => 2,
            Focus::Gravity => 3,
            Focus::Speed => 4,
            Focus::Squash => 5,
            Focus::Stagger => 6,
            Focus::WallBounce => 7,
        }
    }

    /// Check if focus is on a parameter (not Controls or None)
    pub fn is_param(&self) -> bool {
        !matches!(self, Focus::None | Focus::Controls)
    }
}

/// Main application state: the simulation core plus its collaborators
/// (feed, attention scheduler, selection, cosmetic overlays, chrome).
pub struct App {
    pub sim: PileSimulation,
    pub feed: EntryFeed,
    pub attention: AttentionScheduler,
    pub presets: PresetManager,
    pub focus: Focus,
    pub paused: bool,
    pub show_help: bool,
    pub help_scroll: u16,
    pub controls_scroll: u16,
    pub steps_per_frame: usize,
    /// Id of the user-selected entry particle
    pub selected: Option<String>,
    /// Cosmetic ripple overlay of recently added ids; never read by the core
    pub recent: HashSet<String>,
    recent_expiry: Vec<(String, f32)>,
    /// Archive chrome only; the core holds particles frozen regardless
    pub sealed: bool,
    /// Transient sidebar message (preset applied, config exported, ...)
    pub status: Option<String>,
    drip: f32,
    attention_interval: f32,
    attention_hold: f32,
    /// Upstream feed time. Advances in both views and survives rebuilds, so
    /// an archive keeps receiving later reveals as incremental insertions.
    feed_clock: f32,
    seed: u64,
    /// Bumped on every rebuild so each view instance gets a fresh rng stream
    view_serial: u64,
    feed_revision: usize,
}

impl App {
    pub fn new(
        canvas_width: u16,
        canvas_height: u16,
        mode: ViewMode,
        config: AppConfig,
        feed: EntryFeed,
        seed: u64,
    ) -> Self {
        let (width, height) = braille::calculate_container_size(canvas_width, canvas_height);
        let mut app = Self {
            sim: PileSimulation::new(width, height, mode, config.settings, seed),
            feed,
            attention: AttentionScheduler::new(
                config.attention_interval,
                config.attention_hold,
                seed,
            ),
            presets: PresetManager::new(),
            focus: Focus::Controls,
            paused: false,
            show_help: false,
            help_scroll: 0,
            controls_scroll: 0,
            steps_per_frame: config.steps_per_frame.clamp(1, 10),
            selected: None,
            recent: HashSet::new(),
            recent_expiry: Vec::new(),
            sealed: mode == ViewMode::Archive,
            status: None,
            drip: config.drip,
            attention_interval: config.attention_interval,
            attention_hold: config.attention_hold,
            feed_clock: 0.0,
            seed,
            view_serial: 0,
            feed_revision: usize::MAX,
        };
        app.sync_feed();
        app
    }

    /// Run one frame: advance the feed clock, step the live simulation, then
    /// pull any feed changes through the reconciler. The stepper never runs
    /// in archive mode, but the feed does: reveals that arrive after the
    /// archive was built land as pre-settled incremental insertions.
    pub fn tick(&mut self) {
        if self.paused {
            return;
        }
        self.feed_clock += FRAME_DT;
        if self.sim.mode == ViewMode::Live {
            for _ in 0..self.steps_per_frame {
                self.sim.step();
            }
            self.attention.tick(self.sim.elapsed, self.sim.particles());
        }
        self.sync_feed();
        self.expire_recent();
    }

    /// Re-reconcile when the upstream descriptor list changed.
    fn sync_feed(&mut self) {
        let now = self.feed_clock;
        let revision = self.feed.revision(now);
        if revision == self.feed_revision {
            return;
        }
        self.feed_revision = revision;
        let created = self.sim.reconcile(&self.feed.visible(now));
        for id in created {
            self.recent.insert(id.clone());
            self.recent_expiry.push((id, now + RECENT_FLASH_SECS));
        }
    }

    fn expire_recent(&mut self) {
        let now = self.feed_clock;
        let recent = &mut self.recent;
        self.recent_expiry.retain(|(id, until)| {
            if now >= *until {
                recent.remove(id);
                false
            } else {
                true
            }
        });
    }

    /// Discard and rebuild the whole store for a new view instance.
    pub fn rebuild(&mut self, mode: ViewMode, canvas_width: u16, canvas_height: u16) {
        self.view_serial += 1;
        let (width, height) = braille::calculate_container_size(canvas_width, canvas_height);
        let settings = self.sim.settings.clone();
        self.sim = PileSimulation::new(
            width,
            height,
            mode,
            settings,
            self.seed ^ self.view_serial,
        );
        self.attention = AttentionScheduler::new(
            self.attention_interval,
            self.attention_hold,
            self.seed.wrapping_add(self.view_serial),
        );
        self.selected = None;
        self.recent.clear();
        self.recent_expiry.clear();
        self.feed_revision = usize::MAX;
        self.sealed = mode == ViewMode::Archive;
        self.paused = false;
        // Everything revealed so far forms the initial build; in archive
        // mode that first reconciliation pre-settles the whole pile.
        self.sync_feed();
    }

    /// Switch between the live fall and the settled archive view
    pub fn toggle_mode(&mut self, canvas_width: u16, canvas_height: u16) {
        let mode = match self.sim.mode {
            ViewMode::Live => ViewMode::Archive,
            ViewMode::Archive => ViewMode::Live,
        };
        self.rebuild(mode, canvas_width, canvas_height);
    }

    /// Rebuild the current view instance from scratch
    pub fn reset(&mut self, canvas_width: u16, canvas_height: u16) {
        self.rebuild(self.sim.mode, canvas_width, canvas_height);
    }

    /// Resize remounts the container, which is a new view instance too
    pub fn resize(&mut self, canvas_width: u16, canvas_height: u16) {
        self.rebuild(self.sim.mode, canvas_width, canvas_height);
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Archive chrome: flips the seal banner only, physics stays frozen
    pub fn toggle_seal(&mut self) {
        if self.sim.mode == ViewMode::Archive {
            self.sealed = !self.sealed;
        }
    }

    // === Selection ===

    fn blob_ids(&self) -> Vec<String> {
        self.sim.blobs().map(|p| p.id.clone()).collect()
    }

    pub fn select_next(&mut self) {
        let ids = self.blob_ids();
        if ids.is_empty() {
            return;
        }
        let next = match self.selected.as_ref().and_then(|s| ids.iter().position(|i| i == s)) {
            Some(i) => (i + 1) % ids.len(),
            None => 0,
        };
        self.selected = Some(ids[next].clone());
    }

    pub fn select_prev(&mut self) {
        let ids = self.blob_ids();
        if ids.is_empty() {
            return;
        }
        let prev = match self.selected.as_ref().and_then(|s| ids.iter().position(|i| i == s)) {
            Some(0) | None => ids.len() - 1,
            Some(i) => i - 1,
        };
        self.selected = Some(ids[prev].clone());
    }

    /// The full record of the selected particle (the selection event payload)
    pub fn selected_particle(&self) -> Option<&Particle> {
        self.selected.as_deref().and_then(|id| self.sim.find_blob(id))
    }

    // === Parameter editing ===

    pub fn next_focus(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn prev_focus(&mut self) {
        self.focus = self.focus.prev();
    }

    pub fn adjust_focused_up(&mut self) {
        match self.focus {
            Focus::None | Focus::Controls => {}
            Focus::Collision => self.sim.settings.adjust_collision_restitution(0.05),
            Focus::Damping => self.sim.settings.adjust_damping(0.005),
            Focus::FloorBounce => self.sim.settings.adjust_floor_restitution(0.05),
            Focus::Gravity => self.sim.settings.adjust_gravity(0.02),
            Focus::Speed => self.steps_per_frame = (self.steps_per_frame + 1).min(10),
            Focus::Squash => self.sim.settings.adjust_squash_factor(0.01),
            Focus::Stagger => self.sim.settings.adjust_release_stagger(0.05),
            Focus::WallBounce => self.sim.settings.adjust_wall_restitution(0.05),
        }
    }

    pub fn adjust_focused_down(&mut self) {
        match self.focus {
            Focus::None | Focus::Controls => {}
            Focus::Collision => self.sim.settings.adjust_collision_restitution(-0.05),
            Focus::Damping => self.sim.settings.adjust_damping(-0.005),
            Focus::FloorBounce => self.sim.settings.adjust_floor_restitution(-0.05),
            Focus::Gravity => self.sim.settings.adjust_gravity(-0.02),
            Focus::Speed => self.steps_per_frame = self.steps_per_frame.saturating_sub(1).max(1),
            Focus::Squash => self.sim.settings.adjust_squash_factor(-0.01),
            Focus::Stagger => self.sim.settings.adjust_release_stagger(-0.05),
            Focus::WallBounce => self.sim.settings.adjust_wall_restitution(-0.05),
        }
    }

    /// Apply the next physics preset in the cycle
    pub fn cycle_preset(&mut self) {
        if let Some(preset) = self.presets.next_after(&self.sim.settings) {
            self.sim.settings = preset.settings.clone();
            self.status = Some(format!("Preset: {}", preset.name));
        }
    }

    /// Persist the current tuning as a user preset in the config directory
    pub fn save_current_preset(&mut self) {
        let preset = Preset::new(
            "Custom",
            "Saved from a live session",
            self.sim.settings.clone(),
        );
        self.status = Some(match self.presets.save_preset(preset) {
            Ok(()) => "Saved preset: Custom".to_string(),
            Err(e) => e,
        });
    }

    /// Export the current tunable state next to the working directory
    pub fn export_config(&mut self) {
        let config = AppConfig {
            version: 1,
            settings: self.sim.settings.clone(),
            drip: self.drip,
            steps_per_frame: self.steps_per_frame,
            attention_interval: self.attention_interval,
            attention_hold: self.attention_hold,
        };
        let path = Path::new("pile-config.json");
        self.status = Some(match config.save_to_file(path) {
            Ok(()) => format!("Exported {}", path.display()),
            Err(e) => e,
        });
    }

    // === Help overlay ===

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.help_scroll = 0; // Reset scroll when opening
        }
    }

    pub fn scroll_help_up(&mut self) {
        self.help_scroll = self.help_scroll.saturating_sub(1);
    }

    pub fn scroll_help_down(&mut self, max_scroll: u16) {
        self.help_scroll = (self.help_scroll + 1).min(max_scroll);
    }

    pub fn scroll_controls_up(&mut self) {
        self.controls_scroll = self.controls_scroll.saturating_sub(1);
    }

    pub fn scroll_controls_down(&mut self, max_scroll: u16) {
        self.controls_scroll = (self.controls_scroll + 1).min(max_scroll);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live_app() -> App {
        App::new(
            40,
            24,
            ViewMode::Live,
            AppConfig::default(),
            EntryFeed::demo(1.0),
            21,
        )
    }

    #[test]
    fn test_feed_changes_flow_through_reconciler() {
        let mut app = live_app();
        assert_eq!(app.sim.blob_count(), 1, "first demo entry is visible at t=0");

        // Run long enough for every reveal and confirmation to land.
        for _ in 0..60 * 25 {
            app.tick();
        }
        assert_eq!(app.sim.blob_count(), app.feed.len());
        assert!(app.sim.blobs().all(|p| !p.optimistic));
    }

    #[test]
    fn test_pause_freezes_clock_and_releases() {
        let mut app = live_app();
        app.toggle_pause();
        let elapsed = app.sim.elapsed;
        for _ in 0..120 {
            app.tick();
        }
        assert_eq!(app.sim.elapsed, elapsed);
        assert_eq!(app.sim.blob_count(), 1, "paused feed reveals nothing new");
    }

    #[test]
    fn test_archive_mode_is_frozen_and_settled() {
        let mut app = live_app();
        // Let the whole demo day reveal and confirm first.
        for _ in 0..60 * 25 {
            app.tick();
        }
        app.toggle_mode(40, 24);
        assert_eq!(app.sim.mode, ViewMode::Archive);
        assert!(app.sealed);
        assert_eq!(app.sim.blob_count(), app.feed.len());
        assert!(app.sim.particles().iter().all(|p| p.settled));

        let before: Vec<(f32, f32)> = app.sim.particles().iter().map(|p| (p.x, p.y)).collect();
        for _ in 0..120 {
            app.tick();
        }
        let after: Vec<(f32, f32)> = app.sim.particles().iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(before, after, "archive particles never move");
    }

    #[test]
    fn test_archive_inserts_late_reveals_without_moving_pile() {
        let mut app = live_app();
        // Switch to the archive view partway through the day.
        for _ in 0..60 * 3 {
            app.tick();
        }
        app.toggle_mode(40, 24);
        let initial = app.sim.blob_count();
        assert!(initial >= 3);
        assert!(initial < app.feed.len());
        assert!(app.sim.particles().iter().all(|p| p.settled));
        let before: Vec<(f32, f32)> = app.sim.particles().iter().map(|p| (p.x, p.y)).collect();

        // The upstream day keeps filling in; each late reveal drops into the
        // settled pile without disturbing it.
        for _ in 0..60 * 10 {
            app.tick();
        }
        assert_eq!(app.sim.blob_count(), app.feed.len());
        assert!(app.sim.particles().iter().all(|p| p.settled));
        let after: Vec<(f32, f32)> = app.sim.particles().iter().map(|p| (p.x, p.y)).collect();
        assert!(after.len() > before.len());
        for pos in &before {
            assert!(after.contains(pos), "a prior archive position moved: {pos:?}");
        }
    }

    #[test]
    fn test_selection_cycles_blobs_only() {
        let mut app = live_app();
        for _ in 0..60 * 25 {
            app.tick();
        }
        let n = app.sim.blob_count();
        assert!(n > 1);

        let mut seen = Vec::new();
        for _ in 0..n {
            app.select_next();
            let p = app.selected_particle().expect("selection resolves");
            assert!(!p.pearl);
            seen.push(p.id.clone());
        }
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), n, "cycle visits every entry once");
    }

    #[test]
    fn test_recent_overlay_expires() {
        let mut app = live_app();
        assert!(!app.recent.is_empty(), "initial entries flash as recent");
        for _ in 0..60 * 4 {
            app.tick();
        }
        // Demo drips each second; after the flash window old ids are gone.
        assert!(app.recent.len() <= 2);
    }

    #[test]
    fn test_seal_is_chrome_only() {
        let mut app = live_app();
        app.toggle_seal();
        assert!(!app.sealed, "seal toggle is a no-op in live mode");

        app.toggle_mode(40, 24);
        let before: Vec<(f32, f32)> = app.sim.particles().iter().map(|p| (p.x, p.y)).collect();
        app.toggle_seal();
        assert!(!app.sealed);
        let after: Vec<(f32, f32)> = app.sim.particles().iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(before, after);
    }
}
