use serde::{Deserialize, Serialize};

/// One entry descriptor as supplied by the upstream data source.
///
/// Every field except `id` is optional in the wire format; missing fields
/// default so a sparse descriptor still produces a visible particle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDescriptor {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub discussed: bool,
    #[serde(default)]
    pub optimistic: bool,
}

impl EntryDescriptor {
    pub fn new(id: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            note: note.into(),
            label: String::new(),
            color: None,
            discussed: false,
            optimistic: false,
        }
    }
}

/// Metadata carried opaquely on a particle. Overlaid on every reconciliation
/// pass; never read by the stepper or pre-simulator.
#[derive(Debug, Clone, Default)]
pub struct EntryMeta {
    pub label: String,
    pub note: String,
    pub color: Option<String>,
    pub discussed: bool,
}

impl EntryMeta {
    pub fn from_descriptor(desc: &EntryDescriptor) -> Self {
        Self {
            label: desc.label.clone(),
            note: desc.note.clone(),
            color: desc.color.clone(),
            discussed: desc.discussed,
        }
    }
}

/// One circular unit in the container: an entry blob or a decorative pearl.
///
/// Coordinates are container-local with `y` increasing downward.
#[derive(Debug, Clone)]
pub struct Particle {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Radius, fixed at creation.
    pub r: f32,
    /// Current squash/stretch deformation.
    pub sx: f32,
    pub sy: f32,
    /// Deformation target the renderer-facing scale eases toward.
    pub tsx: f32,
    pub tsy: f32,
    /// Participates in integration. Monotonic: once set, never cleared.
    pub active: bool,
    /// Scheduled activation time relative to simulation start.
    pub release_at: f32,
    /// Terminal state: velocity pinned to zero until a full store rebuild.
    pub settled: bool,
    /// Decorative filler; never matched against external data.
    pub pearl: bool,
    /// Created from a not-yet-server-confirmed entry.
    pub optimistic: bool,
    pub meta: EntryMeta,
}

impl Particle {
    pub fn blob(desc: &EntryDescriptor, x: f32, y: f32, r: f32) -> Self {
        Self {
            id: desc.id.clone(),
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            r,
            sx: 1.0,
            sy: 1.0,
            tsx: 1.0,
            tsy: 1.0,
            active: false,
            release_at: 0.0,
            settled: false,
            pearl: false,
            optimistic: desc.optimistic,
            meta: EntryMeta::from_descriptor(desc),
        }
    }

    /// Decorative pearls get ids in their own namespace so they can never
    /// collide with server-issued entry ids.
    pub fn pearl(index: usize, x: f32, y: f32, r: f32) -> Self {
        Self {
            id: format!("pearl-{index}"),
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            r,
            sx: 1.0,
            sy: 1.0,
            tsx: 1.0,
            tsy: 1.0,
            active: true,
            release_at: 0.0,
            settled: false,
            pearl: true,
            optimistic: false,
            meta: EntryMeta::default(),
        }
    }

    /// Carry-forward merge: physical state stays, metadata is overwritten
    /// from the descriptor. The id is updated too so an optimistic particle
    /// adopts its confirmed server id. The optimistic flag follows the
    /// descriptor: a re-reveal of a still-provisional entry must not confirm
    /// the particle early, or the later confirmed id could never
    /// content-match it.
    pub fn carry_forward(&mut self, desc: &EntryDescriptor) {
        self.id = desc.id.clone();
        self.meta = EntryMeta::from_descriptor(desc);
        self.optimistic = desc.optimistic;
    }

    /// Exact-id match; empty descriptor ids never bind.
    pub fn matches_id(&self, desc: &EntryDescriptor) -> bool {
        !self.pearl && !desc.id.is_empty() && self.id == desc.id
    }

    /// Normalized note-text match, valid only for optimistic placeholders.
    pub fn matches_note(&self, desc: &EntryDescriptor) -> bool {
        !self.pearl
            && self.optimistic
            && normalize_note(&self.meta.note) == normalize_note(&desc.note)
    }
}

/// Note text normalization used for optimistic content matching.
pub fn normalize_note(note: &str) -> String {
    note.trim().to_lowercase()
}
