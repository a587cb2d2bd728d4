use crate::particle::EntryDescriptor;
use std::fs;
use std::path::Path;

/// Seconds a demo entry stays optimistic before its server id arrives
const CONFIRM_DELAY: f32 = 2.5;

/// One scripted entry: the confirmed descriptor plus its timeline.
struct FeedItem {
    desc: EntryDescriptor,
    reveal_at: f32,
    /// When the provisional local id flips to the confirmed server id
    confirm_at: Option<f32>,
}

/// The external entry-descriptor source.
///
/// Stands in for the upstream data fetcher: descriptors appear over time
/// (drip reveal), and freshly written entries go through a provisional
/// optimistic phase before the server-confirmed id takes over. The
/// simulation core only ever sees the descriptor list this feed emits.
pub struct EntryFeed {
    items: Vec<FeedItem>,
}

impl EntryFeed {
    /// Load descriptors from a JSON array file, revealed `drip` seconds apart.
    pub fn from_file(path: &Path, drip: f32) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read entries file: {}", e))?;
        let descs: Vec<EntryDescriptor> = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse entries file: {}", e))?;
        Ok(Self::from_descriptors(descs, drip))
    }

    pub fn from_descriptors(descs: Vec<EntryDescriptor>, drip: f32) -> Self {
        let items = descs
            .into_iter()
            .enumerate()
            .map(|(i, desc)| FeedItem {
                desc,
                reveal_at: i as f32 * drip,
                confirm_at: None,
            })
            .collect();
        Self { items }
    }

    /// The built-in demo day: a plausible spread of journal entries with
    /// category colors, dripped in and confirmed like live writes.
    pub fn demo(drip: f32) -> Self {
        let day: &[(&str, &str, &str, bool)] = &[
            ("entry-0", "morning pages before anyone woke up", "amber", true),
            ("entry-1", "coffee with sam, talked about the move", "moss", true),
            ("entry-2", "inbox zero for the first time in weeks", "sky", false),
            ("entry-3", "long walk, no phone", "moss", false),
            ("entry-4", "argued about the roadmap again", "rose", false),
            ("entry-5", "leftover noodles, surprisingly good", "amber", false),
            ("entry-6", "read two chapters of the sea novel", "sky", false),
            ("entry-7", "feeling tired but lighter somehow", "lilac", false),
        ];
        let items = day
            .iter()
            .enumerate()
            .map(|(i, (id, note, color, discussed))| {
                let reveal_at = i as f32 * drip;
                FeedItem {
                    desc: EntryDescriptor {
                        id: (*id).to_string(),
                        note: (*note).to_string(),
                        label: format!("Entry {}", i + 1),
                        color: Some((*color).to_string()),
                        discussed: *discussed,
                        optimistic: false,
                    },
                    reveal_at,
                    confirm_at: Some(reveal_at + CONFIRM_DELAY),
                }
            })
            .collect();
        Self { items }
    }

    /// The descriptor list visible at `now`, in feed order. Items inside
    /// their provisional window carry a local id and the optimistic flag.
    pub fn visible(&self, now: f32) -> Vec<EntryDescriptor> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| now >= item.reveal_at)
            .map(|(i, item)| match item.confirm_at {
                Some(confirm_at) if now < confirm_at => EntryDescriptor {
                    id: format!("local-{i}"),
                    optimistic: true,
                    ..item.desc.clone()
                },
                _ => item.desc.clone(),
            })
            .collect()
    }

    /// Monotonic counter of reveal/confirm events up to `now`; the host
    /// re-reconciles only when this changes.
    pub fn revision(&self, now: f32) -> usize {
        self.items
            .iter()
            .map(|item| {
                let revealed = (now >= item.reveal_at) as usize;
                let confirmed = item
                    .confirm_at
                    .map_or(revealed, |c| (now >= c) as usize & revealed);
                revealed + confirmed
            })
            .sum()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drip_reveal_order() {
        let feed = EntryFeed::from_descriptors(
            (0..4)
                .map(|i| EntryDescriptor::new(format!("entry-{i}"), format!("note {i}")))
                .collect(),
            1.5,
        );
        assert_eq!(feed.visible(0.0).len(), 1);
        assert_eq!(feed.visible(1.4).len(), 1);
        assert_eq!(feed.visible(3.1).len(), 3);
        assert_eq!(feed.visible(100.0).len(), 4);

        let ids: Vec<String> = feed.visible(100.0).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["entry-0", "entry-1", "entry-2", "entry-3"]);
    }

    #[test]
    fn test_demo_optimistic_window() {
        let feed = EntryFeed::demo(1.0);

        // Just revealed: provisional id, optimistic flag set.
        let first = &feed.visible(0.0)[0];
        assert_eq!(first.id, "local-0");
        assert!(first.optimistic);

        // After the confirmation delay the server id takes over.
        let first = &feed.visible(CONFIRM_DELAY + 0.1)[0];
        assert_eq!(first.id, "entry-0");
        assert!(!first.optimistic);
        assert_eq!(first.note, "morning pages before anyone woke up");
    }

    #[test]
    fn test_revision_is_monotonic() {
        let feed = EntryFeed::demo(1.0);
        let mut last = 0;
        let mut t = 0.0;
        while t < 20.0 {
            let rev = feed.revision(t);
            assert!(rev >= last);
            last = rev;
            t += 0.25;
        }
        // Every item revealed and confirmed by the end.
        assert_eq!(last, feed.len() * 2);
    }

    #[test]
    fn test_file_roundtrip() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id":"entry-0","note":"hello"}},{{"id":"entry-1","note":"again","color":"rose"}}]"#
        )
        .unwrap();

        let feed = EntryFeed::from_file(file.path(), 0.0).unwrap();
        assert_eq!(feed.len(), 2);
        let descs = feed.visible(0.0);
        assert_eq!(descs[1].color.as_deref(), Some("rose"));
        // Missing optional fields default.
        assert!(!descs[0].discussed);
        assert!(descs[0].label.is_empty());
    }

    #[test]
    fn test_invalid_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "not json").unwrap();
        assert!(EntryFeed::from_file(file.path(), 0.0).is_err());
    }
}
