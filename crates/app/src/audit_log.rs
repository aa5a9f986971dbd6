//! Bounded per-subsystem audit trail.
//!
//! Two views per subsystem: the local ring of entries this engine created
//! (newest first, capacity [`RING_CAPACITY`]) and a mirror of the store's
//! collection refreshed by each poll.

use std::collections::VecDeque;

use nexushub_domain::audit::AuditEntry;
use nexushub_domain::category::Subsystem;

pub const RING_CAPACITY: usize = 30;
pub const DISPLAY_WINDOW: usize = 12;
/// Most store records kept per subsystem in the mirror.
pub const HISTORY_LIMIT: usize = 30;

/// Insert-at-front ring that evicts its oldest entry beyond capacity.
#[derive(Debug, Clone)]
pub struct AuditRing {
    entries: VecDeque<AuditEntry>,
    capacity: usize,
}

impl AuditRing {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: AuditEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Newest entries, at most [`DISPLAY_WINDOW`].
    pub fn recent(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter().take(DISPLAY_WINDOW)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AuditRing {
    fn default() -> Self {
        Self::with_capacity(RING_CAPACITY)
    }
}

#[derive(Debug, Default)]
struct Stream {
    local: AuditRing,
    history: Vec<AuditEntry>,
}

/// Audit rings and store mirrors for the three subsystems.
#[derive(Debug, Default)]
pub struct AuditLog {
    rack: Stream,
    access: Stream,
    energy: Stream,
}

impl AuditLog {
    fn stream(&self, subsystem: Subsystem) -> &Stream {
        match subsystem {
            Subsystem::Rack => &self.rack,
            Subsystem::Access => &self.access,
            Subsystem::Energy => &self.energy,
        }
    }

    fn stream_mut(&mut self, subsystem: Subsystem) -> &mut Stream {
        match subsystem {
            Subsystem::Rack => &mut self.rack,
            Subsystem::Access => &mut self.access,
            Subsystem::Energy => &mut self.energy,
        }
    }

    /// Append an entry to its subsystem's ring.
    pub(crate) fn append(&mut self, entry: AuditEntry) {
        let subsystem = entry.subsystem();
        tracing::debug!(%subsystem, message = entry.message(), "audit entry");
        self.stream_mut(subsystem).local.push(entry);
    }

    #[must_use]
    pub fn ring(&self, subsystem: Subsystem) -> &AuditRing {
        &self.stream(subsystem).local
    }

    /// Display window of the local ring, newest first.
    #[must_use]
    pub fn recent(&self, subsystem: Subsystem) -> Vec<AuditEntry> {
        self.ring(subsystem).recent().cloned().collect()
    }

    /// Replace the mirror of a store collection. Sorted newest first,
    /// undated records last, bounded to [`HISTORY_LIMIT`].
    pub fn mirror(&mut self, subsystem: Subsystem, mut entries: Vec<AuditEntry>) {
        entries.retain(|e| e.subsystem() == subsystem);
        entries.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
        entries.truncate(HISTORY_LIMIT);
        self.stream_mut(subsystem).history = entries;
    }

    #[must_use]
    pub fn history(&self, subsystem: Subsystem) -> &[AuditEntry] {
        &self.stream(subsystem).history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use nexushub_domain::audit::{EnergyAction, EnergyEvent, ThermalAction, ThermalEvent, ThermalStatus};

    fn thermal(n: usize) -> AuditEntry {
        ThermalEvent::new(
            ThermalStatus::Normal,
            ThermalAction::None,
            format!("entry {n}"),
            nexushub_domain::time::now(),
        )
        .into()
    }

    #[test]
    fn should_insert_newest_first() {
        let mut log = AuditLog::default();
        log.append(thermal(1));
        log.append(thermal(2));
        let recent = log.recent(Subsystem::Rack);
        assert_eq!(recent[0].message(), "entry 2");
        assert_eq!(recent[1].message(), "entry 1");
    }

    #[test]
    fn should_evict_oldest_beyond_capacity() {
        let mut log = AuditLog::default();
        for n in 0..40 {
            log.append(thermal(n));
        }
        let ring = log.ring(Subsystem::Rack);
        assert_eq!(ring.len(), RING_CAPACITY);
        assert_eq!(ring.iter().last().unwrap().message(), "entry 10");
        assert_eq!(ring.iter().next().unwrap().message(), "entry 39");
    }

    #[test]
    fn should_expose_display_window_of_twelve() {
        let mut log = AuditLog::default();
        for n in 0..20 {
            log.append(thermal(n));
        }
        assert_eq!(log.recent(Subsystem::Rack).len(), DISPLAY_WINDOW);
        assert!(log.recent(Subsystem::Energy).is_empty());
    }

    #[test]
    fn should_keep_subsystems_apart() {
        let mut log = AuditLog::default();
        log.append(thermal(1));
        log.append(EnergyEvent::new(EnergyAction::Alert, "x", nexushub_domain::time::now()).into());
        assert_eq!(log.ring(Subsystem::Rack).len(), 1);
        assert_eq!(log.ring(Subsystem::Energy).len(), 1);
        assert!(log.ring(Subsystem::Access).is_empty());
    }

    #[test]
    fn should_sort_mirrored_history_newest_first_with_undated_last() {
        let now = nexushub_domain::time::now();
        let at = |mins: i64, msg: &str| -> AuditEntry {
            let mut e = ThermalEvent::new(ThermalStatus::Normal, ThermalAction::None, msg, now);
            e.timestamp = Some(now - Duration::minutes(mins));
            e.into()
        };
        let mut undated = ThermalEvent::new(ThermalStatus::Normal, ThermalAction::None, "undated", now);
        undated.timestamp = None;

        let mut log = AuditLog::default();
        log.mirror(
            Subsystem::Rack,
            vec![at(10, "old"), undated.into(), at(1, "new")],
        );
        let messages: Vec<_> = log.history(Subsystem::Rack).iter().map(AuditEntry::message).collect();
        assert_eq!(messages, vec!["new", "old", "undated"]);
        assert!(log.ring(Subsystem::Rack).is_empty());
    }

    #[test]
    fn should_bound_mirrored_history() {
        let mut log = AuditLog::default();
        log.mirror(Subsystem::Rack, (0..50).map(thermal).collect());
        assert_eq!(log.history(Subsystem::Rack).len(), HISTORY_LIMIT);
    }
}
