//! Bounded CA history
//!
//! A fixed array of optional CA blobs. Slot 0 is always the current CA;
//! higher slots hold progressively older CAs still trusted during a
//! migration window. Rotating in a new CA shifts everything one slot up and
//! drops whatever falls off the end.

/// Number of CA generations a trust bundle can hold
pub const MAX_CA_SLOTS: usize = 3;

/// Data field prefix for numbered CA slots (`ca-bundle-0`..`ca-bundle-2`)
pub const CA_SLOT_PREFIX: &str = "ca-bundle-";

/// Ordered, bounded history of trusted CA certificates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaHistory {
    slots: [Option<Vec<u8>>; MAX_CA_SLOTS],
}

impl CaHistory {
    /// History holding only `current`
    pub fn new(current: Vec<u8>) -> Self {
        let mut slots: [Option<Vec<u8>>; MAX_CA_SLOTS] = Default::default();
        slots[0] = Some(current);
        Self { slots }
    }

    /// Rebuild a history from persisted slots; `None` if slot 0 is empty
    pub fn from_slots(slots: [Option<Vec<u8>>; MAX_CA_SLOTS]) -> Option<Self> {
        slots[0].as_ref()?;
        Some(Self { slots })
    }

    /// Data field name of slot `index`
    pub fn slot_field(index: usize) -> String {
        format!("{CA_SLOT_PREFIX}{index}")
    }

    /// The current (newest) CA
    pub fn current(&self) -> &[u8] {
        self.slots[0].as_deref().unwrap_or_default()
    }

    /// CA in slot `index`, if populated
    pub fn slot(&self, index: usize) -> Option<&[u8]> {
        self.slots.get(index).and_then(|s| s.as_deref())
    }

    /// Populated slots in order, newest first
    pub fn populated(&self) -> impl Iterator<Item = (usize, &[u8])> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_deref().map(|ca| (i, ca)))
    }

    /// Number of populated slots
    pub fn len(&self) -> usize {
        self.populated().count()
    }

    /// Always false: slot 0 is populated by construction
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make `ca` the current CA, keeping older ones trusted
    ///
    /// A CA already in the history (a rollback) is moved to slot 0 rather
    /// than stored twice, and nothing is dropped. Otherwise returns the CA
    /// dropped from the last slot, if the history was full.
    pub fn rotate_in(&mut self, ca: Vec<u8>) -> Option<Vec<u8>> {
        let existing = self
            .slots
            .iter()
            .position(|s| s.as_deref() == Some(ca.as_slice()));

        let dropped = match existing {
            Some(index) => {
                self.slots[index] = None;
                self.slots[..=index].rotate_right(1);
                None
            }
            None => {
                let dropped = self.slots[MAX_CA_SLOTS - 1].take();
                self.slots.rotate_right(1);
                dropped
            }
        };
        self.slots[0] = Some(ca);
        dropped
    }

    /// Discard every slot and trust only `ca`
    pub fn collapse_to(&mut self, ca: Vec<u8>) {
        *self = Self::new(ca);
    }

    /// Concatenation of all populated slots, slot 0 first
    ///
    /// A newline separates blobs that do not already end in one.
    pub fn chain(&self) -> Vec<u8> {
        let mut chain = Vec::new();
        for (_, ca) in self.populated() {
            if chain.last().is_some_and(|b| *b != b'\n') {
                chain.push(b'\n');
            }
            chain.extend_from_slice(ca);
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ca(label: &str) -> Vec<u8> {
        format!("{label}\n").into_bytes()
    }

    #[test]
    fn test_new_history_has_only_current() {
        let history = CaHistory::new(ca("A"));
        assert_eq!(history.current(), b"A\n");
        assert_eq!(history.len(), 1);
        assert!(!history.is_empty());
        assert!(history.slot(1).is_none());
    }

    #[test]
    fn test_from_slots_requires_slot_zero() {
        assert!(CaHistory::from_slots([None, Some(ca("A")), None]).is_none());
        let history = CaHistory::from_slots([Some(ca("B")), Some(ca("A")), None]).unwrap();
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_rotate_shifts_and_drops_oldest() {
        let mut history = CaHistory::new(ca("A"));

        assert!(history.rotate_in(ca("B")).is_none());
        assert!(history.rotate_in(ca("C")).is_none());
        assert_eq!(history.len(), MAX_CA_SLOTS);

        let dropped = history.rotate_in(ca("D"));
        assert_eq!(dropped, Some(ca("A")));
        assert_eq!(history.len(), MAX_CA_SLOTS);
        assert_eq!(history.slot(0), Some(&b"D\n"[..]));
        assert_eq!(history.slot(1), Some(&b"C\n"[..]));
        assert_eq!(history.slot(2), Some(&b"B\n"[..]));
    }

    #[test]
    fn test_rollback_promotes_existing_ca() {
        let mut history = CaHistory::new(ca("A"));
        history.rotate_in(ca("B"));

        assert!(history.rotate_in(ca("A")).is_none());
        assert_eq!(history.len(), 2);
        assert_eq!(history.chain(), b"A\nB\n");

        history.rotate_in(ca("C"));
        assert!(history.rotate_in(ca("B")).is_none());
        assert_eq!(history.chain(), b"B\nC\nA\n");
    }

    #[test]
    fn test_collapse_keeps_only_given_ca() {
        let mut history = CaHistory::new(ca("A"));
        history.rotate_in(ca("B"));
        history.collapse_to(ca("B"));
        assert_eq!(history, CaHistory::new(ca("B")));
    }

    #[test]
    fn test_chain_is_slot_ordered() {
        let mut history = CaHistory::new(ca("A"));
        history.rotate_in(ca("B"));
        assert_eq!(history.chain(), b"B\nA\n");
    }

    #[test]
    fn test_chain_separates_blobs_without_trailing_newline() {
        let mut history = CaHistory::new(b"A".to_vec());
        history.rotate_in(b"B".to_vec());
        assert_eq!(history.chain(), b"B\nA");
    }

    #[test]
    fn test_chain_skips_gaps() {
        let history = CaHistory::from_slots([Some(ca("C")), None, Some(ca("A"))]).unwrap();
        assert_eq!(history.chain(), b"C\nA\n");
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_slot_field_names() {
        assert_eq!(CaHistory::slot_field(0), "ca-bundle-0");
        assert_eq!(CaHistory::slot_field(2), "ca-bundle-2");
    }
}
