//! Capability negotiation: a closed set of booleans a runtime either has
//! or doesn't (spec.md §4.F/G — "Capabilities are a flat set").

/// One capability a `Runtime` may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Capability {
    ThreadStart = 0,
    TurnSteer = 1,
    Interrupt = 2,
    EventStream = 3,
    ParallelSessions = 4,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::ThreadStart,
        Capability::TurnSteer,
        Capability::Interrupt,
        Capability::EventStream,
        Capability::ParallelSessions,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Capability::ThreadStart => "thread_start",
            Capability::TurnSteer => "turn_steer",
            Capability::Interrupt => "interrupt",
            Capability::EventStream => "event_stream",
            Capability::ParallelSessions => "parallel_sessions",
        };
        f.write_str(name)
    }
}

/// A small bitset over [`Capability`]. `Has` is total: querying any
/// capability, known or not yet added, is always a cheap bit test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn from_iter(caps: impl IntoIterator<Item = Capability>) -> Self {
        let mut set = Self::empty();
        for cap in caps {
            set.insert(cap);
        }
        set
    }

    pub fn insert(&mut self, cap: Capability) {
        self.0 |= cap.bit();
    }

    #[must_use]
    pub fn has(&self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    /// Default required-capability set per spec.md §4.I: thread start,
    /// interrupt, event stream.
    #[must_use]
    pub fn conformance_default() -> Self {
        Self::from_iter([
            Capability::ThreadStart,
            Capability::Interrupt,
            Capability::EventStream,
        ])
    }

    /// Every capability present in `required` but absent from `self`, in
    /// declaration order.
    #[must_use]
    pub fn missing(&self, required: &CapabilitySet) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|cap| required.has(*cap) && !self.has(*cap))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_is_total_over_empty_set() {
        let set = CapabilitySet::empty();
        for cap in Capability::ALL {
            assert!(!set.has(cap));
        }
    }

    #[test]
    fn missing_reports_only_absent_required_capabilities() {
        let have = CapabilitySet::from_iter([Capability::ThreadStart, Capability::EventStream]);
        let required = CapabilitySet::conformance_default();
        let missing = have.missing(&required);
        assert_eq!(missing, vec![Capability::Interrupt]);
    }

    #[test]
    fn missing_is_empty_when_all_required_present() {
        let have = CapabilitySet::conformance_default();
        assert!(have.missing(&CapabilitySet::conformance_default()).is_empty());
    }
}
