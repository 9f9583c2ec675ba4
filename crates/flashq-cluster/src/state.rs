//! Partition lifecycle states and the legal-transition table.

use std::fmt;

/// The four states a partition can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionState {
    /// Never created or fully torn down.
    NonExistent,
    /// Replica assignment is known; no leader exists yet.
    New,
    /// A leader exists in durable metadata.
    Online,
    /// A leader existed but is currently not among live brokers, or
    /// election failed.
    Offline,
}

impl PartitionState {
    pub fn name(self) -> &'static str {
        match self {
            PartitionState::NonExistent => "NonExistent",
            PartitionState::New => "New",
            PartitionState::Online => "Online",
            PartitionState::Offline => "Offline",
        }
    }

    /// Whether `self` is an admissible predecessor of `target`, per the
    /// legal-transition table.
    ///
    /// | to           | allowed from               |
    /// |--------------|----------------------------|
    /// | New          | {NonExistent}              |
    /// | Online       | {New, Online, Offline}     |
    /// | Offline      | {New, Online}              |
    /// | NonExistent  | {Offline}                  |
    pub fn can_transition_to(self, target: PartitionState) -> bool {
        use PartitionState::*;
        matches!(
            (self, target),
            (NonExistent, New)
                | (New, Online)
                | (Online, Online)
                | (Offline, Online)
                | (New, Offline)
                | (Online, Offline)
                | (Offline, NonExistent)
        )
    }
}

impl fmt::Display for PartitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
