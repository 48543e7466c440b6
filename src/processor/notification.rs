use crate::{event::Event, prefix::IdentifierPrefix};

/// Notices the verifier emits for the surrounding host to act on. The
/// host drains them from the processing facility's FIFO.
#[derive(Debug, Clone, PartialEq)]
pub enum Cue {
    /// An anchor has not been observed yet: ask peers for the controlling
    /// KEL of `prefix` at `sn`.
    Query { prefix: IdentifierPrefix, sn: u64 },
    /// Replay of requested TEL event streams, to be sent to `dest`.
    Replay { dest: IdentifierPrefix, msgs: Vec<u8> },
    /// Reserved for backer receipt generation.
    Receipt { event: Event },
}
