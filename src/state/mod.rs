pub mod vc_state;

use crate::{
    event::{TelEventTag, VerifiableEvent},
    prefix::{BasicPrefix, IdentifierPrefix},
};

/// In-memory snapshot of a registry management TEL, maintained by its
/// verifier and pinned to the store as a state notice after every
/// accepted management event.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerTelState {
    /// Registry identifier.
    pub prefix: IdentifierPrefix,
    /// Controlling issuer identifier, owner of the anchoring KEL.
    pub issuer: IdentifierPrefix,
    pub sn: u64,
    /// Latest accepted management event, with its anchor and attributed
    /// backer material.
    pub last: VerifiableEvent,
    pub ilk: TelEventTag,
    pub toad: u64,
    pub backers: Vec<BasicPrefix>,
    pub cuts: Vec<BasicPrefix>,
    pub adds: Vec<BasicPrefix>,
    pub no_backers: bool,
}
