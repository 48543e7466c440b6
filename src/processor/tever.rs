use std::collections::VecDeque;
use std::sync::Arc;

use crate::{
    database::{ns_key, EventDatabase},
    error::Error,
    event::{
        manager_event::{Config, ManagerEventType, Rot},
        vc_event::{VcEventType, VcTelEvent},
        Event, TelEventTag, VerifiableEvent,
    },
    event_generator,
    event_message::serialization_info::SerializationFormats,
    kel::{KelEventView, KeyEventLog},
    prefix::{AttachedSignaturePrefix, BasicPrefix, IdentifierPrefix, Prefix},
    query::tel_state_notice::{TelStateNotice, VcStateNotice},
    seal::{EventSeal, Seal},
    state::{vc_state::TelState, ManagerTelState},
};

use super::notification::Cue;

/// Per-registry transaction event verifier. Holds the verified state of
/// one management TEL and validates every event against it: hash-chain
/// continuity, backer quorum thresholds and the anchoring seal in the
/// controlling KEL. Accepted events are written to the registry store,
/// events with missing prerequisites are escrowed.
pub struct Tever {
    reger: Arc<EventDatabase>,
    state: ManagerTelState,
    /// Prefix of the locally controlled registry, if any. Restricts
    /// which events must be fully backed before acceptance.
    own_registry: Option<IdentifierPrefix>,
    local: bool,
}

impl Tever {
    /// Creates the verifier from a registry inception event, validating
    /// the event on the way. Nothing is written unless validation passes
    /// or an escrow applies.
    pub fn incept<K: KeyEventLog>(
        kel: &K,
        reger: Arc<EventDatabase>,
        event: &VerifiableEvent,
        own_registry: Option<IdentifierPrefix>,
        local: bool,
        cues: &mut VecDeque<Cue>,
    ) -> Result<Self, Error> {
        let (manager, inc) = match &event.event {
            Event::Management(m) => match &m.event_type {
                ManagerEventType::Vcp(inc) => (m, inc),
                _ => {
                    return Err(Error::SemanticError(
                        "Expected vcp ilk for registry inception".into(),
                    ))
                }
            },
            _ => {
                return Err(Error::SemanticError(
                    "Expected vcp ilk for registry inception".into(),
                ))
            }
        };

        if manager.sn != 0 {
            return Err(Error::SemanticError(format!(
                "Invalid sn = {} for vcp",
                manager.sn
            )));
        }
        if !manager.check_inception_binding()? {
            return Err(Error::SemanticError(format!(
                "Invalid registry prefix = {}",
                manager.prefix
            )));
        }
        if event_generator::has_duplicates(&inc.backers) {
            return Err(Error::SemanticError(
                "Backer list has duplicates".into(),
            ));
        }
        event_generator::validate_toad(inc.backer_threshold, inc.backers.len())?;

        let state = ManagerTelState {
            prefix: manager.prefix.clone(),
            issuer: inc.issuer_id.clone(),
            sn: 0,
            last: event.clone(),
            ilk: TelEventTag::Vcp,
            toad: inc.backer_threshold,
            backers: inc.backers.clone(),
            cuts: vec![],
            adds: vec![],
            no_backers: inc.config.contains(&Config::NoBackers),
        };
        let mut tever = Tever {
            reger,
            state,
            own_registry,
            local,
        };

        let toad = tever.state.toad;
        let backers = tever.state.backers.clone();
        let bigers = tever.validate_anchored_sigs(kel, event, toad, &backers, cues)?;

        let record = tever.log_event(
            &tever.registry_id(),
            event,
            bigers,
            Some(tever.state.backers.clone()),
        )?;
        tever.state.last = record;
        tever.pin_state()?;

        Ok(tever)
    }

    /// Rebuilds the verifier from the persisted registry state notice.
    pub fn reload(
        reger: Arc<EventDatabase>,
        registry_id: &IdentifierPrefix,
        own_registry: Option<IdentifierPrefix>,
        local: bool,
    ) -> Result<Self, Error> {
        let id = registry_id.to_str();
        let notice = reger
            .get_registry_state(&id)?
            .ok_or_else(|| Error::MissingEntryError(format!("No state for registry = {}", id)))?;

        let mut last = None;
        if let Some(events) = reger.get_accepted_events(&id) {
            for entry in events {
                if notice
                    .last_event_digest
                    .verify_binding(&entry.event.serialize()?)
                {
                    last = Some(entry.event);
                    break;
                }
            }
        }
        let last = last.ok_or_else(|| {
            Error::MissingEntryError(format!(
                "Corresponding event for state of registry = {} not found",
                id
            ))
        })?;

        let state = ManagerTelState {
            prefix: notice.registry_id.clone(),
            issuer: notice.issuer.clone(),
            sn: notice.sn,
            last,
            ilk: notice.last_event_tag,
            toad: notice.backer_threshold,
            backers: notice.backers.clone(),
            cuts: notice.backers_removed.clone(),
            adds: notice.backers_added.clone(),
            no_backers: notice.config.contains(&Config::NoBackers),
        };

        Ok(Tever {
            reger,
            state,
            own_registry,
            local,
        })
    }

    pub fn sn(&self) -> u64 {
        self.state.sn
    }

    pub fn registry_prefix(&self) -> &IdentifierPrefix {
        &self.state.prefix
    }

    pub fn issuer(&self) -> &IdentifierPrefix {
        &self.state.issuer
    }

    pub fn no_backers(&self) -> bool {
        self.state.no_backers
    }

    pub fn backers(&self) -> &[BasicPrefix] {
        &self.state.backers
    }

    pub fn toad(&self) -> u64 {
        self.state.toad
    }

    fn registry_id(&self) -> String {
        self.state.prefix.to_str()
    }

    /// Validates and applies one non-inception event.
    pub fn update<K: KeyEventLog>(
        &mut self,
        kel: &K,
        event: &VerifiableEvent,
        cues: &mut VecDeque<Cue>,
    ) -> Result<(), Error> {
        match &event.event {
            Event::Management(m) => match &m.event_type {
                ManagerEventType::Vrt(rot) => self.rotate(kel, event, m.sn, rot, cues),
                ManagerEventType::Vcp(_) => Err(Error::SemanticError(
                    "Unsupported ilk vcp for registry update".into(),
                )),
            },
            Event::Vc(vc) => match &vc.event_type {
                VcEventType::Iss(_) | VcEventType::Bis(_) => self.issue(kel, event, vc, cues),
                VcEventType::Rev(_) | VcEventType::Brv(_) => self.revoke(kel, event, vc, cues),
            },
        }
    }

    fn rotate<K: KeyEventLog>(
        &mut self,
        kel: &K,
        event: &VerifiableEvent,
        sn: u64,
        rot: &Rot,
        cues: &mut VecDeque<Cue>,
    ) -> Result<(), Error> {
        if self.state.no_backers {
            return Err(Error::SemanticError(format!(
                "Invalid rotation against backerless registry = {}",
                self.state.prefix
            )));
        }
        if event.event.get_prefix() != self.state.prefix {
            return Err(Error::SemanticError(format!(
                "Mismatch event registry prefix = {} expecting = {}",
                event.event.get_prefix(),
                self.state.prefix
            )));
        }
        if sn != self.state.sn + 1 {
            return Err(Error::SemanticError(format!(
                "Invalid sn = {} expecting = {}",
                sn,
                self.state.sn + 1
            )));
        }
        if !rot.prev_event.verify_binding(&self.state.last.serialize()?) {
            return Err(Error::SemanticError(
                "Mismatch prior event digest".into(),
            ));
        }

        let backers = event_generator::apply_cuts_and_adds(
            &self.state.backers,
            &rot.backers_to_remove,
            &rot.backers_to_add,
        )?;
        let toad = rot.backer_threshold;
        event_generator::validate_toad(toad, backers.len())?;

        let bigers = self.validate_anchored_sigs(kel, event, toad, &backers, cues)?;

        let record = self.log_event(&self.registry_id(), event, bigers, Some(backers.clone()))?;
        self.state.sn = sn;
        self.state.last = record;
        self.state.ilk = TelEventTag::Vrt;
        self.state.toad = toad;
        self.state.backers = backers;
        self.state.cuts = rot.backers_to_remove.clone();
        self.state.adds = rot.backers_to_add.clone();
        self.pin_state()?;

        Ok(())
    }

    fn issue<K: KeyEventLog>(
        &self,
        kel: &K,
        event: &VerifiableEvent,
        vc: &VcTelEvent,
        cues: &mut VecDeque<Cue>,
    ) -> Result<(), Error> {
        let vci = ns_key(&self.state.prefix, &vc.prefix);
        if vc.sn != 0 {
            return Err(Error::SemanticError(format!(
                "Invalid sn = {} for issuance",
                vc.sn
            )));
        }

        match &vc.event_type {
            VcEventType::Iss(iss) => {
                if !self.state.no_backers {
                    return Err(Error::SemanticError(format!(
                        "Invalid simple issue against backer based registry = {}",
                        self.state.prefix
                    )));
                }
                if iss.registry_id != self.state.prefix {
                    return Err(Error::SemanticError(format!(
                        "Mismatch event registry identifier = {} expecting = {}",
                        iss.registry_id, self.state.prefix
                    )));
                }
                self.check_anchor_or_escrow(kel, event, cues)?;
                self.log_event(&vci, event, vec![], None)?;
                Ok(())
            }
            VcEventType::Bis(bis) => {
                if self.state.no_backers {
                    return Err(Error::SemanticError(format!(
                        "Invalid backer issue against backerless registry = {}",
                        self.state.prefix
                    )));
                }
                let (toad, backers) = self.get_backer_state(&bis.registry_anchor)?;
                let bigers = self.validate_anchored_sigs(kel, event, toad, &backers, cues)?;
                self.log_event(&vci, event, bigers, None)?;
                Ok(())
            }
            _ => Err(Error::SemanticError("Unsupported ilk for issuance".into())),
        }
    }

    fn revoke<K: KeyEventLog>(
        &self,
        kel: &K,
        event: &VerifiableEvent,
        vc: &VcTelEvent,
        cues: &mut VecDeque<Cue>,
    ) -> Result<(), Error> {
        let vci = ns_key(&self.state.prefix, &vc.prefix);
        if vc.sn != 1 {
            return Err(Error::SemanticError(format!(
                "Invalid sn = {} for revocation",
                vc.sn
            )));
        }

        // the prior issuance must already be first-seen
        let prior = self
            .reger
            .get_accepted_events(&vci)
            .and_then(|mut events| events.find(|e| e.event.event.get_sn() == vc.sn - 1))
            .ok_or(Error::EventOutOfOrderError)?;

        match &vc.event_type {
            VcEventType::Rev(rev) => {
                if !self.state.no_backers {
                    return Err(Error::SemanticError(format!(
                        "Invalid simple revoke against backer based registry = {}",
                        self.state.prefix
                    )));
                }
                if !rev.prev_event.verify_binding(&prior.event.serialize()?) {
                    return Err(Error::SemanticError(
                        "Mismatch prior event digest".into(),
                    ));
                }
                self.check_anchor_or_escrow(kel, event, cues)?;
                self.log_event(&vci, event, vec![], None)?;
                Ok(())
            }
            VcEventType::Brv(brv) => {
                if self.state.no_backers {
                    return Err(Error::SemanticError(format!(
                        "Invalid backer revoke against backerless registry = {}",
                        self.state.prefix
                    )));
                }
                if !brv.prev_event.verify_binding(&prior.event.serialize()?) {
                    return Err(Error::SemanticError(
                        "Mismatch prior event digest".into(),
                    ));
                }
                let (toad, backers) = self.get_backer_state(&brv.registry_anchor)?;
                let bigers = self.validate_anchored_sigs(kel, event, toad, &backers, cues)?;
                self.log_event(&vci, event, bigers, None)?;
                Ok(())
            }
            _ => Err(Error::SemanticError("Unsupported ilk for revocation".into())),
        }
    }

    /// Verifies backer signatures and the anchoring seal. Returns the
    /// deduplicated valid signatures for logging. Escrows anchorless and
    /// partially witnessed events on the way out.
    fn validate_anchored_sigs<K: KeyEventLog>(
        &self,
        kel: &K,
        event: &VerifiableEvent,
        toad: u64,
        backers: &[BasicPrefix],
        cues: &mut VecDeque<Cue>,
    ) -> Result<Vec<AttachedSignaturePrefix>, Error> {
        let serialized = event.serialize()?;
        let mut seen: Vec<u16> = vec![];
        let mut valid = vec![];
        for sig in &event.backer_signatures {
            if seen.contains(&sig.index) {
                continue;
            }
            let backer = backers.get(sig.index as usize).ok_or_else(|| {
                Error::SemanticError(format!("Signature index {} out of range", sig.index))
            })?;
            if backer.verify(&serialized, &sig.signature)? {
                seen.push(sig.index);
                valid.push(sig.clone());
            }
        }

        if !self.verify_anchor(kel, event)? {
            if self.escrow_anchorless(event)? {
                cues.push_back(Cue::Query {
                    prefix: self.state.issuer.clone(),
                    sn: event.seal.sn,
                });
            }
            return Err(Error::MissingAnchorError);
        }

        // Events of a registry this verifier does not control must meet
        // the backer threshold before acceptance.
        let own_is_backer = self
            .own_registry
            .as_ref()
            .map(|own| backers.iter().any(|b| &IdentifierPrefix::Basic(b.clone()) == own))
            .unwrap_or(false);
        let must_meet_toad = !backers.is_empty()
            && match &self.own_registry {
                None => true,
                Some(_) => !self.local && !own_is_backer,
            };
        if must_meet_toad {
            if toad == 0 || (backers.len() as u64) < toad {
                return Err(Error::SemanticError(format!(
                    "Invalid toad = {} for {} backers",
                    toad,
                    backers.len()
                )));
            }
            if (valid.len() as u64) < toad {
                self.escrow_partially_witnessed(event)?;
                return Err(Error::NotEnoughBackerSignaturesError);
            }
        }

        Ok(valid)
    }

    /// Looks up the KEL event named by the source seal and checks that it
    /// carries exactly one seal binding it to this TEL event.
    fn verify_anchor<K: KeyEventLog>(
        &self,
        kel: &K,
        event: &VerifiableEvent,
    ) -> Result<bool, Error> {
        let raw = match kel.get_event_at_sn(&self.state.issuer, event.seal.sn)? {
            Some(raw) => raw,
            None => return Ok(false),
        };
        if !event.seal.digest.verify_binding(&raw) {
            return Ok(false);
        }
        let view = match KelEventView::parse(&raw) {
            Ok(view) => view,
            Err(_) => return Ok(false),
        };
        if view.seals.len() != 1 {
            return Ok(false);
        }
        match &view.seals[0] {
            Seal::Event(seal) => Ok(seal.prefix == event.event.get_prefix()
                && seal.sn == event.event.get_sn()
                && seal.event_digest.verify_binding(&event.serialize()?)),
            _ => Ok(false),
        }
    }

    fn check_anchor_or_escrow<K: KeyEventLog>(
        &self,
        kel: &K,
        event: &VerifiableEvent,
        cues: &mut VecDeque<Cue>,
    ) -> Result<(), Error> {
        if !self.verify_anchor(kel, event)? {
            if self.escrow_anchorless(event)? {
                cues.push_back(Cue::Query {
                    prefix: self.state.issuer.clone(),
                    sn: event.seal.sn,
                });
            }
            return Err(Error::MissingAnchorError);
        }
        Ok(())
    }

    /// Idempotent log writes for a verified event. Returns the stored
    /// record with its attributed signatures and backer set.
    fn log_event(
        &self,
        id: &str,
        event: &VerifiableEvent,
        backer_signatures: Vec<AttachedSignaturePrefix>,
        backers: Option<Vec<BasicPrefix>>,
    ) -> Result<VerifiableEvent, Error> {
        let record = VerifiableEvent {
            event: event.event.clone(),
            seal: event.seal.clone(),
            backer_signatures,
            backers,
        };
        self.reger.add_accepted_event(record.clone(), id)?;
        // an accepted event no longer waits for backer signatures
        self.reger.remove_partially_witnessed_event(&record)?;
        log::info!(
            "Tever state: {} added to TEL valid event at sn {}",
            id,
            event.event.get_sn()
        );
        Ok(record)
    }

    fn escrow_anchorless(&self, event: &VerifiableEvent) -> Result<bool, Error> {
        let added = self.reger.add_anchorless_event(event.clone())?;
        if added {
            log::info!(
                "Tever state: escrowed anchorless event of prefix {}",
                event.event.get_prefix()
            );
        }
        Ok(added)
    }

    fn escrow_partially_witnessed(&self, event: &VerifiableEvent) -> Result<(), Error> {
        if self.reger.add_partially_witnessed_event(event.clone())? {
            log::info!(
                "Tever state: escrowed partially witnessed event of prefix {}",
                event.event.get_prefix()
            );
        }
        Ok(())
    }

    /// Resolves the `(toad, backers)` pair governing a backer-anchored
    /// credential event through its management TEL seal.
    fn get_backer_state(&self, anchor: &EventSeal) -> Result<(u64, Vec<BasicPrefix>), Error> {
        if anchor.prefix != self.state.prefix {
            return Err(Error::SemanticError(format!(
                "Mismatch registry prefix = {} in seal, expecting = {}",
                anchor.prefix, self.state.prefix
            )));
        }

        let mut record = None;
        if let Some(events) = self.reger.get_accepted_events(&self.registry_id()) {
            for entry in events {
                if anchor.event_digest.verify_binding(&entry.event.serialize()?) {
                    record = Some(entry.event);
                    break;
                }
            }
        }
        // the referenced management event is a prerequisite
        let record = record.ok_or(Error::EventOutOfOrderError)?;

        let toad = match &record.event {
            Event::Management(m) => match &m.event_type {
                ManagerEventType::Vcp(inc) => inc.backer_threshold,
                ManagerEventType::Vrt(rot) => rot.backer_threshold,
            },
            _ => {
                return Err(Error::SemanticError(
                    "Seal does not reference a management event".into(),
                ))
            }
        };
        let backers = record.backers.clone().ok_or_else(|| {
            Error::MissingEntryError("Backer set for management event".into())
        })?;

        Ok((toad, backers))
    }

    /// Builds the current registry transaction state notice.
    pub fn state(&self) -> Result<TelStateNotice, Error> {
        let mut config = vec![];
        if self.state.no_backers {
            config.push(Config::NoBackers);
        }
        event_generator::registry_state(
            self.state.issuer.clone(),
            self.state.prefix.clone(),
            self.state.sn,
            self.state.last.get_digest()?,
            self.state.ilk,
            self.state.last.seal.clone(),
            Some(self.state.toad),
            self.state.backers.clone(),
            self.state.cuts.clone(),
            self.state.adds.clone(),
            config,
            None,
            SerializationFormats::JSON,
        )
    }

    fn pin_state(&self) -> Result<(), Error> {
        let notice = self.state()?;
        self.reger.put_registry_state(&self.registry_id(), &notice)?;
        Ok(())
    }

    /// Current sequence number of a credential TEL, none if the
    /// credential was never issued under this registry.
    pub fn vc_sn(&self, vc_id: &IdentifierPrefix) -> Option<u64> {
        let vci = ns_key(&self.state.prefix, vc_id);
        match self
            .reger
            .get_accepted_events(&vci)
            .map(|events| events.count())
        {
            Some(count) if count > 0 => Some(count as u64 - 1),
            _ => None,
        }
    }

    /// Folds the credential TEL into a coarse status.
    pub fn vc_status(&self, vc_id: &IdentifierPrefix) -> Result<TelState, Error> {
        let vci = ns_key(&self.state.prefix, vc_id);
        let mut entries: Vec<_> = match self.reger.get_accepted_events(&vci) {
            Some(events) => events.collect(),
            None => return Ok(TelState::NotIssued),
        };
        entries.sort();
        let last = match entries.last() {
            Some(entry) => entry,
            None => return Ok(TelState::NotIssued),
        };
        let sn = last.event.event.get_sn();
        let latest = last.event.get_digest()?;
        Ok(if entries.len() == 1 {
            TelState::Issued { sn, latest }
        } else {
            TelState::Revoked { sn, latest }
        })
    }

    /// Builds the credential transaction state notice, none if the
    /// credential was never issued under this registry.
    pub fn vc_state(&self, vc_id: &IdentifierPrefix) -> Result<Option<VcStateNotice>, Error> {
        let vci = ns_key(&self.state.prefix, vc_id);
        let mut entries: Vec<_> = match self.reger.get_accepted_events(&vci) {
            Some(events) => events.collect(),
            None => return Ok(None),
        };
        entries.sort();
        let sn = match entries.len() {
            0 => return Ok(None),
            count => count as u64 - 1,
        };
        let last = match entries.last() {
            Some(entry) => &entry.event,
            None => return Ok(None),
        };
        let tag = if entries.len() == 1 {
            if self.state.no_backers {
                TelEventTag::Iss
            } else {
                TelEventTag::Bis
            }
        } else if self.state.no_backers {
            TelEventTag::Rev
        } else {
            TelEventTag::Brv
        };
        Ok(Some(event_generator::vc_state(
            vc_id.clone(),
            self.state.prefix.clone(),
            sn,
            last.get_digest()?,
            tag,
            last.seal.clone(),
            None,
            SerializationFormats::JSON,
        )?))
    }
}
