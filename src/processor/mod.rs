pub mod notification;
pub mod tever;


use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::{
    database::{ns_key, EventDatabase},
    error::Error,
    event::{vc_event::VcEventType, Event, TelEventTag, VerifiableEvent},
    kel::KeyEventLog,
    prefix::{IdentifierPrefix, Prefix},
    query::QueryEvent,
};

pub use notification::Cue;
pub use tever::Tever;

/// Transaction event message processing facility. Routes incoming TEL
/// events to the verifier of their registry, creating one on inception,
/// enforces first-seen ordering, escrows events with missing
/// prerequisites and drives the escrow drains.
pub struct Tevery<K: KeyEventLog> {
    kel: Arc<K>,
    reger: Arc<EventDatabase>,
    tevers: HashMap<IdentifierPrefix, Tever>,
    /// Prefix of the locally controlled registry, if any.
    regk: Option<IdentifierPrefix>,
    /// True restricts processing to own registry events, false to
    /// everything but them. No restriction without `regk`.
    local: bool,
    cues: VecDeque<Cue>,
}

impl<K: KeyEventLog> Tevery<K> {
    pub fn new(
        kel: Arc<K>,
        reger: Arc<EventDatabase>,
        regk: Option<IdentifierPrefix>,
        local: bool,
    ) -> Self {
        Self {
            kel,
            reger,
            tevers: HashMap::new(),
            regk,
            local,
            cues: VecDeque::new(),
        }
    }

    pub fn pop_cue(&mut self) -> Option<Cue> {
        self.cues.pop_front()
    }

    pub fn tever(&self, registry_id: &IdentifierPrefix) -> Option<&Tever> {
        self.tevers.get(registry_id)
    }

    /// Registry governing an event, by its kind.
    pub fn registry_key(event: &Event) -> IdentifierPrefix {
        match event {
            Event::Management(m) => m.prefix.clone(),
            Event::Vc(vc) => match &vc.event_type {
                VcEventType::Iss(iss) => iss.registry_id.clone(),
                VcEventType::Rev(rev) => rev.registry_id.clone(),
                VcEventType::Bis(bis) => bis.registry_anchor.prefix.clone(),
                VcEventType::Brv(brv) => brv.registry_anchor.prefix.clone(),
            },
        }
    }

    /// Validates one event against the current state of its registry or
    /// credential and applies it. Out of order, anchorless and partially
    /// witnessed events are escrowed before the error propagates.
    pub fn process_event(&mut self, event: VerifiableEvent) -> Result<(), Error> {
        let regk = Self::registry_key(&event.event);
        let sn = event.event.get_sn();
        let tag = event.event.get_tag();

        let inceptive = matches!(tag, TelEventTag::Vcp | TelEventTag::Iss | TelEventTag::Bis);
        if inceptive && sn != 0 {
            return Err(Error::SemanticError(format!(
                "Invalid sn = {} for inceptive ilk",
                sn
            )));
        }
        if !inceptive && sn == 0 {
            return Err(Error::SemanticError(
                "Invalid sn = 0 for non-inceptive ilk".into(),
            ));
        }

        if let Some(own) = &self.regk {
            if self.local {
                if own != &regk {
                    return Err(Error::SemanticError(format!(
                        "Nonlocal event of registry = {} when in local mode",
                        regk
                    )));
                }
            } else if own == &regk {
                return Err(Error::SemanticError(format!(
                    "Local event of registry = {} when not in local mode",
                    regk
                )));
            }
        }

        // recover a registry verifier persisted by an earlier run
        if !self.tevers.contains_key(&regk) {
            if let Ok(tever) =
                Tever::reload(self.reger.clone(), &regk, self.regk.clone(), self.local)
            {
                self.tevers.insert(regk.clone(), tever);
            }
        }

        if !self.tevers.contains_key(&regk) {
            if tag == TelEventTag::Vcp {
                let tever = Tever::incept(
                    self.kel.as_ref(),
                    self.reger.clone(),
                    &event,
                    self.regk.clone(),
                    self.local,
                    &mut self.cues,
                )?;
                self.tevers.insert(regk, tever);
                Ok(())
            } else {
                // out of order, the registry inception has not been seen
                Self::escrow_out_of_order(&self.reger, &event)?;
                Err(Error::EventOutOfOrderError)
            }
        } else {
            if tag == TelEventTag::Vcp {
                // already first seen, a second inception is duplicity
                return Err(Error::LikelyDuplicitousError);
            }

            let sno = {
                let tever = self
                    .tevers
                    .get(&regk)
                    .ok_or_else(|| Error::MissingEntryError("Registry verifier".into()))?;
                if tag == TelEventTag::Vrt {
                    tever.sn() + 1
                } else {
                    tever
                        .vc_sn(&event.event.get_prefix())
                        .map_or(0, |esn| esn + 1)
                }
            };

            if sn > sno {
                Self::escrow_out_of_order(&self.reger, &event)?;
                Err(Error::EventOutOfOrderError)
            } else if sn == sno {
                let tever = self
                    .tevers
                    .get_mut(&regk)
                    .ok_or_else(|| Error::MissingEntryError("Registry verifier".into()))?;
                match tever.update(self.kel.as_ref(), &event, &mut self.cues) {
                    Err(Error::EventOutOfOrderError) => {
                        // missing prior credential event or management
                        // event referenced by the seal
                        Self::escrow_out_of_order(&self.reger, &event)?;
                        Err(Error::EventOutOfOrderError)
                    }
                    result => result,
                }
            } else {
                Err(Error::LikelyDuplicitousError)
            }
        }
    }

    fn escrow_out_of_order(reger: &EventDatabase, event: &VerifiableEvent) -> Result<(), Error> {
        if reger.add_out_of_order_event(event.clone())? {
            log::info!(
                "Tevery state: escrowed out of order event of prefix {}",
                event.event.get_prefix()
            );
        }
        Ok(())
    }

    /// Revisits parked events whose prerequisites may have arrived.
    pub fn process_escrows(&mut self) {
        self.process_escrow_anchorless();
        self.process_escrow_out_of_order();
    }

    /// Drains the anchorless escrow: reprocesses every entry, removing it
    /// on success or terminal failure and keeping it while its anchor is
    /// still unseen.
    pub fn process_escrow_anchorless(&mut self) {
        let escrowed: Vec<VerifiableEvent> = self
            .reger
            .get_all_anchorless()
            .map(|entries| entries.map(|e| e.event).collect())
            .unwrap_or_default();

        for event in escrowed {
            match self.process_event(event.clone()) {
                Err(Error::MissingAnchorError) => {
                    log::debug!("Tevery unescrow: anchor still missing");
                }
                Err(e) => {
                    if let Err(e) = self.reger.remove_anchorless_event(&event) {
                        log::error!("Tevery escrow process error: {}", e);
                    }
                    log::error!("Tevery unescrowed failed event: {}", e);
                }
                Ok(()) => {
                    if let Err(e) = self.reger.remove_anchorless_event(&event) {
                        log::error!("Tevery escrow process error: {}", e);
                    }
                    log::info!("Tevery unescrow succeeded in valid event");
                }
            }
        }
    }

    /// Drains the out-of-order escrow the same way, keeping entries that
    /// are still out of order.
    pub fn process_escrow_out_of_order(&mut self) {
        let escrowed: Vec<VerifiableEvent> = self
            .reger
            .get_all_out_of_order()
            .map(|entries| entries.map(|e| e.event).collect())
            .unwrap_or_default();

        for event in escrowed {
            match self.process_event(event.clone()) {
                Err(Error::EventOutOfOrderError) => {
                    log::debug!("Tevery unescrow: still out of order");
                }
                Err(e) => {
                    if let Err(e) = self.reger.remove_out_of_order_event(&event) {
                        log::error!("Tevery escrow process error: {}", e);
                    }
                    log::error!("Tevery unescrowed failed event: {}", e);
                }
                Ok(()) => {
                    if let Err(e) = self.reger.remove_out_of_order_event(&event) {
                        log::error!("Tevery escrow process error: {}", e);
                    }
                    log::info!("Tevery unescrow succeeded in valid event");
                }
            }
        }
    }

    /// Replays TEL event streams for the queried registry and credential,
    /// cueing the concatenated raw bytes back to the source.
    pub fn process_query(
        &mut self,
        qry: &QueryEvent,
        source: IdentifierPrefix,
    ) -> Result<(), Error> {
        match qry.route.as_str() {
            "tels" => {
                let mut msgs: Vec<u8> = Vec::new();
                let mgmt_id = qry.args.registry_id.to_str();
                if let Some(events) = self.reger.get_accepted_events(&mgmt_id) {
                    for entry in events {
                        msgs.extend(entry.event.serialize()?);
                    }
                }
                let vci = ns_key(&qry.args.registry_id, &qry.args.vc_id);
                if let Some(events) = self.reger.get_accepted_events(&vci) {
                    for entry in events {
                        msgs.extend(entry.event.serialize()?);
                    }
                }
                if !msgs.is_empty() {
                    self.cues.push_back(Cue::Replay { dest: source, msgs });
                }
                Ok(())
            }
            route => Err(Error::SemanticError(format!(
                "Invalid query route = {}",
                route
            ))),
        }
    }
}
