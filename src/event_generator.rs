//! Pure constructors for well-formed TEL event bodies and notices.

use chrono::{DateTime, FixedOffset, Utc};

use crate::{
    error::Error,
    event::{
        manager_event::{Config, Inc, ManagerEventType, ManagerTelEvent, Rot},
        vc_event::{Issuance, Revocation, SimpleIssuance, SimpleRevocation, VcEventType, VcTelEvent},
        TelEventTag,
    },
    event_message::serialization_info::SerializationFormats,
    prefix::{BasicPrefix, IdentifierPrefix, SelfAddressing, SelfAddressingPrefix},
    query::{
        tel_state_notice::{TelStateNotice, VcStateNotice},
        QueryArgs, QueryEvent,
    },
    seal::{EventSeal, EventSourceSeal},
};

/// Default backer threshold for `n` backers: the smallest majority,
/// ⌈(n+1)/2⌉.
pub fn ample(n: u64) -> u64 {
    if n == 0 {
        0
    } else {
        (n / 2) + 1
    }
}

fn now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&FixedOffset::east(0))
}

pub(crate) fn has_duplicates(backers: &[BasicPrefix]) -> bool {
    backers
        .iter()
        .enumerate()
        .any(|(i, b)| backers[..i].contains(b))
}

pub(crate) fn validate_toad(toad: u64, count: usize) -> Result<(), Error> {
    if count == 0 {
        if toad != 0 {
            return Err(Error::SemanticError(format!(
                "Invalid toad = {} for empty backer list",
                toad
            )));
        }
    } else if toad < 1 || toad > count as u64 {
        return Err(Error::SemanticError(format!(
            "Invalid toad = {} for {} backers",
            toad, count
        )));
    }
    Ok(())
}

/// Builds a registry inception event (`vcp`), deriving the registry
/// identifier from the event data.
pub fn incept(
    issuer_id: IdentifierPrefix,
    toad: Option<u64>,
    backers: Vec<BasicPrefix>,
    config: Vec<Config>,
    format: SerializationFormats,
) -> Result<ManagerTelEvent, Error> {
    if config.contains(&Config::NoBackers) && !backers.is_empty() {
        return Err(Error::SemanticError(format!(
            "{} backers specified for backerless registry, 0 allowed",
            backers.len()
        )));
    }
    if has_duplicates(&backers) {
        return Err(Error::SemanticError("Backer list has duplicates".into()));
    }
    let toad = toad.unwrap_or_else(|| ample(backers.len() as u64));
    validate_toad(toad, backers.len())?;

    Inc {
        issuer_id,
        config,
        backer_threshold: toad,
        backers,
    }
    .incept_self_addressing(SelfAddressing::Blake3_256, format)
}

/// Builds a registry rotation event (`vrt`) against the prior backer
/// list, applying cuts and adds.
#[allow(clippy::too_many_arguments)]
pub fn rotate(
    registry_id: IdentifierPrefix,
    prev_event: SelfAddressingPrefix,
    sn: u64,
    toad: Option<u64>,
    prior_backers: &[BasicPrefix],
    cuts: Vec<BasicPrefix>,
    adds: Vec<BasicPrefix>,
    format: SerializationFormats,
) -> Result<ManagerTelEvent, Error> {
    if sn < 1 {
        return Err(Error::SemanticError(format!("Invalid sn = {} for vrt", sn)));
    }
    let new_backers = apply_cuts_and_adds(prior_backers, &cuts, &adds)?;
    let toad = toad.unwrap_or_else(|| ample(new_backers.len() as u64));
    validate_toad(toad, new_backers.len())?;

    ManagerTelEvent::new(
        registry_id,
        sn,
        ManagerEventType::Vrt(Rot {
            prev_event,
            backer_threshold: toad,
            backers_to_remove: cuts,
            backers_to_add: adds,
        }),
        format,
    )
}

/// Computes the rotated backer list, enforcing that cuts come from the
/// prior list, adds are new, and the two do not intersect.
pub(crate) fn apply_cuts_and_adds(
    prior: &[BasicPrefix],
    cuts: &[BasicPrefix],
    adds: &[BasicPrefix],
) -> Result<Vec<BasicPrefix>, Error> {
    if has_duplicates(cuts) {
        return Err(Error::SemanticError("Cut list has duplicates".into()));
    }
    if cuts.iter().any(|c| !prior.contains(c)) {
        return Err(Error::SemanticError(
            "Cut list has members not in the backer list".into(),
        ));
    }
    if has_duplicates(adds) {
        return Err(Error::SemanticError("Add list has duplicates".into()));
    }
    if cuts.iter().any(|c| adds.contains(c)) {
        return Err(Error::SemanticError("Intersecting cuts and adds".into()));
    }
    if prior.iter().any(|b| adds.contains(b)) {
        return Err(Error::SemanticError("Intersecting backers and adds".into()));
    }

    let new_backers: Vec<BasicPrefix> = prior
        .iter()
        .filter(|b| !cuts.contains(b))
        .chain(adds.iter())
        .cloned()
        .collect();

    if new_backers.len() != prior.len() - cuts.len() + adds.len() {
        return Err(Error::SemanticError(
            "Invalid member combination among backers, cuts and adds".into(),
        ));
    }

    Ok(new_backers)
}

/// Builds a simple issuance event (`iss`) for a backerless registry.
pub fn issue(
    vc_id: IdentifierPrefix,
    registry_id: IdentifierPrefix,
    dt: Option<DateTime<FixedOffset>>,
    format: SerializationFormats,
) -> Result<VcTelEvent, Error> {
    VcTelEvent::new(
        vc_id,
        0,
        VcEventType::Iss(SimpleIssuance {
            registry_id,
            issuance_date: dt.unwrap_or_else(now),
        }),
        format,
    )
}

/// Builds a simple revocation event (`rev`) for a backerless registry.
pub fn revoke(
    vc_id: IdentifierPrefix,
    registry_id: IdentifierPrefix,
    prev_event: SelfAddressingPrefix,
    dt: Option<DateTime<FixedOffset>>,
    format: SerializationFormats,
) -> Result<VcTelEvent, Error> {
    VcTelEvent::new(
        vc_id,
        1,
        VcEventType::Rev(SimpleRevocation {
            registry_id,
            prev_event,
            revocation_date: dt.unwrap_or_else(now),
        }),
        format,
    )
}

/// Builds a backer-anchored issuance event (`bis`). The seal points at
/// the management TEL event whose backer set governs this credential.
pub fn backer_issue(
    vc_id: IdentifierPrefix,
    registry_id: IdentifierPrefix,
    registry_sn: u64,
    registry_event_digest: SelfAddressingPrefix,
    dt: Option<DateTime<FixedOffset>>,
    format: SerializationFormats,
) -> Result<VcTelEvent, Error> {
    VcTelEvent::new(
        vc_id,
        0,
        VcEventType::Bis(Issuance {
            registry_id: registry_id.clone(),
            registry_anchor: EventSeal {
                prefix: registry_id,
                sn: registry_sn,
                event_digest: registry_event_digest,
            },
            issuance_date: dt.unwrap_or_else(now),
        }),
        format,
    )
}

/// Builds a backer-anchored revocation event (`brv`).
#[allow(clippy::too_many_arguments)]
pub fn backer_revoke(
    vc_id: IdentifierPrefix,
    registry_id: IdentifierPrefix,
    registry_sn: u64,
    registry_event_digest: SelfAddressingPrefix,
    prev_event: SelfAddressingPrefix,
    dt: Option<DateTime<FixedOffset>>,
    format: SerializationFormats,
) -> Result<VcTelEvent, Error> {
    VcTelEvent::new(
        vc_id,
        1,
        VcEventType::Brv(Revocation {
            prev_event,
            registry_anchor: EventSeal {
                prefix: registry_id,
                sn: registry_sn,
                event_digest: registry_event_digest,
            },
            revocation_date: dt.unwrap_or_else(now),
        }),
        format,
    )
}

/// Builds a registry transaction state notice.
#[allow(clippy::too_many_arguments)]
pub fn registry_state(
    issuer: IdentifierPrefix,
    registry_id: IdentifierPrefix,
    sn: u64,
    last_event_digest: SelfAddressingPrefix,
    last_event_tag: TelEventTag,
    anchor: EventSourceSeal,
    toad: Option<u64>,
    backers: Vec<BasicPrefix>,
    cuts: Vec<BasicPrefix>,
    adds: Vec<BasicPrefix>,
    config: Vec<Config>,
    dt: Option<DateTime<FixedOffset>>,
    format: SerializationFormats,
) -> Result<TelStateNotice, Error> {
    if !matches!(last_event_tag, TelEventTag::Vcp | TelEventTag::Vrt) {
        return Err(Error::SemanticError(format!(
            "Invalid event type in registry state: {:?}",
            last_event_tag
        )));
    }
    if has_duplicates(&backers) {
        return Err(Error::SemanticError("Backer list has duplicates".into()));
    }
    if has_duplicates(&cuts) {
        return Err(Error::SemanticError("Cut list has duplicates".into()));
    }
    if has_duplicates(&adds) {
        return Err(Error::SemanticError("Add list has duplicates".into()));
    }
    let toad = toad.unwrap_or_else(|| ample(backers.len() as u64));
    validate_toad(toad, backers.len())?;

    TelStateNotice::new(
        registry_id,
        sn,
        last_event_digest,
        issuer,
        dt.unwrap_or_else(now),
        last_event_tag,
        anchor,
        toad,
        cuts,
        adds,
        backers,
        config,
        format,
    )
}

/// Builds a credential transaction state notice.
#[allow(clippy::too_many_arguments)]
pub fn vc_state(
    vc_id: IdentifierPrefix,
    registry_id: IdentifierPrefix,
    sn: u64,
    last_event_digest: SelfAddressingPrefix,
    last_event_tag: TelEventTag,
    anchor: EventSourceSeal,
    dt: Option<DateTime<FixedOffset>>,
    format: SerializationFormats,
) -> Result<VcStateNotice, Error> {
    if matches!(last_event_tag, TelEventTag::Vcp | TelEventTag::Vrt) {
        return Err(Error::SemanticError(format!(
            "Invalid event type in credential state: {:?}",
            last_event_tag
        )));
    }
    VcStateNotice::new(
        vc_id,
        sn,
        last_event_digest,
        registry_id,
        anchor,
        dt.unwrap_or_else(now),
        last_event_tag,
        format,
    )
}

/// Builds a routed credential query (`qry`).
#[allow(clippy::too_many_arguments)]
pub fn query(
    registry_id: IdentifierPrefix,
    vc_id: IdentifierPrefix,
    route: &str,
    reply_route: &str,
    dt: Option<DateTime<FixedOffset>>,
    dta: Option<DateTime<FixedOffset>>,
    dtb: Option<DateTime<FixedOffset>>,
    stamp: Option<DateTime<FixedOffset>>,
    format: SerializationFormats,
) -> Result<QueryEvent, Error> {
    QueryEvent::new(
        route,
        reply_route,
        QueryArgs {
            vc_id,
            registry_id,
            after_exact: dt,
            after: dta,
            before: dtb,
        },
        stamp.unwrap_or_else(now),
        format,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::PublicKey;

    fn backer(tag: u8) -> BasicPrefix {
        BasicPrefix::Ed25519NT(PublicKey::new(vec![tag; 32]))
    }

    #[test]
    fn ample_reference_values() {
        let expected = [0, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6];
        for (n, expected) in expected.iter().enumerate() {
            assert_eq!(ample(n as u64), *expected, "ample({})", n);
        }
    }

    #[test]
    fn incept_validates_configuration() {
        // backers forbidden under the NoBackers trait
        assert!(incept(
            "DntNTPnDFBnmlO6J44LXCrzZTAmpe-82b7BmQGtL4QhM".parse().unwrap(),
            None,
            vec![backer(1)],
            vec![Config::NoBackers],
            SerializationFormats::JSON,
        )
        .is_err());

        // duplicate backers
        assert!(incept(
            "DntNTPnDFBnmlO6J44LXCrzZTAmpe-82b7BmQGtL4QhM".parse().unwrap(),
            None,
            vec![backer(1), backer(1)],
            vec![],
            SerializationFormats::JSON,
        )
        .is_err());

        // toad out of bounds
        assert!(incept(
            "DntNTPnDFBnmlO6J44LXCrzZTAmpe-82b7BmQGtL4QhM".parse().unwrap(),
            Some(3),
            vec![backer(1), backer(2)],
            vec![],
            SerializationFormats::JSON,
        )
        .is_err());

        // defaults: no backers means toad 0
        let vcp = incept(
            "DntNTPnDFBnmlO6J44LXCrzZTAmpe-82b7BmQGtL4QhM".parse().unwrap(),
            None,
            vec![],
            vec![Config::NoBackers],
            SerializationFormats::JSON,
        )
        .unwrap();
        match vcp.event_type {
            ManagerEventType::Vcp(inc) => assert_eq!(inc.backer_threshold, 0),
            _ => panic!("wrong event type"),
        }
    }

    #[test]
    fn rotation_set_algebra() {
        let prior = vec![backer(1), backer(2), backer(3)];

        let rotated =
            apply_cuts_and_adds(&prior, &[backer(2)], &[backer(4)]).unwrap();
        assert_eq!(rotated, vec![backer(1), backer(3), backer(4)]);

        // cut not in prior list
        assert!(apply_cuts_and_adds(&prior, &[backer(9)], &[]).is_err());
        // add already present
        assert!(apply_cuts_and_adds(&prior, &[], &[backer(3)]).is_err());
        // intersecting cuts and adds
        assert!(apply_cuts_and_adds(&prior, &[backer(2)], &[backer(2)]).is_err());
        // duplicates
        assert!(apply_cuts_and_adds(&prior, &[backer(2), backer(2)], &[]).is_err());
    }

    #[test]
    fn query_carries_both_bounds() {
        let dta: DateTime<FixedOffset> = "2021-01-01T00:00:00+00:00".parse().unwrap();
        let dtb: DateTime<FixedOffset> = "2022-01-01T00:00:00+00:00".parse().unwrap();
        let qry = query(
            "ELh3eYC2W_Su1izlvm0xxw01n3XK8bdV2Zb09IqlXB7A".parse().unwrap(),
            "Ezpq06UecHwzy-K9FpNoRxCJp2wIGM9u2Edk-PLMZ1H4".parse().unwrap(),
            "tels",
            "",
            None,
            Some(dta),
            Some(dtb),
            None,
            SerializationFormats::JSON,
        )
        .unwrap();
        assert_eq!(qry.args.after, Some(dta));
        assert_eq!(qry.args.before, Some(dtb));
    }
}
