use std::sync::Arc;

use serde::Serialize;
use tempfile::Builder;

use vdr::{
    database::EventDatabase,
    error::Error,
    event::{manager_event::Config, Event, VerifiableEvent},
    event_generator,
    event_message::serialization_info::{SerializationFormats, SerializationInfo},
    kel::KelLog,
    prefix::{IdentifierPrefix, Prefix, SelfAddressing},
    processor::Tevery,
    seal::{EventSeal, EventSourceSeal, Seal},
};

const ISSUER: &str = "DntNTPnDFBnmlO6J44LXCrzZTAmpe-82b7BmQGtL4QhM";

#[derive(Serialize)]
struct KelIxn {
    v: SerializationInfo,
    i: String,
    s: String,
    t: String,
    a: Vec<Seal>,
}

fn anchored(kel: &KelLog, issuer: &IdentifierPrefix, sn: u64, event: Event) -> VerifiableEvent {
    let seal = EventSeal {
        prefix: event.get_prefix(),
        sn: event.get_sn(),
        event_digest: event.get_digest().unwrap(),
    };
    let raw = serde_json::to_vec(&KelIxn {
        v: SerializationInfo::new(SerializationFormats::JSON, 0),
        i: issuer.to_str(),
        s: format!("{:x}", sn),
        t: "ixn".to_string(),
        a: vec![Seal::Event(seal)],
    })
    .unwrap();
    let digest = SelfAddressing::Blake3_256.derive(&raw);
    kel.insert_event(issuer, sn, raw).unwrap();
    VerifiableEvent::new(event, EventSourceSeal::new(sn, digest), vec![])
}

fn setup() -> (Arc<KelLog>, Arc<EventDatabase>) {
    let kel_root = Builder::new().prefix("test-kel").tempdir().unwrap();
    let tel_root = Builder::new().prefix("test-tel").tempdir().unwrap();
    let kel = Arc::new(KelLog::new(kel_root.into_path().as_path()).unwrap());
    let reger = Arc::new(EventDatabase::new(tel_root.into_path().as_path()).unwrap());
    (kel, reger)
}

#[test]
fn test_backerless_registry_processing() -> Result<(), Error> {
    let (kel, reger) = setup();
    let issuer: IdentifierPrefix = ISSUER.parse().unwrap();
    let mut tevery = Tevery::new(kel.clone(), reger.clone(), None, false);

    let vcp = event_generator::incept(
        issuer.clone(),
        None,
        vec![],
        vec![Config::NoBackers],
        SerializationFormats::JSON,
    )?;
    let regk = vcp.prefix.clone();

    // events travel as raw bytes and are parsed back before processing
    let parsed = Event::parse(&vcp.serialize()?)?;
    assert_eq!(parsed, Event::Management(vcp));

    let vcp = anchored(&kel, &issuer, 1, parsed);
    tevery.process_event(vcp)?;

    let vc_id =
        IdentifierPrefix::SelfAddressing(SelfAddressing::Blake3_256.derive(b"a credential"));
    let iss = event_generator::issue(
        vc_id.clone(),
        regk.clone(),
        None,
        SerializationFormats::JSON,
    )?;
    let iss_digest = iss.get_digest()?;
    let iss = anchored(&kel, &issuer, 2, Event::Vc(iss));
    tevery.process_event(iss)?;

    assert!(tevery
        .tever(&regk)
        .unwrap()
        .vc_status(&vc_id)?
        .is_issued());

    let rev = event_generator::revoke(
        vc_id.clone(),
        regk.clone(),
        iss_digest,
        None,
        SerializationFormats::JSON,
    )?;
    let rev = anchored(&kel, &issuer, 3, Event::Vc(rev));
    tevery.process_event(rev)?;

    let tever = tevery.tever(&regk).unwrap();
    assert!(tever.vc_status(&vc_id)?.is_revoked());
    assert_eq!(tever.vc_sn(&vc_id), Some(1));

    // backerless registries never rotate
    let vrt = event_generator::rotate(
        regk.clone(),
        tever.state()?.last_event_digest,
        1,
        None,
        &[],
        vec![],
        vec![],
        SerializationFormats::JSON,
    )?;
    let vrt = anchored(&kel, &issuer, 4, Event::Management(vrt));
    assert!(matches!(
        tevery.process_event(vrt),
        Err(Error::SemanticError(_))
    ));

    Ok(())
}

#[test]
fn test_registry_state_reload() -> Result<(), Error> {
    let (kel, reger) = setup();
    let issuer: IdentifierPrefix = ISSUER.parse().unwrap();

    let vcp = event_generator::incept(
        issuer.clone(),
        None,
        vec![],
        vec![Config::NoBackers],
        SerializationFormats::JSON,
    )?;
    let regk = vcp.prefix.clone();
    let vc_id =
        IdentifierPrefix::SelfAddressing(SelfAddressing::Blake3_256.derive(b"kept credential"));
    let iss = event_generator::issue(
        vc_id.clone(),
        regk.clone(),
        None,
        SerializationFormats::JSON,
    )?;
    let iss_digest = iss.get_digest()?;

    let before;
    {
        let mut tevery = Tevery::new(kel.clone(), reger.clone(), None, false);
        tevery.process_event(anchored(&kel, &issuer, 1, Event::Management(vcp)))?;
        tevery.process_event(anchored(&kel, &issuer, 2, Event::Vc(iss)))?;
        before = tevery.tever(&regk).unwrap().state()?;
    }

    // a fresh facility recovers the registry from the persisted state
    let mut tevery = Tevery::new(kel.clone(), reger.clone(), None, false);
    let rev = event_generator::revoke(
        vc_id.clone(),
        regk.clone(),
        iss_digest,
        None,
        SerializationFormats::JSON,
    )?;
    tevery.process_event(anchored(&kel, &issuer, 3, Event::Vc(rev)))?;

    let tever = tevery.tever(&regk).unwrap();
    assert!(tever.vc_status(&vc_id)?.is_revoked());

    // reloaded state matches what was pinned, apart from the fresh stamp
    let after = tever.state()?;
    assert_eq!(after.registry_id, before.registry_id);
    assert_eq!(after.issuer, before.issuer);
    assert_eq!(after.sn, before.sn);
    assert_eq!(after.last_event_digest, before.last_event_digest);
    assert_eq!(after.backers, before.backers);
    assert_eq!(after.backer_threshold, before.backer_threshold);
    assert_eq!(after.config, before.config);

    // notices survive the wire
    let raw = after.serialize()?;
    let parsed: vdr::query::tel_state_notice::TelStateNotice =
        serde_json::from_slice(&raw).unwrap();
    assert_eq!(parsed, after);

    Ok(())
}
