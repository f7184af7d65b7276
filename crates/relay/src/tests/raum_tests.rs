//! Unit-Tests fuer die Raumverwaltung

use plauder_core::VerbindungsId;
use plauder_net::Postausgang;
use plauder_protocol::{ServerNachricht, ServerPush};

use crate::error::VermittlungsFehler;
use crate::raum::RaumVerwaltung;

const A: VerbindungsId = VerbindungsId(1);
const B: VerbindungsId = VerbindungsId(2);
const C: VerbindungsId = VerbindungsId(3);

#[test]
fn raum_entsteht_beim_ersten_betreten() {
    let mut sut = RaumVerwaltung::neu();
    assert!(!sut.existiert("#raum"));

    sut.betreten("#raum", A).unwrap();
    assert!(sut.existiert("#raum"));
    assert_eq!(sut.mitglieder_anzahl("#raum"), 1);
}

#[test]
fn ungueltiger_name_beim_betreten() {
    let mut sut = RaumVerwaltung::neu();
    let result = sut.betreten("kein raum", A);
    assert!(matches!(
        result,
        Err(VermittlungsFehler::UngueltigerRaumName(_))
    ));
    assert!(!sut.existiert("kein raum"));
}

#[test]
fn ungueltiger_name_beim_verlassen() {
    let mut sut = RaumVerwaltung::neu();
    let result = sut.verlassen("#raum#raum", A);
    assert!(matches!(
        result,
        Err(VermittlungsFehler::UngueltigerRaumName(_))
    ));
}

#[test]
fn letztes_mitglied_loescht_den_raum() {
    let mut sut = RaumVerwaltung::neu();
    sut.betreten("#raum", A).unwrap();
    sut.betreten("#raum", B).unwrap();

    sut.verlassen("#raum", A).unwrap();
    assert!(sut.existiert("#raum"));

    sut.verlassen("#raum", B).unwrap();
    assert!(!sut.existiert("#raum"));
}

#[test]
fn raum_wird_nach_loeschung_neu_angelegt() {
    let mut sut = RaumVerwaltung::neu();
    sut.betreten("#raum", A).unwrap();
    sut.verlassen("#raum", A).unwrap();
    assert!(!sut.existiert("#raum"));

    // Wieder-Betreten legt einen frischen Raum an, kein Wiederverwenden
    sut.betreten("#raum", B).unwrap();
    assert_eq!(sut.mitglieder_anzahl("#raum"), 1);
}

#[test]
fn verlassen_eines_unbekannten_raums_ist_folgenlos() {
    let mut sut = RaumVerwaltung::neu();
    sut.verlassen("#raum", A).unwrap();
}

#[test]
fn fanout_erreicht_alle_ausser_dem_absender() {
    let mut sut = RaumVerwaltung::neu();
    sut.betreten("#raum", A).unwrap();
    sut.betreten("#raum", B).unwrap();
    sut.betreten("#raum", C).unwrap();

    let mut post = Postausgang::neu();
    sut.nachricht_senden("#raum", A, "alice", "hi", &mut post);

    let empfaenger: Vec<VerbindungsId> =
        post.nachrichten().iter().map(|(id, _)| *id).collect();
    assert_eq!(empfaenger.len(), 2);
    assert!(empfaenger.contains(&B));
    assert!(empfaenger.contains(&C));
    assert!(!empfaenger.contains(&A));

    for (_, nachricht) in post.nachrichten() {
        assert_eq!(
            *nachricht,
            ServerNachricht::Push(ServerPush::Chat {
                from: "alice".into(),
                message: "hi".into(),
                room: Some("#raum".into()),
            })
        );
    }
}

#[test]
fn nachricht_an_unbekannten_raum_wird_verworfen() {
    let sut = RaumVerwaltung::neu();
    let mut post = Postausgang::neu();
    sut.nachricht_senden("#nirgendwo", A, "alice", "hi", &mut post);
    assert!(post.nachrichten().is_empty());
}

#[test]
fn alle_verlassen_raeumt_jeden_raum_auf() {
    let mut sut = RaumVerwaltung::neu();
    sut.betreten("#eins", A).unwrap();
    sut.betreten("#zwei", A).unwrap();
    sut.betreten("#zwei", B).unwrap();

    sut.alle_verlassen(A);

    assert!(!sut.existiert("#eins"));
    assert!(sut.existiert("#zwei"));
    assert_eq!(sut.mitglieder_anzahl("#zwei"), 1);
}
