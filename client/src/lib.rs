//! plauder-client – Protokoll-Zustandsmaschine der Klientenseite
//!
//! Zustaende laufen nur vorwaerts:
//!
//! ```text
//! Start -> LoginGesendet -> Angemeldet -> Beendet
//!                 |                          ^
//!                 +---- Login abgelehnt -----+
//! ```
//!
//! Kommandos im falschen Zustand sind stille No-Ops (nichts wird
//! gesendet, nichts gepuffert); nur ein ungueltiger Raumname schlaegt
//! synchron beim Aufrufer fehl, ohne das Netz zu beruehren.

use plauder_core::RaumNameValidator;
use plauder_net::KlientHandler;
use plauder_protocol::{
    antwort_code, Antwort, KlientNachricht, Kontodaten, ServerNachricht, ServerPush, Status,
};

// ---------------------------------------------------------------------------
// Fehler und Ausgabe-Naht
// ---------------------------------------------------------------------------

/// Ein Raumname der der Grammatik `^#[A-Za-z0-9_@-]+$` nicht entspricht
#[derive(Debug, thiserror::Error)]
#[error("Ungueltiger Raumname: {0}")]
pub struct UngueltigerRaumName(pub String);

/// Senke fuer eingehende Chat-Nachrichten (CLI, GUI, Testrekorder)
pub trait ChatAusgabe: Send {
    /// Eine zugestellte Chat-Nachricht; `raum` nur bei Raumnachrichten
    fn chat_empfangen(&mut self, von: &str, text: &str, raum: Option<&str>);
}

// ---------------------------------------------------------------------------
// Zustandsmaschine
// ---------------------------------------------------------------------------

/// Protokollzustand des Clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KlientZustand {
    Start,
    LoginGesendet,
    Angemeldet,
    /// Terminal; es wird nichts mehr gesendet
    Beendet,
}

/// Die Klienten-Zustandsmaschine
///
/// Erzeugte Nachrichten landen im internen Ausgang; die
/// [`KlientSchleife`] holt sie nach jeder Runde ab und rahmt sie in den
/// Sendepuffer.
///
/// [`KlientSchleife`]: plauder_net::KlientSchleife
pub struct ChatKlient {
    zustand: KlientZustand,
    validator: RaumNameValidator,
    ausgang: Vec<KlientNachricht>,
    trennen: bool,
    ausgabe: Box<dyn ChatAusgabe>,
}

impl ChatKlient {
    /// Erstellt einen Client im Zustand `Start`
    pub fn neu(ausgabe: Box<dyn ChatAusgabe>) -> Self {
        Self {
            zustand: KlientZustand::Start,
            validator: RaumNameValidator::neu(),
            ausgang: Vec::new(),
            trennen: false,
            ausgabe,
        }
    }

    /// Der aktuelle Protokollzustand
    pub fn zustand(&self) -> KlientZustand {
        self.zustand
    }

    // -----------------------------------------------------------------------
    // Kommandos (vom Eingabe-Thread ueber die Warteschlange eingeplant)
    // -----------------------------------------------------------------------

    /// Sendet die Anmeldung; nur im Zustand `Start`
    pub fn anmelden(&mut self, name: &str, passwort: &str) {
        if self.zustand != KlientZustand::Start {
            return;
        }
        tracing::info!(name = %name, "Anmeldung wird gesendet");
        self.ausgang.push(KlientNachricht::Authenticate {
            user: Kontodaten {
                account_name: name.into(),
                password: passwort.into(),
            },
        });
        self.zustand = KlientZustand::LoginGesendet;
    }

    /// Sendet eine Chat-Nachricht; nur angemeldet
    pub fn nachricht_senden(&mut self, an: &str, text: &str) {
        if self.zustand != KlientZustand::Angemeldet {
            return;
        }
        self.ausgang.push(KlientNachricht::Chat {
            to: an.into(),
            message: text.into(),
        });
    }

    /// Betritt einen Raum; der Name wird vor dem Senden geprueft
    pub fn raum_betreten(&mut self, raum: &str) -> Result<(), UngueltigerRaumName> {
        if self.zustand != KlientZustand::Angemeldet {
            return Ok(());
        }
        if !self.validator.ist_gueltig(raum) {
            return Err(UngueltigerRaumName(raum.into()));
        }
        self.ausgang.push(KlientNachricht::Join { room: raum.into() });
        Ok(())
    }

    /// Verlaesst einen Raum; der Name wird vor dem Senden geprueft
    pub fn raum_verlassen(&mut self, raum: &str) -> Result<(), UngueltigerRaumName> {
        if self.zustand != KlientZustand::Angemeldet {
            return Ok(());
        }
        if !self.validator.ist_gueltig(raum) {
            return Err(UngueltigerRaumName(raum.into()));
        }
        self.ausgang.push(KlientNachricht::Leave { room: raum.into() });
        Ok(())
    }

    /// Nimmt einen Kontakt auf; nur angemeldet
    pub fn kontakt_hinzufuegen(&mut self, nutzer: &str) {
        if self.zustand != KlientZustand::Angemeldet {
            return;
        }
        self.ausgang.push(KlientNachricht::AddContact {
            user: nutzer.into(),
        });
    }

    /// Entfernt einen Kontakt; nur angemeldet
    pub fn kontakt_entfernen(&mut self, nutzer: &str) {
        if self.zustand != KlientZustand::Angemeldet {
            return;
        }
        self.ausgang.push(KlientNachricht::RemoveContact {
            user: nutzer.into(),
        });
    }

    /// Fragt die Kontaktliste ab; nur angemeldet
    pub fn kontakte_abfragen(&mut self) {
        if self.zustand != KlientZustand::Angemeldet {
            return;
        }
        self.ausgang.push(KlientNachricht::GetContacts);
    }

    /// Beendet die Sitzung sauber; nur angemeldet
    pub fn beenden(&mut self) {
        if self.zustand != KlientZustand::Angemeldet {
            return;
        }
        self.ausgang.push(KlientNachricht::Quit);
        self.zustand = KlientZustand::Beendet;
        self.trennen = true;
    }

    // -----------------------------------------------------------------------
    // Eingehende Nachrichten
    // -----------------------------------------------------------------------

    fn bei_antwort(&mut self, antwort: Antwort) {
        match self.zustand {
            KlientZustand::LoginGesendet => {
                if antwort.code == antwort_code::OK {
                    tracing::info!("Anmeldung angenommen");
                    self.zustand = KlientZustand::Angemeldet;
                    self.ausgang.push(KlientNachricht::Presence {
                        status: Some(Status::Online),
                    });
                } else {
                    tracing::warn!(
                        code = antwort.code,
                        nachricht = %antwort.message,
                        "Anmeldung abgelehnt"
                    );
                    self.zustand = KlientZustand::Beendet;
                    self.trennen = true;
                }
            }
            // Antworten ausserhalb der Anmeldung (z.B. auf
            // Kontakt-Anfragen) aendern den Zustand nicht
            _ => {
                tracing::debug!(code = antwort.code, nachricht = %antwort.message, "Antwort");
            }
        }
    }

    fn bei_chat(&mut self, von: String, text: String, raum: Option<String>) {
        if self.zustand != KlientZustand::Angemeldet {
            return;
        }
        self.ausgabe.chat_empfangen(&von, &text, raum.as_deref());
    }
}

impl KlientHandler for ChatKlient {
    fn bei_nachricht(&mut self, nachricht: ServerNachricht) {
        match nachricht {
            ServerNachricht::Antwort(antwort) => self.bei_antwort(antwort),
            ServerNachricht::Push(ServerPush::Probe) => {
                // Liveness-Signal des Servers; keine Antwort noetig
                tracing::trace!("Sonde empfangen");
            }
            ServerNachricht::Push(ServerPush::Chat {
                from,
                message,
                room,
            }) => self.bei_chat(from, message, room),
        }
    }

    fn ausgang_leeren(&mut self) -> Vec<KlientNachricht> {
        std::mem::take(&mut self.ausgang)
    }

    fn trennung_angefordert(&self) -> bool {
        self.trennen
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Rekorder fuer zugestellte Chat-Nachrichten
    #[derive(Default)]
    struct Rekorder {
        empfangen: Arc<Mutex<Vec<(String, String, Option<String>)>>>,
    }

    impl ChatAusgabe for Rekorder {
        fn chat_empfangen(&mut self, von: &str, text: &str, raum: Option<&str>) {
            self.empfangen
                .lock()
                .unwrap()
                .push((von.into(), text.into(), raum.map(String::from)));
        }
    }

    fn sut_start() -> (ChatKlient, Arc<Mutex<Vec<(String, String, Option<String>)>>>) {
        let rekorder = Rekorder::default();
        let empfangen = Arc::clone(&rekorder.empfangen);
        (ChatKlient::neu(Box::new(rekorder)), empfangen)
    }

    fn sut_angemeldet() -> (ChatKlient, Arc<Mutex<Vec<(String, String, Option<String>)>>>) {
        let (mut sut, empfangen) = sut_start();
        sut.anmelden("alice", "passwort");
        sut.bei_nachricht(ServerNachricht::antwort(antwort_code::OK, "OK"));
        let _ = sut.ausgang_leeren();
        (sut, empfangen)
    }

    #[test]
    fn anmelden_sendet_genau_eine_authenticate() {
        let (mut sut, _) = sut_start();
        sut.anmelden("alice", "passwort");

        assert_eq!(
            sut.ausgang_leeren(),
            vec![KlientNachricht::Authenticate {
                user: Kontodaten {
                    account_name: "alice".into(),
                    password: "passwort".into(),
                }
            }]
        );
        assert_eq!(sut.zustand(), KlientZustand::LoginGesendet);

        // Erneutes Anmelden ist ein No-Op
        sut.anmelden("alice", "passwort");
        assert!(sut.ausgang_leeren().is_empty());
    }

    #[test]
    fn erfolgreiche_anmeldung_sendet_presence_online() {
        let (mut sut, _) = sut_start();
        sut.anmelden("alice", "passwort");
        let _ = sut.ausgang_leeren();

        sut.bei_nachricht(ServerNachricht::antwort(antwort_code::OK, "OK"));

        assert_eq!(sut.zustand(), KlientZustand::Angemeldet);
        assert_eq!(
            sut.ausgang_leeren(),
            vec![KlientNachricht::Presence {
                status: Some(Status::Online)
            }]
        );
        assert!(!sut.trennung_angefordert());
    }

    #[test]
    fn abgelehnte_anmeldung_beendet_ohne_weitere_sendungen() {
        for code in [antwort_code::BAD_REQUEST, antwort_code::UNAUTHORIZED] {
            let (mut sut, _) = sut_start();
            sut.anmelden("alice", "passwort");
            let _ = sut.ausgang_leeren();

            sut.bei_nachricht(ServerNachricht::antwort(code, "error"));

            assert_eq!(sut.zustand(), KlientZustand::Beendet);
            assert!(sut.trennung_angefordert());
            assert!(sut.ausgang_leeren().is_empty());
        }
    }

    #[test]
    fn nachricht_senden_wenn_angemeldet() {
        let (mut sut, _) = sut_angemeldet();
        sut.nachricht_senden("bob", "message text");
        assert_eq!(
            sut.ausgang_leeren(),
            vec![KlientNachricht::Chat {
                to: "bob".into(),
                message: "message text".into()
            }]
        );
    }

    #[test]
    fn raum_betreten_und_verlassen_wenn_angemeldet() {
        let (mut sut, _) = sut_angemeldet();
        sut.raum_betreten("#raum").unwrap();
        sut.raum_verlassen("#raum").unwrap();
        assert_eq!(
            sut.ausgang_leeren(),
            vec![
                KlientNachricht::Join { room: "#raum".into() },
                KlientNachricht::Leave { room: "#raum".into() },
            ]
        );
    }

    #[test]
    fn ungueltiger_raumname_schlaegt_synchron_fehl() {
        let (mut sut, _) = sut_angemeldet();
        assert!(sut.raum_betreten("kein raum").is_err());
        assert!(sut.raum_verlassen("#a#b").is_err());
        assert!(sut.ausgang_leeren().is_empty());
    }

    #[test]
    fn beenden_sendet_quit_und_fordert_trennung_an() {
        let (mut sut, _) = sut_angemeldet();
        sut.beenden();
        assert_eq!(sut.ausgang_leeren(), vec![KlientNachricht::Quit]);
        assert_eq!(sut.zustand(), KlientZustand::Beendet);
        assert!(sut.trennung_angefordert());
    }

    #[test]
    fn kontakt_kommandos_wenn_angemeldet() {
        let (mut sut, _) = sut_angemeldet();
        sut.kontakt_hinzufuegen("bob");
        sut.kontakt_entfernen("bob");
        sut.kontakte_abfragen();
        assert_eq!(
            sut.ausgang_leeren(),
            vec![
                KlientNachricht::AddContact { user: "bob".into() },
                KlientNachricht::RemoveContact { user: "bob".into() },
                KlientNachricht::GetContacts,
            ]
        );
    }

    #[test]
    fn kommandos_ausserhalb_angemeldet_sind_no_ops() {
        // Start, LoginGesendet und Beendet senden nichts
        let zustaende: Vec<Box<dyn Fn() -> ChatKlient>> = vec![
            Box::new(|| sut_start().0),
            Box::new(|| {
                let (mut sut, _) = sut_start();
                sut.anmelden("alice", "pw");
                let _ = sut.ausgang_leeren();
                sut
            }),
            Box::new(|| {
                let (mut sut, _) = sut_angemeldet();
                sut.beenden();
                let _ = sut.ausgang_leeren();
                sut
            }),
        ];

        for bauen in zustaende {
            let mut sut = bauen();
            sut.nachricht_senden("bob", "text");
            sut.raum_betreten("#raum").unwrap();
            sut.raum_verlassen("#raum").unwrap();
            sut.kontakt_hinzufuegen("bob");
            sut.kontakt_entfernen("bob");
            sut.kontakte_abfragen();
            sut.beenden();
            assert!(
                sut.ausgang_leeren().is_empty(),
                "Zustand {:?} darf nichts senden",
                sut.zustand()
            );
        }
    }

    #[test]
    fn sonde_aendert_nichts() {
        let (mut sut, _) = sut_angemeldet();
        sut.bei_nachricht(ServerNachricht::probe());
        assert_eq!(sut.zustand(), KlientZustand::Angemeldet);
        assert!(sut.ausgang_leeren().is_empty());
    }

    #[test]
    fn eingehender_chat_geht_an_die_ausgabe() {
        let (mut sut, empfangen) = sut_angemeldet();
        sut.bei_nachricht(ServerNachricht::chat("bob", "hi", Some("#raum".into())));
        sut.bei_nachricht(ServerNachricht::chat("carol", "direkt", None));

        let empfangen = empfangen.lock().unwrap();
        assert_eq!(
            *empfangen,
            vec![
                ("bob".into(), "hi".into(), Some("#raum".into())),
                ("carol".into(), "direkt".into(), None),
            ]
        );
    }

    #[test]
    fn chat_vor_der_anmeldung_wird_nicht_zugestellt() {
        let (mut sut, empfangen) = sut_start();
        sut.bei_nachricht(ServerNachricht::chat("bob", "zu frueh", None));
        assert!(empfangen.lock().unwrap().is_empty());
    }

    #[test]
    fn antwort_im_angemeldeten_zustand_aendert_nichts() {
        let (mut sut, _) = sut_angemeldet();
        sut.bei_nachricht(ServerNachricht::antwort(antwort_code::OK, "bob,carol"));
        assert_eq!(sut.zustand(), KlientZustand::Angemeldet);
        assert!(sut.ausgang_leeren().is_empty());
    }
}
