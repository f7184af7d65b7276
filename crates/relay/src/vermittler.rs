//! Vermittler – Die Protokoll-Logik des Servers
//!
//! Implementiert den [`VermittlungsHandler`] der Ereignisschleife:
//! nimmt dekodierte Client-Nachrichten entgegen, prueft den Auth-Guard
//! und legt Antworten, Weiterleitungen und Trennungswuensche im
//! [`Postausgang`] ab.
//!
//! ## Auth-Guard
//! Jeder anmeldepflichtige Handler beginnt mit einem expliziten
//! Guard-Aufruf. Nicht angemeldete Verbindungen bekommen eine
//! 401-Antwort und der eigentliche Handler laeuft nicht; getrennt wird
//! auf diesem Weg nie.
//!
//! ## Doppelte Anmeldung
//! Meldet sich ein Name an, der bereits vergeben ist, gewinnt die neue
//! Verbindung: der bisherige Inhaber verliert seinen Registereintrag und
//! wird getrennt.

use plauder_core::VerbindungsId;
use plauder_db::KontaktSpeicher;
use plauder_net::{HandlerVerstoss, Postausgang, VermittlungsHandler};
use plauder_protocol::{antwort_code, KlientNachricht, Kontodaten, ServerNachricht, Status};
use std::collections::HashMap;
use std::sync::Arc;

use crate::anmeldung::Anmeldepruefung;
use crate::raum::RaumVerwaltung;
use crate::register::AuthRegister;

/// Antworttext des Auth-Guards
const NUR_ANGEMELDETE: &str = "Allowed only for authed users";

// ---------------------------------------------------------------------------
// Sitzung
// ---------------------------------------------------------------------------

/// Server-seitiger Sitzungszustand einer Verbindung
///
/// Wird nur vom Schleifen-Task veraendert. Sitzungen werden nie
/// zusammengelegt; Identitaet ist die Verbindung.
#[derive(Debug, Default)]
pub struct Sitzung {
    /// Der beim Login gesetzte Name
    pub name: Option<String>,
    /// Ob die Sitzung angemeldet ist
    pub angemeldet: bool,
}

// ---------------------------------------------------------------------------
// Vermittler
// ---------------------------------------------------------------------------

/// Die Server-Protokoll-Logik: Sitzungen, Register, Raeume, Kontakte
pub struct Vermittler<K: KontaktSpeicher> {
    sitzungen: HashMap<VerbindungsId, Sitzung>,
    register: AuthRegister,
    raeume: RaumVerwaltung,
    anmeldung: Box<dyn Anmeldepruefung>,
    kontakte: Arc<K>,
}

impl<K: KontaktSpeicher> Vermittler<K> {
    /// Erstellt einen Vermittler mit eingesteckter Anmeldepruefung
    pub fn neu(anmeldung: Box<dyn Anmeldepruefung>, kontakte: Arc<K>) -> Self {
        Self {
            sitzungen: HashMap::new(),
            register: AuthRegister::neu(),
            raeume: RaumVerwaltung::neu(),
            anmeldung,
            kontakte,
        }
    }

    /// Sendet eine Sonde an jede angemeldete Sitzung
    ///
    /// Wird vom Sonden-Timer ueber die Aufgaben-Warteschlange eingeplant.
    pub fn sonden_senden(&mut self, post: &mut Postausgang) {
        for id in self.register.alle() {
            post.sende(id, ServerNachricht::probe());
        }
    }

    /// Die Sitzung einer Verbindung (fuer Tests und Diagnose)
    pub fn sitzung(&self, id: VerbindungsId) -> Option<&Sitzung> {
        self.sitzungen.get(&id)
    }

    /// Das Auth-Register (lesend)
    pub fn register(&self) -> &AuthRegister {
        &self.register
    }

    /// Die Raumverwaltung (lesend)
    pub fn raeume(&self) -> &RaumVerwaltung {
        &self.raeume
    }

    // -----------------------------------------------------------------------
    // Auth-Guard
    // -----------------------------------------------------------------------

    /// Expliziter Guard fuer anmeldepflichtige Handler
    ///
    /// Gibt `false` zurueck und beantwortet die Nachricht mit 401 wenn
    /// die Verbindung nicht angemeldet ist.
    fn nur_angemeldet(&self, id: VerbindungsId, post: &mut Postausgang) -> bool {
        let angemeldet = self
            .sitzungen
            .get(&id)
            .map(|sitzung| sitzung.angemeldet)
            .unwrap_or(false);

        if !angemeldet {
            tracing::warn!(%id, "Nachricht nur fuer angemeldete Nutzer erlaubt");
            post.sende(
                id,
                ServerNachricht::antwort(antwort_code::UNAUTHORIZED, NUR_ANGEMELDETE),
            );
        }
        angemeldet
    }

    /// Der Name der (angemeldeten) Sitzung
    fn sitzungs_name(&self, id: VerbindungsId) -> Option<String> {
        self.sitzungen.get(&id).and_then(|s| s.name.clone())
    }

    // -----------------------------------------------------------------------
    // Handler
    // -----------------------------------------------------------------------

    fn bei_auth(&mut self, id: VerbindungsId, konto: Kontodaten, post: &mut Postausgang) {
        let Kontodaten {
            account_name: name,
            password: passwort,
        } = konto;

        // Ein Name der wie ein Raum aussieht wuerde das Chat-Routing
        // zweideutig machen
        if self.raeume.ist_gueltiger_name(&name) {
            tracing::warn!(%id, name = %name, "Anmeldung mit Raumnamen abgelehnt");
            post.sende(
                id,
                ServerNachricht::antwort(antwort_code::BAD_REQUEST, "Invalid name"),
            );
            return;
        }

        if !self.anmeldung.pruefen(&name, &passwort) {
            tracing::warn!(%id, name = %name, "Zugangsdaten abgelehnt");
            post.sende(
                id,
                ServerNachricht::antwort(antwort_code::UNAUTHORIZED, "Invalid credentials"),
            );
            return;
        }

        // Erneute Anmeldung derselben Verbindung unter neuem Namen:
        // alten Eintrag freigeben
        if let Some(sitzung) = self.sitzungen.get_mut(&id) {
            if let Some(alter_name) = sitzung.name.take() {
                self.register.entfernen(&alter_name, id);
            }
        }

        if let Some(verdraengt) = self.register.registrieren(name.clone(), id) {
            if verdraengt != id {
                tracing::warn!(
                    name = %name,
                    alte_verbindung = %verdraengt,
                    "Name neu vergeben – bisheriger Inhaber wird getrennt"
                );
                if let Some(alte_sitzung) = self.sitzungen.get_mut(&verdraengt) {
                    alte_sitzung.angemeldet = false;
                }
                post.trenne(verdraengt);
            }
        }

        if let Some(sitzung) = self.sitzungen.get_mut(&id) {
            sitzung.name = Some(name.clone());
            sitzung.angemeldet = true;
        }

        tracing::info!(%id, name = %name, "Anmeldung erfolgreich");
        post.sende(
            id,
            ServerNachricht::antwort(antwort_code::OK, "Login successful"),
        );
    }

    fn bei_quit(&mut self, id: VerbindungsId, post: &mut Postausgang) {
        tracing::debug!(%id, "Quit empfangen");
        post.trenne(id);
    }

    fn bei_presence(&mut self, id: VerbindungsId, status: Option<Status>, post: &mut Postausgang) {
        if !self.nur_angemeldet(id, post) {
            return;
        }
        tracing::info!(%id, status = ?status, "Presence");
    }

    fn bei_chat(&mut self, id: VerbindungsId, an: String, text: String, post: &mut Postausgang) {
        if !self.nur_angemeldet(id, post) {
            return;
        }
        let Some(absender) = self.sitzungs_name(id) else {
            return;
        };

        if self.raeume.ist_gueltiger_name(&an) {
            self.raeume.nachricht_senden(&an, id, &absender, &text, post);
            return;
        }

        // Direktnachricht: unbekannte Empfaenger und Nachrichten an sich
        // selbst werden still verworfen
        match self.register.finde(&an) {
            None => {
                tracing::debug!(von = %absender, an = %an, "Empfaenger unbekannt – verworfen");
            }
            Some(ziel) if ziel == id => {
                tracing::debug!(von = %absender, "Nachricht an sich selbst – verworfen");
            }
            Some(ziel) => {
                tracing::info!(von = %absender, an = %an, "Direktnachricht");
                post.sende(ziel, ServerNachricht::chat(absender, text, None));
            }
        }
    }

    fn bei_join(
        &mut self,
        id: VerbindungsId,
        raum: String,
        post: &mut Postausgang,
    ) -> Result<(), HandlerVerstoss> {
        if !self.nur_angemeldet(id, post) {
            return Ok(());
        }
        self.raeume.betreten(&raum, id)?;
        tracing::info!(%id, raum = %raum, "Raum betreten");
        Ok(())
    }

    fn bei_leave(
        &mut self,
        id: VerbindungsId,
        raum: String,
        post: &mut Postausgang,
    ) -> Result<(), HandlerVerstoss> {
        if !self.nur_angemeldet(id, post) {
            return Ok(());
        }
        self.raeume.verlassen(&raum, id)?;
        tracing::info!(%id, raum = %raum, "Raum verlassen");
        Ok(())
    }

    fn bei_add_contact(&mut self, id: VerbindungsId, nutzer: String, post: &mut Postausgang) {
        if !self.nur_angemeldet(id, post) {
            return;
        }
        let Some(inhaber) = self.sitzungs_name(id) else {
            return;
        };

        let antwort = match self.kontakte.kontakt_hinzufuegen(&inhaber, &nutzer) {
            Ok(()) => ServerNachricht::antwort(antwort_code::OK, "Contact added"),
            Err(fehler) => {
                tracing::debug!(inhaber = %inhaber, kontakt = %nutzer, fehler = %fehler, "Kontakt abgelehnt");
                ServerNachricht::antwort(antwort_code::BAD_REQUEST, fehler.to_string())
            }
        };
        post.sende(id, antwort);
    }

    fn bei_remove_contact(&mut self, id: VerbindungsId, nutzer: String, post: &mut Postausgang) {
        if !self.nur_angemeldet(id, post) {
            return;
        }
        let Some(inhaber) = self.sitzungs_name(id) else {
            return;
        };

        self.kontakte.kontakt_entfernen(&inhaber, &nutzer);
        post.sende(
            id,
            ServerNachricht::antwort(antwort_code::OK, "Contact removed"),
        );
    }

    fn bei_get_contacts(&mut self, id: VerbindungsId, post: &mut Postausgang) {
        if !self.nur_angemeldet(id, post) {
            return;
        }
        let Some(inhaber) = self.sitzungs_name(id) else {
            return;
        };

        let liste = self.kontakte.kontakte(&inhaber).join(",");
        post.sende(id, ServerNachricht::antwort(antwort_code::OK, liste));
    }
}

// ---------------------------------------------------------------------------
// VermittlungsHandler
// ---------------------------------------------------------------------------

impl<K: KontaktSpeicher> VermittlungsHandler for Vermittler<K> {
    fn bei_verbindung(&mut self, id: VerbindungsId) {
        tracing::debug!(%id, "Neue Verbindung");
        self.sitzungen.insert(id, Sitzung::default());
    }

    fn bei_nachricht(
        &mut self,
        id: VerbindungsId,
        nachricht: KlientNachricht,
        post: &mut Postausgang,
    ) -> Result<(), HandlerVerstoss> {
        match nachricht {
            KlientNachricht::Authenticate { user } => self.bei_auth(id, user, post),
            KlientNachricht::Quit => self.bei_quit(id, post),
            KlientNachricht::Presence { status } => self.bei_presence(id, status, post),
            KlientNachricht::Chat { to, message } => self.bei_chat(id, to, message, post),
            KlientNachricht::Join { room } => return self.bei_join(id, room, post),
            KlientNachricht::Leave { room } => return self.bei_leave(id, room, post),
            KlientNachricht::AddContact { user } => self.bei_add_contact(id, user, post),
            KlientNachricht::RemoveContact { user } => self.bei_remove_contact(id, user, post),
            KlientNachricht::GetContacts => self.bei_get_contacts(id, post),
        }
        Ok(())
    }

    fn bei_trennung(&mut self, id: VerbindungsId) {
        let Some(sitzung) = self.sitzungen.remove(&id) else {
            return;
        };

        if let Some(name) = &sitzung.name {
            self.register.entfernen(name, id);
        }
        self.raeume.alle_verlassen(id);

        tracing::info!(%id, name = ?sitzung.name, "Verbindung aufgeraeumt");
    }
}
