//! Handler-Naht zwischen Schleife und Protokollzustand
//!
//! Handler fassen keine Sockets an. Sie bekommen dekodierte Nachrichten
//! und legen ihre Wirkung als ausgehende Post ab: null oder mehr
//! typisierte Nachrichten an beliebige Verbindungen plus
//! Trennungswuensche. Die Schleife kodiert, puffert und schreibt, sobald
//! die Sockets es zulassen.

use plauder_core::VerbindungsId;
use plauder_protocol::{KlientNachricht, ServerNachricht};

// ---------------------------------------------------------------------------
// Postausgang
// ---------------------------------------------------------------------------

/// Ausgehende Wirkung einer Handler-Runde
#[derive(Debug, Default)]
pub struct Postausgang {
    nachrichten: Vec<(VerbindungsId, ServerNachricht)>,
    trennungen: Vec<VerbindungsId>,
}

impl Postausgang {
    /// Erstellt einen leeren Postausgang
    pub fn neu() -> Self {
        Self::default()
    }

    /// Plant eine Nachricht an die angegebene Verbindung ein
    pub fn sende(&mut self, an: VerbindungsId, nachricht: ServerNachricht) {
        self.nachrichten.push((an, nachricht));
    }

    /// Merkt die Verbindung zur geordneten Trennung vor
    ///
    /// Geordnet heisst: der Sendepuffer wird erst leergeschrieben, dann
    /// geschlossen.
    pub fn trenne(&mut self, id: VerbindungsId) {
        self.trennungen.push(id);
    }

    /// Die eingeplanten Nachrichten in Einplan-Reihenfolge
    pub fn nachrichten(&self) -> &[(VerbindungsId, ServerNachricht)] {
        &self.nachrichten
    }

    /// Die vorgemerkten Trennungen
    pub fn trennungen(&self) -> &[VerbindungsId] {
        &self.trennungen
    }

    /// Entnimmt den gesamten Inhalt (Nachrichten, Trennungen)
    pub fn leeren(&mut self) -> (Vec<(VerbindungsId, ServerNachricht)>, Vec<VerbindungsId>) {
        (
            std::mem::take(&mut self.nachrichten),
            std::mem::take(&mut self.trennungen),
        )
    }
}

// ---------------------------------------------------------------------------
// Handler-Traits
// ---------------------------------------------------------------------------

/// Ein Protokollverstoss aus einem Handler; fatal fuer die Verbindung
#[derive(Debug, thiserror::Error)]
#[error("Protokollverstoss: {0}")]
pub struct HandlerVerstoss(pub String);

/// Server-seitiger Protokoll-Handler
///
/// Laeuft ausschliesslich auf dem Schleifen-Task; alle Methoden duerfen
/// Sitzungs- und Raumzustand ohne Synchronisation veraendern.
pub trait VermittlungsHandler {
    /// Eine neue Verbindung wurde akzeptiert
    fn bei_verbindung(&mut self, id: VerbindungsId);

    /// Eine dekodierte Nachricht der Verbindung `id`
    ///
    /// Ein `Err` ist ein Protokollverstoss und fuehrt zur Trennung der
    /// Verbindung.
    fn bei_nachricht(
        &mut self,
        id: VerbindungsId,
        nachricht: KlientNachricht,
        post: &mut Postausgang,
    ) -> Result<(), HandlerVerstoss>;

    /// Die Verbindung ist weg (geordnet oder durch Fehler); wird pro
    /// Verbindung genau einmal gerufen
    fn bei_trennung(&mut self, id: VerbindungsId);
}

/// Client-seitiger Protokoll-Handler
pub trait KlientHandler {
    /// Eine dekodierte Server-Nachricht
    fn bei_nachricht(&mut self, nachricht: ServerNachricht);

    /// Holt die in dieser Runde erzeugten ausgehenden Nachrichten ab
    fn ausgang_leeren(&mut self) -> Vec<KlientNachricht>;

    /// Ob der Handler die Verbindung beenden moechte
    fn trennung_angefordert(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Aufgaben-Typen
// ---------------------------------------------------------------------------

/// Eine vom Kommando-Thread eingeplante Aufgabe fuer die Server-Schleife
///
/// Bekommt exklusiven Zugriff auf den Handler und einen Postausgang –
/// der einzige sanktionierte Weg, Schleifen-Zustand von aussen zu
/// veraendern.
pub type VermittlungsAufgabe<V> = Box<dyn FnOnce(&mut V, &mut Postausgang) + Send>;

/// Eine eingeplante Aufgabe fuer die Klienten-Schleife
pub type KlientAufgabe<K> = Box<dyn FnOnce(&mut K) + Send>;

#[cfg(test)]
mod tests {
    use super::*;
    use plauder_protocol::antwort_code;

    #[test]
    fn postausgang_haelt_reihenfolge() {
        let mut post = Postausgang::neu();
        post.sende(VerbindungsId(1), ServerNachricht::probe());
        post.sende(
            VerbindungsId(2),
            ServerNachricht::antwort(antwort_code::OK, "ok"),
        );
        post.trenne(VerbindungsId(1));

        let (nachrichten, trennungen) = post.leeren();
        assert_eq!(nachrichten.len(), 2);
        assert_eq!(nachrichten[0].0, VerbindungsId(1));
        assert_eq!(nachrichten[1].0, VerbindungsId(2));
        assert_eq!(trennungen, vec![VerbindungsId(1)]);
    }

    #[test]
    fn leeren_hinterlaesst_leeren_ausgang() {
        let mut post = Postausgang::neu();
        post.sende(VerbindungsId(1), ServerNachricht::probe());
        let _ = post.leeren();
        assert!(post.nachrichten().is_empty());
        assert!(post.trennungen().is_empty());
    }
}
