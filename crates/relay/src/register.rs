//! Auth-Register – Angemeldete Sitzungen, indiziert nach Namen
//!
//! Invariante: hoechstens eine angemeldete Verbindung pro Name. Eine
//! Neuregistrierung desselben Namens verdraengt den bisherigen Inhaber;
//! das Entfernen ist deshalb bedingt – nur der aktuelle Inhaber kann
//! seinen Eintrag loeschen, die verdraengte Verbindung kann den neuen
//! Inhaber nicht mehr austragen.

use plauder_core::VerbindungsId;
use std::collections::HashMap;

/// Name -> angemeldete Verbindung
#[derive(Debug, Default)]
pub struct AuthRegister {
    eintraege: HashMap<String, VerbindungsId>,
}

impl AuthRegister {
    /// Erstellt ein leeres Register
    pub fn neu() -> Self {
        Self::default()
    }

    /// Registriert `id` unter `name`
    ///
    /// Gibt die dabei verdraengte Verbindung zurueck, falls der Name
    /// bereits vergeben war.
    pub fn registrieren(&mut self, name: impl Into<String>, id: VerbindungsId) -> Option<VerbindungsId> {
        self.eintraege.insert(name.into(), id)
    }

    /// Entfernt den Eintrag fuer `name`, aber nur solange `id` noch der
    /// Inhaber ist
    ///
    /// Gibt `true` zurueck wenn tatsaechlich entfernt wurde.
    pub fn entfernen(&mut self, name: &str, id: VerbindungsId) -> bool {
        match self.eintraege.get(name) {
            Some(inhaber) if *inhaber == id => {
                self.eintraege.remove(name);
                true
            }
            _ => false,
        }
    }

    /// Sucht die Verbindung eines angemeldeten Namens
    pub fn finde(&self, name: &str) -> Option<VerbindungsId> {
        self.eintraege.get(name).copied()
    }

    /// Alle angemeldeten Verbindungen
    pub fn alle(&self) -> impl Iterator<Item = VerbindungsId> + '_ {
        self.eintraege.values().copied()
    }

    /// Anzahl der angemeldeten Namen
    pub fn anzahl(&self) -> usize {
        self.eintraege.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registrieren_und_finden() {
        let mut sut = AuthRegister::neu();
        assert!(sut.registrieren("alice", VerbindungsId(1)).is_none());
        assert_eq!(sut.finde("alice"), Some(VerbindungsId(1)));
        assert_eq!(sut.finde("bob"), None);
    }

    #[test]
    fn neuregistrierung_verdraengt_inhaber() {
        let mut sut = AuthRegister::neu();
        sut.registrieren("alice", VerbindungsId(1));
        let verdraengt = sut.registrieren("alice", VerbindungsId(2));
        assert_eq!(verdraengt, Some(VerbindungsId(1)));
        assert_eq!(sut.finde("alice"), Some(VerbindungsId(2)));
        assert_eq!(sut.anzahl(), 1);
    }

    #[test]
    fn nur_der_inhaber_kann_entfernen() {
        let mut sut = AuthRegister::neu();
        sut.registrieren("alice", VerbindungsId(1));
        sut.registrieren("alice", VerbindungsId(2));

        // Die verdraengte Verbindung entfernt den neuen Inhaber nicht
        assert!(!sut.entfernen("alice", VerbindungsId(1)));
        assert_eq!(sut.finde("alice"), Some(VerbindungsId(2)));

        assert!(sut.entfernen("alice", VerbindungsId(2)));
        assert_eq!(sut.finde("alice"), None);
    }

    #[test]
    fn entfernen_unbekannter_name_ist_harmlos() {
        let mut sut = AuthRegister::neu();
        assert!(!sut.entfernen("niemand", VerbindungsId(1)));
    }
}
