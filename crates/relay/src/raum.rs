//! Raeume – Benannte Mitgliedsmengen mit Fan-Out
//!
//! Ein Raum entsteht beim ersten Betreten und wird geloescht sobald das
//! letzte Mitglied geht. Nachrichten an einen Raum gehen an alle
//! Mitglieder ausser dem Absender und tragen den Raumnamen im Umschlag.

use plauder_core::{RaumNameValidator, VerbindungsId};
use plauder_net::Postausgang;
use plauder_protocol::ServerNachricht;
use std::collections::{HashMap, HashSet};

use crate::error::VermittlungsFehler;

// ---------------------------------------------------------------------------
// ChatRaum
// ---------------------------------------------------------------------------

/// Die Mitglieder eines Raums
#[derive(Debug, Default)]
struct ChatRaum {
    mitglieder: HashSet<VerbindungsId>,
}

impl ChatRaum {
    fn betreten(&mut self, id: VerbindungsId) {
        self.mitglieder.insert(id);
    }

    fn verlassen(&mut self, id: VerbindungsId) {
        self.mitglieder.remove(&id);
    }

    fn ist_leer(&self) -> bool {
        self.mitglieder.is_empty()
    }
}

// ---------------------------------------------------------------------------
// RaumVerwaltung
// ---------------------------------------------------------------------------

/// Verwaltet alle Raeume des Servers
///
/// Wird nur vom Schleifen-Task angefasst; deshalb bewusst ohne Lock.
#[derive(Debug, Default)]
pub struct RaumVerwaltung {
    raeume: HashMap<String, ChatRaum>,
    validator: RaumNameValidator,
}

impl RaumVerwaltung {
    /// Erstellt eine leere Raumverwaltung
    pub fn neu() -> Self {
        Self::default()
    }

    /// Ob `name` der Raum-Grammatik entspricht
    pub fn ist_gueltiger_name(&self, name: &str) -> bool {
        self.validator.ist_gueltig(name)
    }

    /// Betritt einen Raum; legt ihn bei Bedarf an
    pub fn betreten(
        &mut self,
        raum_name: &str,
        id: VerbindungsId,
    ) -> Result<(), VermittlungsFehler> {
        if !self.ist_gueltiger_name(raum_name) {
            return Err(VermittlungsFehler::UngueltigerRaumName(raum_name.into()));
        }

        let raum = self.raeume.entry(raum_name.to_string()).or_insert_with(|| {
            tracing::debug!(raum = %raum_name, "Raum angelegt");
            ChatRaum::default()
        });
        raum.betreten(id);
        Ok(())
    }

    /// Verlaesst einen Raum; loescht ihn wenn er leer wird
    pub fn verlassen(
        &mut self,
        raum_name: &str,
        id: VerbindungsId,
    ) -> Result<(), VermittlungsFehler> {
        if !self.ist_gueltiger_name(raum_name) {
            return Err(VermittlungsFehler::UngueltigerRaumName(raum_name.into()));
        }

        self.verlassen_still(raum_name, id);
        Ok(())
    }

    /// Entfernt die Verbindung aus allen Raeumen (Trennungs-Aufraeumen)
    ///
    /// Ohne Verlassens-Log pro Raum – das unterscheidet das Aufraeumen
    /// vom expliziten `leave` nur in der Beobachtbarkeit.
    pub fn alle_verlassen(&mut self, id: VerbindungsId) {
        let betroffene: Vec<String> = self
            .raeume
            .iter()
            .filter(|(_, raum)| raum.mitglieder.contains(&id))
            .map(|(name, _)| name.clone())
            .collect();
        for raum_name in betroffene {
            self.verlassen_still(&raum_name, id);
        }
    }

    /// Fan-Out einer Raumnachricht an alle Mitglieder ausser dem Absender
    ///
    /// Ein unbekannter Raum wird still ignoriert.
    pub fn nachricht_senden(
        &self,
        raum_name: &str,
        von: VerbindungsId,
        von_name: &str,
        text: &str,
        post: &mut Postausgang,
    ) {
        let Some(raum) = self.raeume.get(raum_name) else {
            return;
        };

        tracing::info!(raum = %raum_name, von = %von_name, "Raumnachricht");
        for mitglied in &raum.mitglieder {
            if *mitglied != von {
                post.sende(
                    *mitglied,
                    ServerNachricht::chat(von_name, text, Some(raum_name.to_string())),
                );
            }
        }
    }

    /// Ob der Raum derzeit existiert
    pub fn existiert(&self, raum_name: &str) -> bool {
        self.raeume.contains_key(raum_name)
    }

    /// Anzahl der Mitglieder eines Raums (0 wenn es ihn nicht gibt)
    pub fn mitglieder_anzahl(&self, raum_name: &str) -> usize {
        self.raeume
            .get(raum_name)
            .map(|raum| raum.mitglieder.len())
            .unwrap_or(0)
    }

    fn verlassen_still(&mut self, raum_name: &str, id: VerbindungsId) {
        let Some(raum) = self.raeume.get_mut(raum_name) else {
            return;
        };
        raum.verlassen(id);
        if raum.ist_leer() {
            tracing::info!(raum = %raum_name, "Leerer Raum entfernt");
            self.raeume.remove(raum_name);
        }
    }
}
