//! Kontaktspeicher – Kontaktliste pro Nutzer
//!
//! Doppeltes Hinzufuegen und Entfernen eines fehlenden Kontakts sind
//! bewusst folgenlos; nur der Selbst-Kontakt ist ein Fehler.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::SpeicherFehler;

/// Kontaktlisten-Speicher
pub trait KontaktSpeicher: Send + Sync {
    /// Nimmt `kontakt` in die Liste von `inhaber` auf
    ///
    /// Ein bereits vorhandener Kontakt bleibt unveraendert.
    fn kontakt_hinzufuegen(&self, inhaber: &str, kontakt: &str) -> Result<(), SpeicherFehler>;

    /// Entfernt `kontakt` aus der Liste von `inhaber` (fehlend: folgenlos)
    fn kontakt_entfernen(&self, inhaber: &str, kontakt: &str);

    /// Die Kontakte von `inhaber` in Aufnahme-Reihenfolge
    fn kontakte(&self, inhaber: &str) -> Vec<String>;
}

/// Kontaktspeicher im Arbeitsspeicher
#[derive(Debug, Default)]
pub struct InMemoryKontaktSpeicher {
    eintraege: Mutex<HashMap<String, Vec<String>>>,
}

impl InMemoryKontaktSpeicher {
    /// Erstellt einen leeren Speicher
    pub fn neu() -> Self {
        Self::default()
    }
}

impl KontaktSpeicher for InMemoryKontaktSpeicher {
    fn kontakt_hinzufuegen(&self, inhaber: &str, kontakt: &str) -> Result<(), SpeicherFehler> {
        if inhaber == kontakt {
            return Err(SpeicherFehler::SelbstKontakt);
        }

        let mut eintraege = self.eintraege.lock().unwrap_or_else(|e| e.into_inner());
        let liste = eintraege.entry(inhaber.to_string()).or_default();
        if liste.iter().any(|vorhanden| vorhanden == kontakt) {
            tracing::debug!(inhaber = %inhaber, kontakt = %kontakt, "Kontakt bereits vorhanden");
            return Ok(());
        }
        liste.push(kontakt.to_string());
        tracing::debug!(inhaber = %inhaber, kontakt = %kontakt, "Kontakt aufgenommen");
        Ok(())
    }

    fn kontakt_entfernen(&self, inhaber: &str, kontakt: &str) {
        let mut eintraege = self.eintraege.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(liste) = eintraege.get_mut(inhaber) {
            liste.retain(|vorhanden| vorhanden != kontakt);
        }
    }

    fn kontakte(&self, inhaber: &str) -> Vec<String> {
        let eintraege = self.eintraege.lock().unwrap_or_else(|e| e.into_inner());
        eintraege.get(inhaber).cloned().unwrap_or_default()
    }
}
