//! Sendepuffer – Ausgehende Bytes einer Verbindung
//!
//! Die Ereignisschleife schreibt nur so viele Bytes wie das Betriebssystem
//! annimmt; der Rest bleibt hier liegen bis der Socket wieder schreibbar
//! ist.

use bytes::{Buf, BytesMut};

use crate::error::ProtokollFehler;

/// Anhaengen-bis-abgeflossen Byte-Warteschlange pro Verbindung
#[derive(Debug, Default)]
pub struct SendePuffer {
    daten: BytesMut,
}

impl SendePuffer {
    /// Erstellt einen leeren Sendepuffer
    pub fn neu() -> Self {
        Self {
            daten: BytesMut::new(),
        }
    }

    /// Haengt Bytes ans Ende an
    pub fn anhaengen(&mut self, daten: &[u8]) {
        self.daten.extend_from_slice(daten);
    }

    /// Die derzeit gepufferten, noch nicht gesendeten Bytes
    pub fn daten(&self) -> &[u8] {
        &self.daten
    }

    /// Ob der Puffer leer ist
    pub fn ist_leer(&self) -> bool {
        self.daten.is_empty()
    }

    /// Anzahl der gepufferten Bytes
    pub fn laenge(&self) -> usize {
        self.daten.len()
    }

    /// Entfernt die ersten `anzahl` Bytes nach erfolgreichem Senden
    ///
    /// Mehr zu bestaetigen als gepuffert ist, ist ein Fehler des Aufrufers
    /// (behauptet mehr gesendet zu haben als dem Socket angeboten wurde).
    pub fn gesendet(&mut self, anzahl: usize) -> Result<(), ProtokollFehler> {
        if anzahl > self.daten.len() {
            return Err(ProtokollFehler::MehrGesendetAlsVorhanden {
                bestaetigt: anzahl,
                gepuffert: self.daten.len(),
            });
        }
        self.daten.advance(anzahl);
        Ok(())
    }
}
