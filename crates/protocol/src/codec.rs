//! JSON-Codec mit Umschlag-Zeitstempel
//!
//! Kodieren haengt jedem ausgehenden Umschlag ein `time`-Feld an
//! (Unix-Epoche in Sekunden, Gleitkomma) – mit genau einer Ausnahme: der
//! abschliessenden `quit`-Nachricht. Dekodieren prueft UTF-8 und JSON in
//! einem Schritt und lehnt unbekannte Diskriminanten ab.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::ProtokollFehler;
use crate::nachricht::{KlientNachricht, ServerNachricht};
use crate::puffer::SendePuffer;
use crate::wire::rahmen_anhaengen;

// ---------------------------------------------------------------------------
// Zeitquelle
// ---------------------------------------------------------------------------

/// Liefert den Umschlag-Zeitstempel; injizierbar fuer Tests
pub type Zeitquelle = fn() -> f64;

/// Aktuelle Unix-Epoche in Sekunden mit Mikrosekunden-Nachkommastellen
pub fn jetzt_epoche() -> f64 {
    let jetzt = chrono::Utc::now();
    jetzt.timestamp() as f64 + f64::from(jetzt.timestamp_subsec_micros()) / 1e6
}

// ---------------------------------------------------------------------------
// UmschlagNachricht
// ---------------------------------------------------------------------------

/// Eine Nachricht die als JSON-Umschlag auf den Draht geht
///
/// Beide Richtungen implementieren das Trait; `mit_zeitstempel` steuert ob
/// der Codec das `time`-Feld einsetzt.
pub trait UmschlagNachricht: Serialize {
    /// Ob der Umschlag einen `time`-Zeitstempel traegt
    fn mit_zeitstempel(&self) -> bool {
        true
    }
}

impl UmschlagNachricht for KlientNachricht {
    fn mit_zeitstempel(&self) -> bool {
        !matches!(self, KlientNachricht::Quit)
    }
}

impl UmschlagNachricht for ServerNachricht {}

// ---------------------------------------------------------------------------
// Kodieren / Dekodieren
// ---------------------------------------------------------------------------

/// Kodiert eine Nachricht als JSON-Payload, inklusive `time`-Feld
pub fn kodieren<N: UmschlagNachricht>(
    nachricht: &N,
    zeit: Zeitquelle,
) -> Result<Vec<u8>, ProtokollFehler> {
    let mut wert = serde_json::to_value(nachricht).map_err(ProtokollFehler::Kodierung)?;
    if nachricht.mit_zeitstempel() {
        // Jeder Umschlag ist ein JSON-Objekt; der Zeitstempel ist ein
        // Geschwisterfeld des Diskriminanten.
        if let Value::Object(felder) = &mut wert {
            felder.insert("time".into(), Value::from(zeit()));
        }
    }
    serde_json::to_vec(&wert).map_err(ProtokollFehler::Kodierung)
}

/// Dekodiert eine Rahmen-Payload zu einer typisierten Nachricht
///
/// Ungueltiges UTF-8, kaputtes JSON und unbekannte Diskriminanten ergeben
/// alle einen [`ProtokollFehler::Dekodierung`].
pub fn dekodieren<N: DeserializeOwned>(daten: &[u8]) -> Result<N, ProtokollFehler> {
    serde_json::from_slice(daten).map_err(ProtokollFehler::Dekodierung)
}

// ---------------------------------------------------------------------------
// NachrichtenSender
// ---------------------------------------------------------------------------

/// Kodiert Nachrichten und rahmt sie in einen [`SendePuffer`]
///
/// Buendelt Codec und Framing zum einen Schritt, den Handler brauchen:
/// typisierte Nachricht rein, gerahmte Bytes im Sendepuffer raus.
#[derive(Clone, Copy)]
pub struct NachrichtenSender {
    zeit: Zeitquelle,
}

impl NachrichtenSender {
    /// Erstellt einen Sender mit der Systemuhr als Zeitquelle
    pub fn neu() -> Self {
        Self { zeit: jetzt_epoche }
    }

    /// Erstellt einen Sender mit fester Zeitquelle (fuer Tests)
    pub fn mit_zeitquelle(zeit: Zeitquelle) -> Self {
        Self { zeit }
    }

    /// Kodiert, rahmt und haengt die Nachricht an den Sendepuffer an
    pub fn sende<N: UmschlagNachricht>(
        &self,
        nachricht: &N,
        puffer: &mut SendePuffer,
    ) -> Result<(), ProtokollFehler> {
        let nutzdaten = kodieren(nachricht, self.zeit)?;
        tracing::trace!(bytes = nutzdaten.len(), "Nachricht gerahmt");
        rahmen_anhaengen(&nutzdaten, puffer)
    }
}

impl Default for NachrichtenSender {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
