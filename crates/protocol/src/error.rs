//! Fehlertypen der Protokollschicht
//!
//! Kodier- und Dekodierfehler sowie Rahmenverstoesse sind fuer die
//! betroffene Verbindung fatal; `MehrGesendetAlsVorhanden` zeigt dagegen
//! einen Programmierfehler des Aufrufers an und entsteht nie aus
//! Netzwerkeingaben.

use thiserror::Error;

/// Alle Fehler die beim Kodieren, Dekodieren und Rahmen auftreten koennen
#[derive(Debug, Error)]
pub enum ProtokollFehler {
    /// Serialisierung fehlgeschlagen (kein gueltiges UTF-8-JSON darstellbar)
    #[error("Kodierung fehlgeschlagen: {0}")]
    Kodierung(#[source] serde_json::Error),

    /// Ungueltiges UTF-8, kein JSON oder unbekannter Diskriminant
    #[error("Dekodierung fehlgeschlagen: {0}")]
    Dekodierung(#[source] serde_json::Error),

    /// Payload passt nicht in das 4-Byte-Laengenfeld bzw. ueberschreitet
    /// die konfigurierte Rahmen-Obergrenze
    #[error("Nachricht zu gross: {groesse} Bytes (Maximum: {maximum} Bytes)")]
    NachrichtZuGross { groesse: usize, maximum: usize },

    /// Rahmen mit Laenge 0 – ein Protokollverstoss, keine leere Nachricht
    #[error("Rahmen mit Laenge 0 empfangen")]
    NullLaenge,

    /// Es wurden mehr Bytes als gesendet bestaetigt als gepuffert waren
    #[error("Mehr bestaetigt als gepuffert: bestaetigt={bestaetigt}, gepuffert={gepuffert}")]
    MehrGesendetAlsVorhanden { bestaetigt: usize, gepuffert: usize },
}
