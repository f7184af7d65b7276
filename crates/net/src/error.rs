//! Fehlertypen der Netzschicht
//!
//! `WouldBlock` ist hier bewusst KEIN Fehler – "gerade keine Daten" laesst
//! die Schleife einfach weiterlaufen. Alles in diesem Enum ist fuer die
//! betroffene Verbindung fatal.

use plauder_protocol::ProtokollFehler;
use thiserror::Error;

/// Verbindungs-fatale Fehler der Ereignisschleife
#[derive(Debug, Error)]
pub enum NetzFehler {
    /// Der Socket hat 0 Bytes angenommen obwohl der Sendepuffer nicht
    /// leer war – kein Wiederholungsfall
    #[error("Socket nimmt keine Bytes an")]
    SchreibenFehlgeschlagen,

    /// Protokollverstoss (Null-Laenge, kaputtes JSON, unbekannter
    /// Diskriminant, zu grosser Rahmen)
    #[error(transparent)]
    Protokoll(#[from] ProtokollFehler),

    /// Harter I/O-Fehler des Sockets
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
