//! plauder-net – Ereignisschleife und Verbindungsverwaltung
//!
//! Eine einzelne Schleife multiplext alle Sockets mit Bereitschaftspruefung
//! und nicht-blockierenden Lese-/Schreiboperationen:
//!
//! - [`Verbindung`] – Socket, Rahmen-Teiler und Sendepuffer einer
//!   TCP-Verbindung, plus Trennungs-Vormerkungen.
//! - [`EreignisSchleife`] – die Server-Schleife ueber Listener und N
//!   Verbindungen.
//! - [`KlientSchleife`] – dieselbe Semantik ueber genau einen Socket.
//! - [`Postausgang`] und die Handler-Traits – die Naht zwischen
//!   Protokollzustand (Vermittler bzw. Klient) und der Schleife.
//!
//! ## Concurrency-Modell
//! Saemtlicher Sitzungs-, Raum- und Verbindungszustand wird nur auf dem
//! Schleifen-Task veraendert (Single-Writer). Andere Threads reichen ihre
//! Absicht ausschliesslich ueber die Aufgaben-Warteschlange aus
//! plauder-core ein; deshalb kommen Registry und Raeume ohne Locks aus.

pub mod error;
pub mod handler;
pub mod klient;
pub mod schleife;
pub mod verbindung;

pub use error::NetzFehler;
pub use handler::{
    HandlerVerstoss, KlientAufgabe, KlientHandler, Postausgang, VermittlungsAufgabe,
    VermittlungsHandler,
};
pub use klient::KlientSchleife;
pub use schleife::{EreignisSchleife, SchleifenEinstellungen};
pub use verbindung::{LeseErgebnis, Verbindung};
