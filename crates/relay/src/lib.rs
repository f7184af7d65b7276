//! plauder-relay – Server-seitige Vermittlung
//!
//! Dieses Crate implementiert die Protokoll-Logik des Servers:
//!
//! - [`Vermittler`] – der [`VermittlungsHandler`] der Ereignisschleife:
//!   Authentifizierung mit explizitem Auth-Guard, Nachrichten-Routing,
//!   Kontakte, Sonden-Broadcast und Trennungs-Aufraeumarbeiten.
//! - [`AuthRegister`] – Name -> Verbindung, hoechstens eine angemeldete
//!   Sitzung pro Name.
//! - [`RaumVerwaltung`] – Raeume entstehen beim ersten Betreten und
//!   verschwinden mit dem letzten Mitglied.
//!
//! Der gesamte Zustand gehoert dem Schleifen-Task; es gibt bewusst keine
//! Locks um Register oder Raeume (Single-Writer-Disziplin).
//!
//! [`VermittlungsHandler`]: plauder_net::VermittlungsHandler

pub mod anmeldung;
pub mod error;
pub mod raum;
pub mod register;
pub mod vermittler;

#[cfg(test)]
mod tests;

// Bequeme Re-Exporte
pub use anmeldung::{Anmeldepruefung, OffeneAnmeldung};
pub use error::VermittlungsFehler;
pub use raum::RaumVerwaltung;
pub use register::AuthRegister;
pub use vermittler::{Sitzung, Vermittler};
