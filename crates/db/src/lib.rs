//! plauder-db – Zugangsdaten- und Kontaktspeicher
//!
//! Der externe Mitarbeiter des Protokollkerns: Registrierung mit Namens-
//! und Passwort-Richtlinie, Zugangsdaten-Pruefung (Argon2id) und die
//! Kontaktliste pro Nutzer. Der Kern konsultiert diese Traits nur; eine
//! persistente Implementierung ist austauschbar, hier liegt die
//! In-Memory-Variante fuer Betrieb und Tests.

pub mod error;
pub mod kontakte;
pub mod speicher;

// Bequeme Re-Exporte
pub use error::SpeicherFehler;
pub use kontakte::{InMemoryKontaktSpeicher, KontaktSpeicher};
pub use speicher::{InMemoryNutzerSpeicher, Nutzer, NutzerSpeicher};
