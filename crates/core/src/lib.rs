//! plauder-core – Gemeinsame Typen, Fehlertypen und Basisbausteine
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Plauder-Crates gemeinsam genutzt werden: Verbindungs-IDs, den
//! zentralen Fehler-Enum, die thread-sichere Aufgaben-Warteschlange und
//! den Raumnamen-Validator.

pub mod error;
pub mod executor;
pub mod types;
pub mod validator;

// Re-Exporte fuer bequemen Zugriff
pub use error::{PlauderFehler, Result};
pub use executor::{aufgaben_paar, AufgabenPlaner, AufgabenSchlange};
pub use types::VerbindungsId;
pub use validator::RaumNameValidator;
