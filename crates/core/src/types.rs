//! Gemeinsame Identifikationstypen fuer Plauder
//!
//! Verwendet das Newtype-Pattern um Verwechslungen zwischen verschiedenen
//! ID-Arten zur Compilezeit auszuschliessen.

use serde::{Deserialize, Serialize};

/// Eindeutige ID einer TCP-Verbindung
///
/// Wird von der Ereignisschleife beim Accept vergeben und ist fuer die
/// Lebensdauer des Prozesses eindeutig. Identitaet ist pro Verbindung –
/// zwei Logins desselben Nutzers ergeben zwei verschiedene IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerbindungsId(pub u64);

impl std::fmt::Display for VerbindungsId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "verbindung:{}", self.0)
    }
}
