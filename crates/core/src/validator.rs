//! Raumnamen-Validator
//!
//! Raumnamen muessen `^#[A-Za-z0-9_@-]+$` entsprechen (nur ASCII). Der
//! Client prueft VOR dem Senden; der Server prueft erneut, weil die
//! Grammatik auch entscheidet ob ein Chat-Ziel ein Raum oder ein
//! Direktempfaenger ist.

use regex::Regex;
use std::sync::LazyLock;

static RAUM_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[A-Za-z0-9_@-]+$").expect("Raumnamen-Regex ungueltig"));

/// Prueft Raumnamen gegen die Raum-Grammatik
#[derive(Debug, Clone, Copy, Default)]
pub struct RaumNameValidator;

impl RaumNameValidator {
    /// Erstellt einen neuen Validator
    pub fn neu() -> Self {
        Self
    }

    /// Gibt `true` zurueck wenn der Name der Raum-Grammatik entspricht
    pub fn ist_gueltig(&self, name: &str) -> bool {
        RAUM_NAME_RE.is_match(name)
    }
}
