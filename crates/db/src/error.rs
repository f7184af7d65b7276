//! Fehlertypen der Speicherschicht

use thiserror::Error;

/// Fehler aus Nutzer- und Kontaktspeicher
#[derive(Debug, Error)]
pub enum SpeicherFehler {
    #[error("Nutzer existiert bereits")]
    NutzerExistiert,

    #[error("Ungueltiger Name: {0}")]
    UngueltigerName(String),

    #[error("Ungueltiges Passwort: {0}")]
    UngueltigesPasswort(String),

    #[error("Nutzer nicht gefunden: {0}")]
    NutzerNichtGefunden(String),

    #[error("Can't add self to contacts")]
    SelbstKontakt,

    #[error("Passwort-Hashing fehlgeschlagen: {0}")]
    Hashing(String),
}
