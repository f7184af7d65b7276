//! Nutzerspeicher – Registrierung und Zugangsdaten-Pruefung
//!
//! Passwoerter werden mit Argon2id gehasht (Parameter gemaess
//! OWASP-Empfehlungen); im Speicher liegt nur der PHC-String.
//!
//! ## Richtlinien
//! - Nutzername: alphanumerisch, mindestens 4 Zeichen
//! - Passwort: mindestens 8 Zeichen, davon mindestens eine Ziffer, ein
//!   Gross- und ein Kleinbuchstabe sowie ein Sonderzeichen aus der
//!   festen Interpunktionsmenge

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, Version,
};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::SpeicherFehler;

/// Zugelassene Sonderzeichen fuer Passwoerter
const SONDERZEICHEN: &str = r#" !@#$%&'()*+,-./[\]^_`{|}~""#;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Ein gespeicherter Nutzer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nutzer {
    pub name: String,
}

/// Zugangsdaten-Speicher
///
/// `&self`-Methoden mit innerer Synchronisation: der Speicher ist ein
/// externer Mitarbeiter und darf – anders als Register und Raeume –
/// auch von anderen Threads befragt werden.
pub trait NutzerSpeicher: Send + Sync {
    /// Legt einen Nutzer an; prueft Namens- und Passwort-Richtlinie
    fn registrieren(&self, name: &str, passwort: &str) -> Result<(), SpeicherFehler>;

    /// Ob Name und Passwort zu einem gespeicherten Nutzer passen
    fn zugangsdaten_gueltig(&self, name: &str, passwort: &str) -> bool;

    /// Sucht einen Nutzer anhand seines Namens
    fn nutzer_nach_name(&self, name: &str) -> Result<Nutzer, SpeicherFehler>;
}

// ---------------------------------------------------------------------------
// Richtlinien-Pruefungen
// ---------------------------------------------------------------------------

fn name_pruefen(name: &str) -> Result<(), SpeicherFehler> {
    if name.is_empty() || !name.chars().all(char::is_alphanumeric) {
        return Err(SpeicherFehler::UngueltigerName(
            "username must be alphanumeric".into(),
        ));
    }
    if name.chars().count() < 4 {
        return Err(SpeicherFehler::UngueltigerName(
            "username must be at least 4 chars length".into(),
        ));
    }
    Ok(())
}

fn passwort_pruefen(passwort: &str) -> Result<(), SpeicherFehler> {
    if passwort.chars().count() < 8 {
        return Err(SpeicherFehler::UngueltigesPasswort(
            "password must be at least 8 chars length".into(),
        ));
    }
    if !passwort.chars().any(|z| z.is_ascii_digit()) {
        return Err(SpeicherFehler::UngueltigesPasswort(
            "password must contain at least one digit".into(),
        ));
    }
    if !passwort.chars().any(|z| z.is_ascii_uppercase()) {
        return Err(SpeicherFehler::UngueltigesPasswort(
            "password must contain at least one uppercase letter".into(),
        ));
    }
    if !passwort.chars().any(|z| z.is_ascii_lowercase()) {
        return Err(SpeicherFehler::UngueltigesPasswort(
            "password must contain at least one lowercase letter".into(),
        ));
    }
    if !passwort.chars().any(|z| SONDERZEICHEN.contains(z)) {
        return Err(SpeicherFehler::UngueltigesPasswort(
            "password must contain at least one special char".into(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Argon2id
// ---------------------------------------------------------------------------

/// Argon2id-Parameter gemaess OWASP-Empfehlungen
fn argon2_instanz() -> Argon2<'static> {
    let params = Params::new(
        64 * 1024, // m_cost: 64 MiB
        3,         // t_cost: 3 Iterationen
        1,         // p_cost: 1 Thread
        None,
    )
    .expect("Argon2-Parameter ungueltig");

    Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params)
}

fn passwort_hashen(passwort: &str) -> Result<String, SpeicherFehler> {
    let salt = SaltString::generate(&mut OsRng);
    argon2_instanz()
        .hash_password(passwort.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| SpeicherFehler::Hashing(e.to_string()))
}

fn passwort_verifizieren(passwort: &str, hash: &str) -> bool {
    let Ok(geparst) = PasswordHash::new(hash) else {
        tracing::warn!("Gespeicherter Passwort-Hash ist kein gueltiger PHC-String");
        return false;
    };
    argon2_instanz()
        .verify_password(passwort.as_bytes(), &geparst)
        .is_ok()
}

// ---------------------------------------------------------------------------
// In-Memory-Implementierung
// ---------------------------------------------------------------------------

/// Nutzerspeicher im Arbeitsspeicher (Name -> PHC-Hash)
#[derive(Debug, Default)]
pub struct InMemoryNutzerSpeicher {
    nutzer: Mutex<HashMap<String, String>>,
}

impl InMemoryNutzerSpeicher {
    /// Erstellt einen leeren Speicher
    pub fn neu() -> Self {
        Self::default()
    }
}

impl NutzerSpeicher for InMemoryNutzerSpeicher {
    fn registrieren(&self, name: &str, passwort: &str) -> Result<(), SpeicherFehler> {
        name_pruefen(name)?;
        passwort_pruefen(passwort)?;

        let hash = passwort_hashen(passwort)?;
        let mut nutzer = self.nutzer.lock().unwrap_or_else(|e| e.into_inner());
        if nutzer.contains_key(name) {
            return Err(SpeicherFehler::NutzerExistiert);
        }
        nutzer.insert(name.to_string(), hash);
        tracing::info!(name = %name, "Nutzer registriert");
        Ok(())
    }

    fn zugangsdaten_gueltig(&self, name: &str, passwort: &str) -> bool {
        let nutzer = self.nutzer.lock().unwrap_or_else(|e| e.into_inner());
        match nutzer.get(name) {
            Some(hash) => passwort_verifizieren(passwort, hash),
            None => false,
        }
    }

    fn nutzer_nach_name(&self, name: &str) -> Result<Nutzer, SpeicherFehler> {
        let nutzer = self.nutzer.lock().unwrap_or_else(|e| e.into_inner());
        if nutzer.contains_key(name) {
            Ok(Nutzer { name: name.into() })
        } else {
            Err(SpeicherFehler::NutzerNichtGefunden(name.into()))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
