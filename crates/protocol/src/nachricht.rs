//! Nachrichtentypen des Plauder-Protokolls
//!
//! Geschlossene, richtungsgetrennte Nachrichtenmengen als Tagged Enums.
//! Jeder Routing-Punkt matcht erschoepfend; eine neue Variante kann damit
//! nicht stillschweigend durchrutschen.
//!
//! ## Umschlag-Format
//! Client -> Server und Server-Pushes tragen den Diskriminanten im Feld
//! `action`; Antworten tragen stattdessen den Statuscode im Feld
//! `response`. Der `time`-Zeitstempel ist Sache des Codecs und taucht in
//! diesen Typen bewusst nicht auf.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Statuscodes
// ---------------------------------------------------------------------------

/// Statuscodes fuer [`Antwort`]-Nachrichten (HTTP-Konvention)
pub mod antwort_code {
    pub const OK: u16 = 200;
    pub const BAD_REQUEST: u16 = 400;
    pub const UNAUTHORIZED: u16 = 401;
}

// ---------------------------------------------------------------------------
// Hilfstypen
// ---------------------------------------------------------------------------

/// Online-Status im `presence`-Umschlag; auf dem Draht kleingeschrieben
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Online,
    Away,
}

/// Zugangsdaten im `authenticate`-Umschlag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kontodaten {
    pub account_name: String,
    pub password: String,
}

// ---------------------------------------------------------------------------
// Client -> Server
// ---------------------------------------------------------------------------

/// Alle Nachrichten die ein Client an den Server senden kann
///
/// `#[serde(tag = "action")]` erzeugt das Draht-Format
/// `{"action": "...", ...}`; unbekannte Diskriminanten sind ein
/// Dekodierfehler. Unbekannte Zusatzfelder (etwa `time`) werden beim
/// Dekodieren ignoriert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum KlientNachricht {
    /// Login-Anfrage mit Kontodaten
    Authenticate { user: Kontodaten },

    /// Sauberer Verbindungsabbau; traegt als einzige Nachricht keinen
    /// `time`-Zeitstempel
    Quit,

    /// Online-Status-Meldung, Status optional
    Presence {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<Status>,
    },

    /// Chat an einen Nutzer oder – wenn `to` der Raum-Grammatik folgt –
    /// an einen Raum
    #[serde(rename = "msg")]
    Chat { to: String, message: String },

    /// Raum betreten
    Join { room: String },

    /// Raum verlassen
    Leave { room: String },

    /// Kontakt zur Kontaktliste hinzufuegen
    AddContact { user: String },

    /// Kontakt entfernen
    #[serde(rename = "del_contact")]
    RemoveContact { user: String },

    /// Kontaktliste abfragen
    GetContacts,
}

// ---------------------------------------------------------------------------
// Server -> Client
// ---------------------------------------------------------------------------

/// Antwort auf eine Client-Nachricht: `{"response": <code>, "message": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Antwort {
    #[serde(rename = "response")]
    pub code: u16,
    pub message: String,
}

/// Server-initiierte Push-Nachrichten (`action`-getaggt wie Client-Seite)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ServerPush {
    /// Liveness-Ping; der Client antwortet nicht darauf
    Probe,

    /// Eingehender Chat; `room` ist nur bei Raum-Nachrichten gesetzt
    #[serde(rename = "msg")]
    Chat {
        from: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room: Option<String>,
    },
}

/// Alle Nachrichten die der Server an einen Client senden kann
///
/// `#[serde(untagged)]`: eine Antwort wird am `response`-Feld erkannt,
/// alles andere am `action`-Feld. Passt ein Umschlag zu keiner Variante,
/// ist das ein Dekodierfehler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerNachricht {
    Antwort(Antwort),
    Push(ServerPush),
}

impl ServerNachricht {
    /// Erstellt eine Antwort-Nachricht
    pub fn antwort(code: u16, message: impl Into<String>) -> Self {
        Self::Antwort(Antwort {
            code,
            message: message.into(),
        })
    }

    /// Erstellt einen Liveness-Ping
    pub fn probe() -> Self {
        Self::Push(ServerPush::Probe)
    }

    /// Erstellt eine eingehende Chat-Nachricht
    pub fn chat(from: impl Into<String>, message: impl Into<String>, room: Option<String>) -> Self {
        Self::Push(ServerPush::Chat {
            from: from.into(),
            message: message.into(),
            room,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
