//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Takt- und Intervall-Einstellungen
    pub takt: TaktEinstellungen,
    /// Grenzwerte
    pub grenzen: GrenzEinstellungen,
    /// Authentifizierung
    pub auth: AuthEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse des TCP-Listeners
    pub bind_adresse: String,
    /// Port des TCP-Listeners
    pub port: u16,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "localhost".into(),
            port: 7777,
        }
    }
}

/// Takt- und Intervall-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaktEinstellungen {
    /// Obergrenze der Wartezeit pro Schleifenrunde in Millisekunden
    pub poll_intervall_ms: u64,
    /// Abstand zwischen zwei Sonden-Broadcasts in Sekunden
    pub sonden_intervall_sek: u64,
}

impl Default for TaktEinstellungen {
    fn default() -> Self {
        Self {
            poll_intervall_ms: 100,
            sonden_intervall_sek: 10,
        }
    }
}

/// Grenzwerte
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrenzEinstellungen {
    /// Obergrenze fuer eingehende Rahmen in Bytes
    pub max_rahmen_groesse: usize,
    /// Maximale Anzahl gleichzeitiger Verbindungen
    pub max_verbindungen: usize,
}

impl Default for GrenzEinstellungen {
    fn default() -> Self {
        Self {
            max_rahmen_groesse: plauder_protocol::MAX_RAHMEN_GROESSE,
            max_verbindungen: 512,
        }
    }
}

/// Authentifizierung
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthEinstellungen {
    /// Anmeldemodus: "offen" (jede Anmeldung wird akzeptiert) oder
    /// "speicher" (Zugangsdaten gegen den Nutzerspeicher pruefen)
    pub modus: String,
}

impl Default for AuthEinstellungen {
    fn default() -> Self {
        Self { modus: "offen".into() }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration; fehlende Datei ergibt Standardwerte
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Die vollstaendige Bind-Adresse des TCP-Listeners
    pub fn bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.port)
    }

    /// Die Wartezeit-Obergrenze pro Schleifenrunde
    pub fn poll_intervall(&self) -> Duration {
        Duration::from_millis(self.takt.poll_intervall_ms)
    }

    /// Der Abstand zwischen zwei Sonden-Broadcasts
    pub fn sonden_intervall(&self) -> Duration {
        Duration::from_secs(self.takt.sonden_intervall_sek)
    }
}
