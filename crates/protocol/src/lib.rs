//! plauder-protocol – Wire-Format und Nachrichtentypen
//!
//! Definiert die "Sprache" zwischen Client und Server:
//!
//! - **Nachrichten** ([`KlientNachricht`], [`ServerNachricht`]) – die
//!   geschlossene Menge typisierter Nachrichten, richtungsgetrennt.
//! - **Codec** – JSON-Umschlag mit `time`-Zeitstempel, Kodieren/Dekodieren.
//! - **Wire** – Frame-Format (u32 BE Laenge + Payload) mit
//!   [`NachrichtenTeiler`] fuer die Wiederzusammensetzung aus Teilstuecken.
//! - **Puffer** ([`SendePuffer`]) – ausgehende Bytes pro Verbindung.
//!
//! Die Protokollschicht kennt weder Sockets noch Sitzungen; sie wandelt
//! nur zwischen typisierten Nachrichten und Bytes.

pub mod codec;
pub mod error;
pub mod nachricht;
pub mod puffer;
pub mod wire;

pub use codec::{dekodieren, jetzt_epoche, kodieren, NachrichtenSender, UmschlagNachricht, Zeitquelle};
pub use error::ProtokollFehler;
pub use nachricht::{antwort_code, Antwort, KlientNachricht, Kontodaten, ServerNachricht, ServerPush, Status};
pub use puffer::SendePuffer;
pub use wire::{rahmen_anhaengen, NachrichtenTeiler, KOPF_GROESSE, MAX_RAHMEN_GROESSE};
