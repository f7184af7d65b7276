//! Fehlertypen der Vermittlungsschicht

use plauder_net::HandlerVerstoss;
use thiserror::Error;

/// Fehler aus der Server-Vermittlung
#[derive(Debug, Error)]
pub enum VermittlungsFehler {
    /// Ein Raumname der nicht der Raum-Grammatik entspricht
    ///
    /// Der Client validiert vor dem Senden; ein missgebildeter Name auf
    /// dem Draht stammt daher von einer nicht konformen Gegenseite und
    /// ist fuer die Verbindung fatal.
    #[error("Ungueltiger Raumname: {0}")]
    UngueltigerRaumName(String),
}

impl From<VermittlungsFehler> for HandlerVerstoss {
    fn from(fehler: VermittlungsFehler) -> Self {
        HandlerVerstoss(fehler.to_string())
    }
}
