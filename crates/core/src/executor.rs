//! Aufgaben-Warteschlange – Uebergibt Arbeit an den I/O-Thread
//!
//! Die Ereignisschleife ist der einzige Ort, an dem Verbindungs-, Sitzungs-
//! und Raumzustand veraendert wird (Single-Writer-Disziplin, keine Locks um
//! diese Strukturen). Andere Threads – Nutzereingabe, der Sonden-Timer –
//! fassen diesen Zustand nie direkt an, sondern planen Aufgaben ein, die
//! die Schleife nach ihrer I/O-Phase in Einplan-Reihenfolge ausfuehrt.
//!
//! ## Vertrag
//! Beliebig viele Produzenten, genau ein Konsument (die Schleife). Die
//! interne Synchronisation uebernimmt der unbounded mpsc-Kanal von tokio;
//! die Warteschlange selbst braucht kein weiteres Lock.

use tokio::sync::mpsc;

/// Erstellt ein verbundenes Planer/Schlange-Paar
pub fn aufgaben_paar<T>() -> (AufgabenPlaner<T>, AufgabenSchlange<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (AufgabenPlaner { tx }, AufgabenSchlange { rx })
}

// ---------------------------------------------------------------------------
// AufgabenPlaner (Produzentenseite)
// ---------------------------------------------------------------------------

/// Handle zum Einplanen von Aufgaben, beliebig klonbar und Send
pub struct AufgabenPlaner<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> Clone for AufgabenPlaner<T> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}

impl<T> AufgabenPlaner<T> {
    /// Haengt eine Aufgabe ans Ende der Warteschlange an
    ///
    /// Gibt `false` zurueck wenn die Konsumentenseite bereits weg ist
    /// (Schleife beendet); die Aufgabe wird dann verworfen.
    pub fn einplanen(&self, aufgabe: T) -> bool {
        match self.tx.send(aufgabe) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!("Aufgabe verworfen: Schleife nicht mehr aktiv");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// AufgabenSchlange (Konsumentenseite)
// ---------------------------------------------------------------------------

/// Konsumentenseite der Warteschlange, lebt in der Ereignisschleife
pub struct AufgabenSchlange<T> {
    rx: mpsc::UnboundedReceiver<T>,
}

impl<T> AufgabenSchlange<T> {
    /// Wartet auf die naechste Aufgabe
    ///
    /// `None` wenn alle Planer-Handles fallengelassen wurden.
    pub async fn naechste(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Holt alle derzeit eingeplanten Aufgaben ab, ohne zu warten
    ///
    /// Die Reihenfolge entspricht der Einplan-Reihenfolge.
    pub fn alle_abholen(&mut self) -> Vec<T> {
        let mut aufgaben = Vec::new();
        while let Ok(aufgabe) = self.rx.try_recv() {
            aufgaben.push(aufgabe);
        }
        aufgaben
    }
}
