//! Klienten-Schleife – Dieselbe Ereignisschleife ueber genau einen Socket
//!
//! Der Kommando-Thread (Nutzereingabe) plant Aufgaben ein; die Schleife
//! fuehrt sie zwischen den I/O-Phasen aus und schreibt die dabei
//! erzeugten Nachrichten. Nach Trennungswunsch wird die Schleife beendet
//! und der Sendepuffer ohne Warten so weit wie moeglich geleert (die
//! `quit`-Nachricht liegt dann meist noch darin).

use plauder_core::AufgabenSchlange;
use plauder_protocol::{dekodieren, NachrichtenSender, ServerNachricht};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::watch;

use crate::error::NetzFehler;
use crate::handler::{KlientAufgabe, KlientHandler};
use crate::verbindung::Verbindung;

/// Die Ereignisschleife der Klientenseite
pub struct KlientSchleife<K: KlientHandler> {
    verbindung: Verbindung,
    handler: K,
    sender: NachrichtenSender,
    aufgaben: AufgabenSchlange<KlientAufgabe<K>>,
    poll_intervall: Duration,
}

impl<K: KlientHandler> KlientSchleife<K> {
    /// Erstellt die Schleife um einen verbundenen Stream
    pub fn neu(
        strom: TcpStream,
        handler: K,
        aufgaben: AufgabenSchlange<KlientAufgabe<K>>,
        poll_intervall: Duration,
        max_rahmen_groesse: usize,
    ) -> Self {
        Self {
            verbindung: Verbindung::neu(strom, max_rahmen_groesse),
            handler,
            sender: NachrichtenSender::neu(),
            aufgaben,
            poll_intervall,
        }
    }

    /// Laesst die Schleife laufen bis zur Trennung oder zum Abbruchsignal
    pub async fn starten(mut self, mut abbruch_rx: watch::Receiver<bool>) -> Result<(), NetzFehler> {
        enum Ereignis {
            Socket(std::io::Result<tokio::io::Ready>),
            Aufgabe,
            Takt,
        }

        let mut aufgaben_geschlossen = false;
        let mut ergebnis = Ok(());

        loop {
            if *abbruch_rx.borrow() || self.verbindung.trennung_vorgemerkt() {
                break;
            }

            let mut erste_aufgabe = None;
            let ereignis = {
                tokio::select! {
                    bereit = self.verbindung.bereitschaft() => Ereignis::Socket(bereit),
                    aufgabe = self.aufgaben.naechste(), if !aufgaben_geschlossen => {
                        match aufgabe {
                            Some(aufgabe) => {
                                erste_aufgabe = Some(aufgabe);
                                Ereignis::Aufgabe
                            }
                            None => {
                                aufgaben_geschlossen = true;
                                Ereignis::Takt
                            }
                        }
                    }
                    _ = tokio::time::sleep(self.poll_intervall) => Ereignis::Takt,
                    _ = abbruch_rx.changed() => Ereignis::Takt,
                }
            };

            match ereignis {
                Ereignis::Socket(Ok(bereit)) => {
                    if bereit.is_readable() || bereit.is_read_closed() {
                        if let Err(fehler) = self.lesen_und_verteilen() {
                            ergebnis = Err(fehler);
                            break;
                        }
                    }
                    if bereit.is_writable() || bereit.is_write_closed() {
                        if let Err(fehler) = self.verbindung.schreiben() {
                            ergebnis = Err(fehler);
                            break;
                        }
                    }
                }
                Ereignis::Socket(Err(fehler)) => {
                    ergebnis = Err(fehler.into());
                    break;
                }
                Ereignis::Aufgabe | Ereignis::Takt => {}
            }

            if let Some(aufgabe) = erste_aufgabe {
                aufgabe(&mut self.handler);
            }
            for aufgabe in self.aufgaben.alle_abholen() {
                aufgabe(&mut self.handler);
            }

            if let Err(fehler) = self.ausgang_einrahmen() {
                ergebnis = Err(fehler);
                break;
            }
        }

        // Letzter Abflussversuch ohne Warten, wie beim Server-Shutdown
        self.verbindung.flush_versuchen();

        match &ergebnis {
            Ok(()) => tracing::info!("Verbindung beendet"),
            Err(fehler) => tracing::warn!(fehler = %fehler, "Verbindung beendet"),
        }
        ergebnis
    }

    /// Liest, dekodiert und reicht Server-Nachrichten an den Handler
    fn lesen_und_verteilen(&mut self) -> Result<(), NetzFehler> {
        let gelesen = self.verbindung.lesen();

        for rahmen in gelesen.rahmen {
            let nachricht: ServerNachricht = dekodieren(&rahmen)?;
            self.handler.bei_nachricht(nachricht);
        }

        if let Some(fehler) = gelesen.fehler {
            return Err(fehler);
        }
        if gelesen.strom_ende {
            self.verbindung.trennung_vormerken();
        }
        Ok(())
    }

    /// Rahmt die vom Handler erzeugten Nachrichten in den Sendepuffer
    fn ausgang_einrahmen(&mut self) -> Result<(), NetzFehler> {
        for nachricht in self.handler.ausgang_leeren() {
            self.sender
                .sende(&nachricht, self.verbindung.sende_puffer_mut())?;
        }
        if self.handler.trennung_angefordert() {
            self.verbindung.trennung_vormerken();
        }
        Ok(())
    }
}
