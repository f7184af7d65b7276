//! Server-Ereignisschleife – Multiplext Listener und alle Verbindungen
//!
//! Ein einzelner Task besitzt saemtliche Verbindungen. Jede Runde:
//!
//! 1. Auf ein Ereignis warten (Accept, erste Aufgabe, Socket-Bereitschaft,
//!    Takt) – mit begrenzter Wartezeit, damit Abbruchsignal und
//!    Warteschlange auch ohne Socket-Aktivitaet regelmaessig drankommen.
//! 2. Lesen bis `WouldBlock` bzw. einmal schreiben, dekodierte Nachrichten
//!    an den Handler geben.
//! 3. Die Aufgaben-Warteschlange leeren und jede Aufgabe ausfuehren.
//! 4. Ausgehende Post kodieren und in die Sendepuffer legen.
//! 5. Vorgemerkte Verbindungen schliessen – geordnete erst wenn ihr
//!    Sendepuffer leer ist.
//!
//! Beim Herunterfahren wird nichts mehr gelesen oder akzeptiert; ein
//! letzter Abflussversuch ohne Warten leert die Sendepuffer so weit wie
//! moeglich.

use plauder_core::{AufgabenSchlange, VerbindungsId};
use plauder_protocol::{dekodieren, KlientNachricht, NachrichtenSender};
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::Ready;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use crate::handler::{Postausgang, VermittlungsAufgabe, VermittlungsHandler};
use crate::verbindung::Verbindung;

// ---------------------------------------------------------------------------
// Einstellungen
// ---------------------------------------------------------------------------

/// Takt- und Grenzwerte der Ereignisschleife
#[derive(Debug, Clone)]
pub struct SchleifenEinstellungen {
    /// Obergrenze der Wartezeit pro Runde
    pub poll_intervall: Duration,
    /// Obergrenze fuer eingehende Rahmen in Bytes
    pub max_rahmen_groesse: usize,
    /// Maximale Anzahl gleichzeitiger Verbindungen
    pub max_verbindungen: usize,
}

impl Default for SchleifenEinstellungen {
    fn default() -> Self {
        Self {
            poll_intervall: Duration::from_millis(100),
            max_rahmen_groesse: plauder_protocol::MAX_RAHMEN_GROESSE,
            max_verbindungen: 512,
        }
    }
}

// ---------------------------------------------------------------------------
// EreignisSchleife
// ---------------------------------------------------------------------------

/// Was eine Runde der Schleife geweckt hat
enum Ereignis<V> {
    Neu(io::Result<(TcpStream, SocketAddr)>),
    Aufgabe(Option<VermittlungsAufgabe<V>>),
    Socket(VerbindungsId, io::Result<Ready>),
    Takt,
}

/// Die Server-Ereignisschleife
pub struct EreignisSchleife<V: VermittlungsHandler> {
    listener: TcpListener,
    verbindungen: HashMap<VerbindungsId, Verbindung>,
    handler: V,
    sender: NachrichtenSender,
    aufgaben: AufgabenSchlange<VermittlungsAufgabe<V>>,
    einstellungen: SchleifenEinstellungen,
    naechste_id: u64,
}

impl<V: VermittlungsHandler> EreignisSchleife<V> {
    /// Erstellt die Schleife um einen gebundenen Listener
    pub fn neu(
        listener: TcpListener,
        handler: V,
        aufgaben: AufgabenSchlange<VermittlungsAufgabe<V>>,
        einstellungen: SchleifenEinstellungen,
    ) -> Self {
        Self {
            listener,
            verbindungen: HashMap::new(),
            handler,
            sender: NachrichtenSender::neu(),
            aufgaben,
            einstellungen,
            naechste_id: 0,
        }
    }

    /// Die lokale Adresse des Listeners
    pub fn lokale_adresse(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Laesst die Schleife laufen bis das Abbruchsignal eintrifft
    pub async fn starten(mut self, mut abbruch_rx: watch::Receiver<bool>) -> io::Result<()> {
        tracing::info!(
            adresse = %self.lokale_adresse()?,
            "Ereignisschleife gestartet"
        );

        let mut aufgaben_geschlossen = false;

        loop {
            if *abbruch_rx.borrow() {
                break;
            }

            let ereignis = {
                let bereitschaft = bereitschaft_abwarten(&self.verbindungen);
                tokio::select! {
                    angenommen = self.listener.accept() => Ereignis::Neu(angenommen),
                    aufgabe = self.aufgaben.naechste(), if !aufgaben_geschlossen => {
                        Ereignis::Aufgabe(aufgabe)
                    }
                    (id, bereit) = bereitschaft => Ereignis::Socket(id, bereit),
                    _ = tokio::time::sleep(self.einstellungen.poll_intervall) => Ereignis::Takt,
                    _ = abbruch_rx.changed() => Ereignis::Takt,
                }
            };

            let mut post = Postausgang::neu();

            match ereignis {
                Ereignis::Neu(Ok((strom, peer))) => self.verbindung_annehmen(strom, peer),
                Ereignis::Neu(Err(fehler)) => {
                    tracing::error!(fehler = %fehler, "TCP-Accept-Fehler");
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                Ereignis::Aufgabe(Some(aufgabe)) => aufgabe(&mut self.handler, &mut post),
                Ereignis::Aufgabe(None) => aufgaben_geschlossen = true,
                Ereignis::Socket(id, Ok(bereit)) => self.socket_verarbeiten(id, bereit, &mut post),
                Ereignis::Socket(id, Err(fehler)) => {
                    tracing::warn!(%id, fehler = %fehler, "Bereitschaftspruefung fehlgeschlagen");
                    if let Some(verbindung) = self.verbindungen.get_mut(&id) {
                        verbindung.als_fehlerhaft_markieren();
                    }
                }
                Ereignis::Takt => {}
            }

            // Nach der I/O-Phase: Warteschlange leeren, Post zustellen,
            // vorgemerkte Verbindungen schliessen.
            for aufgabe in self.aufgaben.alle_abholen() {
                aufgabe(&mut self.handler, &mut post);
            }
            self.post_zustellen(post);
            self.getrennte_schliessen();
        }

        self.herunterfahren();
        Ok(())
    }

    /// Nimmt eine neue Verbindung an und registriert sie fuer Lese- und
    /// Schreibbereitschaft
    fn verbindung_annehmen(&mut self, strom: TcpStream, peer: SocketAddr) {
        if self.verbindungen.len() >= self.einstellungen.max_verbindungen {
            tracing::warn!(
                peer = %peer,
                max = self.einstellungen.max_verbindungen,
                "Server voll – Verbindung abgelehnt"
            );
            drop(strom);
            return;
        }

        let id = VerbindungsId(self.naechste_id);
        self.naechste_id += 1;

        self.verbindungen.insert(
            id,
            Verbindung::neu(strom, self.einstellungen.max_rahmen_groesse),
        );
        tracing::debug!(%id, peer = %peer, "Verbindung akzeptiert");
        self.handler.bei_verbindung(id);
    }

    /// Verarbeitet Lese- und Schreibbereitschaft einer Verbindung
    fn socket_verarbeiten(&mut self, id: VerbindungsId, bereit: Ready, post: &mut Postausgang) {
        if bereit.is_readable() || bereit.is_read_closed() {
            self.verbindung_lesen(id, post);
        }
        if bereit.is_writable() || bereit.is_write_closed() {
            self.verbindung_schreiben(id);
        }
    }

    fn verbindung_lesen(&mut self, id: VerbindungsId, post: &mut Postausgang) {
        let Some(verbindung) = self.verbindungen.get_mut(&id) else {
            return;
        };
        if verbindung.ist_fehlerhaft() {
            return;
        }

        let ergebnis = verbindung.lesen();

        for rahmen in ergebnis.rahmen {
            match dekodieren::<KlientNachricht>(&rahmen) {
                Ok(nachricht) => {
                    if let Err(verstoss) = self.handler.bei_nachricht(id, nachricht, post) {
                        tracing::warn!(%id, fehler = %verstoss, "Verbindung wird getrennt");
                        if let Some(verbindung) = self.verbindungen.get_mut(&id) {
                            verbindung.als_fehlerhaft_markieren();
                        }
                        return;
                    }
                }
                Err(fehler) => {
                    tracing::warn!(%id, fehler = %fehler, "Unlesbare Nachricht");
                    if let Some(verbindung) = self.verbindungen.get_mut(&id) {
                        verbindung.als_fehlerhaft_markieren();
                    }
                    return;
                }
            }
        }

        let Some(verbindung) = self.verbindungen.get_mut(&id) else {
            return;
        };
        if let Some(fehler) = ergebnis.fehler {
            tracing::warn!(%id, fehler = %fehler, "Lesefehler");
            verbindung.als_fehlerhaft_markieren();
        } else if ergebnis.strom_ende {
            tracing::debug!(%id, "Gegenseite hat die Verbindung beendet");
            verbindung.trennung_vormerken();
        }
    }

    fn verbindung_schreiben(&mut self, id: VerbindungsId) {
        let Some(verbindung) = self.verbindungen.get_mut(&id) else {
            return;
        };
        if let Err(fehler) = verbindung.schreiben() {
            tracing::warn!(%id, fehler = %fehler, "Schreibfehler");
            verbindung.als_fehlerhaft_markieren();
        }
    }

    /// Kodiert die Post der Handler-Runde in die Sendepuffer
    fn post_zustellen(&mut self, mut post: Postausgang) {
        let (nachrichten, trennungen) = post.leeren();

        for (id, nachricht) in nachrichten {
            // Bereits geschlossene Verbindungen: die Nachricht verfaellt
            let Some(verbindung) = self.verbindungen.get_mut(&id) else {
                continue;
            };
            if let Err(fehler) = self.sender.sende(&nachricht, verbindung.sende_puffer_mut()) {
                tracing::error!(%id, fehler = %fehler, "Kodieren fehlgeschlagen");
                verbindung.als_fehlerhaft_markieren();
            }
        }

        for id in trennungen {
            if let Some(verbindung) = self.verbindungen.get_mut(&id) {
                verbindung.trennung_vormerken();
            }
        }
    }

    /// Schliesst fatal gestoerte und fertig geleerte vorgemerkte
    /// Verbindungen; `bei_trennung` genau einmal pro Verbindung
    fn getrennte_schliessen(&mut self) {
        let faellig: Vec<VerbindungsId> = self
            .verbindungen
            .iter()
            .filter(|(_, verbindung)| verbindung.soll_geschlossen_werden())
            .map(|(id, _)| *id)
            .collect();

        for id in faellig {
            self.verbindungen.remove(&id);
            tracing::debug!(%id, "Verbindung getrennt");
            self.handler.bei_trennung(id);
        }
    }

    /// Letzter Abfluss aller Sendepuffer ohne Warten, dann Aufraeumen
    fn herunterfahren(&mut self) {
        tracing::info!(
            verbindungen = self.verbindungen.len(),
            "Ereignisschleife wird beendet"
        );
        for verbindung in self.verbindungen.values_mut() {
            verbindung.flush_versuchen();
        }
        for (id, _) in std::mem::take(&mut self.verbindungen) {
            self.handler.bei_trennung(id);
        }
    }
}

/// Wartet auf die Bereitschaft irgendeiner Verbindung
///
/// Ohne Verbindungen wird endlos gewartet; der Takt-Zweig der Schleife
/// begrenzt die Runde trotzdem.
async fn bereitschaft_abwarten(
    verbindungen: &HashMap<VerbindungsId, Verbindung>,
) -> (VerbindungsId, io::Result<Ready>) {
    if verbindungen.is_empty() {
        return std::future::pending().await;
    }

    let wartende: Vec<_> = verbindungen
        .iter()
        .map(|(id, verbindung)| {
            let id = *id;
            Box::pin(async move { (id, verbindung.bereitschaft().await) })
        })
        .collect();

    let ((id, bereit), _, _) = futures_util::future::select_all(wartende).await;
    (id, bereit)
}
