//! Eine TCP-Verbindung der Ereignisschleife
//!
//! Buendelt Socket, Rahmen-Teiler und Sendepuffer. Gelesen wird bis
//! `WouldBlock`, geschrieben genau einmal pro Schreibbereitschaft mit so
//! vielen Bytes wie das Betriebssystem annimmt.

use bytes::Bytes;
use plauder_protocol::{NachrichtenTeiler, SendePuffer};
use std::io;
use tokio::io::{Interest, Ready};
use tokio::net::TcpStream;

use crate::error::NetzFehler;

/// Groesse der Lese-Happen
const LESE_HAPPEN: usize = 1024;

/// Ergebnis einer Leserunde
#[derive(Debug, Default)]
pub struct LeseErgebnis {
    /// Vollstaendig zusammengesetzte Rahmen-Payloads, in Empfangsreihenfolge
    pub rahmen: Vec<Bytes>,
    /// Die Gegenseite hat den Strom beendet (0-Byte-Lesung)
    pub strom_ende: bool,
    /// Verbindungs-fataler Fehler waehrend des Lesens
    pub fehler: Option<NetzFehler>,
}

/// Zustand einer akzeptierten bzw. aufgebauten TCP-Verbindung
pub struct Verbindung {
    strom: TcpStream,
    teiler: NachrichtenTeiler,
    sende_puffer: SendePuffer,
    /// Geordnete Trennung: schliessen sobald der Sendepuffer leer ist
    trennung_vorgemerkt: bool,
    /// Fataler Zustand: sofort schliessen, nichts mehr lesen/schreiben
    fehlerhaft: bool,
}

impl Verbindung {
    /// Erstellt eine Verbindung um einen (nicht-blockierenden) tokio-Stream
    pub fn neu(strom: TcpStream, max_rahmen: usize) -> Self {
        Self {
            strom,
            teiler: NachrichtenTeiler::mit_maximalgroesse(max_rahmen),
            sende_puffer: SendePuffer::neu(),
            trennung_vorgemerkt: false,
            fehlerhaft: false,
        }
    }

    /// Das Bereitschafts-Interesse dieser Verbindung
    ///
    /// Schreibbereitschaft interessiert nur solange ausgehende Bytes
    /// anstehen, sonst wuerde der staendig schreibbare Socket die
    /// Schleife heisslaufen lassen.
    pub fn interesse(&self) -> Interest {
        if self.sende_puffer.ist_leer() {
            Interest::READABLE
        } else {
            Interest::READABLE | Interest::WRITABLE
        }
    }

    /// Wartet bis der Socket dem aktuellen Interesse entsprechend bereit ist
    pub async fn bereitschaft(&self) -> io::Result<Ready> {
        self.strom.ready(self.interesse()).await
    }

    /// Liest verfuegbare Bytes bis `WouldBlock` und setzt Rahmen zusammen
    ///
    /// Nach vorgemerkter Trennung werden eintreffende Bytes verworfen
    /// statt eingespeist.
    pub fn lesen(&mut self) -> LeseErgebnis {
        let mut ergebnis = LeseErgebnis::default();
        let mut happen = [0u8; LESE_HAPPEN];

        loop {
            match self.strom.try_read(&mut happen) {
                Ok(0) => {
                    ergebnis.strom_ende = true;
                    return ergebnis;
                }
                Ok(anzahl) => {
                    if self.trennung_vorgemerkt {
                        continue;
                    }
                    match self.teiler.einspeisen(&happen[..anzahl]) {
                        Ok(rahmen) => ergebnis.rahmen.extend(rahmen),
                        Err(verstoss) => {
                            ergebnis.fehler = Some(verstoss.into());
                            return ergebnis;
                        }
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return ergebnis,
                Err(e) => {
                    ergebnis.fehler = Some(e.into());
                    return ergebnis;
                }
            }
        }
    }

    /// Schreibt anstehende Bytes, so viele wie das Betriebssystem annimmt
    ///
    /// Nimmt der Socket bei nicht-leerem Puffer 0 Bytes an, ist das ein
    /// fataler Schreibfehler, kein Wiederholungsfall.
    pub fn schreiben(&mut self) -> Result<(), NetzFehler> {
        if self.sende_puffer.ist_leer() {
            return Ok(());
        }

        match self.strom.try_write(self.sende_puffer.daten()) {
            Ok(0) => Err(NetzFehler::SchreibenFehlgeschlagen),
            Ok(anzahl) => {
                self.sende_puffer.gesendet(anzahl)?;
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Letzter Abfluss-Versuch ohne Warten (beim Herunterfahren)
    pub fn flush_versuchen(&mut self) {
        while !self.sende_puffer.ist_leer() {
            match self.strom.try_write(self.sende_puffer.daten()) {
                Ok(0) => return,
                Ok(anzahl) => {
                    if self.sende_puffer.gesendet(anzahl).is_err() {
                        return;
                    }
                }
                Err(_) => return,
            }
        }
    }

    /// Zugriff auf den Sendepuffer (zum Einrahmen ausgehender Nachrichten)
    pub fn sende_puffer_mut(&mut self) -> &mut SendePuffer {
        &mut self.sende_puffer
    }

    /// Ob ausgehende Bytes anstehen
    pub fn hat_ausgehende_daten(&self) -> bool {
        !self.sende_puffer.ist_leer()
    }

    /// Merkt die geordnete Trennung vor
    pub fn trennung_vormerken(&mut self) {
        self.trennung_vorgemerkt = true;
    }

    /// Ob die geordnete Trennung vorgemerkt ist
    pub fn trennung_vorgemerkt(&self) -> bool {
        self.trennung_vorgemerkt
    }

    /// Markiert die Verbindung als fatal gestoert
    pub fn als_fehlerhaft_markieren(&mut self) {
        self.fehlerhaft = true;
    }

    /// Ob die Verbindung fatal gestoert ist
    pub fn ist_fehlerhaft(&self) -> bool {
        self.fehlerhaft
    }

    /// Ob die Schleife die Verbindung jetzt schliessen soll
    ///
    /// Fatal gestoerte Verbindungen sofort; geordnet vorgemerkte erst
    /// wenn der Sendepuffer leergeschrieben ist.
    pub fn soll_geschlossen_werden(&self) -> bool {
        self.fehlerhaft || (self.trennung_vorgemerkt && self.sende_puffer.ist_leer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plauder_protocol::{rahmen_anhaengen, MAX_RAHMEN_GROESSE};
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    async fn socket_paar() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let adresse = listener.local_addr().unwrap();
        let klient = TcpStream::connect(adresse).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        (klient, server)
    }

    #[tokio::test]
    async fn lesen_setzt_rahmen_zusammen() {
        let (klient, server) = socket_paar().await;
        let mut sut = Verbindung::neu(server, MAX_RAHMEN_GROESSE);

        let mut roh = Vec::new();
        roh.extend((5u32).to_be_bytes());
        roh.extend(b"hallo");
        let mut klient = klient;
        klient.write_all(&roh).await.unwrap();
        klient.flush().await.unwrap();

        sut.bereitschaft().await.unwrap();
        let ergebnis = sut.lesen();
        assert!(ergebnis.fehler.is_none());
        assert!(!ergebnis.strom_ende);
        assert_eq!(ergebnis.rahmen.len(), 1);
        assert_eq!(&ergebnis.rahmen[0][..], b"hallo");
    }

    #[tokio::test]
    async fn lesen_meldet_strom_ende() {
        let (klient, server) = socket_paar().await;
        let mut sut = Verbindung::neu(server, MAX_RAHMEN_GROESSE);

        drop(klient);
        sut.bereitschaft().await.unwrap();
        let ergebnis = sut.lesen();
        assert!(ergebnis.strom_ende);
    }

    #[tokio::test]
    async fn rahmen_mit_laenge_null_ist_fataler_fehler() {
        let (mut klient, server) = socket_paar().await;
        let mut sut = Verbindung::neu(server, MAX_RAHMEN_GROESSE);

        klient.write_all(&[0, 0, 0, 0]).await.unwrap();
        sut.bereitschaft().await.unwrap();
        let ergebnis = sut.lesen();
        assert!(matches!(ergebnis.fehler, Some(NetzFehler::Protokoll(_))));
    }

    #[tokio::test]
    async fn schreiben_leert_den_puffer() {
        let (_klient, server) = socket_paar().await;
        let mut sut = Verbindung::neu(server, MAX_RAHMEN_GROESSE);

        rahmen_anhaengen(b"raus damit", sut.sende_puffer_mut()).unwrap();
        assert!(sut.hat_ausgehende_daten());
        assert!(sut.interesse().is_writable());

        sut.bereitschaft().await.unwrap();
        sut.schreiben().unwrap();
        assert!(!sut.hat_ausgehende_daten());
        assert!(!sut.interesse().is_writable());
    }

    #[tokio::test]
    async fn geordnete_trennung_wartet_auf_leeren_puffer() {
        let (_klient, server) = socket_paar().await;
        let mut sut = Verbindung::neu(server, MAX_RAHMEN_GROESSE);

        rahmen_anhaengen(b"rest", sut.sende_puffer_mut()).unwrap();
        sut.trennung_vormerken();
        assert!(!sut.soll_geschlossen_werden());

        sut.bereitschaft().await.unwrap();
        sut.schreiben().unwrap();
        assert!(sut.soll_geschlossen_werden());
    }

    #[tokio::test]
    async fn fehlerhafte_verbindung_schliesst_sofort() {
        let (_klient, server) = socket_paar().await;
        let mut sut = Verbindung::neu(server, MAX_RAHMEN_GROESSE);

        rahmen_anhaengen(b"bleibt liegen", sut.sende_puffer_mut()).unwrap();
        sut.als_fehlerhaft_markieren();
        assert!(sut.soll_geschlossen_werden());
    }
}
