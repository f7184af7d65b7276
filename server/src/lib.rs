//! plauder-server – Bibliotheks-Root
//!
//! Verdrahtet Speicher, Vermittler, Aufgaben-Warteschlange und
//! Ereignisschleife und stellt den Einstiegspunkt fuer Binary und
//! Integrationstests bereit.

pub mod config;

use anyhow::Result;
use plauder_core::{aufgaben_paar, AufgabenPlaner};
use plauder_db::{InMemoryKontaktSpeicher, InMemoryNutzerSpeicher, NutzerSpeicher};
use plauder_net::{EreignisSchleife, SchleifenEinstellungen, VermittlungsAufgabe};
use plauder_relay::{Anmeldepruefung, OffeneAnmeldung, Vermittler};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use config::ServerConfig;

/// Der Vermittler-Typ dieses Servers
type ServerVermittler = Vermittler<InMemoryKontaktSpeicher>;

// ---------------------------------------------------------------------------
// Anmeldepruefung gegen den Nutzerspeicher
// ---------------------------------------------------------------------------

/// Prueft Zugangsdaten gegen einen [`NutzerSpeicher`]
pub struct SpeicherAnmeldung<S: NutzerSpeicher> {
    speicher: Arc<S>,
}

impl<S: NutzerSpeicher> SpeicherAnmeldung<S> {
    /// Erstellt die Pruefung um einen Speicher
    pub fn neu(speicher: Arc<S>) -> Self {
        Self { speicher }
    }
}

impl<S: NutzerSpeicher> Anmeldepruefung for SpeicherAnmeldung<S> {
    fn pruefen(&self, name: &str, passwort: &str) -> bool {
        self.speicher.zugangsdaten_gueltig(name, passwort)
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Bindet den Listener und laeuft bis Ctrl-C
    pub async fn starten(self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_adresse()).await?;

        let (abbruch_tx, abbruch_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown-Signal empfangen");
                let _ = abbruch_tx.send(true);
            }
        });

        self.laufen(listener, abbruch_rx).await
    }

    /// Laesst den Server auf einem fertigen Listener laufen
    ///
    /// Integrationstests binden Port 0 und steuern das Abbruchsignal
    /// selbst.
    pub async fn laufen(
        self,
        listener: TcpListener,
        abbruch_rx: watch::Receiver<bool>,
    ) -> Result<()> {
        let kontakte = Arc::new(InMemoryKontaktSpeicher::neu());

        let anmeldung: Box<dyn Anmeldepruefung> = match self.config.auth.modus.as_str() {
            "speicher" => {
                let nutzer = Arc::new(InMemoryNutzerSpeicher::neu());
                Box::new(SpeicherAnmeldung::neu(nutzer))
            }
            _ => Box::new(OffeneAnmeldung),
        };

        let vermittler = ServerVermittler::neu(anmeldung, kontakte);
        let (planer, schlange) = aufgaben_paar::<VermittlungsAufgabe<ServerVermittler>>();

        let einstellungen = SchleifenEinstellungen {
            poll_intervall: self.config.poll_intervall(),
            max_rahmen_groesse: self.config.grenzen.max_rahmen_groesse,
            max_verbindungen: self.config.grenzen.max_verbindungen,
        };
        let schleife = EreignisSchleife::neu(listener, vermittler, schlange, einstellungen);

        let sonden_task = sonden_timer_starten(
            planer,
            self.config.sonden_intervall(),
            abbruch_rx.clone(),
        );

        let ergebnis = schleife.starten(abbruch_rx).await;
        sonden_task.abort();
        ergebnis?;
        Ok(())
    }
}

/// Startet den Sonden-Timer
///
/// Der Timer fasst selbst keinen Sitzungszustand an: er plant in jedem
/// Intervall nur eine Aufgabe ein, die der Schleifen-Task ausfuehrt.
fn sonden_timer_starten(
    planer: AufgabenPlaner<VermittlungsAufgabe<ServerVermittler>>,
    intervall: std::time::Duration,
    mut abbruch_rx: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut takt = tokio::time::interval(intervall);
        takt.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Der erste Tick kommt sofort; Sonden beginnen nach einem Intervall
        takt.tick().await;

        loop {
            tokio::select! {
                _ = takt.tick() => {
                    let eingeplant = planer.einplanen(Box::new(|vermittler, post| {
                        vermittler.sonden_senden(post);
                    }));
                    if !eingeplant {
                        break;
                    }
                }
                _ = abbruch_rx.changed() => {
                    if *abbruch_rx.borrow() {
                        break;
                    }
                }
            }
        }
    })
}
