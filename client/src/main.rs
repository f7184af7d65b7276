//! Plauder Client – CLI-Einstiegspunkt
//!
//! Duenne Huelle um die Zustandsmaschine: verbindet den Socket, startet
//! die Klienten-Schleife und liest Kommandos von stdin. Der
//! Eingabe-Thread fasst weder Socket noch Zustand an – er plant nur
//! Aufgaben ein.

use anyhow::{Context, Result};
use clap::Parser;
use plauder_client::{ChatAusgabe, ChatKlient};
use plauder_core::{aufgaben_paar, AufgabenPlaner};
use plauder_net::{KlientAufgabe, KlientSchleife};
use plauder_observability::logging_initialisieren;
use std::io::Write;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::watch;

/// Plauder Chat-Client
#[derive(Debug, Parser)]
#[command(name = "plauder-client", version)]
struct Args {
    /// Server-Adresse
    #[arg(short, long, default_value = "localhost")]
    address: String,

    /// Server-Port
    #[arg(short, long, default_value_t = 7777)]
    port: u16,

    /// Ausfuehrliches Logging
    #[arg(short, long)]
    verbose: bool,

    /// Anmeldename
    username: String,

    /// Passwort
    password: String,
}

/// Gibt eingehende Chat-Nachrichten auf der Konsole aus
struct KonsolenAusgabe;

impl ChatAusgabe for KonsolenAusgabe {
    fn chat_empfangen(&mut self, von: &str, text: &str, raum: Option<&str>) {
        match raum {
            Some(raum) => println!("[{raum}] {von}: {text}"),
            None => println!("{von}: {text}"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "error" };
    logging_initialisieren(level, "text");

    let strom = TcpStream::connect((args.address.as_str(), args.port))
        .await
        .with_context(|| format!("Server {}:{} nicht erreichbar", args.address, args.port))?;
    tracing::info!(adresse = %args.address, port = args.port, "Mit Server verbunden");

    let (planer, schlange) = aufgaben_paar::<KlientAufgabe<ChatKlient>>();
    let klient = ChatKlient::neu(Box::new(KonsolenAusgabe));
    let schleife = KlientSchleife::neu(
        strom,
        klient,
        schlange,
        Duration::from_millis(100),
        plauder_protocol::MAX_RAHMEN_GROESSE,
    );

    // Anmeldung sofort einplanen
    let name = args.username.clone();
    let passwort = args.password.clone();
    planer.einplanen(Box::new(move |klient| klient.anmelden(&name, &passwort)));

    // Eingabe-Thread: blockiert auf stdin, plant nur Aufgaben ein
    let eingabe_planer = planer.clone();
    std::thread::Builder::new()
        .name("eingabe".into())
        .spawn(move || eingabe_schleife(eingabe_planer))
        .context("Eingabe-Thread konnte nicht gestartet werden")?;

    let (_abbruch_tx, abbruch_rx) = watch::channel(false);
    schleife.starten(abbruch_rx).await?;
    Ok(())
}

/// Liest Kommandos von stdin bis zum Beenden
fn eingabe_schleife(planer: AufgabenPlaner<KlientAufgabe<ChatKlient>>) {
    loop {
        println!(
            "\nKommando:\n\
             m - Nachricht senden\n\
             j - Raum betreten\n\
             l - Raum verlassen\n\
             q - Beenden"
        );
        let Some(kommando) = zeile_lesen("CMD: ") else {
            break;
        };

        match kommando.as_str() {
            "" => continue,
            k if k.starts_with('m') => {
                let Some(an) = zeile_lesen("An: ") else { break };
                let Some(text) = zeile_lesen("Nachricht: ") else { break };
                planer.einplanen(Box::new(move |klient| {
                    klient.nachricht_senden(&an, &text);
                }));
            }
            k if k.starts_with('j') => {
                let Some(raum) = zeile_lesen("Raum: ") else { break };
                planer.einplanen(Box::new(move |klient| {
                    if let Err(fehler) = klient.raum_betreten(&raum) {
                        eprintln!("{fehler}");
                    }
                }));
            }
            k if k.starts_with('l') => {
                let Some(raum) = zeile_lesen("Raum: ") else { break };
                planer.einplanen(Box::new(move |klient| {
                    if let Err(fehler) = klient.raum_verlassen(&raum) {
                        eprintln!("{fehler}");
                    }
                }));
            }
            _ => {
                planer.einplanen(Box::new(|klient| klient.beenden()));
                break;
            }
        }
    }
}

/// Liest eine Zeile von stdin; `None` am Stromende
fn zeile_lesen(prompt: &str) -> Option<String> {
    print!("{prompt}");
    let _ = std::io::stdout().flush();

    let mut zeile = String::new();
    match std::io::stdin().read_line(&mut zeile) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(zeile.trim().to_string()),
    }
}
