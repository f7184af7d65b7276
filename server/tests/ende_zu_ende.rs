//! Integrationstest ueber echte Sockets
//!
//! Faehrt den kompletten Server hoch und spricht das Wire-Format von
//! Hand: `[u32 BE Laenge][JSON]`. So wird der ganze Pfad vom Socket bis
//! zum Vermittler und zurueck geprueft.

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use plauder_server::{config::ServerConfig, Server};

async fn server_starten(
    config: ServerConfig,
) -> (
    std::net::SocketAddr,
    watch::Sender<bool>,
    tokio::task::JoinHandle<anyhow::Result<()>>,
) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let adresse = listener.local_addr().unwrap();
    let (abbruch_tx, abbruch_rx) = watch::channel(false);
    let handle = tokio::spawn(Server::neu(config).laufen(listener, abbruch_rx));
    (adresse, abbruch_tx, handle)
}

fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.takt.poll_intervall_ms = 10;
    // Sonden weit weg, damit sie die Lese-Reihenfolge nicht stoeren
    config.takt.sonden_intervall_sek = 3600;
    config
}

async fn schreiben(strom: &mut TcpStream, umschlag: Value) {
    let payload = serde_json::to_vec(&umschlag).unwrap();
    strom
        .write_all(&u32::try_from(payload.len()).unwrap().to_be_bytes())
        .await
        .unwrap();
    strom.write_all(&payload).await.unwrap();
}

async fn lesen(strom: &mut TcpStream) -> Value {
    let mut kopf = [0u8; 4];
    strom.read_exact(&mut kopf).await.unwrap();
    let laenge = u32::from_be_bytes(kopf) as usize;
    let mut payload = vec![0u8; laenge];
    strom.read_exact(&mut payload).await.unwrap();
    serde_json::from_slice(&payload).unwrap()
}

async fn anmelden(strom: &mut TcpStream, name: &str) {
    schreiben(
        strom,
        json!({
            "action": "authenticate",
            "time": 1.0,
            "user": {"account_name": name, "password": "x"}
        }),
    )
    .await;
    let antwort = lesen(strom).await;
    assert_eq!(antwort["response"], 200);
    assert_eq!(antwort["message"], "Login successful");
    assert!(antwort["time"].is_number());
}

#[tokio::test]
async fn anmeldung_raum_chat_und_direktnachricht() {
    let (adresse, abbruch_tx, handle) = server_starten(test_config()).await;

    let mut alice = TcpStream::connect(adresse).await.unwrap();
    anmelden(&mut alice, "alice").await;
    schreiben(
        &mut alice,
        json!({"action": "presence", "time": 1.0, "status": "online"}),
    )
    .await;

    let mut bob = TcpStream::connect(adresse).await.unwrap();
    anmelden(&mut bob, "bob").await;

    // Beide betreten #lobby; Bobs get_contacts-Antwort stellt sicher,
    // dass sein Join verarbeitet ist bevor Alice sendet
    schreiben(&mut alice, json!({"action": "join", "time": 1.0, "room": "#lobby"})).await;
    schreiben(&mut bob, json!({"action": "join", "time": 1.0, "room": "#lobby"})).await;
    schreiben(&mut bob, json!({"action": "get_contacts", "time": 1.0})).await;
    let kontakte = lesen(&mut bob).await;
    assert_eq!(kontakte["response"], 200);

    // Raumnachricht von Alice: kommt bei Bob an, mit Raum-Tag
    schreiben(
        &mut alice,
        json!({"action": "msg", "time": 1.0, "to": "#lobby", "message": "hi"}),
    )
    .await;
    let raum_nachricht = lesen(&mut bob).await;
    assert_eq!(raum_nachricht["action"], "msg");
    assert_eq!(raum_nachricht["from"], "alice");
    assert_eq!(raum_nachricht["message"], "hi");
    assert_eq!(raum_nachricht["room"], "#lobby");

    // Kein Echo an Alice: ihre naechste Nachricht ist Bobs
    // Direktnachricht, nicht die eigene Raumnachricht
    schreiben(
        &mut bob,
        json!({"action": "msg", "time": 1.0, "to": "alice", "message": "direkt"}),
    )
    .await;
    let direkt = lesen(&mut alice).await;
    assert_eq!(direkt["action"], "msg");
    assert_eq!(direkt["from"], "bob");
    assert_eq!(direkt["message"], "direkt");
    assert!(direkt.get("room").is_none());

    let _ = abbruch_tx.send(true);
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn unangemeldete_nachricht_bekommt_401() {
    let (adresse, abbruch_tx, handle) = server_starten(test_config()).await;

    let mut strom = TcpStream::connect(adresse).await.unwrap();
    schreiben(
        &mut strom,
        json!({"action": "msg", "time": 1.0, "to": "wer", "message": "hi"}),
    )
    .await;

    let antwort = lesen(&mut strom).await;
    assert_eq!(antwort["response"], 401);
    assert_eq!(antwort["message"], "Allowed only for authed users");

    let _ = abbruch_tx.send(true);
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn quit_beendet_die_verbindung() {
    let (adresse, abbruch_tx, handle) = server_starten(test_config()).await;

    let mut strom = TcpStream::connect(adresse).await.unwrap();
    anmelden(&mut strom, "carol").await;
    schreiben(&mut strom, json!({"action": "quit"})).await;

    // Der Server schliesst; das naechste Lesen endet am Stromende
    let mut kopf = [0u8; 4];
    let ergebnis = strom.read_exact(&mut kopf).await;
    assert!(ergebnis.is_err());

    let _ = abbruch_tx.send(true);
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn rahmen_mit_laenge_null_trennt_die_verbindung() {
    let (adresse, abbruch_tx, handle) = server_starten(test_config()).await;

    let mut strom = TcpStream::connect(adresse).await.unwrap();
    strom.write_all(&[0, 0, 0, 0]).await.unwrap();

    let mut kopf = [0u8; 4];
    let ergebnis = strom.read_exact(&mut kopf).await;
    assert!(ergebnis.is_err());

    let _ = abbruch_tx.send(true);
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn unbekannte_action_trennt_die_verbindung() {
    let (adresse, abbruch_tx, handle) = server_starten(test_config()).await;

    let mut strom = TcpStream::connect(adresse).await.unwrap();
    schreiben(&mut strom, json!({"action": "fly_to_moon", "time": 1.0})).await;

    let mut kopf = [0u8; 4];
    let ergebnis = strom.read_exact(&mut kopf).await;
    assert!(ergebnis.is_err());

    let _ = abbruch_tx.send(true);
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn sonden_erreichen_angemeldete_sitzungen() {
    let mut config = test_config();
    config.takt.sonden_intervall_sek = 1;
    let (adresse, abbruch_tx, handle) = server_starten(config).await;

    let mut strom = TcpStream::connect(adresse).await.unwrap();
    anmelden(&mut strom, "dora").await;

    let sonde = lesen(&mut strom).await;
    assert_eq!(sonde["action"], "probe");
    assert!(sonde["time"].is_number());

    let _ = abbruch_tx.send(true);
    handle.await.unwrap().unwrap();
}
