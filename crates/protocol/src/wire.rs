//! Wire-Format: Laengen-Prefix-Rahmen
//!
//! Jede logische Nachricht ist `[u32 BE Payload-Laenge][JSON-Payload]`.
//! Das Laengenfeld zaehlt nur die Payload-Bytes, nie sich selbst.
//!
//! ```text
//! +--------+--------+--------+--------+----...----+
//! | Laenge (u32 BE) | 4 Bytes        | Payload    |
//! +--------+--------+--------+--------+----...----+
//! ```
//!
//! Eine Laenge von 0 ist ein Protokollverstoss (keine leere Nachricht);
//! die betroffene Verbindung muss geschlossen werden.

use bytes::{Buf, Bytes, BytesMut};

use crate::error::ProtokollFehler;
use crate::puffer::SendePuffer;

/// Groesse des Laengenfelds in Bytes
pub const KOPF_GROESSE: usize = 4;

/// Standard-Obergrenze fuer eingehende Rahmen (1 MiB)
pub const MAX_RAHMEN_GROESSE: usize = 1024 * 1024;

// ---------------------------------------------------------------------------
// Rahmen schreiben
// ---------------------------------------------------------------------------

/// Rahmt eine Payload und haengt sie an den Sendepuffer an
///
/// Schlaegt mit [`ProtokollFehler::NachrichtZuGross`] fehl wenn die
/// Payload nicht in das vorzeichenlose 32-Bit-Laengenfeld passt; es wird
/// nie stillschweigend abgeschnitten.
pub fn rahmen_anhaengen(
    nutzdaten: &[u8],
    puffer: &mut SendePuffer,
) -> Result<(), ProtokollFehler> {
    let laenge =
        u32::try_from(nutzdaten.len()).map_err(|_| ProtokollFehler::NachrichtZuGross {
            groesse: nutzdaten.len(),
            maximum: u32::MAX as usize,
        })?;
    puffer.anhaengen(&laenge.to_be_bytes());
    puffer.anhaengen(nutzdaten);
    Ok(())
}

// ---------------------------------------------------------------------------
// NachrichtenTeiler
// ---------------------------------------------------------------------------

/// Setzt Rahmen aus beliebig zerstueckelten Lese-Happen wieder zusammen
///
/// `einspeisen` akzeptiert jede Aufteilung des Byte-Stroms – Splits mitten
/// im Laengenfeld, genau an der Kopfgrenze oder ein Byte in die Payload –
/// und liefert vollstaendige Payloads in Empfangsreihenfolge. Pro
/// Verbindung strikt sequenziell; es gibt genau einen Teiler je Socket.
#[derive(Debug)]
pub struct NachrichtenTeiler {
    puffer: BytesMut,
    max_rahmen: usize,
}

impl NachrichtenTeiler {
    /// Erstellt einen Teiler mit der Standard-Rahmenobergrenze
    pub fn neu() -> Self {
        Self::mit_maximalgroesse(MAX_RAHMEN_GROESSE)
    }

    /// Erstellt einen Teiler mit eigener Rahmenobergrenze
    pub fn mit_maximalgroesse(max_rahmen: usize) -> Self {
        Self {
            puffer: BytesMut::new(),
            max_rahmen,
        }
    }

    /// Nimmt einen Lese-Happen auf und extrahiert alle vollstaendigen Rahmen
    ///
    /// # Fehler
    /// - [`ProtokollFehler::NullLaenge`] bei einem Laengenfeld von 0
    /// - [`ProtokollFehler::NachrichtZuGross`] wenn das Laengenfeld die
    ///   Obergrenze ueberschreitet
    ///
    /// Beide sind Protokollverstoesse; der Aufrufer schliesst daraufhin
    /// die Verbindung.
    pub fn einspeisen(&mut self, daten: &[u8]) -> Result<Vec<Bytes>, ProtokollFehler> {
        self.puffer.extend_from_slice(daten);

        let mut rahmen = Vec::new();
        loop {
            if self.puffer.len() < KOPF_GROESSE {
                break;
            }

            let laenge = u32::from_be_bytes([
                self.puffer[0],
                self.puffer[1],
                self.puffer[2],
                self.puffer[3],
            ]) as usize;

            if laenge == 0 {
                return Err(ProtokollFehler::NullLaenge);
            }
            if laenge > self.max_rahmen {
                return Err(ProtokollFehler::NachrichtZuGross {
                    groesse: laenge,
                    maximum: self.max_rahmen,
                });
            }

            if self.puffer.len() < KOPF_GROESSE + laenge {
                // Auf den Rest der Payload warten
                self.puffer.reserve(KOPF_GROESSE + laenge - self.puffer.len());
                break;
            }

            self.puffer.advance(KOPF_GROESSE);
            rahmen.push(self.puffer.split_to(laenge).freeze());
        }

        Ok(rahmen)
    }
}

impl Default for NachrichtenTeiler {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn gerahmt(nutzdaten: &[u8]) -> Vec<u8> {
        let mut puffer = SendePuffer::neu();
        rahmen_anhaengen(nutzdaten, &mut puffer).unwrap();
        puffer.daten().to_vec()
    }

    #[test]
    fn rahmen_kopf_ist_big_endian_laenge() {
        let daten = gerahmt(b"abc");
        assert_eq!(&daten[..KOPF_GROESSE], &[0, 0, 0, 3]);
        assert_eq!(&daten[KOPF_GROESSE..], b"abc");
    }

    #[test]
    fn ein_rahmen_am_stueck() {
        let mut sut = NachrichtenTeiler::neu();
        let rahmen = sut.einspeisen(&gerahmt(b"hallo")).unwrap();
        assert_eq!(rahmen.len(), 1);
        assert_eq!(&rahmen[0][..], b"hallo");
    }

    #[test]
    fn jeder_split_punkt_ergibt_denselben_rahmen() {
        // Jede Zerlegung in zwei Happen – auch mitten im Kopf, exakt an
        // der Kopfgrenze und ein Byte in die Payload – muss genau einen
        // identischen Rahmen liefern.
        let daten = gerahmt(b"zerlege mich");
        for split in 0..=daten.len() {
            let mut sut = NachrichtenTeiler::neu();
            let mut rahmen = sut.einspeisen(&daten[..split]).unwrap();
            rahmen.extend(sut.einspeisen(&daten[split..]).unwrap());
            assert_eq!(rahmen.len(), 1, "Split bei {split}");
            assert_eq!(&rahmen[0][..], b"zerlege mich", "Split bei {split}");
        }
    }

    #[test]
    fn byteweises_einspeisen() {
        let daten = gerahmt(b"tropfenweise");
        let mut sut = NachrichtenTeiler::neu();
        let mut rahmen = Vec::new();
        for byte in &daten {
            rahmen.extend(sut.einspeisen(std::slice::from_ref(byte)).unwrap());
        }
        assert_eq!(rahmen.len(), 1);
        assert_eq!(&rahmen[0][..], b"tropfenweise");
    }

    #[test]
    fn zwei_rahmen_in_einem_happen() {
        let mut daten = gerahmt(b"erste");
        daten.extend(gerahmt(b"zweite"));

        let mut sut = NachrichtenTeiler::neu();
        let rahmen = sut.einspeisen(&daten).unwrap();
        assert_eq!(rahmen.len(), 2);
        assert_eq!(&rahmen[0][..], b"erste");
        assert_eq!(&rahmen[1][..], b"zweite");
    }

    #[test]
    fn unvollstaendiger_kopf_wartet() {
        let mut sut = NachrichtenTeiler::neu();
        assert!(sut.einspeisen(&[0, 1]).unwrap().is_empty());
    }

    #[test]
    fn unvollstaendige_payload_wartet() {
        let mut sut = NachrichtenTeiler::neu();
        let rahmen = sut.einspeisen(&[0, 0, 0, 10, b'a', b'b', b'c']).unwrap();
        assert!(rahmen.is_empty());
    }

    #[test]
    fn laenge_null_ist_protokollverstoss() {
        let mut sut = NachrichtenTeiler::neu();
        let result = sut.einspeisen(&[0, 0, 0, 0]);
        assert!(matches!(result, Err(ProtokollFehler::NullLaenge)));
    }

    #[test]
    fn laenge_null_auch_mit_nachfolgenden_bytes() {
        let mut sut = NachrichtenTeiler::neu();
        let result = sut.einspeisen(&[0, 0, 0, 0, b'x', b'y']);
        assert!(matches!(result, Err(ProtokollFehler::NullLaenge)));
    }

    #[test]
    fn rahmen_ueber_der_obergrenze_wird_abgelehnt() {
        let mut sut = NachrichtenTeiler::mit_maximalgroesse(8);
        let result = sut.einspeisen(&[0, 0, 0, 9]);
        assert!(matches!(
            result,
            Err(ProtokollFehler::NachrichtZuGross { groesse: 9, maximum: 8 })
        ));
    }

    #[test]
    fn verstoss_nach_gueltigem_rahmen_im_selben_happen() {
        let mut daten = gerahmt(b"ok");
        daten.extend([0, 0, 0, 0]);

        let mut sut = NachrichtenTeiler::neu();
        let result = sut.einspeisen(&daten);
        assert!(matches!(result, Err(ProtokollFehler::NullLaenge)));
    }
}
