//! UDP ingest of location packets sent by the phone.
//!
//! A packet is `TIMESTAMP LATITUDE LONGITUDE ACCURACY [extra fields]`. Valid
//! packets are appended to the point log; anything else is dropped.
//!
//! In signed mode the fifth field is `DIGEST`, the lowercase hex SHA1 of the
//! first four fields joined by single spaces followed by the shared secret.

use crate::{config::Config, errors::PacketError};
use chrono::Utc;
use sha1::{Digest, Sha1};
use std::fmt::Write as _;
use std::{io, net::SocketAddr, path::PathBuf};
use tokio::{fs::OpenOptions, io::AsyncWriteExt, net::UdpSocket};
use tracing::{debug, error, info};

/// Largest accepted difference between a packet timestamp and local time.
pub const MAX_TIME_DIFF_SECS: i64 = 5 * 60;
pub const MAX_ACCURACY_M: i64 = 10_000;

const DATAGRAM_SIZE: usize = 256;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Signing {
    #[default]
    Unsigned,
    /// Every packet is rejected while `secret` is unset.
    Signed { secret: Option<String> },
}

impl Signing {
    pub fn from_config(config: &Config) -> Self {
        if config.signed {
            Self::Signed {
                secret: config.packet_secret.clone(),
            }
        } else {
            Self::Unsigned
        }
    }

    fn verify(&self, tokens: &[&str]) -> Result<(), PacketError> {
        let Self::Signed { secret } = self else {
            return Ok(());
        };
        if tokens.len() < 5 {
            return Err(PacketError::MissingDigest);
        }
        let secret = secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
            .ok_or(PacketError::NoSecret)?;
        if packet_digest(&tokens[..4].join(" "), secret) != tokens[4] {
            return Err(PacketError::DigestMismatch);
        }
        Ok(())
    }
}

/// Hex SHA1 of `payload` followed by `secret`.
pub fn packet_digest(payload: &str, secret: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(payload.as_bytes());
    hasher.update(secret.as_bytes());
    hasher
        .finalize()
        .iter()
        .fold(String::with_capacity(40), |mut hex, byte| {
            let _ = write!(hex, "{byte:02x}");
            hex
        })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Packet {
    pub timestamp: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: i64,
}

pub fn parse_packet(
    data: &str,
    now: i64,
    last_timestamp: Option<i64>,
    signing: &Signing,
) -> Result<Packet, PacketError> {
    let tokens: Vec<&str> = data.split_whitespace().collect();
    signing.verify(&tokens)?;
    if tokens.len() < 4 {
        return Err(PacketError::TooFewFields(tokens.len()));
    }

    let timestamp = tokens[0]
        .parse::<i64>()
        .map_err(|_| PacketError::Malformed("timestamp"))?;
    let latitude = tokens[1]
        .parse::<f64>()
        .map_err(|_| PacketError::Malformed("latitude"))?;
    let longitude = tokens[2]
        .parse::<f64>()
        .map_err(|_| PacketError::Malformed("longitude"))?;
    let accuracy = tokens[3]
        .parse::<i64>()
        .map_err(|_| PacketError::Malformed("accuracy"))?;

    if timestamp.abs_diff(now) > MAX_TIME_DIFF_SECS.unsigned_abs() {
        return Err(PacketError::ClockSkew { timestamp, now });
    }
    if let Some(last) = last_timestamp.filter(|last| timestamp <= *last) {
        return Err(PacketError::NotMonotonic { timestamp, last });
    }
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(PacketError::OutOfRange("latitude"));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(PacketError::OutOfRange("longitude"));
    }
    if !(0..=MAX_ACCURACY_M).contains(&accuracy) {
        return Err(PacketError::OutOfRange("accuracy"));
    }

    Ok(Packet {
        timestamp,
        latitude,
        longitude,
        accuracy,
    })
}

/// One point log line, newline included.
pub fn format_packet(packet: &Packet) -> String {
    format!(
        "{} {:.7} {:.7} {}\n",
        packet.timestamp, packet.latitude, packet.longitude, packet.accuracy
    )
}

pub struct Receiver {
    socket: UdpSocket,
    log_path: PathBuf,
    signing: Signing,
    last_timestamp: Option<i64>,
}

impl Receiver {
    pub async fn bind(addr: SocketAddr, log_path: PathBuf, signing: Signing) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self {
            socket,
            log_path,
            signing,
            last_timestamp: None,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Waits for one datagram. Returns the packet if it was valid and appended.
    pub async fn receive_once(&mut self) -> io::Result<Option<Packet>> {
        let mut buf = [0u8; DATAGRAM_SIZE];
        let (len, peer) = self.socket.recv_from(&mut buf).await?;

        let parsed = std::str::from_utf8(&buf[..len])
            .map_err(|_| PacketError::Encoding)
            .and_then(|data| {
                parse_packet(data, Utc::now().timestamp(), self.last_timestamp, &self.signing)
            });
        let packet = match parsed {
            Ok(packet) => packet,
            Err(err) => {
                debug!("dropping packet from {peer}: {err}");
                return Ok(None);
            }
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .await?;
        file.write_all(format_packet(&packet).as_bytes()).await?;
        file.flush().await?;
        self.last_timestamp = Some(packet.timestamp);
        Ok(Some(packet))
    }

    pub async fn run(mut self) {
        match self.local_addr() {
            Ok(addr) => info!(
                signed = matches!(self.signing, Signing::Signed { .. }),
                "receiving location packets on udp://{addr}"
            ),
            Err(err) => error!("failed to read receiver address: {err}"),
        }
        loop {
            if let Err(err) = self.receive_once().await {
                error!("failed to ingest packet: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn parse(data: &str) -> Result<Packet, PacketError> {
        parse_packet(data, NOW, None, &Signing::Unsigned)
    }

    fn signed(secret: Option<&str>) -> Signing {
        Signing::Signed {
            secret: secret.map(str::to_string),
        }
    }

    fn log_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "pathmap_{tag}_{}_{}.txt",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ))
    }

    #[test]
    fn rejects_timestamps_far_from_now() {
        let past = format!("{} 1.1 2.2 2", NOW - MAX_TIME_DIFF_SECS * 2);
        let future = format!("{} 1.1 2.2 2", NOW + MAX_TIME_DIFF_SECS * 2);
        assert!(matches!(parse(&past), Err(PacketError::ClockSkew { .. })));
        assert!(matches!(parse(&future), Err(PacketError::ClockSkew { .. })));
    }

    #[test]
    fn extreme_timestamps_are_skewed_not_overflowed() {
        for timestamp in [i64::MIN, i64::MAX] {
            assert_eq!(
                parse(&format!("{timestamp} 1.1 2.2 3")),
                Err(PacketError::ClockSkew { timestamp, now: NOW })
            );
        }
        let edge = format!("{} 1.1 2.2 3", NOW + MAX_TIME_DIFF_SECS);
        assert!(parse(&edge).is_ok());
    }

    #[test]
    fn rejects_short_packets() {
        assert_eq!(parse(""), Err(PacketError::TooFewFields(0)));
        assert_eq!(parse(&format!("{NOW} 1.1 2.2")), Err(PacketError::TooFewFields(3)));
        assert_eq!(parse(&format!("{NOW} 1.1")), Err(PacketError::TooFewFields(2)));
    }

    #[test]
    fn rejects_bad_coordinates() {
        assert_eq!(parse(&format!("{NOW} z 2.2 2")), Err(PacketError::Malformed("latitude")));
        assert_eq!(
            parse(&format!("{NOW} -91.0 2.2 2")),
            Err(PacketError::OutOfRange("latitude"))
        );
        assert_eq!(
            parse(&format!("{NOW} 91.0 2.2 2")),
            Err(PacketError::OutOfRange("latitude"))
        );
        assert_eq!(parse(&format!("{NOW} 1.1 z 2")), Err(PacketError::Malformed("longitude")));
        assert_eq!(
            parse(&format!("{NOW} 1.1 -181.0 2")),
            Err(PacketError::OutOfRange("longitude"))
        );
        assert_eq!(
            parse(&format!("{NOW} 1.1 181 2")),
            Err(PacketError::OutOfRange("longitude"))
        );
    }

    #[test]
    fn rejects_bad_accuracy() {
        assert_eq!(parse(&format!("{NOW} 1.1 2.2 z")), Err(PacketError::Malformed("accuracy")));
        assert_eq!(parse(&format!("{NOW} 1.1 2.2 2.5")), Err(PacketError::Malformed("accuracy")));
        assert_eq!(
            parse(&format!("{NOW} 1.1 2.2 -1")),
            Err(PacketError::OutOfRange("accuracy"))
        );
        assert_eq!(
            parse(&format!("{NOW} 1.1 2.2 {}", MAX_ACCURACY_M + 1)),
            Err(PacketError::OutOfRange("accuracy"))
        );
    }

    #[test]
    fn requires_increasing_timestamps() {
        let data = format!("{NOW} 1.1 2.2 2");
        assert!(parse_packet(&data, NOW, Some(NOW - 1), &Signing::Unsigned).is_ok());
        assert_eq!(
            parse_packet(&data, NOW, Some(NOW), &Signing::Unsigned),
            Err(PacketError::NotMonotonic {
                timestamp: NOW,
                last: NOW
            })
        );
    }

    #[test]
    fn accepts_and_formats_valid_packet() {
        let packet = parse(&format!("{NOW}  1.1 2.2 25 trailing\n")).unwrap();
        assert_eq!(packet.accuracy, 25);
        assert_eq!(format_packet(&packet), format!("{NOW} 1.1000000 2.2000000 25\n"));
    }

    #[test]
    fn digest_is_lowercase_hex_sha1() {
        assert_eq!(packet_digest("abc", ""), "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_eq!(packet_digest("ab", "c"), packet_digest("abc", ""));
    }

    #[test]
    fn signed_packets_need_a_matching_digest() {
        let secret = "s3cret";
        let signing = signed(Some(secret));
        let payload = format!("{NOW} 1.1 2.2 3");

        assert_eq!(
            parse_packet(&payload, NOW, None, &signing),
            Err(PacketError::MissingDigest)
        );
        assert_eq!(
            parse_packet(&format!("{payload} bad_digest"), NOW, None, &signing),
            Err(PacketError::DigestMismatch)
        );

        let digest = packet_digest(&payload, secret);
        let first = parse_packet(&format!("{payload} {digest}"), NOW, None, &signing).unwrap();
        assert_eq!(first.timestamp, NOW);
        assert_eq!(first.accuracy, 3);

        let payload = format!("{} 1.1 2.2 3", NOW + 1);
        let digest = packet_digest(&payload, secret);
        let second = parse_packet(&format!("{payload} {digest}"), NOW, Some(NOW), &signing).unwrap();
        assert_eq!(second.timestamp, NOW + 1);

        let payload = format!("{} 1.1 2.2 3", NOW + 2);
        let digest = packet_digest(&payload, secret);
        assert_eq!(
            parse_packet(&format!("{payload} {digest}erroneous"), NOW, Some(NOW + 1), &signing),
            Err(PacketError::DigestMismatch)
        );
        let third = parse_packet(&format!("{payload} {digest}"), NOW, Some(NOW + 1), &signing).unwrap();
        assert_eq!(third.timestamp, NOW + 2);
    }

    #[test]
    fn signed_digest_covers_normalized_payload() {
        let signing = signed(Some("k"));
        let digest = packet_digest(&format!("{NOW} 1.1 2.2 3"), "k");
        let packet = parse_packet(&format!("  {NOW}   1.1 2.2\t3 {digest}\n"), NOW, None, &signing);
        assert!(packet.is_ok());
    }

    #[test]
    fn signed_mode_without_secret_rejects_everything() {
        let payload = format!("{NOW} 1.1 2.2 3");
        let digest = packet_digest(&payload, "");
        for signing in [signed(None), signed(Some(""))] {
            assert_eq!(
                parse_packet(&format!("{payload} {digest}"), NOW, None, &signing),
                Err(PacketError::NoSecret)
            );
        }
    }

    #[test]
    fn signing_follows_config() {
        let mut config = Config::default();
        assert_eq!(Signing::from_config(&config), Signing::Unsigned);

        config.packet_secret = Some("k".to_string());
        assert_eq!(Signing::from_config(&config), Signing::Unsigned);

        config.signed = true;
        assert_eq!(Signing::from_config(&config), signed(Some("k")));
    }

    #[tokio::test]
    async fn receiver_appends_valid_packets() {
        let log_path = log_path("ingest");
        let mut receiver = Receiver::bind(
            "127.0.0.1:0".parse().unwrap(),
            log_path.clone(),
            Signing::Unsigned,
        )
        .await
        .unwrap();
        let target = receiver.local_addr().unwrap();
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        sender.send_to(b"garbage", target).await.unwrap();
        assert_eq!(receiver.receive_once().await.unwrap(), None);

        let now = Utc::now().timestamp();
        sender
            .send_to(format!("{now} 50.45 30.52 12").as_bytes(), target)
            .await
            .unwrap();
        let packet = receiver.receive_once().await.unwrap().unwrap();
        assert_eq!(packet.timestamp, now);

        let written = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(written, format!("{now} 50.4500000 30.5200000 12\n"));

        sender
            .send_to(format!("{} 50.46 30.53 8", now + 1).as_bytes(), target)
            .await
            .unwrap();
        assert!(receiver.receive_once().await.unwrap().is_some());
        let written = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(
            written,
            format!(
                "{now} 50.4500000 30.5200000 12\n{} 50.4600000 30.5300000 8\n",
                now + 1
            )
        );
        let _ = std::fs::remove_file(log_path);
    }

    #[tokio::test]
    async fn signed_receiver_drops_unsigned_packets() {
        let log_path = log_path("ingest_signed");
        let mut receiver = Receiver::bind(
            "127.0.0.1:0".parse().unwrap(),
            log_path.clone(),
            signed(Some("k")),
        )
        .await
        .unwrap();
        let target = receiver.local_addr().unwrap();
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let now = Utc::now().timestamp();
        let payload = format!("{now} 50.45 30.52 12");
        sender.send_to(payload.as_bytes(), target).await.unwrap();
        assert_eq!(receiver.receive_once().await.unwrap(), None);

        let digest = packet_digest(&payload, "k");
        sender
            .send_to(format!("{payload} {digest}").as_bytes(), target)
            .await
            .unwrap();
        assert!(receiver.receive_once().await.unwrap().is_some());

        let written = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(written, format!("{now} 50.4500000 30.5200000 12\n"));
        let _ = std::fs::remove_file(log_path);
    }
}
