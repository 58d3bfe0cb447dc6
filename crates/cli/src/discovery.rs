//! External address discovery through a STUN Binding Request (RFC 5389).

use anyhow::{Context, Result, bail};
use rand::RngCore;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use tokio::net::{UdpSocket, lookup_host};

const MAGIC_COOKIE: u32 = 0x2112_A442;
const BINDING_REQUEST: u16 = 0x0001;
const BINDING_SUCCESS: u16 = 0x0101;
const ATTR_MAPPED_ADDRESS: u16 = 0x0001;
const ATTR_XOR_MAPPED_ADDRESS: u16 = 0x0020;
const HEADER_LEN: usize = 20;

type TransactionId = [u8; 12];

/// Ask `server` for this host's public address.
///
/// Any failure (resolution, timeout, malformed reply) yields `None`; the
/// caller falls back to localhost.
pub async fn discover(server: &str, timeout: Duration) -> Option<IpAddr> {
    match tokio::time::timeout(timeout, query(server)).await {
        Ok(Ok(ip)) => {
            tracing::info!(server = %server, ip = %ip, "External address discovered");
            Some(ip)
        }
        Ok(Err(e)) => {
            tracing::warn!(server = %server, error = %e, "Address discovery failed");
            None
        }
        Err(_) => {
            tracing::warn!(server = %server, timeout = ?timeout, "Address discovery timed out");
            None
        }
    }
}

async fn query(server: &str) -> Result<IpAddr> {
    let remote = lookup_host(server)
        .await
        .with_context(|| format!("failed to resolve {server}"))?
        .next()
        .with_context(|| format!("{server} resolved to no addresses"))?;

    let local = if remote.is_ipv4() {
        "0.0.0.0:0"
    } else {
        "[::]:0"
    };
    let socket = UdpSocket::bind(local)
        .await
        .context("failed to bind UDP socket")?;
    socket.connect(remote).await.context("failed to connect UDP socket")?;

    let mut transaction = TransactionId::default();
    rand::rng().fill_bytes(&mut transaction);
    socket
        .send(&binding_request(&transaction))
        .await
        .context("failed to send binding request")?;

    let mut buf = [0u8; 1024];
    loop {
        let len = socket.recv(&mut buf).await.context("failed to receive")?;
        match parse_binding_response(&buf[..len], &transaction) {
            Ok(ip) => return Ok(ip),
            // Stray datagrams for other transactions are skipped.
            Err(ResponseError::Mismatch) => continue,
            Err(ResponseError::Malformed(reason)) => bail!("malformed STUN response: {reason}"),
        }
    }
}

fn binding_request(transaction: &TransactionId) -> [u8; HEADER_LEN] {
    let mut message = [0u8; HEADER_LEN];
    message[0..2].copy_from_slice(&BINDING_REQUEST.to_be_bytes());
    // Message length stays zero: no attributes.
    message[4..8].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
    message[8..20].copy_from_slice(transaction);
    message
}

#[derive(Debug, PartialEq, Eq)]
enum ResponseError {
    Mismatch,
    Malformed(&'static str),
}

/// Extract the mapped address from a Binding Success Response.
///
/// XOR-MAPPED-ADDRESS wins over MAPPED-ADDRESS when both are present.
fn parse_binding_response(
    message: &[u8],
    transaction: &TransactionId,
) -> Result<IpAddr, ResponseError> {
    if message.len() < HEADER_LEN {
        return Err(ResponseError::Malformed("short header"));
    }
    let cookie = u32::from_be_bytes([message[4], message[5], message[6], message[7]]);
    if cookie != MAGIC_COOKIE || message[8..20] != transaction[..] {
        return Err(ResponseError::Mismatch);
    }
    if u16::from_be_bytes([message[0], message[1]]) != BINDING_SUCCESS {
        return Err(ResponseError::Malformed("not a binding success response"));
    }

    let body_len = u16::from_be_bytes([message[2], message[3]]) as usize;
    let body = message
        .get(HEADER_LEN..HEADER_LEN + body_len)
        .ok_or(ResponseError::Malformed("truncated body"))?;

    let mut mapped = None;
    let mut offset = 0;
    while offset + 4 <= body.len() {
        let kind = u16::from_be_bytes([body[offset], body[offset + 1]]);
        let len = u16::from_be_bytes([body[offset + 2], body[offset + 3]]) as usize;
        let value = body
            .get(offset + 4..offset + 4 + len)
            .ok_or(ResponseError::Malformed("truncated attribute"))?;

        match kind {
            ATTR_XOR_MAPPED_ADDRESS => return decode_address(value, Some(transaction)),
            ATTR_MAPPED_ADDRESS if mapped.is_none() => {
                mapped = Some(decode_address(value, None)?);
            }
            _ => {}
        }
        // Attribute values are padded to a multiple of four bytes.
        offset += 4 + len.div_ceil(4) * 4;
    }

    mapped.ok_or(ResponseError::Malformed("no mapped address"))
}

/// Decode an address attribute value, undoing the XOR when `xor_with` is set.
fn decode_address(
    value: &[u8],
    xor_with: Option<&TransactionId>,
) -> Result<IpAddr, ResponseError> {
    if value.len() < 4 {
        return Err(ResponseError::Malformed("short address attribute"));
    }
    let mut key = [0u8; 16];
    if let Some(transaction) = xor_with {
        key[..4].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
        key[4..].copy_from_slice(transaction);
    }

    match value[1] {
        0x01 => {
            let raw: [u8; 4] = value
                .get(4..8)
                .and_then(|b| b.try_into().ok())
                .ok_or(ResponseError::Malformed("short IPv4 address"))?;
            let octets: [u8; 4] = std::array::from_fn(|i| raw[i] ^ key[i]);
            Ok(IpAddr::V4(Ipv4Addr::from(octets)))
        }
        0x02 => {
            let raw: [u8; 16] = value
                .get(4..20)
                .and_then(|b| b.try_into().ok())
                .ok_or(ResponseError::Malformed("short IPv6 address"))?;
            let octets: [u8; 16] = std::array::from_fn(|i| raw[i] ^ key[i]);
            Ok(IpAddr::V6(Ipv6Addr::from(octets)))
        }
        _ => Err(ResponseError::Malformed("unknown address family")),
    }
}
