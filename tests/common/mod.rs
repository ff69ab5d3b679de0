//! Reference encoder mirroring what the legacy platform emits.

#![allow(dead_code)]

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockEncryptMut, KeyIvInit};
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use legacy_ticket::ticket::ticks::utc_to_ticks;
use legacy_ticket::{KeyMaterial, Ticket};
use rand::RngCore;
use sha1::Sha1;

pub const DECRYPTION_KEY: &str = "5c8a7e1f9d3b2a6e4f0c1d7b8a9e3f2c";
pub const VALIDATION_KEY: &str =
    "b7f2c0a94e6d1835f2a7c9e0d4b16f83a2c5e7d9f1b3a5c7e9d0f2b4a6c8e0d2";

pub fn keys() -> KeyMaterial {
    KeyMaterial::from_hex("AES", DECRYPTION_KEY, "SHA1", VALIDATION_KEY).unwrap()
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 3, 14, 15, 9, 26).unwrap()
}

pub fn alice() -> Ticket {
    Ticket {
        version: 1,
        name: "alice".into(),
        issue_date_utc: t0(),
        expiration_utc: t0() + chrono::Duration::minutes(30),
        is_persistent: false,
        user_data: String::new(),
        cookie_path: "/".into(),
    }
}

fn push_var_len(out: &mut Vec<u8>, mut n: usize) {
    while n >= 0x80 {
        out.push((n as u8) | 0x80);
        n >>= 7;
    }
    out.push(n as u8);
}

fn push_str(out: &mut Vec<u8>, s: &str) {
    let units: Vec<u16> = s.encode_utf16().collect();
    push_var_len(out, units.len());
    for unit in units {
        out.extend_from_slice(&unit.to_le_bytes());
    }
}

pub fn serialize(ticket: &Ticket) -> Vec<u8> {
    let mut out = vec![0x01, ticket.version];
    out.extend_from_slice(&utc_to_ticks(ticket.issue_date_utc).unwrap().to_le_bytes());
    out.push(0xfe);
    out.extend_from_slice(&utc_to_ticks(ticket.expiration_utc).unwrap().to_le_bytes());
    out.push(ticket.is_persistent as u8);
    push_str(&mut out, &ticket.name);
    push_str(&mut out, &ticket.user_data);
    push_str(&mut out, &ticket.cookie_path);
    out.push(0xff);
    out
}

pub fn hmac(keys: &KeyMaterial, data: &[u8]) -> Vec<u8> {
    let mut mac = Hmac::<Sha1>::new_from_slice(keys.validation_key()).unwrap();
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Encrypts `payload` behind a random prefix and appends the digest.
pub fn seal(keys: &KeyMaterial, payload: &[u8]) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let mut plain = vec![0u8; keys.iv_length()];
    rng.fill_bytes(&mut plain);
    plain.extend_from_slice(payload);

    let mut iv = [0u8; 16];
    rng.fill_bytes(&mut iv);
    let key = keys.decryption_key();
    let mut out = match key.len() {
        16 => cbc::Encryptor::<aes::Aes128>::new_from_slices(key, &iv)
            .unwrap()
            .encrypt_padded_vec_mut::<Pkcs7>(&plain),
        24 => cbc::Encryptor::<aes::Aes192>::new_from_slices(key, &iv)
            .unwrap()
            .encrypt_padded_vec_mut::<Pkcs7>(&plain),
        32 => cbc::Encryptor::<aes::Aes256>::new_from_slices(key, &iv)
            .unwrap()
            .encrypt_padded_vec_mut::<Pkcs7>(&plain),
        n => panic!("unsupported key length {}", n),
    };
    let mac = hmac(keys, &out);
    out.extend_from_slice(&mac);
    out
}

pub fn encode(keys: &KeyMaterial, ticket: &Ticket) -> String {
    hex::encode_upper(seal(keys, &serialize(ticket)))
}

/// Encodes with a second digest of the ticket inside the encryption.
pub fn encode_with_inner_digest(keys: &KeyMaterial, ticket: &Ticket) -> String {
    let mut payload = serialize(ticket);
    let mac = hmac(keys, &payload);
    payload.extend_from_slice(&mac);
    hex::encode_upper(seal(keys, &payload))
}
