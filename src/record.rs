//! Installed-apps records and their binary payload.
//!
//! A parsed input line becomes an [`AppsInstalled`]. Only the `{apps, lat, lon}`
//! part is stored; it travels as a [`UserApps`] value encoded with `postcard`.
//! The device type and id only contribute to the store key.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// One validated input record.
#[derive(Clone, Debug, PartialEq)]
pub struct AppsInstalled {
    pub dev_type: String,
    pub dev_id: String,
    pub lat: f64,
    pub lon: f64,
    pub apps: Vec<u32>,
}

impl AppsInstalled {
    /// Store key, `"<device_type>:<device_id>"`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}:{}", self.dev_type, self.dev_id)
    }

    /// The value half of the record as written to the store.
    #[must_use]
    pub fn user_apps(&self) -> UserApps {
        UserApps {
            apps: self.apps.clone(),
            lat: self.lat,
            lon: self.lon,
        }
    }
}

/// Binary value stored under each key.
///
/// Field order is part of the wire schema; append new fields, never reorder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserApps {
    pub apps: Vec<u32>,
    pub lat: f64,
    pub lon: f64,
}

impl UserApps {
    /// Serialize to the stored byte form.
    ///
    /// # Errors
    ///
    /// Returns an error if `postcard` cannot encode the value.
    pub fn encode(&self) -> Result<Vec<u8>> {
        postcard::to_allocvec(self).context("encode UserApps")
    }

    /// Deserialize from the stored byte form.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is not a valid `UserApps` payload.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        postcard::from_bytes(bytes).context("decode UserApps")
    }
}

/// Sample rows checked by [`self_check`].
pub const SELF_CHECK_SAMPLE: &str = "idfa\t1rfw452y52g2gq4g\t55.55\t42.42\t1423,43,567,3,7,23\n\
                                     gaid\t7rfw452y52g2gq4g\t55.55\t42.42\t7423,424";

/// Encode and decode the built-in samples, requiring a byte-exact round trip.
///
/// # Errors
///
/// Returns an error naming the sample row when a round trip does not match.
pub fn self_check() -> Result<()> {
    check_samples(SELF_CHECK_SAMPLE)
}

/// Round-trip every non-blank row of `sample`.
///
/// # Errors
///
/// Returns an error if a row is rejected by the parser or does not survive an
/// encode/decode cycle unchanged.
pub fn check_samples(sample: &str) -> Result<()> {
    for line in sample.lines() {
        let record = match crate::parser::parse_line(line) {
            Ok(Some(record)) => record,
            Ok(None) => continue,
            Err(reason) => bail!("self-check sample rejected ({reason}): {line}"),
        };
        let ua = record.user_apps();
        let packed = ua.encode()?;
        let unpacked = UserApps::decode(&packed)?;
        if unpacked != ua {
            bail!("self-check round trip changed the value for `{}`", record.key());
        }
        if unpacked.encode()? != packed {
            bail!("self-check re-encode changed the bytes for `{}`", record.key());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_joins_type_and_id() {
        let r = AppsInstalled {
            dev_type: "idfa".into(),
            dev_id: "abc".into(),
            lat: 1.0,
            lon: 2.0,
            apps: vec![],
        };
        assert_eq!(r.key(), "idfa:abc");
    }

    #[test]
    fn samples_round_trip() {
        self_check().unwrap();
    }

    #[test]
    fn sample_payloads_decode_to_literals() {
        let ua = UserApps {
            apps: vec![1423, 43, 567, 3, 7, 23],
            lat: 55.55,
            lon: 42.42,
        };
        let decoded = UserApps::decode(&ua.encode().unwrap()).unwrap();
        assert_eq!(decoded, ua);

        let gaid = UserApps {
            apps: vec![7423, 424],
            lat: 55.55,
            lon: 42.42,
        };
        assert_ne!(gaid.encode().unwrap(), ua.encode().unwrap());
    }

    #[test]
    fn malformed_sample_fails_the_check() {
        let sample = "idfa\t1rfw452y52g2gq4g\t55.55\t42.42\t1,2\ngaid\tshort\t1";
        let err = check_samples(sample).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("self-check sample rejected"), "{msg}");
        assert!(msg.contains("gaid\tshort"), "{msg}");
    }

    #[test]
    fn blank_sample_rows_are_ignored() {
        check_samples("\n\nidfa\tx\t1\t2\t3\n\n").unwrap();
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let bytes = UserApps {
            apps: vec![1, 2, 3],
            lat: 0.5,
            lon: 0.25,
        }
        .encode()
        .unwrap();
        assert!(UserApps::decode(&bytes[..bytes.len() - 3]).is_err());
    }
}
