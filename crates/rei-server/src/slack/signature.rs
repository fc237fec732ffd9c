//! Slack request signing (`X-Slack-Signature`, version `v0`).

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("slack signing secret is not configured")]
    NotConfigured,

    #[error("missing {0} header")]
    MissingHeader(&'static str),

    #[error("invalid request timestamp")]
    InvalidTimestamp,

    #[error("request timestamp outside the accepted window")]
    StaleTimestamp,

    #[error("signature mismatch")]
    BadSignature,
}

fn mac(secret: &str, timestamp: &str, body: &[u8]) -> Result<HmacSha256, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::NotConfigured)?;
    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    Ok(mac)
}

/// `v0=` + hex(HMAC-SHA256(secret, "v0:{timestamp}:{body}")).
pub fn sign(secret: &str, timestamp: &str, body: &[u8]) -> Result<String, SignatureError> {
    let digest = mac(secret, timestamp, body)?.finalize().into_bytes();
    Ok(format!("v0={}", hex::encode(digest)))
}

/// Verify a request against the signing secret. `now` is unix seconds.
pub fn verify(
    secret: &str,
    headers: &HeaderMap,
    body: &[u8],
    now: i64,
    tolerance_secs: u64,
) -> Result<(), SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::NotConfigured);
    }
    let timestamp = header(headers, TIMESTAMP_HEADER)?;
    let signature = header(headers, SIGNATURE_HEADER)?;

    let ts: i64 = timestamp
        .trim()
        .parse()
        .map_err(|_| SignatureError::InvalidTimestamp)?;
    if now.abs_diff(ts) > tolerance_secs {
        return Err(SignatureError::StaleTimestamp);
    }

    let provided = signature
        .strip_prefix("v0=")
        .and_then(|h| hex::decode(h).ok())
        .ok_or(SignatureError::BadSignature)?;
    mac(secret, timestamp, body)?
        .verify_slice(&provided)
        .map_err(|_| SignatureError::BadSignature)
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, SignatureError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(SignatureError::MissingHeader(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";

    fn headers(ts: &str, sig: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(TIMESTAMP_HEADER, HeaderValue::from_str(ts).unwrap());
        h.insert(SIGNATURE_HEADER, HeaderValue::from_str(sig).unwrap());
        h
    }

    #[test]
    fn matches_slack_documented_example() {
        let body = b"token=xyzz0WbapA4vBCDEFasx0q6G&team_id=T1DC2JH3J&team_domain=testteamnow&channel_id=G8PSS9T3V&channel_name=foobar&user_id=U2CERLKJA&user_name=roadrunner&command=%2Fwebhook-collect&text=&response_url=https%3A%2F%2Fhooks.slack.com%2Fcommands%2FT1DC2JH3J%2F397700885554%2F96rGlfmibIGlgcZRskXaIFfN&trigger_id=398738663015.47445629121.803a0bc887a14d10d2c447fce8b6703c";
        let sig = sign(SECRET, "1531420618", body).unwrap();
        assert_eq!(
            sig,
            "v0=a2114d57b48eac39b9ad189dd8316235a7b4a8d21a10bd27519666489c69b503"
        );
        assert_eq!(verify(SECRET, &headers("1531420618", &sig), body, 1531420618, 300), Ok(()));
    }

    #[test]
    fn rejects_tampered_body() {
        let sig = sign(SECRET, "1000", b"text=help").unwrap();
        let err = verify(SECRET, &headers("1000", &sig), b"text=skip", 1000, 300).unwrap_err();
        assert_eq!(err, SignatureError::BadSignature);
    }

    #[test]
    fn rejects_stale_and_future_timestamps() {
        let sig = sign(SECRET, "1000", b"x").unwrap();
        assert_eq!(
            verify(SECRET, &headers("1000", &sig), b"x", 1301, 300),
            Err(SignatureError::StaleTimestamp)
        );
        assert_eq!(
            verify(SECRET, &headers("1000", &sig), b"x", 699, 300),
            Err(SignatureError::StaleTimestamp)
        );
        assert_eq!(verify(SECRET, &headers("1000", &sig), b"x", 1300, 300), Ok(()));
    }

    #[test]
    fn rejects_missing_headers_and_secret() {
        assert_eq!(
            verify(SECRET, &HeaderMap::new(), b"x", 0, 300),
            Err(SignatureError::MissingHeader(TIMESTAMP_HEADER))
        );
        let sig = sign(SECRET, "1000", b"x").unwrap();
        assert_eq!(
            verify("", &headers("1000", &sig), b"x", 1000, 300),
            Err(SignatureError::NotConfigured)
        );
        assert_eq!(
            verify(SECRET, &headers("soon", &sig), b"x", 1000, 300),
            Err(SignatureError::InvalidTimestamp)
        );
        assert_eq!(
            verify(SECRET, &headers("1000", "v1=abc"), b"x", 1000, 300),
            Err(SignatureError::BadSignature)
        );
    }
}
