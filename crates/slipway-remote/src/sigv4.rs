//! AWS Signature Version 4 request signing.

use crate::config::AwsCredentials;
use crate::RemoteError;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::fmt::Write;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub const LAMBDA_SERVICE: &str = "lambda";

/// The parts of an HTTP request covered by the signature.
pub struct SignableRequest<'a> {
    pub method: &'a str,
    pub path: &'a str,
    /// Already in canonical form, see [`canonical_query`].
    pub query: &'a str,
    pub host: &'a str,
    pub payload: &'a [u8],
}

pub struct SigningScope<'a> {
    pub region: &'a str,
    pub service: &'a str,
    pub time: DateTime<Utc>,
}

/// Percent-encode per the SigV4 rules: only unreserved characters pass.
pub fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for b in input.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(b));
            }
            b'/' if !encode_slash => out.push('/'),
            _ => {
                let _ = write!(out, "%{b:02X}");
            }
        }
    }
    out
}

/// Encode and sort query parameters. The result is used both in the request
/// URL and in the canonical request, so the two always agree.
pub fn canonical_query(params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (uri_encode(k, true), uri_encode(v, true)))
        .collect();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, RemoteError> {
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| RemoteError::Credentials(format!("HMAC key error: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Compute the headers that authenticate `request`.
///
/// Returns `x-amz-date`, the optional `x-amz-security-token` and
/// `authorization`. `host` is signed but left for the HTTP client to send.
pub fn sign(
    request: &SignableRequest<'_>,
    credentials: &AwsCredentials,
    scope: &SigningScope<'_>,
) -> Result<Vec<(&'static str, String)>, RemoteError> {
    let date_stamp = scope.time.format("%Y%m%d").to_string();
    let amz_date = scope.time.format("%Y%m%dT%H%M%SZ").to_string();

    let mut canonical_headers = format!("host:{}\nx-amz-date:{amz_date}\n", request.host);
    let mut signed_headers = "host;x-amz-date".to_owned();
    if let Some(token) = &credentials.session_token {
        let _ = writeln!(canonical_headers, "x-amz-security-token:{}", token.trim());
        signed_headers.push_str(";x-amz-security-token");
    }

    let payload_hash = hex::encode(Sha256::digest(request.payload));
    let canonical_request = format!(
        "{}\n{}\n{}\n{canonical_headers}\n{signed_headers}\n{payload_hash}",
        request.method,
        uri_encode(request.path, false),
        request.query,
    );

    let credential_scope = format!(
        "{date_stamp}/{}/{}/aws4_request",
        scope.region, scope.service
    );
    let string_to_sign = format!(
        "{ALGORITHM}\n{amz_date}\n{credential_scope}\n{}",
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );

    let k_date = hmac_sha256(
        format!("AWS4{}", credentials.secret_access_key).as_bytes(),
        date_stamp.as_bytes(),
    )?;
    let k_region = hmac_sha256(&k_date, scope.region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, scope.service.as_bytes())?;
    let k_signing = hmac_sha256(&k_service, b"aws4_request")?;
    let signature = hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes())?);

    let authorization = format!(
        "{ALGORITHM} Credential={}/{credential_scope}, SignedHeaders={signed_headers}, Signature={signature}",
        credentials.access_key_id
    );

    let mut headers = vec![("x-amz-date", amz_date)];
    if let Some(token) = &credentials.session_token {
        headers.push(("x-amz-security-token", token.clone()));
    }
    headers.push(("authorization", authorization));
    Ok(headers)
}
