use std::sync::Arc;

use forge_core::httpdate::{format_amz_date, format_date_stamp};
use forge_core::{Clock, Error};
use forge_http::HttpRequestParts;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use sha2::{Digest, Sha256};
use url::Url;

use super::set_authorization;
use crate::identity::Identity;
use crate::properties::SignerProperties;
use crate::signer::Signer;

type HmacSha256 = Hmac<Sha256>;

/// RFC 3986 unreserved set (`A-Z a-z 0-9 - _ . ~`), the only bytes SigV4
/// canonicalization leaves unencoded.
const SIGV4_UNRESERVED: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'!')
    .add(b'"')
    .add(b'#')
    .add(b'$')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'(')
    .add(b')')
    .add(b'*')
    .add(b'+')
    .add(b',')
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Signs requests with AWS Signature Version 4 (§4.3 "SigV4 signer").
///
/// `service` is fixed per client; `region` is read per-call from the
/// [`SignerProperties`] (the scheme projects it out of the call's
/// `Context`), since a single client may reasonably target more than one
/// region across calls.
pub struct SigV4Signer {
    service: String,
    clock: Arc<dyn Clock>,
}

impl SigV4Signer {
    pub fn new(service: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            service: service.into(),
            clock,
        }
    }
}

impl Signer for SigV4Signer {
    fn sign(&self, request: &mut HttpRequestParts, identity: &Identity, properties: &SignerProperties) -> Result<(), Error> {
        let Identity::AwsCredentials {
            access_key_id,
            secret_access_key,
            session_token,
        } = identity
        else {
            return Err(Error::serialization("sigv4 signer requires an aws-credentials identity"));
        };
        let region = properties
            .get_str("region")
            .ok_or_else(|| Error::serialization("sigv4 signer requires a `region` signer property"))?;

        let url = Url::parse(&request.uri).map_err(|e| Error::serialization(format!("invalid request uri: {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::serialization("request uri has no host"))?
            .to_string();

        let now_millis = self.clock.now_millis();
        let amz_date = format_amz_date(now_millis);
        let date_stamp = format_date_stamp(now_millis);

        upsert_header(&mut request.headers, "host", &host);
        upsert_header(&mut request.headers, "x-amz-date", &amz_date);
        if let Some(token) = session_token {
            upsert_header(&mut request.headers, "x-amz-security-token", token);
        }

        let canonical_uri = if url.path().is_empty() { "/" } else { url.path() };
        let canonical_query = canonical_query_string(url.query().unwrap_or(""));

        let mut signed_entries: Vec<(String, String)> = request
            .headers
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.trim().to_string()))
            .collect();
        signed_entries.sort();
        let canonical_headers: String = signed_entries.iter().map(|(k, v)| format!("{k}:{v}\n")).collect();
        let signed_headers = signed_entries.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>().join(";");

        let unsigned_payload = request.body.is_empty() && properties.get_str("streaming").is_some();
        let payload_hash = if unsigned_payload {
            "UNSIGNED-PAYLOAD".to_string()
        } else {
            hex::encode(Sha256::digest(&request.body))
        };

        let canonical_request =
            format!("{}\n{canonical_uri}\n{canonical_query}\n{canonical_headers}\n{signed_headers}\n{payload_hash}", request.method);

        let credential_scope = format!("{date_stamp}/{region}/{}/aws4_request", self.service);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{amz_date}\n{credential_scope}\n{}",
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let k_date = hmac_sha256(format!("AWS4{secret_access_key}").as_bytes(), date_stamp.as_bytes());
        let k_region = hmac_sha256(&k_date, region.as_bytes());
        let k_service = hmac_sha256(&k_region, self.service.as_bytes());
        let k_signing = hmac_sha256(&k_service, b"aws4_request");
        let signature = hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes()));

        let authorization =
            format!("AWS4-HMAC-SHA256 Credential={access_key_id}/{credential_scope}, SignedHeaders={signed_headers}, Signature={signature}");
        set_authorization(request, authorization);
        Ok(())
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("hmac accepts a key of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn upsert_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    headers.push((name.to_string(), value.to_string()));
}

/// Re-encode and sort the query string's pairs, per §4.3 step 1
/// ("sorted query"). Sorting by the already-percent-decoded key/value is
/// what makes property #8 (order-independent signatures) hold.
fn canonical_query_string(query: &str) -> String {
    if query.is_empty() {
        return String::new();
    }
    let mut pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn encode(s: &str) -> String {
    utf8_percent_encode(s, SIGV4_UNRESERVED).to_string()
}
