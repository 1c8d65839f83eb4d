//! etcd v3 store over the JSON gateway
//!
//! Each host is one key, `<prefix><name>`, whose value is a JSON object of
//! scalar attributes. Keys and values travel base64 encoded, as the gateway
//! requires.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hostinv_core::{Attributes, HostRecord, attributes_from_json};
use reqwest::Client;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::error::{Result, StoreError};
use crate::traits::{HostStore, VersionedHost};

/// Store talking to an etcd cluster through its HTTP/JSON gateway
#[derive(Debug, Clone)]
pub struct EtcdStore {
    client: Client,
    base_url: Url,
    prefix: String,
    timeout: Duration,
}

impl EtcdStore {
    /// Create a store for `endpoint` (e.g. `http://localhost:2379`)
    ///
    /// No request is made until the first operation.
    ///
    /// # Errors
    /// Returns an error if the endpoint URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(
        endpoint: impl AsRef<str>,
        prefix: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = Url::parse(endpoint.as_ref())?;
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| StoreError::Unavailable {
                endpoint: base_url.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url,
            prefix: prefix.into(),
            timeout,
        })
    }

    /// Key prefix under which hosts are stored
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn key(&self, name: &str) -> String {
        format!("{}{name}", self.prefix)
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(StoreError::Endpoint)
    }

    /// POST a JSON body to a gateway endpoint and decode the reply
    async fn post<T: DeserializeOwned>(&self, path: &str, body: impl Serialize) -> Result<T> {
        let url = self.url(path)?;
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Gateway { status, message });
        }

        let bytes = response.bytes().await.map_err(|e| self.request_error(e))?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode {
            key: path.to_string(),
            message: e.to_string(),
        })
    }

    fn request_error(&self, e: reqwest::Error) -> StoreError {
        if e.is_timeout() {
            StoreError::Timeout {
                timeout: self.timeout,
            }
        } else {
            StoreError::Unavailable {
                endpoint: self.base_url.to_string(),
                message: e.to_string(),
            }
        }
    }

    /// Turn a stored key/value pair back into a host record
    fn decode(&self, kv: &KeyValue) -> Result<HostRecord> {
        let key = decode_text(&kv.key, "key")?;
        let name = key
            .strip_prefix(&self.prefix)
            .ok_or_else(|| StoreError::Decode {
                key: key.clone(),
                message: format!("key is outside prefix `{}`", self.prefix),
            })?
            .to_string();

        let decode_error = |message: String| StoreError::Decode {
            key: key.clone(),
            message,
        };
        let bytes = STANDARD
            .decode(&kv.value)
            .map_err(|e| decode_error(e.to_string()))?;
        let value: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|e| decode_error(e.to_string()))?;
        let attributes = attributes_from_json(value).map_err(|e| decode_error(e.to_string()))?;

        HostRecord::new(name, attributes).map_err(|e| decode_error(e.to_string()))
    }
}

#[async_trait]
impl HostStore for EtcdStore {
    fn store_type(&self) -> &'static str {
        "etcd"
    }

    async fn get(&self, name: &str) -> Result<HostRecord> {
        Ok(self.get_versioned(name).await?.record)
    }

    #[instrument(skip(self, attributes), fields(endpoint = %self.base_url))]
    async fn put(&self, name: &str, attributes: &Attributes) -> Result<()> {
        let request = encode_put(&self.key(name), attributes)?;
        let _: serde_json::Value = self.post("v3/kv/put", request).await?;
        debug!(fields = attributes.len(), "stored host");
        Ok(())
    }

    #[instrument(skip(self, attributes), fields(endpoint = %self.base_url))]
    async fn put_if_absent(&self, name: &str, attributes: &Attributes) -> Result<bool> {
        let key = self.key(name);
        let request = TxnRequest {
            compare: vec![Compare::created_at(&key, 0)],
            success: vec![RequestOp {
                request_put: encode_put(&key, attributes)?,
            }],
        };
        let response: TxnResponse = self.post("v3/kv/txn", request).await?;
        debug!(created = response.succeeded, "conditional put");
        Ok(response.succeeded)
    }

    #[instrument(skip(self), fields(endpoint = %self.base_url))]
    async fn get_versioned(&self, name: &str) -> Result<VersionedHost> {
        let request = RangeRequest {
            key: STANDARD.encode(self.key(name)),
            range_end: None,
        };
        let response: RangeResponse = self.post("v3/kv/range", request).await?;
        let kv = response
            .kvs
            .first()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        Ok(VersionedHost {
            record: self.decode(kv)?,
            revision: kv.mod_revision,
        })
    }

    #[instrument(skip(self, attributes), fields(endpoint = %self.base_url))]
    async fn put_if_unmodified(
        &self,
        name: &str,
        attributes: &Attributes,
        revision: i64,
    ) -> Result<bool> {
        let key = self.key(name);
        let request = TxnRequest {
            compare: vec![Compare::modified_at(&key, revision)],
            success: vec![RequestOp {
                request_put: encode_put(&key, attributes)?,
            }],
        };
        let response: TxnResponse = self.post("v3/kv/txn", request).await?;
        debug!(written = response.succeeded, "revision-checked put");
        Ok(response.succeeded)
    }

    #[instrument(skip(self), fields(endpoint = %self.base_url))]
    async fn delete(&self, name: &str) -> Result<()> {
        let request = RangeRequest {
            key: STANDARD.encode(self.key(name)),
            range_end: None,
        };
        let response: DeleteRangeResponse = self.post("v3/kv/deleterange", request).await?;
        if response.deleted == 0 {
            return Err(StoreError::NotFound(name.to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(endpoint = %self.base_url, prefix = %self.prefix))]
    async fn list(&self) -> Result<Vec<HostRecord>> {
        let request = RangeRequest {
            key: STANDARD.encode(&self.prefix),
            range_end: Some(STANDARD.encode(prefix_range_end(self.prefix.as_bytes()))),
        };
        let response: RangeResponse = self.post("v3/kv/range", request).await?;
        let records = response
            .kvs
            .iter()
            .map(|kv| self.decode(kv))
            .collect::<Result<Vec<_>>>()?;
        debug!(count = records.len(), "listed hosts");
        Ok(records)
    }
}

/// First key after every key starting with `prefix`
///
/// Trailing `0xff` bytes are dropped and the last remaining byte is
/// incremented. A prefix of only `0xff` bytes (or an empty one) ranges to
/// the end of the keyspace, spelled `\0`.
#[must_use]
pub fn prefix_range_end(prefix: &[u8]) -> Vec<u8> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < 0xff {
            end.push(last + 1);
            return end;
        }
    }
    vec![0]
}

fn encode_put(key: &str, attributes: &Attributes) -> Result<PutRequest> {
    let value = serde_json::to_vec(attributes).map_err(|e| StoreError::Decode {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    Ok(PutRequest {
        key: STANDARD.encode(key),
        value: STANDARD.encode(value),
    })
}

fn decode_text(encoded: &str, what: &str) -> Result<String> {
    let bytes = STANDARD.decode(encoded).map_err(|e| StoreError::Decode {
        key: encoded.to_string(),
        message: format!("{what}: {e}"),
    })?;
    String::from_utf8(bytes).map_err(|e| StoreError::Decode {
        key: encoded.to_string(),
        message: format!("{what}: {e}"),
    })
}

/// int64 fields arrive as JSON strings from the gateway
fn int64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Int64 {
        Number(i64),
        Text(String),
    }

    match Int64::deserialize(deserializer)? {
        Int64::Number(n) => Ok(n),
        Int64::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Serialize)]
struct RangeRequest {
    key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    range_end: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RangeResponse {
    #[serde(default)]
    kvs: Vec<KeyValue>,
}

#[derive(Debug, Deserialize)]
struct KeyValue {
    key: String,
    /// Omitted by the gateway when empty
    #[serde(default)]
    value: String,
    #[serde(default, deserialize_with = "int64")]
    mod_revision: i64,
}

#[derive(Debug, Serialize)]
struct PutRequest {
    key: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct DeleteRangeResponse {
    #[serde(default, deserialize_with = "int64")]
    deleted: i64,
}

#[derive(Debug, Serialize)]
struct TxnRequest {
    compare: Vec<Compare>,
    success: Vec<RequestOp>,
}

/// Txn guard on one key; revisions are int64, sent as strings
#[derive(Debug, Serialize)]
struct Compare {
    key: String,
    target: &'static str,
    result: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    create_revision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mod_revision: Option<String>,
}

impl Compare {
    fn created_at(key: &str, revision: i64) -> Self {
        Self {
            key: STANDARD.encode(key),
            target: "CREATE",
            result: "EQUAL",
            create_revision: Some(revision.to_string()),
            mod_revision: None,
        }
    }

    fn modified_at(key: &str, revision: i64) -> Self {
        Self {
            key: STANDARD.encode(key),
            target: "MOD",
            result: "EQUAL",
            create_revision: None,
            mod_revision: Some(revision.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct RequestOp {
    request_put: PutRequest,
}

#[derive(Debug, Deserialize)]
struct TxnResponse {
    /// Omitted by the gateway when false
    #[serde(default)]
    succeeded: bool,
}

#[cfg(test)]
mod tests {
    use hostinv_core::AttributeValue;
    use serde_json::json;

    use super::*;

    fn store() -> EtcdStore {
        EtcdStore::new("http://127.0.0.1:2379", "/hosts/", Duration::from_secs(1)).unwrap()
    }

    fn kv(key: &str, value: &str) -> KeyValue {
        KeyValue {
            key: STANDARD.encode(key),
            value: STANDARD.encode(value),
            mod_revision: 1,
        }
    }

    #[test]
    fn test_prefix_range_end() {
        assert_eq!(prefix_range_end(b"/hosts/"), b"/hosts0".to_vec());
        assert_eq!(prefix_range_end(b"a\xff"), b"b".to_vec());
        assert_eq!(prefix_range_end(b"\xff\xff"), vec![0]);
        assert_eq!(prefix_range_end(b""), vec![0]);
    }

    #[test]
    fn test_decode_entry() {
        let record = store()
            .decode(&kv("/hosts/web01", r#"{"cores": 8, "site": "AMS"}"#))
            .unwrap();
        assert_eq!(record.name, "web01");
        assert_eq!(record.get("cores"), Some(&AttributeValue::Integer(8)));
        assert_eq!(record.get("site"), Some(&AttributeValue::from("AMS")));
    }

    #[test]
    fn test_decode_rejects_nested_values() {
        let err = store()
            .decode(&kv("/hosts/web01", r#"{"disks": {"sda": 100}}"#))
            .unwrap_err();
        assert!(
            matches!(&err, StoreError::Decode { key, .. } if key == "/hosts/web01"),
            "{err:?}"
        );
    }

    #[test]
    fn test_decode_rejects_foreign_keys() {
        assert!(matches!(
            store().decode(&kv("/other/web01", "{}")),
            Err(StoreError::Decode { .. })
        ));
    }

    #[test]
    fn test_txn_request_shape() {
        let mut attributes = Attributes::new();
        attributes.insert("cores".to_string(), AttributeValue::Integer(8));
        let request = TxnRequest {
            compare: vec![Compare::created_at("/hosts/web01", 0)],
            success: vec![RequestOp {
                request_put: encode_put("/hosts/web01", &attributes).unwrap(),
            }],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "compare": [{
                    "key": STANDARD.encode("/hosts/web01"),
                    "target": "CREATE",
                    "result": "EQUAL",
                    "create_revision": "0"
                }],
                "success": [{
                    "request_put": {
                        "key": STANDARD.encode("/hosts/web01"),
                        "value": STANDARD.encode(r#"{"cores":8}"#)
                    }
                }]
            })
        );
    }

    #[test]
    fn test_mod_revision_compare_shape() {
        let value = serde_json::to_value(Compare::modified_at("/hosts/web01", 42)).unwrap();
        assert_eq!(
            value,
            json!({
                "key": STANDARD.encode("/hosts/web01"),
                "target": "MOD",
                "result": "EQUAL",
                "mod_revision": "42"
            })
        );
    }

    #[test]
    fn test_int64_as_string_or_number() {
        let text: DeleteRangeResponse = serde_json::from_str(r#"{"deleted": "1"}"#).unwrap();
        let number: DeleteRangeResponse = serde_json::from_str(r#"{"deleted": 2}"#).unwrap();
        let missing: DeleteRangeResponse = serde_json::from_str(r#"{"header": {}}"#).unwrap();
        assert_eq!((text.deleted, number.deleted, missing.deleted), (1, 2, 0));
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(matches!(
            EtcdStore::new("not a url", "/hosts/", Duration::from_secs(1)),
            Err(StoreError::Endpoint(_))
        ));
    }
}
