// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! ACL document model and streaming JSON parser (component C8).
//!
//! A document is a newline-or-whitespace-separated stream of independent
//! JSON objects, each describing one [`Acl`]. Parsing stops at the first
//! malformed object rather than skipping it, and never silently drops a
//! `scope` entry that fails to parse -- an empty or partially-read `scope`
//! array is always a hard error, never a silently-shrunk list. `scope`
//! itself is required: an object with no `scope` key is
//! [`AclError::MissingField`], not an implicit empty list.

use serde::{Deserialize, Serialize};
use serde_json::Deserializer;

use crate::status::AclError;

pub const ACL_MAX_PERMISSIONS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Permission {
    Read,
    Write,
    Delete,
    Range,
    Setup,
    P2pop,
    Getlog,
    Security,
}

impl Permission {
    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "READ" => Permission::Read,
            "WRITE" => Permission::Write,
            "DELETE" => Permission::Delete,
            "RANGE" => Permission::Range,
            "SETUP" => Permission::Setup,
            "P2POP" => Permission::P2pop,
            "GETLOG" => Permission::Getlog,
            "SECURITY" => Permission::Security,
            _ => return None,
        })
    }
}

/// One scoping rule within an [`Acl`]: a key-range restriction plus the
/// permissions it grants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub offset: Option<i64>,
    pub value: Option<Vec<u8>>,
    pub permissions: Vec<Permission>,
    pub tls_required: bool,
}

/// One identity's access-control record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acl {
    pub identity: Option<i64>,
    pub key: Option<Vec<u8>>,
    pub scopes: Vec<ScopeRaw>,
}

/// Intermediate JSON shape for a raw ACL record, matched against the
/// document's field names before being lifted into [`Acl`]/[`Scope`].
#[derive(Debug, Clone, Deserialize)]
struct AclRecord {
    identity: Option<i64>,
    key: Option<String>,
    #[serde(rename = "HMACAlgorithm")]
    hmac_algorithm: Option<String>,
    scope: Vec<ScopeRecord>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ScopeRaw {
    pub offset: Option<i64>,
    pub value: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default, rename = "TlsRequired")]
    pub tls_required: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct ScopeRecord {
    offset: Option<i64>,
    value: Option<String>,
    permission: Option<serde_json::Value>,
    #[serde(rename = "TlsRequired", default)]
    tls_required: bool,
}

/// Parses a full ACL document (a stream of top-level JSON objects) into an
/// ordered list of [`Acl`] records.
///
/// Mirrors the reference loader's loop: keep reading objects until the
/// stream is exhausted, and fail the whole document on the first object
/// that errors. A document that yields zero objects is [`AclError::BadJson`],
/// matching the "must read at least one ACL" rule. `scope` is a required
/// field; an object missing it is [`AclError::MissingField`], not a
/// silently-empty scope list.
pub fn parse_document(buf: &[u8]) -> Result<Vec<Acl>, AclError> {
    let text = std::str::from_utf8(buf).map_err(|_| AclError::BadJson)?;
    let mut stream = Deserializer::from_str(text).into_iter::<AclRecord>();

    let mut acls = Vec::new();
    for item in &mut stream {
        let record = item.map_err(map_record_error)?;
        acls.push(acl_of_record(record)?);
    }

    if acls.is_empty() {
        return Err(AclError::BadJson);
    }
    Ok(acls)
}

fn map_record_error(err: serde_json::Error) -> AclError {
    if err.to_string().contains("missing field") {
        AclError::MissingField
    } else {
        AclError::BadJson
    }
}

fn acl_of_record(record: AclRecord) -> Result<Acl, AclError> {
    if let Some(alg) = &record.hmac_algorithm {
        if alg != "HmacSHA1" {
            return Err(AclError::InvalidField);
        }
    }

    let key = record.key.map(String::into_bytes);

    let mut scopes = Vec::with_capacity(record.scope.len());
    for raw in record.scope {
        scopes.push(scope_of_record(raw)?);
    }

    Ok(Acl {
        identity: record.identity,
        key,
        scopes,
    })
}

/// Converts one `scope` array entry. Any entry that cannot be parsed --
/// including a `permission` field that is neither a string nor an array, or
/// one naming an unknown permission -- fails the whole document instead of
/// being dropped, so `n_scope` always equals the number of entries actually
/// read (unlike the reference implementation's post-loop `n_scope =
/// scope_count` assignment, which silently counts array length rather than
/// entries successfully parsed).
fn scope_of_record(record: ScopeRecord) -> Result<ScopeRaw, AclError> {
    let mut permissions = Vec::new();
    if let Some(val) = record.permission {
        match val {
            serde_json::Value::String(s) => {
                if Permission::from_str(&s).is_none() {
                    return Err(AclError::InvalidField);
                }
                permissions.push(s);
            },
            serde_json::Value::Array(items) => {
                if items.len() > ACL_MAX_PERMISSIONS {
                    return Err(AclError::InvalidField);
                }
                for item in items {
                    let s = item.as_str().ok_or(AclError::InvalidField)?;
                    if Permission::from_str(s).is_none() {
                        return Err(AclError::InvalidField);
                    }
                    permissions.push(s.to_string());
                }
            },
            _ => return Err(AclError::InvalidField),
        }
    }

    Ok(ScopeRaw {
        offset: record.offset,
        value: record.value,
        permissions,
        tls_required: record.tls_required,
    })
}

impl Acl {
    /// Decodes this record's scopes into the typed [`Scope`] form, resolving
    /// permission names and `value` byte strings.
    pub fn scopes(&self) -> Result<Vec<Scope>, AclError> {
        self.scopes
            .iter()
            .map(|raw| {
                let permissions = raw
                    .permissions
                    .iter()
                    .map(|s| Permission::from_str(s).ok_or(AclError::InvalidField))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Scope {
                    offset: raw.offset,
                    value: raw.value.clone().map(String::into_bytes),
                    permissions,
                    tls_required: raw.tls_required,
                })
            })
            .collect()
    }

    /// Parses a whole document already read into memory.
    pub fn parse_from_str(text: &str) -> Result<Vec<Acl>, AclError> {
        parse_document(text.as_bytes())
    }

    /// Reads `path` and parses it as an ACL document. An I/O error (file
    /// missing, unreadable, not valid UTF-8) maps to [`AclError::JsonFile`].
    pub async fn load_from_file<P: AsRef<std::path::Path>>(
        path: P,
    ) -> Result<Vec<Acl>, AclError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|_| AclError::JsonFile)?;
        Self::parse_from_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_acl_with_scalar_permission() {
        let doc = br#"{"identity":1,"key":"asdfasdf","HMACAlgorithm":"HmacSHA1","scope":[{"permission":"READ"}]}"#;
        let acls = parse_document(doc).expect("parse");
        assert_eq!(acls.len(), 1);
        assert_eq!(acls[0].identity, Some(1));
        let scopes = acls[0].scopes().expect("scopes");
        assert_eq!(scopes.len(), 1);
        assert_eq!(scopes[0].permissions, vec![Permission::Read]);
    }

    #[test]
    fn parses_multiple_objects_in_stream() {
        let doc = br#"{"identity":1,"scope":[{"permission":["READ","WRITE"]}]}
            {"identity":2,"scope":[{"permission":"DELETE"}]}"#;
        let acls = parse_document(doc).expect("parse");
        assert_eq!(acls.len(), 2);
        assert_eq!(acls[1].identity, Some(2));
    }

    #[test]
    fn rejects_unknown_permission_name() {
        let doc = br#"{"identity":1,"scope":[{"permission":"BOGUS"}]}"#;
        assert_eq!(parse_document(doc), Err(AclError::InvalidField));
    }

    #[test]
    fn rejects_wrong_hmac_algorithm() {
        let doc = br#"{"identity":1,"HMACAlgorithm":"HmacSHA256","scope":[]}"#;
        assert_eq!(parse_document(doc), Err(AclError::InvalidField));
    }

    #[test]
    fn rejects_empty_document() {
        assert_eq!(parse_document(b"   "), Err(AclError::BadJson));
    }

    #[test]
    fn rejects_record_missing_scope_key() {
        let doc = br#"{"identity":1}"#;
        assert_eq!(parse_document(doc), Err(AclError::MissingField));
    }

    #[test]
    fn scope_with_no_permission_field_is_allowed() {
        let doc = br#"{"identity":1,"scope":[{"offset":10,"value":"abc"}]}"#;
        let acls = parse_document(doc).expect("parse");
        let scopes = acls[0].scopes().expect("scopes");
        assert_eq!(scopes[0].offset, Some(10));
        assert!(scopes[0].permissions.is_empty());
    }

    #[tokio::test]
    async fn load_from_file_parses_a_written_document() {
        let path = std::env::temp_dir().join(format!("kinetic-acl-test-{}.json", std::process::id()));
        tokio::fs::write(&path, br#"{"identity":1,"scope":[{"permission":"READ"}]}"#)
            .await
            .expect("write fixture");
        let acls = Acl::load_from_file(&path).await.expect("load");
        assert_eq!(acls[0].identity, Some(1));
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn load_from_file_maps_missing_file_to_json_file_error() {
        let path = std::env::temp_dir().join("kinetic-acl-test-does-not-exist.json");
        assert_eq!(Acl::load_from_file(&path).await, Err(AclError::JsonFile));
    }
}
