use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short text post. Immutable once created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: u32,
    pub body: String,
}

/// A user account as persisted in the document.
///
/// `password` holds the opaque hash bytes and is written as base64. It is
/// omitted from JSON when empty, which is how redacted accounts go out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: u32,
    pub email: String,
    #[serde(
        rename = "password",
        default,
        skip_serializing_if = "Vec::is_empty",
        with = "base64_bytes"
    )]
    pub password_hash: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token_id: Option<u32>,
}

impl Account {
    /// Copy of the record with the password hash cleared.
    pub fn redacted(&self) -> Self {
        Self {
            password_hash: Vec::new(),
            ..self.clone()
        }
    }

    /// The zero-value record returned for soft misses has id 0.
    pub fn is_zero(&self) -> bool {
        self.id == 0
    }
}

/// An entry in the refresh-token ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    pub id: u32,
    #[serde(rename = "userId")]
    pub account_id: u32,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub is_valid: bool,
}

impl RefreshToken {
    /// Expiry is derived from `expires_at`; a token without one never expires.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Valid and not yet expired.
    pub fn is_usable(&self) -> bool {
        self.is_valid && !self.is_expired()
    }
}

/// Root aggregate and the unit of persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "chirps", default)]
    pub posts: BTreeMap<u32, Post>,
    #[serde(rename = "users", default)]
    pub accounts: BTreeMap<u32, Account>,
    #[serde(default)]
    pub refresh_tokens: BTreeMap<u32, RefreshToken>,
}

impl Document {
    /// `None` once the id space of the collection is used up.
    pub fn next_post_id(&self) -> Option<u32> {
        next_id(&self.posts)
    }

    pub fn next_account_id(&self) -> Option<u32> {
        next_id(&self.accounts)
    }

    pub fn next_refresh_token_id(&self) -> Option<u32> {
        next_id(&self.refresh_tokens)
    }
}

// One past the highest id in use. Equal to count + 1 while ids are dense,
// and never hands out an id that is already taken.
fn next_id<T>(map: &BTreeMap<u32, T>) -> Option<u32> {
    map.keys().next_back().map_or(Some(1), |max| max.checked_add(1))
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as B64;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&B64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = Option::<String>::deserialize(deserializer)?;
        match encoded {
            Some(s) => B64.decode(s.as_bytes()).map_err(D::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn account_omits_empty_password() {
        let account = Account {
            id: 1,
            email: "a@x.com".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(&account).unwrap();
        assert_eq!(value, json!({ "id": 1, "email": "a@x.com" }));
    }

    #[test]
    fn account_password_is_base64() {
        let account = Account {
            id: 2,
            email: "b@x.com".into(),
            password_hash: b"hash".to_vec(),
            refresh_token_id: Some(3),
            ..Default::default()
        };
        let value = serde_json::to_value(&account).unwrap();
        assert_eq!(value["password"], "aGFzaA==");
        assert_eq!(value["refresh_token_id"], 3);

        let back: Account = serde_json::from_value(value).unwrap();
        assert_eq!(back, account);
    }

    #[test]
    fn redacted_keeps_everything_but_the_hash() {
        let account = Account {
            id: 4,
            email: "c@x.com".into(),
            password_hash: vec![1, 2, 3],
            refresh_token_id: Some(9),
            ..Default::default()
        };
        let redacted = account.redacted();
        assert!(redacted.password_hash.is_empty());
        assert_eq!(redacted.refresh_token_id, Some(9));
        assert_eq!(redacted.email, account.email);
    }

    #[test]
    fn refresh_token_expiry() {
        let now = Utc::now();
        let mut token = RefreshToken {
            id: 1,
            account_id: 1,
            token: "ab".into(),
            expires_at: None,
            is_valid: true,
        };
        assert!(!token.is_expired_at(now));

        token.expires_at = Some(now);
        assert!(token.is_expired_at(now));

        token.expires_at = Some(now + Duration::hours(1));
        assert!(!token.is_expired_at(now));
        assert!(token.is_usable());

        token.is_valid = false;
        assert!(!token.is_usable());
    }

    #[test]
    fn refresh_token_field_names() {
        let token = RefreshToken {
            id: 1,
            account_id: 7,
            token: "deadbeef".into(),
            expires_at: None,
            is_valid: true,
        };
        let value = serde_json::to_value(&token).unwrap();
        assert_eq!(
            value,
            json!({ "id": 1, "userId": 7, "token": "deadbeef", "is_valid": true })
        );
    }

    #[test]
    fn document_parses_string_keys() {
        let doc: Document = serde_json::from_value(json!({
            "chirps": { "1": { "id": 1, "body": "first" } },
            "users": {},
            "refresh_tokens": {}
        }))
        .unwrap();
        assert_eq!(doc.posts[&1].body, "first");
        assert_eq!(doc.next_post_id(), Some(2));
        assert_eq!(doc.next_account_id(), Some(1));
    }

    #[test]
    fn missing_collections_default_to_empty() {
        let doc: Document = serde_json::from_str("{}").unwrap();
        assert_eq!(doc, Document::default());
    }

    #[test]
    fn next_id_skips_past_gaps() {
        let mut doc = Document::default();
        doc.accounts.insert(5, Account { id: 5, ..Default::default() });
        assert_eq!(doc.next_account_id(), Some(6));
    }

    #[test]
    fn next_id_is_none_at_the_top_of_the_range() {
        let mut doc = Document::default();
        doc.posts.insert(u32::MAX, Post { id: u32::MAX, body: "last".into() });
        assert_eq!(doc.next_post_id(), None);
        assert_eq!(doc.next_refresh_token_id(), Some(1));
    }
}
