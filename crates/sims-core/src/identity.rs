//! Identity extraction (C7). A `UserKey` is the registry's map key; it is
//! only ever minted from a validated `Header`.

use sims_protocol::{Header, SimsError};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserKey(String);

impl UserKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn new(user_id: &str) -> Result<Self, SimsError> {
        if user_id.is_empty() {
            return Err(SimsError::MissingUserId);
        }
        Ok(UserKey(user_id.to_owned()))
    }
}

impl std::fmt::Display for UserKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mirrors the original `uniqueIDFromHeader`: a missing header and an empty
/// `user_id` are distinct failures so callers can tell "forgot the header"
/// from "sent garbage".
pub fn key_from_header(header: Option<&Header>) -> Result<UserKey, SimsError> {
    let header = header.ok_or(SimsError::MissingHeader)?;
    UserKey::new(&header.user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_header_is_rejected() {
        assert!(matches!(key_from_header(None), Err(SimsError::MissingHeader)));
    }

    #[test]
    fn empty_user_id_is_rejected() {
        let header = Header {
            user_id: String::new(),
            request_id: None,
        };
        assert!(matches!(
            key_from_header(Some(&header)),
            Err(SimsError::MissingUserId)
        ));
    }

    #[test]
    fn valid_header_yields_key() {
        let header = Header {
            user_id: "alice".to_owned(),
            request_id: Some("req-1".to_owned()),
        };
        let key = key_from_header(Some(&header)).unwrap();
        assert_eq!(key.as_str(), "alice");
    }
}
