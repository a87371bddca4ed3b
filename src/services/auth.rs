// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 The Arachne Project

//! Credential handling for the data service.
//!
//! The service authenticates with HTTP Basic credentials whose password
//! part is an MD5 digest of the clear-text password. The encoded token is
//! computed once at login and attached to every subsequent request.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// A signed-in catalog user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
}

/// Basic-auth credentials in the form the data service expects.
///
/// The token is `base64(username + ":" + md5hex(password))`; the clear-text
/// password is never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    token: String,
}

impl Credentials {
    /// Encode credentials from a username and clear-text password.
    pub fn new(username: &str, password: &str) -> Self {
        let digest = md5::compute(password.as_bytes());
        let token = STANDARD.encode(format!("{username}:{digest:x}"));
        Self {
            username: username.to_string(),
            token,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Value for the `Authorization` request header.
    pub fn authorization_header(&self) -> String {
        format!("Basic {}", self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_matches_known_encoding() {
        // base64("scholar:" + md5hex("secret"))
        let credentials = Credentials::new("scholar", "secret");
        assert_eq!(
            credentials.authorization_header(),
            "Basic c2Nob2xhcjo1ZWJlMjI5NGVjZDBlMGYwOGVhYjc2OTBkMmE2ZWU2OQ=="
        );
    }

    #[test]
    fn test_token_carries_hashed_password_only() {
        let credentials = Credentials::new("scholar", "secret");
        let token = credentials
            .authorization_header()
            .strip_prefix("Basic ")
            .map(str::to_string)
            .unwrap();
        let decoded = String::from_utf8(STANDARD.decode(token).unwrap()).unwrap();
        let (username, digest) = decoded.split_once(':').unwrap();
        assert_eq!(username, "scholar");
        assert_eq!(digest.len(), 32); // MD5 = 32 hex chars
        assert!(!decoded.contains("secret"));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        assert_eq!(
            Credentials::new("scholar", "secret"),
            Credentials::new("scholar", "secret")
        );
        assert_ne!(
            Credentials::new("scholar", "secret"),
            Credentials::new("scholar", "other")
        );
    }
}
