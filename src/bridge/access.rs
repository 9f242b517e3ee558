// SPDX-License-Identifier: GPL-3.0-only
use axum::http::HeaderValue;
use uuid::Uuid;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum AccessDenied {
    #[error("missing bridge token")]
    MissingToken,

    #[error("bridge token does not match")]
    BadToken,

    #[error("origin {0} may not use the bridge")]
    ForeignOrigin(String),
}

/// Who may open the bridge.
///
/// Every upgrade must present the per-launch token. Browsers also send an
/// `Origin`; it has to be one of `allowed_origins`. Clients that send no
/// `Origin` (native surfaces) are judged by the token alone.
#[derive(Debug, Clone)]
pub struct BridgeAccess {
    token: String,
    allowed_origins: Vec<String>,
}

impl BridgeAccess {
    pub fn new(token: impl Into<String>, allowed_origins: Vec<String>) -> Self {
        Self {
            token: token.into(),
            allowed_origins,
        }
    }

    /// Fresh random token for this launch
    pub fn generate(allowed_origins: Vec<String>) -> Self {
        Self::new(Uuid::new_v4().simple().to_string(), allowed_origins)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn check(&self, token: Option<&str>, origin: Option<&HeaderValue>) -> Result<(), AccessDenied> {
        if let Some(origin) = origin {
            let origin = origin.to_str().unwrap_or_default();
            if !self.allowed_origins.iter().any(|allowed| allowed == origin) {
                return Err(AccessDenied::ForeignOrigin(origin.to_string()));
            }
        }

        let token = token.ok_or(AccessDenied::MissingToken)?;
        if !constant_time_eq(token.as_bytes(), self.token.as_bytes()) {
            return Err(AccessDenied::BadToken);
        }

        Ok(())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
