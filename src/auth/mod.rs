use serde::{Deserialize, Serialize};

/// Bearer-token claims. Tokens are issued elsewhere; this service only
/// verifies them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the authenticated user's id.
    pub sub: String,
    /// Group memberships; "admin" unlocks the administrative endpoints.
    #[serde(default)]
    pub groups: Vec<String>,
    /// Expiry, seconds since the epoch.
    pub exp: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.groups.iter().any(|g| g == "admin")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_group_detection() {
        let claims = Claims {
            sub: "u-1".to_string(),
            groups: vec!["editors".to_string(), "admin".to_string()],
            exp: 0,
        };
        assert!(claims.is_admin());

        let claims = Claims { sub: "u-2".to_string(), groups: vec![], exp: 0 };
        assert!(!claims.is_admin());
    }
}
