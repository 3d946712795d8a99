use std::{borrow::Borrow, collections::HashSet, hash::Hash, str::FromStr, time::SystemTime};

use serde::{Deserialize, Serialize};

const KNOWN_ROLES: &[&str] = &[Role::ADMIN];

#[derive(Debug, Hash, PartialEq, Eq, Serialize, Deserialize, Clone)]
pub struct Role(String);

impl Role {
    pub const ADMIN: &'static str = "admin";

    pub fn admin() -> Self {
        Role(Self::ADMIN.to_string())
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Borrow<str> for Role {
    fn borrow(&self) -> &str {
        self.as_ref()
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if KNOWN_ROLES.contains(&s) {
            Ok(Role(s.to_string()))
        } else {
            Err(format!("Unknown role: {s}"))
        }
    }
}

pub trait TimeLimited {
    fn set_validity(&mut self, until: SystemTime);
    fn check_validity(&self) -> bool;
}

pub trait Authorization {
    fn has_role<Q>(&self, role: &Q) -> bool
    where
        Role: Borrow<Q>,
        Q: Hash + Eq + ?Sized;

    fn has_any_role<'a, Q, I>(&self, roles: I) -> bool
    where
        Role: Borrow<Q>,
        Q: Hash + Eq + ?Sized + 'a,
        I: IntoIterator<Item = &'a Q>,
    {
        roles.into_iter().any(|role| self.has_role(role))
    }
}

/// Claim carried in API tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiClaim {
    pub sub: String,
    pub exp: u64,
    pub roles: HashSet<Role>,
}

impl ApiClaim {
    /// Creates claim with zero expiry, validity is set when token is issued
    pub fn new_expired<'a>(sub: impl Into<String>, roles: impl IntoIterator<Item = &'a str>) -> Self {
        ApiClaim {
            sub: sub.into(),
            exp: 0,
            roles: roles.into_iter().map(Role::from).collect(),
        }
    }
}

impl Authorization for ApiClaim {
    fn has_role<Q>(&self, role: &Q) -> bool
    where
        Role: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.roles.contains(role)
    }
}

fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl TimeLimited for ApiClaim {
    fn set_validity(&mut self, until: SystemTime) {
        self.exp = unix_secs(until);
    }

    fn check_validity(&self) -> bool {
        self.exp > unix_secs(SystemTime::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role() {
        let role = Role::admin();
        assert_eq!(role.as_ref(), "admin");
        let claim = ApiClaim::new_expired("123", ["admin", "guest"]);
        assert!(claim.has_role(&role));
        assert!(claim.has_role("admin"));
        assert!(!claim.has_role("user"));
        assert!(claim.has_any_role(["admin", "user"]));
        assert!(!claim.check_validity());
    }

    #[test]
    fn test_parse_role() {
        assert!("admin".parse::<Role>().is_ok());
        assert!("superuser".parse::<Role>().is_err());
    }
}
