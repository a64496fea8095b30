//! Flat cross-org account records.

use buildkite_client::OrgMember;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while normalizing raw org members.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Effective email has no `@`
    #[error("{0} is an invalid email address")]
    InvalidEmail(String),
}

/// A normalized account record, one per org membership.
///
/// The email prefers the SSO authorization identity over the stored
/// account email, since SSO reflects what the user actually signs in
/// with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub email: String,
    pub domain: String,
    pub name: String,
    pub org: String,
    pub role: String,
    pub last_auth: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub complimentary: bool,
}

impl Member {
    /// Normalize a raw org member into a flat record.
    pub fn from_org_member(raw: &OrgMember, org_slug: &str) -> Result<Self, NormalizeError> {
        let (email, last_auth) = match &raw.authorization {
            Some(auth) => (auth.email.clone(), Some(auth.created_at)),
            None => (raw.email.clone(), None),
        };

        let domain = email_domain(&email)?.to_string();

        Ok(Member {
            id: raw.id.clone(),
            email,
            domain,
            name: raw.name.clone(),
            org: org_slug.to_string(),
            role: raw.role.to_lowercase(),
            last_auth,
            complimentary: raw.complimentary,
        })
    }
}

/// The part of an email address after the last `@`.
pub fn email_domain(email: &str) -> Result<&str, NormalizeError> {
    match email.rfind('@') {
        Some(at) => Ok(&email[at + 1..]),
        None => Err(NormalizeError::InvalidEmail(email.to_string())),
    }
}

/// A representative member together with the other records that collide
/// with it by email or by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberWithDuplicates {
    #[serde(flatten)]
    pub member: Member,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name_duplicates: Vec<Member>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub email_duplicates: Vec<Member>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildkite_client::Authorization;
    use chrono::TimeZone;

    fn raw_member() -> OrgMember {
        OrgMember {
            id: "member-1".into(),
            name: "Llama".into(),
            email: "llama@example.com".into(),
            role: "MEMBER".into(),
            bot: false,
            complimentary: false,
            created_at: Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap(),
            authorization: None,
        }
    }

    fn authorization() -> Authorization {
        Authorization {
            id: "auth-1".into(),
            email: "llama@corp.example.com".into(),
            name: "Llama".into(),
            created_at: Utc.with_ymd_and_hms(2023, 6, 15, 9, 30, 0).unwrap(),
            expired_at: None,
            revoked_at: None,
            user_session_destroyed_at: None,
        }
    }

    #[test]
    fn test_account_email_when_no_authorization() {
        let member = Member::from_org_member(&raw_member(), "my-org").unwrap();

        assert_eq!(member.email, "llama@example.com");
        assert_eq!(member.domain, "example.com");
        assert_eq!(member.org, "my-org");
        assert_eq!(member.last_auth, None);
    }

    #[test]
    fn test_authorization_overrides_email_and_last_auth() {
        let mut raw = raw_member();
        raw.authorization = Some(authorization());

        let member = Member::from_org_member(&raw, "my-org").unwrap();

        assert_eq!(member.email, "llama@corp.example.com");
        assert_eq!(member.domain, "corp.example.com");
        assert_eq!(
            member.last_auth,
            Some(Utc.with_ymd_and_hms(2023, 6, 15, 9, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_role_is_lowercased() {
        let member = Member::from_org_member(&raw_member(), "my-org").unwrap();

        assert_eq!(member.role, "member");
    }

    #[test]
    fn test_domain_uses_last_at() {
        assert_eq!(email_domain("\"odd@name\"@example.com").unwrap(), "example.com");
    }

    #[test]
    fn test_email_without_at_fails() {
        let err = email_domain("not-an-email").unwrap_err();

        assert!(matches!(err, NormalizeError::InvalidEmail(_)));
        assert_eq!(err.to_string(), "not-an-email is an invalid email address");
    }

    #[test]
    fn test_invalid_authorization_email_fails() {
        let mut raw = raw_member();
        let mut auth = authorization();
        auth.email = "broken".into();
        raw.authorization = Some(auth);

        assert!(Member::from_org_member(&raw, "my-org").is_err());
    }

    #[test]
    fn test_json_field_names() {
        let member = Member::from_org_member(&raw_member(), "my-org").unwrap();
        let value = serde_json::to_value(&member).unwrap();

        let object = value.as_object().unwrap();
        assert_eq!(object["id"], "member-1");
        assert_eq!(object["email"], "llama@example.com");
        assert_eq!(object["domain"], "example.com");
        assert_eq!(object["name"], "Llama");
        assert_eq!(object["org"], "my-org");
        assert_eq!(object["role"], "member");
        assert!(object["last_auth"].is_null());
        // omitted while false
        assert!(!object.contains_key("complimentary"));
    }

    #[test]
    fn test_json_omits_empty_duplicate_lists() {
        let member = Member::from_org_member(&raw_member(), "my-org").unwrap();
        let entry = MemberWithDuplicates {
            member,
            name_duplicates: Vec::new(),
            email_duplicates: Vec::new(),
        };

        let value = serde_json::to_value(&entry).unwrap();
        let object = value.as_object().unwrap();

        assert!(object.contains_key("email"));
        assert!(!object.contains_key("name_duplicates"));
        assert!(!object.contains_key("email_duplicates"));
    }
}
