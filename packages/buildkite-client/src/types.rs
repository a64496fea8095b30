use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single sign-on authorization tied to a user.
///
/// Carries its own identity email and name, which may differ from the
/// account's stored email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Authorization {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub expired_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub user_session_destroyed_at: Option<DateTime<Utc>>,
}

/// An organization-scoped account, with its most recent SSO
/// authorization when one exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgMember {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub bot: bool,
    pub complimentary: bool,
    pub created_at: DateTime<Utc>,
    pub authorization: Option<Authorization>,
}

// Wire shape of the members query response. Kept private to the crate;
// nodes map into `OrgMember` as soon as a page is decoded.

#[derive(Debug, Deserialize)]
pub(crate) struct OrgMembersData {
    pub organization: OrganizationNode,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrganizationNode {
    pub members: MemberConnection,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MemberConnection {
    #[serde(rename = "pageInfo")]
    pub page_info: PageInfo,
    #[serde(default)]
    pub edges: Vec<MemberEdge>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageInfo {
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,
    #[serde(rename = "endCursor")]
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MemberEdge {
    pub node: MemberNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MemberNode {
    pub created_at: DateTime<Utc>,
    pub role: String,
    #[serde(default)]
    pub complimentary: bool,
    pub user: UserNode,
    pub sso: Option<SsoNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserNode {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub bot: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SsoNode {
    pub authorizations: Option<AuthorizationConnection>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthorizationConnection {
    #[serde(default)]
    pub edges: Vec<AuthorizationEdge>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthorizationEdge {
    pub node: AuthorizationNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthorizationNode {
    pub id: String,
    pub identity: IdentityNode,
    pub created_at: DateTime<Utc>,
    pub expired_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub user_session_destroyed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IdentityNode {
    pub name: String,
    pub email: String,
}

impl MemberNode {
    /// Flatten a member edge node, keeping the single most recent SSO
    /// authorization when the API returned one.
    pub(crate) fn into_org_member(self) -> OrgMember {
        let authorization = self
            .sso
            .and_then(|sso| sso.authorizations)
            .map(|conn| conn.edges)
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|edge| Authorization {
                id: edge.node.id,
                email: edge.node.identity.email,
                name: edge.node.identity.name,
                created_at: edge.node.created_at,
                expired_at: edge.node.expired_at,
                revoked_at: edge.node.revoked_at,
                user_session_destroyed_at: edge.node.user_session_destroyed_at,
            });

        OrgMember {
            id: self.user.id,
            name: self.user.name,
            email: self.user.email,
            role: self.role,
            bot: self.user.bot,
            complimentary: self.complimentary,
            created_at: self.created_at,
            authorization,
        }
    }
}
