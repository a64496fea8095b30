//! Pure Buildkite GraphQL API client.
//!
//! A minimal client for the Buildkite GraphQL API. Supports executing
//! queries with bound variables and fetching every member of an
//! organization through cursor pagination.
//!
//! # Example
//!
//! ```rust,ignore
//! use buildkite_client::BuildkiteClient;
//!
//! let client = BuildkiteClient::new("your-api-token".into());
//!
//! let members = client.org_members("my-org").await?;
//! for member in &members {
//!     println!("{} <{}>", member.name, member.email);
//! }
//! ```

pub mod error;
pub mod types;

pub use error::{BuildkiteError, Result};
pub use types::{Authorization, OrgMember};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use types::OrgMembersData;

const GRAPHQL_ENDPOINT: &str = "https://graphql.buildkite.com/v1";

const ORG_MEMBERS_QUERY: &str = r#"
query ($orgSlug: ID!, $after: String) {
  organization(slug: $orgSlug) {
    members(first: 100, after: $after) {
      pageInfo {
        hasNextPage
        endCursor
      }
      edges {
        node {
          createdAt
          role
          complimentary
          user {
            id
            email
            name
            bot
          }
          sso {
            authorizations(first: 1) {
              edges {
                node {
                  id
                  identity {
                    name
                    email
                  }
                  createdAt
                  expiredAt
                  revokedAt
                  userSessionDestroyedAt
                  state
                }
              }
            }
          }
        }
      }
    }
  }
}"#;

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a, V: Serialize> {
    query: &'a str,
    variables: V,
}

#[derive(Debug, Deserialize, Default)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

pub struct BuildkiteClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl BuildkiteClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: GRAPHQL_ENDPOINT.to_string(),
            token,
        }
    }

    /// Override the GraphQL endpoint. Intended for tests.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Execute a GraphQL query with bound variables and decode the
    /// `data` payload of the response.
    ///
    /// A non-empty `errors` envelope in the body wins over the HTTP
    /// status; both win over any decoding of `data`. The full request
    /// and response are emitted at debug level.
    pub async fn graphql<V, T>(&self, query: &'static str, variables: V) -> Result<T>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        let request = GraphqlRequest {
            query: query.trim(),
            variables,
        };

        if tracing::enabled!(tracing::Level::DEBUG) {
            if let Ok(body) = serde_json::to_string_pretty(&request) {
                tracing::debug!(endpoint = %self.endpoint, body = %body, "graphql request");
            }
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        tracing::debug!(
            endpoint = %self.endpoint,
            %status,
            ?headers,
            body = %body,
            "graphql response"
        );

        // The API reports errors in-band; the envelope may be absent or
        // the body may not even be JSON.
        let envelope: ErrorEnvelope = serde_json::from_str(&body).unwrap_or_default();
        if !envelope.errors.is_empty() {
            return Err(BuildkiteError::Api {
                messages: envelope.errors.into_iter().map(|e| e.message).collect(),
            });
        }

        if !status.is_success() {
            return Err(BuildkiteError::HttpStatus { status });
        }

        let data: DataEnvelope<T> = serde_json::from_str(&body)?;
        Ok(data.data)
    }

    /// Fetch every member of an organization along with their most
    /// recent SSO authorization, following cursor pagination until the
    /// API reports no further pages.
    ///
    /// A failure on any page aborts the whole fetch.
    pub async fn org_members(&self, org_slug: &str) -> Result<Vec<OrgMember>> {
        let mut result = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let (members, next) = self.org_members_page(org_slug, after.as_deref()).await?;
            result.extend(members);

            match next {
                Some(cursor) => after = Some(cursor),
                None => break,
            }
        }

        tracing::debug!(org = org_slug, count = result.len(), "fetched org members");

        Ok(result)
    }

    async fn org_members_page(
        &self,
        org_slug: &str,
        after: Option<&str>,
    ) -> Result<(Vec<OrgMember>, Option<String>)> {
        let data: OrgMembersData = self
            .graphql(
                ORG_MEMBERS_QUERY,
                json!({ "orgSlug": org_slug, "after": after }),
            )
            .await?;

        let connection = data.organization.members;

        let members = connection
            .edges
            .into_iter()
            .map(|edge| edge.node.into_org_member())
            .collect();

        let page_info = connection.page_info;
        let next = match page_info.end_cursor {
            Some(cursor) if page_info.has_next_page && !cursor.is_empty() => Some(cursor),
            _ => None,
        };

        Ok((members, next))
    }
}
