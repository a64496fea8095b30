//! Where raw org members come from: the live API, optionally fronted by
//! a per-org disk cache.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use buildkite_client::{BuildkiteClient, OrgMember};

/// Something that can produce the raw member list for an org slug.
#[async_trait]
pub trait MemberSource: Send + Sync {
    async fn org_members(&self, org_slug: &str) -> anyhow::Result<Vec<OrgMember>>;
}

/// Fetches members straight from the GraphQL API.
pub struct ApiSource {
    client: BuildkiteClient,
}

impl ApiSource {
    pub fn new(client: BuildkiteClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MemberSource for ApiSource {
    async fn org_members(&self, org_slug: &str) -> anyhow::Result<Vec<OrgMember>> {
        let members = self.client.org_members(org_slug).await?;
        Ok(members)
    }
}

/// Read-through disk cache over another source, one JSON file per org.
///
/// A present cache file is served as-is; a miss delegates to the inner
/// source and writes the raw fetched array back. File I/O is synchronous
/// and the cache directory is never used concurrently.
pub struct DiskCacheSource<S> {
    inner: S,
    dir: PathBuf,
}

impl<S> DiskCacheSource<S> {
    pub fn new(inner: S, dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            dir: dir.into(),
        }
    }

    fn cache_file(&self, org_slug: &str) -> PathBuf {
        self.dir.join(format!("{org_slug}.json"))
    }
}

#[async_trait]
impl<S: MemberSource> MemberSource for DiskCacheSource<S> {
    async fn org_members(&self, org_slug: &str) -> anyhow::Result<Vec<OrgMember>> {
        let path = self.cache_file(org_slug);

        if path.exists() {
            tracing::debug!(org = org_slug, path = %path.display(), "serving members from cache");

            let body = fs::read_to_string(&path)
                .with_context(|| format!("failed to read cache file {}", path.display()))?;
            let members = serde_json::from_str(&body)
                .with_context(|| format!("failed to decode cache file {}", path.display()))?;

            return Ok(members);
        }

        let members = self.inner.org_members(org_slug).await?;

        let body =
            serde_json::to_string(&members).context("failed to encode members for the cache")?;
        fs::write(&path, body)
            .with_context(|| format!("failed to write cache file {}", path.display()))?;

        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct StubSource {
        members: Vec<OrgMember>,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn new(members: Vec<OrgMember>) -> Self {
            Self {
                members,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MemberSource for StubSource {
        async fn org_members(&self, _org_slug: &str) -> anyhow::Result<Vec<OrgMember>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.members.clone())
        }
    }

    fn org_member(id: &str) -> OrgMember {
        OrgMember {
            id: id.into(),
            name: "Llama".into(),
            email: "llama@example.com".into(),
            role: "MEMBER".into(),
            bot: false,
            complimentary: false,
            created_at: Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap(),
            authorization: None,
        }
    }

    #[tokio::test]
    async fn test_miss_delegates_and_writes_the_cache() {
        let dir = tempdir().unwrap();
        let source = DiskCacheSource::new(StubSource::new(vec![org_member("1")]), dir.path());

        let members = source.org_members("my-org").await.unwrap();

        assert_eq!(members.len(), 1);
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 1);

        let cached = fs::read_to_string(dir.path().join("my-org.json")).unwrap();
        let parsed: Vec<OrgMember> = serde_json::from_str(&cached).unwrap();
        assert_eq!(parsed, members);
    }

    #[tokio::test]
    async fn test_hit_skips_the_inner_source() {
        let dir = tempdir().unwrap();
        let cached = vec![org_member("cached")];
        fs::write(
            dir.path().join("my-org.json"),
            serde_json::to_string(&cached).unwrap(),
        )
        .unwrap();

        let source = DiskCacheSource::new(StubSource::new(vec![org_member("live")]), dir.path());

        let members = source.org_members("my-org").await.unwrap();

        assert_eq!(members, cached);
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_corrupt_cache_file_fails() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("my-org.json"), "not json").unwrap();

        let source = DiskCacheSource::new(StubSource::new(vec![org_member("live")]), dir.path());

        let err = source.org_members("my-org").await.unwrap_err();

        assert!(err.to_string().contains("failed to decode cache file"));
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_caches_per_org_slug() {
        let dir = tempdir().unwrap();
        let source = DiskCacheSource::new(StubSource::new(vec![org_member("1")]), dir.path());

        source.org_members("org-one").await.unwrap();
        source.org_members("org-two").await.unwrap();
        source.org_members("org-one").await.unwrap();

        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 2);
        assert!(dir.path().join("org-one.json").exists());
        assert!(dir.path().join("org-two.json").exists());
    }
}
