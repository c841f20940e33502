//! HTTP downloader over the Maven repository layout.
//!
//! Synchronous from the caller's perspective: an owned single-thread tokio
//! runtime drives the async client, so the resolver can stay a plain state
//! machine while requests get timeouts, retries, and streaming for free.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, Response, StatusCode};
use tokio::runtime::Runtime;

use pomsolve_model::coordinate::GroupArtifact;
use pomsolve_model::parse::parse_pom;
use pomsolve_model::raw::{RawPom, RawRepository};
use pomsolve_model::settings::{MavenSettings, Server};
use pomsolve_util::errors::{PomError, PomResult};

use crate::cache::{ArtifactKey, WorkspaceCache};
use crate::checksum;
use crate::downloader::Downloader;
use crate::metadata::parse_metadata;
use crate::repository;

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Downloader backed by HTTP(S) Maven repositories and the workspace cache.
pub struct HttpDownloader {
    client: Client,
    runtime: Runtime,
    cache: Arc<WorkspaceCache>,
    settings: Option<MavenSettings>,
}

impl HttpDownloader {
    pub fn new(cache: Arc<WorkspaceCache>, settings: Option<MavenSettings>) -> PomResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(PomError::Io)?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("pomsolve/0.1")
            .build()
            .map_err(|e| PomError::Network {
                message: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            runtime,
            cache,
            settings,
        })
    }

    fn auth_for(&self, repo: &RawRepository) -> Option<&Server> {
        let id = repo.id.as_deref()?;
        self.settings.as_ref()?.credentials_for(id)
    }

    /// GET raw bytes with bounded retries. `Ok(None)` for 404; 5xx,
    /// timeouts, and connection failures retry with linear backoff.
    fn get_bytes(
        &self,
        repo: &RawRepository,
        url: &str,
        progress: bool,
    ) -> PomResult<Option<Vec<u8>>> {
        let auth = self.auth_for(repo);
        self.runtime.block_on(async {
            let mut last_err = String::new();

            for attempt in 0..MAX_RETRIES {
                if attempt > 0 {
                    tokio::time::sleep(RETRY_DELAY * attempt).await;
                }

                let mut request = self.client.get(url);
                if let Some(server) = auth {
                    request = request.basic_auth(
                        server.username.clone().unwrap_or_default(),
                        server.password.clone(),
                    );
                }

                match request.send().await {
                    Ok(response) => {
                        let status = response.status();
                        if status == StatusCode::NOT_FOUND {
                            return Ok(None);
                        }
                        if status.is_server_error() {
                            last_err = format!("HTTP {status} from {url}");
                            continue;
                        }
                        if !status.is_success() {
                            return Err(PomError::Network {
                                message: format!("HTTP {status} fetching {url}"),
                            }
                            .into());
                        }
                        return read_body(response, url, progress).await.map(Some);
                    }
                    Err(e) if e.is_timeout() || e.is_connect() => {
                        last_err = e.to_string();
                        continue;
                    }
                    Err(e) => {
                        return Err(PomError::Network {
                            message: format!("Request to {url} failed: {e}"),
                        }
                        .into());
                    }
                }
            }

            Err(PomError::Network {
                message: format!("Failed after {MAX_RETRIES} retries for {url}: {last_err}"),
            }
            .into())
        })
    }

    /// Fetch with an HTTPS retry: repositories still published as `http://`
    /// usually answer on HTTPS, so a failing plain-HTTP fetch gets one more
    /// chance on the upgraded scheme.
    fn fetch(&self, repo: &RawRepository, url: &str, progress: bool) -> PomResult<Option<Vec<u8>>> {
        match self.get_bytes(repo, url, progress) {
            Err(err) if url.starts_with("http://") => {
                let https = url.replacen("http://", "https://", 1);
                tracing::warn!("{err}; retrying over HTTPS as {https}");
                self.get_bytes(repo, &https, progress)
            }
            other => other,
        }
    }

    fn fetch_text(&self, repo: &RawRepository, url: &str) -> PomResult<Option<String>> {
        Ok(self
            .fetch(repo, url, false)?
            .map(|bytes| String::from_utf8_lossy(&bytes).to_string()))
    }

    /// Parent POMs frequently live next to the POM that references them;
    /// honor `<relativePath>` before going to the network. The file is only
    /// trusted when the coordinates it declares match the request.
    fn load_relative(
        &self,
        relative_path: &str,
        originator: &RawPom,
        group_id: &str,
        artifact_id: &str,
        version: &str,
    ) -> Option<RawPom> {
        let origin = originator.source.as_ref()?;
        let mut candidate = origin.parent()?.join(relative_path);
        if candidate.is_dir() {
            candidate.push("pom.xml");
        }
        let xml = std::fs::read_to_string(&candidate).ok()?;
        let mut pom = parse_pom(&xml).ok()?;
        pom.source = Some(candidate);

        let group_matches = pom.group_id.as_deref() == Some(group_id);
        let artifact_matches = pom.artifact_id.as_deref() == Some(artifact_id);
        let version_matches = pom.version.as_deref().map_or(true, |v| v == version);
        (group_matches && artifact_matches && version_matches).then_some(pom)
    }

    /// Whether a repository's policies admit this version.
    fn admits(repo: &RawRepository, version: &str) -> bool {
        if version.ends_with("-SNAPSHOT") {
            repo.snapshots_enabled()
        } else {
            repo.releases_enabled()
        }
    }
}

impl Downloader for HttpDownloader {
    fn download_pom(
        &self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
        classifier: Option<&str>,
        relative_path: Option<&str>,
        originator: Option<&RawPom>,
        repositories: &[RawRepository],
    ) -> PomResult<Option<RawPom>> {
        if let (Some(rel), Some(originator)) = (relative_path, originator) {
            if !rel.is_empty() {
                if let Some(pom) =
                    self.load_relative(rel, originator, group_id, artifact_id, version)
                {
                    return Ok(Some(pom));
                }
            }
        }

        let key = ArtifactKey::new(group_id, artifact_id, classifier, "pom", version);
        if let Some(bytes) = self.cache.lookup(&key) {
            let mut pom = parse_pom(&String::from_utf8_lossy(&bytes))?;
            pom.source = Some(PathBuf::from(format!(
                "cache://{group_id}/{artifact_id}/{version}"
            )));
            return Ok(Some(pom));
        }

        for repo in repositories {
            if !Self::admits(repo, version) {
                continue;
            }
            let url = repository::pom_url(&repo.url, group_id, artifact_id, version);
            if let Some(bytes) = self.fetch(repo, &url, false)? {
                self.cache.store(&key, &bytes)?;
                let mut pom = parse_pom(&String::from_utf8_lossy(&bytes))?;
                pom.source = Some(PathBuf::from(url));
                return Ok(Some(pom));
            }
        }
        Ok(None)
    }

    fn download_artifact(
        &self,
        coordinate: &GroupArtifact,
        version: &str,
        classifier: Option<&str>,
        repositories: &[RawRepository],
    ) -> PomResult<Option<Vec<u8>>> {
        let key = ArtifactKey::new(
            &coordinate.group_id,
            &coordinate.artifact_id,
            classifier,
            "jar",
            version,
        );
        if let Some(bytes) = self.cache.lookup(&key) {
            return Ok(Some(bytes));
        }

        for repo in repositories {
            if !Self::admits(repo, version) {
                continue;
            }
            let url = repository::artifact_url(
                &repo.url,
                &coordinate.group_id,
                &coordinate.artifact_id,
                version,
                classifier,
                "jar",
            );
            if let Some(bytes) = self.fetch(repo, &url, true)? {
                checksum::verify_with(|sidecar| self.fetch_text(repo, sidecar), &url, &bytes)?;
                self.cache.store(&key, &bytes)?;
                return Ok(Some(bytes));
            }
        }
        Ok(None)
    }

    fn find_versions(
        &self,
        coordinate: &GroupArtifact,
        repositories: &[RawRepository],
    ) -> PomResult<Vec<String>> {
        let key = ArtifactKey::new(
            &coordinate.group_id,
            &coordinate.artifact_id,
            None,
            "maven-metadata",
            "",
        );
        if let Some(versions) = self.cache.lookup_versions(&key) {
            return Ok(versions);
        }

        let mut versions: Vec<String> = Vec::new();
        for repo in repositories {
            let url =
                repository::metadata_url(&repo.url, &coordinate.group_id, &coordinate.artifact_id);
            if let Some(bytes) = self.fetch(repo, &url, false)? {
                let meta = parse_metadata(&String::from_utf8_lossy(&bytes))?;
                for version in meta.versions {
                    if !versions.contains(&version) {
                        versions.push(version);
                    }
                }
            }
        }
        if !versions.is_empty() {
            self.cache.store_versions(&key, &versions)?;
        }
        Ok(versions)
    }
}

async fn read_body(response: Response, url: &str, progress: bool) -> PomResult<Vec<u8>> {
    let total = response.content_length().unwrap_or(0);
    let bar = (progress && total > 100_000).then(|| {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::with_template("  {msg} {bar:30.cyan/dim} {bytes}/{total_bytes}")
                .unwrap()
                .progress_chars("##-"),
        );
        bar.set_message(url.rsplit('/').next().unwrap_or(url).to_string());
        bar
    });

    let mut response = response;
    let mut bytes = Vec::with_capacity(total as usize);
    loop {
        let chunk = response.chunk().await.map_err(|e| PomError::Network {
            message: format!("Failed to read {url}: {e}"),
        })?;
        let Some(chunk) = chunk else { break };
        bytes.extend_from_slice(&chunk);
        if let Some(bar) = &bar {
            bar.inc(chunk.len() as u64);
        }
    }
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_parent_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let parent_xml = r#"<project>
            <groupId>org.example</groupId>
            <artifactId>parent</artifactId>
            <version>1.0</version>
        </project>"#;
        std::fs::write(dir.path().join("pom.xml"), parent_xml).unwrap();
        let module_dir = dir.path().join("module");
        std::fs::create_dir(&module_dir).unwrap();

        let originator = RawPom {
            artifact_id: Some("module".to_string()),
            source: Some(module_dir.join("pom.xml")),
            ..Default::default()
        };

        let downloader =
            HttpDownloader::new(Arc::new(WorkspaceCache::in_memory()), None).unwrap();
        let pom = downloader
            .download_pom(
                "org.example",
                "parent",
                "1.0",
                None,
                Some(".."),
                Some(&originator),
                &[],
            )
            .unwrap()
            .unwrap();
        assert_eq!(pom.artifact_id.as_deref(), Some("parent"));
        assert!(pom.source.unwrap().ends_with("pom.xml"));
    }

    #[test]
    fn relative_path_rejects_coordinate_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("pom.xml"),
            r#"<project>
                <groupId>org.other</groupId>
                <artifactId>stranger</artifactId>
                <version>9.9</version>
            </project>"#,
        )
        .unwrap();
        let module_dir = dir.path().join("module");
        std::fs::create_dir(&module_dir).unwrap();

        let originator = RawPom {
            source: Some(module_dir.join("pom.xml")),
            ..Default::default()
        };

        let downloader =
            HttpDownloader::new(Arc::new(WorkspaceCache::in_memory()), None).unwrap();
        // mismatch falls through to the (empty) repository list
        let result = downloader
            .download_pom(
                "org.example",
                "parent",
                "1.0",
                None,
                Some(".."),
                Some(&originator),
                &[],
            )
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn pom_cache_hit_skips_the_network() {
        let cache = Arc::new(WorkspaceCache::in_memory());
        let key = ArtifactKey::pom("org.example", "lib", "1.0");
        cache
            .store(
                &key,
                br#"<project>
                    <groupId>org.example</groupId>
                    <artifactId>lib</artifactId>
                    <version>1.0</version>
                </project>"#,
            )
            .unwrap();

        let downloader = HttpDownloader::new(cache, None).unwrap();
        // no repositories given: only the cache can satisfy this
        let pom = downloader
            .download_pom("org.example", "lib", "1.0", None, None, None, &[])
            .unwrap()
            .unwrap();
        assert_eq!(pom.group_id.as_deref(), Some("org.example"));
    }
}
