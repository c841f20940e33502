//! Maven settings: mirrors, repository credentials, and profile-gated
//! repositories. Settings are applied upstream of the downloader; the
//! resolver only consumes the repository lists they produce.

use crate::raw::RawRepository;

/// The subset of `settings.xml` that affects resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MavenSettings {
    pub mirrors: Vec<Mirror>,
    pub servers: Vec<Server>,
    pub profiles: Vec<SettingsProfile>,
    pub active_profiles: Vec<String>,
}

/// A mirror rule: repositories matched by `mirror_of` are fetched from
/// `url` instead of their own URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mirror {
    pub id: Option<String>,
    pub url: String,
    /// Comma-separated repository ids; `*` matches all, `!id` excludes.
    pub mirror_of: String,
}

/// Credentials for a repository id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    pub id: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Extra repositories contributed by a settings profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsProfile {
    pub id: Option<String>,
    pub active_by_default: bool,
    pub repositories: Vec<RawRepository>,
}

impl MavenSettings {
    /// Repositories contributed by profiles that are active, either named
    /// in `active` or in the settings' own `active_profiles` list, or
    /// marked active-by-default.
    pub fn active_repositories(&self, active: &[String]) -> Vec<RawRepository> {
        self.profiles
            .iter()
            .filter(|p| {
                p.active_by_default
                    || p.id.as_deref().is_some_and(|id| {
                        active.iter().any(|a| a == id)
                            || self.active_profiles.iter().any(|a| a == id)
                    })
            })
            .flat_map(|p| p.repositories.iter().cloned())
            .collect()
    }

    /// Apply mirror rules, rewriting the URL of every matched repository.
    /// The first matching mirror wins.
    pub fn apply_mirrors(&self, repositories: Vec<RawRepository>) -> Vec<RawRepository> {
        repositories
            .into_iter()
            .map(|mut repo| {
                let repo_id = repo.id.as_deref().unwrap_or("");
                if let Some(mirror) = self
                    .mirrors
                    .iter()
                    .find(|m| mirror_of_matches(&m.mirror_of, repo_id))
                {
                    repo.url = mirror.url.clone();
                    repo.id = mirror.id.clone().or(repo.id);
                }
                repo
            })
            .collect()
    }

    /// Credentials for a repository id, if configured.
    pub fn credentials_for(&self, id: &str) -> Option<&Server> {
        self.servers.iter().find(|s| s.id == id)
    }
}

/// Evaluate a `mirrorOf` pattern against a repository id. Negated entries
/// (`!id`) veto a match; `*` matches everything else.
fn mirror_of_matches(pattern: &str, repo_id: &str) -> bool {
    let mut wildcard = false;
    let mut named = false;
    for token in pattern.split(',').map(str::trim) {
        if let Some(negated) = token.strip_prefix('!') {
            if negated == repo_id {
                return false;
            }
        } else if token == "*" {
            wildcard = true;
        } else if token == repo_id {
            named = true;
        }
    }
    wildcard || named
}
