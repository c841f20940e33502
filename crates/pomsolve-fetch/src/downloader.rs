//! The capability the resolver uses to obtain POMs, artifact bytes, and
//! version listings.

use pomsolve_model::coordinate::GroupArtifact;
use pomsolve_model::raw::{RawPom, RawRepository};
use pomsolve_util::errors::PomResult;

/// Source of raw POMs, artifact bytes, and version listings.
///
/// Implementations must be idempotent: downloading the same coordinate twice
/// yields the same outcome. `Ok(None)` means the coordinate exists in none of
/// the given repositories; transport failures are errors, which the resolver
/// treats as a missing artifact for the current coordinate.
pub trait Downloader: Send + Sync {
    /// Fetch and parse the POM for a coordinate, trying `repositories` in
    /// order. `relative_path` and `originator` support parent lookups
    /// relative to the POM that referenced them.
    #[allow(clippy::too_many_arguments)]
    fn download_pom(
        &self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
        classifier: Option<&str>,
        relative_path: Option<&str>,
        originator: Option<&RawPom>,
        repositories: &[RawRepository],
    ) -> PomResult<Option<RawPom>>;

    /// Fetch the artifact payload for a coordinate.
    fn download_artifact(
        &self,
        coordinate: &GroupArtifact,
        version: &str,
        classifier: Option<&str>,
        repositories: &[RawRepository],
    ) -> PomResult<Option<Vec<u8>>>;

    /// All known versions of a coordinate, oldest first, for range
    /// resolution.
    fn find_versions(
        &self,
        coordinate: &GroupArtifact,
        repositories: &[RawRepository],
    ) -> PomResult<Vec<String>>;
}
