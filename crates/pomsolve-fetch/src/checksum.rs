//! Artifact checksum verification against repository sidecar files.

use std::fmt::Write as _;

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use pomsolve_util::errors::{PomError, PomResult};

/// Sidecar extensions and their digests, in preference order.
const SIDECARS: [(&str, fn(&[u8]) -> String); 3] = [
    ("sha256", hex_digest::<Sha256>),
    ("sha1", hex_digest::<Sha1>),
    ("md5", hex_digest::<Md5>),
];

/// Verify `data` against the first checksum sidecar the repository serves.
/// `fetch_text` retrieves a sidecar URL's content, returning `Ok(None)` when
/// the repository does not publish one; a sidecar may hold the bare hash or
/// `hash  filename`. Absence of every sidecar is not an error.
pub fn verify_with<F>(fetch_text: F, file_url: &str, data: &[u8]) -> PomResult<()>
where
    F: Fn(&str) -> PomResult<Option<String>>,
{
    for (extension, digest) in SIDECARS {
        let Some(sidecar) = fetch_text(&format!("{file_url}.{extension}"))? else {
            continue;
        };
        let expected = sidecar.split_whitespace().next().unwrap_or("");
        let actual = digest(data);
        if actual.eq_ignore_ascii_case(expected) {
            tracing::debug!("{extension} checksum ok for {file_url}");
            return Ok(());
        }
        return Err(PomError::Network {
            message: format!(
                "{extension} checksum mismatch for {file_url}: expected {expected}, got {actual}"
            ),
        }
        .into());
    }

    tracing::warn!("No checksum sidecar found for {file_url}");
    Ok(())
}

/// Hex digest of `data` under any of the hash algorithms above.
fn hex_digest<D: Digest>(data: &[u8]) -> String {
    let mut hex = String::new();
    for byte in D::digest(data) {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_sha256_passes() {
        let fetch = |url: &str| -> PomResult<Option<String>> {
            Ok(url.ends_with(".sha256").then(|| {
                "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9".to_string()
            }))
        };
        assert!(verify_with(fetch, "https://r/x.jar", b"hello world").is_ok());
    }

    #[test]
    fn sidecar_with_filename_suffix() {
        let fetch = |url: &str| -> PomResult<Option<String>> {
            Ok(url
                .ends_with(".md5")
                .then(|| "5eb63bbbe01eeed093cb22bb8f5acdc3  x.jar\n".to_string()))
        };
        assert!(verify_with(fetch, "https://r/x.jar", b"hello world").is_ok());
    }

    #[test]
    fn mismatch_is_an_error() {
        let fetch =
            |url: &str| -> PomResult<Option<String>> { Ok(url.ends_with(".sha1").then(|| "deadbeef".to_string())) };
        let err = verify_with(fetch, "https://r/x.jar", b"hello world").unwrap_err();
        assert!(err.to_string().contains("sha1 checksum mismatch"));
    }

    #[test]
    fn missing_sidecars_are_tolerated() {
        let fetch = |_: &str| -> PomResult<Option<String>> { Ok(None) };
        assert!(verify_with(fetch, "https://r/x.jar", b"hello world").is_ok());
    }

    #[test]
    fn digests_for_every_sidecar_kind() {
        let [(_, sha256), (_, sha1), (_, md5)] = SIDECARS;
        assert_eq!(
            sha256(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        assert_eq!(sha1(b"hello world"), "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed");
        assert_eq!(md5(b"hello world"), "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }
}
