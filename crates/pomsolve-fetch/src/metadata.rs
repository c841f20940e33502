//! `maven-metadata.xml` parsing for version discovery.

use quick_xml::events::Event;
use quick_xml::Reader;

use pomsolve_util::errors::{PomError, PomResult};

/// Artifact-level metadata listing available versions.
#[derive(Debug, Clone, Default)]
pub struct MavenMetadata {
    pub latest: Option<String>,
    pub release: Option<String>,
    pub versions: Vec<String>,
}

/// Parse an artifact-level `maven-metadata.xml`.
pub fn parse_metadata(xml: &str) -> PomResult<MavenMetadata> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut meta = MavenMetadata::default();
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                path.push(String::from_utf8_lossy(e.name().as_ref()).to_string());
                text_buf.clear();
            }
            Ok(Event::Text(ref e)) => {
                text_buf = e.unescape().unwrap_or_default().to_string();
            }
            Ok(Event::End(_)) => {
                match path.join(">").as_str() {
                    "metadata>versioning>latest" => meta.latest = Some(text_buf.clone()),
                    "metadata>versioning>release" => meta.release = Some(text_buf.clone()),
                    "metadata>versioning>versions>version" => {
                        meta.versions.push(text_buf.clone());
                    }
                    _ => {}
                }
                path.pop();
                text_buf.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PomError::Parse {
                    message: format!("Failed to parse maven-metadata.xml: {e}"),
                }
                .into());
            }
            _ => {}
        }
    }

    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_version_listing() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>junit</groupId>
  <artifactId>junit</artifactId>
  <versioning>
    <latest>4.13.2</latest>
    <release>4.13.2</release>
    <versions>
      <version>4.12</version>
      <version>4.13</version>
      <version>4.13.2</version>
    </versions>
  </versioning>
</metadata>"#;
        let meta = parse_metadata(xml).unwrap();
        assert_eq!(meta.latest.as_deref(), Some("4.13.2"));
        assert_eq!(meta.release.as_deref(), Some("4.13.2"));
        assert_eq!(meta.versions, vec!["4.12", "4.13", "4.13.2"]);
    }
}
