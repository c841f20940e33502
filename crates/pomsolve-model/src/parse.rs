//! POM XML parsing into the raw model.
//!
//! An event-driven parser that tracks the element path and dispatches on
//! path suffixes, so dependency blocks parse the same way whether they sit
//! under the project, under `dependencyManagement`, or inside a profile.

use quick_xml::events::Event;
use quick_xml::Reader;

use pomsolve_util::errors::{PomError, PomResult};

use crate::raw::{
    RawDependency, RawExclusion, RawLicense, RawParent, RawPom, RawProfile, RawRepository,
};

/// Parse a `pom.xml` document into a [`RawPom`].
pub fn parse_pom(xml: &str) -> PomResult<RawPom> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pom = RawPom::default();
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();

    let mut current_dep: Option<RawDependency> = None;
    let mut in_dep_mgmt = false;
    let mut current_excl: Option<RawExclusion> = None;
    let mut current_parent: Option<RawParent> = None;
    let mut current_license: Option<RawLicense> = None;
    let mut current_repo: Option<RawRepository> = None;
    let mut current_profile: Option<RawProfile> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                path.push(tag);
                text_buf.clear();

                let ctx = path.join(">");
                if ctx.ends_with("dependencies>dependency") {
                    in_dep_mgmt = ctx.contains("dependencyManagement");
                    current_dep = Some(RawDependency::default());
                } else if ctx.ends_with("exclusions>exclusion") && current_dep.is_some() {
                    current_excl = Some(RawExclusion {
                        group_id: String::new(),
                        artifact_id: "*".to_string(),
                    });
                } else if ctx == "project>parent" {
                    current_parent = Some(RawParent {
                        group_id: String::new(),
                        artifact_id: String::new(),
                        version: String::new(),
                        relative_path: None,
                    });
                } else if ctx == "project>licenses>license" {
                    current_license = Some(RawLicense::default());
                } else if ctx.ends_with("repositories>repository")
                    && !ctx.contains("pluginRepositories")
                {
                    current_repo = Some(RawRepository::default());
                } else if ctx == "project>profiles>profile" {
                    current_profile = Some(RawProfile::default());
                }
            }
            Ok(Event::Text(ref e)) => {
                text_buf = e.unescape().unwrap_or_default().to_string();
            }
            Ok(Event::End(_)) => {
                let ctx = path.join(">");
                let last = path.last().map(String::as_str).unwrap_or("");
                let depth = path.len();

                // <properties> children, at project level or inside a profile
                if depth == 3 && path[1] == "properties" {
                    pom.properties.insert(last.to_string(), text_buf.clone());
                } else if depth == 5 && path[1] == "profiles" && path[3] == "properties" {
                    if let Some(profile) = current_profile.as_mut() {
                        profile.properties.insert(last.to_string(), text_buf.clone());
                    }
                }

                if let Some(excl) = current_excl.as_mut() {
                    match last {
                        "groupId" => excl.group_id = text_buf.clone(),
                        "artifactId" => excl.artifact_id = text_buf.clone(),
                        "exclusion" => {
                            if let (Some(excl), Some(dep)) =
                                (current_excl.take(), current_dep.as_mut())
                            {
                                dep.exclusions.push(excl);
                            }
                        }
                        _ => {}
                    }
                } else if let Some(dep) = current_dep.as_mut() {
                    match last {
                        "groupId" if ctx.ends_with("dependency>groupId") => {
                            dep.group_id = text_buf.clone();
                        }
                        "artifactId" if ctx.ends_with("dependency>artifactId") => {
                            dep.artifact_id = text_buf.clone();
                        }
                        "version" if ctx.ends_with("dependency>version") => {
                            dep.version = Some(text_buf.clone());
                        }
                        "scope" if ctx.ends_with("dependency>scope") => {
                            dep.scope = Some(text_buf.clone());
                        }
                        "type" if ctx.ends_with("dependency>type") => {
                            dep.type_ = Some(text_buf.clone());
                        }
                        "classifier" if ctx.ends_with("dependency>classifier") => {
                            dep.classifier = Some(text_buf.clone());
                        }
                        "optional" if ctx.ends_with("dependency>optional") => {
                            dep.optional = text_buf.trim() == "true";
                        }
                        "dependency" => {
                            if let Some(dep) = current_dep.take() {
                                let dest = match (current_profile.as_mut(), in_dep_mgmt) {
                                    (Some(p), true) => &mut p.dependency_management,
                                    (Some(p), false) => &mut p.dependencies,
                                    (None, true) => &mut pom.dependency_management,
                                    (None, false) => &mut pom.dependencies,
                                };
                                dest.push(dep);
                            }
                            in_dep_mgmt = false;
                        }
                        _ => {}
                    }
                }

                if let Some(parent) = current_parent.as_mut() {
                    match last {
                        "groupId" if ctx == "project>parent>groupId" => {
                            parent.group_id = text_buf.clone();
                        }
                        "artifactId" if ctx == "project>parent>artifactId" => {
                            parent.artifact_id = text_buf.clone();
                        }
                        "version" if ctx == "project>parent>version" => {
                            parent.version = text_buf.clone();
                        }
                        "relativePath" if ctx == "project>parent>relativePath" => {
                            parent.relative_path = Some(text_buf.clone());
                        }
                        "parent" => pom.parent = current_parent.take(),
                        _ => {}
                    }
                }

                if let Some(license) = current_license.as_mut() {
                    match last {
                        "name" if ctx == "project>licenses>license>name" => {
                            license.name = Some(text_buf.clone());
                        }
                        "url" if ctx == "project>licenses>license>url" => {
                            license.url = Some(text_buf.clone());
                        }
                        "license" => {
                            if let Some(license) = current_license.take() {
                                pom.licenses.push(license);
                            }
                        }
                        _ => {}
                    }
                }

                if let Some(repo) = current_repo.as_mut() {
                    match last {
                        "id" if ctx.ends_with("repository>id") => {
                            repo.id = Some(text_buf.clone());
                        }
                        "url" if ctx.ends_with("repository>url") => {
                            repo.url = text_buf.clone();
                        }
                        "enabled" if ctx.ends_with("releases>enabled") => {
                            repo.releases = Some(text_buf.trim() == "true");
                        }
                        "enabled" if ctx.ends_with("snapshots>enabled") => {
                            repo.snapshots = Some(text_buf.trim() == "true");
                        }
                        "repository" => {
                            if let Some(repo) = current_repo.take() {
                                match current_profile.as_mut() {
                                    Some(p) => p.repositories.push(repo),
                                    None => pom.repositories.push(repo),
                                }
                            }
                        }
                        _ => {}
                    }
                }

                if let Some(profile) = current_profile.as_mut() {
                    match last {
                        "id" if ctx == "project>profiles>profile>id" => {
                            profile.id = Some(text_buf.clone());
                        }
                        "activeByDefault"
                            if ctx == "project>profiles>profile>activation>activeByDefault" =>
                        {
                            profile.active_by_default = text_buf.trim() == "true";
                        }
                        "profile" if ctx == "project>profiles>profile" => {
                            if let Some(profile) = current_profile.take() {
                                pom.profiles.push(profile);
                            }
                        }
                        _ => {}
                    }
                }

                // top-level project fields
                if depth == 2 {
                    match last {
                        "groupId" => pom.group_id = Some(text_buf.clone()),
                        "artifactId" => pom.artifact_id = Some(text_buf.clone()),
                        "version" => pom.version = Some(text_buf.clone()),
                        "packaging" => pom.packaging = Some(text_buf.clone()),
                        _ => {}
                    }
                }

                path.pop();
                text_buf.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PomError::Parse {
                    message: format!("Failed to parse POM XML: {e}"),
                }
                .into());
            }
            _ => {}
        }
    }

    Ok(pom)
}
