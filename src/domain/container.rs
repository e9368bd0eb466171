use serde::{Deserialize, Serialize};

fn default_icon() -> String {
    "mdi:docker".to_string()
}

/// A watched container and its update state.
///
/// Field names serialize camelCase; that serialized form is what the
/// user-facing templates address, so renames here are breaking changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    /// Container id as reported by the runtime.
    pub id: String,
    /// Container name.
    pub name: String,
    /// Name of the watcher that owns this container.
    pub watcher: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Icon shown by dashboards, Material Design Icons notation.
    #[serde(default = "default_icon")]
    pub display_icon: String,
    /// Regex constraining which remote tags are candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_tags: Option<String>,
    /// Whether a newer tag or digest is known.
    #[serde(default)]
    pub update_available: bool,
    pub image: Image,
    /// Latest watch result, when a scan has completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<UpdateResult>,
    #[serde(default)]
    pub update_kind: UpdateKind,
}

/// The image a container was created from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: String,
    pub registry: Registry,
    pub name: String,
    pub tag: Tag,
    pub digest: Digest,
    pub architecture: String,
    pub os: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub value: String,
    /// Whether the tag parses as semver.
    #[serde(default)]
    pub semver: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Digest {
    /// Whether digest changes are watched for this container.
    #[serde(default)]
    pub watch: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Outcome of the latest registry scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// Link to the release (changelog) backing the update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

/// How an available update is identified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateKind {
    #[serde(default)]
    pub kind: UpdateKindKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_value: Option<String>,
    /// For semver tags, which part changed (major, minor, patch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semver_diff: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateKindKind {
    Tag,
    Digest,
    #[default]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_serializes_camel_case() {
        let container = Container {
            id: "123".into(),
            name: "nginx".into(),
            watcher: "local".into(),
            display_name: None,
            display_icon: default_icon(),
            include_tags: None,
            update_available: true,
            image: Image {
                id: "sha256:abc".into(),
                registry: Registry {
                    name: Some("hub".into()),
                    url: "https://registry-1.docker.io".into(),
                },
                name: "library/nginx".into(),
                tag: Tag {
                    value: "1.0.0".into(),
                    semver: true,
                },
                digest: Digest {
                    watch: false,
                    repo: None,
                    value: None,
                },
                architecture: "amd64".into(),
                os: "linux".into(),
                created: None,
            },
            result: Some(UpdateResult {
                tag: Some("2.0.0".into()),
                link: Some("https://example.com/changelog".into()),
                ..UpdateResult::default()
            }),
            update_kind: UpdateKind {
                kind: UpdateKindKind::Tag,
                local_value: Some("1.0.0".into()),
                remote_value: Some("2.0.0".into()),
                semver_diff: Some("major".into()),
            },
        };

        let value = serde_json::to_value(&container).unwrap();
        assert_eq!(value["updateKind"]["kind"], "tag");
        assert_eq!(value["updateKind"]["localValue"], "1.0.0");
        assert_eq!(value["updateAvailable"], true);
        assert_eq!(value["image"]["tag"]["value"], "1.0.0");
        assert_eq!(value["displayIcon"], "mdi:docker");
    }

    #[test]
    fn absent_optionals_are_omitted() {
        let kind = UpdateKind::default();
        let value = serde_json::to_value(kind).unwrap();
        assert_eq!(value, serde_json::json!({ "kind": "unknown" }));
    }
}
