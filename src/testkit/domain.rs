//! Builders for domain primitives used across the test suites.

use crate::domain::{
    Container, Digest, Image, Registry, Tag, UpdateKind, UpdateKindKind, UpdateResult, Watcher,
};

/// A minimal container owned by `watcher`, no update pending.
pub fn container(name: &str, watcher: &str) -> Container {
    Container {
        id: "31a61a8305ef1fc9a71fa4f20a68d7ec88b28e32303bbc4a5f192e851165b816".into(),
        name: name.into(),
        watcher: watcher.into(),
        display_name: None,
        display_icon: "mdi:docker".into(),
        include_tags: None,
        update_available: false,
        image: image(),
        result: None,
        update_kind: UpdateKind::default(),
    }
}

/// A container with a semver tag update `1.0.0` → `2.0.0` and a
/// changelog link, matching the canonical notification fixtures.
pub fn container_with_tag_update(name: &str, watcher: &str) -> Container {
    Container {
        update_available: true,
        include_tags: Some("^\\d+\\.\\d+\\.\\d+$".into()),
        result: Some(UpdateResult {
            tag: Some("2.0.0".into()),
            link: Some("https://test-2.0.0/changelog".into()),
            ..UpdateResult::default()
        }),
        update_kind: UpdateKind {
            kind: UpdateKindKind::Tag,
            local_value: Some("1.0.0".into()),
            remote_value: Some("2.0.0".into()),
            semver_diff: Some("major".into()),
        },
        ..container(name, watcher)
    }
}

pub fn watcher(name: &str, running: bool) -> Watcher {
    Watcher::new(name, running)
}

fn image() -> Image {
    Image {
        id: "sha256:d4a6fafb7d4da37495e5c9be3242590be24a87d7edcc4f79761098889c54fca6".into(),
        registry: Registry {
            name: Some("hub".into()),
            url: "123456789.dkr.ecr.eu-west-1.amazonaws.com".into(),
        },
        name: "test".into(),
        tag: Tag {
            value: "2021.6.4".into(),
            semver: true,
        },
        digest: Digest {
            watch: false,
            repo: Some("sha256:ca0edc3fb0b4647963629bdfccbb3ccfa352184b45a9b4145832000c2878dd72".into()),
            value: None,
        },
        architecture: "amd64".into(),
        os: "linux".into(),
        created: Some("2021-06-12T05:33:38.440Z".into()),
    }
}
