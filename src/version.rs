//! Build identity stamped in by `build.rs`.

pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

const fn or_unknown(value: Option<&'static str>) -> &'static str {
    match value {
        Some(v) => v,
        None => "unknown",
    }
}

pub const GIT_BRANCH: &str = or_unknown(option_env!("VERGEN_GIT_BRANCH"));

pub const GIT_SHA: &str = or_unknown(option_env!("VERGEN_GIT_SHA"));

pub fn git_dirty() -> bool {
    matches!(option_env!("VERGEN_GIT_DIRTY"), Some("true"))
}

/// `0.1.0+main.abc1234`, with `.dirty` appended for modified trees.
pub fn version_string() -> String {
    let sha: String = GIT_SHA.chars().take(7).collect();
    let mut version = format!("{PKG_VERSION}+{GIT_BRANCH}.{sha}");
    if git_dirty() {
        version.push_str(".dirty");
    }
    version
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leads_with_package_version_and_branch() {
        let version = version_string();
        assert!(version.starts_with(&format!("{PKG_VERSION}+{GIT_BRANCH}.")));
    }

    #[test]
    fn sha_segment_is_at_most_seven_chars() {
        let version = version_string();
        let tail = version.rsplit_once('.').map(|(head, last)| {
            if last == "dirty" {
                head.rsplit_once('.').map_or("", |(_, sha)| sha)
            } else {
                last
            }
        });
        assert!(tail.is_some_and(|sha| sha.chars().count() <= 7));
    }

    #[test]
    fn dirty_suffix_matches_flag() {
        assert_eq!(version_string().ends_with(".dirty"), git_dirty());
    }
}
