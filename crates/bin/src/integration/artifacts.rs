//! Artifact directory resolution.

use std::path::PathBuf;

/// Get the default artifact directory path.
///
/// Uses platform-specific data directories:
/// - Linux: `~/.local/share/staycast/`
/// - macOS: `~/Library/Application Support/staycast/`
/// - Windows: `%APPDATA%\staycast\`
pub(crate) fn default_artifact_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("staycast")
}

/// Pick the artifact directory: command line first, then the config file,
/// then the platform default.
pub(crate) fn resolve_artifact_dir(
    cli: Option<PathBuf>,
    configured: Option<PathBuf>,
) -> PathBuf {
    cli.or(configured).unwrap_or_else(default_artifact_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("cli"), Some("file"), "cli")]
    #[case(None, Some("file"), "file")]
    fn test_resolve_precedence(
        #[case] cli: Option<&str>,
        #[case] configured: Option<&str>,
        #[case] expected: &str,
    ) {
        let resolved = resolve_artifact_dir(cli.map(PathBuf::from), configured.map(PathBuf::from));
        assert_eq!(resolved, PathBuf::from(expected));
    }

    #[test]
    fn test_default_ends_with_crate_dir() {
        assert!(resolve_artifact_dir(None, None).ends_with("staycast"));
    }
}
