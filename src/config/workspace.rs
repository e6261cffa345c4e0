use serde::Deserialize;
use serde::Serialize;

const SEPARATOR: char = '/';

/// Namespace prefix shared by all watches of this sidecar.
///
/// Backend keys never start with a separator, so normalization strips
/// leading separators from both the root and the watch path before
/// joining them.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct WorkspaceConfig {
    #[serde(default)]
    pub root: Option<String>,
}

impl WorkspaceConfig {
    /// `"/app/config"` with root `"/cobalt"` becomes `"cobalt/app/config"`;
    /// without a root it becomes `"app/config"`.
    pub fn normalize(
        &self,
        path: &str,
    ) -> String {
        let path = path.trim().trim_start_matches(SEPARATOR);
        let root = self
            .root
            .as_deref()
            .map(|r| r.trim().trim_matches(SEPARATOR))
            .unwrap_or_default();

        match (root.is_empty(), path.is_empty()) {
            (true, _) => path.to_string(),
            (false, true) => root.to_string(),
            (false, false) => format!("{root}{SEPARATOR}{path}"),
        }
    }
}
