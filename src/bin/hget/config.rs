use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Default)]
pub(crate) struct Config {
    /// Downloads without an explicit output path land in this directory. Defaults to the working
    /// directory.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Overrides the default `hget/<version>` User-Agent header in HTTP requests.
    #[serde(default)]
    pub user_agent: Option<String>,
}
