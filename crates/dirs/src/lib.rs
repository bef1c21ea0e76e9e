use directories::ProjectDirs;
use std::path::PathBuf;
use std::sync::OnceLock;

pub struct Dirs;

impl Dirs {
    /// Project directory specifically for Wordmark.
    ///
    /// All the files created by wordmark are stored there.
    pub fn project() -> Option<&'static ProjectDirs> {
        static CELL: OnceLock<Option<ProjectDirs>> = OnceLock::new();

        CELL.get_or_init(|| ProjectDirs::from("org", "wordmark", "Wordmark"))
            .as_ref()
    }

    /// Linux: ~/.config/wordmark/config.toml
    pub fn config_file() -> Option<PathBuf> {
        Self::project().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Returns the path of `filename` under the data directory, creating the directory.
    ///
    /// Linux: ~/.local/share/wordmark/<filename>
    pub fn data_file(filename: &str) -> std::io::Result<PathBuf> {
        let project = Self::project().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no valid home directory for wordmark",
            )
        })?;
        let data_dir = project.data_dir();
        std::fs::create_dir_all(data_dir)?;
        Ok(data_dir.join(filename))
    }
}
