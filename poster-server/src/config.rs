//! Command-line and environment configuration.

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine;
use clap::{Args, Parser, Subcommand};
use poster_core::store::DEFAULT_MAX_POSTERS;
use poster_core::{EditorKind, PosterStore, SeedLabel};
use poster_renderer::ImageFormat;
use thiserror::Error;

use crate::export::ExportRequest;
use crate::storage::{LocalStorage, PosterStorage, RemoteStorage, StorageError};

/// Default port for the poster server.
pub const DEFAULT_PORT: u16 = 8787;

/// Errors while turning CLI arguments into a request.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A referenced file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The parameters file is not valid JSON.
    #[error("invalid parameters file {path}: {source}")]
    Params {
        /// File that failed.
        path: PathBuf,
        /// Parse error.
        source: serde_json::Error,
    },
}

/// Program.A poster server and renderer.
#[derive(Debug, Parser)]
#[command(name = "program-a", version, about)]
pub struct Cli {
    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the posters API and the export endpoint.
    Serve(ServeArgs),
    /// Render one poster to a file.
    Render(RenderArgs),
}

/// Where posters are saved.
#[derive(Debug, Clone, Args)]
pub struct StorageArgs {
    /// Directory holding `posters.json`. Without it posters live in memory.
    #[arg(long, env = "POSTER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Number of posters kept; older saves are evicted first.
    #[arg(long, env = "POSTER_MAX_POSTERS", default_value_t = DEFAULT_MAX_POSTERS)]
    pub max_posters: usize,

    /// Base URL of a remote posters service. Takes precedence over
    /// `--data-dir`.
    #[arg(long, env = "POSTER_REMOTE_STORAGE")]
    pub remote_storage: Option<String>,
}

impl StorageArgs {
    /// Whether anything outlives the process.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.data_dir.is_some() || self.remote_storage.is_some()
    }

    /// Open the configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the remote URL is invalid or the data
    /// directory cannot be loaded.
    pub fn open(&self) -> Result<Arc<dyn PosterStorage>, StorageError> {
        if let Some(url) = &self.remote_storage {
            let remote = RemoteStorage::new(url)?;
            tracing::info!("Using remote storage at {}", remote.endpoint());
            return Ok(Arc::new(remote));
        }
        let store = match &self.data_dir {
            Some(dir) => {
                tracing::info!("Using local storage in {}", dir.display());
                PosterStore::with_data_dir(dir)?
            }
            None => PosterStore::new(),
        };
        Ok(Arc::new(LocalStorage::new(
            store.with_max_posters(self.max_posters),
        )))
    }
}

/// `program-a serve`
#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Port to listen on.
    #[arg(long, env = "POSTER_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind.
    #[arg(long, env = "POSTER_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Storage options.
    #[command(flatten)]
    pub storage: StorageArgs,
}

/// `program-a render`
#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    /// Editor to render.
    #[arg(long)]
    pub editor: EditorKind,

    /// Seed text or number.
    #[arg(long, default_value = "")]
    pub seed: String,

    /// JSON file of named parameter values.
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Export width (default: the editor's export width).
    #[arg(long)]
    pub width: Option<u32>,

    /// Export height (default: follows the preview aspect).
    #[arg(long)]
    pub height: Option<u32>,

    /// Preview width the layout is designed at.
    #[arg(long)]
    pub preview_width: Option<u32>,

    /// Preview height the layout is designed at.
    #[arg(long)]
    pub preview_height: Option<u32>,

    /// png, jpg, svg or gif.
    #[arg(long, default_value = "png")]
    pub format: String,

    /// Animation time in frames.
    #[arg(long, default_value_t = 0.0)]
    pub time: f64,

    /// Source image for the pixel editor.
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Output path (default: the poster's filename in the current directory).
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Skip saving to storage.
    #[arg(long)]
    pub no_save: bool,

    /// Storage options.
    #[command(flatten)]
    pub storage: StorageArgs,
}

impl RenderArgs {
    /// Build the export request these arguments describe.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the parameters or source file cannot be
    /// read.
    pub fn to_request(&self) -> Result<ExportRequest, ConfigError> {
        let params = self
            .params
            .as_ref()
            .map(|path| {
                let text = read(path)?;
                serde_json::from_slice(&text).map_err(|source| ConfigError::Params {
                    path: path.clone(),
                    source,
                })
            })
            .transpose()?;
        let source = self
            .source
            .as_ref()
            .map(|path| read(path).map(|bytes| image_data_url(&bytes)))
            .transpose()?;

        Ok(ExportRequest {
            editor: Some(self.editor),
            seed: Some(SeedLabel::Text(self.seed.clone())),
            params,
            preview_width: self.preview_width,
            preview_height: self.preview_height,
            width: self.width,
            height: self.height,
            format: Some(self.format.clone()),
            time: self.time,
            source,
            save: Some(!self.no_save && self.storage.is_persistent()),
        })
    }
}

fn read(path: &Path) -> Result<Vec<u8>, ConfigError> {
    std::fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Wrap image file bytes as a data URL.
#[must_use]
pub fn image_data_url(bytes: &[u8]) -> String {
    let mime = match ImageFormat::from_magic_bytes(bytes) {
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::Png | ImageFormat::Unknown => "image/png",
    };
    format!(
        "data:{mime};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn render_arguments() {
        let cli = Cli::try_parse_from([
            "program-a",
            "render",
            "--editor",
            "crashclock",
            "--seed",
            "dawn",
            "--width",
            "2000",
            "--format",
            "svg",
            "--no-save",
        ])
        .expect("parse");
        let Command::Render(args) = cli.command else {
            panic!("expected render");
        };
        assert_eq!(args.editor, EditorKind::CrashClock);
        let request = args.to_request().expect("request");
        assert_eq!(request.width, Some(2000));
        assert_eq!(request.height, None);
        assert_eq!(request.save, Some(false));
        let job = request.into_job().expect("job");
        assert_eq!(job.export, (2000, 3000));
        assert_eq!(job.extension(), "svg");
    }

    #[test]
    fn unknown_editor_is_rejected() {
        assert!(Cli::try_parse_from(["program-a", "render", "--editor", "cubism"]).is_err());
    }

    #[test]
    fn params_file_is_read() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("params.json");
        std::fs::write(&path, r#"{"lineCount": 12}"#).expect("write");
        let cli = Cli::try_parse_from([
            "program-a",
            "render",
            "--editor",
            "moire",
            "--params",
            path.to_str().expect("utf8 path"),
        ])
        .expect("parse");
        let Command::Render(args) = cli.command else {
            panic!("expected render");
        };
        let request = args.to_request().expect("request");
        assert_eq!(request.params, Some(serde_json::json!({ "lineCount": 12 })));

        std::fs::write(&path, "{").expect("write");
        assert!(matches!(args.to_request(), Err(ConfigError::Params { .. })));
    }

    #[test]
    fn storage_selection() {
        let dir = tempfile::tempdir().expect("tempdir");
        let local = StorageArgs {
            data_dir: Some(dir.path().to_path_buf()),
            max_posters: 5,
            remote_storage: None,
        };
        assert!(local.is_persistent());
        assert!(local.open().is_ok());

        let broken = StorageArgs {
            data_dir: None,
            max_posters: 5,
            remote_storage: Some("::nope".into()),
        };
        assert!(matches!(broken.open(), Err(StorageError::InvalidUrl(_))));
    }

    #[test]
    fn data_urls_name_the_format() {
        assert!(image_data_url(&[0xFF, 0xD8, 0xFF, 0xE0]).starts_with("data:image/jpeg;base64,"));
        assert!(image_data_url(b"GIF89a").starts_with("data:image/gif;base64,"));
    }
}
