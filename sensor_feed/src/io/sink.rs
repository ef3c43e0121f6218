use std::path::PathBuf;

use async_trait::async_trait;
use snafu::{Backtrace, ResultExt, Snafu};
use tracing::info;

use crate::{
    chart::build_datasets,
    models::{metric::MetricSpec, point::Series},
};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SinkError {
    /// The series could not be rendered into the destination format.
    #[snafu(display("Data conversion error: {source}"))]
    Conversion {
        source: serde_json::Error,
        backtrace: Backtrace,
    },

    /// A generic I/O error.
    #[snafu(display("I/O error on {}: {source}", path.display()))]
    Io {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },
}

#[async_trait]
pub trait DataSink {
    /// The type of output returned after a successful write operation.
    ///
    /// A file sink returns the path it wrote; other sinks may report a count.
    type Output;

    /// Writes a slice of `Series` to the destination.
    ///
    /// # Arguments
    /// * `data` - The series of one completed acquisition cycle.
    async fn write(&self, data: &[Series]) -> Result<Self::Output, SinkError>;
}

/// Writes chart datasets as pretty-printed JSON to a single file.
///
/// Parent directories are created as needed and an existing file is replaced.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
    specs: Vec<MetricSpec>,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>, specs: Vec<MetricSpec>) -> Self {
        Self {
            path: path.into(),
            specs,
        }
    }
}

#[async_trait]
impl DataSink for JsonFileSink {
    type Output = PathBuf;

    async fn write(&self, data: &[Series]) -> Result<PathBuf, SinkError> {
        let datasets = build_datasets(data, &self.specs);
        let body = serde_json::to_vec_pretty(&datasets).context(ConversionSnafu)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .context(IoSnafu { path: parent })?;
        }
        tokio::fs::write(&self.path, body)
            .await
            .context(IoSnafu { path: &self.path })?;

        info!(path = %self.path.display(), datasets = datasets.len(), "Wrote chart datasets");
        Ok(self.path.clone())
    }
}
