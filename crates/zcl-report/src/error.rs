use camino::Utf8PathBuf;

/// Failures building an [`AttemptReport`](zcl_schema::report::AttemptReport).
///
/// Unlike the validator, the report builder is not an
/// accumulate-every-violation pass: a malformed or missing `attempt.json`
/// means there is nothing to report on, so it fails fast.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("{path} is missing")]
    MissingAttempt { path: Utf8PathBuf },
    #[error("{path} is required under enforcement but missing")]
    MissingFeedback { path: Utf8PathBuf },
    #[error("reading {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    InvalidJson {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
