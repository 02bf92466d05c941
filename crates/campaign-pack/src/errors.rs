use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("File not found: {path}")]
    #[diagnostic(
        code(file::not_found),
        help("Make sure the file exists and the path is correct")
    )]
    FileNotFound { path: PathBuf },

    #[error("Pack validation failed with {error_count} error(s)")]
    #[diagnostic(
        code(pack::invalid),
        help("Fix the listed errors and run `campaign-pack validate` again")
    )]
    PackInvalid { error_count: usize },

    #[error("Failed to parse pack document")]
    #[diagnostic(
        code(pack::parse_error),
        help("Run `campaign-pack validate` for an itemized report")
    )]
    PackParseError {
        #[source]
        source: serde_json::Error,
    },

    #[error("IO operation failed")]
    #[diagnostic(code(io::operation_failed))]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    pub fn pack_invalid(error_count: usize) -> Self {
        Self::PackInvalid { error_count }
    }

    pub fn pack_parse_error(source: serde_json::Error) -> Self {
        Self::PackParseError { source }
    }
}
