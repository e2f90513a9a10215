use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("Failed to parse KDL")]
    #[diagnostic(code(keychord::config::parse_error))]
    ParseError {
        #[source_code]
        src: String,
        #[label("here")]
        span: miette::SourceSpan,
        #[source]
        source: kdl::KdlError,
    },

    #[error("Invalid binding: {message}")]
    #[diagnostic(
        code(keychord::config::invalid_binding),
        help("a binding looks like `chord \"g\" \"b\" clear-stack=true`")
    )]
    InvalidBinding {
        message: String,
        #[source_code]
        src: String,
        #[label("this chord")]
        span: miette::SourceSpan,
    },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(keychord::config::invalid))]
    Invalid { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
