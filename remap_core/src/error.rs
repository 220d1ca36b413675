use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum RemapError {
	#[error(transparent)]
	#[diagnostic(code(remap::io_error))]
	Io(#[from] std::io::Error),

	#[error("rule configuration file not found: `{0}`")]
	#[diagnostic(
		code(remap::config_not_found),
		help("pass the path to a rule configuration document, or omit it to run without rules")
	)]
	ConfigNotFound(String),

	#[error("failed to parse rule configuration: {0}")]
	#[diagnostic(
		code(remap::config_parse),
		help("the rule configuration must be a valid JSON document")
	)]
	ConfigParse(String),

	#[error("`{0}` must be a list in the rule configuration")]
	#[diagnostic(code(remap::config_field_type))]
	ConfigFieldType(String),

	#[error("project directory not found: `{0}`")]
	#[diagnostic(code(remap::project_not_found))]
	ProjectNotFound(String),

	#[error("required document `{name}` missing from project `{project}`")]
	#[diagnostic(
		code(remap::missing_document),
		help("a draft project must contain both draft_meta_info.json and draft_info.json")
	)]
	MissingDocument { name: String, project: String },

	#[error("failed to parse project document `{path}`: {reason}")]
	#[diagnostic(code(remap::document_parse))]
	DocumentParse { path: String, reason: String },

	#[error("document processing failed: {0}")]
	#[diagnostic(code(remap::engine))]
	Engine(String),
}

pub type RemapResult<T> = Result<T, RemapError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;

/// Why a single rule was dropped during compilation. Rule-level failures are
/// never fatal to the engine — the offending rule is logged and skipped.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum RuleError {
	#[error("unknown rule type `{0}`")]
	UnknownType(String),

	#[error("missing required `pattern`")]
	MissingPattern,

	#[error("invalid pattern `{pattern}`: {reason}")]
	InvalidPattern { pattern: String, reason: String },

	#[error("pattern must contain at least one capture group for the placeholder key")]
	MissingCaptureGroup,

	#[error("missing required `source`")]
	MissingSource,

	#[error("unknown source `{0}`")]
	UnknownSource(String),
}
