use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum SubstError {
	#[error(transparent)]
	#[diagnostic(code(envsubst::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(envsubst::config_parse),
		help("check that envsubst.toml is valid TOML with an optional [vars] table")
	)]
	ConfigParse(String),

	#[error("failed to load variables file `{path}`: {reason}")]
	#[diagnostic(code(envsubst::data_file))]
	DataFile { path: String, reason: String },

	#[error("unsupported data format: `{0}`")]
	#[diagnostic(
		code(envsubst::unsupported_format),
		help("file extension must be one of .json, .yml, .yaml or .toml")
	)]
	UnsupportedFormat(String),

	#[error("failed to encode {format}: {reason}")]
	#[diagnostic(code(envsubst::encode))]
	Encode { format: String, reason: String },

	#[error("failed to decode {format}: {reason}")]
	#[diagnostic(code(envsubst::decode))]
	Decode { format: String, reason: String },

	#[error("invalid variable assignment: `{0}`")]
	#[diagnostic(
		code(envsubst::invalid_assignment),
		help("use KEY=VALUE where KEY starts with a letter or underscore")
	)]
	InvalidAssignment(String),

	#[error("unresolved variables: {}", .0.join(", "))]
	#[diagnostic(
		code(envsubst::unresolved_variables),
		help("define the variables in envsubst.toml, pass them with --var, or export them")
	)]
	UnresolvedVariables(Vec<String>),
}

pub type SubstResult<T> = Result<T, SubstError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
