use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::Encoding;
use crate::Options;
use crate::SubstError;
use crate::SubstResult;
use crate::UndefinedPolicy;
use crate::scanner::is_name_char;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"envsubst.toml",
	".envsubst.toml",
	".config/envsubst.toml",
];

/// Configuration loaded from an `envsubst.toml` file.
///
/// ```toml
/// preserve_undefined = true
/// environment = true
/// strict = false
/// vars_files = ["vars.yaml", "secrets.json"]
///
/// [vars]
/// NAME = "Ann"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SubstConfig {
	/// Leave unresolved placeholders in the output exactly as written.
	/// Defaults to `true`.
	#[serde(default = "default_true")]
	pub preserve_undefined: bool,
	/// Fall back to the process environment for names not defined in
	/// `vars` or `vars_files`. Defaults to `true`.
	#[serde(default = "default_true")]
	pub environment: bool,
	/// Treat unresolved names as an error.
	#[serde(default)]
	pub strict: bool,
	/// Files of variables (JSON, YAML or TOML maps), merged in order. Paths
	/// are relative to the config root.
	#[serde(default)]
	pub vars_files: Vec<PathBuf>,
	/// Inline variables. These win over anything read from `vars_files`.
	#[serde(default)]
	pub vars: HashMap<String, String>,
}

fn default_true() -> bool {
	true
}

impl Default for SubstConfig {
	fn default() -> Self {
		Self {
			preserve_undefined: true,
			environment: true,
			strict: false,
			vars_files: Vec::new(),
			vars: HashMap::new(),
		}
	}
}

/// A scalar read from a variables file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VarValue {
	String(String),
	Integer(i64),
	Float(f64),
	Bool(bool),
}

impl VarValue {
	fn into_string(self) -> String {
		match self {
			Self::String(value) => value,
			Self::Integer(value) => value.to_string(),
			Self::Float(value) => value.to_string(),
			Self::Bool(value) => value.to_string(),
		}
	}
}

impl SubstConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> SubstResult<Option<SubstConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config: SubstConfig =
			toml::from_str(&content).map_err(|e| SubstError::ConfigParse(e.to_string()))?;

		tracing::debug!(
			path = %config_path.display(),
			vars = config.vars.len(),
			vars_files = config.vars_files.len(),
			"loaded config"
		);

		Ok(Some(config))
	}

	/// Like [`SubstConfig::load`], falling back to defaults when no config
	/// file exists.
	pub fn load_or_default(root: &Path) -> SubstResult<SubstConfig> {
		Ok(Self::load(root)?.unwrap_or_default())
	}

	/// Read every file in `vars_files` and overlay the inline `vars`.
	pub fn load_vars(&self, root: &Path) -> SubstResult<HashMap<String, String>> {
		let mut vars = HashMap::new();

		for rel_path in &self.vars_files {
			vars.extend(read_vars_file(root, rel_path)?);
		}

		vars.extend(
			self.vars
				.iter()
				.map(|(name, value)| (name.clone(), value.clone())),
		);

		Ok(vars)
	}

	pub fn policy(&self) -> UndefinedPolicy {
		UndefinedPolicy::from_preserve(self.preserve_undefined)
	}

	pub fn options(&self) -> Options {
		Options {
			policy: self.policy(),
			environment: self.environment,
		}
	}
}

fn read_vars_file(root: &Path, rel_path: &Path) -> SubstResult<BTreeMap<String, String>> {
	let path_display = rel_path.display().to_string();
	let data_file_error = |reason: String| SubstError::DataFile {
		path: path_display.clone(),
		reason,
	};

	let encoding = Encoding::from_path(rel_path)?;
	let content =
		std::fs::read_to_string(root.join(rel_path)).map_err(|e| data_file_error(e.to_string()))?;
	let values: BTreeMap<String, VarValue> = encoding
		.decode(&content)
		.map_err(|e| data_file_error(e.to_string()))?;

	Ok(values
		.into_iter()
		.map(|(name, value)| (name, value.into_string()))
		.collect())
}

/// Parse a `KEY=VALUE` assignment. The key must be a valid variable name;
/// the value may be empty and may itself contain `=`.
pub fn parse_assignment(assignment: &str) -> SubstResult<(String, String)> {
	let Some((name, value)) = assignment.split_once('=') else {
		return Err(SubstError::InvalidAssignment(assignment.to_string()));
	};

	let mut chars = name.chars();
	let valid = chars.next().is_some_and(|first| is_name_char(first, true))
		&& chars.all(|ch| is_name_char(ch, false));

	if !valid {
		return Err(SubstError::InvalidAssignment(assignment.to_string()));
	}

	Ok((name.to_string(), value.to_string()))
}
