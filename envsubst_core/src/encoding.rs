use std::collections::HashMap;
use std::fmt;
use std::fmt::Display;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::Diagnostics;
use crate::Options;
use crate::SubstError;
use crate::SubstResult;
use crate::substitute_with_options;

/// Suffix marking a data file that still contains placeholders.
pub const TEMPLATE_EXTENSION: &str = "tmpl";

/// A structured data format selected by name or file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Encoding {
	Json,
	Yaml,
	Toml,
}

impl Encoding {
	/// Look up an encoding by format name (`json`, `yaml`, `yml`, `toml`).
	/// Matching ignores case and surrounding whitespace.
	pub fn from_name(name: &str) -> SubstResult<Self> {
		match name.trim().to_ascii_lowercase().as_str() {
			"json" => Ok(Self::Json),
			"yaml" | "yml" => Ok(Self::Yaml),
			"toml" => Ok(Self::Toml),
			other => Err(SubstError::UnsupportedFormat(other.to_string())),
		}
	}

	/// Pick the encoding from the extension of `path`. A trailing `.tmpl` is
	/// skipped, so `app.yaml.tmpl` is YAML.
	pub fn from_path(path: &Path) -> SubstResult<Self> {
		let mut extension = path.extension();
		if extension.is_some_and(|ext| ext.eq_ignore_ascii_case(TEMPLATE_EXTENSION)) {
			extension = path.file_stem().map(Path::new).and_then(Path::extension);
		}

		match extension.and_then(|ext| ext.to_str()) {
			Some(ext) => Self::from_name(ext),
			None => Err(SubstError::UnsupportedFormat(path.display().to_string())),
		}
	}

	pub fn name(self) -> &'static str {
		match self {
			Self::Json => "json",
			Self::Yaml => "yaml",
			Self::Toml => "toml",
		}
	}

	/// Compact encoding of `value`. YAML and TOML have no compact form and
	/// match [`Encoding::encode_pretty`].
	pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> SubstResult<String> {
		let result = match self {
			Self::Json => serde_json::to_string(value).map_err(|e| e.to_string()),
			Self::Yaml => serde_yaml_ng::to_string(value).map_err(|e| e.to_string()),
			Self::Toml => toml::to_string(value).map_err(|e| e.to_string()),
		};

		result.map_err(|reason| self.encode_error(reason))
	}

	/// Indented encoding of `value`.
	pub fn encode_pretty<T: Serialize + ?Sized>(self, value: &T) -> SubstResult<String> {
		let result = match self {
			Self::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
			Self::Yaml => serde_yaml_ng::to_string(value).map_err(|e| e.to_string()),
			Self::Toml => toml::to_string_pretty(value).map_err(|e| e.to_string()),
		};

		result.map_err(|reason| self.encode_error(reason))
	}

	pub fn decode<T: DeserializeOwned>(self, content: &str) -> SubstResult<T> {
		let result = match self {
			Self::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
			Self::Yaml => serde_yaml_ng::from_str(content).map_err(|e| e.to_string()),
			Self::Toml => toml::from_str(content).map_err(|e| e.to_string()),
		};

		result.map_err(|reason| SubstError::Decode {
			format: self.to_string(),
			reason,
		})
	}

	pub fn decode_reader<T: DeserializeOwned, R: Read>(self, mut reader: R) -> SubstResult<T> {
		let mut content = String::new();
		reader.read_to_string(&mut content)?;
		self.decode(&content)
	}

	fn encode_error(self, reason: String) -> SubstError {
		SubstError::Encode {
			format: self.to_string(),
			reason,
		}
	}
}

impl Display for Encoding {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Read `input` in the format given by its extension and write it to
/// `output` in the format given by that extension. Parent directories of
/// `output` are created.
pub fn convert_file(input: &Path, output: &Path) -> SubstResult<()> {
	let from = Encoding::from_path(input)?;
	let content = std::fs::read_to_string(input)?;
	write_converted(&content, from, output)
}

/// Like [`convert_file`], substituting placeholders in `input` before it is
/// decoded. Returns true when any placeholder was unresolved.
#[allow(clippy::implicit_hasher)]
pub fn convert_template(
	input: &Path,
	output: &Path,
	vars: &HashMap<String, String>,
	options: Options,
	diagnostics: &dyn Diagnostics,
) -> SubstResult<bool> {
	let from = Encoding::from_path(input)?;
	let content = std::fs::read_to_string(input)?;
	let substitution = substitute_with_options(&content, vars, options, diagnostics);
	write_converted(&substitution.text, from, output)?;

	Ok(substitution.missing)
}

fn write_converted(content: &str, from: Encoding, output: &Path) -> SubstResult<()> {
	let to = Encoding::from_path(output)?;
	let value: serde_json::Value = from.decode(content)?;
	let encoded = to.encode_pretty(&value)?;

	if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(output, encoded)?;

	tracing::debug!(
		from = %from,
		to = %to,
		output = %output.display(),
		"converted data file"
	);

	Ok(())
}

/// Read the file at `path`, substitute its placeholders, and decode the
/// result using the format given by its extension.
///
/// Returns the decoded value and whether any placeholder was unresolved.
#[allow(clippy::implicit_hasher)]
pub fn load_template<T: DeserializeOwned>(
	path: &Path,
	vars: &HashMap<String, String>,
	options: Options,
	diagnostics: &dyn Diagnostics,
) -> SubstResult<(T, bool)> {
	let encoding = Encoding::from_path(path)?;
	let content = std::fs::read_to_string(path)?;
	let substitution = substitute_with_options(&content, vars, options, diagnostics);
	let value = encoding.decode(&substitution.text)?;

	Ok((value, substitution.missing))
}
