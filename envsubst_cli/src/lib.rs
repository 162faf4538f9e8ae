use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Substitute $NAME and ${NAME} placeholders from variables and the environment.",
	long_about = "envsubst replaces $NAME and ${NAME} placeholders in text with values from \
	              envsubst.toml, --var flags, and the process environment.\n\nMalformed \
	              placeholders are copied through unchanged. Unresolved placeholders are kept \
	              as written unless --remove-undefined is given.\n\nQuick start:\n  envsubst \
	              render app.yaml.tmpl -o app.yaml\n  envsubst check app.yaml.tmpl\n  envsubst \
	              convert app.yaml app.json --substitute"
)]
pub struct EnvsubstCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Directory containing `envsubst.toml`. Relative variables files are
	/// resolved against it.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

/// Variable sources shared by the commands that substitute.
#[derive(Args, Debug, Clone, Default)]
pub struct VarArgs {
	/// Define a variable as `KEY=VALUE`. Overrides the config file. May be
	/// repeated.
	#[arg(long = "var", short = 'e', value_name = "KEY=VALUE")]
	pub vars: Vec<String>,

	/// Do not fall back to the process environment.
	#[arg(long, default_value_t = false)]
	pub no_env: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Substitute placeholders in a file or stdin.
	///
	/// Reads INPUT (or stdin when omitted or `-`) and writes the result to
	/// `--output` (or stdout). Each unresolved name is logged once as a
	/// warning.
	Render {
		/// Template to read. Defaults to stdin.
		input: Option<PathBuf>,

		/// File to write. Defaults to stdout.
		#[arg(long, short)]
		output: Option<PathBuf>,

		#[command(flatten)]
		vars: VarArgs,

		/// Remove unresolved placeholders instead of keeping them.
		#[arg(long, default_value_t = false)]
		remove_undefined: bool,

		/// Exit with a non-zero status when any name is unresolved.
		#[arg(long, default_value_t = false)]
		strict: bool,
	},
	/// Report placeholders that cannot be resolved.
	///
	/// Exits with status 1 when at least one name is unresolved. Ideal for
	/// CI pipelines that render templates at deploy time.
	Check {
		/// Template to read. Defaults to stdin.
		input: Option<PathBuf>,

		#[command(flatten)]
		vars: VarArgs,

		/// Output format for check results.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,

		/// Show a line diff between the template and its rendering.
		#[arg(long, default_value_t = false)]
		diff: bool,
	},
	/// Convert a data file between JSON, YAML and TOML.
	///
	/// Formats are chosen by file extension (.json, .yml, .yaml, .toml).
	Convert {
		/// File to read.
		input: PathBuf,

		/// File to write. Parent directories are created.
		output: PathBuf,

		/// Substitute placeholders in INPUT before converting.
		#[arg(long, default_value_t = false)]
		substitute: bool,

		#[command(flatten)]
		vars: VarArgs,
	},
	/// Create a sample `envsubst.toml` in the project root.
	///
	/// If the file already exists this command is a no-op and exits
	/// successfully.
	Init,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text.
	#[default]
	Text,
	/// Machine-readable JSON.
	Json,
}
