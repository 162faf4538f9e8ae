use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::io::BufRead;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use envsubst_cli::Commands;
use envsubst_cli::EnvsubstCli;
use envsubst_cli::OutputFormat;
use envsubst_cli::VarArgs;
use envsubst_core::CollectedDiagnostics;
use envsubst_core::LayeredResolver;
use envsubst_core::Options;
use envsubst_core::SubstConfig;
use envsubst_core::SubstError;
use envsubst_core::TracingDiagnostics;
use envsubst_core::UndefinedPolicy;
use envsubst_core::convert_file;
use envsubst_core::convert_template;
use envsubst_core::parse_assignment;
use envsubst_core::substitute_stream;
use envsubst_core::substitute_with_options;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
	let args = EnvsubstCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_tracing(args.verbose, use_color);

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Render {
			input,
			output,
			vars,
			remove_undefined,
			strict,
		}) => run_render(
			&args,
			input.as_deref(),
			output.as_deref(),
			vars,
			*remove_undefined,
			*strict,
		),
		Some(Commands::Check {
			input,
			vars,
			format,
			diff,
		}) => run_check(&args, input.as_deref(), vars, *format, *diff),
		Some(Commands::Convert {
			input,
			output,
			substitute,
			vars,
		}) => run_convert(&args, input, output, *substitute, vars),
		Some(Commands::Init) => run_init(&args),
		None => {
			eprintln!("No subcommand specified. Run `envsubst --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<SubstError>() {
			Ok(subst_err) => {
				let report: miette::Report = (*subst_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Log to stderr. `RUST_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: bool, use_color: bool) {
	let default_directive = if verbose {
		"envsubst=debug,envsubst_core=debug"
	} else {
		"envsubst=warn,envsubst_core=warn"
	};
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	tracing_subscriber::registry()
		.with(
			fmt::layer()
				.with_writer(io::stderr)
				.with_ansi(use_color)
				.with_target(verbose)
				.without_time(),
		)
		.with(filter)
		.init();
}

fn resolve_root(args: &EnvsubstCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Variables and options from the config file, with command line overrides
/// applied.
fn load_variables(
	args: &EnvsubstCli,
	var_args: &VarArgs,
) -> Result<(SubstConfig, HashMap<String, String>, Options), SubstError> {
	let root = resolve_root(args);
	let config = SubstConfig::load_or_default(&root)?;
	let mut vars = config.load_vars(&root)?;

	for assignment in &var_args.vars {
		let (name, value) = parse_assignment(assignment)?;
		vars.insert(name, value);
	}

	let mut options = config.options();
	if var_args.no_env {
		options.environment = false;
	}

	tracing::debug!(
		root = %root.display(),
		vars = vars.len(),
		environment = options.environment,
		"resolved variables"
	);

	Ok((config, vars, options))
}

fn is_stdin(input: Option<&Path>) -> bool {
	input.is_none_or(|path| path == Path::new("-"))
}

/// Whether `input` and `output` name the same existing file.
fn is_same_file(input: Option<&Path>, output: Option<&Path>) -> bool {
	let (Some(input), Some(output)) = (input.filter(|_| !is_stdin(input)), output) else {
		return false;
	};

	match (input.canonicalize(), output.canonicalize()) {
		(Ok(input), Ok(output)) => input == output,
		_ => false,
	}
}

fn open_input(input: Option<&Path>) -> Result<Box<dyn BufRead>, Box<dyn std::error::Error>> {
	match input {
		Some(path) if !is_stdin(input) => {
			let file = File::open(path)
				.map_err(|e| format!("failed to read `{}`: {e}", path.display()))?;
			Ok(Box::new(BufReader::new(file)))
		}
		_ => Ok(Box::new(io::stdin().lock())),
	}
}

fn read_input(input: Option<&Path>) -> Result<String, Box<dyn std::error::Error>> {
	let mut content = String::new();
	open_input(input)?.read_to_string(&mut content)?;
	Ok(content)
}

fn open_output(output: Option<&Path>) -> Result<Box<dyn Write>, Box<dyn std::error::Error>> {
	let Some(path) = output else {
		return Ok(Box::new(io::stdout().lock()));
	};

	if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
		std::fs::create_dir_all(parent)?;
	}
	let file =
		File::create(path).map_err(|e| format!("failed to write `{}`: {e}", path.display()))?;

	Ok(Box::new(BufWriter::new(file)))
}

fn run_render(
	args: &EnvsubstCli,
	input: Option<&Path>,
	output: Option<&Path>,
	var_args: &VarArgs,
	remove_undefined: bool,
	strict: bool,
) -> CliResult {
	let (config, vars, options) = load_variables(args, var_args)?;
	let policy = if remove_undefined {
		UndefinedPolicy::Remove
	} else {
		options.policy
	};

	let diagnostics = (TracingDiagnostics, CollectedDiagnostics::new());
	let resolver = if options.environment {
		LayeredResolver::with_environment(&vars, &diagnostics)
	} else {
		LayeredResolver::without_fallback(&vars, &diagnostics)
	};

	if is_same_file(input, output) {
		// Opening the output would truncate the input before it is read.
		let rendered = substitute_stream(open_input(input)?, Vec::new(), policy, &resolver)?;
		let mut writer = open_output(output)?;
		writer.write_all(&rendered)?;
		writer.flush()?;
	} else {
		substitute_stream(open_input(input)?, open_output(output)?, policy, &resolver)?;
	}

	if let Some(path) = output {
		tracing::debug!(output = %path.display(), "wrote rendered template");
	}

	let names = diagnostics.1.into_names();
	if (strict || config.strict) && !names.is_empty() {
		let report: miette::Report = SubstError::UnresolvedVariables(names).into();
		eprintln!("{report:?}");
		process::exit(1);
	}

	Ok(())
}

fn run_check(
	args: &EnvsubstCli,
	input: Option<&Path>,
	var_args: &VarArgs,
	format: OutputFormat,
	show_diff: bool,
) -> CliResult {
	let (_, vars, options) = load_variables(args, var_args)?;
	let template = read_input(input)?;
	let diagnostics = CollectedDiagnostics::new();
	let result = substitute_with_options(&template, &vars, options, &diagnostics);
	let names = diagnostics.into_names();
	let source = input
		.filter(|_| !is_stdin(input))
		.map_or_else(|| "<stdin>".to_string(), |path| path.display().to_string());

	match format {
		OutputFormat::Json => {
			let json = serde_json::json!({
				"ok": names.is_empty(),
				"file": source,
				"unresolved": &names,
			});
			println!("{}", serde_json::to_string_pretty(&json)?);
		}
		OutputFormat::Text => {
			if names.is_empty() {
				println!(
					"{} all placeholders in {source} resolve.",
					colored!("Check passed:", green)
				);
			} else {
				println!(
					"{} {} unresolved variable(s) in {source}:",
					colored!("Check failed:", red),
					names.len()
				);
				for name in &names {
					println!("  {}", colored!(format!("${{{name}}}"), yellow));
				}
			}
		}
	}

	if show_diff {
		print_diff(&template, &result.text);
	}

	if !names.is_empty() {
		process::exit(1);
	}

	Ok(())
}

fn run_convert(
	args: &EnvsubstCli,
	input: &Path,
	output: &Path,
	substitute: bool,
	var_args: &VarArgs,
) -> CliResult {
	if substitute {
		let (_, vars, options) = load_variables(args, var_args)?;
		let missing = convert_template(input, output, &vars, options, &TracingDiagnostics)?;
		if missing {
			eprintln!(
				"{} some placeholders in {} could not be resolved",
				colored!("warning:", yellow),
				input.display()
			);
		}
	} else {
		convert_file(input, output)?;
	}

	println!("Converted {} to {}", input.display(), output.display());

	Ok(())
}

fn run_init(args: &EnvsubstCli) -> CliResult {
	let root = resolve_root(args);
	let config_path = root.join("envsubst.toml");

	if let Some(existing) = SubstConfig::resolve_path(&root) {
		println!("Config file already exists: {}", existing.display());
		return Ok(());
	}

	let sample_config = "# envsubst configuration\n\n# Keep unresolved placeholders such as \
	                     ${NAME} in the output.\npreserve_undefined = true\n\n# Fall back to the \
	                     process environment for names not defined here.\nenvironment = \
	                     true\n\n# Fail `envsubst render` when a name cannot be resolved.\nstrict \
	                     = false\n\n# Files of variables (json, yaml or toml), merged in \
	                     order.\n# vars_files = [\"vars.yaml\"]\n\n[vars]\n# NAME = \"value\"\n";

	std::fs::write(&config_path, sample_config)?;
	println!("Created {}", config_path.display());
	println!();
	println!("Next steps:");
	println!("  1. Add variables to the [vars] table");
	println!("  2. Reference them in a template as $NAME or ${{NAME}}");
	println!("  3. Run `envsubst render <template>` to substitute them");

	Ok(())
}

/// Print a colored line diff between the template and its rendering.
fn print_diff(template: &str, rendered: &str) {
	let diff = TextDiff::from_lines(template, rendered);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
}
