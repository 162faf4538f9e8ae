use std::collections::HashMap;
use std::convert::Infallible;
use std::io::BufRead;
use std::io::Write;

use crate::Diagnostics;
use crate::IoSink;
use crate::LayeredResolver;
use crate::Resolve;
use crate::Scanner;
use crate::Sink;
use crate::SubstResult;
use crate::UndefinedPolicy;

/// Output of a substitution pass that tracks unresolved names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
	/// The substituted text.
	pub text: String,
	/// True when at least one referenced name could not be resolved.
	pub missing: bool,
}

/// Settings for a variables-backed substitution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
	/// What to emit for unresolved placeholders.
	pub policy: UndefinedPolicy,
	/// Fall back to the process environment for names missing from the
	/// variable map.
	pub environment: bool,
}

impl Default for Options {
	fn default() -> Self {
		Self {
			policy: UndefinedPolicy::Preserve,
			environment: true,
		}
	}
}

/// Feed every character of `input` through a fresh scanner writing to
/// `sink`. Stops at the first sink error.
pub fn substitute_chars<I, S, R>(
	input: I,
	sink: S,
	policy: UndefinedPolicy,
	resolver: &R,
) -> Result<S, S::Error>
where
	I: IntoIterator<Item = char>,
	S: Sink,
	R: Resolve + ?Sized,
{
	let mut scanner = Scanner::new(sink, policy, resolver);

	for ch in input {
		scanner.feed(ch)?;
	}

	scanner.finish()
}

/// Replace every `$NAME` and `${NAME}` in `input` with the value returned by
/// `resolver`.
///
/// When `preserve_undefined` is true, placeholders that resolve to an empty
/// string are left in the output exactly as written; otherwise they are
/// removed.
///
/// ```rust
/// use envsubst_core::substitute;
///
/// let text = substitute("Hello ${NAME}!", false, &|name: &str| {
/// 	if name == "NAME" { "Ann".to_string() } else { String::new() }
/// });
/// assert_eq!(text, "Hello Ann!");
/// ```
pub fn substitute<R>(input: &str, preserve_undefined: bool, resolver: &R) -> String
where
	R: Resolve + ?Sized,
{
	let policy = UndefinedPolicy::from_preserve(preserve_undefined);
	let output = String::with_capacity(input.len());

	into_ok(substitute_chars(input.chars(), output, policy, resolver))
}

/// Stream `reader` through the scanner into `writer`.
///
/// Input is decoded as UTF-8 one line at a time. A read or write failure
/// aborts the pass; output already written must be treated as invalid.
pub fn substitute_stream<B, W, R>(
	mut reader: B,
	writer: W,
	policy: UndefinedPolicy,
	resolver: &R,
) -> SubstResult<W>
where
	B: BufRead,
	W: Write,
	R: Resolve + ?Sized,
{
	let mut scanner = Scanner::new(IoSink::new(writer), policy, resolver);
	let mut line = String::new();

	loop {
		line.clear();
		if reader.read_line(&mut line)? == 0 {
			break;
		}

		for ch in line.chars() {
			scanner.feed(ch)?;
		}
	}

	let mut writer = scanner.finish()?.into_inner();
	writer.flush()?;

	Ok(writer)
}

/// Substitute from `vars` with the process environment as fallback,
/// preserving unresolved placeholders.
///
/// Each unresolved name is reported to `diagnostics` once.
#[allow(clippy::implicit_hasher)]
pub fn substitute_vars(
	input: &str,
	vars: &HashMap<String, String>,
	diagnostics: &dyn Diagnostics,
) -> Substitution {
	substitute_with_options(input, vars, Options::default(), diagnostics)
}

/// Substitute from `vars` using the policy and fallback chosen in `options`.
#[allow(clippy::implicit_hasher)]
pub fn substitute_with_options(
	input: &str,
	vars: &HashMap<String, String>,
	options: Options,
	diagnostics: &dyn Diagnostics,
) -> Substitution {
	let resolver = if options.environment {
		LayeredResolver::with_environment(vars, diagnostics)
	} else {
		LayeredResolver::without_fallback(vars, diagnostics)
	};

	let output = String::with_capacity(input.len());
	let text = into_ok(substitute_chars(
		input.chars(),
		output,
		options.policy,
		&resolver,
	));
	let missing = resolver.missing();

	tracing::debug!(
		input_len = input.len(),
		output_len = text.len(),
		missing,
		"substitution pass complete"
	);

	Substitution { text, missing }
}

fn into_ok<T>(result: Result<T, Infallible>) -> T {
	match result {
		Ok(value) => value,
		Err(never) => match never {},
	}
}
