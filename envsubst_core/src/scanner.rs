use std::convert::Infallible;
use std::io;

use unicode_properties::GeneralCategory;
use unicode_properties::GeneralCategoryGroup;
use unicode_properties::UnicodeGeneralCategory;

use crate::resolver::Resolve;

/// The character introducing a placeholder.
pub const SIGIL: char = '$';

const BRACE_OPEN: char = '{';
const BRACE_CLOSE: char = '}';

/// Context states for the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
	/// Copying characters straight to the sink.
	Initial,
	/// A sigil was read and a bare name (`$NAME`) may follow.
	ReadingName,
	/// `${` was read and a braced name (`${NAME}`) is being collected.
	ReadingBracedName,
}

/// How a name token ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenStatus {
	/// Terminated by a valid delimiter.
	Complete,
	/// Terminated by end of input or by an invalid character inside braces.
	Incomplete,
}

/// What to emit for a placeholder whose name resolves to an empty string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UndefinedPolicy {
	/// Emit nothing.
	#[default]
	Remove,
	/// Re-emit the placeholder exactly as written (`$NAME` or `${NAME}`).
	Preserve,
}

impl UndefinedPolicy {
	pub fn from_preserve(preserve_undefined: bool) -> Self {
		if preserve_undefined {
			Self::Preserve
		} else {
			Self::Remove
		}
	}
}

/// Output target of a substitution pass, written one character at a time.
pub trait Sink {
	type Error;

	fn put_char(&mut self, ch: char) -> Result<(), Self::Error>;

	fn put_str(&mut self, text: &str) -> Result<(), Self::Error> {
		for ch in text.chars() {
			self.put_char(ch)?;
		}

		Ok(())
	}
}

impl Sink for String {
	type Error = Infallible;

	fn put_char(&mut self, ch: char) -> Result<(), Self::Error> {
		self.push(ch);
		Ok(())
	}

	fn put_str(&mut self, text: &str) -> Result<(), Self::Error> {
		self.push_str(text);
		Ok(())
	}
}

impl<S: Sink + ?Sized> Sink for &mut S {
	type Error = S::Error;

	fn put_char(&mut self, ch: char) -> Result<(), Self::Error> {
		(**self).put_char(ch)
	}

	fn put_str(&mut self, text: &str) -> Result<(), Self::Error> {
		(**self).put_str(text)
	}
}

/// Adapts an [`io::Write`] into a [`Sink`], UTF-8 encoding each character.
#[derive(Debug)]
pub struct IoSink<W> {
	writer: W,
}

impl<W: io::Write> IoSink<W> {
	pub fn new(writer: W) -> Self {
		Self { writer }
	}

	pub fn into_inner(self) -> W {
		self.writer
	}
}

impl<W: io::Write> Sink for IoSink<W> {
	type Error = io::Error;

	fn put_char(&mut self, ch: char) -> Result<(), Self::Error> {
		let mut encoded = [0; 4];
		self.writer.write_all(ch.encode_utf8(&mut encoded).as_bytes())
	}

	fn put_str(&mut self, text: &str) -> Result<(), Self::Error> {
		self.writer.write_all(text.as_bytes())
	}
}

/// Returns true when `ch` may appear in a variable name: a Unicode letter
/// (`L*`), `_`, or after the first character a decimal digit (`Nd`).
/// Other numerics such as `²`, `½` or `Ⅻ` are not name characters.
pub fn is_name_char(ch: char, is_first: bool) -> bool {
	if ch == '_' || ch.general_category_group() == GeneralCategoryGroup::Letter {
		return true;
	}

	!is_first && ch.general_category() == GeneralCategory::DecimalNumber
}

/// Single-pass placeholder scanner.
///
/// Characters are pushed in with [`Scanner::feed`] and the resulting text is
/// written to the sink as soon as it is known. Malformed or truncated
/// placeholders are reproduced literally, so scanning never fails on input
/// syntax; the only error is one raised by the sink.
///
/// A scanner holds the state of exactly one pass. [`Scanner::finish`]
/// consumes it and flushes any trailing partial token.
pub struct Scanner<'r, S, R: ?Sized> {
	state: State,
	/// Name characters collected since the sigil. Only non-empty while
	/// reading a name.
	buffer: String,
	sink: S,
	policy: UndefinedPolicy,
	resolver: &'r R,
}

impl<'r, S, R> Scanner<'r, S, R>
where
	S: Sink,
	R: Resolve + ?Sized,
{
	pub fn new(sink: S, policy: UndefinedPolicy, resolver: &'r R) -> Self {
		Self {
			state: State::Initial,
			buffer: String::new(),
			sink,
			policy,
			resolver,
		}
	}

	/// Consume one input character.
	pub fn feed(&mut self, ch: char) -> Result<(), S::Error> {
		// Leaving a name on an unexpected character flushes the token and
		// then handles the same character again from `Initial`.
		loop {
			match self.state {
				State::Initial => {
					if ch == SIGIL {
						self.state = State::ReadingName;
						return Ok(());
					}

					return self.sink.put_char(ch);
				}
				State::ReadingName => {
					if ch == BRACE_OPEN && self.buffer.is_empty() {
						self.state = State::ReadingBracedName;
						return Ok(());
					}

					if is_name_char(ch, self.buffer.is_empty()) {
						self.buffer.push(ch);
						return Ok(());
					}

					self.flush(TokenStatus::Complete)?;
				}
				State::ReadingBracedName => {
					if is_name_char(ch, self.buffer.is_empty()) {
						self.buffer.push(ch);
						return Ok(());
					}

					if ch == BRACE_CLOSE {
						return self.flush(TokenStatus::Complete);
					}

					self.flush(TokenStatus::Incomplete)?;
				}
			}
		}
	}

	/// Signal end of input, flushing a trailing `$`, `${` or partial name,
	/// and hand back the sink.
	pub fn finish(mut self) -> Result<S, S::Error> {
		if self.state != State::Initial {
			self.flush(TokenStatus::Incomplete)?;
		}

		Ok(self.sink)
	}

	fn flush(&mut self, status: TokenStatus) -> Result<(), S::Error> {
		let result = if self.buffer.is_empty() {
			let text = self.standalone_text(status);
			self.sink.put_str(text)
		} else if self.state == State::ReadingBracedName && status == TokenStatus::Incomplete {
			self.sink
				.put_str("${")
				.and_then(|()| self.sink.put_str(&self.buffer))
		} else {
			let value = self.resolve_buffer();
			self.sink.put_str(&value)
		};

		self.state = State::Initial;
		self.buffer.clear();

		result
	}

	/// Literal text for a sigil that captured no name.
	fn standalone_text(&self, status: TokenStatus) -> &'static str {
		match (self.state, status) {
			(State::ReadingName, _) => "$",
			(_, TokenStatus::Incomplete) => "${",
			(_, TokenStatus::Complete) => "${}",
		}
	}

	fn resolve_buffer(&self) -> String {
		let value = self.resolver.resolve(&self.buffer);

		if value.is_empty() && self.policy == UndefinedPolicy::Preserve {
			return match self.state {
				State::ReadingBracedName => format!("${{{}}}", self.buffer),
				_ => format!("${}", self.buffer),
			};
		}

		value
	}
}
