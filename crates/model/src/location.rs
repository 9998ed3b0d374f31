//! Element source locations.

use std::fmt;

/// Where a document node came from.
///
/// Locations here are synthetic (the core never parses a document format);
/// they exist so location reporting can be forwarded and compared like any
/// other observable.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct ElementLocation {
	/// Path of the containing document, empty when unknown.
	pub file: String,
	/// 1-based line; 0 when unknown.
	pub line: u32,
	/// 1-based column; 0 when unknown.
	pub column: u32,
}

impl ElementLocation {
	/// Builds a location.
	#[must_use]
	pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
		Self {
			file: file.into(),
			line,
			column,
		}
	}
}

impl fmt::Display for ElementLocation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.file.is_empty() {
			write!(f, "({},{})", self.line, self.column)
		} else {
			write!(f, "{} ({},{})", self.file, self.line, self.column)
		}
	}
}
