use std::fmt;

/// One level of an event path filter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathToken {
    /// A literal elem name.
    Name(String),

    /// `*`: exactly one path level.
    AnyOne,

    /// `**`: zero or more path levels.
    AnyDepth,

    /// `.`: the path is relative to the root.
    Root,
}

impl fmt::Display for PathToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::AnyOne => f.write_str("*"),
            Self::AnyDepth => f.write_str("**"),
            Self::Root => f.write_str("."),
        }
    }
}

/// Tokenizes and normalizes a `/`-separated path filter.
///
/// - Empty tokens are skipped, other tokens are trimmed.
/// - `**` is dropped when leading, or when following another `**`.
/// - `.` is dropped unless leading.
/// - A leading `./**` is removed, as it does not constrain anything.
pub fn parse_path(path: &str) -> Vec<PathToken> {
    let mut tokens = Vec::new();

    for token in path.split('/').map(str::trim).filter(|t| !t.is_empty()) {
        let token = match token {
            "*" => PathToken::AnyOne,
            "**" => {
                if matches!(tokens.last(), None | Some(PathToken::AnyDepth)) {
                    continue;
                }
                PathToken::AnyDepth
            }
            "." => {
                if !tokens.is_empty() {
                    continue;
                }
                PathToken::Root
            }
            name => PathToken::Name(name.to_owned()),
        };

        tokens.push(token);
    }

    if tokens.starts_with(&[PathToken::Root, PathToken::AnyDepth]) {
        tokens.drain(..2);
    }

    tokens
}

/// Renders path tokens back to their `/`-separated form.
pub fn display_path(tokens: &[PathToken]) -> String {
    tokens
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("/")
}

/// Declaration of the events a script is interested in.
///
/// All the events of a spec share the same (optional) thread and parent
/// filters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventSpec {
    thread: Option<String>,
    parent: Vec<PathToken>,
    events: Vec<Vec<PathToken>>,
}

impl EventSpec {
    /// Creates a spec matching the given event paths, on any thread and
    /// with any parent.
    ///
    /// Paths which are empty after normalization are ignored.
    pub fn new<I, S>(events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let events = events
            .into_iter()
            .map(|path| parse_path(path.as_ref()))
            .filter(|tokens| !tokens.is_empty())
            .collect();

        Self {
            thread: None,
            parent: Vec::new(),
            events,
        }
    }

    /// Restricts the spec to the events of the given thread.
    pub fn with_thread(mut self, thread: impl Into<String>) -> Self {
        self.thread = Some(thread.into());
        self
    }

    /// Restricts the spec to the events having the given parent path.
    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = parse_path(parent);
        self
    }

    /// Returns the thread filter, if any.
    pub fn thread(&self) -> Option<&str> {
        self.thread.as_deref()
    }

    /// Returns the normalized parent path filter (empty if unconstrained).
    pub fn parent(&self) -> &[PathToken] {
        &self.parent
    }

    /// Returns the normalized event path filters.
    pub fn events(&self) -> &[Vec<PathToken>] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::{EventSpec, PathToken, display_path, parse_path};

    fn name(s: &str) -> PathToken {
        PathToken::Name(s.to_owned())
    }

    #[test]
    fn root_any_depth_is_no_constraint() {
        assert_eq!(parse_path("./**/foo"), parse_path("foo"));
        assert_eq!(parse_path("./**"), vec![]);
    }

    #[test]
    fn consecutive_any_depth_collapse() {
        assert_eq!(
            parse_path("a/**/**/b"),
            vec![name("a"), PathToken::AnyDepth, name("b")]
        );
        assert_eq!(parse_path("a/**/**/b"), parse_path("a/**/b"));
    }

    #[test]
    fn wildcards_are_single_tokens() {
        assert_eq!(parse_path("a/*"), vec![name("a"), PathToken::AnyOne]);
        assert_eq!(parse_path("a/**"), vec![name("a"), PathToken::AnyDepth]);
        assert_eq!(parse_path("*"), vec![PathToken::AnyOne]);
    }

    #[test]
    fn misplaced_wildcards_are_dropped() {
        assert_eq!(parse_path("**/foo"), vec![name("foo")]);
        assert_eq!(parse_path("a/./b"), vec![name("a"), name("b")]);
        assert_eq!(parse_path("./a"), vec![PathToken::Root, name("a")]);
    }

    #[test]
    fn tokens_are_trimmed() {
        assert_eq!(
            parse_path(" Main //  Add fruit / "),
            vec![name("Main"), name("Add fruit")]
        );
        assert_eq!(display_path(&parse_path(" Main //  * / ")), "Main/*");
    }

    #[test]
    fn spec_drops_empty_paths() {
        let spec = EventSpec::new(["Add fruit", "./**", ""])
            .with_thread("Control")
            .with_parent("./Main");

        assert_eq!(spec.thread(), Some("Control"));
        assert_eq!(spec.parent(), [PathToken::Root, name("Main")]);
        assert_eq!(spec.events(), [vec![name("Add fruit")]]);
    }
}
