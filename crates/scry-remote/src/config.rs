use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

use crate::spec::EventSpec;

/// Error when loading a KDL configuration.
#[derive(thiserror::Error, miette::Diagnostic, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}")]
    Io {
        /// Path of the configuration file.
        path: String,

        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid KDL, or does not match the schema.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] knus::Error),
}

/// Parses a KDL configuration.
///
/// If `arg` ends with `.kdl`, it is treated as a path to a configuration file.
/// Otherwise it is directly parsed as inline KDL.
fn parse_path_or_content<T>(arg: &str) -> Result<T, ConfigError>
where
    T: knus::DecodeChildren<knus::span::Span>,
{
    let path = Path::new(arg);

    let config = if let Some((filename, "kdl")) = path
        .file_name()
        .and_then(OsStr::to_str)
        .zip(path.extension().and_then(OsStr::to_str))
    {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: arg.to_owned(),
            source,
        })?;
        knus::parse(filename, &content)?
    } else {
        knus::parse("<content>", arg)?
    };

    Ok(config)
}

/// Configuration of the remote control.
#[derive(Clone, Debug, PartialEq, Eq, knus::Decode)]
pub struct RemoteConfig {
    /// Port where the program connects.
    #[knus(child, default = 59059, unwrap(argument))]
    pub port: u16,

    /// Maximum wait for a program connection, in milliseconds.
    #[knus(child, default = 5000, unwrap(argument))]
    pub connection_timeout_ms: u64,

    /// Timeout of internal remote calls, in milliseconds.
    #[knus(child, default = 5000, unwrap(argument))]
    pub cli_timeout_ms: u64,

    /// Maximum latency of notification batches, in milliseconds.
    #[knus(child, default = 10, unwrap(argument))]
    pub max_latency_ms: u64,

    /// Grace period given to a stopping program before it is killed, in
    /// milliseconds.
    #[knus(child, default = 500, unwrap(argument))]
    pub stop_grace_ms: u64,

    /// Lookup file of the external strings.
    #[knus(child, unwrap(argument))]
    pub external_strings: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            port: 59059,
            connection_timeout_ms: 5000,
            cli_timeout_ms: 5000,
            max_latency_ms: 10,
            stop_grace_ms: 500,
            external_strings: None,
        }
    }
}

impl RemoteConfig {
    /// Parses a KDL configuration. `name` is used in diagnostics.
    pub fn parse(name: &str, text: &str) -> Result<Self, ConfigError> {
        Ok(knus::parse(name, text)?)
    }

    /// Parses a KDL configuration, from a file if `arg` ends with `.kdl`, or
    /// inline otherwise.
    pub fn from_path_or_content(arg: &str) -> Result<Self, ConfigError> {
        parse_path_or_content(arg)
    }

    /// Returns the default connection timeout.
    pub const fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    /// Returns the timeout of internal remote calls.
    pub const fn cli_timeout(&self) -> Duration {
        Duration::from_millis(self.cli_timeout_ms)
    }

    /// Returns the maximum latency of notification batches.
    pub const fn max_latency(&self) -> Duration {
        Duration::from_millis(self.max_latency_ms)
    }

    /// Returns the stop grace period.
    pub const fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}

/// Set of event specs.
#[derive(Clone, Debug, PartialEq, Eq, knus::Decode)]
pub struct SpecSet {
    /// Declared specs.
    #[knus(children(name = "spec"))]
    pub specs: Vec<SpecDecl>,
}

impl SpecSet {
    /// Parses a KDL spec set. `name` is used in diagnostics.
    pub fn parse(name: &str, text: &str) -> Result<Self, ConfigError> {
        Ok(knus::parse(name, text)?)
    }

    /// Parses a KDL spec set, from a file if `arg` ends with `.kdl`, or
    /// inline otherwise.
    pub fn from_path_or_content(arg: &str) -> Result<Self, ConfigError> {
        parse_path_or_content(arg)
    }

    /// Converts the declarations into event specs.
    pub fn to_event_specs(&self) -> Vec<EventSpec> {
        self.specs.iter().map(SpecDecl::to_event_spec).collect()
    }
}

/// Declaration of an event spec.
#[derive(Clone, Debug, PartialEq, Eq, knus::Decode)]
pub struct SpecDecl {
    /// Thread filter.
    #[knus(property)]
    pub thread: Option<String>,

    /// Parent path filter.
    #[knus(property)]
    pub parent: Option<String>,

    /// Event path filters.
    #[knus(children(name = "event"))]
    pub events: Vec<EventDecl>,
}

impl SpecDecl {
    /// Converts the declaration into an event spec.
    pub fn to_event_spec(&self) -> EventSpec {
        let spec = EventSpec::new(self.events.iter().map(|event| event.path.as_str()));

        let spec = match &self.thread {
            Some(thread) => spec.with_thread(thread.as_str()),
            None => spec,
        };

        match &self.parent {
            Some(parent) => spec.with_parent(parent),
            None => spec,
        }
    }
}

/// Declaration of an event path filter.
#[derive(Clone, Debug, PartialEq, Eq, knus::Decode)]
pub struct EventDecl {
    /// Path filter.
    #[knus(argument)]
    pub path: String,
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use super::{EventDecl, RemoteConfig, SpecDecl, SpecSet};
    use crate::spec::{EventSpec, PathToken};

    #[test]
    fn parse_remote_config_defaults() {
        let config = RemoteConfig::parse("<content>", "")
            .map_err(miette::Report::new)
            .expect("parse kdl");

        assert_eq!(config, RemoteConfig::default());
        assert_eq!(config.stop_grace(), Duration::from_millis(500));
    }

    #[test]
    fn parse_remote_config() {
        let config = RemoteConfig::parse(
            "<content>",
            indoc::indoc! {r#"
                port 4242
                connection-timeout-ms 100
                external-strings "lookup.txt"
            "#},
        )
        .map_err(miette::Report::new)
        .expect("parse kdl");

        assert_eq!(
            config,
            RemoteConfig {
                port: 4242,
                connection_timeout_ms: 100,
                external_strings: Some("lookup.txt".to_owned()),
                ..RemoteConfig::default()
            }
        );
        assert_eq!(config.connection_timeout(), Duration::from_millis(100));
    }

    #[test]
    fn parse_remote_config_rejects_unknown_nodes() {
        assert!(RemoteConfig::parse("<content>", "colour \"blue\"").is_err());
    }

    #[test]
    fn parse_spec_set() {
        let set = SpecSet::parse(
            "<content>",
            indoc::indoc! {r#"
                spec thread="Control" parent="Main" {
                    event "Add fruit"
                    event "./**/Remove fruit"
                }
                spec {
                    event "*/lock"
                }
            "#},
        )
        .map_err(miette::Report::new)
        .expect("parse kdl");

        assert_eq!(
            set.specs[0],
            SpecDecl {
                thread: Some("Control".to_owned()),
                parent: Some("Main".to_owned()),
                events: vec![
                    EventDecl { path: "Add fruit".to_owned() },
                    EventDecl { path: "./**/Remove fruit".to_owned() },
                ],
            }
        );

        let specs = set.to_event_specs();

        assert_eq!(
            specs[0],
            EventSpec::new(["Add fruit", "Remove fruit"])
                .with_thread("Control")
                .with_parent("Main")
        );
        assert_eq!(specs[1].thread(), None);
        assert_eq!(
            specs[1].events(),
            [vec![PathToken::AnyOne, PathToken::Name("lock".to_owned())]]
        );
    }

    #[test]
    fn spec_set_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".kdl")
            .tempfile()
            .expect("tempfile");
        writeln!(file, "spec {{\n    event \"Add fruit\"\n}}").expect("write");

        let path = file.path().to_str().expect("utf-8 path");
        let set = SpecSet::from_path_or_content(path)
            .map_err(miette::Report::new)
            .expect("parse kdl");

        assert_eq!(set.specs.len(), 1);
        assert!(SpecSet::from_path_or_content("missing-file.kdl").is_err());
    }
}
