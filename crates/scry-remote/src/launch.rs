use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use crate::session::ConnectOptions;

/// A builder of the program to launch, and of how to connect to it.
#[derive(Debug)]
pub struct LaunchOptions {
    /// Program to launch.
    pub program: PathBuf,

    /// Program arguments.
    pub args: Vec<String>,

    /// Environment variables set (`Some`) or hidden (`None`) for the
    /// program.
    pub env: BTreeMap<String, Option<String>>,

    /// Whether the program starts from the environment of this process.
    pub inherit_env: bool,

    /// Working directory of the program.
    pub current_dir: Option<PathBuf>,

    /// Whether stdout and stderr are captured, instead of inherited.
    pub capture_output: bool,

    /// Connection options.
    pub connect: ConnectOptions,
}

impl LaunchOptions {
    /// Options for launching `program` (searched in `PATH` when relative)
    /// without arguments, in the environment and working directory of this
    /// process. Its output is not captured, and it connects with the default
    /// [ConnectOptions].
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            inherit_env: true,
            current_dir: None,
            capture_output: false,
            connect: ConnectOptions::new(),
        }
    }

    /// Adds an argument to pass to the program.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Adds multiple arguments to pass to the program.
    pub fn args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        args.into_iter().fold(self, |opts, arg| opts.arg(arg))
    }

    /// Sets an environment variable of the program, over the inherited one.
    pub fn env(mut self, key: impl Into<String>, val: impl Into<String>) -> Self {
        self.env.insert(key.into(), Some(val.into()));
        self
    }

    /// Hides a variable from the program, whether inherited or set earlier.
    pub fn without_env(mut self, key: impl Into<String>) -> Self {
        self.env.insert(key.into(), None);
        self
    }

    /// Starts the program with only the variables set on these options.
    pub const fn isolated_env(mut self) -> Self {
        self.inherit_env = false;
        self
    }

    /// Sets the working directory of the program.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Captures stdout and stderr of the program, see
    /// [take_stdout_lines](crate::Remote::take_stdout_lines).
    pub const fn capture_output(mut self, capture: bool) -> Self {
        self.capture_output = capture;
        self
    }

    /// See [ConnectOptions::record_file].
    pub fn record_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.connect = self.connect.record_file(path);
        self
    }

    /// See [ConnectOptions::pass_first_freeze_point].
    pub fn pass_first_freeze_point(mut self, pass: bool) -> Self {
        self.connect = self.connect.pass_first_freeze_point(pass);
        self
    }

    /// See [ConnectOptions::quit_cli].
    pub fn quit_cli(mut self, command: impl Into<String>) -> Self {
        self.connect = self.connect.quit_cli(command);
        self
    }

    /// See [ConnectOptions::connection_timeout].
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connect = self.connect.connection_timeout(timeout);
        self
    }

    pub(crate) fn to_command(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.program);

        command.args(&self.args).kill_on_drop(true);

        if !self.inherit_env {
            command.env_clear();
        }
        for (key, val) in &self.env {
            match val {
                Some(val) => command.env(key, val),
                None => command.env_remove(key),
            };
        }

        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }

        if self.capture_output {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
        }

        command
    }
}
