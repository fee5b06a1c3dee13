use std::io::{self, Write};

use crate::remote::Remote;
use crate::transport::Transport;

impl<T: Transport> Remote<T> {
    /// Writes the unresolved events of the registered specs.
    pub fn write_unresolved_events(&self, mut out: impl Write) -> io::Result<()> {
        let unresolved = self.unresolved_events();

        writeln!(out, "Unresolved events ({}):", unresolved.len())?;
        for event in unresolved {
            writeln!(out, "  - {event}")?;
        }

        Ok(())
    }

    /// Writes the names of the known threads.
    pub fn write_known_threads(&self, mut out: impl Write) -> io::Result<()> {
        let threads = self.known_threads();

        writeln!(out, "Known threads ({}):", threads.len())?;
        for thread in threads {
            writeln!(out, "  - {thread}")?;
        }

        Ok(())
    }

    /// Writes the known event kinds as `[kind] thread : path`, sorted by
    /// thread (ignoring case), then kind, then path.
    pub fn write_known_event_kinds(&self, mut out: impl Write) -> io::Result<()> {
        let mut kinds = self.known_event_kinds();
        kinds.sort_by_cached_key(|info| {
            (info.thread.to_lowercase(), info.kind.as_str(), info.path.clone())
        });

        writeln!(out, "Known event kinds ({}):", kinds.len())?;
        for info in kinds {
            writeln!(
                out,
                "  - {:<11} {:<24} : {}",
                format!("[{}]", info.kind),
                info.thread,
                info.path.join("/")
            )?;
        }

        Ok(())
    }

    /// Writes the known remote commands, sorted by name (ignoring case).
    pub fn write_known_clis(&self, mut out: impl Write) -> io::Result<()> {
        let mut clis = self.known_clis();
        clis.sort_by_cached_key(|cli| cli.name.to_lowercase());

        writeln!(out, "Known CLIs ({}):", clis.len())?;
        for cli in clis {
            writeln!(out, "  - {} {}", cli.name, cli.param_spec)?;
            if !cli.description.is_empty() {
                writeln!(out, "      {}", cli.description)?;
            }
        }

        Ok(())
    }
}
