use std::io::Write;

use miette::IntoDiagnostic;
use scry_remote::{SpecSet, display_path};

/// Runs the subcommand for checking event specs.
///
/// The specs are written back with their paths normalized the way they are
/// sent to the program, so redundant or dropped wildcards show up.
pub fn evaluate_specs(specs: &SpecSet, mut output: impl Write) -> miette::Result<()> {
    for (index, spec) in specs.to_event_specs().iter().enumerate() {
        write!(output, "spec #{index}").into_diagnostic()?;

        if let Some(thread) = spec.thread() {
            write!(output, " thread={thread:?}").into_diagnostic()?;
        }

        if !spec.parent().is_empty() {
            write!(output, " parent={:?}", display_path(spec.parent())).into_diagnostic()?;
        }

        writeln!(output).into_diagnostic()?;

        if spec.events().is_empty() {
            writeln!(output, "    (no events)").into_diagnostic()?;
        }

        for event in spec.events() {
            writeln!(output, "    event {:?}", display_path(event)).into_diagnostic()?;
        }
    }

    Ok(())
}
