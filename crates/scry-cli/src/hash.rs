use std::io::Write;

use miette::IntoDiagnostic;
use scry_remote::{HashWidth, hash_string, placeholder};

/// Runs the subcommand for hashing strings.
///
/// Each string is written on its own line, as `@@<HASH>@@<string>`, so the
/// output can be appended to an external strings lookup file.
pub fn evaluate_hash(strings: &[String], short: bool, mut output: impl Write) -> miette::Result<()> {
    let width = if short {
        HashWidth::Short
    } else {
        HashWidth::Long
    };

    for s in strings {
        writeln!(output, "{}{s}", placeholder(hash_string(s, width))).into_diagnostic()?;
    }

    Ok(())
}
