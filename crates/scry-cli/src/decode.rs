use std::io::{BufRead, Write};

use miette::IntoDiagnostic;
use scry_remote::ExternalStrings;

/// Runs the subcommand for decoding a text with hashed strings.
///
/// Every `@@<HASH>@@` pattern known by the lookup is replaced with its
/// string, everything else is copied as is.
pub fn evaluate_decode(
    lookup: &ExternalStrings,
    input: impl BufRead,
    mut output: impl Write,
) -> miette::Result<()> {
    let mut lines = 0usize;

    for line in input.lines() {
        let line = line.into_diagnostic()?;
        writeln!(output, "{}", lookup.decode_text(&line)).into_diagnostic()?;
        lines += 1;
    }

    tracing::debug!(lines, "text decoded");

    Ok(())
}

#[cfg(test)]
mod tests {
    use scry_remote::ExternalStrings;

    use super::evaluate_decode;

    #[test]
    fn known_hashes_are_replaced() {
        let lookup: ExternalStrings = [(0x2DD2E77169A66D9E, "Control".to_owned())]
            .into_iter()
            .collect();

        let input = indoc::indoc! {"
            thread @@2DD2E77169A66D9E@@ frozen
            thread @@0000000000000001@@ frozen
            no hash here
        "};

        let mut out = Vec::new();
        evaluate_decode(&lookup, input.as_bytes(), &mut out).expect("decode");

        assert_eq!(
            String::from_utf8(out).expect("utf-8"),
            indoc::indoc! {"
                thread Control frozen
                thread @@0000000000000001@@ frozen
                no hash here
            "}
        );
    }
}
