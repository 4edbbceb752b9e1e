//! Speech adapters backed by engines installed on the host.
//!
//! Both adapters shell out to an external program, so any engine with a
//! compatible command line can be plugged in through configuration.

pub mod recognizer;
pub mod synth;

pub use recognizer::CommandRecognizer;
pub use synth::CommandSynthesizer;

/// Splits a configured command line into program and arguments.
/// Returns `None` for a blank line.
pub fn split_command_line(line: &str) -> Option<(String, Vec<String>)> {
    let mut parts = line.split_whitespace().map(str::to_string);
    let program = parts.next()?;
    Some((program, parts.collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_program_from_arguments() {
        assert_eq!(
            split_command_line("  espeak-ng -a 120 "),
            Some((
                "espeak-ng".to_string(),
                vec!["-a".to_string(), "120".to_string()]
            ))
        );
        assert_eq!(split_command_line("   "), None);
    }
}
