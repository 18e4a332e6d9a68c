//! Report rendering for the command line.

use std::io::Write;

use reclaim_cleaner::RunReport;

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines, one per deletion.
    #[default]
    Text,
    /// Machine-readable JSON report.
    Json,
}

/// Writes run reports in the selected format.
pub struct Printer<W: Write = Box<dyn Write>> {
    out: W,
    format: OutputFormat,
}

impl Printer<Box<dyn Write>> {
    /// Create a new printer writing to stdout with the given format.
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(Box::new(std::io::stdout()), format)
    }
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format }
    }

    pub fn print_report(&mut self, report: &RunReport) -> std::io::Result<()> {
        match self.format {
            OutputFormat::Text => write!(self.out, "{}", report)?,
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(report)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
                writeln!(self.out, "{}", json)?;
            }
        }
        self.out.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reclaim_cleaner::{SpaceReclaimer, SpaceThreshold, TargetSet};

    fn sample_report() -> RunReport {
        let dir = tempfile::tempdir().unwrap();
        SpaceReclaimer::default().reclaim(&TargetSet::single(dir.path()), SpaceThreshold::from_bytes(0))
    }

    #[test]
    fn test_text_output() {
        let mut printer = Printer::new(Vec::new(), OutputFormat::Text);
        printer.print_report(&sample_report()).unwrap();
        let text = String::from_utf8(printer.into_inner()).unwrap();
        assert!(text.contains("No cleanup necessary."));
    }

    #[test]
    fn test_json_output() {
        let mut printer = Printer::new(Vec::new(), OutputFormat::Json);
        printer.print_report(&sample_report()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&printer.into_inner()).unwrap();
        assert_eq!(value["status"], "target-already-met");
        assert_eq!(value["reclaimed_bytes"], 0);
    }
}
