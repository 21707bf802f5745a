use nestforge_core::trace::TraceSink;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// File-backed trace sink owned by the driver.
///
/// `<label>.energies` gets the K discarded energies of each iteration,
/// one per line, flushed per iteration so a crash leaves a valid prefix.
/// `<label>.replicas_final` gets the surviving live energies at
/// termination, sorted ascending.
pub struct EnergySink {
    energies: BufWriter<File>,
    final_path: PathBuf,
}

impl EnergySink {
    pub fn create(label: &str) -> io::Result<Self> {
        let energies = BufWriter::new(File::create(format!("{}.energies", label))?);
        Ok(Self {
            energies,
            final_path: PathBuf::from(format!("{}.replicas_final", label)),
        })
    }
}

impl TraceSink for EnergySink {
    fn on_iteration(&mut self, discarded: &[f64]) -> io::Result<()> {
        for e in discarded {
            writeln!(self.energies, "{}", e)?;
        }
        self.energies.flush()
    }

    fn on_final(&mut self, energies: &[f64]) -> io::Result<()> {
        self.energies.flush()?;
        let mut out = BufWriter::new(File::create(&self.final_path)?);
        for e in energies {
            writeln!(out, "{}", e)?;
        }
        out.flush()
    }
}
