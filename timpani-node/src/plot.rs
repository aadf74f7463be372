//! `.gpdata` plot file writer (spec §6 [ADDED]): one row per observed
//! scheduling interval, written with the original's manual
//! `fprintf`-per-row style rather than a CSV crate, opened lazily on the
//! first observed interval when `enable_plot` is set.

use std::fs::File;
use std::io::{BufWriter, Write};

use crate::error::{NodeError, NodeResult};

/// Appends rows to a task's `<task_name>.gpdata` file: one line per observed
/// fire, `fire_real_ns task_name lateness_ns outcome`.
pub struct PlotWriter {
    file: BufWriter<File>,
}

impl PlotWriter {
    /// Opens (creating if absent) `<task_name>.gpdata` under `dir`.
    pub fn open(dir: &str, task_name: &str) -> NodeResult<Self> {
        let path = format!("{dir}/{task_name}.gpdata");
        let file = File::create(&path).map_err(NodeError::Io)?;
        Ok(PlotWriter { file: BufWriter::new(file) })
    }

    /// Writes one row. Flushed immediately: plot files are diagnostic output
    /// read while the node is still running, not a batch artifact.
    pub fn write_row(&mut self, fire_real_ns: i64, task_name: &str, lateness_ns: i64, outcome: &str) -> NodeResult<()> {
        writeln!(self.file, "{fire_real_ns} {task_name} {lateness_ns} {outcome}").map_err(NodeError::Io)?;
        self.file.flush().map_err(NodeError::Io)
    }
}
