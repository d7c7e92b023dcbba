//! The result table.
//!
//! One CSV row per (b, delta, algorithm) with the solution weight, timing
//! and coloring operation counts, written to stdout or to the configured
//! output file.

use std::io::Write;

use anyhow::Result;

use djmatch_coloring::ColorOpCounts;

pub const COLUMNS: [&str; 15] = [
    "b",
    "delta",
    "algorithm",
    "weight",
    "time_s",
    "delta_time_s",
    "total_time_s",
    "fine_color",
    "fine_uncolor",
    "fine_recolor",
    "coarse_color",
    "coarse_uncolor",
    "coarse_recolor",
    "num_arcs",
    "delta_size",
];

/// One result row.
#[derive(Debug)]
pub struct Row {
    pub b: u32,
    pub delta: usize,
    pub algorithm: String,
    pub weight: u64,
    pub time_s: f64,
    pub delta_time_s: f64,
    pub fine: ColorOpCounts,
    pub coarse: ColorOpCounts,
    pub num_arcs: usize,
    pub delta_size: usize,
}

/// Streams result rows as CSV.
pub struct ResultsTable<W: Write> {
    writer: W,
}

impl<W: Write> ResultsTable<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_header(&mut self) -> Result<()> {
        writeln!(self.writer, "{}", COLUMNS.join(","))?;
        Ok(())
    }

    pub fn write_row(&mut self, row: &Row) -> Result<()> {
        writeln!(
            self.writer,
            "{},{},{},{},{:.6},{:.6},{:.6},{},{},{},{},{},{},{},{}",
            row.b,
            row.delta,
            row.algorithm,
            row.weight,
            row.time_s,
            row.delta_time_s,
            row.delta_time_s + row.time_s,
            row.fine.color,
            row.fine.uncolor,
            row.fine.recolor,
            row.coarse.color,
            row.coarse.uncolor,
            row.coarse.recolor,
            row.num_arcs,
            row.delta_size,
        )?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_format() {
        let mut table = ResultsTable::new(Vec::new());
        table.write_header().unwrap();
        table
            .write_row(&Row {
                b: 2,
                delta: 1,
                algorithm: "GreedyIt".into(),
                weight: 42,
                time_s: 0.5,
                delta_time_s: 0.25,
                fine: ColorOpCounts {
                    color: 3,
                    uncolor: 1,
                    recolor: 0,
                },
                coarse: ColorOpCounts::default(),
                num_arcs: 10,
                delta_size: 4,
            })
            .unwrap();

        let output = String::from_utf8(table.writer).unwrap();
        let mut lines = output.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("b,delta,algorithm,weight"));
        assert_eq!(header.split(',').count(), COLUMNS.len());
        let row = lines.next().unwrap();
        assert_eq!(
            row,
            "2,1,GreedyIt,42,0.500000,0.250000,0.750000,3,1,0,0,0,0,10,4"
        );
    }
}
