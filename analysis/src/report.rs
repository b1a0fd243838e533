//! Per-function operation cost report.
//!
//! The report is computed once into rows and then rendered twice: a
//! columnar text form (`<base>.out`) and a row-oriented CSV form
//! (`<base>.csv`). Both renderers read the same rows, so they always agree
//! on every number.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use strum::{EnumCount, IntoEnumIterator};
use tracing::{info, instrument};

use crate::{config::ReportConfig, memory::FunctionTable, stats::scaled, Op};

/// One operation line under a function header.
#[derive(Debug, Clone, PartialEq)]
pub struct OpLine {
    pub op: Op,
    pub per_call: f64,
    pub total: u64,
    pub scaled_total: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionReport {
    pub name: String,
    pub calls: u64,
    pub ops: Vec<OpLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpTotal {
    pub op: Op,
    pub total: u64,
    pub scaled_total: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub functions: Vec<FunctionReport>,
    pub totals: Vec<OpTotal>,
}

impl Report {
    /// Builds the report rows from replayed function aggregates.
    ///
    /// Ignored functions are skipped entirely and contribute nothing to the
    /// totals; free bookkeeping operations are never listed.
    #[instrument(level = "debug", skip_all)]
    pub fn generate(functions: &FunctionTable, config: &ReportConfig) -> Self {
        let factor = config.scale_factor;
        let mut totals = [0u64; Op::COUNT];
        let mut reports = Vec::new();

        for (name, func) in functions.iter() {
            if config.is_ignored(name) {
                continue;
            }
            let ops = func
                .ops
                .nonzero()
                .filter(|(op, _)| !op.is_free())
                .map(|(op, total)| {
                    totals[op.index()] += total;
                    OpLine {
                        op,
                        per_call: total as f64 / func.calls as f64,
                        total,
                        scaled_total: scaled(total, factor),
                    }
                })
                .collect();
            reports.push(FunctionReport {
                name: name.to_string(),
                calls: func.calls,
                ops,
            });
        }

        let totals = Op::iter()
            .filter(|op| totals[op.index()] != 0)
            .map(|op| OpTotal {
                op,
                total: totals[op.index()],
                scaled_total: scaled(totals[op.index()], factor),
            })
            .collect();

        Self {
            functions: reports,
            totals,
        }
    }

    pub fn function(&self, name: &str) -> Option<&FunctionReport> {
        self.functions.iter().find(|func| func.name == name)
    }

    pub fn total(&self, op: Op) -> Option<&OpTotal> {
        self.totals.iter().find(|total| total.op == op)
    }

    /// Writes the human-readable columnar form.
    pub fn write_text<W: Write>(&self, mut out: W) -> io::Result<()> {
        for func in &self.functions {
            writeln!(out)?;
            writeln!(out, "{:<44}: {:>8} calls", func.name, func.calls)?;
            for line in &func.ops {
                writeln!(
                    out,
                    "    {:<40}: {:>8.1}/call   {:>10} total   {:>10} scaled_total",
                    line.op.name(),
                    line.per_call,
                    line.total,
                    line.scaled_total
                )?;
            }
        }

        write!(out, "\n\nTotals:\n")?;
        for total in &self.totals {
            writeln!(
                out,
                "    {:<40}:  {:>10}   {:>10}",
                total.op.name(),
                total.total,
                total.scaled_total
            )?;
        }
        out.flush()
    }

    /// Writes the row-oriented form for spreadsheet import.
    pub fn write_csv<W: Write>(&self, mut out: W) -> io::Result<()> {
        for func in &self.functions {
            writeln!(out)?;
            writeln!(out, "{}, {}", quoted(&func.name), func.calls)?;
            for line in &func.ops {
                writeln!(
                    out,
                    "{}, {}, {}, {}",
                    quoted(line.op.name()),
                    line.per_call,
                    line.total,
                    line.scaled_total
                )?;
            }
        }
        for total in &self.totals {
            writeln!(
                out,
                "{}, {}, {}",
                quoted(total.op.name()),
                total.total,
                total.scaled_total
            )?;
        }
        out.flush()
    }

    pub fn to_text(&self) -> String {
        let mut buf = Vec::new();
        self.write_text(&mut buf)
            .expect("writing to a Vec cannot fail");
        String::from_utf8_lossy(&buf).into_owned()
    }

    pub fn to_csv(&self) -> String {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)
            .expect("writing to a Vec cannot fail");
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Writes `<base>.out` and `<base>.csv` and returns their paths.
    #[instrument(level = "info", skip(self))]
    pub fn write_files(&self, base_name: &Path) -> io::Result<(PathBuf, PathBuf)> {
        let text_path = with_suffix(base_name, "out");
        let csv_path = with_suffix(base_name, "csv");
        self.write_text(BufWriter::new(File::create(&text_path)?))?;
        self.write_csv(BufWriter::new(File::create(&csv_path)?))?;
        info!("Wrote stats to {}.{{out,csv}}", base_name.display());
        Ok((text_path, csv_path))
    }
}

/// CSV string cell; embedded quotes are doubled.
fn quoted(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

/// `base` with `.suffix` appended, keeping any dots already in the name.
fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FunctionTable {
        let mut funcs = FunctionTable::default();
        funcs.enter("f");
        for _ in 0..3 {
            funcs.record("f", Op::Add).unwrap();
        }
        funcs.record("f", Op::PushConstant).unwrap();
        funcs.enter("g");
        funcs.enter("g");
        funcs.record("g", Op::Lshift).unwrap();
        funcs.record("g", Op::Add).unwrap();
        funcs
    }

    #[test]
    fn test_rows() {
        let report = Report::generate(
            &sample(),
            &ReportConfig {
                scale_factor: 1.5,
                ..Default::default()
            },
        );

        let f = report.function("f").unwrap();
        assert_eq!(f.calls, 1);
        assert_eq!(
            f.ops,
            vec![OpLine {
                op: Op::Add,
                per_call: 3.0,
                total: 3,
                scaled_total: 5,
            }]
        );

        let g = report.function("g").unwrap();
        assert_eq!(g.calls, 2);
        assert_eq!(g.ops[0].op, Op::Lshift);
        assert_eq!(g.ops[0].per_call, 0.5);

        assert_eq!(report.total(Op::Add).unwrap().total, 4);
        assert_eq!(report.total(Op::Add).unwrap().scaled_total, 6);
        assert!(report.total(Op::PushConstant).is_none());
    }

    #[test]
    fn test_text_layout() {
        let report = Report::generate(&sample(), &ReportConfig::default());
        let text = report.to_text();
        let expected_f = format!("\n{:<44}: {:>8} calls\n", "f", 1);
        assert!(text.starts_with(&expected_f), "{text}");
        assert!(text.contains(&format!(
            "    {:<40}: {:>8}/call   {:>10} total   {:>10} scaled_total\n",
            "add", "3.0", 3, 3
        )));
        assert!(text.contains("\n\nTotals:\n"));
        assert!(text.ends_with(&format!("    {:<40}:  {:>10}   {:>10}\n", "add", 4, 4)));
    }

    #[test]
    fn test_csv_layout() {
        let report = Report::generate(&sample(), &ReportConfig::default());
        assert_eq!(
            report.to_csv(),
            "\n\"f\", 1\n\"add\", 3, 3, 3\n\
             \n\"g\", 2\n\"lshift\", 0.5, 1, 1\n\"add\", 0.5, 1, 1\n\
             \"lshift\", 1, 1\n\"add\", 4, 4\n"
        );
    }

    #[test]
    fn test_suffix_keeps_dots() {
        assert_eq!(
            with_suffix(Path::new("out/run.1"), "csv"),
            PathBuf::from("out/run.1.csv")
        );
    }
}
