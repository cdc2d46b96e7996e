//! LaTeX table rendering for collected results.
//!
//! Produces a booktabs `table` with one row per config, in record order, and a
//! `\midrule` between lane groups. Rendering is pure: the same records always
//! yield the same bytes.

use std::path::Path;

use crate::core::schema::{Measurement, Phase, ResultRecord};
use crate::{BenchError, BenchResult};

/// Placeholder written for a phase without a measurement.
pub const ABSENT_MARKER: &str = "n/a";

pub const DEFAULT_CAPTION: &str = "Iterated f benchmark results";
pub const DEFAULT_LABEL: &str = "tab:iterated-f-benchmark";

/// Caption and label of the rendered table.
///
/// The caption is plain text and escaped on render. The label is emitted
/// verbatim inside `\label{}`, so it is restricted to characters LaTeX
/// accepts there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMeta {
    pub caption: String,
    pub label: String,
}

impl TableMeta {
    pub fn new(caption: impl Into<String>, label: impl Into<String>) -> BenchResult<Self> {
        let label = label.into();
        if label.is_empty() {
            return Err(BenchError::Usage("table label must not be empty".into()));
        }
        if let Some(c) = label
            .chars()
            .find(|c| c.is_whitespace() || "\\{}%#&~^$".contains(*c))
        {
            return Err(BenchError::Usage(format!(
                "table label '{label}' contains '{c}', which cannot appear in \\label"
            )));
        }
        Ok(TableMeta {
            caption: caption.into(),
            label,
        })
    }
}

impl Default for TableMeta {
    fn default() -> Self {
        TableMeta {
            caption: DEFAULT_CAPTION.to_string(),
            label: DEFAULT_LABEL.to_string(),
        }
    }
}

/// A renderable results table.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub meta: TableMeta,
    pub rows: Vec<ResultRecord>,
}

impl Report {
    pub fn new(rows: Vec<ResultRecord>) -> Self {
        Report {
            meta: TableMeta::default(),
            rows,
        }
    }

    pub fn with_meta(mut self, meta: TableMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn render(&self) -> String {
        render_latex(&self.rows, &self.meta)
    }
}

/// `$2^{k}$` for powers of two, the plain number otherwise.
pub fn format_power_of_two(n: u64) -> String {
    if n.is_power_of_two() {
        format!("$2^{{{}}}$", n.trailing_zeros())
    } else {
        n.to_string()
    }
}

/// Escape text so LaTeX typesets it literally.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Human-readable duration with a unit chosen by magnitude.
fn format_millis(ms: f64, micro: &str) -> String {
    if ms < 1.0 {
        format!("{:.1} {micro}", ms * 1000.0)
    } else if ms < 1000.0 {
        format!("{:.1} ms", ms)
    } else {
        format!("{:.2} s", ms / 1000.0)
    }
}

/// Plain-text duration, used in log lines.
pub fn format_time(ms: f64) -> String {
    format_millis(ms, "µs")
}

/// LaTeX duration for a table cell.
pub fn latex_time(ms: f64) -> String {
    format_millis(ms, "$\\mu$s")
}

fn cell(measurement: &Measurement) -> String {
    match measurement {
        Measurement::Present(e) => latex_time(e.as_millis()),
        Measurement::Absent(_) => ABSENT_MARKER.to_string(),
    }
}

fn row(record: &ResultRecord) -> String {
    let config = record.config;
    let mut cells = vec![
        config.lanes.to_string(),
        format_power_of_two(config.iterations),
        format_power_of_two(config.total_ops()),
    ];
    cells.extend(Phase::ALL.iter().map(|p| cell(record.timings.get(*p))));
    format!("{} \\\\", cells.join(" & "))
}

/// Render records as a complete LaTeX `table` environment.
pub fn render_latex(records: &[ResultRecord], meta: &TableMeta) -> String {
    let header: Vec<&str> = ["Lanes", "Iterations", "Total Ops"]
        .into_iter()
        .chain(Phase::ALL.iter().map(|p| p.label()))
        .collect();

    let mut lines = vec![
        "\\begin{table}[htbp]".to_string(),
        "\\centering".to_string(),
        format!("\\caption{{{}}}", escape_latex(&meta.caption)),
        format!("\\label{{{}}}", meta.label),
        "\\begin{tabular}{rrrrrr}".to_string(),
        "\\toprule".to_string(),
        format!("{} \\\\", header.join(" & ")),
        "\\midrule".to_string(),
    ];

    let mut current_lanes = None;
    for record in records {
        let lanes = record.config.lanes;
        if current_lanes.is_some_and(|l| l != lanes) {
            lines.push("\\midrule".to_string());
        }
        current_lanes = Some(lanes);
        lines.push(row(record));
    }

    lines.push("\\bottomrule".to_string());
    lines.push("\\end{tabular}".to_string());
    lines.push("\\end{table}".to_string());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Write rendered text to `output`, or to stdout when `None`.
///
/// Parent directories are created and an existing file is overwritten.
pub fn write_report(text: &str, output: Option<&Path>) -> BenchResult<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        BenchError::Message(format!(
                            "failed to create {}: {e}",
                            parent.display()
                        ))
                    })?;
                }
            }
            std::fs::write(path, text).map_err(|e| {
                BenchError::Message(format!("failed to write {}: {e}", path.display()))
            })
        }
        None => {
            use std::io::Write;
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .and_then(|_| stdout.flush())
                .map_err(|e| BenchError::Message(format!("failed to write to stdout: {e}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{AbsenceReason, BenchConfig, Estimate, PhaseTimings};

    fn measured(config: BenchConfig, w: f64, p: f64, v: f64) -> ResultRecord {
        ResultRecord::new(
            config,
            PhaseTimings {
                witness: Measurement::Present(Estimate::from_millis(w)),
                proof: Measurement::Present(Estimate::from_millis(p)),
                verify: Measurement::Present(Estimate::from_millis(v)),
            },
        )
    }

    #[test]
    fn test_format_power_of_two() {
        assert_eq!(format_power_of_two(1), "$2^{0}$");
        assert_eq!(format_power_of_two(2048), "$2^{11}$");
        assert_eq!(format_power_of_two(131072), "$2^{17}$");
        assert_eq!(format_power_of_two(3000), "3000");
        assert_eq!(format_power_of_two(0), "0");
    }

    #[test]
    fn test_time_units() {
        assert_eq!(latex_time(0.25), "250.0 $\\mu$s");
        assert_eq!(format_time(0.25), "250.0 µs");
        assert_eq!(latex_time(30.0), "30.0 ms");
        assert_eq!(latex_time(999.9), "999.9 ms");
        assert_eq!(latex_time(1200.0), "1.20 s");
        assert_eq!(latex_time(4500.0), "4.50 s");
    }

    #[test]
    fn test_row_with_values_and_absent() {
        let present = measured(BenchConfig::new(4, 2048), 1200.0, 4500.0, 30.0);
        assert_eq!(
            row(&present),
            "4 & $2^{11}$ & $2^{13}$ & 1.20 s & 4.50 s & 30.0 ms \\\\"
        );

        let absent = ResultRecord::new(
            BenchConfig::new(16, 512),
            PhaseTimings::absent(AbsenceReason::MissingArtifact),
        );
        assert_eq!(row(&absent), "16 & $2^{9}$ & $2^{13}$ & n/a & n/a & n/a \\\\");
    }

    #[test]
    fn test_midrule_between_lane_groups() {
        let records = vec![
            measured(BenchConfig::new(1, 8192), 1.0, 2.0, 3.0),
            measured(BenchConfig::new(1, 16384), 1.0, 2.0, 3.0),
            measured(BenchConfig::new(4, 2048), 1.0, 2.0, 3.0),
        ];
        let out = render_latex(&records, &TableMeta::default());
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "\\begin{table}[htbp]");
        assert_eq!(lines[2], "\\caption{Iterated f benchmark results}");
        assert_eq!(lines[3], "\\label{tab:iterated-f-benchmark}");
        assert_eq!(
            lines[6],
            "Lanes & Iterations & Total Ops & Witness Gen & Proof Gen & Verification \\\\"
        );
        // header rule, then one group separator
        assert_eq!(lines.iter().filter(|l| **l == "\\midrule").count(), 2);
        assert!(lines[8].starts_with("1 & $2^{13}$"));
        assert!(lines[9].starts_with("1 & $2^{14}$"));
        assert_eq!(lines[10], "\\midrule");
        assert!(lines[11].starts_with("4 & "));
        assert_eq!(lines.last().copied(), Some("\\end{table}"));
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn test_empty_table_is_well_formed() {
        let out = Report::new(Vec::new()).render();
        assert!(out.contains("\\toprule\n"));
        assert!(out.contains("\\midrule\n\\bottomrule\n"));
    }

    #[test]
    fn test_custom_meta() {
        let report =
            Report::new(Vec::new()).with_meta(TableMeta::new("Lane scaling", "tab:lanes").unwrap());
        let out = report.render();
        assert!(out.contains("\\caption{Lane scaling}"));
        assert!(out.contains("\\label{tab:lanes}"));
    }

    #[test]
    fn test_caption_is_escaped() {
        let meta = TableMeta::new("50% of f_2 & more {x} ~$", "tab:x").unwrap();
        let out = render_latex(&[], &meta);
        assert!(out.contains(
            "\\caption{50\\% of f\\_2 \\& more \\{x\\} \\textasciitilde{}\\$}\n"
        ));
        assert_eq!(escape_latex("a\\b^c"), "a\\textbackslash{}b\\textasciicircum{}c");
        assert_eq!(escape_latex(DEFAULT_CAPTION), DEFAULT_CAPTION);
    }

    #[test]
    fn test_label_rejects_special_characters() {
        assert!(TableMeta::new("c", "tab:iterated-f_v2").is_ok());
        for label in ["", "tab x", "tab%", "tab}", "a\\b", "a&b"] {
            let err = TableMeta::new("c", label).unwrap_err();
            assert!(err.is_usage(), "accepted: {label:?}");
        }
    }

    #[test]
    fn test_write_report_creates_parents_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("table.tex");

        write_report("first\n", Some(&path)).unwrap();
        write_report("second\n", Some(&path)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second\n");
    }
}
