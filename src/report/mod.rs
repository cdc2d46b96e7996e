//! Report rendering for collected results.

pub mod latex;

// Re-export key types
pub use latex::{
    ABSENT_MARKER, Report, TableMeta, escape_latex, format_power_of_two, format_time, latex_time,
    render_latex, write_report,
};
