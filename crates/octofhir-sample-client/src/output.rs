use std::io::{self, Write};

use clap::ValueEnum;
use colored::Colorize;
use serde::Deserialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::error::Result;
use crate::model::{Bundle, PatientRow};
use crate::runner::PassReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Table,
    Json,
}

/// Prints patient demographics of a search result, sorted by first name.
#[derive(Debug, Clone, Copy, Default)]
pub struct Presenter {
    format: OutputFormat,
}

impl Presenter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn render(&self, bundle: &Bundle) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.render_to(bundle, &mut out)
    }

    pub fn render_to<W: Write>(&self, bundle: &Bundle, out: &mut W) -> Result<()> {
        let rows = patient_rows(bundle)?;
        match self.format {
            OutputFormat::Text => {
                for row in &rows {
                    writeln!(out, "First Name: {}", row.first_name)?;
                    writeln!(out, "Last Name: {}", row.last_name)?;
                    writeln!(
                        out,
                        "Birth Date: {}",
                        row.birth_date.as_deref().unwrap_or("(not set)")
                    )?;
                }
            }
            OutputFormat::Table => {
                if rows.is_empty() {
                    writeln!(out, "No resources found.")?;
                    return Ok(());
                }
                let mut builder = Builder::default();
                builder.push_record(["First Name", "Last Name", "Birth Date"]);
                for row in &rows {
                    builder.push_record([
                        row.first_name.as_str(),
                        row.last_name.as_str(),
                        row.birth_date.as_deref().unwrap_or("-"),
                    ]);
                }
                let table = builder.build().with(Style::rounded()).to_string();
                writeln!(out, "{table}")?;
            }
            OutputFormat::Json => {
                writeln!(out, "{}", serde_json::to_string_pretty(&rows)?)?;
            }
        }
        Ok(())
    }
}

/// Extract every entry, failing on the first one that is not a patient, then
/// sort by first name.
pub fn patient_rows(bundle: &Bundle) -> Result<Vec<PatientRow>> {
    let mut rows = bundle
        .entry
        .iter()
        .map(|entry| entry.expect_patient().map(PatientRow::from))
        .collect::<Result<Vec<_>>>()?;
    rows.sort_by(|a, b| a.first_name.cmp(&b.first_name));
    Ok(rows)
}

pub fn format_pass_report(report: &PassReport) -> String {
    let annotation = if report.caching.is_disabled() {
        " (No Caching)"
    } else {
        ""
    };
    format!(
        "Average Response Time for loop {}{}: {:.2} ms",
        report.pass + 1,
        annotation,
        report.average_millis
    )
}

pub fn print_pass_report(report: &PassReport) {
    println!("{}", format_pass_report(report));
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}
