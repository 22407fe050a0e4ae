//! subcommands for compiling TransXChange documents from the command
//! line, either one XML file at a time or a whole service out of a zip
//! archive.
use std::fs::File;

use chrono::NaiveDate;
use clap::{value_parser, Subcommand};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::timetable::document::NoStopLookup;
use crate::timetable::grouping::{Cell, Grouping};
use crate::timetable::service_ops::{timetables_for_service, NoTimetableCache, ZipDocumentStore};
use crate::timetable::timetable::{build_timetable, Timetable};

const CELL_WIDTH: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize, Subcommand)]
pub enum TimetableOperation {
    /// compile one TransXChange XML document for a date
    Compile {
        /// path to the XML document
        #[arg(long)]
        input: String,
        /// the date to compile for (YYYY-MM-DD)
        #[arg(long, value_parser = value_parser!(NaiveDate))]
        date: NaiveDate,
        /// override the description shown in the header
        #[arg(long)]
        description: Option<String>,
        /// emit JSON instead of a text grid
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// compile every document for a service found in a zip archive
    Service {
        /// path to the zip archive of TransXChange documents
        #[arg(long)]
        archive: String,
        /// service code to look up in the archive's member names
        #[arg(long)]
        service: String,
        /// the date to compile for (YYYY-MM-DD)
        #[arg(long, value_parser = value_parser!(NaiveDate))]
        date: NaiveDate,
        /// emit JSON instead of a text grid
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

impl TimetableOperation {
    pub fn run(&self) {
        match self {
            TimetableOperation::Compile {
                input,
                date,
                description,
                json,
            } => {
                let file = File::open(input)
                    .unwrap_or_else(|e| panic!("failed opening document '{input}': {e}"));
                let timetable = build_timetable(file, *date, description.clone(), &NoStopLookup)
                    .unwrap_or_else(|e| panic!("failed compiling timetable for '{input}': {e}"));
                emit(&[timetable], *json)
            }
            TimetableOperation::Service {
                archive,
                service,
                date,
                json,
            } => {
                let store = ZipDocumentStore::new(archive);
                let timetables = timetables_for_service(
                    &store,
                    &NoTimetableCache,
                    &NoStopLookup,
                    service,
                    *date,
                )
                .unwrap_or_else(|e| {
                    panic!("failed compiling timetables for service '{service}': {e}")
                });
                if timetables.is_empty() {
                    println!("no applicable documents for service '{service}'");
                }
                emit(&timetables, *json)
            }
        }
    }
}

fn emit(timetables: &[Timetable], json: bool) {
    if json {
        let value: Vec<serde_json::Value> = timetables.iter().map(timetable_json).collect();
        let rendered = serde_json::to_string_pretty(&value)
            .unwrap_or_else(|e| panic!("failed serializing timetables: {e}"));
        println!("{rendered}");
    } else {
        for timetable in timetables {
            print!("{}", render_timetable(timetable));
        }
    }
}

fn timetable_json(timetable: &Timetable) -> serde_json::Value {
    json!({
        "service_code": &timetable.service_code,
        "description": &timetable.description,
        "line_name": &timetable.line_name,
        "operator_name": &timetable.operator_name,
        "date": timetable.date,
        "groupings": timetable
            .groupings()
            .into_iter()
            .map(grouping_json)
            .collect::<Vec<serde_json::Value>>(),
    })
}

fn grouping_json(grouping: &Grouping) -> serde_json::Value {
    json!({
        "direction": grouping.direction,
        "rows": grouping.rows(),
        "journeys": &grouping.journeys,
        "column_feet": &grouping.column_feet,
    })
}

fn render_timetable(timetable: &Timetable) -> String {
    let mut out = String::new();
    let title = [
        timetable.line_name.clone(),
        timetable.description.clone(),
        Some(format!("({})", timetable.date)),
    ]
    .into_iter()
    .flatten()
    .join(" ");
    out.push_str(&title);
    out.push('\n');

    if !timetable.has_journeys() {
        out.push_str("no buses scheduled\n");
        return out;
    }
    for grouping in timetable.groupings() {
        if grouping.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{:?}\n", grouping.direction));
        out.push_str(&render_grouping(grouping));
    }
    out
}

fn render_grouping(grouping: &Grouping) -> String {
    let rows = grouping.rows();
    let name_width = rows
        .iter()
        .map(|row| row.stop.display_name().len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for row in &rows {
        out.push_str(&format!("{:<name_width$}", row.stop.display_name()));
        for cell in &row.times {
            out.push_str(&format!("{:>CELL_WIDTH$}", render_cell(cell)));
        }
        out.push('\n');
    }
    for (note_key, feet) in &grouping.column_feet {
        let spans = feet
            .iter()
            .map(|foot| match &foot.notes {
                Some(text) => format!("[{} col: {}]", foot.span, text),
                None => format!("[{} col]", foot.span),
            })
            .join(" ");
        out.push_str(&format!("{note_key}: {spans}\n"));
    }
    out
}

fn render_cell(cell: &Cell) -> String {
    match cell {
        Cell::Empty => "-".to_string(),
        Cell::Time { time } => time.format("%H:%M").to_string(),
        Cell::Frequency { minutes, .. } => format!("ev {minutes}m"),
        Cell::Covered => String::new(),
    }
}
