//! CLI output formatting and progress display.
//!
//! Results go to stdout (text lines or JSON); logs and the progress bar go to
//! stderr.

use anyhow::Result;
use examwatch_core::document::ExamResult;
use examwatch_core::listing::{Entry, PageProgress, page_offsets};
use examwatch_core::pipeline::RecordResult;
use examwatch_core::portal::ExamRecord;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::info;

/// Progress bar for a backfill run; hidden when `visible` is false.
pub fn backfill_progress_bar(visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(page_offsets().count() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} pages {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

/// Advances the bar for one finished page.
pub fn advance_backfill(bar: &ProgressBar, page: &PageProgress) {
    match page.entries {
        Some(count) => bar.set_message(format!("offset {} ({count} entries)", page.offset)),
        None => bar.set_message(format!("offset {} failed", page.offset)),
    }
    bar.inc(1);
}

pub fn print_entries(entries: &[Entry], json: bool) -> Result<()> {
    if json {
        return print_json(entries);
    }
    if entries.is_empty() {
        info!("No new entries");
    }
    for entry in entries {
        println!("{}", format_entry(entry));
    }
    Ok(())
}

pub fn print_exam_records(records: &[ExamRecord], json: bool) -> Result<()> {
    if json {
        return print_json(records);
    }
    if records.is_empty() {
        info!("No exams found");
    }
    for record in records {
        println!("{}", format_exam_record(record));
    }
    Ok(())
}

pub fn print_exam_result(result: &ExamResult, json: bool) -> Result<()> {
    if json {
        return print_json(result);
    }
    println!("{}", format_exam_result(result));
    Ok(())
}

#[derive(Debug, Serialize)]
struct RecordResultLine<'a> {
    code: &'a str,
    link: &'a str,
    cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a ExamResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn print_record_results(results: &[RecordResult], json: bool) -> Result<()> {
    if json {
        let lines: Vec<RecordResultLine<'_>> = results
            .iter()
            .map(|r| RecordResultLine {
                code: &r.code,
                link: &r.link,
                cached: r.cached,
                result: r.result.as_ref().ok(),
                error: r.result.as_ref().err().map(ToString::to_string),
            })
            .collect();
        return print_json(&lines);
    }
    if results.is_empty() {
        info!("No published results");
    }
    for record in results {
        match &record.result {
            Ok(result) => println!("{}: {}", record.code, format_exam_result(result)),
            Err(error) => println!("{}: error: {error}", record.code),
        }
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_entry(entry: &Entry) -> String {
    format!("[{}] {} {}", entry.id, entry.title, entry.url)
}

fn format_exam_record(record: &ExamRecord) -> String {
    let mut line = format!(
        "{} | {} | {} | {} | {}",
        record.code, record.period, record.city, record.result.text, record.status
    );
    if let Some(link) = &record.result.link {
        line.push_str(&format!(" | {link}"));
    }
    line
}

fn format_exam_result(result: &ExamResult) -> String {
    let subject = match (&result.subject, &result.subject_code) {
        (Some(name), Some(code)) => format!("{name} ({code})"),
        (None, Some(code)) => code.clone(),
        (Some(name), None) => name.clone(),
        (None, None) => "unknown subject".to_string(),
    };
    let score = result
        .score
        .map_or_else(|| "no score".to_string(), |score| format!("{score:.2}"));
    let verdict = match result.passed {
        Some(true) => "passed",
        Some(false) => "not passed",
        None => "unknown",
    };
    match &result.period {
        Some(period) => format!("{subject} = {score}, {verdict} [{period}]"),
        None => format!("{subject} = {score}, {verdict}"),
    }
}
