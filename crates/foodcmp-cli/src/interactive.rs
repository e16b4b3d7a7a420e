//! `run --interactive`: asks for each search field on the terminal.
//!
//! Prompts go to `output` so stdout stays free for `--json`. Blank answers
//! take the shown default. The answers build a [`RawSearchRequest`], which is
//! validated like any other.

use std::io::{BufRead, Write};
use std::str::FromStr;

use anyhow::{bail, Context};
use foodcmp_core::{AppConfig, RawSearchRequest};

/// Reads a full search request from `input`.
///
/// # Errors
///
/// Returns an error if `input` ends before every field is answered, or if
/// reading or writing the terminal fails.
pub(crate) fn prompt_raw_request<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    config: &AppConfig,
) -> anyhow::Result<RawSearchRequest> {
    writeln!(output, "Food deal comparison: interactive search")?;

    let items = loop {
        let answer = ask(input, output, "Food items (comma-separated)", None)?;
        let items: Vec<String> = answer
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();
        if !items.is_empty() {
            break items;
        }
        writeln!(output, "Enter at least one item.")?;
    };

    let mut raw = RawSearchRequest::new(items);
    raw.min_rating = ask_parsed(input, output, "Minimum rating", config.default_min_rating)?;
    raw.price_min = ask_optional(input, output, "Minimum price (blank for none)")?;
    raw.price_max = ask_optional(input, output, "Maximum price (blank for none)")?;
    raw.max_results_per_provider = ask_parsed(
        input,
        output,
        "Results per provider",
        config.default_max_results,
    )?;
    let location = ask(input, output, "Location (blank for none)", None)?;
    raw.location = Some(location).filter(|l| !l.is_empty());
    Ok(raw)
}

fn ask<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
    default: Option<&str>,
) -> anyhow::Result<String> {
    match default {
        Some(d) => write!(output, "{label} [{d}]: ")?,
        None => write!(output, "{label}: ")?,
    }
    output.flush()?;

    let mut line = String::new();
    let read = input.read_line(&mut line).context("reading answer")?;
    if read == 0 {
        bail!("input ended before \"{label}\" was answered");
    }
    let answer = line.trim();
    Ok(match default {
        Some(d) if answer.is_empty() => d.to_owned(),
        _ => answer.to_owned(),
    })
}

fn ask_parsed<T, R, W>(input: &mut R, output: &mut W, label: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr + ToString,
    R: BufRead,
    W: Write,
{
    let shown = default.to_string();
    loop {
        let answer = ask(input, output, label, Some(&shown))?;
        match answer.parse() {
            Ok(value) => return Ok(value),
            Err(_) => writeln!(output, "Not a valid number: {answer}")?,
        }
    }
}

fn ask_optional<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
) -> anyhow::Result<Option<f64>> {
    loop {
        let answer = ask(input, output, label, None)?;
        if answer.is_empty() {
            return Ok(None);
        }
        match answer.parse() {
            Ok(value) => return Ok(Some(value)),
            Err(_) => writeln!(output, "Not a valid number: {answer}")?,
        }
    }
}
