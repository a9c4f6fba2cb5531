//!
//! Line-based text formats
//!
//! Blank lines and lines starting with `#` are skipped by every reader.
//!
//! * topologies: one tree per line (one per hidden state)
//! * transitions: one whitespace-separated row of the matrix per line
//! * weights: one float per line (one per hidden state)
//! * labels: the label sequence, possibly split into lines, after an
//!   optional `>` header
//! * intervals: `start,end` per line
//!
use crate::error::{PhyloHmmError, Result};
use crate::interval::Interval;
use std::fs::File;
use std::io::prelude::*;
use std::io::BufWriter;
use std::path::Path;

///
/// Trimmed, non-empty, non-comment lines with their 1-based line numbers
///
fn content_lines<P: AsRef<Path>>(path: P) -> Result<Vec<(usize, String)>> {
    let reader = super::open(path)?;
    let mut lines = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        lines.push((i + 1, line.to_string()));
    }
    Ok(lines)
}

fn parse_float(text: &str, line: usize) -> Result<f64> {
    text.parse::<f64>().map_err(|_| {
        PhyloHmmError::Parse(format!("line {}: {:?} is not a number", line, text))
    })
}

pub fn read_topologies<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    Ok(content_lines(path)?
        .into_iter()
        .map(|(_, line)| line)
        .collect())
}

pub fn read_transitions<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<f64>>> {
    content_lines(path)?
        .iter()
        .map(|(i, line)| {
            line.split(|c: char| c.is_whitespace() || c == ',')
                .filter(|x| !x.is_empty())
                .map(|x| parse_float(x, *i))
                .collect()
        })
        .collect()
}

pub fn read_weights<P: AsRef<Path>>(path: P) -> Result<Vec<f64>> {
    content_lines(path)?
        .iter()
        .map(|(i, line)| parse_float(line, *i))
        .collect()
}

pub fn read_labels<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    Ok(content_lines(path)?
        .into_iter()
        .filter(|(_, line)| !line.starts_with('>'))
        .flat_map(|(_, line)| line.into_bytes())
        .filter(|c| !c.is_ascii_whitespace())
        .collect())
}

pub fn write_labels<P: AsRef<Path>>(path: P, name: &str, labels: &[u8]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, ">{}", name)?;
    writer.write_all(labels)?;
    writeln!(writer)?;
    Ok(())
}

pub fn write_intervals<P: AsRef<Path>>(path: P, intervals: &[Interval]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for interval in intervals {
        writeln!(writer, "{}", interval)?;
    }
    writer.flush()?;
    Ok(())
}
