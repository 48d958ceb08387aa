//! CSV persistence (§4.15, interface-only per spec.md §1 but implemented
//! concretely so offline mode and the round-trip property are testable).
//!
//! Two sections (phase 1, phase 2), each a count line followed by that
//! many `bandwidth,delta` 4-decimal lines. Grounded on
//! `original_source/loco.c`'s `session_csv_write`/`session_csv_read`, with
//! the strict-parsing redesign from spec.md §9: a line that doesn't parse
//! as exactly two comma-separated floats is rejected, not silently carried
//! forward.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::error::EngineError;
use crate::types::{Sample, SampleSet};

pub fn write(path: &Path, p1: &SampleSet, p2: &SampleSet) -> Result<(), EngineError> {
    let mut file = File::create(path).map_err(EngineError::Io)?;
    write_section(&mut file, p1)?;
    write_section(&mut file, p2)?;
    Ok(())
}

fn write_section(file: &mut File, set: &SampleSet) -> Result<(), EngineError> {
    writeln!(file, "{}", set.len())?;
    for sample in set.samples() {
        writeln!(file, "{:.4},{:.4}", sample.bandwidth, sample.delta)?;
    }
    Ok(())
}

pub fn read(path: &Path) -> Result<(SampleSet, SampleSet), EngineError> {
    let file = File::open(path).map_err(EngineError::Io)?;
    let mut lines = BufReader::new(file).lines();
    let p1 = read_section(&mut lines)?;
    let p2 = read_section(&mut lines)?;
    Ok((p1, p2))
}

fn read_section(
    lines: &mut std::io::Lines<BufReader<File>>,
) -> Result<SampleSet, EngineError> {
    let count_line = next_line(lines)?;
    let count: usize = count_line
        .trim()
        .parse()
        .map_err(|_| malformed(&count_line))?;

    let mut set = SampleSet::new();
    for _ in 0..count {
        let line = next_line(lines)?;
        let (bw_str, delta_str) = line
            .trim()
            .split_once(',')
            .ok_or_else(|| malformed(&line))?;
        let bandwidth: f64 = bw_str.trim().parse().map_err(|_| malformed(&line))?;
        let delta: f64 = delta_str.trim().parse().map_err(|_| malformed(&line))?;
        set.push(Sample { bandwidth, delta })
            .map_err(|_| EngineError::Configuration("CSV section exceeds sample cap".into()))?;
    }
    Ok(set)
}

fn next_line(lines: &mut std::io::Lines<BufReader<File>>) -> Result<String, EngineError> {
    lines
        .next()
        .ok_or_else(|| EngineError::Configuration("unexpected end of CSV file".into()))?
        .map_err(EngineError::Io)
}

fn malformed(line: &str) -> EngineError {
    EngineError::Configuration(format!("malformed CSV line, expected \"float,float\": {line:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn sample_set(values: &[(f64, f64)]) -> SampleSet {
        let mut set = SampleSet::new();
        for &(bandwidth, delta) in values {
            set.push(Sample { bandwidth, delta }).unwrap();
        }
        set
    }

    #[test]
    fn round_trip_preserves_values_to_four_decimals() {
        let file = NamedTempFile::new().unwrap();
        let p1 = sample_set(&[(48.1234, 1000.0), (49.5, 1001.2)]);
        let p2 = sample_set(&[(50.0001, 999.9999)]);
        write(file.path(), &p1, &p2).unwrap();

        let (read_p1, read_p2) = read(file.path()).unwrap();
        assert_eq!(read_p1.len(), 2);
        assert_eq!(read_p2.len(), 1);
        assert!((read_p1.samples()[0].bandwidth - 48.1234).abs() < 1e-9);
        assert!((read_p2.samples()[0].delta - 999.9999).abs() < 1e-9);
    }

    #[test]
    fn rejects_malformed_data_line() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "1\nnot-a-number,1.0\n0\n").unwrap();
        let result = read(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn rejects_line_missing_comma() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "1\n48.0\n0\n").unwrap();
        assert!(read(file.path()).is_err());
    }
}
