//! Result tables.
//!
//! A [`ResultSet`] collects engine output across scenarios and repeats into
//! one long table, keyed by scenario label, repeat index, seed, and year.
//! Tables round-trip through RFC 4180 style CSV so downstream analysis can
//! pick them up without this crate.

use std::path::Path;

use crate::engine::RunOutput;
use crate::error::{ModelError, Result};

/// Fixed key columns preceding the channel columns.
pub const KEY_COLUMNS: [&str; 4] = ["scenario", "repeat", "seed", "t"];

/// One year of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub scenario: String,
    pub repeat: u32,
    pub seed: u64,
    /// Calendar year of the sample.
    pub t: f64,
    /// Channel values, aligned to [`ResultSet::channels`].
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    channels: Vec<String>,
    rows: Vec<ResultRow>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Channel column labels, in first-seen order.
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// All column labels, keys first.
    pub fn columns(&self) -> Vec<String> {
        KEY_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.channels.iter().cloned())
            .collect()
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channels.iter().position(|c| c == name)
    }

    /// Distinct scenario labels, in row order.
    pub fn scenario_labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !labels.contains(&row.scenario.as_str()) {
                labels.push(&row.scenario);
            }
        }
        labels
    }

    pub fn rows_for<'a>(&'a self, scenario: &'a str) -> impl Iterator<Item = &'a ResultRow> {
        self.rows.iter().filter(move |r| r.scenario == scenario)
    }

    /// Appends one run. Channels unseen so far become new columns, with
    /// earlier rows backfilled to zero; channels this run lacks are recorded
    /// as zero. A method introduced by one scenario thus shows a zero share
    /// everywhere else.
    pub fn push_run(&mut self, scenario: &str, repeat: u32, seed: u64, output: &RunOutput) {
        for name in output.channel_names() {
            if !self.channels.iter().any(|c| c == name) {
                self.channels.push(name.to_string());
                for row in &mut self.rows {
                    row.values.push(0.0);
                }
            }
        }
        for (i, &t) in output.years().iter().enumerate() {
            let values = self
                .channels
                .iter()
                .map(|c| output.channel(c).map_or(0.0, |v| v[i]))
                .collect();
            self.rows.push(ResultRow {
                scenario: scenario.to_string(),
                repeat,
                seed,
                t,
                values,
            });
        }
    }

    pub fn to_csv_string(&self) -> String {
        let mut out = String::new();
        let header: Vec<String> = self.columns().iter().map(|c| escape(c)).collect();
        out.push_str(&header.join(","));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&escape(&row.scenario));
            out.push(',');
            out.push_str(&row.repeat.to_string());
            out.push(',');
            out.push_str(&row.seed.to_string());
            out.push(',');
            out.push_str(&row.t.to_string());
            for value in &row.values {
                out.push(',');
                out.push_str(&value.to_string());
            }
            out.push('\n');
        }
        out
    }

    pub fn to_csv_path(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_csv_string())?;
        Ok(())
    }

    pub fn from_csv_string(text: &str) -> Result<Self> {
        let mut records = parse_records(text)?;
        if records.is_empty() {
            return Err(ModelError::Table("no header row".into()));
        }
        let header = records.remove(0);
        if header.len() < KEY_COLUMNS.len()
            || header[..KEY_COLUMNS.len()] != KEY_COLUMNS.map(String::from)
        {
            return Err(ModelError::Table(format!(
                "header must start with {}",
                KEY_COLUMNS.join(",")
            )));
        }
        let channels: Vec<String> = header[KEY_COLUMNS.len()..].to_vec();
        let mut rows = Vec::with_capacity(records.len());
        for (i, record) in records.into_iter().enumerate() {
            let line = i + 2;
            if record.len() != KEY_COLUMNS.len() + channels.len() {
                return Err(ModelError::Table(format!(
                    "line {line}: {} fields, expected {}",
                    record.len(),
                    KEY_COLUMNS.len() + channels.len()
                )));
            }
            let repeat = parse_field(&record[1], "repeat", line)?;
            let seed = parse_field(&record[2], "seed", line)?;
            let t = parse_field(&record[3], "t", line)?;
            let mut values = Vec::with_capacity(channels.len());
            for (field, channel) in record[KEY_COLUMNS.len()..].iter().zip(&channels) {
                values.push(parse_field(field, channel, line)?);
            }
            rows.push(ResultRow {
                scenario: record[0].clone(),
                repeat,
                seed,
                t,
                values,
            });
        }
        Ok(ResultSet { channels, rows })
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_csv_string(&text)
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, column: &str, line: usize) -> Result<T> {
    field.parse().map_err(|_| {
        ModelError::Table(format!("line {line}: bad {column} value {field:?}"))
    })
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Splits CSV text into records of fields. Quoted fields may contain
/// commas, doubled quotes, and newlines; a quote left open at end of
/// input is an error.
fn parse_records(text: &str) -> Result<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = text.chars().peekable();
    let mut pending = false;
    while let Some(c) = chars.next() {
        pending = true;
        if quoted {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        quoted = false;
                    }
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => quoted = true,
            ',' => {
                record.push(std::mem::take(&mut field));
            }
            '\n' => {
                // Blank lines separate nothing.
                if !record.is_empty() || !field.is_empty() {
                    record.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut record));
                }
                pending = false;
            }
            '\r' => {}
            _ => field.push(c),
        }
    }
    if quoted {
        return Err(ModelError::Table(
            "unterminated quoted field at end of input".into(),
        ));
    }
    if pending && (!record.is_empty() || !field.is_empty()) {
        record.push(field);
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(years: &[f64], channels: &[(&str, &[f64])]) -> RunOutput {
        let mut out = RunOutput::new(years.to_vec());
        for (name, values) in channels {
            out.insert_channel(*name, values.to_vec()).unwrap();
        }
        out
    }

    #[test]
    fn push_run_flattens_years() {
        let mut set = ResultSet::new();
        set.push_run(
            "Baseline",
            0,
            1,
            &output(&[2000.0, 2001.0], &[("mcpr", &[0.10, 0.12])]),
        );
        assert_eq!(set.len(), 2);
        assert_eq!(set.channels(), &["mcpr".to_string()]);
        assert_eq!(set.rows()[1].t, 2001.0);
        assert_eq!(set.rows()[1].values, vec![0.12]);
    }

    #[test]
    fn unseen_channels_backfill_zero() {
        let mut set = ResultSet::new();
        set.push_run("A", 0, 1, &output(&[2000.0], &[("mcpr", &[0.1])]));
        set.push_run(
            "B",
            0,
            1,
            &output(&[2000.0], &[("mcpr", &[0.2]), ("share_New", &[0.05])]),
        );
        assert_eq!(set.channels(), &["mcpr".to_string(), "share_New".to_string()]);
        assert_eq!(set.rows()[0].values, vec![0.1, 0.0]);
        assert_eq!(set.rows()[1].values, vec![0.2, 0.05]);
    }

    #[test]
    fn csv_round_trips_awkward_labels() {
        let mut set = ResultSet::new();
        set.push_run(
            "Pill +10%, \"bold\"\nplan",
            2,
            43,
            &output(&[2000.0], &[("mcpr", &[0.125])]),
        );
        let text = set.to_csv_string();
        let back = ResultSet::from_csv_string(&text).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn csv_round_trips_a_plain_table() {
        let mut set = ResultSet::new();
        for repeat in 0..2u32 {
            set.push_run(
                "Baseline",
                repeat,
                1 + repeat as u64,
                &output(
                    &[2000.0, 2001.0],
                    &[("mcpr", &[0.1, 0.2]), ("failure_index", &[0.9, 0.8])],
                ),
            );
        }
        let text = set.to_csv_string();
        assert!(text.starts_with("scenario,repeat,seed,t,mcpr,failure_index\n"));
        let back = ResultSet::from_csv_string(&text).unwrap();
        assert_eq!(back, set);
        assert_eq!(back.scenario_labels(), vec!["Baseline"]);
    }

    #[test]
    fn bad_tables_are_rejected() {
        assert!(ResultSet::from_csv_string("").is_err());
        assert!(ResultSet::from_csv_string("wrong,header\n").is_err());
        let ragged = "scenario,repeat,seed,t,mcpr\nA,0,1,2000\n";
        assert!(ResultSet::from_csv_string(ragged).is_err());
        let bad_number = "scenario,repeat,seed,t,mcpr\nA,zero,1,2000,0.1\n";
        let err = ResultSet::from_csv_string(bad_number).unwrap_err();
        assert!(matches!(err, ModelError::Table(msg) if msg.contains("repeat")));
    }

    #[test]
    fn unterminated_quotes_are_rejected() {
        let open = "scenario,repeat,seed,t,mcpr\n\"A,0,1,2000,0.1\n";
        let err = ResultSet::from_csv_string(open).unwrap_err();
        assert!(matches!(err, ModelError::Table(msg) if msg.contains("unterminated")));
    }

    #[test]
    fn header_only_table_is_empty() {
        let set = ResultSet::from_csv_string("scenario,repeat,seed,t,mcpr\n").unwrap();
        assert!(set.is_empty());
        assert_eq!(set.channels(), &["mcpr".to_string()]);
    }
}
