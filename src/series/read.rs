use std::io;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Ensemble, RunMap, YearSeries};
use crate::error::{Error, Result};

#[derive(Debug, Deserialize, Serialize)]
struct YearRecord {
    year: i32,
    value: f64,
}

impl YearSeries {
    /// Reads a two-column `year,value` CSV file with headers.
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
        Self::from_csv_reader(rdr)
    }

    /// Same as [`YearSeries::read_csv`] over any reader.
    pub fn read_csv_from<R: io::Read>(reader: R) -> Result<Self> {
        Self::from_csv_reader(ReaderBuilder::new().has_headers(true).from_reader(reader))
    }

    fn from_csv_reader<R: io::Read>(mut rdr: csv::Reader<R>) -> Result<Self> {
        let mut records = Vec::new();
        for result in rdr.deserialize() {
            let record: YearRecord = result?;
            records.push((record.year, record.value));
        }

        if records.is_empty() {
            return Err(Error::EmptyFile);
        }

        Self::from_pairs(records)
    }

    /// Writes the series as a `year,value` CSV.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut wtr = WriterBuilder::new().has_headers(true).from_writer(writer);
        for (year, value) in self.iter() {
            wtr.serialize(YearRecord { year, value })?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl Ensemble {
    /// Reads the wide layout: a `year` column followed by one column per run.
    ///
    /// Run columns whose header parses as an integer keep that id; otherwise
    /// runs are numbered by position.
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
        Self::from_csv_reader(rdr)
    }

    /// Same as [`Ensemble::read_csv`] over any reader.
    pub fn read_csv_from<R: io::Read>(reader: R) -> Result<Self> {
        Self::from_csv_reader(ReaderBuilder::new().has_headers(true).from_reader(reader))
    }

    fn from_csv_reader<R: io::Read>(mut rdr: csv::Reader<R>) -> Result<Self> {
        let headers = rdr.headers()?.clone();
        if headers.len() < 2 {
            return Err(Error::invalid(
                "ensemble CSV needs a year column and at least one run column",
            ));
        }
        let ids = run_ids(&headers);

        let mut years = Vec::new();
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); ids.len()];
        let mut record = StringRecord::new();
        while rdr.read_record(&mut record)? {
            years.push(parse_field::<i32>(&record, 0)?);
            for (col, column) in columns.iter_mut().enumerate() {
                column.push(parse_field::<f64>(&record, col + 1)?);
            }
        }

        if years.is_empty() {
            return Err(Error::EmptyFile);
        }
        debug!(n_years = years.len(), n_runs = ids.len(), "read ensemble CSV");

        let runs = ids
            .into_iter()
            .zip(columns)
            .map(|(id, values)| YearSeries::new(years.clone(), values).map(|s| (id, s)))
            .collect::<Result<RunMap<_>>>()?;
        Self::new(runs)
    }

    /// Writes the wide layout with values rounded to one decimal.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut wtr = WriterBuilder::new().from_writer(writer);

        let mut header = vec!["year".to_string()];
        header.extend(self.run_ids().map(|id| id.to_string()));
        wtr.write_record(&header)?;

        let mut columns: Vec<_> = self.iter().map(|(_, s)| s.values().iter()).collect();
        for year in self.years() {
            let mut row = vec![year.to_string()];
            row.extend(columns.iter_mut().filter_map(Iterator::next).map(|v| format!("{v:.1}")));
            wtr.write_record(&row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn run_ids(headers: &StringRecord) -> Vec<usize> {
    let parsed: Option<Vec<usize>> = headers
        .iter()
        .skip(1)
        .map(|h| h.trim().parse().ok())
        .collect();
    parsed.unwrap_or_else(|| (0..headers.len() - 1).collect())
}

fn parse_field<T: std::str::FromStr>(record: &StringRecord, idx: usize) -> Result<T> {
    let raw = record.get(idx).unwrap_or("").trim();
    raw.parse().map_err(|_| {
        let line = record.position().map_or(0, csv::Position::line);
        Error::invalid(format!(
            "line {line}, column {}: cannot parse {raw:?}",
            idx + 1
        ))
    })
}
