// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! This module contains the histogram sink interface and its in-memory implementation.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;

use crate::errors::WriteError;

mod histogram;

pub use histogram::{BinAxis, BinPosition, Histogram, Histogram1D, Histogram2D, Profile};

/// Destination of all histograms produced by the analysis.
///
/// Histograms are identified by their names. Filling a histogram that has not been
/// booked is not an error.
pub trait HistogramSink {
    /// Book a one-dimensional histogram.
    fn book_1d(&mut self, name: &str, axis: BinAxis);

    /// Book a two-dimensional histogram.
    fn book_2d(&mut self, name: &str, x_axis: BinAxis, y_axis: BinAxis);

    /// Book a profile (mean of y in bins of x).
    fn book_profile(&mut self, name: &str, axis: BinAxis);

    fn fill(&mut self, name: &str, x: f64, weight: f64);

    fn fill_2d(&mut self, name: &str, x: f64, y: f64, weight: f64);

    fn fill_profile(&mut self, name: &str, x: f64, y: f64);
}

/// Histograms stored in memory in the order in which they were booked.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HistogramCollection {
    histograms: IndexMap<String, Histogram>,
}

impl HistogramCollection {
    pub fn new() -> Self {
        HistogramCollection::default()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.histograms.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.histograms.is_empty()
    }

    /// Names of all booked histograms.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.histograms.keys().map(|name| name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Histogram> {
        self.histograms.get(name)
    }

    pub fn histogram_1d(&self, name: &str) -> Option<&Histogram1D> {
        match self.histograms.get(name) {
            Some(Histogram::OneD(h)) => Some(h),
            _ => None,
        }
    }

    pub fn histogram_2d(&self, name: &str) -> Option<&Histogram2D> {
        match self.histograms.get(name) {
            Some(Histogram::TwoD(h)) => Some(h),
            _ => None,
        }
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        match self.histograms.get(name) {
            Some(Histogram::Profile(p)) => Some(p),
            _ => None,
        }
    }

    fn book(&mut self, name: &str, histogram: Histogram) {
        if self.histograms.contains_key(name) {
            log::warn!("Histogram '{}' is already booked. Keeping the original.", name);
            return;
        }

        self.histograms.insert(name.to_owned(), histogram);
    }

    /// Write all histograms into a yaml file.
    pub fn write_yaml(&self, filename: impl AsRef<Path>, overwrite: bool) -> Result<(), WriteError> {
        let mut writer = Self::prepare_file(&filename, overwrite)?;
        serde_yaml::to_writer(&mut writer, self)
            .map_err(|_| WriteError::CouldNotWriteYaml(Box::from(filename.as_ref())))?;
        writer
            .flush()
            .map_err(|_| WriteError::CouldNotWriteYaml(Box::from(filename.as_ref())))
    }

    /// Back up the output file if needed, create it and write the header.
    fn prepare_file(
        filename: &impl AsRef<Path>,
        overwrite: bool,
    ) -> Result<BufWriter<File>, WriteError> {
        Self::try_backup_file(filename, overwrite)?;
        let mut writer = Self::create_and_open_file(filename)?;
        Self::write_header(&mut writer, filename)?;
        Ok(writer)
    }

    #[inline(always)]
    fn write_header(writer: &mut BufWriter<File>, filename: &impl AsRef<Path>) -> Result<(), WriteError> {
        writeln!(
            writer,
            "# Histograms of the rho modulation analysis produced with 'rhovn v{}'.",
            crate::RHOVN_VERSION,
        )
        .map_err(|_| WriteError::CouldNotWriteYaml(Box::from(filename.as_ref())))
    }

    /// Create and open file for buffered writing.
    #[inline(always)]
    fn create_and_open_file(filename: &impl AsRef<Path>) -> Result<BufWriter<File>, WriteError> {
        let file = File::create(filename.as_ref())
            .map_err(|_| WriteError::CouldNotCreateFile(Box::from(filename.as_ref())))?;

        Ok(BufWriter::new(file))
    }

    /// Back up an output file, if it is necessary and if it is requested.
    fn try_backup_file(filename: &impl AsRef<Path>, overwrite: bool) -> Result<(), WriteError> {
        if filename.as_ref().exists() {
            if !overwrite {
                log::warn!(
                    "Output yaml file '{}' already exists. Backing it up.",
                    filename.as_ref().to_string_lossy()
                );
                backitup::backup(filename.as_ref())
                    .map_err(|_| WriteError::CouldNotBackupFile(Box::from(filename.as_ref())))?;
            } else {
                log::warn!(
                    "Output yaml file '{}' already exists. It will be overwritten as requested.",
                    filename.as_ref().to_string_lossy()
                );
            }
        }

        Ok(())
    }
}

impl HistogramSink for HistogramCollection {
    fn book_1d(&mut self, name: &str, axis: BinAxis) {
        self.book(name, Histogram::OneD(Histogram1D::new(axis)));
    }

    fn book_2d(&mut self, name: &str, x_axis: BinAxis, y_axis: BinAxis) {
        self.book(name, Histogram::TwoD(Histogram2D::new(x_axis, y_axis)));
    }

    fn book_profile(&mut self, name: &str, axis: BinAxis) {
        self.book(name, Histogram::Profile(Profile::new(axis)));
    }

    fn fill(&mut self, name: &str, x: f64, weight: f64) {
        match self.histograms.get_mut(name) {
            Some(Histogram::OneD(h)) => h.fill(x, weight),
            _ => log::warn!("Cannot fill unknown one-dimensional histogram '{}'.", name),
        }
    }

    fn fill_2d(&mut self, name: &str, x: f64, y: f64, weight: f64) {
        match self.histograms.get_mut(name) {
            Some(Histogram::TwoD(h)) => h.fill(x, y, weight),
            _ => log::warn!("Cannot fill unknown two-dimensional histogram '{}'.", name),
        }
    }

    fn fill_profile(&mut self, name: &str, x: f64, y: f64) {
        match self.histograms.get_mut(name) {
            Some(Histogram::Profile(p)) => p.fill(x, y),
            _ => log::warn!("Cannot fill unknown profile '{}'.", name),
        }
    }
}
