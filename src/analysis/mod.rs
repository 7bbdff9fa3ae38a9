// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! This module contains the implementation of the analysis logic.

use crate::errors::ReadError;
use crate::event::Event;
use crate::input::Analysis;
use crate::presentation::HistogramCollection;

pub mod azimuth;
mod fitting;
pub mod flow;
pub mod leading;
pub mod modulation;
pub mod random_cone;
pub mod resolution;
pub mod runs;
pub mod selection;
pub mod task;

use task::RhoVnTask;

impl Analysis {
    /// Analyze all events from the `events` file and write the histograms into the `output` file.
    /// Returns the collected histograms.
    pub fn run(&self) -> Result<HistogramCollection, Box<dyn std::error::Error + Send + Sync>> {
        self.info();

        let path = self.events().as_ref().ok_or(ReadError::NoEvents)?;
        log::info!("Reading events from '{}'...", path);
        let events = Event::read_events(path)?;

        let mut task = RhoVnTask::initialize(self, HistogramCollection::new())?;
        for event in events.iter() {
            // skipped events are logged by the task
            let _ = task.process_event(event);
        }

        let histograms = task.finalize();

        if let Some(output) = self.output() {
            log::info!("Writing histograms into '{}'...", output);
            histograms.write_yaml(output, self.overwrite())?;
        }

        Ok(histograms)
    }
}
