// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! Event selection based on the primary vertex and the centrality.

use crate::errors::EventError;
use crate::event::Event;
use crate::input::{CentralityClasses, EventCuts};

/// Properties of an event that passed the selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectedEvent {
    pub rho: f64,
    pub vertex_z: f64,
    /// Centrality from the main (V0M) estimator.
    pub centrality: f64,
    /// Index of the centrality class.
    pub class: usize,
}

/// Check that the event should be analyzed.
pub fn select_event(
    event: &Event,
    cuts: &EventCuts,
    classes: &CentralityClasses,
) -> Result<SelectedEvent, EventError> {
    let rho = event.rho().ok_or(EventError::MissingRho)?;
    let vertex = event.vertex().ok_or(EventError::MissingVertex)?;

    if vertex.z().abs() > cuts.abs_vertex_z() || !vertex.z().is_finite() {
        return Err(EventError::VertexOutOfRange(vertex.z()));
    }

    if let Some(z_spd) = vertex.z_spd() {
        let difference = (z_spd - vertex.z()).abs();
        if difference > cuts.max_vertex_difference() {
            return Err(EventError::VertexMismatch(difference));
        }
    }

    let centrality = event.centrality().ok_or(EventError::MissingCentrality)?;
    let v0m = centrality.v0m();
    if !(v0m > 0.0 && v0m < 100.0) {
        return Err(EventError::CentralityOutOfRange(v0m));
    }

    let difference = (v0m - centrality.trk()).abs();
    if !(difference <= cuts.max_centrality_difference()) {
        return Err(EventError::CentralityMismatch(difference));
    }

    let class = classes
        .find(v0m)
        .ok_or(EventError::NoCentralityClass(v0m))?;

    Ok(SelectedEvent {
        rho,
        vertex_z: vertex.z(),
        centrality: v0m,
        class,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Centrality, Vertex};

    fn base_event() -> Event {
        Event::new(167813)
            .with_vertex(Vertex::new(2.0, Some(2.1)))
            .with_centrality(Centrality::new(25.0, 27.0))
            .with_rho(40.0)
    }

    fn select(event: &Event) -> Result<SelectedEvent, EventError> {
        select_event(event, &EventCuts::default(), &CentralityClasses::default())
    }

    #[test]
    fn pass() {
        let selected = select(&base_event()).unwrap();
        assert_eq!(selected.rho, 40.0);
        assert_eq!(selected.vertex_z, 2.0);
        assert_eq!(selected.centrality, 25.0);
        assert_eq!(selected.class, 1);
    }

    #[test]
    fn missing_data() {
        assert_eq!(
            select(&Event::new(1).with_vertex(Vertex::new(0.0, None))),
            Err(EventError::MissingRho)
        );
        assert_eq!(
            select(&Event::new(1).with_rho(1.0)),
            Err(EventError::MissingVertex)
        );
        assert_eq!(
            select(&Event::new(1).with_rho(1.0).with_vertex(Vertex::new(0.0, None))),
            Err(EventError::MissingCentrality)
        );
    }

    #[test]
    fn vertex_cuts() {
        let far = base_event().with_vertex(Vertex::new(-10.5, None));
        assert_eq!(select(&far), Err(EventError::VertexOutOfRange(-10.5)));

        let edge = base_event().with_vertex(Vertex::new(10.0, None));
        assert!(select(&edge).is_ok());

        let mismatch = base_event().with_vertex(Vertex::new(1.0, Some(1.75)));
        assert_eq!(select(&mismatch), Err(EventError::VertexMismatch(0.75)));

        // SPD vertex is optional
        let no_spd = base_event().with_vertex(Vertex::new(1.0, None));
        assert!(select(&no_spd).is_ok());
    }

    #[test]
    fn centrality_cuts() {
        for value in [0.0, 100.0, -5.0, 120.0] {
            let event = base_event().with_centrality(Centrality::new(value, value));
            assert_eq!(select(&event), Err(EventError::CentralityOutOfRange(value)));
        }

        let event = base_event().with_centrality(Centrality::new(30.0, 36.0));
        assert_eq!(select(&event), Err(EventError::CentralityMismatch(6.0)));

        let event = base_event().with_centrality(Centrality::new(30.0, 35.0));
        assert!(select(&event).is_ok());
    }

    #[test]
    fn no_class() {
        let classes = CentralityClasses::new(vec![0.0, 10.0, 50.0]).unwrap();
        let event = base_event().with_centrality(Centrality::new(60.0, 60.0));
        assert_eq!(
            select_event(&event, &EventCuts::default(), &classes),
            Err(EventError::NoCentralityClass(60.0))
        );

        let event = base_event().with_centrality(Centrality::new(10.0, 10.0));
        assert_eq!(
            select_event(&event, &EventCuts::default(), &classes)
                .unwrap()
                .class,
            1
        );
    }
}
