//! Per-lane ordered index of traffic positions
//!
//! Rebuilt once per tick and shared by behavior sensing and the spawner.
//! A vehicle mid lane-change is indexed in both lanes it touches.

use ordered_float::OrderedFloat;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use super::traffic::TrafficVehicle;
use super::types::{SimId, TrafficId};

type LaneKey = (OrderedFloat<f32>, TrafficId);

#[derive(Debug, Clone, Default)]
pub struct LaneOccupancy {
    lanes: Vec<BTreeSet<LaneKey>>,
}

impl LaneOccupancy {
    pub fn build<'a>(
        lane_count: usize,
        traffic: impl IntoIterator<Item = &'a TrafficVehicle>,
    ) -> Self {
        let mut lanes = vec![BTreeSet::new(); lane_count];
        for vehicle in traffic {
            let key = (OrderedFloat(vehicle.y), vehicle.id);
            for (lane, set) in lanes.iter_mut().enumerate() {
                if vehicle.lane.occupies(lane) {
                    set.insert(key);
                }
            }
        }
        Self { lanes }
    }

    /// Build from a traffic map keyed by id
    pub fn from_map(lane_count: usize, traffic: &BTreeMap<TrafficId, TrafficVehicle>) -> Self {
        Self::build(lane_count, traffic.values())
    }

    /// Index a vehicle in one more lane, e.g. right after a lane change request
    pub fn insert(&mut self, lane: usize, y: f32, id: TrafficId) {
        if let Some(set) = self.lanes.get_mut(lane) {
            set.insert((OrderedFloat(y), id));
        }
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Vehicles in `lane` with `lo < y < hi`
    pub fn in_window(&self, lane: usize, lo: f32, hi: f32) -> impl Iterator<Item = (f32, TrafficId)> + '_ {
        self.lanes
            .get(lane)
            .filter(|_| lo < hi)
            .into_iter()
            .flat_map(move |set| {
                set.range((
                    Bound::Excluded((OrderedFloat(lo), TrafficId(SimId(usize::MAX)))),
                    Bound::Excluded((OrderedFloat(hi), TrafficId::FIRST)),
                ))
            })
            .map(|(y, id)| (y.into_inner(), *id))
    }

    /// Any vehicle other than `exclude` within `radius` of `y` in `lane`
    pub fn any_near(&self, lane: usize, y: f32, radius: f32, exclude: Option<TrafficId>) -> bool {
        self.in_window(lane, y - radius, y + radius)
            .any(|(_, id)| Some(id) != exclude)
    }

    /// Any vehicle in `lane` strictly inside the window `lo < y < hi`
    pub fn any_in_window(&self, lane: usize, lo: f32, hi: f32) -> bool {
        self.in_window(lane, lo, hi).next().is_some()
    }

    /// Nearest vehicle strictly ahead of (above) `y` in `lane`
    pub fn nearest_ahead(&self, lane: usize, y: f32, exclude: Option<TrafficId>) -> Option<(f32, TrafficId)> {
        self.lanes
            .get(lane)?
            .range(..(OrderedFloat(y), TrafficId::FIRST))
            .rev()
            .map(|(y, id)| (y.into_inner(), *id))
            .find(|(_, id)| Some(*id) != exclude)
    }

    /// Forward gap from row `y` in `lane`: distance to the nearest vehicle
    /// above `y + behind`, or infinity for an empty lane ahead
    pub fn forward_gap(&self, lane: usize, y: f32, behind: f32) -> f32 {
        match self.nearest_ahead(lane, y + behind, None) {
            Some((other_y, _)) => y - other_y,
            None => f32::INFINITY,
        }
    }
}
