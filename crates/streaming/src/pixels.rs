use std::collections::{BTreeSet, HashMap};

use foundation::{Bounds, Coordinate};
use runtime::budget::FrameBudget;
use runtime::work_queue::{PushOutcome, WorkQueue};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::io::FetchError;

/// One coloured world cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pixel {
    /// Packed `0xRRGGBBAA`.
    pub color: u32,
    pub owner: String,
    pub action: String,
    pub text: String,
    pub timestamp: u64,
}

/// Sparse map from world coordinate to pixel.
///
/// Pixels are only ever overwritten, never deleted. Loading a region is
/// delegated: `request_region` queues non-wrapping parts that the host hands
/// to a pixel source, and the results come back through `complete_region`.
#[derive(Debug, Default)]
pub struct PixelStore {
    pixels: HashMap<Coordinate, Pixel>,
    queue: WorkQueue<Bounds, ()>,
    in_flight: BTreeSet<Bounds>,
}

impl PixelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, at: Coordinate) -> Option<&Pixel> {
        self.pixels.get(&at)
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Overwrite every given cell. Returns how many cells changed.
    pub fn set_many(&mut self, entries: impl IntoIterator<Item = (Coordinate, Pixel)>) -> usize {
        let mut changed = 0;
        for (at, pixel) in entries {
            if self.pixels.get(&at) != Some(&pixel) {
                self.pixels.insert(at, pixel);
                changed += 1;
            }
        }
        changed
    }

    /// Queue a load of `bounds`, split into non-wrapping parts.
    ///
    /// A part already queued or in flight is not queued again. Returns the
    /// number of parts newly queued.
    pub fn request_region(&mut self, bounds: Bounds) -> usize {
        let mut queued = 0;
        for part in bounds.split_wrapping() {
            if self.in_flight.contains(&part) {
                continue;
            }
            if self.queue.push(part, 0, ()) == PushOutcome::Queued {
                queued += 1;
            }
        }
        if queued > 0 {
            debug!(?bounds, parts = queued, "pixel region requested");
        }
        queued
    }

    pub fn pending_regions(&self) -> usize {
        self.queue.len() + self.in_flight.len()
    }

    /// Hand queued region loads to the host, as many as the budget allows.
    pub fn drain_requests(&mut self, budget: &mut FrameBudget) -> Vec<Bounds> {
        let mut parts = Vec::new();
        while let Some((part, ())) = self.queue.pop_next_with_budget(budget) {
            self.in_flight.insert(part);
            parts.push(part);
        }
        parts
    }

    /// Apply a region load. Failures are logged and dropped; the region may be
    /// requested again. Returns how many cells changed.
    pub fn complete_region(
        &mut self,
        bounds: Bounds,
        result: Result<Vec<(Coordinate, Pixel)>, FetchError>,
    ) -> usize {
        self.in_flight.remove(&bounds);
        match result {
            Ok(pixels) => self.set_many(pixels),
            Err(err) => {
                warn!(?bounds, error = %err, "pixel region query failed");
                0
            }
        }
    }
}
