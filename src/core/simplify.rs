//! Greedy one-pass path simplification
//!
//! A waypoint closer than `min_distance` to the last retained point is
//! dropped, except that a change of tool activation always keeps the points
//! on both sides of the change. State is O(1): the last retained position,
//! the last seen tool flag and one pending candidate.

use crate::core::state::{Point, Waypoint};

/// A waypoint that survived simplification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplifiedPoint {
    pub waypoint: Waypoint,
    /// Waypoints dropped since the previous retained point
    pub merged: usize,
}

impl SimplifiedPoint {
    pub fn position(&self) -> Point {
        self.waypoint.position
    }

    pub fn tool_active(&self) -> bool {
        self.waypoint.tool_active
    }

    pub fn line(&self) -> usize {
        self.waypoint.line
    }
}

/// Push-style simplifier
#[derive(Debug, Clone)]
pub struct PathSimplifier {
    min_distance: f64,
    last_retained: Option<Point>,
    last_active: Option<bool>,
    pending: Option<Waypoint>,
    skipped: usize,
    dropped: usize,
}

impl PathSimplifier {
    /// A threshold of zero or less passes every waypoint through.
    pub fn new(min_distance: f64) -> Self {
        Self {
            min_distance,
            last_retained: None,
            last_active: None,
            pending: None,
            skipped: 0,
            dropped: 0,
        }
    }

    /// Feed one waypoint; yields the points retained because of it, in order.
    pub fn push(&mut self, waypoint: Waypoint) -> impl Iterator<Item = SimplifiedPoint> + use<> {
        let retained = self.step(waypoint);
        retained.into_iter().flatten()
    }

    /// Waypoints dropped so far
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    fn step(&mut self, waypoint: Waypoint) -> [Option<SimplifiedPoint>; 2] {
        if self.min_distance <= 0.0 {
            return [None, Some(self.retain(waypoint))];
        }

        let transition = self
            .last_active
            .is_some_and(|active| active != waypoint.tool_active);
        self.last_active = Some(waypoint.tool_active);

        let last = match self.last_retained {
            Some(last) if !transition => last,
            // First point, or a tool change: keep the point before it too
            _ => {
                let before = self.pending.take().map(|pending| {
                    self.skipped -= 1;
                    self.dropped -= 1;
                    self.retain(pending)
                });
                return [before, Some(self.retain(waypoint))];
            }
        };

        if last.distance(&waypoint.position) < self.min_distance {
            self.pending = Some(waypoint);
            self.skipped += 1;
            self.dropped += 1;
            return [None, None];
        }

        self.pending = None;
        [None, Some(self.retain(waypoint))]
    }

    fn retain(&mut self, waypoint: Waypoint) -> SimplifiedPoint {
        self.last_retained = Some(waypoint.position);
        let merged = std::mem::take(&mut self.skipped);
        SimplifiedPoint { waypoint, merged }
    }
}

/// Simplify a whole sequence at once
pub fn simplify<I>(waypoints: I, min_distance: f64) -> Vec<SimplifiedPoint>
where
    I: IntoIterator<Item = Waypoint>,
{
    let mut simplifier = PathSimplifier::new(min_distance);
    let mut retained = Vec::new();
    for waypoint in waypoints {
        retained.extend(simplifier.push(waypoint));
    }
    retained
}
