//! Staggered launch queue
//!
//! A volley fires one ball every `launch_interval` seconds. Each pending
//! launch is an entry with a due time on the pausable game clock; the frame
//! loop drains whatever is due. Clearing the queue cancels the rest.

use std::collections::VecDeque;

use glam::Vec2;

/// One deferred launch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledLaunch {
    /// Game-clock time at which the ball fires
    pub due: f64,
    /// Ball to fire
    pub projectile_id: u32,
    /// Unit launch direction
    pub dir: Vec2,
}

/// Pending launches, ordered by due time
#[derive(Debug, Clone, Default)]
pub struct LaunchQueue {
    pending: VecDeque<ScheduledLaunch>,
}

impl LaunchQueue {
    /// Schedule a volley: ball `i` fires at `now + i * interval`
    pub fn schedule_volley(&mut self, ids: &[u32], dir: Vec2, now: f64, interval: f64) {
        self.pending.clear();
        for (i, &projectile_id) in ids.iter().enumerate() {
            self.pending.push_back(ScheduledLaunch {
                due: now + i as f64 * interval,
                projectile_id,
                dir,
            });
        }
    }

    /// Pop every launch due at or before `now`
    pub fn drain_due(&mut self, now: f64) -> Vec<ScheduledLaunch> {
        let mut due = Vec::new();
        while let Some(next) = self.pending.front() {
            if next.due > now {
                break;
            }
            if let Some(launch) = self.pending.pop_front() {
                due.push(launch);
            }
        }
        due
    }

    /// Drop every pending launch
    pub fn cancel(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
