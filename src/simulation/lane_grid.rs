//! Static lane geometry
//!
//! Maps a lane index to its horizontal placement in the viewport.

/// Lane count used when nothing valid is configured
pub const DEFAULT_LANE_COUNT: usize = 3;

/// Equal-width lanes spanning the viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneGrid {
    lane_count: usize,
    lane_width: f32,
}

impl LaneGrid {
    /// Build a grid; a zero lane count falls back to the default
    pub fn new(lane_count: usize, viewport_width: f32) -> Self {
        let lane_count = if lane_count == 0 {
            DEFAULT_LANE_COUNT
        } else {
            lane_count
        };
        Self {
            lane_count,
            lane_width: viewport_width.max(1.0) / lane_count as f32,
        }
    }

    pub fn lane_count(&self) -> usize {
        self.lane_count
    }

    pub fn lane_width(&self) -> f32 {
        self.lane_width
    }

    pub fn contains(&self, lane: usize) -> bool {
        lane < self.lane_count
    }

    /// Clamp an arbitrary lane index into range
    pub fn clamp(&self, lane: usize) -> usize {
        lane.min(self.lane_count - 1)
    }

    /// Lane reached by stepping `offset` lanes from `lane`, if it exists
    pub fn neighbor(&self, lane: usize, offset: isize) -> Option<usize> {
        let target = lane.checked_add_signed(offset)?;
        self.contains(target).then_some(target)
    }

    /// Horizontal center of a lane
    pub fn lane_center(&self, lane: usize) -> f32 {
        self.lane_width * self.clamp(lane) as f32 + self.lane_width / 2.0
    }

    /// Left edge for a box of `width` centered in `lane`
    pub fn left_edge_for(&self, lane: usize, width: f32) -> f32 {
        self.lane_center(lane) - width / 2.0
    }

    /// Middle lane, where the player starts
    pub fn middle_lane(&self) -> usize {
        self.lane_count / 2
    }

    /// Lane whose span contains the horizontal coordinate `x`
    pub fn lane_at(&self, x: f32) -> usize {
        if x <= 0.0 {
            return 0;
        }
        self.clamp((x / self.lane_width) as usize)
    }
}
