//! Colours for drawing routes and waypoints, and matching route plans to
//! the trucks drawn with them.

/// Route colours, chosen by route plan id so a route keeps its colour
/// across refreshes.
pub const ROUTE_COLORS: [&str; 54] = [
    "#3388ff", "#33cc33", "#ff3300", "#9933ff", "#ff9900", "#00ccff",
    "#8B4513", "#008080", "#FF1493", "#4B0082", "#FFD700", "#32CD32",
    "#1E90FF", "#FF69B4", "#7B68EE", "#BDB76B", "#9370DB", "#BC8F8F",
    "#00FA9A", "#66CDAA", "#FA8072", "#B22222", "#A52A2A", "#2E8B57",
    "#DB7093", "#FF7F50", "#9932CC", "#9ACD32", "#8FBC8F", "#E9967A",
    "#FFDEAD", "#F08080", "#CD5C5C", "#4682B4", "#6A5ACD", "#778899",
    "#708090", "#B0C4DE", "#ADD8E6", "#87CEEB", "#40E0D0", "#48D1CC",
    "#20B2AA", "#5F9EA0", "#4169E1", "#0000CD", "#0000FF", "#6495ED",
    "#00BFFF", "#7FFFD4", "#98FB98", "#90EE90", "#F0E68C", "#FAFAD2",
];

pub const START_COLOR: &str = "#4CAF50";
pub const END_COLOR: &str = "#F44336";
pub const VIA_COLOR: &str = "#2196F3";

pub fn route_color(route_plan_id: u64) -> &'static str {
    ROUTE_COLORS[(route_plan_id % ROUTE_COLORS.len() as u64) as usize]
}

/// Marker colour for the waypoint at `index` of `total`.
pub fn waypoint_color(index: usize, total: usize) -> &'static str {
    if index == 0 {
        START_COLOR
    } else if index + 1 == total {
        END_COLOR
    } else {
        VIA_COLOR
    }
}

/// A route plan's vehicle reference, stored as `PLATE/MAC`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehiclePlate<'a> {
    pub plate_number: &'a str,
    pub mac_id: &'a str,
}

impl<'a> VehiclePlate<'a> {
    /// Missing parts are empty.
    pub fn parse(raw: &'a str) -> Self {
        let mut parts = raw.split('/');
        Self {
            plate_number: parts.next().unwrap_or_default(),
            mac_id: parts.next().unwrap_or_default(),
        }
    }

    /// Matches by plate number or by tracker MAC id. Empty parts never match.
    pub fn matches_truck(&self, plate_number: &str, mac_id: &str) -> bool {
        (!self.plate_number.is_empty() && self.plate_number == plate_number)
            || (!self.mac_id.is_empty() && self.mac_id == mac_id)
    }
}
