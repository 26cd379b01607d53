use crate::trajectory::{TrajectoryPath, round_to};
use chrono::{DateTime, Utc};
use serde::Serialize;

const FOCUS_ZOOM: u8 = 14;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub position: LatLng,
    pub timestamp: i64,
    pub hint: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccuracyCircle {
    pub center: LatLng,
    pub radius_m: f64,
}

/// Everything the map needs to draw one poll's path. Each render replaces the
/// previous state wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderState {
    pub generation: u64,
    pub rendered_at: Option<DateTime<Utc>>,
    pub center: LatLng,
    pub zoom: u8,
    pub polyline: Vec<LatLng>,
    pub markers: Vec<Marker>,
    pub circles: Vec<AccuracyCircle>,
    pub total_distance_km: f64,
}

pub fn render(path: &TrajectoryPath, previous: &RenderState, now: DateTime<Utc>) -> RenderState {
    let polyline: Vec<LatLng> = path
        .records
        .iter()
        .map(|record| LatLng {
            lat: record.latitude,
            lng: record.longitude,
        })
        .collect();

    let markers = path
        .records
        .iter()
        .zip(&polyline)
        .enumerate()
        .map(|(index, (record, position))| Marker {
            position: *position,
            timestamp: record.timestamp,
            hint: marker_hint(path, index),
        })
        .collect();

    let circles = path
        .records
        .iter()
        .zip(&polyline)
        .map(|(record, position)| AccuracyCircle {
            center: *position,
            radius_m: record.accuracy,
        })
        .collect();

    let (center, zoom) = match polyline.last() {
        Some(last) => (*last, FOCUS_ZOOM),
        None => (LatLng::default(), 0),
    };

    RenderState {
        generation: previous.generation + 1,
        rendered_at: Some(now),
        center,
        zoom,
        polyline,
        markers,
        circles,
        total_distance_km: round_to(path.total_distance_m() / 1000.0, 2),
    }
}

fn marker_hint(path: &TrajectoryPath, index: usize) -> String {
    let record = &path.records[index];
    let mut lines = vec![
        format_timestamp(record.timestamp),
        format!("Accuracy: {} meters", record.accuracy),
    ];

    // Segment i-1 ends at record i.
    if let Some(segment) = index.checked_sub(1).and_then(|prev| path.segments.get(prev)) {
        if segment.distance_m > 0.0 {
            lines.push(format!(
                "Distance: {} km",
                round_to(segment.distance_m / 1000.0, 2)
            ));
            lines.push(format!("Average speed: {}", format_speed(segment.speed_kmh)));
        }
        lines.push(format!(
            "Total distance: {} km",
            round_to(segment.cumulative_distance_m / 1000.0, 0)
        ));
        lines.push(format!(
            "Total average speed: {}",
            format_speed(segment.average_speed_kmh)
        ));
    }

    lines.join("\n")
}

fn format_speed(speed_kmh: Option<f64>) -> String {
    match speed_kmh {
        Some(speed) => format!("{} km/h", round_to(speed, 1)),
        None => "n/a".to_string(),
    }
}

fn format_timestamp(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|date| date.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
        .unwrap_or_else(|| format!("@{timestamp}"))
}
