use serde::{Deserialize, Serialize};

/// A single location fix. Immutable once received; newer fixes supersede it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Metres above the ellipsoid, when the provider reports one.
    #[serde(default)]
    pub altitude: Option<f64>,
    /// Horizontal accuracy radius in metres (larger is worse, 0 = unknown).
    #[serde(default)]
    pub accuracy: f64,
    /// Provider timestamp in milliseconds.
    #[serde(default)]
    pub timestamp: u64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            accuracy: 0.0,
            timestamp: 0,
        }
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = accuracy;
        self
    }

    pub fn at(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// True when `self` may replace `previous` (equal timestamps replace).
    pub fn supersedes(&self, previous: &GeoPoint) -> bool {
        self.timestamp >= previous.timestamp
    }

    /// Accuracy worse than `limit` metres. An unknown accuracy (0) is never flagged.
    pub fn is_low_accuracy(&self, limit: f64) -> bool {
        self.accuracy > limit
    }
}

/// A single compass fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    /// True-north heading in degrees, when the platform can provide it.
    #[serde(default)]
    pub true_heading: Option<f64>,
    /// Magnetic heading in degrees.
    pub magnetic_heading: f64,
    #[serde(default)]
    pub accuracy: f64,
    #[serde(default)]
    pub timestamp: u64,
}

impl Heading {
    /// Heading from a magnetic reading only.
    pub fn magnetic(degrees: f64) -> Self {
        Self {
            true_heading: None,
            magnetic_heading: degrees,
            accuracy: 0.0,
            timestamp: 0,
        }
    }

    /// Heading with a true-north reading; the magnetic reading mirrors it.
    pub fn true_north(degrees: f64) -> Self {
        Self {
            true_heading: Some(degrees),
            magnetic_heading: degrees,
            accuracy: 0.0,
            timestamp: 0,
        }
    }

    pub fn at(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Effective heading in [0, 360): true heading if present, magnetic otherwise.
    pub fn degrees(&self) -> f64 {
        normalize_degrees(self.true_heading.unwrap_or(self.magnetic_heading))
    }

    pub fn supersedes(&self, previous: &Heading) -> bool {
        self.timestamp >= previous.timestamp
    }
}

/// Wrap an angle into [0, 360).
pub fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Smallest absolute angle between two headings, in [0, 180].
pub fn heading_difference(a: f64, b: f64) -> f64 {
    let diff = normalize_degrees(a - b);
    if diff > 180.0 { 360.0 - diff } else { diff }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn true_heading_wins_over_magnetic() {
        let heading = Heading {
            true_heading: Some(12.0),
            magnetic_heading: 15.0,
            accuracy: 0.0,
            timestamp: 0,
        };
        assert_eq!(heading.degrees(), 12.0);
        assert_eq!(Heading::magnetic(-90.0).degrees(), 270.0);
    }

    #[test]
    fn heading_difference_wraps_through_north() {
        assert_eq!(heading_difference(350.0, 10.0), 20.0);
        assert_eq!(heading_difference(10.0, 350.0), 20.0);
        assert_eq!(heading_difference(0.0, 180.0), 180.0);
    }

    #[test]
    fn older_fix_does_not_supersede() {
        let newer = GeoPoint::new(1.0, 1.0).at(200);
        let older = GeoPoint::new(1.0, 1.0).at(100);
        assert!(newer.supersedes(&older));
        assert!(!older.supersedes(&newer));
    }

    #[test]
    fn unknown_accuracy_is_never_flagged() {
        assert!(!GeoPoint::new(0.0, 0.0).is_low_accuracy(30.0));
        assert!(GeoPoint::new(0.0, 0.0).with_accuracy(65.0).is_low_accuracy(30.0));
    }
}
