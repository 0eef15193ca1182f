//! Message and field numbers from the FIT profile, and unit conversions.
//!
//! Only the numbers this crate (and typical consumers of activity files) refer
//! to are listed here; records of any global message number are decoded
//! regardless.

pub use crate::sans::record::TIMESTAMP_FIELD;

/// Global message numbers.
pub mod message {
    pub const FILE_ID: u16 = 0;
    pub const CAPABILITIES: u16 = 1;
    pub const DEVICE_SETTINGS: u16 = 2;
    pub const USER_PROFILE: u16 = 3;
    pub const ZONES_TARGET: u16 = 7;
    pub const SPORT: u16 = 12;
    pub const SESSION: u16 = 18;
    pub const LAP: u16 = 19;
    pub const RECORD: u16 = 20;
    pub const EVENT: u16 = 21;
    pub const DEVICE_INFO: u16 = 23;
    pub const WORKOUT: u16 = 26;
    pub const COURSE: u16 = 31;
    pub const COURSE_POINT: u16 = 32;
    pub const ACTIVITY: u16 = 34;
    pub const FILE_CREATOR: u16 = 49;
    pub const HRV: u16 = 78;
    pub const DEVELOPER_DATA_ID: u16 = 207;
    pub const FIELD_DESCRIPTION: u16 = 206;
}

/// Field numbers of the `device_info` message.
pub mod device_info {
    pub const DEVICE_INDEX: u8 = 0;
    pub const DEVICE_TYPE: u8 = 1;
    pub const MANUFACTURER: u8 = 2;
    pub const SERIAL_NUMBER: u8 = 3;
    pub const PRODUCT: u8 = 4;
    pub const SOFTWARE_VERSION: u8 = 5;
    pub const ANT_DEVICE_NUMBER: u8 = 21;

    /// `device_index` value of the device that created the file.
    pub const CREATOR: u8 = 0;
}

/// Field numbers of the `record` message.
pub mod record {
    pub const POSITION_LAT: u8 = 0;
    pub const POSITION_LONG: u8 = 1;
    pub const ALTITUDE: u8 = 2;
    pub const HEART_RATE: u8 = 3;
    pub const CADENCE: u8 = 4;
    pub const DISTANCE: u8 = 5;
    pub const SPEED: u8 = 6;
    pub const POWER: u8 = 7;
}

/// Seconds between the Unix epoch and the FIT epoch (1989-12-31T00:00:00Z).
pub const FIT_EPOCH_OFFSET: u32 = 631_065_600;

/// Convert a FIT `date_time` to seconds since the Unix epoch.
pub fn to_unix_seconds(timestamp: u32) -> u64 {
    u64::from(timestamp) + u64::from(FIT_EPOCH_OFFSET)
}

/// Convert an angle in semicircles (2^31 per 180 degrees) to degrees.
pub fn semicircles_to_degrees(semicircles: i32) -> f64 {
    f64::from(semicircles) * (180.0 / 2_147_483_648.0)
}

/// A position in degrees of latitude and longitude (WGS84).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semicircles() {
        assert_eq!(semicircles_to_degrees(0), 0.0);
        assert_eq!(semicircles_to_degrees(i32::MIN), -180.0);
        assert_eq!(semicircles_to_degrees(1 << 30), 90.0);

        let lat = semicircles_to_degrees(620_969_632);
        assert!(52.049_06 < lat && lat < 52.049_08, "{lat}");
    }

    #[test]
    fn unix_seconds() {
        assert_eq!(to_unix_seconds(0), 631_065_600);
        // 2021-01-01T00:00:00Z
        assert_eq!(to_unix_seconds(978_393_600), 1_609_459_200);
    }
}
