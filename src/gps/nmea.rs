// src/gps/nmea.rs
//! NMEA sentence parsing

use super::data::GpsData;

/// Parse a single NMEA sentence and update GPS data.
///
/// Returns true when the sentence carried a new position (GGA).
pub fn parse_nmea_sentence(data: &mut GpsData, line: &str) -> bool {
    if !checksum_ok(line) {
        return false;
    }

    let parts: Vec<&str> = line.split('*').next().unwrap_or(line).split(',').collect();

    // GGA is the only sentence with both position and fix quality
    if line.starts_with("$GPGGA") || line.starts_with("$GNGGA") {
        parse_gpgga(data, &parts)
    } else {
        false
    }
}

/// Verify the `*hh` checksum when one is present
fn checksum_ok(line: &str) -> bool {
    let Some(body) = line.strip_prefix('$') else {
        return false;
    };

    match body.split_once('*') {
        Some((payload, checksum)) => {
            let expected = payload.bytes().fold(0u8, |acc, b| acc ^ b);
            u8::from_str_radix(checksum.trim(), 16).map_or(false, |c| c == expected)
        }
        None => true,
    }
}

/// Convert `ddmm.mmmm` plus hemisphere into signed decimal degrees
fn parse_coordinate(value: &str, hemisphere: &str, negative: &str) -> Option<f64> {
    if value.is_empty() || hemisphere.is_empty() {
        return None;
    }

    let raw = value.parse::<f64>().ok()?;
    let degrees = (raw / 100.0).trunc();
    let minutes = raw - degrees * 100.0;
    let decimal = degrees + minutes / 60.0;

    Some(if hemisphere == negative { -decimal } else { decimal })
}

/// Parse GPGGA (Global Positioning System Fix Data) sentence
fn parse_gpgga(data: &mut GpsData, parts: &[&str]) -> bool {
    if parts.len() < 15 {
        return false;
    }

    // Fix quality (field 6)
    if let Ok(quality) = parts[6].parse::<u8>() {
        data.fix_quality = Some(quality);
    }

    // HDOP (field 8), a rough horizontal accuracy is HDOP times receiver UERE
    if let Ok(hdop) = parts[8].parse::<f64>() {
        data.accuracy = Some(hdop * 5.0);
    }

    let latitude = parse_coordinate(parts[2], parts[3], "S");
    let longitude = parse_coordinate(parts[4], parts[5], "W");
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => {
            data.latitude = Some(lat);
            data.longitude = Some(lon);
            data.has_fix()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpgga_parsing() {
        let mut data = GpsData::new();
        let gpgga = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";

        assert!(parse_nmea_sentence(&mut data, gpgga));

        assert!((data.latitude.unwrap() - 48.1173).abs() < 1e-4);
        assert!((data.longitude.unwrap() - 11.516_666).abs() < 1e-4);
        assert!((data.accuracy.unwrap() - 4.5).abs() < 1e-9);
        assert_eq!(data.fix_quality, Some(1));
    }

    #[test]
    fn test_gpgga_southern_western_hemisphere() {
        let mut data = GpsData::new();
        let gpgga = "$GPGGA,123519,3352.128,S,15112.558,W,1,08,0.9,10.0,M,46.9,M,,";

        assert!(parse_nmea_sentence(&mut data, gpgga));
        assert!(data.latitude.unwrap() < -33.0);
        assert!(data.longitude.unwrap() < -151.0);
    }

    #[test]
    fn test_gpgga_without_fix() {
        let mut data = GpsData::new();
        let gpgga = "$GPGGA,123519,,,,,0,00,,,M,,M,,";

        assert!(!parse_nmea_sentence(&mut data, gpgga));
        assert!(data.latitude.is_none());
    }

    #[test]
    fn test_gprmc_does_not_produce_a_fix() {
        let mut data = GpsData::new();
        let gprmc = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";

        assert!(!parse_nmea_sentence(&mut data, gprmc));
        assert!(data.latitude.is_none());
    }

    #[test]
    fn test_bad_checksum_is_ignored() {
        let mut data = GpsData::new();
        let gpgga = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*00";

        assert!(!parse_nmea_sentence(&mut data, gpgga));
        assert!(data.latitude.is_none());
    }

    #[test]
    fn test_invalid_sentence() {
        let mut data = GpsData::new();

        assert!(!parse_nmea_sentence(&mut data, "$INVALID,123,456"));
        assert!(!parse_nmea_sentence(&mut data, "garbage"));
        assert!(data.latitude.is_none());
        assert!(data.longitude.is_none());
    }
}
