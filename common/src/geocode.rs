//! 逆ジオコーディング（OpenStreetMap Nominatim）

use crate::error::{Error, Result};
use crate::types::Coordinates;
use serde::Deserialize;

pub const NOMINATIM_REVERSE_URL: &str = "https://nominatim.openstreetmap.org/reverse";

/// 地名が取れなかったときの表示
pub const DEFAULT_PLACE_NAME: &str = "your region";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReverseResponse {
    address: Address,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    county: Option<String>,
}

pub fn reverse_geocode_url(at: Coordinates) -> String {
    format!(
        "{}?lat={}&lon={}&format=json",
        NOMINATIM_REVERSE_URL, at.latitude, at.longitude
    )
}

/// レスポンスから地名を取り出す（city → town → village → county）
pub fn parse_reverse_geocode(body: &str) -> Result<String> {
    let response: ReverseResponse = serde_json::from_str(body)?;
    let Address {
        city,
        town,
        village,
        county,
    } = response.address;
    [city, town, village, county]
        .into_iter()
        .flatten()
        .find(|name| !name.trim().is_empty())
        .ok_or_else(|| Error::Transport("no place name in geocoding response".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prefers_city() {
        let body = r#"{"address": {"city": "Nairobi", "county": "Nairobi County"}}"#;
        assert_eq!(parse_reverse_geocode(body).unwrap(), "Nairobi");
    }

    #[test]
    fn test_parse_falls_through_to_county() {
        let body = r#"{"address": {"county": "Trans-Nzoia", "country": "Kenya"}}"#;
        assert_eq!(parse_reverse_geocode(body).unwrap(), "Trans-Nzoia");
    }

    #[test]
    fn test_parse_without_place() {
        assert!(parse_reverse_geocode(r#"{"error": "Unable to geocode"}"#).is_err());
        assert!(parse_reverse_geocode("not json").is_err());
    }

    #[test]
    fn test_url() {
        assert_eq!(
            reverse_geocode_url(Coordinates::new(-1.25, 36.5)),
            "https://nominatim.openstreetmap.org/reverse?lat=-1.25&lon=36.5&format=json"
        );
    }
}
