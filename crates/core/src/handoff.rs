use amply_stations::LngLat;

/// Turn-by-turn handoff to Google Maps, `lat,lng` ordered.
pub fn external_map_url(from: LngLat, to: LngLat) -> String {
    format!(
        "https://www.google.com/maps/dir/{},{}/{},{}",
        from.latitude, from.longitude, to.latitude, to.longitude
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_map_url() {
        assert_eq!(
            external_map_url(LngLat::new(106.7017, 10.7769), LngLat::new(106.6934, 10.7834)),
            "https://www.google.com/maps/dir/10.7769,106.7017/10.7834,106.6934"
        );
    }
}
