//! Export of geo scan results as a script consumable by the map page.

use crate::error::StoreError;
use crate::geo::GeoPoint;
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

/// Render `var addressPoints = [...];` with one `[lat, lon, "ip"]` row per
/// point.
pub fn render_address_points(points: &[GeoPoint]) -> String {
    let mut out = String::from("var addressPoints = [\n");
    for point in points {
        let _ = writeln!(
            out,
            "[{}, {}, {}],",
            point.latitude,
            point.longitude,
            serde_json::Value::from(point.ip.as_str())
        );
    }
    out.push_str("];\n");
    out
}

pub fn write_address_points(path: &Path, points: &[GeoPoint]) -> Result<(), StoreError> {
    let io_error = |source| StoreError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::write(path, render_address_points(points)).map_err(io_error)?;
    info!(path = %path.display(), points = points.len(), "wrote address points");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_rows() {
        let points = vec![
            GeoPoint {
                latitude: 52.3702,
                longitude: 4.8952,
                ip: "192.0.2.1".to_string(),
            },
            GeoPoint {
                latitude: -33.8688,
                longitude: 151.2093,
                ip: "2001:db8::1".to_string(),
            },
        ];
        assert_eq!(
            render_address_points(&points),
            "var addressPoints = [\n[52.3702, 4.8952, \"192.0.2.1\"],\n[-33.8688, 151.2093, \"2001:db8::1\"],\n];\n"
        );
    }

    #[test]
    fn empty_export_is_still_valid_script() {
        assert_eq!(render_address_points(&[]), "var addressPoints = [\n];\n");
    }
}
