use proptest::prelude::*;

use cutcost_core::drawing::{DxfEntity, Line, LwPolyline};
use cutcost_core::geometry::Point3;
use cutcost_core::units::{ConversionTable, LengthUnit};

fn coord() -> impl Strategy<Value = f64> {
    -1.0e4..1.0e4f64
}

fn point() -> impl Strategy<Value = Point3> {
    (coord(), coord(), coord()).prop_map(|(x, y, z)| Point3::new(x, y, z))
}

fn line(start: Point3, end: Point3) -> DxfEntity {
    DxfEntity::Line(Line {
        start: Some(start),
        end: Some(end),
        layer: "0".to_string(),
    })
}

proptest! {
    #[test]
    fn line_length_is_symmetric(a in point(), b in point()) {
        let forward = line(a, b).length().unwrap();
        let backward = line(b, a).length().unwrap();
        prop_assert!((forward - backward).abs() <= 1e-9 * forward.max(1.0));
        prop_assert!(forward >= 0.0);
    }

    #[test]
    fn polyline_sums_consecutive_segments(vertices in prop::collection::vec(point(), 1..12)) {
        let expected: f64 = vertices
            .windows(2)
            .map(|pair| line(pair[0], pair[1]).length().unwrap())
            .sum();
        let polyline = DxfEntity::LwPolyline(LwPolyline {
            vertices: vertices.clone(),
            is_closed: false,
            layer: "0".to_string(),
        });
        let length = polyline.length().unwrap();
        prop_assert!((length - expected).abs() <= 1e-9 * expected.max(1.0));
        if vertices.len() == 1 {
            prop_assert_eq!(length, 0.0);
        }
    }

    #[test]
    fn conversion_is_linear(length in 0.0..1.0e6f64) {
        let table = ConversionTable::standard();
        for unit in LengthUnit::ALL {
            let converted = table.convert(length, unit);
            prop_assert!((converted - length * table.factor(unit)).abs() <= 1e-9 * converted.max(1.0));
        }
    }
}
