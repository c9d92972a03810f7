use std::path::PathBuf;

use cutcost_core::drawing::{Drawing, DxfEntity};
use cutcost_io::{DrawingFacade, DrawingLoader, DxfFacade, IoError};
use serde_json::json;

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/data");
    path.push(name);
    path
}

#[test]
fn load_plate_measures_lines_and_polyline() {
    let loader = DxfFacade::new();
    let drawing = loader.load(&fixture("plate.dxf")).expect("读取 DXF 失败");
    let Drawing::Dxf(dxf) = &drawing else {
        panic!("期望 DXF 图纸");
    };

    let kinds: Vec<&str> = dxf.entities().iter().map(DxfEntity::kind_name).collect();
    assert_eq!(kinds, ["LINE", "LINE", "LINE", "LINE", "LWPOLYLINE", "CIRCLE"]);

    let report = drawing.measure();
    // 300 mm 外框 + 70 mm 折线
    assert!((report.length_cm - 37.0).abs() < 1e-9);
    assert_eq!(report.measured, 5);
    assert_eq!(report.skipped, 1);
}

#[test]
fn plate_entities_serialize_as_expected() {
    let loader = DxfFacade::new();
    let drawing = loader.load(&fixture("plate.dxf")).expect("读取 DXF 失败");
    let Drawing::Dxf(dxf) = drawing else {
        panic!("期望 DXF 图纸");
    };

    let value = serde_json::to_value(&dxf.entities()[4]).expect("序列化失败");
    assert_eq!(
        value,
        json!({
            "LwPolyline": {
                "vertices": [[10.0, 10.0, 0.0], [40.0, 10.0, 0.0], [40.0, 50.0, 0.0]],
                "is_closed": false,
                "layer": "CUT"
            }
        })
    );

    let circle = serde_json::to_value(&dxf.entities()[5]).expect("序列化失败");
    assert_eq!(circle, json!({ "Unsupported": { "kind": "CIRCLE" } }));
}

#[test]
fn arcs_only_drawing_measures_zero() {
    let facade = DrawingFacade::new();
    let drawing = facade.load(&fixture("arcs_only.dxf")).expect("读取 DXF 失败");
    let report = drawing.measure();
    assert!(report.is_zero());
    assert_eq!(report.measured, 0);
    assert_eq!(report.skipped, 2);
}

#[test]
fn swapped_line_endpoints_measure_the_same() {
    let forward = "0\nSECTION\n2\nENTITIES\n0\nLINE\n10\n1.5\n20\n-2\n11\n7\n21\n9.25\n0\nENDSEC\n0\nEOF\n";
    let backward = "0\nSECTION\n2\nENTITIES\n0\nLINE\n10\n7\n20\n9.25\n11\n1.5\n21\n-2\n0\nENDSEC\n0\nEOF\n";
    let loader = DxfFacade::new();
    let a = loader.parse_str(forward).expect("parse").measure();
    let b = loader.parse_str(backward).expect("parse").measure();
    assert_eq!(a.length_cm, b.length_cm);
}

#[test]
fn malformed_coordinate_is_reported_as_invalid_document() {
    let source = "0\nSECTION\n2\nENTITIES\n0\nLINE\n10\nabc\n20\n0\n11\n1\n21\n1\n0\nENDSEC\n0\nEOF\n";
    let err = DxfFacade::new().parse_str(source).unwrap_err();
    match err {
        IoError::InvalidDocument(message) => assert!(message.contains("LINE 起点 X")),
        other => panic!("意外的错误类型: {other:?}"),
    }
}
