use std::path::PathBuf;

use cutcost_core::drawing::{Drawing, DrawingKind};
use cutcost_io::{DrawingFacade, DrawingLoader, IoError, SvgFacade};

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/data");
    path.push(name);
    path
}

#[test]
fn load_bracket_sums_all_paths() {
    let facade = DrawingFacade::new();
    let drawing = facade.load(&fixture("bracket.svg")).expect("读取 SVG 失败");
    assert_eq!(drawing.kind(), DrawingKind::Svg);

    let Drawing::Svg(svg) = &drawing else {
        panic!("期望 SVG 图纸");
    };
    let ids: Vec<Option<&str>> = svg.paths().iter().map(|p| p.id.as_deref()).collect();
    assert_eq!(ids, [Some("frame"), Some("slot")]);

    // 384 px 外框 + 48 px 槽 = 432 px = 4.5 in
    let report = drawing.measure();
    assert!((report.length_cm - 4.5 * 2.54).abs() < 1e-4);
    assert_eq!(report.measured, 2);
    assert_eq!(report.skipped, 1);
}

#[test]
fn shapes_without_paths_measure_zero() {
    let loader = SvgFacade::new();
    let drawing = loader.load(&fixture("shapes_only.svg")).expect("读取 SVG 失败");
    let report = drawing.measure();
    assert!(report.is_zero());
    assert_eq!(report.measured, 0);
    assert_eq!(report.skipped, 2);
}

#[test]
fn coarse_tolerance_still_measures_straight_paths_exactly() {
    let loader = SvgFacade::with_tolerance(5.0);
    let drawing = loader
        .parse_str(r#"<svg xmlns="http://www.w3.org/2000/svg"><path d="M0 0 L96 0"/></svg>"#)
        .expect("parse");
    assert!((drawing.measure().length_cm - 2.54).abs() < 1e-6);
}

#[test]
fn broken_markup_is_invalid_document() {
    let err = SvgFacade::new()
        .parse_str("<svg><path d=\"M0 0 L1 1\"></svg>")
        .unwrap_err();
    assert!(matches!(err, IoError::InvalidDocument(_)));
}
