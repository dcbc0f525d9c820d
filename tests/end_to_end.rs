use covermap::{
    geom::{BorderFallback, UnionFallback},
    Error, Pipeline, PipelineConfig, RegionName, Selection, SourceTables, TableColumns, Theme, UnitFilter, UnitId,
};
use geo::{Area, Contains, Point};
use serde_json::{json, Value};

const UNITS: &str = "\
unit,themes,latitude,longitude,code
PIN,\"Educação, Artes, Educação\",-23.45,-46.75,IN
PIR,\"Saúde, Tecnologia\",-23.45,-46.25,IR
";

const REGIONS: &str = "\
region,owner
A,PIN
B,PIN
C,PIR
D,
";

/// 0.1° squares along a row just west of São Paulo.
fn boundaries() -> Vec<u8> {
    let feature = |name: &str, west: f64, east: f64| json!({
        "type": "Feature",
        "properties": { "name": name },
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[west, -23.5], [east, -23.5], [east, -23.4], [west, -23.4], [west, -23.5]]],
        },
    });
    serde_json::to_vec(&json!({
        "type": "FeatureCollection",
        "features": [
            feature("A", -46.8, -46.7),
            feature("B", -46.7, -46.6),
            feature("C", -46.3, -46.2),
            feature("D", -46.0, -45.9),
        ],
    })).unwrap()
}

fn sources() -> SourceTables {
    SourceTables::from_bytes(
        UNITS.as_bytes(),
        REGIONS.as_bytes(),
        &boundaries(),
        &TableColumns::default(),
        covermap::geom::SourceCrs::Wgs84,
    ).unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-5 * a.abs().max(b.abs())
}

#[test]
fn two_units_three_regions() {
    let sources = sources();
    let output = Pipeline::new(PipelineConfig::default()).unwrap().run(&sources).unwrap();

    assert_eq!(output.region_theme("A").map(Theme::as_str), Some("Educação"));
    assert_eq!(output.region_theme("B").map(Theme::as_str), Some("Educação"));
    assert_eq!(output.region_theme("C").map(Theme::as_str), Some("Saúde"));
    assert_eq!(output.region_theme("D"), None);

    let cell = sources.boundaries.get("A").unwrap().unsigned_area();

    let pin = &output.coverage()[&UnitId::new("PIN")];
    assert_eq!(pin.fallback, UnionFallback::Union);
    assert_eq!(pin.members, [RegionName::new("A"), RegionName::new("B")]);
    assert!(close(pin.geometry.unsigned_area(), 2.0 * cell), "PIN area {}", pin.geometry.unsigned_area());
    assert_eq!(pin.geometry.0.len(), 1, "adjacent squares merge into one polygon");

    let pir = &output.coverage()[&UnitId::new("PIR")];
    assert_eq!(pir.fallback, UnionFallback::Union);
    assert!(close(pir.geometry.unsigned_area(), cell));

    assert_eq!(output.coverage().len(), 2);
}

#[test]
fn borders_surround_coverage() {
    let output = Pipeline::new(PipelineConfig::default()).unwrap().run(&sources()).unwrap();
    assert_eq!(output.borders().len(), 2);

    for (unit, border) in output.borders() {
        assert_eq!(border.fallback, BorderFallback::Ring, "{unit}");
        assert!(border.geometry.unsigned_area() > 0.0, "{unit}");
    }

    let pir = &output.borders()[&UnitId::new("PIR")];
    assert!(!pir.geometry.contains(&Point::new(-46.25, -23.45)));
    // ~1 km past the east edge of C.
    assert!(pir.geometry.contains(&Point::new(-46.195, -23.45)));
}

#[test]
fn optional_stages_can_be_switched_off() {
    let config = PipelineConfig { include_borders: false, include_markers: false, ..Default::default() };
    let output = Pipeline::new(config).unwrap().run(&sources()).unwrap();
    assert!(output.borders().is_empty());
    assert!(output.markers().is_empty());
    assert_eq!(output.coverage().len(), 2);
}

#[test]
fn rerunning_gives_identical_coverage() {
    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
    let sources = sources();
    let first = pipeline.run(&sources).unwrap();
    let second = pipeline.run(&sources).unwrap();
    assert_eq!(first.coverage(), second.coverage());
    assert_eq!(first.theme_colors(), second.theme_colors());
}

#[test]
fn exhausted_budget_times_out() {
    let config = PipelineConfig { union_budget_ms: Some(0), ..Default::default() };
    let err = Pipeline::new(config).unwrap().run(&sources()).unwrap_err();
    assert!(matches!(err, Error::GeometryTimeout { .. }), "{err}");
}

#[test]
fn missing_columns_abort_the_load() {
    let err = SourceTables::from_bytes(
        b"unit\nPIN\n",
        REGIONS.as_bytes(),
        &boundaries(),
        &TableColumns::default(),
        covermap::geom::SourceCrs::Wgs84,
    ).unwrap_err();
    assert!(matches!(err, Error::MalformedInput { .. }), "{err}");
}

#[test]
fn selection_pin_educacao() {
    let output = Pipeline::new(PipelineConfig::default()).unwrap().run(&sources()).unwrap();
    let selection = Selection::new(UnitFilter::One(UnitId::new("PIN")), [Theme::new("Educação")]);
    let projection = output.project(&selection);

    let names: Vec<_> = projection.region_names().map(RegionName::as_str).collect();
    assert_eq!(names, ["A", "B"]);
    for view in &projection.regions {
        assert_eq!(view.owner.map(UnitId::as_str), Some("PIN"));
        assert_eq!(view.theme.map(Theme::as_str), Some("Educação"));
    }

    let empty = output.project(&Selection::new(UnitFilter::All, []));
    assert!(empty.regions.is_empty());
    assert!(empty.units.is_empty());
}

#[test]
fn geojson_export_layers() {
    let output = Pipeline::new(PipelineConfig::default()).unwrap().run(&sources()).unwrap();
    let value = output.project(&Selection::everything(&output)).to_geojson();

    assert_eq!(value["type"], "FeatureCollection");
    let features = value["features"].as_array().unwrap();
    let count = |layer: &str| features.iter().filter(|f| f["properties"]["layer"] == layer).count();
    assert_eq!(count("region"), 4);
    assert_eq!(count("coverage"), 2);
    assert_eq!(count("border"), 2);
    assert_eq!(count("marker"), 2);

    let legend = value["legend"].as_object().unwrap();
    assert_eq!(legend.len(), 4);
    assert!(legend.values().all(|color| color.as_str().is_some_and(|c| c.starts_with('#') && c.len() == 7)));

    let digest = value["source_sha256"].as_str().unwrap();
    assert_eq!(digest.len(), 64);

    let c = features.iter()
        .find(|f| f["properties"]["layer"] == "region" && f["properties"]["name"] == "C")
        .unwrap();
    assert_eq!(c["properties"]["theme"], "Saúde");
    assert_eq!(c["properties"]["fill"], legend["Saúde"]);
    assert_eq!(c["geometry"]["type"], "MultiPolygon");

    let d = features.iter()
        .find(|f| f["properties"]["layer"] == "region" && f["properties"]["name"] == "D")
        .unwrap();
    assert_eq!(d["properties"]["theme"], Value::Null);
    assert_eq!(d["properties"]["fill"], "#cccccc");
}
