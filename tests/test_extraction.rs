use chipper::{
    extract_buildings, ChipWriter, ExtractionConfig, GeoTransform, ImagePhase,
};
use gdal::spatial_ref::SpatialRef;
use gdal::Dataset;
use ndarray::Array3;
use std::fs;
use std::path::{Path, PathBuf};

// 100x100 source covering lon [10, 35], lat [-5, 20] at 0.25 deg/pixel.
const SOURCE_GEOTRANSFORM: [f64; 6] = [10.0, 0.25, 0.0, 20.0, 0.0, -0.25];
const SOURCE_SIZE: usize = 100;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Deterministic per-band test pattern so crop offsets are checkable.
fn pattern(band: usize, row: usize, col: usize) -> u8 {
    (((band + 1) * 10 + row + col) % 256) as u8
}

fn build_source_image(path: &Path) {
    let mut block = Array3::<u8>::zeros((3, SOURCE_SIZE, SOURCE_SIZE));
    for band in 0..3 {
        for row in 0..SOURCE_SIZE {
            for col in 0..SOURCE_SIZE {
                block[[band, row, col]] = pattern(band, row, col);
            }
        }
    }
    let transform = GeoTransform::from_gdal(SOURCE_GEOTRANSFORM);
    let spatial_ref = SpatialRef::from_epsg(4326).unwrap();
    ChipWriter::write_png(&block, &transform, &spatial_ref, path).unwrap();
    ChipWriter::remove_sidecar(path).unwrap();
}

struct Fixture {
    _dir: tempfile::TempDir,
    image_path: PathBuf,
    table_path: PathBuf,
    output_dir: PathBuf,
    root: PathBuf,
}

fn fixture(table_json: &str) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_path_buf();
    let image_path = root.join("img.png");
    build_source_image(&image_path);
    let table_path = root.join("geotransforms.json");
    fs::write(&table_path, table_json).unwrap();
    let output_dir = root.join("buildings");
    Fixture {
        _dir: dir,
        image_path,
        table_path,
        output_dir,
        root,
    }
}

fn default_table() -> String {
    r#"{"img.png": [[10.0, 0.25, 0.0, 20.0, 0.0, -0.25]]}"#.to_string()
}

fn write_footprints(fixture: &Fixture, name: &str, body: &str) -> PathBuf {
    let path = fixture.root.join(name);
    fs::write(&path, body).unwrap();
    path
}

fn config(fixture: &Fixture, footprint_path: &Path, phase: ImagePhase) -> ExtractionConfig {
    ExtractionConfig {
        image_path: fixture.image_path.clone(),
        footprint_json_path: footprint_path.to_path_buf(),
        output_dir: fixture.output_dir.clone(),
        geotransform_table_path: fixture.table_path.clone(),
        phase,
    }
}

// Footprint covering source cols [8, 16) and rows [8, 12).
const INSIDE_WKT: &str = "POLYGON ((12.0 18.0, 14.0 18.0, 14.0 17.0, 12.0 17.0, 12.0 18.0))";
// Entirely east of the image extent.
const OUTSIDE_WKT: &str = "POLYGON ((40.0 17.0, 41.0 17.0, 41.0 18.0, 40.0 18.0, 40.0 17.0))";
// Footprint covering source cols [40, 44) and rows [40, 44).
const INSIDE_WKT_2: &str = "POLYGON ((20.0 10.0, 21.0 10.0, 21.0 9.0, 20.0 9.0, 20.0 10.0))";

#[test]
fn missing_geotransform_entry_is_a_noop() {
    init_logging();
    let fixture = fixture(r#"{"some_other_image.png": [[0.0, 1.0, 0.0, 0.0, 0.0, -1.0]]}"#);
    let footprints = write_footprints(
        &fixture,
        "pre.json",
        &format!(
            r#"{{"features": {{"lng_lat": [{{"wkt": "{}", "properties": {{"uid": "fp-1"}}}}]}}}}"#,
            INSIDE_WKT
        ),
    );

    let summary =
        extract_buildings(&config(&fixture, &footprints, ImagePhase::PreDisaster)).unwrap();

    assert_eq!(summary.processed(), 0);
    assert!(
        !fixture.output_dir.exists(),
        "no files may be written for an unresolvable image"
    );
}

#[test]
fn pre_disaster_extraction_writes_positional_chips() {
    init_logging();
    let fixture = fixture(&default_table());
    let footprints = write_footprints(
        &fixture,
        "pre.json",
        &format!(
            r#"{{"features": {{"lng_lat": [
                {{"wkt": "{}", "properties": {{"uid": "fp-1"}}}},
                {{"wkt": "{}", "properties": {{"uid": "fp-2"}}}}
            ]}}}}"#,
            INSIDE_WKT, OUTSIDE_WKT
        ),
    );

    let summary =
        extract_buildings(&config(&fixture, &footprints, ImagePhase::PreDisaster)).unwrap();

    assert_eq!(summary.chips_written, 1);
    assert_eq!(summary.empty_skipped, 1);
    assert!(summary.failures.is_empty());

    let chip_path = fixture.output_dir.join("pre-disaster").join("building_1.png");
    assert!(chip_path.is_file());
    // The out-of-image footprint must not leave a degenerate file behind.
    assert!(!fixture
        .output_dir
        .join("pre-disaster")
        .join("building_2.png")
        .exists());

    // Window is cols [8, 16) x rows [8, 12); verify extent and that pixel
    // (0, 0) of the chip is pixel (8, 8) of the source pattern.
    let chip = Dataset::open(&chip_path).unwrap();
    assert_eq!(chip.raster_size(), (8, 4));
    let band = chip.rasterband(1).unwrap();
    let corner = band.read_as::<u8>((0, 0), (1, 1), (1, 1), None).unwrap();
    assert_eq!(corner.data[0], pattern(0, 8, 8));
}

#[test]
fn post_disaster_chips_are_sorted_by_damage_class() {
    init_logging();
    let fixture = fixture(&default_table());
    let footprints = write_footprints(
        &fixture,
        "post.json",
        &format!(
            r#"{{"features": {{"lng_lat": [
                {{"wkt": "{}", "properties": {{"uid": "42", "subtype": "destroyed"}}}},
                {{"wkt": "{}", "properties": {{"uid": "a1", "subtype": "no-damage"}}}},
                {{"wkt": "POLYGON ((broken", "properties": {{"uid": "bad", "subtype": "minor-damage"}}}}
            ]}}}}"#,
            INSIDE_WKT, INSIDE_WKT_2
        ),
    );

    let summary =
        extract_buildings(&config(&fixture, &footprints, ImagePhase::PostDisaster)).unwrap();

    // The malformed WKT fails alone; the rest of the batch still lands.
    assert_eq!(summary.chips_written, 2);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].uid.as_deref(), Some("bad"));

    let destroyed = fixture
        .output_dir
        .join("post-disaster")
        .join("destroyed")
        .join("building_42.png");
    assert!(destroyed.is_file());
    assert!(fixture
        .output_dir
        .join("post-disaster")
        .join("no-damage")
        .join("building_a1.png")
        .is_file());
}

#[test]
fn sub_pixel_footprint_is_skipped_under_coarse_transform() {
    init_logging();
    // At 0.5 deg/pixel the 0.1 deg footprint truncates to a zero-area
    // window; the skip policy means no file is written.
    let fixture = fixture(r#"{"img.png": [[10.0, 0.5, 0.0, 20.0, 0.0, -0.5]]}"#);
    let footprints = write_footprints(
        &fixture,
        "pre.json",
        r#"{"features": {"lng_lat": [
            {"wkt": "POLYGON ((10.1 19.9, 10.2 19.9, 10.2 19.8, 10.1 19.8, 10.1 19.9))",
             "properties": {"uid": "tiny"}}
        ]}}"#,
    );

    let summary =
        extract_buildings(&config(&fixture, &footprints, ImagePhase::PreDisaster)).unwrap();

    assert_eq!(summary.chips_written, 0);
    assert_eq!(summary.empty_skipped, 1);
    assert!(!fixture.output_dir.join("pre-disaster").exists()
        || fs::read_dir(fixture.output_dir.join("pre-disaster"))
            .unwrap()
            .next()
            .is_none());
}

#[test]
fn rerun_overwrites_chips_and_leaves_no_sidecars() {
    init_logging();
    let fixture = fixture(&default_table());
    let footprints = write_footprints(
        &fixture,
        "post.json",
        &format!(
            r#"{{"features": {{"lng_lat": [
                {{"wkt": "{}", "properties": {{"uid": "42", "subtype": "destroyed"}}}}
            ]}}}}"#,
            INSIDE_WKT
        ),
    );
    let run_config = config(&fixture, &footprints, ImagePhase::PostDisaster);

    let first = extract_buildings(&run_config).unwrap();
    let chip_path = fixture
        .output_dir
        .join("post-disaster")
        .join("destroyed")
        .join("building_42.png");
    let first_bytes = fs::read(&chip_path).unwrap();

    let second = extract_buildings(&run_config).unwrap();
    let second_bytes = fs::read(&chip_path).unwrap();

    assert_eq!(first.chips_written, 1);
    assert_eq!(second.chips_written, 1);
    assert_eq!(first_bytes, second_bytes);

    // The PNG driver's .aux.xml sidecars must be cleaned up on every run.
    let mut stack = vec![fixture.output_dir.clone()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                assert!(
                    !path.to_string_lossy().ends_with(".aux.xml"),
                    "stale sidecar left behind: {}",
                    path.display()
                );
            }
        }
    }
}
