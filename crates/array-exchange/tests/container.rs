//! Integration tests for container construction and readback.

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use zarrs::array::Array;
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

use array_exchange::{
    block_slices, schema, testdata, ExchangeContainer, ExchangeError, ExposureDataset,
};
use drift_common::{
    DriftParameters, Generation, OutputLayout, SpatialExtent, TimeWindow, WindDirection,
};

fn window() -> TimeWindow {
    TimeWindow::new(
        NaiveDate::from_ymd_opt(2021, 5, 1).unwrap(),
        NaiveDate::from_ymd_opt(2021, 5, 10).unwrap(),
    )
    .unwrap()
}

fn extent() -> SpatialExtent {
    SpatialExtent::new(0.0, 4.0, 0.0, 3.0).unwrap()
}

fn create(
    processing_dir: &Path,
    layout: OutputLayout,
    generation: Generation,
) -> ExchangeContainer {
    ExchangeContainer::create(
        processing_dir,
        &window(),
        &extent(),
        3,
        layout,
        &DriftParameters::default(),
        generation,
    )
    .unwrap()
}

fn open_store(container: &ExchangeContainer) -> Arc<FilesystemStore> {
    Arc::new(FilesystemStore::new(container.container_path()).unwrap())
}

fn read_f32(store: &Arc<FilesystemStore>, node: &str) -> Vec<f32> {
    let array = Array::open(store.clone(), node).unwrap();
    let subset = ArraySubset::new_with_shape(array.shape().to_vec());
    array.retrieve_array_subset_elements::<f32>(&subset).unwrap()
}

fn read_string(store: &Arc<FilesystemStore>, node: &str) -> Vec<String> {
    let array = Array::open(store.clone(), node).unwrap();
    let subset = ArraySubset::new_with_shape(array.shape().to_vec());
    array
        .retrieve_array_subset_elements::<String>(&subset)
        .unwrap()
}

#[test]
fn test_create_refuses_existing_path() {
    let dir = tempfile::tempdir().unwrap();
    let processing_dir = dir.path().join("run");
    let container = create(&processing_dir, OutputLayout::BaseGeometry, Generation::Current);

    let second = ExchangeContainer::create(
        &processing_dir,
        &window(),
        &extent(),
        3,
        OutputLayout::BaseGeometry,
        &DriftParameters::default(),
        Generation::Current,
    );
    assert!(matches!(second, Err(ExchangeError::ContainerExists(_))));

    // The first container is intact after the refused second attempt.
    let store = open_store(&container);
    assert_eq!(read_f32(&store, schema::SCALE_DAY).len(), 10);
    assert!(container.geometry_dir().is_dir());
}

#[test]
fn test_day_scale_carries_epoch_offset() {
    let dir = tempfile::tempdir().unwrap();
    let container = create(
        &dir.path().join("run"),
        OutputLayout::BaseGeometry,
        Generation::Current,
    );
    let store = open_store(&container);

    let day = Array::open(store.clone(), schema::SCALE_DAY).unwrap();
    assert_eq!(day.shape(), &[10]);
    assert_eq!(
        day.attributes().get("transform"),
        Some(&serde_json::json!("Day"))
    );
    assert_eq!(
        day.attributes().get("t_offset"),
        Some(&serde_json::json!(window().epoch_offset_days()))
    );

    let indices = read_f32(&store, schema::SCALE_DAY);
    assert_eq!(indices, (0..10).map(|d| d as f32).collect::<Vec<_>>());
}

#[test]
fn test_raster_scale_carries_geographic_offset() {
    let dir = tempfile::tempdir().unwrap();
    let container = create(
        &dir.path().join("run"),
        OutputLayout::Raster1Sqm,
        Generation::Current,
    );
    let store = open_store(&container);

    let sqm = Array::open(store.clone(), schema::SCALE_1SQM).unwrap();
    assert_eq!(sqm.shape(), &[4, 3]);
    assert_eq!(
        sqm.attributes().get("transform"),
        Some(&serde_json::json!("Geographic"))
    );
    assert_eq!(
        sqm.attributes().get("t_offset"),
        Some(&serde_json::json!([0.0, 0.0]))
    );
}

#[test]
fn test_parameter_nodes_are_marked_set() {
    let dir = tempfile::tempdir().unwrap();
    let params = DriftParameters {
        habitat_types: "110 120".to_string(),
        random_seed: 42,
        wind_direction: WindDirection::PerApplication(vec![10, 200, 355]),
        ..DriftParameters::default()
    };
    let container = ExchangeContainer::create(
        &dir.path().join("run"),
        &window(),
        &extent(),
        3,
        OutputLayout::BaseGeometry,
        &params,
        Generation::Current,
    )
    .unwrap();
    let store = open_store(&container);

    let habitat = Array::open(store.clone(), &schema::param_node("habitat_types")).unwrap();
    assert_eq!(habitat.attributes().get("set"), Some(&serde_json::json!(true)));
    assert_eq!(
        read_string(&store, &schema::param_node("habitat_types")),
        vec!["110 120".to_string()]
    );

    assert_eq!(
        read_string(&store, &schema::param_node("spatial_output_scale")),
        vec!["base_geometry".to_string()]
    );

    // Empty filtering types collapse to a single-space placeholder.
    assert_eq!(
        read_string(&store, &schema::param_node("filtering_types")),
        vec![" ".to_string()]
    );

    let seed = Array::open(store.clone(), &schema::param_node("random_seed")).unwrap();
    let subset = ArraySubset::new_with_shape(seed.shape().to_vec());
    assert_eq!(
        seed.retrieve_array_subset_elements::<i64>(&subset).unwrap(),
        vec![42]
    );

    let wind = Array::open(store.clone(), schema::WIND_DIRECTION_NODE).unwrap();
    assert_eq!(wind.shape(), &[1, 3]);
    let subset = ArraySubset::new_with_shape(wind.shape().to_vec());
    assert_eq!(
        wind.retrieve_array_subset_elements::<u16>(&subset).unwrap(),
        vec![10, 200, 355]
    );
}

#[test]
fn test_exposure_allocation_shapes() {
    let dir = tempfile::tempdir().unwrap();

    let per_geometry = create(
        &dir.path().join("geom"),
        OutputLayout::BaseGeometry,
        Generation::Current,
    );
    let dataset =
        ExposureDataset::open(per_geometry.container_path(), OutputLayout::BaseGeometry).unwrap();
    assert_eq!(dataset.shape(), &[10, 3]);
    assert_eq!(dataset.chunk_shape().unwrap(), vec![10, 1]);

    let raster = create(
        &dir.path().join("raster"),
        OutputLayout::Raster1Sqm,
        Generation::Current,
    );
    let dataset =
        ExposureDataset::open(raster.container_path(), OutputLayout::Raster1Sqm).unwrap();
    assert_eq!(dataset.shape(), &[3, 4, 10]);
    assert_eq!(dataset.chunk_shape().unwrap(), vec![3, 4, 1]);

    let legacy = create(
        &dir.path().join("legacy"),
        OutputLayout::Raster1Sqm,
        Generation::Legacy,
    );
    let dataset =
        ExposureDataset::open(legacy.container_path(), OutputLayout::Raster1Sqm).unwrap();
    assert_eq!(dataset.shape(), &[10, 4, 3]);
    assert_eq!(dataset.chunk_shape().unwrap(), vec![1, 4, 3]);
}

#[test]
fn test_missing_dataset_is_a_contract_violation() {
    let dir = tempfile::tempdir().unwrap();
    let container = create(
        &dir.path().join("run"),
        OutputLayout::BaseGeometry,
        Generation::Current,
    );
    // The raster dataset was never allocated for this layout.
    let missing = ExposureDataset::open(container.container_path(), OutputLayout::Raster1Sqm);
    assert!(matches!(missing, Err(ExchangeError::ContractViolation(_))));

    let dataset =
        ExposureDataset::open(container.container_path(), OutputLayout::BaseGeometry).unwrap();
    assert!(dataset.ensure_shape(&[10, 3]).is_ok());
    assert!(matches!(
        dataset.ensure_shape(&[10, 4]),
        Err(ExchangeError::ContractViolation(_))
    ));
}

#[test]
fn test_block_reads_reassemble_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let container = create(
        &dir.path().join("run"),
        OutputLayout::BaseGeometry,
        Generation::Current,
    );
    let values: Vec<f32> = (0..30).map(|v| v as f32).collect();
    testdata::fill_exposure(container.container_path(), OutputLayout::BaseGeometry, &values)
        .unwrap();

    let dataset =
        ExposureDataset::open(container.container_path(), OutputLayout::BaseGeometry).unwrap();
    let shape = dataset.shape().to_vec();
    let chunk = dataset.chunk_shape().unwrap();

    for multiple in [1u64, 5, 20] {
        let block_shape: Vec<u64> = chunk.iter().map(|&c| c * multiple).collect();
        let mut reassembled = vec![f32::NAN; 30];
        for block in block_slices(&shape, &block_shape) {
            let data = dataset.read_block(&block).unwrap();
            let cols = block[1].end - block[1].start;
            for (i, value) in data.into_iter().enumerate() {
                let row = block[0].start + i as u64 / cols;
                let col = block[1].start + i as u64 % cols;
                reassembled[(row * shape[1] + col) as usize] = value;
            }
        }
        assert_eq!(reassembled, values, "block multiple {multiple}");
    }
}

#[test]
fn test_descriptor_metadata_per_layout() {
    let dir = tempfile::tempdir().unwrap();

    let per_geometry = create(
        &dir.path().join("geom"),
        OutputLayout::BaseGeometry,
        Generation::Current,
    );
    let dataset =
        ExposureDataset::open(per_geometry.container_path(), OutputLayout::BaseGeometry).unwrap();
    let names = vec!["f1".to_string(), "f2".to_string(), "f3".to_string()];
    let geometries = vec![vec![1u8], vec![2], vec![3]];
    let descriptor = dataset
        .describe(
            "g/ha",
            &window(),
            &extent(),
            Generation::Current,
            Some((names.clone(), geometries.clone())),
        )
        .unwrap();
    assert_eq!(descriptor.shape, vec![10, 3]);
    assert_eq!(descriptor.chunk_shape, vec![10, 1]);
    assert_eq!(descriptor.scale_labels, vec!["time/day", "space/base_geometry"]);
    assert_eq!(descriptor.unit, "g/ha");
    assert_eq!(descriptor.element_names.as_deref(), Some(names.as_slice()));
    assert_eq!(
        descriptor.element_geometries.as_deref(),
        Some(geometries.as_slice())
    );
    assert_eq!(descriptor.layout(), OutputLayout::BaseGeometry);

    let raster = create(
        &dir.path().join("raster"),
        OutputLayout::Raster1Sqm,
        Generation::Current,
    );
    let dataset =
        ExposureDataset::open(raster.container_path(), OutputLayout::Raster1Sqm).unwrap();
    let descriptor = dataset
        .describe("g/ha", &window(), &extent(), Generation::Current, None)
        .unwrap();
    assert_eq!(
        descriptor.scale_labels,
        vec!["space_y/1sqm", "space_x/1sqm", "time/day"]
    );
    assert_eq!(descriptor.offsets.len(), 3);
    assert!(descriptor.element_names.is_none());

    let legacy = create(
        &dir.path().join("legacy"),
        OutputLayout::Raster1Sqm,
        Generation::Legacy,
    );
    let dataset =
        ExposureDataset::open(legacy.container_path(), OutputLayout::Raster1Sqm).unwrap();
    let descriptor = dataset
        .describe("g/ha", &window(), &extent(), Generation::Legacy, None)
        .unwrap();
    assert_eq!(
        descriptor.scale_labels,
        vec!["time/day", "space_x/1sqm", "space_y/1sqm"]
    );
    assert!(descriptor.offsets.is_empty());
}

#[test]
fn test_legacy_per_geometry_descriptor_omits_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let container = create(
        &dir.path().join("run"),
        OutputLayout::BaseGeometry,
        Generation::Legacy,
    );
    let dataset =
        ExposureDataset::open(container.container_path(), OutputLayout::BaseGeometry).unwrap();

    // Element metadata handed in is dropped; the older generation reports
    // scale labels only.
    let elements = (
        vec!["f1".to_string(), "f2".to_string(), "f3".to_string()],
        vec![vec![1u8], vec![2], vec![3]],
    );
    let descriptor = dataset
        .describe("g/ha", &window(), &extent(), Generation::Legacy, Some(elements))
        .unwrap();
    assert_eq!(descriptor.scale_labels, vec!["time/day", "space/base_geometry"]);
    assert!(descriptor.offsets.is_empty());
    assert!(descriptor.element_names.is_none());
    assert!(descriptor.element_geometries.is_none());
}
