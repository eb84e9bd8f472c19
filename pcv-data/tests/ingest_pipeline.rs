use pcv_data::{
    Aggregator, CancellationToken, ColorMode, ColorResolver, ColoredCloud, FileLoader, GridDownsampler, LoadError,
    NpyWriter, ParseError, Point, Rows, Sampler, Selection, load_configs, spawn_save,
};
use std::fs;
use std::path::Path;

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

/// Five sources `s1.csv` .. `s5.csv`, source `i` holding points `(i, 0, 0)` and `(i, 1, 0)`.
fn five_sources(dir: &Path) -> std::path::PathBuf {
    for i in 1..=5 {
        write(dir, &format!("s{i}.csv"), &format!("n,x,y,z\na,{i},0,0\nb,{i},1,0\n"));
    }
    let configs: Vec<String> = (1..=5)
        .map(|i| format!(r#"{{ "file_path": "{}" }}"#, dir.join(format!("s{i}.csv")).display()))
        .collect();
    let cfg = dir.join("config.json");
    fs::write(
        &cfg,
        format!(r#"{{ "default": {{}}, "configs": [{}] }}"#, configs.join(",")),
    )
    .unwrap();
    cfg
}

#[test]
fn selection_loads_sources_in_declared_order() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = five_sources(dir.path());

    let selection: Selection = "<=2,4".parse().unwrap();
    let aggregator = Aggregator::new(load_configs(&cfg).unwrap()).with_selection(Some(&selection));
    let points = aggregator.collect(&FileLoader::new()).unwrap();

    let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
    assert_eq!(xs, vec![1.0, 1.0, 2.0, 2.0, 4.0, 4.0]);
    assert_eq!(ys, vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
}

#[test]
fn lazy_and_eager_aggregation_agree() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = five_sources(dir.path());
    let aggregator = Aggregator::new(load_configs(&cfg).unwrap());
    let loader = FileLoader::new();

    let lazy: Vec<Point> = aggregator.points(&loader).collect::<Result<_, _>>().unwrap();
    let mut summaries = Vec::new();
    let eager = aggregator
        .collect_with(&loader, |s| summaries.push((s.index, s.points)))
        .unwrap();

    assert_eq!(lazy, eager);
    assert_eq!(summaries, vec![(1, 2), (2, 2), (3, 2), (4, 2), (5, 2)]);
}

#[test]
fn missing_source_is_skipped_and_ingestion_continues() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.csv", "h\n0,1,1,1\n");
    write(dir.path(), "c.csv", "h\n0,3,3,3\n");
    let cfg = dir.path().join("config.json");
    fs::write(
        &cfg,
        format!(
            r#"{{ "default": {{}}, "configs": [
                {{ "file_path": "{a}" }},
                {{ "file_path": "{b}" }},
                {{ "file_path": "{c}", "source_xyz": [10, 0, 0] }}
            ] }}"#,
            a = dir.path().join("a.csv").display(),
            b = dir.path().join("b.csv").display(),
            c = dir.path().join("c.csv").display(),
        ),
    )
    .unwrap();

    let points = Aggregator::new(load_configs(&cfg).unwrap())
        .collect(&FileLoader::new())
        .unwrap();
    assert_eq!(points, vec![Point::new(1.0, 1.0, 1.0), Point::new(13.0, 3.0, 3.0)]);
}

#[test]
fn malformed_line_aborts_with_position() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.csv", "0,1,1,1\n0,2,2,2\n0,3,3\n");
    let cfg = dir.path().join("config.json");
    fs::write(
        &cfg,
        format!(
            r#"{{ "default": {{ "skip_first_line": false }}, "configs": [ {{ "file_path": "{}" }} ] }}"#,
            dir.path().join("a.csv").display()
        ),
    )
    .unwrap();

    let err = Aggregator::new(load_configs(&cfg).unwrap())
        .collect(&FileLoader::new())
        .unwrap_err();
    match err {
        LoadError::Line { path, line, source } => {
            assert_eq!(path, dir.path().join("a.csv"));
            assert_eq!(line, 3);
            assert_eq!(source, ParseError::NoMatch);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn sampled_render_path_and_canonical_save_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut contents = String::from("x y z id\n");
    for i in 0..200 {
        contents.push_str(&format!("{} {} 0 {}\n", i, i % 7, i % 3));
    }
    write(dir.path(), "cloud.txt", &contents);
    let cfg = dir.path().join("config.json");
    fs::write(
        &cfg,
        format!(
            r#"{{ "default": {{ "pattern": "{{x}} {{y}} {{z}} {{id}}" }}, "configs": [ {{ "file_path": "{}" }} ] }}"#,
            dir.path().join("cloud.txt").display()
        ),
    )
    .unwrap();

    let canonical = Aggregator::new(load_configs(&cfg).unwrap())
        .collect(&FileLoader::new())
        .unwrap();
    assert_eq!(canonical.len(), 200);

    let mut sampler = Sampler::new(Some(0.1), None, Some(42)).unwrap();
    let sampled = sampler.sample_points(&canonical);
    assert_eq!(sampled.len(), 20);
    assert_eq!(canonical.len(), 200);

    let cancel = CancellationToken::new();
    let mut resolver = ColorResolver::new();
    let render = ColoredCloud::from_points(&sampled, &mut resolver, false, &cancel).unwrap();
    let render = sampler.downsample_cloud(render, &GridDownsampler);
    assert_eq!(render.len(), 20);

    // every point of a class shares a color
    let full = ColoredCloud::from_points(&canonical, &mut resolver, false, &cancel).unwrap();
    for (point, color) in canonical.iter().zip(full.colors()) {
        assert_eq!(*color, resolver.class_color(point.class_id));
    }
    assert_eq!(resolver.known_classes(), 3);

    let rows = Rows::from_cloud(&full, ColorMode::Rgb);
    let written = spawn_save(NpyWriter, dir.path().join("scene"), rows)
        .unwrap()
        .wait()
        .unwrap();
    let bytes = fs::read(written).unwrap();
    let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    assert_eq!(bytes.len(), 10 + header_len + 200 * 6 * 8);
}
