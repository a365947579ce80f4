//! End-to-end join scenarios through the engine


use clusterjoin_core::config::JoinConfig;
use clusterjoin_core::hash::hash_plan;
use clusterjoin_core::join::{JoinSpec, JoinType};
use clusterjoin_core::manifest::RunManifest;
use clusterjoin_exec::{Engine, ExecError};
use clusterjoin_io::CsvWriter;
use test_data_gen::{config_with_cluster_size, header_and_sorted, run_join, write_csv};

fn rows(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn five_row_inputs(dir: &std::path::Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let left = write_csv(
        dir,
        "people.csv",
        "id,name",
        &rows(&["1,ann", "2,bob", "3,cy", "4,dee", "5,eve"]),
    );
    let right = write_csv(
        dir,
        "depts.csv",
        "id,dept",
        &rows(&["5,ops", "3,eng", "1,hr", "2,qa", "4,it"]),
    );
    (left, right)
}

#[test]
fn test_five_row_inner_single_cluster() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (left, right) = five_row_inputs(dir.path());

    let (lines, manifest) = run_join(
        JoinConfig::default(),
        &left,
        &right,
        JoinSpec::new("id", JoinType::Inner),
    )
    .expect("join failed");

    assert!(manifest.plan.cluster_size >= 5);
    assert_eq!(manifest.plan.nclusters_left, 1);
    assert_eq!(manifest.plan.nclusters_right, 1);
    assert_eq!(
        lines,
        rows(&[
            "id,name,dept",
            "1,ann,hr",
            "2,bob,qa",
            "3,cy,eng",
            "4,dee,it",
            "5,eve,ops",
        ])
    );
    assert_eq!(manifest.stats.join_invocations, 1);
}

#[test]
fn test_forced_cluster_size_keeps_row_multiset() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (left, right) = five_row_inputs(dir.path());
    let spec = JoinSpec::new("id", JoinType::Inner);

    let (whole, whole_manifest) =
        run_join(JoinConfig::default(), &left, &right, spec.clone()).expect("join failed");
    let (chunked, chunked_manifest) =
        run_join(config_with_cluster_size(2), &left, &right, spec).expect("join failed");

    assert_eq!(chunked_manifest.plan.nclusters_left, 3);
    assert_eq!(chunked_manifest.plan.nclusters_right, 3);
    assert_eq!(header_and_sorted(whole), header_and_sorted(chunked));
    assert_eq!(whole_manifest.stats.join_invocations, 1);
    assert_eq!(chunked_manifest.stats.join_invocations, 9);
}

#[test]
fn test_degenerate_left_join_without_matches() {
    let dir = tempfile::tempdir().expect("tempdir");
    let left = write_csv(
        dir.path(),
        "l.csv",
        "id,name",
        &rows(&["1,ann", "2,bob", "3,cy", "4,dee"]),
    );
    let right = write_csv(dir.path(), "r.csv", "id,dept", &rows(&["10,ops", "11,eng"]));
    let spec = JoinSpec::new("id", JoinType::Left);

    // one left cluster, and several left clusters against the cached right table
    for cfg in [JoinConfig::default(), config_with_cluster_size(3)] {
        let (lines, manifest) = run_join(cfg, &left, &right, spec.clone()).expect("join failed");
        assert!(manifest.plan.is_degenerate());
        assert_eq!(
            lines,
            rows(&["id,name,dept", "1,ann,", "2,bob,", "3,cy,", "4,dee,"])
        );
    }
}

#[test]
fn test_missing_key_produces_no_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let left = write_csv(dir.path(), "l.csv", "id,name", &rows(&["1,ann"]));
    let right = write_csv(dir.path(), "r.csv", "key,dept", &rows(&["1,ops"]));

    let engine = Engine::new(JoinConfig::default()).expect("engine");
    let mut writer = CsvWriter::to_writer(Vec::new());
    let err = engine
        .join(&left, &right, JoinSpec::new("id", JoinType::Inner), &mut writer)
        .expect_err("join should fail");

    match &err {
        ExecError::KeyColumnMissing { column, file } => {
            assert_eq!(column, "id");
            assert_eq!(file, &right);
        }
        other => panic!("expected KeyColumnMissing, got {other:?}"),
    }
    assert!(err.is_validation());
    assert!(writer.into_inner().expect("flush").is_empty());
}

#[test]
fn test_missing_input_and_bad_kind_are_validation_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let right = write_csv(dir.path(), "r.csv", "id", &rows(&["1"]));

    let err = run_join(
        JoinConfig::default(),
        &dir.path().join("absent.csv"),
        &right,
        JoinSpec::new("id", JoinType::Inner),
    )
    .expect_err("missing input");
    assert!(matches!(err, ExecError::InputNotFound(_)));

    let err: ExecError = "outer"
        .parse::<JoinType>()
        .map_err(ExecError::from)
        .expect_err("outer is not supported");
    assert!(matches!(err, ExecError::UnsupportedJoinKind(ref s) if s == "outer"));
    assert!(err.is_validation());
}

#[test]
fn test_single_header_across_many_pairs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let l: Vec<String> = (0..10).map(|i| format!("{},l{}", i % 3, i)).collect();
    let r: Vec<String> = (0..10).map(|i| format!("{},r{}", i % 4, i)).collect();
    let left = write_csv(dir.path(), "l.csv", "k,a", &l);
    let right = write_csv(dir.path(), "r.csv", "k,b", &r);

    for kind in [JoinType::Inner, JoinType::Left, JoinType::Right] {
        let (lines, manifest) =
            run_join(config_with_cluster_size(1), &left, &right, JoinSpec::new("k", kind))
                .expect("join failed");
        assert_eq!(manifest.stats.join_invocations, 11 * 11);
        let headers = lines.iter().filter(|l| l.as_str() == "k,a,b").count();
        assert_eq!(headers, 1, "{kind}: header must be written once");
        assert_eq!(lines[0], "k,a,b");
    }
}

#[test]
fn test_header_only_inputs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let empty_left = write_csv(dir.path(), "l.csv", "id,name", &[]);
    let right = write_csv(dir.path(), "r.csv", "id,dept", &rows(&["1,ops", "2,eng"]));

    let (lines, _) = run_join(
        JoinConfig::default(),
        &empty_left,
        &right,
        JoinSpec::new("id", JoinType::Inner),
    )
    .expect("join failed");
    assert_eq!(lines, rows(&["id,name,dept"]));

    let (lines, _) = run_join(
        JoinConfig::default(),
        &empty_left,
        &right,
        JoinSpec::new("id", JoinType::Right),
    )
    .expect("join failed");
    assert_eq!(lines, rows(&["id,name,dept", "1,,ops", "2,,eng"]));
}

#[test]
fn test_manifest_records_the_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (left, right) = five_row_inputs(dir.path());
    let spec = JoinSpec::new("id", JoinType::Inner);

    let (_, manifest) =
        run_join(config_with_cluster_size(2), &left, &right, spec.clone()).expect("join failed");

    assert_eq!(manifest.spec, spec);
    assert_eq!(
        manifest.plan_hash,
        hash_plan(&spec, &manifest.plan).expect("hash")
    );
    assert_eq!(manifest.stats.rows_written, 5);
    // 3 left chunks, each paired with 3 re-read right chunks
    assert_eq!(manifest.stats.chunks_read, 3 + 9);
    assert!(manifest.stats.batches_written >= 9);
    assert!(manifest.stats.peak_accounted_bytes > 0);
    assert!(manifest.finished_ms >= manifest.started_ms);
    assert!(!manifest.engine_version.is_empty());

    let json = serde_json::to_string(&manifest).expect("serialize");
    let back: RunManifest = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back.id, manifest.id);
    assert_eq!(back.stats, manifest.stats);
}
