//! Chunked execution must agree with a single-pass join


use clusterjoin_core::cluster::{ClusterPlan, RowRange};
use clusterjoin_core::config::JoinConfig;
use clusterjoin_core::join::{JoinSpec, JoinType};
use clusterjoin_core::types::RowBatch;
use clusterjoin_io::{count_rows, ChunkReader};
use clusterjoin_planner::{estimate_cluster_plan, EstimateInput, SampleProfile};
use test_data_gen::{
    config_with_cluster_size, generate_keyed_rows, header_and_sorted, naive_join, run_join,
    write_csv,
};

fn text_rows(batch: &RowBatch) -> Vec<Vec<String>> {
    (0..batch.num_rows())
        .map(|r| {
            batch
                .row(r)
                .into_iter()
                .map(|v| v.as_str().unwrap_or("").to_string())
                .collect()
        })
        .collect()
}

#[test]
fn test_chunked_join_matches_naive_join() {
    let dir = tempfile::tempdir().expect("tempdir");
    // left keys 0..15, right keys 0..13: both sides have unmatched rows
    let left = write_csv(
        dir.path(),
        "left.csv",
        "id,name",
        &generate_keyed_rows(23, 15, 4, "l"),
    );
    let right = write_csv(
        dir.path(),
        "right.csv",
        "id,dept",
        &generate_keyed_rows(17, 13, 5, "r"),
    );

    for kind in [JoinType::Inner, JoinType::Left, JoinType::Right] {
        let spec = JoinSpec::new("id", kind);
        let expected = header_and_sorted(naive_join(&left, &right, &spec));
        for size in [1u64, 2, 3, 7, 16, 1000] {
            let (lines, manifest) =
                run_join(config_with_cluster_size(size), &left, &right, spec.clone())
                    .expect("join failed");
            assert_eq!(
                header_and_sorted(lines),
                expected,
                "{kind} join differs with cluster_size={size}"
            );
            assert_eq!(manifest.stats.join_invocations, manifest.plan.pair_count());
        }
    }
}

#[test]
fn test_multi_cluster_outer_joins_do_not_duplicate_or_drop_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let left = write_csv(
        dir.path(),
        "l.csv",
        "id,a",
        &["1,x".into(), "2,y".into(), "3,z".into(), "4,w".into()],
    );
    let right = write_csv(
        dir.path(),
        "r.csv",
        "id,b",
        &["4,p".into(), "9,q".into(), "1,r".into(), "8,s".into()],
    );

    let (lines, manifest) = run_join(
        config_with_cluster_size(2),
        &left,
        &right,
        JoinSpec::new("id", JoinType::Left),
    )
    .expect("left join");
    assert_eq!(manifest.plan.nclusters_right, 3);
    let (header, body) = header_and_sorted(lines);
    assert_eq!(header, "id,a,b");
    assert_eq!(body, vec!["1,x,r", "2,y,", "3,z,", "4,w,p"]);

    let (lines, manifest) = run_join(
        config_with_cluster_size(2),
        &left,
        &right,
        JoinSpec::new("id", JoinType::Right),
    )
    .expect("right join");
    assert_eq!(manifest.plan.nclusters_left, 3);
    let (_, body) = header_and_sorted(lines);
    assert_eq!(body, vec!["1,x,r", "4,w,p", "8,,s", "9,,q"]);
}

#[test]
fn test_degenerate_mode_equivalence() {
    let dir = tempfile::tempdir().expect("tempdir");
    let left = write_csv(
        dir.path(),
        "big.csv",
        "k,v",
        &generate_keyed_rows(20, 6, 1, "v"),
    );
    let right = write_csv(
        dir.path(),
        "small.csv",
        "k,w",
        &["0,a".into(), "5,b".into(), "7,c".into()],
    );

    for kind in [JoinType::Inner, JoinType::Left, JoinType::Right] {
        let spec = JoinSpec::new("k", kind);
        let (cached, cached_manifest) =
            run_join(config_with_cluster_size(5), &left, &right, spec.clone())
                .expect("degenerate run");
        let (general, general_manifest) =
            run_join(config_with_cluster_size(2), &left, &right, spec.clone())
                .expect("general run");

        assert!(cached_manifest.plan.is_degenerate());
        assert!(!general_manifest.plan.is_degenerate());
        // right table once, plus 5 left chunks
        assert_eq!(cached_manifest.stats.chunks_read, 1 + 5);

        let cached = header_and_sorted(cached);
        assert_eq!(cached, header_and_sorted(general), "{kind}");
        assert_eq!(cached, header_and_sorted(naive_join(&left, &right, &spec)), "{kind}");
    }
}

#[test]
fn test_cluster_ranges_cover_every_row_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    for (n, size) in [(10usize, 3u64), (9, 3), (1, 1), (0, 4)] {
        let path = write_csv(
            dir.path(),
            &format!("rows_{n}_{size}.csv"),
            "id,v",
            &generate_keyed_rows(n, 100, 1, "v"),
        );
        let nrows = count_rows(&path).expect("count");
        assert_eq!(nrows, n as u64);

        let plan = ClusterPlan::new(size, nrows, nrows);
        assert_eq!(plan.nclusters_left, nrows / size + 1);

        let reader = ChunkReader::new(&path, b',');
        let mut union = Vec::new();
        for c in plan.left_clusters() {
            let chunk = reader.read(c.range).expect("read chunk");
            assert_eq!(chunk.schema().columns, vec!["id", "v"], "header always kept");
            union.extend(text_rows(&chunk));
        }
        let whole = reader.read_all().expect("read all");
        assert_eq!(union, text_rows(&whole), "n={n} size={size}");
    }
}

#[test]
fn test_range_past_end_yields_fewer_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_csv(dir.path(), "t.csv", "id", &["1".into(), "2".into()]);
    let reader = ChunkReader::new(&path, b',');
    assert_eq!(reader.read(RowRange::new(2, 50)).expect("read").num_rows(), 1);
    assert_eq!(reader.read(RowRange::new(3, 4)).expect("read").num_rows(), 0);
}

#[test]
fn test_row_count_with_and_without_trailing_newline() {
    let dir = tempfile::tempdir().expect("tempdir");
    let with = dir.path().join("with.csv");
    let without = dir.path().join("without.csv");
    let empty = dir.path().join("empty.csv");
    std::fs::write(&with, "id\n1\n2\n").expect("write");
    std::fs::write(&without, "id\n1\n2").expect("write");
    std::fs::write(&empty, "").expect("write");
    assert_eq!(count_rows(&with).expect("count"), 2);
    assert_eq!(count_rows(&without).expect("count"), 2);
    assert_eq!(count_rows(&empty).expect("count"), 0);
}

#[test]
fn test_estimated_plan_respects_memory_bound() {
    let dir = tempfile::tempdir().expect("tempdir");
    let left = write_csv(
        dir.path(),
        "l.csv",
        "id,name",
        &generate_keyed_rows(300, 50, 7, "person-with-a-longer-name-"),
    );
    let right = write_csv(dir.path(), "r.csv", "id,d", &generate_keyed_rows(40, 50, 3, "d"));
    let cfg = JoinConfig::default();
    let pl = SampleProfile::read(&left, cfg.sample_rows, b',').expect("profile");
    let pr = SampleProfile::read(&right, cfg.sample_rows, b',').expect("profile");
    assert_eq!(pl.sampled_rows(), 100);

    for memory_available in [200_000usize, 1_000_000, 64 * 1024 * 1024] {
        let est = estimate_cluster_plan(&EstimateInput {
            memory_per_row_left: pl.memory_per_row().expect("mpr"),
            memory_per_row_right: pr.memory_per_row().expect("mpr"),
            memory_available,
            nrows_left: 300,
            nrows_right: 40,
            cluster_size_override: None,
        })
        .expect("estimate");
        let c = est.plan.cluster_size as f64;
        assert!(2.0 * c * est.max_join_memory_per_row <= 0.8 * memory_available as f64);
        assert_eq!(est.plan.nclusters_left, 300 / est.plan.cluster_size + 1);
    }
}
