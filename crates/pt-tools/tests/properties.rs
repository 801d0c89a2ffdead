use std::collections::HashMap;

use proptest::prelude::*;
use pt_io::{ReadOptions, WriteOptions, read_table_from, write_table_string};
use pt_table::Table;
use pt_tools::summarize_clusters;
use pt_types::Scalar;

fn counts_table(rows: &[(u8, i64, i64)]) -> Table {
    let data = rows
        .iter()
        .map(|(gene, s1, s2)| {
            vec![
                Scalar::Utf8(format!("g{gene}")),
                Scalar::Int64(*s1),
                Scalar::Int64(*s2),
            ]
        })
        .collect();
    Table::from_rows(vec!["gene".into(), "s1".into(), "s2".into()], data).expect("counts table")
}

fn cluster_info() -> Table {
    let rows = (0u8..4)
        .map(|gene| {
            vec![
                Scalar::Utf8(format!("g{gene}")),
                Scalar::Utf8(format!("c{}", gene % 2)),
            ]
        })
        .collect();
    Table::from_rows(vec!["gene".into(), "cluster".into()], rows).expect("cluster info")
}

fn sums_by_cluster(summary: &Table) -> HashMap<String, (f64, f64)> {
    let clusters = summary.require_column("cluster").expect("cluster").values();
    let s1 = summary.require_column("s1").expect("s1").values();
    let s2 = summary.require_column("s2").expect("s2").values();

    clusters
        .iter()
        .zip(s1.iter().zip(s2))
        .map(|(cluster, (a, b))| {
            (
                cluster.render(),
                (a.to_f64().expect("sum"), b.to_f64().expect("sum")),
            )
        })
        .collect()
}

proptest! {
    // Integer-valued sums are exact, so reordering the counts rows must not
    // change any cluster total.
    #[test]
    fn cluster_sums_are_row_order_independent(
        (rows, shuffled) in proptest::collection::vec((0u8..4, 0i64..1000, 0i64..1000), 1..20)
            .prop_flat_map(|rows| (Just(rows.clone()), Just(rows).prop_shuffle()))
    ) {
        let info = cluster_info();
        let a = summarize_clusters(&info, &counts_table(&rows)).expect("summarize");
        let b = summarize_clusters(&info, &counts_table(&shuffled)).expect("summarize");
        prop_assert_eq!(sums_by_cluster(&a), sums_by_cluster(&b));
    }

    #[test]
    fn csv_round_trip_preserves_simple_tables(
        rows in proptest::collection::vec(("[a-z]{1,8}", any::<i64>()), 0..20)
    ) {
        let data = rows
            .iter()
            .map(|(name, value)| vec![Scalar::Utf8(name.clone()), Scalar::Int64(*value)])
            .collect();
        let table = Table::from_rows(vec!["gene".into(), "value".into()], data).expect("table");

        let text = write_table_string(&table, &WriteOptions::csv()).expect("write");
        let back = read_table_from(text.as_bytes(), &ReadOptions::csv()).expect("read");
        prop_assert_eq!(table, back);
    }
}
