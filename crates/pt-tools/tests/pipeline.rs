//! End-to-end stage tests over real files in temporary directories.

use std::fs;
use std::path::{Path, PathBuf};

use pt_tools::{
    InfoOptions, aggregate_by_cluster, concatenate_clusters, figure_pangenome_counts,
    figure_pangenome_kegg, figure_pangenome_reference, gene_lengths, genome_contig_table,
    pangenome_info, pangenome_structure, select_ko, separate_coverm, translate_genes,
};
use tempfile::TempDir;

fn fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).expect("read output")
}

#[test]
fn cluster_aggregation_sums_per_cluster_and_drops_unmatched_genes() {
    let dir = TempDir::new().expect("tempdir");
    let cluster_info = fixture(
        dir.path(),
        "cluster_info.csv",
        "gene,cluster\ng1,c1\ng2,c1\ng3,c2\n",
    );
    let counts = fixture(dir.path(), "counts.csv", "gene,s1,s2\ng1,10,1\ng2,20,2\n");
    let out = dir.path().join("summary.csv");

    aggregate_by_cluster(&cluster_info, &counts, &out).expect("aggregate");

    // g3 has no counts row, so c2 never appears.
    assert_eq!(read(&out), "cluster,s1,s2\nc1,30,3\n");
}

#[test]
fn ko_selection_keeps_best_hit_per_query_under_threshold() {
    let dir = TempDir::new().expect("tempdir");
    let hits = fixture(
        dir.path(),
        "hits.txt",
        "# ko definition header\n\
         ko1 x q1 y 1e-3 trailing note\n\
         ko2 x q1 y 1e-7\n\
         ko3 x q2 y 3.5e-4\n",
    );
    let out = dir.path().join("ko.tsv");

    select_ko(&hits, &out).expect("select ko");

    // q1's best hit wins and passes the 1e-5 cutoff; q2's best does not.
    assert_eq!(read(&out), "gene\tko_id\tko_e\nq1\tko2\t1e-7\n");
}

#[test]
fn coverage_split_produces_one_table_per_metric() {
    let dir = TempDir::new().expect("tempdir");
    let coverage = fixture(
        dir.path(),
        "coverage.tsv",
        "Contig\ts1 Read Count\ts1 Covered Bases\ts2 Read Count\ts2 Covered Bases\n\
         c1\t5\t100\t7\t140\n",
    );
    let reads_out = dir.path().join("reads.tsv");
    let bases_out = dir.path().join("bases.tsv");

    separate_coverm(&coverage, &reads_out, &bases_out).expect("separate");

    assert_eq!(read(&reads_out), "gene\ts1\ts2\nc1\t5\t7\n");
    assert_eq!(read(&bases_out), "gene\ts1\ts2\nc1\t100\t140\n");
}

#[test]
fn concatenation_tags_rows_with_file_stems() {
    let dir = TempDir::new().expect("tempdir");
    let a = fixture(dir.path(), "core.tsv", "r1\tg1\nr2\tg2\n");
    let b = fixture(dir.path(), "shell.tsv", "r3\tg3\n");
    let out = dir.path().join("all.tsv");

    concatenate_clusters(&[a.as_path(), b.as_path()], &out).expect("concat");

    assert_eq!(
        read(&out),
        "reference\tall\tcluster\nr1\tg1\tcore\nr2\tg2\tcore\nr3\tg3\tshell\n"
    );
}

#[test]
fn pangenome_info_assembles_the_per_gene_summary() {
    let dir = TempDir::new().expect("tempdir");
    let cdb = fixture(
        dir.path(),
        "cdb.csv",
        "genome,secondary_cluster\nstrainA.fna,1_1\n",
    );
    let genomes = fixture(
        dir.path(),
        "genomes.csv",
        "genome,gene,contig\nstrainA,geneA,contig1\nstrainA,geneB,contig1\n",
    );
    let lengths = fixture(dir.path(), "lengths.csv", "contig,length\ncontig1,5000\n");
    let kofams = fixture(
        dir.path(),
        "kofams.csv",
        "gene,ko_id,ko_e\ngeneA,K00001,1e-10\n",
    );
    let out = dir.path().join("info.csv");

    pangenome_info(&cdb, &genomes, &lengths, &kofams, &out, InfoOptions::default())
        .expect("pangenome info");

    // geneB has no annotation; its ko fields stay empty.
    assert_eq!(
        read(&out),
        "cluster,genome,gene,length,ko_id,ko_e\n\
         cluster1_1,strainA,geneA,5000,K00001,1e-10\n\
         cluster1_1,strainA,geneB,5000,,\n"
    );
}

#[test]
fn pangenome_structure_derives_genomes_from_contig_names() {
    let dir = TempDir::new().expect("tempdir");
    let cdb = fixture(
        dir.path(),
        "cdb.csv",
        "genome,primary_cluster\nstrainA.fna,2\nstrain_B.fna,3\n",
    );
    let contig_lengths = fixture(
        dir.path(),
        "contig_lengths.csv",
        "Contig,Length\nstrainA@c1,1234\nstrain:B@c9,777\n",
    );
    let out = dir.path().join("structure.csv");

    pangenome_structure(&cdb, &contig_lengths, &out).expect("pangenome structure");

    assert_eq!(
        read(&out),
        "cluster,genome,gene,length\n\
         cluster2,strainA,strainA@c1,1234\n\
         cluster3,strain_B,strain:B@c9,777\n"
    );
}

#[test]
fn gene_lengths_counts_sequence_characters() {
    let dir = TempDir::new().expect("tempdir");
    let genes = fixture(dir.path(), "genes.fna", ">geneA\nATGAAATGA\n>geneB desc\nATGTTT\n");
    let out = dir.path().join("lengths.csv");

    gene_lengths(&genes, &out).expect("gene lengths");

    assert_eq!(read(&out), "gene,length\ngeneA,9\ngeneB,6\n");
}

#[test]
fn genome_contig_table_names_genomes_after_their_files() {
    let dir = TempDir::new().expect("tempdir");
    let a = fixture(dir.path(), "alpha.fna", ">c1\nAA\n>c2\nAA\n");
    let b = fixture(dir.path(), "beta.fna", ">c3\nAA\n");
    let out = dir.path().join("contigs.csv");

    genome_contig_table(&[a.as_path(), b.as_path()], &out).expect("contig table");

    assert_eq!(read(&out), "genome,contig\nalpha,c1\nalpha,c2\nbeta,c3\n");
}

#[test]
fn translation_stops_at_stop_codons_and_drops_descriptions() {
    let dir = TempDir::new().expect("tempdir");
    let genes = fixture(dir.path(), "genes.fna", ">geneA\nATGAAATGA\n>geneB desc\nATGTTT\n");
    let out = dir.path().join("proteins.faa");

    translate_genes(&genes, &out).expect("translate");

    assert_eq!(read(&out), ">geneA\nMK\n>geneB\nMF\n");
}

#[test]
fn reference_figure_labels_every_genome() {
    let dir = TempDir::new().expect("tempdir");
    let genomes = fixture(
        dir.path(),
        "genomes.csv",
        "genome,gene\nstrainA,g1\nstrainB,g2\n",
    );
    let genes = fixture(dir.path(), "core.tsv", "g1\tg1\ng1\tg2\n");
    let out = dir.path().join("figure.svg");

    figure_pangenome_reference(&genomes, &genes, &out).expect("figure");

    let svg = read(&out);
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains(">strainA<"));
    assert!(svg.contains(">strainB<"));
    // Page title comes from the member list's file stem.
    assert!(svg.contains(">core<"));
}

#[test]
fn kegg_figure_labels_unannotated_genes_by_name() {
    let dir = TempDir::new().expect("tempdir");
    let genomes = fixture(
        dir.path(),
        "genomes.csv",
        "genome,gene\nstrainA,g1\nstrainA,g2\nstrainB,g1\n",
    );
    let cluster_info = fixture(
        dir.path(),
        "cluster_info.csv",
        "cluster,gene,length,ko_id,ko_e\nc1,g1,300,K00001,1e-9\nc1,g2,200,,\n",
    );
    let genes = fixture(dir.path(), "core.tsv", "g1\tg1\ng2\tg2\n");
    let out = dir.path().join("kegg.svg");

    figure_pangenome_kegg(&genomes, &cluster_info, &[genes.as_path()], &out).expect("figure");

    let svg = read(&out);
    assert!(svg.contains(">KEGG ID presence across genomes<"));
    assert!(svg.contains(">K00001<"));
    // g2 carries no annotation, so its bar is labeled by the gene itself.
    assert!(svg.contains(">g2<"));
    assert!(svg.contains(">core<"));
}

#[test]
fn counts_figure_emits_one_page_per_cluster() {
    let dir = TempDir::new().expect("tempdir");
    let clusters = fixture(
        dir.path(),
        "clusters.csv",
        "gene,cluster\ng1,c1\ng2,c1\ng3,c2\n",
    );
    let counts = fixture(
        dir.path(),
        "counts.csv",
        "gene,s1,s2\ng1,10,0\ng2,30,0\ng3,5,7\n",
    );
    let out = dir.path().join("counts.svg");

    figure_pangenome_counts(&clusters, &counts, &out).expect("figure");

    let svg = read(&out);
    assert!(svg.contains(">Cluster: c1<"));
    assert!(svg.contains(">Cluster: c2<"));
    // After the transpose, samples are the heatmap rows; s2 is all-zero for
    // c1 and only survives on the c2 page.
    assert!(svg.contains(">s1<"));
    assert!(svg.contains(">s2<"));
}
