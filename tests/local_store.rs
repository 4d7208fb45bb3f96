//! End-to-end resolution over a filesystem storage tree
//!
//! Each test lays out the three tiers in a temporary directory and resolves
//! identifiers through [`LocalObjectStore`](dissemination::LocalObjectStore).

mod common;

use common::{StorageTree, WITHDRAWN_ABS, assert_condition, assert_found, descriptor};
use dissemination::{
    Condition, Config, DescriptorLookup, Error, Format, Identifier, ObjectStore, TierConfig,
    ToHttpStatus,
};
use flate2::Compression;
use flate2::write::GzEncoder;

fn id(s: &str) -> Identifier {
    s.parse().expect("valid identifier")
}

/// 0704.0001 at version 3: v1 pre-rendered in the archive, v2 in the cache,
/// v3 rendered in the current tier
fn three_version_tree() -> StorageTree {
    let tree = StorageTree::new();
    tree.put(
        "ftp/arxiv/papers/0704/0704.0001.abs",
        descriptor("0704.0001", &["", "", ""]),
    );
    tree.put("ftp/arxiv/papers/0704/0704.0001.pdf", b"%PDF-1.5 v3");
    tree.put("ftp/arxiv/papers/0704/0704.0001.tar.gz", b"source");
    tree.put(
        "orig/arxiv/papers/0704/0704.0001v1.abs",
        descriptor("0704.0001", &[""]),
    );
    tree.put("orig/arxiv/papers/0704/0704.0001v1.pdf", b"%PDF-1.5 v1");
    tree.put(
        "orig/arxiv/papers/0704/0704.0001v2.abs",
        descriptor("0704.0001", &["", ""]),
    );
    tree.put("ps_cache/arxiv/pdf/0704/0704.0001v2.pdf", b"%PDF-1.5 v2");
    tree
}

#[tokio::test]
async fn each_version_resolves_to_its_tier() {
    let tree = three_version_tree();
    let articles = &tree.articles;

    assert_eq!(articles.current_version(&id("0704.0001")).await.unwrap(), Some(3));

    let v1 = articles
        .dissemination_for_id(Format::Pdf, &id("0704.0001v1"))
        .await
        .unwrap();
    assert_found(&v1, "orig/arxiv/papers/0704/0704.0001v1.pdf");

    let v2 = articles
        .dissemination_for_id(Format::Pdf, &id("0704.0001v2"))
        .await
        .unwrap();
    assert_found(&v2, "ps_cache/arxiv/pdf/0704/0704.0001v2.pdf");

    let v3 = articles
        .dissemination_for_id(Format::Pdf, &id("0704.0001v3"))
        .await
        .unwrap();
    assert_found(&v3, "ftp/arxiv/papers/0704/0704.0001.pdf");

    let latest = articles
        .dissemination_for_id(Format::Pdf, &id("0704.0001"))
        .await
        .unwrap();
    assert_found(&latest, "ftp/arxiv/papers/0704/0704.0001.pdf");

    let v4 = articles
        .dissemination_for_id(Format::Pdf, &id("0704.0001v4"))
        .await
        .unwrap();
    assert_condition(&v4, Condition::VersionNotFound);
}

#[tokio::test]
async fn resolved_object_is_readable() {
    let tree = three_version_tree();
    let resolution = tree
        .articles
        .dissemination_for_id(Format::Pdf, &id("0704.0001v2"))
        .await
        .unwrap();
    let obj = resolution.found().expect("rendition");

    let bytes = tree.articles.object_store().read_to_end(obj.key()).await.unwrap();
    assert_eq!(bytes, b"%PDF-1.5 v2");
    assert_eq!(obj.name(), "0704.0001v2.pdf");
}

#[tokio::test]
async fn descriptors_across_tiers() {
    let tree = three_version_tree();
    let articles = &tree.articles;

    let current = articles
        .descriptor_for_id(&id("0704.0001"), DescriptorLookup::default())
        .await
        .unwrap();
    assert_found(&current, "ftp/arxiv/papers/0704/0704.0001.abs");

    let v2 = articles
        .descriptor_for_id(&id("0704.0001v2"), DescriptorLookup::default())
        .await
        .unwrap();
    assert_found(&v2, "orig/arxiv/papers/0704/0704.0001v2.abs");

    let parsed = articles.descriptor(&id("0704.0001")).await.unwrap();
    assert_eq!(parsed.version_count(), 3);
    assert_eq!(parsed.latest().map(|v| v.version), Some(3));
}

#[tokio::test]
async fn withdrawn_version_is_reported_on_both_paths() {
    let tree = StorageTree::new();
    tree.put("ftp/arxiv/papers/0704/0704.0002.abs", WITHDRAWN_ABS);
    tree.put(
        "orig/arxiv/papers/0704/0704.0002v1.abs",
        descriptor("0704.0002", &[""]),
    );
    tree.put("ftp/arxiv/papers/0704/0704.0002.tar.gz", b"source");

    let id_v2 = id("0704.0002v2");
    assert!(tree.articles.is_withdrawn(&id_v2).await.unwrap());
    assert!(!tree.articles.is_withdrawn(&id("0704.0002v1")).await.unwrap());

    for raw in ["0704.0002v2", "0704.0002"] {
        let resolution = tree
            .articles
            .dissemination_for_id(Format::Pdf, &id(raw))
            .await
            .unwrap();
        assert_condition(&resolution, Condition::Withdrawn);
        let condition = resolution.condition().unwrap();
        assert_eq!(condition.status_code(), 404);
        assert_eq!(condition.error_code(), "withdrawn");
    }
}

#[tokio::test]
async fn missing_article_and_source() {
    let tree = StorageTree::new();
    tree.put(
        "ftp/arxiv/papers/1501/1501.00001.abs",
        descriptor("1501.00001", &[""]),
    );

    let missing = tree
        .articles
        .dissemination_for_id(Format::Pdf, &id("1501.00002"))
        .await
        .unwrap();
    assert_condition(&missing, Condition::ArticleNotFound);

    let no_source = tree
        .articles
        .dissemination_for_id(Format::Pdf, &id("1501.00001"))
        .await
        .unwrap();
    assert_condition(&no_source, Condition::NoSource);

    let versioned = tree
        .articles
        .dissemination_for_id(Format::Pdf, &id("1501.00001v1"))
        .await
        .unwrap();
    assert_condition(&versioned, Condition::Withdrawn);
}

#[tokio::test]
async fn source_without_rendition_is_unavailable() {
    let tree = StorageTree::new();
    tree.put(
        "ftp/arxiv/papers/1501/1501.00001.abs",
        descriptor("1501.00001", &[""]),
    );
    tree.put("ftp/arxiv/papers/1501/1501.00001.ps.gz", b"%!PS");

    let resolution = tree
        .articles
        .dissemination_for_id(Format::Pdf, &id("1501.00001"))
        .await
        .unwrap();
    assert_condition(&resolution, Condition::Unavailable);
    assert_eq!(resolution.condition().unwrap().status_code(), 500);
}

#[tokio::test]
async fn old_style_identifiers_use_archive_directory() {
    let tree = StorageTree::new();
    tree.put(
        "ftp/hep-th/papers/9901/9901001.abs",
        descriptor("hep-th/9901001", &["", ""]),
    );
    tree.put(
        "orig/hep-th/papers/9901/9901001v1.abs",
        descriptor("hep-th/9901001", &[""]),
    );
    tree.put("ftp/hep-th/papers/9901/9901001.pdf", b"%PDF");
    tree.put("ps_cache/hep-th/pdf/9901/9901001v1.pdf", b"%PDF");

    let articles = &tree.articles;
    assert_eq!(
        articles.current_version(&id("hep-th/9901001")).await.unwrap(),
        Some(2)
    );

    let v1 = articles
        .dissemination_for_id(Format::Pdf, &id("hep-th/9901001v1"))
        .await
        .unwrap();
    assert_found(&v1, "ps_cache/hep-th/pdf/9901/9901001v1.pdf");

    let latest = articles
        .dissemination_for_id(Format::Pdf, &id("arXiv:hep-th/9901001"))
        .await
        .unwrap();
    assert_found(&latest, "ftp/hep-th/papers/9901/9901001.pdf");
}

#[tokio::test]
async fn custom_tier_names() {
    let tree = StorageTree::with_config(Config {
        tiers: TierConfig {
            current: "live".to_string(),
            archive: "history".to_string(),
            cache: "rendered".to_string(),
        },
        ..Default::default()
    });
    tree.put(
        "live/arxiv/papers/0704/0704.0001.abs",
        descriptor("0704.0001", &["", ""]),
    );
    tree.put(
        "history/arxiv/papers/0704/0704.0001v1.abs",
        descriptor("0704.0001", &[""]),
    );
    tree.put("rendered/arxiv/pdf/0704/0704.0001v2.pdf", b"%PDF");

    assert_eq!(tree.config.tiers.cache, "rendered");
    let resolution = tree
        .articles
        .dissemination_for_id(Format::Pdf, &id("0704.0001"))
        .await
        .unwrap();
    assert_found(&resolution, "rendered/arxiv/pdf/0704/0704.0001v2.pdf");
}

#[tokio::test]
async fn unsupported_format_is_a_bad_request() {
    let tree = three_version_tree();
    let err = tree
        .articles
        .dissemination_for_id(Format::Html, &id("0704.0001v1"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat(Format::Html)));
    assert_eq!(err.status_code(), 400);
    assert_eq!(err.error_code(), "unsupported_format");
}

#[tokio::test]
async fn corrupted_descriptor_is_a_server_error() {
    let tree = StorageTree::new();
    tree.put(
        "ftp/arxiv/papers/0704/0704.0003.abs",
        "\\\\\nDate: sometime last spring (10kb)\n\\\\\n",
    );

    let err = tree
        .articles
        .dissemination_for_id(Format::Pdf, &id("0704.0003"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Descriptor(_)));
    assert_eq!(err.status_code(), 500);
}

#[tokio::test]
async fn ancillary_files_from_source_package() {
    let tree = StorageTree::new();
    tree.put(
        "ftp/arxiv/papers/0704/0704.0001.abs",
        descriptor("0704.0001", &["A"]),
    );

    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, content) in [
        ("paper.tex", &b"\\begin{document}"[..]),
        ("anc/notebook.ipynb", &b"{}"[..]),
        ("anc/code/run.py", &b"print(1)\n"[..]),
    ] {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, content).unwrap();
    }
    let package = builder.into_inner().unwrap().finish().unwrap();
    tree.put("ftp/arxiv/papers/0704/0704.0001.tar.gz", package);

    let files = tree
        .articles
        .ancillary_files_for_id(&id("0704.0001"))
        .await
        .unwrap();
    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["code/run.py", "notebook.ipynb"]);
    assert_eq!(files[0].size_bytes, 9);
}

#[tokio::test]
async fn listing_through_a_second_store_handle() {
    let tree = three_version_tree();
    let store = tree.local_store();

    let archived = store.list("orig/arxiv/papers/0704/0704.0001").await.unwrap();
    let names: Vec<&str> = archived.iter().map(|o| o.name()).collect();
    assert_eq!(
        names,
        vec!["0704.0001v1.abs", "0704.0001v1.pdf", "0704.0001v2.abs"]
    );
}
