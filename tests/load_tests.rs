//! End-to-end mismatch load tests against the reference tables in `data/`.

use std::path::PathBuf;
use std::sync::Arc;

use eplet_load::catalog::store::{DataDirectory, ReferenceDatabase};
use eplet_load::core::typing::TypingTable;
use eplet_load::matching::engine::{
    compute_bidirectional_load, compute_mismatch_load, LoadError, LoadOptions, LoadOutput,
    LoadRow, OutputType,
};
use eplet_load::matching::expand::{AlleleExpander, ExpansionOptions};
use eplet_load::matching::render::render;
use eplet_load::matching::simple::compare_alleles;
use eplet_load::parsing::reference::parse_reference_table;
use eplet_load::utils::validation::ValidationError;
use eplet_load::Locus;

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

fn data() -> DataDirectory {
    DataDirectory::new(data_dir())
}

const COLUMNS: [&str; 4] = ["A1", "A2", "DQA11", "DQA12"];

fn rows(output: LoadOutput) -> Vec<LoadRow> {
    match output {
        LoadOutput::Rows(rows) => rows,
        LoadOutput::RemovedRows { .. } => panic!("expected load rows"),
    }
}

fn load(donors: TypingTable, recipients: TypingTable, options: &LoadOptions) -> Vec<LoadRow> {
    rows(compute_mismatch_load(&data(), donors, recipients, options).unwrap())
}

/// A*68:01 and A*68:02 differ at four positions
#[test]
fn test_a68_two_allele_comparison() {
    let rows = compare_alleles(&data(), "A*68:01", "A*68:02", ExpansionOptions::default()).unwrap();

    assert_eq!(rows[0].id, "In A*68:01 but not in A*68:02");
    assert_eq!(rows[0].details, "12V, 97M, 114R, 116D");
    assert_eq!(rows[0].load, 4);

    assert_eq!(rows[1].id, "In A*68:02 but not in A*68:01");
    assert_eq!(rows[1].details, "12M, 97R, 114H, 116Y");
    assert_eq!(rows[1].load, 4);
}

/// None of the A*68 private eplets are verified
#[test]
fn test_a68_verified_only() {
    let options = ExpansionOptions {
        verified_only: true,
        ..ExpansionOptions::default()
    };
    let rows = compare_alleles(&data(), "A*68:01", "A*68:02", options).unwrap();
    assert!(rows.iter().all(|r| r.load == 0 && r.details == "None"));
}

/// DQA1*05:01 and DQA1*05:05 carry the same eplets
#[test]
fn test_identical_eplet_content() {
    let rows =
        compare_alleles(&data(), "DQA1*05:01", "DQA1*05:05", ExpansionOptions::default()).unwrap();
    assert!(rows.iter().all(|r| r.load == 0 && r.details == "None"));
}

/// 75S and 175E are questionable, 40E is verified and 160D is not
#[test]
fn test_questionable_eplets() {
    let verified = ExpansionOptions {
        verified_only: true,
        ..ExpansionOptions::default()
    };
    let questionable = ExpansionOptions {
        include_questionable: true,
        ..verified
    };

    let rows = compare_alleles(&data(), "DQA1*06:01", "DQA1*05:01", verified).unwrap();
    assert_eq!(rows[0].details, "None");
    assert_eq!(rows[1].details, "None");

    let rows = compare_alleles(&data(), "DQA1*06:01", "DQA1*05:01", questionable).unwrap();
    assert_eq!(rows[0].details, "175E");
    assert_eq!(rows[1].details, "75S");

    let rows = compare_alleles(&data(), "DQA1*03:02", "DQA1*05:01", verified).unwrap();
    assert_eq!(rows[0].details, "40E");
}

/// An identical locus contributes nothing
#[test]
fn test_identical_locus_contributes_nothing() {
    let donors = TypingTable::new(COLUMNS)
        .with_row("1", ["A*01:01", "A*02:01", "DQA1*05:01", "DQA1*03:02"])
        .with_row("2", ["A*01:01", "A*02:01", "DQA1*05:01", "DQA1*05:01"]);
    let recipients = TypingTable::new(COLUMNS)
        .with_row("1", ["A*02:01", "A*01:01", "DQA1*05:01", "DQA1*05:05"])
        .with_row("2", ["A*01:01", "A*02:01", "DQA1*05:05", "DQA1*05:01"]);

    let rows = load(donors, recipients, &LoadOptions::default());

    assert_eq!(rows[0].details.as_deref(), Some("40E_DQ, 160D_DQ"));
    assert_eq!(rows[0].load, Some(2));
    assert_eq!(rows[1].details.as_deref(), Some("None"));
    assert_eq!(rows[1].load, Some(0));
}

/// A homozygote typed on one chromosome is accepted, inconsistent wildcards are not
#[test]
fn test_wildcard_parity() {
    let donors = TypingTable::new(["A1", "A2"]).with_row("1", ["A*01:01", "A*"]);
    let recipients = TypingTable::new(["A1", "A2"]).with_row("1", ["A*01:01", "A*11:01"]);
    let rows = load(donors, recipients, &LoadOptions::default());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].details.as_deref(), Some("None"));

    let donors = TypingTable::new(["A1", "A2"]).with_row("1", ["A*01:01", "A*"]);
    let recipients = TypingTable::new(["A1", "A2"]).with_row("1", ["A*02:01", "A*"]);
    let err = compute_mismatch_load(&data(), donors, recipients, &LoadOptions::default())
        .unwrap_err();
    assert!(matches!(
        err,
        LoadError::Validation(ValidationError::UnknownAlleleParity { ref gene, .. }) if gene == "A"
    ));
}

/// Recipient rows are matched to donor rows by id, whatever their order
#[test]
fn test_recipients_in_different_order() {
    let donors = TypingTable::new(["A1", "A2"])
        .with_row("1", ["A*01:01", "A*"])
        .with_row("2", ["A*68:02", "A*01:01"]);
    let recipients = TypingTable::new(["A1", "A2"])
        .with_row("2", ["A*68:01", "A*01:01"])
        .with_row("1", ["A*01:01", "A*11:01"]);

    let rows = load(donors, recipients, &LoadOptions::default());
    assert_eq!(rows[0].id, "1");
    assert_eq!(rows[0].load, Some(0));
    assert_eq!(rows[1].id, "2");
    assert_eq!(
        rows[1].details.as_deref(),
        Some("12M_ABC, 97R_ABC, 114H_ABC, 116Y_ABC")
    );
}

#[test]
fn test_row_count_mismatch() {
    let donors = TypingTable::new(["A1"])
        .with_row("1", ["A*01:01"])
        .with_row("2", ["A*01:01"]);
    let recipients = TypingTable::new(["A1"]).with_row("1", ["A*01:01"]);

    let err = compute_mismatch_load(&data(), donors, recipients, &LoadOptions::default())
        .unwrap_err();
    assert!(matches!(
        err,
        LoadError::Validation(ValidationError::RowCountMismatch { .. })
    ));
}

/// Null alleles carry no eplets
#[test]
fn test_null_allele() {
    let donors = TypingTable::new(["A1", "A2"]).with_row("1", ["A*02:01", "A*01:15N"]);
    let recipients = TypingTable::new(["A1", "A2"]).with_row("1", ["A*02:01", "A*03:01"]);

    let rows = load(donors, recipients, &LoadOptions::default());
    assert_eq!(rows[0].load, Some(0));
}

/// Rows with alleles missing from the reference data are reported, and their partner
/// row is dropped from the load
#[test]
fn test_removed_rows() {
    let donors = TypingTable::new(["A1", "A2"])
        .with_row("1", ["A*01:01", "A*02:01"])
        .with_row("2", ["A*01:01", "A*99:99"])
        .with_row("3", ["A*01:01", "A*02:01"]);
    let recipients = TypingTable::new(["A1", "A2"])
        .with_row("1", ["A*01:01", "A*03:01"])
        .with_row("2", ["A*01:01", "A*03:01"])
        .with_row("3", ["E*01:01", "A*03:01"]);

    let options = LoadOptions::default().with_output(OutputType::RemovedRows);
    let output =
        compute_mismatch_load(&data(), donors.clone(), recipients.clone(), &options).unwrap();
    let LoadOutput::RemovedRows {
        donors: removed_donors,
        recipients: removed_recipients,
    } = output
    else {
        panic!("expected removed rows");
    };
    assert_eq!(removed_donors.rows[0].id, "2");
    assert_eq!(removed_recipients.rows[0].id, "3");

    let rows = load(donors, recipients, &LoadOptions::default());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "1");
    assert_eq!(
        rows[0].details.as_deref(),
        Some("62GE_ABC, 107W_ABC, 127K_ABC, 142MT_ABC")
    );
}

#[test]
fn test_exclude() {
    let donors = TypingTable::new(["A1", "A2"])
        .with_row("a", ["A*68:02", "A*01:01"])
        .with_row("b", ["A*68:02", "A*01:01"]);
    let recipients = TypingTable::new(["A1", "A2"])
        .with_row("a", ["A*68:01", "A*01:01"])
        .with_row("b", ["A*68:01", "A*01:01"]);

    let options = LoadOptions::default().with_exclude(["b"]);
    let rows = load(donors, recipients, &options);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "a");
    assert_eq!(rows[0].load, Some(4));
}

/// Interlocus eplets can be left out, and verified-only loads never exceed full loads
#[test]
fn test_class_ii_filters() {
    let columns = ["DRB11", "DRB12"];
    let donors = TypingTable::new(columns).with_row("1", ["DRB1*15:01", "DRB1*04:01"]);
    let recipients = TypingTable::new(columns).with_row("1", ["DRB1*03:01", "DRB1*03:01"]);

    let all = load(donors.clone(), recipients.clone(), &LoadOptions::default());
    assert_eq!(
        all[0].details.as_deref(),
        Some("13H_DR, 13R_DR, 30R_DR, rqp37YA")
    );

    let options = LoadOptions::default().with_interlocus(false);
    let no_interlocus = load(donors.clone(), recipients.clone(), &options);
    assert_eq!(
        no_interlocus[0].details.as_deref(),
        Some("13H_DR, 13R_DR, 30R_DR")
    );

    let options = LoadOptions::default().with_verified_only(true);
    let verified = load(donors, recipients, &options);
    assert_eq!(verified[0].details.as_deref(), Some("13H_DR, 13R_DR"));
    assert!(verified[0].load <= all[0].load);
}

/// Loci of a class that is not requested contribute no eplets but are still filtered
#[test]
fn test_class_selection() {
    let donors =
        TypingTable::new(COLUMNS).with_row("1", ["A*68:02", "A*01:01", "DQA1*06:01", "DQA1*05:01"]);
    let recipients =
        TypingTable::new(COLUMNS).with_row("1", ["A*68:01", "A*01:01", "DQA1*05:01", "DQA1*05:01"]);

    let options = LoadOptions::default().with_classes(true, false);
    let class_i = load(donors.clone(), recipients.clone(), &options);
    assert_eq!(
        class_i[0].details.as_deref(),
        Some("12M_ABC, 97R_ABC, 114H_ABC, 116Y_ABC")
    );

    let options = LoadOptions::default().with_classes(false, true);
    let class_ii = load(donors.clone(), recipients.clone(), &options);
    assert_eq!(class_ii[0].details.as_deref(), Some("175E_DQ"));

    let options = LoadOptions::default().with_classes(false, false);
    let neither = load(donors, recipients, &options);
    assert_eq!(neither[0].load, Some(0));
}

#[test]
fn test_bidirectional_load() {
    let donors = TypingTable::new(["A1", "A2"]).with_row("1", ["A*68:02", "A*01:01"]);
    let recipients = TypingTable::new(["A1", "A2"]).with_row("1", ["A*68:01", "A*01:01"]);

    let both =
        compute_bidirectional_load(&data(), donors, recipients, &LoadOptions::default()).unwrap();
    assert_eq!(
        both.forward[0].details().unwrap(),
        "12M_ABC, 97R_ABC, 114H_ABC, 116Y_ABC"
    );
    assert_eq!(
        both.reverse[0].details().unwrap(),
        "12V_ABC, 97M_ABC, 114R_ABC, 116D_ABC"
    );
}

/// Column order of a reference table does not change the ranked output
#[test]
fn test_column_order_independence() {
    let ordered = "allele;1;2;3;4\nA*68:02;9Y;12M;97R;rq26Y\n";
    let shuffled = "allele;1;2;3;4\nA*68:02;rq26Y;97R;9Y;12M\n";
    let path = PathBuf::from("A.csv");

    let render_first = |text: &str| {
        let table = parse_reference_table(text.as_bytes(), &path, Locus::A, true).unwrap();
        let metadata = data().load_metadata().unwrap();
        let db = ReferenceDatabase::from_tables([Arc::new(table)], metadata);
        let eplets = AlleleExpander::new(&db, ExpansionOptions::default())
            .expand_all(&["A*68:02"])
            .unwrap();
        render(&eplets).unwrap()
    };

    assert_eq!(render_first(ordered), render_first(shuffled));
    assert_eq!(render_first(ordered), "9Y_ABC, 12M_ABC, 97R_ABC, rq26Y");
}

/// Repeated loads of an unchanged table come from the cache
#[test]
fn test_reference_tables_are_memoized() {
    let data = data();
    let first = data.load(Locus::Dq, true).unwrap();
    let second = data.load(Locus::Dq, true).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let fresh = parse_reference_table(
        &std::fs::read(data.table_path(Locus::Dq)).unwrap(),
        &data.table_path(Locus::Dq),
        Locus::Dq,
        true,
    )
    .unwrap();
    assert_eq!(*first, fresh);
}

/// On-disk cache files are written and reused
#[test]
fn test_disk_cache() {
    use eplet_load::catalog::cache::TableCache;

    let cache_dir = tempfile::tempdir().unwrap();
    let data = DataDirectory::with_cache(
        data_dir(),
        TableCache::new().with_disk_cache(cache_dir.path()),
    );
    let parsed = data.load(Locus::A, false).unwrap();
    assert!(cache_dir.path().join("A_false.bin").exists());

    let data = DataDirectory::with_cache(
        data_dir(),
        TableCache::new().with_disk_cache(cache_dir.path()),
    );
    let cached = data.load(Locus::A, false).unwrap();
    assert_eq!(*cached, *parsed);
    assert!(cached.contains("A*68:02"));
    assert!(cached.eplets("A*68:02").unwrap().is_empty());
}
