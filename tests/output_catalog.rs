use job_report::{FileRecord, Node, Report, Run, Scalar};

fn complete(lfn: &str) -> FileRecord {
    FileRecord::new(lfn, 100, 10)
        .with_run(Run::new(1, [1, 2]))
        .with_location("siteA")
}

#[test]
fn incomplete_file_does_not_create_module() {
    let mut report = Report::with_step("cmsRun1");
    assert!(report.add_output_file("AODSIM", &FileRecord::new("", 100, 10)).is_none());
    assert!(report.add_output_file("AODSIM", &FileRecord::new("/store/a.root", 0, 10)).is_none());
    assert!(report.add_output_file("AODSIM", &FileRecord::new("/store/a.root", 100, 0)).is_none());

    assert!(report.get_output_module("cmsRun1", "AODSIM").is_none());
    let step = report.retrieve_step("cmsRun1").unwrap();
    assert_eq!(step.list("outputModules"), Some(&[][..]));
}

#[test]
fn indices_have_no_gaps_across_rejections() {
    let mut report = Report::with_step("cmsRun1");
    report.add_output_module("AODSIM");
    assert_eq!(report.add_output_file("AODSIM", &complete("/store/a.root")).unwrap().name(), "file0");
    assert!(report.add_output_file("AODSIM", &FileRecord::new("", 1, 1)).is_none());
    assert_eq!(report.add_output_file("AODSIM", &complete("/store/b.root")).unwrap().name(), "file1");

    let files = report
        .get_output_module("cmsRun1", "AODSIM")
        .unwrap()
        .section("files")
        .unwrap();
    assert_eq!(files.int("fileCount"), Some(2));
    assert!(files.section("file2").is_none());
}

#[test]
fn rejected_file_leaves_counter_alone() {
    let mut report = Report::with_step("cmsRun1");
    report.add_output_module("AODSIM");
    report.add_output_file("AODSIM", &complete("/store/a.root"));
    assert!(report.add_output_file("AODSIM", &FileRecord::new("", 100, 10)).is_none());

    let files = report
        .get_output_module("cmsRun1", "AODSIM")
        .unwrap()
        .section("files")
        .unwrap();
    assert_eq!(files.int("fileCount"), Some(1));
    assert!(files.section("file1").is_none());
}

#[test]
fn dataset_comes_from_first_file() {
    let mut report = Report::with_step("cmsRun1");
    let first = complete("/store/a.root")
        .with_dataset_field("primaryDataset", "MinBias")
        .with_dataset_field("dataTier", "AODSIM");
    let second = complete("/store/b.root")
        .with_dataset_field("primaryDataset", "ZeroBias")
        .with_dataset_field("processedDataset", "Other");
    report.add_output_file("AODSIM", &first);
    report.add_output_file("AODSIM", &second);

    let dataset = report
        .get_output_module("cmsRun1", "AODSIM")
        .unwrap()
        .section("dataset")
        .unwrap();
    assert_eq!(dataset.string("primaryDataset"), Some("MinBias"));
    assert_eq!(dataset.string("dataTier"), Some("AODSIM"));
    assert_eq!(dataset.string("OutputModuleName"), Some("AODSIM"));
    assert!(!dataset.contains("processedDataset"));
}

#[test]
fn new_locations_are_appended_without_dedup() {
    let mut report = Report::with_step("cmsRun1");
    let mut file = complete("/store/a.root").with_location("siteB");
    file.new_locations = Some(vec!["siteC".into(), "siteA".into()]);
    let stored = report.add_output_file("AODSIM", &file).unwrap();

    assert_eq!(
        stored.list("locations"),
        Some(&[Scalar::from("siteA"), "siteB".into(), "siteC".into(), "siteA".into()][..])
    );
    assert!(!stored.contains("newlocations"));
}

#[test]
fn parents_and_extras_are_stored() {
    let mut report = Report::with_step("cmsRun1");
    let file = complete("/store/a.root")
        .with_parent("/store/parent.root")
        .with_extra("checksum", "adler32:1234")
        .with_extra("merged", false);
    let stored = report.add_output_file("AODSIM", &file).unwrap();

    assert_eq!(stored.list("parents"), Some(&[Scalar::from("/store/parent.root")][..]));
    assert_eq!(stored.string("checksum"), Some("adler32:1234"));
    assert_eq!(stored.get("merged"), Some(&Node::from(false)));
}

#[test]
fn recreating_module_resets_files_but_keeps_one_listing() {
    let mut report = Report::with_step("cmsRun1");
    report.add_output_file("AODSIM", &complete("/store/a.root"));
    report.add_output_module("AODSIM");

    let step = report.retrieve_step("cmsRun1").unwrap();
    assert_eq!(step.list("outputModules"), Some(&[Scalar::from("AODSIM")][..]));
    let module = report.get_output_module("cmsRun1", "AODSIM").unwrap();
    assert_eq!(module.section("files").unwrap().int("fileCount"), Some(0));
    assert!(module.section("dataset").unwrap().is_empty());
}

#[test]
fn reserved_names_never_reach_the_document() {
    let mut report = Report::with_step("cmsRun1");
    assert!(report.add_output_module("sections_").is_none());
    assert!(report.add_output_file("section_name_", &complete("/store/a.root")).is_none());

    let mut file = complete("/store/b.root").with_extra("section_name_", "z");
    file.dataset.insert("sections_".into(), Scalar::from("z"));
    file.dataset.insert("dataTier".into(), Scalar::from("AODSIM"));
    assert!(report.add_output_file("AODSIM", &file).is_some());

    let step = report.retrieve_step("cmsRun1").unwrap();
    assert_eq!(step.list("outputModules"), Some(&[Scalar::from("AODSIM")][..]));
    let dir = tempfile::tempdir().unwrap();
    report.persist(&dir.path().join("report.json")).unwrap();
}

#[test]
fn oversized_values_are_refused() {
    let mut report = Report::with_step("cmsRun1");
    assert!(report.add_output_file("AODSIM", &FileRecord::new("/store/a.root", u64::MAX, 10)).is_none());
    let lumi = FileRecord::new("/store/b.root", 100, 10).with_run(Run::new(1, [u64::MAX]));
    assert!(report.add_output_file("AODSIM", &lumi).is_none());
    assert!(report.get_output_module("cmsRun1", "AODSIM").is_none());
}

#[test]
fn record_fields_do_not_come_back_as_extras() {
    let mut report = Report::with_step("cmsRun1");
    let file = complete("/store/a.root")
        .with_extra("dataset", "shadow")
        .with_extra("ModuleLabel", "shadow")
        .with_extra("guid", "abc");
    report.add_output_file("AODSIM", &file);

    let back = report.get_output_file("file0", "AODSIM", "cmsRun1").unwrap();
    assert_eq!(back.extra.keys().collect::<Vec<_>>(), vec!["guid"]);
    let json = serde_json::to_value(&back).unwrap();
    assert_eq!(json["module_label"], serde_json::json!("AODSIM"));
    assert!(json["dataset"].is_object());
}
