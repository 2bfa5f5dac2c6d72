use job_report::Report;

#[test]
fn duplicate_step_is_ignored() {
    let mut report = Report::with_step("cmsRun1");
    report.add_error(1, "A", "x");
    report.create_section("cmsRun1");

    assert_eq!(report.step_names(), vec!["cmsRun1"]);
    assert_eq!(report.step_status("cmsRun1"), Some(1));
}

#[test]
fn steps_keep_execution_order() {
    let mut report = Report::new();
    assert_eq!(report.active_step(), None);
    report.create_section("cmsRun1");
    report.create_section("stageOut1");
    report.create_section("logArch1");
    assert_eq!(report.step_names(), vec!["cmsRun1", "stageOut1", "logArch1"]);
    assert_eq!(report.active_step(), Some("logArch1"));
}

#[test]
fn operations_without_a_step_do_nothing() {
    let mut report = Report::new();
    assert!(report.add_output_module("AODSIM").is_none());
    assert!(report.add_error(1, "A", "x").is_none());
    assert!(report.add_skipped_file("/store/a.root", "file:a.root").is_none());
    assert_eq!(report.data().keys().collect::<Vec<_>>(), vec!["steps"]);
}

#[test]
fn analysis_files_are_numbered() {
    let mut report = Report::with_step("cmsRun1");
    report.add_analysis_file("histos.root", [("Source", "TFileService")]);
    report.add_analysis_file("tree.root", Vec::<(String, String)>::new());

    let analysis = report.retrieve_step("cmsRun1").unwrap().section("analysis").unwrap();
    assert_eq!(analysis.int("fileCount"), Some(2));
    let first = analysis.section("file0").unwrap();
    assert_eq!(first.string("fileName"), Some("histos.root"));
    assert_eq!(first.string("Source"), Some("TFileService"));
    assert_eq!(analysis.section("file1").unwrap().string("fileName"), Some("tree.root"));
}
