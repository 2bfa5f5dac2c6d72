use job_report::Report;

#[test]
fn status_tracks_latest_error() {
    let mut report = Report::with_step("cmsRun1");
    report.add_error(1, "A", "x");
    report.add_error(2, "B", "y");

    assert_eq!(report.step_status("cmsRun1"), Some(2));
    let errors = report.retrieve_step("cmsRun1").unwrap().section("errors").unwrap();
    assert_eq!(errors.section("A").unwrap().int("errorCount"), Some(1));
    assert_eq!(errors.section("B").unwrap().int("errorCount"), Some(1));

    let entry = errors.section("B").unwrap().section("error0").unwrap();
    assert_eq!(entry.int("exitStatus"), Some(2));
    assert_eq!(entry.string("description"), Some("y"));
}

#[test]
fn lower_exit_code_still_overwrites_status() {
    let mut report = Report::with_step("cmsRun1");
    report.add_error(8001, "CMSException", "fatal");
    report.add_error(0, "Warning", "benign");
    assert_eq!(report.step_status("cmsRun1"), Some(0));
}

#[test]
fn errors_go_to_active_step() {
    let mut report = Report::with_step("cmsRun1");
    report.create_section("stageOut1");
    report.add_error(60311, "StageOutFailure", "no space");
    assert_eq!(report.step_status("cmsRun1"), Some(0));
    assert_eq!(report.step_status("stageOut1"), Some(60311));
}

#[test]
fn reserved_error_type_is_refused() {
    let mut report = Report::with_step("cmsRun1");
    assert!(report.add_error(1, "sections_", "x").is_none());
    assert!(report.add_error(1, "section_name_", "x").is_none());

    assert_eq!(report.step_status("cmsRun1"), Some(0));
    assert!(report.retrieve_step("cmsRun1").unwrap().section("errors").unwrap().is_empty());
    assert!(report.json().is_ok());
}
