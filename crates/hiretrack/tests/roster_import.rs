use hiretrack::workflows::onboarding::{CallCenter, LicenseStatus, RosterImporter};

#[test]
fn importer_reads_the_phoenix_roster() {
    let data = include_bytes!("fixtures/phoenix_roster.csv");

    let import = RosterImporter::from_reader(&data[..]).expect("roster imports");

    let names: Vec<_> = import
        .intakes
        .iter()
        .map(|intake| intake.last_name.as_str())
        .collect();
    assert_eq!(names, vec!["Reyes", "Bell", "Nair", "Haddad"]);
    assert_eq!(import.intakes[2].call_center, CallCenter::Tampa);
    assert_eq!(import.intakes[3].license_status, LicenseStatus::Licensed);
    assert_eq!(import.intakes[1].phone, None);

    let rejected: Vec<_> = import.rejected.iter().map(|rejection| rejection.row).collect();
    assert_eq!(rejected, vec![4, 5]);
    assert!(import.rejected[1].reason.contains("Pending"));
}

#[test]
fn importer_reports_missing_files() {
    let error = RosterImporter::from_path("fixtures/does-not-exist.csv")
        .expect_err("missing roster fails");

    assert!(error.to_string().starts_with("failed to read roster"));
}
