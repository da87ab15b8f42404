use trialguard_storage::{FileInstallRecord, StorageError};
use trialguard_trial::{InstallRecord, TrialError};

const APP_ID: &str = "com.example.notes";

#[test]
fn install_time_is_file_age() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("installed");
    let before = chrono::Utc::now().timestamp_millis();
    std::fs::write(&marker, b"").unwrap();

    let record = FileInstallRecord::new().with(APP_ID, &marker);
    let installed = record.first_install_time(APP_ID).unwrap();
    let now = chrono::Utc::now().timestamp_millis();
    // Filesystem timestamps may be coarser than the system clock
    assert!(installed.millis() >= before - 2_000);
    assert!(installed.millis() <= now);
}

#[test]
fn unregistered_app_is_not_found() {
    let record = FileInstallRecord::new();
    assert!(matches!(
        record.install_time(APP_ID),
        Err(StorageError::NotFound(_))
    ));
    assert!(matches!(
        record.first_install_time(APP_ID),
        Err(TrialError::InstallRecordNotFound(_))
    ));
}

#[test]
fn missing_marker_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let record = FileInstallRecord::new().with(APP_ID, dir.path().join("gone"));
    assert!(matches!(
        record.first_install_time(APP_ID),
        Err(TrialError::InstallRecordNotFound(_))
    ));
}
