//! License store tests

mod common;
use common::*;

use checkoutkeys::error::AppError;

#[test]
fn test_create_and_get_license() {
    let conn = setup_test_db();

    let id = queries::create_license(&conn, &new_license("CK-0001", Some("a@example.com"), 1_000)).unwrap();
    assert!(id > 0);

    let license = queries::get_license_by_key(&conn, "CK-0001").unwrap().unwrap();
    assert_eq!(license.id, id);
    assert_eq!(license.customer_email.as_deref(), Some("a@example.com"));
    assert_eq!(license.status, LicenseStatus::Active);
    assert_eq!(license.activation_count, 0);
    assert_eq!(license.max_activations, 1);
    assert_eq!(license.activated_domains, "");
    assert_eq!(license.created_at, Some(1_000));
    assert_eq!(license.email_sent_at, None);
}

#[test]
fn test_get_unknown_license_is_none() {
    let conn = setup_test_db();
    assert!(queries::get_license_by_key(&conn, "CK-MISSING").unwrap().is_none());
}

#[test]
fn test_duplicate_key_is_conflict() {
    let conn = setup_test_db();
    queries::create_license(&conn, &new_license("CK-DUP", Some("first@example.com"), 1_000)).unwrap();

    let result = queries::create_license(&conn, &new_license("CK-DUP", Some("second@example.com"), 2_000));
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let license = queries::get_license_by_key(&conn, "CK-DUP").unwrap().unwrap();
    assert_eq!(license.customer_email.as_deref(), Some("first@example.com"));
    assert_eq!(license_count(&conn), 1);
}

#[test]
fn test_zero_seat_limit_rejected_by_store() {
    let conn = setup_test_db();
    let mut input = new_license("CK-ZERO", None, 1_000);
    input.max_activations = 0;
    assert!(matches!(
        queries::create_license(&conn, &input),
        Err(AppError::Database(_))
    ));
}

#[test]
fn test_update_only_touches_given_fields() {
    let conn = setup_test_db();
    let mut input = new_license("CK-UPD", Some("a@example.com"), 1_000);
    input.activation_count = 2;
    input.activated_domains = "example.com,example.org".into();
    queries::create_license(&conn, &input).unwrap();

    let found = queries::update_license(
        &conn,
        "CK-UPD",
        &UpdateLicense {
            max_activations: Some(5),
            ..Default::default()
        },
    )
    .unwrap();
    assert!(found);

    let license = queries::get_license_by_key(&conn, "CK-UPD").unwrap().unwrap();
    assert_eq!(license.max_activations, 5);
    assert_eq!(license.customer_email.as_deref(), Some("a@example.com"));
    assert_eq!(license.activation_count, 2);
    assert_eq!(license.activated_domains, "example.com,example.org");
    assert_eq!(license.created_at, Some(1_000));
    assert!(license.updated_at.unwrap() > 1_000);
}

#[test]
fn test_update_can_null_nullable_columns() {
    let conn = setup_test_db();
    let mut input = new_license("CK-NULL", Some("a@example.com"), 1_000);
    input.email_sent_at = Some(1_500);
    queries::create_license(&conn, &input).unwrap();

    queries::update_license(
        &conn,
        "CK-NULL",
        &UpdateLicense {
            customer_email: Some(None),
            email_sent_at: Some(None),
            ..Default::default()
        },
    )
    .unwrap();

    let license = queries::get_license_by_key(&conn, "CK-NULL").unwrap().unwrap();
    assert_eq!(license.customer_email, None);
    assert_eq!(license.email_sent_at, None);
}

#[test]
fn test_update_at_stamps_given_time_and_keeps_creation_time() {
    let conn = setup_test_db();
    queries::create_license(&conn, &new_license("CK-CLOCK", None, 1_000)).unwrap();

    let found = queries::update_license_at(
        &conn,
        "CK-CLOCK",
        &UpdateLicense::status(LicenseStatus::Inactive),
        5_000,
    )
    .unwrap();
    assert!(found);

    let license = queries::get_license_by_key(&conn, "CK-CLOCK").unwrap().unwrap();
    assert_eq!(license.status, LicenseStatus::Inactive);
    assert_eq!(license.created_at, Some(1_000));
    assert_eq!(license.updated_at, Some(5_000));
}

#[test]
fn test_update_unknown_key_returns_false() {
    let conn = setup_test_db();
    let found = queries::update_license(
        &conn,
        "CK-GHOST",
        &UpdateLicense::status(LicenseStatus::Inactive),
    )
    .unwrap();
    assert!(!found);
    assert_eq!(license_count(&conn), 0);
}

#[test]
fn test_status_update() {
    let conn = setup_test_db();
    create_test_license(&conn, "CK-STATUS", None, LicenseStatus::Active);

    queries::update_license(&conn, "CK-STATUS", &UpdateLicense::status(LicenseStatus::Inactive)).unwrap();

    let license = queries::get_license_by_key(&conn, "CK-STATUS").unwrap().unwrap();
    assert_eq!(license.status, LicenseStatus::Inactive);
}

#[test]
fn test_list_newest_first_with_pagination() {
    let conn = setup_test_db();
    for i in 0..5 {
        queries::create_license(&conn, &new_license(&format!("CK-{}", i), None, 1_000 + i)).unwrap();
    }

    let first = queries::list_licenses_paginated(&conn, 2, 0).unwrap();
    let keys: Vec<_> = first.iter().map(|l| l.license_key.as_str()).collect();
    assert_eq!(keys, vec!["CK-4", "CK-3"]);

    let last = queries::list_licenses_paginated(&conn, 2, 4).unwrap();
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].license_key, "CK-0");

    assert!(queries::list_licenses_paginated(&conn, 2, 10).unwrap().is_empty());
}

#[test]
fn test_missing_created_at_sorts_last() {
    let conn = setup_test_db();
    let mut undated = new_license("CK-UNDATED", None, 0);
    undated.created_at = None;
    queries::create_license(&conn, &undated).unwrap();
    queries::create_license(&conn, &new_license("CK-DATED", None, 1_000)).unwrap();

    let all = queries::list_licenses_paginated(&conn, 20, 0).unwrap();
    assert_eq!(all[0].license_key, "CK-DATED");
    assert_eq!(all[1].license_key, "CK-UNDATED");
}

#[test]
fn test_licenses_by_email() {
    let conn = setup_test_db();
    queries::create_license(&conn, &new_license("CK-A1", Some("a@example.com"), 1_000)).unwrap();
    queries::create_license(&conn, &new_license("CK-A2", Some("a@example.com"), 2_000)).unwrap();
    queries::create_license(&conn, &new_license("CK-B1", Some("b@example.com"), 3_000)).unwrap();
    queries::create_license(&conn, &new_license("CK-N1", None, 4_000)).unwrap();

    let licenses = queries::get_licenses_by_email(&conn, "a@example.com").unwrap();
    let keys: Vec<_> = licenses.iter().map(|l| l.license_key.as_str()).collect();
    assert_eq!(keys, vec!["CK-A2", "CK-A1"]);

    assert!(queries::get_licenses_by_email(&conn, "nobody@example.com").unwrap().is_empty());
}

#[test]
fn test_counts() {
    let conn = setup_test_db();
    queries::create_license(&conn, &new_license("CK-OLD", None, 1_000)).unwrap();
    create_test_license(&conn, "CK-NEW-1", None, LicenseStatus::Active);
    create_test_license(&conn, "CK-NEW-2", None, LicenseStatus::Inactive);

    assert_eq!(queries::count_licenses(&conn).unwrap(), 3);
    assert_eq!(queries::count_licenses_by_status(&conn, LicenseStatus::Active).unwrap(), 2);
    assert_eq!(queries::count_licenses_by_status(&conn, LicenseStatus::Inactive).unwrap(), 1);
    assert_eq!(queries::count_licenses_created_since(&conn, 2_000).unwrap(), 2);
}
