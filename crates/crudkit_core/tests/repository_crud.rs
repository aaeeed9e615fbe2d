mod common;

use common::{device_repo, memory_factory, people_repo, Device, Person};
use crudkit_core::{DataError, Repository};
use uuid::Uuid;

#[test]
fn alice_lifecycle_save_update_delete() {
    let factory = memory_factory();
    let repo = people_repo(&factory);

    let saved = repo.save(&Person::new("Alice")).unwrap();
    assert_eq!(saved.id, Some(1));
    assert_eq!(saved.name, "Alice");

    let mut renamed = saved.clone();
    renamed.name = "Alice2".to_string();
    let updated = repo.update(&renamed).unwrap();
    assert_eq!(updated.id, Some(1));
    assert_eq!(updated.name, "Alice2");
    assert_eq!(repo.find(1).unwrap().name, "Alice2");

    repo.delete(&updated).unwrap();
    assert!(repo.find(1).unwrap_err().is_not_found());
}

#[test]
fn save_then_find_returns_generated_id_and_defaults() {
    let factory = memory_factory();
    let repo = people_repo(&factory);

    let saved = repo
        .save(&Person::new("Alice").with_status("active").with_age(30))
        .unwrap();
    let id = saved.id.unwrap();
    assert!(id > 0);
    assert_eq!(saved.created_at.as_deref(), Some("seeded"));

    let loaded = repo.find(id).unwrap();
    assert_eq!(loaded, saved);
    assert_eq!(loaded.name, "Alice");
    assert_eq!(loaded.status.as_deref(), Some("active"));
    assert_eq!(loaded.age, Some(30));
}

#[test]
fn save_keeps_caller_supplied_id() {
    let factory = memory_factory();
    let repo = people_repo(&factory);

    let mut person = Person::new("Bob");
    person.id = Some(42);
    let saved = repo.save(&person).unwrap();
    assert_eq!(saved.id, Some(42));
    assert_eq!(repo.find(42).unwrap().name, "Bob");
}

#[test]
fn find_all_lists_every_row() {
    let factory = memory_factory();
    let repo = people_repo(&factory);
    assert!(repo.find_all().unwrap().is_empty());

    repo.save(&Person::new("Alice")).unwrap();
    repo.save(&Person::new("Bob")).unwrap();

    let everyone = repo.find_all().unwrap();
    assert_eq!(common::names(&everyone), vec!["Alice", "Bob"]);
}

#[test]
fn update_returns_reloaded_state() {
    let factory = memory_factory();
    let repo = people_repo(&factory);

    let mut alice = repo.save(&Person::new("Alice").with_status("active")).unwrap();
    alice.status = Some("inactive".to_string());
    alice.nickname = Some("Al".to_string());

    let updated = repo.update(&alice).unwrap();
    assert_eq!(updated.status.as_deref(), Some("inactive"));
    assert_eq!(updated.nickname.as_deref(), Some("Al"));
    assert_eq!(updated.created_at.as_deref(), Some("seeded"));
    assert_eq!(repo.find(alice.id.unwrap()).unwrap(), updated);
}

#[test]
fn find_missing_id_is_not_found() {
    let factory = memory_factory();
    let repo = people_repo(&factory);

    let err = repo.find(999).unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err}");
    assert!(err.store_cause().is_none());
}

#[test]
fn delete_removes_row_and_second_delete_is_not_found() {
    let factory = memory_factory();
    let repo = people_repo(&factory);

    let alice = repo.save(&Person::new("Alice")).unwrap();
    repo.delete(&alice).unwrap();
    assert!(repo.find(alice.id.unwrap()).unwrap_err().is_not_found());

    let err = repo.delete(&alice).unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err}");
}

#[test]
fn update_of_missing_row_is_not_found_and_creates_nothing() {
    let factory = memory_factory();
    let repo = people_repo(&factory);

    let mut ghost = Person::new("Ghost");
    ghost.id = Some(77);
    assert!(repo.update(&ghost).unwrap_err().is_not_found());
    assert!(repo.find_all().unwrap().is_empty());
}

#[test]
fn update_and_delete_require_an_identifier() {
    let factory = memory_factory();
    let repo = people_repo(&factory);
    let unsaved = Person::new("Nobody");

    assert!(matches!(
        repo.update(&unsaved),
        Err(DataError::MissingIdentifier { .. })
    ));
    assert!(matches!(
        repo.delete(&unsaved),
        Err(DataError::MissingIdentifier { .. })
    ));
}

#[test]
fn constraint_violation_surfaces_as_transaction_failure_and_rolls_back() {
    let factory = memory_factory();
    let repo = people_repo(&factory);

    repo.save(&Person::new("Alice").with_email("a@example.com"))
        .unwrap();
    let err = repo
        .save(&Person::new("Impostor").with_email("a@example.com"))
        .unwrap_err();

    assert!(matches!(err, DataError::Transaction(_)));
    assert!(err.is_constraint_violation());
    assert_eq!(common::names(&repo.find_all().unwrap()), vec!["Alice"]);
}

#[test]
fn uuid_keyed_entities_roundtrip() {
    let factory = memory_factory();
    let repo = device_repo(&factory);

    let device = Device {
        id: Uuid::new_v4(),
        label: "sensor".to_string(),
    };
    let saved = repo.save(&device).unwrap();
    assert_eq!(saved, device);

    let renamed = repo
        .update(&Device {
            id: device.id,
            label: "gateway".to_string(),
        })
        .unwrap();
    assert_eq!(renamed.label, "gateway");
    assert_eq!(repo.find(device.id).unwrap(), renamed);

    repo.delete(&renamed).unwrap();
    assert!(repo.find(device.id).unwrap_err().is_not_found());
}

#[test]
fn released_contexts_do_not_leak_between_calls() {
    let factory = memory_factory();
    let repo = people_repo(&factory);
    let before = factory.acquired_count();

    repo.save(&Person::new("Alice")).unwrap();
    let _ = repo.find(12345);
    repo.find_all().unwrap();

    assert_eq!(factory.acquired_count(), before + 3);
}
