// End-to-end brain behaviour against a file-backed jar
use std::sync::Arc;
use std::thread;

use ideajar_lib::brain::{Brain, MemorySignalStore, SignalStore, SqliteSignalStore};
use ideajar_lib::state::{init_db, NewCategory, NewNote};
use ideajar_lib::{AppConfig, IdeaRepository};
use tempfile::tempdir;

#[test]
fn concurrent_training_counts_every_call() {
    const CALLS: usize = 200;

    let dir = tempdir().unwrap();
    let db = init_db(&dir.path().join("jar.db")).unwrap();
    let store = Arc::new(SqliteSignalStore::new(db));
    let brain = Brain::new(store.clone());

    thread::scope(|scope| {
        for _ in 0..8 {
            let brain = brain.clone();
            scope.spawn(move || {
                for _ in 0..CALLS / 8 {
                    brain.train("deadline", 6).unwrap();
                }
            });
        }
    });

    assert_eq!(store.get("deadline").unwrap().get(6), CALLS as u64);
}

#[test]
fn training_through_separate_connections_counts_every_call() {
    const HANDLES: usize = 4;
    const PER_HANDLE: usize = 100;

    let dir = tempdir().unwrap();
    let path = dir.path().join("jar.db");

    thread::scope(|scope| {
        for _ in 0..HANDLES {
            let path = &path;
            scope.spawn(move || {
                // Each handle owns its own connection, like separate CLI processes
                let brain = Brain::new(Arc::new(SqliteSignalStore::new(init_db(path).unwrap())));
                for _ in 0..PER_HANDLE {
                    brain.train("deadline", 6).unwrap();
                }
            });
        }
    });

    let store = SqliteSignalStore::new(init_db(&path).unwrap());
    assert_eq!(store.get("deadline").unwrap().get(6), (HANDLES * PER_HANDLE) as u64);
}

#[test]
fn concurrent_predictions_and_training_agree() {
    let brain = Brain::new(Arc::new(MemorySignalStore::new()));
    brain.train("invoice payment", 1).unwrap();

    thread::scope(|scope| {
        for i in 0..4 {
            let brain = brain.clone();
            scope.spawn(move || {
                for _ in 0..50 {
                    if i % 2 == 0 {
                        brain.train("invoice payment", 1).unwrap();
                    } else {
                        assert_eq!(brain.predict("payment overdue"), Some(1));
                    }
                }
            });
        }
    });

    let signals = brain.signals().unwrap();
    assert!(signals.iter().all(|s| s.category_counts.get(1) == 101));
}

#[test]
fn brain_survives_reopening_the_jar() {
    let dir = tempdir().unwrap();
    let config = AppConfig::load(dir.path()).unwrap();

    let recipes = {
        let repo = IdeaRepository::open(&config).unwrap();
        let recipes = repo
            .create_category(NewCategory {
                name: "Recipes".to_string(),
                color_hex: 0xFFFFAA00,
                x_pos: 0.2,
                y_pos: 0.4,
            })
            .unwrap();
        repo.insert_note(NewNote {
            title: "Pancakes".to_string(),
            content: "flour butter syrup".to_string(),
            category_id: Some(recipes.id),
            deadline: None,
        })
        .unwrap();
        recipes
    };

    let reopened = IdeaRepository::open(&config).unwrap();
    assert_eq!(reopened.suggest_category("", "maple syrup"), Some(recipes.id));
    assert_eq!(reopened.brain().word_count().unwrap(), 4);
}

#[test]
fn tie_break_is_stable_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("jar.db");

    {
        let brain = Brain::new(Arc::new(SqliteSignalStore::new(init_db(&path).unwrap())));
        brain.train("write report today", 2).unwrap();
        brain.train("buy groceries today", 1).unwrap();
    }

    for _ in 0..3 {
        let brain = Brain::new(Arc::new(SqliteSignalStore::new(init_db(&path).unwrap())));
        assert_eq!(brain.predict("today"), Some(1));
    }
}
