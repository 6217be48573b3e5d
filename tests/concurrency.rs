mod support;

use std::sync::{Arc, Barrier};
use std::thread;

use schedule_store::{
    Context, InMemoryScheduleStore, NewSchedule, ScheduleService, ScheduleStore, StoreError,
};
use support::temp_store;

const WRITERS: usize = 8;

/// All writers read the same token, then race to write. Exactly one wins.
fn race_on_same_token<S: ScheduleStore + Clone + 'static>(store: S) {
    let ctx = Context::background();
    let original = store.insert(&ctx, &NewSchedule::new("Algorithms", "Konaev Hall", 3)).unwrap();
    let barrier = Arc::new(Barrier::new(WRITERS));

    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let store = store.clone();
            let barrier = barrier.clone();
            let mut mine = original.clone();
            thread::spawn(move || {
                mine.cabinet = format!("room-{}", i);
                barrier.wait();
                store.update(&Context::background(), &mine)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(StoreError::EditConflict)))
        .count();

    assert_eq!(winners.len(), 1);
    assert_eq!(conflicts, WRITERS - 1);
    assert_eq!(&store.get(&ctx, original.id).unwrap(), winners[0]);
}

#[test]
fn sqlite_single_winner() {
    let (_dir, store) = temp_store();
    race_on_same_token(store);
}

#[test]
fn in_memory_single_winner() {
    race_on_same_token(InMemoryScheduleStore::new());
}

#[test]
fn retries_apply_every_writer() {
    let (_dir, store) = temp_store();
    let ctx = Context::background();
    let id = store.insert(&ctx, &NewSchedule::new("Web Development", "", 4)).unwrap().id;
    let service = Arc::new(ScheduleService::new(store));

    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let service = service.clone();
            thread::spawn(move || {
                service.update_with_retry(&Context::background(), id, 100, |s| {
                    s.cabinet.push(char::from(b'a' + i as u8));
                })
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let mut cabinet: Vec<char> = service.show(&ctx, id).unwrap().cabinet.chars().collect();
    cabinet.sort_unstable();
    let expected: Vec<char> = (0..WRITERS).map(|i| char::from(b'a' + i as u8)).collect();
    assert_eq!(cabinet, expected);
}
