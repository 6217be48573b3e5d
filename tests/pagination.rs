mod support;

use proptest::prelude::*;
use schedule_store::{
    Context, Filters, InMemoryScheduleStore, NewSchedule, ScheduleFilter, ScheduleStore,
    SortSafelist, SqliteScheduleStore,
};
use support::{insert_all, memory_store, page};

const DISCIPLINES: [&str; 5] = ["Calculus", "calculus", "OOP", "Golang", "Statistics"];
const SORTS: [&str; 6] = ["id", "-id", "discipline", "-discipline", "time_period", "-time_period"];

fn rows() -> impl Strategy<Value = Vec<(&'static str, i64)>> {
    prop::collection::vec((prop::sample::select(DISCIPLINES.to_vec()), 1i64..=6), 0..40)
}

fn filter() -> impl Strategy<Value = ScheduleFilter> {
    (
        prop::option::of(prop::sample::select(DISCIPLINES.to_vec())),
        0i64..=6,
        0i64..=6,
    )
        .prop_map(|(discipline, from, to)| ScheduleFilter {
            discipline: discipline.unwrap_or("").to_string(),
            time_period_from: from,
            time_period_to: to,
        })
}

/// Every id on every page, walking one page past the end.
fn walk<S: ScheduleStore>(
    store: &S,
    filter: &ScheduleFilter,
    size: i64,
    sort: &str,
) -> (Vec<i64>, Vec<u64>) {
    let ctx = Context::background();
    let mut ids = Vec::new();
    let mut totals = Vec::new();
    let mut number = 1;
    loop {
        let result = store.list(&ctx, filter, &page(number, size, sort)).unwrap();
        assert!(result.records.len() <= size as usize);
        totals.push(result.metadata.total_records);
        let done = result.records.is_empty();
        ids.extend(result.records.iter().map(|s| s.id));
        if done {
            break;
        }
        number += 1;
    }
    (ids, totals)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn pages_partition_the_result(
        rows in rows(),
        filter in filter(),
        size in 1i64..=10,
        sort in prop::sample::select(SORTS.to_vec()),
    ) {
        let store: SqliteScheduleStore = memory_store();
        insert_all(&store, &rows);

        let (ids, totals) = walk(&store, &filter, size, sort);

        // total is the same on every page, including the empty one past the end
        prop_assert!(totals.windows(2).all(|w| w[0] == w[1]));
        prop_assert_eq!(totals[0], ids.len() as u64);

        let mut unique = ids.clone();
        unique.sort_unstable();
        unique.dedup();
        prop_assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn backends_agree(
        rows in rows(),
        filter in filter(),
        size in 1i64..=10,
        sort in prop::sample::select(SORTS.to_vec()),
    ) {
        let sqlite = memory_store();
        let memory = InMemoryScheduleStore::new();
        insert_all(&sqlite, &rows);
        insert_all(&memory, &rows);

        prop_assert_eq!(walk(&sqlite, &filter, size, sort), walk(&memory, &filter, size, sort));
    }
}

#[test]
fn ties_are_ordered_by_id() {
    let store = memory_store();
    insert_all(&store, &[("B", 2), ("A", 2), ("C", 1), ("D", 2)]);
    let ctx = Context::background();

    let result = store
        .list(&ctx, &ScheduleFilter::default(), &page(1, 10, "-time_period"))
        .unwrap();
    let ids: Vec<_> = result.records.iter().map(|s| s.id).collect();
    assert_eq!(ids, [1, 2, 4, 3]);
}

#[test]
fn empty_result_metadata() {
    let store = memory_store();
    let ctx = Context::background();

    let result = store
        .list(&ctx, &ScheduleFilter::default(), &page(4, 20, "id"))
        .unwrap();
    assert!(result.records.is_empty());
    assert_eq!(result.metadata.total_records, 0);
    assert_eq!(result.metadata.last_page, 0);
    assert_eq!(result.metadata.current_page, 4);
}

#[test]
fn time_period_range_is_inclusive() {
    let store = memory_store();
    insert_all(&store, &[("A", 1), ("B", 2), ("C", 3), ("D", 4), ("E", 5)]);
    let ctx = Context::background();

    let filter = ScheduleFilter {
        time_period_from: 2,
        time_period_to: 4,
        ..ScheduleFilter::default()
    };
    let result = store.list(&ctx, &filter, &page(1, 20, "id")).unwrap();
    let periods: Vec<_> = result.records.iter().map(|s| s.time_period).collect();
    assert_eq!(periods, [2, 3, 4]);
}

#[test]
fn backends_agree_on_a_wider_safelist() {
    let ctx = Context::background();
    let sqlite = memory_store();
    let memory = InMemoryScheduleStore::new();
    let rows = [("OOP", "269"), ("Spring", "444"), ("Golang", "383"), ("Statistics", "269")];
    for store in [&sqlite as &dyn ScheduleStore, &memory] {
        for (discipline, cabinet) in rows {
            store
                .insert(&ctx, &NewSchedule::new(discipline, cabinet, 3))
                .unwrap();
        }
    }

    for sort in ["cabinet", "-cabinet", "created_at", "-updated_at"] {
        let request = Filters {
            page: 1,
            page_size: 10,
            sort: sort.to_string(),
            sort_safelist: SortSafelist::new(["cabinet", "created_at", "updated_at"]),
        }
        .page_request()
        .unwrap();
        let ids = |store: &dyn ScheduleStore| -> Vec<i64> {
            store
                .list(&ctx, &ScheduleFilter::default(), &request)
                .unwrap()
                .records
                .iter()
                .map(|s| s.id)
                .collect()
        };
        assert_eq!(ids(&sqlite), ids(&memory), "sort {}", sort);
    }
    // single matching row still resolves the ordering on both backends
    let one = ScheduleFilter {
        discipline: "golang".into(),
        ..ScheduleFilter::default()
    };
    let request = Filters {
        page: 1,
        page_size: 10,
        sort: "-cabinet".into(),
        sort_safelist: SortSafelist::new(["cabinet"]),
    }
    .page_request()
    .unwrap();
    assert_eq!(sqlite.list(&ctx, &one, &request).unwrap().records.len(), 1);
    assert_eq!(memory.list(&ctx, &one, &request).unwrap().records.len(), 1);
}
