use rstest::rstest;
use shade_hardware::FileStore;
use shade_traits::Storage;

#[rstest]
fn values_survive_a_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.kv");

    let mut store = FileStore::open(&path).expect("open");
    store.put_int("position", 12_345).expect("put");
    store.put_int("max_position", 48_000).expect("put");
    drop(store);

    let mut store = FileStore::open(&path).expect("reopen");
    assert_eq!(store.get_int("position", 0).expect("get"), 12_345);
    assert_eq!(store.get_int("max_position", 0).expect("get"), 48_000);
}

#[rstest]
fn missing_key_yields_the_default() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = FileStore::open(dir.path().join("state.kv")).expect("open");
    assert_eq!(store.get_int("position", 7).expect("get"), 7);
}

#[rstest]
fn rewrites_keep_a_single_entry_per_key() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.kv");

    let mut store = FileStore::open(&path).expect("open");
    for v in [1, 2, 3] {
        store.put_int("position", v).expect("put");
    }
    drop(store);

    let text = std::fs::read_to_string(&path).expect("read");
    assert_eq!(text.trim(), "position=3");
}

#[rstest]
fn malformed_file_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.kv");
    std::fs::write(&path, "position=not-a-number\n").expect("write");

    let err = FileStore::open(&path).expect_err("must reject");
    assert!(format!("{err}").contains("malformed"));
}
