use port_for::error::Error;
use port_for::store::{AssociationStore, FileStore};
use port_for::networking::SocketProbe;
use port_for::{PortContext, PortRequest, PortSelector, SelectionRequest};
use std::fs;
use tempfile::TempDir;

#[test_log::test]
fn test_hand_written_store_is_honored() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("port-for.conf");
    fs::write(&path, "[DEFAULT]\n# pinned by hand\nfoo = 37987\n").unwrap();

    let store = FileStore::new(&path);
    let context = PortContext::detect().unwrap();
    let probe = SocketProbe::default();
    let selector = PortSelector::new(&context, &probe).with_store(&store);

    let port = selector
        .select(&SelectionRequest::named("foo", PortRequest::Any))
        .unwrap();

    assert_eq!(port, Some(37987));
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test_log::test]
fn test_named_selections_get_distinct_ports() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path().join("port-for.conf"));
    let context = PortContext::detect().unwrap();
    let probe = SocketProbe::default();
    let selector = PortSelector::new(&context, &probe).with_store(&store);

    let mut ports = Vec::new();
    for name in ["alpha", "beta", "gamma"] {
        let port = selector
            .select(&SelectionRequest::named(name, PortRequest::Any))
            .unwrap()
            .unwrap();
        assert!(port >= 1024);
        assert!(!context.is_excluded(port));
        ports.push(port);
    }

    ports.sort_unstable();
    ports.dedup();
    assert_eq!(ports.len(), 3);

    let listed: Vec<u16> = store.list().unwrap().iter().map(|a| a.port).collect();
    assert_eq!(listed.len(), 3);
}

#[test_log::test]
fn test_corrupt_store_is_reported_with_line() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("port-for.conf");
    fs::write(&path, "foo = 40001\nbar = 70000\n").unwrap();

    let store = FileStore::new(&path);

    match store.lookup("foo") {
        Err(Error::StoreCorruption { line, .. }) => assert_eq!(line, 2),
        other => panic!("Expected corruption error, got {:?}", other),
    }
}
