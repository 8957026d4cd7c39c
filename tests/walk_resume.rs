//! End-to-end checks of walking, checkpointing and resuming through the
//! `acltree` facade.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use acltree::{DirStack, WalkBuilder, tree_stats};
use test_support::TestTree;

fn walk_paths(builder: WalkBuilder) -> Vec<PathBuf> {
    builder
        .build()
        .expect("walker")
        .map(|entry| entry.expect("entry").full_path())
        .collect()
}

#[test]
fn checkpoint_snapshot_resumes_the_remaining_entries() {
    let tree = TestTree::sample();
    let full = walk_paths(WalkBuilder::new(tree.root()));
    assert_eq!(full.len(), 6);

    let saved: Arc<Mutex<Option<DirStack>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&saved);
    let mut walker = WalkBuilder::new(tree.root())
        .reporting(3, move |stack, stats| {
            if stats.count == 3 {
                *sink.lock().expect("lock") = Some(stack.clone());
            }
            Ok(())
        })
        .build()
        .expect("walker");
    for _ in 0..3 {
        walker.next().expect("item").expect("entry");
    }
    drop(walker);

    let snapshot = saved.lock().expect("lock").take().expect("checkpoint fired");
    let rest = walk_paths(WalkBuilder::new(tree.root()).restore(snapshot));
    assert_eq!(rest, full[3..]);
}

#[cfg(feature = "serde")]
#[test]
fn snapshot_survives_a_json_round_trip() {
    let tree = TestTree::sample();
    let mut walker = WalkBuilder::new(tree.root()).build().expect("walker");
    for _ in 0..2 {
        walker.next().expect("item").expect("entry");
    }
    let json = serde_json::to_string(&walker.dir_stack()).expect("serialize");
    drop(walker);

    let snapshot: DirStack = serde_json::from_str(&json).expect("deserialize");
    let rest = walk_paths(WalkBuilder::new(tree.root()).restore(snapshot));
    assert_eq!(rest.first(), Some(&tree.path("a/nested")));
    assert_eq!(rest.len(), 4);
}

#[test]
fn tree_stats_matches_a_plain_walk() {
    let tree = TestTree::sample();
    tree.file("b/extra.bin", &[0_u8; 100]);
    let stats = tree_stats(tree.root()).expect("stats");
    assert_eq!(stats.count, 7);
    assert_eq!(stats.bytes, 112);
}
