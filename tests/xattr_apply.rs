//! Applies edit plans through the real ACL xattrs. Filesystems without ACL
//! support, or runs without the privilege to write them, skip the checks.

use std::fs::File;

use acltree::acl::{AclError, PosixAce, PosixPerm, PosixTag};
use acltree::{Acl, ApplyError, ApplyOptions, EditPlan, apply_recursive, get_acl};
use test_support::TestTree;

fn unsupported(error: &ApplyError) -> bool {
    matches!(
        error,
        ApplyError::Acl(AclError::Unsupported | AclError::Io(_)) | ApplyError::Mount { .. }
    )
}

fn posix_filesystem(tree: &TestTree) -> bool {
    let file = File::open(tree.root()).expect("open root");
    matches!(get_acl(&file), Ok(Acl::Posix(_)))
}

#[test]
fn named_user_entry_reaches_every_file() {
    let tree = TestTree::sample();
    if !posix_filesystem(&tree) {
        return;
    }
    let plan = EditPlan::new().modify_posix([PosixAce::named(
        PosixTag::User,
        PosixPerm::from_mode_bits(0o4),
        4242,
    )]);

    let summary = match apply_recursive(tree.root(), &plan, ApplyOptions::new().recursive(true)) {
        Ok(summary) => summary,
        Err(error) if unsupported(&error) => return,
        Err(error) => panic!("apply failed: {error}"),
    };
    assert!(summary.is_success(), "{:?}", summary.errors);
    assert_eq!(summary.visited, 7);

    let file = File::open(tree.path("a/nested/deep.txt")).expect("open");
    let acl = get_acl(&file).expect("read back");
    let acl = acl.as_posix().expect("posix");
    assert!(
        acl.access()
            .iter()
            .any(|ace| ace.tag == PosixTag::User && ace.id == 4242)
    );
    assert!(acl.access().iter().any(|ace| ace.tag == PosixTag::Mask));
}

#[test]
fn strip_returns_a_file_to_its_mode() {
    let tree = TestTree::sample();
    if !posix_filesystem(&tree) {
        return;
    }
    let path = tree.path("c.txt");
    let add = EditPlan::new().modify_posix([PosixAce::named(
        PosixTag::Group,
        PosixPerm::from_mode_bits(0o6),
        4243,
    )]);
    match apply_recursive(&path, &add, ApplyOptions::new()) {
        Ok(_) => {}
        Err(error) if unsupported(&error) => return,
        Err(error) => panic!("apply failed: {error}"),
    }

    apply_recursive(&path, &EditPlan::new().strip(), ApplyOptions::new()).expect("strip");
    let acl = get_acl(File::open(&path).expect("open")).expect("read back");
    let acl = acl.as_posix().expect("posix");
    assert!(acl.iter().all(|ace| ace.id != 4243));
    assert!(acl.iter().all(|ace| ace.tag != PosixTag::Mask));
}
