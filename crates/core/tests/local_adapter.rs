use flystore_core::backend::local::PermissionStrategy;
use flystore_core::{
    Config, FilesystemAdapter, FilesystemAdapterExt, FilesystemError, LocalFilesystemAdapter,
    StorageAttributes, SymbolicLinkPolicy, Visibility,
};

#[test]
fn root_is_created_on_construction() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("a/b/root");

    LocalFilesystemAdapter::new(&root).unwrap();

    assert!(root.is_dir());
}

#[test]
fn root_that_cannot_be_created_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let err = LocalFilesystemAdapter::new(blocker.join("root")).unwrap_err();

    assert!(matches!(err, FilesystemError::UnableToCreateDirectory { .. }));
}

#[test]
fn listing_is_relative_to_the_root() {
    let dir = tempfile::tempdir().unwrap();
    let mut adapter = LocalFilesystemAdapter::new(dir.path()).unwrap();
    adapter
        .write_string("a/b/file.txt", "contents", &Config::new())
        .unwrap();

    let mut paths: Vec<_> = adapter
        .list_contents("a", true)
        .map(|entry| entry.unwrap().path().to_string())
        .collect();
    paths.sort();

    assert_eq!(paths, ["a/b", "a/b/file.txt"]);
}

#[test]
fn listed_files_carry_size() {
    let dir = tempfile::tempdir().unwrap();
    let mut adapter = LocalFilesystemAdapter::new(dir.path()).unwrap();
    adapter
        .write_string("file.txt", "contents", &Config::new())
        .unwrap();

    let entries: Vec<_> = adapter
        .list_contents("", false)
        .collect::<Result<_, _>>()
        .unwrap();

    match entries.as_slice() {
        [StorageAttributes::File(file)] => {
            assert_eq!(file.path, "file.txt");
            assert_eq!(file.file_size, Some(8));
            assert!(file.last_modified.is_some());
        }
        other => panic!("unexpected listing: {other:?}"),
    }
}

#[test]
fn moving_replaces_an_existing_destination() {
    let dir = tempfile::tempdir().unwrap();
    let mut adapter = LocalFilesystemAdapter::new(dir.path()).unwrap();
    adapter
        .write_string("source.txt", "new", &Config::new())
        .unwrap();
    adapter
        .write_string("destination.txt", "old", &Config::new())
        .unwrap();

    adapter
        .move_file("source.txt", "destination.txt", &Config::new())
        .unwrap();

    assert_eq!(adapter.read_string("destination.txt").unwrap(), "new");
    assert!(!adapter.file_exists("source.txt").unwrap());
}

#[test]
fn paths_cannot_climb_out_of_the_root() {
    let dir = tempfile::tempdir().unwrap();
    let outside = dir.path().join("outside.txt");
    std::fs::write(&outside, b"keep me").unwrap();
    let mut adapter = LocalFilesystemAdapter::new(dir.path().join("root")).unwrap();

    let write = adapter
        .write_string("../escaped.txt", "contents", &Config::new())
        .unwrap_err();
    let delete = adapter.delete("../outside.txt").unwrap_err();
    let delete_directory = adapter.delete_directory("..").unwrap_err();
    let read = adapter.read("nested/../../outside.txt").err().unwrap();

    assert!(matches!(write, FilesystemError::UnableToWriteFile { .. }));
    assert!(matches!(delete, FilesystemError::UnableToDeleteFile { .. }));
    assert!(matches!(
        delete_directory,
        FilesystemError::UnableToDeleteDirectory { .. }
    ));
    assert!(matches!(read, FilesystemError::UnableToReadFile { .. }));
    assert!(!dir.path().join("escaped.txt").exists());
    assert_eq!(std::fs::read(&outside).unwrap(), b"keep me");
    assert!(dir.path().join("root").is_dir());
}

#[test]
fn copies_and_moves_cannot_leave_the_root() {
    let dir = tempfile::tempdir().unwrap();
    let mut adapter = LocalFilesystemAdapter::new(dir.path().join("root")).unwrap();
    adapter
        .write_string("file.txt", "contents", &Config::new())
        .unwrap();

    let copy = adapter
        .copy_file("file.txt", "../copy.txt", &Config::new())
        .unwrap_err();
    let moved = adapter
        .move_file("file.txt", "../moved.txt", &Config::new())
        .unwrap_err();

    assert!(matches!(copy, FilesystemError::UnableToCopyFile { .. }));
    assert!(matches!(moved, FilesystemError::UnableToMoveFile { .. }));
    assert!(!dir.path().join("copy.txt").exists());
    assert!(!dir.path().join("moved.txt").exists());
    assert!(adapter.file_exists("file.txt").unwrap());
}

#[cfg(unix)]
mod unix {
    use std::os::unix::fs::{PermissionsExt, symlink};
    use std::path::Path;

    use super::*;

    fn mode(path: &Path) -> u32 {
        std::fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    fn with_link(policy: SymbolicLinkPolicy) -> (tempfile::TempDir, LocalFilesystemAdapter) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        let mut adapter = LocalFilesystemAdapter::with_options(
            &root,
            PermissionStrategy::for_current_os().unwrap(),
            policy,
        )
        .unwrap();
        adapter
            .write_string("file.txt", "contents", &Config::new())
            .unwrap();
        symlink(root.join("file.txt"), root.join("link.txt")).unwrap();
        (dir, adapter)
    }

    #[test]
    fn symbolic_links_are_refused_by_default() {
        let (_dir, adapter) = with_link(SymbolicLinkPolicy::default());

        let err = adapter
            .list_contents("", false)
            .find_map(Result::err)
            .unwrap();

        assert!(matches!(
            err,
            FilesystemError::SymbolicLinkEncountered { ref location } if location == "link.txt"
        ));
        assert_eq!(err.operation(), None);
    }

    #[test]
    fn symbolic_links_can_be_skipped() {
        let (_dir, adapter) = with_link(SymbolicLinkPolicy::SkipLinks);

        let paths: Vec<_> = adapter
            .list_contents("", true)
            .map(|entry| entry.unwrap().path().to_string())
            .collect();

        assert_eq!(paths, ["file.txt"]);
    }

    #[test]
    fn visibility_maps_to_mode_bits() {
        let dir = tempfile::tempdir().unwrap();
        let mut adapter = LocalFilesystemAdapter::new(dir.path()).unwrap();

        adapter
            .write_string(
                "private.txt",
                "contents",
                &Config::new().with_visibility(Visibility::Private),
            )
            .unwrap();
        adapter
            .write_string(
                "public.txt",
                "contents",
                &Config::new().with_visibility(Visibility::Public),
            )
            .unwrap();

        assert_eq!(mode(&dir.path().join("private.txt")), 0o600);
        assert_eq!(mode(&dir.path().join("public.txt")), 0o644);
    }

    #[test]
    fn directories_default_to_private() {
        let dir = tempfile::tempdir().unwrap();
        let mut adapter = LocalFilesystemAdapter::new(dir.path()).unwrap();

        adapter.create_directory("private", &Config::new()).unwrap();
        adapter
            .write_string(
                "public/file.txt",
                "contents",
                &Config::new().with_directory_visibility(Visibility::Public),
            )
            .unwrap();

        assert_eq!(mode(&dir.path().join("private")), 0o700);
        assert_eq!(mode(&dir.path().join("public")), 0o755);
        assert_eq!(
            adapter.visibility("private").unwrap().visibility,
            Some(Visibility::Private)
        );
    }

    #[test]
    fn permissive_modes_read_as_public() {
        let dir = tempfile::tempdir().unwrap();
        let mut adapter = LocalFilesystemAdapter::new(dir.path()).unwrap();
        adapter
            .write_string("file.txt", "contents", &Config::new())
            .unwrap();

        std::fs::set_permissions(
            dir.path().join("file.txt"),
            std::fs::Permissions::from_mode(0o666),
        )
        .unwrap();

        assert_eq!(
            adapter.visibility("file.txt").unwrap().visibility,
            Some(Visibility::Public)
        );
    }
}
