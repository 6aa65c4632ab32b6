use packager::{
    ArchiveReader, MutationRequest, PackageError, PackageLayouts, rebuild_bytes, rebuild_file,
};

use crate::common::{build_zip, members, text};

fn sample() -> Vec<u8> {
    build_zip(&[
        ("main.py", "print(1)"),
        ("extra/", ""),
        ("extra/util.py", "def f(): pass"),
        ("README", "read me"),
    ])
}

mod properties {
    use super::*;

    #[test]
    fn empty_request_reproduces_source() {
        let source = sample();
        let out = rebuild_bytes(&source, &MutationRequest::default()).unwrap();

        let mut before = members(&source);
        let mut after = members(&out);
        before.sort();
        after.sort();
        assert_eq!(before, after);
        for path in &before {
            assert_eq!(text(&source, path), text(&out, path), "{path}");
        }
    }

    #[test]
    fn added_path_replaces_existing_member() {
        let source = sample();
        for kind in ["text", "binary"] {
            let mut request = MutationRequest::default();
            match kind {
                "text" => request.add_text("extra/util.py", "def g(): pass"),
                _ => request.add_binary("extra/util.py", b"def g(): pass".to_vec()),
            };
            let out = rebuild_bytes(&source, &request).unwrap();

            let names = members(&out);
            assert_eq!(names.iter().filter(|n| *n == "extra/util.py").count(), 1, "{kind}");
            assert_eq!(text(&out, "extra/util.py").as_deref(), Some("def g(): pass"));
        }
    }

    #[test]
    fn deleted_member_can_be_restored() {
        let source = sample();
        let mut request = MutationRequest::default();
        request.delete("README");
        let without = rebuild_bytes(&source, &request).unwrap();
        assert!(!members(&without).contains(&"README".to_string()));

        let mut request = MutationRequest::default();
        request.add_text("README", "x");
        let restored = rebuild_bytes(&without, &request).unwrap();
        assert_eq!(text(&restored, "README").as_deref(), Some("x"));
    }

    #[test]
    fn text_members_round_trip_exactly() {
        let source = sample();
        for s in ["", "plain", "línea\nñ 日本語 🚀", "trailing newline\n", "\t\r\n"] {
            let mut request = MutationRequest::default();
            request.add_text("notes/t.txt", s);
            let out = rebuild_bytes(&source, &request).unwrap();
            assert_eq!(text(&out, "notes/t.txt").as_deref(), Some(s));
        }
    }

    #[test]
    fn auxiliary_members_never_include_scaffold() {
        let layout = PackageLayouts::default().evaluation;
        let mut request = MutationRequest::default();
        request
            .add_text("task/main.py", "main")
            .add_text("task/setup.sh", "setup")
            .add_text("task/helper.py", "helper");
        let out = rebuild_bytes(&build_zip(&[("top.txt", "")]), &request).unwrap();

        let reader = ArchiveReader::from_bytes(&out).unwrap();
        assert_eq!(reader.auxiliary_members(&layout.scaffold()), vec!["task/helper.py"]);
    }

    #[test]
    fn corrupt_source_produces_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.zip");
        let dest = dir.path().join("dest.zip");
        std::fs::write(&source, b"PK\x03\x04 definitely not an archive").unwrap();

        let mut request = MutationRequest::default();
        request.add_text("main.py", "print(2)");
        let err = rebuild_file(&source, &dest, &request).unwrap_err();

        assert!(matches!(err, PackageError::ArchiveCorrupt(_)));
        assert!(!dest.exists());
    }

    #[test]
    fn corrupt_source_leaves_existing_destination_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.zip");
        let dest = dir.path().join("dest.zip");
        std::fs::write(&source, b"garbage").unwrap();
        std::fs::write(&dest, sample()).unwrap();

        assert!(rebuild_file(&source, &dest, &MutationRequest::default()).is_err());
        assert_eq!(std::fs::read(&dest).unwrap(), sample());
    }
}
