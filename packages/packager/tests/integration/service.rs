use ::common::evaluation::{ChannelDispatcher, SubmissionSnapshot, TaskSnapshot};
use ::common::{ArchiveRef, ArchiveStore, ContentHash, EvaluationDispatcher, EvaluationJob};
use ::common::{ResourceLimits, SubmissionStatus, TaskWindow};
use packager::{PackageError, PackageKind, SubmissionEdit, TaskEdit, UploadError, UploadedFile};

use crate::common::{TestService, build_zip, members, text};

async fn stored(app: &TestService, name: &str, bytes: Vec<u8>) -> ArchiveRef {
    let hash = app.service.store().put(&bytes).await.unwrap();
    ArchiveRef {
        name: name.into(),
        hash,
        size: bytes.len() as u64,
    }
}

async fn load(app: &TestService, archive: &ArchiveRef) -> Vec<u8> {
    app.service.store().read(&archive.hash).await.unwrap()
}

mod submit_code {
    use super::*;

    #[tokio::test]
    async fn first_submission_starts_from_template() {
        let app = TestService::spawn().await;
        let template = stored(
            &app,
            "lab-template.zip",
            build_zip(&[("submission/main.py", "# start"), ("submission/data.csv", "1")]),
        )
        .await;

        let archive = app
            .service
            .submit_code(None, Some(&template), &SubmissionEdit::code("print('hi')"), true)
            .await
            .unwrap();

        let bytes = load(&app, &archive).await;
        assert_eq!(archive.size, bytes.len() as u64);
        assert_eq!(archive.hash, ContentHash::compute(&bytes));
        assert_eq!(text(&bytes, "submission/main.py").as_deref(), Some("print('hi')"));
        assert_eq!(text(&bytes, "submission/data.csv").as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn resubmission_starts_from_previous_archive() {
        let app = TestService::spawn().await;
        let template = stored(&app, "t.zip", build_zip(&[("submission/main.py", "# start")])).await;
        let previous = stored(
            &app,
            "old.zip",
            build_zip(&[("submission/main.py", "v1"), ("submission/model.pt", "w")]),
        )
        .await;

        let archive = app
            .service
            .submit_code(Some(&previous), Some(&template), &SubmissionEdit::code("v2"), true)
            .await
            .unwrap();

        let bytes = load(&app, &archive).await;
        assert_eq!(members(&bytes), vec!["submission/model.pt", "submission/main.py"]);
        assert_ne!(archive.name, previous.name);
    }

    #[tokio::test]
    async fn unusable_bases_fall_back_to_skeleton() {
        let app = TestService::spawn().await;
        let corrupt = stored(&app, "bad.zip", b"not a zip".to_vec()).await;
        let wrong_layout = stored(&app, "t.zip", build_zip(&[("main.py", "")])).await;
        let missing = ArchiveRef {
            name: "gone.zip".into(),
            hash: ContentHash::compute(b"never stored"),
            size: 0,
        };

        for (previous, template) in [
            (Some(&corrupt), Some(&wrong_layout)),
            (Some(&missing), None),
            (None, None),
        ] {
            let archive = app
                .service
                .submit_code(previous, template, &SubmissionEdit::code("x"), true)
                .await
                .unwrap();
            let bytes = load(&app, &archive).await;
            assert_eq!(members(&bytes), vec!["submission/main.py"]);
        }
    }

    #[tokio::test]
    async fn file_changes_rejected_when_not_allowed() {
        let app = TestService::spawn().await;
        let edit = SubmissionEdit {
            add_files: vec![UploadedFile::new("x.py", "text/x-python", b"x".to_vec())],
            ..SubmissionEdit::code("x")
        };
        let before = app.stored_count();

        let err = app.service.submit_code(None, None, &edit, false).await.unwrap_err();
        assert!(matches!(err, PackageError::FilesNotAllowed));
        assert_eq!(app.stored_count(), before);
    }
}

mod uploads {
    use super::*;

    #[tokio::test]
    async fn valid_upload_is_stored_as_is() {
        let app = TestService::spawn().await;
        let bytes = build_zip(&[("submission/main.py", "print(1)"), ("weights.bin", "w")]);
        let file = UploadedFile::new("My Run.zip", "application/x-zip-compressed", bytes.clone());

        let archive = app
            .service
            .submit_upload(Some(&file), &ResourceLimits::default())
            .await
            .unwrap();
        assert_eq!(archive.name, "my_run.zip");
        assert_eq!(load(&app, &archive).await, bytes);
    }

    #[tokio::test]
    async fn rejected_upload_is_not_stored() {
        let app = TestService::spawn().await;
        let limits = ResourceLimits {
            max_upload_size: 1,
            ..ResourceLimits::default()
        };
        let big = UploadedFile::new(
            "big.zip",
            "application/zip",
            build_zip(&[("submission/main.py", "x".repeat(4096).as_str())]),
        );

        let err = app.service.submit_upload(Some(&big), &limits).await.unwrap_err();
        assert!(matches!(err, PackageError::Upload(UploadError::TooLarge { limit_kb: 1, .. })));

        let err = app
            .service
            .submit_upload(None, &ResourceLimits::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "File is required.");
        assert_eq!(app.stored_count(), 0);
    }

    #[tokio::test]
    async fn task_package_needs_evaluation_main() {
        let app = TestService::spawn().await;
        let ok =
            UploadedFile::new("lab.zip", "application/zip", build_zip(&[("task/main.py", "")]));
        let bad = UploadedFile::new("lab.zip", "application/zip", build_zip(&[("main.py", "")]));

        assert!(app.service.upload_task_package(Some(&ok)).await.is_ok());
        assert!(matches!(
            app.service.upload_task_package(Some(&bad)).await,
            Err(PackageError::RequiredMemberMissing { path }) if path == "task/main.py"
        ));
    }
}

mod task_edit {
    use super::*;

    #[tokio::test]
    async fn new_task_is_built_from_skeletons() {
        let app = TestService::spawn().await;
        let edit = TaskEdit {
            code: "grade()".into(),
            setup: Some("pip install numpy".into()),
            template_code: Some("# start".into()),
            ..TaskEdit::default()
        };

        let archives = app
            .service
            .edit_task("Linear Regression", None, None, &edit)
            .await
            .unwrap();
        assert_eq!(archives.evaluation.name, "linear_regression.zip");
        assert_eq!(archives.template.name, "linear_regression-template.zip");

        let contents = app
            .service
            .contents(Some(&archives.evaluation), PackageKind::Evaluation)
            .await
            .unwrap();
        assert_eq!(contents.code, "grade()");
        assert_eq!(contents.setup.as_deref(), Some("pip install numpy"));

        let template = load(&app, &archives.template).await;
        assert_eq!(text(&template, "submission/main.py").as_deref(), Some("# start"));
    }

    #[tokio::test]
    async fn half_failed_edit_stores_nothing() {
        let app = TestService::spawn().await;
        let evaluation = stored(&app, "e.zip", build_zip(&[("task/main.py", "grade()")])).await;
        let template = stored(&app, "t.zip", build_zip(&[("submission/main.py", "")])).await;
        let before = app.stored_count();

        let edit = TaskEdit {
            code: "grade(2)".into(),
            template_delete_files: vec!["submission/ghost.py".into()],
            ..TaskEdit::default()
        };
        let err = app
            .service
            .edit_task("t", Some(&evaluation), Some(&template), &edit)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PackageError::PartialAssemblyFailure { failed: PackageKind::Template, .. }
        ));
        assert_eq!(app.stored_count(), before);
    }

    #[tokio::test]
    async fn contents_of_unusable_package_are_empty() {
        let app = TestService::spawn().await;
        let corrupt = stored(&app, "bad.zip", b"junk".to_vec()).await;

        let contents = app
            .service
            .contents(Some(&corrupt), PackageKind::Submission)
            .await
            .unwrap();
        assert_eq!(contents.code, "");
        assert!(contents.members.is_empty());

        let json = serde_json::to_value(&contents).unwrap();
        assert_eq!(json["setup"], serde_json::Value::Null);
    }
}

mod dispatch {
    use super::*;

    #[tokio::test]
    async fn assembled_submission_is_handed_to_grader() {
        let app = TestService::spawn().await;
        let (dispatcher, mut rx) = ChannelDispatcher::channel();

        let task_archives = app
            .service
            .edit_task("Lab", None, None, &TaskEdit::default())
            .await
            .unwrap();
        let submission = app
            .service
            .submit_code(None, Some(&task_archives.template), &SubmissionEdit::code("x"), true)
            .await
            .unwrap();

        let job = EvaluationJob::new(
            TaskSnapshot {
                id: 1,
                name: "Lab".into(),
                archive: task_archives.evaluation.clone(),
                template: Some(task_archives.template.clone()),
                limits: ResourceLimits::default(),
                window: TaskWindow::default(),
                leaderboard: false,
            },
            SubmissionSnapshot {
                id: 10,
                task_id: 1,
                user_id: 5,
                description: None,
                archive: submission.clone(),
                status: SubmissionStatus::Queued,
                created_at: chrono::Utc::now(),
            },
        );
        dispatcher.submit_for_evaluation(job).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.submission.archive, submission);
        assert!(app.service.store().exists(&received.task.archive.hash).await.unwrap());
    }
}
