use quiz_dashboard::models::{ProcessingProgress, ProcessingStatus, Question};
use quiz_dashboard::services::CSV_HEADER;
use quiz_dashboard::store::{BASIC_SCAN_FN, BOOKS_TABLE, EXTRACT_METADATA_FN, GENERATE_QUESTIONS_FN};
use quiz_dashboard::{BookService, Config, MemoryBackend, Stores};
use serde_json::json;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

fn setup_with(config: Config) -> (Arc<MemoryBackend>, BookService) {
    let backend = Arc::new(MemoryBackend::new());
    let service = BookService::new(Stores::from_backend(backend.clone()), &config);
    (backend, service)
}

fn setup() -> (Arc<MemoryBackend>, BookService) {
    setup_with(Config::default())
}

fn question(book_id: &str, number: i64, text: &str) -> Question {
    Question {
        book_id: book_id.to_string(),
        question_number: number,
        question_text: text.to_string(),
        choice_1: "甲".to_string(),
        choice_2: "乙".to_string(),
        choice_3: "丙".to_string(),
        choice_4: "丁".to_string(),
        correct_choice: "1".to_string(),
        category: "reading".to_string(),
        difficulty_level: "medium".to_string(),
    }
}

// ========== 上传 ==========

#[tokio::test]
async fn test_upload_returns_path_with_original_name() {
    let (backend, service) = setup();

    let path = service
        .upload("Grade 7 Science.pdf", b"%PDF-1.4".to_vec())
        .await
        .expect("上传应该成功");

    assert!(!path.is_empty());
    assert!(path.ends_with("_Grade 7 Science.pdf"));
    assert_eq!(backend.object("books", &path), Some(b"%PDF-1.4".to_vec()));
}

#[tokio::test]
async fn test_upload_failure_returns_none() {
    let (backend, service) = setup();
    backend.fail_uploads();

    assert_eq!(service.upload("a.pdf", vec![1, 2, 3]).await, None);
    assert_eq!(service.upload("", vec![1]).await, None);
}

#[tokio::test]
async fn test_upload_file_reads_local_pdf() {
    let (backend, service) = setup();
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("history.pdf");
    std::fs::write(&file, b"%PDF-1.7 body").unwrap();

    let path = service.upload_file(&file).await.expect("上传应该成功");
    assert!(path.ends_with("history.pdf"));
    assert_eq!(backend.object("books", &path), Some(b"%PDF-1.7 body".to_vec()));

    assert_eq!(service.upload_file(&dir.path().join("missing.pdf")).await, None);
}

// ========== 列表 ==========

#[tokio::test]
async fn test_list_attaches_progress_by_file_path() {
    let (backend, service) = setup();
    backend.add_book("a.pdf", Some("7"), Some("Math"), Some("01"));
    backend.add_book("b.pdf", None, None, None);
    backend.add_progress(ProcessingProgress::new("a.pdf", ProcessingStatus::Completed));
    backend.add_progress(ProcessingProgress::new("orphan.pdf", ProcessingStatus::Processing));

    let books = service.list_books_with_progress().await;

    // 新书在前
    assert_eq!(books.len(), 2);
    assert_eq!(books[0].book.file_path, "b.pdf");
    assert!(books[0].progress.is_none());
    assert_eq!(books[1].book.file_path, "a.pdf");
    assert_eq!(books[1].status(), Some(ProcessingStatus::Completed));
}

#[tokio::test]
async fn test_list_degrades_when_progress_fails() {
    let (backend, service) = setup();
    backend.add_book("a.pdf", None, None, None);
    backend.add_progress(ProcessingProgress::new("a.pdf", ProcessingStatus::Completed));
    backend.fail_progress_reads();

    let books = service.list_books_with_progress().await;
    assert_eq!(books.len(), 1);
    assert!(books[0].progress.is_none());
}

#[tokio::test]
async fn test_list_is_empty_when_books_fail() {
    let (backend, service) = setup();
    backend.add_book("a.pdf", None, None, None);
    backend.fail_book_reads();

    assert!(service.list_books_with_progress().await.is_empty());
}

// ========== 触发处理 ==========

#[tokio::test]
async fn test_triggers_send_file_path_payload() {
    let (backend, service) = setup();

    assert!(service.extract_metadata("1_a.pdf").await);
    assert!(service.start_question_generation("1_a.pdf").await);

    assert_eq!(
        backend.invocations(),
        vec![
            (EXTRACT_METADATA_FN.to_string(), json!({ "filePath": "1_a.pdf" })),
            (GENERATE_QUESTIONS_FN.to_string(), json!({ "filePath": "1_a.pdf" })),
        ]
    );
}

#[tokio::test]
async fn test_trigger_failure_returns_false() {
    let (backend, service) = setup();
    backend.fail_function(GENERATE_QUESTIONS_FN);

    assert!(service.extract_metadata("1_a.pdf").await);
    assert!(!service.start_question_generation("1_a.pdf").await);
}

// ========== 取消 ==========

#[tokio::test]
async fn test_cancel_is_idempotent() {
    let (backend, service) = setup();
    backend.add_progress(ProcessingProgress::new("a.pdf", ProcessingStatus::Processing));

    assert!(service.cancel_processing("a.pdf").await);
    assert_eq!(backend.progress()[0].status, Some(ProcessingStatus::NotStarted));

    assert!(service.cancel_processing("a.pdf").await);
    assert_eq!(backend.progress()[0].status, Some(ProcessingStatus::NotStarted));
}

#[tokio::test]
async fn test_cancel_without_progress_row_succeeds() {
    let (_backend, service) = setup();
    assert!(service.cancel_processing("never-started.pdf").await);
}

// ========== 扫描 ==========

#[tokio::test]
async fn test_scan_uses_remote_function_first() {
    let (backend, service) = setup();
    backend.add_object("books", "new.pdf", b"x");

    assert!(service.scan_for_new_books().await);

    let calls = backend.calls();
    assert!(calls.contains(&format!("invoke {}", BASIC_SCAN_FN)));
    assert!(!calls.iter().any(|c| c.starts_with("list ")));
    assert!(backend.books().is_empty());
}

#[tokio::test]
async fn test_scan_falls_back_to_set_difference() {
    let (backend, service) = setup();
    backend.fail_function(BASIC_SCAN_FN);
    backend.add_object("books", "a.pdf", b"a");
    backend.add_object("books", "b.pdf", b"b");
    backend.add_object("books", "b.txt", b"t");
    backend.add_book("a.pdf", Some("8"), None, None);

    assert!(service.scan_for_new_books().await);

    let paths: Vec<String> = backend.books().into_iter().map(|b| b.file_path).collect();
    assert_eq!(paths, vec!["a.pdf".to_string(), "b.pdf".to_string()]);

    let added = backend
        .books()
        .into_iter()
        .find(|b| b.file_path == "b.pdf")
        .unwrap();
    assert_eq!((added.grade, added.subject, added.semester), (None, None, None));
}

#[tokio::test]
async fn test_client_side_scan_respects_page_size() {
    let config = Config {
        scan_page_size: 2,
        ..Config::default()
    };
    let (backend, service) = setup_with(config);
    for name in ["a.pdf", "b.pdf", "c.pdf"] {
        backend.add_object("books", name, b"x");
    }

    assert_eq!(assert_ok!(service.client_side_scan().await), 2);
    assert_eq!(backend.books().len(), 2);
}

#[tokio::test]
async fn test_client_side_scan_reads_all_known_paths_beyond_page_size() {
    let config = Config {
        scan_page_size: 2,
        ..Config::default()
    };
    let (backend, service) = setup_with(config);
    backend.add_book("c.pdf", None, None, None);
    backend.add_book("b.pdf", None, None, None);
    backend.add_book("a.pdf", None, None, None);
    for name in ["a.pdf", "b.pdf", "c.pdf", "d.pdf"] {
        backend.add_object("books", name, b"x");
    }

    // 只列出 a.pdf 和 b.pdf，二者都已登记
    assert_eq!(assert_ok!(service.client_side_scan().await), 0);
    assert_eq!(backend.books().len(), 3);
}

#[tokio::test]
async fn test_fallback_scan_never_duplicates_registered_paths() {
    let config = Config {
        scan_page_size: 2,
        ..Config::default()
    };
    let (backend, service) = setup_with(config);
    backend.fail_function(BASIC_SCAN_FN);
    for name in ["c.pdf", "b.pdf", "a.pdf"] {
        backend.add_book(name, None, None, None);
    }
    for name in ["a.pdf", "b.pdf", "c.pdf"] {
        backend.add_object("books", name, b"x");
    }

    assert!(service.scan_for_new_books().await);

    let paths: Vec<String> = backend.books().into_iter().map(|b| b.file_path).collect();
    assert_eq!(paths.len(), 3);
    for name in ["a.pdf", "b.pdf", "c.pdf"] {
        assert_eq!(paths.iter().filter(|p| p.as_str() == name).count(), 1, "{} 重复登记", name);
    }
}

#[tokio::test]
async fn test_scan_bootstraps_missing_table_before_fallback() {
    let (backend, service) = setup();
    backend.fail_function(BASIC_SCAN_FN);
    backend.drop_table(BOOKS_TABLE);
    backend.add_object("books", "a.pdf", b"a");

    assert!(service.scan_for_new_books().await);
    assert!(backend.has_table(BOOKS_TABLE));
    assert_eq!(backend.books().len(), 1);
}

#[tokio::test]
async fn test_scan_fails_when_both_branches_fail() {
    let config = Config {
        bootstrap_schema_on_scan: false,
        ..Config::default()
    };
    let (backend, service) = setup_with(config);
    backend.fail_function(BASIC_SCAN_FN);
    backend.drop_table(BOOKS_TABLE);

    assert!(!service.scan_for_new_books().await);
    assert_err!(service.client_side_scan().await);
    assert!(!backend.calls().iter().any(|c| c.starts_with("probe")));
}

// ========== 导出 ==========

#[tokio::test]
async fn test_export_missing_book_touches_nothing_else() {
    let (backend, service) = setup();

    assert_eq!(service.export_questions_csv("404").await, None);

    let calls = backend.calls();
    assert_eq!(calls, vec!["get_book 404".to_string()]);
}

#[tokio::test]
async fn test_export_uploads_csv_named_after_book() {
    let (backend, service) = setup();
    let id = backend.add_book("1_math.pdf", Some("10"), Some("Math"), Some("01"));
    backend.add_question(question(&id, 2, "第二题"));
    backend.add_question(question(&id, 1, "He said \"hi\""));
    backend.add_question(question("other", 1, "不属于这本书"));

    let file_name = service.export_questions_csv(&id).await.expect("导出应该成功");
    assert_eq!(file_name, "10_Math_01.csv");

    let csv = String::from_utf8(backend.object("questions-csv", &file_name).unwrap()).unwrap();
    let lines: Vec<&str> = csv.split('\n').collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], CSV_HEADER);
    assert_eq!(
        lines[1],
        "1,reading,medium,\"He said \"\"hi\"\"\",\"甲\",\"乙\",\"丙\",\"丁\",1"
    );
    assert!(lines[2].starts_with("2,reading,medium,\"第二题\""));

    // 再次导出覆盖同名文件
    assert_eq!(service.export_questions_csv(&id).await, Some(file_name));
}

#[tokio::test]
async fn test_export_defaults_and_empty_question_list() {
    let (backend, service) = setup();
    let id = backend.add_book("1_unknown.pdf", None, None, None);

    let file_name = service.export_questions_csv(&id).await.unwrap();
    assert_eq!(file_name, "0_Unknown_00.csv");
    assert_eq!(
        backend.object("questions-csv", &file_name),
        Some(CSV_HEADER.as_bytes().to_vec())
    );
}

#[tokio::test]
async fn test_export_to_local_dir() {
    let (backend, service) = setup();
    let id = backend.add_book("1_bio.pdf", Some("9"), Some("Biology"), Some("02"));
    backend.add_question(question(&id, 1, "细胞是什么？"));
    let dir = tempfile::tempdir().unwrap();

    let local = service
        .export_questions_csv_to(&id, dir.path())
        .await
        .expect("导出应该成功");

    assert_eq!(local, dir.path().join("9_Biology_02.csv"));
    let content = std::fs::read_to_string(&local).unwrap();
    assert!(content.starts_with(CSV_HEADER));
    assert!(backend.object("questions-csv", "9_Biology_02.csv").is_some());
}
