//! Upload, listing, download and deletion integration tests.
//!
//! Run with: `cargo test -p pagevault-api --test files_test`

mod helpers;

use helpers::auth::register_test_user;
use helpers::fixtures::{file_form, pdf_of_size, png_of_size, MB};
use helpers::setup_test_app;
use serde_json::Value;

fn listed_names(body: &Value, field: &str) -> Vec<String> {
    body["files"]
        .as_array()
        .expect("files array")
        .iter()
        .filter_map(|f| f[field].as_str().map(String::from))
        .collect()
}

#[tokio::test]
async fn test_upload_pdf_is_accepted_and_listed() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = register_test_user(client, "alice").await;

    let response = client
        .post("/api/upload")
        .add_header("cookie", user.cookie.clone())
        .multipart(file_form("report.pdf", "application/pdf", pdf_of_size(2 * MB)))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["file"]["original_filename"], "report.pdf");
    assert_eq!(body["file"]["size"], 2 * MB as u64);
    assert_eq!(body["file"]["content_type"], "application/pdf");
    let stored = body["file"]["stored_filename"]
        .as_str()
        .expect("stored filename")
        .to_string();
    assert!(stored.starts_with("report_"));
    assert!(stored.ends_with(".pdf"));

    let list = client
        .get("/api/files")
        .add_header("cookie", user.cookie.clone())
        .await;
    assert_eq!(list.status_code(), 200);
    let listed: Value = list.json();
    assert_eq!(listed_names(&listed, "filename"), vec![stored]);
    assert_eq!(listed_names(&listed, "original_filename"), vec!["report.pdf"]);
}

#[tokio::test]
async fn test_executable_is_rejected_without_writing() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = register_test_user(client, "bob").await;

    let response = client
        .post("/api/upload")
        .add_header("cookie", user.cookie.clone())
        .multipart(file_form(
            "virus.exe",
            "application/octet-stream",
            b"MZ\x90\x00".to_vec(),
        ))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
    assert!(body["error"].as_str().unwrap_or_default().contains("exe"));
    assert!(app.stored_files().is_empty());

    let list = client
        .get("/api/files")
        .add_header("cookie", user.cookie.clone())
        .await;
    let listed: Value = list.json();
    assert!(listed_names(&listed, "filename").is_empty());
}

#[tokio::test]
async fn test_oversized_image_is_rejected_before_storage() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = register_test_user(client, "carol").await;

    let response = client
        .post("/api/upload")
        .add_header("cookie", user.cookie.clone())
        .multipart(file_form("photo.png", "image/png", png_of_size(15 * MB)))
        .await;

    assert_eq!(response.status_code(), 413);
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_file_just_over_limit_is_rejected_by_validator() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = register_test_user(client, "dave").await;

    let response = client
        .post("/api/upload")
        .add_header("cookie", user.cookie.clone())
        .multipart(file_form(
            "big.pdf",
            "application/pdf",
            pdf_of_size(10 * MB + 1),
        ))
        .await;

    assert_eq!(response.status_code(), 413);
    let body: Value = response.json();
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_file_at_limit_is_accepted() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = register_test_user(client, "erin").await;

    let response = client
        .post("/api/upload")
        .add_header("cookie", user.cookie.clone())
        .multipart(file_form("exact.pdf", "application/pdf", pdf_of_size(10 * MB)))
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(app.stored_files().len(), 1);
}

#[tokio::test]
async fn test_mismatched_content_type_is_rejected() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = register_test_user(client, "frank").await;

    let response = client
        .post("/api/upload")
        .add_header("cookie", user.cookie.clone())
        .multipart(file_form("scan.pdf", "image/png", pdf_of_size(1024)))
        .await;

    assert_eq!(response.status_code(), 400);
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_upload_without_file_part_is_rejected() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = register_test_user(client, "grace").await;

    let form = axum_test::multipart::MultipartForm::new().add_text("folder_name", "reports");
    let response = client
        .post("/api/upload")
        .add_header("cookie", user.cookie.clone())
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "No file part in the request");
}

#[tokio::test]
async fn test_download_round_trips_bytes() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = register_test_user(client, "heidi").await;

    let original = png_of_size(4096);
    let upload = client
        .post("/upload")
        .add_header("cookie", user.cookie.clone())
        .multipart(file_form("chart.png", "image/png", original.clone()))
        .await;
    assert_eq!(upload.status_code(), 200);
    let body: Value = upload.json();
    let stored = body["file"]["stored_filename"].as_str().expect("stored filename");

    let download = client
        .get(&format!("/download/{}", stored))
        .add_header("cookie", user.cookie.clone())
        .await;

    assert_eq!(download.status_code(), 200);
    assert_eq!(download.as_bytes().as_ref(), original.as_slice());
    assert_eq!(download.header("content-type"), "image/png");
    let disposition = download.header("content-disposition");
    assert!(disposition
        .to_str()
        .expect("ascii header")
        .contains("filename=\"chart.png\""));
}

#[tokio::test]
async fn test_non_ascii_name_keeps_extension_and_type() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = register_test_user(client, "olga").await;

    let original = png_of_size(2048);
    let upload = client
        .post("/api/upload")
        .add_header("cookie", user.cookie.clone())
        .multipart(file_form("фото.png", "image/png", original.clone()))
        .await;
    assert_eq!(upload.status_code(), 200);
    let body: Value = upload.json();
    let stored = body["file"]["stored_filename"]
        .as_str()
        .expect("stored filename")
        .to_string();
    assert!(stored.starts_with("file_"));
    assert!(stored.ends_with(".png"));

    let list = client
        .get("/api/files")
        .add_header("cookie", user.cookie.clone())
        .await;
    let listed: Value = list.json();
    assert_eq!(listed_names(&listed, "original_filename"), vec!["file.png"]);

    let download = client
        .get(&format!("/api/download/{}", stored))
        .add_header("cookie", user.cookie.clone())
        .await;
    assert_eq!(download.status_code(), 200);
    assert_eq!(download.header("content-type"), "image/png");
    assert!(download
        .header("content-disposition")
        .to_str()
        .expect("ascii header")
        .contains("filename=\"file.png\""));
    assert_eq!(download.as_bytes().as_ref(), original.as_slice());
}

#[tokio::test]
async fn test_same_name_uploads_are_kept_apart() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = register_test_user(client, "peggy").await;

    let first = pdf_of_size(1024);
    let mut second = pdf_of_size(1024);
    second.extend_from_slice(b"second revision");

    let mut stored = Vec::new();
    for data in [&first, &second] {
        let upload = client
            .post("/api/upload")
            .add_header("cookie", user.cookie.clone())
            .multipart(file_form("report.pdf", "application/pdf", data.clone()))
            .await;
        assert_eq!(upload.status_code(), 200);
        let body: Value = upload.json();
        stored.push(
            body["file"]["stored_filename"]
                .as_str()
                .expect("stored filename")
                .to_string(),
        );
    }
    assert_ne!(stored[0], stored[1]);
    assert_eq!(app.stored_files().len(), 2);

    let list = client
        .get("/api/files")
        .add_header("cookie", user.cookie.clone())
        .await;
    let listed: Value = list.json();
    let mut names = listed_names(&listed, "filename");
    names.sort();
    let mut expected = stored.clone();
    expected.sort();
    assert_eq!(names, expected);
    assert_eq!(
        listed_names(&listed, "original_filename"),
        vec!["report.pdf", "report.pdf"]
    );

    for (name, data) in stored.iter().zip([&first, &second]) {
        let download = client
            .get(&format!("/api/download/{}", name))
            .add_header("cookie", user.cookie.clone())
            .await;
        assert_eq!(download.status_code(), 200);
        assert_eq!(download.as_bytes().as_ref(), data.as_slice());
    }
}

#[tokio::test]
async fn test_delete_removes_file() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = register_test_user(client, "ivan").await;

    let upload = client
        .post("/api/upload")
        .add_header("cookie", user.cookie.clone())
        .multipart(file_form("notes.pdf", "application/pdf", pdf_of_size(2048)))
        .await;
    let body: Value = upload.json();
    let stored = body["file"]["stored_filename"]
        .as_str()
        .expect("stored filename")
        .to_string();

    let delete = client
        .delete(&format!("/api/delete/{}", stored))
        .add_header("cookie", user.cookie.clone())
        .await;
    assert_eq!(delete.status_code(), 200);

    let list = client
        .get("/api/files")
        .add_header("cookie", user.cookie.clone())
        .await;
    let listed: Value = list.json();
    assert!(!listed_names(&listed, "filename").contains(&stored));

    let download = client
        .get(&format!("/api/download/{}", stored))
        .add_header("cookie", user.cookie.clone())
        .await;
    assert_eq!(download.status_code(), 404);

    let again = client
        .delete(&format!("/api/delete/{}", stored))
        .add_header("cookie", user.cookie.clone())
        .await;
    assert_eq!(again.status_code(), 404);
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_browser_delete_redirects_to_listing() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = register_test_user(client, "judy").await;

    let upload = client
        .post("/upload")
        .add_header("cookie", user.cookie.clone())
        .multipart(file_form("memo.pdf", "application/pdf", pdf_of_size(512)))
        .await;
    let body: Value = upload.json();
    let stored = body["file"]["stored_filename"].as_str().expect("stored filename");

    let delete = client
        .get(&format!("/delete/{}", stored))
        .add_header("cookie", user.cookie.clone())
        .await;

    assert_eq!(delete.status_code(), 303);
    assert_eq!(delete.header("location"), "/files");
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_users_cannot_see_each_others_files() {
    let app = setup_test_app().await;
    let client = app.client();
    let owner = register_test_user(client, "mallory").await;
    let other = register_test_user(client, "oscar").await;

    let upload = client
        .post("/api/upload")
        .add_header("cookie", owner.cookie.clone())
        .multipart(file_form("private.pdf", "application/pdf", pdf_of_size(256)))
        .await;
    let body: Value = upload.json();
    let stored = body["file"]["stored_filename"]
        .as_str()
        .expect("stored filename")
        .to_string();

    let list = client
        .get("/api/files")
        .add_header("cookie", other.cookie.clone())
        .await;
    let listed: Value = list.json();
    assert!(listed_names(&listed, "filename").is_empty());

    let download = client
        .get(&format!("/api/download/{}", stored))
        .add_header("cookie", other.cookie.clone())
        .await;
    assert_eq!(download.status_code(), 404);
}

#[tokio::test]
async fn test_download_rejects_path_traversal() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = register_test_user(client, "peggy").await;

    let response = client
        .get("/api/download/..%2F..%2Fetc%2Fpasswd")
        .add_header("cookie", user.cookie.clone())
        .await;

    assert_eq!(response.status_code(), 400);
}
