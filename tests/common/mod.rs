use std::path::Path;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, header};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use pdf_excel_server::routes::{AppState, router};
use pdf_excel_server::scratch::ScratchDir;
use pdf_excel_server::session::StaticCredentials;
use rust_xlsxwriter::Workbook;
use tower::ServiceExt;

pub const USERNAME: &str = "Admin";
pub const PASSWORD: &str = "s3cret";
const BOUNDARY: &str = "pdfxl-test-boundary";

pub fn app(scratch_root: &Path) -> Router {
    let scratch = ScratchDir::new(scratch_root).expect("scratch dir should be created");
    router(AppState::new(
        scratch,
        StaticCredentials::new([(USERNAME, PASSWORD)]),
        1024 * 1024,
    ))
}

/// One page of Courier text per inner vec.
pub fn pdf_bytes(pages: &[Vec<&str>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut page_ids = Vec::new();
    for lines in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("TL", vec![16.into()]),
            Operation::new("Td", vec![50.into(), 780.into()]),
        ];
        for (index, line) in lines.iter().enumerate() {
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            if index + 1 < lines.len() {
                operations.push(Operation::new("T*", vec![]));
            }
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let encoded = content.encode().expect("content should encode");
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        page_ids.push(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        }));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<_>>(),
            "Count" => i64::try_from(page_ids.len()).expect("page count fits"),
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("PDF should serialize");
    bytes
}

pub fn workbook_bytes(rows: &[Vec<&str>]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (row_index, row) in (0_u32..).zip(rows) {
        for (col_index, value) in (0_u16..).zip(row) {
            sheet
                .write_string(row_index, col_index, *value)
                .expect("cell should be written");
        }
    }
    workbook.save_to_buffer().expect("workbook should serialize")
}

pub fn multipart_request(
    uri: &str,
    file_name: &str,
    bytes: &[u8],
    cookie: Option<&str>,
) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::post(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).expect("request should build")
}

pub fn login_request(username: &str, password: &str) -> Request<Body> {
    Request::post("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "username={}&password={}",
            urlencoding::encode(username),
            urlencoding::encode(password)
        )))
        .expect("request should build")
}

/// Logs in and returns the `name=value` cookie pair for later requests.
pub async fn login(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(login_request(USERNAME, PASSWORD))
        .await
        .expect("login should be served");
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login should set a cookie")
        .to_str()
        .expect("cookie should be ascii");
    set_cookie
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string()
}

pub fn scratch_is_empty(root: &Path) -> bool {
    std::fs::read_dir(root)
        .expect("scratch dir should be readable")
        .next()
        .is_none()
}
