use std::path::Path;

use axum::body::Bytes;
use axum_extra::extract::Multipart;
use pdf_excel_core::{
    ConversionReport, ConvertError, ExtractOptions, RenderedReport, excel_to_pdf, pdf_to_excel,
};
use tracing::info;

use crate::error::ApiError;
use crate::models::{PDF_EXTENSIONS, SPREADSHEET_EXTENSIONS};
use crate::scratch::{ScratchDir, client_file_name, file_stem, has_extension};

const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Bytes,
}

impl Upload {
    /// Name offered back to the client for the converted file.
    pub fn download_name(&self, extension: &str) -> String {
        format!("{}.{extension}", file_stem(client_file_name(&self.file_name)))
    }
}

#[derive(Debug)]
pub struct Converted<R> {
    pub bytes: Vec<u8>,
    pub report: R,
}

/// Stages the upload, runs `convert` and reads the result back, all on the
/// blocking pool. The scratch guard lives inside that task, so both files
/// are removed once the conversion finishes even if the request that started
/// it has already gone away.
async fn run_in_scratch<F, R>(
    scratch: &ScratchDir,
    upload: &Upload,
    output_extension: &str,
    context: &'static str,
    convert: F,
) -> Result<Converted<R>, ApiError>
where
    F: FnOnce(&Path, &Path) -> Result<R, ConvertError> + Send + 'static,
    R: Send + 'static,
{
    let files = scratch.allocate(&upload.file_name, output_extension);
    let input = upload.bytes.clone();

    tokio::task::spawn_blocking(move || -> Result<Converted<R>, ApiError> {
        std::fs::write(files.input(), &input)?;
        let report = convert(files.input(), files.output())
            .map_err(|error| ApiError::from_conversion(context, &error))?;
        let bytes = std::fs::read(files.output())?;
        Ok(Converted { bytes, report })
    })
    .await?
}

pub async fn convert_pdf_upload(
    scratch: &ScratchDir,
    upload: &Upload,
    options: &ExtractOptions,
) -> Result<Converted<ConversionReport>, ApiError> {
    if !has_extension(&upload.file_name, PDF_EXTENSIONS) {
        return Err(ApiError::BadRequest("File must be a PDF".to_string()));
    }

    let options = options.clone();
    let converted = run_in_scratch(
        scratch,
        upload,
        "xlsx",
        "Error converting PDF",
        move |input, output| pdf_to_excel(input, output, &options),
    )
    .await?;

    info!(
        file = %upload.file_name,
        input_bytes = upload.bytes.len(),
        output_bytes = converted.bytes.len(),
        path = converted.report.path.as_str(),
        sheets = converted.report.table_count(),
        warnings = converted.report.warnings.len(),
        "converted pdf upload"
    );
    Ok(converted)
}

pub async fn convert_spreadsheet_upload(
    scratch: &ScratchDir,
    upload: &Upload,
) -> Result<Converted<RenderedReport>, ApiError> {
    if !has_extension(&upload.file_name, SPREADSHEET_EXTENSIONS) {
        return Err(ApiError::BadRequest(
            "File must be an Excel file (.xlsx or .xls)".to_string(),
        ));
    }

    let converted =
        run_in_scratch(scratch, upload, "pdf", "Error converting Excel", excel_to_pdf).await?;

    info!(
        file = %upload.file_name,
        input_bytes = upload.bytes.len(),
        output_bytes = converted.bytes.len(),
        pages = converted.report.page_count,
        rows = converted.report.row_count,
        "converted spreadsheet upload"
    );
    Ok(converted)
}

/// Pulls the `file` part out of a multipart body; other parts are skipped.
pub async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        return Ok(Upload { file_name, bytes });
    }

    Err(ApiError::BadRequest("No file uploaded".to_string()))
}

/// `attachment` disposition with an ASCII fallback name plus the exact
/// UTF-8 name in RFC 5987 form.
pub fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|ch| match ch {
            '"' | '\\' => '_',
            ch if ch.is_ascii_graphic() || ch == ' ' => ch,
            _ => '_',
        })
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(file_name)
    )
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, mpsc};
    use std::time::Duration;

    use axum::body::Bytes;
    use pdf_excel_core::ExtractOptions;
    use tempfile::tempdir;
    use tokio::sync::oneshot;

    use super::{
        Upload, content_disposition, convert_pdf_upload, convert_spreadsheet_upload,
        run_in_scratch,
    };
    use crate::scratch::ScratchDir;

    fn upload(name: &str, bytes: &'static [u8]) -> Upload {
        Upload {
            file_name: name.to_string(),
            bytes: Bytes::from_static(bytes),
        }
    }

    #[test]
    fn download_name_replaces_extension_and_drops_directories() {
        assert_eq!(upload("dir/Report.PDF", b"").download_name("xlsx"), "Report.xlsx");
        assert_eq!(upload("sales.q1.xls", b"").download_name("pdf"), "sales.q1.pdf");
    }

    #[test]
    fn content_disposition_keeps_utf8_name_and_ascii_fallback() {
        assert_eq!(
            content_disposition("report.xlsx"),
            "attachment; filename=\"report.xlsx\"; filename*=UTF-8''report.xlsx"
        );
        assert_eq!(
            content_disposition("報表 \"1\".pdf"),
            "attachment; filename=\"__ _1_.pdf\"; filename*=UTF-8''%E5%A0%B1%E8%A1%A8%20%221%22.pdf"
        );
    }

    #[tokio::test]
    async fn wrong_extension_is_rejected_before_any_file_io() {
        let dir = tempdir().expect("tempdir should be created");
        let scratch = ScratchDir::new(dir.path()).expect("scratch dir");

        let options = ExtractOptions::default();
        let error = convert_pdf_upload(&scratch, &upload("notes.txt", b"hi"), &options)
            .await
            .expect_err("txt is not a pdf");
        assert_eq!(error.code(), "bad_request");

        let error = convert_spreadsheet_upload(&scratch, &upload("data.csv", b"a,b"))
            .await
            .expect_err("csv is not a workbook");
        assert_eq!(error.message(), "File must be an Excel file (.xlsx or .xls)");

        assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 0);
    }

    #[tokio::test]
    async fn failed_conversion_cleans_scratch_and_reports_processing_error() {
        let dir = tempdir().expect("tempdir should be created");
        let scratch = ScratchDir::new(dir.path()).expect("scratch dir");

        let error = convert_pdf_upload(
            &scratch,
            &upload("broken.pdf", b"definitely not a pdf"),
            &ExtractOptions::default(),
        )
        .await
        .expect_err("garbage must fail");
        assert_eq!(error.code(), "processing_error");
        assert!(error.message().starts_with("Error converting PDF: "));

        assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 0);
    }

    #[tokio::test]
    async fn abandoned_request_still_removes_late_output() {
        let dir = tempdir().expect("tempdir should be created");
        let scratch = Arc::new(ScratchDir::new(dir.path()).expect("scratch dir"));
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let request = tokio::spawn({
            let scratch = Arc::clone(&scratch);
            async move {
                let upload = upload("slow.pdf", b"%PDF-1.5");
                run_in_scratch(&scratch, &upload, "xlsx", "Error converting PDF", move |_, output| {
                    let _ = started_tx.send(());
                    let _ = release_rx.recv();
                    std::fs::write(output, b"late output")?;
                    Ok(())
                })
                .await
            }
        });

        started_rx.await.expect("conversion should start");
        request.abort();
        assert!(request.await.is_err(), "request future should be cancelled");
        release_tx.send(()).expect("converter still waiting");

        let mut empty = false;
        for _ in 0..100 {
            if std::fs::read_dir(dir.path()).expect("read dir").next().is_none() {
                empty = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(empty, "scratch files left behind after cancelled request");
    }
}
