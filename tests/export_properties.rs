//! End-to-end behaviour of the three export operations

use std::sync::Arc;

use elemshot::platform::download::pending_files;
use elemshot::platform::{PlatformCall, RecordingPlatform};
use elemshot::{
    Bitmap, BoxRasterizer, Delivery, DesktopPlatform, Document, Element, Error, ExportConfig, Exporter,
    ImageFormat, Rasterizer,
};

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Report</title><style>body { margin: 0 }</style></head>
<body>
<div id="chart" style="width: 320px; padding: 8px; background: #fafafa; border: 1px solid #333">
  <h1>Quarterly numbers</h1>
  <p>Revenue grew in every region.</p>
  <img src="bars.png" width="200" height="80" alt="bars">
</div>
</body>
</html>"#;

fn chart() -> Element {
    Document::from_html(PAGE).element("#chart").expect("chart element")
}

fn recording_exporter(platform: Arc<RecordingPlatform>) -> Exporter {
    Exporter::new(ExportConfig::default(), Arc::new(BoxRasterizer::new()), platform).unwrap()
}

/// Returns a bitmap of a fixed size whatever the element looks like
struct FixedRasterizer {
    width: u32,
    height: u32,
}

impl Rasterizer for FixedRasterizer {
    fn rasterize(&self, _element: &Element, _config: &ExportConfig) -> elemshot::Result<Bitmap> {
        Ok(Bitmap::new(self.width, self.height, [30, 60, 90, 255]))
    }
}

fn media_box(pdf: &[u8]) -> [f64; 4] {
    let text = String::from_utf8_lossy(pdf);
    let start = text.find("/MediaBox [").expect("media box") + "/MediaBox [".len();
    let end = start + text[start..].find(']').unwrap();
    let nums: Vec<f64> = text[start..end]
        .split_whitespace()
        .map(|n| n.parse().unwrap())
        .collect();
    [nums[0], nums[1], nums[2], nums[3]]
}

#[tokio::test]
async fn png_without_filename_is_named_image_png() {
    let platform = Arc::new(RecordingPlatform::new());
    let delivery = recording_exporter(platform.clone())
        .download_as_image(&chart(), None, Some(ImageFormat::Png))
        .await
        .unwrap();
    assert_eq!(delivery, Delivery::Saved { path: "image.png".into() });

    let calls = platform.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        PlatformCall::Download { filename, bytes } => {
            assert_eq!(filename, "image.png");
            let decoded = image::load_from_memory(bytes).unwrap();
            assert_eq!(decoded.width(), 320 + 2 * (8 + 1));
        }
        other => panic!("unexpected call {:?}", other),
    }
}

#[tokio::test]
async fn jpg_is_named_image_jpg_and_tagged_jpg() {
    let platform = Arc::new(RecordingPlatform::new());
    recording_exporter(platform.clone())
        .download_as_image(&chart(), None, Some(ImageFormat::Jpeg))
        .await
        .unwrap();

    match &platform.calls()[..] {
        [PlatformCall::Download { filename, bytes }] => {
            assert_eq!(filename, "image.jpg");
            assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF]);
        }
        other => panic!("unexpected calls {:?}", other),
    }

    let bitmap = BoxRasterizer::new().rasterize(&chart(), &ExportConfig::default()).unwrap();
    let encoded = elemshot::encode::encode(&bitmap, ImageFormat::Jpeg, &ExportConfig::default()).unwrap();
    assert_eq!(encoded.tag(), "jpg");
}

#[tokio::test]
async fn pdf_page_height_follows_aspect_ratio() {
    let cases = [(100, 50), (640, 480), (1, 4000), (4000, 1), (3, 7)];
    for (w, h) in cases {
        let platform = Arc::new(RecordingPlatform::new());
        let config = ExportConfig::default();
        let page_width = config.pdf_page_width_pt as f64;
        let exporter = Exporter::new(
            config,
            Arc::new(FixedRasterizer { width: w, height: h }),
            platform.clone(),
        )
        .unwrap();

        let delivery = exporter.download_as_pdf(&chart(), Some("report")).await.unwrap();
        assert_eq!(delivery, Delivery::Saved { path: "report.pdf".into() });

        let bytes = match &platform.calls()[..] {
            [PlatformCall::Download { filename, bytes }] => {
                assert_eq!(filename, "report.pdf");
                bytes.clone()
            }
            other => panic!("unexpected calls {:?}", other),
        };
        let [x0, y0, x1, y1] = media_box(&bytes);
        assert_eq!((x0, y0), (0.0, 0.0));
        let expected = page_width * h as f64 / w as f64;
        assert!((x1 - page_width).abs() < 1e-3, "width {} for {}x{}", x1, w, h);
        assert!(
            (y1 - expected).abs() <= expected * 1e-4,
            "height {} expected {} for {}x{}",
            y1,
            expected,
            w,
            h
        );
    }
}

#[tokio::test]
async fn clipboard_gets_exactly_one_png_payload() {
    let platform = Arc::new(RecordingPlatform::new());
    let element = chart();
    let source_before = element.document_source().to_string();

    let delivery = recording_exporter(platform.clone()).copy_to_clipboard(&element).await.unwrap();
    assert!(matches!(delivery, Delivery::Clipboard { .. }));

    let calls = platform.calls();
    assert_eq!(calls.len(), 1, "no downloads or viewers: {:?}", calls);
    match &calls[0] {
        PlatformCall::Clipboard(payload) => {
            assert_eq!(payload.mime_type, "image/png");
            assert!(payload.data.starts_with(b"\x89PNG\r\n\x1a\n"));
            let rgba = payload.to_rgba().unwrap();
            assert_eq!((rgba.width(), rgba.height()), (payload.width, payload.height));
        }
        other => panic!("unexpected call {:?}", other),
    }
    assert_eq!(element.document_source(), source_before);
}

#[tokio::test]
async fn download_leaves_no_pending_file_behind() {
    let dir = tempfile::tempdir().unwrap();
    let config = ExportConfig { download_dir: Some(dir.path().to_path_buf()), ..Default::default() };
    let exporter = Exporter::desktop(config).unwrap();

    assert!(pending_files(dir.path()).unwrap().is_empty());
    let delivery = exporter.download_as_image(&chart(), Some("chart"), None).await.unwrap();
    assert!(pending_files(dir.path()).unwrap().is_empty());

    let expected = dir.path().join("chart.png");
    assert_eq!(delivery, Delivery::Saved { path: expected.clone() });
    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
    assert!(expected.is_file());
}

#[tokio::test]
async fn pdf_lands_in_download_dir() {
    let dir = tempfile::tempdir().unwrap();
    let platform = Arc::new(DesktopPlatform::new(Some(dir.path().to_path_buf())));
    let exporter = Exporter::new(ExportConfig::default(), Arc::new(BoxRasterizer::new()), platform).unwrap();

    exporter.download_as_pdf(&chart(), None).await.unwrap();
    let bytes = std::fs::read(dir.path().join("image.pdf")).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    assert!(pending_files(dir.path()).unwrap().is_empty());
}

#[tokio::test]
async fn filenames_cannot_escape_download_dir() {
    let platform = Arc::new(RecordingPlatform::new());
    recording_exporter(platform.clone())
        .download_as_image(&chart(), Some("../../secret"), None)
        .await
        .unwrap();
    assert!(matches!(
        &platform.calls()[..],
        [PlatformCall::Download { filename, .. }] if filename == "secret.png"
    ));
}

#[test]
fn missing_element_fails_instead_of_exporting_nothing() {
    let doc = Document::from_html(PAGE);
    assert!(matches!(doc.element("#not-there"), Err(Error::ElementNotFound { .. })));
    assert!(matches!(doc.element(""), Err(Error::InvalidSelector(_))));
}

#[tokio::test]
async fn concurrent_exports_are_independent() {
    let platform = Arc::new(RecordingPlatform::new());
    let exporter = recording_exporter(platform.clone());
    let el = chart();

    let (a, b, c) = tokio::join!(
        exporter.download_as_image(&el, Some("a"), None),
        exporter.download_as_image(&el, Some("b"), Some(ImageFormat::Jpeg)),
        exporter.copy_to_clipboard(&el),
    );
    a.unwrap();
    b.unwrap();
    c.unwrap();

    let mut names: Vec<String> = platform
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            PlatformCall::Download { filename, .. } => Some(filename),
            _ => None,
        })
        .collect();
    names.sort();
    assert_eq!(names, vec!["a.png".to_string(), "b.jpg".to_string()]);
    assert_eq!(platform.calls().len(), 3);
}

#[tokio::test]
async fn oversized_element_is_a_render_error() {
    let doc = Document::from_html(
        r#"<div id="c" style="width: 4294967295px; height: 10px; padding: 1px">wide</div>"#,
    );
    let el = doc.element("#c").unwrap();
    let platform = Arc::new(RecordingPlatform::new());

    let err = recording_exporter(platform.clone())
        .download_as_image(&el, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RenderError(_)), "got {:?}", err);
    assert!(platform.calls().is_empty());
}
