//! Integration tests against a real headless Chrome
#![cfg(feature = "cdp")]

use image::{Rgba, RgbaImage};
use linkpage::capture::{capture_preview, CaptureConfig, PageSource};
use linkpage::site::{self, SiteConfig};
use linkpage::{Engine, EngineConfig, Viewport};
use std::fs;
use std::path::PathBuf;
use std::sync::Once;
use std::time::Duration;
use tiny_http::{Response, Server};

static INIT: Once = Once::new();

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("linkpage-chrome-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

/// Serve the default rendered site
fn start_test_server() -> String {
    INIT.call_once(|| {
        let dir = scratch_dir("served");
        let html = site::build(&SiteConfig::default(), &dir)
            .expect("build site")
            .html;

        std::thread::spawn(move || {
            let server = Server::http("127.0.0.1:18090").unwrap();
            for request in server.incoming_requests() {
                let response = match request.url() {
                    "/" | "/index.html" => Response::from_string(html.clone()).with_header(
                        "Content-Type: text/html; charset=utf-8"
                            .parse::<tiny_http::Header>()
                            .unwrap(),
                    ),
                    _ => Response::from_string("Not Found").with_status_code(404),
                };
                let _ = request.respond(response);
            }
        });
        // Give the server time to start
        std::thread::sleep(Duration::from_millis(100));
    });

    "http://127.0.0.1:18090/".to_string()
}

#[test]
#[ignore] // Requires Chrome to be installed
fn served_page_signals_ready() {
    let base_url = start_test_server();
    let mut engine = linkpage::new_engine(EngineConfig::default()).expect("Failed to create engine");
    engine.load_url(&base_url).expect("Failed to load URL");

    engine
        .wait_for_selector("html[data-linktree-ready]", Duration::from_secs(10))
        .expect("runtime never became ready");

    let res = engine
        .evaluate_script_in_page("document.querySelectorAll('.link-card').length")
        .expect("evaluate");
    assert!(!res.is_error);
    assert_eq!(res.value, SiteConfig::default().cards.len().to_string());

    engine.close().unwrap();
}

#[test]
#[ignore] // Requires Chrome to be installed
fn capture_served_page() {
    let base_url = start_test_server();
    let dir = scratch_dir("served-capture");
    let cfg = CaptureConfig {
        page: PageSource::Url(base_url),
        output: dir.join("preview.png"),
        ..Default::default()
    };

    let report = capture_preview(&cfg).expect("capture");
    let img = image::open(&report.output).expect("decode preview");
    assert_eq!((img.width(), img.height()), (1200, 630));
}

#[test]
#[ignore] // Requires Chrome to be installed
fn capture_file_with_background_override() {
    let dir = scratch_dir("file-capture");
    let built = site::build(&SiteConfig::default(), &dir).expect("build site");
    let page = dir.join("index.html");
    fs::write(&page, &built.html).expect("write page");

    let background = dir.join("override.png");
    RgbaImage::from_pixel(320, 200, Rgba([255, 0, 0, 255]))
        .save(&background)
        .expect("write background");

    let cfg = CaptureConfig {
        page: PageSource::File(page),
        output: dir.join("preview.png"),
        background: Some(background),
        ..Default::default()
    };

    let report = capture_preview(&cfg).expect("capture");
    let theme = report.theme.expect("override theme");
    assert_eq!(theme.primary.css(), "hsl(0, 64%, 58%)");

    let img = image::open(&report.output).expect("decode preview").to_rgba8();
    assert_eq!(img.dimensions(), (1200, 630));
    // The red background shows through at the corners
    let corner = img.get_pixel(2, 2);
    assert!(corner[0] > corner[2], "expected a red-dominant corner, got {:?}", corner);
}

#[test]
#[ignore] // Requires Chrome to be installed
fn small_viewport_is_respected() {
    let base_url = start_test_server();
    let dir = scratch_dir("small");
    let cfg = CaptureConfig {
        page: PageSource::Url(base_url),
        output: dir.join("small.png"),
        viewport: Viewport { width: 600, height: 315 },
        ..Default::default()
    };

    let report = capture_preview(&cfg).expect("capture");
    assert_eq!((report.width, report.height), (600, 315));
    let img = image::open(&report.output).expect("decode preview");
    assert_eq!((img.width(), img.height()), (600, 315));
}

#[test]
#[ignore] // Requires Chrome to be installed
fn runtime_tab_order_matches_focus_ring() {
    let base_url = start_test_server();
    let controller = site::build(&SiteConfig::default(), &scratch_dir("ring"))
        .expect("build site")
        .controller;
    let ring = controller.focus_ring();

    let mut engine = linkpage::new_engine(EngineConfig::default()).expect("Failed to create engine");
    engine.load_url(&base_url).expect("Failed to load URL");
    engine
        .wait_for_selector("html[data-linktree-ready]", Duration::from_secs(10))
        .expect("runtime never became ready");

    // None stands for focus outside the ring
    let starts = std::iter::once(None).chain(ring.as_slice().iter().map(Some));
    for start in starts {
        for backward in [false, true] {
            let start_index = start.and_then(|f| ring.position(f));
            let expected = controller
                .tab_pressed(start, backward)
                .and_then(|f| ring.position(f))
                .map(|i| i as i64)
                .unwrap_or_else(|| start_index.map_or(-1, |i| i as i64));

            let script = format!(
                r#"(function(){{
                    var ring = Array.prototype.slice.call(document.querySelectorAll({selector:?}));
                    if (document.activeElement && document.activeElement.blur) document.activeElement.blur();
                    var start = {start};
                    if (start >= 0) ring[start].focus();
                    document.dispatchEvent(new KeyboardEvent('keydown', {{ key: 'Tab', shiftKey: {backward}, bubbles: true }}));
                    return ring.indexOf(document.activeElement);
                }})()"#,
                selector = linkpage::page::focus::FOCUSABLE_SELECTOR,
                start = start_index.map_or(-1, |i| i as i64),
                backward = backward,
            );
            let res = engine.evaluate_script_in_page(&script).expect("evaluate");
            assert_eq!(
                res.value,
                expected.to_string(),
                "Tab from {:?} (backward: {})",
                start,
                backward
            );
        }
    }

    engine.close().unwrap();
}
