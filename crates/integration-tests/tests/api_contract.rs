//! The router wired to real adapters: HTTP directory, in-memory ledger,
//! assets on disk, QR encoder and PDF renderer.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use api_adapters::{router, AppState, Metrics};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use domains::AssetStore;
use serde_json::{json, Value};
use services::{BadgeService, BadgeSettings, PassDirectoryCache, PickupLedger, ResolutionService};
use storage_adapters::{HttpPassDirectory, LocalAssetStore, MemoryPickupStore, PdfRenderer, QrCodeEncoder};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

fn directory_body() -> Value {
    json!({
        "passes": [
            {
                "id": "42",
                "person": { "name": "Jane Doe", "email": "jane@example.org" },
                "pass_bucket": { "name": "TFM Badge" },
                "uses": ["42-u1"]
            }
        ]
    })
}

/// Asset root with a preview for TFF only and no template documents.
fn asset_root(test: &str) -> PathBuf {
    let root = std::env::temp_dir().join(format!("badge-desk-{test}-{}", std::process::id()));
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join("template_TFF.png"), PNG_MAGIC).unwrap();
    root
}

struct Desk {
    app: Router,
    _upstream: MockServer,
}

async fn desk(test: &str, upstream_status: u16) -> Desk {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/passes"))
        .respond_with(ResponseTemplate::new(upstream_status).set_body_json(directory_body()))
        .mount(&upstream)
        .await;

    let source = HttpPassDirectory::new(format!("{}/passes", upstream.uri()), Duration::from_secs(5)).unwrap();
    let directory = Arc::new(PassDirectoryCache::new(Arc::new(source)));
    let assets: Arc<dyn AssetStore> = Arc::new(LocalAssetStore::new(asset_root(test)));

    let state = AppState {
        resolution: Arc::new(ResolutionService::new(Arc::clone(&directory), true)),
        directory,
        ledger: Arc::new(PickupLedger::new(Arc::new(MemoryPickupStore::new()))),
        badges: Arc::new(BadgeService::new(
            Arc::clone(&assets),
            Arc::new(QrCodeEncoder::new()),
            Arc::new(PdfRenderer::new()),
            BadgeSettings::default(),
        )),
        assets,
        metrics: Arc::new(Metrics::new()),
    };

    Desk {
        app: router(state),
        _upstream: upstream,
    }
}

impl Desk {
    async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn scan_pick_up_and_print() {
    let desk = desk("flow", 200).await;

    // Scan the use ticket.
    let response = desk.send(post_json("/api/verify-qr", json!({ "qrCode": " 42-u1 " }))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let verify = json_body(response).await;
    assert_eq!(verify["isUseRecord"], true);
    assert_eq!(verify["mainRecordId"], "42");
    assert_eq!(verify["scannedId"], "42-u1");
    assert_eq!(verify["pass"]["templateCode"], "TFM");

    // Hand the badge out, twice.
    let first = json_body(
        desk.send(post_json("/api/pickups", json!({ "id": 42, "holderName": "Jane Doe" })))
            .await,
    )
    .await;
    assert_eq!(first["alreadyPickedUp"], false);
    assert_eq!(first["pickup"]["id"], "42");
    assert_eq!(first["pickup"]["name"], "Jane Doe");

    let second = json_body(desk.send(post_json("/api/pickups", json!({ "id": "42" }))).await).await;
    assert_eq!(second["alreadyPickedUp"], true);
    assert_eq!(second["message"], "Badge already picked up");
    assert_eq!(second["pickup"], first["pickup"]);

    let status = json_body(desk.send(get("/api/pickups/42")).await).await;
    assert_eq!(status["pickedUp"], true);
    let all = json_body(desk.send(get("/api/pickups")).await).await;
    assert_eq!(all["pickups"].as_array().unwrap().len(), 1);

    // Print it; both flags default on.
    let response = desk
        .send(post_json(
            "/api/badges",
            json!({ "holderName": "Jane Doe", "id": "42", "templateCode": "TFM" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"badge_Jane_Doe.pdf\"; filename*=UTF-8''badge_Jane_Doe.pdf"
    );
    let pdf = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(pdf.starts_with(b"%PDF-"));

    let doc = lopdf::Document::load_mem(&pdf).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();
    let media_box: Vec<f32> = doc
        .get_dictionary(page_id)
        .and_then(|p| p.get(b"MediaBox"))
        .and_then(lopdf::Object::as_array)
        .unwrap()
        .iter()
        .map(|v| v.as_float().unwrap())
        .collect();
    assert!((media_box[2] - 595.28).abs() < 1e-3);
    assert!((media_box[3] - 841.89).abs() < 1e-3);
}

#[tokio::test]
async fn missing_template_artwork_is_a_server_error() {
    let desk = desk("artwork", 200).await;

    let response = desk
        .send(post_json(
            "/api/badges",
            json!({
                "holderName": "Jane Doe",
                "id": "42",
                "templateCode": "TFFM",
                "useBlankBackground": false
            }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "TEMPLATE_LOAD_ERROR");
    // The asset path stays in the logs.
    assert!(!body["error"]["message"].as_str().unwrap().contains("template_TFFM.pdf"));
}

#[tokio::test]
async fn previews_come_from_the_asset_root() {
    let desk = desk("preview", 200).await;

    let response = desk.send(get("/api/templates/tff/preview")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], PNG_MAGIC);

    let response = desk.send(get("/api/templates/TFM/preview")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upstream_outage_surfaces_as_bad_gateway() {
    let desk = desk("outage", 500).await;

    let response = desk.send(post_json("/api/verify-qr", json!({ "qrCode": "42" }))).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(response).await["error"]["code"], "DIRECTORY_UNAVAILABLE");

    let response = desk.send(Request::post("/api/passes/refresh").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    // The ledger does not depend on the directory.
    let response = desk.send(post_json("/api/pickups", json!({ "id": "42" }))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn metrics_count_real_traffic() {
    let desk = desk("metrics", 200).await;

    desk.send(post_json("/api/verify-qr", json!({ "qrCode": "nope" }))).await;
    desk.send(post_json("/api/pickups", json!({ "id": "1" }))).await;

    let response = desk.send(get("/metrics")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let text = String::from_utf8(to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()).unwrap();
    assert!(text.contains("outcome=\"not_found\""), "{text}");
    assert!(text.contains("outcome=\"appended\""), "{text}");
}
