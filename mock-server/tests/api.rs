use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, Message, Shipment, ShipmentList, TrackingResponse};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn form_request(uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body.to_string())
        .unwrap()
}

fn request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

const SHIPMENT_FORM: &str = "carrier=ups&service=2DAY&to[contact]=Joe+Smith&to[city]=Austin\
    &package[weight]=1.5&package[customs][contents][description]=Gift";

async fn create(app: &Router) -> Shipment {
    let resp = app
        .clone()
        .oneshot(form_request("/v1/shipments", SHIPMENT_FORM))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
}

// --- list ---

#[tokio::test]
async fn list_shipments_empty() {
    let resp = app().oneshot(request("GET", "/v1/shipments")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let list: ShipmentList = body_json(resp).await;
    assert!(list.results.is_empty());
    assert!(list.cursor.is_empty());
}

// --- create ---

#[tokio::test]
async fn create_shipment_returns_201() {
    let app = app();
    let shipment = create(&app).await;

    assert_eq!(shipment.id, 1);
    assert_eq!(shipment.carrier, "ups");
    assert_eq!(shipment.status, "Processing");
    assert_eq!(shipment.to.contact, "Joe Smith");
    assert_eq!(shipment.package.weight, 1.5);
    assert_eq!(shipment.package.customs.contents.description, "Gift");
    assert_eq!(shipment.tracking.len(), 1);
    assert!(shipment.created_at > 0);
}

#[tokio::test]
async fn create_shipment_assigns_sequential_ids() {
    let app = app();
    assert_eq!(create(&app).await.id, 1);
    assert_eq!(create(&app).await.id, 2);
}

#[tokio::test]
async fn create_shipment_without_carrier_returns_400() {
    let resp = app()
        .oneshot(form_request("/v1/shipments", "service=2DAY"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_shipment_with_bad_number_returns_422() {
    let resp = app()
        .oneshot(form_request(
            "/v1/shipments",
            "carrier=ups&service=2DAY&package[weight]=heavy",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- get ---

#[tokio::test]
async fn get_shipment_not_found() {
    let resp = app().oneshot(request("GET", "/v1/shipments/42")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_shipment_bad_id_returns_400() {
    let resp = app()
        .oneshot(request("GET", "/v1/shipments/not-a-number"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- search ---

#[tokio::test]
async fn search_without_query_returns_400() {
    let resp = app()
        .oneshot(request("GET", "/v1/shipments/search"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_matches_recipient() {
    let app = app();
    create(&app).await;

    let resp = app
        .clone()
        .oneshot(request("GET", "/v1/shipments/search?q=joe"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let list: ShipmentList = body_json(resp).await;
    assert_eq!(list.results.len(), 1);

    let resp = app
        .oneshot(request("GET", "/v1/shipments/search?q=nobody"))
        .await
        .unwrap();
    let list: ShipmentList = body_json(resp).await;
    assert!(list.results.is_empty());
}

// --- void / track ---

#[tokio::test]
async fn void_twice_reports_already_voided() {
    let app = app();
    let shipment = create(&app).await;
    let uri = format!("/v1/shipments/{}/void", shipment.id);

    let resp = app.clone().oneshot(request("DELETE", &uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let message: Message = body_json(resp).await;
    assert_eq!(message.message, "OK");

    let resp = app.clone().oneshot(request("DELETE", &uri)).await.unwrap();
    let message: Message = body_json(resp).await;
    assert_eq!(message.message, "Shipment already voided");

    let resp = app
        .oneshot(request("GET", "/v1/shipments?status=voided"))
        .await
        .unwrap();
    let list: ShipmentList = body_json(resp).await;
    assert_eq!(list.results.len(), 1);
}

#[tokio::test]
async fn void_unknown_shipment_returns_404() {
    let resp = app()
        .oneshot(request("DELETE", "/v1/shipments/9/void"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn track_by_id_and_by_reference_agree() {
    let app = app();
    let shipment = create(&app).await;

    let resp = app
        .clone()
        .oneshot(request("GET", &format!("/v1/shipments/{}/track", shipment.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let by_id: TrackingResponse = body_json(resp).await;
    assert_eq!(by_id.results[0].status, "Processing");
    assert_eq!(by_id.results[0].history.len(), 1);

    let resp = app
        .clone()
        .oneshot(request("GET", &format!("/v1/track?tracking={}", shipment.tracking[0])))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let by_ref: TrackingResponse = body_json(resp).await;
    assert_eq!(by_ref.results[0].description, by_id.results[0].description);

    let resp = app
        .oneshot(request("GET", "/v1/track?tracking=UNKNOWN"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- paging ---

#[tokio::test]
async fn list_pages_with_cursor() {
    let app = app();
    for _ in 0..3 {
        create(&app).await;
    }

    let resp = app
        .clone()
        .oneshot(request("GET", "/v1/shipments?limit=2"))
        .await
        .unwrap();
    let first: ShipmentList = body_json(resp).await;
    assert_eq!(first.results.len(), 2);
    assert_eq!(first.cursor, "2");

    let resp = app
        .oneshot(request("GET", &format!("/v1/shipments?limit=2&cursor={}", first.cursor)))
        .await
        .unwrap();
    let second: ShipmentList = body_json(resp).await;
    assert_eq!(second.results.len(), 1);
    assert_eq!(second.results[0].id, 3);
    assert!(second.cursor.is_empty());
}
