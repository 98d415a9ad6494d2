use std::{
    collections::{BTreeMap, HashMap},
    str::FromStr,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

pub const VOIDED: &str = "Voided";
const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub company: String,
    pub contact: String,
    pub line1: String,
    pub line2: String,
    pub line3: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone_number: String,
    pub country: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomContent {
    pub description: String,
    pub quantity: String,
    pub value: String,
    pub weight: f32,
    pub weight_units: String,
    pub hs_tariff_number: String,
    pub country_of_origin: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Custom {
    #[serde(rename = "type")]
    pub kind: String,
    pub comments: String,
    pub invoice_number: String,
    pub contents: CustomContent,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: i64,
    pub name: String,
    pub width: f32,
    pub height: f32,
    pub length: f32,
    pub weight: f32,
    pub customs: Custom,
    pub dimension_units: String,
    pub weight_units: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub label_url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: i64,
    pub to: Address,
    pub from: Address,
    pub package: Package,
    pub carrier: String,
    pub service: String,
    pub status: String,
    pub tracking: Vec<String>,
    pub package_count: i64,
    pub created_at: i64,
    pub cost: i64,
    pub prepaid: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ShipmentList {
    pub results: Vec<Shipment>,
    pub cursor: String,
    pub previous_cursor: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub status: String,
    pub code: String,
    pub description: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub timestamp: i64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TrackingResult {
    pub status: String,
    pub code: String,
    pub description: String,
    pub history: Vec<TrackingEvent>,
    pub last_update: i64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TrackingResponse {
    pub results: Vec<TrackingResult>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

#[derive(Debug, Default)]
pub struct Store {
    last_id: i64,
    shipments: BTreeMap<i64, Shipment>,
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub cursor: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

#[derive(Deserialize)]
pub struct TrackQuery {
    pub tracking: Option<String>,
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/v1/shipments", get(list_shipments).post(create_shipment))
        .route("/v1/shipments/search", get(search_shipments))
        .route("/v1/shipments/{id}", get(get_shipment))
        .route("/v1/shipments/{id}/void", delete(void_shipment))
        .route("/v1/shipments/{id}/track", get(track_shipment))
        .route("/v1/track", get(track_reference))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

type FormFields = HashMap<String, String>;

fn text(form: &FormFields, key: &str) -> String {
    form.get(key).cloned().unwrap_or_default()
}

fn number<T: FromStr + Default>(form: &FormFields, key: &str) -> Result<T, StatusCode> {
    match form.get(key) {
        None => Ok(T::default()),
        Some(raw) => raw.parse().map_err(|_| StatusCode::UNPROCESSABLE_ENTITY),
    }
}

fn address(form: &FormFields, prefix: &str) -> Address {
    let field = |name: &str| text(form, &format!("{prefix}[{name}]"));
    Address {
        company: field("company"),
        contact: field("contact"),
        line1: field("line1"),
        line2: field("line2"),
        line3: field("line3"),
        city: field("city"),
        state: field("state"),
        zip_code: field("zip_code"),
        phone_number: field("phone_number"),
        country: field("country"),
    }
}

fn package(form: &FormFields) -> Result<Package, StatusCode> {
    let contents = "package[customs][contents]";
    Ok(Package {
        name: text(form, "package[name]"),
        width: number(form, "package[width]")?,
        height: number(form, "package[height]")?,
        length: number(form, "package[length]")?,
        weight: number(form, "package[weight]")?,
        customs: Custom {
            kind: text(form, "package[customs][type]"),
            comments: text(form, "package[customs][comments]"),
            invoice_number: text(form, "package[customs][invoice_number]"),
            contents: CustomContent {
                description: text(form, &format!("{contents}[description]")),
                quantity: text(form, &format!("{contents}[quantity]")),
                value: text(form, &format!("{contents}[value]")),
                weight: number(form, &format!("{contents}[weight]"))?,
                weight_units: text(form, &format!("{contents}[weight_units]")),
                hs_tariff_number: text(form, &format!("{contents}[hs_tariff_number]")),
                country_of_origin: text(form, &format!("{contents}[country_of_origin]")),
            },
        },
        dimension_units: "IN".to_string(),
        weight_units: "LB".to_string(),
        kind: "CUSTOM".to_string(),
        ..Package::default()
    })
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

fn tracking_number() -> String {
    let raw = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("1Z{}", &raw[..16])
}

/// Offset-based page of `items`; cursors are stringified offsets.
fn page(
    items: Vec<Shipment>,
    limit: Option<usize>,
    cursor: Option<&str>,
) -> Result<ShipmentList, StatusCode> {
    let offset = match cursor {
        None | Some("") => 0,
        Some(raw) => raw.parse::<usize>().map_err(|_| StatusCode::BAD_REQUEST)?,
    };
    let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_PAGE_SIZE);
    let total = items.len();
    let results: Vec<Shipment> = items.into_iter().skip(offset).take(limit).collect();
    let end = offset + results.len();
    Ok(ShipmentList {
        results,
        cursor: if end < total { end.to_string() } else { String::new() },
        previous_cursor: if offset > 0 {
            offset.saturating_sub(limit).to_string()
        } else {
            String::new()
        },
    })
}

async fn create_shipment(
    State(db): State<Db>,
    Form(form): Form<FormFields>,
) -> Result<(StatusCode, Json<Shipment>), StatusCode> {
    let carrier = text(&form, "carrier");
    let service = text(&form, "service");
    if carrier.is_empty() || service.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let mut package = package(&form)?;
    let package_count: i64 = number(&form, "package_count")?;
    let created_at: i64 = number(&form, "created_at")?;

    let mut store = db.write().await;
    store.last_id += 1;
    let id = store.last_id;
    package.id = id;
    package.label_url = format!("http://labels.postmaster.test/{id}.pdf");
    let cost = 500 + (package.weight * 100.0) as i64;

    let shipment = Shipment {
        id,
        to: address(&form, "to"),
        from: address(&form, "from"),
        package,
        carrier,
        service,
        status: "Processing".to_string(),
        tracking: vec![tracking_number()],
        package_count: package_count.max(1),
        created_at: if created_at == 0 { now() } else { created_at },
        cost,
        prepaid: false,
    };
    info!(id, carrier = %shipment.carrier, "stored shipment");
    store.shipments.insert(id, shipment.clone());
    Ok((StatusCode::CREATED, Json(shipment)))
}

async fn list_shipments(
    State(db): State<Db>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ShipmentList>, StatusCode> {
    let store = db.read().await;
    let status = query.status.unwrap_or_default();
    let matching = store
        .shipments
        .values()
        .filter(|s| status.is_empty() || s.status.eq_ignore_ascii_case(&status))
        .cloned()
        .collect();
    page(matching, query.limit, query.cursor.as_deref()).map(Json)
}

async fn search_shipments(
    State(db): State<Db>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ShipmentList>, StatusCode> {
    let needle = match query.q.as_deref() {
        Some(q) if !q.is_empty() => q.to_lowercase(),
        _ => return Err(StatusCode::BAD_REQUEST),
    };
    let store = db.read().await;
    let matching = store
        .shipments
        .values()
        .filter(|s| {
            [&s.carrier, &s.service, &s.to.contact, &s.to.company, &s.to.city]
                .into_iter()
                .chain(s.tracking.iter())
                .any(|field| field.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect();
    page(matching, query.limit, query.cursor.as_deref()).map(Json)
}

async fn get_shipment(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Json<Shipment>, StatusCode> {
    let store = db.read().await;
    store.shipments.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn void_shipment(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Json<Message>, StatusCode> {
    let mut store = db.write().await;
    let shipment = store.shipments.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    let message = if shipment.status == VOIDED {
        "Shipment already voided"
    } else {
        shipment.status = VOIDED.to_string();
        info!(id, "voided shipment");
        "OK"
    };
    Ok(Json(Message {
        message: message.to_string(),
    }))
}

fn tracking_for(shipment: &Shipment) -> TrackingResponse {
    let created = TrackingEvent {
        status: "Processing".to_string(),
        code: "LC".to_string(),
        description: "Shipping label created".to_string(),
        city: shipment.from.city.clone(),
        state: shipment.from.state.clone(),
        country: shipment.from.country.clone(),
        timestamp: shipment.created_at,
    };
    TrackingResponse {
        results: vec![TrackingResult {
            status: shipment.status.clone(),
            code: created.code.clone(),
            description: created.description.clone(),
            last_update: created.timestamp,
            history: vec![created],
        }],
    }
}

async fn track_shipment(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Json<TrackingResponse>, StatusCode> {
    let store = db.read().await;
    let shipment = store.shipments.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(tracking_for(shipment)))
}

async fn track_reference(
    State(db): State<Db>,
    Query(query): Query<TrackQuery>,
) -> Result<Json<TrackingResponse>, StatusCode> {
    let number = query
        .tracking
        .filter(|t| !t.is_empty())
        .ok_or(StatusCode::BAD_REQUEST)?;
    let store = db.read().await;
    store
        .shipments
        .values()
        .find(|s| s.tracking.contains(&number))
        .map(|s| Json(tracking_for(s)))
        .ok_or(StatusCode::NOT_FOUND)
}
