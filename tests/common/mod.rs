//! Shared fixtures for the integration tests.
//!
//! `spawn_backend()` starts an in-process actix-web server that plays the
//! CURREX backend (auth, rates, telegram relay, webchat) and the Gemini
//! endpoint, recording what it receives in `FakeBackend`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use serde_json::{Value, json};

use currex::{AppState, Config, RateStore};

pub const PASSWORD: &str = "hunter2";
pub const ACCESS_TOKEN: &str = "access-1";
pub const REFRESH_TOKEN: &str = "refresh-1";
pub const FRESH_TOKEN: &str = "fresh";
pub const ADMIN_KEY: &str = "test-admin-key";
pub const GEMINI_KEY: &str = "good-key";

pub const SAMPLE_TEXT: &str = "16-Oct-2025

Bank Transfer

Selling (အရောင်း)
မြန်မာငွေ10သိန်းအထက် 800

မြန်မာငွေ10သိန်းအောက် 797

100-500အထက်-802/803

Buying (အဝယ်) 820

10သိန်းအထက်817

ငွေဈေးအတက်ကျရှိပါသဖြင့် ငွေလွှဲခါနီးစျေးမေးပေးပါ";

#[derive(Default)]
pub struct FakeBackend {
    pub refresh_calls: AtomicUsize,
    pub protected_calls: AtomicUsize,
    /// Refresh requests are rejected when set.
    pub refresh_broken: Mutex<bool>,
    /// `/fx/latest` answers 500 when set.
    pub latest_broken: Mutex<bool>,
    /// `/admin/fx/parse` answers 500 when set.
    pub save_broken: Mutex<bool>,
    pub latest: Mutex<Option<Value>>,
    pub history: Mutex<Vec<Value>>,
    pub history_keys: Mutex<Vec<Option<String>>>,
    pub saved: Mutex<Vec<(Value, Option<String>, Option<String>)>>,
    pub telegram: Mutex<Vec<Value>>,
    pub chat_sent: Mutex<Vec<Value>>,
}

impl FakeBackend {
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn protected_calls(&self) -> usize {
        self.protected_calls.load(Ordering::SeqCst)
    }
}

/// Starts the fake backend on an ephemeral port and returns its base url.
pub fn spawn_backend() -> (String, web::Data<FakeBackend>) {
    let data = web::Data::new(FakeBackend::default());
    let shared = data.clone();

    let server = HttpServer::new(move || App::new().app_data(shared.clone()).configure(routes))
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());

    (format!("http://{}", addr), data)
}

/// State wired against `base_url` for every upstream, with an in-memory store.
pub async fn test_state(base_url: &str, extra: &[(&str, &str)]) -> AppState {
    let config = test_config(base_url, extra);
    let store = RateStore::connect("sqlite::memory:").await.unwrap();
    AppState::build(&config, store).await.unwrap()
}

pub fn test_config(base_url: &str, extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("CURREX_API_BASE_URL".to_string(), base_url.to_string()),
        ("CURREX_RATES_API_URL".to_string(), base_url.to_string()),
        ("GEMINI_API_URL".to_string(), base_url.to_string()),
        ("GEMINI_MODEL".to_string(), "gemini-test".to_string()),
        ("CURREX_ADMIN_KEY".to_string(), ADMIN_KEY.to_string()),
    ]);
    for (key, value) in extra {
        vars.insert(key.to_string(), value.to_string());
    }
    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

pub fn backend_rate(created_at: &str, sell_below: f64) -> Value {
    json!({
        "id": created_at,
        "base": "THB",
        "quote": "MMK",
        "buyRate": null,
        "sellRate": null,
        "buyBelow1mPer100k": 820,
        "buyAbove1mPer100k": 817,
        "sellBelow1mPer100k": sell_below,
        "sellAbove1mPer100k": 800,
        "sellSpecial100to500": null,
        "paymentMethod": "Bank Transfer",
        "dateText": "16-Oct-2025",
        "sourceText": "Selling 800\nBuying 820",
        "createdAt": created_at,
        "parsedAt": created_at
    })
}

fn header(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/currex/admin/login", web::post().to(login))
        .route("/currex/admin/verify", web::post().to(verify))
        .route("/refresh", web::post().to(refresh))
        .route("/protected", web::get().to(protected))
        .route("/fx/latest", web::get().to(latest))
        .route("/admin/fx", web::get().to(history))
        .route("/admin/fx/parse", web::post().to(save))
        .route("/api/admin/telegram/send", web::post().to(telegram))
        .route("/api/webchat/session", web::post().to(chat_session))
        .service(
            web::resource("/api/webchat/messages")
                .route(web::get().to(chat_list))
                .route(web::post().to(chat_send)),
        )
        .route("/models/{call}", web::post().to(gemini));
}

async fn login(body: web::Json<Value>) -> HttpResponse {
    if body["password"] == PASSWORD {
        HttpResponse::Ok().json(json!({
            "success": true,
            "accessToken": ACCESS_TOKEN,
            "refreshToken": REFRESH_TOKEN,
            "expiresAt": "2025-10-17T12:00:00.000Z"
        }))
    } else {
        HttpResponse::Unauthorized().json(json!({ "error": "Invalid password" }))
    }
}

async fn verify(req: HttpRequest) -> HttpResponse {
    let auth = header(&req, "authorization").unwrap_or_default();
    let valid = auth == format!("Bearer {}", ACCESS_TOKEN) || auth == format!("Bearer {}", FRESH_TOKEN);
    HttpResponse::Ok().json(json!({ "valid": valid }))
}

async fn refresh(state: web::Data<FakeBackend>, body: web::Json<Value>) -> HttpResponse {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    if *state.refresh_broken.lock().unwrap() || body["refreshToken"] != REFRESH_TOKEN {
        return HttpResponse::Unauthorized().finish();
    }
    HttpResponse::Ok().json(json!({ "accessToken": FRESH_TOKEN }))
}

async fn protected(state: web::Data<FakeBackend>, req: HttpRequest) -> HttpResponse {
    state.protected_calls.fetch_add(1, Ordering::SeqCst);
    if header(&req, "authorization").as_deref() == Some("Bearer fresh") {
        HttpResponse::Ok().body("ok")
    } else {
        HttpResponse::Unauthorized().finish()
    }
}

async fn latest(state: web::Data<FakeBackend>) -> HttpResponse {
    if *state.latest_broken.lock().unwrap() {
        return HttpResponse::InternalServerError().finish();
    }
    match state.latest.lock().unwrap().clone() {
        Some(rate) => HttpResponse::Ok().json(rate),
        None => HttpResponse::NotFound().json(json!({ "error": "no rates" })),
    }
}

async fn history(state: web::Data<FakeBackend>, req: HttpRequest) -> HttpResponse {
    state
        .history_keys
        .lock()
        .unwrap()
        .push(header(&req, "x-currex-admin-key"));
    HttpResponse::Ok().json(state.history.lock().unwrap().clone())
}

async fn save(
    state: web::Data<FakeBackend>,
    req: HttpRequest,
    body: web::Json<Value>,
) -> HttpResponse {
    if *state.save_broken.lock().unwrap() {
        return HttpResponse::InternalServerError().finish();
    }
    state.saved.lock().unwrap().push((
        body.into_inner(),
        header(&req, "x-currex-admin-key"),
        header(&req, "authorization"),
    ));
    HttpResponse::Ok().json(json!({ "ok": true }))
}

async fn telegram(state: web::Data<FakeBackend>, req: HttpRequest, body: web::Json<Value>) -> HttpResponse {
    if header(&req, "x-currex-admin-key").as_deref() != Some(ADMIN_KEY) {
        return HttpResponse::Forbidden().finish();
    }
    state.telegram.lock().unwrap().push(body.into_inner());
    HttpResponse::Ok().json(json!({ "ok": true }))
}

async fn chat_session(body: web::Json<Value>) -> HttpResponse {
    match body["sessionKey"].as_str() {
        Some("no-key") => HttpResponse::Ok().json(json!({})),
        _ => HttpResponse::Ok().json(json!({ "sessionKey": "chat-1" })),
    }
}

async fn chat_list(query: web::Query<HashMap<String, String>>) -> HttpResponse {
    if query.get("sessionKey").map(String::as_str) != Some("chat-1") {
        return HttpResponse::NotFound().finish();
    }
    match query.get("since").map(String::as_str) {
        None => HttpResponse::Ok().json(json!([
            { "id": "m1", "author": "admin", "text": "Hello", "timestamp": "2025-10-16T12:00:00.000Z" },
            { "id": "m2", "author": "admin", "text": "How can we help?", "timestamp": "2025-10-16T12:00:05.000Z" }
        ])),
        Some("2025-10-16T12:00:05.000Z") => HttpResponse::Ok().json(json!([
            { "id": "m3", "author": "admin", "text": "Still there?", "timestamp": "2025-10-16T12:01:00.000Z" }
        ])),
        Some(_) => HttpResponse::Ok().json(json!([])),
    }
}

async fn chat_send(state: web::Data<FakeBackend>, body: web::Json<Value>) -> HttpResponse {
    if body["sessionKey"] != "chat-1" {
        return HttpResponse::BadRequest().finish();
    }
    state.chat_sent.lock().unwrap().push(body.into_inner());
    HttpResponse::Ok().json(json!({ "ok": true }))
}

async fn gemini(req: HttpRequest, path: web::Path<String>) -> HttpResponse {
    if header(&req, "x-goog-api-key").as_deref() != Some(GEMINI_KEY) {
        return HttpResponse::Forbidden().json(json!({ "error": { "message": "bad key" } }));
    }
    if path.as_str() != "gemini-test:generateContent" {
        return HttpResponse::NotFound().finish();
    }

    let draft = json!({
        "date": "17-Oct-2025",
        "paymentMethod": "Bank Transfer",
        "sellingRates": { "below1M_MMK": 798, "above1M_MMK": 801, "special_100_500": "803/804" },
        "buyingRates": { "base": 821, "above1M_MMK": 818 },
        "notes": ["Ask before transferring"]
    });
    HttpResponse::Ok().json(json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": draft.to_string() }] }
        }]
    }))
}
