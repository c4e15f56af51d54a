//! Web server for robot configuration
//!
//! Actix-web handlers for per-field validation and the robot test action.
//! The test action posts to a real webhook, so it requires the admin token.

use actix_web::dev::Server;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer, Responder};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::notifier::test_robot;
use crate::registry::{DescriptorRegistry, FormValidation};
use crate::robot::RobotSender;

/// Header carrying the admin token
pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

/// Shared state of the web server
pub struct AppState {
    pub registry: DescriptorRegistry,
    pub sender: Arc<dyn RobotSender>,
    pub admin_token: Option<String>,
}

impl AppState {
    fn is_admin(&self, req: &HttpRequest) -> bool {
        let Some(expected) = self.admin_token.as_deref().filter(|t| !t.is_empty()) else {
            return false;
        };
        req.headers()
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|given| constant_time_eq(given, expected))
    }
}

/// Compare tokens without stopping at the first differing byte
fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

/// Register all routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(api_check_robot_id)
        .service(api_check_robot_name)
        .service(api_check_robot_webhook)
        .service(api_check_user_mobile)
        .service(api_list_descriptors)
        .service(api_test_robot);
}

/// Bind the configuration API to `port` on localhost without running it
pub fn bind_server(state: web::Data<AppState>, port: u16) -> std::io::Result<Server> {
    if state.admin_token.is_none() {
        warn!("no admin_token configured, the robot test endpoint will refuse every request");
    }

    let server = HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind(("127.0.0.1", port))?
        .run();
    Ok(server)
}

/// Drive `server` until it stops, then tear down the descriptor registry
pub async fn serve(state: web::Data<AppState>, server: Server) -> std::io::Result<()> {
    let result = server.await;
    state.registry.shutdown();
    info!("robot configuration server stopped");
    result
}

/// Start the web server on the specified port
pub async fn start_web_server(state: AppState, port: u16) -> std::io::Result<()> {
    let state = web::Data::new(state);
    info!(port, "starting robot configuration server");
    let server = bind_server(state.clone(), port)?;
    serve(state, server).await
}

#[derive(Debug, Deserialize)]
struct FieldQuery {
    #[serde(default)]
    value: String,
}

fn verdict(validation: FormValidation) -> HttpResponse {
    HttpResponse::Ok().json(validation)
}

/// GET /api/robot/check-id?value=
#[actix_web::get("/api/robot/check-id")]
async fn api_check_robot_id(state: web::Data<AppState>, query: web::Query<FieldQuery>) -> impl Responder {
    verdict(state.registry.validate("robot", "id", &query.value))
}

/// GET /api/robot/check-name?value=
#[actix_web::get("/api/robot/check-name")]
async fn api_check_robot_name(state: web::Data<AppState>, query: web::Query<FieldQuery>) -> impl Responder {
    verdict(state.registry.validate("robot", "name", &query.value))
}

/// GET /api/robot/check-webhook?value=
#[actix_web::get("/api/robot/check-webhook")]
async fn api_check_robot_webhook(state: web::Data<AppState>, query: web::Query<FieldQuery>) -> impl Responder {
    verdict(state.registry.validate("robot", "webhook", &query.value))
}

/// GET /api/user/check-mobile?value=
#[actix_web::get("/api/user/check-mobile")]
async fn api_check_user_mobile(state: web::Data<AppState>, query: web::Query<FieldQuery>) -> impl Responder {
    verdict(state.registry.validate("user-property", "mobile", &query.value))
}

/// GET /api/descriptors - List registered descriptors
#[actix_web::get("/api/descriptors")]
async fn api_list_descriptors(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "descriptors": state.registry.describe_all()
    }))
}

#[derive(Debug, Deserialize)]
struct TestRobotRequest {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    webhook: String,
}

/// POST /api/robot/test - Send the test message to an unsaved robot
#[actix_web::post("/api/robot/test")]
async fn api_test_robot(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<TestRobotRequest>,
) -> impl Responder {
    if !state.is_admin(&req) {
        warn!("robot test refused: missing or wrong admin token");
        return HttpResponse::Forbidden().json(FormValidation::error("permission denied"));
    }

    let result = test_robot(state.sender.as_ref(), &body.id, &body.name, &body.webhook).await;
    verdict(result)
}
