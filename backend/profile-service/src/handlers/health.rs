use actix_web::HttpResponse;

/// Service banner
pub async fn root() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Profile Service API",
        "graphql": "/graphql",
        "health": "/health",
    }))
}

pub async fn health() -> &'static str {
    "ok"
}
