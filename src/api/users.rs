use actix_web::{web, HttpResponse};
use crate::{
    database::MongoDB,
    models::{RegisterUserRequest, RegisterUserResponse},
    services::user_service,
    utils::{error::AppError, json},
};

/// POST /users - Register a user by email; repeat calls return the existing record
#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "New user created", body = RegisterUserResponse),
        (status = 200, description = "User already exists", body = RegisterUserResponse),
        (status = 400, description = "Missing email")
    )
)]
pub async fn register_user(
    db: web::Data<MongoDB>,
    request: web::Json<RegisterUserRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("👤 POST /users - email: {}", request.email);

    let (user, inserted) = user_service::register_user(&db, &request.email).await?;
    let user = json::document_to_json(user);

    if inserted {
        log::info!("✅ User created: {}", request.email);
        Ok(HttpResponse::Created().json(RegisterUserResponse {
            message: "New user created".to_string(),
            user,
            inserted: true,
        }))
    } else {
        Ok(HttpResponse::Ok().json(RegisterUserResponse {
            message: "User already exists".to_string(),
            user,
            inserted: false,
        }))
    }
}
