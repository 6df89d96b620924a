use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    application::dto::{CreateEmployeeRequest, HealthResponse},
    core::{Employee, EmployeeId},
    interface::http::problem::{ApiJson, ApiResult},
    state::AppState,
};

pub async fn greeting() -> &'static str {
    "Hello World"
}

pub async fn healthcheck() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn create_employee(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateEmployeeRequest>,
) -> ApiResult<Json<Employee>> {
    let employee = request.into_employee()?;
    let created = state.employee_service.create(employee).await?;
    Ok(Json(created))
}

pub async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<EmployeeId>,
    ApiJson(employee): ApiJson<Employee>,
) -> ApiResult<Json<Employee>> {
    let stored = state.employee_service.update(employee, id).await?;
    Ok(Json(stored))
}

/// A missing record is a bare 404 with no body.
pub async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<EmployeeId>,
) -> ApiResult<Response> {
    let response = match state.employee_service.read(id).await? {
        Some(employee) => Json(employee).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    };
    Ok(response)
}

pub async fn list_employees(State(state): State<AppState>) -> ApiResult<Json<Vec<Employee>>> {
    let employees = state.employee_service.read_all().await?;
    Ok(Json(employees))
}

pub async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<EmployeeId>,
) -> ApiResult<StatusCode> {
    state.employee_service.delete(id).await?;
    Ok(StatusCode::OK)
}
