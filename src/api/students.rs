//! Student record endpoints
//! Mission: Expose record operations to the presentation layer

use crate::{
    api::error::ApiError,
    auth::models::Identity,
    policy::{AccessPolicy, Operation},
    service::ResultService,
    students::models::{Student, StudentInput},
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Extension, Json,
};

fn body(payload: Result<Json<StudentInput>, JsonRejection>) -> Result<StudentInput, ApiError> {
    payload
        .map(|Json(input)| input)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

fn student_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::BadRequest("Invalid student ID".to_string()))
}

fn id_hint(id: &Result<i64, ApiError>) -> i64 {
    id.as_ref().copied().unwrap_or_default()
}

/// Role check ahead of request parsing, so a caller who may not perform
/// `op` is told so even when their request is also malformed
fn guard(caller: &Identity, op: Operation) -> Result<(), ApiError> {
    AccessPolicy::authorize(Some(caller), op)?;
    Ok(())
}

/// GET /students (ADMIN)
pub async fn list_students(
    State(service): State<ResultService>,
    Extension(caller): Extension<Identity>,
) -> Result<Json<Vec<Student>>, ApiError> {
    Ok(Json(service.list_students(&caller)?))
}

/// GET /students/:id (ADMIN)
pub async fn get_student(
    State(service): State<ResultService>,
    Extension(caller): Extension<Identity>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Student>, ApiError> {
    let id = student_id(path);
    guard(&caller, Operation::GetStudent(id_hint(&id)))?;
    Ok(Json(service.get_student(&caller, id?)?))
}

/// POST /students (ADMIN)
pub async fn create_student(
    State(service): State<ResultService>,
    Extension(caller): Extension<Identity>,
    payload: Result<Json<StudentInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Student>), ApiError> {
    guard(&caller, Operation::CreateStudent)?;
    let input = body(payload)?;
    let student = service.create_student(&caller, &input)?;
    Ok((StatusCode::CREATED, Json(student)))
}

/// PUT /students/:id (ADMIN). Full replace, every field required.
pub async fn update_student(
    State(service): State<ResultService>,
    Extension(caller): Extension<Identity>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<StudentInput>, JsonRejection>,
) -> Result<Json<Student>, ApiError> {
    let id = student_id(path);
    guard(&caller, Operation::UpdateStudent(id_hint(&id)))?;
    let input = body(payload)?;
    Ok(Json(service.update_student(&caller, id?, &input)?))
}

/// DELETE /students/:id (ADMIN). Callers confirm before sending this.
pub async fn delete_student(
    State(service): State<ResultService>,
    Extension(caller): Extension<Identity>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = student_id(path);
    guard(&caller, Operation::DeleteStudent(id_hint(&id)))?;
    service.delete_student(&caller, id?)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /students/my-result (STUDENT)
pub async fn my_result(
    State(service): State<ResultService>,
    Extension(caller): Extension<Identity>,
) -> Result<Json<Student>, ApiError> {
    Ok(Json(service.my_result(&caller)?))
}
