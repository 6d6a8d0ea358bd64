use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::entities::Role;
use crate::middlewares::AuthUser;
use crate::models::*;
use crate::services::ReportService;

#[utoipa::path(
    get,
    path = "/api/reports/sales",
    tag = "reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Revenue totals and best seller", body = SalesReport),
        (status = 403, description = "Admin only", body = ApiError)
    )
)]
pub async fn sales_report(
    report_service: web::Data<ReportService>,
    user: AuthUser,
) -> Result<HttpResponse> {
    user.require_role(&[Role::Admin])?;
    match report_service.sales_report().await {
        Ok(report) => Ok(HttpResponse::Ok().json(ApiResponse::success(report))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn report_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/reports").route("/sales", web::get().to(sales_report)));
}
