use super::optional_json;
use crate::auth::AuthUser;
use crate::error::ServiceError;
use crate::report;
use crate::state::{run_blocking, AppState};
use crate::store::CouponQuery;
use actix_web::{web, HttpRequest, Responder};
use common::model::response::{ApiResponse, CouponPage, Pagination};
use common::requests::CouponListRequest;

const DEFAULT_PAGE_LIMIT: u64 = 10;

/// Query string and JSON body are both accepted; body fields win.
pub async fn process(
    state: web::Data<AppState>,
    _user: AuthUser,
    req: HttpRequest,
    body: web::Bytes,
) -> impl Responder {
    let request = match list_request(&req, &body) {
        Ok(request) => request,
        Err(e) => return report::respond(report::failure::<CouponPage>(&e)),
    };
    let plan = PagePlan::from_request(&request);
    let store = state.store.clone();

    let result = run_blocking(move || {
        let records = store.list(&plan.query)?;
        let pagination = match plan.query.limit {
            Some(limit) => Some(plan.pagination(store.count(&plan.query)?, limit)),
            None => None,
        };
        Ok(CouponPage {
            records,
            pagination,
        })
    })
    .await;

    match result {
        Ok(page) => {
            let message = if page.records.is_empty() {
                "No data found"
            } else {
                "Success"
            };
            report::respond(ApiResponse::ok(message, page))
        }
        Err(e) => report::respond(report::failure::<CouponPage>(&e)),
    }
}

fn list_request(req: &HttpRequest, body: &[u8]) -> Result<CouponListRequest, ServiceError> {
    let query = web::Query::<CouponListRequest>::from_query(req.query_string())
        .map_err(|e| ServiceError::BadRequest(format!("Invalid query string: {}", e)))?
        .into_inner();
    Ok(match optional_json::<CouponListRequest>(body)? {
        Some(body) => query.merge(body),
        None => query,
    })
}

#[derive(Debug, Clone)]
struct PagePlan {
    query: CouponQuery,
    current_page: u64,
}

impl PagePlan {
    /// `pagelimit = 0` lists everything. A positive `start` offset takes
    /// precedence over `page`.
    fn from_request(req: &CouponListRequest) -> Self {
        let limit = req.pagelimit.unwrap_or(DEFAULT_PAGE_LIMIT);
        let current_page = req.page.unwrap_or(1).max(1);
        let offset = match req.start {
            Some(start) if start > 0 => start,
            _ => (current_page - 1).saturating_mul(limit),
        };
        let query = CouponQuery {
            verified_flag: req.verified_flag,
            filter: req.filter.clone().unwrap_or_default(),
            limit: (limit > 0).then_some(limit),
            offset: if limit > 0 { offset } else { 0 },
        };
        Self {
            query,
            current_page,
        }
    }

    fn pagination(&self, total_records: u64, limit: u64) -> Pagination {
        let total_pages = total_records.div_ceil(limit);
        Pagination {
            current_page: self.current_page,
            total_pages,
            total_records,
            records_per_page: limit,
            has_next_page: self.current_page < total_pages,
            has_prev_page: self.current_page > 1,
            start_record: self.query.offset.saturating_add(1),
            end_record: self.query.offset.saturating_add(limit).min(total_records),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_of_ten() {
        let plan = PagePlan::from_request(&CouponListRequest::default());
        assert_eq!(plan.query.limit, Some(10));
        assert_eq!(plan.query.offset, 0);
        assert_eq!(plan.current_page, 1);
    }

    #[test]
    fn page_and_start_offsets() {
        let by_page = PagePlan::from_request(&CouponListRequest {
            pagelimit: Some(25),
            page: Some(3),
            ..Default::default()
        });
        assert_eq!(by_page.query.offset, 50);

        let by_start = PagePlan::from_request(&CouponListRequest {
            pagelimit: Some(25),
            page: Some(3),
            start: Some(7),
            ..Default::default()
        });
        assert_eq!(by_start.query.offset, 7);
    }

    #[test]
    fn zero_limit_is_unpaginated() {
        let plan = PagePlan::from_request(&CouponListRequest {
            pagelimit: Some(0),
            page: Some(4),
            ..Default::default()
        });
        assert_eq!(plan.query.limit, None);
        assert_eq!(plan.query.offset, 0);
    }

    #[test]
    fn pagination_bounds() {
        let plan = PagePlan::from_request(&CouponListRequest {
            pagelimit: Some(10),
            page: Some(3),
            ..Default::default()
        });
        let p = plan.pagination(25, 10);
        assert_eq!(p.total_pages, 3);
        assert!(!p.has_next_page);
        assert!(p.has_prev_page);
        assert_eq!(p.start_record, 21);
        assert_eq!(p.end_record, 25);
    }

    #[test]
    fn huge_page_and_start_saturate() {
        let by_page = PagePlan::from_request(&CouponListRequest {
            pagelimit: Some(10),
            page: Some(u64::MAX),
            ..Default::default()
        });
        assert_eq!(by_page.query.offset, u64::MAX);
        let p = by_page.pagination(5, 10);
        assert_eq!(p.start_record, u64::MAX);
        assert_eq!(p.end_record, 5);
        assert!(!p.has_next_page);

        let by_start = PagePlan::from_request(&CouponListRequest {
            pagelimit: Some(10),
            start: Some(u64::MAX),
            ..Default::default()
        });
        assert_eq!(by_start.query.offset, u64::MAX);
        assert_eq!(by_start.pagination(5, 10).end_record, 5);
    }
}
