use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use bigdecimal::BigDecimal;
use futures_util::{StreamExt, TryStreamExt};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::domain::order::{OrderDraft, OrderPatch, OrderView};
use crate::domain::ports::UploadedFile;
use crate::errors::AppError;
use crate::AppService;

/// Multipart field carrying file payloads.
const IMAGE_FIELD: &str = "images";

/// Hard cap on files per request.
const MAX_IMAGES: usize = 4;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub status: Option<String>,
    pub product: Option<String>,
    pub comment: Option<String>,
    pub deadline: Option<String>,
    /// Decimal price, accepted as either a JSON string or number.
    #[serde(deserialize_with = "price_as_string")]
    #[schema(value_type = Option<String>)]
    pub price: Option<String>,
}

fn price_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "price must be a string or number, got {}",
            other
        ))),
    }
}

impl UpdateOrderRequest {
    fn into_patch(self) -> Result<OrderPatch, AppError> {
        Ok(OrderPatch {
            status: self.status,
            product: self.product,
            comment: self.comment,
            deadline: self.deadline,
            price: parse_price(self.price)?,
            images: None,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: i32,
    pub product: Option<String>,
    pub comment: Option<String>,
    pub letter_style: Option<String>,
    pub design: Option<String>,
    pub deadline: Option<String>,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub price: Option<String>,
    pub status: String,
    pub images: Vec<String>,
    pub created_at: String,
}

impl From<OrderView> for OrderResponse {
    fn from(o: OrderView) -> Self {
        OrderResponse {
            id: o.id,
            product: o.product,
            comment: o.comment,
            letter_style: o.letter_style,
            design: o.design,
            deadline: o.deadline,
            price: o.price.map(|p| p.to_string()),
            status: o.status,
            images: o.images,
            created_at: o.created_at.to_rfc3339(),
        }
    }
}

// ── Multipart parsing ────────────────────────────────────────────────────────

struct FormData {
    fields: Vec<(String, String)>,
    files: Vec<UploadedFile>,
}

impl FormData {
    fn take(&mut self, key: &str) -> Option<String> {
        self.fields
            .iter()
            .position(|(name, _)| name == key)
            .map(|pos| self.fields.remove(pos).1)
    }
}

async fn collect_form(mut multipart: Multipart) -> Result<FormData, AppError> {
    let mut fields = Vec::new();
    let mut files = Vec::new();

    while let Some(mut field) = multipart
        .try_next()
        .await
        .map_err(|e| AppError::Internal(format!("invalid multipart request: {}", e)))?
    {
        let (name, filename) = {
            let cd = field.content_disposition();
            (
                cd.get_name().unwrap_or("").to_string(),
                cd.get_filename().map(|s| s.to_string()),
            )
        };

        let mut buf = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| AppError::Internal(format!("multipart read failed: {}", e)))?
        {
            buf.extend_from_slice(&chunk);
        }

        match filename {
            Some(filename) if name == IMAGE_FIELD => {
                if files.len() >= MAX_IMAGES {
                    return Err(AppError::Internal(format!(
                        "at most {} images per request",
                        MAX_IMAGES
                    )));
                }
                // Browsers send an empty file part for a blank file input.
                if !filename.is_empty() && !buf.is_empty() {
                    files.push(UploadedFile {
                        name: filename,
                        bytes: buf,
                    });
                }
            }
            _ => {
                fields.push((name, String::from_utf8_lossy(&buf).into_owned()));
            }
        }
    }

    Ok(FormData { fields, files })
}

fn parse_price(raw: Option<String>) -> Result<Option<BigDecimal>, AppError> {
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => BigDecimal::from_str(s.trim())
            .map(Some)
            .map_err(|e| AppError::Internal(format!("Invalid price '{}': {}", s, e))),
    }
}

fn draft_from_form(form: &mut FormData) -> Result<OrderDraft, AppError> {
    Ok(OrderDraft {
        product: form.take("product"),
        comment: form.take("comment"),
        letter_style: form.take("letterStyle"),
        design: form.take("design"),
        deadline: form.take("deadline"),
        price: parse_price(form.take("price"))?,
    })
}

fn patch_from_form(form: &mut FormData) -> Result<OrderPatch, AppError> {
    Ok(OrderPatch {
        status: form.take("status"),
        product: form.take("product"),
        comment: form.take("comment"),
        deadline: form.take("deadline"),
        price: parse_price(form.take("price"))?,
        images: None,
    })
}

fn is_multipart(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("multipart/form-data"))
        .unwrap_or(false)
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Accepts a multipart form with the order fields and up to 4 files under
/// "images". Files are stored first; their references end up in the row.
#[utoipa::path(
    post,
    path = "/orders",
    responses(
        (status = 200, description = "Order accepted"),
        (status = 500, description = "Storage or database failure"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    service: web::Data<AppService>,
    multipart: Multipart,
) -> Result<HttpResponse, AppError> {
    let mut form = collect_form(multipart).await?;
    let draft = draft_from_form(&mut form)?;

    let id = service.create_order(draft, form.files).await?;
    log::info!("created order {}", id);

    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

/// GET /orders
///
/// Returns every order, newest first. There is deliberately no pagination:
/// the management UI loads the whole table.
#[utoipa::path(
    get,
    path = "/orders",
    responses(
        (status = 200, description = "All orders, newest first", body = [OrderResponse]),
        (status = 500, description = "Database failure"),
    ),
    tag = "orders"
)]
pub async fn list_orders(service: web::Data<AppService>) -> Result<HttpResponse, AppError> {
    let orders = service.list_orders().await?;
    let items: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();
    Ok(HttpResponse::Ok().json(items))
}

/// PUT /orders/{id}
///
/// Partial update: a JSON body with any subset of the mutable fields, or a
/// multipart form that may additionally carry replacement images. Fields not
/// supplied keep their stored value.
#[utoipa::path(
    put,
    path = "/orders/{id}",
    params(("id" = i32, Path, description = "Order id")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order updated"),
        (status = 404, description = "No order with this id"),
        (status = 500, description = "Storage or database failure"),
    ),
    tag = "orders"
)]
pub async fn update_order(
    service: web::Data<AppService>,
    path: web::Path<i32>,
    req: HttpRequest,
    mut payload: web::Payload,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let (patch, files) = if is_multipart(&req) {
        let mut form = collect_form(Multipart::new(req.headers(), payload)).await?;
        let patch = patch_from_form(&mut form)?;
        (patch, form.files)
    } else {
        let mut body = web::BytesMut::new();
        while let Some(chunk) = payload.next().await {
            let chunk = chunk.map_err(|e| AppError::Internal(e.to_string()))?;
            body.extend_from_slice(&chunk);
        }
        let request: UpdateOrderRequest = if body.is_empty() {
            UpdateOrderRequest::default()
        } else {
            serde_json::from_slice(&body)
                .map_err(|e| AppError::Internal(format!("invalid JSON body: {}", e)))?
        };
        (request.into_patch()?, Vec::new())
    };

    service.update_order(id, patch, files).await?;

    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

/// DELETE /orders/{id}
///
/// Removes the row and best-effort removes its stored files. Deleting an id
/// that does not exist is a success.
#[utoipa::path(
    delete,
    path = "/orders/{id}",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order deleted (or already absent)"),
        (status = 500, description = "Storage or database failure"),
    ),
    tag = "orders"
)]
pub async fn delete_order(
    service: web::Data<AppService>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    service.delete_order(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_price_is_treated_as_absent() {
        assert!(parse_price(None).unwrap().is_none());
        assert!(parse_price(Some("".to_string())).unwrap().is_none());
        assert!(parse_price(Some("   ".to_string())).unwrap().is_none());
    }

    #[test]
    fn price_parses_with_surrounding_whitespace() {
        let price = parse_price(Some(" 9.99 ".to_string())).unwrap().unwrap();
        assert_eq!(price, BigDecimal::from_str("9.99").unwrap());
    }

    #[test]
    fn garbage_price_is_an_error() {
        assert!(parse_price(Some("abc".to_string())).is_err());
    }

    #[test]
    fn json_price_accepts_number_and_string() {
        let from_number: UpdateOrderRequest = serde_json::from_str(r#"{"price": 10}"#).unwrap();
        assert_eq!(from_number.price.as_deref(), Some("10"));

        let from_string: UpdateOrderRequest = serde_json::from_str(r#"{"price": "10"}"#).unwrap();
        assert_eq!(from_string.price.as_deref(), Some("10"));

        let absent: UpdateOrderRequest = serde_json::from_str(r#"{}"#).unwrap();
        assert!(absent.price.is_none());
    }

    #[test]
    fn unknown_update_fields_do_not_reach_the_patch() {
        let request: UpdateOrderRequest =
            serde_json::from_str(r#"{"status":"Done","letterStyle":"cursive"}"#).unwrap();
        let patch = request.into_patch().unwrap();
        assert_eq!(patch.status.as_deref(), Some("Done"));
        assert!(patch.images.is_none());
    }
}
