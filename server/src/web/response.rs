// server/src/web/response.rs

//! The JSON envelope every endpoint answers with.

use actix_web::HttpResponse;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
  pub success: bool,
  pub code: u16,
  pub message: String,
  pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
  pub fn success(data: T) -> Self {
    Self {
      success: true,
      code: 200,
      message: "操作成功".to_string(),
      data: Some(data),
    }
  }

  pub fn failure(code: u16, message: impl Into<String>) -> Self {
    Self {
      success: false,
      code,
      message: message.into(),
      data: None,
    }
  }
}

/// 200 with `data`.
pub fn ok<T: Serialize>(data: T) -> HttpResponse {
  HttpResponse::Ok().json(ApiResponse::success(data))
}

/// 200 with a message and no data.
pub fn ok_message(message: impl Into<String>) -> HttpResponse {
  HttpResponse::Ok().json(ApiResponse::<()> {
    success: true,
    code: 200,
    message: message.into(),
    data: None,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn success_envelope_shape() {
    let value = serde_json::to_value(ApiResponse::success(json!({"order_id": 5}))).unwrap();
    assert_eq!(
      value,
      json!({"success": true, "code": 200, "message": "操作成功", "data": {"order_id": 5}})
    );
  }

  #[test]
  fn failure_has_null_data() {
    let value = serde_json::to_value(ApiResponse::<()>::failure(404, "订单不存在")).unwrap();
    assert_eq!(value["data"], serde_json::Value::Null);
    assert_eq!(value["code"], 404);
  }
}
