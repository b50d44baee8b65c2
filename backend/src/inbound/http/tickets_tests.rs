//! Tests for the service ticket handlers.

use super::*;
use crate::domain::ErrorCode;
use crate::domain::test_support::today;
use crate::inbound::http::test_utils::{TestShop, bearer, send};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use chrono::Days;
use rstest::rstest;
use serde_json::{Value, json};

const VIN: &str = "1HGCM82633A123456";

async fn open_ticket<S>(app: &S, token: &str, customer_id: i64, mechanic_ids: &[i64]) -> i64
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let request = TestRequest::post()
        .uri("/api/v1/tickets")
        .insert_header(bearer(token))
        .set_json(json!({
            "vin": VIN,
            "serviceDate": today().to_string(),
            "serviceDesc": "Brake inspection",
            "customerId": customer_id,
            "mechanicIds": mechanic_ids,
        }))
        .to_request();
    let (status, created) = send(app, request).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    created["id"].as_i64().expect("ticket id")
}

async fn stock_part<S>(app: &S, token: &str, name: &str, quantity: i64) -> i64
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let request = TestRequest::post()
        .uri("/api/v1/parts")
        .insert_header(bearer(token))
        .set_json(json!({ "name": name, "price": 59.99, "quantity": quantity }))
        .to_request();
    let (status, created) = send(app, request).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    created["id"].as_i64().expect("part id")
}

async fn on_hand<S>(app: &S, part_id: i64) -> Value
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let request = TestRequest::get()
        .uri(&format!("/api/v1/parts/{part_id}"))
        .to_request();
    let (_, part) = send(app, request).await;
    part["quantity"].clone()
}

async fn adjust_parts<S>(app: &S, token: &str, ticket_id: i64, body: Value) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let request = TestRequest::put()
        .uri(&format!("/api/v1/tickets/{ticket_id}/parts"))
        .insert_header(bearer(token))
        .set_json(body)
        .to_request();
    send(app, request).await
}

#[rstest]
#[case(json!({"vin": "1HGCM82633A12345", "serviceDate": "2030-06-15", "serviceDesc": "Brakes", "customerId": 1, "mechanicIds": [1]}), "vin")]
#[case(json!({"vin": VIN, "serviceDate": "2030-06-15", "serviceDesc": "", "customerId": 1, "mechanicIds": [1]}), "serviceDesc")]
fn invalid_drafts_name_the_field(#[case] body: Value, #[case] field: &str) {
    let request: CreateTicketRequest = serde_json::from_value(body).expect("well-formed body");
    let err = TicketDraft::try_from(request).expect_err("invalid");
    assert_eq!(err.code(), ErrorCode::ValidationFailed);
    assert_eq!(err.details().and_then(|d| d.get("field")), Some(&json!(field)));
}

#[rstest]
#[case(json!({"partId": 1, "quantityUsed": -1}), "Quantity cannot be negative")]
#[case(json!({"partId": 1}), "Either quantityUsed or quantityReturned must be greater than zero")]
fn invalid_adjustments_are_rejected(#[case] body: Value, #[case] message: &str) {
    let request: UpdatePartsRequest = serde_json::from_value(body).expect("well-formed body");
    let err = PartsAdjustment::try_from(request).expect_err("invalid");
    assert_eq!(err.code(), ErrorCode::ValidationFailed);
    assert_eq!(err.message(), message);
}

#[actix_web::test]
async fn tickets_open_and_read_back() {
    let shop = TestShop::new();
    let app = shop.service().await;
    let (customer_id, customer_token) = shop.customer(&app, "ada").await;
    let (mechanic_id, token) = shop.mechanic(&app, "max").await;
    let ticket_id = open_ticket(&app, &token, customer_id, &[mechanic_id]).await;

    let request = TestRequest::get()
        .uri(&format!("/api/v1/tickets/{ticket_id}"))
        .insert_header(bearer(&customer_token))
        .to_request();
    let (status, ticket) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ticket["vin"], VIN);
    assert_eq!(ticket["serviceDate"], today().to_string());
    assert_eq!(ticket["customerId"], customer_id);
    assert_eq!(ticket["mechanicIds"], json!([mechanic_id]));
    assert_eq!(ticket["parts"], json!([]));
}

#[actix_web::test]
async fn customers_only_see_their_own_tickets() {
    let shop = TestShop::new();
    let app = shop.service().await;
    let (ada, ada_token) = shop.customer(&app, "ada").await;
    let (bob, bob_token) = shop.customer(&app, "bob").await;
    let (mechanic_id, token) = shop.mechanic(&app, "max").await;
    let ada_ticket = open_ticket(&app, &token, ada, &[mechanic_id]).await;
    open_ticket(&app, &token, bob, &[mechanic_id]).await;

    let request = TestRequest::get()
        .uri("/api/v1/tickets")
        .insert_header(bearer(&ada_token))
        .to_request();
    let (status, listed) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = listed
        .as_array()
        .expect("array")
        .iter()
        .map(|ticket| ticket["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!(ada_ticket)]);

    let request = TestRequest::get()
        .uri(&format!("/api/v1/tickets/{ada_ticket}"))
        .insert_header(bearer(&bob_token))
        .to_request();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let request = TestRequest::get()
        .uri("/api/v1/tickets")
        .insert_header(bearer(&token))
        .to_request();
    let (_, listed) = send(&app, request).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(2));
}

#[actix_web::test]
async fn customers_cannot_open_tickets() {
    let shop = TestShop::new();
    let app = shop.service().await;
    let (customer_id, customer_token) = shop.customer(&app, "ada").await;
    let (mechanic_id, _) = shop.mechanic(&app, "max").await;
    let request = TestRequest::post()
        .uri("/api/v1/tickets")
        .insert_header(bearer(&customer_token))
        .set_json(json!({
            "vin": VIN,
            "serviceDate": today().to_string(),
            "serviceDesc": "Oil change",
            "customerId": customer_id,
            "mechanicIds": [mechanic_id],
        }))
        .to_request();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[rstest]
#[case::bad_vin(
    "POST",
    "/api/v1/tickets",
    json!({"vin": "short", "serviceDate": "2030-06-15", "serviceDesc": "Oil change", "customerId": 1, "mechanicIds": [1]})
)]
#[case::empty_mechanics(
    "POST",
    "/api/v1/tickets",
    json!({"vin": VIN, "serviceDate": "2000-01-01", "serviceDesc": "x", "customerId": 1, "mechanicIds": []})
)]
#[case::bad_info("PUT", "/api/v1/tickets/1/info", json!({"vin": "short"}))]
#[case::empty_adjustment("PUT", "/api/v1/tickets/1/parts", json!({"partId": 1}))]
#[case::negative_adjustment("PUT", "/api/v1/tickets/1/parts", json!({"partId": 1, "quantityUsed": -3}))]
#[actix_web::test]
async fn customers_are_refused_before_the_body_is_validated(
    #[case] method: &str,
    #[case] uri: &str,
    #[case] body: Value,
) {
    let shop = TestShop::new();
    let app = shop.service().await;
    let (_, customer_token) = shop.customer(&app, "ada").await;
    let request = match method {
        "POST" => TestRequest::post(),
        _ => TestRequest::put(),
    }
    .uri(uri)
    .insert_header(bearer(&customer_token))
    .set_json(body)
    .to_request();
    let (status, error) = send(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{error}");
    assert_eq!(error["code"], "forbidden");
    assert!(error.get("details").is_none());
}

#[actix_web::test]
async fn unknown_customers_and_past_dates_are_rejected() {
    let shop = TestShop::new();
    let app = shop.service().await;
    let (customer_id, _) = shop.customer(&app, "ada").await;
    let (mechanic_id, token) = shop.mechanic(&app, "max").await;

    let request = TestRequest::post()
        .uri("/api/v1/tickets")
        .insert_header(bearer(&token))
        .set_json(json!({
            "vin": VIN,
            "serviceDate": today().to_string(),
            "serviceDesc": "Oil change",
            "customerId": 999,
            "mechanicIds": [mechanic_id],
        }))
        .to_request();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_reference");

    let yesterday = today().checked_sub_days(Days::new(1)).expect("date");
    let request = TestRequest::post()
        .uri("/api/v1/tickets")
        .insert_header(bearer(&token))
        .set_json(json!({
            "vin": VIN,
            "serviceDate": yesterday.to_string(),
            "serviceDesc": "Oil change",
            "customerId": customer_id,
            "mechanicIds": [mechanic_id],
        }))
        .to_request();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "serviceDate");

    let request = TestRequest::post()
        .uri("/api/v1/tickets")
        .insert_header(bearer(&token))
        .set_json(json!({
            "vin": VIN,
            "serviceDate": today().to_string(),
            "serviceDesc": "Oil change",
            "customerId": customer_id,
            "mechanicIds": [],
        }))
        .to_request();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "mechanicIds");
}

#[actix_web::test]
async fn info_updates_are_partial() {
    let shop = TestShop::new();
    let app = shop.service().await;
    let (customer_id, _) = shop.customer(&app, "ada").await;
    let (mechanic_id, token) = shop.mechanic(&app, "max").await;
    let ticket_id = open_ticket(&app, &token, customer_id, &[mechanic_id]).await;

    let request = TestRequest::put()
        .uri(&format!("/api/v1/tickets/{ticket_id}/info"))
        .insert_header(bearer(&token))
        .set_json(json!({ "serviceDesc": "Brake pads and rotors" }))
        .to_request();
    let (status, ticket) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ticket["serviceDesc"], "Brake pads and rotors");
    assert_eq!(ticket["vin"], VIN);

    let request = TestRequest::put()
        .uri(&format!("/api/v1/tickets/{ticket_id}/info"))
        .insert_header(bearer(&token))
        .set_json(json!({}))
        .to_request();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No fields to update");

    let request = TestRequest::put()
        .uri("/api/v1/tickets/999/info")
        .insert_header(bearer(&token))
        .set_json(json!({ "serviceDesc": "Anything" }))
        .to_request();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn mechanic_changes_apply_together() {
    let shop = TestShop::new();
    let app = shop.service().await;
    let (customer_id, _) = shop.customer(&app, "ada").await;
    let (first, token) = shop.mechanic(&app, "max").await;
    let (second, _) = shop.mechanic(&app, "mia").await;
    let ticket_id = open_ticket(&app, &token, customer_id, &[first]).await;

    let request = TestRequest::put()
        .uri(&format!("/api/v1/tickets/{ticket_id}/mechanics"))
        .insert_header(bearer(&token))
        .set_json(json!({ "addMechanicIds": [second], "removeMechanicIds": [first] }))
        .to_request();
    let (status, ticket) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ticket["mechanicIds"], json!([second]));

    let request = TestRequest::put()
        .uri(&format!("/api/v1/tickets/{ticket_id}/mechanics"))
        .insert_header(bearer(&token))
        .set_json(json!({ "removeMechanicIds": [second] }))
        .to_request();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "last_mechanic_violation");

    let request = TestRequest::get()
        .uri(&format!("/api/v1/tickets/{ticket_id}"))
        .insert_header(bearer(&token))
        .to_request();
    let (_, ticket) = send(&app, request).await;
    assert_eq!(ticket["mechanicIds"], json!([second]));
}

#[actix_web::test]
async fn parts_move_between_stock_and_ticket() {
    let shop = TestShop::new();
    let app = shop.service().await;
    let (customer_id, _) = shop.customer(&app, "ada").await;
    let (mechanic_id, token) = shop.mechanic(&app, "max").await;
    let ticket_id = open_ticket(&app, &token, customer_id, &[mechanic_id]).await;
    let part_id = stock_part(&app, &token, "Headlights", 20).await;

    let (status, body) = adjust_parts(
        &app,
        &token,
        ticket_id,
        json!({ "partId": part_id, "quantityUsed": 3 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticketId"], ticket_id);
    assert_eq!(body["message"], "3 Headlights(s) added");
    assert_eq!(on_hand(&app, part_id).await, json!(17));

    let (status, body) = adjust_parts(
        &app,
        &token,
        ticket_id,
        json!({ "partId": part_id, "quantityUsed": 2, "quantityReturned": 4 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "2 Headlights(s) added and 4 Headlights(s) removed");
    assert_eq!(on_hand(&app, part_id).await, json!(19));

    let request = TestRequest::get()
        .uri(&format!("/api/v1/tickets/{ticket_id}"))
        .insert_header(bearer(&token))
        .to_request();
    let (_, ticket) = send(&app, request).await;
    assert_eq!(
        ticket["parts"],
        json!([{ "partId": part_id, "partName": "Headlights", "quantityUsed": 1 }])
    );
}

#[actix_web::test]
async fn failed_adjustments_leave_stock_untouched() {
    let shop = TestShop::new();
    let app = shop.service().await;
    let (customer_id, _) = shop.customer(&app, "ada").await;
    let (mechanic_id, token) = shop.mechanic(&app, "max").await;
    let ticket_id = open_ticket(&app, &token, customer_id, &[mechanic_id]).await;
    let part_id = stock_part(&app, &token, "Headlights", 2).await;

    let (status, body) = adjust_parts(
        &app,
        &token,
        ticket_id,
        json!({ "partId": part_id, "quantityUsed": 5 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "insufficient_stock");
    assert_eq!(body["message"], "Not enough Headlightss in inventory");
    assert_eq!(on_hand(&app, part_id).await, json!(2));

    let (status, body) = adjust_parts(
        &app,
        &token,
        ticket_id,
        json!({ "partId": part_id, "quantityReturned": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "over_return");
    assert_eq!(on_hand(&app, part_id).await, json!(2));

    let (status, body) = adjust_parts(
        &app,
        &token,
        ticket_id,
        json!({ "partId": 999, "quantityUsed": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_reference");
}

#[actix_web::test]
async fn parts_in_use_cannot_be_deleted_and_deleting_tickets_keeps_stock_consumed() {
    let shop = TestShop::new();
    let app = shop.service().await;
    let (customer_id, _) = shop.customer(&app, "ada").await;
    let (mechanic_id, token) = shop.mechanic(&app, "max").await;
    let ticket_id = open_ticket(&app, &token, customer_id, &[mechanic_id]).await;
    let part_id = stock_part(&app, &token, "Headlights", 10).await;
    let (status, _) = adjust_parts(
        &app,
        &token,
        ticket_id,
        json!({ "partId": part_id, "quantityUsed": 4 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let request = TestRequest::delete()
        .uri(&format!("/api/v1/parts/{part_id}"))
        .insert_header(bearer(&token))
        .to_request();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "conflict");

    let request = TestRequest::delete()
        .uri(&format!("/api/v1/tickets/{ticket_id}"))
        .insert_header(bearer(&token))
        .to_request();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        format!("Service ticket {ticket_id} deleted successfully.")
    );
    assert_eq!(on_hand(&app, part_id).await, json!(6));

    let request = TestRequest::get()
        .uri(&format!("/api/v1/tickets/{ticket_id}"))
        .insert_header(bearer(&token))
        .to_request();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
