use adapter::repository::memory::{FormatListing, InMemoryStore};
use api::route::v1;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use kernel::model::{
    auth::Session,
    book::{BookFormat, Money},
    id::{BookId, OrderItemId, SubscriptionPlanId, UserId},
    terms::TermsCategory,
    user::Role,
};
use registry::AppRegistry;
use rstest::{fixture, rstest};
use serde_json::{json, Value};
use shared::config::RentalConfig;
use tower::ServiceExt;

const MEMBER: &str = "member-token";
const OTHER_MEMBER: &str = "other-member-token";
const PAYMENT: &str = "payment-token";

struct TestApp {
    store: InMemoryStore,
    book_id: BookId,
    member_id: UserId,
    router: Router,
}

#[fixture]
async fn app() -> TestApp {
    let store = InMemoryStore::default();
    let book_id = BookId::new();
    store
        .catalog
        .put_book(
            book_id,
            [
                (BookFormat::Ebook, FormatListing::digital()),
                (BookFormat::Hardcopy, FormatListing::physical(1, Money(3000))),
            ],
        )
        .await;
    let member_id = UserId::new();
    for (token, user_id, role) in [
        (MEMBER, member_id, Role::Member),
        (OTHER_MEMBER, UserId::new(), Role::Member),
        (PAYMENT, UserId::new(), Role::PaymentService),
    ] {
        store
            .auth
            .insert_session(token, Session { user_id, role })
            .await;
    }

    let registry = AppRegistry::in_memory(&store, RentalConfig::default());
    let router = v1::build_routes().with_state(registry);
    TestApp {
        store,
        book_id,
        member_id,
        router,
    }
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let res = router.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn rental_request(format: &str) -> Value {
    json!({ "format": format, "orderItemId": OrderItemId::new() })
}

#[rstest]
#[tokio::test]
async fn health_check_is_public(#[future] app: TestApp) {
    let app = app.await;
    let (status, _) = send(&app.router, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[rstest]
#[tokio::test]
async fn unknown_token_is_rejected(#[future] app: TestApp) {
    let app = app.await;
    let uri = format!("/api/v1/books/{}/access", app.book_id);

    let (status, _) = send(&app.router, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app.router, Method::GET, &uri, Some("nobody"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[rstest]
#[tokio::test]
async fn rental_lifecycle_over_http(#[future] app: TestApp) {
    let app = app.await;
    let rentals = format!("/api/v1/books/{}/rentals", app.book_id);

    let (status, pending) = send(
        &app.router,
        Method::POST,
        &rentals,
        Some(MEMBER),
        Some(rental_request("HARDCOPY")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(pending["status"], "PENDING");
    assert_eq!(pending["guaranteeAmount"], 3000);

    // 唯一の枠は PENDING でも埋まっている
    let (status, body) = send(
        &app.router,
        Method::POST,
        &rentals,
        Some(OTHER_MEMBER),
        Some(rental_request("HARDCOPY")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");

    let grant_id = pending["id"].as_str().unwrap().to_string();
    let (status, _) = send(
        &app.router,
        Method::PUT,
        &format!("/api/v1/grants/{grant_id}/activated"),
        Some(MEMBER),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, active) = send(
        &app.router,
        Method::PUT,
        &format!("/api/v1/grants/{grant_id}/activated"),
        Some(PAYMENT),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(active["status"], "ACTIVE");

    let (status, access) = send(
        &app.router,
        Method::GET,
        &format!("/api/v1/books/{}/access", app.book_id),
        Some(MEMBER),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(access["hasAccess"], true);
    assert_eq!(access["channel"], "RENTAL");
    assert_eq!(access["format"], "HARDCOPY");

    let (status, _) = send(
        &app.router,
        Method::PUT,
        &format!("/api/v1/grants/{grant_id}/returned"),
        Some(OTHER_MEMBER),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, returned) = send(
        &app.router,
        Method::PUT,
        &format!("/api/v1/grants/{grant_id}/returned"),
        Some(MEMBER),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(returned["status"], "RETURNED");

    let (status, availability) = send(
        &app.router,
        Method::GET,
        &format!("/api/v1/books/{}/availability/HARDCOPY", app.book_id),
        Some(OTHER_MEMBER),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(availability["available"], 1);
}

#[rstest]
#[tokio::test]
async fn rental_waits_for_terms_acceptance(#[future] app: TestApp) {
    let app = app.await;
    app.store
        .terms
        .require(
            TermsCategory::rental(BookFormat::Hardcopy),
            "2024-08",
            Utc::now() - Duration::days(1),
        )
        .await;
    let rentals = format!("/api/v1/books/{}/rentals", app.book_id);

    let (status, body) = send(
        &app.router,
        Method::POST,
        &rentals,
        Some(MEMBER),
        Some(rental_request("HARDCOPY")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["termsRequired"], "2024-08");

    let (status, validation) = send(
        &app.router,
        Method::GET,
        "/api/v1/terms/validation?rentalType=RENTAL&specificRentalType=HARDCOPY",
        Some(MEMBER),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(validation["valid"], false);
    assert_eq!(validation["termsRequired"], "2024-08");

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/api/v1/terms/acceptances",
        Some(MEMBER),
        Some(json!({
            "rentalType": "RENTAL",
            "specificRentalType": "HARDCOPY",
            "termsVersion": "2024-08",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app.router,
        Method::POST,
        &rentals,
        Some(MEMBER),
        Some(rental_request("HARDCOPY")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[rstest]
#[tokio::test]
async fn recommendation_lists_eligible_formats(#[future] app: TestApp) {
    let app = app.await;
    let (status, body) = send(
        &app.router,
        Method::GET,
        &format!("/api/v1/books/{}/recommendation", app.book_id),
        Some(MEMBER),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recommendedRentalType"], "EBOOK");
    assert_eq!(body["eligibleRentalTypes"], json!(["EBOOK", "HARDCOPY"]));
}

fn subscription_request(user_id: UserId, plan_id: SubscriptionPlanId, days: i64) -> Value {
    json!({ "userId": user_id, "subscriptionPlanId": plan_id, "durationDays": days })
}

#[rstest]
#[case(0)]
#[case(400)]
#[tokio::test]
async fn subscription_duration_is_validated(#[future] app: TestApp, #[case] days: i64) {
    let app = app.await;
    let body = subscription_request(app.member_id, SubscriptionPlanId::new(), days);
    let (status, res) = send(
        &app.router,
        Method::POST,
        "/api/v1/subscriptions",
        Some(PAYMENT),
        Some(body),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res["code"], "validation_error");
}

#[rstest]
#[tokio::test]
async fn member_cannot_subscribe_without_payment(#[future] app: TestApp) {
    let app = app.await;
    let plan_id = SubscriptionPlanId::new();
    app.store.catalog.put_plan(plan_id, [app.book_id]).await;

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/v1/subscriptions",
        Some(MEMBER),
        Some(subscription_request(app.member_id, plan_id, 30)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let (_, access) = send(
        &app.router,
        Method::GET,
        &format!("/api/v1/books/{}/access", app.book_id),
        Some(MEMBER),
        None,
    )
    .await;
    assert_eq!(access["hasAccess"], false);
}

#[rstest]
#[tokio::test]
async fn payment_service_subscribes_member(#[future] app: TestApp) {
    let app = app.await;
    let plan_id = SubscriptionPlanId::new();
    app.store.catalog.put_plan(plan_id, [app.book_id]).await;

    let (status, subscription) = send(
        &app.router,
        Method::POST,
        "/api/v1/subscriptions",
        Some(PAYMENT),
        Some(subscription_request(app.member_id, plan_id, 30)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(subscription["userId"], json!(app.member_id));

    let (status, access) = send(
        &app.router,
        Method::GET,
        &format!("/api/v1/books/{}/access", app.book_id),
        Some(MEMBER),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(access["channel"], "SUBSCRIPTION");
}

#[rstest]
#[tokio::test]
async fn subscribing_to_unknown_plan_is_not_found(#[future] app: TestApp) {
    let app = app.await;
    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/v1/subscriptions",
        Some(PAYMENT),
        Some(subscription_request(
            app.member_id,
            SubscriptionPlanId::new(),
            30,
        )),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[rstest]
#[tokio::test]
async fn grant_list_belongs_to_caller(#[future] app: TestApp) {
    let app = app.await;
    let purchases = format!("/api/v1/books/{}/purchases", app.book_id);
    let (status, _) = send(
        &app.router,
        Method::POST,
        &purchases,
        Some(MEMBER),
        Some(rental_request("EBOOK")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, mine) = send(&app.router, Method::GET, "/api/v1/grants", Some(MEMBER), None).await;
    let (_, theirs) = send(
        &app.router,
        Method::GET,
        "/api/v1/grants",
        Some(OTHER_MEMBER),
        None,
    )
    .await;

    assert_eq!(mine["items"].as_array().unwrap().len(), 1);
    assert_eq!(mine["items"][0]["channel"], "PURCHASE");
    assert!(theirs["items"].as_array().unwrap().is_empty());
}
