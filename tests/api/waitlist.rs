use anyhow::Result;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::helpers::TestApp;

fn valid_signup() -> Value {
    json!({
        "fullName": "Ursula Le Guin",
        "email": "  Ursula.LeGuin@Example.com ",
        "phone": " +1 (555) 010-0100 ",
        "interests": ["books", "rust"]
    })
}

// ###################################
// ->   POST /api/waitlist
// ###################################
#[tokio::test]
async fn signup_returns_201_with_the_normalized_email() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app.post_waitlist(&valid_signup()).await?;
    assert_eq!(StatusCode::CREATED, res.status());

    let body: Value = res.json().await?;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Successfully joined the waitlist!"));
    assert_eq!(body["data"]["email"], json!("ursula.leguin@example.com"));
    let id: Uuid = body["data"]["id"].as_str().unwrap_or_default().parse()?;
    let _created_at: DateTime<Utc> = body["data"]["created_at"]
        .as_str()
        .unwrap_or_default()
        .parse()?;

    let (stored_id, full_name, email, phone, interests): (Uuid, String, String, String, Vec<String>) =
        sqlx::query_as("SELECT id, full_name, email, phone, interests FROM waitlist")
            .fetch_one(app.mm.db())
            .await?;

    assert_eq!(id, stored_id);
    assert_eq!(full_name, "Ursula Le Guin");
    assert_eq!(email, "ursula.leguin@example.com");
    assert_eq!(phone, "+1 (555) 010-0100");
    assert_eq!(interests, ["books", "rust"]);

    Ok(())
}

#[tokio::test]
async fn signup_without_interests_stores_an_empty_list() -> Result<()> {
    let app = TestApp::spawn().await?;

    for (body, email) in [
        (
            json!({"fullName": "John Doe", "email": "jd@example.com", "phone": "5550100"}),
            "jd@example.com",
        ),
        (
            json!({"fullName": "Jane Doe", "email": "jane@example.com", "phone": "5550101", "interests": null}),
            "jane@example.com",
        ),
    ] {
        let res = app.post_waitlist(&body).await?;
        assert_eq!(StatusCode::CREATED, res.status());

        let interests: Vec<String> =
            sqlx::query_scalar("SELECT interests FROM waitlist WHERE email = $1")
                .bind(email)
                .fetch_one(app.mm.db())
                .await?;
        assert!(interests.is_empty());
    }

    Ok(())
}

#[tokio::test]
async fn signup_accepts_whitespace_only_name_and_phone() -> Result<()> {
    let app = TestApp::spawn().await?;

    let body = json!({"fullName": "   ", "email": "blank@example.com", "phone": "  "});
    let res = app.post_waitlist(&body).await?;
    assert_eq!(StatusCode::CREATED, res.status());

    let (full_name, phone): (String, String) =
        sqlx::query_as("SELECT full_name, phone FROM waitlist WHERE email = $1")
            .bind("blank@example.com")
            .fetch_one(app.mm.db())
            .await?;
    assert_eq!(full_name, "   ");
    assert_eq!(phone, "");

    Ok(())
}

#[tokio::test]
async fn signup_accepts_a_long_name() -> Result<()> {
    let app = TestApp::spawn().await?;

    let name = "a".repeat(300);
    let body = json!({"fullName": name, "email": "long@example.com", "phone": "5550100"});
    let res = app.post_waitlist(&body).await?;
    assert_eq!(StatusCode::CREATED, res.status());

    let full_name: String = sqlx::query_scalar("SELECT full_name FROM waitlist")
        .fetch_one(app.mm.db())
        .await?;
    assert_eq!(full_name, name);

    Ok(())
}

#[tokio::test]
async fn signup_with_a_duplicate_email_returns_409() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app.post_waitlist(&valid_signup()).await?;
    assert_eq!(StatusCode::CREATED, res.status());

    // Same address, different casing and padding.
    let duplicate = json!({
        "fullName": "Someone Else",
        "email": "ursula.leguin@EXAMPLE.COM",
        "phone": "5550199"
    });
    let res = app.post_waitlist(&duplicate).await?;
    assert_eq!(StatusCode::CONFLICT, res.status());

    let body: Value = res.json().await?;
    assert_eq!(body["error"], json!("This email is already on the waitlist"));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM waitlist")
        .fetch_one(app.mm.db())
        .await?;
    assert_eq!(1, count);

    Ok(())
}

#[tokio::test]
async fn signup_returns_500_with_store_diagnostics_when_the_store_fails() -> Result<()> {
    let app = TestApp::spawn().await?;
    sqlx::query("DROP TABLE waitlist")
        .execute(app.mm.db())
        .await?;

    let res = app.post_waitlist(&valid_signup()).await?;
    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, res.status());

    let body: Value = res.json().await?;
    assert_eq!(
        body["error"],
        json!("Failed to join waitlist. Please try again.")
    );
    // undefined_table
    assert_eq!(body["code"], json!("42P01"));
    assert!(body["details"].is_string());

    Ok(())
}

#[tokio::test]
async fn signup_missing_required_fields_returns_400() -> Result<()> {
    let app = TestApp::spawn_without_db().await?;

    let cases = [
        (
            json!({"email": "jd@example.com", "phone": "5550100"}),
            "Missing fullName",
        ),
        (
            json!({"fullName": "John Doe", "phone": "5550100"}),
            "Missing email",
        ),
        (
            json!({"fullName": "John Doe", "email": "jd@example.com"}),
            "Missing phone",
        ),
        (
            json!({"fullName": null, "email": "jd@example.com", "phone": "5550100"}),
            "Null fullName",
        ),
        (
            json!({"fullName": "", "email": "jd@example.com", "phone": "5550100"}),
            "Empty fullName",
        ),
        (json!({}), "Empty json"),
    ];

    for (body, description) in cases {
        let res = app.post_waitlist(&body).await?;
        assert_eq!(
            StatusCode::BAD_REQUEST,
            res.status(),
            "The API did not return a 400 BAD REQUEST when the payload was: {description}"
        );
        let body: Value = res.json().await?;
        assert_eq!(body["error"], json!("Missing required fields"), "{description}");
    }

    Ok(())
}

#[tokio::test]
async fn signup_with_invalid_fields_returns_400() -> Result<()> {
    let app = TestApp::spawn_without_db().await?;

    let cases = [
        (
            json!({"fullName": "John Doe", "email": "not an email", "phone": "5550100"}),
            "Invalid email format",
        ),
        (
            json!({"fullName": "John Doe", "email": "jd@example", "phone": "5550100"}),
            "Invalid email format",
        ),
        (
            json!({"fullName": "John Doe", "email": "   ", "phone": "5550100"}),
            "Invalid email format",
        ),
        (
            json!({"fullName": "John Doe", "email": "jd@example.com", "phone": "call me"}),
            "Invalid phone number format",
        ),
        (
            json!({"fullName": "John Doe", "email": "jd@example.com", "phone": "555.010.0100"}),
            "Invalid phone number format",
        ),
    ];

    for (body, expected_error) in cases {
        let res = app.post_waitlist(&body).await?;
        assert_eq!(StatusCode::BAD_REQUEST, res.status(), "payload: {body}");
        let res_body: Value = res.json().await?;
        assert_eq!(res_body["error"], json!(expected_error), "payload: {body}");
    }

    Ok(())
}

#[tokio::test]
async fn signup_with_a_malformed_body_returns_400() -> Result<()> {
    let app = TestApp::spawn_without_db().await?;

    let res = app
        .http_client
        .post(app.waitlist_url())
        .header("content-type", "application/json")
        .body(r#"{"fullName": "John Doe", "email": "#)
        .send()
        .await?;
    assert_eq!(StatusCode::BAD_REQUEST, res.status());

    let res = app
        .post_waitlist(&json!({"fullName": "John Doe", "email": 42, "phone": "5550100"}))
        .await?;
    assert_eq!(StatusCode::BAD_REQUEST, res.status());

    let body: Value = res.json().await?;
    assert_eq!(body["error"], json!("Invalid request body"));

    Ok(())
}

#[tokio::test]
async fn error_body_carries_the_request_id() -> Result<()> {
    let app = TestApp::spawn_without_db().await?;

    let res = app.post_waitlist(&json!({})).await?;
    let req_id = res
        .headers()
        .get("x-request-id")
        .and_then(|id| id.to_str().ok())
        .map(ToOwned::to_owned);

    let body: Value = res.json().await?;
    assert!(req_id.is_some());
    assert_eq!(body["req_id"].as_str(), req_id.as_deref());

    Ok(())
}

// ###################################
// ->   GET /api/waitlist
// ###################################
#[tokio::test]
async fn exists_reports_known_and_unknown_emails() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app.post_waitlist(&valid_signup()).await?;
    assert_eq!(StatusCode::CREATED, res.status());

    for (email, expected) in [
        ("ursula.leguin@example.com", true),
        (" URSULA.LEGUIN@example.com ", true),
        ("someone.else@example.com", false),
    ] {
        let res = app.get_waitlist_exists(email).await?;
        assert_eq!(StatusCode::OK, res.status());

        let body: Value = res.json().await?;
        assert_eq!(json!({ "exists": expected }), body, "email: {email}");
    }

    Ok(())
}

#[tokio::test]
async fn exists_with_a_whitespace_only_email_is_a_negative_result() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app.get_waitlist_exists("   ").await?;
    assert_eq!(StatusCode::OK, res.status());

    let body: Value = res.json().await?;
    assert_eq!(json!({ "exists": false }), body);

    Ok(())
}

#[tokio::test]
async fn exists_with_a_repeated_email_uses_the_first_one() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app.post_waitlist(&valid_signup()).await?;
    assert_eq!(StatusCode::CREATED, res.status());

    for (query, expected) in [
        (
            [("email", "ursula.leguin@example.com"), ("email", "someone.else@example.com")],
            true,
        ),
        (
            [("email", "someone.else@example.com"), ("email", "ursula.leguin@example.com")],
            false,
        ),
    ] {
        let res = app
            .http_client
            .get(app.waitlist_url())
            .query(&query)
            .send()
            .await?;
        assert_eq!(StatusCode::OK, res.status());

        let body: Value = res.json().await?;
        assert_eq!(json!({ "exists": expected }), body, "query: {query:?}");
    }

    Ok(())
}

#[tokio::test]
async fn exists_without_email_returns_400() -> Result<()> {
    let app = TestApp::spawn_without_db().await?;

    let res = app.http_client.get(app.waitlist_url()).send().await?;
    assert_eq!(StatusCode::BAD_REQUEST, res.status());
    let body: Value = res.json().await?;
    assert_eq!(body["error"], json!("Email parameter required"));

    let res = app.get_waitlist_exists("").await?;
    assert_eq!(StatusCode::BAD_REQUEST, res.status());

    Ok(())
}

#[tokio::test]
async fn exists_returns_500_when_the_store_fails() -> Result<()> {
    let app = TestApp::spawn().await?;
    sqlx::query("DROP TABLE waitlist")
        .execute(app.mm.db())
        .await?;

    let res = app.get_waitlist_exists("jd@example.com").await?;
    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, res.status());

    let body: Value = res.json().await?;
    assert_eq!(body["error"], json!("Failed to check email"));

    Ok(())
}
