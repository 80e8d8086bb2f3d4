mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

// Protected endpoints must reject the request before any handler logic
// runs: no token, malformed scheme and garbage tokens are all 401.

#[tokio::test]
async fn protected_routes_require_a_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    for (method, path) in [
        ("GET", "/api/auth/me"),
        ("POST", "/api/auth/refresh-token"),
        ("PUT", "/api/users/profile"),
        ("DELETE", "/api/users/account"),
        ("GET", "/api/users/forums"),
        ("POST", "/api/media/upload"),
    ] {
        let url = format!("{}{}", server.base_url, path);
        let req = match method {
            "GET" => client.get(&url),
            "POST" => client.post(&url).json(&json!({})),
            "PUT" => client.put(&url).json(&json!({})),
            "DELETE" => client.delete(&url),
            _ => unreachable!(),
        };
        let res = req.send().await?;
        assert_eq!(
            res.status(),
            StatusCode::UNAUTHORIZED,
            "{} {} should be 401 without a token",
            method,
            path
        );

        let body = res.json::<serde_json::Value>().await?;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }
    Ok(())
}

#[tokio::test]
async fn garbage_bearer_token_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/auth/me", server.base_url))
        .header("Authorization", "Bearer not.a.jwt")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn non_bearer_scheme_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/auth/me", server.base_url))
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn register_validates_before_touching_storage() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // Invalid email and a short password: rejected at the boundary with a
    // field error map, regardless of database availability
    let res = client
        .post(format!("{}/api/auth/register", server.base_url))
        .json(&json!({
            "email": "not-an-email",
            "username": "x",
            "password": "short"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"].get("email").is_some());
    assert!(body["field_errors"].get("password").is_some());
    Ok(())
}

#[tokio::test]
async fn reaction_kind_is_validated_for_authenticated_shape() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // Without a token the reaction endpoint rejects before validation
    let res = client
        .post(format!(
            "{}/api/forums/00000000-0000-0000-0000-000000000000/react",
            server.base_url
        ))
        .json(&json!({ "kind": "like" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
