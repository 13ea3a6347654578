//! End-to-end flows through the axum router

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use catalog_server::api::build_app;
use catalog_server::services::LocalImageStore;
use catalog_server::{CatalogStore, Config, ServerState};
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use image::ImageFormat;
use serde_json::{Value, json};
use tower::ServiceExt;

const BOUNDARY: &str = "relux-test-boundary";

struct TestApp {
    app: Router,
    _dir: tempfile::TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_work_dir(dir.path());

        let store = CatalogStore::open_in_memory().await.unwrap();
        store.seed_defaults(&config.admin).await.unwrap();
        let images = Arc::new(LocalImageStore::new(&config.uploads_dir));
        let state = ServerState::new(config, store, images);

        Self {
            app: build_app(state),
            _dir: dir,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    async fn json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = self.send(request).await;
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, value)
    }

    async fn login(&self) -> String {
        let (status, body) = self
            .json(json_request(
                "POST",
                "/api/auth/login",
                None,
                json!({"email": "admin@relux.com", "password": "admin123"}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn delete(uri: &str, token: &str) -> Request<Body> {
    Request::delete(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

/// Encoded 2x2 image in `format`
fn image_bytes(format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::DynamicImage::new_rgb8(2, 2)
        .write_to(&mut std::io::Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}

/// multipart/form-data with text fields and an optional
/// (file name, content type, bytes) image part
fn multipart_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    fields: &[(&str, &str)],
    image: Option<(&str, &str, &[u8])>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, content_type, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; \
                 filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body)).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::new().await;
    let (status, body) = app.json(get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn login_and_verify() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({"email": "admin@relux.com", "password": "wrong"}),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1002);

    let token = app.login().await;
    let verify = Request::get("/api/auth/verify")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.json(verify).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["admin"]["email"], "admin@relux.com");

    let (status, _) = app.json(get("/api/auth/verify")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn mutations_require_admin() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json(json_request("POST", "/api/categories", None, json!({"name": "Cinturones"})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1001);

    let (status, _) = app
        .json(multipart_request(
            "POST",
            "/api/products",
            Some("not-a-token"),
            &[("name", "Reloj"), ("price", "100")],
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, categories) = app.json(get("/api/categories")).await;
    assert_eq!(categories.as_array().unwrap().len(), 4);
    let (_, products) = app.json(get("/api/products")).await;
    assert!(products.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn category_crud() {
    let app = TestApp::new().await;
    let token = app.login().await;

    let (status, created) = app
        .json(json_request(
            "POST",
            "/api/categories",
            Some(&token),
            json!({"name": "Cinturones Clásicos", "description": "Cuero"}),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["slug"], "cinturones-clasicos");
    let id = created["id"].as_i64().unwrap();

    let (status, _) = app
        .json(json_request(
            "POST",
            "/api/categories",
            Some(&token),
            json!({"name": "cinturones clasicos"}),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, updated) = app
        .json(json_request(
            "PUT",
            &format!("/api/categories/{id}"),
            Some(&token),
            json!({"name": "Cinturones"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["slug"], "cinturones");
    assert_eq!(updated["description"], "Cuero");

    let (status, found) = app.json(get("/api/categories/cinturones")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["id"], id);

    let (status, _) = app.json(delete(&format!("/api/categories/{id}"), &token)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.json(get("/api/categories/cinturones")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn symbol_only_category_names() {
    let app = TestApp::new().await;
    let token = app.login().await;

    let (status, created) = app
        .json(json_request(
            "POST",
            "/api/categories",
            Some(&token),
            json!({"name": "***"}),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "***");
    assert_eq!(created["slug"], "");

    let (status, body) = app
        .json(json_request(
            "POST",
            "/api/categories",
            Some(&token),
            json!({"name": "¡¡!!"}),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 6103);

    let (status, _) = app
        .json(json_request(
            "POST",
            "/api/categories",
            Some(&token),
            json!({"name": "   "}),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn product_lifecycle_with_image() {
    let app = TestApp::new().await;
    let token = app.login().await;

    let (_, relojes) = app.json(get("/api/categories/relojes")).await;
    let category_id = relojes["id"].as_i64().unwrap().to_string();
    let first_image = image_bytes(ImageFormat::Png);
    let second_image = image_bytes(ImageFormat::Jpeg);

    let (status, created) = app
        .json(multipart_request(
            "POST",
            "/api/products",
            Some(&token),
            &[
                ("name", "Reloj Clásico"),
                ("price", "100000"),
                ("discount_percent", "20"),
                ("category_id", &category_id),
            ],
            Some(("reloj.png", "image/png", first_image.as_slice())),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["effective_price"], 80000.0);
    assert_eq!(created["has_discount"], true);
    assert_eq!(created["category_slug"], "relojes");
    let id = created["id"].as_i64().unwrap();
    let first_url = created["image_url"].as_str().unwrap().to_string();
    assert!(first_url.starts_with("/uploads/") && first_url.ends_with(".png"));

    let (status, served) = app.send(get(&first_url)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(served, first_image);

    // partial update keeps everything else
    let (status, updated) = app
        .json(multipart_request(
            "PUT",
            &format!("/api/products/{id}"),
            Some(&token),
            &[("stock", "5")],
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["stock"], 5);
    assert_eq!(updated["name"], "Reloj Clásico");
    assert_eq!(updated["price"], 100000.0);
    assert_eq!(updated["image_url"], first_url.as_str());
    assert!(updated["updated_at"].as_i64() > created["updated_at"].as_i64());

    // image replacement removes the old file
    let (status, replaced) = app
        .json(multipart_request(
            "PUT",
            &format!("/api/products/{id}"),
            Some(&token),
            &[],
            Some(("reloj.jpg", "image/jpeg", second_image.as_slice())),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let second_url = replaced["image_url"].as_str().unwrap().to_string();
    assert_ne!(second_url, first_url);

    let (_, read) = app.json(get(&format!("/api/products/{id}"))).await;
    assert_eq!(read["image_url"], second_url.as_str());
    let (status, _) = app.send(get(&first_url)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // delete removes row and file
    let (status, _) = app.json(delete(&format!("/api/products/{id}"), &token)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.json(get(&format!("/api/products/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(get(&second_url)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn product_validation_errors() {
    let app = TestApp::new().await;
    let token = app.login().await;

    let (status, body) = app
        .json(multipart_request(
            "POST",
            "/api/products",
            Some(&token),
            &[("name", "Sin precio")],
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "price");

    let (status, _) = app
        .json(multipart_request(
            "POST",
            "/api/products",
            Some(&token),
            &[("name", "Gif"), ("price", "10")],
            Some(("anim.gif", "image/gif", b"GIF89a".as_slice())),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // a script named .png, declared and actual content both checked
    let (status, body) = app
        .json(multipart_request(
            "POST",
            "/api/products",
            Some(&token),
            &[("name", "Script"), ("price", "10")],
            Some(("x.png", "image/png", b"#!/bin/sh\necho not an image".as_slice())),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 6502);

    let png = image_bytes(ImageFormat::Png);
    let (status, body) = app
        .json(multipart_request(
            "POST",
            "/api/products",
            Some(&token),
            &[("name", "Texto"), ("price", "10")],
            Some(("x.png", "text/plain", png.as_slice())),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 6502);

    let (status, _) = app
        .json(multipart_request(
            "PUT",
            "/api/products/999",
            Some(&token),
            &[("stock", "1")],
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, products) = app.json(get("/api/products")).await;
    assert!(products.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn listing_filters_and_cart_quote() {
    let app = TestApp::new().await;
    let token = app.login().await;

    let (_, grabados) = app.json(get("/api/categories/grabados")).await;
    let grabados_id = grabados["id"].as_i64().unwrap().to_string();

    let mut ids = Vec::new();
    for (name, price, category) in [
        ("Tarjetero", "30000", None),
        ("Grabado", "45000", Some(grabados_id.as_str())),
        ("Oculto", "10000", None),
    ] {
        let mut fields = vec![("name", name), ("price", price)];
        if let Some(category) = category {
            fields.push(("category_id", category));
        }
        let (status, created) = app
            .json(multipart_request("POST", "/api/products", Some(&token), &fields, None))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(created["id"].as_i64().unwrap());
    }

    let (status, _) = app
        .json(multipart_request(
            "PUT",
            &format!("/api/products/{}", ids[2]),
            Some(&token),
            &[("is_active", "false")],
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, all) = app.json(get("/api/products")).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, active) = app.json(get("/api/products?active_only=true")).await;
    let active = active.as_array().unwrap();
    assert_eq!(active.len(), 2);
    assert!(active.iter().all(|p| p["is_active"] == true));

    let (_, engraved) = app.json(get("/api/products?category=grabados")).await;
    let engraved = engraved.as_array().unwrap();
    assert_eq!(engraved.len(), 1);
    assert_eq!(engraved[0]["category_name"], "Grabados");

    let (status, quote) = app
        .json(json_request(
            "POST",
            "/api/cart/quote",
            None,
            json!([
                {"product_id": ids[0], "quantity": 2},
                {"product_id": ids[1], "quantity": 1}
            ]),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["total"], 105000.0);
    assert_eq!(quote["item_count"], 3);

    let (status, _) = app
        .json(json_request(
            "POST",
            "/api/cart/quote",
            None,
            json!([{"product_id": ids[2], "quantity": 1}]),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
