use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::post,
};
use futures_util::{StreamExt, stream};
use finsight_core::ClassifierConfig;
use finsight_finance::{Classification, Classifier, PredictError, PredictRequest};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Serve `app` on an ephemeral local port and return its base URL.
async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn classifier_for(base: String) -> Classifier {
    Classifier::new(ClassifierConfig {
        ml_service_url: base,
        ..ClassifierConfig::default()
    })
    .unwrap()
}

fn fixed_response(body: Value) -> Router {
    Router::new().route(
        "/predict",
        post(move || {
            let body = body.clone();
            async move { Json(body) }
        }),
    )
}

#[tokio::test]
async fn test_model_result_is_used_on_success() {
    let base = spawn_server(fixed_response(json!({"category": "Food", "confidence": 0.92}))).await;
    let out = classifier_for(base).classify("lunch with team", None).await;

    assert!(!out.is_fallback());
    assert_eq!(out.source(), "model");
    let r = out.into_result();
    assert_eq!(r.category, "Food");
    assert_eq!(r.confidence, 0.92);
    assert_eq!(r.merchant, "");
}

#[tokio::test]
async fn test_model_category_passes_through_unvalidated() {
    let base = spawn_server(fixed_response(json!({"category": "Pets", "confidence": 0.7}))).await;
    let out = classifier_for(base).classify("dog food", None).await;
    assert_eq!(out, Classification::Model(finsight_core::ClassificationResult {
        category: "Pets".to_string(),
        confidence: 0.7,
        merchant: String::new(),
    }));
}

#[tokio::test]
async fn test_local_merchant_beats_remote_merchant() {
    let base = spawn_server(fixed_response(
        json!({"category": "Shopping", "confidence": 0.8, "merchant": "Remote Mart"}),
    ))
    .await;
    let c = classifier_for(base);

    let with_local = c.classify("Paid Rs. 450 to Acme Store via UPI", None).await;
    assert_eq!(with_local.result().merchant, "Acme Store");

    let without_local = c.classify("misc purchase", None).await;
    assert_eq!(without_local.result().merchant, "Remote Mart");
}

#[tokio::test]
async fn test_payload_carries_parsed_fields_and_hint() {
    let seen: Arc<Mutex<Vec<Value>>> = Arc::default();
    let app = Router::new()
        .route(
            "/predict",
            post(|State(seen): State<Arc<Mutex<Vec<Value>>>>, Json(body): Json<Value>| async move {
                seen.lock().unwrap().push(body);
                Json(json!({"category": "Other", "confidence": 0.5}))
            }),
        )
        .with_state(seen.clone());
    let c = classifier_for(spawn_server(app).await);

    c.classify("Paid Rs. 450 to Acme Store via UPI", None).await;
    c.classify("Paid Rs. 450 to Acme Store via UPI", Some(99.0)).await;
    c.classify("coffee", None).await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    assert_eq!(
        seen[0],
        json!({"text": "Paid Rs. 450 to Acme Store via UPI", "amount": 450.0, "merchant": "Acme Store"})
    );
    assert_eq!(seen[1]["amount"], json!(99.0));
    assert_eq!(seen[2], json!({"text": "coffee", "amount": null, "merchant": ""}));
}

#[tokio::test]
async fn test_timeout_falls_back_to_rules() {
    let app = Router::new().route(
        "/predict",
        post(|| async {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            Json(json!({"category": "Shopping", "confidence": 0.99}))
        }),
    );
    let c = classifier_for(spawn_server(app).await);
    assert_eq!(c.config().timeout_ms, 1000);

    let started = Instant::now();
    let out = c.classify("Swiggy order", None).await;
    assert!(started.elapsed() < Duration::from_millis(1450));

    assert!(out.is_fallback());
    assert_eq!(out.result().category, "Food");
    assert_eq!(out.result().confidence, 0.6);
    assert_eq!(out.result().merchant, "");
}

#[tokio::test]
async fn test_stalled_body_falls_back_without_partial_result() {
    let app = Router::new().route(
        "/predict",
        post(|| async {
            let chunks = stream::iter([Ok::<_, std::io::Error>(r#"{"category":"Shopping","#)])
                .chain(stream::once(async {
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    Ok(r#""confidence":0.99}"#)
                }));
            ([(header::CONTENT_TYPE, "application/json")], Body::from_stream(chunks)).into_response()
        }),
    );
    let c = classifier_for(spawn_server(app).await);

    let started = Instant::now();
    let out = c.classify("Swiggy order", None).await;
    assert!(started.elapsed() < Duration::from_millis(2500));

    assert!(out.is_fallback());
    assert_eq!(out.result().category, "Food");
    assert_eq!(out.result().confidence, 0.6);
}

#[tokio::test]
async fn test_timeout_is_reported_as_timeout() {
    let app = Router::new().route(
        "/predict",
        post(|| async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Json(json!({"category": "Food", "confidence": 0.9}))
        }),
    );
    let c = Classifier::new(ClassifierConfig {
        ml_service_url: spawn_server(app).await,
        timeout_ms: 100,
        ..ClassifierConfig::default()
    })
    .unwrap();
    let req = PredictRequest {
        text: "x".to_string(),
        amount: None,
        merchant: String::new(),
    };
    assert!(matches!(c.predict(&req).await, Err(PredictError::Timeout(_))));
}

#[tokio::test]
async fn test_error_status_falls_back() {
    let app = Router::new().route(
        "/predict",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model not loaded") }),
    );
    let c = classifier_for(spawn_server(app).await);
    let req = PredictRequest {
        text: "Netflix".to_string(),
        amount: None,
        merchant: String::new(),
    };
    match c.predict(&req).await {
        Err(PredictError::Status(status)) => assert_eq!(status.as_u16(), 500),
        other => panic!("expected status error, got {other:?}"),
    }

    let out = c.classify("Netflix", None).await;
    assert!(out.is_fallback());
    assert_eq!(out.result().category, "Entertainment");
}

#[tokio::test]
async fn test_malformed_body_falls_back() {
    let not_json = Router::new().route("/predict", post(|| async { "definitely not json" }));
    let missing_field = fixed_response(json!({"label": "Food", "score": 0.9}));
    let empty_category = fixed_response(json!({"category": "  ", "confidence": 0.9}));

    for app in [not_json, missing_field, empty_category] {
        let c = classifier_for(spawn_server(app).await);
        let req = PredictRequest {
            text: "Apollo Pharmacy".to_string(),
            amount: None,
            merchant: String::new(),
        };
        assert!(matches!(c.predict(&req).await, Err(PredictError::Malformed(_))));

        let out = c.classify("Apollo Pharmacy", None).await;
        assert!(out.is_fallback());
        assert_eq!(out.result().category, "Health");
        assert_eq!(out.result().confidence, 0.6);
    }
}

#[tokio::test]
async fn test_connection_refused_falls_back() {
    // grab a free port, then close it
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let c = classifier_for(format!("http://{addr}"));
    let req = PredictRequest {
        text: "x".to_string(),
        amount: None,
        merchant: String::new(),
    };
    assert!(matches!(c.predict(&req).await, Err(PredictError::Connect(_))));

    let out = c.classify("", None).await;
    assert!(out.is_fallback());
    assert_eq!(out.result().category, "Other");
}

#[tokio::test]
async fn test_classify_all_mixes_paths_independently() {
    let app = Router::new().route(
        "/predict",
        post(|Json(body): Json<Value>| async move {
            if body["text"] == "fail me" {
                (StatusCode::BAD_GATEWAY, Json(json!({})))
            } else {
                (StatusCode::OK, Json(json!({"category": "Bills", "confidence": 0.88})))
            }
        }),
    );
    let c = classifier_for(spawn_server(app).await);
    let out = c
        .classify_all([("electricity", None), ("fail me", None), ("phone", Some(10.0))])
        .await;

    assert_eq!(out.len(), 3);
    assert_eq!(out[0].source(), "model");
    assert!(out[1].is_fallback());
    assert_eq!(out[1].result().category, "Other");
    assert_eq!(out[2].result().confidence, 0.88);
}
