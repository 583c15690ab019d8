mod common;

use astrometric_core::domain::Role;
use astrometric_core::ports::{HttpMethod, RequestBody};
use bytes::Bytes;
use client_lib::api::analyses::{self, AnalysisMode, AnalysisQuery, AnalysisStatus, NewAnalysis};
use client_lib::api::{auth, datasets, labels, leaderboard};
use client_lib::{ClientError, ClientOptions, ErrorClass};
use common::{json, Harness, ScriptedTransport};
use serde_json::{json as j, Value};

fn sent_json(body: &RequestBody) -> Value {
    match body {
        RequestBody::Json(bytes) => serde_json::from_slice(bytes).unwrap(),
        other => panic!("expected a JSON body, got {other:?}"),
    }
}

#[tokio::test]
async fn login_stores_the_issued_session() {
    let transport = ScriptedTransport::new(|_| {
        json(
            200,
            j!({
                "access_token": "acc-1",
                "refresh_token": "ref-1",
                "user": {"id": 7, "email": "vera@example.org", "name": "Vera", "role": "researcher"}
            }),
        )
    });
    let harness = Harness::new(transport, ClientOptions::default());

    let user = auth::login(&harness.client, "vera@example.org", "hunter22")
        .await
        .unwrap();

    assert_eq!(user.role, Role::Researcher);
    let session = harness.client.session();
    assert!(session.is_researcher());
    assert_eq!(session.access_token().as_deref(), Some("acc-1"));
    assert_eq!(session.refresh_token().as_deref(), Some("ref-1"));

    let requests = harness.transport.requests();
    let request = &requests[0];
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.path, "/api/auth/login");
    assert_eq!(request.bearer, None);
    let body = sent_json(&request.body);
    assert_eq!(body["email"], "vera@example.org");
    assert_eq!(body["password"], "hunter22");
}

#[tokio::test]
async fn rejected_login_leaves_the_session_untouched() {
    let transport = ScriptedTransport::new(|_| json(401, j!({ "error": "Invalid credentials" })));
    let harness = Harness::new(transport, ClientOptions::default());

    let err = auth::login(&harness.client, "vera@example.org", "wrong")
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert!(!harness.client.session().is_authenticated());
    assert_eq!(harness.notification_messages(), vec!["Invalid credentials"]);
}

#[tokio::test]
async fn signup_without_tokens_does_not_sign_in() {
    let transport = ScriptedTransport::new(|_| {
        json(
            201,
            j!({ "message": "User created", "user": {"id": 12, "email": "new@example.org", "role": "user"} }),
        )
    });
    let harness = Harness::new(transport, ClientOptions::default());

    let request = auth::SignupRequest::new("new@example.org", "s3cret-pass").with_name("Nova");
    let user = auth::signup(&harness.client, &request).await.unwrap();

    assert_eq!(user.id, 12);
    assert!(!harness.client.session().is_authenticated());
    let body = sent_json(&harness.transport.requests()[0].body);
    assert_eq!(body["name"], "Nova");
    assert!(body.get("role").is_none());
}

#[tokio::test]
async fn dataset_listing_sends_paging_and_visibility() {
    let transport = ScriptedTransport::new(|_| {
        json(
            200,
            j!({
                "datasets": [{"id": 1, "filename": "koi.csv", "user_id": 11, "rows": 40}],
                "pagination": {"page": 2, "per_page": 100, "total": 101, "pages": 2}
            }),
        )
    });
    let harness = Harness::new(transport, ClientOptions::default());
    harness.sign_in("tok", Some("ref"));

    let page = datasets::list(
        &harness.client,
        datasets::DatasetQuery {
            page: 2,
            per_page: 250,
            show_public: false,
        },
    )
    .await
    .unwrap();

    assert_eq!(page.items.len(), 1);
    assert!(!page.pagination.has_next());
    let query = harness.transport.requests()[0].query.clone();
    assert_eq!(
        query,
        vec![
            ("page".to_string(), "2".to_string()),
            ("per_page".to_string(), "100".to_string()),
            ("show_public".to_string(), "false".to_string()),
        ]
    );
}

#[tokio::test]
async fn upload_refuses_unsupported_files_locally() {
    let transport = ScriptedTransport::new(|_| json(200, j!({})));
    let harness = Harness::new(transport, ClientOptions::default());
    harness.sign_in("tok", Some("ref"));

    let err = datasets::upload(&harness.client, "light_curve.fits", Bytes::from_static(b"SIMPLE"), false)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::InvalidInput(_)));
    assert_eq!(err.class(), ErrorClass::Local);
    assert!(harness.transport.requests().is_empty());
}

#[tokio::test]
async fn upload_sends_multipart_and_decodes_the_created_record() {
    // Exactly what the server answers for a JSON upload: no owner, no validation block.
    let transport = ScriptedTransport::new(|_| {
        json(
            201,
            j!({
                "message": "Dataset uploaded successfully",
                "dataset": {"id": 3, "filename": "tess.json", "rows": 2, "cols": 2, "is_public": true, "size_bytes": 29}
            }),
        )
    });
    let harness = Harness::new(transport, ClientOptions::default());
    harness.sign_in("tok", Some("ref"));

    let outcome = datasets::upload(
        &harness.client,
        "tess.json",
        Bytes::from_static(br#"[{"a":1,"b":2},{"a":3,"b":4}]"#),
        true,
    )
    .await
    .unwrap();

    assert_eq!(outcome.dataset.id, 3);
    assert!(outcome.dataset.is_public);
    assert_eq!(outcome.dataset.size_bytes, Some(29));
    assert!(outcome.validation.is_none());
    assert!(harness.client.notifications().is_empty());

    let requests = harness.transport.requests();
    let request = &requests[0];
    assert_eq!(request.path, "/api/datasets/upload");
    match &request.body {
        RequestBody::Multipart {
            field,
            file_name,
            content,
            fields,
        } => {
            assert_eq!(field, "file");
            assert_eq!(file_name, "tess.json");
            assert_eq!(content.as_ref(), br#"[{"a":1,"b":2},{"a":3,"b":4}]"#);
            assert_eq!(fields, &vec![("is_public".to_string(), "true".to_string())]);
        }
        other => panic!("expected multipart, got {other:?}"),
    }
}

#[tokio::test]
async fn csv_upload_carries_validation_warnings() {
    let transport = ScriptedTransport::new(|_| {
        json(
            201,
            j!({
                "message": "Dataset uploaded successfully",
                "dataset": {"id": 8, "filename": "koi.csv", "rows": 120, "cols": 9, "is_public": false, "size_bytes": 2048},
                "validation": {
                    "valid": true,
                    "warnings": [{"line": 0, "column": "", "error": "Found 12 empty rows in total", "value": ""}],
                    "summary": {"total_rows": 120, "total_columns": 9, "encoding_used": "utf-8",
                                "file_size_bytes": 2048, "missing_values": 4, "duplicate_rows": 0}
                }
            }),
        )
    });
    let harness = Harness::new(transport, ClientOptions::default());
    harness.sign_in("tok", Some("ref"));

    let outcome = datasets::upload(&harness.client, "koi.csv", Bytes::from_static(b"a,b\n1,2\n"), false)
        .await
        .unwrap();

    let validation = outcome.validation.unwrap();
    assert!(validation.valid);
    assert_eq!(validation.warnings.len(), 1);
    assert_eq!(validation.warnings[0].error, "Found 12 empty rows in total");
    assert_eq!(validation.summary.encoding_used.as_deref(), Some("utf-8"));
    assert_eq!(validation.summary.missing_values, Some(4));
}

#[tokio::test]
async fn rejected_csv_reports_validation_and_report_location() {
    let transport = ScriptedTransport::new(|_| {
        json(
            422,
            j!({
                "error": "CSV validation failed",
                "validation": {
                    "valid": false,
                    "errors": [
                        {"line": 4, "column": "koi_period", "error": "Expected numeric value", "value": "abc", "severity": "error"}
                    ],
                    "warnings": [],
                    "summary": {"total_rows": 10, "total_columns": 3}
                },
                "error_report_url": "/api/datasets/error-report/error_report_1f2e.txt"
            }),
        )
    });
    let harness = Harness::new(transport, ClientOptions::default());
    harness.sign_in("tok", Some("ref"));

    let err = datasets::upload(&harness.client, "bad.csv", Bytes::from_static(b"x"), false)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(422));
    assert_eq!(err.class(), ErrorClass::ServerRejected);
    match err {
        ClientError::ValidationFailed {
            message,
            validation,
            report_url,
        } => {
            assert_eq!(message, "CSV validation failed");
            assert!(!validation.valid);
            assert_eq!(validation.errors[0].line, 4);
            assert_eq!(validation.errors[0].severity.as_deref(), Some("error"));
            assert_eq!(
                report_url.as_deref(),
                Some("/api/datasets/error-report/error_report_1f2e.txt")
            );
        }
        other => panic!("expected a validation failure, got {other:?}"),
    }
    assert_eq!(harness.notification_messages(), vec!["CSV validation failed"]);
}

#[tokio::test]
async fn unprocessable_upload_without_detail_stays_a_plain_rejection() {
    let transport = ScriptedTransport::new(|_| json(422, j!({ "error": "Unreadable file" })));
    let harness = Harness::new(transport, ClientOptions::default());
    harness.sign_in("tok", Some("ref"));

    let err = datasets::upload(&harness.client, "bad.csv", Bytes::from_static(b"x"), false)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Api { status: 422, .. }));
    assert_eq!(err.server_message(), Some("Unreadable file"));
}

#[tokio::test]
async fn error_report_is_fetched_by_url_or_name() {
    let transport = ScriptedTransport::new(|_| {
        Ok(astrometric_core::ApiResponse::new(200, "CSV VALIDATION REPORT\n"))
    });
    let harness = Harness::new(transport, ClientOptions::default());
    harness.sign_in("tok", Some("ref"));

    let by_url = datasets::error_report(
        &harness.client,
        "/api/datasets/error-report/error_report_1f2e.txt",
    )
    .await
    .unwrap();
    datasets::error_report(&harness.client, "error_report_1f2e.txt")
        .await
        .unwrap();

    assert_eq!(by_url.as_ref(), b"CSV VALIDATION REPORT\n");
    let requests = harness.transport.requests();
    assert!(requests
        .iter()
        .all(|r| r.path == "/api/datasets/error-report/error_report_1f2e.txt"
            && r.method == HttpMethod::Get
            && r.bearer.as_deref() == Some("tok")));
}

#[tokio::test]
async fn change_password_puts_both_passwords() {
    let transport = ScriptedTransport::new(|_| json(200, j!({ "message": "Password updated successfully" })));
    let harness = Harness::new(transport, ClientOptions::default());
    harness.sign_in("tok", Some("ref"));

    let ack = auth::change_password(&harness.client, "old-pass", "new-pass-123")
        .await
        .unwrap();

    assert_eq!(ack.message, "Password updated successfully");
    let requests = harness.transport.requests();
    let request = &requests[0];
    assert_eq!(request.method, HttpMethod::Put);
    assert_eq!(request.path, "/api/auth/change-password");
    assert_eq!(request.bearer.as_deref(), Some("tok"));
    assert_eq!(
        sent_json(&request.body),
        j!({ "current_password": "old-pass", "new_password": "new-pass-123" })
    );
}

#[tokio::test]
async fn leaderboard_submission_posts_the_payload_verbatim() {
    let transport = ScriptedTransport::new(|_| json(201, j!({ "message": "Submission recorded" })));
    let harness = Harness::new(transport, ClientOptions::default());
    harness.sign_in("tok", Some("ref"));

    let submission = j!({ "run_id": 14, "dataset_id": 3, "metric": "f1", "value": 0.88 });
    let ack = leaderboard::submit(&harness.client, &submission).await.unwrap();

    assert_eq!(ack.message, "Submission recorded");
    let requests = harness.transport.requests();
    let request = &requests[0];
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.path, "/api/leaderboard/submit");
    assert_eq!(sent_json(&request.body), submission);
}

#[tokio::test]
async fn analyses_launch_and_list() {
    let transport = ScriptedTransport::new(|req| match req.method {
        HttpMethod::Post => json(
            201,
            j!({ "analysis": {"id": 5, "dataset_id": 1, "user_id": 11, "mode": "eda", "status": "pending"} }),
        ),
        _ => json(
            200,
            j!({
                "analyses": [
                    {"id": 5, "dataset_id": 1, "user_id": 11, "mode": "eda", "status": "done",
                     "metrics": {"rows": 40}, "finished_at": "2025-10-05T08:00:00"}
                ],
                "pagination": {"page": 1, "per_page": 10, "total": 1, "pages": 1}
            }),
        ),
    });
    let harness = Harness::new(transport, ClientOptions::default());
    harness.sign_in("tok", Some("ref"));

    let created = analyses::create(
        &harness.client,
        &NewAnalysis {
            dataset_id: 1,
            mode: AnalysisMode::Eda,
            params: j!({}),
        },
    )
    .await
    .unwrap();
    assert_eq!(created.status, AnalysisStatus::Pending);

    let page = analyses::list(
        &harness.client,
        AnalysisQuery {
            status: Some(AnalysisStatus::Done),
            ..AnalysisQuery::default()
        },
    )
    .await
    .unwrap();
    assert!(page.items[0].status.is_finished());
    assert!(page.items[0].finished_at.is_some());
    assert!(harness.transport.requests()[1]
        .query
        .contains(&("status".to_string(), "done".to_string())));
}

#[tokio::test]
async fn leaderboard_limit_is_clamped_and_entries_decoded() {
    let transport = ScriptedTransport::new(|_| {
        json(
            200,
            j!({
                "entries": [
                    {"id": 1, "metric": "accuracy", "value": 0.97, "rank": 1,
                     "user": {"id": 11, "name": "Henrietta", "role": "researcher"}},
                    {"id": 2, "metric": "accuracy", "value": 0.91, "rank": 2}
                ]
            }),
        )
    });
    let harness = Harness::new(transport, ClientOptions::default());

    let query = leaderboard::LeaderboardQuery {
        limit: 5000,
        ..Default::default()
    };
    let entries = leaderboard::entries(&harness.client, &query).await.unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].user.as_ref().and_then(|u| u.name.as_deref()), Some("Henrietta"));
    assert!(entries[1].user.is_none());
    assert!(harness.transport.requests()[0]
        .query
        .contains(&("limit".to_string(), "100".to_string())));
}

#[tokio::test]
async fn label_batches_post_their_items() {
    let transport = ScriptedTransport::new(|_| json(201, j!({ "message": "2 labels created" })));
    let harness = Harness::new(transport, ClientOptions::default());
    harness.sign_in("tok", Some("ref"));

    let items = [
        labels::LabelItem::new(1, "CONFIRMED"),
        labels::LabelItem::new(2, "FALSE POSITIVE"),
    ];
    let ack = labels::create_batch(&harness.client, 4, &items).await.unwrap();

    assert_eq!(ack.message, "2 labels created");
    let body = sent_json(&harness.transport.requests()[0].body);
    assert_eq!(body["dataset_id"], 4);
    assert_eq!(body["items"][1]["label"], "FALSE POSITIVE");
    assert_eq!(body["items"][0]["confidence"], 1.0);
}

#[tokio::test]
async fn undecodable_success_body_is_a_decode_error() {
    let transport = ScriptedTransport::new(|_| {
        Ok(astrometric_core::ApiResponse::new(200, "not json"))
    });
    let harness = Harness::new(transport, ClientOptions::default());

    let err = client_lib::api::health(&harness.client).await.unwrap_err();

    assert!(matches!(err, ClientError::Decode(_)));
    assert!(harness.client.notifications().is_empty());
}
