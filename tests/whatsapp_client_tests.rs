//! Round trips through the WhatsApp client against a local provider stub.
//!
//! These tests verify:
//! 1. Bearer auth, content types and bodies of the two provider calls
//! 2. How provider failures map onto `GatewayError` and the upload endpoint's messages
//! 3. The notifier's upload-then-attach flow

mod common;

#[cfg(test)]
mod whatsapp_client_tests {
    use super::common::fake_document;
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, web, App, HttpRequest, HttpResponse, HttpServer};
    use ecd_report_server::notify::{NotificationOutcome, Notifier, WhatsAppNotifier};
    use ecd_report_server::upload::handlers::{INVALID_REQUEST_MESSAGE, MEDIA_ID_FAILED_MESSAGE};
    use ecd_report_server::whatsapp::{
        DocumentAttachment, GatewayError, MediaUploader, WhatsAppClient, WhatsAppConfig,
    };
    use ecd_report_server::{routes, AppState};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    const TOKEN: &str = "test-token";
    const BOUNDARY: &str = "----ecdProviderBoundary";

    /// A request as the provider saw it.
    #[derive(Debug, Clone)]
    struct CapturedRequest {
        path: String,
        authorization: Option<String>,
        content_type: Option<String>,
        body: Vec<u8>,
    }

    impl CapturedRequest {
        fn json(&self) -> Value {
            serde_json::from_slice(&self.body).unwrap()
        }
    }

    /// Canned replies per endpoint plus everything that was received.
    struct ProviderStub {
        media: (u16, String),
        messages: (u16, String),
        captured: Mutex<Vec<CapturedRequest>>,
    }

    impl ProviderStub {
        fn new(media: (u16, &str), messages: (u16, &str)) -> Arc<Self> {
            Arc::new(Self {
                media: (media.0, media.1.to_string()),
                messages: (messages.0, messages.1.to_string()),
                captured: Mutex::new(Vec::new()),
            })
        }

        fn captured(&self) -> Vec<CapturedRequest> {
            self.captured.lock().unwrap().clone()
        }
    }

    async fn provider(
        req: HttpRequest,
        body: web::Bytes,
        stub: web::Data<Arc<ProviderStub>>,
    ) -> HttpResponse {
        let header_value = |name: header::HeaderName| {
            req.headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        stub.captured.lock().unwrap().push(CapturedRequest {
            path: req.path().to_string(),
            authorization: header_value(header::AUTHORIZATION),
            content_type: header_value(header::CONTENT_TYPE),
            body: body.to_vec(),
        });

        let (status, reply) = if req.path().ends_with("/media") {
            &stub.media
        } else {
            &stub.messages
        };
        HttpResponse::build(StatusCode::from_u16(*status).unwrap()).body(reply.clone())
    }

    /// Start the stub on an ephemeral port and return its `/v1` base URL.
    fn start_provider(stub: Arc<ProviderStub>) -> String {
        let data = web::Data::new(stub);
        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .default_service(web::to(provider))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());
        format!("http://{}/v1", addr)
    }

    fn client_for(api_url: String) -> WhatsAppClient {
        WhatsAppClient::new(
            reqwest::Client::builder().no_proxy().build().unwrap(),
            WhatsAppConfig {
                api_url,
                token: TOKEN.to_string(),
                template_namespace: "ns-ecd".to_string(),
                template_name: "inspection_report".to_string(),
                language_code: "en".to_string(),
                body_params: vec!["Giyani".to_string()],
            },
        )
    }

    fn multipart_body(content: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"report.pdf\"\r\nContent-Type: application/pdf\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    /// Send a PDF through `POST /upload` backed by the real client.
    async fn upload_through_endpoint(client: WhatsAppClient) -> (StatusCode, Value) {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new(Arc::new(client))))
                .configure(routes),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/upload")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(multipart_body(b"%PDF-1.5"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        (status, test::read_body_json(resp).await)
    }

    #[actix_web::test]
    async fn test_upload_pdf_sends_raw_pdf_with_bearer_token() {
        let stub = ProviderStub::new((200, r#"{"media":[{"id":"media-42"}]}"#), (200, "{}"));
        let client = client_for(start_provider(stub.clone()));

        let result = client.upload_media(b"%PDF-1.5 report".to_vec()).await.unwrap();

        assert_eq!(result.media_id, "media-42");
        let captured = stub.captured();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].path, "/v1/media");
        assert_eq!(captured[0].authorization.as_deref(), Some("Bearer test-token"));
        assert_eq!(captured[0].content_type.as_deref(), Some("application/pdf"));
        assert_eq!(captured[0].body, b"%PDF-1.5 report".to_vec());
    }

    #[actix_web::test]
    async fn test_upload_error_without_json_is_status_error() {
        let stub = ProviderStub::new((502, "Bad Gateway"), (200, "{}"));
        let client = client_for(start_provider(stub));

        let result = client.upload_pdf(b"%PDF-1.5".to_vec()).await;

        match result {
            Err(GatewayError::Status { status, body }) => {
                assert_eq!(status, 502);
                assert_eq!(body, "Bad Gateway");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[actix_web::test]
    async fn test_upload_error_with_json_but_no_media_is_malformed() {
        let stub = ProviderStub::new((400, r#"{"errors":[{"code":1000}]}"#), (200, "{}"));
        let client = client_for(start_provider(stub));

        let result = client.upload_pdf(b"%PDF-1.5".to_vec()).await;

        assert!(matches!(result, Err(GatewayError::MalformedResponse(_))));
    }

    #[actix_web::test]
    async fn test_success_without_media_array_is_malformed() {
        let stub = ProviderStub::new((201, r#"{"meta":{"api_status":"stable"}}"#), (200, "{}"));
        let client = client_for(start_provider(stub));

        let result = client.upload_pdf(b"%PDF-1.5".to_vec()).await;

        assert!(matches!(result, Err(GatewayError::MalformedResponse(_))));
    }

    #[actix_web::test]
    async fn test_endpoint_maps_provider_failures_to_messages() {
        let malformed = ProviderStub::new((400, r#"{"errors":[]}"#), (200, "{}"));
        let (status, body) = upload_through_endpoint(client_for(start_provider(malformed))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "message": MEDIA_ID_FAILED_MESSAGE }));

        let unavailable = ProviderStub::new((503, "Service Unavailable"), (200, "{}"));
        let (status, body) = upload_through_endpoint(client_for(start_provider(unavailable))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "message": INVALID_REQUEST_MESSAGE }));

        let ok = ProviderStub::new((200, r#"{"media":[{"id":"media-7"}]}"#), (200, "{}"));
        let (status, body) = upload_through_endpoint(client_for(start_provider(ok))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "media_id": "media-7" }));
    }

    #[actix_web::test]
    async fn test_send_template_message_posts_template_json() {
        let stub = ProviderStub::new(
            (200, "{}"),
            (200, r#"{"messages":[{"id":"gBEGkYiEB1VXAglK1ZEqA1YKPrU"}]}"#),
        );
        let client = client_for(start_provider(stub.clone()));

        let receipt = client.send_template_message("27820000000", None).await.unwrap();

        assert_eq!(receipt.message_id.as_deref(), Some("gBEGkYiEB1VXAglK1ZEqA1YKPrU"));
        let captured = stub.captured();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].path, "/v1/messages");
        assert_eq!(captured[0].authorization.as_deref(), Some("Bearer test-token"));
        assert_eq!(captured[0].content_type.as_deref(), Some("application/json"));

        let payload = captured[0].json();
        assert_eq!(payload["to"], "27820000000");
        assert_eq!(payload["type"], "template");
        assert_eq!(payload["template"]["namespace"], "ns-ecd");
        assert_eq!(payload["template"]["name"], "inspection_report");
        assert_eq!(payload["template"]["language"], json!({ "policy": "deterministic", "code": "en" }));
        assert_eq!(
            payload["template"]["components"],
            json!([{ "type": "body", "parameters": [{ "type": "text", "text": "Giyani" }] }])
        );
    }

    #[actix_web::test]
    async fn test_send_template_message_rejected_by_provider() {
        let stub = ProviderStub::new((200, "{}"), (401, r#"{"error":"unauthorized"}"#));
        let client = client_for(start_provider(stub));
        let attachment = DocumentAttachment {
            media_id: "media-1".to_string(),
            filename: "Jane_Doe.pdf".to_string(),
        };

        let result = client.send_template_message("27820000000", Some(&attachment)).await;

        assert!(matches!(result, Err(GatewayError::Status { status: 401, .. })));
    }

    #[actix_web::test]
    async fn test_notifier_uploads_then_attaches_document() {
        let stub = ProviderStub::new(
            (200, r#"{"media":[{"id":"media-99"}]}"#),
            (200, r#"{"messages":[{"id":"msg-1"}]}"#),
        );
        let client = Arc::new(client_for(start_provider(stub.clone())));
        let notifier = WhatsAppNotifier::new(client, "27820000000", true);
        let document = fake_document(0, "Jane_Doe.pdf");

        let outcome = notifier.notify(&document).await.unwrap();

        match outcome {
            NotificationOutcome::Sent(receipt) => {
                assert_eq!(receipt.message_id.as_deref(), Some("msg-1"))
            }
            other => panic!("expected a sent message, got {:?}", other),
        }

        let captured = stub.captured();
        assert_eq!(captured.len(), 2);
        assert_eq!(captured[0].path, "/v1/media");
        assert_eq!(captured[0].body, document.pdf);
        assert_eq!(captured[1].path, "/v1/messages");

        let header_component = &captured[1].json()["template"]["components"][0];
        assert_eq!(header_component["type"], "header");
        assert_eq!(
            header_component["parameters"][0],
            json!({
                "type": "document",
                "document": { "id": "media-99", "filename": "Jane_Doe.pdf" }
            })
        );
    }

    #[actix_web::test]
    async fn test_notifier_without_attachment_skips_upload() {
        let stub = ProviderStub::new((200, r#"{"media":[{"id":"unused"}]}"#), (200, "{}"));
        let client = Arc::new(client_for(start_provider(stub.clone())));
        let notifier = WhatsAppNotifier::new(client, "27820000000", false);

        notifier.notify(&fake_document(3, "entry_3.pdf")).await.unwrap();

        let captured = stub.captured();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].path, "/v1/messages");
        assert_eq!(captured[0].json()["template"]["components"].as_array().unwrap().len(), 1);
    }
}
