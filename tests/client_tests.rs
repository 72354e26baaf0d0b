use chrono::{TimeZone, Utc};
use reelpost::config::ClientOptions;
use reelpost::patterns::{BrandPattern, LogoPosition, LogoSettings};
use reelpost::publish::{JobFilter, PublishJobStatus, PublishRequest};
use reelpost::videos::{UploadFile, VideoUpload};
use reelpost::ReelPost;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_login(server: &MockServer, refresh_token: Option<&str>) {
    let mut body = json!({
        "user": { "id": "user-1", "email": "a@b.com", "name": "Ana", "role": "user" },
        "accessToken": "access-1"
    });
    if let Some(refresh_token) = refresh_token {
        body["refreshToken"] = json!(refresh_token);
    }

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn signed_in(server: &MockServer) -> ReelPost {
    mount_login(server, Some("refresh-1")).await;
    let client = ReelPost::new_with_options(
        &server.uri(),
        ClientOptions::default().with_persist_session(false),
    );
    client.auth().login("a@b.com", "secret123").await.unwrap();
    client
}

#[tokio::test]
async fn test_connections_use_the_session_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/connections"))
        .and(header("Authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "c1", "username": "ana.cooks", "isDefault": false },
            { "id": "c2", "displayName": "Ana Travels", "isDefault": true,
              "createdAt": "2026-01-05T10:00:00Z" }
        ])))
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/connections/c1/set-default"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/connections/c2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = signed_in(&mock_server).await;
    let connections = client.connections();

    let list = connections.list().await.unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].label(), "ana.cooks");
    assert_eq!(
        list[1].created_at,
        Some(Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap())
    );

    let default = connections.default_connection().await.unwrap().unwrap();
    assert_eq!(default.label(), "Ana Travels");

    connections.set_default("c1").await.unwrap();
    connections.delete("c2").await.unwrap();
}

#[tokio::test]
async fn test_expired_access_token_is_refreshed_transparently() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(header("Authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(header("Authorization", "Bearer access-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "v1", "title": "Pasta in 30s", "duration": 29.5 }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({ "refreshToken": "refresh-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "access-2" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = signed_in(&mock_server).await;
    let videos = client.videos().list().await.unwrap();

    assert_eq!(videos[0].duration_seconds, Some(29.5));
    assert_eq!(client.auth().access_token().as_deref(), Some("access-2"));
}

#[tokio::test]
async fn test_unrecoverable_unauthorized_signs_out() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server, None).await;

    Mock::given(method("GET"))
        .and(path("/publish/jobs"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = ReelPost::new_with_options(
        &mock_server.uri(),
        ClientOptions::default().with_persist_session(false),
    );
    client.auth().login("a@b.com", "secret123").await.unwrap();

    let err = client.publish().jobs(&JobFilter::default()).await.unwrap_err();

    assert!(err.is_session_expired());
    assert!(!client.auth().is_authenticated());
    assert!(client.auth().access_token().is_none());
}

#[tokio::test]
async fn test_unauthorized_after_refresh_keeps_the_renewed_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos/v9"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Not your video" })),
        )
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "access-2" })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(header("Authorization", "Bearer access-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = signed_in(&mock_server).await;
    let err = client.videos().get("v9").await.unwrap_err();

    assert!(!err.is_session_expired());
    assert_eq!(err.status(), Some(401));
    assert!(client.auth().is_authenticated());
    assert_eq!(client.auth().access_token().as_deref(), Some("access-2"));

    assert!(client.videos().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_api_errors_carry_status_and_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Video not found" })),
        )
        .mount(&mock_server)
        .await;

    let client = signed_in(&mock_server).await;
    let err = client.videos().get("missing").await.unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "API error (404): Video not found");
    assert!(client.auth().is_authenticated());
}

#[tokio::test]
async fn test_publish_and_list_jobs() {
    let mock_server = MockServer::start().await;
    let scheduled = Utc.with_ymd_and_hms(2026, 11, 1, 18, 30, 0).unwrap();

    Mock::given(method("POST"))
        .and(path("/publish"))
        .and(body_json(json!({
            "videoId": "v1",
            "connectionIds": ["c1", "c2"],
            "caption": "Weeknight pasta",
            "hashtags": ["food"],
            "patternId": "p1",
            "scheduledAt": "2026-11-01T18:30:00Z"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "job-1",
            "videoId": "v1",
            "status": "scheduled",
            "scheduledAt": "2026-11-01T18:30:00Z"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/publish/jobs"))
        .and(query_param("status", "failed"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "job-0", "status": "failed", "error": "video too long" }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = signed_in(&mock_server).await;
    let publish = client.publish();

    let request = PublishRequest::new("v1", &["c1", "c2"])
        .caption("Weeknight pasta")
        .hashtag("#food")
        .pattern("p1")
        .schedule_at(scheduled);
    let job = publish.publish(&request).await.unwrap();
    assert_eq!(job.status, PublishJobStatus::Scheduled);
    assert_eq!(job.scheduled_at, Some(scheduled));

    let failed = publish
        .jobs(&JobFilter::default().status(PublishJobStatus::Failed).limit(10))
        .await
        .unwrap();
    assert_eq!(failed[0].error.as_deref(), Some("video too long"));
}

#[tokio::test]
async fn test_publish_requires_a_connection() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/publish"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = signed_in(&mock_server).await;
    let err = client
        .publish()
        .publish(&PublishRequest::new("v1", &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, reelpost::error::Error::Validation(_)));
}

#[tokio::test]
async fn test_batch_publish() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/publish/batch"))
        .and(body_json(json!({
            "items": [
                { "videoId": "v1", "connectionIds": ["c1"] },
                { "videoId": "v2", "connectionIds": ["c1"] }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "job-1", "status": "pending" },
            { "id": "job-2", "status": "pending" }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = signed_in(&mock_server).await;
    let jobs = client
        .publish()
        .publish_batch(&[
            PublishRequest::new("v1", &["c1"]),
            PublishRequest::new("v2", &["c1"]),
        ])
        .await
        .unwrap();

    assert_eq!(jobs.len(), 2);
    assert!(client.publish().publish_batch(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_wait_for_job_polls_until_terminal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/publish/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "job-1", "status": "processing" }
        ])))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/publish/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "job-1", "status": "published",
              "postUrl": "https://www.tiktok.com/@ana/video/1" }
        ])))
        .mount(&mock_server)
        .await;

    let client = signed_in(&mock_server).await;
    let job = client
        .publish()
        .wait_for_job("job-1", Duration::from_millis(20), Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(job.status, PublishJobStatus::Published);
    assert!(job.post_url.is_some());
}

#[tokio::test]
async fn test_video_upload_is_multipart() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/videos/upload"))
        .and(header("Authorization", "Bearer access-1"))
        .and(header_exists("content-type"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "v9", "fileName": "clip.mp4", "status": "processing"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = signed_in(&mock_server).await;
    let upload = VideoUpload::new(UploadFile::new("clip.mp4", vec![0u8; 64]))
        .audio(UploadFile::new("voiceover.mp3", vec![1u8; 32]))
        .title("Pasta");

    let video = client.videos().upload(upload).await.unwrap();
    assert_eq!(video.id, "v9");

    let requests = mock_server.received_requests().await.unwrap();
    let upload_request = requests
        .iter()
        .find(|r| r.url.path() == "/videos/upload")
        .unwrap();
    let body = String::from_utf8_lossy(&upload_request.body);
    assert!(body.contains("filename=\"clip.mp4\""));
    assert!(body.contains("filename=\"voiceover.mp3\""));
    assert!(body.contains("Content-Type: video/mp4"));
}

#[tokio::test]
async fn test_upload_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("dance.mov");
    std::fs::write(&file, b"not really a video").unwrap();

    let upload = UploadFile::from_path(&file).await.unwrap();
    assert_eq!(upload.file_name, "dance.mov");
    assert_eq!(upload.mime.as_deref(), Some("video/quicktime"));
    assert_eq!(upload.bytes.len(), 18);
}

#[tokio::test]
async fn test_patterns_crud_and_local_validation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/patterns"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "p1",
            "name": "Summer",
            "logo": { "url": "https://cdn.example.com/logo.png", "position": "bottom-right",
                      "size": 12.5, "opacity": 0.9 },
            "subtitles": { "enabled": true, "fontFamily": "Inter" },
            "filter": "vivid"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/patterns/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p1", "name": "Summer v2"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/patterns/p1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = signed_in(&mock_server).await;
    let patterns = client.patterns();

    let mut pattern = BrandPattern::new("Summer");
    pattern.logo = Some(LogoSettings {
        url: "https://cdn.example.com/logo.png".to_string(),
        position: LogoPosition::BottomRight,
        size_percent: 12.5,
        opacity: 0.9,
    });
    pattern.filter = Some("vivid".to_string());

    let created = patterns.create(&pattern).await.unwrap();
    assert_eq!(created.id.as_deref(), Some("p1"));
    assert_eq!(created.logo.unwrap().size_percent, 12.5);
    assert!(created.subtitles.unwrap().enabled);

    let updated = patterns
        .update("p1", &BrandPattern::new("Summer v2"))
        .await
        .unwrap();
    assert_eq!(updated.name, "Summer v2");

    let mut invalid = BrandPattern::new("Broken");
    invalid.logo = Some(LogoSettings {
        url: "https://cdn.example.com/logo.png".to_string(),
        position: LogoPosition::Center,
        size_percent: 10.0,
        opacity: 3.0,
    });
    assert!(patterns.create(&invalid).await.is_err());

    patterns.delete("p1").await.unwrap();
}

#[tokio::test]
async fn test_voices() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/voices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "voices": [
                { "voice_id": "el-1", "name": "Rachel", "category": "premade" },
                { "voiceId": "el-2", "name": "My voice", "previewUrl": "https://cdn.example.com/p.mp3" }
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/voices/clone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "voice_id": "el-3", "name": "Ana"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = signed_in(&mock_server).await;
    let voices = client.voices();

    let list = voices.list().await.unwrap();
    assert_eq!(list[1].voice_id, "el-2");
    assert!(list[1].preview_url.is_some());

    let cloned = voices
        .clone_voice("Ana", vec![UploadFile::new("sample.wav", vec![0u8; 16])])
        .await
        .unwrap();
    assert_eq!(cloned.voice_id, "el-3");

    assert!(voices.clone_voice("Ana", Vec::new()).await.is_err());
}

#[tokio::test]
async fn test_tiktok_authorization_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/tiktok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "authUrl": "https://www.tiktok.com/v2/auth/authorize?client_key=abc"
        })))
        .mount(&mock_server)
        .await;

    let client = signed_in(&mock_server).await;
    let url = client.tiktok().authorization_url().await.unwrap();
    assert!(url.starts_with("https://www.tiktok.com/"));
}

#[tokio::test]
async fn test_session_persists_across_clients() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server, Some("refresh-1")).await;
    let dir = tempfile::tempdir().unwrap();

    let options = ClientOptions::default().with_session_dir(dir.path());
    let first = ReelPost::new_with_options(&mock_server.uri(), options.clone());
    first.auth().login("a@b.com", "secret123").await.unwrap();

    let second = ReelPost::new_with_options(&mock_server.uri(), options);
    assert!(second.restore_session().await.unwrap());
    assert_eq!(second.auth().current_user().unwrap().email, "a@b.com");
}

#[tokio::test]
async fn test_auto_refresh_respects_option() {
    let client = ReelPost::new_with_options(
        "http://localhost:3000/api/",
        ClientOptions::default().with_auto_refresh_token(false),
    );
    assert_eq!(client.url, "http://localhost:3000/api");
    assert!(client.start_auto_refresh().is_none());

    let client = ReelPost::new("http://localhost:3000/api");
    let scheduler = client.start_auto_refresh().unwrap();
    assert!(scheduler.is_running());
    scheduler.stop();
}
