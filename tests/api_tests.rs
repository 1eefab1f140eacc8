// tests/api_tests.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use quizsmith::accounts::{MemoryUserStore, UserStore};
use quizsmith::cache::Coordinator;
use quizsmith::config::Config;
use quizsmith::error::AppError;
use quizsmith::generation::{GeneratedQuestion, QuestionGenerator};
use quizsmith::ledger::{MemoryAttemptStore, ProgressLedger};
use quizsmith::models::question::{OptionLabel, QuestionOptions};
use quizsmith::routes;
use quizsmith::state::AppState;
use quizsmith::storage::MemoryBlobStore;
use quizsmith::utils::hash::hash_password;

/// Deterministic stand-in for the external question generator.
#[derive(Default)]
struct StubGenerator {
    calls: AtomicUsize,
    fail: AtomicBool,
}

#[async_trait::async_trait]
impl QuestionGenerator for StubGenerator {
    async fn generate(&self, subject: &str, topic: &str) -> Result<GeneratedQuestion, AppError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Generation("stub provider is down".into()));
        }

        Ok(GeneratedQuestion {
            prompt: format!("{} / {} question #{}", subject, topic, n),
            options: QuestionOptions {
                a: "alpha".into(),
                b: "bravo".into(),
                c: "charlie".into(),
                d: "delta".into(),
            },
            correct_option: OptionLabel::B,
            explanation: "stub explanation".into(),
        })
    }
}

struct TestApp {
    address: String,
    generator: Arc<StubGenerator>,
    client: reqwest::Client,
}

/// Spawns the app on a random port with in-memory stores and the stub
/// generator, plus a seeded admin account.
async fn spawn_app() -> TestApp {
    let config = Config {
        database_url: "postgres://unused-in-tests".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        admin_username: None,
        admin_password: None,
        blob_dir: "unused-in-tests".to_string(),
        generation_base_url: "http://localhost:0".to_string(),
        generation_api_key: "unused".to_string(),
        model_humanities: "stub".to_string(),
        model_quantitative: "stub".to_string(),
        generation_timeout_secs: 5,
    };

    let users = Arc::new(MemoryUserStore::new());
    let admin_hash = hash_password("admin-password").unwrap();
    users.create("admin", &admin_hash, "admin").await.unwrap();

    let blobs = Arc::new(MemoryBlobStore::new());
    let generator = Arc::new(StubGenerator::default());

    let coordinator = Coordinator::new(
        blobs.clone(),
        generator.clone(),
        Duration::from_secs(config.generation_timeout_secs),
    );

    let ledger = Arc::new(ProgressLedger::new(
        users.clone(),
        Arc::new(MemoryAttemptStore::new()),
    ));

    let state = AppState {
        config,
        coordinator,
        ledger,
        users,
        blobs,
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        generator,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    async fn register(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(format!("{}/api/auth/register", self.address))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .client
            .post(format!("{}/api/auth/login", self.address))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 200);

        let body: serde_json::Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn fetch_question(&self, query: &str) -> reqwest::Response {
        self.client
            .get(format!("{}/api/questions?{}", self.address, query))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

#[tokio::test]
async fn unknown_route_is_404() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app
        .client
        .get(format!("{}/random_path_that_does_not_exist", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_works() {
    let app = spawn_app().await;

    let response = app.register("student_one", "password123").await;

    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["username"], "student_one");
    // The password hash must never be serialized.
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn register_fails_validation() {
    let app = spawn_app().await;

    // Username too short
    let response = app.register("yo", "password123").await;

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = spawn_app().await;

    assert_eq!(app.register("twice", "password123").await.status().as_u16(), 201);
    assert_eq!(app.register("twice", "password123").await.status().as_u16(), 409);
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let app = spawn_app().await;
    app.register("loginuser", "password123").await;

    let response = app
        .client
        .post(format!("{}/api/auth/login", app.address))
        .json(&serde_json::json!({ "username": "loginuser", "password": "nope-nope" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn question_fetch_cold_then_warm() {
    let app = spawn_app().await;

    // Cold miss: synchronous generation
    let response = app
        .fetch_question("subject=AP%20Biology&topic=Unit%201")
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let first: serde_json::Value = response.json().await.unwrap();
    assert_eq!(first["served_from_cache"], false);
    let first_id = first["question"]["id"].as_str().unwrap().to_string();
    assert_eq!(first["question"]["subject"], "AP Biology");
    assert_eq!(first["question"]["topic"], "Unit 1");

    // Warm hit: same question, instantly, from the cache
    let response = app
        .fetch_question("subject=AP%20Biology&topic=Unit%201")
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let second: serde_json::Value = response.json().await.unwrap();
    assert_eq!(second["served_from_cache"], true);
    assert_eq!(second["question"]["id"].as_str().unwrap(), first_id);
}

#[tokio::test]
async fn question_fetch_without_subject_is_rejected() {
    let app = spawn_app().await;

    let response = app.fetch_question("topic=Unit%201").await;
    // Missing required query parameter never reaches the coordinator.
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn generation_failure_surfaces_and_leaves_cache_absent() {
    let app = spawn_app().await;
    app.generator.fail.store(true, Ordering::SeqCst);

    let response = app
        .fetch_question("subject=AP%20Biology&topic=Unit%2099")
        .await;
    assert_eq!(response.status().as_u16(), 502);

    // The key starts again from Absent once the provider recovers.
    app.generator.fail.store(false, Ordering::SeqCst);
    let response = app
        .fetch_question("subject=AP%20Biology&topic=Unit%2099")
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["served_from_cache"], false);
}

#[tokio::test]
async fn fresh_parameter_always_generates_a_new_question() {
    let app = spawn_app().await;

    let response = app
        .fetch_question("subject=AP%20Chemistry&topic=Unit%202")
        .await;
    let first: serde_json::Value = response.json().await.unwrap();
    let first_id = first["question"]["id"].as_str().unwrap().to_string();

    let response = app
        .fetch_question("subject=AP%20Chemistry&topic=Unit%202&fresh=true")
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let fresh: serde_json::Value = response.json().await.unwrap();
    assert_eq!(fresh["served_from_cache"], false);
    assert_ne!(fresh["question"]["id"].as_str().unwrap(), first_id);
}

#[tokio::test]
async fn attempts_require_authentication() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(format!("{}/api/attempts", app.address))
        .json(&serde_json::json!({
            "question_id": "q-1",
            "subject": "AP Biology",
            "topic": "Unit 1",
            "chosen_option": "A",
            "was_correct": true,
            "elapsed_ms": 1000
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn attempt_flow_tracks_mastery() {
    let app = spawn_app().await;
    app.register("mastery_user", "password123").await;
    let token = app.login("mastery_user", "password123").await;

    // Obtain a real question reference first.
    let response = app
        .fetch_question("subject=AP%20Biology&topic=Unit%203")
        .await;
    let fetched: serde_json::Value = response.json().await.unwrap();
    let question_id = fetched["question"]["id"].as_str().unwrap().to_string();

    let mut observed = Vec::new();
    for was_correct in [true, false, true, true] {
        let response = app
            .client
            .post(format!("{}/api/attempts", app.address))
            .bearer_auth(&token)
            .json(&serde_json::json!({
                "question_id": question_id,
                "subject": "AP Biology",
                "topic": "Unit 3",
                "chosen_option": "B",
                "was_correct": was_correct,
                "elapsed_ms": 4000
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 200);

        let body: serde_json::Value = response.json().await.unwrap();
        observed.push(body["mastery"].as_i64().unwrap());
    }

    assert_eq!(observed, vec![100, 50, 67, 75]);

    // Progress endpoint reflects the final counters.
    let response = app
        .client
        .get(format!("{}/api/progress", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    let progress: serde_json::Value = response.json().await.unwrap();
    assert_eq!(progress.as_array().unwrap().len(), 1);
    assert_eq!(progress[0]["total_attempts"], 4);
    assert_eq!(progress[0]["mastery"], 75);

    // History hydrates the question payload from the blob store.
    let response = app
        .client
        .get(format!("{}/api/attempts/history?limit=2", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    let history: serde_json::Value = response.json().await.unwrap();
    let items = history.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["question"]["id"].as_str().unwrap(), question_id);
}

#[tokio::test]
async fn malformed_attempts_are_rejected() {
    let app = spawn_app().await;
    app.register("strict_user", "password123").await;
    let token = app.login("strict_user", "password123").await;

    let response = app
        .client
        .post(format!("{}/api/attempts", app.address))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "question_id": "q-1",
            "subject": "AP Biology",
            "topic": "Unit 1",
            "chosen_option": "Z",
            "was_correct": true,
            "elapsed_ms": 1000
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn admin_cache_controls() {
    let app = spawn_app().await;
    let admin_token = app.login("admin", "admin-password").await;

    // Prime a key synchronously.
    let response = app
        .client
        .post(format!("{}/api/admin/cache/prime", app.address))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "subject": "AP US History", "topic": "Unit 4" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    let primed: serde_json::Value = response.json().await.unwrap();
    let primed_id = primed["question"]["id"].as_str().unwrap().to_string();

    // The primed entry serves the next fetch from cache.
    let response = app
        .fetch_question("subject=AP%20US%20History&topic=Unit%204")
        .await;
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["served_from_cache"], true);
    assert_eq!(body["question"]["id"].as_str().unwrap(), primed_id);

    // Stats see the entry.
    let response = app
        .client
        .get(format!("{}/api/admin/cache", app.address))
        .bearer_auth(&admin_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    let stats: serde_json::Value = response.json().await.unwrap();
    assert!(stats["total_entries"].as_u64().unwrap() >= 1);

    // Let the background refresh scheduled by the warm hit settle before
    // invalidating, so it cannot repopulate the key afterwards.
    tokio::time::sleep(Duration::from_millis(200)).await;

    // Invalidation is idempotent and forces the next fetch cold.
    for _ in 0..2 {
        let response = app
            .client
            .delete(format!("{}/api/admin/cache", app.address))
            .bearer_auth(&admin_token)
            .json(&serde_json::json!({ "subject": "AP US History", "topic": "Unit 4" }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 204);
    }

    let response = app
        .fetch_question("subject=AP%20US%20History&topic=Unit%204")
        .await;
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["served_from_cache"], false);

    // Blob listing includes every persisted question.
    let response = app
        .client
        .get(format!("{}/api/admin/questions", app.address))
        .bearer_auth(&admin_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    let listing: serde_json::Value = response.json().await.unwrap();
    assert!(listing["count"].as_u64().unwrap() >= 2);
}

#[tokio::test]
async fn admin_routes_reject_regular_users() {
    let app = spawn_app().await;
    app.register("plain_user", "password123").await;
    let token = app.login("plain_user", "password123").await;

    let response = app
        .client
        .get(format!("{}/api/admin/cache", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 403);
}
