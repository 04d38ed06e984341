use actix_web::cookie::{Cookie, Key};
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};

use lineup_board::colors::MemoryStore;
use lineup_board::parser::load_roster_from_reader;
use lineup_board::web::{configure, session_middleware, AppState};

const ROSTER: &str = "id,name,pos\np7,Novak,F\np8,Dvorak,F\nd1,Cerny,D\ng1,Hasek,G\n";

fn app_state(export_dir: &std::path::Path) -> web::Data<AppState> {
    let roster = load_roster_from_reader(ROSTER.as_bytes()).unwrap();
    web::Data::new(AppState::new(
        roster,
        Box::new(MemoryStore::new()),
        "secret".to_string(),
        export_dir.to_path_buf(),
        2,
    ))
}

fn field(body: &Value, slot: &str) -> String {
    body["board"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f[0] == slot)
        .and_then(|f| f[1].as_str())
        .unwrap()
        .to_string()
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .wrap(session_middleware(Key::generate()))
                .configure(configure),
        )
        .await
    };
}

macro_rules! open_page {
    ($app:expr, $uri:expr) => {{
        let resp = test::call_service(&$app, test::TestRequest::get().uri($uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let cookie: Cookie<'static> = resp.response().cookies().next().unwrap().into_owned();
        cookie
    }};
}

#[actix_web::test]
async fn placements_and_swaps_through_the_api() {
    let dir = tempfile::tempdir().unwrap();
    let state = app_state(dir.path());
    let app = init_app!(state);
    let cookie = open_page!(app, "/lines");

    for (token, slot) in [("p7", "L1C"), ("p8", "L2C")] {
        let req = test::TestRequest::post()
            .uri("/api/board/place")
            .cookie(cookie.clone())
            .set_json(json!({"token_id": token, "slot_id": slot}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
    }

    let req = test::TestRequest::post()
        .uri("/api/board/place")
        .cookie(cookie.clone())
        .set_json(json!({"token_id": "p7", "slot_id": "L2C", "origin": {"kind": "slot", "slot": "L1C"}}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(field(&body, "L2C"), "p7");
    assert_eq!(field(&body, "L1C"), "p8");

    let req = test::TestRequest::get().uri("/api/board").cookie(cookie).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(field(&body, "L2C"), "p7");
    assert_eq!(body["order"], "p7,p8");
}

#[actix_web::test]
async fn mismatched_drop_is_declined_without_changes() {
    let dir = tempfile::tempdir().unwrap();
    let state = app_state(dir.path());
    let app = init_app!(state);
    let cookie = open_page!(app, "/lines");

    let req = test::TestRequest::post()
        .uri("/api/board/drag/start")
        .cookie(cookie.clone())
        .set_json(json!({"token_id": "p7", "origin": {"kind": "pool"}}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);

    let req = test::TestRequest::post()
        .uri("/api/board/drag/drop")
        .cookie(cookie.clone())
        .set_json(json!({"slot_id": "G1"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);

    let req = test::TestRequest::get().uri("/api/board").cookie(cookie).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(field(&body, "G1"), "");
}

#[actix_web::test]
async fn keyboard_gestures_and_hide_assigned() {
    let dir = tempfile::tempdir().unwrap();
    let state = app_state(dir.path());
    let app = init_app!(state);
    let cookie = open_page!(app, "/lines");

    let gestures = [
        json!({"gesture": "pool_key", "token_id": "d1", "key": "Enter"}),
        json!({"gesture": "slot_key", "slot_id": "D2RD", "key": " "}),
        json!({"gesture": "hide_assigned", "enabled": true}),
    ];
    let mut body = Value::Null;
    for gesture in gestures {
        let req = test::TestRequest::post()
            .uri("/api/board/gesture")
            .cookie(cookie.clone())
            .set_json(gesture)
            .to_request();
        body = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
    }

    assert_eq!(field(&body, "D2RD"), "d1");
    let defense = &body["board"]["pools"][1]["items"][0];
    assert_eq!(defense["id"], "d1");
    assert_eq!(defense["badge"], "2");
    assert!(defense["classes"].as_array().unwrap().contains(&json!("is-hidden")));
}

#[actix_web::test]
async fn sessions_do_not_share_boards() {
    let dir = tempfile::tempdir().unwrap();
    let state = app_state(dir.path());
    let app = init_app!(state);
    let first = open_page!(app, "/lines");
    let second = open_page!(app, "/lines");

    let req = test::TestRequest::post()
        .uri("/api/board/place")
        .cookie(first)
        .set_json(json!({"token_id": "g1", "slot_id": "G1"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);

    let req = test::TestRequest::get().uri("/api/board").cookie(second).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(field(&body, "G1"), "");
}

#[actix_web::test]
async fn submitted_lineup_is_exported() {
    let dir = tempfile::tempdir().unwrap();
    let state = app_state(dir.path());
    let app = init_app!(state);

    let req = test::TestRequest::post().uri("/api/export").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/lines")
        .set_form([("L1C", "p7"), ("G1", "g1"), ("D1LD", ""), ("order", "p7,g1")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let req = test::TestRequest::post().uri("/api/export").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    let file = body["file"].as_str().unwrap();
    let content = std::fs::read_to_string(dir.path().join(file)).unwrap();
    assert!(content.contains("L1C,1,F,p7,Novak"));
    assert!(content.contains("G1,,G,g1,Hasek"));

    // A fresh page starts from the saved lineup
    let cookie = open_page!(app, "/lines");
    let req = test::TestRequest::get().uri("/api/board").cookie(cookie).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(field(&body, "L1C"), "p7");
}

#[actix_web::test]
async fn invalid_lineup_submission_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let state = app_state(dir.path());
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/lines")
        .set_form([("L1C", "d1")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn submitted_order_survives_the_reload() {
    let dir = tempfile::tempdir().unwrap();
    let state = app_state(dir.path());
    let app = init_app!(state);
    let cookie = open_page!(app, "/lines");

    let req = test::TestRequest::post()
        .uri("/lines")
        .cookie(cookie.clone())
        .set_form([("L1C", "p7"), ("L2C", "p8"), ("order", "p8,p7,g1")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/lines")
        .cookie(cookie.clone())
        .set_form([("L1C", "p7"), ("L2C", "p8"), ("order", "p8,p7")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let req = test::TestRequest::get().uri("/lines").cookie(cookie.clone()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/api/board").cookie(cookie).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(field(&body, "L1C"), "p7");
    assert_eq!(body["order"], "p8,p7");
}

#[actix_web::test]
async fn upload_requires_the_admin_password() {
    let dir = tempfile::tempdir().unwrap();
    let state = app_state(dir.path());
    let app = init_app!(state);
    let csv = "id,name,position,slot\nx1,Jagr,F,L1RW\n";

    let req = test::TestRequest::post().uri("/api/upload").set_payload(csv).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/upload")
        .insert_header(("X-Admin-Password", "secret"))
        .set_payload(csv)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);

    let cookie = open_page!(app, "/lines");
    let req = test::TestRequest::get().uri("/api/board").cookie(cookie).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(field(&body, "L1RW"), "x1");
}

#[actix_web::test]
async fn line_colors_keep_contrast() {
    let dir = tempfile::tempdir().unwrap();
    let state = app_state(dir.path());
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/colors/1")
        .set_json(json!({"bg": "#ffffff"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["colors"]["fg"], "#000000");

    let req = test::TestRequest::get().uri("/api/colors").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["colors"]["1"]["bg"], "#ffffff");
    assert_eq!(body["colors"]["2"]["bg"], "#000000");

    let req = test::TestRequest::post()
        .uri("/api/colors/9")
        .set_json(json!({"bg": "#ffffff"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], false);

    let req = test::TestRequest::post().uri("/api/colors/reset").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["colors"]["bg"], "#000000");

    let req = test::TestRequest::get().uri("/api/colors").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["colors"]["1"]["bg"], "#000000");
}

#[actix_web::test]
async fn roster_selection_is_saved_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let state = app_state(dir.path());
    let app = init_app!(state);
    let cookie = open_page!(app, "/roster");

    let mut body = Value::Null;
    for id in ["p7", "d1"] {
        let req = test::TestRequest::post()
            .uri("/api/roster/toggle")
            .cookie(cookie.clone())
            .set_json(json!({"token_id": id}))
            .to_request();
        body = test::call_and_read_body_json(&app, req).await;
    }
    assert_eq!(body["roster"]["field"], "p7,d1");
    assert_eq!(body["roster"]["counts"]["d"], 1);

    let req = test::TestRequest::post()
        .uri("/api/roster/move-to-end")
        .cookie(cookie.clone())
        .set_json(json!({"token_id": "p7"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["roster"]["field"], "d1,p7");

    let req = test::TestRequest::post()
        .uri("/roster")
        .cookie(cookie.clone())
        .set_form([("order", "d1,p7")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let cookie = open_page!(app, "/roster");
    let req = test::TestRequest::get().uri("/api/roster").cookie(cookie).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["roster"]["selected"], json!(["d1", "p7"]));
}
