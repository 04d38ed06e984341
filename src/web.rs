use actix_files::Files;
use actix_session::{storage::CookieSessionStore, Session, SessionMiddleware};
use actix_web::cookie::Key;
use actix_web::{error, http::header, middleware, web, App, HttpRequest, HttpResponse, HttpServer, Result};
use rand::Rng;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use crate::board::{
    handle, render, render_roster, AssignmentBoard, Gesture, Layout, ListSource, Origin, Outcome,
    RosterSelection, SlotId, TokenId,
};
use crate::colors::{ColorPair, ColorPrefs, KeyValueStore};
use crate::form::{
    export_lineup_to_csv, validate_lines_submission, validate_lineup_order, validate_order_field, SavedLineup,
    SavedRoster,
};
use crate::parser::{load_roster_from_reader, RosterData};

/// Session key holding the visitor's page id
const PAGE_KEY: &str = "page_id";
/// Page states kept in memory before the least recently used one is dropped
const MAX_PAGES: usize = 512;

pub type PrefsStore = Box<dyn KeyValueStore + Send>;

/// Interaction state of one visitor's pages
pub struct PageState {
    pub board: AssignmentBoard,
    pub roster: RosterSelection,
    touched: Instant,
}

// In-memory storage (in production, use a database)
pub struct AppState {
    pub pages: Mutex<HashMap<String, PageState>>,
    pub roster: Mutex<RosterData>,
    pub saved_lineup: Mutex<Option<SavedLineup>>,
    pub saved_roster: Mutex<Option<SavedRoster>>,
    pub prefs: Mutex<ColorPrefs<PrefsStore>>,
    pub admin_password: String,
    pub export_dir: PathBuf,
    pub lines: u8,
}

impl AppState {
    pub fn new(
        roster: RosterData,
        prefs: PrefsStore,
        admin_password: String,
        export_dir: PathBuf,
        lines: u8,
    ) -> Self {
        AppState {
            pages: Mutex::new(HashMap::new()),
            roster: Mutex::new(roster),
            saved_lineup: Mutex::new(None),
            saved_roster: Mutex::new(None),
            prefs: Mutex::new(ColorPrefs::new(prefs)),
            admin_password,
            export_dir,
            lines,
        }
    }

    fn layout(&self) -> Layout {
        Layout::lines(self.lines)
    }

    /// Board as the lines page renders it: the saved lineup, else the roster's slot column
    fn fresh_board(&self) -> Result<AssignmentBoard> {
        let roster = lock(&self.roster)?;
        let saved = lock(&self.saved_lineup)?;
        let (initial, order): (Vec<(SlotId, TokenId)>, Vec<TokenId>) = match saved.as_ref() {
            Some(lineup) => (lineup.assignments.clone(), lineup.order.clone()),
            None => (roster.initial.clone(), Vec::new()),
        };
        Ok(AssignmentBoard::hydrate(self.layout(), roster.tokens.clone(), initial).with_ordering_from(&order))
    }

    /// Roster page with the last submitted selection checked
    fn fresh_roster(&self) -> Result<RosterSelection> {
        let roster = lock(&self.roster)?;
        let saved = lock(&self.saved_roster)?;
        let checked = saved.as_ref().map(|r| r.order.clone()).unwrap_or_default();
        Ok(RosterSelection::hydrate(roster.tokens.clone(), checked))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| error::ErrorInternalServerError("state lock poisoned"))
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Page id of the session, created on first use
fn page_id(session: &Session) -> Result<String> {
    if let Some(id) = session.get::<String>(PAGE_KEY)? {
        return Ok(id);
    }
    let id = format!("{:016x}", rand::thread_rng().gen::<u64>());
    session.insert(PAGE_KEY, &id)?;
    Ok(id)
}

/// Part of an existing page state that a page load rebuilds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reload {
    Nothing,
    Board,
    Roster,
}

fn with_page<F, R>(state: &AppState, session: &Session, f: F) -> Result<R>
where
    F: FnOnce(&mut PageState) -> R,
{
    reload_page(state, session, Reload::Nothing, f)
}

/// Runs `f` on the session's page state, creating it when missing and
/// rebuilding the `reload` part of an existing one
/// Lock order: pages, then roster / saved state
fn reload_page<F, R>(state: &AppState, session: &Session, reload: Reload, f: F) -> Result<R>
where
    F: FnOnce(&mut PageState) -> R,
{
    let id = page_id(session)?;
    let mut pages = lock(&state.pages)?;

    if let Some(page) = pages.get_mut(&id) {
        match reload {
            Reload::Nothing => {}
            Reload::Board => page.board = state.fresh_board()?,
            Reload::Roster => page.roster = state.fresh_roster()?,
        }
    } else {
        if pages.len() >= MAX_PAGES {
            let oldest = pages
                .iter()
                .min_by_key(|(_, page)| page.touched)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                log::debug!("dropping page state {}", key);
                pages.remove(&key);
            }
        }
        let page = PageState {
            board: state.fresh_board()?,
            roster: state.fresh_roster()?,
            touched: Instant::now(),
        };
        pages.insert(id.clone(), page);
    }

    let page = pages
        .get_mut(&id)
        .ok_or_else(|| error::ErrorInternalServerError("page state missing"))?;
    page.touched = Instant::now();
    Ok(f(page))
}

fn failure(message: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"success": false, "error": message.to_string()}))
}

fn board_json(board: &AssignmentBoard) -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "board": render(board),
        "order": board.ordering().map(|o| o.to_field_value()),
    })
}

/// Answers a board mutation; rejected mutations are reported but leave the board as it was
fn outcome_json(board: &AssignmentBoard, outcome: Outcome) -> HttpResponse {
    match &outcome.error {
        Some(e) => failure(e),
        None => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "moves": outcome.moves,
            "changed_slots": outcome.changed_slots,
            "board": render(board),
            "order": board.ordering().map(|o| o.to_field_value()),
        })),
    }
}

fn run_gesture(state: &AppState, session: &Session, gesture: Gesture) -> Result<HttpResponse> {
    with_page(state, session, |page| {
        let outcome = handle(&mut page.board, gesture);
        outcome_json(&page.board, outcome)
    })
}

#[derive(Deserialize)]
pub struct PlaceRequest {
    token_id: TokenId,
    slot_id: SlotId,
    origin: Option<Origin>,
}

#[derive(Deserialize)]
pub struct SlotRequest {
    slot_id: SlotId,
}

#[derive(Deserialize)]
pub struct TokenRequest {
    token_id: TokenId,
}

#[derive(Deserialize)]
pub struct ToggleRequest {
    enabled: bool,
}

#[derive(Deserialize)]
pub struct DragStartRequest {
    token_id: TokenId,
    origin: Origin,
}

#[derive(Deserialize)]
pub struct OrderRequest {
    token_id: TokenId,
    value: String,
}

#[derive(Deserialize)]
pub struct RosterDropRequest {
    token_id: TokenId,
    source: ListSource,
}

#[derive(Deserialize)]
pub struct SearchRequest {
    query: String,
}

#[derive(Deserialize)]
pub struct RosterForm {
    #[serde(default)]
    order: String,
}

#[derive(Deserialize)]
pub struct ColorRequest {
    bg: Option<String>,
    fg: Option<String>,
}

// Lines board endpoints
async fn get_board(state: web::Data<AppState>, session: Session) -> Result<HttpResponse> {
    with_page(&state, &session, |page| HttpResponse::Ok().json(board_json(&page.board)))
}

async fn board_gesture(
    req: web::Json<Gesture>,
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse> {
    run_gesture(&state, &session, req.into_inner())
}

async fn board_place(
    req: web::Json<PlaceRequest>,
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    with_page(&state, &session, |page| {
        let origin = req.origin.unwrap_or(Origin::Pool);
        let result = page.board.place_from(&req.token_id, &origin, &req.slot_id);
        outcome_json(&page.board, Outcome::from_result(result))
    })
}

async fn board_place_selected(
    req: web::Json<SlotRequest>,
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse> {
    with_page(&state, &session, |page| {
        let result = page.board.place_selected(&req.slot_id);
        outcome_json(&page.board, Outcome::from_result(result))
    })
}

async fn board_clear(
    req: web::Json<SlotRequest>,
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse> {
    let slot_id = req.into_inner().slot_id;
    run_gesture(&state, &session, Gesture::RemoveClick { slot_id })
}

async fn board_clear_all(state: web::Data<AppState>, session: Session) -> Result<HttpResponse> {
    run_gesture(&state, &session, Gesture::ClearAll)
}

async fn board_select(
    req: web::Json<TokenRequest>,
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse> {
    let token_id = req.into_inner().token_id;
    run_gesture(&state, &session, Gesture::PoolClick { token_id })
}

async fn board_deselect(state: web::Data<AppState>, session: Session) -> Result<HttpResponse> {
    with_page(&state, &session, |page| {
        page.board.deselect();
        HttpResponse::Ok().json(board_json(&page.board))
    })
}

async fn board_hide_assigned(
    req: web::Json<ToggleRequest>,
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse> {
    run_gesture(&state, &session, Gesture::HideAssigned { enabled: req.enabled })
}

async fn drag_start(
    req: web::Json<DragStartRequest>,
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    run_gesture(&state, &session, Gesture::DragStart { token_id: req.token_id, origin: req.origin })
}

async fn drag_drop(
    req: web::Json<SlotRequest>,
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse> {
    let slot_id = req.into_inner().slot_id;
    run_gesture(&state, &session, Gesture::Drop { slot_id })
}

async fn drag_end(state: web::Data<AppState>, session: Session) -> Result<HttpResponse> {
    run_gesture(&state, &session, Gesture::DragEnd)
}

// Native lines form submission
async fn submit_lines(
    form: web::Form<HashMap<String, String>>,
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse> {
    let fields = form.into_inner();
    let (layout, tokens) = {
        let roster = lock(&state.roster)?;
        (state.layout(), roster.tokens.clone())
    };

    let assignments = match validate_lines_submission(&layout, &tokens, &fields) {
        Ok(a) => a,
        Err(e) => return Ok(HttpResponse::BadRequest().json(serde_json::json!({"success": false, "error": e}))),
    };
    let order_field = fields.get("order").map(String::as_str).unwrap_or("");
    let order = match validate_lineup_order(&tokens, &assignments, order_field) {
        Ok(o) => o,
        Err(e) => return Ok(HttpResponse::BadRequest().json(serde_json::json!({"success": false, "error": e}))),
    };

    log::info!("lineup saved with {} players", assignments.len());
    *lock(&state.saved_lineup)? = Some(SavedLineup {
        timestamp: timestamp(),
        assignments,
        order,
    });

    // The next page load starts from the saved lineup
    reload_page(&state, &session, Reload::Board, |_| ())?;

    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/lines"))
        .finish())
}

// Roster page endpoints
async fn get_roster(state: web::Data<AppState>, session: Session) -> Result<HttpResponse> {
    with_page(&state, &session, |page| {
        HttpResponse::Ok().json(serde_json::json!({"success": true, "roster": render_roster(&page.roster)}))
    })
}

fn roster_json(roster: &RosterSelection) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"success": true, "roster": render_roster(roster)}))
}

async fn roster_toggle(
    req: web::Json<TokenRequest>,
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse> {
    with_page(&state, &session, |page| {
        if page.roster.token(&req.token_id).is_none() {
            return failure(format!("unknown player {}", req.token_id));
        }
        page.roster.toggle(&req.token_id);
        roster_json(&page.roster)
    })
}

async fn roster_order(
    req: web::Json<OrderRequest>,
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse> {
    with_page(&state, &session, |page| {
        page.roster.set_order_input(&req.token_id, &req.value);
        roster_json(&page.roster)
    })
}

async fn roster_move_to_end(
    req: web::Json<TokenRequest>,
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse> {
    with_page(&state, &session, |page| {
        page.roster.drop_on_selected(&req.token_id, ListSource::Selected);
        roster_json(&page.roster)
    })
}

async fn roster_drop(
    req: web::Json<RosterDropRequest>,
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse> {
    with_page(&state, &session, |page| {
        page.roster.drop_on_selected(&req.token_id, req.source);
        roster_json(&page.roster)
    })
}

async fn roster_select_all(state: web::Data<AppState>, session: Session) -> Result<HttpResponse> {
    with_page(&state, &session, |page| {
        page.roster.select_all();
        roster_json(&page.roster)
    })
}

async fn roster_deselect_all(state: web::Data<AppState>, session: Session) -> Result<HttpResponse> {
    with_page(&state, &session, |page| {
        page.roster.deselect_all();
        roster_json(&page.roster)
    })
}

async fn roster_hide_selected(
    req: web::Json<ToggleRequest>,
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse> {
    with_page(&state, &session, |page| {
        page.roster.set_hide_selected(req.enabled);
        roster_json(&page.roster)
    })
}

async fn roster_search(
    req: web::Json<SearchRequest>,
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse> {
    with_page(&state, &session, |page| {
        page.roster.set_search(&req.query);
        roster_json(&page.roster)
    })
}

// Native roster form submission
async fn submit_roster(
    form: web::Form<RosterForm>,
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse> {
    let tokens = lock(&state.roster)?.tokens.clone();
    let order = match validate_order_field(&tokens, &form.order) {
        Ok(o) => o,
        Err(e) => return Ok(HttpResponse::BadRequest().json(serde_json::json!({"success": false, "error": e}))),
    };

    log::info!("roster saved with {} players", order.len());
    *lock(&state.saved_roster)? = Some(SavedRoster {
        timestamp: timestamp(),
        order,
    });

    reload_page(&state, &session, Reload::Roster, |_| ())?;

    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/roster"))
        .finish())
}

// Line colors
async fn get_colors(state: web::Data<AppState>) -> Result<HttpResponse> {
    let prefs = lock(&state.prefs)?;
    let colors: BTreeMap<String, ColorPair> = state
        .layout()
        .groups()
        .into_iter()
        .map(|group| {
            let pair = prefs.load(&group, None);
            (group, pair)
        })
        .collect();
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true, "colors": colors})))
}

async fn set_color(
    group: web::Path<String>,
    req: web::Json<ColorRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let group = group.into_inner();
    if !state.layout().groups().contains(&group) {
        return Ok(failure(format!("unknown line {}", group)));
    }

    let mut prefs = lock(&state.prefs)?;
    let current = prefs.load(&group, None);
    let pair = match (&req.bg, &req.fg) {
        (Some(bg), _) => {
            let fg = req.fg.as_deref().unwrap_or(&current.fg);
            prefs.set_background(&group, bg, Some(fg))
        }
        (None, Some(fg)) => prefs.set_foreground(&group, fg, Some(&current.bg)),
        (None, None) => return Ok(failure("no color given")),
    };
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true, "group": group, "colors": pair})))
}

async fn reset_colors(state: web::Data<AppState>) -> Result<HttpResponse> {
    let groups = state.layout().groups();
    let pair = lock(&state.prefs)?.reset(groups.iter().map(String::as_str));
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true, "colors": pair})))
}

// Admin roster upload endpoint
async fn admin_upload(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    // Check password from header
    let password = req
        .headers()
        .get("X-Admin-Password")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if password != state.admin_password {
        return Ok(HttpResponse::Unauthorized().json(serde_json::json!({"success": false, "error": "Unauthorized"})));
    }

    match load_roster_from_reader(&body[..]) {
        Ok(data) => {
            let players = data.tokens.len();
            *lock(&state.roster)? = data;
            *lock(&state.saved_lineup)? = None;
            *lock(&state.saved_roster)? = None;
            // Every page is rebuilt from the new roster on its next request
            lock(&state.pages)?.clear();
            log::info!("roster uploaded with {} players", players);

            Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": format!("Loaded {} players", players)
            })))
        }
        Err(e) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": format!("Failed to process CSV: {}", e)
        }))),
    }
}

// Lineup export endpoint
async fn export_lineup(state: web::Data<AppState>) -> Result<HttpResponse> {
    let saved = lock(&state.saved_lineup)?.clone();
    let lineup = match saved {
        Some(l) => l,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({"success": false, "error": "No saved lineup"})))
        }
    };
    let tokens = lock(&state.roster)?.tokens.clone();

    match export_lineup_to_csv(&lineup, &state.layout(), &tokens, &state.export_dir) {
        Ok(path) => {
            let file = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(HttpResponse::Ok().json(serde_json::json!({"success": true, "file": file})))
        }
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": format!("Failed to export lineup: {}", e)
        }))),
    }
}

// HTML page handlers
async fn index() -> Result<HttpResponse> {
    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/lines"))
        .finish())
}

async fn lines_page(state: web::Data<AppState>, session: Session) -> Result<HttpResponse> {
    reload_page(&state, &session, Reload::Board, |_| ())?;
    let html = include_str!("../templates/lines.html");
    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}

async fn roster_page(state: web::Data<AppState>, session: Session) -> Result<HttpResponse> {
    reload_page(&state, &session, Reload::Roster, |_| ())?;
    let html = include_str!("../templates/roster.html");
    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}

/// Session cookies signed with `key`
pub fn session_middleware(key: Key) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_secure(false)
        .build()
}

/// Registers the pages and the API
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/lines", web::get().to(lines_page))
        .route("/lines", web::post().to(submit_lines))
        .route("/roster", web::get().to(roster_page))
        .route("/roster", web::post().to(submit_roster))
        .route("/api/board", web::get().to(get_board))
        .route("/api/board/gesture", web::post().to(board_gesture))
        .route("/api/board/place", web::post().to(board_place))
        .route("/api/board/place-selected", web::post().to(board_place_selected))
        .route("/api/board/clear", web::post().to(board_clear))
        .route("/api/board/clear-all", web::post().to(board_clear_all))
        .route("/api/board/select", web::post().to(board_select))
        .route("/api/board/deselect", web::post().to(board_deselect))
        .route("/api/board/hide-assigned", web::post().to(board_hide_assigned))
        .route("/api/board/drag/start", web::post().to(drag_start))
        .route("/api/board/drag/drop", web::post().to(drag_drop))
        .route("/api/board/drag/end", web::post().to(drag_end))
        .route("/api/roster", web::get().to(get_roster))
        .route("/api/roster/toggle", web::post().to(roster_toggle))
        .route("/api/roster/order", web::post().to(roster_order))
        .route("/api/roster/move-to-end", web::post().to(roster_move_to_end))
        .route("/api/roster/drop", web::post().to(roster_drop))
        .route("/api/roster/select-all", web::post().to(roster_select_all))
        .route("/api/roster/deselect-all", web::post().to(roster_deselect_all))
        .route("/api/roster/hide-selected", web::post().to(roster_hide_selected))
        .route("/api/roster/search", web::post().to(roster_search))
        .route("/api/colors", web::get().to(get_colors))
        .route("/api/colors/reset", web::post().to(reset_colors))
        .service(web::resource("/api/colors/{group}").route(web::post().to(set_color)))
        .route("/api/upload", web::post().to(admin_upload))
        .route("/api/export", web::post().to(export_lineup));
}

pub async fn start_server(port: u16, app_state: AppState) -> std::io::Result<()> {
    let app_state = web::Data::new(app_state);
    let key = Key::generate();

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(session_middleware(key.clone()))
            .wrap(middleware::Logger::default())
            .service(Files::new("/static", "static").show_files_listing())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
