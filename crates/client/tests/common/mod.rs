//! In-process fake of the IICGP backend for client integration tests.
//!
//! Serves the endpoints the client uses from an in-memory store, on an
//! ephemeral port. Every request is counted so tests can assert that nothing
//! was dispatched.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Multipart, Path, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use iicgp_client::token::MemoryTokenStore;
use iicgp_client::{IicgpApi, Session};

pub const PASSWORD: &str = "segredo";

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FakeUser {
    pub id: i64,
    pub username: &'static str,
    pub role_id: i64,
    pub role_nome: &'static str,
}

#[derive(Debug, Clone)]
pub struct FakeMember {
    pub id: i64,
    pub nome: &'static str,
    pub codigo: &'static str,
    pub branch: &'static str,
}

#[derive(Debug, Clone)]
pub struct FakeCulto {
    pub id: i64,
    pub data: String,
    pub tipo: String,
    pub categoria: String,
    pub pregador: Option<String>,
    pub horario: Option<String>,
    pub branch_id: Option<i64>,
}

#[derive(Debug, Default)]
pub struct FakeDb {
    pub users: Vec<FakeUser>,
    pub tokens: HashMap<String, i64>,
    pub members: Vec<FakeMember>,
    pub cultos: Vec<FakeCulto>,
    /// `(culto_id, membro_id) -> (presente, observacao)`.
    pub marks: HashMap<(i64, i64), (bool, Option<String>)>,
    pub next_id: i64,
    /// Bodies received by the save endpoint, in order.
    pub saves: Vec<Value>,
    pub fail_roster_loads: bool,
    /// Save endpoint answers 500 with an empty body.
    pub fail_saves: bool,
    pub omit_roster_stats: bool,
    pub fail_branches: bool,
    /// Stats sections answering 500.
    pub failing_sections: Vec<&'static str>,
}

impl FakeDb {
    fn seeded() -> Self {
        let users = vec![
            FakeUser { id: 1, username: "admin", role_id: 1, role_nome: "Administrador" },
            FakeUser { id: 2, username: "secretaria", role_id: 4, role_nome: "Secretário" },
            FakeUser { id: 3, username: "callcenter", role_id: 9, role_nome: "Call-center" },
        ];
        let members = vec![
            FakeMember { id: 1, nome: "Ana Machava", codigo: "M001", branch: "IICGP-Zimpeto" },
            FakeMember { id: 2, nome: "Bento Cossa", codigo: "M002", branch: "IICGP-Zimpeto" },
            FakeMember { id: 3, nome: "Carla Nhantumbo", codigo: "M003", branch: "IICGP-Maxixe" },
            FakeMember { id: 4, nome: "Daniel Tembe", codigo: "M004", branch: "IICGP-Maxixe" },
            FakeMember { id: 5, nome: "Elsa Mondlane", codigo: "M005", branch: "IICGP-Zimpeto" },
        ];
        Self {
            users,
            members,
            next_id: 1,
            ..Self::default()
        }
    }

    pub fn add_culto(&mut self, data: &str, tipo: &str) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        self.cultos.push(FakeCulto {
            id,
            data: data.to_string(),
            tipo: tipo.to_string(),
            categoria: "Culto".to_string(),
            pregador: None,
            horario: None,
            branch_id: None,
        });
        id
    }

    pub fn mark(&mut self, culto_id: i64, membro_id: i64, presente: bool) {
        self.marks.insert((culto_id, membro_id), (presente, None));
    }

    pub fn present_count(&self, culto_id: i64) -> i64 {
        self.marks
            .iter()
            .filter(|((c, _), (presente, _))| *c == culto_id && *presente)
            .count() as i64
    }

    fn culto_json(&self, culto: &FakeCulto) -> Value {
        json!({
            "id": culto.id,
            "data": format!("{}T00:00:00.000Z", culto.data),
            "tipo": culto.tipo,
            "categoria": culto.categoria,
            "pregador": culto.pregador,
            "horario": culto.horario,
            "branch_id": culto.branch_id,
            "nome_branch": Value::Null,
            // Postgres COUNT comes back as a string.
            "total_presentes": self.present_count(culto.id).to_string(),
        })
    }

    fn per_culto(&self) -> Vec<(FakeCulto, i64, i64)> {
        let total = self.members.len() as i64;
        let mut rows: Vec<_> = self
            .cultos
            .iter()
            .map(|c| {
                let present = self.present_count(c.id);
                (c.clone(), present, total - present)
            })
            .collect();
        rows.sort_by(|a, b| b.0.data.cmp(&a.0.data));
        rows
    }
}

fn rate(present: i64, total: i64) -> String {
    if total <= 0 {
        return "0.0".to_string();
    }
    format!("{:.1}", present as f64 * 100.0 / total as f64)
}

fn short_date(data: &str) -> String {
    // YYYY-MM-DD -> DD/MM
    format!("{}/{}", &data[8..10], &data[5..7])
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct FakeState {
    db: Arc<Mutex<FakeDb>>,
    hits: Arc<AtomicUsize>,
    token_seq: Arc<AtomicUsize>,
}

pub struct FakeBackend {
    pub base_url: String,
    state: FakeState,
}

impl FakeBackend {
    pub async fn spawn() -> Self {
        let state = FakeState {
            db: Arc::new(Mutex::new(FakeDb::seeded())),
            hits: Arc::new(AtomicUsize::new(0)),
            token_seq: Arc::new(AtomicUsize::new(0)),
        };
        let app = router(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("fake backend address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake backend stopped");
        });
        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// A client with an empty session.
    pub fn api(&self) -> IicgpApi {
        IicgpApi::with_client(
            reqwest::Client::new(),
            self.base_url.clone(),
            Session::new(MemoryTokenStore::new()),
        )
    }

    /// A client already logged in as `username`.
    pub async fn api_as(&self, username: &str) -> IicgpApi {
        let api = self.api();
        api.session()
            .login(&api, username, PASSWORD)
            .await
            .expect("login should succeed");
        api
    }

    pub fn db(&self) -> MutexGuard<'_, FakeDb> {
        self.state.db.lock().expect("fake db lock")
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    /// Invalidate every issued token, as if they all expired.
    pub fn revoke_tokens(&self) {
        self.db().tokens.clear();
    }
}

fn router(state: FakeState) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/api/membros/branches", get(branches))
        .route("/api/cultos", get(list_cultos).post(create_culto))
        .route("/api/cultos/{id}", axum::routing::delete(delete_culto))
        .route("/api/cultos/{id}/presencas", get(roster).post(save_roster))
        .route("/api/cultos/{id}/importar", post(import_roster))
        .route("/api/cultos/stats/{section}", get(stats))
        .layer(middleware::from_fn_with_state(state.clone(), count_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn count_requests(State(state): State<FakeState>, request: Request, next: Next) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    next.run(request).await
}

type HandlerResult = Result<Response, Response>;

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn authorize(state: &FakeState, headers: &HeaderMap) -> Result<FakeUser, Response> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Token não fornecido"))?;
    let db = state.db.lock().expect("fake db lock");
    let user_id = db
        .tokens
        .get(token)
        .copied()
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Token inválido"))?;
    db.users
        .iter()
        .find(|u| u.id == user_id)
        .cloned()
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Token inválido"))
}

// ---- auth ----

async fn login(State(state): State<FakeState>, Json(body): Json<Value>) -> HandlerResult {
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let mut db = state.db.lock().expect("fake db lock");
    let user = db
        .users
        .iter()
        .find(|u| u.username == username)
        .cloned()
        .filter(|_| password == PASSWORD)
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Utilizador ou senha incorretos"))?;
    let seq = state.token_seq.fetch_add(1, Ordering::SeqCst);
    let token = format!("token-{}-{seq}", user.id);
    db.tokens.insert(token.clone(), user.id);
    Ok(Json(json!({ "token": token })).into_response())
}

async fn me(State(state): State<FakeState>, headers: HeaderMap) -> HandlerResult {
    let user = authorize(&state, &headers)?;
    Ok(Json(json!({
        "id": user.id,
        "username": user.username,
        "role_id": user.role_id,
        "role_nome": user.role_nome,
        "ativo": true,
        "data_criacao": "2024-01-10T09:00:00.000Z",
    }))
    .into_response())
}

async fn branches(State(state): State<FakeState>, headers: HeaderMap) -> HandlerResult {
    authorize(&state, &headers)?;
    if state.db.lock().expect("fake db lock").fail_branches {
        return Err(error(StatusCode::INTERNAL_SERVER_ERROR, "Erro interno"));
    }
    Ok(Json(json!({
        "branches": [
            { "id": 8, "nome": "IICGP-Zimpeto" },
            { "id": 4, "nome": "IICGP-Maxixe" },
        ]
    }))
    .into_response())
}

// ---- cultos ----

async fn list_cultos(State(state): State<FakeState>, headers: HeaderMap) -> HandlerResult {
    authorize(&state, &headers)?;
    let db = state.db.lock().expect("fake db lock");
    let mut cultos: Vec<_> = db.cultos.iter().collect();
    cultos.sort_by(|a, b| b.data.cmp(&a.data));
    let cultos: Vec<Value> = cultos.into_iter().map(|c| db.culto_json(c)).collect();
    Ok(Json(json!({ "cultos": cultos })).into_response())
}

async fn create_culto(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> HandlerResult {
    authorize(&state, &headers)?;
    let data = body["data"].as_str().unwrap_or_default();
    let tipo = body["tipo"].as_str().unwrap_or_default();
    if data.is_empty() || tipo.is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "Data e tipo são obrigatórios"));
    }
    let mut db = state.db.lock().expect("fake db lock");
    let id = db.add_culto(data, tipo);
    if let Some(culto) = db.cultos.iter_mut().find(|c| c.id == id) {
        culto.categoria = body["categoria"].as_str().unwrap_or("Culto").to_string();
        culto.pregador = body["pregador"].as_str().map(str::to_string);
        culto.horario = body["horario"].as_str().map(str::to_string);
        culto.branch_id = body["branch_id"].as_i64();
    }
    let culto = db
        .cultos
        .iter()
        .find(|c| c.id == id)
        .map(|c| db.culto_json(c))
        .unwrap_or(Value::Null);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Culto criado com sucesso", "culto": culto })),
    )
        .into_response())
}

async fn delete_culto(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> HandlerResult {
    authorize(&state, &headers)?;
    let mut db = state.db.lock().expect("fake db lock");
    let before = db.cultos.len();
    db.cultos.retain(|c| c.id != id);
    if db.cultos.len() == before {
        return Err(error(StatusCode::NOT_FOUND, "Culto não encontrado"));
    }
    db.marks.retain(|(c, _), _| *c != id);
    Ok(Json(json!({ "message": "Culto apagado" })).into_response())
}

// ---- presences ----

async fn roster(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> HandlerResult {
    authorize(&state, &headers)?;
    let db = state.db.lock().expect("fake db lock");
    if db.fail_roster_loads {
        return Err(error(StatusCode::INTERNAL_SERVER_ERROR, "Erro interno"));
    }
    if !db.cultos.iter().any(|c| c.id == id) {
        return Err(error(StatusCode::NOT_FOUND, "Culto não encontrado"));
    }
    let membros: Vec<Value> = db
        .members
        .iter()
        .map(|m| {
            let mark = db.marks.get(&(id, m.id));
            json!({
                "membro_id": m.id,
                "nome_membro": m.nome,
                "codigo": m.codigo,
                "nome_branch": m.branch,
                "presente": mark.map(|(p, _)| json!(p)).unwrap_or(Value::Null),
                "observacao": mark.and_then(|(_, o)| o.clone()),
            })
        })
        .collect();
    if db.omit_roster_stats {
        return Ok(Json(json!({ "membros": membros })).into_response());
    }
    let total = db.members.len() as i64;
    let presentes = db.present_count(id);
    Ok(Json(json!({
        "membros": membros,
        "stats": {
            "total": total.to_string(),
            "presentes": presentes.to_string(),
            "ausentes": (total - presentes).to_string(),
            "percentagem": rate(presentes, total),
        }
    }))
    .into_response())
}

async fn save_roster(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> HandlerResult {
    authorize(&state, &headers)?;
    let mut db = state.db.lock().expect("fake db lock");
    if db.fail_saves {
        return Err((StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))).into_response());
    }
    let Some(presencas) = body["presencas"].as_array().cloned() else {
        return Err(error(StatusCode::BAD_REQUEST, "Formato inválido"));
    };
    db.marks.retain(|(c, _), _| *c != id);
    for mark in &presencas {
        let membro_id = mark["membro_id"].as_i64().unwrap_or_default();
        let presente = mark["presente"].as_bool().unwrap_or(false);
        let observacao = mark["observacao"].as_str().map(str::to_string);
        db.marks.insert((id, membro_id), (presente, observacao));
    }
    db.saves.push(body);
    Ok(Json(json!({ "message": "Presenças guardadas" })).into_response())
}

async fn import_roster(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> HandlerResult {
    authorize(&state, &headers)?;
    let mut contents: Option<String> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| error(StatusCode::BAD_REQUEST, &e.to_string()))?
    {
        if field.name() == Some("ficheiro") {
            let text = field
                .text()
                .await
                .map_err(|e| error(StatusCode::BAD_REQUEST, &e.to_string()))?;
            contents = Some(text);
        }
    }
    let contents =
        contents.ok_or_else(|| error(StatusCode::BAD_REQUEST, "Nenhum ficheiro enviado"))?;

    // codigo,presente
    let mut rows = Vec::new();
    {
        let db = state.db.lock().expect("fake db lock");
        for line in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if line.to_lowercase().starts_with("codigo") {
                continue;
            }
            let mut cols = line.split(',').map(str::trim);
            let codigo = cols.next().unwrap_or_default();
            let presente = matches!(
                cols.next().unwrap_or_default().to_lowercase().as_str(),
                "1" | "sim" | "true" | "presente"
            );
            let member = db
                .members
                .iter()
                .find(|m| m.codigo == codigo)
                .ok_or_else(|| {
                    error(
                        StatusCode::UNPROCESSABLE_ENTITY,
                        &format!("Membro desconhecido: {codigo}"),
                    )
                })?;
            rows.push((member.id, presente));
        }
    }

    let mut db = state.db.lock().expect("fake db lock");
    for (membro_id, presente) in &rows {
        db.mark(id, *membro_id, *presente);
    }
    Ok(Json(json!({ "message": format!("{} presenças importadas", rows.len()) })).into_response())
}

// ---- stats ----

async fn stats(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Path(section): Path<String>,
) -> HandlerResult {
    authorize(&state, &headers)?;
    let db = state.db.lock().expect("fake db lock");
    if db.failing_sections.iter().any(|s| *s == section) {
        return Err(error(StatusCode::INTERNAL_SERVER_ERROR, "Erro interno"));
    }
    let total_members = db.members.len() as i64;
    let per_culto = db.per_culto();

    let body = match section.as_str() {
        "gerais" => {
            let total_presencas: i64 = per_culto.iter().map(|(_, p, _)| p).sum();
            let media = if per_culto.is_empty() {
                0.0
            } else {
                total_presencas as f64 / per_culto.len() as f64
            };
            json!({
                "stats": {
                    "totalCultos": per_culto.len(),
                    "totalPresencas": total_presencas.to_string(),
                    "totalMembros": total_members,
                    "mediaPorCulto": format!("{media:.1}"),
                }
            })
        }
        "por-mes" => {
            let mut months: Vec<(String, i64, i64)> = Vec::new();
            for (culto, present, absent) in per_culto.iter().rev() {
                let mes = culto.data[..7].to_string();
                match months.iter_mut().find(|(m, _, _)| *m == mes) {
                    Some(row) => {
                        row.1 += present;
                        row.2 += absent;
                    }
                    None => months.push((mes, *present, *absent)),
                }
            }
            let dados: Vec<Value> = months
                .into_iter()
                .map(|(mes, p, a)| {
                    json!({ "mes": mes, "presentes": p, "ausentes": a, "taxa_presenca": rate(p, p + a) })
                })
                .collect();
            json!({ "dados": dados })
        }
        "por-culto" => {
            let dados: Vec<Value> = per_culto
                .iter()
                .map(|(c, p, a)| {
                    json!({
                        "id": c.id,
                        "data_curta": short_date(&c.data),
                        "tipo": c.tipo,
                        "presentes": p,
                        "ausentes": a,
                        "taxa_presenca": rate(*p, p + a),
                    })
                })
                .collect();
            json!({ "dados": dados })
        }
        "mais-assiduos" | "mais-faltas" => {
            let wanted = section == "mais-assiduos";
            let mut ranks: Vec<(FakeMember, i64)> = db
                .members
                .iter()
                .map(|m| {
                    let n = db
                        .marks
                        .iter()
                        .filter(|((_, mid), (p, _))| *mid == m.id && *p == wanted)
                        .count() as i64;
                    (m.clone(), n)
                })
                .filter(|(_, n)| *n > 0)
                .collect();
            ranks.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.id.cmp(&b.0.id)));
            let key = if wanted { "total_presencas" } else { "total_faltas" };
            let dados: Vec<Value> = ranks
                .into_iter()
                .map(|(m, n)| {
                    let mut row = json!({ "id": m.id, "nome_membro": m.nome, "nome_branch": m.branch });
                    row[key] = json!(n.to_string());
                    row
                })
                .collect();
            json!({ "dados": dados })
        }
        "melhor-culto" => {
            let mut best = per_culto.clone();
            best.sort_by(|a, b| b.1.cmp(&a.1));
            let dados: Vec<Value> = best
                .into_iter()
                .take(1)
                .map(|(c, p, _)| {
                    json!({ "id": c.id, "tipo": c.tipo, "data_curta": short_date(&c.data), "presentes": p })
                })
                .collect();
            json!({ "dados": dados })
        }
        _ => return Err(error(StatusCode::NOT_FOUND, "Rota não encontrada")),
    };
    Ok(Json(body).into_response())
}
