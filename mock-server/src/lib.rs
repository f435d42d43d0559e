use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Company {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "catchPhrase", default, skip_serializing_if = "Option::is_none")]
    pub catch_phrase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bs: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Address {
    pub street: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suite: Option<String>,
    pub city: String,
    pub zipcode: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: Company,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub company: Company,
    pub address: Option<Address>,
    pub username: Option<String>,
    pub website: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<Company>,
    pub address: Option<Address>,
    pub username: Option<String>,
    pub website: Option<String>,
}

/// Body of `POST /__faults`: fail the next `fail_next` mutating requests
/// with `status`.
#[derive(Deserialize)]
pub struct FaultRequest {
    pub fail_next: u32,
    #[serde(default = "default_fault_status")]
    pub status: u16,
}

fn default_fault_status() -> u16 {
    500
}

#[derive(Debug, Default)]
struct FaultPlan {
    remaining: u32,
    status: u16,
}

pub type Db = Arc<RwLock<BTreeMap<u64, User>>>;

#[derive(Clone)]
pub struct AppState {
    db: Db,
    faults: Arc<RwLock<FaultPlan>>,
}

/// Router seeded with the ten sample users.
pub fn app() -> Router {
    app_with(seed_users())
}

pub fn empty_app() -> Router {
    app_with(Vec::new())
}

pub fn app_with(users: Vec<User>) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(users.into_iter().map(|u| (u.id, u)).collect())),
        faults: Arc::new(RwLock::new(FaultPlan::default())),
    };
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", get(get_user).patch(update_user).delete(delete_user))
        .route("/__faults", post(set_faults))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(listener: TcpListener, router: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, router).await
}

/// Consume one injected failure, if any are armed.
async fn take_fault(state: &AppState) -> Option<StatusCode> {
    let mut plan = state.faults.write().await;
    if plan.remaining == 0 {
        return None;
    }
    plan.remaining -= 1;
    warn!(status = plan.status, remaining = plan.remaining, "injecting failure");
    Some(StatusCode::from_u16(plan.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
}

async fn set_faults(State(state): State<AppState>, Json(input): Json<FaultRequest>) -> StatusCode {
    let mut plan = state.faults.write().await;
    plan.remaining = input.fail_next;
    plan.status = input.status;
    info!(fail_next = input.fail_next, status = input.status, "fault plan armed");
    StatusCode::NO_CONTENT
}

async fn list_users(State(state): State<AppState>) -> Json<Vec<User>> {
    let users = state.db.read().await;
    Json(users.values().cloned().collect())
}

async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<CreateUser>,
) -> Result<(StatusCode, Json<User>), StatusCode> {
    if let Some(status) = take_fault(&state).await {
        return Err(status);
    }
    let mut users = state.db.write().await;
    let id = users.keys().next_back().map_or(1, |last| last + 1);
    let user = User {
        id,
        name: input.name,
        email: input.email,
        phone: input.phone,
        company: input.company,
        address: input.address,
        username: input.username,
        website: input.website,
    };
    users.insert(id, user.clone());
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<User>, StatusCode> {
    let users = state.db.read().await;
    users.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<UpdateUser>,
) -> Result<Json<User>, StatusCode> {
    if let Some(status) = take_fault(&state).await {
        return Err(status);
    }
    let mut users = state.db.write().await;
    let user = users.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(name) = input.name {
        user.name = name;
    }
    if let Some(email) = input.email {
        user.email = email;
    }
    if let Some(phone) = input.phone {
        user.phone = phone;
    }
    if let Some(company) = input.company {
        user.company = company;
    }
    if input.address.is_some() {
        user.address = input.address;
    }
    if input.username.is_some() {
        user.username = input.username;
    }
    if input.website.is_some() {
        user.website = input.website;
    }
    Ok(Json(user.clone()))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, StatusCode> {
    if let Some(status) = take_fault(&state).await {
        return Err(status);
    }
    let mut users = state.db.write().await;
    users.remove(&id).map(|_| StatusCode::NO_CONTENT).ok_or(StatusCode::NOT_FOUND)
}

/// The ten sample users, ids 1 through 10.
pub fn seed_users() -> Vec<User> {
    const SEED: [(&str, &str, &str, &str, &str, &str, &str, &str, &str, &str); 10] = [
        ("Leanne Graham", "Bret", "Sincere@april.biz", "1-770-736-8031 x56442", "hildegard.org", "Romaguera-Crona", "Kulas Light", "Apt. 556", "Gwenborough", "92998-3874"),
        ("Ervin Howell", "Antonette", "Shanna@melissa.tv", "010-692-6593 x09125", "anastasia.net", "Deckow-Crist", "Victor Plains", "Suite 879", "Wisokyburgh", "90566-7771"),
        ("Clementine Bauch", "Samantha", "Nathan@yesenia.net", "1-463-123-4447", "ramiro.info", "Romaguera-Jacobson", "Douglas Extension", "Suite 847", "McKenziehaven", "59590-4157"),
        ("Patricia Lebsack", "Karianne", "Julianne.OConner@kory.org", "493-170-9623 x156", "kale.biz", "Robel-Corkery", "Hoeger Mall", "Apt. 692", "South Elvis", "53919-4257"),
        ("Chelsey Dietrich", "Kamren", "Lucio_Hettinger@annie.ca", "(254)954-1289", "demarco.info", "Keebler LLC", "Skiles Walks", "Suite 351", "Roscoeview", "33263"),
        ("Mrs. Dennis Schulist", "Leopoldo_Corkery", "Karley_Dach@jasper.info", "1-477-935-8478 x6430", "ola.org", "Considine-Lockman", "Norberto Crossing", "Apt. 950", "South Christy", "23505-1337"),
        ("Kurtis Weissnat", "Elwyn.Skiles", "Telly.Hoeger@billy.biz", "210.067.6132", "elvis.io", "Johns Group", "Rex Trail", "Suite 280", "Howemouth", "58804-1099"),
        ("Nicholas Runolfsdottir V", "Maxime_Nienow", "Sherwood@rosamond.me", "586.493.6943 x140", "jacynthe.com", "Abernathy Group", "Ellsworth Summit", "Suite 729", "Aliyaview", "45169"),
        ("Glenna Reichert", "Delphine", "Chaim_McDermott@dana.io", "(775)976-6794 x41206", "conrad.com", "Yost and Sons", "Dayna Park", "Suite 449", "Bartholomebury", "76495-3109"),
        ("Clementina DuBuque", "Moriah.Stanton", "Rey.Padberg@karina.biz", "024-648-3804", "ambrose.net", "Hoeger LLC", "Kattie Turnpike", "Suite 198", "Lebsackbury", "31428-2261"),
    ];

    SEED.iter()
        .zip(1u64..)
        .map(|(&(name, username, email, phone, website, company, street, suite, city, zipcode), id)| User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            company: Company {
                name: company.to_string(),
                ..Company::default()
            },
            address: Some(Address {
                street: street.to_string(),
                suite: Some(suite.to_string()),
                city: city.to_string(),
                zipcode: zipcode.to_string(),
            }),
            username: Some(username.to_string()),
            website: Some(website.to_string()),
        })
        .collect()
}
