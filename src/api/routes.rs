//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, State},
    middleware,
    routing::get,
    Json, Router,
};

use crate::domain::{
    Account, AccountChanges, AccountEvent, CallerId, Member, MemberRole, Transaction,
    TransactionType, User,
};
use crate::error::{AppError, AppResult};
use crate::handlers::{
    AccountHandler, AddMemberCommand, CreateAccountCommand, CredentialsCommand, MemberHandler,
    ReferenceHandler, SessionHandler, TokenResponse, TransactionHandler, UpdateMemberCommand,
    UpdateUserCommand, UserHandler,
};
use crate::state::AppState;

use super::middleware::auth_middleware;

// =========================================================================
// Extractors
// =========================================================================

/// JSON body whose rejections render as `AppError`
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Path parameters whose rejections render as `AppError`
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct PathParams<T>(pub T);

// =========================================================================
// Router
// =========================================================================

/// Create the API router
///
/// `/health`, `/login` and registration are public; everything else needs a
/// bearer token.
pub fn create_router(state: AppState) -> Router {
    let mut protected = Router::new()
        .route("/users/:user_id", get(get_user).patch(update_user))
        .route("/accounts", get(list_accounts).post(create_account))
        .route(
            "/accounts/:account_id",
            get(get_account).patch(update_account).delete(delete_account),
        )
        .route("/accounts/:account_id/events", get(list_account_events))
        .route(
            "/accounts/:account_id/members",
            get(list_members).post(add_member),
        )
        .route(
            "/accounts/:account_id/members/:user_id",
            get(get_member).patch(update_member).delete(delete_member),
        )
        .route(
            "/accounts/:account_id/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route(
            "/accounts/:account_id/transactions/:transaction_id",
            get(get_transaction)
                .patch(update_transaction)
                .delete(delete_transaction),
        )
        .route("/member-roles", get(list_member_roles))
        .route("/transaction-types", get(list_transaction_types));

    if state.expose_user_directory {
        tracing::warn!("GET /users is mounted and lists every user");
        protected = protected.route("/users", get(list_users));
    }

    let protected = protected.route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth_middleware,
    ));

    Router::new()
        .route("/health", get(health_check))
        .route("/login", get(login).post(login))
        .route("/users", axum::routing::post(register))
        .merge(protected)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

// =========================================================================
// Session
// =========================================================================

async fn login(
    State(state): State<AppState>,
    JsonBody(command): JsonBody<CredentialsCommand>,
) -> AppResult<Json<TokenResponse>> {
    let handler = SessionHandler::new(state.store, state.tokens, state.passwords);
    Ok(Json(handler.login(command).await?))
}

async fn register(
    State(state): State<AppState>,
    JsonBody(command): JsonBody<CredentialsCommand>,
) -> AppResult<Json<User>> {
    let handler = SessionHandler::new(state.store, state.tokens, state.passwords);
    Ok(Json(handler.register(command).await?))
}

// =========================================================================
// Users
// =========================================================================

async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    let handler = UserHandler::new(state.store, state.passwords);
    Ok(Json(handler.list().await?))
}

async fn get_user(
    State(state): State<AppState>,
    caller: CallerId,
    PathParams(user_id): PathParams<i32>,
) -> AppResult<Json<User>> {
    let handler = UserHandler::new(state.store, state.passwords);
    Ok(Json(handler.get(caller, user_id).await?))
}

async fn update_user(
    State(state): State<AppState>,
    caller: CallerId,
    PathParams(user_id): PathParams<i32>,
    JsonBody(command): JsonBody<UpdateUserCommand>,
) -> AppResult<Json<User>> {
    let handler = UserHandler::new(state.store, state.passwords);
    Ok(Json(handler.update(caller, user_id, command).await?))
}

// =========================================================================
// Accounts
// =========================================================================

async fn list_accounts(
    State(state): State<AppState>,
    caller: CallerId,
) -> AppResult<Json<Vec<Account>>> {
    Ok(Json(AccountHandler::new(state.store).list(caller).await?))
}

async fn get_account(
    State(state): State<AppState>,
    caller: CallerId,
    PathParams(account_id): PathParams<i32>,
) -> AppResult<Json<Account>> {
    Ok(Json(
        AccountHandler::new(state.store).get(caller, account_id).await?,
    ))
}

async fn create_account(
    State(state): State<AppState>,
    caller: CallerId,
    JsonBody(command): JsonBody<CreateAccountCommand>,
) -> AppResult<Json<Account>> {
    Ok(Json(
        AccountHandler::new(state.store).create(caller, command).await?,
    ))
}

async fn update_account(
    State(state): State<AppState>,
    caller: CallerId,
    PathParams(account_id): PathParams<i32>,
    JsonBody(changes): JsonBody<AccountChanges>,
) -> AppResult<Json<Account>> {
    let handler = AccountHandler::new(state.store);
    Ok(Json(handler.update(caller, account_id, changes).await?))
}

async fn delete_account(
    State(state): State<AppState>,
    caller: CallerId,
    PathParams(account_id): PathParams<i32>,
) -> AppResult<Json<&'static str>> {
    let handler = AccountHandler::new(state.store);
    Ok(Json(handler.delete(caller, account_id).await?))
}

async fn list_account_events(
    State(state): State<AppState>,
    caller: CallerId,
    PathParams(account_id): PathParams<i32>,
) -> AppResult<Json<Vec<AccountEvent>>> {
    let handler = AccountHandler::new(state.store);
    Ok(Json(handler.events(caller, account_id).await?))
}

// =========================================================================
// Members
// =========================================================================

async fn list_members(
    State(state): State<AppState>,
    caller: CallerId,
    PathParams(account_id): PathParams<i32>,
) -> AppResult<Json<Vec<Member>>> {
    let handler = MemberHandler::new(state.store);
    Ok(Json(handler.list(caller, account_id).await?))
}

async fn get_member(
    State(state): State<AppState>,
    caller: CallerId,
    PathParams((account_id, user_id)): PathParams<(i32, i32)>,
) -> AppResult<Json<Member>> {
    let handler = MemberHandler::new(state.store);
    Ok(Json(handler.get(caller, account_id, user_id).await?))
}

async fn add_member(
    State(state): State<AppState>,
    caller: CallerId,
    PathParams(account_id): PathParams<i32>,
    JsonBody(command): JsonBody<AddMemberCommand>,
) -> AppResult<Json<Member>> {
    let handler = MemberHandler::new(state.store);
    Ok(Json(handler.add(caller, account_id, command).await?))
}

async fn update_member(
    State(state): State<AppState>,
    caller: CallerId,
    PathParams((account_id, user_id)): PathParams<(i32, i32)>,
    JsonBody(command): JsonBody<UpdateMemberCommand>,
) -> AppResult<Json<Member>> {
    let handler = MemberHandler::new(state.store);
    Ok(Json(
        handler.update(caller, account_id, user_id, command).await?,
    ))
}

async fn delete_member(
    State(state): State<AppState>,
    caller: CallerId,
    PathParams((account_id, user_id)): PathParams<(i32, i32)>,
) -> AppResult<Json<&'static str>> {
    let handler = MemberHandler::new(state.store);
    Ok(Json(handler.delete(caller, account_id, user_id).await?))
}

// =========================================================================
// Transactions
// =========================================================================

async fn list_transactions(
    State(state): State<AppState>,
    caller: CallerId,
    PathParams(account_id): PathParams<i32>,
) -> AppResult<Json<Vec<Transaction>>> {
    let handler = TransactionHandler::new(state.store);
    Ok(Json(handler.list(caller, account_id).await?))
}

async fn get_transaction(
    State(state): State<AppState>,
    caller: CallerId,
    PathParams((account_id, transaction_id)): PathParams<(i32, i32)>,
) -> AppResult<Json<Transaction>> {
    let handler = TransactionHandler::new(state.store);
    Ok(Json(
        handler.get(caller, account_id, transaction_id).await?,
    ))
}

/// The body stays raw until the handler has checked membership
async fn create_transaction(
    State(state): State<AppState>,
    caller: CallerId,
    PathParams(account_id): PathParams<i32>,
    body: Bytes,
) -> AppResult<Json<Transaction>> {
    let handler = TransactionHandler::new(state.store);
    Ok(Json(handler.create(caller, account_id, &body).await?))
}

async fn update_transaction(
    State(state): State<AppState>,
    caller: CallerId,
    PathParams((account_id, transaction_id)): PathParams<(i32, i32)>,
    body: Bytes,
) -> AppResult<Json<Transaction>> {
    let handler = TransactionHandler::new(state.store);
    Ok(Json(
        handler
            .update(caller, account_id, transaction_id, &body)
            .await?,
    ))
}

async fn delete_transaction(
    State(state): State<AppState>,
    caller: CallerId,
    PathParams((account_id, transaction_id)): PathParams<(i32, i32)>,
) -> AppResult<Json<&'static str>> {
    let handler = TransactionHandler::new(state.store);
    Ok(Json(
        handler.delete(caller, account_id, transaction_id).await?,
    ))
}

// =========================================================================
// Reference data
// =========================================================================

async fn list_member_roles(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<MemberRole>>> {
    Ok(Json(ReferenceHandler::new(state.store).member_roles().await?))
}

async fn list_transaction_types(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<TransactionType>>> {
    Ok(Json(
        ReferenceHandler::new(state.store).transaction_types().await?,
    ))
}
