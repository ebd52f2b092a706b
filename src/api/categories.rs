// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use super::guard::{ClientAddress, WritesEnabled};
use crate::{
    error::ApiError,
    models::{Category, CategoryRequest},
    state::AppState,
    storage::{ActivityAction, ActivityLog, CategoryRepository, EntityType},
};

pub const CATEGORY_NAME_EMPTY: &str = "category name cannot be empty";
pub const CATEGORY_NAME_CONFLICT: &str = "category name already exists";

fn validated_name(request: &CategoryRequest) -> Result<String, ApiError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request(CATEGORY_NAME_EMPTY));
    }
    Ok(name.to_string())
}

/// Names are ciphertext at rest, so uniqueness is checked on the decrypted
/// listing. Callers hold `state.write_lock` across the check and the write.
fn ensure_unique_name(
    state: &AppState,
    name: &str,
    exclude_id: Option<&str>,
) -> Result<(), ApiError> {
    let existing = CategoryRepository::new(&state.db).get_all()?;
    let taken = state
        .codec
        .decrypt_fields_lenient(existing)
        .iter()
        .any(|c| c.name == name && Some(c.id.as_str()) != exclude_id);

    if taken {
        return Err(ApiError::conflict(CATEGORY_NAME_CONFLICT));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/categories",
    tag = "Categories",
    responses(
        (status = 200, body = [Category]),
        (status = 503, description = "Encryption key unavailable")
    )
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    state.gate().require_readable()?;
    let sealed = CategoryRepository::new(&state.db).get_all()?;
    Ok(Json(state.codec.decrypt_fields_lenient(sealed)))
}

#[utoipa::path(
    get,
    path = "/categories/{id}",
    params(("id" = String, Path, description = "Category identifier")),
    tag = "Categories",
    responses(
        (status = 200, body = Category),
        (status = 404, description = "Category not found"),
        (status = 503, description = "Encryption key unavailable")
    )
)]
pub async fn get_category(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Category>, ApiError> {
    let sealed = CategoryRepository::new(&state.db).get_by_id(&id)?;
    Ok(Json(state.codec.decrypt_fields(sealed)?))
}

#[utoipa::path(
    post,
    path = "/categories",
    request_body = CategoryRequest,
    tag = "Categories",
    responses(
        (status = 201, body = Category),
        (status = 400, description = "Empty name"),
        (status = 403, description = "Encryption unavailable"),
        (status = 409, description = "Name already exists")
    )
)]
pub async fn create_category(
    _: WritesEnabled,
    State(state): State<AppState>,
    ClientAddress(ip): ClientAddress,
    Json(request): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let name = validated_name(&request)?;

    let _guard = state.write_lock.lock().await;
    ensure_unique_name(&state, &name, None)?;

    let sealed = state.codec.encrypt_fields(Category::new(name))?;
    CategoryRepository::new(&state.db).create(&sealed)?;

    let label = state.codec.safe_decrypt(&sealed.as_stored().name);
    let category = state.codec.decrypt_fields(sealed)?;

    state.audit.record(
        ActivityLog::new(
            ActivityAction::Create,
            EntityType::Category,
            format!("Created category: {label}"),
        )
        .with_entity(&category.id)
        .with_ip(ip),
    );

    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    put,
    path = "/categories/{id}",
    params(("id" = String, Path, description = "Category identifier")),
    request_body = CategoryRequest,
    tag = "Categories",
    responses(
        (status = 200, body = Category),
        (status = 403, description = "Encryption unavailable"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Name already exists")
    )
)]
pub async fn update_category(
    _: WritesEnabled,
    Path(id): Path<String>,
    State(state): State<AppState>,
    ClientAddress(ip): ClientAddress,
    Json(request): Json<CategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    let name = validated_name(&request)?;

    let _guard = state.write_lock.lock().await;
    let repo = CategoryRepository::new(&state.db);
    let mut category = repo.get_by_id(&id)?.into_stored();
    ensure_unique_name(&state, &name, Some(&id))?;

    category.name = name;
    category.updated_at = Utc::now();

    let sealed = state.codec.encrypt_fields(category)?;
    repo.update(&sealed)?;

    let label = state.codec.safe_decrypt(&sealed.as_stored().name);
    let category = state.codec.decrypt_fields(sealed)?;

    state.audit.record(
        ActivityLog::new(
            ActivityAction::Update,
            EntityType::Category,
            format!("Updated category: {label}"),
        )
        .with_entity(&category.id)
        .with_ip(ip),
    );

    Ok(Json(category))
}

#[utoipa::path(
    delete,
    path = "/categories/{id}",
    params(("id" = String, Path, description = "Category identifier")),
    tag = "Categories",
    responses(
        (status = 204),
        (status = 403, description = "Encryption unavailable"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Category still has notes")
    )
)]
pub async fn delete_category(
    _: WritesEnabled,
    Path(id): Path<String>,
    State(state): State<AppState>,
    ClientAddress(ip): ClientAddress,
) -> Result<StatusCode, ApiError> {
    let repo = CategoryRepository::new(&state.db);
    let existing = repo.get_by_id(&id)?;
    let label = state.codec.safe_decrypt(&existing.as_stored().name);

    repo.delete(&id)?;

    state.audit.record(
        ActivityLog::new(
            ActivityAction::Delete,
            EntityType::Category,
            format!("Deleted category: {label}"),
        )
        .with_entity(&id)
        .with_ip(ip),
    );

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::Sealed;
    use crate::models::{Note, NoteRequest};
    use crate::state::test_support::TestContext;
    use crate::storage::NoteRepository;

    fn ip() -> ClientAddress {
        ClientAddress("127.0.0.1".into())
    }

    fn named(name: &str) -> Json<CategoryRequest> {
        Json(CategoryRequest { name: name.into() })
    }

    async fn create(ctx: &TestContext, name: &str) -> Result<Category, ApiError> {
        create_category(WritesEnabled, State(ctx.state.clone()), ip(), named(name))
            .await
            .map(|(_, Json(category))| category)
    }

    #[tokio::test]
    async fn create_category_success() {
        let mut ctx = TestContext::valid();

        let (status, Json(category)) =
            create_category(WritesEnabled, State(ctx.state.clone()), ip(), named("  Work "))
                .await
                .expect("category creation succeeds");

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(category.name, "Work");

        let stored = CategoryRepository::new(&ctx.state.db)
            .get_by_id(&category.id)
            .unwrap();
        assert_ne!(stored.as_stored().name, "Work");

        let audit = ctx.drain_audit();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].description, "Created category: Work");
        assert_eq!(audit[0].entity_id.as_deref(), Some(category.id.as_str()));
        assert_eq!(audit[0].ip_address, "127.0.0.1");
    }

    #[tokio::test]
    async fn create_rejects_empty_and_duplicate_names() {
        let ctx = TestContext::valid();

        let err = create(&ctx, "   ").await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, CATEGORY_NAME_EMPTY);

        create(&ctx, "Work").await.unwrap();
        let err = create(&ctx, "Work").await.unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.message, CATEGORY_NAME_CONFLICT);
    }

    #[tokio::test]
    async fn create_with_invalid_gate_writes_nothing() {
        let ctx = TestContext::invalid();

        // Even if the extractor were bypassed, the codec refuses to encrypt.
        let err = create(&ctx, "Work").await.unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert!(CategoryRepository::new(&ctx.state.db)
            .get_all()
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn get_and_list_categories() {
        let ctx = TestContext::valid();
        let work = create(&ctx, "Work").await.unwrap();
        let home = create(&ctx, "Home").await.unwrap();

        let Json(fetched) = get_category(Path(work.id.clone()), State(ctx.state.clone()))
            .await
            .unwrap();
        assert_eq!(fetched, work);

        let Json(all) = list_categories(State(ctx.state.clone())).await.unwrap();
        assert_eq!(all, vec![work, home]);

        let err = get_category(Path("missing".into()), State(ctx.state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_drops_plaintext_rows() {
        let ctx = TestContext::valid();
        let kept = create(&ctx, "Encrypted").await.unwrap();
        CategoryRepository::new(&ctx.state.db)
            .create(&Sealed::from_storage(Category::new("legacy plaintext")))
            .unwrap();

        let Json(all) = list_categories(State(ctx.state.clone())).await.unwrap();
        assert_eq!(all, vec![kept]);
    }

    #[tokio::test]
    async fn update_category_renames() {
        let ctx = TestContext::valid();
        let work = create(&ctx, "Work").await.unwrap();
        create(&ctx, "Home").await.unwrap();

        let Json(renamed) = update_category(
            WritesEnabled,
            Path(work.id.clone()),
            State(ctx.state.clone()),
            ip(),
            named("Office"),
        )
        .await
        .unwrap();
        assert_eq!(renamed.id, work.id);
        assert_eq!(renamed.name, "Office");
        assert_eq!(renamed.created_at, work.created_at);

        // Keeping its own name is not a conflict, taking another one is.
        update_category(
            WritesEnabled,
            Path(work.id.clone()),
            State(ctx.state.clone()),
            ip(),
            named("Office"),
        )
        .await
        .unwrap();
        let err = update_category(
            WritesEnabled,
            Path(work.id.clone()),
            State(ctx.state.clone()),
            ip(),
            named("Home"),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn update_missing_category_is_not_found() {
        let ctx = TestContext::valid();
        let err = update_category(
            WritesEnabled,
            Path("missing".into()),
            State(ctx.state.clone()),
            ip(),
            named("x"),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_category_in_use_conflicts() {
        let ctx = TestContext::valid();
        let work = create(&ctx, "Work").await.unwrap();
        let note = ctx
            .state
            .codec
            .encrypt_fields(Note::new(NoteRequest {
                subject: "s".into(),
                content: String::new(),
                priority: Default::default(),
                tags: String::new(),
                category_id: Some(work.id.clone()),
            }))
            .unwrap();
        NoteRepository::new(&ctx.state.db).create(&note).unwrap();

        let err = delete_category(WritesEnabled, Path(work.id.clone()), State(ctx.state.clone()), ip())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);

        NoteRepository::new(&ctx.state.db)
            .delete(note.entity_id())
            .unwrap();
        let status = delete_category(WritesEnabled, Path(work.id.clone()), State(ctx.state.clone()), ip())
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
