//! PostgreSQL tree store.
//!
//! Each node is one row holding its full document in a JSONB column. Single
//! document updates run read-modify-write inside a transaction that holds
//! the row lock, so concurrent updates of the same document serialize.
//! Selector-based updates resolve the matching ids first with JSONB
//! containment queries, then update each document in its own transaction.

use async_trait::async_trait;
use serde_json::json;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use stratum_core::error::{AppError, ErrorKind};
use stratum_core::result::AppResult;
use stratum_core::types::{ChildPage, DirectoryId, FileId, SortField};
use stratum_entity::{
    Directory, DirectorySelector, DirectoryUpdate, File, FileUpdate, Predicate, SearchQuery,
    SearchResult,
};

use super::TreeStore;

/// Tree store over the `directories` and `files` tables.
#[derive(Debug, Clone)]
pub struct PgTreeStore {
    pool: PgPool,
}

impl PgTreeStore {
    /// Create a new store on `pool`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lock one directory row, apply `update`, and write it back if it changed.
    /// With `recheck` set, documents that no longer match are left untouched.
    async fn apply_locked(
        &self,
        id: &DirectoryId,
        update: &DirectoryUpdate,
        recheck: Option<&DirectorySelector>,
    ) -> AppResult<Option<(Directory, bool)>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let doc = sqlx::query_scalar::<_, Json<Directory>>(
            "SELECT doc FROM directories WHERE id = $1 FOR UPDATE",
        )
        .bind(id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock directory", e))?;

        let Some(Json(mut dir)) = doc else {
            return Ok(None);
        };

        if recheck.is_some_and(|s| !s.matches(&dir)) {
            return Ok(Some((dir, false)));
        }

        let changed = update.apply(&mut dir);
        if changed {
            sqlx::query("UPDATE directories SET doc = $2 WHERE id = $1")
                .bind(id.to_string())
                .bind(Json(&dir))
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to update directory", e)
                })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
        })?;
        Ok(Some((dir, changed)))
    }

    /// Ids of directory documents matching a containment condition.
    async fn ids_containing(
        &self,
        sql: &str,
        patterns: &[serde_json::Value],
    ) -> AppResult<Vec<DirectoryId>> {
        let mut query = sqlx::query_scalar::<_, String>(sql);
        for pattern in patterns {
            query = query.bind(Json(pattern.clone()));
        }
        let raw = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to select directories", e))?;

        raw.iter()
            .map(|s| {
                s.parse::<DirectoryId>().map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Corrupt directory id", e)
                })
            })
            .collect()
    }

    async fn resolve(&self, selector: &DirectorySelector) -> AppResult<Vec<DirectoryId>> {
        let mut ids = match selector {
            DirectorySelector::Ids(ids) => return Ok(ids.clone()),
            DirectorySelector::ParentsOf(children) => {
                let mut ids = Vec::new();
                for child in children {
                    ids.extend(
                        self.ids_containing(
                            "SELECT id FROM directories WHERE doc->'directories' @> $1",
                            &[json!([{ "id": child }])],
                        )
                        .await?,
                    );
                }
                ids
            }
            DirectorySelector::PathReferences(ancestor) => {
                self.ids_containing(
                    "SELECT id FROM directories WHERE doc->'path' @> $1 OR doc->'directories' @> $2",
                    &[
                        json!([{ "id": ancestor }]),
                        json!([{ "path": [{ "id": ancestor }] }]),
                    ],
                )
                .await?
            }
        };
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

fn sort_expression(field: SortField) -> String {
    let key = field.document_key();
    match field {
        SortField::Name => format!("doc->>'{key}' COLLATE \"C\""),
        SortField::CreatedAt | SortField::UpdatedAt => format!("(doc->>'{key}')::timestamptz"),
        SortField::Size => format!("(doc->>'{key}')::bigint"),
    }
}

/// Start `SELECT {select} FROM {table}` restricted to `user_id` and `predicates`.
fn filtered(
    select: &str,
    table: &str,
    user_id: &str,
    predicates: &[Predicate],
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {select} FROM {table} WHERE user_id = "));
    qb.push_bind(user_id.to_owned());

    for predicate in predicates {
        match predicate {
            Predicate::NameEquals(name) => {
                qb.push(" AND doc->>'name' = ").push_bind(name.clone());
            }
            Predicate::CreatedWithin { from, to } => {
                if let Some(from) = from {
                    qb.push(" AND (doc->>'created_at')::timestamptz >= ").push_bind(*from);
                }
                if let Some(to) = to {
                    qb.push(" AND (doc->>'created_at')::timestamptz <= ").push_bind(*to);
                }
            }
            Predicate::UpdatedWithin { from, to } => {
                if let Some(from) = from {
                    qb.push(" AND (doc->>'updated_at')::timestamptz >= ").push_bind(*from);
                }
                if let Some(to) = to {
                    qb.push(" AND (doc->>'updated_at')::timestamptz <= ").push_bind(*to);
                }
            }
            Predicate::PublicIs(v) => {
                qb.push(" AND (doc->>'public')::boolean = ").push_bind(*v);
            }
            Predicate::StarredIs(v) => {
                qb.push(" AND (doc->>'starred')::boolean = ").push_bind(*v);
            }
            Predicate::SizeEquals(v) => {
                qb.push(" AND (doc->>'size')::bigint = ").push_bind(i64::try_from(*v).unwrap_or(i64::MAX));
            }
            Predicate::ExtensionIn(exts) => {
                if table == "files" {
                    qb.push(" AND doc->>'extension' = ANY(")
                        .push_bind(exts.clone())
                        .push(")");
                } else {
                    qb.push(" AND FALSE");
                }
            }
        }
    }
    qb
}

fn push_page(qb: &mut QueryBuilder<'static, Postgres>, page: &ChildPage) {
    let dir = page.direction.as_sql();
    qb.push(format!(
        " ORDER BY {} {dir}, id {dir} LIMIT ",
        sort_expression(page.sort_by)
    ));
    qb.push_bind(i64::try_from(page.window.limit).unwrap_or(i64::MAX));
    qb.push(" OFFSET ");
    qb.push_bind(i64::try_from(page.window.offset).unwrap_or(i64::MAX));
}

#[async_trait]
impl TreeStore for PgTreeStore {
    async fn find_directory(&self, id: &DirectoryId) -> AppResult<Option<Directory>> {
        let doc = sqlx::query_scalar::<_, Json<Directory>>("SELECT doc FROM directories WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find directory", e))?;
        Ok(doc.map(|Json(d)| d))
    }

    async fn find_root(&self, user_id: &str) -> AppResult<Option<Directory>> {
        let doc = sqlx::query_scalar::<_, Json<Directory>>(
            "SELECT doc FROM directories WHERE user_id = $1 AND (doc->>'parent_directory_id') IS NULL",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find root directory", e))?;
        Ok(doc.map(|Json(d)| d))
    }

    async fn insert_directory(&self, dir: &Directory) -> AppResult<()> {
        sqlx::query("INSERT INTO directories (id, user_id, doc) VALUES ($1, $2, $3)")
            .bind(dir.id.to_string())
            .bind(&dir.user_id)
            .bind(Json(dir))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::with_source(
                        ErrorKind::Conflict,
                        format!("directory {} conflicts with an existing document", dir.id),
                        e,
                    )
                } else {
                    AppError::with_source(ErrorKind::Database, "Failed to insert directory", e)
                }
            })?;
        Ok(())
    }

    async fn update_directory(
        &self,
        id: &DirectoryId,
        update: &DirectoryUpdate,
    ) -> AppResult<Option<Directory>> {
        Ok(self.apply_locked(id, update, None).await?.map(|(dir, _)| dir))
    }

    async fn update_directories(
        &self,
        selector: &DirectorySelector,
        update: &DirectoryUpdate,
    ) -> AppResult<u64> {
        let ids = self.resolve(selector).await?;
        let recheck = match selector {
            DirectorySelector::Ids(_) => None,
            other => Some(other),
        };

        let mut changed = 0;
        for id in &ids {
            if let Some((_, true)) = self.apply_locked(id, update, recheck).await? {
                changed += 1;
            }
        }
        debug!(matched = ids.len(), changed, "Applied directory update");
        Ok(changed)
    }

    async fn delete_directory(&self, id: &DirectoryId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM directories WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete directory", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_file(&self, id: &FileId) -> AppResult<Option<File>> {
        let doc = sqlx::query_scalar::<_, Json<File>>("SELECT doc FROM files WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))?;
        Ok(doc.map(|Json(f)| f))
    }

    async fn insert_file(&self, file: &File) -> AppResult<()> {
        sqlx::query("INSERT INTO files (id, user_id, doc) VALUES ($1, $2, $3)")
            .bind(file.id.to_string())
            .bind(&file.user_id)
            .bind(Json(file))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::with_source(
                        ErrorKind::Conflict,
                        format!("file {} already exists", file.id),
                        e,
                    )
                } else {
                    AppError::with_source(ErrorKind::Database, "Failed to insert file", e)
                }
            })?;
        Ok(())
    }

    async fn update_file(&self, id: &FileId, update: &FileUpdate) -> AppResult<Option<File>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let doc = sqlx::query_scalar::<_, Json<File>>("SELECT doc FROM files WHERE id = $1 FOR UPDATE")
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock file", e))?;

        let Some(Json(mut file)) = doc else {
            return Ok(None);
        };

        if update.apply(&mut file) {
            sqlx::query("UPDATE files SET doc = $2 WHERE id = $1")
                .bind(id.to_string())
                .bind(Json(&file))
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update file", e))?;
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
        })?;
        Ok(Some(file))
    }

    async fn delete_file(&self, id: &FileId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete file", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn search(&self, user_id: &str, query: &SearchQuery) -> AppResult<SearchResult> {
        let predicates = query.filter.predicates();
        let mut result = SearchResult::default();

        if let Some(preds) = &predicates.directories {
            let total: i64 = filtered("COUNT(*)", "directories", user_id, preds)
                .build_query_scalar()
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count directories", e)
                })?;

            let mut qb = filtered(
                "doc - 'directories' - 'files'",
                "directories",
                user_id,
                preds,
            );
            push_page(&mut qb, &query.page);
            let docs: Vec<Json<Directory>> = qb
                .build_query_scalar()
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to search directories", e)
                })?;

            result.directories_count = u64::try_from(total).unwrap_or(0);
            result.directories = docs.into_iter().map(|Json(d)| d).collect();
        }

        if let Some(preds) = &predicates.files {
            let total: i64 = filtered("COUNT(*)", "files", user_id, preds)
                .build_query_scalar()
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count files", e))?;

            let mut qb = filtered("doc", "files", user_id, preds);
            push_page(&mut qb, &query.page);
            let docs: Vec<Json<File>> = qb
                .build_query_scalar()
                .fetch_all(&self.pool)
                .await
                .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to search files", e))?;

            result.files_count = u64::try_from(total).unwrap_or(0);
            result.files = docs.into_iter().map(|Json(f)| f).collect();
        }

        Ok(result)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Database ping failed", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use stratum_core::types::{Pagination, SortDirection};
    use stratum_entity::SearchFilter;

    use super::*;

    #[test]
    fn search_sql_binds_every_predicate() {
        let filter = SearchFilter {
            name: Some("report".into()),
            starred: Some(true),
            extensions: vec!["pdf".into()],
            ..Default::default()
        };
        let preds = filter.predicates().files.unwrap_or_default();
        let mut qb = filtered("doc", "files", "u1", &preds);
        push_page(
            &mut qb,
            &ChildPage {
                window: Pagination::new(10, 5),
                sort_by: SortField::Size,
                direction: SortDirection::Desc,
            },
        );
        assert_eq!(
            qb.sql(),
            "SELECT doc FROM files WHERE user_id = $1 AND doc->>'name' = $2 \
             AND (doc->>'starred')::boolean = $3 AND doc->>'extension' = ANY($4) \
             ORDER BY (doc->>'size')::bigint DESC, id DESC LIMIT $5 OFFSET $6"
        );
    }

    #[test]
    fn sort_keys_follow_the_stored_document() {
        assert_eq!(
            sort_expression(SortField::UpdatedAt),
            "(doc->>'updated_at')::timestamptz"
        );
        assert_eq!(sort_expression(SortField::Name), "doc->>'name' COLLATE \"C\"");
    }

    #[test]
    fn extension_filter_never_matches_directories() {
        let preds = vec![Predicate::ExtensionIn(vec!["pdf".into()])];
        let qb = filtered("COUNT(*)", "directories", "u1", &preds);
        assert!(qb.sql().ends_with("AND FALSE"));
    }
}
