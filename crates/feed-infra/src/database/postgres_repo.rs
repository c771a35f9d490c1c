//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionError, TransactionTrait,
};
use uuid::Uuid;

use feed_core::domain::{Post, PostWithCreator, User};
use feed_core::error::RepoError;
use feed_core::ports::{PostRepository, UserRepository};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, query_error, write_error};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// Mask the local part of an email so it can be logged.
fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if local.chars().count() > 1 => {
            let first: String = local.chars().take(1).collect();
            format!("{}***@{}", first, domain)
        }
        Some((_, domain)) => format!("***@{}", domain),
        None => "***".to_string(),
    }
}

fn with_creator((post, creator): (post::Model, Option<user::Model>)) -> PostWithCreator {
    PostWithCreator {
        post: post.into(),
        creator: creator.map(Into::into),
    }
}

fn transaction_error(e: TransactionError<DbErr>) -> RepoError {
    match e {
        TransactionError::Connection(e) => query_error(e),
        TransactionError::Transaction(e) => write_error(e),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn count(&self) -> Result<u64, RepoError> {
        PostEntity::find().count(&self.db).await.map_err(query_error)
    }

    async fn find_page(&self, offset: u64, limit: u64) -> Result<Vec<PostWithCreator>, RepoError> {
        let rows = PostEntity::find()
            .find_also_related(UserEntity)
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(rows.into_iter().map(with_creator).collect())
    }

    async fn find_with_creator(&self, id: Uuid) -> Result<Option<PostWithCreator>, RepoError> {
        let row = PostEntity::find_by_id(id)
            .find_also_related(UserEntity)
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(row.map(with_creator))
    }

    async fn create_for_creator(&self, post: Post) -> Result<User, RepoError> {
        let post_id = post.id;
        let creator_id = post.creator;
        let post: post::ActiveModel = post.into();

        let creator = self
            .db
            .transaction::<_, user::Model, DbErr>(|txn| {
                Box::pin(async move {
                    let creator = UserEntity::find_by_id(creator_id)
                        .lock_exclusive()
                        .one(txn)
                        .await?
                        .ok_or_else(|| DbErr::RecordNotFound(format!("user {}", creator_id)))?;

                    post.insert(txn).await?;

                    let mut creator: User = creator.into();
                    creator.attach_post(post_id);
                    user::ActiveModel::from(creator).update(txn).await
                })
            })
            .await
            .map_err(transaction_error)?;

        Ok(creator.into())
    }

    async fn delete_for_creator(&self, post_id: Uuid, creator_id: Uuid) -> Result<(), RepoError> {
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                Box::pin(async move {
                    let creator = UserEntity::find_by_id(creator_id)
                        .lock_exclusive()
                        .one(txn)
                        .await?;

                    let deleted = PostEntity::delete_by_id(post_id).exec(txn).await?;
                    if deleted.rows_affected == 0 {
                        return Err(DbErr::RecordNotFound(format!("post {}", post_id)));
                    }

                    if let Some(creator) = creator {
                        let mut creator: User = creator.into();
                        if creator.detach_post(post_id) {
                            user::ActiveModel::from(creator).update(txn).await?;
                        } else {
                            tracing::warn!(post_id = %post_id, creator = %creator_id, "Creator did not reference deleted post");
                        }
                    }

                    Ok(())
                })
            })
            .await
            .map_err(transaction_error)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let model = post::ActiveModel::from(post)
            .update(&self.db)
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => RepoError::NotFound,
                other => write_error(other),
            })?;

        Ok(model.into())
    }
}
