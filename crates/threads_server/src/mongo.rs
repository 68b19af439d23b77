use crate::store::{LikeRepository, StoreResult, ThreadRepository, UserRepository, UserSearch};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::error::{CommandError, ErrorKind, WriteError, WriteFailure};
use mongodb::options::{
    ClientOptions, FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument, ServerApi,
    ServerApiVersion,
};
use mongodb::{Client, Collection, IndexModel};
use threads_common::errors::ThreadsServerError;
use threads_common::models::{user::UserProfile, Community, Like, Thread, User};
use tracing::{debug, info};

const DUPLICATE_KEY: i32 = 11000;

pub struct ThreadsDB {
    users: Collection<User>,
    threads: Collection<Thread>,
    likes: Collection<Like>,
    communities: Collection<Community>,
}

fn mongo_error(e: mongodb::error::Error) -> ThreadsServerError {
    ThreadsServerError::MongoError(e.to_string())
}

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    matches!(
        e.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(WriteError {
            code: DUPLICATE_KEY,
            ..
        })) | ErrorKind::Command(CommandError {
            code: DUPLICATE_KEY,
            ..
        })
    )
}

async fn connect(uri: &str) -> StoreResult<Client> {
    let mut client_options = ClientOptions::parse(uri).await.map_err(mongo_error)?;
    let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
    client_options.server_api = Some(server_api);
    Client::with_options(client_options).map_err(mongo_error)
}

impl ThreadsDB {
    /**
     * Connect once at startup and make sure the unique indexes exist
     *
     * @param uri - the mongodb connection string
     * @param database_name - the database holding the collections
     */
    pub async fn init(uri: &str, database_name: &str) -> StoreResult<Self> {
        let client = connect(uri).await?;
        let db = client.database(database_name);
        let threads_db = Self {
            users: db.collection("users"),
            threads: db.collection("threads"),
            likes: db.collection("likes"),
            communities: db.collection("communities"),
        };
        threads_db.ensure_indexes().await?;
        info!("Connected to database {}", database_name);
        Ok(threads_db)
    }

    async fn ensure_indexes(&self) -> StoreResult<()> {
        let unique = || IndexOptions::builder().unique(true).build();
        self.users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "external_id": 1 })
                    .options(unique())
                    .build(),
                None,
            )
            .await
            .map_err(mongo_error)?;
        self.users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "username": 1 })
                    .options(unique())
                    .build(),
                None,
            )
            .await
            .map_err(mongo_error)?;
        self.communities
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "username": 1 })
                    .options(unique())
                    .build(),
                None,
            )
            .await
            .map_err(mongo_error)?;
        self.threads
            .create_index(
                IndexModel::builder().keys(doc! { "parent_id": 1 }).build(),
                None,
            )
            .await
            .map_err(mongo_error)?;
        self.threads
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "author": 1, "parent_id": 1 })
                    .build(),
                None,
            )
            .await
            .map_err(mongo_error)?;
        self.likes
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "thread": 1, "user": 1 })
                    .options(unique())
                    .build(),
                None,
            )
            .await
            .map_err(mongo_error)?;
        self.likes
            .create_index(IndexModel::builder().keys(doc! { "user": 1 }).build(), None)
            .await
            .map_err(mongo_error)?;
        Ok(())
    }

    async fn find_threads(
        &self,
        filter: Document,
        options: Option<FindOptions>,
    ) -> StoreResult<Vec<Thread>> {
        let cursor = self
            .threads
            .find(filter, options)
            .await
            .map_err(mongo_error)?;
        cursor.try_collect().await.map_err(mongo_error)
    }
}

/// USER FUNCTIONS ///

#[rocket::async_trait]
impl UserRepository for ThreadsDB {
    async fn upsert_user(&self, profile: &UserProfile) -> StoreResult<User> {
        let now = DateTime::now();
        let filter = doc! { "external_id": profile.external_id.as_str() };
        let update = doc! {
            "$set": {
                "username": profile.username.as_str(),
                "name": profile.name.as_str(),
                "bio": profile.bio.clone(),
                "image": profile.image.clone(),
                "onboarded": true,
                "updated_at": now,
            },
            "$setOnInsert": {
                "threads": [],
                "communities": [],
                "created_at": now,
            }
        };
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        match self.users.find_one_and_update(filter, update, options).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(ThreadsServerError::UserNotFound(profile.external_id.clone())),
            Err(e) if is_duplicate_key(&e) => {
                Err(ThreadsServerError::UsernameTaken(profile.username.clone()))
            }
            Err(e) => Err(mongo_error(e)),
        }
    }

    async fn find_user(&self, id: &ObjectId) -> StoreResult<Option<User>> {
        self.users
            .find_one(doc! { "_id": *id }, None)
            .await
            .map_err(mongo_error)
    }

    async fn find_user_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>> {
        self.users
            .find_one(doc! { "external_id": external_id }, None)
            .await
            .map_err(mongo_error)
    }

    async fn find_users_by_ids(&self, ids: &[ObjectId]) -> StoreResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let filter = doc! { "_id": { "$in": ids.to_vec() } };
        let cursor = self.users.find(filter, None).await.map_err(mongo_error)?;
        cursor.try_collect().await.map_err(mongo_error)
    }

    async fn push_user_thread(&self, user: &ObjectId, thread: &ObjectId) -> StoreResult<()> {
        let query = doc! { "_id": *user };
        let update = doc! { "$push": { "threads": *thread } };
        self.users
            .update_one(query, update, None)
            .await
            .map_err(mongo_error)?;
        Ok(())
    }

    async fn pull_user_threads(
        &self,
        users: &[ObjectId],
        threads: &[ObjectId],
    ) -> StoreResult<u64> {
        if users.is_empty() || threads.is_empty() {
            return Ok(0);
        }
        let query = doc! { "_id": { "$in": users.to_vec() } };
        let update = doc! { "$pull": { "threads": { "$in": threads.to_vec() } } };
        let res = self
            .users
            .update_many(query, update, None)
            .await
            .map_err(mongo_error)?;
        Ok(res.modified_count)
    }

    async fn search_users(&self, search: &UserSearch) -> StoreResult<(Vec<User>, u64)> {
        let mut filter = doc! { "external_id": { "$ne": search.exclude_external_id.as_str() } };
        if !search.search.trim().is_empty() {
            let pattern = regex::escape(&search.search);
            filter.insert(
                "$or",
                vec![
                    doc! { "username": { "$regex": pattern.as_str(), "$options": "i" } },
                    doc! { "name": { "$regex": pattern.as_str(), "$options": "i" } },
                ],
            );
        }
        let direction = search.sort.direction();
        let options = FindOptions::builder()
            .sort(doc! { "created_at": direction, "_id": direction })
            .skip(search.skip)
            .limit(search.limit as i64)
            .build();
        let total = self
            .users
            .count_documents(filter.clone(), None)
            .await
            .map_err(mongo_error)?;
        let cursor = self
            .users
            .find(filter, options)
            .await
            .map_err(mongo_error)?;
        let users: Vec<User> = cursor.try_collect().await.map_err(mongo_error)?;
        debug!("User search matched {} of {}", users.len(), total);
        Ok((users, total))
    }
}

/// THREAD FUNCTIONS ///

#[rocket::async_trait]
impl ThreadRepository for ThreadsDB {
    async fn insert_thread(&self, thread: &Thread) -> StoreResult<ObjectId> {
        let res = self
            .threads
            .insert_one(thread, None)
            .await
            .map_err(mongo_error)?;
        res.inserted_id.as_object_id().ok_or_else(|| {
            ThreadsServerError::MongoError(String::from("Inserted thread has no object id"))
        })
    }

    async fn find_thread(&self, id: &ObjectId) -> StoreResult<Option<Thread>> {
        self.threads
            .find_one(doc! { "_id": *id }, None)
            .await
            .map_err(mongo_error)
    }

    async fn find_threads_by_ids(&self, ids: &[ObjectId]) -> StoreResult<Vec<Thread>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        self.find_threads(doc! { "_id": { "$in": ids.to_vec() } }, None)
            .await
    }

    async fn find_child_threads(&self, parent: &ObjectId) -> StoreResult<Vec<Thread>> {
        self.find_threads(doc! { "parent_id": *parent }, None).await
    }

    async fn find_threads_by_author(&self, author: &ObjectId) -> StoreResult<Vec<Thread>> {
        self.find_threads(doc! { "author": *author }, None).await
    }

    async fn find_replies_by_author(&self, author: &ObjectId) -> StoreResult<Vec<Thread>> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1, "_id": -1 })
            .build();
        self.find_threads(
            doc! { "author": *author, "parent_id": { "$ne": null } },
            Some(options),
        )
        .await
    }

    async fn find_root_threads(&self, skip: u64, limit: u64) -> StoreResult<Vec<Thread>> {
        // `null` also matches documents without the field
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1, "_id": -1 })
            .skip(skip)
            .limit(limit as i64)
            .build();
        self.find_threads(doc! { "parent_id": null }, Some(options))
            .await
    }

    async fn count_root_threads(&self) -> StoreResult<u64> {
        self.threads
            .count_documents(doc! { "parent_id": null }, None)
            .await
            .map_err(mongo_error)
    }

    async fn push_thread_child(&self, parent: &ObjectId, child: &ObjectId) -> StoreResult<()> {
        let query = doc! { "_id": *parent };
        let update = doc! { "$push": { "children": *child } };
        self.threads
            .update_one(query, update, None)
            .await
            .map_err(mongo_error)?;
        Ok(())
    }

    async fn pull_thread_child(&self, parent: &ObjectId, child: &ObjectId) -> StoreResult<()> {
        let query = doc! { "_id": *parent };
        let update = doc! { "$pull": { "children": *child } };
        self.threads
            .update_one(query, update, None)
            .await
            .map_err(mongo_error)?;
        Ok(())
    }

    async fn delete_threads(&self, ids: &[ObjectId]) -> StoreResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let res = self
            .threads
            .delete_many(doc! { "_id": { "$in": ids.to_vec() } }, None)
            .await
            .map_err(mongo_error)?;
        Ok(res.deleted_count)
    }
}

/// LIKE FUNCTIONS ///

#[rocket::async_trait]
impl LikeRepository for ThreadsDB {
    async fn insert_like(&self, like: &Like) -> StoreResult<bool> {
        match self.likes.insert_one(like, None).await {
            Ok(_) => Ok(true),
            // a concurrent toggle got there first
            Err(e) if is_duplicate_key(&e) => Ok(false),
            Err(e) => Err(mongo_error(e)),
        }
    }

    async fn delete_like(&self, thread: &ObjectId, user: &ObjectId) -> StoreResult<bool> {
        let res = self
            .likes
            .delete_one(doc! { "thread": *thread, "user": *user }, None)
            .await
            .map_err(mongo_error)?;
        Ok(res.deleted_count > 0)
    }

    async fn count_likes(&self, thread: &ObjectId) -> StoreResult<u64> {
        self.likes
            .count_documents(doc! { "thread": *thread }, None)
            .await
            .map_err(mongo_error)
    }

    async fn find_likes_for_threads(&self, threads: &[ObjectId]) -> StoreResult<Vec<Like>> {
        if threads.is_empty() {
            return Ok(vec![]);
        }
        let options = FindOptions::builder()
            .sort(doc! { "created_at": 1, "_id": 1 })
            .build();
        let cursor = self
            .likes
            .find(doc! { "thread": { "$in": threads.to_vec() } }, options)
            .await
            .map_err(mongo_error)?;
        cursor.try_collect().await.map_err(mongo_error)
    }

    async fn find_likes_by_user(&self, user: &ObjectId) -> StoreResult<Vec<Like>> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": 1, "_id": 1 })
            .build();
        let cursor = self
            .likes
            .find(doc! { "user": *user }, options)
            .await
            .map_err(mongo_error)?;
        cursor.try_collect().await.map_err(mongo_error)
    }

    async fn delete_likes_for_threads(&self, threads: &[ObjectId]) -> StoreResult<u64> {
        if threads.is_empty() {
            return Ok(0);
        }
        let res = self
            .likes
            .delete_many(doc! { "thread": { "$in": threads.to_vec() } }, None)
            .await
            .map_err(mongo_error)?;
        Ok(res.deleted_count)
    }
}
