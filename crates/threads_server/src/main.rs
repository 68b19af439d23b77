#[macro_use]
extern crate rocket;
use catchers::{bad_request, forbidden, internal_error, not_found, unauthorized, unprocessable};
use lazy_static::lazy_static;
use mongo::ThreadsDB;
use rocket::{Build, Rocket};
use routes::{THREAD_ROUTES, USER_ROUTES};
use std::env;
use std::sync::Arc;
use store::Store;
use tracing_subscriber::EnvFilter;

mod activity;
mod catchers;
mod guards;
#[cfg(test)]
mod memory;
mod mongo;
mod routes;
mod store;
mod threads;
mod users;
mod utils;
mod views;

lazy_static! {
    static ref MONGODB_URI: String =
        env::var("MONGODB_URI").unwrap_or(String::from(env!("MONGODB_URI")));
    static ref DATABASE_NAME: String =
        env::var("DATABASE_NAME").unwrap_or(String::from(env!("DATABASE_NAME")));
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    // Initialize logger
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    // connect to mongodb
    let mongo = ThreadsDB::init(&MONGODB_URI, &DATABASE_NAME).await?;
    build_rocket(Arc::new(mongo)).launch().await?;
    Ok(())
}

pub(crate) fn build_rocket(store: Arc<dyn Store>) -> Rocket<Build> {
    rocket::build()
        .manage(store)
        .mount("/", routes![health])
        .mount("/thread", THREAD_ROUTES.clone())
        .mount("/user", USER_ROUTES.clone())
        .register(
            "/",
            catchers![
                bad_request,
                unauthorized,
                forbidden,
                not_found,
                unprocessable,
                internal_error
            ],
        )
}

#[get("/health")]
async fn health() -> &'static str {
    "Hello, world!"
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::catchers::ErrorBody;
    use crate::memory::MemoryStore;
    use rocket::http::{Header, Status};
    use rocket::local::asynchronous::Client;
    use serde_json::json;
    use threads_common::http::responses::{
        Activity, DeleteSummary, FeedPage, LikeToggle, MutationResponse, ThreadView, UserPage,
        UserView,
    };

    struct ThreadsTestContext {
        client: Client,
    }

    impl ThreadsTestContext {
        async fn init() -> Self {
            let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
            ThreadsTestContext {
                client: Client::tracked(build_rocket(store)).await.unwrap(),
            }
        }

        async fn onboard(&self, external_id: &str, username: &str) -> UserView {
            let res = self
                .client
                .put("/user")
                .header(Header::new("X-User-Id", external_id.to_string()))
                .json(&json!({ "username": username, "name": username, "bio": null, "image": null }))
                .dispatch()
                .await;
            assert_eq!(res.status(), Status::Ok);
            res.into_json::<MutationResponse<UserView>>()
                .await
                .unwrap()
                .data
        }

        async fn post(&self, external_id: &str, uri: &str, text: &str) -> (Status, Option<String>) {
            let res = self
                .client
                .post(uri.to_string())
                .header(Header::new("X-User-Id", external_id.to_string()))
                .json(&json!({ "text": text, "path": "/" }))
                .dispatch()
                .await;
            let status = res.status();
            let id = if status == Status::Created {
                res.into_json::<MutationResponse<String>>()
                    .await
                    .map(|body| body.data)
            } else {
                None
            };
            (status, id)
        }
    }

    #[rocket::async_test]
    async fn test_health() {
        let ThreadsTestContext { client } = ThreadsTestContext::init().await;
        let res = client.get("/health").dispatch().await;
        assert_eq!(res.into_string().await.unwrap(), "Hello, world!");
    }

    #[rocket::async_test]
    async fn test_identity_required() {
        let ThreadsTestContext { client } = ThreadsTestContext::init().await;
        let res = client
            .post("/thread")
            .json(&json!({ "text": "no identity" }))
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::Unauthorized);
        let body = res.into_json::<ErrorBody>().await.unwrap();
        assert_eq!(body.message, "Missing X-User-Id header");
    }

    #[rocket::async_test]
    async fn test_malformed_and_missing_ids() {
        let context = ThreadsTestContext::init().await;
        let res = context.client.get("/thread/not-an-id").dispatch().await;
        assert_eq!(res.status(), Status::BadRequest);

        let res = context
            .client
            .get(format!("/thread/{}", mongodb::bson::oid::ObjectId::new().to_hex()))
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::NotFound);

        let res = context.client.get("/user/ext_nobody").dispatch().await;
        assert_eq!(res.status(), Status::NotFound);

        let feed = context
            .client
            .get(format!("/thread/feed?page={}&size=100", u64::MAX))
            .dispatch()
            .await
            .into_json::<FeedPage>()
            .await
            .unwrap();
        assert!(feed.posts.is_empty());
        assert!(!feed.is_next);

        // posting without a profile
        let (status, _) = context.post("ext_nobody", "/thread", "hello there").await;
        assert_eq!(status, Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_thread_lifecycle() {
        let context = ThreadsTestContext::init().await;
        let alice = context.onboard("ext_a", "Alice").await;
        assert_eq!(alice.username, "alice");
        assert!(alice.onboarded);
        context.onboard("ext_b", "bob").await;

        let (status, _) = context.post("ext_a", "/thread", " hi ").await;
        assert_eq!(status, Status::BadRequest);

        let (status, root) = context.post("ext_a", "/thread", "hello world").await;
        assert_eq!(status, Status::Created);
        let root = root.unwrap();
        let (status, reply) = context
            .post("ext_b", &format!("/thread/{}/reply", root), "hello alice")
            .await;
        assert_eq!(status, Status::Created);
        let reply = reply.unwrap();

        let feed = context
            .client
            .get("/thread/feed?page=1&size=10")
            .dispatch()
            .await
            .into_json::<FeedPage>()
            .await
            .unwrap();
        assert_eq!(feed.posts.len(), 1);
        assert_eq!(feed.posts[0].children[0].id, reply);
        assert!(!feed.is_next);

        let res = context
            .client
            .post(format!("/thread/{}/like", root))
            .header(Header::new("X-User-Id", "ext_b"))
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::Ok);
        let toggle = res
            .into_json::<MutationResponse<LikeToggle>>()
            .await
            .unwrap();
        assert!(toggle.data.liked);
        assert_eq!(toggle.data.like_count, 1);

        let activity = context
            .client
            .get("/thread/activity")
            .header(Header::new("X-User-Id", "ext_a"))
            .dispatch()
            .await
            .into_json::<Activity>()
            .await
            .unwrap();
        assert_eq!(activity.replies.len(), 1);
        assert_eq!(activity.likes.len(), 1);
        assert_eq!(activity.likes[0].user_id, "ext_b");

        let thread = context
            .client
            .get(format!("/thread/{}", root))
            .dispatch()
            .await
            .into_json::<ThreadView>()
            .await
            .unwrap();
        assert_eq!(thread.likes, vec![String::from("ext_b")]);

        let res = context
            .client
            .delete(format!("/thread/{}", root))
            .header(Header::new("X-User-Id", "ext_b"))
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::Forbidden);

        let res = context
            .client
            .delete(format!("/thread/{}?path=/profile", root))
            .header(Header::new("X-User-Id", "ext_a"))
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::Ok);
        let deleted = res
            .into_json::<MutationResponse<DeleteSummary>>()
            .await
            .unwrap();
        assert_eq!(deleted.data.deleted_threads, vec![root.clone(), reply]);
        assert_eq!(deleted.revalidate, Some(String::from("/profile")));

        let res = context
            .client
            .get(format!("/thread/{}", root))
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::NotFound);
        let user = context
            .client
            .get("/user/ext_a")
            .dispatch()
            .await
            .into_json::<UserView>()
            .await
            .unwrap();
        assert!(user.threads.is_empty());
    }

    #[rocket::async_test]
    async fn test_username_conflict_and_search() {
        let context = ThreadsTestContext::init().await;
        context.onboard("ext_a", "alice").await;
        context.onboard("ext_b", "alicia").await;
        context.onboard("ext_c", "bob").await;

        let res = context
            .client
            .put("/user")
            .header(Header::new("X-User-Id", "ext_c"))
            .json(&json!({ "username": "ALICE", "name": "Bob" }))
            .dispatch()
            .await;
        assert_eq!(res.status(), Status::Conflict);

        let page = context
            .client
            .get("/user/search?q=ALI&sort=asc")
            .header(Header::new("X-User-Id", "ext_a"))
            .dispatch()
            .await
            .into_json::<UserPage>()
            .await
            .unwrap();
        assert_eq!(page.users.len(), 1);
        assert_eq!(page.users[0].username, "alicia");
        assert!(!page.is_next);
    }
}
