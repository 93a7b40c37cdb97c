use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::forum::forum_handlers::{
    add_comment, create_post, get_post, list_posts, popular_posts, posts_by_tag, recent_posts,
    toggle_like,
};
use crate::handlers::friends::friend_handlers::{
    accept_request, get_friends, get_pending, get_pending_count, get_standing, reject_request,
    send_request, unfriend,
};
use crate::handlers::messages::message_handlers::{get_conversation, send_message};
use crate::handlers::users::user_handlers::{get_user_by_id, search_user};
use crate::AppState;

pub fn app_routes(state: AppState) -> Router {
    Router::new()
        .nest("/friend", friend_routes(state.clone()))
        .nest("/user", user_routes(state.clone()))
        .nest("/forum", forum_routes(state.clone()))
        .nest("/message", message_routes(state))
}

fn friend_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_friends))
        .route("/pending", get(get_pending))
        .route("/pending/count", get(get_pending_count))
        .route("/standing/:id", get(get_standing))
        // the same segment is the target user on POST and the request id below
        .route("/request/:id", post(send_request))
        .route("/request/:id/accept", put(accept_request))
        .route("/request/:id/reject", put(reject_request))
        .route("/:id", delete(unfriend))
        .with_state(state)
}

fn user_routes(state: AppState) -> Router {
    Router::new()
        .route("/search", get(search_user))
        .route("/:id", get(get_user_by_id))
        .with_state(state)
}

fn forum_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/recent", get(recent_posts))
        .route("/popular", get(popular_posts))
        .route("/tag/:name", get(posts_by_tag))
        .route("/:id", get(get_post))
        .route("/:id/like", post(toggle_like))
        .route("/:id/comment", post(add_comment))
        .with_state(state)
}

fn message_routes(state: AppState) -> Router {
    Router::new()
        .route("/:id", get(get_conversation).post(send_message))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use abi::types::{Post, User};
    use db::DbRepo;
    use friendship::{FriendshipCoordinator, Messenger};

    use super::*;
    use crate::api_utils::custom_extract::Claims;

    const SECRET: &str = "test-secret";

    async fn app() -> Router {
        let db = DbRepo::memory();
        for (id, program, term) in [
            ("alice", "Systems", 3),
            ("bob", "Systems", 5),
            ("carol", "Law", 3),
        ] {
            db.user
                .create_user(User {
                    id: id.to_string(),
                    first_name: id.to_string(),
                    last_name: "Doe".to_string(),
                    email: format!("{id}@campus.edu"),
                    program: program.to_string(),
                    term,
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        db.forum
            .create_post(Post {
                id: "p1".to_string(),
                title: "exam week".to_string(),
                creator_id: "alice".to_string(),
                tags: vec!["Exams".to_string()],
                ..Default::default()
            })
            .await
            .unwrap();

        let coordinator = FriendshipCoordinator::new(db.relationship.clone(), db.user.clone());
        let state = AppState {
            search: db::UserSearchService::new(db.user_search.clone()),
            messenger: Messenger::new(db.relationship.clone(), db.user.clone(), db.message.clone()),
            db,
            coordinator: Arc::new(coordinator),
            jwt_secret: SECRET.to_string(),
        };
        app_routes(state)
    }

    fn token(user_id: &str) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: now + 60 * 60,
            iat: now,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    async fn call(app: &Router, method: &str, uri: &str, user_id: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", format!("Bearer {}", token(user_id)))
            .body(Body::empty())
            .unwrap();
        send(app, request).await
    }

    async fn call_json(
        app: &Router,
        method: &str,
        uri: &str,
        user_id: &str,
        body: Value,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", format!("Bearer {}", token(user_id)))
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, request).await
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn missing_or_bad_token_is_unauthorized() {
        let app = app().await;
        let request = Request::builder()
            .uri("/friend")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let request = Request::builder()
            .uri("/friend")
            .header("Authorization", "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn friend_request_lifecycle() {
        let app = app().await;

        let (status, body) = call(&app, "POST", "/friend/request/bob", "alice").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "pending");
        let id = body["id"].as_str().unwrap().to_string();

        let (status, body) = call(&app, "POST", "/friend/request/alice", "bob").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["kind"], "DuplicateRelationship");

        let (status, _) = call(&app, "POST", "/friend/request/alice", "alice").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = call(&app, "POST", "/friend/request/nobody", "alice").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = call(&app, "GET", "/friend/pending/count", "bob").await;
        assert_eq!(body["count"], 1);
        let (_, body) = call(&app, "GET", "/friend/standing/alice", "bob").await;
        assert_eq!(body["request_received"]["id"], id.as_str());
        let (status, _) = call(&app, "GET", "/friend/standing/nobody", "bob").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // only the recipient may answer
        let uri = format!("/friend/request/{id}/accept");
        let (status, _) = call(&app, "PUT", &uri, "alice").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, body) = call(&app, "PUT", &uri, "bob").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "accepted");

        // no longer pending
        let uri = format!("/friend/request/{id}/reject");
        let (status, _) = call(&app, "PUT", &uri, "bob").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = call(&app, "GET", "/friend", "alice").await;
        assert_eq!(body[0]["id"], "bob");

        let (status, _) = call(&app, "DELETE", "/friend/alice", "bob").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&app, "DELETE", "/friend/alice", "bob").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reject_marks_request_rejected() {
        let app = app().await;
        let (_, body) = call(&app, "POST", "/friend/request/carol", "alice").await;
        let uri = format!("/friend/request/{}/reject", body["id"].as_str().unwrap());
        let (status, body) = call(&app, "PUT", &uri, "carol").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "rejected");

        let (_, body) = call(&app, "GET", "/friend/pending", "carol").await;
        assert_eq!(body.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn user_search_and_profile() {
        let app = app().await;
        let (_, body) = call(&app, "GET", "/user/search", "alice").await;
        assert_eq!(body.as_array().unwrap().len(), 3);

        let (_, body) = call(&app, "GET", "/user/search?program=Systems&term=3", "alice").await;
        let users = body.as_array().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0]["id"], "alice");

        let (status, body) = call(&app, "GET", "/user/search?term=", "alice").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);
        let (_, body) = call(&app, "GET", "/user/search?program=Law&term=", "alice").await;
        assert_eq!(body[0]["id"], "carol");

        let (status, _) = call(&app, "GET", "/user/search?term=third", "alice").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(&app, "GET", "/user/carol", "alice").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["program"], "Law");
        let (status, _) = call(&app, "GET", "/user/nobody", "alice").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn forum_routes_work() {
        let app = app().await;
        let (_, body) = call(&app, "GET", "/forum/tag/exams", "bob").await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        let (_, body) = call(&app, "GET", "/forum/recent", "bob").await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        let (_, body) = call(&app, "GET", "/forum/popular?min_likes=1", "bob").await;
        assert_eq!(body.as_array().unwrap().len(), 0);

        let (_, body) = call(&app, "POST", "/forum/p1/like", "bob").await;
        assert_eq!(body["liked"], true);
        let (_, body) = call(&app, "GET", "/forum/popular?min_likes=1", "bob").await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, _) = call(&app, "POST", "/forum/missing/like", "bob").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        for days in ["100000000", "-1", "9223372036854775807"] {
            let (status, body) = call(&app, "GET", &format!("/forum/recent?days={days}"), "bob").await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "days={days}");
            assert_eq!(body["kind"], "BadRequest");
        }
        let (status, body) = call(&app, "GET", "/forum/recent?days=", "bob").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn forum_posts_and_comments() {
        let app = app().await;
        let (status, post) = call_json(
            &app,
            "POST",
            "/forum",
            "bob",
            json!({"title": "Lost keys", "body": "near the library", "tags": ["Campus", " "]}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(post["creator_id"], "bob");
        assert_eq!(post["tags"], json!(["Campus"]));
        let post_id = post["id"].as_str().unwrap().to_string();

        let (status, _) = call_json(&app, "POST", "/forum", "bob", json!({"title": "  "})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, body) = call_json(&app, "POST", "/forum", "bob", json!({"body": "x"})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "BodyParsing");

        // title, author name, tags
        let (_, body) = call(&app, "GET", "/forum?q=keys", "alice").await;
        assert_eq!(body[0]["id"], post_id.as_str());
        let (_, body) = call(&app, "GET", "/forum?q=alice", "carol").await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["id"], "p1");
        let (_, body) = call(&app, "GET", "/forum?tag=exams,campus", "carol").await;
        assert_eq!(body.as_array().unwrap().len(), 2);
        let (_, body) = call(&app, "GET", "/forum?q=keys&tag=exams", "carol").await;
        assert_eq!(body.as_array().unwrap().len(), 0);
        let (_, body) = call(&app, "GET", "/forum", "carol").await;
        assert_eq!(body.as_array().unwrap().len(), 2);

        let uri = format!("/forum/{post_id}/comment");
        let (status, top) = call_json(&app, "POST", &uri, "carol", json!({"body": "which one?"})).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call_json(
            &app,
            "POST",
            &uri,
            "bob",
            json!({"body": "the main one", "parent": top["id"]}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // a reply has to point at a comment of the same post
        let (status, _) = call_json(
            &app,
            "POST",
            "/forum/p1/comment",
            "bob",
            json!({"body": "wrong thread", "parent": top["id"]}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) =
            call_json(&app, "POST", "/forum/missing/comment", "bob", json!({"body": "hi"})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call_json(&app, "POST", &uri, "bob", json!({"body": ""})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, detail) = call(&app, "GET", &format!("/forum/{post_id}"), "alice").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["post"]["title"], "Lost keys");
        let threads = detail["comments"].as_array().unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0]["comment"]["author_id"], "carol");
        assert_eq!(threads[0]["replies"][0]["comment"]["body"], "the main one");

        let (status, _) = call(&app, "GET", "/forum/missing", "alice").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn messages_need_an_accepted_friendship() {
        let app = app().await;
        let (status, body) =
            call_json(&app, "POST", "/message/bob", "alice", json!({"content": "hi"})).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["kind"], "Forbidden");
        let (status, _) =
            call_json(&app, "POST", "/message/nobody", "alice", json!({"content": "hi"})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, request) = call(&app, "POST", "/friend/request/bob", "alice").await;
        // pending is not enough
        let (status, _) = call(&app, "GET", "/message/bob", "alice").await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let uri = format!("/friend/request/{}/accept", request["id"].as_str().unwrap());
        call(&app, "PUT", &uri, "bob").await;

        let (status, message) =
            call_json(&app, "POST", "/message/bob", "alice", json!({"content": "hi bob"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(message["recipient"], "bob");
        call_json(&app, "POST", "/message/alice", "bob", json!({"content": "hey"})).await;
        let (status, _) =
            call_json(&app, "POST", "/message/alice", "bob", json!({"content": " "})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(&app, "GET", "/message/alice", "bob").await;
        assert_eq!(status, StatusCode::OK);
        let contents: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["content"].as_str().unwrap())
            .collect();
        assert_eq!(contents, vec!["hi bob", "hey"]);

        // unfriending closes the conversation again
        call(&app, "DELETE", "/friend/bob", "alice").await;
        let (status, _) = call(&app, "GET", "/message/alice", "bob").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
