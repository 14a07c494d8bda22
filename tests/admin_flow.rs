mod common;

use axum::http::StatusCode;
use common::TestSite;
use serde_json::json;

#[tokio::test]
async fn admin_routes_reject_anonymous_and_regular_users() {
    let site = TestSite::new();

    let (status, _) = site.json("GET", "/api/admin/projects", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, token) = site.sign_in("reader@example.com").await;
    let (status, body) = site
        .json("GET", "/api/admin/projects", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Admin access required");

    let (status, session) = site
        .json("GET", "/api/auth/session", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["user"]["isAdmin"], false);
}

#[tokio::test]
async fn legacy_metadata_flag_grants_admin_until_profile_says_otherwise() {
    let site = TestSite::new();
    let (id, token) = site.sign_in("legacy@example.com").await;

    site.users
        .set_metadata(id, json!({ "is_admin": true }))
        .await;
    let (status, _) = site
        .json("GET", "/api/admin/dashboard", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    site.users.set_profile_admin(id, Some(false)).await;
    let (status, _) = site
        .json("GET", "/api/admin/dashboard", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn project_crud_with_confirmed_delete() {
    let site = TestSite::new();
    let token = site.admin_token().await;

    let (status, created) = site
        .json(
            "POST",
            "/api/admin/projects",
            Some(&token),
            Some(json!({
                "titleEn": "Portfolio Site",
                "descriptionEn": "Bilingual portfolio backend",
                "technologies": ["Rust", " Rust ", "axum"],
                "githubUrl": "https://github.com/example/portfolio",
                "featured": true
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["technologies"], json!(["Rust", "axum"]));
    let id = created["id"].as_str().unwrap().to_string();

    let (status, updated) = site
        .json(
            "POST",
            "/api/admin/projects",
            Some(&token),
            Some(json!({
                "id": id,
                "titleEn": "Portfolio Site v2",
                "descriptionEn": "Now with feeds"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["titleEn"], "Portfolio Site v2");

    let (status, body) = site
        .json(
            "DELETE",
            &format!("/api/admin/projects/{}", id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Deletion must be confirmed with ?confirm=true");

    let (status, _) = site
        .json(
            "DELETE",
            &format!("/api/admin/projects/{}?confirm=true", id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = site
        .json("GET", &format!("/api/projects/{}", id), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blog_post_is_only_public_once_published() {
    let site = TestSite::new();
    let token = site.admin_token().await;

    let (status, draft) = site
        .json(
            "POST",
            "/api/admin/blog",
            Some(&token),
            Some(json!({
                "titleEn": "Hello Rust",
                "contentEn": "## Intro\n\nSome words here.",
                "tags": ["rust"]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(draft["slug"], "hello-rust");
    assert!(draft["publishedAt"].is_null());
    let id = draft["id"].as_str().unwrap().to_string();

    let (status, _) = site.json("GET", "/api/blog/hello-rust", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, published) = site
        .json(
            "PATCH",
            &format!("/api/admin/blog/{}/publish", id),
            Some(&token),
            Some(json!({ "published": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let first_stamp = published["publishedAt"].clone();
    assert!(first_stamp.is_string());

    // Re-publishing keeps the original date.
    let (_, again) = site
        .json(
            "PATCH",
            &format!("/api/admin/blog/{}/publish", id),
            Some(&token),
            Some(json!({ "published": true })),
        )
        .await;
    assert_eq!(again["publishedAt"], first_stamp);

    let (status, post) = site.json("GET", "/api/blog/hello-rust", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(post["tableOfContents"][0]["slug"], "intro");
    assert_eq!(post["readingTimeMinutes"], 1);

    let (_, unpublished) = site
        .json(
            "PATCH",
            &format!("/api/admin/blog/{}/publish", id),
            Some(&token),
            Some(json!({ "published": false })),
        )
        .await;
    assert!(unpublished["publishedAt"].is_null());
    let (status, _) = site.json("GET", "/api/blog/hello-rust", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_admin_bodies_get_json_errors() {
    let site = TestSite::new();
    let token = site.admin_token().await;

    let (status, body) = site
        .json(
            "POST",
            "/api/admin/blog",
            Some(&token),
            Some(json!({ "titleEn": 42 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid input" }));

    let (status, body) = site
        .json(
            "PUT",
            "/api/admin/settings",
            Some(&token),
            Some(json!(["not", "a", "map"])),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid input");
}

#[tokio::test]
async fn duplicate_slug_conflicts() {
    let site = TestSite::new();
    let token = site.admin_token().await;
    let body = json!({ "slug": "same", "titleEn": "One", "contentEn": "x" });

    let (status, _) = site
        .json("POST", "/api/admin/blog", Some(&token), Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = site
        .json("POST", "/api/admin/blog", Some(&token), Some(body))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn settings_feed_the_public_site_content() {
    let site = TestSite::new();
    let token = site.admin_token().await;

    let (status, _) = site
        .json(
            "PUT",
            "/api/admin/settings",
            Some(&token),
            Some(json!({
                "hero_name_en": " Fahami ",
                "github_url": "https://github.com/example",
                "resume_url": "https://drive.example.com/cv.pdf"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = site
        .json(
            "PUT",
            "/api/admin/settings",
            Some(&token),
            Some(json!({ "Bad Key": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid setting key: Bad Key");

    let (status, content) = site.json("GET", "/api/site", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content["hero"]["nameEn"], "Fahami");
    assert_eq!(content["social"]["githubUrl"], "https://github.com/example");
    assert_eq!(
        content["resumeDownloadHref"],
        "https://drive.example.com/cv.pdf"
    );
    assert!(content["profileImageUrl"].is_null());
}

#[tokio::test]
async fn skills_are_grouped_by_category_on_the_public_endpoint() {
    let site = TestSite::new();
    let token = site.admin_token().await;

    for (category, name, order) in [("Backend", "Rust", 1), ("Frontend", "React", 2), ("Backend", "SQL", 3)] {
        let (status, _) = site
            .json(
                "POST",
                "/api/admin/skills",
                Some(&token),
                Some(json!({ "category": category, "name": name, "level": 80, "displayOrder": order })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = site
        .json(
            "POST",
            "/api/admin/skills",
            Some(&token),
            Some(json!({ "category": "Backend", "name": "Go", "level": 120 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, groups) = site.json("GET", "/api/skills", None, None).await;
    let groups = groups.as_array().unwrap();
    assert_eq!(groups.len(), 2);
    let backend = groups.iter().find(|g| g["category"] == "Backend").unwrap();
    assert_eq!(backend["skills"].as_array().unwrap().len(), 2);
}
