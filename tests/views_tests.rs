mod common;

use common::{get, login_as, post, send_as};
use recipe_planner::flash::{FLASH_COOKIE, Flash};
use recipe_planner::models::{DEFAULT_FIELD_VALUE, Recipe, RecipeFields};

fn fields(day: &str, name: &str, description: &str) -> RecipeFields {
    RecipeFields {
        day: day.to_string(),
        name: name.to_string(),
        description: description.to_string(),
    }
}

#[tokio::test]
async fn test_pages_require_login() {
    let (router, state) = common::test_app().await;
    let recipe = Recipe::create(&state.db, None, &fields("Monday", "Pasta", "x"))
        .await
        .unwrap();

    let update = format!("/update-recipe/{}/", recipe.id);
    let delete = format!("/delete-recipe/{}/", recipe.id);
    for path in ["/", "/pdf/", update.as_str(), delete.as_str()] {
        let resp = router.dispatch(get(path), state.clone()).await;
        assert_eq!(resp.status_code, 302, "{path}");
        assert_eq!(resp.location(), Some("/login/"), "{path}");
    }

    let resp = router
        .dispatch(post("/", &[("day", "Friday")]), state.clone())
        .await;
    assert_eq!(resp.location(), Some("/login/"));
    assert_eq!(Recipe::all(&state.db).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_recipe_records_owner() {
    let (router, state) = common::test_app().await;
    let token = login_as(&router, &state, "alice", "pw").await;

    let form = [("day", "Monday"), ("name", "Pasta"), ("description", "With basil")];
    let resp = send_as(&router, &state, &token, post("/", &form)).await;
    assert_eq!(resp.status_code, 302);
    assert_eq!(resp.location(), Some("/"));

    let all = Recipe::all(&state.db).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].day, "Monday");
    assert_eq!(all[0].name, "Pasta");
    assert_eq!(all[0].description, "With basil");
    assert_eq!(all[0].owner.as_deref(), Some("alice"));

    let resp = send_as(&router, &state, &token, get("/")).await;
    assert_eq!(resp.status_code, 200);
    assert!(resp.body.contains("<td>Pasta</td>"));
    assert!(resp.body.contains("<td>alice</td>"));
    assert!(resp.body.contains(&format!("/update-recipe/{}/", all[0].id)));
    assert!(resp.body.contains("Signed in as <strong>alice</strong>"));
}

#[tokio::test]
async fn test_blank_fields_become_placeholder() {
    let (router, state) = common::test_app().await;
    let token = login_as(&router, &state, "alice", "pw").await;

    let form = [("day", "  "), ("name", "Soup")];
    let resp = send_as(&router, &state, &token, post("/", &form)).await;
    assert_eq!(resp.location(), Some("/"));

    let all = Recipe::all(&state.db).await.unwrap();
    assert_eq!(all[0].day, DEFAULT_FIELD_VALUE);
    assert_eq!(all[0].name, "Soup");
    assert_eq!(all[0].description, DEFAULT_FIELD_VALUE);
}

#[tokio::test]
async fn test_over_long_field_is_rejected_with_flash() {
    let (router, state) = common::test_app().await;
    let token = login_as(&router, &state, "alice", "pw").await;

    let long = "a".repeat(101);
    let form = [("day", "Monday"), ("name", long.as_str())];
    let resp = send_as(&router, &state, &token, post("/", &form)).await;
    assert_eq!(resp.location(), Some("/"));
    let flash = resp.cookie_value(FLASH_COOKIE).and_then(Flash::decode);
    assert_eq!(
        flash,
        Some(Flash::error("Name must be at most 100 characters"))
    );
    assert!(Recipe::all(&state.db).await.unwrap().is_empty());

    let exact = "b".repeat(100);
    let form = [("day", "Monday"), ("name", exact.as_str())];
    send_as(&router, &state, &token, post("/", &form)).await;
    assert_eq!(Recipe::all(&state.db).await.unwrap()[0].name, exact);
}

#[tokio::test]
async fn test_search_filters_listing() {
    let (router, state) = common::test_app().await;
    let token = login_as(&router, &state, "alice", "pw").await;
    for (day, name) in [("Monday", "Pasta"), ("Tuesday", "Tacos")] {
        Recipe::create(&state.db, None, &fields(day, name, "x"))
            .await
            .unwrap();
    }

    let resp = send_as(&router, &state, &token, get("/?search=mon")).await;
    assert_eq!(resp.status_code, 200);
    assert!(resp.body.contains("Pasta"));
    assert!(!resp.body.contains("Tacos"));
    assert!(resp.body.contains("value=\"mon\""));

    let resp = send_as(&router, &state, &token, get("/?search=")).await;
    assert!(resp.body.contains("Pasta"));
    assert!(resp.body.contains("Tacos"));

    let resp = send_as(&router, &state, &token, get("/?search=sunday")).await;
    assert!(resp.body.contains("No recipes yet."));
}

#[tokio::test]
async fn test_listing_escapes_html() {
    let (router, state) = common::test_app().await;
    let token = login_as(&router, &state, "alice", "pw").await;
    let form = [("name", "<b>Bold</b>")];
    send_as(&router, &state, &token, post("/", &form)).await;

    let resp = send_as(&router, &state, &token, get("/")).await;
    assert!(resp.body.contains("&lt;b&gt;Bold&lt;/b&gt;"));
    assert!(!resp.body.contains("<b>Bold</b>"));
}

#[tokio::test]
async fn test_update_recipe_prefills_and_overwrites() {
    let (router, state) = common::test_app().await;
    let token = login_as(&router, &state, "alice", "pw").await;
    let recipe = Recipe::create(&state.db, None, &fields("Monday", "Pasta", "Plain"))
        .await
        .unwrap();
    let path = format!("/update-recipe/{}/", recipe.id);

    let resp = send_as(&router, &state, &token, get(&path)).await;
    assert_eq!(resp.status_code, 200);
    assert!(resp.body.contains("value=\"Monday\""));
    assert!(resp.body.contains("value=\"Pasta\""));
    assert!(resp.body.contains(">Plain</textarea>"));

    let form = [("day", "Friday"), ("name", "Pizza"), ("description", "")];
    let resp = send_as(&router, &state, &token, post(&path, &form)).await;
    assert_eq!(resp.location(), Some("/"));

    let updated = Recipe::get(&state.db, recipe.id).await.unwrap();
    assert_eq!(updated.day, "Friday");
    assert_eq!(updated.name, "Pizza");
    assert_eq!(updated.description, DEFAULT_FIELD_VALUE);
}

#[tokio::test]
async fn test_update_validation_redirects_back() {
    let (router, state) = common::test_app().await;
    let token = login_as(&router, &state, "alice", "pw").await;
    let recipe = Recipe::create(&state.db, None, &fields("Monday", "Pasta", "Plain"))
        .await
        .unwrap();
    let path = format!("/update-recipe/{}/", recipe.id);

    let long = "d".repeat(101);
    let form = [("description", long.as_str())];
    let resp = send_as(&router, &state, &token, post(&path, &form)).await;
    assert_eq!(resp.location(), Some(path.as_str()));
    assert!(resp.cookie_value(FLASH_COOKIE).is_some());

    let unchanged = Recipe::get(&state.db, recipe.id).await.unwrap();
    assert_eq!(unchanged, recipe);
}

#[tokio::test]
async fn test_delete_recipe() {
    let (router, state) = common::test_app().await;
    let token = login_as(&router, &state, "alice", "pw").await;
    let keep = Recipe::create(&state.db, None, &fields("Monday", "Pasta", "x"))
        .await
        .unwrap();
    let gone = Recipe::create(&state.db, None, &fields("Tuesday", "Tacos", "x"))
        .await
        .unwrap();

    let path = format!("/delete-recipe/{}/", gone.id);
    let resp = send_as(&router, &state, &token, get(&path)).await;
    assert_eq!(resp.location(), Some("/"));
    assert_eq!(Recipe::all(&state.db).await.unwrap(), vec![keep]);

    let resp = send_as(&router, &state, &token, get(&path)).await;
    assert_eq!(resp.status_code, 404);
}

#[tokio::test]
async fn test_unknown_or_malformed_ids_are_not_found() {
    let (router, state) = common::test_app().await;
    let token = login_as(&router, &state, "alice", "pw").await;

    for path in ["/update-recipe/999/", "/delete-recipe/999/", "/update-recipe/abc/"] {
        let resp = send_as(&router, &state, &token, get(path)).await;
        assert_eq!(resp.status_code, 404, "{path}");
    }
    let resp = send_as(&router, &state, &token, post("/update-recipe/999/", &[])).await;
    assert_eq!(resp.status_code, 404);
}

#[tokio::test]
async fn test_pdf_page_lists_and_creates() {
    let (router, state) = common::test_app().await;
    let token = login_as(&router, &state, "alice", "pw").await;

    let form = [("day", "Sunday"), ("name", "Roast"), ("description", "Slow")];
    let resp = send_as(&router, &state, &token, post("/pdf/", &form)).await;
    assert_eq!(resp.location(), Some("/pdf/"));

    let resp = send_as(&router, &state, &token, get("/pdf/")).await;
    assert_eq!(resp.status_code, 200);
    assert!(resp.body.contains("window.print()"));
    assert!(resp.body.contains("<td>Roast</td>"));
    assert!(resp.body.contains("<td>1</td>"));
}

#[tokio::test]
async fn test_flash_is_shown_once() {
    let (router, state) = common::test_app().await;
    let token = login_as(&router, &state, "alice", "pw").await;

    let notice = Flash::error("Name must be at most 100 characters");
    let ctx = get("/").with_cookie(FLASH_COOKIE, &notice.encode());
    let resp = send_as(&router, &state, &token, ctx).await;
    assert_eq!(resp.status_code, 200);
    assert!(resp.body.contains("flash-error"));
    assert!(resp.body.contains("Name must be at most 100 characters"));
    assert_eq!(resp.cookie_value(FLASH_COOKIE), Some(""));

    let resp = send_as(&router, &state, &token, get("/")).await;
    assert!(!resp.body.contains("flash-error"));
    assert!(resp.cookie_value(FLASH_COOKIE).is_none());
}

#[tokio::test]
async fn test_flash_survives_redirects() {
    let (router, state) = common::test_app().await;
    let token = login_as(&router, &state, "alice", "pw").await;

    let notice = Flash::success("Account created");
    let ctx = post("/", &[("name", "Soup")]).with_cookie(FLASH_COOKIE, &notice.encode());
    let resp = send_as(&router, &state, &token, ctx).await;
    assert_eq!(resp.status_code, 302);
    assert!(resp.cookie_value(FLASH_COOKIE).is_none());
}

#[tokio::test]
async fn test_listing_is_shared_between_users() {
    let (router, state) = common::test_app().await;
    let alice = login_as(&router, &state, "alice", "pw").await;
    let bob = login_as(&router, &state, "bob", "pw").await;

    send_as(&router, &state, &alice, post("/", &[("name", "Pasta")])).await;

    let resp = send_as(&router, &state, &bob, get("/")).await;
    assert!(resp.body.contains("<td>Pasta</td>"));
    assert!(resp.body.contains("<td>alice</td>"));
}
