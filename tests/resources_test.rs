//! Route generation of the `resources` and `resource` conventions.

use convention_dispatch::routing::ModelKey;
use convention_dispatch::{Route, Scope};

mod common;

use common::*;

/// (target, method, url, name, action)
type Row = (&'static str, &'static str, &'static str, &'static str, &'static str);

fn check(routes: &[Route], rows: &[Row]) {
    for (target, method, url, name, action) in rows {
        let route = route(routes, target);
        assert_eq!(route.method, *method, "method of {}", target);
        assert_eq!(route.url, *url, "url of {}", target);
        assert_eq!(route.name, *name, "name of {}", target);
        assert_eq!(route.action, *action, "action of {}", target);
    }
}

#[test]
fn test_resources_convention() {
    let s = Scope::new();
    s.resources(PostsController).model::<Post>();
    let routes = s.routes();

    check(
        &routes,
        &[
            ("PostsController#Index", "GET", "/posts", "posts", "index"),
            ("PostsController#Show", "GET", "/posts/:post_id", "post", "show"),
            ("PostsController#New", "GET", "/posts/new", "new_post", "new"),
            ("PostsController#Create", "POST", "/posts", "posts", "create"),
            ("PostsController#Edit", "GET", "/posts/:post_id/edit", "edit_post", "edit"),
            ("PostsController#Update", "PUT,PATCH", "/posts/:post_id", "post", "update"),
            ("PostsController#Delete", "DELETE", "/posts/:post_id", "post", "delete"),
            ("PostsController#POSTSearch", "POST", "/posts/search", "search_posts", "search"),
            (
                "PostsController#MemberGETApprove",
                "GET",
                "/posts/:post_id/approve",
                "approve_post",
                "approve",
            ),
            (
                "PostsController#MemberPUTReject",
                "PUT,PATCH",
                "/posts/:post_id/reject",
                "reject_post",
                "reject",
            ),
        ],
    );

    // No verb prefix, not routed.
    assert!(routes.iter().all(|r| r.target != "PostsController#Search"));
    assert_eq!(routes.len(), 10);
    assert!(routes.iter().all(|r| r.controller == "posts"));
    assert!(routes.iter().all(|r| r.handler.is_some()));
}

#[test]
fn test_resources_as_keeps_path() {
    let s = Scope::new();
    s.resources(PostsController).as_name("articles").draw(|s| {
        s.resources(Ideas);
    });
    let routes = s.routes();

    check(
        &routes,
        &[
            ("PostsController#Index", "GET", "/posts", "articles", "index"),
            ("PostsController#Show", "GET", "/posts/:post_id", "article", "show"),
            ("PostsController#New", "GET", "/posts/new", "new_article", "new"),
            ("PostsController#Edit", "GET", "/posts/:post_id/edit", "edit_article", "edit"),
            (
                "PostsController#POSTSearch",
                "POST",
                "/posts/search",
                "search_articles",
                "search",
            ),
            (
                "PostsController#MemberPUTReject",
                "PUT,PATCH",
                "/posts/:post_id/reject",
                "reject_article",
                "reject",
            ),
            ("Ideas#Index", "GET", "/posts/:post_id/ideas", "article_ideas", "index"),
        ],
    );
}

#[test]
fn test_resources_path() {
    let s = Scope::new();
    s.resources(PostsController).path("articles").draw(|s| {
        s.resources(Ideas);
    });
    let routes = s.routes();

    check(
        &routes,
        &[
            ("PostsController#Index", "GET", "/articles", "posts", "index"),
            ("PostsController#Show", "GET", "/articles/:post_id", "post", "show"),
            ("PostsController#Create", "POST", "/articles", "posts", "create"),
            (
                "PostsController#MemberGETApprove",
                "GET",
                "/articles/:post_id/approve",
                "approve_post",
                "approve",
            ),
            ("Ideas#Index", "GET", "/articles/:post_id/ideas", "post_ideas", "index"),
        ],
    );
}

#[test]
fn test_resources_root_path() {
    let s = Scope::new();
    s.resources(PostsController).path("/");
    let routes = s.routes();

    check(
        &routes,
        &[
            ("PostsController#Index", "GET", "/", "posts", "index"),
            ("PostsController#Show", "GET", "/:post_id", "post", "show"),
            ("PostsController#New", "GET", "/new", "new_post", "new"),
            ("PostsController#Create", "POST", "/", "posts", "create"),
            ("PostsController#Edit", "GET", "/:post_id/edit", "edit_post", "edit"),
            ("PostsController#Delete", "DELETE", "/:post_id", "post", "delete"),
            ("PostsController#POSTSearch", "POST", "/search", "search_posts", "search"),
            (
                "PostsController#MemberPUTReject",
                "PUT,PATCH",
                "/:post_id/reject",
                "reject_post",
                "reject",
            ),
        ],
    );
}

#[test]
fn test_resources_in_scope() {
    let s = Scope::new();
    s.path("cool")
        .as_name("admin")
        .namespace("private")
        .resources(PostsController);
    let routes = s.routes();

    check(
        &routes,
        &[
            ("PostsController#Index", "GET", "/cool/posts", "admin_posts", "index"),
            ("PostsController#Show", "GET", "/cool/posts/:post_id", "admin_post", "show"),
            ("PostsController#New", "GET", "/cool/posts/new", "new_admin_post", "new"),
            (
                "PostsController#Edit",
                "GET",
                "/cool/posts/:post_id/edit",
                "edit_admin_post",
                "edit",
            ),
            (
                "PostsController#POSTSearch",
                "POST",
                "/cool/posts/search",
                "search_admin_posts",
                "search",
            ),
            (
                "PostsController#MemberGETApprove",
                "GET",
                "/cool/posts/:post_id/approve",
                "approve_admin_post",
                "approve",
            ),
        ],
    );
    assert!(routes.iter().all(|r| r.namespace == "private"));
}

#[test]
fn test_nested_resources() {
    let s = Scope::new();
    s.resources(BlogsController).draw(|s| {
        s.resources(PostsController);
    });
    let routes = s.routes();

    check(
        &routes,
        &[
            ("PostsController#Index", "GET", "/blogs/:blog_id/posts", "blog_posts", "index"),
            (
                "PostsController#Show",
                "GET",
                "/blogs/:blog_id/posts/:post_id",
                "blog_post",
                "show",
            ),
            ("PostsController#New", "GET", "/blogs/:blog_id/posts/new", "new_blog_post", "new"),
            ("PostsController#Create", "POST", "/blogs/:blog_id/posts", "blog_posts", "create"),
            (
                "PostsController#Edit",
                "GET",
                "/blogs/:blog_id/posts/:post_id/edit",
                "edit_blog_post",
                "edit",
            ),
            (
                "PostsController#Update",
                "PUT,PATCH",
                "/blogs/:blog_id/posts/:post_id",
                "blog_post",
                "update",
            ),
            (
                "PostsController#POSTSearch",
                "POST",
                "/blogs/:blog_id/posts/search",
                "search_blog_posts",
                "search",
            ),
            (
                "PostsController#MemberPUTReject",
                "PUT,PATCH",
                "/blogs/:blog_id/posts/:post_id/reject",
                "reject_blog_post",
                "reject",
            ),
        ],
    );
}

#[test]
fn test_resources_models() {
    let s = Scope::new();
    s.resources(PostsController).model::<Post>();
    let routes = s.routes();
    let post = ModelKey::of::<Post>();

    for (target, models) in [
        ("PostsController#Index", vec![]),
        ("PostsController#Show", vec![post]),
        ("PostsController#New", vec![]),
        ("PostsController#Edit", vec![ModelKey::Anonymous]),
        ("PostsController#Update", vec![post]),
        ("PostsController#Delete", vec![post]),
        ("PostsController#MemberGETApprove", vec![ModelKey::Anonymous]),
    ] {
        assert_eq!(route(&routes, target).models, models, "models of {}", target);
    }
}

#[test]
fn test_nested_resources_models() {
    let s = Scope::new();
    s.resources(BlogsController).model::<Blog>().draw(|s| {
        s.resources(PostsController).model::<Post>();
    });
    let routes = s.routes();
    let (blog, post, any) = (ModelKey::of::<Blog>(), ModelKey::of::<Post>(), ModelKey::Anonymous);

    for (target, models) in [
        ("PostsController#Index", vec![any]),
        ("PostsController#Show", vec![blog, post]),
        ("PostsController#New", vec![any]),
        ("PostsController#Edit", vec![any, any]),
        ("PostsController#Update", vec![blog, post]),
        ("PostsController#Delete", vec![blog, post]),
        ("PostsController#POSTSearch", vec![any]),
        ("PostsController#MemberGETApprove", vec![any, any]),
    ] {
        assert_eq!(route(&routes, target).models, models, "models of {}", target);
    }
}

#[test]
fn test_resources_options() {
    let s = Scope::new();
    s.resources(PostsController)
        .name("articles")
        .path_names("nuevo", "editar")
        .namespace("admin");
    let routes = s.routes();

    check(
        &routes,
        &[
            ("PostsController#Index", "GET", "/articles", "articles", "index"),
            ("PostsController#New", "GET", "/articles/nuevo", "new_article", "new"),
            (
                "PostsController#Edit",
                "GET",
                "/articles/:article_id/editar",
                "edit_article",
                "edit",
            ),
        ],
    );
    assert!(routes.iter().all(|r| r.namespace == "admin"));

    let s = Scope::new();
    s.resources(PostsController).param_name("slug");
    let routes = s.routes();
    assert_eq!(route(&routes, "PostsController#Show").url, "/posts/:slug");
}

#[test]
fn test_resource_convention() {
    let s = Scope::new();
    s.resource(SessionController);
    let routes = s.routes();

    check(
        &routes,
        &[
            ("SessionController#Show", "GET", "/session", "session", "show"),
            ("SessionController#New", "GET", "/session/new", "new_session", "new"),
            ("SessionController#Create", "POST", "/session", "session", "create"),
            ("SessionController#Edit", "GET", "/session/edit", "edit_session", "edit"),
            ("SessionController#Update", "PUT,PATCH", "/session", "session", "update"),
            ("SessionController#Delete", "DELETE", "/session", "session", "delete"),
            (
                "SessionController#POST_Search",
                "POST",
                "/session/search",
                "session_search",
                "search",
            ),
        ],
    );
}

#[test]
fn test_nested_resource() {
    let s = Scope::new();
    s.resource(ProfileController).draw(|s| {
        s.resource(SessionController);
    });
    let routes = s.routes();

    check(
        &routes,
        &[
            ("SessionController#Show", "GET", "/profile/session", "profile_session", "show"),
            (
                "SessionController#New",
                "GET",
                "/profile/session/new",
                "new_profile_session",
                "new",
            ),
            (
                "SessionController#Edit",
                "GET",
                "/profile/session/edit",
                "edit_profile_session",
                "edit",
            ),
            (
                "SessionController#POST_Search",
                "POST",
                "/profile/session/search",
                "profile_session_search",
                "search",
            ),
        ],
    );
}

#[test]
fn test_resource_in_scope() {
    let s = Scope::new();
    s.path("cool")
        .as_name("admin")
        .namespace("private")
        .resource(SessionController);
    let routes = s.routes();

    check(
        &routes,
        &[
            ("SessionController#Show", "GET", "/cool/session", "admin_session", "show"),
            (
                "SessionController#New",
                "GET",
                "/cool/session/new",
                "new_admin_session",
                "new",
            ),
            (
                "SessionController#Delete",
                "DELETE",
                "/cool/session",
                "admin_session",
                "delete",
            ),
            (
                "SessionController#POST_Search",
                "POST",
                "/cool/session/search",
                "admin_session_search",
                "search",
            ),
        ],
    );
}

#[test]
fn test_resource_name() {
    let s = Scope::new();
    s.resource(SessionController).name("login");
    let routes = s.routes();

    check(
        &routes,
        &[
            ("SessionController#Show", "GET", "/login", "login", "show"),
            ("SessionController#New", "GET", "/login/new", "new_login", "new"),
        ],
    );
}

#[test]
#[should_panic(expected = "with a constraint of POST method")]
fn test_conflicting_method_constraint_panics() {
    let s = Scope::new();
    s.post("admin").resources(PostsController);
    let _ = s.routes();
}
