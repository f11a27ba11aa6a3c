//! Shared fixtures for integration tests: controllers, models and request
//! helpers.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{Method, Request as HttpRequestBuilder};
use convention_dispatch::controller::Methods;
use convention_dispatch::{
    ActionError, Context, Controller, Dep, HttpRequest, Model, Request, ResponseWriter, Route,
};

/// Build a buffered request.
pub fn request(method: &str, path: &str) -> HttpRequest {
    HttpRequestBuilder::builder()
        .method(Method::from_bytes(method.as_bytes()).unwrap())
        .uri(path)
        .body(Bytes::new())
        .unwrap()
}

pub fn get(path: &str) -> HttpRequest {
    request("GET", path)
}

/// Body of a response as UTF-8 text.
pub fn body_text(response: &convention_dispatch::HttpResponse) -> String {
    String::from_utf8(response.body().to_vec()).unwrap()
}

/// The route whose diagnostic target is `target`.
pub fn route<'a>(routes: &'a [Route], target: &str) -> &'a Route {
    routes
        .iter()
        .find(|r| r.target == target)
        .unwrap_or_else(|| panic!("no route for {}", target))
}

// Models

#[derive(Debug, Clone)]
pub struct Blog(pub u32);

#[derive(Debug, Clone)]
pub struct Post(pub u32);

#[derive(Debug, Clone)]
pub struct Comment(pub u32);

impl Model for Blog {
    fn id(&self) -> String {
        self.0.to_string()
    }
}

impl Model for Post {
    fn id(&self) -> String {
        self.0.to_string()
    }
}

impl Model for Comment {
    fn id(&self) -> String {
        self.0.to_string()
    }
}

// Resources

#[derive(Debug, Clone, Default)]
pub struct PostsController;

impl PostsController {
    fn index(&mut self) -> &'static str {
        "index"
    }

    fn show(&mut self) -> &'static str {
        "show"
    }

    fn new_post(&mut self) -> &'static str {
        "new"
    }

    fn create(&mut self) -> &'static str {
        "create"
    }

    fn edit(&mut self) -> &'static str {
        "edit"
    }

    fn update(&mut self) -> &'static str {
        "update"
    }

    fn delete(&mut self) -> &'static str {
        "delete"
    }

    fn search(&mut self) -> &'static str {
        "search"
    }

    fn post_search(&mut self) -> &'static str {
        "post_search"
    }

    fn approve(&mut self) -> &'static str {
        "member_approve"
    }

    fn reject(&mut self) -> &'static str {
        "member_put_reject"
    }
}

impl Controller for PostsController {
    fn methods(m: &mut Methods<Self>) {
        m.method("Index", Self::index)
            .method("Show", Self::show)
            .method("New", Self::new_post)
            .method("Create", Self::create)
            .method("Edit", Self::edit)
            .method("Update", Self::update)
            .method("Delete", Self::delete)
            .method("Search", Self::search)
            .method("POSTSearch", Self::post_search)
            .method("MemberGETApprove", Self::approve)
            .method("MemberPUTReject", Self::reject);
    }
}

#[derive(Debug, Clone, Default)]
pub struct BlogsController;

impl Controller for BlogsController {
    fn methods(_: &mut Methods<Self>) {}
}

#[derive(Debug, Clone, Default)]
pub struct Ideas;

impl Ideas {
    fn index(&mut self) -> &'static str {
        "ideas"
    }
}

impl Controller for Ideas {
    fn methods(m: &mut Methods<Self>) {
        m.method("Index", Self::index);
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileController;

impl Controller for ProfileController {
    fn methods(_: &mut Methods<Self>) {}
}

#[derive(Debug, Clone, Default)]
pub struct SessionController;

impl SessionController {
    fn new_session(&mut self) -> &'static str {
        "new"
    }

    fn delete(&mut self) -> &'static str {
        "delete"
    }

    fn show(&mut self) -> &'static str {
        "show"
    }

    fn create(&mut self) -> &'static str {
        "create"
    }

    fn edit(&mut self) -> &'static str {
        "edit"
    }

    fn update(&mut self) -> &'static str {
        "update"
    }

    fn search(&mut self) -> &'static str {
        "search"
    }
}

impl Controller for SessionController {
    fn methods(m: &mut Methods<Self>) {
        m.method("New", Self::new_session)
            .method("Delete", Self::delete)
            .method("Show", Self::show)
            .method("Create", Self::create)
            .method("Edit", Self::edit)
            .method("Update", Self::update)
            .method("POST_Search", Self::search);
    }
}

#[derive(Debug, Clone, Default)]
pub struct PagesController;

impl PagesController {
    fn index(&mut self) -> &'static str {
        "index"
    }

    fn show(&mut self, page: String) -> String {
        format!("This is {}", page)
    }
}

impl Controller for PagesController {
    fn methods(m: &mut Methods<Self>) {
        m.method("Index", Self::index).method("Show", Self::show);
    }
}

// Pipeline

/// Value produced by a generator of [`MoviesController`].
#[derive(Debug, Clone, PartialEq)]
pub struct PostParam(pub String);

/// Value placed in the request context by the tests.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextParam(pub String);

#[derive(Debug, Clone, Default)]
pub struct MoviesController {
    request: Option<Request>,
    response: Option<ResponseWriter>,
    out: String,
}

impl MoviesController {
    fn set_request_response(&mut self, r: Request, w: ResponseWriter) {
        self.request = Some(r);
        self.response = Some(w);
    }

    fn write_output(&mut self) {
        if let Some(w) = &self.response {
            if !self.out.is_empty() {
                w.write(self.out.as_bytes());
            }
        }
    }

    fn post_param(&mut self) -> PostParam {
        PostParam("index".into())
    }

    fn index(&mut self, p: Dep<PostParam>) {
        self.out = p.into_inner().0;
    }

    fn show(&mut self, a: String, b: String) -> String {
        format!("id1:{} id2:{}", a, b)
    }

    fn get_context(&mut self, ctx: Context) -> String {
        ctx.value::<ContextParam>()
            .map(|p| p.0.clone())
            .unwrap_or_default()
    }

    fn param_from_context(&mut self, p: Dep<ContextParam>) {
        self.out = p.into_inner().0;
    }

    fn request_path(&mut self) -> String {
        self.request
            .as_ref()
            .map(|r| r.uri().path().to_string())
            .unwrap_or_default()
    }
}

impl Controller for MoviesController {
    fn methods(m: &mut Methods<Self>) {
        m.method("Before_000_SetRequestResponse", Self::set_request_response)
            .method("After_ZZZ_WriteOutput", Self::write_output)
            .generator("Gen_PostParam", Self::post_param)
            .method("Index", Self::index)
            .method("Show", Self::show)
            .method("Get_Context", Self::get_context)
            .method("ParamFromContext", Self::param_from_context)
            .method("RequestPath", Self::request_path);
    }
}

#[derive(Debug, Clone)]
pub struct User;

#[derive(Debug, Clone)]
pub struct Person;

/// Fails at the stage whose field is set.
#[derive(Debug, Clone, Default)]
pub struct GenErrorController {
    pub gen: Option<String>,
    pub before: Option<String>,
    pub after: Option<String>,
    pub action: Option<String>,
    pub person: Option<String>,
}

fn fail(err: &Option<String>) -> Result<(), ActionError> {
    match err {
        Some(msg) => Err(ActionError::msg(msg.clone())),
        None => Ok(()),
    }
}

impl GenErrorController {
    fn handle_error(&mut self, w: ResponseWriter, err: ActionError) {
        w.write_header(axum::http::StatusCode::SERVICE_UNAVAILABLE);
        w.write(err.to_string().as_bytes());
    }

    fn user(&mut self) -> Result<User, ActionError> {
        fail(&self.gen).map(|()| User)
    }

    fn person(&mut self) -> Result<Person, ActionError> {
        fail(&self.person).map(|()| Person)
    }

    fn before_action(&mut self, _person: Dep<Person>) -> Result<(), ActionError> {
        fail(&self.before)
    }

    fn index(&mut self, w: ResponseWriter, _user: Dep<User>) -> Result<(), ActionError> {
        if self.gen.is_some() || self.before.is_some() || self.person.is_some() {
            panic!("Index should not be called if there is an error before");
        }
        fail(&self.action)?;
        w.write(b"ok");
        Ok(())
    }

    fn after_action(&mut self) -> Result<(), ActionError> {
        if self.gen.is_some()
            || self.before.is_some()
            || self.action.is_some()
            || self.person.is_some()
        {
            panic!("After should not be called if there is an error before");
        }
        fail(&self.after)
    }
}

impl Controller for GenErrorController {
    fn methods(m: &mut Methods<Self>) {
        m.method("HandleError", Self::handle_error)
            .try_generator("Gen_User", Self::user)
            .try_generator("Gen_Person", Self::person)
            .method("Before_Action", Self::before_action)
            .method("Index", Self::index)
            .method("After_Action", Self::after_action);
    }
}

/// Panics at the stage whose field is set.
#[derive(Debug, Clone, Default)]
pub struct PanicController {
    pub gen: Option<String>,
    pub before: Option<String>,
    pub after: Option<String>,
    pub action: Option<String>,
}

fn explode(msg: &Option<String>) {
    if let Some(msg) = msg {
        panic!("{}", msg);
    }
}

impl PanicController {
    fn handle_error(&mut self, w: ResponseWriter, err: ActionError) {
        w.write_header(axum::http::StatusCode::SERVICE_UNAVAILABLE);
        w.write(err.to_string().as_bytes());
    }

    fn user(&mut self) -> User {
        explode(&self.gen);
        User
    }

    fn before_action(&mut self) {
        explode(&self.before);
    }

    fn index(&mut self, w: ResponseWriter, _user: Dep<User>) {
        explode(&self.action);
        w.write(b"ok");
    }

    fn after_action(&mut self) {
        explode(&self.after);
    }
}

impl Controller for PanicController {
    fn methods(m: &mut Methods<Self>) {
        m.method("HandleError", Self::handle_error)
            .generator("Gen_User", Self::user)
            .method("Before_Action", Self::before_action)
            .method("Index", Self::index)
            .method("After_Action", Self::after_action);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Number(pub u32);

/// Counts generator runs on its own instance.
#[derive(Debug, Clone, Default)]
pub struct OnceController {
    pub counter: u32,
    pub error: Option<String>,
}

impl OnceController {
    fn counter(&mut self) -> Result<Number, ActionError> {
        self.counter += 1;
        fail(&self.error).map(|()| Number(self.counter))
    }

    fn count_one(&mut self, _n: Dep<Number>) {}

    fn index(&mut self, n: Dep<Number>) -> String {
        let Number(count) = *n;
        count.to_string()
    }
}

impl Controller for OnceController {
    fn methods(m: &mut Methods<Self>) {
        m.try_generator("Gen_Counter", Self::counter)
            .method("Before_CountOne", Self::count_one)
            .method("Index", Self::index);
    }
}

/// Every action succeeds only when its parameter was provided.
#[derive(Debug, Clone, Default)]
pub struct TestParamsController;

impl TestParamsController {
    fn request(&mut self, r: Request) -> Result<(), ActionError> {
        if r.uri().path().is_empty() {
            return Err(ActionError::msg("Request is empty"));
        }
        Ok(())
    }

    fn response(&mut self, w: ResponseWriter) -> Result<(), ActionError> {
        if w.is_committed() {
            return Err(ActionError::msg("Response already committed"));
        }
        Ok(())
    }

    fn route(&mut self, route: Dep<Arc<Route>>) -> Result<(), ActionError> {
        if route.target != "TestParamsController#GETRoute" {
            return Err(ActionError::msg(format!("unexpected route {}", route.target)));
        }
        Ok(())
    }
}

impl Controller for TestParamsController {
    fn methods(m: &mut Methods<Self>) {
        m.method("GETRequest", Self::request)
            .method("GETResponse", Self::response)
            .method("GETRoute", Self::route);
    }
}
