//! Demo site served by the `kick` binary.
//!
//! Routes come from `demos/pages`; this module supplies the artifacts those
//! files name and the services they depend on.

use std::sync::{Arc, RwLock};

use kick::pipeline::{Middleware, MiddlewareService};
use kick::service::{Arguments, Dependency, Injectable};
use kick::view::element::{a, body, h1, head, html, li, p, title, ul};
use kick::{
    handler_fn, middleware_fn, ApplicationError, ArtifactRegistry, Container, ContainerError,
    DispatchError, DispatchResult, Next, Provided, Reply, Request, Response,
};
use serde::Serialize;
use serde_json::{json, Value};

/// Site-wide settings bound as a literal.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub name: String,
    pub admin_token: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            name: "Kick demo".to_string(),
            admin_token: "letmein".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub body: String,
}

/// In-memory posts, created by a factory on first use.
#[derive(Debug, Default)]
pub struct PostStore {
    posts: RwLock<Vec<Post>>,
}

impl PostStore {
    pub fn seeded() -> Self {
        let store = Self::default();
        store.create("Hello", "The first post.");
        store.create("Routing", "Files become routes.");
        store
    }

    pub fn all(&self) -> Vec<Post> {
        self.posts.read().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn get(&self, id: u64) -> Option<Post> {
        self.all().into_iter().find(|p| p.id == id)
    }

    pub fn create(&self, title: &str, body: &str) -> Option<Post> {
        let mut posts = self.posts.write().ok()?;
        let post = Post {
            id: posts.len() as u64 + 1,
            title: title.to_string(),
            body: body.to_string(),
        };
        posts.push(post.clone());
        Some(post)
    }
}

/// Tags every response with the site name.
pub struct PoweredBy {
    settings: Arc<SiteSettings>,
}

impl Injectable for PoweredBy {
    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::of::<SiteSettings>("settings")]
    }

    fn construct(args: &Arguments) -> Result<Self, ContainerError> {
        Ok(Self {
            settings: args.get("settings")?,
        })
    }
}

impl Middleware for PoweredBy {
    fn handle(
        &self,
        request: Request,
        next: Next<'_>,
        _: &Container,
        _: &Provided,
    ) -> DispatchResult<Reply> {
        let response = next
            .run(request)?
            .with_header("x-powered-by", self.settings.name.as_str());
        Ok(response.into())
    }
}

/// Registers the demo services.
pub fn provide(container: &Container) {
    container
        .literal(SiteSettings::default())
        .factory(PostStore::seeded)
        .autowire::<PoweredBy>();
}

/// Artifacts for every file under `demos/pages`.
pub fn artifacts() -> ArtifactRegistry {
    ArtifactRegistry::new()
        .services("/__middleware.route", vec![MiddlewareService::of::<PoweredBy>()])
        .handler(
            "/index.GET.route",
            handler_fn(
                |_: Request, (settings, store): (Arc<SiteSettings>, Arc<PostStore>)| {
                    let items = store.all().into_iter().map(|post| {
                        li().child(a().attr("href", format!("/posts/{}", post.id)).child(post.title))
                    });
                    Ok::<_, DispatchError>(
                        html()
                            .child(head().child(title().child(settings.name.as_str())))
                            .child(
                                body()
                                    .child(h1().child(settings.name.as_str()))
                                    .child(p().child("Posts on this site:"))
                                    .child(ul().children(items)),
                            ),
                    )
                },
            ),
        )
        .handler(
            "/posts/index.GET.route",
            handler_fn(|_: Request, (store,): (Arc<PostStore>,)| {
                Ok::<_, DispatchError>(json!(store.all()))
            }),
        )
        .handler(
            "/posts/index.POST.route",
            handler_fn(|req: Request, (store,): (Arc<PostStore>,)| create_post(&req, &store)),
        )
        .handler(
            "/posts/_pid.GET.route",
            handler_fn(|req: Request, (store,): (Arc<PostStore>,)| -> DispatchResult<Value> {
                let post = req
                    .segment("pid")
                    .and_then(|id| id.parse().ok())
                    .and_then(|id| store.get(id))
                    .ok_or_else(|| ApplicationError::not_found("Post does not exist."))?;
                Ok(json!(post))
            }),
        )
        .middleware("/admin/__middleware.route", middleware_fn(require_admin))
        .handler(
            "/admin/stats.GET.route",
            handler_fn(|_: Request, (store,): (Arc<PostStore>,)| {
                Ok::<_, DispatchError>(format!("posts: {}", store.all().len()))
            }),
        )
}

fn require_admin(
    req: Request,
    next: Next<'_>,
    (settings,): (Arc<SiteSettings>,),
) -> DispatchResult<Response> {
    if req.header("x-admin-token") != Some(settings.admin_token.as_str()) {
        tracing::debug!(path = %req.path, "Admin token missing or wrong");
        return Err(ApplicationError::new(401, "Unauthorized.").into());
    }
    next.run(req)
}

fn create_post(req: &Request, store: &PostStore) -> DispatchResult<Response> {
    let field = |name: &str| {
        req.get(name)
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|s| !s.trim().is_empty())
    };
    let title = field("title").ok_or_else(|| ApplicationError::new(422, "A title is required."))?;
    let body = field("body").unwrap_or_default();

    let post = store
        .create(&title, &body)
        .ok_or_else(|| DispatchError::other("post store is poisoned"))?;
    tracing::info!(id = post.id, title = %post.title, "Post created");
    Ok(Response::json(&post, 201).with_header("location", format!("/posts/{}", post.id)))
}
