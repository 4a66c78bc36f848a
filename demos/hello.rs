//! Minimal juzdy application — a configured pipeline with one public and one
//! protected handler.
//!
//! Run with:
//!   cargo run --example hello -- demos/hello.toml
//!
//! Try:
//!   curl http://localhost:3000/
//!   curl http://localhost:3000/Hello?name=alice
//!   curl http://localhost:3000/Dashboard                       # 401
//!   curl -H 'authorization: Bearer demo' http://localhost:3000/Dashboard
//!   curl http://localhost:3000/NoSuchThing                     # 404

use juzdy::config::ConfigLoader;
use juzdy::middleware::{BoxFuture, Middleware, MiddlewareCatalog, Next};
use juzdy::{HandlerTable, Outcome, Pipeline, Request, Response, Server, StatusCode, handler_fn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "demos/hello.toml".to_owned());
    let config = ConfigLoader::new()
        .with_file(path)?
        .with_env_prefix("JUZDY")
        .load()?;

    juzdy::logging::init(&config.log)?;

    let catalog = MiddlewareCatalog::with_builtins().with(AuthCheck);

    let mut handlers = HandlerTable::new();
    handlers.register("App.Handler.Index", handler_fn(index))?;
    handlers.register("App.Handler.Hello", handler_fn(hello))?;
    handlers.register("App.Handler.Dashboard", handler_fn(dashboard).with_capability("auth"))?;

    let pipeline = Pipeline::from_config(&config.dispatch, &catalog, handlers)?;

    Server::from_config(&config.server)?.serve(pipeline).await?;
    Ok(())
}

// GET /
async fn index(_req: Request) -> &'static str {
    "Hello"
}

// GET /Hello?name=alice
async fn hello(req: Request) -> String {
    format!("Hello, {}!", req.query_str("name").unwrap_or("stranger"))
}

// GET /Dashboard — only reached when AuthCheck lets the request through.
async fn dashboard(req: Request) -> Response {
    let user = req.attribute::<String>("user").map(String::as_str).unwrap_or("?");
    Response::json(format!(r#"{{"user":"{user}"}}"#))
}

/// Rejects requests without a bearer token; otherwise records the token
/// owner for the handler.
struct AuthCheck;

impl Middleware for AuthCheck {
    fn name(&self) -> &str {
        "auth_check"
    }

    fn process<'a>(&'a self, mut req: Request, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            let Some(token) = req.header("authorization").and_then(|v| v.strip_prefix("Bearer ")) else {
                return Ok(Response::status(StatusCode::UNAUTHORIZED));
            };
            let user = token.to_owned();
            req.set_attribute("user", user);
            next.run(req).await
        })
    }
}
