//! A small TinyApp service.
//!
//! ```text
//! cargo run -p tinyapp --example hello
//! curl localhost:8080/hello/ada?shout=yes
//! curl localhost:8080/api/notes/3
//! curl -X POST localhost:8080/api/notes -d '{"text":"buy milk"}'
//! ```

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use tinyapp::prelude::*;

#[derive(Debug, Serialize, Deserialize)]
struct Note {
    #[serde(default)]
    id: i64,
    text: String,
}

#[derive(Default)]
struct Notes {
    next_id: AtomicI64,
}

impl Notes {
    fn create(&self, text: String) -> Note {
        Note {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            text,
        }
    }
}

struct ShowNote;

impl Invocable for ShowNote {
    fn signature() -> Signature {
        Signature::new()
            .param(Param::inject::<dyn Cache>("cache"))
            .param(Param::int("id"))
    }

    fn invoke(&self, args: Args) -> BoxFuture<'_, DispatchResult<Reply>> {
        Box::pin(async move {
            let cache = args.service::<dyn Cache>("cache")?;
            let id: i64 = args.get("id")?;
            let text = cache
                .get(&format!("note:{id}"))
                .and_then(|value| value.as_str().map(ToString::to_string))
                .ok_or_else(|| {
                    DispatchError::handler(StatusCode::NOT_FOUND, format!("note {id} not found"))
                })?;
            Ok(Reply::structured(Note { id, text }))
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::new()
        .with_development()
        .with_optional_file("tinyapp.toml")?
        .with_dotenv()?
        .with_env_prefix("TINYAPP")
        .load()?;
    init_logging(&config.logging.to_log_config())?;

    let mut app = App::from_config(&config);
    app.container_mut().register(Arc::new(Notes::default()));
    app.container_mut().register(Arc::new(ShowNote));

    app.get_with(
        "/hello/{name}",
        HandlerRef::function(
            Signature::new()
                .param(Param::string("name"))
                .param(Param::bool("shout").with_default(false)),
            |args| async move {
                let name: String = args.get("name")?;
                Ok(if args.get::<bool>("shout")? {
                    format!("HELLO, {}!", name.to_uppercase())
                } else {
                    format!("Hello, {name}!")
                })
            },
        ),
        RouteOptions::new().name("hello"),
    );

    app.add_group(
        "/api",
        |api| {
            api.get("/notes/{id}", HandlerRef::resolve::<ShowNote>());
            api.post(
                "/notes",
                HandlerRef::method(
                    Signature::new()
                        .param(Param::inject::<InvocationContext>("request"))
                        .param(Param::inject::<dyn Cache>("cache")),
                    |notes: Arc<Notes>, args| async move {
                        let request = args.service::<InvocationContext>("request")?;
                        let cache = args.service::<dyn Cache>("cache")?;
                        let draft: Note = request.json()?;
                        let note = notes.create(draft.text);
                        cache.set(&format!("note:{}", note.id), note.text.clone().into(), None);
                        Ok(Json(note))
                    },
                ),
            );
        },
        GroupOptions::new(),
    );

    let hello = app.url_for("hello", &Params::new().with("name", "world"))?;
    tracing::info!(example = %hello, "routes registered");

    let server = Server::new(app, ServerConfig::from_section(&config.server));
    server.run().await?;
    Ok(())
}
