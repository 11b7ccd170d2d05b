//! Example consumer: serves CRUD routes for every router in a JSON config file.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Settings come from the environment (or a `.env` file): CRUD_BACKEND, DATABASE_URL,
//! BIND_ADDR, LOG_FORMAT, CRUD_CONFIG_PATH, ...

use crud_router::{
    apply_migrations, build_app, connect_pool, ensure_database_exists, load_from_path, resolve_all,
    init_tracing, AppOptions, BackendKind, CrudRouter, Settings,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    init_tracing(settings.log_format, "crud_router=info,example_consumer=info,tower_http=info");

    let config = load_from_path(&settings.config_path).await?;
    let resolved = resolve_all(&config)?;
    tracing::info!(
        path = %settings.config_path.display(),
        routers = resolved.len(),
        backend = ?settings.backend,
        "loaded crud config"
    );

    let routers = match (settings.backend, settings.database_url.as_deref()) {
        (BackendKind::Postgres, Some(url)) => {
            ensure_database_exists(url).await?;
            let pool = connect_pool(url, settings.database_max_connections).await?;
            apply_migrations(&pool, &resolved).await?;
            resolved
                .into_iter()
                .map(|r| CrudRouter::postgres(r, pool.clone()))
                .collect::<Vec<_>>()
        }
        _ => resolved
            .into_iter()
            .map(CrudRouter::memory)
            .collect::<Result<Vec<_>, _>>()?,
    };

    let options = AppOptions {
        title: settings.api_title.clone(),
        max_body_bytes: settings.max_body_bytes,
        ..AppOptions::default()
    };
    let app = build_app(routers, &options);

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
