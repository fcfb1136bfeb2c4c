//! DevPub server: loads settings, wires the adapters into the services and
//! serves the HTTP API until SIGINT/SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use api_adapters::{build_router, AppState, RouterOptions};
use auth_adapters::{Argon2Hasher, DistortedCaptcha, LogMailer, MemorySessionStore};
use configs::{Backend, LogFormat, LogSettings, MailSettings, Settings};
use domains::Mailer;
use services::dto::BlogInfo;
use services::{AuthOptions, AuthService, GeneralService, MediaLimits, PostService, Repositories};
use storage_adapters::{LocalMediaStore, MemoryStore};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    init_tracing(&settings.log);
    info!(version = env!("CARGO_PKG_VERSION"), "starting devpub");

    let repos = open_store(&settings).await?;
    let hasher = Arc::new(Argon2Hasher::new());

    tokio::fs::create_dir_all(&settings.media.upload_dir)
        .await
        .with_context(|| format!("creating upload dir {}", settings.media.upload_dir))?;
    let media = Arc::new(LocalMediaStore::new(
        settings.media.upload_dir.clone(),
        settings.media.public_prefix.clone(),
    ));

    let blog = &settings.blog;
    let general = GeneralService::new(
        repos.clone(),
        media,
        hasher.clone(),
        BlogInfo {
            title: blog.title.clone(),
            subtitle: blog.subtitle.clone(),
            phone: blog.phone.clone(),
            email: blog.email.clone(),
            copyright: blog.copyright.clone(),
            copyright_from: blog.copyright_from.clone(),
        },
        MediaLimits {
            max_image_bytes: settings.media.max_image_bytes,
            max_photo_bytes: settings.media.max_photo_bytes,
        },
    );

    let session_ttl = chrono::Duration::minutes(settings.session.ttl_minutes);
    let sessions = MemorySessionStore::new(
        session_ttl.to_std().context("session.ttl_minutes must not be negative")?,
    );
    let auth = Arc::new(AuthService::new(
        repos.clone(),
        Arc::new(sessions),
        hasher,
        build_mailer(&settings.mail)?,
        Arc::new(DistortedCaptcha::new(settings.captcha.length)),
        AuthOptions {
            base_url: settings.server.base_url.trim_end_matches('/').to_string(),
            captcha_ttl: chrono::Duration::minutes(settings.captcha.ttl_minutes),
            session_ttl,
        },
    ));
    spawn_sweeper(auth.clone(), settings.captcha.sweep_interval_secs);

    let state = AppState {
        posts: Arc::new(PostService::new(repos)),
        general: Arc::new(general),
        auth,
        metrics: Arc::default(),
    };
    let router = build_router(
        state,
        RouterOptions {
            upload_dir: settings.media.upload_dir.clone().into(),
            public_prefix: settings.media.public_prefix.clone(),
            cors_origins: settings.server.cors_origins.clone(),
            body_limit: settings.media.max_image_bytes.max(settings.media.max_photo_bytes) + 1024 * 1024,
        },
    );

    let address = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!(address = %address, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving http")?;

    info!("server stopped");
    Ok(())
}

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn open_store(settings: &Settings) -> anyhow::Result<Repositories> {
    match settings.database.backend {
        #[cfg(feature = "db-postgres")]
        Backend::Postgres => {
            let store = storage_adapters::PgStore::connect(
                &settings.database.url,
                settings.database.max_connections,
            )
            .await
            .context("connecting to postgres")?;
            store.migrate().await.context("running migrations")?;
            info!("database migrations applied");
            Ok(Repositories::from_store(Arc::new(store)))
        }
        #[cfg(not(feature = "db-postgres"))]
        Backend::Postgres => anyhow::bail!("built without the db-postgres feature"),
        Backend::Memory => {
            warn!("using the in-memory store; data is lost on exit");
            Ok(Repositories::from_store(Arc::new(MemoryStore::new())))
        }
    }
}

fn build_mailer(mail: &MailSettings) -> anyhow::Result<Arc<dyn Mailer>> {
    match mail.host.as_deref().filter(|h| !h.is_empty()) {
        #[cfg(feature = "mail-smtp")]
        Some(host) => {
            let mailer = auth_adapters::SmtpMailer::new(
                host,
                mail.port,
                mail.username.clone(),
                &mail.password,
                &mail.from,
            )
            .context("configuring smtp")?;
            info!(host = %host, port = mail.port, "smtp mailer configured");
            Ok(Arc::new(mailer))
        }
        _ => {
            warn!("no mail host configured; recovery mails are only logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

/// Periodically drops expired captcha codes and sessions.
fn spawn_sweeper(auth: Arc<AuthService>, every_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(every_secs.max(1)));
        loop {
            interval.tick().await;
            let sessions = auth.sweep_sessions();
            debug!(removed = sessions, "session sweep");
            match auth.sweep_captchas().await {
                Ok(removed) => debug!(removed, "captcha sweep"),
                Err(e) => error!(error = %e, "captcha sweep failed"),
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
