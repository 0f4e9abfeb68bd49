//! EduTrack - Student results backend
//! Admins manage marks, students read their own result

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::Path;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edutrack_backend::{
    api::create_router,
    auth::{AuthGateway, JwtHandler, UserRole, UserStore},
    config::Config,
    middleware::RateLimitLayer,
    service::ResultService,
    students::StudentStore,
};

#[derive(Parser, Debug)]
#[command(name = "edutrack")]
#[command(about = "Student results service", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API (default)
    Serve {
        #[arg(long)]
        port: Option<u16>,

        #[arg(long)]
        db_path: Option<String>,

        #[arg(long)]
        auth_db_path: Option<String>,
    },
    /// Create a login account
    AddUser {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: String,

        /// ADMIN or STUDENT
        #[arg(long, default_value = "STUDENT")]
        role: UserRole,

        #[arg(long, env = "EDUTRACK_USER_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        auth_db_path: Option<String>,
    },
    /// Print every login account
    ListUsers {
        #[arg(long)]
        auth_db_path: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    match cli.command.unwrap_or(Commands::Serve {
        port: None,
        db_path: None,
        auth_db_path: None,
    }) {
        Commands::Serve {
            port,
            db_path,
            auth_db_path,
        } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(db_path) = db_path {
                config.db_path = db_path;
            }
            if let Some(auth_db_path) = auth_db_path {
                config.auth_db_path = auth_db_path;
            }
            serve(config).await
        }
        Commands::AddUser {
            email,
            name,
            role,
            password,
            auth_db_path,
        } => {
            if let Some(auth_db_path) = auth_db_path {
                config.auth_db_path = auth_db_path;
            }
            let user_store = UserStore::new(&config.auth_db_path)?;
            let user = user_store.create_user(&name, &email, &password, role)?;
            println!("Created {} account {} ({})", user.role, user.email, user.id);
            Ok(())
        }
        Commands::ListUsers { auth_db_path } => {
            if let Some(auth_db_path) = auth_db_path {
                config.auth_db_path = auth_db_path;
            }
            let user_store = UserStore::new(&config.auth_db_path)?;
            for user in user_store.list_users()? {
                println!("{:<8} {:<32} {}", user.role.as_str(), user.email, user.name);
            }
            Ok(())
        }
    }
}

async fn serve(config: Config) -> Result<()> {
    info!("🚀 EduTrack starting");

    let user_store = Arc::new(UserStore::new(&config.auth_db_path)?);
    user_store.ensure_default_admin(&config.default_admin)?;
    if let Some(demo) = &config.demo_student {
        user_store.ensure_user(demo, UserRole::Student)?;
    }
    info!("🔐 Authentication initialized at: {}", config.auth_db_path);

    let jwt_handler = Arc::new(JwtHandler::with_expiration(
        config.jwt_secret.clone(),
        config.jwt_expiration_hours,
    ));
    let gateway = Arc::new(AuthGateway::new(user_store, jwt_handler));

    let student_store = Arc::new(StudentStore::new(&config.db_path)?);
    info!(
        "📚 Student records at: {} ({} records)",
        config.db_path,
        student_store.count()?
    );

    let service = ResultService::new(gateway, student_store);
    let app = create_router(service, RateLimitLayer::new(config.login_rate_limit.clone()));

    let addr = config.socket_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("🎯 API server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("👋 EduTrack stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Initialize tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "edutrack_backend=debug,edutrack=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // Also try the crate directory when launched from elsewhere
    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}
