//! Create-admin command - adds an admin account

use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::domain::user::Role;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::user::CreateUserRequest;

#[derive(Debug, Args)]
pub struct CreateAdminArgs {
    /// Email address used to log in
    #[arg(long)]
    pub email: String,

    /// Display name
    #[arg(long, default_value = "Administrator")]
    pub name: String,

    /// Password; a random one is generated and printed when omitted
    #[arg(long)]
    pub password: Option<String>,
}

pub async fn run(args: CreateAdminArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_logging(&config.logging);

    let (state, pool) = crate::create_app_state(&config).await?;

    let (password, generated) = match args.password {
        Some(password) => (password, false),
        None => (crate::generate_password(), true),
    };

    let user = state
        .user_service
        .create(CreateUserRequest {
            email: args.email,
            name: args.name,
            password: password.clone(),
            role: Role::Admin.as_str().to_string(),
            team_id: None,
        })
        .await?;

    info!(user_id = %user.id(), email = %user.email(), "Admin user created");
    if generated {
        println!("Generated password for {}: {}", user.email(), password);
    }

    if let Some(pool) = pool {
        pool.close().await;
    }

    Ok(())
}
