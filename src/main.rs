use clap::Parser;
use crm_bridge::adapters::TracingNotifier;
use crm_bridge::config::cli::{AuthCommand, Command, EmbedAction};
use crm_bridge::domain::model::EntityKind;
use crm_bridge::domain::ports::Notifier;
use crm_bridge::utils::error::ErrorCategory;
use crm_bridge::utils::{logger, validation::Validate};
use crm_bridge::{
    AppConfig, AuthContext, AuthMode, CliConfig, ConsoleNotifier, CrmError, EmbeddingHooks,
    HttpEmbeddingService, LiveBackend, SupabaseAuthClient,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 載入配置：有指定檔案就用檔案，否則讀環境變數
    let config = match &cli.config {
        Some(path) => match AppConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        },
        None => AppConfig::from_env(),
    };

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_from_format(config.log_format(), cli.verbose);
    }

    tracing::info!("🚀 Starting crm-bridge");

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let mode = config.auth_mode();
    if mode.is_development() {
        tracing::info!("🧪 Running in development mode");
    }

    let notifier: Arc<dyn Notifier> = if cli.json_logs {
        Arc::new(TracingNotifier)
    } else {
        Arc::new(ConsoleNotifier)
    };

    let outcome = match cli.command {
        Command::Auth(command) => run_auth(command, mode, notifier).await,
        Command::Embed { entity, action, id } => match mode.live() {
            Some(backend) => run_embed(backend, entity, action, &id).await,
            None => {
                eprintln!("❌ Embedding services are unavailable in development mode");
                std::process::exit(1);
            }
        },
    };

    if let Err(e) = outcome {
        tracing::error!("❌ Command failed: {} (Category: {:?})", e, e.category());
        let exit_code = match e.category() {
            ErrorCategory::Configuration => 1,
            ErrorCategory::Operational => 2,
        };
        std::process::exit(exit_code);
    }

    Ok(())
}

async fn run_auth(
    command: AuthCommand,
    mode: AuthMode,
    notifier: Arc<dyn Notifier>,
) -> Result<(), CrmError> {
    let context = match (mode.live(), command.session_tokens()) {
        (Some(backend), Some(tokens)) => {
            let client = SupabaseAuthClient::new(backend)?;
            match tokens.access_token.as_deref() {
                Some(access_token) => {
                    client
                        .restore_session(access_token, tokens.refresh_token.as_deref())
                        .await?;
                }
                // 沒有 token 就不會打到 /logout，不能假裝登出成功
                None if command.requires_session() => {
                    return Err(CrmError::MissingConfigError {
                        field: "--access-token".to_string(),
                    });
                }
                None => {}
            }
            AuthContext::new(mode.clone(), Arc::new(client), notifier)
        }
        _ => AuthContext::connect(mode.clone(), notifier)?,
    };
    context.initialize().await;

    let result = match command {
        AuthCommand::SignIn { email, password } => context.sign_in(&email, &password).await,
        AuthCommand::SignUp { email, password } => context.sign_up(&email, &password).await,
        AuthCommand::SignOut { .. } => {
            context.sign_out().await;
            Ok(())
        }
        AuthCommand::Status { .. } => {
            print_status(&context).await;
            Ok(())
        }
    };

    context.shutdown().await;
    result
}

async fn print_status(context: &AuthContext) {
    let state = context.snapshot().await;
    let mode = if context.is_development() {
        "development"
    } else {
        "live"
    };

    println!("📋 Auth Status:");
    println!("  Mode: {}", mode);
    match (&state.user, &state.session) {
        (Some(user), Some(session)) => {
            println!("  User: {} ({})", user.email.as_deref().unwrap_or("-"), user.id);
            match session.expires_at {
                Some(ts) => println!("  Expires at: {}", ts),
                None => println!("  Expires at: never"),
            }
        }
        _ => println!("  Not signed in"),
    }
}

async fn run_embed(
    backend: &LiveBackend,
    entity: EntityKind,
    action: EmbedAction,
    id: &str,
) -> Result<(), CrmError> {
    let hooks = EmbeddingHooks::new(entity, HttpEmbeddingService::new(entity, backend)?);

    let output = match action {
        EmbedAction::Update => hooks.update_embedding(id).await?,
        EmbedAction::Created => hooks.handle_created(id).await?,
        EmbedAction::Updated => hooks.handle_updated(id).await?,
        EmbedAction::Activity => hooks.handle_activity_changed(id).await?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
