use crate::domain::model::EntityKind;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(name = "crm-bridge")]
#[command(about = "CRM auth session and embedding trigger client")]
pub struct CliConfig {
    /// Path to a TOML configuration file (environment variables are used otherwise)
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Authentication operations
    #[command(subcommand)]
    Auth(AuthCommand),

    /// Trigger an embedding recompute for a CRM entity
    Embed {
        #[arg(value_parser = parse_entity)]
        entity: EntityKind,

        #[arg(value_enum)]
        action: EmbedAction,

        /// Entity id, or activity id for the `activity` action
        id: String,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum AuthCommand {
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    SignUp {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Revoke a session on the backend (live mode needs --access-token)
    SignOut {
        #[command(flatten)]
        tokens: SessionTokens,
    },
    /// Show the current session
    Status {
        #[command(flatten)]
        tokens: SessionTokens,
    },
}

/// 每次執行都從空的 session 開始，既有登入要由呼叫端帶入
#[derive(Debug, Clone, Default, Args)]
pub struct SessionTokens {
    /// Access token of an existing session
    #[arg(long)]
    pub access_token: Option<String>,

    #[arg(long, requires = "access_token")]
    pub refresh_token: Option<String>,
}

impl AuthCommand {
    pub fn session_tokens(&self) -> Option<&SessionTokens> {
        match self {
            AuthCommand::SignOut { tokens } | AuthCommand::Status { tokens } => Some(tokens),
            AuthCommand::SignIn { .. } | AuthCommand::SignUp { .. } => None,
        }
    }

    /// 沒有 session 就無事可做的指令
    pub fn requires_session(&self) -> bool {
        matches!(self, AuthCommand::SignOut { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmbedAction {
    Update,
    Created,
    Updated,
    Activity,
}

fn parse_entity(value: &str) -> Result<EntityKind, String> {
    value.parse()
}
