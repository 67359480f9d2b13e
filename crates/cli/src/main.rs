use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iicgp_client::dashboard::DashboardClient;
use iicgp_client::editor::{PresenceEditor, MSG_LOAD_FAILED, MSG_SAVE_FAILED};
use iicgp_client::error::MSG_IMPORT_FAILED;
use iicgp_client::registry::{
    Confirm, PreConfirmed, ServiceRegistry, MSG_CREATE_FAILED, MSG_DELETE_FAILED, MSG_LIST_FAILED,
};
use iicgp_client::session::MSG_INVALID_CREDENTIALS;
use iicgp_client::token::FileTokenStore;
use iicgp_client::{ClientConfig, ClientError, IicgpApi, Session, SessionState};
use iicgp_core::access::{navigation, Resource};
use iicgp_core::culto::NewCulto;
use iicgp_core::presence::{PresenceFilter, RosterQuery};
use iicgp_core::types::DbId;

mod output;

#[derive(Parser)]
#[command(name = "iicgp")]
#[command(about = "Registo de cultos e presenças da IICGP")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Iniciar sessão
    Login {
        username: String,
        /// Lida do terminal quando omitida
        #[arg(long, env = "IICGP_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Terminar sessão
    Logout,
    /// Mostrar o utilizador autenticado
    Whoami,
    /// Mostrar o menu disponível para a função atual
    Menu,
    /// Registo de cultos
    Cultos {
        #[command(subcommand)]
        action: CultosAction,
    },
    /// Presenças de um culto
    Presencas {
        #[command(subcommand)]
        action: PresencasAction,
    },
    /// Relatório de presenças de um culto
    Relatorio { culto_id: DbId },
    /// Estatísticas gerais
    Stats,
}

#[derive(Subcommand)]
enum CultosAction {
    List,
    Create {
        /// Data no formato AAAA-MM-DD
        #[arg(long)]
        data: NaiveDate,
        #[arg(long)]
        tipo: String,
        #[arg(long)]
        categoria: Option<String>,
        #[arg(long)]
        pregador: Option<String>,
        /// HH:MM
        #[arg(long)]
        horario: Option<String>,
        #[arg(long = "branch")]
        branch_id: Option<DbId>,
    },
    Delete {
        culto_id: DbId,
        /// Apagar sem pedir confirmação
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum PresencasAction {
    Show {
        culto_id: DbId,
        /// Filtrar por nome ou código
        #[arg(long, default_value = "")]
        search: String,
        /// todos | presentes | ausentes
        #[arg(long, default_value = "todos")]
        filter: String,
    },
    Mark {
        culto_id: DbId,
        /// Marcar todos como presentes antes de aplicar as alterações
        #[arg(long, conflicts_with = "none")]
        all: bool,
        /// Marcar todos como ausentes antes de aplicar as alterações
        #[arg(long)]
        none: bool,
        /// IDs de membros a alternar
        #[arg(long, value_delimiter = ',')]
        toggle: Vec<DbId>,
        /// Observação no formato ID=texto (texto vazio remove)
        #[arg(long = "obs", value_parser = parse_observation)]
        observations: Vec<(DbId, String)>,
    },
    Import {
        culto_id: DbId,
        file: PathBuf,
    },
}

fn parse_observation(raw: &str) -> Result<(DbId, String), String> {
    let (id, text) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ID=texto, got '{raw}'"))?;
    let id = id
        .trim()
        .parse()
        .map_err(|_| format!("invalid member id '{id}'"))?;
    Ok((id, text.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iicgp_cli=info,iicgp_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let config = ClientConfig::from_env()?;
    tracing::debug!(api_url = %config.api_url, token_file = %config.token_file.display(), "Loaded client configuration");
    let session = Session::new(FileTokenStore::new(&config.token_file));
    let api = IicgpApi::new(&config, session)?;

    match cli.command {
        Command::Login { username, password } => login(&api, &username, password).await,
        Command::Logout => {
            api.session().logout()?;
            println!("Sessão terminada.");
            Ok(())
        }
        Command::Whoami => whoami(&api).await,
        Command::Menu => {
            let user = guard(&api, Resource::Dashboard).await?;
            output::menu(&navigation(user.role_id));
            Ok(())
        }
        Command::Cultos { action } => cultos(&api, action).await,
        Command::Presencas { action } => presencas(&api, action).await,
        Command::Relatorio { culto_id } => relatorio(&api, culto_id).await,
        Command::Stats => {
            guard(&api, Resource::Estatistica).await?;
            output::dashboard(&DashboardClient::new(api.clone()).fetch_all().await);
            Ok(())
        }
    }
}

/// Turn a client error into the message a user should see.
fn user_error(err: ClientError, fallback: &str) -> anyhow::Error {
    tracing::debug!(error = %err, "Command failed");
    anyhow::anyhow!(err.user_message(fallback))
}

async fn guard(api: &IicgpApi, resource: Resource) -> Result<iicgp_core::user::CurrentUser> {
    api.session()
        .guard(api, resource)
        .await
        .map_err(|e| user_error(e, MSG_LOAD_FAILED))
}

async fn login(api: &IicgpApi, username: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt("Senha: ")?,
    };
    let user = api
        .session()
        .login(api, username, &password)
        .await
        .map_err(|e| user_error(e, MSG_INVALID_CREDENTIALS))?;
    println!("Bem-vindo, {}.", user.username);
    Ok(())
}

async fn whoami(api: &IicgpApi) -> Result<()> {
    match api.session().resolve(api).await {
        Ok(SessionState::Authenticated(user)) => output::user(&user),
        Ok(_) => println!("Sem sessão iniciada."),
        Err(err) => return Err(user_error(err, MSG_LOAD_FAILED)),
    }
    Ok(())
}

async fn cultos(api: &IicgpApi, action: CultosAction) -> Result<()> {
    guard(api, Resource::Cultos).await?;
    let registry = ServiceRegistry::new(api.clone());

    match action {
        CultosAction::List => {
            let cultos = registry
                .list()
                .await
                .map_err(|e| user_error(e, MSG_LIST_FAILED))?;
            output::cultos(&cultos);
        }
        CultosAction::Create {
            data,
            tipo,
            categoria,
            pregador,
            horario,
            branch_id,
        } => {
            let form = NewCulto {
                categoria,
                pregador,
                horario,
                branch_id,
                ..NewCulto::new(data, tipo)
            };
            let culto = registry
                .create(form)
                .await
                .map_err(|e| user_error(e, MSG_CREATE_FAILED))?;
            println!("Culto criado (#{}).", culto.id);
            let cultos = registry
                .list()
                .await
                .map_err(|e| user_error(e, MSG_LIST_FAILED))?;
            output::cultos(&cultos);
        }
        CultosAction::Delete { culto_id, yes } => {
            let confirm: &dyn Confirm = if yes { &PreConfirmed } else { &StdinConfirm };
            match registry.delete(culto_id, confirm).await {
                Ok(()) => println!("Culto apagado."),
                Err(ClientError::Cancelled) => println!("Operação cancelada."),
                Err(err) => return Err(user_error(err, MSG_DELETE_FAILED)),
            }
        }
    }
    Ok(())
}

async fn open_editor(api: &IicgpApi, culto_id: DbId) -> Result<PresenceEditor> {
    PresenceEditor::open(api.clone(), culto_id)
        .await
        .map_err(|e| user_error(e, MSG_LOAD_FAILED))
}

async fn presencas(api: &IicgpApi, action: PresencasAction) -> Result<()> {
    guard(api, Resource::Cultos).await?;

    match action {
        PresencasAction::Show {
            culto_id,
            search,
            filter,
        } => {
            let filter = PresenceFilter::from_key(&filter)?;
            let editor = open_editor(api, culto_id).await?;
            let rows = editor.view(&RosterQuery::new(search, filter));
            output::roster(&rows);
            output::tally("Total", &editor.live_stats());
        }
        PresencasAction::Mark {
            culto_id,
            all,
            none,
            toggle,
            observations,
        } => {
            let editor = open_editor(api, culto_id).await?;
            if all {
                editor.mark_all(true);
            } else if none {
                editor.mark_all(false);
            }
            for membro_id in toggle {
                let present = editor
                    .toggle(membro_id)
                    .map_err(|e| user_error(e, MSG_SAVE_FAILED))?;
                tracing::debug!(membro_id, present, "Toggled");
            }
            for (membro_id, text) in observations {
                editor
                    .set_observation(membro_id, Some(text))
                    .map_err(|e| user_error(e, MSG_SAVE_FAILED))?;
            }
            output::tally("Por guardar", &editor.live_stats());

            let outcome = editor
                .save()
                .await
                .map_err(|e| user_error(e, MSG_SAVE_FAILED))?;
            println!("{}", outcome.message);
            output::report(outcome.snapshot.as_ref());
        }
        PresencasAction::Import { culto_id, file } => {
            let editor = open_editor(api, culto_id).await?;
            let outcome = editor
                .import_file(&file)
                .await
                .map_err(|e| user_error(e, MSG_IMPORT_FAILED))?;
            println!("{}", outcome.message);
            output::report(outcome.snapshot.as_ref());
        }
    }
    Ok(())
}

async fn relatorio(api: &IicgpApi, culto_id: DbId) -> Result<()> {
    guard(api, Resource::Cultos).await?;

    match PresenceEditor::open(api.clone(), culto_id).await {
        Ok(editor) => {
            let roster = editor.roster();
            output::report(editor.report().as_ref());
            println!();
            output::member_list("Presentes", &roster.present_members());
            output::member_list("Ausentes", &roster.absent_members());
        }
        Err(err) => {
            tracing::warn!(culto_id, error = %err, "Report unavailable");
            eprintln!("{}", err.user_message(MSG_LOAD_FAILED));
            output::report(None);
        }
    }
    Ok(())
}

/// `y/N` confirmation on the terminal.
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt_text: &str) -> bool {
        match prompt(&format!("{prompt_text} [y/N] ")) {
            Ok(answer) => matches!(answer.to_lowercase().as_str(), "y" | "yes" | "s" | "sim"),
            Err(_) => false,
        }
    }
}

fn prompt(text: &str) -> Result<String> {
    print!("{text}");
    io::stdout().flush().context("cannot write to stdout")?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("cannot read from stdin")?;
    Ok(line.trim().to_string())
}
