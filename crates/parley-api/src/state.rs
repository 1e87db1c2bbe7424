//! Application state wiring all services together.
//!
//! `AppState` holds what every CLI command needs: the database, the
//! repositories, the persona catalog and config. `ApiState` adds the Turn
//! Orchestrator, which needs the generation credential and is therefore only
//! built by `serve`.

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;

use parley_core::conversation::ConversationStore;
use parley_core::event::EventBus;
use parley_core::identity::{IdentityBridge, PersonaProvisioner};
use parley_core::message::MessageStore;
use parley_core::persona::PersonaCatalog;
use parley_core::turn::{TurnOrchestrator, TurnSettings};
use parley_infra::config::{load_global_config, resolve_data_dir};
use parley_infra::generation::OpenAiCompatBackend;
use parley_infra::sqlite::account::SqliteAccountRepository;
use parley_infra::sqlite::conversation::SqliteConversationRepository;
use parley_infra::sqlite::message::SqliteMessageRepository;
use parley_infra::sqlite::persona::SqlitePersonaRepository;
use parley_infra::sqlite::pool::{DatabasePool, database_url};
use parley_types::config::GlobalConfig;
use parley_types::error::ConfigError;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteOrchestrator = TurnOrchestrator<
    SqliteAccountRepository,
    SqlitePersonaRepository,
    SqliteConversationRepository,
    SqliteMessageRepository,
    OpenAiCompatBackend,
    EventBus,
>;

pub type ConcreteProvisioner = PersonaProvisioner<SqliteAccountRepository, SqlitePersonaRepository>;

/// Capacity of the realtime event bus.
const EVENT_BUS_CAPACITY: usize = 256;

/// State shared by all CLI commands.
#[derive(Clone)]
pub struct AppState {
    pub accounts: SqliteAccountRepository,
    pub personas: SqlitePersonaRepository,
    pub provisioner: Arc<ConcreteProvisioner>,
    pub catalog: Arc<PersonaCatalog>,
    pub config: Arc<GlobalConfig>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: resolve the data dir, load
    /// `config.toml`, connect to the DB.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_global_config(&data_dir).await;
        let db_pool = DatabasePool::new(&database_url(&data_dir)).await?;

        Ok(Self::from_parts(data_dir, config, db_pool))
    }

    pub fn from_parts(data_dir: PathBuf, config: GlobalConfig, db_pool: DatabasePool) -> Self {
        let accounts = SqliteAccountRepository::new(db_pool.clone());
        let personas = SqlitePersonaRepository::new(db_pool.clone());
        let provisioner = PersonaProvisioner::new(accounts.clone(), personas.clone());
        let catalog = PersonaCatalog::with_overrides(config.personas.clone());

        Self {
            accounts,
            personas,
            provisioner: Arc::new(provisioner),
            catalog: Arc::new(catalog),
            config: Arc::new(config),
            data_dir,
            db_pool,
        }
    }
}

/// State handed to every HTTP handler.
#[derive(Clone)]
pub struct ApiState {
    pub app: AppState,
    pub orchestrator: Arc<ConcreteOrchestrator>,
    pub event_bus: EventBus,
}

impl ApiState {
    /// Wire the Turn Orchestrator on top of `app`.
    pub fn new(app: AppState, api_key: SecretString) -> Result<Self, ConfigError> {
        let backend = OpenAiCompatBackend::new(api_key, &app.config.generation)?;
        let event_bus = EventBus::new(EVENT_BUS_CAPACITY);

        let conversation_repo = SqliteConversationRepository::new(app.db_pool.clone());
        let orchestrator = TurnOrchestrator::new(
            IdentityBridge::new(app.accounts.clone(), app.personas.clone()),
            ConversationStore::new(conversation_repo.clone()),
            MessageStore::new(
                SqliteMessageRepository::new(app.db_pool.clone()),
                conversation_repo,
            ),
            backend,
            event_bus.clone(),
            app.catalog.as_ref().clone(),
            TurnSettings::from_config(&app.config.turn, &app.config.generation),
        );

        Ok(Self {
            app,
            orchestrator: Arc::new(orchestrator),
            event_bus,
        })
    }
}
