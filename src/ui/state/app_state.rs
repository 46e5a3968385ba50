use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use dioxus::prelude::{use_signal, Signal};

use crate::config::AppConfig;
use crate::domain::entities::table::TableEntry;
use crate::infra::sqlite::repo::SqliteRepo;
use crate::usecase::ports::repo::RepoError;
use crate::usecase::services::edit_service::{EditService, EditSession};
use crate::ui::state::query_tabs::QueryTabs;
use crate::usecase::services::query_service::QueryService;

/// Everything bound to one open database file. Dropping it closes the
/// connection.
pub struct Workspace {
    pub repo: Rc<SqliteRepo>,
    pub edit: EditService,
    pub query: QueryService,
}

impl Workspace {
    pub fn open(db_path: &Path, config: &AppConfig) -> Result<Self, RepoError> {
        let repo = Rc::new(SqliteRepo::open(db_path)?);
        Ok(Self {
            edit: EditService::new(repo.clone(), repo.clone(), config),
            query: QueryService::new(repo.clone(), repo.clone()),
            repo,
        })
    }

    pub fn tree(&self) -> Result<BTreeMap<String, Vec<TableEntry>>, RepoError> {
        let mut tree = BTreeMap::new();
        for database in self.query.list_databases()? {
            let tables = self.query.list_tables(&database)?;
            tree.insert(database, tables);
        }
        Ok(tree)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailsTab {
    Structure,
    #[default]
    Data,
}

#[derive(Clone, Copy)]
pub struct AppState {
    pub config: Signal<AppConfig>,
    pub workspace: Signal<Option<Workspace>>,
    pub tree: Signal<BTreeMap<String, Vec<TableEntry>>>,
    pub session: Signal<Option<EditSession>>,
    pub details_tab: Signal<DetailsTab>,
    pub rename_input: Signal<String>,
    pub query_tabs: Signal<QueryTabs>,
    pub busy: Signal<bool>,
    pub status: Signal<String>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: use_signal(move || config),
            workspace: use_signal(|| None::<Workspace>),
            tree: use_signal(BTreeMap::<String, Vec<TableEntry>>::new),
            session: use_signal(|| None::<EditSession>),
            details_tab: use_signal(DetailsTab::default),
            rename_input: use_signal(String::new),
            query_tabs: use_signal(QueryTabs::new),
            busy: use_signal(|| false),
            status: use_signal(|| "Ready".to_string()),
        }
    }
}
