//
// backend.rs
//
// Language server front end: completion, go-to-definition and debug info for
// LaTeX documents
//

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::Deserialize;
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::Client;
use tower_lsp::LanguageServer;
use tower_lsp::LspService;
use tower_lsp::Server;

use crate::candidate::Candidate;
use crate::config::{parse_indexer_config, IndexerConfig};
use crate::definition::NavigationTarget;
use crate::document_store::DocumentStore;
use crate::session::{Request, Session};

/// Sessions are shared with blocking scan tasks, one task at a time
type SharedSession = Arc<Mutex<Session>>;

/// Parameters for the latexref/debugInfo request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugInfoParams {
    uri: Url,
}

#[derive(Debug, Default)]
struct ServerState {
    /// Configuration applied to sessions created from now on
    config: IndexerConfig,
    documents: DocumentStore,
    sessions: HashMap<Url, SharedSession>,
}

pub struct Backend {
    client: Client,
    state: Arc<RwLock<ServerState>>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            state: Arc::new(RwLock::new(ServerState::default())),
        }
    }

    async fn session(&self, uri: &Url) -> Option<SharedSession> {
        self.state.read().await.sessions.get(uri).cloned()
    }

    async fn handle_debug_info(&self, params: DebugInfoParams) -> Result<String> {
        let Some(session) = self.session(&params.uri).await else {
            return Err(Error::invalid_params(format!(
                "{} is not an open document",
                params.uri
            )));
        };
        run_blocking(session, |s| s.diagnostics())
            .await
            .ok_or_else(Error::internal_error)
    }
}

/// Run `f` against `session` on the blocking thread pool
async fn run_blocking<T, F>(session: SharedSession, f: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce(&mut Session) -> T + Send + 'static,
{
    let task = tokio::task::spawn_blocking(move || {
        let mut guard = match session.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                // Cache commits are per file, so a panicked scan leaves usable state
                log::warn!("Recovering session after a panicked indexing task");
                poisoned.into_inner()
            }
        };
        f(&mut guard)
    });
    match task.await {
        Ok(value) => Some(value),
        Err(e) => {
            log::error!("Indexing task failed: {}", e);
            None
        }
    }
}

fn completion_item(candidate: Candidate) -> CompletionItem {
    CompletionItem {
        label: candidate.identifier,
        kind: Some(CompletionItemKind::REFERENCE),
        detail: candidate.detail,
        ..Default::default()
    }
}

fn target_location(target: &NavigationTarget) -> Option<Location> {
    let uri = Url::from_file_path(&target.file).ok()?;
    let position = Position::new(target.line.saturating_sub(1), target.utf16_column);
    Some(Location {
        uri,
        range: Range::new(position, position),
    })
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        log::info!("Initializing latexref");

        if let Some(config) = params
            .initialization_options
            .as_ref()
            .and_then(parse_indexer_config)
        {
            log::info!("Using client configuration: {:?}", config);
            self.state.write().await.config = config;
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![String::from("{"), String::from(",")]),
                    ..Default::default()
                }),
                definition_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: String::from("latexref"),
                version: Some(String::from(env!("CARGO_PKG_VERSION"))),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        log::info!("latexref initialized");
    }

    async fn shutdown(&self) -> Result<()> {
        log::info!("latexref shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        let session = {
            let mut state = self.state.write().await;
            state.documents.open(doc.uri.clone(), &doc.text, doc.version);
            let session = Arc::new(Mutex::new(Session::new(state.config.clone())));
            state.sessions.insert(doc.uri.clone(), session.clone());
            session
        };

        let Ok(path) = doc.uri.to_file_path() else {
            log::debug!("Not indexing non-file document {}", doc.uri);
            return;
        };

        // Prime the label table so go-to-definition works before any completion
        let root = run_blocking(session, move |s| {
            s.refresh_labels(&path);
            s.root(&path).clone()
        })
        .await;

        if let Some(root) = root.filter(|r| !r.found) {
            self.client
                .log_message(
                    MessageType::WARNING,
                    format!(
                        "latexref: no project root found for {}; only files next to it are indexed",
                        root.path.display()
                    ),
                )
                .await;
        }
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let mut state = self.state.write().await;
        state.documents.update(
            &params.text_document.uri,
            params.text_document.version,
            params.content_changes,
        );
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let mut state = self.state.write().await;
        state.documents.close(&params.text_document.uri);
        state.sessions.remove(&params.text_document.uri);
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        match parse_indexer_config(&params.settings) {
            Some(config) => {
                log::info!("Configuration changed; applies to newly opened documents");
                self.state.write().await.config = config;
            }
            None => log::debug!("Configuration change without a latexref section"),
        }
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        let (line, session) = {
            let state = self.state.read().await;
            let line = state
                .documents
                .get(&uri)
                .and_then(|doc| doc.line_prefix(position.line, position.character));
            (line, state.sessions.get(&uri).cloned())
        };
        let (Some(line), Some(session), Ok(path)) = (line, session, uri.to_file_path()) else {
            return Ok(None);
        };

        let request = Request::new(line, path);
        let candidates = run_blocking(session, move |s| {
            if s.classify(&request).activate {
                Some(s.candidates(&request))
            } else {
                None
            }
        })
        .await
        .flatten();

        Ok(candidates.map(|candidates| {
            CompletionResponse::Array(candidates.into_iter().map(completion_item).collect())
        }))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let (line, session) = {
            let state = self.state.read().await;
            let line = state
                .documents
                .get(&uri)
                .and_then(|doc| doc.line_text(position.line));
            (line, state.sessions.get(&uri).cloned())
        };
        let (Some(line), Some(session)) = (line, session) else {
            return Ok(None);
        };

        let document = uri
            .to_file_path()
            .unwrap_or_else(|_| PathBuf::from(uri.path()));
        let request = Request::new(line, document);
        let result = run_blocking(session, move |s| s.goto(&request)).await;

        match result {
            Some(Ok(target)) => Ok(target_location(&target).map(GotoDefinitionResponse::Scalar)),
            Some(Err(e)) => {
                log::info!("{}", e);
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

pub async fn start_lsp() -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::build(Backend::new)
        .custom_method("latexref/debugInfo", Backend::handle_debug_info)
        .finish();
    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}
