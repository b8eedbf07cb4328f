use axum::{
    middleware,
    routing::{get, post},
    Router,
    Server,
};
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener};
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use typed_builder::TypedBuilder;

use crate::application::{DefaultTableService, TableService};
use crate::infrastructure::repository::MemoryTableRepository;
use crate::infrastructure::storage::MemoryStorage;
use crate::interface::api::auth::{
    require_authenticated, AuthError, Authenticator, StaticTokenAuthenticator,
};
use crate::interface::api::handler::{
    create_table_handler,
    delete_table_handler,
    find_all_tables_handler,
    find_table_handler,
    health_check_handler,
    method_not_routed_handler,
    not_found_handler,
    update_table_handler,
};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] AuthError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(String),
}

#[derive(Clone, Debug, TypedBuilder)]
pub struct ServerConfig {
    #[builder(default = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    #[builder(default = 8080)]
    pub port: u16, // デフォルトポート番号

    /// `token=subject`形式のベアラートークン
    #[builder(default)]
    pub tokens: Vec<String>,
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// ハンドラーが共有する状態（プロセス全体で1つ）
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn TableService>,
    pub authenticator: Arc<dyn Authenticator>,
}

impl AppState {
    pub fn new(service: Arc<dyn TableService>, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            service,
            authenticator,
        }
    }

    /// インメモリストアを使う状態を組み立てる
    pub fn in_memory(authenticator: Arc<dyn Authenticator>) -> Self {
        let storage = Arc::new(MemoryStorage::new());
        let repository = Arc::new(MemoryTableRepository::new(storage));
        let service = Arc::new(DefaultTableService::new(repository));
        Self::new(service, authenticator)
    }
}

/// ルーティングテーブル
///
/// `/tables`配下はすべて認証ミドルウェアを通る。`/health`は公開。
pub fn router(state: AppState) -> Router {
    let tables = Router::new()
        .route(
            "/tables",
            post(create_table_handler)
                .get(find_all_tables_handler)
                .fallback(method_not_routed_handler),
        )
        .route(
            "/tables/:table_id",
            get(find_table_handler)
                .put(update_table_handler)
                .delete(delete_table_handler)
                .fallback(method_not_routed_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.authenticator.clone(),
            require_authenticated,
        ));

    Router::new()
        .route("/health", get(health_check_handler))
        .merge(tables)
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 既にバインド済みのリスナーでサーバーを動かす
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state);

    Server::from_tcp(listener)
        .map_err(|e| ServerError::Serve(e.to_string()))?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServerError::Serve(e.to_string()))
}

pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    // 認証とサービスの初期化
    let authenticator = StaticTokenAuthenticator::from_specs(&config.tokens)?;
    if authenticator.is_empty() {
        warn!("トークンが設定されていません。すべての/tablesリクエストは401になります");
    }
    let state = AppState::in_memory(Arc::new(authenticator));

    // サーバーのアドレス設定
    let addr = config.addr();
    let listener = TcpListener::bind(addr).map_err(|source| ServerError::Bind { addr, source })?;
    listener
        .set_nonblocking(true)
        .map_err(|source| ServerError::Bind { addr, source })?;

    info!("サーバーを{}で起動中...", addr);

    serve(listener, state, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("シャットダウンを開始します");
    })
    .await
}
