use crate::cli::Command;
use crate::clients::BackendClient;
use crate::config::Config;
use crate::dashboard::DashboardView;
use crate::error::AppResult;
use crate::services::{BookService, SchemaBootstrap, TableOutcome};
use crate::store::{RemoteBackend, Stores};
use crate::utils::logging::log_startup;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    stores: Stores,
    service: BookService,
}

impl App {
    /// 连接远程后端并初始化应用
    pub fn initialize(config: Config) -> AppResult<Self> {
        let client = BackendClient::new(&config)?;
        let stores = Stores::from_backend(Arc::new(RemoteBackend::new(client)));
        Ok(Self::with_stores(config, stores))
    }

    /// 使用给定的存储接口初始化
    pub fn with_stores(config: Config, stores: Stores) -> Self {
        let service = BookService::new(stores.clone(), &config);
        Self {
            config,
            stores,
            service,
        }
    }

    pub fn service(&self) -> &BookService {
        &self.service
    }

    /// 执行一条命令，返回操作是否成功
    pub async fn run(&self, command: Command) -> AppResult<bool> {
        log_startup(&format!("{:?}", command), &self.config);

        let ok = match command {
            Command::Dashboard { watch } => {
                self.dashboard(watch).await;
                true
            }
            Command::Upload { file, no_extract } => match self.service.upload_file(&file).await {
                Some(path) if no_extract => {
                    println!("{}", path);
                    true
                }
                Some(path) => {
                    println!("{}", path);
                    self.service.extract_metadata(&path).await
                }
                None => false,
            },
            Command::Scan => {
                let view = DashboardView::new(self.service.clone());
                let ok = view.scan().await;
                println!("{}", view.render());
                ok
            }
            Command::Extract { path } => self.service.extract_metadata(&path).await,
            Command::Generate { path } => self.service.start_question_generation(&path).await,
            Command::Cancel { path } => self.service.cancel_processing(&path).await,
            Command::Export { book_id, out } => match out {
                Some(dir) => match self.service.export_questions_csv_to(&book_id, &dir).await {
                    Some(local) => {
                        println!("{}", local.display());
                        true
                    }
                    None => false,
                },
                None => match self.service.export_questions_csv(&book_id).await {
                    Some(file_name) => {
                        println!("{}", file_name);
                        true
                    }
                    None => false,
                },
            },
            Command::Migrate => self.migrate().await,
        };

        if !ok {
            warn!("⚠️ 操作未成功完成");
        }
        Ok(ok)
    }

    async fn dashboard(&self, watch: Option<u64>) {
        let view = DashboardView::new(self.service.clone());
        view.mount().await;
        println!("{}", view.render());

        let Some(secs) = watch else {
            return;
        };

        let mut interval = tokio::time::interval(Duration::from_secs(secs.max(1)));
        // 第一次 tick 立即返回
        interval.tick().await;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    view.refresh().await;
                    println!("\n{}", view.render());
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("👋 已退出监视模式");
                    break;
                }
            }
        }
    }

    /// 显式执行一次表结构引导
    async fn migrate(&self) -> bool {
        let outcomes = SchemaBootstrap::new(self.stores.schema.clone())
            .ensure_tables_exist()
            .await;

        let mut ok = true;
        for (table, outcome) in outcomes {
            println!("{:<24} {:?}", table, outcome);
            if outcome == TableOutcome::Failed {
                error!("❌ 数据表 {} 引导失败", table);
                ok = false;
            }
        }
        ok
    }
}
